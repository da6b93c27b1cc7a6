/// スキーマローダーのテスト
///
/// インメモリストアを使用して、登録順序、失敗時の中断、再実行時の方針を確認します。

#[cfg(test)]
mod schema_loader_tests {
    use blckbx_schema::adapters::memory_store::InMemoryStore;
    use blckbx_schema::adapters::store::CollectionStore;
    use blckbx_schema::core::catalog::{itinerary_catalog, Catalog};
    use blckbx_schema::core::collection::{Collection, Field, FieldType};
    use blckbx_schema::core::config::ConflictPolicy;
    use blckbx_schema::core::error::LoaderError;
    use blckbx_schema::services::schema_loader::{LoadAction, SchemaLoader};
    use serde_json::{json, Map, Value};

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {}", other),
        }
    }

    fn project(store: &InMemoryStore) -> String {
        store
            .insert_record(
                "projects",
                record(json!({
                    "user": "u00000000000001",
                    "name": "Amalfi Coast",
                    "assistantName": "Jo",
                    "assistantEmail": "jo@example.com"
                })),
            )
            .unwrap()
    }

    /// 空のストアには11個のコレクションが依存関係順に作成される
    #[tokio::test]
    async fn test_load_into_empty_store() {
        let store = InMemoryStore::new();
        let catalog = itinerary_catalog();

        let report = SchemaLoader::new(&store).load(&catalog).await.unwrap();

        assert_eq!(report.created(), 11);
        assert_eq!(report.written(), catalog.collection_names());
        assert_eq!(store.submitted(), catalog.collection_names());

        let stored = store.list_collections().await.unwrap();
        assert_eq!(stored.len(), 11);
        assert_eq!(stored[0], catalog.collections()[0]);
    }

    /// 宣言順が逆でも参照先が先に送信される
    #[tokio::test]
    async fn test_parents_are_submitted_first() {
        let store = InMemoryStore::new();
        let catalog = Catalog::new("1", "reversed")
            .with_collection(
                Collection::base("legs")
                    .with_field(Field::relation("trip", "trip", "trips").required())
                    .with_field(Field::relation("stop", "stop", "stops")),
            )
            .with_collection(
                Collection::base("stops")
                    .with_field(Field::relation("trip", "trip", "trips").required()),
            )
            .with_collection(Collection::base("trips").with_field(Field::text("name")));

        SchemaLoader::new(&store).load(&catalog).await.unwrap();

        assert_eq!(store.submitted(), vec!["trips", "stops", "legs"]);
    }

    /// 送信に失敗した時点で中断し、後続のコレクションは送信されない
    #[tokio::test]
    async fn test_failure_aborts_remaining_collections() {
        let store = InMemoryStore::new();
        store.fail_on("outbound_travel");

        let err = SchemaLoader::new(&store)
            .load(&itinerary_catalog())
            .await
            .unwrap_err();

        assert!(err.is_collection_creation());
        assert_eq!(err.collection(), Some("outbound_travel"));
        assert!(err.to_string().contains("injected failure"));
        assert_eq!(
            store.submitted(),
            vec!["projects", "destinations", "travellers", "outbound_travel"]
        );
        assert_eq!(store.list_collections().await.unwrap().len(), 3);
    }

    /// 2回目のロードでは何も書き込まれない
    #[tokio::test]
    async fn test_replay_is_idempotent() {
        let store = InMemoryStore::new();
        let catalog = itinerary_catalog();
        let loader = SchemaLoader::new(&store);

        loader.load(&catalog).await.unwrap();
        let before = store.list_collections().await.unwrap();

        let report = loader.load(&catalog).await.unwrap();

        assert_eq!(report.unchanged(), 11);
        assert!(report.written().is_empty());
        assert_eq!(store.submitted().len(), 11);
        assert_eq!(store.list_collections().await.unwrap(), before);
    }

    /// 更新時はストアにのみ存在するフィールドとデータを保持する
    #[tokio::test]
    async fn test_update_keeps_store_only_fields_and_data() {
        let store = InMemoryStore::new();
        let legacy = Catalog::new("0", "legacy").with_collection(
            Collection::base("projects")
                .with_field(Field::text("name").required())
                .with_field(Field::text("legacyCode")),
        );
        SchemaLoader::new(&store).load(&legacy).await.unwrap();
        store
            .insert_record("projects", record(json!({ "name": "Kyoto", "legacyCode": "K-1" })))
            .unwrap();

        let report = SchemaLoader::new(&store).load(&itinerary_catalog()).await.unwrap();

        assert_eq!(report.updated(), 1);
        assert_eq!(report.created(), 10);
        match &report.outcomes[0].1 {
            LoadAction::Update(diff) => {
                assert_eq!(diff.retained_fields, vec!["legacyCode".to_string()]);
                assert!(diff.added_fields.contains(&"assistantEmail".to_string()));
            }
            other => panic!("expected an update, got {}", other),
        }

        let projects = store.find_collection("projects").await.unwrap().unwrap();
        assert!(projects.has_field("legacyCode"));
        assert!(projects.has_field("coverImage"));

        let rows = store.records("projects").unwrap();
        assert_eq!(rows[0]["legacyCode"], "K-1");
        assert_eq!(rows[0]["name"], "Kyoto");
    }

    /// skip方針では既存コレクションに触れない
    #[tokio::test]
    async fn test_skip_policy_leaves_existing_collections() {
        let store = InMemoryStore::new();
        let partial = Catalog::new("0", "partial")
            .with_collection(Collection::base("projects").with_field(Field::text("name")));
        SchemaLoader::new(&store).load(&partial).await.unwrap();

        let report = SchemaLoader::new(&store)
            .with_policy(ConflictPolicy::Skip)
            .load(&itinerary_catalog())
            .await
            .unwrap();

        assert_eq!(report.skipped(), 1);
        assert_eq!(report.created(), 10);
        let projects = store.find_collection("projects").await.unwrap().unwrap();
        assert_eq!(projects.field_names(), vec!["name"]);
    }

    /// fail方針では計画の段階でエラーになり、何も書き込まれない
    #[tokio::test]
    async fn test_fail_policy_rejects_existing_collection() {
        let store = InMemoryStore::new();
        let catalog = itinerary_catalog();
        SchemaLoader::new(&store).load(&catalog).await.unwrap();

        let err = SchemaLoader::new(&store)
            .with_policy(ConflictPolicy::Fail)
            .load(&catalog)
            .await
            .unwrap_err();

        assert!(matches!(err, LoaderError::CollectionExists { .. }));
        assert_eq!(err.collection(), Some("projects"));
        assert_eq!(store.submitted().len(), 11);
    }

    /// 識別子が同じでストア側の名前が異なるフィールドは改名として1つにまとめられる
    #[tokio::test]
    async fn test_renamed_field_is_merged_by_id() {
        let store = InMemoryStore::new();
        store
            .create_or_update_collection(
                &Collection::base("notes").with_field(Field::new("name", "title", FieldType::Text)),
            )
            .await
            .unwrap();
        let catalog = Catalog::new("1", "notes")
            .with_collection(Collection::base("notes").with_field(Field::text("name")));

        let report = SchemaLoader::new(&store).load(&catalog).await.unwrap();

        assert_eq!(report.updated(), 1);
        let notes = store.find_collection("notes").await.unwrap().unwrap();
        assert_eq!(notes.fields.len(), 1);
        assert_eq!(notes.field_names(), vec!["name"]);
    }

    /// マージ結果でフィールド名が重複する場合は送信せずにエラーになる
    #[tokio::test]
    async fn test_merge_conflict_is_not_submitted() {
        let store = InMemoryStore::new();
        store
            .create_or_update_collection(&Collection::base("notes").with_field(Field::new(
                "legacy_name",
                "name",
                FieldType::Text,
            )))
            .await
            .unwrap();
        let catalog = Catalog::new("1", "notes")
            .with_collection(Collection::base("notes").with_field(Field::text("name")));

        let err = SchemaLoader::new(&store).load(&catalog).await.unwrap_err();

        assert!(matches!(err, LoaderError::MergeConflict { .. }));
        assert_eq!(err.collection(), Some("notes"));
        assert_eq!(store.submitted().len(), 1);
        let notes = store.find_collection("notes").await.unwrap().unwrap();
        assert_eq!(notes.fields[0].id, "legacy_name");
    }

    /// 不正なカタログは送信前に拒否される
    #[tokio::test]
    async fn test_invalid_catalog_is_rejected_before_submission() {
        let store = InMemoryStore::new();
        let catalog = Catalog::new("1", "broken").with_collection(
            Collection::base("notes").with_field(Field::relation("owner", "owner", "owners")),
        );

        let err = SchemaLoader::new(&store).load(&catalog).await.unwrap_err();

        assert!(err.is_invalid_catalog());
        assert!(store.submitted().is_empty());
    }

    /// 計画の作成はストアを変更しない
    #[tokio::test]
    async fn test_plan_does_not_write() {
        let store = InMemoryStore::new();

        let plan = SchemaLoader::new(&store).plan(&itinerary_catalog()).await.unwrap();

        assert_eq!(plan.count("create"), 11);
        assert!(!plan.is_noop());
        assert!(store.submitted().is_empty());
    }

    /// 作成後のストアでは1対1の制約がレコードに適用される
    #[tokio::test]
    async fn test_loaded_catalog_enforces_one_to_one() {
        let store = InMemoryStore::new();
        SchemaLoader::new(&store).load(&itinerary_catalog()).await.unwrap();
        let project_id = project(&store);

        store
            .insert_record("helpful_information", record(json!({ "project": project_id })))
            .unwrap();
        let err = store
            .insert_record("helpful_information", record(json!({ "project": project_id })))
            .unwrap_err();

        assert!(err.is_constraint_violation());
        assert!(err.to_string().contains("unique"));

        let traveller = store.insert_record(
            "travellers",
            record(json!({ "project": project_id, "name": "Sam" })),
        );
        assert!(traveller.is_ok());
        let rows = store.records("travellers").unwrap();
        assert_eq!(rows[0]["type"], "adult");
        assert_eq!(rows[0]["displayOrder"], 0);
    }
}
