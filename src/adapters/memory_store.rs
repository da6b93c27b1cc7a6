// インメモリストア
//
// プロセス内でコレクション定義とレコードを保持するストア。
// レコード挿入時にフィールド制約（必須、select値、リレーション、一意性）を検証します。
// 障害注入と送信履歴の記録により、ローダーの振る舞いを検証できます。

use crate::adapters::store::{CollectionStore, MigrationLedger};
use crate::core::collection::{is_blank, string_items, Collection, Field};
use crate::core::error::StoreError;
use crate::core::migration::MigrationRecord;
use crate::core::naming;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// 保存済みレコード
type Record = Map<String, Value>;

#[derive(Debug, Default)]
struct StoreState {
    /// 作成順のコレクション定義
    collections: Vec<Collection>,
    /// コレクション名ごとのレコード
    records: HashMap<String, Vec<Record>>,
    /// バージョンごとの適用記録
    ledger: BTreeMap<String, MigrationRecord>,
    /// create_or_update_collection が呼ばれたコレクション名（呼び出し順）
    submitted: Vec<String>,
    /// 失敗させるコレクション名
    fail_on: HashSet<String>,
    next_id: u64,
}

/// インメモリストア
///
/// クローンは同じ状態を共有します。
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    /// 空のストアを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定したコレクションの作成・更新を失敗させる
    pub fn fail_on(&self, collection: &str) {
        if let Ok(mut state) = self.state.write() {
            state.fail_on.insert(collection.to_string());
        }
    }

    /// create_or_update_collection に渡されたコレクション名（呼び出し順）
    pub fn submitted(&self) -> Vec<String> {
        self.state
            .read()
            .map(|state| state.submitted.clone())
            .unwrap_or_default()
    }

    /// コレクションのレコードを取得
    pub fn records(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        let state = self.read()?;
        if !state.collections.iter().any(|c| c.name == collection) {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
            });
        }
        Ok(state.records.get(collection).cloned().unwrap_or_default())
    }

    /// レコードを挿入
    ///
    /// 未宣言フィールド、必須、型、select値、リレーション先の存在、一意性を検証し、
    /// 省略されたフィールドにはデフォルト値を補います。
    ///
    /// # Arguments
    ///
    /// * `collection` - 挿入先のコレクション名
    /// * `values` - フィールド名と値
    ///
    /// # Returns
    ///
    /// 採番されたレコードID
    pub fn insert_record(&self, collection: &str, values: Record) -> Result<String, StoreError> {
        let mut state = self.write()?;

        let definition = state
            .collections
            .iter()
            .find(|c| c.name == collection)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
            })?;

        if let Some(unknown) = values
            .keys()
            .find(|key| !definition.has_field(key) && !naming::is_system_field(key))
        {
            return Err(violation(collection, unknown, "unknown field"));
        }

        let mut record = Record::new();
        for field in &definition.fields {
            let value = values
                .get(&field.name)
                .cloned()
                .or_else(|| field.default.clone())
                .unwrap_or(Value::Null);

            // 一意性は正規化後の値で比較する（"id" と ["id"] は同じ値）
            let value = if is_blank(&value) {
                if field.required {
                    return Err(violation(collection, &field.name, "value is required"));
                }
                value
            } else {
                let normalized = field
                    .normalize_value(&value)
                    .map_err(|message| violation(collection, &field.name, &message))?;
                check_relation(&state, collection, field, &normalized)?;
                normalized
            };

            if field.unique && !is_blank(&value) {
                let taken = state
                    .records
                    .get(collection)
                    .is_some_and(|rows| rows.iter().any(|row| row.get(&field.name) == Some(&value)));
                if taken {
                    return Err(violation(collection, &field.name, "value must be unique"));
                }
            }

            record.insert(field.name.clone(), value);
        }

        state.next_id += 1;
        let id = format!("{:015}", state.next_id);
        record.insert("id".to_string(), Value::String(id.clone()));
        state
            .records
            .entry(collection.to_string())
            .or_default()
            .push(record);

        debug!(collection, id = %id, "record inserted");
        Ok(id)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, StoreError> {
        self.state.read().map_err(|e| StoreError::Persistence {
            message: format!("store lock poisoned: {}", e),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, StoreError> {
        self.state.write().map_err(|e| StoreError::Persistence {
            message: format!("store lock poisoned: {}", e),
        })
    }
}

fn violation(collection: &str, field: &str, message: &str) -> StoreError {
    StoreError::ConstraintViolation {
        collection: collection.to_string(),
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// リレーション先のレコードが存在するか確認
///
/// システムコレクションのレコードはこのストアの管理外のため確認しません。
fn check_relation(
    state: &StoreState,
    collection: &str,
    field: &Field,
    value: &Value,
) -> Result<(), StoreError> {
    let Some(target) = field.relation_target() else {
        return Ok(());
    };
    if naming::is_system_collection(target) {
        return Ok(());
    }

    let rows = state.records.get(target);
    for id in string_items(value).unwrap_or_default() {
        let exists = rows.is_some_and(|rows| {
            rows.iter().any(|row| row.get("id").and_then(Value::as_str) == Some(id))
        });
        if !exists {
            return Err(violation(
                collection,
                &field.name,
                &format!("related record '{}' not found in {}", id, target),
            ));
        }
    }

    Ok(())
}

#[async_trait]
impl CollectionStore for InMemoryStore {
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        Ok(self.read()?.collections.clone())
    }

    async fn find_collection(&self, name: &str) -> Result<Option<Collection>, StoreError> {
        Ok(self
            .read()?
            .collections
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn create_or_update_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.submitted.push(collection.name.clone());

        if state.fail_on.contains(&collection.name) {
            return Err(StoreError::Persistence {
                message: format!("injected failure for collection '{}'", collection.name),
            });
        }

        match state.collections.iter().position(|c| c.name == collection.name) {
            Some(index) => {
                state.collections[index] = collection.clone();
                // 定義から外れたフィールドのデータは失われる
                if let Some(rows) = state.records.get_mut(&collection.name) {
                    for row in rows.iter_mut() {
                        row.retain(|key, _| key == "id" || collection.has_field(key));
                    }
                }
                debug!(collection = %collection.name, "collection updated");
            }
            None => {
                state.collections.push(collection.clone());
                debug!(collection = %collection.name, "collection created");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl MigrationLedger for InMemoryStore {
    async fn find_migration(&self, version: &str) -> Result<Option<MigrationRecord>, StoreError> {
        Ok(self.read()?.ledger.get(version).cloned())
    }

    async fn record_migration(&self, record: &MigrationRecord) -> Result<(), StoreError> {
        self.write()?
            .ledger
            .insert(record.version.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    async fn store_with_projects() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create_or_update_collection(
                &Collection::base("projects")
                    .with_field(Field::text("name").required())
                    .with_field(Field::select("status", &["draft", "published"]).with_default("draft")),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_applies_defaults() {
        let store = store_with_projects().await;
        store
            .insert_record("projects", object(json!({"name": "Lisbon"})))
            .unwrap();

        let rows = store.records("projects").unwrap();
        assert_eq!(rows[0]["status"], json!("draft"));
        assert_eq!(rows[0]["id"].as_str().unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_insert_rejects_missing_required() {
        let store = store_with_projects().await;
        let err = store.insert_record("projects", Record::new()).unwrap_err();

        assert!(err.is_constraint_violation());
        assert!(err.to_string().contains("projects.name"));
    }

    #[tokio::test]
    async fn test_insert_rejects_unknown_select_value() {
        let store = store_with_projects().await;
        let err = store
            .insert_record("projects", object(json!({"name": "x", "status": "archived"})))
            .unwrap_err();

        assert!(err.to_string().contains("archived"));
    }

    #[tokio::test]
    async fn test_insert_rejects_unknown_field() {
        let store = store_with_projects().await;
        let err = store
            .insert_record("projects", object(json!({"name": "x", "colour": "red"})))
            .unwrap_err();

        assert!(err.to_string().contains("unknown field"));
    }

    #[tokio::test]
    async fn test_relation_must_exist() {
        let store = store_with_projects().await;
        store
            .create_or_update_collection(
                &Collection::base("notes")
                    .with_field(Field::relation("project", "project", "projects").required()),
            )
            .await
            .unwrap();

        let err = store
            .insert_record("notes", object(json!({"project": "nope"})))
            .unwrap_err();
        assert!(err.is_constraint_violation());

        let project = store
            .insert_record("projects", object(json!({"name": "x"})))
            .unwrap();
        assert!(store
            .insert_record("notes", object(json!({"project": project})))
            .is_ok());
    }

    #[tokio::test]
    async fn test_update_drops_removed_field_data() {
        let store = store_with_projects().await;
        store
            .insert_record("projects", object(json!({"name": "x"})))
            .unwrap();

        store
            .create_or_update_collection(&Collection::base("projects").with_field(Field::text("name")))
            .await
            .unwrap();

        let rows = store.records("projects").unwrap();
        assert!(rows[0].get("status").is_none());
        assert_eq!(rows[0]["name"], json!("x"));
    }

    #[tokio::test]
    async fn test_fail_on_injects_error() {
        let store = InMemoryStore::new();
        store.fail_on("projects");

        let err = store
            .create_or_update_collection(&Collection::base("projects").with_field(Field::text("name")))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("injected failure"));
        assert_eq!(store.submitted(), vec!["projects"]);
        assert!(store.find_collection("projects").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_relation_compares_normalized_values() {
        let store = store_with_projects().await;
        store
            .create_or_update_collection(
                &Collection::base("helpful_information").with_field(
                    Field::relation("project_field", "project", "projects")
                        .required()
                        .unique(),
                ),
            )
            .await
            .unwrap();
        let project = store
            .insert_record("projects", object(json!({"name": "x"})))
            .unwrap();

        store
            .insert_record("helpful_information", object(json!({"project": project})))
            .unwrap();
        let err = store
            .insert_record("helpful_information", object(json!({"project": [project]})))
            .unwrap_err();

        assert!(err.to_string().contains("unique"));
        assert_eq!(store.records("helpful_information").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_single_select_array_is_stored_as_scalar() {
        let store = store_with_projects().await;
        store
            .insert_record("projects", object(json!({"name": "x", "status": ["published"]})))
            .unwrap();

        let rows = store.records("projects").unwrap();
        assert_eq!(rows[0]["status"], json!("published"));
    }
}
