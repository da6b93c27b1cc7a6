// SQLコレクションストア
//
// sqlx::AnyPool 上にコレクション定義とレコードテーブルを保持するストア。
// コレクション定義は `_collections` に、適用済みマイグレーションは `_migrations` に記録します。
// コレクションごとの書き込みは1トランザクションで行い、カラムは削除しません。

use crate::adapters::database::DatabaseConnectionService;
use crate::adapters::sql_generator::{generator_for, index_name, is_multi_valued, SqlGenerator};
use crate::adapters::store::{CollectionStore, MigrationLedger};
use crate::core::collection::{is_blank, string_items, Collection, CollectionKind, Field, FieldType};
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::StoreError;
use crate::core::migration::MigrationRecord;
use crate::core::naming::{self, COLLECTIONS_TABLE, MIGRATIONS_TABLE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, AnyPool, Row};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// バインドする値
enum BoundValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Json(String),
}

/// SQLコレクションストア
pub struct SqlCollectionStore {
    pool: AnyPool,
    generator: Box<dyn SqlGenerator>,
    /// メタデータテーブルが存在するか（読み取り専用接続で未作成ならfalse）
    metadata_ready: bool,
}

impl SqlCollectionStore {
    /// 既存の接続プールからストアを作成
    pub fn new(pool: AnyPool, dialect: Dialect) -> Self {
        Self {
            pool,
            generator: generator_for(dialect),
            metadata_ready: true,
        }
    }

    /// データベースに接続してメタデータテーブルを準備
    ///
    /// # Arguments
    ///
    /// * `dialect` - データベース方言
    /// * `config` - データベース設定
    pub async fn connect(dialect: Dialect, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let service = DatabaseConnectionService::new();
        let pool = service.create_pool(dialect, config).await?;
        service.test_connection(&pool).await?;

        let store = Self::new(pool, dialect);
        store.initialize().await?;
        Ok(store)
    }

    /// 読み取り専用で接続
    ///
    /// メタデータテーブルを作成しません。テーブルがまだ存在しない場合、
    /// コレクション定義と台帳の読み取りは空の結果を返します。
    pub async fn connect_read_only(
        dialect: Dialect,
        config: &DatabaseConfig,
    ) -> Result<Self, StoreError> {
        let service = DatabaseConnectionService::new();
        let pool = service.create_read_only_pool(dialect, config).await?;
        service.test_connection(&pool).await?;

        let mut store = Self::new(pool, dialect);
        store.metadata_ready = store.has_metadata_tables().await?;
        debug!(metadata_ready = store.metadata_ready, "connected read-only");
        Ok(store)
    }

    /// コレクション定義テーブルと台帳テーブルを作成（存在しない場合）
    pub async fn initialize(&self) -> Result<(), StoreError> {
        for sql in [
            self.generator.generate_create_metadata_table(),
            self.generator.generate_create_ledger_table(),
        ] {
            sqlx::query(&sql)
                .execute(&self.pool)
                .await
                .map_err(|e| query_error("Failed to create metadata table", &sql, e))?;
        }
        Ok(())
    }

    /// 方言
    pub fn dialect(&self) -> Dialect {
        self.generator.dialect()
    }

    /// 接続プール
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// 接続プールを閉じる
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// レコードを挿入
    ///
    /// 未宣言フィールドと必須フィールドを検証し、省略されたフィールドにはデフォルト値を補います。
    /// 値は型・select許可値・リレーション先の存在を確認して正規化してから書き込みます。
    /// 一意性はデータベースの一意インデックスで検証されます。
    ///
    /// # Returns
    ///
    /// 採番されたレコードID
    pub async fn insert_record(
        &self,
        collection: &str,
        values: Map<String, Value>,
    ) -> Result<String, StoreError> {
        let definition = self
            .find_collection(collection)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
            })?;

        if let Some(unknown) = values
            .keys()
            .find(|key| !definition.has_field(key) && !naming::is_system_field(key))
        {
            return Err(violation(collection, unknown, "unknown field"));
        }

        let id = next_record_id(collection);
        let mut columns = vec![self.generator.quote_identifier("id")];
        let mut placeholders = vec![self.generator.placeholder(1)];
        let mut bound = vec![BoundValue::Text(id.clone())];

        for field in &definition.fields {
            let value = values
                .get(&field.name)
                .cloned()
                .or_else(|| field.default.clone())
                .unwrap_or(Value::Null);

            if is_blank(&value) {
                if field.required {
                    return Err(violation(collection, &field.name, "value is required"));
                }
                continue;
            }

            // 一意インデックスが同じ値として比較できるよう正規化してからバインドする
            let value = field
                .normalize_value(&value)
                .map_err(|message| violation(collection, &field.name, &message))?;
            self.check_relation(collection, field, &value).await?;
            let value = bind_value(field, &value);

            let position = bound.len() + 1;
            placeholders.push(match value {
                BoundValue::Json(_) => self.generator.json_placeholder(position),
                _ => self.generator.placeholder(position),
            });
            columns.push(self.generator.quote_identifier(&field.name));
            bound.push(value);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.generator.quote_identifier(collection),
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for value in bound {
            query = match value {
                BoundValue::Text(text) | BoundValue::Json(text) => query.bind(text),
                BoundValue::Number(number) => query.bind(number),
                BoundValue::Bool(flag) => query.bind(flag),
            };
        }

        query.execute(&self.pool).await.map_err(|e| {
            if let sqlx::Error::Database(db_error) = &e {
                if db_error.is_unique_violation() {
                    return StoreError::ConstraintViolation {
                        collection: collection.to_string(),
                        field: db_error.constraint().unwrap_or("unique index").to_string(),
                        message: "value must be unique".to_string(),
                    };
                }
            }
            query_error("Failed to insert record", &sql, e)
        })?;

        Ok(id)
    }

    /// レコード数を取得
    pub async fn count_records(&self, collection: &str) -> Result<i64, StoreError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}",
            self.generator.quote_identifier(collection)
        );
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_error("Failed to count records", &sql, e))?;
        row.try_get::<i64, _>(0)
            .map_err(|e| query_error("Failed to read record count", &sql, e))
    }

    /// リレーション値が参照先テーブルの既存レコードを指しているか確認
    ///
    /// 参照先がシステムコレクションの場合はこのストアにテーブルがないため確認しません。
    async fn check_relation(
        &self,
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

        let sql = self.generator.generate_count_by_id(target);
        for id in string_items(value).unwrap_or_default() {
            let row = sqlx::query(&sql)
                .bind(id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| query_error("Failed to look up related record", &sql, e))?;
            let count: i64 = row
                .try_get(0)
                .map_err(|e| query_error("Failed to read related record count", &sql, e))?;
            if count == 0 {
                return Err(violation(
                    collection,
                    &field.name,
                    &format!("related record '{}' not found in {}", id, target),
                ));
            }
        }
        Ok(())
    }

    async fn has_metadata_tables(&self) -> Result<bool, StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| query_error("Failed to acquire connection", "ACQUIRE", e))?;

        for table in [COLLECTIONS_TABLE, MIGRATIONS_TABLE] {
            if self.existing_columns(&mut conn, table).await?.is_empty() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn existing_columns(
        &self,
        conn: &mut AnyConnection,
        table: &str,
    ) -> Result<HashSet<String>, StoreError> {
        let sql = self.generator.generate_list_columns();
        let rows = sqlx::query(&sql)
            .bind(table.to_string())
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| query_error("Failed to list columns", &sql, e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>(0)
                    .map_err(|e| query_error("Failed to read column name", &sql, e))
            })
            .collect()
    }

    async fn ensure_unique_index(
        &self,
        conn: &mut AnyConnection,
        collection: &str,
        field: &Field,
    ) -> Result<(), StoreError> {
        if let Some(sql) = self.generator.generate_index_exists() {
            let row = sqlx::query(&sql)
                .bind(collection.to_string())
                .bind(index_name(collection, field))
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| query_error("Failed to check index", &sql, e))?;
            let count: i64 = row
                .try_get(0)
                .map_err(|e| query_error("Failed to read index count", &sql, e))?;
            if count > 0 {
                return Ok(());
            }
        }

        let sql = self.generator.generate_create_unique_index(collection, field);
        execute(conn, &sql, "Failed to create unique index").await
    }
}

#[async_trait]
impl CollectionStore for SqlCollectionStore {
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        if !self.metadata_ready {
            return Ok(Vec::new());
        }

        let sql = self.generator.generate_select_collections();
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("Failed to list collections", &sql, e))?;

        rows.iter().map(collection_from_row).collect()
    }

    async fn find_collection(&self, name: &str) -> Result<Option<Collection>, StoreError> {
        if !self.metadata_ready {
            return Ok(None);
        }

        let sql = self.generator.generate_select_collection();
        let row = sqlx::query(&sql)
            .bind(name.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("Failed to look up collection", &sql, e))?;

        row.as_ref().map(collection_from_row).transpose()
    }

    async fn create_or_update_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        let schema = serde_json::to_string(&collection.fields).map_err(serialization_error)?;
        let options = serde_json::to_string(&collection.options).map_err(serialization_error)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_error("Failed to begin transaction", "BEGIN", e))?;

        let create = self.generator.generate_create_table(collection);
        execute(&mut tx, &create, "Failed to create collection table").await?;

        let existing = self.existing_columns(&mut tx, &collection.name).await?;
        for field in collection.fields.iter().filter(|f| !existing.contains(&f.name)) {
            let sql = self.generator.generate_add_column(&collection.name, field);
            execute(&mut tx, &sql, "Failed to add column").await?;
            debug!(collection = %collection.name, field = %field.name, "column added");
        }

        for field in collection.fields.iter().filter(|f| f.unique) {
            self.ensure_unique_index(&mut tx, &collection.name, field).await?;
        }

        let delete = self.generator.generate_delete_collection();
        sqlx::query(&delete)
            .bind(collection.name.clone())
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to replace collection definition", &delete, e))?;

        let insert = self.generator.generate_insert_collection();
        sqlx::query(&insert)
            .bind(collection.name.clone())
            .bind(collection.kind.to_string())
            .bind(schema)
            .bind(options)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to save collection definition", &insert, e))?;

        tx.commit()
            .await
            .map_err(|e| query_error("Failed to commit transaction", "COMMIT", e))?;

        info!(collection = %collection.name, fields = collection.fields.len(), "collection saved");
        Ok(())
    }
}

#[async_trait]
impl MigrationLedger for SqlCollectionStore {
    async fn find_migration(&self, version: &str) -> Result<Option<MigrationRecord>, StoreError> {
        if !self.metadata_ready {
            return Ok(None);
        }

        let sql = self.generator.generate_select_migration();
        let row = sqlx::query(&sql)
            .bind(version.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("Failed to read migration ledger", &sql, e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let read = |index: usize| {
            row.try_get::<String, _>(index)
                .map_err(|e| query_error("Failed to read migration record", &sql, e))
        };
        let applied_at = DateTime::parse_from_rfc3339(&read(3)?)
            .map_err(|e| StoreError::Serialization {
                message: format!("Invalid applied_at timestamp: {}", e),
            })?
            .with_timezone(&Utc);

        Ok(Some(MigrationRecord {
            version: read(0)?,
            name: read(1)?,
            checksum: read(2)?,
            applied_at,
        }))
    }

    async fn record_migration(&self, record: &MigrationRecord) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_error("Failed to begin transaction", "BEGIN", e))?;

        let delete = self.generator.generate_delete_migration();
        sqlx::query(&delete)
            .bind(record.version.clone())
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to replace migration record", &delete, e))?;

        let insert = self.generator.generate_insert_migration();
        sqlx::query(&insert)
            .bind(record.version.clone())
            .bind(record.name.clone())
            .bind(record.checksum.clone())
            .bind(record.applied_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to save migration record", &insert, e))?;

        tx.commit()
            .await
            .map_err(|e| query_error("Failed to commit transaction", "COMMIT", e))
    }
}

async fn execute(conn: &mut AnyConnection, sql: &str, message: &str) -> Result<(), StoreError> {
    sqlx::query(sql)
        .execute(&mut *conn)
        .await
        .map(|_| ())
        .map_err(|e| query_error(message, sql, e))
}

fn collection_from_row(row: &AnyRow) -> Result<Collection, StoreError> {
    let read = |index: usize| {
        row.try_get::<String, _>(index).map_err(|e| StoreError::Query {
            message: format!("Failed to read collection row: {}", e),
            sql: None,
        })
    };

    let kind: CollectionKind =
        serde_json::from_value(Value::String(read(1)?)).map_err(serialization_error)?;
    let fields: Vec<Field> = serde_json::from_str(&read(2)?).map_err(serialization_error)?;
    let options: Map<String, Value> =
        serde_json::from_str(&read(3)?).map_err(serialization_error)?;

    Ok(Collection {
        name: read(0)?,
        kind,
        fields,
        options,
    })
}

/// 正規化済みのフィールド値をバインド用の値に変換
fn bind_value(field: &Field, value: &Value) -> BoundValue {
    if is_multi_valued(field) {
        return BoundValue::Json(value.to_string());
    }

    match (&field.field_type, value) {
        (FieldType::Number, Value::Number(n)) => BoundValue::Number(n.as_f64().unwrap_or_default()),
        (FieldType::Bool, Value::Bool(b)) => BoundValue::Bool(*b),
        (_, Value::String(s)) => BoundValue::Text(s.clone()),
        (_, other) => BoundValue::Text(other.to_string()),
    }
}

fn next_record_id(collection: &str) -> String {
    let sequence = RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut hasher = Sha256::new();
    hasher.update(collection.as_bytes());
    hasher.update(Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(sequence.to_le_bytes());
    format!("{:x}", hasher.finalize())[..15].to_string()
}

fn violation(collection: &str, field: &str, message: &str) -> StoreError {
    StoreError::ConstraintViolation {
        collection: collection.to_string(),
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn query_error(message: &str, sql: &str, error: sqlx::Error) -> StoreError {
    StoreError::Query {
        message: format!("{}: {}", message, error),
        sql: Some(sql.to_string()),
    }
}

fn serialization_error(error: serde_json::Error) -> StoreError {
    StoreError::Serialization {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bind_value_types() {
        assert!(matches!(
            bind_value(&Field::number("displayOrder"), &json!(2)),
            BoundValue::Number(n) if n == 2.0
        ));
        assert!(matches!(
            bind_value(&Field::bool("visible"), &json!(true)),
            BoundValue::Bool(true)
        ));
        assert!(matches!(
            bind_value(&Field::json("legs"), &json!([{"flightNumber": "BA1"}])),
            BoundValue::Json(_)
        ));
    }

    #[test]
    fn test_single_relation_binds_as_text() {
        let field = Field::relation("project_field", "project", "projects");
        let normalized = field.normalize_value(&json!(["p1"])).unwrap();

        assert!(matches!(
            bind_value(&field, &normalized),
            BoundValue::Text(ref id) if id == "p1"
        ));
    }

    #[test]
    fn test_record_ids_are_unique() {
        let first = next_record_id("projects");
        let second = next_record_id("projects");

        assert_eq!(first.len(), 15);
        assert_ne!(first, second);
    }
}
