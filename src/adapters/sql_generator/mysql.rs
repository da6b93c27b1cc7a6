// MySQL用SQLジェネレーター
//
// コレクション定義からMySQL用のDDL文を生成します。
// MySQLはTEXT型に長さ指定なしのインデックスを作成できないため、
// 一意制約や参照を持つ文字列フィールドはVARCHAR(255)にします。
// CREATE INDEX に IF NOT EXISTS がないため、存在確認を別途行います。

use crate::adapters::sql_generator::{index_name, is_multi_valued, SqlGenerator};
use crate::core::collection::{Field, FieldType};
use crate::core::config::Dialect;

/// MySQL用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct MysqlSqlGenerator {}

impl MysqlSqlGenerator {
    /// 新しいMysqlSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for MysqlSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlGenerator for MysqlSqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::MySQL
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn map_field_type(&self, field: &Field) -> String {
        if is_multi_valued(field) {
            return "JSON".to_string();
        }

        match field.field_type {
            FieldType::Number => "DOUBLE".to_string(),
            FieldType::Bool => "TINYINT(1)".to_string(),
            FieldType::Url | FieldType::Email | FieldType::Select(_) | FieldType::Relation(_) => {
                "VARCHAR(255)".to_string()
            }
            FieldType::Text if field.unique => "VARCHAR(255)".to_string(),
            _ => "TEXT".to_string(),
        }
    }

    fn key_column_type(&self) -> &'static str {
        "VARCHAR(255)"
    }

    fn generate_list_columns(&self) -> String {
        "SELECT CAST(column_name AS CHAR) FROM information_schema.columns WHERE table_schema = DATABASE() AND table_name = ?"
            .to_string()
    }

    fn generate_index_exists(&self) -> Option<String> {
        Some(
            "SELECT COUNT(*) FROM information_schema.statistics WHERE table_schema = DATABASE() AND table_name = ? AND index_name = ?"
                .to_string(),
        )
    }

    fn generate_create_unique_index(&self, collection: &str, field: &Field) -> String {
        format!(
            "CREATE UNIQUE INDEX {} ON {} ({})",
            self.quote_identifier(&index_name(collection, field)),
            self.quote_identifier(collection),
            self.quote_identifier(&field.name)
        )
    }
}
