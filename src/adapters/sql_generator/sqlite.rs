// SQLite用SQLジェネレーター
//
// コレクション定義からSQLite用のDDL文を生成します。
// SQLiteにはBOOLEAN型とJSON型がないため、INTEGER (0/1) とTEXTで表現します。

use crate::adapters::sql_generator::{is_multi_valued, SqlGenerator};
use crate::core::collection::{Field, FieldType};
use crate::core::config::Dialect;

/// SQLite用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct SqliteSqlGenerator {}

impl SqliteSqlGenerator {
    /// 新しいSqliteSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for SqliteSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlGenerator for SqliteSqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::SQLite
    }

    fn map_field_type(&self, field: &Field) -> String {
        if is_multi_valued(field) {
            return "TEXT".to_string();
        }

        match field.field_type {
            FieldType::Number => "REAL".to_string(),
            FieldType::Bool => "INTEGER".to_string(),
            _ => "TEXT".to_string(),
        }
    }

    fn generate_list_columns(&self) -> String {
        "SELECT name FROM pragma_table_info(?)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collection::Collection;

    #[test]
    fn test_map_field_types() {
        let generator = SqliteSqlGenerator::new();

        assert_eq!(generator.map_field_type(&Field::number("displayOrder")), "REAL");
        assert_eq!(generator.map_field_type(&Field::bool("visible")), "INTEGER");
        assert_eq!(generator.map_field_type(&Field::json("legs")), "TEXT");
        assert_eq!(generator.map_field_type(&Field::url("weatherUrl")), "TEXT");
    }

    #[test]
    fn test_generate_add_column() {
        let sql = SqliteSqlGenerator::new().generate_add_column("destinations", &Field::number("displayOrder"));
        assert_eq!(sql, r#"ALTER TABLE "destinations" ADD COLUMN "displayOrder" REAL"#);
    }

    #[test]
    fn test_generate_create_table_keeps_field_order() {
        let collection = Collection::base("travellers")
            .with_field(Field::text("name").required())
            .with_field(Field::number("ageAtTravel"));

        let sql = SqliteSqlGenerator::new().generate_create_table(&collection);

        assert_eq!(
            sql,
            r#"CREATE TABLE IF NOT EXISTS "travellers" ("id" TEXT PRIMARY KEY, "name" TEXT, "ageAtTravel" REAL)"#
        );
    }

    #[test]
    fn test_ledger_table() {
        let sql = SqliteSqlGenerator::new().generate_create_ledger_table();
        assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "_migrations""#));
        assert!(sql.contains(r#""version" TEXT PRIMARY KEY"#));
    }
}
