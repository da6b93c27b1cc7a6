// PostgreSQL用SQLジェネレーター
//
// コレクション定義からPostgreSQL用のDDL文を生成します。

use crate::adapters::sql_generator::{is_multi_valued, SqlGenerator};
use crate::core::collection::{Field, FieldType};
use crate::core::config::Dialect;

/// PostgreSQL用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct PostgresSqlGenerator {}

impl PostgresSqlGenerator {
    /// 新しいPostgresSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for PostgresSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlGenerator for PostgresSqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSQL
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }

    fn json_placeholder(&self, position: usize) -> String {
        format!("CAST(${} AS JSONB)", position)
    }

    fn map_field_type(&self, field: &Field) -> String {
        if is_multi_valued(field) {
            return "JSONB".to_string();
        }

        match field.field_type {
            FieldType::Number => "DOUBLE PRECISION".to_string(),
            FieldType::Bool => "BOOLEAN".to_string(),
            _ => "TEXT".to_string(),
        }
    }

    fn generate_list_columns(&self) -> String {
        "SELECT column_name::text FROM information_schema.columns WHERE table_schema = current_schema() AND table_name = $1"
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collection::Collection;

    #[test]
    fn test_map_field_types() {
        let generator = PostgresSqlGenerator::new();

        assert_eq!(generator.map_field_type(&Field::text("name")), "TEXT");
        assert_eq!(generator.map_field_type(&Field::number("displayOrder")), "DOUBLE PRECISION");
        assert_eq!(generator.map_field_type(&Field::bool("visible")), "BOOLEAN");
        assert_eq!(generator.map_field_type(&Field::json("legs")), "JSONB");
        assert_eq!(
            generator.map_field_type(&Field::relation("project", "project", "projects")),
            "TEXT"
        );
    }

    #[test]
    fn test_generate_create_table() {
        let collection = Collection::base("helpful_information")
            .with_field(Field::relation("project", "project", "projects").required().unique())
            .with_field(Field::text("localEmergency"));

        let sql = PostgresSqlGenerator::new().generate_create_table(&collection);

        assert_eq!(
            sql,
            r#"CREATE TABLE IF NOT EXISTS "helpful_information" ("id" TEXT PRIMARY KEY, "project" TEXT, "localEmergency" TEXT)"#
        );
    }

    #[test]
    fn test_generate_create_unique_index() {
        let field = Field::text("customUrlSlug").unique();
        let sql = PostgresSqlGenerator::new().generate_create_unique_index("projects", &field);

        assert_eq!(
            sql,
            r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_projects_customUrlSlug_unique" ON "projects" ("customUrlSlug")"#
        );
    }

    #[test]
    fn test_select_collection_uses_numbered_placeholder() {
        let sql = PostgresSqlGenerator::new().generate_select_collection();
        assert!(sql.ends_with(r#"WHERE "name" = $1"#));
    }
}
