// SQL生成アダプター
//
// コレクション定義から各データベース方言用のDDL文と、
// メタデータ・台帳テーブルを操作するDML文を生成するアダプター層。

pub mod mysql;
pub mod postgres;
pub mod sqlite;

use crate::core::collection::{Collection, Field};
use crate::core::config::Dialect;
use crate::core::naming::{COLLECTIONS_TABLE, MIGRATIONS_TABLE};

/// SQLジェネレータートレイト
///
/// 方言ごとに異なる部分（識別子の引用、プレースホルダー、型マッピング、
/// スキーマの問い合わせ）だけを実装し、残りはデフォルト実装を使います。
pub trait SqlGenerator: Send + Sync {
    /// 対象の方言
    fn dialect(&self) -> Dialect;

    /// 識別子を引用符で囲む
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// 1始まりの位置に対応するプレースホルダー
    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    /// JSONカラムに値をバインドするプレースホルダー
    fn json_placeholder(&self, position: usize) -> String {
        self.placeholder(position)
    }

    /// フィールドをカラム型にマッピング
    ///
    /// # Arguments
    ///
    /// * `field` - フィールド定義
    ///
    /// # Returns
    ///
    /// カラム型のSQL文字列
    fn map_field_type(&self, field: &Field) -> String;

    /// 主キーなど索引付きの文字列カラムの型
    fn key_column_type(&self) -> &'static str {
        "TEXT"
    }

    /// テーブルのカラム名一覧を取得するSELECT文
    ///
    /// プレースホルダー1にテーブル名をバインドします。
    fn generate_list_columns(&self) -> String;

    /// 一意インデックスの存在確認SQL
    ///
    /// `CREATE UNIQUE INDEX IF NOT EXISTS` が使えない方言のみ実装します。
    /// プレースホルダー1にテーブル名、2にインデックス名をバインドします。
    fn generate_index_exists(&self) -> Option<String> {
        None
    }

    /// 一意インデックスの作成SQL
    fn generate_create_unique_index(&self, collection: &str, field: &Field) -> String {
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
            self.quote_identifier(&index_name(collection, field)),
            self.quote_identifier(collection),
            self.quote_identifier(&field.name)
        )
    }

    /// コレクション定義テーブルの作成SQL
    fn generate_create_metadata_table(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({} {} PRIMARY KEY, {} {} NOT NULL, {} TEXT NOT NULL, {} TEXT NOT NULL, {} {} NOT NULL)",
            self.quote_identifier(COLLECTIONS_TABLE),
            self.quote_identifier("name"),
            self.key_column_type(),
            self.quote_identifier("type"),
            self.key_column_type(),
            self.quote_identifier("schema"),
            self.quote_identifier("options"),
            self.quote_identifier("updated_at"),
            self.key_column_type()
        )
    }

    /// マイグレーション台帳テーブルの作成SQL
    fn generate_create_ledger_table(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({} {} PRIMARY KEY, {} {} NOT NULL, {} {} NOT NULL, {} {} NOT NULL)",
            self.quote_identifier(MIGRATIONS_TABLE),
            self.quote_identifier("version"),
            self.key_column_type(),
            self.quote_identifier("name"),
            self.key_column_type(),
            self.quote_identifier("checksum"),
            self.key_column_type(),
            self.quote_identifier("applied_at"),
            self.key_column_type()
        )
    }

    /// コレクションのレコードテーブル作成SQL
    ///
    /// `id` 主キーとフィールドごとのカラムを持ちます。
    fn generate_create_table(&self, collection: &Collection) -> String {
        let mut columns = vec![format!(
            "{} {} PRIMARY KEY",
            self.quote_identifier("id"),
            self.key_column_type()
        )];
        columns.extend(collection.fields.iter().map(|field| {
            format!(
                "{} {}",
                self.quote_identifier(&field.name),
                self.map_field_type(field)
            )
        }));

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.quote_identifier(&collection.name),
            columns.join(", ")
        )
    }

    /// カラム追加SQL
    fn generate_add_column(&self, collection: &str, field: &Field) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            self.quote_identifier(collection),
            self.quote_identifier(&field.name),
            self.map_field_type(field)
        )
    }

    /// IDによるレコード件数の取得SQL
    ///
    /// プレースホルダー1にレコードIDをバインドします。
    fn generate_count_by_id(&self, table: &str) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {} = {}",
            self.quote_identifier(table),
            self.quote_identifier("id"),
            self.placeholder(1)
        )
    }

    /// コレクション定義の全件取得SQL
    fn generate_select_collections(&self) -> String {
        format!(
            "SELECT {}, {}, {}, {} FROM {}",
            self.quote_identifier("name"),
            self.quote_identifier("type"),
            self.quote_identifier("schema"),
            self.quote_identifier("options"),
            self.quote_identifier(COLLECTIONS_TABLE)
        )
    }

    /// 名前によるコレクション定義の取得SQL
    fn generate_select_collection(&self) -> String {
        format!(
            "{} WHERE {} = {}",
            self.generate_select_collections(),
            self.quote_identifier("name"),
            self.placeholder(1)
        )
    }

    /// コレクション定義の削除SQL（置き換え前に使用）
    fn generate_delete_collection(&self) -> String {
        format!(
            "DELETE FROM {} WHERE {} = {}",
            self.quote_identifier(COLLECTIONS_TABLE),
            self.quote_identifier("name"),
            self.placeholder(1)
        )
    }

    /// コレクション定義の挿入SQL
    fn generate_insert_collection(&self) -> String {
        format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES ({}, {}, {}, {}, {})",
            self.quote_identifier(COLLECTIONS_TABLE),
            self.quote_identifier("name"),
            self.quote_identifier("type"),
            self.quote_identifier("schema"),
            self.quote_identifier("options"),
            self.quote_identifier("updated_at"),
            self.placeholder(1),
            self.placeholder(2),
            self.placeholder(3),
            self.placeholder(4),
            self.placeholder(5)
        )
    }

    /// バージョンによる台帳記録の取得SQL
    fn generate_select_migration(&self) -> String {
        format!(
            "SELECT {}, {}, {}, {} FROM {} WHERE {} = {}",
            self.quote_identifier("version"),
            self.quote_identifier("name"),
            self.quote_identifier("checksum"),
            self.quote_identifier("applied_at"),
            self.quote_identifier(MIGRATIONS_TABLE),
            self.quote_identifier("version"),
            self.placeholder(1)
        )
    }

    /// 台帳記録の削除SQL
    fn generate_delete_migration(&self) -> String {
        format!(
            "DELETE FROM {} WHERE {} = {}",
            self.quote_identifier(MIGRATIONS_TABLE),
            self.quote_identifier("version"),
            self.placeholder(1)
        )
    }

    /// 台帳記録の挿入SQL
    fn generate_insert_migration(&self) -> String {
        format!(
            "INSERT INTO {} ({}, {}, {}, {}) VALUES ({}, {}, {}, {})",
            self.quote_identifier(MIGRATIONS_TABLE),
            self.quote_identifier("version"),
            self.quote_identifier("name"),
            self.quote_identifier("checksum"),
            self.quote_identifier("applied_at"),
            self.placeholder(1),
            self.placeholder(2),
            self.placeholder(3),
            self.placeholder(4)
        )
    }
}

/// 一意インデックス名
pub fn index_name(collection: &str, field: &Field) -> String {
    format!("idx_{}_{}_unique", collection, field.name)
}

/// 複数値を保持するフィールドか（JSON配列として保存）
pub fn is_multi_valued(field: &Field) -> bool {
    use crate::core::collection::FieldType;

    match &field.field_type {
        FieldType::Select(options) => options.max_select > 1,
        FieldType::Relation(options) => options.max_select > 1,
        FieldType::Json | FieldType::File(_) => true,
        _ => false,
    }
}

/// 方言に対応するジェネレーターを作成
pub fn generator_for(dialect: Dialect) -> Box<dyn SqlGenerator> {
    match dialect {
        Dialect::PostgreSQL => Box::new(postgres::PostgresSqlGenerator::new()),
        Dialect::MySQL => Box::new(mysql::MysqlSqlGenerator::new()),
        Dialect::SQLite => Box::new(sqlite::SqliteSqlGenerator::new()),
    }
}
