// 命名ポリシー
//
// アプリケーション名、設定ファイル名、フレームワーク予約名の単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "blckbx-schema";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".blckbx.yaml";

/// 環境変数のプレフィックス
pub const ENV_PREFIX: &str = "BLCKBX";

/// コレクション定義を保持するメタデータテーブル
pub const COLLECTIONS_TABLE: &str = "_collections";

/// 適用済みマイグレーションを保持する台帳テーブル
pub const MIGRATIONS_TABLE: &str = "_migrations";

/// フレームワークが提供するシステムコレクション
///
/// カタログから参照されるが、カタログ自身は定義しない。
pub const SYSTEM_COLLECTIONS: &[&str] = &["users"];

/// すべてのレコードが暗黙に持つシステムフィールド
pub const SYSTEM_FIELDS: &[&str] = &[
    "id",
    "created",
    "updated",
    "collectionId",
    "collectionName",
    "expand",
];

/// システムコレクションかどうか
pub fn is_system_collection(name: &str) -> bool {
    SYSTEM_COLLECTIONS.contains(&name)
}

/// システムフィールド名かどうか
pub fn is_system_field(name: &str) -> bool {
    SYSTEM_FIELDS.contains(&name)
}
