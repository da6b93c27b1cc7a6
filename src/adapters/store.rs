// コレクションストア境界
//
// コレクション定義を永続化する外部ストアの抽象化。
// ローダーはこのトレイトを通じてのみストアに書き込みます。

use crate::core::collection::Collection;
use crate::core::error::StoreError;
use crate::core::migration::MigrationRecord;
use async_trait::async_trait;

/// コレクション定義ストア
///
/// 実装は各呼び出しを内部で直列化する必要があります。
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// 保存済みのすべてのコレクション定義を取得
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError>;

    /// 名前でコレクション定義を検索
    ///
    /// # Returns
    ///
    /// 存在しない場合は`Ok(None)`
    async fn find_collection(&self, name: &str) -> Result<Option<Collection>, StoreError>;

    /// コレクションを作成、または既存の定義を置き換え
    ///
    /// 置き換え後の定義に含まれないフィールドのデータは保持されない可能性があります。
    async fn create_or_update_collection(&self, collection: &Collection) -> Result<(), StoreError>;
}

/// 適用済みマイグレーションの台帳
#[async_trait]
pub trait MigrationLedger: Send + Sync {
    /// バージョンで記録を検索
    async fn find_migration(&self, version: &str) -> Result<Option<MigrationRecord>, StoreError>;

    /// 記録を保存（同じバージョンの記録があれば置き換え）
    async fn record_migration(&self, record: &MigrationRecord) -> Result<(), StoreError>;
}
