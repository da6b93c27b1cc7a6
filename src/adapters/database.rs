// データベース接続アダプター
//
// SQLxを使用したデータベース接続の管理を行います。
// PostgreSQL、MySQL、SQLiteに対応した統一されたインターフェースを提供します。

use crate::adapters::connection_string;
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::StoreError;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// データベース接続サービス
///
/// データベース接続プールの初期化と管理を行います。
#[derive(Debug, Clone)]
pub struct DatabaseConnectionService {}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// データベース接続文字列を構築
    ///
    /// # Arguments
    ///
    /// * `dialect` - データベース方言
    /// * `config` - データベース設定
    ///
    /// # Returns
    ///
    /// 接続文字列
    pub fn build_connection_string(&self, dialect: Dialect, config: &DatabaseConfig) -> String {
        connection_string::build_connection_string(dialect, config)
    }

    /// データベース接続プールを作成
    ///
    /// # Arguments
    ///
    /// * `dialect` - データベース方言
    /// * `config` - データベース設定
    ///
    /// # Returns
    ///
    /// 接続プールまたはエラー
    pub async fn create_pool(
        &self,
        dialect: Dialect,
        config: &DatabaseConfig,
    ) -> Result<AnyPool, StoreError> {
        let connection_string = self.build_connection_string(dialect, config);
        self.connect_pool(dialect, config, &connection_string).await
    }

    /// 読み取り専用の接続プールを作成
    ///
    /// データベースに何も作成しません。SQLiteのファイルが存在しない場合は
    /// 空のインメモリデータベースに接続します。
    pub async fn create_read_only_pool(
        &self,
        dialect: Dialect,
        config: &DatabaseConfig,
    ) -> Result<AnyPool, StoreError> {
        let connection_string = if dialect == Dialect::SQLite && !Path::new(&config.database).exists() {
            debug!(database = %config.database, "database file does not exist, reading as empty");
            "sqlite::memory:".to_string()
        } else {
            connection_string::build_read_only_connection_string(dialect, config)
        };
        self.connect_pool(dialect, config, &connection_string).await
    }

    async fn connect_pool(
        &self,
        dialect: Dialect,
        config: &DatabaseConfig,
        connection_string: &str,
    ) -> Result<AnyPool, StoreError> {
        sqlx::any::install_default_drivers();

        let pool_options = self.create_pool_options_with_timeout(config.timeout);

        debug!(%dialect, database = %config.database, "connecting");
        pool_options
            .connect(connection_string)
            .await
            .map_err(|e| StoreError::Connection {
                message: format!("Failed to create connection pool for {}", dialect),
                cause: e.to_string(),
            })
    }

    /// 接続テストを実行
    ///
    /// # Arguments
    ///
    /// * `pool` - データベース接続プール
    pub async fn test_connection(&self, pool: &AnyPool) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Connection {
                message: "Database connection test failed".to_string(),
                cause: e.to_string(),
            })
    }

    /// タイムアウト付きのプールオプションを作成
    ///
    /// 未指定の場合は30秒です。
    pub fn create_pool_options_with_timeout(&self, timeout_secs: Option<u64>) -> PoolOptions<Any> {
        let timeout = timeout_secs.unwrap_or(30);
        PoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(timeout))
    }

    /// 接続プールを閉じる
    pub async fn close_pool(&self, pool: AnyPool) {
        pool.close().await;
    }
}

impl Default for DatabaseConnectionService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_connection_string_delegates() {
        let service = DatabaseConnectionService::new();
        let conn_str = service.build_connection_string(Dialect::SQLite, &DatabaseConfig::new("test.db"));

        assert!(conn_str.starts_with("sqlite://"));
        assert!(conn_str.contains("test.db"));
    }

    #[test]
    fn test_create_pool_options_with_timeout() {
        let service = DatabaseConnectionService::new();
        let pool_options = service.create_pool_options_with_timeout(Some(60));

        assert!(format!("{:?}", pool_options).contains("PoolOptions"));
    }

    #[tokio::test]
    async fn test_sqlite_pool_connects() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blckbx.db");
        let config = DatabaseConfig::new(path.to_string_lossy());

        let service = DatabaseConnectionService::new();
        let pool = service.create_pool(Dialect::SQLite, &config).await.unwrap();

        assert!(service.test_connection(&pool).await.is_ok());
        service.close_pool(pool).await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_read_only_pool_does_not_create_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blckbx.db");
        let config = DatabaseConfig::new(path.to_string_lossy());

        let service = DatabaseConnectionService::new();
        let pool = service
            .create_read_only_pool(Dialect::SQLite, &config)
            .await
            .unwrap();

        assert!(service.test_connection(&pool).await.is_ok());
        service.close_pool(pool).await;
        assert!(!path.exists());
    }
}
