// データベース設定の解決サービス
//
// 環境変数による上書きをサービス層で扱い、coreは純粋な構造体に保つ。
// 認証情報を設定ファイルに書かずに済むよう BLCKBX_DB_* を参照します。

use crate::core::config::DatabaseConfig;
use crate::core::naming::ENV_PREFIX;

/// データベース設定の解決ユーティリティ
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfigResolver;

impl DatabaseConfigResolver {
    /// 環境変数による上書きを適用
    pub fn apply_env_overrides(base: &DatabaseConfig) -> DatabaseConfig {
        Self::apply_overrides(base, |key| std::env::var(key).ok())
    }

    /// 任意の参照関数による上書きを適用
    pub fn apply_overrides<F>(base: &DatabaseConfig, lookup: F) -> DatabaseConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = base.clone();
        let var = |name: &str| lookup(&format!("{}_DB_{}", ENV_PREFIX, name));

        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(port) = var("PORT") {
            if let Ok(port_num) = port.parse::<u16>() {
                config.port = Some(port_num);
            }
        }
        if let Some(database) = var("DATABASE") {
            config.database = database;
        }
        if let Some(user) = var("USER") {
            config.user = Some(user);
        }
        if let Some(password) = var("PASSWORD") {
            config.password = Some(password);
        }

        config
    }
}
