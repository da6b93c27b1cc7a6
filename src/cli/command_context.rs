// コマンド共通コンテキスト
//
// 設定ファイル読み込み、環境変数による上書き、パス解決をCLI層で集約する。

use crate::core::config::{Config, ConflictPolicy, DatabaseConfig, Dialect};
use crate::services::config_loader::ConfigLoader;
use crate::services::database_config_resolver::DatabaseConfigResolver;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// 設定ファイルのパスを解決
    ///
    /// 明示的に指定されたパスが相対パスの場合はプロジェクトルートからの相対とします。
    pub fn resolve_config_path(project_path: &Path, config_path: Option<&Path>) -> PathBuf {
        match config_path {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => project_path.join(path),
            None => project_path.join(Config::DEFAULT_CONFIG_PATH),
        }
    }

    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    pub fn load(project_path: PathBuf, config_path: Option<&Path>) -> Result<Self> {
        let config_path = Self::resolve_config_path(&project_path, config_path);
        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {:?}. Please initialize the project first with the `init` command.",
                config_path
            ));
        }

        let config =
            ConfigLoader::from_file(&config_path).with_context(|| "Failed to read config file")?;

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// 方言
    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// 方針（コマンドラインの指定が設定ファイルより優先）
    pub fn conflict_policy(&self, requested: Option<&str>) -> Result<ConflictPolicy> {
        match requested {
            Some(policy) => policy.parse(),
            None => Ok(self.config.on_conflict),
        }
    }

    /// 環境のデータベース設定を取得
    ///
    /// 環境変数による上書きを適用し、SQLiteの相対パスは設定ファイルのディレクトリ基準に解決します。
    pub fn database_config(&self, environment: &str) -> Result<DatabaseConfig> {
        let base = self.config.get_database_config(environment)?;
        let mut resolved = DatabaseConfigResolver::apply_env_overrides(&base);
        resolved
            .validate()
            .with_context(|| format!("Invalid config for environment '{}'", environment))?;

        if self.config.dialect == Dialect::SQLite && Path::new(&resolved.database).is_relative() {
            let base_dir = self.config_path.parent().unwrap_or(self.project_path.as_path());
            resolved.database = base_dir.join(&resolved.database).to_string_lossy().into_owned();
        }

        Ok(resolved)
    }
}
