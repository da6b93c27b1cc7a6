// initコマンドハンドラー
//
// プロジェクトの初期化処理を実装します。
// - 方言ごとのデフォルト設定ファイルの生成（.blckbx.yaml）
// - 初期化済みプロジェクトの検出と警告

use crate::core::config::{Config, Dialect};
use crate::services::config_loader::ConfigLoader;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// initコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct InitCommand {
    /// 設定ファイルのパス
    pub config_path: PathBuf,
    /// データベース方言
    pub dialect: Dialect,
    /// 強制的に初期化（既存の設定を上書き）
    pub force: bool,
}

/// initコマンドハンドラー
#[derive(Debug, Clone)]
pub struct InitCommandHandler {}

impl InitCommandHandler {
    /// 新しいInitCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// initコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - initコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は完了メッセージ、失敗時はエラーメッセージ
    pub fn execute(&self, command: &InitCommand) -> Result<String> {
        if self.is_already_initialized(&command.config_path) && !command.force {
            return Err(anyhow!(
                "Project is already initialized: {:?}. Use --force option to overwrite the configuration.",
                command.config_path
            ));
        }

        let config = Config::default_for(command.dialect);
        let yaml = ConfigLoader::to_yaml(&config)?;

        if let Some(parent) = command.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }
        fs::write(&command.config_path, yaml)
            .with_context(|| format!("Failed to write config file: {:?}", command.config_path))?;

        info!(path = ?command.config_path, dialect = %command.dialect, "config written");
        Ok(format!(
            "Project initialized ({}). Config written to {}",
            command.dialect,
            command.config_path.display()
        ))
    }

    /// プロジェクトが既に初期化されているかチェック
    pub fn is_already_initialized(&self, config_path: &Path) -> bool {
        config_path.exists()
    }
}

impl Default for InitCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let command = InitCommand {
            config_path: dir.path().join(Config::DEFAULT_CONFIG_PATH),
            dialect: Dialect::SQLite,
            force: false,
        };
        let handler = InitCommandHandler::new();

        handler.execute(&command).unwrap();
        assert!(handler.execute(&command).is_err());
        assert!(handler
            .execute(&InitCommand {
                force: true,
                ..command
            })
            .is_ok());
    }
}
