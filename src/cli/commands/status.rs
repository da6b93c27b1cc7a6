// statusコマンドハンドラー
//
// 適用状態の確認機能を実装します。
// - 台帳に記録されたカタログのリビジョンとの照合
// - コレクションごとの状態表示（未作成 / 一致 / 差分あり）

use crate::adapters::sql_store::SqlCollectionStore;
use crate::adapters::store::CollectionStore;
use crate::cli::command_context::CommandContext;
use crate::core::catalog::{itinerary_catalog, Catalog};
use crate::core::collection::Collection;
use crate::core::migration::{MigrationRecord, MigrationStatus};
use crate::services::catalog_migrator::CatalogMigrator;
use crate::services::collection_diff::CollectionDiffService;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

/// statusコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct StatusCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// 設定ファイルのパス（指定されない場合は既定のパス）
    pub config_path: Option<PathBuf>,
    /// 環境名
    pub env: String,
}

/// コレクションの状態
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionState {
    /// ストアに存在しない
    Missing,
    /// 宣言と一致
    InSync,
    /// 宣言と異なる（差分の要約）
    Drifted(String),
}

/// statusコマンドハンドラー
#[derive(Debug, Clone)]
pub struct StatusCommandHandler {}

impl StatusCommandHandler {
    /// 新しいStatusCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// statusコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - statusコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は適用状態のサマリー、失敗時はエラーメッセージ
    pub async fn execute(&self, command: &StatusCommand) -> Result<String> {
        let context = CommandContext::load(command.project_path.clone(), command.config_path.as_deref())?;
        let db_config = context.database_config(&command.env)?;

        let store = SqlCollectionStore::connect_read_only(context.dialect(), &db_config)
            .await
            .with_context(|| format!("Failed to connect to the '{}' database", command.env))?;

        let catalog = itinerary_catalog();
        let status = CatalogMigrator::new(&store).status(&catalog).await;
        let stored = store.list_collections().await;
        store.close().await;

        let (record, status) = status.with_context(|| "Failed to read migration ledger")?;
        let stored = stored.with_context(|| "Failed to read stored collections")?;

        let states = self.collection_states(&catalog, &stored);
        Ok(self.format_status(&catalog, record.as_ref(), &status, &states))
    }

    /// カタログの各コレクションの状態を判定
    pub fn collection_states(
        &self,
        catalog: &Catalog,
        stored: &[Collection],
    ) -> Vec<(String, CollectionState)> {
        let diff_service = CollectionDiffService::new();

        catalog
            .collections()
            .iter()
            .map(|declared| {
                let state = match stored.iter().find(|c| c.name == declared.name) {
                    None => CollectionState::Missing,
                    Some(existing) => {
                        let diff = diff_service.diff(existing, declared);
                        if diff.is_empty() {
                            CollectionState::InSync
                        } else {
                            CollectionState::Drifted(diff.summary())
                        }
                    }
                };
                (declared.name.clone(), state)
            })
            .collect()
    }

    /// 状態をフォーマット
    pub fn format_status(
        &self,
        catalog: &Catalog,
        record: Option<&MigrationRecord>,
        status: &MigrationStatus,
        states: &[(String, CollectionState)],
    ) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n\n", "=== Catalog Status ===".bold()));
        output.push_str(&format!(
            "Migration {}_{}: {}\n",
            catalog.version,
            catalog.name,
            match status {
                MigrationStatus::Applied => "Applied".green().to_string(),
                MigrationStatus::Pending => "Pending".yellow().to_string(),
                MigrationStatus::Outdated { .. } => "Outdated (catalog changed since last apply)".red().to_string(),
            }
        ));
        if let Some(record) = record {
            output.push_str(&format!("Applied at: {}\n", record.applied_at.to_rfc3339()));
        }
        output.push('\n');

        output.push_str(&format!("{:<28} {}\n", "Collection", "State"));
        output.push_str(&format!("{}\n", "-".repeat(50)));
        for (name, state) in states {
            let state = match state {
                CollectionState::Missing => "missing".yellow().to_string(),
                CollectionState::InSync => "in sync".green().to_string(),
                CollectionState::Drifted(summary) => format!("{} ({})", "drifted".red(), summary),
            };
            output.push_str(&format!("{:<28} {}\n", name, state));
        }

        output
    }
}

impl Default for StatusCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collection::Field;

    #[test]
    fn test_collection_states() {
        let catalog = itinerary_catalog();
        let mut drifted = catalog.get("destinations").unwrap().clone();
        drifted.fields.retain(|f| f.name != "displayOrder");
        let stored = vec![
            catalog.get("projects").unwrap().clone(),
            drifted,
            Collection::base("legacy").with_field(Field::text("name")),
        ];

        let states = StatusCommandHandler::new().collection_states(&catalog, &stored);

        assert_eq!(states.len(), 11);
        assert_eq!(states[0], ("projects".to_string(), CollectionState::InSync));
        assert_eq!(
            states[1],
            (
                "destinations".to_string(),
                CollectionState::Drifted("+displayOrder".to_string())
            )
        );
        assert_eq!(states[2].1, CollectionState::Missing);
    }
}
