// applyコマンドハンドラー
//
// カタログ適用機能を実装します。
// - データベース接続とメタデータテーブルの準備（ドライランは読み取り専用）
// - 既存コレクションとの照合と方針に応じた作成・更新
// - 台帳への記録
// - ドライランモード（計画の表示のみ）

use crate::adapters::sql_store::SqlCollectionStore;
use crate::cli::command_context::CommandContext;
use crate::core::catalog::{itinerary_catalog, Catalog};
use crate::core::config::ConflictPolicy;
use crate::core::migration::MigrationStatus;
use crate::services::catalog_migrator::{ApplyOutcome, CatalogMigrator};
use crate::services::schema_loader::{LoadAction, LoadPlan, LoadReport};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

/// applyコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ApplyCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// 設定ファイルのパス（指定されない場合は既定のパス）
    pub config_path: Option<PathBuf>,
    /// 環境名
    pub env: String,
    /// ドライラン
    pub dry_run: bool,
    /// 既存コレクションの扱い（指定されない場合は設定ファイルの値）
    pub on_conflict: Option<String>,
    /// 適用済みでも再実行
    pub force: bool,
}

/// applyコマンドハンドラー
#[derive(Debug, Clone)]
pub struct ApplyCommandHandler {}

impl ApplyCommandHandler {
    /// 新しいApplyCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// applyコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - applyコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は適用結果のサマリー、失敗時はエラーメッセージ
    pub async fn execute(&self, command: &ApplyCommand) -> Result<String> {
        let context = CommandContext::load(command.project_path.clone(), command.config_path.as_deref())?;
        let policy = context.conflict_policy(command.on_conflict.as_deref())?;
        let db_config = context.database_config(&command.env)?;

        // ドライランはデータベースに何も作成しない
        let store = if command.dry_run {
            SqlCollectionStore::connect_read_only(context.dialect(), &db_config).await
        } else {
            SqlCollectionStore::connect(context.dialect(), &db_config).await
        }
        .with_context(|| format!("Failed to connect to the '{}' database", command.env))?;

        let catalog = itinerary_catalog();
        let migrator = CatalogMigrator::new(&store)
            .with_policy(policy)
            .with_force(command.force);

        let result = if command.dry_run {
            migrator
                .plan(&catalog)
                .await
                .map(|(status, plan)| self.format_plan(&catalog, &status, &plan, policy))
        } else {
            migrator
                .apply(&catalog)
                .await
                .map(|outcome| self.format_outcome(&catalog, &outcome))
        };

        store.close().await;
        result.with_context(|| "Failed to apply collection catalog")
    }

    /// ドライランの計画をフォーマット
    pub fn format_plan(
        &self,
        catalog: &Catalog,
        status: &MigrationStatus,
        plan: &LoadPlan,
        policy: ConflictPolicy,
    ) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n\n", "=== Apply Plan (dry run) ===".bold()));
        output.push_str(&format!(
            "Migration {}_{}: {}\n",
            catalog.version,
            catalog.name,
            status.kind()
        ));
        output.push_str(&format!("On conflict: {}\n\n", policy));

        for planned in &plan.collections {
            output.push_str(&format!("  {}\n", self.format_action(&planned.name, &planned.action)));
        }

        output.push_str(&format!(
            "\n{} create, {} update, {} unchanged, {} skip\n",
            plan.count("create"),
            plan.count("update"),
            plan.count("unchanged"),
            plan.count("skip")
        ));
        if status.is_applied() {
            output.push_str("This catalog revision is already applied; apply is a no-op unless --force is given.\n");
        }

        output
    }

    /// 適用結果をフォーマット
    pub fn format_outcome(&self, catalog: &Catalog, outcome: &ApplyOutcome) -> String {
        match outcome {
            ApplyOutcome::AlreadyApplied(record) => format!(
                "{} Migration {}_{} already applied at {}. Nothing to do.",
                "✓".green(),
                catalog.version,
                catalog.name,
                record.applied_at.to_rfc3339()
            ),
            ApplyOutcome::Applied { report, record } => {
                let mut output = self.format_report(report);
                output.push_str(&format!(
                    "\n{} Migration {}_{} recorded (checksum {}).",
                    "✓".green(),
                    record.version,
                    record.name,
                    &record.checksum[..record.checksum.len().min(12)]
                ));
                output
            }
        }
    }

    fn format_report(&self, report: &LoadReport) -> String {
        let mut output = String::new();
        for (name, action) in &report.outcomes {
            output.push_str(&format!("  {}\n", self.format_action(name, action)));
        }
        output.push_str(&format!("\n{}\n", report.summary()));
        output
    }

    fn format_action(&self, name: &str, action: &LoadAction) -> String {
        match action {
            LoadAction::Create => format!("{} {}", "+".green(), name),
            LoadAction::Update(diff) => format!("{} {} ({})", "~".yellow(), name, diff.summary()),
            LoadAction::Unchanged => format!("= {}", name),
            LoadAction::Skip => format!("{} {} (skipped)", "-".dimmed(), name),
        }
    }
}

impl Default for ApplyCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::collection_diff::CollectionDiff;

    #[test]
    fn test_format_action() {
        colored::control::set_override(false);
        let handler = ApplyCommandHandler::new();

        assert_eq!(handler.format_action("projects", &LoadAction::Create), "+ projects");
        assert_eq!(handler.format_action("projects", &LoadAction::Unchanged), "= projects");

        let diff = CollectionDiff {
            collection: "destinations".to_string(),
            added_fields: vec!["displayOrder".to_string()],
            ..CollectionDiff::default()
        };
        assert_eq!(
            handler.format_action("destinations", &LoadAction::Update(diff)),
            "~ destinations (+displayOrder)"
        );
    }
}
