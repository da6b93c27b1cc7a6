// validateコマンドハンドラー
//
// カタログ検証機能を実装します。
// - バリデーションルールの実行
// - エラーと警告のフォーマットされた表示
// - 依存関係順のコレクション一覧の表示

use crate::core::catalog::{itinerary_catalog, Catalog};
use crate::core::error::ValidationResult;
use crate::services::catalog_validator::CatalogValidatorService;
use crate::services::dependency_order;
use anyhow::{anyhow, Result};
use colored::Colorize;

/// validateコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ValidateCommand {
    /// 検証するカタログ
    pub catalog: Catalog,
}

impl Default for ValidateCommand {
    fn default() -> Self {
        Self {
            catalog: itinerary_catalog(),
        }
    }
}

/// validateコマンドハンドラー
#[derive(Debug, Clone)]
pub struct ValidateCommandHandler {}

impl ValidateCommandHandler {
    /// 新しいValidateCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// validateコマンドを実行
    ///
    /// # Returns
    ///
    /// 成功時は検証結果のサマリー。エラーがある場合は結果全体をエラーとして返します。
    pub fn execute(&self, command: &ValidateCommand) -> Result<String> {
        let validator = CatalogValidatorService::new();
        let result = validator.validate(&command.catalog);
        let output = self.format_validation_result(&result, &command.catalog);

        if result.is_valid() {
            Ok(output)
        } else {
            Err(anyhow!("{}", output))
        }
    }

    /// 検証結果をフォーマット
    fn format_validation_result(&self, result: &ValidationResult, catalog: &Catalog) -> String {
        let mut output = String::new();

        output.push_str("=== Catalog Validation Results ===\n\n");

        if !result.errors.is_empty() {
            output.push_str(&format!(
                "{}\n\n",
                format!("{} error(s) found:", result.errors.len()).red().bold()
            ));

            for (i, error) in result.errors.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, error));
                if let Some(suggestion) = error.suggestion() {
                    output.push_str(&format!("   Suggestion: {}\n", suggestion));
                }
                output.push('\n');
            }
        }

        if !result.warnings.is_empty() {
            output.push_str(&format!(
                "{}\n",
                format!("{} warning(s):", result.warnings.len()).yellow()
            ));
            for warning in &result.warnings {
                output.push_str(&format!("  {}\n", warning.format()));
            }
            output.push('\n');
        }

        // エラーがあっても順序が解決できる場合は表示する
        if let Ok(ordered) = dependency_order::resolve(catalog) {
            output.push_str("=== Creation Order ===\n");
            for (i, collection) in ordered.iter().enumerate() {
                output.push_str(&format!(
                    "{:>2}. {} ({} fields)\n",
                    i + 1,
                    collection.name,
                    collection.fields.len()
                ));
            }
        }

        output.push_str("\n=== Result ===\n");
        if result.is_valid() {
            output.push_str(&format!(
                "{}\n",
                format!(
                    "✓ Validation complete. {} collections, no errors found.",
                    catalog.len()
                )
                .green()
            ));
        } else {
            output.push_str(&format!(
                "{}\n",
                format!(
                    "✗ Validation complete. {} error(s) found.",
                    result.errors.len()
                )
                .red()
            ));
        }

        output
    }
}

impl Default for ValidateCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}
