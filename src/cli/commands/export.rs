// exportコマンドハンドラー
//
// カタログをコレクションのインポート形式（JSON配列）で出力します。

use crate::core::catalog::{itinerary_catalog, Catalog};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// exportコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ExportCommand {
    /// 出力するカタログ
    pub catalog: Catalog,
    /// 出力先ファイル（指定されない場合は標準出力）
    pub output: Option<PathBuf>,
}

impl ExportCommand {
    /// 固定カタログを出力するコマンドを作成
    pub fn new(output: Option<PathBuf>) -> Self {
        Self {
            catalog: itinerary_catalog(),
            output,
        }
    }
}

/// exportコマンドハンドラー
#[derive(Debug, Clone)]
pub struct ExportCommandHandler {}

impl ExportCommandHandler {
    /// 新しいExportCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// exportコマンドを実行
    ///
    /// # Returns
    ///
    /// 標準出力の場合はJSON、ファイル出力の場合は完了メッセージ
    pub fn execute(&self, command: &ExportCommand) -> Result<String> {
        let json = self.to_import_json(&command.catalog)?;

        match &command.output {
            None => Ok(json),
            Some(path) => {
                fs::write(path, format!("{}\n", json))
                    .with_context(|| format!("Failed to write export file: {:?}", path))?;
                Ok(format!(
                    "Exported {} collections to {}",
                    command.catalog.len(),
                    path.display()
                ))
            }
        }
    }

    /// カタログをインポート形式のJSONに変換
    pub fn to_import_json(&self, catalog: &Catalog) -> Result<String> {
        serde_json::to_string_pretty(catalog.collections())
            .with_context(|| "Failed to serialize collection catalog")
    }
}

impl Default for ExportCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collection::Collection;

    #[test]
    fn test_export_round_trips_catalog() {
        let handler = ExportCommandHandler::new();
        let json = handler.execute(&ExportCommand::new(None)).unwrap();

        let collections: Vec<Collection> = serde_json::from_str(&json).unwrap();
        assert_eq!(collections, itinerary_catalog().collections);
    }
}
