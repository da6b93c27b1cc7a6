/// コマンドハンドラーの統合テスト
///
/// 一時ディレクトリ上で init → apply → status → export の一連の流れを
/// SQLiteデータベースに対して実行し、出力と状態を確認します。

#[cfg(test)]
mod command_workflow_tests {
    use blckbx_schema::cli::commands::apply::{ApplyCommand, ApplyCommandHandler};
    use blckbx_schema::cli::commands::export::{ExportCommand, ExportCommandHandler};
    use blckbx_schema::cli::commands::init::{InitCommand, InitCommandHandler};
    use blckbx_schema::cli::commands::status::{StatusCommand, StatusCommandHandler};
    use blckbx_schema::cli::commands::validate::{ValidateCommand, ValidateCommandHandler};
    use blckbx_schema::core::catalog::{itinerary_catalog, Catalog};
    use blckbx_schema::core::collection::{Collection, Field};
    use blckbx_schema::core::config::{Config, Dialect};
    use blckbx_schema::services::config_loader::ConfigLoader;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// SQLite設定で初期化されたプロジェクトを作成
    fn init_project() -> TempDir {
        colored::control::set_override(false);
        let dir = TempDir::new().unwrap();
        InitCommandHandler::new()
            .execute(&InitCommand {
                config_path: dir.path().join(Config::DEFAULT_CONFIG_PATH),
                dialect: Dialect::SQLite,
                force: false,
            })
            .unwrap();
        dir
    }

    fn apply_command(dir: &TempDir) -> ApplyCommand {
        ApplyCommand {
            project_path: dir.path().to_path_buf(),
            config_path: None,
            env: "development".to_string(),
            dry_run: false,
            on_conflict: None,
            force: false,
        }
    }

    fn status_command(dir: &TempDir) -> StatusCommand {
        StatusCommand {
            project_path: dir.path().to_path_buf(),
            config_path: None,
            env: "development".to_string(),
        }
    }

    /// initは方言ごとの設定ファイルを書き出す
    #[test]
    fn test_init_writes_loadable_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("conf").join("blckbx.yaml");

        let output = InitCommandHandler::new()
            .execute(&InitCommand {
                config_path: config_path.clone(),
                dialect: Dialect::PostgreSQL,
                force: false,
            })
            .unwrap();

        assert!(output.contains("postgresql"));
        let config = ConfigLoader::from_file(&config_path).unwrap();
        assert_eq!(config.dialect, Dialect::PostgreSQL);
        assert!(config.environments.contains_key("development"));
    }

    /// 初期化前のapplyはinitを案内する
    #[tokio::test]
    async fn test_apply_without_config() {
        let dir = TempDir::new().unwrap();
        let err = ApplyCommandHandler::new()
            .execute(&apply_command(&dir))
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("init"));
    }

    /// ドライランは計画を表示するだけでデータベースにコレクションを作らない
    #[tokio::test]
    async fn test_dry_run_then_apply_then_noop() {
        let dir = init_project();
        let handler = ApplyCommandHandler::new();

        let plan = handler
            .execute(&ApplyCommand {
                dry_run: true,
                ..apply_command(&dir)
            })
            .await
            .unwrap();
        assert!(plan.contains("dry run"));
        assert!(plan.contains("+ projects"));
        assert!(plan.contains("11 create, 0 update, 0 unchanged, 0 skip"));
        assert!(plan.contains("Pending"));
        assert!(!dir.path().join("blckbx.db").exists());

        let applied = handler.execute(&apply_command(&dir)).await.unwrap();
        assert!(applied.contains("11 created, 0 updated, 0 unchanged, 0 skipped"));
        assert!(applied.contains("Migration 1727702400_init_collections recorded"));
        assert!(dir.path().join("blckbx.db").exists());

        let again = handler.execute(&apply_command(&dir)).await.unwrap();
        assert!(again.contains("already applied"));

        let forced = handler
            .execute(&ApplyCommand {
                force: true,
                ..apply_command(&dir)
            })
            .await
            .unwrap();
        assert!(forced.contains("0 created, 0 updated, 11 unchanged, 0 skipped"));
    }

    /// 不正な方針はエラー
    #[tokio::test]
    async fn test_apply_rejects_unknown_policy() {
        let dir = init_project();
        let err = ApplyCommandHandler::new()
            .execute(&ApplyCommand {
                on_conflict: Some("merge".to_string()),
                ..apply_command(&dir)
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("merge"));
    }

    /// 存在しない環境はエラー
    #[tokio::test]
    async fn test_apply_unknown_environment() {
        let dir = init_project();
        let err = ApplyCommandHandler::new()
            .execute(&ApplyCommand {
                env: "production".to_string(),
                ..apply_command(&dir)
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("production"));
    }

    /// statusは適用前後の状態を表示し、データベースを作成しない
    #[tokio::test]
    async fn test_status_before_and_after_apply() {
        let dir = init_project();
        let handler = StatusCommandHandler::new();

        let before = handler.execute(&status_command(&dir)).await.unwrap();
        assert!(before.contains("Pending"));
        assert!(before.contains("missing"));
        assert!(!dir.path().join("blckbx.db").exists());

        ApplyCommandHandler::new()
            .execute(&apply_command(&dir))
            .await
            .unwrap();

        let after = handler.execute(&status_command(&dir)).await.unwrap();
        assert!(after.contains("Applied"));
        assert!(after.contains("Applied at:"));
        assert!(after.contains("in sync"));
        assert!(!after.contains("missing"));
    }

    /// exportはファイルに書き出し、読み戻すとカタログと一致する
    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let output: PathBuf = dir.path().join("pb_schema.json");

        let message = ExportCommandHandler::new()
            .execute(&ExportCommand::new(Some(output.clone())))
            .unwrap();
        assert!(message.contains("Exported 11 collections"));

        let exported: Vec<Collection> =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(exported, itinerary_catalog().collections);
    }

    /// validateは作成順と結果を表示する
    #[test]
    fn test_validate_output() {
        colored::control::set_override(false);
        let output = ValidateCommandHandler::new()
            .execute(&ValidateCommand::default())
            .unwrap();

        assert!(output.contains("=== Creation Order ==="));
        assert!(output.contains(" 4. outbound_travel (27 fields)"));
        assert!(output.contains("✓ Validation complete. 11 collections, no errors found."));
    }

    /// validateは循環参照をエラーとして報告する
    #[test]
    fn test_validate_reports_cycle() {
        let catalog = Catalog::new("1", "cycle")
            .with_collection(
                Collection::base("a").with_field(Field::relation("b", "b", "b").required()),
            )
            .with_collection(
                Collection::base("b").with_field(Field::relation("a", "a", "a").required()),
            );

        let err = ValidateCommandHandler::new()
            .execute(&ValidateCommand { catalog })
            .unwrap_err();

        assert!(err.to_string().contains("error(s) found"));
    }
}
