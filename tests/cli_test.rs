/// CLI引数パースのテスト
///
/// サブコマンドとグローバルオプションが正しく解釈されることを確認します。

#[cfg(test)]
mod cli_tests {
    use blckbx_schema::cli::{Cli, Commands};
    use clap::Parser;
    use std::path::PathBuf;

    /// initの既定値
    #[test]
    fn test_parse_init_defaults() {
        let cli = Cli::try_parse_from(["blckbx-schema", "init"]).unwrap();

        match cli.command {
            Commands::Init { dialect, force } => {
                assert_eq!(dialect, "sqlite");
                assert!(!force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    /// applyのオプション
    #[test]
    fn test_parse_apply_options() {
        let cli = Cli::try_parse_from([
            "blckbx-schema",
            "apply",
            "--env",
            "production",
            "--dry-run",
            "--on-conflict",
            "skip",
            "--force",
        ])
        .unwrap();

        match cli.command {
            Commands::Apply {
                env,
                dry_run,
                on_conflict,
                force,
            } => {
                assert_eq!(env, "production");
                assert!(dry_run);
                assert_eq!(on_conflict.as_deref(), Some("skip"));
                assert!(force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    /// applyの既定値
    #[test]
    fn test_parse_apply_defaults() {
        let cli = Cli::try_parse_from(["blckbx-schema", "apply"]).unwrap();

        match cli.command {
            Commands::Apply {
                env,
                dry_run,
                on_conflict,
                force,
            } => {
                assert_eq!(env, "development");
                assert!(!dry_run);
                assert!(on_conflict.is_none());
                assert!(!force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    /// グローバルオプションはサブコマンドの後ろにも置ける
    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "blckbx-schema",
            "status",
            "--config",
            "conf/app.yaml",
            "-v",
            "--no-color",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("conf/app.yaml")));
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Commands::Status { .. }));
    }

    /// exportの出力先
    #[test]
    fn test_parse_export_output() {
        let cli = Cli::try_parse_from(["blckbx-schema", "export", "-o", "pb_schema.json"]).unwrap();

        match cli.command {
            Commands::Export { output } => {
                assert_eq!(output, Some(PathBuf::from("pb_schema.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    /// サブコマンドなしや未知のサブコマンドはエラー
    #[test]
    fn test_invalid_invocations() {
        assert!(Cli::try_parse_from(["blckbx-schema"]).is_err());
        assert!(Cli::try_parse_from(["blckbx-schema", "rollback"]).is_err());
        assert!(Cli::try_parse_from(["blckbx-schema", "validate", "--dry-run"]).is_err());
    }
}
