use anyhow::{Context, Result};
use blckbx_schema::cli::command_context::CommandContext;
use blckbx_schema::cli::commands::apply::{ApplyCommand, ApplyCommandHandler};
use blckbx_schema::cli::commands::export::{ExportCommand, ExportCommandHandler};
use blckbx_schema::cli::commands::init::{InitCommand, InitCommandHandler};
use blckbx_schema::cli::commands::status::{StatusCommand, StatusCommandHandler};
use blckbx_schema::cli::commands::validate::{ValidateCommand, ValidateCommandHandler};
use blckbx_schema::cli::{Cli, Commands};
use blckbx_schema::core::config::Dialect;
use clap::Parser;
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose);

    // 非同期ランタイムを作成して実行
    let result = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .and_then(|runtime| runtime.block_on(run_command(cli)));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する
///
/// RUST_LOG が設定されていればそれを優先し、未設定なら warn（--verbose の場合は debug）。
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,blckbx_schema=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    match cli.command {
        Commands::Init { dialect, force } => {
            let dialect: Dialect = dialect.parse()?;
            let command = InitCommand {
                config_path: CommandContext::resolve_config_path(&project_path, cli.config.as_deref()),
                dialect,
                force,
            };
            InitCommandHandler::new().execute(&command)
        }

        Commands::Validate => ValidateCommandHandler::new().execute(&ValidateCommand::default()),

        Commands::Apply {
            env,
            dry_run,
            on_conflict,
            force,
        } => {
            let command = ApplyCommand {
                project_path,
                config_path: cli.config,
                env,
                dry_run,
                on_conflict,
                force,
            };
            ApplyCommandHandler::new().execute(&command).await
        }

        Commands::Status { env } => {
            let command = StatusCommand {
                project_path,
                config_path: cli.config,
                env,
            };
            StatusCommandHandler::new().execute(&command).await
        }

        Commands::Export { output } => {
            ExportCommandHandler::new().execute(&ExportCommand::new(output))
        }
    }
}
