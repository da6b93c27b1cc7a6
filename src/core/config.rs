// 設定ファイル管理
//
// プロジェクトの設定ファイル（YAML形式）の型定義と検証、
// 環境別のデータベース接続設定の管理を行います。

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// データベース方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(rename = "postgresql")]
    PostgreSQL,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "sqlite")]
    SQLite,
}

impl Dialect {
    /// 既定のポート番号
    pub fn default_port(&self) -> u16 {
        match self {
            Dialect::PostgreSQL => 5432,
            Dialect::MySQL => 3306,
            Dialect::SQLite => 0,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::PostgreSQL => write!(f, "postgresql"),
            Dialect::MySQL => write!(f, "mysql"),
            Dialect::SQLite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgresql" | "postgres" => Ok(Dialect::PostgreSQL),
            "mysql" => Ok(Dialect::MySQL),
            "sqlite" => Ok(Dialect::SQLite),
            other => Err(anyhow!(
                "Unsupported database dialect: {}. Please specify one of: postgresql, mysql, sqlite.",
                other
            )),
        }
    }
}

/// 既存コレクションに対する再実行時の方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// 宣言された定義とマージして更新（ストアにしかないフィールドは保持）
    #[default]
    Update,
    /// 既存コレクションには触れない
    Skip,
    /// 既存コレクションがあればエラー
    Fail,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::Update => write!(f, "update"),
            ConflictPolicy::Skip => write!(f, "skip"),
            ConflictPolicy::Fail => write!(f, "fail"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(ConflictPolicy::Update),
            "skip" => Ok(ConflictPolicy::Skip),
            "fail" => Ok(ConflictPolicy::Fail),
            other => Err(anyhow!(
                "Unsupported conflict policy: {}. Please specify one of: update, skip, fail.",
                other
            )),
        }
    }
}

/// プロジェクト設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 設定ファイルのバージョン
    pub version: String,

    /// データベース方言
    pub dialect: Dialect,

    /// 既存コレクションに対する方針
    #[serde(default)]
    pub on_conflict: ConflictPolicy,

    /// 環境別のデータベース設定
    pub environments: BTreeMap<String, DatabaseConfig>,
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 指定された環境のデータベース設定を取得
    pub fn get_database_config(&self, environment: &str) -> Result<DatabaseConfig> {
        self.environments.get(environment).cloned().ok_or_else(|| {
            anyhow!(
                "Environment '{}' not found. Available environments: {:?}",
                environment,
                self.environments.keys().collect::<Vec<_>>()
            )
        })
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(anyhow!("Config file version is not specified"));
        }

        if self.environments.is_empty() {
            return Err(anyhow!(
                "At least one environment configuration is required"
            ));
        }

        for (env_name, db_config) in &self.environments {
            db_config
                .validate()
                .with_context(|| format!("Invalid config for environment '{}'", env_name))?;
        }

        Ok(())
    }

    /// 方言ごとの既定設定を作成
    pub fn default_for(dialect: Dialect) -> Self {
        let development = match dialect {
            Dialect::SQLite => DatabaseConfig::new("blckbx.db"),
            Dialect::PostgreSQL => DatabaseConfig {
                user: Some("postgres".to_string()),
                ..DatabaseConfig::new("blckbx")
            },
            Dialect::MySQL => DatabaseConfig {
                user: Some("root".to_string()),
                ..DatabaseConfig::new("blckbx")
            },
        };

        let mut environments = BTreeMap::new();
        environments.insert("development".to_string(), development);

        Self {
            version: "1.0".to_string(),
            dialect,
            on_conflict: ConflictPolicy::default(),
            environments,
        }
    }
}

/// std::str::FromStrトレイトの実装
impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

/// データベース接続設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// ホスト名（SQLiteの場合は不要）
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号（未指定の場合は方言の既定値）
    #[serde(default)]
    pub port: Option<u16>,

    /// データベース名（SQLiteの場合はファイルパス）
    pub database: String,

    /// ユーザー名
    #[serde(default)]
    pub user: Option<String>,

    /// パスワード
    #[serde(default)]
    pub password: Option<String>,

    /// 接続タイムアウト（秒）
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl DatabaseConfig {
    /// データベース名のみを指定して作成
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: None,
            database: database.into(),
            user: None,
            password: None,
            timeout: None,
        }
    }

    /// 方言を考慮したポート番号
    pub fn port_for(&self, dialect: Dialect) -> u16 {
        self.port.unwrap_or_else(|| dialect.default_port())
    }

    /// Validate database configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(anyhow!("Database name is not specified"));
        }

        Ok(())
    }
}
