// マイグレーションドメインモデル
//
// カタログ登録をバージョン付きマイグレーションステップとして表現します。
// MigrationStep（これから適用するもの）と MigrationRecord（台帳に記録されたもの）を提供します。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// マイグレーションステップ
///
/// カタログのバージョン、名前、チェックサムを表現します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationStep {
    /// マイグレーションバージョン（UNIX秒）
    pub version: String,

    /// マイグレーション名
    pub name: String,

    /// カタログのチェックサム（SHA-256）
    pub checksum: String,
}

impl MigrationStep {
    /// 新しいマイグレーションステップを作成
    pub fn new(version: String, name: String, checksum: String) -> Self {
        Self {
            version,
            name,
            checksum,
        }
    }

    /// 適用記録を作成
    pub fn to_record(&self, applied_at: DateTime<Utc>) -> MigrationRecord {
        MigrationRecord {
            version: self.version.clone(),
            name: self.name.clone(),
            checksum: self.checksum.clone(),
            applied_at,
        }
    }

    /// 台帳上の記録と照合した状態
    pub fn status_against(&self, record: Option<&MigrationRecord>) -> MigrationStatus {
        match record {
            None => MigrationStatus::Pending,
            Some(record) if record.verify_checksum(&self.checksum) => MigrationStatus::Applied,
            Some(record) => MigrationStatus::Outdated {
                recorded_checksum: record.checksum.clone(),
            },
        }
    }
}

/// マイグレーション記録
///
/// ストアの台帳に記録された適用済みマイグレーションの情報を表現します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// マイグレーションバージョン
    pub version: String,

    /// マイグレーション名
    pub name: String,

    /// 適用時のカタログのチェックサム
    pub checksum: String,

    /// マイグレーションが適用された日時
    pub applied_at: DateTime<Utc>,
}

impl MigrationRecord {
    /// チェックサムが一致するか確認
    pub fn verify_checksum(&self, expected_checksum: &str) -> bool {
        self.checksum == expected_checksum
    }
}

/// マイグレーションステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum MigrationStatus {
    /// 未適用
    Pending,

    /// 同一のカタログで適用済み
    Applied,

    /// 異なるカタログで適用済み（再適用が必要）
    Outdated {
        /// 台帳上のチェックサム
        recorded_checksum: String,
    },
}

impl MigrationStatus {
    /// ステータスの種類を文字列で取得
    pub fn kind(&self) -> &'static str {
        match self {
            MigrationStatus::Pending => "Pending",
            MigrationStatus::Applied => "Applied",
            MigrationStatus::Outdated { .. } => "Outdated",
        }
    }

    /// 適用済み状態かどうか
    pub fn is_applied(&self) -> bool {
        matches!(self, MigrationStatus::Applied)
    }
}
