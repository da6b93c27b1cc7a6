// カタログマイグレーターサービス
//
// カタログ登録を台帳付きのマイグレーションステップとして適用します。
// 同じチェックサムで適用済みなら何もせず、未適用または内容が変わった場合に
// ローダーを実行して台帳を更新します。

use crate::adapters::store::{CollectionStore, MigrationLedger};
use crate::core::catalog::Catalog;
use crate::core::config::ConflictPolicy;
use crate::core::error::LoaderError;
use crate::core::migration::{MigrationRecord, MigrationStatus, MigrationStep};
use crate::services::catalog_checksum::CatalogChecksumService;
use crate::services::schema_loader::{LoadPlan, LoadReport, SchemaLoader};
use chrono::Utc;
use tracing::info;

/// 適用結果
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// 同じカタログが適用済みのため何もしなかった
    AlreadyApplied(MigrationRecord),
    /// ローダーを実行して台帳に記録した
    Applied {
        /// ロード結果
        report: LoadReport,
        /// 保存した記録
        record: MigrationRecord,
    },
}

/// カタログマイグレーター
pub struct CatalogMigrator<'a, S: CollectionStore + MigrationLedger + ?Sized> {
    store: &'a S,
    policy: ConflictPolicy,
    force: bool,
    checksum_service: CatalogChecksumService,
}

impl<'a, S: CollectionStore + MigrationLedger + ?Sized> CatalogMigrator<'a, S> {
    /// 新しいCatalogMigratorを作成
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            policy: ConflictPolicy::default(),
            force: false,
            checksum_service: CatalogChecksumService::new(),
        }
    }

    /// 既存コレクションに対する方針を指定
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 適用済みでも再実行するか
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// カタログに対応するマイグレーションステップ
    pub fn step(&self, catalog: &Catalog) -> MigrationStep {
        catalog.migration_step(self.checksum_service.calculate_checksum(catalog))
    }

    /// 台帳上の記録と照合した状態を取得
    ///
    /// # Returns
    ///
    /// 台帳の記録（あれば）とステータス
    pub async fn status(
        &self,
        catalog: &Catalog,
    ) -> Result<(Option<MigrationRecord>, MigrationStatus), LoaderError> {
        let step = self.step(catalog);
        let record = self.find_record(&step).await?;
        let status = step.status_against(record.as_ref());
        Ok((record, status))
    }

    /// 書き込みを行わずに計画を作成
    pub async fn plan(&self, catalog: &Catalog) -> Result<(MigrationStatus, LoadPlan), LoaderError> {
        let (_, status) = self.status(catalog).await?;
        let plan = SchemaLoader::new(self.store)
            .with_policy(self.policy)
            .plan(catalog)
            .await?;
        Ok((status, plan))
    }

    /// カタログを適用
    ///
    /// # Arguments
    ///
    /// * `catalog` - 適用するカタログ
    ///
    /// # Returns
    ///
    /// 適用結果。コレクションの登録に失敗した場合は台帳を更新せずにエラーを返します。
    pub async fn apply(&self, catalog: &Catalog) -> Result<ApplyOutcome, LoaderError> {
        let step = self.step(catalog);
        let existing = self.find_record(&step).await?;

        if let Some(record) = existing {
            if record.verify_checksum(&step.checksum) && !self.force {
                info!(version = %step.version, "migration already applied");
                return Ok(ApplyOutcome::AlreadyApplied(record));
            }
        }

        let report = SchemaLoader::new(self.store)
            .with_policy(self.policy)
            .load(catalog)
            .await?;

        let record = step.to_record(Utc::now());
        self.store
            .record_migration(&record)
            .await
            .map_err(|source| LoaderError::Ledger {
                version: step.version.clone(),
                source,
            })?;
        info!(version = %record.version, summary = %report.summary(), "migration recorded");

        Ok(ApplyOutcome::Applied { report, record })
    }

    async fn find_record(&self, step: &MigrationStep) -> Result<Option<MigrationRecord>, LoaderError> {
        self.store
            .find_migration(&step.version)
            .await
            .map_err(|source| LoaderError::Ledger {
                version: step.version.clone(),
                source,
            })
    }
}
