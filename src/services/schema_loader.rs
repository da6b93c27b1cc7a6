// スキーマローダーサービス
//
// カタログのコレクションを依存関係順にストアへ登録します。
// 既存コレクションの扱いは ConflictPolicy に従い、
// ストアが失敗を報告した時点で残りのコレクションを送信せずに中断します。

use crate::adapters::store::CollectionStore;
use crate::core::catalog::Catalog;
use crate::core::collection::Collection;
use crate::core::config::ConflictPolicy;
use crate::core::error::LoaderError;
use crate::services::catalog_validator::CatalogValidatorService;
use crate::services::collection_diff::{CollectionDiff, CollectionDiffService};
use crate::services::dependency_order;
use std::fmt;
use tracing::{debug, info, warn};

/// コレクションごとの処理内容
#[derive(Debug, Clone, PartialEq)]
pub enum LoadAction {
    /// ストアに存在しないため作成
    Create,
    /// マージした定義で更新
    Update(CollectionDiff),
    /// マージ結果が保存済みの定義と同一
    Unchanged,
    /// 方針により既存コレクションに触れない
    Skip,
}

impl LoadAction {
    /// ストアへの書き込みを伴うか
    pub fn writes(&self) -> bool {
        matches!(self, LoadAction::Create | LoadAction::Update(_))
    }

    /// 表示用のラベル
    pub fn label(&self) -> &'static str {
        match self {
            LoadAction::Create => "create",
            LoadAction::Update(_) => "update",
            LoadAction::Unchanged => "unchanged",
            LoadAction::Skip => "skip",
        }
    }
}

impl fmt::Display for LoadAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadAction::Update(diff) => write!(f, "update ({})", diff.summary()),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// 計画済みのコレクション
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCollection {
    /// コレクション名
    pub name: String,
    /// 処理内容
    pub action: LoadAction,
    /// ストアに送信する定義（作成時は宣言、更新時はマージ結果）
    pub definition: Collection,
}

/// ロード計画
///
/// コレクションは依存関係順に並びます。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadPlan {
    /// 計画済みのコレクション
    pub collections: Vec<PlannedCollection>,
}

impl LoadPlan {
    /// ストアへの書き込みが不要か
    pub fn is_noop(&self) -> bool {
        self.collections.iter().all(|c| !c.action.writes())
    }

    /// 指定した処理のコレクション数
    pub fn count(&self, label: &str) -> usize {
        self.collections
            .iter()
            .filter(|c| c.action.label() == label)
            .count()
    }
}

/// ロード結果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadReport {
    /// コレクション名と実行した処理（送信順）
    pub outcomes: Vec<(String, LoadAction)>,
}

impl LoadReport {
    /// 作成したコレクション数
    pub fn created(&self) -> usize {
        self.count("create")
    }

    /// 更新したコレクション数
    pub fn updated(&self) -> usize {
        self.count("update")
    }

    /// 変更のなかったコレクション数
    pub fn unchanged(&self) -> usize {
        self.count("unchanged")
    }

    /// スキップしたコレクション数
    pub fn skipped(&self) -> usize {
        self.count("skip")
    }

    /// ストアに書き込んだコレクション名
    pub fn written(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, action)| action.writes())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// 1行の要約
    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} unchanged, {} skipped",
            self.created(),
            self.updated(),
            self.unchanged(),
            self.skipped()
        )
    }

    fn count(&self, label: &str) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, action)| action.label() == label)
            .count()
    }
}

/// スキーマローダー
///
/// ストアへの参照を借用し、カタログの登録を行います。
pub struct SchemaLoader<'a, S: CollectionStore + ?Sized> {
    store: &'a S,
    policy: ConflictPolicy,
    validator: CatalogValidatorService,
    diff_service: CollectionDiffService,
}

impl<'a, S: CollectionStore + ?Sized> SchemaLoader<'a, S> {
    /// 既定の方針（update）でローダーを作成
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            policy: ConflictPolicy::default(),
            validator: CatalogValidatorService::new(),
            diff_service: CollectionDiffService::new(),
        }
    }

    /// 既存コレクションに対する方針を指定
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 現在の方針
    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// 書き込みを行わずにロード計画を作成
    ///
    /// # Arguments
    ///
    /// * `catalog` - 登録するカタログ
    ///
    /// # Returns
    ///
    /// 依存関係順に並んだ計画、またはエラー
    ///
    /// # Errors
    ///
    /// * `InvalidCatalog` - カタログの検証に失敗した場合
    /// * `Lookup` - 既存定義の取得に失敗した場合
    /// * `CollectionExists` - `fail` 方針で既存コレクションが見つかった場合
    /// * `MergeConflict` - 保存済み定義とのマージ結果でフィールドが重複する場合
    pub async fn plan(&self, catalog: &Catalog) -> Result<LoadPlan, LoaderError> {
        let validation = self.validator.validate(catalog);
        for warning in &validation.warnings {
            warn!("{}", warning.format());
        }
        if !validation.is_valid() {
            return Err(LoaderError::InvalidCatalog {
                errors: validation.errors,
            });
        }

        let ordered = dependency_order::resolve(catalog)
            .map_err(|error| LoaderError::InvalidCatalog { errors: vec![error] })?;

        let mut plan = LoadPlan::default();
        for declared in ordered {
            let stored = self
                .store
                .find_collection(&declared.name)
                .await
                .map_err(|source| LoaderError::Lookup {
                    collection: declared.name.clone(),
                    source,
                })?;

            let planned = self.plan_collection(declared, stored)?;
            debug!(collection = %planned.name, action = %planned.action, "planned");
            plan.collections.push(planned);
        }

        Ok(plan)
    }

    /// カタログをストアに登録
    ///
    /// 計画を作成してから依存関係順に送信します。
    /// 送信に失敗した時点で中断し、以降のコレクションは送信しません。
    pub async fn load(&self, catalog: &Catalog) -> Result<LoadReport, LoaderError> {
        let plan = self.plan(catalog).await?;
        self.execute(plan).await
    }

    /// 作成済みの計画を実行
    pub async fn execute(&self, plan: LoadPlan) -> Result<LoadReport, LoaderError> {
        let mut report = LoadReport::default();

        for planned in plan.collections {
            if planned.action.writes() {
                info!(collection = %planned.name, action = %planned.action, "submitting collection");
                self.store
                    .create_or_update_collection(&planned.definition)
                    .await
                    .map_err(|source| LoaderError::CollectionCreation {
                        collection: planned.name.clone(),
                        source,
                    })?;
            } else {
                info!(collection = %planned.name, action = %planned.action, "collection left as is");
            }

            report.outcomes.push((planned.name, planned.action));
        }

        Ok(report)
    }

    fn plan_collection(
        &self,
        declared: &Collection,
        stored: Option<Collection>,
    ) -> Result<PlannedCollection, LoaderError> {
        let Some(stored) = stored else {
            return Ok(PlannedCollection {
                name: declared.name.clone(),
                action: LoadAction::Create,
                definition: declared.clone(),
            });
        };

        match self.policy {
            ConflictPolicy::Fail => Err(LoaderError::CollectionExists {
                collection: declared.name.clone(),
            }),
            ConflictPolicy::Skip => Ok(PlannedCollection {
                name: declared.name.clone(),
                action: LoadAction::Skip,
                definition: stored,
            }),
            ConflictPolicy::Update => {
                let merged = self.diff_service.merge(&stored, declared);
                let keys = self.validator.validate_field_keys(&merged);
                if !keys.is_valid() {
                    return Err(LoaderError::MergeConflict {
                        collection: declared.name.clone(),
                        errors: keys.errors,
                    });
                }

                let action = if merged == stored {
                    LoadAction::Unchanged
                } else {
                    let diff = self.diff_service.diff(&stored, declared);
                    debug!(collection = %declared.name, diff = %diff.summary(), "definition differs from store");
                    LoadAction::Update(diff)
                };

                Ok(PlannedCollection {
                    name: declared.name.clone(),
                    action,
                    definition: merged,
                })
            }
        }
    }
}
