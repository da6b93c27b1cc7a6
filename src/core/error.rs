// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、ValidationError, StoreError, LoaderError を定義します。

use thiserror::Error;

/// バリデーションエラー
///
/// コレクションカタログの検証時に発生するエラーを表現します。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Syntax error
    #[error("Syntax error: {message}{}", format_location_opt(.location))]
    Syntax {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
        /// 修正提案
        suggestion: Option<String>,
    },

    /// Reference error
    #[error("Reference error: {message}{}", format_location_opt(.location))]
    Reference {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
        /// 修正提案
        suggestion: Option<String>,
    },

    /// Constraint error
    #[error("Constraint error: {message}{}", format_location_opt(.location))]
    Constraint {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
        /// 修正提案
        suggestion: Option<String>,
    },
}

impl ValidationError {
    /// 構文エラーかどうか
    pub fn is_syntax(&self) -> bool {
        matches!(self, ValidationError::Syntax { .. })
    }

    /// 参照エラーかどうか
    pub fn is_reference(&self) -> bool {
        matches!(self, ValidationError::Reference { .. })
    }

    /// 制約エラーかどうか
    pub fn is_constraint(&self) -> bool {
        matches!(self, ValidationError::Constraint { .. })
    }

    /// エラーメッセージ本文を取得
    pub fn message(&self) -> &str {
        match self {
            ValidationError::Syntax { message, .. }
            | ValidationError::Reference { message, .. }
            | ValidationError::Constraint { message, .. } => message,
        }
    }

    /// エラー発生位置を取得
    pub fn location(&self) -> Option<&ErrorLocation> {
        match self {
            ValidationError::Syntax { location, .. }
            | ValidationError::Reference { location, .. }
            | ValidationError::Constraint { location, .. } => location.as_ref(),
        }
    }

    /// 修正提案を取得
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ValidationError::Syntax { suggestion, .. }
            | ValidationError::Reference { suggestion, .. }
            | ValidationError::Constraint { suggestion, .. } => suggestion.as_deref(),
        }
    }
}

/// バリデーション警告
///
/// エラーではないが、ユーザーに注意を促すべき事項を表します。
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// 警告メッセージ
    pub message: String,
    /// 警告発生位置
    pub location: Option<ErrorLocation>,
    /// 警告の種類
    pub kind: WarningKind,
}

/// 警告の種類
#[derive(Debug, Clone, PartialEq)]
pub enum WarningKind {
    /// リレーションの多重度に関する警告
    Cardinality,
    /// 互換性に関する警告
    Compatibility,
}

impl ValidationWarning {
    /// 新しい警告を作成
    pub fn new(message: String, location: Option<ErrorLocation>, kind: WarningKind) -> Self {
        Self {
            message,
            location,
            kind,
        }
    }

    /// 多重度の警告を作成
    pub fn cardinality(message: String, location: Option<ErrorLocation>) -> Self {
        Self::new(message, location, WarningKind::Cardinality)
    }

    /// 互換性の警告を作成
    pub fn compatibility(message: String, location: Option<ErrorLocation>) -> Self {
        Self::new(message, location, WarningKind::Compatibility)
    }

    /// 位置情報をフォーマット
    pub fn format(&self) -> String {
        let location_str = self
            .location
            .as_ref()
            .map_or(String::new(), |loc| loc.format());
        format!("Warning: {}{}", self.message, location_str)
    }
}

/// エラー発生位置
///
/// カタログ内のどのコレクション・フィールドで発生したかを表現します。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorLocation {
    /// コレクション名
    pub collection: Option<String>,
    /// フィールド名
    pub field: Option<String>,
}

impl ErrorLocation {
    /// 新しいエラー位置を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// コレクション名を指定してエラー位置を作成
    pub fn with_collection(collection: &str) -> Self {
        Self {
            collection: Some(collection.to_string()),
            field: None,
        }
    }

    /// コレクション名とフィールド名を指定してエラー位置を作成
    pub fn with_field(collection: &str, field: &str) -> Self {
        Self {
            collection: Some(collection.to_string()),
            field: Some(field.to_string()),
        }
    }

    /// 位置情報をフォーマット
    pub fn format(&self) -> String {
        let mut parts = Vec::new();

        if let Some(collection) = &self.collection {
            parts.push(format!("collection: {}", collection));
        }
        if let Some(field) = &self.field {
            parts.push(format!("field: {}", field));
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!(" ({})", parts.join(", "))
        }
    }
}

fn format_location_opt(location: &Option<ErrorLocation>) -> String {
    location.as_ref().map_or(String::new(), |loc| loc.format())
}

/// バリデーション結果
///
/// エラーと警告をまとめて保持します。
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// エラーのリスト
    pub errors: Vec<ValidationError>,
    /// 警告のリスト
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// 空の検証結果を作成
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// エラーを追加
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// 警告を追加
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// 検証が成功したかどうか（エラーがない場合は成功）
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// エラーの数を取得
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 警告の数を取得
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// 他のバリデーション結果をマージ
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// ストアエラー
///
/// コレクションストア（永続化境界）の操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection error
    #[error("Store connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// Collection not found
    #[error("Collection not found: {collection}")]
    NotFound {
        /// コレクション名
        collection: String,
    },

    /// Record rejected by a field constraint
    #[error("Constraint violation on {collection}.{field}: {message}")]
    ConstraintViolation {
        /// コレクション名
        collection: String,
        /// フィールド名
        field: String,
        /// エラーメッセージ
        message: String,
    },

    /// Stored definition could not be (de)serialized
    #[error("Serialization error: {message}")]
    Serialization {
        /// エラーメッセージ
        message: String,
    },

    /// Internal persistence failure (lock poisoning etc.)
    #[error("Persistence error: {message}")]
    Persistence {
        /// エラーメッセージ
        message: String,
    },
}

impl StoreError {
    /// コレクション未検出エラーかどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// 制約違反エラーかどうか
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation { .. })
    }
}

/// スキーマローダーエラー
///
/// ローダーは失敗した時点で残りのコレクションを処理せずに中断します。
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Collection creation failed
    #[error("Failed to create or update collection '{collection}': {source}")]
    CollectionCreation {
        /// コレクション名
        collection: String,
        /// ストアが報告したエラー
        #[source]
        source: StoreError,
    },

    /// Current definition could not be read from the store
    #[error("Failed to look up collection '{collection}': {source}")]
    Lookup {
        /// コレクション名
        collection: String,
        /// ストアが報告したエラー
        #[source]
        source: StoreError,
    },

    /// Catalog failed pre-flight validation
    #[error("Catalog is invalid ({} error(s))", .errors.len())]
    InvalidCatalog {
        /// 検証エラーのリスト
        errors: Vec<ValidationError>,
    },

    /// Collection already exists and the policy forbids touching it
    #[error("Collection '{collection}' already exists")]
    CollectionExists {
        /// コレクション名
        collection: String,
    },

    /// Stored definition cannot be merged with the declared one
    #[error("Merged definition of collection '{collection}' is invalid ({} error(s))", .errors.len())]
    MergeConflict {
        /// コレクション名
        collection: String,
        /// マージ結果の検証エラー
        errors: Vec<ValidationError>,
    },

    /// Migration ledger could not be read or written
    #[error("Failed to access migration ledger for version {version}: {source}")]
    Ledger {
        /// マイグレーションバージョン
        version: String,
        /// ストアが報告したエラー
        #[source]
        source: StoreError,
    },
}

impl LoaderError {
    /// コレクション作成エラーかどうか
    pub fn is_collection_creation(&self) -> bool {
        matches!(self, LoaderError::CollectionCreation { .. })
    }

    /// カタログ不正エラーかどうか
    pub fn is_invalid_catalog(&self) -> bool {
        matches!(self, LoaderError::InvalidCatalog { .. })
    }

    /// 失敗したコレクション名を取得
    pub fn collection(&self) -> Option<&str> {
        match self {
            LoaderError::CollectionCreation { collection, .. }
            | LoaderError::Lookup { collection, .. }
            | LoaderError::CollectionExists { collection }
            | LoaderError::MergeConflict { collection, .. } => Some(collection),
            LoaderError::InvalidCatalog { .. } | LoaderError::Ledger { .. } => None,
        }
    }
}
