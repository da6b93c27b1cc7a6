// カタログバリデーターサービス
//
// コレクションカタログの整合性、参照整合性、フィールド制約の検証を行うサービス。
// フィールド識別子の一意性、リレーション参照先、selectの既定値などを検証します。

use crate::core::catalog::Catalog;
use crate::core::collection::{Collection, Field, FieldType};
use crate::core::error::{
    ErrorLocation, ValidationError, ValidationResult, ValidationWarning,
};
use crate::core::naming;
use crate::services::dependency_order;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
});

/// カタログバリデーターサービス
///
/// カタログ定義の検証を行います。
#[derive(Debug, Clone)]
pub struct CatalogValidatorService {}

impl CatalogValidatorService {
    /// 新しいCatalogValidatorServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// カタログ全体の検証を実行
    ///
    /// # Arguments
    ///
    /// * `catalog` - 検証対象のカタログ
    ///
    /// # Returns
    ///
    /// 検証結果（エラーと警告のリストを含む）
    pub fn validate(&self, catalog: &Catalog) -> ValidationResult {
        let mut result = ValidationResult::new();

        // 空のカタログは有効
        if catalog.is_empty() {
            return result;
        }

        let mut seen_collections = HashSet::new();
        for collection in catalog.collections() {
            if !seen_collections.insert(collection.name.as_str()) {
                result.add_error(ValidationError::Constraint {
                    message: format!("Collection '{}' is declared more than once", collection.name),
                    location: Some(ErrorLocation::with_collection(&collection.name)),
                    suggestion: Some("Merge the duplicate declarations".to_string()),
                });
            }

            result.merge(self.validate_collection(catalog, collection));
        }

        result.merge(self.validate_referential_integrity(catalog));

        if let Err(error) = dependency_order::resolve(catalog) {
            result.add_error(error);
        }

        result
    }

    /// 単一コレクションの検証
    pub fn validate_collection(&self, catalog: &Catalog, collection: &Collection) -> ValidationResult {
        let mut result = ValidationResult::new();
        let name = collection.name.as_str();

        if !IDENTIFIER.is_match(name) {
            result.add_error(ValidationError::Syntax {
                message: format!("Collection name '{}' is not a valid identifier", name),
                location: Some(ErrorLocation::with_collection(name)),
                suggestion: Some("Use letters, digits and underscores only".to_string()),
            });
        }

        if naming::is_system_collection(name) {
            result.add_error(ValidationError::Constraint {
                message: format!("Collection '{}' is provided by the framework", name),
                location: Some(ErrorLocation::with_collection(name)),
                suggestion: Some("Choose a different collection name".to_string()),
            });
        }

        if collection.fields.is_empty() {
            result.add_error(ValidationError::Constraint {
                message: format!("Collection '{}' has no fields", name),
                location: Some(ErrorLocation::with_collection(name)),
                suggestion: Some("Define at least one field".to_string()),
            });
        }

        result.merge(self.validate_field_keys(collection));

        for field in &collection.fields {
            let location = Some(ErrorLocation::with_field(name, &field.name));

            if !IDENTIFIER.is_match(&field.name) {
                result.add_error(ValidationError::Syntax {
                    message: format!("Field name '{}' is not a valid identifier", field.name),
                    location: location.clone(),
                    suggestion: Some("Use letters, digits and underscores only".to_string()),
                });
            } else if naming::is_system_field(&field.name) {
                result.add_error(ValidationError::Constraint {
                    message: format!("Field name '{}' is reserved by the framework", field.name),
                    location: location.clone(),
                    suggestion: Some("Rename the field".to_string()),
                });
            }

            result.merge(self.validate_field(catalog, collection, field));
        }

        result
    }

    /// フィールド識別子とフィールド名の一意性を検証
    ///
    /// 保存済みの定義とマージした結果の確認にも使います。
    pub fn validate_field_keys(&self, collection: &Collection) -> ValidationResult {
        let mut result = ValidationResult::new();
        let mut seen_ids = HashSet::new();
        let mut seen_names = HashSet::new();

        for field in &collection.fields {
            let location = Some(ErrorLocation::with_field(&collection.name, &field.name));

            if field.id.is_empty() {
                result.add_error(ValidationError::Syntax {
                    message: format!("Field '{}' has an empty identifier", field.name),
                    location: location.clone(),
                    suggestion: None,
                });
            } else if !seen_ids.insert(field.id.as_str()) {
                result.add_error(ValidationError::Constraint {
                    message: format!("Duplicate field identifier '{}'", field.id),
                    location: location.clone(),
                    suggestion: Some("Field identifiers must be unique within a collection".to_string()),
                });
            }

            if !seen_names.insert(field.name.as_str()) {
                result.add_error(ValidationError::Constraint {
                    message: format!("Duplicate field name '{}'", field.name),
                    location,
                    suggestion: None,
                });
            }
        }

        result
    }

    /// 型固有の制約と既定値の検証
    fn validate_field(&self, catalog: &Catalog, collection: &Collection, field: &Field) -> ValidationResult {
        let mut result = ValidationResult::new();
        let location = Some(ErrorLocation::with_field(&collection.name, &field.name));

        match &field.field_type {
            FieldType::Select(options) => {
                if options.values.is_empty() {
                    result.add_error(ValidationError::Constraint {
                        message: "Select field declares no values".to_string(),
                        location: location.clone(),
                        suggestion: Some("Declare at least one allowed value".to_string()),
                    });
                }

                let mut seen = HashSet::new();
                for value in &options.values {
                    if !seen.insert(value.as_str()) {
                        result.add_error(ValidationError::Constraint {
                            message: format!("Select value '{}' is declared more than once", value),
                            location: location.clone(),
                            suggestion: None,
                        });
                    }
                }

                if options.max_select == 0 {
                    result.add_error(ValidationError::Constraint {
                        message: "maxSelect must be at least 1".to_string(),
                        location: location.clone(),
                        suggestion: None,
                    });
                }

                if let Some(default) = &field.default {
                    let is_member = default
                        .as_str()
                        .is_some_and(|d| options.values.iter().any(|v| v == d));
                    if !is_member {
                        result.add_error(ValidationError::Constraint {
                            message: format!(
                                "Default {} is not one of the declared values {:?}",
                                default, options.values
                            ),
                            location: location.clone(),
                            suggestion: Some("Use a declared value as the default".to_string()),
                        });
                    }
                }
            }
            FieldType::Relation(options) => {
                if options.max_select == 0 {
                    result.add_error(ValidationError::Constraint {
                        message: "maxSelect must be at least 1".to_string(),
                        location: location.clone(),
                        suggestion: None,
                    });
                }

                if field.unique && options.max_select != 1 {
                    result.add_error(ValidationError::Constraint {
                        message: "A unique relation must be single-select".to_string(),
                        location: location.clone(),
                        suggestion: Some("Set maxSelect to 1 or drop the unique flag".to_string()),
                    });
                }

                if field.unique && !field.required {
                    result.add_warning(ValidationWarning::cardinality(
                        format!(
                            "Relation to '{}' is unique but optional; the one-to-one link may be absent",
                            options.collection_id
                        ),
                        location.clone(),
                    ));
                }

                if field.default.is_some() {
                    result.add_error(ValidationError::Constraint {
                        message: "Relation fields cannot declare a default".to_string(),
                        location: location.clone(),
                        suggestion: None,
                    });
                }

                if let (Some(target_pos), Some(own_pos)) = (
                    catalog.position(&options.collection_id),
                    catalog.position(&collection.name),
                ) {
                    if target_pos > own_pos {
                        result.add_warning(ValidationWarning::compatibility(
                            format!(
                                "Relation target '{}' is declared after '{}'; it will be created first",
                                options.collection_id, collection.name
                            ),
                            location.clone(),
                        ));
                    }
                }
            }
            FieldType::File(options) => {
                if options.max_select == 0 || options.max_size == 0 {
                    result.add_error(ValidationError::Constraint {
                        message: "File limits (maxSelect, maxSize) must be positive".to_string(),
                        location: location.clone(),
                        suggestion: None,
                    });
                }
                if field.unique {
                    result.add_error(ValidationError::Constraint {
                        message: "File fields cannot be unique".to_string(),
                        location: location.clone(),
                        suggestion: None,
                    });
                }
                if field.default.is_some() {
                    result.add_error(ValidationError::Constraint {
                        message: "File fields cannot declare a default".to_string(),
                        location: location.clone(),
                        suggestion: None,
                    });
                }
            }
            FieldType::Json => {
                if field.unique {
                    result.add_error(ValidationError::Constraint {
                        message: "JSON fields cannot be unique".to_string(),
                        location: location.clone(),
                        suggestion: None,
                    });
                }
            }
            FieldType::Text
            | FieldType::Number
            | FieldType::Bool
            | FieldType::Url
            | FieldType::Email => {
                if let Some(default) = &field.default {
                    if !default_matches_type(&field.field_type, default) {
                        result.add_error(ValidationError::Constraint {
                            message: format!(
                                "Default {} does not match field type '{}'",
                                default,
                                field.type_name()
                            ),
                            location: location.clone(),
                            suggestion: None,
                        });
                    }
                }
            }
        }

        result
    }

    /// リレーションの参照整合性を検証
    ///
    /// すべての参照先がカタログ内またはシステムコレクションとして存在することを確認します。
    pub fn validate_referential_integrity(&self, catalog: &Catalog) -> ValidationResult {
        let mut result = ValidationResult::new();

        for collection in catalog.collections() {
            for field in &collection.fields {
                let Some(target) = field.relation_target() else {
                    continue;
                };

                if !catalog.has_collection(target) && !naming::is_system_collection(target) {
                    result.add_error(ValidationError::Reference {
                        message: format!("Relation target collection '{}' does not exist", target),
                        location: Some(ErrorLocation::with_field(&collection.name, &field.name)),
                        suggestion: Some(format!("Declare collection '{}'", target)),
                    });
                }
            }
        }

        result
    }
}

impl Default for CatalogValidatorService {
    fn default() -> Self {
        Self::new()
    }
}

fn default_matches_type(field_type: &FieldType, default: &Value) -> bool {
    match field_type {
        FieldType::Bool => default.is_boolean(),
        FieldType::Number => default.is_number(),
        FieldType::Json => true,
        t if t.is_textual() => default.is_string(),
        _ => false,
    }
}
