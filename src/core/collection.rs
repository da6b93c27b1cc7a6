// コレクションドメインモデル
//
// バックエンドのレコードコレクション定義を表現する型システム。
// Collection, Field, FieldType などの構造体を提供します。
// JSON表現はフレームワークのインポート形式（name / type / schema / options）に合わせます。

use crate::core::error::{ErrorLocation, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// コレクションの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// 通常のレコードコレクション
    Base,
    /// 認証用コレクション（フレームワーク提供）
    Auth,
    /// 読み取り専用ビュー
    View,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Base => write!(f, "base"),
            CollectionKind::Auth => write!(f, "auth"),
            CollectionKind::View => write!(f, "view"),
        }
    }
}

/// コレクション定義
///
/// 単一のコレクションの構造を表現します。
/// フィールドの宣言順は保持されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// コレクション名
    pub name: String,

    /// コレクションの種類
    #[serde(rename = "type")]
    pub kind: CollectionKind,

    /// フィールド定義のリスト
    #[serde(rename = "schema")]
    pub fields: Vec<Field>,

    /// コレクションレベルのオプション
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl Collection {
    /// 新しいコレクションを作成
    pub fn new(name: impl Into<String>, kind: CollectionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            options: Map::new(),
        }
    }

    /// baseコレクションを作成
    pub fn base(name: impl Into<String>) -> Self {
        Self::new(name, CollectionKind::Base)
    }

    /// フィールドを追加（ビルダー形式）
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// 複数のフィールドを追加（ビルダー形式）
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// フィールドを追加
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// 名前でフィールドを取得
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 識別子でフィールドを取得
    pub fn get_field_by_id(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// 指定されたフィールドが存在するか確認
    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// フィールド名の一覧を宣言順で取得
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// リレーションフィールドが参照するコレクション名（重複なし、宣言順）
    pub fn relation_targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for target in self.fields.iter().filter_map(|f| f.relation_target()) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        targets
    }
}

/// フィールド定義
///
/// コレクション内の単一フィールドを表現します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "FieldDto", try_from = "FieldDto")]
pub struct Field {
    /// フィールド識別子（コレクション内で一意）
    pub id: String,

    /// フィールド名
    pub name: String,

    /// フィールド型と型固有のオプション
    pub field_type: FieldType,

    /// 必須フラグ
    pub required: bool,

    /// 一意フラグ
    pub unique: bool,

    /// デフォルト値
    pub default: Option<Value>,
}

impl Field {
    /// 新しいフィールドを作成
    pub fn new(id: impl Into<String>, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field_type,
            required: false,
            unique: false,
            default: None,
        }
    }

    /// textフィールド（識別子は名前と同じ）
    pub fn text(name: &str) -> Self {
        Self::new(name, name, FieldType::Text)
    }

    /// numberフィールド
    pub fn number(name: &str) -> Self {
        Self::new(name, name, FieldType::Number)
    }

    /// boolフィールド
    pub fn bool(name: &str) -> Self {
        Self::new(name, name, FieldType::Bool)
    }

    /// urlフィールド
    pub fn url(name: &str) -> Self {
        Self::new(name, name, FieldType::Url)
    }

    /// emailフィールド
    pub fn email(name: &str) -> Self {
        Self::new(name, name, FieldType::Email)
    }

    /// jsonフィールド
    pub fn json(name: &str) -> Self {
        Self::new(name, name, FieldType::Json)
    }

    /// selectフィールド（単一選択）
    pub fn select(name: &str, values: &[&str]) -> Self {
        Self::new(
            name,
            name,
            FieldType::Select(SelectOptions {
                values: values.iter().map(|v| v.to_string()).collect(),
                max_select: 1,
            }),
        )
    }

    /// relationフィールド（単一参照）
    pub fn relation(id: &str, name: &str, target: &str) -> Self {
        Self::new(
            id,
            name,
            FieldType::Relation(RelationOptions {
                collection_id: target.to_string(),
                max_select: 1,
            }),
        )
    }

    /// fileフィールド
    pub fn file(name: &str, max_select: u32, max_size: u64) -> Self {
        Self::new(
            name,
            name,
            FieldType::File(FileOptions {
                max_select,
                max_size,
            }),
        )
    }

    /// 必須にする
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// 一意にする
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// デフォルト値を設定
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// 型名を取得
    pub fn type_name(&self) -> &'static str {
        self.field_type.type_name()
    }

    /// リレーションの参照先コレクション名
    pub fn relation_target(&self) -> Option<&str> {
        match &self.field_type {
            FieldType::Relation(options) => Some(options.collection_id.as_str()),
            _ => None,
        }
    }

    /// selectの許可値
    pub fn select_values(&self) -> Option<&[String]> {
        match &self.field_type {
            FieldType::Select(options) => Some(options.values.as_slice()),
            _ => None,
        }
    }

    /// 選択可能な最大数（select / relation / file 以外はNone）
    pub fn max_select(&self) -> Option<u32> {
        match &self.field_type {
            FieldType::Select(options) => Some(options.max_select),
            FieldType::Relation(options) => Some(options.max_select),
            FieldType::File(options) => Some(options.max_select),
            _ => None,
        }
    }

    /// レコード値を検証して保存形式に正規化
    ///
    /// 空でない値を受け取ります。select / relation / file は単一の文字列と
    /// 文字列の配列のどちらも受け付け、`maxSelect` が1なら文字列に、
    /// それ以外なら配列に揃えます。リレーション先の存在は確認しません。
    ///
    /// # Errors
    ///
    /// 型の不一致、選択数の超過、許可されていないselect値の場合はメッセージを返します。
    pub fn normalize_value(&self, value: &Value) -> Result<Value, String> {
        let mismatch = || format!("expected a {} value", self.type_name());

        let valid = match &self.field_type {
            FieldType::Text | FieldType::Url | FieldType::Email => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Json => true,
            FieldType::Select(_) | FieldType::Relation(_) | FieldType::File(_) => {
                return self.normalize_items(value).ok_or_else(mismatch)?;
            }
        };

        if valid {
            Ok(value.clone())
        } else {
            Err(mismatch())
        }
    }

    fn normalize_items(&self, value: &Value) -> Option<Result<Value, String>> {
        let items = string_items(value)?;
        let max_select = self.max_select().unwrap_or(1);

        if items.len() > max_select as usize {
            return Some(Err(match &self.field_type {
                FieldType::Relation(_) => "too many related records".to_string(),
                FieldType::File(_) => "too many files".to_string(),
                _ => "too many values selected".to_string(),
            }));
        }

        if let Some(allowed) = self.select_values() {
            if let Some(bad) = items.iter().find(|item| !allowed.iter().any(|v| v == *item)) {
                return Some(Err(format!("'{}' is not one of: {}", bad, allowed.join(", "))));
            }
        }

        Some(Ok(match items.as_slice() {
            [single] if max_select == 1 => Value::String(single.to_string()),
            _ => Value::Array(items.iter().map(|item| Value::String(item.to_string())).collect()),
        }))
    }

    /// 必須かつ一意な単一リレーション（1対1関係）かどうか
    pub fn is_one_to_one(&self) -> bool {
        matches!(
            &self.field_type,
            FieldType::Relation(options) if options.max_select == 1
        ) && self.required
            && self.unique
    }
}

/// フィールド型
///
/// 型タグと型固有のオプションを表現します。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// テキスト
    Text,
    /// 数値
    Number,
    /// 真偽値
    Bool,
    /// URL
    Url,
    /// メールアドレス
    Email,
    /// 任意のJSON
    Json,
    /// 列挙値
    Select(SelectOptions),
    /// 他コレクションへの参照
    Relation(RelationOptions),
    /// アップロードファイル
    File(FileOptions),
}

impl FieldType {
    /// 型タグを取得
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Url => "url",
            FieldType::Email => "email",
            FieldType::Json => "json",
            FieldType::Select(_) => "select",
            FieldType::Relation(_) => "relation",
            FieldType::File(_) => "file",
        }
    }

    /// 文字列値を格納する型かどうか
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldType::Text | FieldType::Url | FieldType::Email | FieldType::Select(_)
        )
    }
}

/// selectフィールドのオプション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOptions {
    /// 許可される値の集合
    pub values: Vec<String>,
    /// 選択可能な最大数
    #[serde(default = "default_max_select")]
    pub max_select: u32,
}

/// relationフィールドのオプション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationOptions {
    /// 参照先コレクション名
    pub collection_id: String,
    /// 参照可能な最大数（多重度）
    #[serde(default = "default_max_select")]
    pub max_select: u32,
}

/// fileフィールドのオプション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOptions {
    /// ファイル数の上限
    #[serde(default = "default_max_select")]
    pub max_select: u32,
    /// ファイルサイズの上限（バイト）
    pub max_size: u64,
}

fn default_max_select() -> u32 {
    1
}

/// 値が空か（null、空文字列、空配列）
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// 単一の文字列または文字列の配列から要素を取り出す
pub fn string_items(value: &Value) -> Option<Vec<&str>> {
    match value {
        Value::String(s) => Some(vec![s.as_str()]),
        Value::Array(items) => items.iter().map(Value::as_str).collect(),
        _ => None,
    }
}

/// フィールドのワイヤ表現
///
/// `{ id, name, type, required, unique, default?, options? }`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FieldDto {
    id: String,
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Value>,
}

impl From<Field> for FieldDto {
    fn from(field: Field) -> Self {
        // オプション構造体はすべて単純なフィールドのみで構成されるため直列化は失敗しない
        let options = match &field.field_type {
            FieldType::Select(options) => serde_json::to_value(options).ok(),
            FieldType::Relation(options) => serde_json::to_value(options).ok(),
            FieldType::File(options) => serde_json::to_value(options).ok(),
            _ => None,
        };

        FieldDto {
            field_type: field.type_name().to_string(),
            id: field.id,
            name: field.name,
            required: field.required,
            unique: field.unique,
            default: field.default,
            options,
        }
    }
}

impl TryFrom<FieldDto> for Field {
    type Error = ValidationError;

    fn try_from(dto: FieldDto) -> Result<Self, Self::Error> {
        let field_type = match dto.field_type.as_str() {
            "text" => FieldType::Text,
            "number" => FieldType::Number,
            "bool" => FieldType::Bool,
            "url" => FieldType::Url,
            "email" => FieldType::Email,
            "json" => FieldType::Json,
            "select" => FieldType::Select(parse_options(&dto)?),
            "relation" => FieldType::Relation(parse_options(&dto)?),
            "file" => FieldType::File(parse_options(&dto)?),
            other => {
                return Err(ValidationError::Syntax {
                    message: format!("Unknown field type '{}'", other),
                    location: Some(ErrorLocation {
                        collection: None,
                        field: Some(dto.name.clone()),
                    }),
                    suggestion: Some(
                        "Use one of: text, number, bool, select, relation, url, email, file, json"
                            .to_string(),
                    ),
                })
            }
        };

        Ok(Field {
            id: dto.id,
            name: dto.name,
            field_type,
            required: dto.required,
            unique: dto.unique,
            default: dto.default,
        })
    }
}

fn parse_options<T: serde::de::DeserializeOwned>(dto: &FieldDto) -> Result<T, ValidationError> {
    let options = dto.options.clone().unwrap_or(Value::Object(Map::new()));
    serde_json::from_value(options).map_err(|e| ValidationError::Syntax {
        message: format!("Invalid options for {} field: {}", dto.field_type, e),
        location: Some(ErrorLocation {
            collection: None,
            field: Some(dto.name.clone()),
        }),
        suggestion: None,
    })
}
