// コレクション差分検出サービス
//
// ストアに保存済みの定義と宣言された定義を比較し、
// 追加・変更・保持（ストアにのみ存在）されるフィールドを検出します。
// 更新時に送信するマージ済み定義の生成も担当します。

use crate::core::collection::Collection;
use std::collections::HashSet;

/// コレクション差分
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionDiff {
    /// コレクション名
    pub collection: String,
    /// 宣言にのみ存在するフィールド
    pub added_fields: Vec<String>,
    /// 両方に存在するが定義が異なるフィールド
    pub modified_fields: Vec<String>,
    /// ストアにのみ存在するフィールド（マージ時に保持される）
    pub retained_fields: Vec<String>,
    /// 種類が変更されたか
    pub kind_changed: bool,
    /// オプションが変更されたか
    pub options_changed: bool,
}

impl CollectionDiff {
    /// 宣言された内容に対して変更がないか
    ///
    /// 保持フィールドはマージで維持されるため変更とはみなしません。
    pub fn is_empty(&self) -> bool {
        self.added_fields.is_empty()
            && self.modified_fields.is_empty()
            && !self.kind_changed
            && !self.options_changed
    }

    /// 人間が読める要約
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.added_fields.is_empty() {
            parts.push(format!("+{}", self.added_fields.join(", +")));
        }
        if !self.modified_fields.is_empty() {
            parts.push(format!("~{}", self.modified_fields.join(", ~")));
        }
        if !self.retained_fields.is_empty() {
            parts.push(format!("kept {}", self.retained_fields.join(", ")));
        }
        if self.kind_changed {
            parts.push("type changed".to_string());
        }
        if self.options_changed {
            parts.push("options changed".to_string());
        }
        if parts.is_empty() {
            "no changes".to_string()
        } else {
            parts.join("; ")
        }
    }
}

/// コレクション差分検出サービス
#[derive(Debug, Clone)]
pub struct CollectionDiffService {}

impl CollectionDiffService {
    /// 新しいCollectionDiffServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 保存済み定義と宣言された定義の差分を検出
    ///
    /// フィールドは識別子で対応付けます。名前が変わったフィールドは変更として扱います。
    pub fn diff(&self, stored: &Collection, declared: &Collection) -> CollectionDiff {
        let mut diff = CollectionDiff {
            collection: declared.name.clone(),
            kind_changed: stored.kind != declared.kind,
            options_changed: declared
                .options
                .iter()
                .any(|(key, value)| stored.options.get(key) != Some(value)),
            ..CollectionDiff::default()
        };

        for field in &declared.fields {
            match stored.get_field_by_id(&field.id) {
                None => diff.added_fields.push(field.name.clone()),
                Some(existing) if existing != field => diff.modified_fields.push(field.name.clone()),
                Some(_) => {}
            }
        }

        diff.retained_fields = stored
            .fields
            .iter()
            .filter(|f| declared.get_field_by_id(&f.id).is_none())
            .map(|f| f.name.clone())
            .collect();

        diff
    }

    /// 更新時に送信する定義を生成
    ///
    /// 宣言されたフィールドを宣言順に並べ、その後に識別子が宣言にないフィールドを続けます。
    /// オプションは保存済みの値に宣言された値を上書きします。
    pub fn merge(&self, stored: &Collection, declared: &Collection) -> Collection {
        let declared_ids: HashSet<&str> = declared.fields.iter().map(|f| f.id.as_str()).collect();

        let mut merged = declared.clone();
        merged.fields.extend(
            stored
                .fields
                .iter()
                .filter(|f| !declared_ids.contains(f.id.as_str()))
                .cloned(),
        );

        let mut options = stored.options.clone();
        for (key, value) in &declared.options {
            options.insert(key.clone(), value.clone());
        }
        merged.options = options;

        merged
    }
}

impl Default for CollectionDiffService {
    fn default() -> Self {
        Self::new()
    }
}
