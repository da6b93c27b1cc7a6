// カタログチェックサム計算サービス
//
// カタログ定義のSHA-256ハッシュ計算と比較を行うサービス。
// 正規化されたカタログ表現を生成してチェックサムを計算します。

use crate::core::catalog::Catalog;
use sha2::{Digest, Sha256};

/// カタログチェックサムサービス
///
/// カタログのSHA-256ハッシュ計算を行います。
#[derive(Debug, Clone)]
pub struct CatalogChecksumService {}

impl CatalogChecksumService {
    /// 新しいCatalogChecksumServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// カタログのチェックサムを計算
    ///
    /// # Returns
    ///
    /// SHA-256ハッシュ（64文字の16進数文字列）
    pub fn calculate_checksum(&self, catalog: &Catalog) -> String {
        let normalized = self.normalize_catalog(catalog);

        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        let result = hasher.finalize();

        format!("{:x}", result)
    }

    /// カタログを正規化された文字列表現に変換
    ///
    /// コレクションとフィールドの順序は作成順序に影響するため、宣言順のまま含めます。
    /// オプションのキー順は serde_json の Map（BTreeMap）により安定します。
    pub fn normalize_catalog(&self, catalog: &Catalog) -> String {
        let collections = serde_json::to_string(&catalog.collections).unwrap_or_default();
        format!(
            "{{version:{},name:{},collections:{}}}",
            catalog.version, catalog.name, collections
        )
    }

    /// チェックサムを比較
    pub fn verify(&self, catalog: &Catalog, expected: &str) -> bool {
        self.calculate_checksum(catalog) == expected
    }
}

impl Default for CatalogChecksumService {
    fn default() -> Self {
        Self::new()
    }
}
