// Services Layer
// カタログの検証、順序解決、差分検出、ストアへの登録を行うサービス層

pub mod catalog_checksum;
pub mod catalog_migrator;
pub mod catalog_validator;
pub mod collection_diff;
pub mod config_loader;
pub mod database_config_resolver;
pub mod dependency_order;
pub mod schema_loader;
