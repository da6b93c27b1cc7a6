// Adapters
// コレクションストア（インメモリ / SQL）とデータベース接続を抽象化

pub mod connection_string;
pub mod database;
pub mod memory_store;
pub mod sql_generator;
pub mod sql_store;
pub mod store;
