// blckbx-schemaライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメイン（コレクションモデル、カタログ、設定、エラー、マイグレーション情報）
// - services: カタログの検証、順序解決、差分検出、ストアへの登録
// - adapters: コレクションストア（インメモリ / SQL）とデータベース接続

pub mod cli;
pub mod core;
pub mod adapters;
pub mod services;
