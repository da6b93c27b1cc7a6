// Core Domain
// コレクションモデル、カタログ、設定、エラー、マイグレーション情報の純粋なドメイン層

pub mod catalog;
pub mod collection;
pub mod config;
pub mod error;
pub mod migration;
pub mod naming;
