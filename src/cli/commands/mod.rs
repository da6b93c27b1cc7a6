// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod apply;
pub mod export;
pub mod init;
pub mod status;
pub mod validate;
