//! Plant Doctor CLI
//!
//! 植物の写真・動画を診断サービスへ送り、結果を端末に表示する

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod render;
pub mod scanner;
pub mod shell;
