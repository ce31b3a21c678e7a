//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryEmailStore**: テスト・開発用の正本
//! - **JsonFileEmailStore**: JSON ファイルへの永続化（CLI 用）
//! - **LoggingMailer**: tracing に記録するだけの配送

pub mod inmem_store;
pub mod json_file_store;
pub mod logging_mailer;

pub use self::inmem_store::InMemoryEmailStore;
pub use self::json_file_store::JsonFileEmailStore;
pub use self::logging_mailer::LoggingMailer;
