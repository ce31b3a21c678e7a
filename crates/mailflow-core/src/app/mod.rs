//! App - アプリケーション層
//!
//! ports を組み合わせてメールのライフサイクルを実装します。
//!
//! # 主要コンポーネント
//! - **EmailService**: オーケストレータ（ガード → 配送 → 状態更新）
//! - **AppBuilder**: ポートのワイヤリングと起動時検証
//! - **StatusCounts**: ステータスごとの件数

pub mod builder;
pub mod service;
pub mod status;

pub use self::builder::{AppBuilder, BuildError};
pub use self::service::{EmailService, SendOutcome};
pub use self::status::StatusCounts;
