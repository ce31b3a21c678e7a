//! mailflow-core
//!
//! Lifecycle of an email from draft to delivery.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, email, state, errors）
//! - **ports**: 抽象化レイヤー（EmailStore, Mailer, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（EmailService, AppBuilder, StatusCounts）
//! - **impls**: ports の実装（InMemoryEmailStore, JsonFileEmailStore, LoggingMailer）
//! - **config**: 環境変数からの設定読み込み

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{AppBuilder, BuildError, EmailService, SendOutcome, StatusCounts};
pub use config::{Config, ConfigError};
pub use domain::{
    DeliveryError, Email, EmailDraft, EmailError, EmailId, EmailStatus, ErrorKind, Priority,
    ServiceError, StoreError,
};
