//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! オーケストレータ（`app::EmailService`）はこれらの trait にのみ依存し、
//! 実装は `impls` または外部クレートが提供します。

pub mod clock;
pub mod email_store;
pub mod id_generator;
pub mod mailer;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::email_store::EmailStore;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::mailer::Mailer;
