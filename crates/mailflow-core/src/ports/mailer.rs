//! Mailer port - 実際の配送（SMTP, API, ログ出力など）
//!
//! 呼び出し側は宛先が空でないことを保証します。
//! 成功時は受け取った Email をそのまま返します（SENT にするのはオーケストレータ）。

use async_trait::async_trait;

use crate::domain::{DeliveryError, Email};

/// Mailer は検証済みの Email の送信を試みる
///
/// 締め切り（timeout）が必要な場合は実装側の責務です。
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<Email, DeliveryError>;
}
