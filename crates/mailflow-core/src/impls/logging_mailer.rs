//! LoggingMailer - ログ出力のみを行う配送実装
//!
//! 実際のネットワーク送信は行わず、tracing に送信内容を記録します。
//! 拒否ドメインが設定されている場合、該当する宛先を含むメールは
//! `DeliveryError::Rejected` で失敗します。

use async_trait::async_trait;

use crate::domain::{DeliveryError, Email};
use crate::ports::Mailer;

/// Delivery port that "sends" by logging.
#[derive(Debug, Clone, Default)]
pub struct LoggingMailer {
    rejected_domains: Vec<String>,
}

impl LoggingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse any email addressed to one of `domains` (case-insensitive).
    pub fn with_rejected_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rejected_domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        self
    }

    fn rejected_recipient<'a>(&self, email: &'a Email) -> Option<&'a str> {
        email
            .recipients
            .iter()
            .find(|recipient| {
                let domain = recipient
                    .rsplit_once('@')
                    .map(|(_, domain)| domain.to_lowercase())
                    .unwrap_or_default();
                self.rejected_domains.iter().any(|d| *d == domain)
            })
            .map(String::as_str)
    }
}

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send(&self, email: Email) -> Result<Email, DeliveryError> {
        if let Some(recipient) = self.rejected_recipient(&email) {
            return Err(DeliveryError::Rejected {
                reason: format!("recipient domain not accepted: {recipient}"),
            });
        }

        tracing::info!(
            id = ?email.id,
            subject = %email.subject,
            recipients = email.recipients.len(),
            attachments = email.attachments.len(),
            priority = ?email.priority,
            "delivered email"
        );
        Ok(email)
    }
}
