//! Errors - エラー型と分類
//!
//! - `ErrorKind` / `EmailError`: 業務上の失敗（閉じた集合）
//! - `StoreError` / `DeliveryError`: ポート境界のエラー
//! - `ServiceError`: オーケストレータが返すエラー（業務 or インフラ）

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::EmailId;

/// ErrorKind は業務エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// 送信済みのメールに対する編集・送信
    AlreadySent,
    /// 宛先なしでの送信
    NoRecipients,
    /// 指定 ID のメールが存在しない
    NotFound,
    /// 配送ポートが送信を拒否した
    DeliveryFailed,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::AlreadySent => "ALREADY_SENT",
            ErrorKind::NoRecipients => "NO_RECIPIENTS",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::DeliveryFailed => "DELIVERY_FAILED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A business failure tied to the email it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailError {
    pub id: EmailId,
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl EmailError {
    pub fn new(id: EmailId, kind: ErrorKind) -> Self {
        Self {
            id,
            kind,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn not_found(id: EmailId) -> Self {
        Self::new(id, ErrorKind::NotFound)
    }

    pub fn already_sent(id: EmailId) -> Self {
        Self::new(id, ErrorKind::AlreadySent)
    }

    pub fn no_recipients(id: EmailId) -> Self {
        Self::new(id, ErrorKind::NoRecipients)
    }

    pub fn delivery_failed(id: EmailId, cause: &DeliveryError) -> Self {
        Self::new(id, ErrorKind::DeliveryFailed).with_detail(cause.to_string())
    }
}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({}): {detail}", self.kind, self.id),
            None => write!(f, "{} ({})", self.kind, self.id),
        }
    }
}

impl std::error::Error for EmailError {}

/// Persistence port faults. Outside the business taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Delivery port failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The transport refused the message.
    #[error("rejected: {reason}")]
    Rejected { reason: String },

    /// The transport could not be reached or broke mid-send.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Error returned by every orchestrator operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Rejected(#[from] EmailError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Business kind, or `None` for infrastructure faults.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ServiceError::Rejected(e) => Some(e.kind),
            ServiceError::Store(_) => None,
        }
    }

    pub fn as_email_error(&self) -> Option<&EmailError> {
        match self {
            ServiceError::Rejected(e) => Some(e),
            ServiceError::Store(_) => None,
        }
    }
}
