//! State - メールの状態
//!
//! # 状態遷移
//! - PENDING → SENT（一度だけ、逆方向なし）
//! - SENT は終端状態

use serde::{Deserialize, Serialize};
use std::fmt;

/// EmailStatus はメールのライフサイクル上の位置を表現
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailStatus {
    /// 作成済み・未送信。編集と送信が可能
    Pending,
    /// 送信済み
    Sent,
}

impl EmailStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, EmailStatus::Sent)
    }

    /// Whether fields may still be edited and a send attempted.
    pub fn is_pending(self) -> bool {
        matches!(self, EmailStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmailStatus::Pending => "PENDING",
            EmailStatus::Sent => "SENT",
        }
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
