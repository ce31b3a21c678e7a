//! Status - ステータスごとの件数ビュー

use serde::{Deserialize, Serialize};

use crate::domain::{Email, EmailStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub sent: usize,
}

impl StatusCounts {
    pub fn from_emails(emails: &[Email]) -> Self {
        let mut counts = Self::default();
        for email in emails {
            match email.status {
                EmailStatus::Pending => counts.pending += 1,
                EmailStatus::Sent => counts.sent += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.sent
    }
}
