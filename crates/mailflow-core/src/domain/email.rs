//! Email model: the persisted entity and the caller-supplied draft.
//!
//! Transitions never mutate a record in place; they build a new value from the
//! old one (`with_draft`, `into_sent`).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ids::EmailId;
use super::state::EmailStatus;

/// Urgency hint carried with every email.
///
/// Opaque to the lifecycle logic: no guard or branch reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{other}' (expected low, normal or high)")),
        }
    }
}

/// Caller-supplied fields for creating or updating an email.
///
/// Has no `status`: a serialized draft carrying one has it ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub recipients: BTreeSet<String>,
    #[serde(default)]
    pub attachments: BTreeSet<String>,
    #[serde(default)]
    pub priority: Priority,
}

impl EmailDraft {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipients.insert(recipient.into());
        self
    }

    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachments.insert(attachment.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// The central entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Assigned by the store on first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EmailId>,
    pub subject: String,
    pub body: String,
    pub recipients: BTreeSet<String>,
    pub attachments: BTreeSet<String>,
    pub status: EmailStatus,
    #[serde(default)]
    pub priority: Priority,
}

impl Email {
    /// A fresh, not yet persisted email. Status is always `PENDING`.
    pub fn from_draft(draft: EmailDraft) -> Self {
        Self {
            id: None,
            subject: draft.subject,
            body: draft.body,
            recipients: draft.recipients,
            attachments: draft.attachments,
            status: EmailStatus::Pending,
            priority: draft.priority,
        }
    }

    /// Replace every editable field from `draft`, keeping `id` and `status`.
    pub fn with_draft(&self, draft: EmailDraft) -> Self {
        Self {
            id: self.id,
            subject: draft.subject,
            body: draft.body,
            recipients: draft.recipients,
            attachments: draft.attachments,
            status: self.status,
            priority: draft.priority,
        }
    }

    /// Same record with only the status moved to `SENT`.
    pub fn into_sent(self) -> Self {
        Self {
            status: EmailStatus::Sent,
            ..self
        }
    }

    pub fn with_id(self, id: EmailId) -> Self {
        Self { id: Some(id), ..self }
    }

    pub fn has_recipients(&self) -> bool {
        !self.recipients.is_empty()
    }
}
