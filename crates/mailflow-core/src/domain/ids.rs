//! Domain identifiers (strongly-typed IDs).
//!
//! ID は ULID ベースで、Phantom type によってエンティティごとに型を分けます。
//! 表示形式は `{prefix}{ULID}`（例: `email-01HV...`）で、パース時は
//! プレフィックスの有無どちらも受け付けます。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス（例: "email-"）
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// JSON 上は ULID 文字列そのものとして表現されます。
#[repr(transparent)]
#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

// derive だと T にも境界が付いてしまうので手で実装する
impl<T: IdMarker> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: IdMarker> Copy for Id<T> {}

impl<T: IdMarker> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ulid == other.ulid
    }
}

impl<T: IdMarker> Eq for Id<T> {}

impl<T: IdMarker> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ulid.hash(state);
    }
}

impl<T: IdMarker> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: IdMarker> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ulid.cmp(&other.ulid)
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// ID 文字列のパース失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid id '{input}': {reason}")]
pub struct ParseIdError {
    input: String,
    reason: String,
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(T::prefix()).unwrap_or(s);
        Ulid::from_string(raw)
            .map(Self::from_ulid)
            .map_err(|e| ParseIdError {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Email のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmailMarker {}

impl IdMarker for EmailMarker {
    fn prefix() -> &'static str {
        "email-"
    }
}

/// Identifier of a persisted Email.
pub type EmailId = Id<EmailMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_prefix() {
        let ulid = Ulid::new();
        let id = EmailId::from_ulid(ulid);
        assert_eq!(id.to_string(), format!("email-{ulid}"));
    }

    #[test]
    fn parses_with_and_without_prefix() {
        let id = EmailId::from_ulid(Ulid::new());

        let with_prefix: EmailId = id.to_string().parse().unwrap();
        let without_prefix: EmailId = id.as_ulid().to_string().parse().unwrap();

        assert_eq!(with_prefix, id);
        assert_eq!(without_prefix, id);
    }

    #[test]
    fn rejects_garbage() {
        let err = "email-not-a-ulid".parse::<EmailId>().unwrap_err();
        assert!(err.to_string().contains("email-not-a-ulid"));
    }

    #[test]
    fn serializes_as_bare_ulid_string() {
        let ulid = Ulid::new();
        let id = EmailId::from_ulid(ulid);

        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(ulid.to_string()));

        let back: EmailId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ulid_ids_are_sortable() {
        let id1 = EmailId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = EmailId::from_ulid(Ulid::new());

        assert!(id1 < id2);
    }
}
