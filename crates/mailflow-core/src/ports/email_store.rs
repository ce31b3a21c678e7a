//! EmailStore port - メールレコードの正本（source of truth）
//!
//! # 前提
//! - 永続的・強整合（単一レコードの read-after-write）
//! - ID 単位の last-write-wins（条件付き書き込みはなし）
//!
//! # 実装
//! - `impls::InMemoryEmailStore`: テスト・開発用
//! - `impls::JsonFileEmailStore`: 単一 JSON ファイルへの永続化

use async_trait::async_trait;

use crate::domain::{Email, EmailId, EmailStatus, StoreError};

/// EmailStore は Email の保存と検索を提供
#[async_trait]
pub trait EmailStore: Send + Sync {
    /// Insert or replace by id. Assigns an id when `email.id` is `None`.
    async fn save(&self, email: Email) -> Result<Email, StoreError>;

    async fn find_by_id(&self, id: EmailId) -> Result<Option<Email>, StoreError>;

    async fn find_all(&self) -> Result<Vec<Email>, StoreError>;

    async fn find_by_status(&self, status: EmailStatus) -> Result<Vec<Email>, StoreError>;
}
