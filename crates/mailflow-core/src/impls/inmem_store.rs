//! InMemoryEmailStore - 開発・テスト用の正本
//!
//! - HashMap<EmailId, Email> がレコードの正本
//! - 挿入順を Vec<EmailId> で保持し、find_all の順序を安定させる
//! - tokio::sync::Mutex で排他制御（ロックを跨いだ await はしない）

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Email, EmailId, EmailStatus, StoreError};
use crate::ports::{EmailStore, IdGenerator, SystemClock, UlidGenerator};

#[derive(Default)]
struct InMemoryState {
    records: HashMap<EmailId, Email>,
    order: Vec<EmailId>,
}

impl InMemoryState {
    fn upsert(&mut self, id: EmailId, email: Email) {
        if self.records.insert(id, email).is_none() {
            self.order.push(id);
        }
    }

    fn ordered(&self) -> impl Iterator<Item = &Email> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }
}

/// In-memory persistence port.
pub struct InMemoryEmailStore {
    state: Mutex<InMemoryState>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryEmailStore {
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(UlidGenerator::new(SystemClock)))
    }

    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            state: Mutex::new(InMemoryState::default()),
            ids,
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryEmailStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailStore for InMemoryEmailStore {
    async fn save(&self, email: Email) -> Result<Email, StoreError> {
        let id = email.id.unwrap_or_else(|| self.ids.generate_email_id());
        let email = email.with_id(id);

        let mut state = self.state.lock().await;
        state.upsert(id, email.clone());
        Ok(email)
    }

    async fn find_by_id(&self, id: EmailId) -> Result<Option<Email>, StoreError> {
        Ok(self.state.lock().await.records.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Email>, StoreError> {
        Ok(self.state.lock().await.ordered().cloned().collect())
    }

    async fn find_by_status(&self, status: EmailStatus) -> Result<Vec<Email>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .ordered()
            .filter(|email| email.status == status)
            .cloned()
            .collect())
    }
}
