//! AppBuilder - EmailService の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - store / mailer のどちらかが未設定なら build() が BuildError を返す
//! - Config からバッチの並列度を取り込む

use std::sync::Arc;

use super::service::EmailService;
use crate::config::Config;
use crate::ports::{EmailStore, Mailer};

/// AppBuilder は EmailService を構築
///
/// # 使用例
/// ```ignore
/// let service = AppBuilder::new()
///     .store(Arc::new(InMemoryEmailStore::new()))
///     .mailer(Arc::new(LoggingMailer::new()))
///     .config(&config)
///     .build()?;
/// ```
#[derive(Default)]
pub struct AppBuilder {
    store: Option<Arc<dyn EmailStore>>,
    mailer: Option<Arc<dyn Mailer>>,
    batch_concurrency: Option<usize>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("Missing port: {0}. Register it on the builder before build().")]
    MissingPort(&'static str),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn EmailStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn batch_concurrency(mut self, n: usize) -> Self {
        self.batch_concurrency = Some(n);
        self
    }

    /// Take the tunables that belong to the service from `config`.
    pub fn config(self, config: &Config) -> Self {
        self.batch_concurrency(config.batch_concurrency)
    }

    pub fn build(self) -> Result<EmailService, BuildError> {
        let store = self.store.ok_or(BuildError::MissingPort("store"))?;
        let mailer = self.mailer.ok_or(BuildError::MissingPort("mailer"))?;

        let service = EmailService::new(store, mailer);
        Ok(match self.batch_concurrency {
            Some(n) => service.with_batch_concurrency(n),
            None => service,
        })
    }
}
