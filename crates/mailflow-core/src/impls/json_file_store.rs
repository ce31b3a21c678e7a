//! JsonFileEmailStore - 単一 JSON ファイルへの永続化
//!
//! CLI のように「プロセスを跨いで状態を残したい」用途向けの実装です。
//!
//! - 起動時にファイル全体を読み込む（ファイルがなければ空）
//! - save のたびに全レコードを一時ファイルへ書き出し、rename で置き換える
//! - ファイルへの書き込みが成功してからメモリ上の状態を更新する

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Email, EmailId, EmailStatus, StoreError};
use crate::ports::{EmailStore, IdGenerator, SystemClock, UlidGenerator};

/// File-backed persistence port.
pub struct JsonFileEmailStore {
    path: PathBuf,
    // 書き込みの直列化のため、ファイル書き出し中もロックを保持する
    records: Mutex<Vec<Email>>,
    ids: Arc<dyn IdGenerator>,
}

impl JsonFileEmailStore {
    /// Open `path`, loading any records already stored there.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_id_generator(path, Arc::new(UlidGenerator::new(SystemClock))).await
    }

    pub async fn open_with_id_generator(
        path: impl Into<PathBuf>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let records = load(&path).await?;
        tracing::debug!(path = %path.display(), records = records.len(), "opened email store");
        Ok(Self {
            path,
            records: Mutex::new(records),
            ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &[Email]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

async fn load(path: &Path) -> Result<Vec<Email>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl EmailStore for JsonFileEmailStore {
    async fn save(&self, email: Email) -> Result<Email, StoreError> {
        let id = email.id.unwrap_or_else(|| self.ids.generate_email_id());
        let email = email.with_id(id);

        let mut records = self.records.lock().await;
        let mut next = records.clone();
        match next.iter_mut().find(|e| e.id == Some(id)) {
            Some(slot) => *slot = email.clone(),
            None => next.push(email.clone()),
        }

        self.persist(&next).await?;
        *records = next;
        Ok(email)
    }

    async fn find_by_id(&self, id: EmailId) -> Result<Option<Email>, StoreError> {
        let records = self.records.lock().await;
        Ok(records.iter().find(|e| e.id == Some(id)).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Email>, StoreError> {
        Ok(self.records.lock().await.clone())
    }

    async fn find_by_status(&self, status: EmailStatus) -> Result<Vec<Email>, StoreError> {
        let records = self.records.lock().await;
        Ok(records.iter().filter(|e| e.status == status).cloned().collect())
    }
}
