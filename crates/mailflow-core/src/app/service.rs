//! EmailService - メールのライフサイクルを管理するオーケストレータ
//!
//! # 送信フロー（send / send_all_pending の各要素で共通）
//! 1. ID で検索（なければ NOT_FOUND、send のみ）
//! 2. ガード: status が PENDING（違えば ALREADY_SENT）
//! 3. ガード: 宛先が空でない（空なら NO_RECIPIENTS）
//! 4. Mailer に委譲（失敗なら DELIVERY_FAILED、ストアは変更しない）
//! 5. 成功したら status だけを SENT にした新しいレコードを保存して返す
//!
//! サービス自体は可変状態を持たず、毎回ストアから読み直します。

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::status::StatusCounts;
use crate::domain::{Email, EmailDraft, EmailError, EmailId, EmailStatus, ServiceError};
use crate::ports::{EmailStore, Mailer};

/// Outcome of one email inside a batch send.
pub type SendOutcome = Result<Email, ServiceError>;

/// The orchestrator. Cheap to clone; all state lives behind the ports.
#[derive(Clone)]
pub struct EmailService {
    store: Arc<dyn EmailStore>,
    mailer: Arc<dyn Mailer>,
    batch_concurrency: usize,
}

impl EmailService {
    pub fn new(store: Arc<dyn EmailStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            mailer,
            batch_concurrency: 1,
        }
    }

    /// Deliver up to `n` emails at once in `send_all_pending` (minimum 1).
    pub fn with_batch_concurrency(mut self, n: usize) -> Self {
        self.batch_concurrency = n.max(1);
        self
    }

    pub fn batch_concurrency(&self) -> usize {
        self.batch_concurrency
    }

    #[instrument(skip_all)]
    pub async fn find_all(&self) -> Result<Vec<Email>, ServiceError> {
        let emails = self.store.find_all().await?;
        debug!(count = emails.len(), "listed emails");
        Ok(emails)
    }

    #[instrument(skip(self), fields(id = %id))]
    pub async fn find_by_id(&self, id: EmailId) -> Result<Email, ServiceError> {
        Ok(self.load(id).await?)
    }

    #[instrument(skip(self), fields(id = %id))]
    pub async fn find_status(&self, id: EmailId) -> Result<EmailStatus, ServiceError> {
        Ok(self.load(id).await?.status)
    }

    /// Store a new email built from `draft`. Status is always `PENDING`.
    #[instrument(skip_all)]
    pub async fn create(&self, draft: EmailDraft) -> Result<Email, ServiceError> {
        let saved = self.store.save(Email::from_draft(draft)).await?;
        info!(id = ?saved.id, recipients = saved.recipients.len(), "created email");
        Ok(saved)
    }

    /// Replace the editable fields of a `PENDING` email.
    #[instrument(skip(self, draft), fields(id = %id))]
    pub async fn update(&self, id: EmailId, draft: EmailDraft) -> Result<Email, ServiceError> {
        let current = self.load(id).await?;
        ensure_pending(id, &current)?;

        let saved = self.store.save(current.with_draft(draft)).await?;
        info!(recipients = saved.recipients.len(), "updated email");
        Ok(saved)
    }

    /// Validate, deliver and mark one email as `SENT`.
    ///
    /// Nothing guards the gap between the lookup and the final write: two
    /// concurrent sends of the same id can both pass the guards and both
    /// deliver, and the store keeps whichever write lands last.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn send(&self, id: EmailId) -> Result<Email, ServiceError> {
        let email = self.load(id).await?;
        dispatch(self.store.as_ref(), self.mailer.as_ref(), id, email).await
    }

    /// Run the send pipeline for every `PENDING` email.
    ///
    /// Each item succeeds or fails on its own; one outcome per email is
    /// returned in the order the store listed them. Only the initial scan can
    /// fail the whole call.
    #[instrument(skip_all, fields(concurrency = self.batch_concurrency))]
    pub async fn send_all_pending(&self) -> Result<Vec<SendOutcome>, ServiceError> {
        let pending = self.store.find_by_status(EmailStatus::Pending).await?;

        let mut items = Vec::with_capacity(pending.len());
        for email in pending {
            match email.id {
                Some(id) => items.push((id, email)),
                None => warn!(subject = %email.subject, "store returned a record without id; skipped"),
            }
        }
        info!(count = items.len(), "sending pending emails");

        let limit = Arc::new(Semaphore::new(self.batch_concurrency));
        let mut tasks = JoinSet::new();
        for (index, (id, email)) in items.into_iter().enumerate() {
            let store = Arc::clone(&self.store);
            let mailer = Arc::clone(&self.mailer);
            let limit = Arc::clone(&limit);
            tasks.spawn(async move {
                let _permit = limit.acquire_owned().await;
                (index, dispatch(store.as_ref(), mailer.as_ref(), id, email).await)
            });
        }

        let mut outcomes: Vec<Option<SendOutcome>> = Vec::new();
        outcomes.resize_with(tasks.len(), || None);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => warn!(error = %e, "batch item did not complete"),
            }
        }

        let outcomes: Vec<SendOutcome> = outcomes.into_iter().flatten().collect();
        let sent = outcomes.iter().filter(|o| o.is_ok()).count();
        info!(sent, failed = outcomes.len() - sent, "batch finished");
        Ok(outcomes)
    }

    /// Number of stored emails per status.
    #[instrument(skip_all)]
    pub async fn counts(&self) -> Result<StatusCounts, ServiceError> {
        let emails = self.store.find_all().await?;
        Ok(StatusCounts::from_emails(&emails))
    }

    async fn load(&self, id: EmailId) -> Result<Email, ServiceError> {
        match self.store.find_by_id(id).await? {
            Some(email) => Ok(email),
            None => {
                debug!(%id, "email not found");
                Err(EmailError::not_found(id).into())
            }
        }
    }
}

fn ensure_pending(id: EmailId, email: &Email) -> Result<(), EmailError> {
    if email.status.is_pending() {
        Ok(())
    } else {
        Err(EmailError::already_sent(id))
    }
}

fn ensure_recipients(id: EmailId, email: &Email) -> Result<(), EmailError> {
    if email.has_recipients() {
        Ok(())
    } else {
        Err(EmailError::no_recipients(id))
    }
}

/// Guards, delivery and the final write, in that order.
async fn dispatch(
    store: &dyn EmailStore,
    mailer: &dyn Mailer,
    id: EmailId,
    email: Email,
) -> Result<Email, ServiceError> {
    if let Err(e) = ensure_pending(id, &email).and_then(|()| ensure_recipients(id, &email)) {
        warn!(%id, kind = %e.kind, "send rejected");
        return Err(e.into());
    }

    let delivered = match mailer.send(email).await {
        Ok(delivered) => delivered,
        Err(cause) => {
            warn!(%id, error = %cause, "delivery failed");
            return Err(EmailError::delivery_failed(id, &cause).into());
        }
    };

    let saved = store.save(delivered.with_id(id).into_sent()).await?;
    info!(%id, "email sent");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeliveryError, ErrorKind, Priority, StoreError};
    use crate::impls::InMemoryEmailStore;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mailer double: counts calls, optionally fails every send.
    #[derive(Default)]
    struct StubMailer {
        failure: Option<DeliveryError>,
        calls: AtomicUsize,
    }

    impl StubMailer {
        fn failing(reason: &str) -> Self {
            Self {
                failure: Some(DeliveryError::Rejected {
                    reason: reason.to_string(),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Mailer for StubMailer {
        async fn send(&self, email: Email) -> Result<Email, DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.failure {
                Some(e) => Err(e.clone()),
                None => Ok(email),
            }
        }
    }

    /// Store double: counts writes on top of the in-memory store.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryEmailStore,
        saves: AtomicUsize,
    }

    impl CountingStore {
        fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmailStore for CountingStore {
        async fn save(&self, email: Email) -> Result<Email, StoreError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(email).await
        }

        async fn find_by_id(&self, id: EmailId) -> Result<Option<Email>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn find_all(&self) -> Result<Vec<Email>, StoreError> {
            self.inner.find_all().await
        }

        async fn find_by_status(&self, status: EmailStatus) -> Result<Vec<Email>, StoreError> {
            self.inner.find_by_status(status).await
        }
    }

    /// Store double that is always down.
    struct DownStore;

    #[async_trait]
    impl EmailStore for DownStore {
        async fn save(&self, _email: Email) -> Result<Email, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn find_by_id(&self, _id: EmailId) -> Result<Option<Email>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn find_all(&self) -> Result<Vec<Email>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn find_by_status(&self, _status: EmailStatus) -> Result<Vec<Email>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
    }

    struct Fixture {
        store: Arc<CountingStore>,
        mailer: Arc<StubMailer>,
        service: EmailService,
    }

    fn fixture(mailer: StubMailer) -> Fixture {
        let store = Arc::new(CountingStore::default());
        let mailer = Arc::new(mailer);
        let service = EmailService::new(store.clone(), mailer.clone());
        Fixture {
            store,
            mailer,
            service,
        }
    }

    fn draft_to(recipient: &str) -> EmailDraft {
        EmailDraft::new("hi", "hello")
            .with_recipient(recipient)
            .with_attachment("blob://a")
            .with_priority(Priority::High)
    }

    fn unknown_id() -> EmailId {
        EmailId::from_ulid(ulid::Ulid::new())
    }

    fn kind_of<T: std::fmt::Debug>(result: Result<T, ServiceError>) -> ErrorKind {
        result.unwrap_err().kind().expect("business error")
    }

    #[tokio::test]
    async fn create_forces_pending_and_assigns_id() {
        let f = fixture(StubMailer::default());

        let created = f.service.create(EmailDraft::new("hi", "")).await.unwrap();

        assert_eq!(created.status, EmailStatus::Pending);
        assert!(created.id.is_some());
        assert!(created.recipients.is_empty());
        assert_eq!(f.store.saves(), 1);
    }

    #[tokio::test]
    async fn find_by_id_and_status() {
        let f = fixture(StubMailer::default());
        let created = f.service.create(draft_to("a@x.com")).await.unwrap();
        let id = created.id.unwrap();

        assert_eq!(f.service.find_by_id(id).await.unwrap(), created);
        assert_eq!(f.service.find_status(id).await.unwrap(), EmailStatus::Pending);
    }

    #[rstest]
    #[case::find_by_id(0)]
    #[case::find_status(1)]
    #[case::update(2)]
    #[case::send(3)]
    #[tokio::test]
    async fn unknown_id_is_not_found(#[case] op: u8) {
        let f = fixture(StubMailer::default());
        let id = unknown_id();

        let kind = match op {
            0 => kind_of(f.service.find_by_id(id).await),
            1 => kind_of(f.service.find_status(id).await),
            2 => kind_of(f.service.update(id, draft_to("a@x.com")).await),
            _ => kind_of(f.service.send(id).await),
        };

        assert_eq!(kind, ErrorKind::NotFound);
        assert_eq!(f.store.saves(), 0);
        assert_eq!(f.mailer.calls(), 0);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_keeps_identity() {
        let f = fixture(StubMailer::default());
        let created = f.service.create(EmailDraft::new("old", "old")).await.unwrap();
        let id = created.id.unwrap();

        let updated = f.service.update(id, draft_to("a@x.com")).await.unwrap();

        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.status, EmailStatus::Pending);
        assert_eq!(updated.subject, "hi");
        assert_eq!(updated.priority, Priority::High);
        assert!(updated.recipients.contains("a@x.com"));
        assert_eq!(f.service.find_by_id(id).await.unwrap(), updated);
        assert_eq!(f.store.saves(), 2);
    }

    #[tokio::test]
    async fn update_after_send_is_rejected_and_leaves_record() {
        let f = fixture(StubMailer::default());
        let id = f.service.create(draft_to("a@x.com")).await.unwrap().id.unwrap();
        let sent = f.service.send(id).await.unwrap();
        let saves_before = f.store.saves();

        let kind = kind_of(f.service.update(id, EmailDraft::new("new", "new")).await);

        assert_eq!(kind, ErrorKind::AlreadySent);
        assert_eq!(f.service.find_by_id(id).await.unwrap(), sent);
        assert_eq!(f.store.saves(), saves_before);
    }

    #[tokio::test]
    async fn send_marks_sent_and_changes_nothing_else() {
        let f = fixture(StubMailer::default());
        let created = f.service.create(draft_to("a@x.com")).await.unwrap();
        let id = created.id.unwrap();

        let sent = f.service.send(id).await.unwrap();

        assert_eq!(sent.status, EmailStatus::Sent);
        assert_eq!(Email { status: EmailStatus::Pending, ..sent.clone() }, created);
        assert_eq!(f.service.find_status(id).await.unwrap(), EmailStatus::Sent);
        assert_eq!(f.mailer.calls(), 1);
        assert_eq!(f.store.saves(), 2);
    }

    #[tokio::test]
    async fn send_without_recipients_is_rejected_before_delivery() {
        let f = fixture(StubMailer::default());
        let id = f.service.create(EmailDraft::new("hi", "")).await.unwrap().id.unwrap();

        let kind = kind_of(f.service.send(id).await);

        assert_eq!(kind, ErrorKind::NoRecipients);
        assert_eq!(f.service.find_status(id).await.unwrap(), EmailStatus::Pending);
        assert_eq!(f.mailer.calls(), 0);
        assert_eq!(f.store.saves(), 1);
    }

    #[tokio::test]
    async fn delivery_failure_leaves_record_pending() {
        let f = fixture(StubMailer::failing("mailbox full"));
        let created = f.service.create(draft_to("a@x.com")).await.unwrap();
        let id = created.id.unwrap();

        let err = f.service.send(id).await.unwrap_err();

        let email_err = err.as_email_error().unwrap();
        assert_eq!(email_err.kind, ErrorKind::DeliveryFailed);
        assert_eq!(email_err.id, id);
        assert!(email_err.detail.as_deref().unwrap().contains("mailbox full"));
        assert_eq!(f.service.find_by_id(id).await.unwrap(), created);
        assert_eq!(f.store.saves(), 1);
    }

    #[tokio::test]
    async fn second_send_is_rejected_without_redelivery() {
        let f = fixture(StubMailer::default());
        let id = f.service.create(draft_to("a@x.com")).await.unwrap().id.unwrap();

        f.service.send(id).await.unwrap();
        let kind = kind_of(f.service.send(id).await);

        assert_eq!(kind, ErrorKind::AlreadySent);
        assert_eq!(f.mailer.calls(), 1);
    }

    #[rstest]
    #[case::sequential(1)]
    #[case::concurrent(4)]
    #[tokio::test]
    async fn send_all_pending_reports_each_item(#[case] concurrency: usize) {
        let f = fixture(StubMailer::default());
        let service = f.service.clone().with_batch_concurrency(concurrency);

        let ready = service.create(draft_to("a@x.com")).await.unwrap();
        let empty = service.create(EmailDraft::new("empty", "")).await.unwrap();
        let done = service.create(draft_to("b@x.com")).await.unwrap();
        service.send(done.id.unwrap()).await.unwrap();
        let calls_before = f.mailer.calls();

        let outcomes = service.send_all_pending().await.unwrap();

        assert_eq!(outcomes.len(), 2);
        let sent = outcomes[0].as_ref().unwrap();
        assert_eq!(sent.id, ready.id);
        assert_eq!(sent.status, EmailStatus::Sent);
        let rejected = outcomes[1].as_ref().unwrap_err().as_email_error().unwrap();
        assert_eq!(rejected.kind, ErrorKind::NoRecipients);
        assert_eq!(rejected.id, empty.id.unwrap());
        assert_eq!(f.mailer.calls(), calls_before + 1);
    }

    #[tokio::test]
    async fn send_all_pending_keeps_going_after_delivery_failures() {
        let f = fixture(StubMailer::failing("relay down"));
        for recipient in ["a@x.com", "b@x.com", "c@x.com"] {
            f.service.create(draft_to(recipient)).await.unwrap();
        }

        let outcomes = f.service.send_all_pending().await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(
            outcomes
                .iter()
                .all(|o| o.as_ref().unwrap_err().kind() == Some(ErrorKind::DeliveryFailed))
        );
        assert_eq!(f.mailer.calls(), 3);
        assert_eq!(f.service.counts().await.unwrap().pending, 3);
    }

    #[tokio::test]
    async fn send_all_pending_with_nothing_pending_is_empty() {
        let f = fixture(StubMailer::default());
        assert!(f.service.send_all_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn counts_by_status() {
        let f = fixture(StubMailer::default());
        let id = f.service.create(draft_to("a@x.com")).await.unwrap().id.unwrap();
        f.service.create(draft_to("b@x.com")).await.unwrap();
        f.service.send(id).await.unwrap();

        let counts = f.service.counts().await.unwrap();

        assert_eq!(counts, StatusCounts { pending: 1, sent: 1 });
    }

    #[tokio::test]
    async fn store_faults_surface_as_infrastructure_errors() {
        let service = EmailService::new(Arc::new(DownStore), Arc::new(StubMailer::default()));

        let err = service.create(draft_to("a@x.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Unavailable(_))));
        assert!(service.send_all_pending().await.unwrap_err().kind().is_none());
        assert!(service.find_all().await.is_err());
    }

    #[test]
    fn batch_concurrency_has_a_floor() {
        let service = EmailService::new(
            Arc::new(InMemoryEmailStore::new()),
            Arc::new(StubMailer::default()),
        )
        .with_batch_concurrency(0);

        assert_eq!(service.batch_concurrency(), 1);
    }
}
