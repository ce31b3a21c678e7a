//! IdGenerator port - ID 生成の抽象化
//!
//! 永続化ポートの実装は、初回保存時にこの trait で ID を採番します。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（Clock で timestamp 部分を決定）

use crate::domain::ids::EmailId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は Email ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（ストアから共有して使う）
pub trait IdGenerator: Send + Sync {
    fn generate_email_id(&self) -> EmailId;
}

/// UlidGenerator は ULID ベースの ID 生成器
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_email_id(&self) -> EmailId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        EmailId::from(ulid)
    }
}
