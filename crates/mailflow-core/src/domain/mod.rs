//! Domain model (ids, email, status, errors).

pub mod email;
pub mod errors;
pub mod ids;
pub mod state;

pub use email::{Email, EmailDraft, Priority};
pub use errors::{DeliveryError, EmailError, ErrorKind, ServiceError, StoreError};
pub use ids::{EmailId, ParseIdError};
pub use state::EmailStatus;
