//! # farmpass-shared
//!
//! Types shared by every FarmPass crate: scan classification, sessions,
//! backend records and their field-name normalization.

pub mod constants;
pub mod error;
pub mod models;
pub mod normalize;
pub mod scan;
pub mod session;

pub use error::{DecodeError, ValidationError};
pub use scan::{classify, ScanPayload};
pub use session::{Principal, Session, SessionDomain};
