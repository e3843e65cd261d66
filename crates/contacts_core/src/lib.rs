//! Contacts core: pure data model and email de-obfuscation.
mod cfemail;
mod progress;
mod record;
mod target;

pub use cfemail::{cfemail_token_from_href, decode_cfemail, DecodeError};
pub use progress::{RunProgress, StopReason};
pub use record::{Record, ResultSet};
pub use target::{ExtractionSelectors, Target, PAGE_PLACEHOLDER};
