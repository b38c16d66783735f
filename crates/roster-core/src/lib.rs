#![deny(unsafe_code)]

//! Import reconciliation for roster and drill-score sheets.
//!
//! Given a parsed sheet, the event's schema fields and an index of records
//! already stored, [`ImportOrchestrator`] decides what every row becomes:
//! a new athlete, an update, a score merge, a skip or a rejection.

pub mod detect;
pub mod duplicates;
pub mod error;
pub mod identity;
pub mod index;
pub mod options;
pub mod orchestrator;
pub mod redact;
pub mod validate;
pub mod value;

pub use detect::{TemplateDetection, detect_template};
pub use duplicates::{
    BatchDuplicatePolicy, DuplicateDetector, DuplicatePolicy, RosterDuplicatePolicy,
    verdict_issue,
};
pub use error::{BlockedImport, ImportError, Result};
pub use identity::{
    IdentityKeys, IdentityResolver, NO_NUMBER, NUMBER_PREFIX, composite_key, generate_stable_id, normalize_name,
    normalize_number, stable_id_for,
};
pub use index::{EmptyIndex, ExistingRecord, IdentityIndex, InMemoryIdentityIndex};
pub use options::{DEFAULT_MAX_ROWS, ImportOptions};
pub use orchestrator::{ImportOrchestrator, run};
pub use redact::{REDACTED_VALUE, log_data_enabled, redact_value, set_log_data};
pub use value::{clean_number, coerce, parse_plain_number};
