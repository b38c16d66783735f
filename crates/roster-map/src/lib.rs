#![deny(unsafe_code)]

//! Column mapping for roster and drill spreadsheets.
//!
//! Headers are normalized ([`normalize`]), compared against synonyms generated
//! per schema field ([`synonyms`]) and scored by the [`ColumnMatcher`]. The
//! resulting proposal can be reviewed through [`MappingState`] and persisted
//! with [`MappingRepository`].

pub mod error;
pub mod hints;
pub mod matcher;
pub mod normalize;
pub mod repository;
pub mod state;
pub mod synonyms;
pub mod types;

pub use error::MappingError;
pub use hints::closest_label;
pub use matcher::{ColumnMatcher, ConfidenceThresholds, MappingProposal, match_columns};
pub use normalize::{normalize, normalize_aggressive};
pub use repository::{MappingMetadata, MappingRepository, StoredMapping};
pub use state::{HeaderMappingStatus, MappingState, MappingSummary};
pub use synonyms::{synonym_list, synonyms_for};
pub use types::{ConfirmedColumn, ConfirmedMapping};
