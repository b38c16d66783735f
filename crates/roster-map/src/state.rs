//! Mapping state management for interactive review.
//!
//! A [`MappingState`] starts from a matcher proposal and records the edits a
//! reviewer makes before the mapping is used for an import.

use roster_model::{ColumnMapping, ConfidenceLevel, MappingOrigin, SchemaField};
use tracing::debug;

use crate::error::{MappingError, Result};
use crate::matcher::{ColumnMatcher, MappingProposal};
use crate::types::ConfirmedMapping;

/// State of a mapping under review for one event.
#[derive(Debug, Clone)]
pub struct MappingState {
    /// Event identifier
    pub event_id: String,
    /// Schema fields the headers can map to
    pub fields: Vec<SchemaField>,
    /// One entry per header, in header order
    pub mappings: Vec<ColumnMapping>,
    allow_shared_targets: bool,
}

impl MappingState {
    /// Create a new mapping state from a proposal.
    pub fn new(event_id: &str, fields: Vec<SchemaField>, proposal: MappingProposal) -> Self {
        Self {
            event_id: event_id.to_string(),
            fields,
            mappings: proposal.mappings,
            allow_shared_targets: false,
        }
    }

    /// Create a new mapping state by running the matcher.
    pub fn from_matcher(event_id: &str, matcher: &ColumnMatcher, headers: &[String]) -> Self {
        let proposal = matcher.match_headers(headers);
        Self::new(event_id, matcher.fields().to_vec(), proposal)
    }

    #[must_use]
    pub fn allow_shared_targets(mut self, allow: bool) -> Self {
        self.allow_shared_targets = allow;
        self
    }

    pub fn mapping_for(&self, header: &str) -> Option<&ColumnMapping> {
        self.mappings.iter().find(|m| m.source_header == header)
    }

    fn position_of(&self, header: &str) -> Result<usize> {
        self.mappings
            .iter()
            .position(|m| m.source_header == header)
            .ok_or_else(|| MappingError::HeaderNotFound(header.to_string()))
    }

    /// Header currently holding `target_key`, other than `except`.
    fn holder_of(&self, target_key: &str, except: usize) -> Option<&ColumnMapping> {
        self.mappings
            .iter()
            .enumerate()
            .find(|(i, m)| *i != except && m.target() == Some(target_key))
            .map(|(_, m)| m)
    }

    /// Get mapping status for a header.
    pub fn status(&self, header: &str) -> HeaderMappingStatus {
        match self.mapping_for(header) {
            Some(m) if m.is_mapped() && m.origin != MappingOrigin::Auto => {
                HeaderMappingStatus::Confirmed
            }
            Some(m) if m.is_mapped() => HeaderMappingStatus::Suggested,
            _ => HeaderMappingStatus::Unmapped,
        }
    }

    /// Map a header to a field chosen by the reviewer.
    pub fn accept_manual(&mut self, header: &str, target_key: &str) -> Result<()> {
        let position = self.position_of(header)?;
        if !self.fields.iter().any(|f| f.key == target_key) {
            return Err(MappingError::UnknownField(target_key.to_string()));
        }
        if !self.allow_shared_targets
            && let Some(holder) = self.holder_of(target_key, position)
        {
            return Err(MappingError::TargetAlreadyUsed {
                target: target_key.to_string(),
                header: holder.source_header.clone(),
            });
        }
        let index = self.mappings[position].column_index;
        self.mappings[position] = ColumnMapping::manual(header, index, target_key);
        Ok(())
    }

    /// Clear the mapping for a header. Returns false if it was not mapped.
    pub fn clear_mapping(&mut self, header: &str) -> Result<bool> {
        let position = self.position_of(header)?;
        let mapping = &mut self.mappings[position];
        if !mapping.is_mapped() {
            return Ok(false);
        }
        let index = mapping.column_index;
        *mapping = ColumnMapping::unmapped(header, index);
        mapping.origin = MappingOrigin::Manual;
        Ok(true)
    }

    /// Applies a previously confirmed mapping.
    ///
    /// Only headers that are unmapped or mapped below medium confidence are
    /// touched; a good proposal is never replaced. Remembered targets that no
    /// longer exist in the schema, or that another header already holds, are
    /// ignored. Returns the number of headers filled.
    pub fn fill_from_remembered(&mut self, remembered: &ConfirmedMapping) -> usize {
        let mut filled = 0;
        for position in 0..self.mappings.len() {
            let current = &self.mappings[position];
            if current.is_mapped() && current.confidence >= ConfidenceLevel::Medium {
                continue;
            }
            if current.origin == MappingOrigin::Manual {
                continue;
            }
            let Some(target) = remembered.target_for(&current.source_header) else {
                continue;
            };
            if !self.fields.iter().any(|f| f.key == target) {
                continue;
            }
            if !self.allow_shared_targets && self.holder_of(target, position).is_some() {
                continue;
            }
            let header = current.source_header.clone();
            let index = current.column_index;
            debug!(header = %header, target, "remembered mapping applied");
            let mut mapping = ColumnMapping::manual(header, index, target);
            mapping.origin = MappingOrigin::Remembered;
            self.mappings[position] = mapping;
            filled += 1;
        }
        filled
    }

    /// Required fields that no header maps to, directly or through a field
    /// that covers them.
    pub fn unmapped_required(&self) -> Vec<&SchemaField> {
        let mapped: Vec<&SchemaField> = self
            .mappings
            .iter()
            .filter_map(|m| {
                let target = m.target()?;
                self.fields.iter().find(|f| f.key == target)
            })
            .collect();
        self.fields
            .iter()
            .filter(|f| f.required && !mapped.iter().any(|target| target.satisfies(&f.key)))
            .collect()
    }

    /// Get summary counts.
    pub fn summary(&self) -> MappingSummary {
        let required_total = self.fields.iter().filter(|f| f.required).count();
        MappingSummary {
            total_headers: self.mappings.len(),
            mapped: self.mappings.iter().filter(|m| m.is_mapped()).count(),
            confirmed: self
                .mappings
                .iter()
                .filter(|m| m.is_mapped() && m.origin != MappingOrigin::Auto)
                .count(),
            required_total,
            required_mapped: required_total - self.unmapped_required().len(),
        }
    }

    /// Convert to a confirmed mapping for the repository.
    pub fn to_confirmed(&self) -> ConfirmedMapping {
        ConfirmedMapping::from_mappings(&self.event_id, &self.mappings)
    }

    pub fn into_mappings(self) -> Vec<ColumnMapping> {
        self.mappings
    }
}

/// Status of a header's mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMappingStatus {
    /// Mapped manually or from a remembered mapping.
    Confirmed,
    /// Mapped by the matcher, not yet reviewed.
    Suggested,
    /// No mapping.
    Unmapped,
}

/// Summary of mapping counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingSummary {
    /// Number of headers in the sheet.
    pub total_headers: usize,
    /// Headers with a target.
    pub mapped: usize,
    /// Mapped headers confirmed by a user or restored from memory.
    pub confirmed: usize,
    /// Total required fields.
    pub required_total: usize,
    /// Required fields that are mapped.
    pub required_mapped: usize,
}
