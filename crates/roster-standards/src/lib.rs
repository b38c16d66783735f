#![deny(unsafe_code)]

pub mod error;
pub mod registry;
pub mod roster;
pub mod schema;
pub mod templates;

pub use crate::error::{Result, StandardsError};
pub use crate::registry::TemplateRegistry;
pub use crate::roster::roster_fields;
pub use crate::schema::{
    CustomDrillDef, EventSchema, EventSchemaDef, RosterFieldDef, load_event_schema,
    load_event_schema_def,
};
pub use crate::templates::{SportTemplate, builtin_templates};
