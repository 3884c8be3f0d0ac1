//! Domain entities exposed by the record client.

pub mod form_options;
pub mod record;
pub mod types;
