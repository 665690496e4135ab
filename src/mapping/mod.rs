//! # Mapping Module
//!
//! Declarative mapping between record types and spreadsheet rows: field
//! registration, layout derivation for exports, cell coercion and the row
//! extractor for imports.
pub mod coerce;
pub mod column;
pub mod extract;
pub mod schema;
pub mod structure;
pub mod style;
