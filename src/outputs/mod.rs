//! Output sinks for extracted article records.
//!
//! - [`csv`]: append-only CSV table, one row per article

pub mod csv;
