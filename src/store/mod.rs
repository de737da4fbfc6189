//! The row store adapter: fixed-column tables with positional schemas.
//!
//! Records are typed everywhere else in the crate; the exact legacy column
//! layout lives only here so the store can be swapped for a real database
//! without touching the services.

pub mod rows;
pub mod table;

pub use table::{Schema, Table};
