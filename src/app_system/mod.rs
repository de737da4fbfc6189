//! System orchestration, startup, and shutdown logic.

pub mod delivery_system;
pub mod tracing;

pub use delivery_system::*;
pub use tracing::*;
