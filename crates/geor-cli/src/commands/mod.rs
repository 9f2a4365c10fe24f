//! Command implementations.

pub mod org;
pub mod status;

pub use org::run_org;
pub use status::run_status;
