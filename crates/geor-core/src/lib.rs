//! # geor-core
//!
//! Configuration bootstrap and error conventions shared by the geOrchestra
//! Rust crates.
//!
//! Configuration is resolved from an ordered list of property sources: the
//! shared `default.properties` of the data directory first, then the process
//! environment.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod initializer;
pub mod properties;

pub use error::{Error, Result};
pub use initializer::{bootstrap, DefaultPropsInitializer};
pub use properties::{PropertySource, PropertySources};
