//! # geor-security
//!
//! CAS authentication for the geOrchestra security proxy.
//!
//! [`cas_processing_filter`] is an Axum middleware that validates CAS
//! service tickets and exposes the authenticated [`CasPrincipal`] to
//! handlers. Which requests are processed is decided by an
//! [`AuthenticationTrigger`]: the stock [`ProcessesUrlTrigger`] only looks at
//! the login endpoint, while the proxy uses [`GatewayTrigger`] so that any
//! URL returning from a CAS gateway redirect is authenticated.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod filter;
pub mod ticket;
pub mod trigger;

pub use config::CasConfig;
pub use error::{CasError, CasResult};
pub use filter::{cas_processing_filter, CasFilterState};
pub use ticket::{Cas20TicketValidator, CasPrincipal, SimpleTicketValidator, TicketValidator};
pub use trigger::{AuthenticationTrigger, GatewayTrigger, ProcessesUrlTrigger};
