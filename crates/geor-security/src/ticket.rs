//! CAS service ticket validation.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::config::CasConfig;
use crate::error::{CasError, CasResult};

/// Identity asserted by the CAS server for a validated ticket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CasPrincipal {
    /// Authenticated user name.
    pub username: String,
    /// Released attributes.
    pub attributes: HashMap<String, Vec<String>>,
    /// Proxy granting ticket IOU, when one was requested.
    pub proxy_granting_ticket: Option<String>,
}

impl CasPrincipal {
    /// Creates a principal without attributes.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Adds an attribute value.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Gets the first value of an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }
}

// ============================================================================
// Ticket Validator Trait
// ============================================================================

/// Validates CAS service tickets.
#[allow(async_fn_in_trait)]
pub trait TicketValidator: Send + Sync {
    /// Validates a ticket issued for `service`.
    ///
    /// # Errors
    ///
    /// Returns `CasError::InvalidTicket` if the server rejects the ticket and
    /// `CasError::Unavailable` if the server cannot be reached.
    async fn validate(&self, ticket: &str, service: &str) -> CasResult<CasPrincipal>;
}

/// Simple in-memory ticket validator for testing.
///
/// Tickets are single use, as on a real CAS server.
#[derive(Debug, Default)]
pub struct SimpleTicketValidator {
    tickets: Mutex<HashMap<String, CasPrincipal>>,
    offline: bool,
}

impl SimpleTicketValidator {
    /// Creates an empty validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a validator that fails as if the server were down.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Issues a ticket for a principal.
    pub fn add_ticket(&self, ticket: impl Into<String>, principal: CasPrincipal) {
        self.tickets.lock().insert(ticket.into(), principal);
    }
}

impl TicketValidator for SimpleTicketValidator {
    async fn validate(&self, ticket: &str, _service: &str) -> CasResult<CasPrincipal> {
        if self.offline {
            return Err(CasError::unavailable("validator offline"));
        }
        self.tickets
            .lock()
            .remove(ticket)
            .ok_or_else(|| CasError::invalid_ticket("INVALID_TICKET", "ticket not recognized"))
    }
}

// ============================================================================
// CAS 2.0 Validator
// ============================================================================

/// Validates tickets against a CAS server's `/serviceValidate` endpoint.
#[derive(Debug, Clone)]
pub struct Cas20TicketValidator {
    client: reqwest::Client,
    validate_url: String,
}

impl Cas20TicketValidator {
    /// Creates a validator for the configured server.
    ///
    /// # Errors
    ///
    /// Returns `CasError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: &CasConfig) -> CasResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CasError::config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self::with_client(config, client))
    }

    /// Creates a validator using an existing HTTP client.
    #[must_use]
    pub fn with_client(config: &CasConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            validate_url: config.service_validate_url(),
        }
    }
}

impl TicketValidator for Cas20TicketValidator {
    async fn validate(&self, ticket: &str, service: &str) -> CasResult<CasPrincipal> {
        let response = self
            .client
            .get(&self.validate_url)
            .query(&[("ticket", ticket), ("service", service)])
            .send()
            .await
            .map_err(|e| CasError::unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CasError::unavailable(format!(
                "{} answered {status}",
                self.validate_url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CasError::unavailable(e.to_string()))?;
        let principal = parse_service_response(&body)?;

        tracing::debug!(user = %principal.username, "CAS ticket validated");
        Ok(principal)
    }
}

/// Parses a CAS 2.0/3.0 `serviceResponse` document.
///
/// # Errors
///
/// Returns `CasError::InvalidTicket` for an `authenticationFailure` and
/// `CasError::MalformedResponse` when neither outcome is present.
pub fn parse_service_response(xml: &str) -> CasResult<CasPrincipal> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut principal: Option<CasPrincipal> = None;
    let mut failure: Option<(String, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match name.as_str() {
                    "authenticationSuccess" => principal = Some(CasPrincipal::default()),
                    "authenticationFailure" => {
                        let code = e
                            .try_get_attribute("code")
                            .ok()
                            .flatten()
                            .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
                            .unwrap_or_default();
                        failure = Some((code, String::new()));
                    }
                    _ => {}
                }
                path.push(name);
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| CasError::malformed(e.to_string()))?
                    .into_owned();
                let current = path.last().map(String::as_str);
                let parent = path.len().checked_sub(2).map(|i| path[i].as_str());

                if current == Some("authenticationFailure") {
                    if let Some((_, message)) = failure.as_mut() {
                        *message = text;
                    }
                } else if let Some(p) = principal.as_mut() {
                    match (parent, current) {
                        (Some("authenticationSuccess"), Some("user")) => p.username = text,
                        (Some("authenticationSuccess"), Some("proxyGrantingTicket")) => {
                            p.proxy_granting_ticket = Some(text);
                        }
                        (Some("attributes"), Some(attr)) => {
                            p.attributes.entry(attr.to_string()).or_default().push(text);
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CasError::malformed(e.to_string())),
            Ok(_) => {}
        }
    }

    if let Some((code, message)) = failure {
        return Err(CasError::invalid_ticket(code, message));
    }
    match principal {
        Some(p) if !p.username.is_empty() => Ok(p),
        Some(_) => Err(CasError::malformed("authenticationSuccess without user")),
        None => Err(CasError::malformed("no authentication outcome")),
    }
}
