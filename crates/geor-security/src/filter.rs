//! CAS processing filter.
//!
//! Compose it with `axum::middleware::from_fn_with_state`:
//!
//! ```ignore
//! let state = CasFilterState::gateway(config, Cas20TicketValidator::new(&config)?);
//! let app = Router::new()
//!     .route("/{*path}", get(proxy))
//!     .layer(middleware::from_fn_with_state(state, cas_processing_filter::<Cas20TicketValidator>));
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::CasConfig;
use crate::ticket::{CasPrincipal, TicketValidator};
use crate::trigger::{AuthenticationTrigger, GatewayTrigger, ProcessesUrlTrigger};

/// Query parameter carrying the service ticket.
pub const TICKET_PARAMETER: &str = "ticket";

/// Shared state for the CAS processing filter.
pub struct CasFilterState<V: TicketValidator> {
    /// Ticket validator implementation.
    pub validator: Arc<V>,
    /// Decides which requests are processed.
    pub trigger: Arc<dyn AuthenticationTrigger>,
    /// Client configuration.
    pub config: Arc<CasConfig>,
}

impl<V: TicketValidator> Clone for CasFilterState<V> {
    fn clone(&self) -> Self {
        Self {
            validator: Arc::clone(&self.validator),
            trigger: Arc::clone(&self.trigger),
            config: Arc::clone(&self.config),
        }
    }
}

impl<V: TicketValidator> CasFilterState<V> {
    /// Creates a state processing tickets on the configured processing path
    /// only.
    pub fn new(config: CasConfig, validator: V) -> Self {
        let trigger = ProcessesUrlTrigger::new(config.processing_path.clone());
        Self::with_trigger(config, validator, trigger)
    }

    /// Creates a state processing every request, as the security proxy does.
    pub fn gateway(config: CasConfig, validator: V) -> Self {
        Self::with_trigger(config, validator, GatewayTrigger)
    }

    /// Creates a state with a custom trigger.
    pub fn with_trigger(
        config: CasConfig,
        validator: V,
        trigger: impl AuthenticationTrigger + 'static,
    ) -> Self {
        Self {
            validator: Arc::new(validator),
            trigger: Arc::new(trigger),
            config: Arc::new(config),
        }
    }
}

/// CAS processing middleware.
///
/// When the trigger fires and the request carries a `ticket` parameter, the
/// ticket is validated against the configured service URL and the resulting
/// `CasPrincipal` is injected into the request extensions. A request without
/// a ticket continues unauthenticated. A rejected ticket yields `401` and an
/// unreachable CAS server `502`.
pub async fn cas_processing_filter<V: TicketValidator + 'static>(
    State(state): State<CasFilterState<V>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.trigger.requires_authentication(&request) {
        return next.run(request).await;
    }

    let Some(ticket) = extract_ticket(request.uri()) else {
        tracing::trace!(path = %request.uri().path(), "no service ticket, continuing anonymously");
        return next.run(request).await;
    };

    match state.validator.validate(&ticket, &state.config.service_url).await {
        Ok(principal) => {
            tracing::info!(user = %principal.username, path = %request.uri().path(), "CAS authentication succeeded");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %request.uri().path(), "CAS authentication failed");
            e.into_response()
        }
    }
}

/// Extracts the service ticket from the query string.
fn extract_ticket(uri: &Uri) -> Option<String> {
    uri.query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == TICKET_PARAMETER)
        .and_then(|(_, value)| {
            urlencoding::decode(&value.replace('+', " "))
                .ok()
                .map(|decoded| decoded.into_owned())
        })
        .filter(|value| !value.is_empty())
}

/// Axum extractor for `CasPrincipal`.
///
/// Rejects with `401` when the request was not authenticated by the filter.
impl<S> FromRequestParts<S> for CasPrincipal
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CasPrincipal>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "Not authenticated"))
    }
}
