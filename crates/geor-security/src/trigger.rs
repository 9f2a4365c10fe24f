//! Decides which requests go through CAS ticket processing.

use axum::extract::Request;

/// Decides whether a request requires CAS authentication.
pub trait AuthenticationTrigger: Send + Sync {
    /// Returns `true` when the request must be authenticated.
    fn requires_authentication(&self, request: &Request) -> bool;
}

/// Fires only on the ticket processing path.
///
/// This is the stock CAS client behaviour: tickets are only looked for on
/// the dedicated login endpoint.
#[derive(Debug, Clone)]
pub struct ProcessesUrlTrigger {
    path: String,
}

impl ProcessesUrlTrigger {
    /// Creates a trigger for a processing path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl AuthenticationTrigger for ProcessesUrlTrigger {
    fn requires_authentication(&self, request: &Request) -> bool {
        request.uri().path() == self.path
    }
}

/// Fires on every request.
///
/// The security proxy runs in gateway mode: any proxied URL may come back
/// from CAS carrying a ticket, so every request is a candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatewayTrigger;

impl AuthenticationTrigger for GatewayTrigger {
    fn requires_authentication(&self, _request: &Request) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn processes_url_trigger_matches_path_only() {
        let trigger = ProcessesUrlTrigger::new("/login/cas");
        assert!(trigger.requires_authentication(&request("/login/cas")));
        assert!(trigger.requires_authentication(&request("/login/cas?ticket=ST-1")));
        assert!(!trigger.requires_authentication(&request("/geoserver/wms")));
        assert!(!trigger.requires_authentication(&request("/login/cas/extra")));
    }

    #[test]
    fn gateway_trigger_always_fires() {
        let trigger = GatewayTrigger;
        for uri in ["/", "/login/cas", "/geoserver/wms?SERVICE=WMS", "/console/account"] {
            assert!(trigger.requires_authentication(&request(uri)));
        }
    }
}
