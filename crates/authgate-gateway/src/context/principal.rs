use axum::http::HeaderMap;

use authgate_core::error::{AuthGateError, Result};

pub const PRINCIPAL_HEADER: &str = "x-principal";
pub const AGE_HEADER: &str = "x-principal-age";
pub const BALANCE_HEADER: &str = "x-account-balance";

/// Identity attached to a request plus the profile facts policies care about.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPrincipal {
    pub id: String,
    pub age: Option<f64>,
    pub account_balance: Option<f64>,
}

impl SessionPrincipal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            age: None,
            account_balance: None,
        }
    }
}

/// Maps an inbound request to its principal.
/// `Ok(None)` means anonymous; `Err` means the lookup itself broke.
pub trait PrincipalResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionPrincipal>>;
}

/// Reads identity from headers set by an upstream session layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderPrincipalResolver;

impl PrincipalResolver for HeaderPrincipalResolver {
    fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionPrincipal>> {
        let Some(raw) = headers.get(PRINCIPAL_HEADER) else {
            return Ok(None);
        };
        let id = raw
            .to_str()
            .map_err(|_| AuthGateError::Lookup(format!("{PRINCIPAL_HEADER} is not valid ascii")))?
            .trim();
        if id.is_empty() {
            return Ok(None);
        }

        Ok(Some(SessionPrincipal {
            id: id.to_string(),
            age: number_header(headers, AGE_HEADER),
            account_balance: number_header(headers, BALANCE_HEADER),
        }))
    }
}

fn number_header(headers: &HeaderMap, name: &str) -> Option<f64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_or_blank_header_is_anonymous() {
        let mut h = HeaderMap::new();
        assert_eq!(HeaderPrincipalResolver.resolve(&h).unwrap(), None);
        h.insert(PRINCIPAL_HEADER, HeaderValue::from_static("  "));
        assert_eq!(HeaderPrincipalResolver.resolve(&h).unwrap(), None);
    }

    #[test]
    fn profile_headers_are_parsed() {
        let mut h = HeaderMap::new();
        h.insert(PRINCIPAL_HEADER, HeaderValue::from_static("bob@example.com"));
        h.insert(AGE_HEADER, HeaderValue::from_static("16"));
        h.insert(BALANCE_HEADER, HeaderValue::from_static("not-a-number"));

        let p = HeaderPrincipalResolver.resolve(&h).unwrap().unwrap();
        assert_eq!(p.id, "bob@example.com");
        assert_eq!(p.age, Some(16.0));
        assert_eq!(p.account_balance, None);
    }
}
