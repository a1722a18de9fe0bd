use shared::Endpoint;

/// Which route to call and the `Authorization` value to send with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub endpoint: Endpoint,
    pub auth_header: Option<String>,
}

/// Must be called at submission time so a login between selecting a file and
/// pressing "analyze" is honored.
pub fn select(token: Option<&str>) -> Route {
    match token.filter(|t| !t.trim().is_empty()) {
        Some(token) => Route {
            endpoint: Endpoint::AuthenticatedDisease,
            auth_header: Some(format!("Bearer {}", token)),
        },
        None => Route {
            endpoint: Endpoint::PublicDisease,
            auth_header: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_selects_authenticated_route() {
        let route = select(Some("jwt-token"));
        assert_eq!(route.endpoint, Endpoint::AuthenticatedDisease);
        assert_eq!(route.auth_header.as_deref(), Some("Bearer jwt-token"));
    }

    #[test]
    fn missing_token_selects_public_route_without_header() {
        for token in [None, Some(""), Some("  ")] {
            let route = select(token);
            assert_eq!(route.endpoint, Endpoint::PublicDisease);
            assert_eq!(route.auth_header, None);
        }
    }
}
