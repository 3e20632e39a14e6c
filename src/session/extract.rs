use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::HttpRequest;

/// Finds the session token carried by a request: an `Authorization: Bearer` header
/// first, then the session cookie.
#[derive(Debug, Clone)]
pub struct TokenExtractor {
    cookie_name: String,
}

impl TokenExtractor {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }

    pub fn extract(&self, req: &HttpRequest) -> Option<String> {
        if let Some(token) = Self::bearer_token(req.headers()) {
            return Some(token);
        }

        let cookie = req.cookie(&self.cookie_name)?;
        let token = cookie.value().trim();
        if token.is_empty() {
            return None;
        }
        Some(token.to_string())
    }

    fn bearer_token(headers: &HeaderMap) -> Option<String> {
        let auth = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
        if auth.is_empty() {
            return None;
        }

        let mut iter = auth.split_whitespace();
        let scheme = iter.next()?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let token = iter.next()?;
        if iter.next().is_some() {
            return None;
        }
        Some(token.to_string())
    }
}
