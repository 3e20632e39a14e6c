pub mod api;
pub mod healthz;
pub mod pages;

use actix_web::{HttpMessage, HttpRequest};

use crate::session::Session;

/// The session the gate attached to the request, `None` for anonymous callers.
pub fn session_of(req: &HttpRequest) -> Option<Session> {
    req.extensions().get::<Session>().cloned()
}
