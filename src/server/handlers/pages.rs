use actix_web::http::{Method, StatusCode};
use actix_web::{HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::roles::Role;
use crate::server::response::Response;

use super::session_of;

/// What a page would be rendered with. Pages themselves live in the application, this
/// only shows that the request made it through the gate.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse {
    pub path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

pub async fn default_handler(req: HttpRequest) -> HttpResponse {
    if *req.method() != Method::GET {
        let message = format!("No route to {} {}", req.method(), req.path());
        return Response::error(StatusCode::NOT_FOUND, message).into();
    }

    let session = session_of(&req);
    Response::ok(PageResponse {
        path: req.path().to_string(),
        email: session.as_ref().map(|s| s.email.clone()),
        role: session.map(|s| s.role),
    })
    .into()
}
