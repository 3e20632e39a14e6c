use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::{Deserialize, Serialize};

/// Body of every failed API call.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommonResponse {
    pub code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of every successful API call, `data` holds the payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceResponse<T> {
    pub code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub data: Option<T>,
}

/// Handler result, converted into an [`HttpResponse`] with a JSON envelope.
pub struct Response(HttpResponse);

impl Response {
    pub fn ok<T: Serialize>(data: T) -> Self {
        Self(HttpResponse::Ok().json(ResourceResponse {
            code: StatusCode::OK.as_u16(),
            message: None,
            data: Some(data),
        }))
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self(HttpResponseBuilder::new(status).json(CommonResponse {
            code: status.as_u16(),
            message: Some(message.into()),
        }))
    }

    /// The gate let an anonymous caller through to a handler that needs a session.
    /// Only reachable when the path is configured as public.
    pub fn no_session() -> Self {
        Self::error(StatusCode::UNAUTHORIZED, "a signed in session is required")
    }
}

impl From<Response> for HttpResponse {
    fn from(resp: Response) -> Self {
        resp.0
    }
}
