use actix_web::web::Data;
use actix_web::HttpResponse;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::gate::Gate;
use crate::server::response::Response;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthzResponse {
    pub version: String,
    pub started: bool,
    pub rules: usize,
    pub now: String,
}

pub async fn get_healthz(gate: Data<Gate>) -> HttpResponse {
    Response::ok(HealthzResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        started: true,
        rules: gate.rules().len(),
        now: Utc::now().to_rfc3339(),
    })
    .into()
}
