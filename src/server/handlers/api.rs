use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::web::{Data, Path};
use actix_web::{HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::roles::permissions::{Permission, PermissionSet};
use crate::roles::Role;
use crate::server::context::ServerContext;
use crate::server::response::Response;

use super::session_of;

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoamiResponse {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub role_name: String,
    pub permissions: PermissionSet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaniResponse {
    pub allow: bool,
}

pub async fn get_whoami(req: HttpRequest, ctx: Data<Arc<ServerContext>>) -> HttpResponse {
    let session = match session_of(&req) {
        Some(session) => session,
        None => return Response::no_session().into(),
    };

    let permissions = *ctx.permissions.permissions_of(session.role);
    Response::ok(WhoamiResponse {
        user_id: session.user_id,
        email: session.email,
        role: session.role,
        role_name: session.role.display_name().to_string(),
        permissions,
    })
    .into()
}

pub async fn get_cani(
    req: HttpRequest,
    permission: Path<String>,
    ctx: Data<Arc<ServerContext>>,
) -> HttpResponse {
    let session = match session_of(&req) {
        Some(session) => session,
        None => return Response::no_session().into(),
    };

    let permission: Permission = match permission.parse() {
        Ok(permission) => permission,
        Err(e) => return Response::error(StatusCode::BAD_REQUEST, format!("{e:#}")).into(),
    };

    let allow = ctx.permissions.has_permission(session.role, permission);
    Response::ok(CaniResponse { allow }).into()
}
