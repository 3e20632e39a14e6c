use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::ErrorInternalServerError;
use actix_web::http::header::LOCATION;
use actix_web::middleware::Next;
use actix_web::web::Data;
use actix_web::{Error, HttpMessage, HttpResponse};
use log::{error, info};

use crate::authz::{decide, Decision, RequiredRoles};
use crate::session::Session;

use super::{callback_of, Gate, GateDecision};

/// Gates every request of the app, use with [`actix_web::middleware::from_fn`]. The
/// [`Gate`] is taken from the app data, the resolved [`Session`] is attached to the
/// request extensions for the handlers.
pub async fn gate_requests(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let gate = match req.app_data::<Data<Gate>>() {
        Some(gate) => gate.clone(),
        None => {
            error!("Request gate is not registered in app data, rejecting request");
            return Err(ErrorInternalServerError("request gate is not configured"));
        }
    };

    let (decision, session) = gate.check(req.request()).await;
    match gate.location(&decision) {
        Some(location) => Ok(redirect(req, location).map_into_right_body()),
        None => {
            if let Some(session) = session {
                req.extensions_mut().insert(session);
            }
            let res = next.call(req).await?;
            Ok(res.map_into_left_body())
        }
    }
}

/// Protects a scope with a fixed set of roles, on top of the gate's path rules:
///
/// ```ignore
/// web::scope("/reports").wrap(RequireRoles::new(RequiredRoles::moderator()))
/// ```
///
/// The session is read from the request extensions, so [`gate_requests`] must wrap the
/// app.
#[derive(Clone)]
pub struct RequireRoles {
    required: Rc<RequiredRoles>,
    redirect_to: Option<Rc<str>>,
}

impl RequireRoles {
    pub fn new(required: RequiredRoles) -> Self {
        Self {
            required: Rc::new(required),
            redirect_to: None,
        }
    }

    /// Where denied callers are sent instead of the gate's unauthorized page.
    pub fn redirect_to(mut self, path: &str) -> Self {
        self.redirect_to = Some(Rc::from(path));
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRoles
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireRolesMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRolesMiddleware {
            service,
            required: self.required.clone(),
            redirect_to: self.redirect_to.clone(),
        }))
    }
}

pub struct RequireRolesMiddleware<S> {
    service: S,
    required: Rc<RequiredRoles>,
    redirect_to: Option<Rc<str>>,
}

type BoxedResponse<B> =
    Pin<Box<dyn Future<Output = Result<ServiceResponse<EitherBody<B>>, Error>>>>;

impl<S, B> Service<ServiceRequest> for RequireRolesMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = BoxedResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let gate = match req.app_data::<Data<Gate>>() {
            Some(gate) => gate.clone(),
            None => {
                error!("Request gate is not registered in app data, rejecting request");
                let err = ErrorInternalServerError("request gate is not configured");
                return Box::pin(ready(Err(err)));
            }
        };

        let role = req.extensions().get::<Session>().map(|s| s.role);
        let callback = callback_of(req.path(), req.query_string());
        let decision = match decide(role, &self.required, &callback) {
            Decision::Continue => {
                let fut = self.service.call(req);
                return Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                });
            }
            Decision::RedirectToSignIn { callback } => GateDecision::RedirectToSignIn { callback },
            Decision::RedirectToUnauthorized => {
                let target = match self.redirect_to.as_ref() {
                    Some(target) => target.to_string(),
                    None => gate.config().unauthorized_path.clone(),
                };
                GateDecision::RedirectToUnauthorized { target }
            }
        };

        info!("Role guard {}: {decision}", req.path());
        let res = match gate.location(&decision) {
            Some(location) => redirect(req, location).map_into_right_body(),
            // Both arms above redirect
            None => req
                .into_response(HttpResponse::Forbidden().finish())
                .map_into_right_body(),
        };
        Box::pin(ready(Ok(res)))
    }
}

fn redirect(req: ServiceRequest, location: String) -> ServiceResponse {
    let resp = HttpResponse::Found()
        .insert_header((LOCATION, location))
        .finish();
    req.into_response(resp)
}
