pub mod config;
pub mod middleware;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use actix_web::HttpRequest;
use log::{debug, info, warn};

use crate::authz::rule::{matches_prefix, RuleTable};
use crate::authz::Decision;
use crate::session::{Session, SessionResolver, TokenExtractor};

use self::config::GateConfig;

/// The single action the gate takes for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Continue,
    /// Anonymous caller on a protected path. `callback` is the original path and
    /// query, already sanitized.
    RedirectToSignIn { callback: String },
    /// Signed-in caller without enough privilege.
    RedirectToUnauthorized { target: String },
    /// Signed-in caller on the landing page or in the sign-in flow.
    RedirectToHome { target: String },
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateDecision::Continue => write!(f, "continue"),
            GateDecision::RedirectToSignIn { callback } => {
                write!(f, "redirect to sign-in (callback '{callback}')")
            }
            GateDecision::RedirectToUnauthorized { target } => {
                write!(f, "redirect to unauthorized page '{target}'")
            }
            GateDecision::RedirectToHome { target } => write!(f, "redirect to home '{target}'"),
        }
    }
}

/// Decides, for every request, whether it goes through, or where the caller is sent
/// instead. Built once at startup and shared read-only by every worker.
pub struct Gate {
    cfg: GateConfig,
    rules: RuleTable,
    extractor: TokenExtractor,
    resolver: Arc<dyn SessionResolver>,
}

impl Gate {
    pub fn new(
        cfg: GateConfig,
        rules: RuleTable,
        extractor: TokenExtractor,
        resolver: Arc<dyn SessionResolver>,
    ) -> Self {
        Self {
            cfg,
            rules,
            extractor,
            resolver,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.cfg
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Gates a live request. The session is returned along with the decision so that
    /// it can be handed to the handlers.
    pub async fn check(&self, req: &HttpRequest) -> (GateDecision, Option<Session>) {
        let raw = req.path();
        let session = match decode_path(raw) {
            Some(path) if self.is_bypassed(&path) => return (GateDecision::Continue, None),
            Some(_) => self.resolve_session(req).await,
            None => None,
        };

        let decision = self.evaluate(raw, req.query_string(), session.as_ref());
        match &decision {
            GateDecision::Continue => debug!("Gate {raw}: {decision}"),
            _ => info!("Gate {raw}: {decision}"),
        }
        (decision, session)
    }

    /// Resolves the caller's session. Every failure leaves the caller anonymous.
    pub async fn resolve_session(&self, req: &HttpRequest) -> Option<Session> {
        let token = self.extractor.extract(req)?;
        match self.resolver.resolve_session(&token).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Resolve session failed, treat as anonymous: {e:#}");
                None
            }
        }
    }

    /// The gate's decision for a request path, as sent by the client, and an already
    /// resolved session. Pure, the same input always gives the same decision.
    ///
    /// Rules are matched against the percent-decoded path, the form the router
    /// dispatches on. A path that does not decode to UTF-8 is gated as if the caller
    /// were anonymous.
    pub fn evaluate(
        &self,
        raw_path: &str,
        query: &str,
        session: Option<&Session>,
    ) -> GateDecision {
        let (path, session) = match decode_path(raw_path) {
            Some(path) => (path, session),
            None => {
                let bytes = urlencoding::decode_binary(raw_path.as_bytes());
                let path = String::from_utf8_lossy(&bytes).into_owned();
                (Cow::Owned(path), None)
            }
        };
        let path = path.as_ref();

        if self.is_bypassed(path) {
            return GateDecision::Continue;
        }

        let role = session.map(|s| s.role);
        if let Some(role) = role {
            if path == self.cfg.landing_path || matches_prefix(path, &self.cfg.auth_prefix) {
                let target = self.cfg.dashboards.dashboard_of(role);
                return GateDecision::RedirectToHome {
                    target: target.to_string(),
                };
            }
        }

        let callback = callback_of(raw_path, query);
        if let Some(rule) = self.rules.find(path) {
            return match rule.decide(role, &callback) {
                Decision::Continue => GateDecision::Continue,
                Decision::RedirectToSignIn { callback } => {
                    GateDecision::RedirectToSignIn { callback }
                }
                Decision::RedirectToUnauthorized => GateDecision::RedirectToUnauthorized {
                    target: rule
                        .redirect_to()
                        .unwrap_or(self.cfg.unauthorized_path.as_str())
                        .to_string(),
                },
            };
        }

        if role.is_some() || self.is_public(path) {
            return GateDecision::Continue;
        }

        GateDecision::RedirectToSignIn { callback }
    }

    /// The `Location` of a redirecting decision.
    pub fn location(&self, decision: &GateDecision) -> Option<String> {
        match decision {
            GateDecision::Continue => None,
            GateDecision::RedirectToSignIn { callback } => Some(format!(
                "{}?callbackUrl={}",
                self.cfg.signin_path,
                urlencoding::encode(callback)
            )),
            GateDecision::RedirectToUnauthorized { target } => Some(target.clone()),
            GateDecision::RedirectToHome { target } => Some(target.clone()),
        }
    }

    /// Whether a decoded path skips the gate. Paths covered by a rule only skip it
    /// through an explicit bypass prefix, never by looking like a file.
    pub fn is_bypassed(&self, path: &str) -> bool {
        if self
            .cfg
            .bypass_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
        {
            return true;
        }
        if self.rules.find(path).is_some() {
            return false;
        }

        let name = path.rsplit('/').next().unwrap_or_default();
        name == "favicon.ico" || (self.cfg.bypass_file_paths && name.contains('.'))
    }

    pub fn is_public(&self, path: &str) -> bool {
        if self.cfg.public_paths.iter().any(|p| p == path) {
            return true;
        }
        self.cfg
            .public_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
    }
}

/// Percent-decodes a request path, `None` when the result is not UTF-8.
pub fn decode_path(raw: &str) -> Option<Cow<'_, str>> {
    urlencoding::decode(raw).ok()
}

/// Builds the sign-in callback for a request. Only same-origin relative paths are
/// kept, anything else falls back to `/`.
pub fn callback_of(path: &str, query: &str) -> String {
    let callback = if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    };
    sanitize_callback(&callback)
}

pub fn sanitize_callback(callback: &str) -> String {
    let mut chars = callback.chars();
    match (chars.next(), chars.next()) {
        (Some('/'), Some('/' | '\\')) => String::from("/"),
        (Some('/'), _) => callback.to_string(),
        _ => String::from("/"),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::cookie::Cookie;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::test::TestRequest;
    use anyhow::{bail, Result};
    use async_trait::async_trait;

    use crate::authz::config::AuthzConfig;
    use crate::authz::rule::PathRule;
    use crate::authz::RequiredRoles;
    use crate::roles::Role;
    use crate::session::token::simple::SimpleToken;
    use crate::session::{RoleRefresh, TokenSessionResolver};

    use super::*;

    fn session(role: Role) -> Session {
        Session {
            user_id: String::from("id-test"),
            email: String::from("test@example.com"),
            role,
        }
    }

    fn new_gate() -> Gate {
        let rules = AuthzConfig::default().build_rules().unwrap();
        let resolver = TokenSessionResolver::new(SimpleToken::new(), RoleRefresh::Token);
        Gate::new(
            GateConfig::default(),
            rules,
            TokenExtractor::new("session_token"),
            Arc::new(resolver),
        )
    }

    struct FailingResolver;

    #[async_trait]
    impl SessionResolver for FailingResolver {
        async fn resolve_session(&self, _token: &str) -> Result<Option<Session>> {
            bail!("role store is down")
        }
    }

    #[test]
    fn test_scenarios() {
        let gate = new_gate();

        // Anonymous on a protected path
        assert_eq!(
            gate.evaluate("/admin/anything", "", None),
            GateDecision::RedirectToSignIn {
                callback: String::from("/admin/anything")
            }
        );

        // Signed in, not enough privilege
        assert_eq!(
            gate.evaluate("/admin/anything", "", Some(&session(Role::User))),
            GateDecision::RedirectToUnauthorized {
                target: String::from("/unauthorized")
            }
        );

        assert_eq!(
            gate.evaluate("/admin/anything", "", Some(&session(Role::Admin))),
            GateDecision::Continue
        );

        // Lowest allowed rank is enough
        assert_eq!(
            gate.evaluate("/moderator/queue", "", Some(&session(Role::Moderator))),
            GateDecision::Continue
        );

        // Signed-in callers leave the sign-in flow
        assert_eq!(
            gate.evaluate("/auth/signin", "", Some(&session(Role::Admin))),
            GateDecision::RedirectToHome {
                target: String::from("/admin/dashboard")
            }
        );

        assert_eq!(gate.evaluate("/privacy", "", None), GateDecision::Continue);
    }

    #[test]
    fn test_home_redirect() {
        let gate = new_gate();
        let cases = [
            ("/", Role::User, "/user/dashboard"),
            ("/", Role::Moderator, "/moderator/dashboard"),
            ("/auth", Role::Admin, "/admin/dashboard"),
            ("/auth/signup", Role::User, "/user/dashboard"),
            ("/auth/error", Role::Moderator, "/moderator/dashboard"),
        ];
        for (path, role, target) in cases {
            assert_eq!(
                gate.evaluate(path, "", Some(&session(role))),
                GateDecision::RedirectToHome {
                    target: target.to_string()
                },
                "{path} as {role}"
            );
        }

        // Not part of the sign-in flow
        assert_eq!(
            gate.evaluate("/authors", "", Some(&session(Role::User))),
            GateDecision::Continue
        );
    }

    #[test]
    fn test_anonymous() {
        let gate = new_gate();

        for path in GateConfig::default_public_paths() {
            assert_eq!(gate.evaluate(&path, "", None), GateDecision::Continue, "{path}");
        }
        assert_eq!(gate.evaluate("/auth/verify", "", None), GateDecision::Continue);

        assert_eq!(
            gate.evaluate("/settings", "tab=profile&x=1", None),
            GateDecision::RedirectToSignIn {
                callback: String::from("/settings?tab=profile&x=1")
            }
        );
        assert_eq!(
            gate.evaluate("/user/dashboard", "", None),
            GateDecision::RedirectToSignIn {
                callback: String::from("/user/dashboard")
            }
        );
        assert_eq!(
            gate.evaluate("/administrator", "", None),
            GateDecision::RedirectToSignIn {
                callback: String::from("/administrator")
            }
        );

        // Signed-in callers on unruled paths go through
        assert_eq!(
            gate.evaluate("/settings", "", Some(&session(Role::User))),
            GateDecision::Continue
        );
        assert_eq!(
            gate.evaluate("/administrator", "", Some(&session(Role::User))),
            GateDecision::Continue
        );
    }

    #[test]
    fn test_hierarchy() {
        let gate = new_gate();
        let paths = [
            ("/admin/users", Role::Admin),
            ("/moderator/reports", Role::Moderator),
            ("/user/profile", Role::User),
        ];
        for (path, minimum) in paths {
            for role in Role::ALL {
                let decision = gate.evaluate(path, "", Some(&session(role)));
                if role.rank() >= minimum.rank() {
                    assert_eq!(decision, GateDecision::Continue, "{path} as {role}");
                } else {
                    assert!(
                        matches!(decision, GateDecision::RedirectToUnauthorized { .. }),
                        "{path} as {role}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_encoded_path() {
        let gate = new_gate();
        let user = session(Role::User);

        for path in ["/%61dmin/users", "/%61%64%6D%69%6E", "/admin%2Fusers", "/ad%6din/x.pdf"] {
            assert_eq!(
                gate.evaluate(path, "", Some(&user)),
                GateDecision::RedirectToUnauthorized {
                    target: String::from("/unauthorized")
                },
                "{path}"
            );
            // The callback keeps the path as the client sent it
            assert_eq!(
                gate.evaluate(path, "", None),
                GateDecision::RedirectToSignIn {
                    callback: path.to_string()
                },
                "{path}"
            );
        }
        assert_eq!(
            gate.evaluate("/%61dmin/users", "", Some(&session(Role::Admin))),
            GateDecision::Continue
        );
        assert_eq!(gate.evaluate("/%70rivacy", "", None), GateDecision::Continue);

        // Not UTF-8 once decoded, the session is ignored
        assert_eq!(
            gate.evaluate("/admin/%FF", "", Some(&session(Role::Admin))),
            GateDecision::RedirectToSignIn {
                callback: String::from("/admin/%FF")
            }
        );
        assert_eq!(
            gate.evaluate("/%FF", "", Some(&user)),
            GateDecision::RedirectToSignIn {
                callback: String::from("/%FF")
            }
        );
    }

    #[test]
    fn test_rule_redirect_to() {
        let rules = RuleTable::new(vec![
            PathRule::new(
                "/billing",
                RequiredRoles::admin(),
                Some(String::from("/billing-denied")),
            )
            .unwrap(),
            PathRule::new("/billing/public", RequiredRoles::user(), None).unwrap(),
        ]);
        let resolver = TokenSessionResolver::new(SimpleToken::new(), RoleRefresh::Token);
        let gate = Gate::new(
            GateConfig::default(),
            rules,
            TokenExtractor::new("session_token"),
            Arc::new(resolver),
        );

        // First match wins, even though a later rule is more specific
        assert_eq!(
            gate.evaluate("/billing/public", "", Some(&session(Role::Moderator))),
            GateDecision::RedirectToUnauthorized {
                target: String::from("/billing-denied")
            }
        );
    }

    #[test]
    fn test_bypass() {
        let gate = new_gate();
        let cases = [
            "/_next/static/chunk.js",
            "/static/app.css",
            "/.well-known/openid-configuration",
            "/healthz",
            "/favicon.ico",
            "/docs/favicon.ico",
            "/docs/report.pdf",
            "/robots.txt",
        ];
        for path in cases {
            assert!(gate.is_bypassed(path), "{path}");
            assert_eq!(gate.evaluate(path, "", None), GateDecision::Continue);
        }

        assert!(!gate.is_bypassed("/admin"));
        assert!(!gate.is_bypassed("/v1.2/admin"));
        assert!(!gate.is_bypassed("/api/whoami"));
        assert!(!gate.is_bypassed("/staticfiles/app.js.map/x"));

        // Looking like a file does not open a protected path
        for path in [
            "/admin/favicon.ico",
            "/admin/report.pdf",
            "/admin/users/john.doe",
            "/user/avatar.png",
        ] {
            assert!(!gate.is_bypassed(path), "{path}");
            assert_eq!(
                gate.evaluate(path, "", None),
                GateDecision::RedirectToSignIn {
                    callback: path.to_string()
                }
            );
        }
        assert_eq!(
            gate.evaluate("/admin/users/john.doe", "", Some(&session(Role::Moderator))),
            GateDecision::RedirectToUnauthorized {
                target: String::from("/unauthorized")
            }
        );

        let mut cfg = GateConfig::default();
        cfg.bypass_file_paths = false;
        let resolver = TokenSessionResolver::new(SimpleToken::new(), RoleRefresh::Token);
        let gate = Gate::new(
            cfg,
            AuthzConfig::default().build_rules().unwrap(),
            TokenExtractor::new("session_token"),
            Arc::new(resolver),
        );
        assert!(!gate.is_bypassed("/docs/report.pdf"));
        assert!(gate.is_bypassed("/docs/favicon.ico"));
        assert_eq!(
            gate.evaluate("/docs/report.pdf", "", None),
            GateDecision::RedirectToSignIn {
                callback: String::from("/docs/report.pdf")
            }
        );
    }

    #[test]
    fn test_idempotent() {
        let gate = new_gate();
        let sessions = [
            None,
            Some(session(Role::User)),
            Some(session(Role::Moderator)),
            Some(session(Role::Admin)),
        ];
        let paths = ["/", "/admin/x", "/moderator", "/user/y", "/auth/signin", "/terms", "/z"];
        for session in sessions.iter() {
            for path in paths {
                let first = gate.evaluate(path, "a=b", session.as_ref());
                let second = gate.evaluate(path, "a=b", session.as_ref());
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_location() {
        let gate = new_gate();
        assert_eq!(gate.location(&GateDecision::Continue), None);
        assert_eq!(
            gate.location(&GateDecision::RedirectToSignIn {
                callback: String::from("/settings?tab=profile&x=1")
            }),
            Some(String::from(
                "/auth/signin?callbackUrl=%2Fsettings%3Ftab%3Dprofile%26x%3D1"
            ))
        );
        assert_eq!(
            gate.location(&GateDecision::RedirectToHome {
                target: String::from("/admin/dashboard")
            }),
            Some(String::from("/admin/dashboard"))
        );
    }

    #[test]
    fn test_sanitize_callback() {
        assert_eq!(sanitize_callback("/admin/x?y=1"), "/admin/x?y=1");
        assert_eq!(sanitize_callback("/"), "/");
        assert_eq!(sanitize_callback("//evil.example.com"), "/");
        assert_eq!(sanitize_callback("/\\evil.example.com"), "/");
        assert_eq!(sanitize_callback("https://evil.example.com"), "/");
        assert_eq!(sanitize_callback(""), "/");
        assert_eq!(callback_of("/admin", ""), "/admin");
        assert_eq!(callback_of("/admin", "page=2"), "/admin?page=2");
    }

    #[actix_web::test]
    async fn test_resolve_session() {
        let gate = new_gate();

        let req = TestRequest::default()
            .uri("/admin/x")
            .insert_header((AUTHORIZATION, "Bearer simple-token:alice@example.com:admin"))
            .to_http_request();
        let (decision, session) = gate.check(&req).await;
        assert_eq!(decision, GateDecision::Continue);
        assert_eq!(session.unwrap().role, Role::Admin);

        // Non-canonical casing is a plain user
        let req = TestRequest::default()
            .uri("/admin/x")
            .cookie(Cookie::new(
                "session_token",
                "simple-token:alice@example.com:ADMIN",
            ))
            .to_http_request();
        let (decision, session) = gate.check(&req).await;
        assert_eq!(
            decision,
            GateDecision::RedirectToUnauthorized {
                target: String::from("/unauthorized")
            }
        );
        assert_eq!(session.unwrap().role, Role::User);

        // Invalid token is anonymous
        let req = TestRequest::default()
            .uri("/admin/x?a=1")
            .insert_header((AUTHORIZATION, "Bearer forged"))
            .to_http_request();
        let (decision, session) = gate.check(&req).await;
        assert_eq!(
            decision,
            GateDecision::RedirectToSignIn {
                callback: String::from("/admin/x?a=1")
            }
        );
        assert!(session.is_none());

        let req = TestRequest::default()
            .uri("/%61dmin/x")
            .insert_header((AUTHORIZATION, "Bearer simple-token:bob@example.com:user"))
            .to_http_request();
        let (decision, _) = gate.check(&req).await;
        assert_eq!(
            decision,
            GateDecision::RedirectToUnauthorized {
                target: String::from("/unauthorized")
            }
        );

        // Bypassed paths never resolve a session
        let req = TestRequest::default()
            .uri("/static/app.js")
            .insert_header((AUTHORIZATION, "Bearer simple-token:alice@example.com:admin"))
            .to_http_request();
        let (decision, session) = gate.check(&req).await;
        assert_eq!(decision, GateDecision::Continue);
        assert!(session.is_none());
    }

    #[actix_web::test]
    async fn test_resolver_failure() {
        let gate = Gate::new(
            GateConfig::default(),
            AuthzConfig::default().build_rules().unwrap(),
            TokenExtractor::new("session_token"),
            Arc::new(FailingResolver),
        );

        let req = TestRequest::default()
            .uri("/user/dashboard")
            .insert_header((AUTHORIZATION, "Bearer simple-token:alice@example.com:user"))
            .to_http_request();
        let (decision, session) = gate.check(&req).await;
        assert!(session.is_none());
        assert_eq!(
            decision,
            GateDecision::RedirectToSignIn {
                callback: String::from("/user/dashboard")
            }
        );

        let req = TestRequest::default()
            .uri("/privacy")
            .insert_header((AUTHORIZATION, "Bearer simple-token:alice@example.com:user"))
            .to_http_request();
        let (decision, _) = gate.check(&req).await;
        assert_eq!(decision, GateDecision::Continue);
    }
}
