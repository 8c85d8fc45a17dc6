use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde_json::json;
use std::sync::Arc;

use crate::auth::{Claims, TokenService};
use crate::db::models::Role;
use crate::AppState;

// public by prefix, except "/" which must match exactly or every path
// would be public
const PUBLIC_PREFIXES: &[&str] = &[
    "/auth/login",
    "/auth/register",
    "/api/auth/login",
    "/api/auth/register",
    "/demo",
    "/health",
];

const ADMIN_PREFIXES: &[&str] = &["/admin", "/api/admin"];
const MEMBER_PREFIXES: &[&str] = &["/member"];

const LOGIN_PAGE: &str = "/auth/login";
const ADMIN_DASHBOARD: &str = "/admin/dashboard";
const MEMBER_DASHBOARD: &str = "/member/dashboard";

/// Terminal outcome of gating one request. Every (path, token) pair maps to
/// exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Proceed; carries the verified identity unless the path is public.
    Allow(Option<Claims>),
    /// Page requests bounce to the relevant page on auth failure.
    Redirect(&'static str),
    /// API requests get a JSON error body instead.
    Deny(StatusCode, &'static str),
}

fn is_public(path: &str) -> bool {
    path == "/" || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p))
}

fn is_api(path: &str) -> bool {
    path.starts_with("/api/")
}

/// Classifies a request purely from its path and token. Side-effect free and
/// deterministic: token validity depends only on signature and expiry.
pub fn classify(path: &str, token: Option<&str>, tokens: &TokenService) -> GateDecision {
    if is_public(path) {
        return GateDecision::Allow(None);
    }

    let token = match token {
        Some(t) => t,
        None if is_api(path) => return GateDecision::Deny(StatusCode::UNAUTHORIZED, "Unauthorized"),
        None => return GateDecision::Redirect(LOGIN_PAGE),
    };

    let claims = match tokens.verify(token) {
        Ok(c) => c,
        Err(_) if is_api(path) => {
            return GateDecision::Deny(StatusCode::UNAUTHORIZED, "Invalid token")
        }
        Err(_) => return GateDecision::Redirect(LOGIN_PAGE),
    };

    if ADMIN_PREFIXES.iter().any(|p| path.starts_with(p)) && claims.role != Role::Admin {
        if is_api(path) {
            return GateDecision::Deny(StatusCode::FORBIDDEN, "Forbidden");
        }
        return GateDecision::Redirect(MEMBER_DASHBOARD);
    }

    if MEMBER_PREFIXES.iter().any(|p| path.starts_with(p)) && claims.role != Role::Member {
        if is_api(path) {
            return GateDecision::Deny(StatusCode::FORBIDDEN, "Forbidden");
        }
        return GateDecision::Redirect(ADMIN_DASHBOARD);
    }

    GateDecision::Allow(Some(claims))
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Gates every incoming request; on success the verified [`Claims`] are
/// attached as a request extension for handlers to read.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let token = jar
        .get("token")
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(&req));

    match classify(req.uri().path(), token.as_deref(), &state.tokens) {
        GateDecision::Allow(claims) => {
            if let Some(claims) = claims {
                req.extensions_mut().insert(claims);
            }
            next.run(req).await
        }
        GateDecision::Redirect(to) => Redirect::to(to).into_response(),
        GateDecision::Deny(status, msg) => {
            (status, Json(json!({ "error": msg }))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Role;
    use uuid::Uuid;

    fn tokens() -> TokenService {
        TokenService::new("gate-test-secret")
    }

    fn member_token(svc: &TokenService) -> String {
        svc.issue_login(Uuid::new_v4(), "member@villagesacco.com", Role::Member)
            .unwrap()
    }

    fn admin_token(svc: &TokenService) -> String {
        svc.issue_login(Uuid::new_v4(), "admin@villagesacco.com", Role::Admin)
            .unwrap()
    }

    #[test]
    fn public_paths_allow_without_token() {
        let svc = tokens();
        for path in ["/", "/auth/login", "/auth/register", "/api/auth/login", "/api/auth/register", "/demo", "/health"] {
            assert_eq!(classify(path, None, &svc), GateDecision::Allow(None), "path {path}");
        }
    }

    #[test]
    fn root_is_exact_not_prefix() {
        let svc = tokens();
        assert_eq!(
            classify("/api/savings", None, &svc),
            GateDecision::Deny(StatusCode::UNAUTHORIZED, "Unauthorized")
        );
    }

    #[test]
    fn missing_token_on_api_path_is_401() {
        assert_eq!(
            classify("/api/transactions", None, &tokens()),
            GateDecision::Deny(StatusCode::UNAUTHORIZED, "Unauthorized")
        );
    }

    #[test]
    fn missing_token_on_page_path_redirects_to_login() {
        assert_eq!(
            classify("/member/dashboard", None, &tokens()),
            GateDecision::Redirect("/auth/login")
        );
    }

    #[test]
    fn garbage_token_is_401_on_api_and_redirect_on_page() {
        let svc = tokens();
        assert_eq!(
            classify("/api/savings", Some("not-a-jwt"), &svc),
            GateDecision::Deny(StatusCode::UNAUTHORIZED, "Invalid token")
        );
        assert_eq!(
            classify("/member/dashboard", Some("not-a-jwt"), &svc),
            GateDecision::Redirect("/auth/login")
        );
    }

    #[test]
    fn member_on_admin_api_is_403() {
        let svc = tokens();
        let token = member_token(&svc);
        assert_eq!(
            classify("/api/admin/members", Some(&token), &svc),
            GateDecision::Deny(StatusCode::FORBIDDEN, "Forbidden")
        );
    }

    #[test]
    fn member_on_admin_page_redirects_to_member_dashboard() {
        let svc = tokens();
        let token = member_token(&svc);
        assert_eq!(
            classify("/admin/dashboard", Some(&token), &svc),
            GateDecision::Redirect("/member/dashboard")
        );
    }

    #[test]
    fn admin_on_member_page_redirects_to_admin_dashboard() {
        let svc = tokens();
        let token = admin_token(&svc);
        assert_eq!(
            classify("/member/dashboard", Some(&token), &svc),
            GateDecision::Redirect("/admin/dashboard")
        );
    }

    #[test]
    fn valid_member_token_allows_member_api_with_claims() {
        let svc = tokens();
        let token = member_token(&svc);
        match classify("/api/savings", Some(&token), &svc) {
            GateDecision::Allow(Some(claims)) => {
                assert_eq!(claims.role, Role::Member);
                assert_eq!(claims.email, "member@villagesacco.com");
            }
            other => panic!("expected Allow(Some(_)), got {other:?}"),
        }
    }

    #[test]
    fn admin_token_allows_admin_api() {
        let svc = tokens();
        let token = admin_token(&svc);
        assert!(matches!(
            classify("/api/admin/overview", Some(&token), &svc),
            GateDecision::Allow(Some(_))
        ));
    }

    #[test]
    fn classification_is_deterministic() {
        let svc = tokens();
        let token = member_token(&svc);
        let first = classify("/api/loans", Some(&token), &svc);
        for _ in 0..10 {
            assert_eq!(classify("/api/loans", Some(&token), &svc), first);
        }
    }
}
