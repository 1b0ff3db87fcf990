use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::auth::validate_jwt;
use crate::config;
use crate::types::Role;

/// Outcome of evaluating a request path against the access table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectLogin,
    RedirectDashboard,
}

const ALL_ROLES: &[Role] = &[
    Role::SuperUser,
    Role::Ketua,
    Role::WakilKetua,
    Role::Sekretaris,
    Role::WakilSekretaris,
    Role::Bendahara,
    Role::WakilBendahara,
    Role::Umat,
];

const TREASURY_ROLES: &[Role] = &[Role::SuperUser, Role::Bendahara, Role::WakilBendahara];

const SECRETARIAT_ROLES: &[Role] = &[
    Role::SuperUser,
    Role::Ketua,
    Role::WakilKetua,
    Role::Sekretaris,
    Role::WakilSekretaris,
];

/// Page paths that bypass the table for anonymous users. A valid session on
/// one of these redirects to the dashboard instead.
const PUBLIC_PATHS: &[&str] = &["/login", "/register", "/forgot-password", "/verify"];

const ASSET_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp", "ico"];

/// Notification detail pages inherit the role set of the base path
const NOTIFICATION_DETAIL_PREFIX: &str = "/notifications/";

/// Static route table compiled once at startup: page path -> permitted roles.
/// Resolution is most-specific-prefix-wins; the first entry found while
/// walking from the full path toward the root decides both presence and
/// role set.
static ROUTE_TABLE: Lazy<HashMap<&'static str, &'static [Role]>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, &'static [Role]> = HashMap::new();
    table.insert("/dashboard", ALL_ROLES);
    table.insert("/lingkungan", TREASURY_ROLES);
    table.insert("/lingkungan/kas", TREASURY_ROLES);
    table.insert("/lingkungan/mandiri", TREASURY_ROLES);
    table.insert("/ikata", TREASURY_ROLES);
    table.insert("/ikata/kas", TREASURY_ROLES);
    table.insert("/ikata/monitoring", TREASURY_ROLES);
    table.insert("/kesekretariatan", ALL_ROLES);
    table.insert("/kesekretariatan/umat", SECRETARIAT_ROLES);
    table.insert("/kesekretariatan/doling", SECRETARIAT_ROLES);
    table.insert(
        "/kesekretariatan/kaleidoskop",
        &[Role::SuperUser, Role::Sekretaris, Role::WakilSekretaris],
    );
    table.insert("/kesekretariatan/agenda", ALL_ROLES);
    table.insert(
        "/kesekretariatan/ulang-tahun",
        &[
            Role::SuperUser,
            Role::Ketua,
            Role::WakilKetua,
            Role::Sekretaris,
            Role::WakilSekretaris,
            Role::Bendahara,
            Role::WakilBendahara,
        ],
    );
    table.insert("/publikasi", ALL_ROLES);
    table.insert("/approval", TREASURY_ROLES);
    table.insert("/histori-pembayaran", &[Role::SuperUser, Role::Umat]);
    table.insert("/pengaturan", ALL_ROLES);
    table.insert("/pengaturan/profil", &[Role::SuperUser, Role::Umat]);
    table.insert("/pengaturan/password", ALL_ROLES);
    table.insert("/pengaturan/wipe", &[Role::SuperUser]);
    table.insert("/notifications", ALL_ROLES);
    table
});

/// Strip the trailing slash, except for the root path
pub fn normalize_path(path: &str) -> &str {
    if path != "/" && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}

fn is_asset(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            ASSET_EXTENSIONS.iter().any(|e| *e == ext)
        }
        None => false,
    }
}

/// Framework internals, static assets, and the API surface never go through
/// the page-access table.
fn is_passthrough(path: &str) -> bool {
    path == "/"
        || path.contains("/_next")
        || path.contains("/static")
        || path.starts_with("/api")
        || is_asset(path)
}

fn permitted(path: &str, role: Role) -> bool {
    if let Some(roles) = ROUTE_TABLE.get(path) {
        return roles.contains(&role);
    }

    // Detail pages under /notifications/ share the base role set
    if path.starts_with(NOTIFICATION_DETAIL_PREFIX) {
        return ROUTE_TABLE
            .get("/notifications")
            .map(|roles| roles.contains(&role))
            .unwrap_or(false);
    }

    // Walk prefixes from most specific to least specific; the first table
    // entry found decides.
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for depth in (1..segments.len()).rev() {
        let prefix = format!("/{}", segments[..depth].join("/"));
        if let Some(roles) = ROUTE_TABLE.get(prefix.as_str()) {
            return roles.contains(&role);
        }
    }

    false
}

/// Pure access decision over (path, role, static table). Total: every path
/// resolves to exactly one decision.
pub fn decide(path: &str, role: Option<Role>) -> AccessDecision {
    let path = normalize_path(path);

    if is_passthrough(path) {
        return AccessDecision::Allow;
    }

    if PUBLIC_PATHS.contains(&path) {
        // Logged-in users are bounced off the public pages
        return match role {
            Some(_) => AccessDecision::RedirectDashboard,
            None => AccessDecision::Allow,
        };
    }

    let Some(role) = role else {
        return AccessDecision::RedirectLogin;
    };

    if permitted(path, role) {
        AccessDecision::Allow
    } else {
        AccessDecision::RedirectDashboard
    }
}

fn role_from_headers(headers: &HeaderMap) -> Option<Role> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;
    validate_jwt(token).and_then(|claims| claims.role())
}

/// Page access middleware. Evaluates every request against the route table
/// and answers denials with redirects; allowed requests fall through to the
/// router.
pub async fn route_access_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let role = role_from_headers(request.headers());

    match decide(&path, role) {
        AccessDecision::Allow => next.run(request).await,
        AccessDecision::RedirectLogin => {
            tracing::debug!("Access denied for {} (no session), redirecting to login", path);
            Redirect::to(&config::config().org.login_path).into_response()
        }
        AccessDecision::RedirectDashboard => {
            tracing::debug!(
                "Access denied for {} (role {:?}), redirecting to dashboard",
                path,
                role
            );
            Redirect::to(&config::config().org.dashboard_path).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_trailing_slash_except_root() {
        assert_eq!(normalize_path("/dashboard/"), "/dashboard");
        assert_eq!(normalize_path("/dashboard"), "/dashboard");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn assets_and_api_pass_through() {
        assert_eq!(decide("/logo.png", None), AccessDecision::Allow);
        assert_eq!(decide("/api/doling", None), AccessDecision::Allow);
        assert_eq!(decide("/_next/chunk.js", None), AccessDecision::Allow);
        assert_eq!(decide("/", None), AccessDecision::Allow);
    }

    #[test]
    fn public_paths_bounce_authenticated_users() {
        assert_eq!(decide("/login", None), AccessDecision::Allow);
        assert_eq!(decide("/login", Some(Role::Umat)), AccessDecision::RedirectDashboard);
        assert_eq!(decide("/register", Some(Role::SuperUser)), AccessDecision::RedirectDashboard);
    }

    #[test]
    fn protected_path_without_session_goes_to_login() {
        assert_eq!(decide("/dashboard", None), AccessDecision::RedirectLogin);
        assert_eq!(decide("/pengaturan/wipe", None), AccessDecision::RedirectLogin);
    }

    #[test]
    fn wipe_page_is_super_user_only() {
        assert_eq!(decide("/pengaturan/wipe", Some(Role::Umat)), AccessDecision::RedirectDashboard);
        assert_eq!(decide("/pengaturan/wipe", Some(Role::SuperUser)), AccessDecision::Allow);
    }

    #[test]
    fn most_specific_prefix_wins() {
        // /pengaturan permits UMAT, but the more specific /pengaturan/wipe
        // entry decides for paths underneath it.
        assert_eq!(
            decide("/pengaturan/wipe/confirm", Some(Role::Umat)),
            AccessDecision::RedirectDashboard
        );
        assert_eq!(
            decide("/pengaturan/wipe/confirm", Some(Role::SuperUser)),
            AccessDecision::Allow
        );
        // Unlisted subpath falls back to the parent entry.
        assert_eq!(decide("/pengaturan/unknown", Some(Role::Umat)), AccessDecision::Allow);
    }

    #[test]
    fn notification_detail_inherits_base_roles() {
        assert_eq!(
            decide("/notifications/123e4567", Some(Role::Umat)),
            AccessDecision::Allow
        );
        assert_eq!(decide("/notifications/123e4567", None), AccessDecision::RedirectLogin);
    }

    #[test]
    fn unknown_paths_deny_with_dashboard_redirect() {
        assert_eq!(decide("/rahasia", Some(Role::Umat)), AccessDecision::RedirectDashboard);
    }

    #[test]
    fn treasury_pages_reject_secretariat() {
        assert_eq!(decide("/ikata/kas", Some(Role::Sekretaris)), AccessDecision::RedirectDashboard);
        assert_eq!(decide("/ikata/kas", Some(Role::Bendahara)), AccessDecision::Allow);
    }

    #[test]
    fn decision_is_total_for_every_role() {
        for role in Role::ALL {
            for path in ["/dashboard", "/kesekretariatan/doling", "/approval", "/x/y/z"] {
                // No panic, exactly one decision.
                let _ = decide(path, Some(role));
            }
        }
    }
}
