use url::form_urlencoded;

use crate::auth::{Role, Session};

/// Landing page for anonymous visitors and for tokens without a usable role.
pub const LANDING_ROUTE: &str = "/public";
pub const LOGIN_ROUTE: &str = "/login";
pub const REGISTER_ROUTE: &str = "/register";
pub const ADMIN_DEFAULT_ROUTE: &str = "/admin/dashboard";
pub const USER_DEFAULT_ROUTE: &str = "/user/courses";

/// Query parameter that carries the originally requested location through login.
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// RouteCategory
///
/// Where a path falls in the access matrix. `Root` is the exact path `/`; the other
/// categories are tested in declaration order and the first prefix match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteCategory {
    Root,
    Public,
    AdminArea,
    UserArea,
    ProtectedApi,
    Other,
}

/// Decision
///
/// The directive the guard produces for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Continue to the destination unmodified.
    Allow,
    /// Send the client to `path`. `return_url` is attached as the `returnUrl` query parameter.
    Redirect {
        path: String,
        return_url: Option<String>,
    },
    /// Reject with a 401 JSON body. Only produced for protected API prefixes.
    Unauthorized,
}

impl Decision {
    pub fn redirect(path: impl Into<String>) -> Self {
        Decision::Redirect {
            path: path.into(),
            return_url: None,
        }
    }

    pub fn redirect_with_return(path: impl Into<String>, return_url: impl Into<String>) -> Self {
        Decision::Redirect {
            path: path.into(),
            return_url: Some(return_url.into()),
        }
    }

    /// The redirect target as a path plus query, e.g. `/login?returnUrl=%2Fadmin%2Fcourses`.
    /// `None` for non-redirect decisions.
    pub fn location(&self) -> Option<String> {
        match self {
            Decision::Redirect {
                path,
                return_url: Some(return_url),
            } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair(RETURN_URL_PARAM, return_url)
                    .finish();
                Some(format!("{}?{}", path, query))
            }
            Decision::Redirect {
                path,
                return_url: None,
            } => Some(path.clone()),
            _ => None,
        }
    }
}

/// RouteTable
///
/// The immutable route-prefix configuration: which prefixes are public, which belong
/// to each role's area, which API prefixes need a token, each role's default route,
/// and which paths bypass the guard entirely. Built once at startup.
#[derive(Debug, Clone)]
pub struct RouteTable {
    pub public_prefixes: Vec<&'static str>,
    pub admin_area: &'static str,
    pub user_area: &'static str,
    pub protected_api_prefixes: Vec<&'static str>,
    pub landing: &'static str,
    pub login: &'static str,
    pub register: &'static str,
    pub admin_default: &'static str,
    pub user_default: &'static str,
    pub excluded_prefixes: Vec<&'static str>,
    pub excluded_paths: Vec<&'static str>,
    pub excluded_extensions: Vec<&'static str>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public_prefixes: vec![
                LOGIN_ROUTE,
                REGISTER_ROUTE,
                LANDING_ROUTE,
                "/_next",
                "/api/auth",
                "/api/public",
            ],
            admin_area: "/admin",
            user_area: "/user",
            protected_api_prefixes: vec![
                "/api/courses",
                "/api/lessons",
                "/api/users",
                "/api/tests",
                "/api/components",
            ],
            landing: LANDING_ROUTE,
            login: LOGIN_ROUTE,
            register: REGISTER_ROUTE,
            admin_default: ADMIN_DEFAULT_ROUTE,
            user_default: USER_DEFAULT_ROUTE,
            excluded_prefixes: vec!["/_next/static", "/_next/image", "/favicon.ico"],
            excluded_paths: vec!["/health"],
            excluded_extensions: vec![".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico"],
        }
    }
}

impl RouteTable {
    /// Paths the guard never sees: static assets, images and the health probe.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes.iter().any(|p| path.starts_with(p))
            || self.excluded_paths.iter().any(|p| *p == path)
            || self.excluded_extensions.iter().any(|ext| path.ends_with(ext))
    }

    pub fn classify(&self, path: &str) -> RouteCategory {
        if path == "/" {
            RouteCategory::Root
        } else if self.public_prefixes.iter().any(|p| path.starts_with(p)) {
            RouteCategory::Public
        } else if path.starts_with(self.admin_area) {
            RouteCategory::AdminArea
        } else if path.starts_with(self.user_area) {
            RouteCategory::UserArea
        } else if self.protected_api_prefixes.iter().any(|p| path.starts_with(p)) {
            RouteCategory::ProtectedApi
        } else {
            RouteCategory::Other
        }
    }

    pub fn default_route(&self, role: Option<Role>) -> &'static str {
        match role {
            Some(Role::Admin) => self.admin_default,
            Some(Role::User) => self.user_default,
            None => self.landing,
        }
    }

    fn is_auth_page(&self, path: &str) -> bool {
        path.starts_with(self.login) || path.starts_with(self.register)
    }

    /// evaluate
    ///
    /// Decides what happens to a request for `path` (with its raw `query`, if any) made
    /// by `session`. Deterministic: the same inputs always give the same decision.
    pub fn evaluate(&self, path: &str, query: Option<&str>, session: &Session) -> Decision {
        let role = session.role();

        match self.classify(path) {
            RouteCategory::Root => Decision::redirect(self.default_route(role)),

            RouteCategory::Public => match role {
                Some(role) if self.is_auth_page(path) => {
                    Decision::redirect(self.default_route(Some(role)))
                }
                _ => Decision::Allow,
            },

            RouteCategory::AdminArea => self.evaluate_area(Role::Admin, path, query, session),
            RouteCategory::UserArea => self.evaluate_area(Role::User, path, query, session),

            RouteCategory::ProtectedApi => {
                if session.token_present {
                    Decision::Allow
                } else {
                    Decision::Unauthorized
                }
            }

            RouteCategory::Other => {
                if session.token_present {
                    Decision::Allow
                } else {
                    Decision::redirect(self.landing)
                }
            }
        }
    }

    // No token goes to login and keeps the destination. A token for the wrong role,
    // or one without a readable role, goes to that role's own default route.
    fn evaluate_area(
        &self,
        required: Role,
        path: &str,
        query: Option<&str>,
        session: &Session,
    ) -> Decision {
        if !session.token_present {
            return Decision::redirect_with_return(self.login, original_location(path, query));
        }

        match session.role() {
            Some(role) if role == required => Decision::Allow,
            role => Decision::redirect(self.default_route(role)),
        }
    }
}

fn original_location(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path.to_string(),
    }
}
