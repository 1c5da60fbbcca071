use lms_gateway::{
    auth::{Role, Session, TokenClaims},
    guard::{Decision, RouteCategory, RouteTable},
};

// --- Session Fixtures ---

fn anonymous() -> Session {
    Session::anonymous()
}

fn with_role(role: Role) -> Session {
    Session {
        token_present: true,
        claims: Some(TokenClaims {
            role: Some(role),
            ..TokenClaims::default()
        }),
    }
}

fn admin() -> Session {
    with_role(Role::Admin)
}

fn user() -> Session {
    with_role(Role::User)
}

/// Token present, but nothing readable in it.
fn unreadable() -> Session {
    Session {
        token_present: true,
        claims: None,
    }
}

/// Token present and readable, but the role claim is not recognized.
fn roleless() -> Session {
    Session {
        token_present: true,
        claims: Some(TokenClaims {
            subject: Some("someone".to_string()),
            ..TokenClaims::default()
        }),
    }
}

fn all_sessions() -> Vec<Session> {
    vec![anonymous(), admin(), user(), unreadable(), roleless()]
}

fn evaluate(path: &str, session: &Session) -> Decision {
    RouteTable::default().evaluate(path, None, session)
}

fn redirect(path: &str) -> Decision {
    Decision::redirect(path)
}

// --- Root ---

#[test]
fn test_root_with_admin_goes_to_dashboard() {
    assert_eq!(evaluate("/", &admin()), redirect("/admin/dashboard"));
}

#[test]
fn test_root_with_user_goes_to_courses() {
    assert_eq!(evaluate("/", &user()), redirect("/user/courses"));
}

#[test]
fn test_root_without_role_goes_to_landing() {
    assert_eq!(evaluate("/", &anonymous()), redirect("/public"));
    assert_eq!(evaluate("/", &unreadable()), redirect("/public"));
    assert_eq!(evaluate("/", &roleless()), redirect("/public"));
}

// --- Public Prefixes ---

#[test]
fn test_login_with_known_role_redirects_away() {
    assert_eq!(evaluate("/login", &admin()), redirect("/admin/dashboard"));
    assert_eq!(evaluate("/login", &user()), redirect("/user/courses"));
    assert_eq!(evaluate("/register", &admin()), redirect("/admin/dashboard"));
    assert_eq!(evaluate("/register/confirm", &user()), redirect("/user/courses"));
}

#[test]
fn test_login_without_role_is_allowed() {
    for session in [anonymous(), unreadable(), roleless()] {
        assert_eq!(evaluate("/login", &session), Decision::Allow);
        assert_eq!(evaluate("/register", &session), Decision::Allow);
    }
}

#[test]
fn test_public_pages_allowed_for_everyone() {
    for session in all_sessions() {
        assert_eq!(evaluate("/public", &session), Decision::Allow);
        assert_eq!(evaluate("/public/courses", &session), Decision::Allow);
    }
}

#[test]
fn test_internal_and_public_api_prefixes_allowed() {
    for session in all_sessions() {
        assert_eq!(evaluate("/_next/data/build/page.json", &session), Decision::Allow);
        assert_eq!(evaluate("/api/auth/login", &session), Decision::Allow);
        assert_eq!(evaluate("/api/public/courses", &session), Decision::Allow);
    }
}

// --- Admin Area ---

#[test]
fn test_admin_area_without_token_goes_to_login() {
    let decision = evaluate("/admin/courses", &anonymous());
    assert_eq!(
        decision,
        Decision::redirect_with_return("/login", "/admin/courses")
    );
    assert_eq!(
        decision.location().as_deref(),
        Some("/login?returnUrl=%2Fadmin%2Fcourses")
    );
}

#[test]
fn test_admin_area_return_url_keeps_query() {
    let decision =
        RouteTable::default().evaluate("/admin/courses", Some("page=2&sort=name"), &anonymous());
    assert_eq!(
        decision,
        Decision::redirect_with_return("/login", "/admin/courses?page=2&sort=name")
    );
    assert_eq!(
        decision.location().as_deref(),
        Some("/login?returnUrl=%2Fadmin%2Fcourses%3Fpage%3D2%26sort%3Dname")
    );
}

#[test]
fn test_admin_area_empty_query_is_ignored() {
    let decision = RouteTable::default().evaluate("/admin", Some(""), &anonymous());
    assert_eq!(decision, Decision::redirect_with_return("/login", "/admin"));
}

#[test]
fn test_admin_area_with_user_goes_to_user_default() {
    for path in ["/admin", "/admin/courses", "/admin/tests/42"] {
        let decision = evaluate(path, &user());
        assert_eq!(decision, redirect("/user/courses"), "path {}", path);
    }
}

#[test]
fn test_admin_area_with_unknown_role_goes_to_landing() {
    assert_eq!(evaluate("/admin/courses", &unreadable()), redirect("/public"));
    assert_eq!(evaluate("/admin/courses", &roleless()), redirect("/public"));
}

#[test]
fn test_admin_area_with_admin_is_allowed() {
    assert_eq!(evaluate("/admin/courses", &admin()), Decision::Allow);
    assert_eq!(evaluate("/admin/dashboard", &admin()), Decision::Allow);
}

// --- User Area ---

#[test]
fn test_user_area_with_admin_goes_to_dashboard() {
    assert_eq!(evaluate("/user/profile", &admin()), redirect("/admin/dashboard"));
}

#[test]
fn test_user_area_without_token_goes_to_login() {
    assert_eq!(
        evaluate("/user/courses/7/lessons/3", &anonymous()).location().as_deref(),
        Some("/login?returnUrl=%2Fuser%2Fcourses%2F7%2Flessons%2F3")
    );
}

#[test]
fn test_user_area_with_user_is_allowed() {
    assert_eq!(evaluate("/user/courses", &user()), Decision::Allow);
    assert_eq!(evaluate("/user/profile", &user()), Decision::Allow);
}

#[test]
fn test_user_area_with_unknown_role_goes_to_landing() {
    assert_eq!(evaluate("/user/profile", &roleless()), redirect("/public"));
}

// --- Protected API ---

#[test]
fn test_protected_api_without_token_is_unauthorized() {
    for path in [
        "/api/courses",
        "/api/courses/1",
        "/api/lessons",
        "/api/users",
        "/api/tests/5/questions",
        "/api/components",
    ] {
        assert_eq!(evaluate(path, &anonymous()), Decision::Unauthorized, "path {}", path);
        assert_eq!(evaluate(path, &anonymous()).location(), None);
    }
}

#[test]
fn test_protected_api_with_any_token_is_allowed() {
    // Presence is all that counts here; role is checked where the data lives.
    for session in [admin(), user(), unreadable(), roleless()] {
        assert_eq!(evaluate("/api/courses", &session), Decision::Allow);
    }
}

// --- Everything Else ---

#[test]
fn test_other_without_token_goes_to_landing() {
    assert_eq!(evaluate("/dashboard", &anonymous()), redirect("/public"));
    assert_eq!(evaluate("/api/unknown", &anonymous()), redirect("/public"));
    assert_eq!(evaluate("/swagger-ui", &anonymous()), redirect("/public"));
}

#[test]
fn test_other_category_never_allows_anonymous() {
    let table = RouteTable::default();
    for path in ["/dashboard", "/about", "/main", "/api/unknown"] {
        assert_eq!(table.classify(path), RouteCategory::Other, "path {}", path);
        assert_eq!(evaluate(path, &anonymous()), redirect("/public"), "path {}", path);
    }
    // Auth pages and the landing page are handled as public, before the fallback row.
    for path in ["/login", "/register", "/public"] {
        assert_eq!(table.classify(path), RouteCategory::Public, "path {}", path);
        assert_eq!(evaluate(path, &anonymous()), Decision::Allow);
    }
}

#[test]
fn test_other_with_token_is_allowed() {
    for session in [admin(), user(), unreadable(), roleless()] {
        assert_eq!(evaluate("/dashboard", &session), Decision::Allow);
        assert_eq!(evaluate("/main/dashboard", &session), Decision::Allow);
    }
}

// --- Properties ---

#[test]
fn test_evaluation_is_idempotent() {
    let table = RouteTable::default();
    let paths = [
        "/",
        "/login",
        "/public/courses",
        "/admin/courses",
        "/user/profile",
        "/api/courses",
        "/somewhere",
    ];

    for path in paths {
        for session in all_sessions() {
            let first = table.evaluate(path, Some("q=1"), &session);
            let second = table.evaluate(path, Some("q=1"), &session);
            assert_eq!(first, second, "path {} session {:?}", path, session);
        }
    }
}

#[test]
fn test_guarded_area_redirects_never_target_login_with_token() {
    let table = RouteTable::default();
    for session in [admin(), user(), unreadable(), roleless()] {
        for path in ["/admin/courses", "/user/profile"] {
            if let Some(location) = table.evaluate(path, None, &session).location() {
                assert!(!location.starts_with("/login"), "{} -> {}", path, location);
            }
        }
    }
}

// --- Classification ---

#[test]
fn test_classification_precedence() {
    let table = RouteTable::default();
    assert_eq!(table.classify("/"), RouteCategory::Root);
    assert_eq!(table.classify("/login"), RouteCategory::Public);
    assert_eq!(table.classify("/public/courses"), RouteCategory::Public);
    assert_eq!(table.classify("/admin/courses"), RouteCategory::AdminArea);
    assert_eq!(table.classify("/user/courses"), RouteCategory::UserArea);
    assert_eq!(table.classify("/api/users"), RouteCategory::ProtectedApi);
    assert_eq!(table.classify("/api/auth/refresh"), RouteCategory::Public);
    assert_eq!(table.classify("/about"), RouteCategory::Other);
}

#[test]
fn test_classification_is_plain_string_prefix() {
    let table = RouteTable::default();
    assert_eq!(table.classify("/administrator"), RouteCategory::AdminArea);
    assert_eq!(table.classify("/users"), RouteCategory::UserArea);
    assert_eq!(table.classify("/publications"), RouteCategory::Public);
    assert_eq!(table.classify("/Admin"), RouteCategory::Other);
}

#[test]
fn test_default_routes() {
    let table = RouteTable::default();
    assert_eq!(table.default_route(Some(Role::Admin)), "/admin/dashboard");
    assert_eq!(table.default_route(Some(Role::User)), "/user/courses");
    assert_eq!(table.default_route(None), "/public");
}

#[test]
fn test_exclusion_list() {
    let table = RouteTable::default();
    assert!(table.is_excluded("/_next/static/chunks/main.js"));
    assert!(table.is_excluded("/_next/image"));
    assert!(table.is_excluded("/favicon.ico"));
    assert!(table.is_excluded("/health"));
    assert!(table.is_excluded("/images/logo.png"));
    assert!(table.is_excluded("/admin/banner.svg"));
    assert!(table.is_excluded("/photo.jpeg"));

    assert!(!table.is_excluded("/"));
    assert!(!table.is_excluded("/admin/courses"));
    assert!(!table.is_excluded("/_next/data/x.json"));
    assert!(!table.is_excluded("/health/deep"));
    assert!(!table.is_excluded("/logo.pngx"));
}

#[test]
fn test_decision_location() {
    assert_eq!(Decision::Allow.location(), None);
    assert_eq!(Decision::Unauthorized.location(), None);
    assert_eq!(redirect("/public").location().as_deref(), Some("/public"));
    assert_eq!(
        Decision::redirect_with_return("/login", "/a b").location().as_deref(),
        Some("/login?returnUrl=%2Fa+b")
    );
}
