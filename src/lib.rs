use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef, Request, State},
    http::{HeaderMap, HeaderName, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod menu;
pub mod models;
pub mod upstream;

pub mod routes;
use routes::public;

// --- Public Re-exports ---

pub use auth::{Role, Session, TokenDecoder};
pub use config::AppConfig;
pub use guard::{Decision, RouteCategory, RouteTable};
pub use menu::Menu;
pub use upstream::{HttpUpstream, MockUpstream, UpstreamState};

/// Message returned with every 401 from a protected API prefix.
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required";

/// ApiDoc
///
/// OpenAPI document for the endpoints the gateway answers itself.
/// Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_session, handlers::get_menu),
    components(schemas(models::SessionInfo, models::MenuEntry, models::ErrorBody, auth::Role)),
    tags((name = "lms-gateway", description = "Route guard and session gateway for the LMS UI"))
)]
struct ApiDoc;

/// AppState
///
/// Everything a request needs, created once at startup and shared read-only.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// Route prefixes and default routes.
    pub routes: Arc<RouteTable>,
    pub decoder: TokenDecoder,
    pub admin_menu: Arc<Menu>,
    pub user_menu: Arc<Menu>,
    pub upstream: UpstreamState,
}

impl AppState {
    /// Builds the state with the standard route table and both sidebars.
    pub fn new(config: AppConfig, upstream: UpstreamState) -> Self {
        let decoder = TokenDecoder::from_config(&config);
        Self {
            config,
            routes: Arc::new(RouteTable::default()),
            decoder,
            admin_menu: Arc::new(Menu::admin()),
            user_menu: Arc::new(Menu::user()),
            upstream,
        }
    }

    /// The sidebar for `path`: picked by the area the path is in, otherwise by the
    /// caller's role. Anything that is not a learner gets the administration tree.
    pub fn menu_for(&self, path: Option<&str>, role: Option<Role>) -> &Menu {
        match (path.map(|p| self.routes.classify(p)), role) {
            (Some(RouteCategory::UserArea), _) => &self.user_menu,
            (Some(RouteCategory::AdminArea), _) => &self.admin_menu,
            (_, Some(Role::User)) => &self.user_menu,
            _ => &self.admin_menu,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for TokenDecoder {
    fn from_ref(app_state: &AppState) -> TokenDecoder {
        app_state.decoder.clone()
    }
}

impl FromRef<AppState> for UpstreamState {
    fn from_ref(app_state: &AppState) -> UpstreamState {
        app_state.upstream.clone()
    }
}

/// route_guard
///
/// Middleware applied to every route, including the upstream fallback.
///
/// Excluded paths (static assets, images, health) pass straight through. For all
/// others the session cookie is decoded and the route table decides: allowed requests
/// continue with the `Session` in their extensions, redirects become a 307 to an
/// absolute URL on the request's origin, and protected API calls without a token get
/// a 401 JSON body.
async fn route_guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    if state.routes.is_excluded(&path) {
        return next.run(request).await;
    }

    let session = state.decoder.session(request.headers());
    let category = state.routes.classify(&path);
    let decision = state
        .routes
        .evaluate(&path, request.uri().query(), &session);

    tracing::debug!(
        path = %path,
        category = ?category,
        token_present = session.token_present,
        role = ?session.role(),
        decision = ?decision,
        "route guard decision"
    );

    match decision {
        Decision::Allow => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Decision::Unauthorized => {
            tracing::info!(path = %path, "rejecting unauthenticated API request");
            unauthorized_response()
        }
        redirect => {
            let location = redirect.location().unwrap_or_else(|| state.routes.landing.to_string());
            let target = match request_origin(&state.config, request.headers()) {
                Some(origin) => format!("{}{}", origin, location),
                None => location,
            };
            tracing::info!(path = %path, target = %target, "redirecting");
            Redirect::temporary(&target).into_response()
        }
    }
}

/// The 401 sent to protected API prefixes when no token is present.
pub fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(models::ErrorBody::new(AUTH_REQUIRED_MESSAGE)),
    )
        .into_response()
}

/// request_origin
///
/// Origin used for absolute redirect URLs: the configured public origin if any,
/// otherwise the forwarded scheme plus the `Host` header. Only `http` and `https`
/// are accepted as the forwarded scheme; anything else falls back to `http`.
/// `None` when neither is available, in which case the redirect stays relative.
pub fn request_origin(config: &AppConfig, headers: &HeaderMap) -> Option<String> {
    if let Some(origin) = &config.public_origin {
        return Some(origin.clone());
    }

    let host = headers.get(header::HOST)?.to_str().ok()?;
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .and_then(|value| {
            ["http", "https"]
                .into_iter()
                .find(|scheme| value.eq_ignore_ascii_case(scheme))
        })
        .unwrap_or("http");

    Some(format!("{}://{}", scheme, host))
}

/// create_router
///
/// Assembles the gateway: gateway-owned routes, Swagger UI, the upstream fallback,
/// the route guard around all of them, and the observability layers outermost.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Everything else the guard lets through belongs to the UI origin.
        .fallback(handlers::forward_to_upstream)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        // The guard wraps routes and fallback alike; it must be added after both.
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for each request, carrying the `x-request-id` so every log line of one
/// request (including the guard's decision) can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
