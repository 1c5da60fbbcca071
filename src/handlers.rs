use axum::{
    Json,
    body::Bytes,
    extract::{
        Query, State,
        rejection::{BytesRejection, FailedToBufferBody},
    },
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::{
    AppState,
    auth::Session,
    error::GatewayError,
    models::{MenuEntry, MenuQuery, SessionInfo},
    upstream::ForwardRequest,
};

// --- Handlers ---

/// get_session
///
/// [Public Route] Reports the caller's session exactly as the route guard reads it:
/// whether a token was sent, which role it claims and where `/` would send them.
/// The UI uses this to show the signed-in user without decoding the cookie itself.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses((status = 200, description = "Current session", body = SessionInfo))
)]
pub async fn get_session(session: Session, State(state): State<AppState>) -> Json<SessionInfo> {
    let role = session.role();
    let claims = session.claims.clone().unwrap_or_default();

    let expires_at = claims
        .expires_at
        .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0));
    let expired = expires_at.is_some_and(|at| at <= Utc::now());

    Json(SessionInfo {
        authenticated: role.is_some(),
        token_present: session.token_present,
        role,
        default_route: state.routes.default_route(role).to_string(),
        name: claims.name.clone(),
        display_name: claims.name.or_else(|| claims.subject.clone()),
        subject: claims.subject,
        user_id: claims.user_id,
        expires_at,
        expired,
    })
}

/// get_menu
///
/// [Public Route] Renders the sidebar for the given UI path, with `active`/`open`
/// flags already derived. Paths under `/user` get the learner menu and paths under
/// `/admin` the administration menu; otherwise the caller's role decides.
#[utoipa::path(
    get,
    path = "/api/public/menu",
    params(MenuQuery),
    responses((status = 200, description = "Sidebar tree", body = [MenuEntry]))
)]
pub async fn get_menu(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Json<Vec<MenuEntry>> {
    let path = query.path.as_deref();
    Json(state.menu_for(path, session.role()).render(path))
}

/// forward_to_upstream
///
/// Fallback for every request the guard allowed that the gateway does not answer
/// itself. The request is relayed to the UI origin and the answer is streamed back
/// unchanged. The request body is capped by the router's `DefaultBodyLimit`.
pub async fn forward_to_upstream(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, GatewayError> {
    let body = body.map_err(|rejection| match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            GatewayError::PayloadTooLarge {
                limit: state.config.max_body_bytes,
            }
        }
        other => GatewayError::InvalidBody(other.body_text()),
    })?;

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let forwarded = state
        .upstream
        .forward(ForwardRequest {
            method,
            path_and_query,
            headers,
            body,
        })
        .await?;

    let mut response = Response::new(forwarded.body);
    *response.status_mut() = forwarded.status;
    *response.headers_mut() = forwarded.headers;

    Ok(response)
}
