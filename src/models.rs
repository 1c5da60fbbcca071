use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Role;

/// ErrorBody
///
/// The JSON envelope for every response the gateway itself rejects:
/// `{"success": false, "message": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// SessionInfo
///
/// Response for `GET /api/auth/session`: the caller's session as the route guard
/// sees it. Claims come from the same decode the guard uses, so they are only as
/// trustworthy as the guard's verification mode.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct SessionInfo {
    // True when the token carries a recognized role.
    pub authenticated: bool,
    // True when the session cookie was present, readable or not.
    pub token_present: bool,
    pub role: Option<Role>,
    // Where the guard sends this caller from `/`.
    pub default_route: String,
    pub subject: Option<String>,
    pub name: Option<String>,
    // `name` when present, otherwise `subject`.
    pub display_name: Option<String>,
    pub user_id: Option<Uuid>,
    #[ts(type = "string | null")]
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
}

/// MenuQuery
///
/// Query parameters for `GET /api/public/menu`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MenuQuery {
    /// Current UI path used to derive active and open state.
    pub path: Option<String>,
}

/// MenuEntry
///
/// One rendered sidebar node. `active` means the node's own path is a prefix of the
/// current path; `open` means some descendant is active.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct MenuEntry {
    pub label: String,
    pub path: Option<String>,
    pub active: bool,
    pub open: bool,
    #[schema(no_recursion)]
    pub children: Vec<MenuEntry>,
}
