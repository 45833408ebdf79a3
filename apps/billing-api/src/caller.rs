//! # Caller Identity
//!
//! Resolves the staff member behind a request from the `x-staff-id` header.
//! The header is trusted; authenticating it happens in front of this service.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shopdesk_core::StaffMember;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Header carrying the caller's staff id.
pub const STAFF_ID_HEADER: &str = "x-staff-id";

/// The authenticated staff member making the request.
#[derive(Debug, Clone)]
pub struct Caller(pub StaffMember);

impl Caller {
    pub fn staff(&self) -> &StaffMember {
        &self.0
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let staff_id = parts
            .headers
            .get(STAFF_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthenticated("Missing x-staff-id header"))?;

        let staff = state
            .db
            .staff()
            .get_by_id(staff_id)
            .await?
            .ok_or_else(|| {
                debug!(staff_id = %staff_id, "Unknown staff id");
                ApiError::unauthenticated("Unknown staff member")
            })?;

        Ok(Caller(staff))
    }
}
