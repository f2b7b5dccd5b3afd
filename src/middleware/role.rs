//! Role gates.
//!
//! Each gate is an extractor wrapping [`AuthUser`]; putting it in a handler's
//! argument list both authenticates the caller and restricts the route to the
//! listed roles. Super admins are only admitted where a gate names them.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use scholaris_core::AppError;
use scholaris_models::{Identity, Role};
use tracing::warn;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Fails with 403 `FORBIDDEN_ROLE` unless the caller holds one of `allowed`.
pub fn check_any_role(identity: &Identity, allowed: &[Role]) -> Result<(), AppError> {
    if identity.has_any_role(allowed) {
        return Ok(());
    }

    warn!(
        user.id = %identity.id,
        role = %identity.role,
        "Role not permitted for route"
    );
    Err(AppError::forbidden_role(
        "Forbidden: Access is restricted to permitted roles.",
    ))
}

/// Route-layer form of the role gates, for routers whose every route shares
/// one role set.
///
/// ```rust,ignore
/// Router::new()
///     .route("/invoices", post(issue_invoice))
///     .route_layer(middleware::from_fn_with_state(state, require_finance_staff))
/// ```
pub async fn require_roles(
    state: &AppState,
    req: Request,
    next: Next,
    allowed: &[Role],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    let auth_user = AuthUser::from_request_parts(&mut parts, state).await?;
    check_any_role(&auth_user.0, allowed)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}

pub async fn require_finance_staff(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match require_roles(&state, req, next, RequireFinanceStaff::ROLES).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Defines an extractor admitting only the given roles.
#[macro_export]
macro_rules! require_roles {
    ($name:ident, [$($role:expr),+ $(,)?]) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl $name {
            pub const ROLES: &'static [scholaris_models::Role] = &[$($role),+];
        }

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = scholaris_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;
                $crate::middleware::role::check_any_role(&auth_user.0, Self::ROLES)?;
                Ok($name(auth_user))
            }
        }
    };
}

require_roles!(RequireSchoolAdmin, [Role::SchoolAdmin]);
require_roles!(RequireFinanceStaff, [Role::Finance, Role::SchoolAdmin]);
require_roles!(RequireWalletFunder, [Role::Parent, Role::SchoolAdmin]);
require_roles!(RequireWalletViewer, [Role::Parent, Role::SchoolAdmin, Role::Finance]);
require_roles!(RequirePosStaff, [Role::CanteenStaff, Role::SchoolAdmin, Role::Teacher]);
require_roles!(RequireParent, [Role::Parent]);
