//! Tenant scoping.
//!
//! Every school-owned read goes through [`tenant_where`], which pins the
//! caller's school as the leading filter condition. Reads by id that cannot be
//! filtered up front are checked afterwards with [`check_tenant_entity`].
//!
//! A super admin is unscoped: filters pass through unchanged and entity checks
//! always succeed. Every other caller is confined to their own school even if
//! the request names a different one.

use axum::response::{IntoResponse, Response};
use tracing::warn;

use scholaris_core::{AppError, ErrorCode};
use scholaris_db::{Filter, FilterValue};
use scholaris_models::{Identity, Role, ids::SchoolId, ids::UserId};

pub const TENANT_FORBIDDEN_MESSAGE: &str = "Access denied: resource belongs to another school.";
pub const NO_SCHOOL_MESSAGE: &str = "Forbidden: You are not assigned to a school.";

/// The caller's tenant, derived from the authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub school_id: Option<SchoolId>,
    pub role: Role,
    pub user_id: UserId,
    pub is_super_admin: bool,
}

impl TenantContext {
    /// The caller's school, or 403 `FORBIDDEN` when they have none.
    pub fn require_school(&self) -> Result<SchoolId, AppError> {
        self.school_id
            .ok_or_else(|| AppError::forbidden(NO_SCHOOL_MESSAGE))
    }
}

pub fn get_tenant(identity: &Identity) -> TenantContext {
    TenantContext {
        school_id: identity.school_id,
        role: identity.role,
        user_id: identity.id,
        is_super_admin: identity.is_super_admin(),
    }
}

/// Scopes `extra` to the caller's school.
///
/// For a super admin `extra` is returned unchanged. Otherwise `school_id` is
/// set to the caller's school as the first condition, replacing any
/// `school_id` the caller supplied. A school-less caller gets
/// `school_id IS NULL`, which matches nothing.
pub fn tenant_where(identity: &Identity, extra: Filter) -> Filter {
    let tenant = get_tenant(identity);
    if tenant.is_super_admin {
        return extra;
    }

    let school: FilterValue = tenant.school_id.into();
    extra.with_leading("school_id", school)
}

/// Destination for a tenant-check failure.
///
/// Only the first failure is delivered; later sends are ignored so a handler
/// never emits two responses.
pub trait ResponseSink {
    fn is_sent(&self) -> bool;
    fn send(&mut self, error: AppError);
}

impl ResponseSink for Option<AppError> {
    fn is_sent(&self) -> bool {
        self.is_some()
    }

    fn send(&mut self, error: AppError) {
        if self.is_none() {
            *self = Some(error);
        }
    }
}

impl ResponseSink for Option<Response> {
    fn is_sent(&self) -> bool {
        self.is_some()
    }

    fn send(&mut self, error: AppError) {
        if self.is_none() {
            *self = Some(error.into_response());
        }
    }
}

/// Blocks access to an entity owned by `entity_school_id` from another tenant.
///
/// Returns `true` when the request was blocked, after a 403 `TENANT_FORBIDDEN`
/// has been sent to `sink`. Callers must stop handling the request in that
/// case. A super admin is never blocked.
pub fn assert_tenant_entity<S: ResponseSink>(
    identity: &Identity,
    sink: &mut S,
    entity_school_id: SchoolId,
) -> bool {
    if identity.is_super_admin() || identity.school_id == Some(entity_school_id) {
        return false;
    }

    warn!(
        user.id = %identity.id,
        user.school_id = ?identity.school_id,
        entity.school_id = %entity_school_id,
        "Cross-tenant access refused"
    );
    sink.send(AppError::msg(
        ErrorCode::TenantForbidden,
        TENANT_FORBIDDEN_MESSAGE,
    ));
    true
}

/// [`assert_tenant_entity`] as a `Result`, for use with `?`.
pub fn check_tenant_entity(identity: &Identity, entity_school_id: SchoolId) -> Result<(), AppError> {
    let mut sink: Option<AppError> = None;
    if !assert_tenant_entity(identity, &mut sink, entity_school_id) {
        return Ok(());
    }
    Err(sink.unwrap_or_else(|| {
        AppError::msg(ErrorCode::TenantForbidden, TENANT_FORBIDDEN_MESSAGE)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn identity(role: Role, school_id: Option<SchoolId>) -> Identity {
        Identity {
            id: UserId::new(),
            email: "user@school.jo".to_string(),
            role,
            school_id,
            is_active: true,
        }
    }

    #[test]
    fn test_school_id_is_forced_and_leading() {
        let mine = SchoolId::new();
        let theirs = SchoolId::new();
        let user = identity(Role::Finance, Some(mine));

        let filter = tenant_where(
            &user,
            Filter::new().eq("id", Uuid::new_v4()).eq("school_id", theirs),
        );

        assert_eq!(filter.keys().next(), Some("school_id"));
        assert_eq!(filter.get("school_id"), Some(&FilterValue::Uuid(mine.into_inner())));
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn test_super_admin_filter_unchanged() {
        let admin = identity(Role::SuperAdmin, None);
        let extra = Filter::new().eq("is_available", true);

        assert_eq!(tenant_where(&admin, extra.clone()), extra);
        assert!(tenant_where(&admin, Filter::new()).is_empty());
    }

    #[test]
    fn test_schoolless_user_matches_nothing() {
        let orphan = identity(Role::Teacher, None);
        let filter = tenant_where(&orphan, Filter::new());

        assert_eq!(filter.get("school_id"), Some(&FilterValue::Null));
    }

    #[test]
    fn test_require_school() {
        let school = SchoolId::new();
        assert_eq!(
            get_tenant(&identity(Role::Parent, Some(school))).require_school().unwrap(),
            school
        );

        let err = get_tenant(&identity(Role::SuperAdmin, None))
            .require_school()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn test_cross_tenant_entity_refused() {
        let user = identity(Role::Finance, Some(SchoolId::new()));
        let mut sink: Option<AppError> = None;

        let blocked = assert_tenant_entity(&user, &mut sink, SchoolId::new());
        assert!(blocked);
        let err = sink.expect("failure should be sent");
        assert_eq!(err.code, ErrorCode::TenantForbidden);
        assert_eq!(err.status.as_u16(), 403);
        assert_eq!(err.error.to_string(), TENANT_FORBIDDEN_MESSAGE);
    }

    #[test]
    fn test_school_admin_blocked_on_foreign_entity() {
        let admin = identity(Role::SchoolAdmin, Some(SchoolId::new()));
        let mut sink: Option<Response> = None;

        assert!(assert_tenant_entity(&admin, &mut sink, SchoolId::new()));
        assert_eq!(sink.expect("403 should be sent").status().as_u16(), 403);
    }

    #[test]
    fn test_same_tenant_and_super_admin_allowed() {
        let school = SchoolId::new();
        let mut sink: Option<AppError> = None;

        assert!(!assert_tenant_entity(&identity(Role::Finance, Some(school)), &mut sink, school));
        assert!(!assert_tenant_entity(&identity(Role::SuperAdmin, None), &mut sink, school));
        assert!(!sink.is_sent());
    }

    #[test]
    fn test_first_failure_wins() {
        let user = identity(Role::Teacher, Some(SchoolId::new()));
        let mut sink: Option<Response> = None;

        assert!(assert_tenant_entity(&user, &mut sink, SchoolId::new()));
        sink.send(AppError::not_found(anyhow::anyhow!("later")));

        let response = sink.expect("response should be sent");
        assert_eq!(response.status().as_u16(), 403);
    }

    #[test]
    fn test_check_tenant_entity_result() {
        let school = SchoolId::new();
        let user = identity(Role::SchoolAdmin, Some(school));

        assert!(check_tenant_entity(&user, school).is_ok());
        assert_eq!(
            check_tenant_entity(&user, SchoolId::new()).unwrap_err().code,
            ErrorCode::TenantForbidden
        );
    }
}
