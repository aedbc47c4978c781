//! Branch-scope access policy
//!
//! Every lifecycle owner resolves the caller's branch scope here instead of
//! checking roles inline.
//!
//! | Role | requested = None | requested = Some(b) |
//! |------|------------------|---------------------|
//! | admin | all branches | b |
//! | manager / staff / rider | home branch | b if b == home, else denied |
//! | customer | denied | b (ownership checked per entity) |

use shared::error::{AppError, AppResult, ErrorCode};

use super::jwt::CurrentUser;

/// Branch scope a request is allowed to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveScope {
    /// Admin without a branch filter
    AllBranches,
    Branch(i64),
}

impl EffectiveScope {
    pub fn branch_id(&self) -> Option<i64> {
        match self {
            Self::AllBranches => None,
            Self::Branch(id) => Some(*id),
        }
    }

    /// Concrete branch for operations that must target exactly one
    pub fn require_branch(&self) -> AppResult<i64> {
        self.branch_id()
            .ok_or_else(|| AppError::with_message(ErrorCode::RequiredField, "branch_id is required"))
    }
}

/// Stateless scope evaluator
pub struct AccessPolicy;

impl AccessPolicy {
    pub fn resolve_scope(
        caller: &CurrentUser,
        requested_branch: Option<i64>,
    ) -> AppResult<EffectiveScope> {
        if caller.is_admin() {
            return Ok(requested_branch
                .map(EffectiveScope::Branch)
                .unwrap_or(EffectiveScope::AllBranches));
        }

        if caller.is_customer() {
            return requested_branch.map(EffectiveScope::Branch).ok_or_else(|| {
                AppError::with_message(ErrorCode::RequiredField, "branch_id is required")
            });
        }

        let Some(home) = caller.branch_id else {
            return Err(AppError::with_message(
                ErrorCode::BranchScopeDenied,
                format!("User {} is not assigned to a branch", caller.id),
            ));
        };

        match requested_branch {
            None => Ok(EffectiveScope::Branch(home)),
            Some(branch_id) if branch_id == home => Ok(EffectiveScope::Branch(branch_id)),
            Some(branch_id) => Err(AppError::branch_scope_denied(branch_id)),
        }
    }

    /// Scope check for an existing entity that belongs to `branch_id`
    pub fn check_branch(caller: &CurrentUser, branch_id: i64) -> AppResult<()> {
        Self::resolve_scope(caller, Some(branch_id)).map(|_| ())
    }

    /// Require admin, manager or staff
    pub fn require_operator(caller: &CurrentUser) -> AppResult<()> {
        if caller.is_branch_operator() {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "Role '{}' cannot perform this operation",
                caller.role
            )))
        }
    }

    pub fn require_permission(caller: &CurrentUser, permission: &str) -> AppResult<()> {
        if caller.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "Permission denied: {}",
                permission
            ))
            .with_detail("permission", permission))
        }
    }

    /// Customers may only touch their own records
    pub fn check_owner(caller: &CurrentUser, owner_id: Option<i64>) -> AppResult<()> {
        if !caller.is_customer() || owner_id == Some(caller.id) {
            Ok(())
        } else {
            Err(AppError::permission_denied("Not the owner of this resource"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str, branch_id: Option<i64>) -> CurrentUser {
        CurrentUser {
            id: 10,
            username: role.to_string(),
            role: role.to_string(),
            branch_id,
            permissions: vec![],
        }
    }

    #[test]
    fn admin_sees_everything() {
        let admin = user("admin", None);
        assert_eq!(
            AccessPolicy::resolve_scope(&admin, None).unwrap(),
            EffectiveScope::AllBranches
        );
        assert_eq!(
            AccessPolicy::resolve_scope(&admin, Some(4)).unwrap(),
            EffectiveScope::Branch(4)
        );
        assert!(AccessPolicy::require_permission(&admin, "riders:manage").is_ok());
    }

    #[test]
    fn staff_is_pinned_to_home_branch() {
        let staff = user("staff", Some(2));
        assert_eq!(
            AccessPolicy::resolve_scope(&staff, None).unwrap(),
            EffectiveScope::Branch(2)
        );
        assert!(AccessPolicy::check_branch(&staff, 2).is_ok());
        let err = AccessPolicy::resolve_scope(&staff, Some(3)).unwrap_err();
        assert_eq!(err.code, ErrorCode::BranchScopeDenied);
    }

    #[test]
    fn staff_without_branch_is_denied() {
        let err = AccessPolicy::resolve_scope(&user("manager", None), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::BranchScopeDenied);
    }

    #[test]
    fn customer_must_name_branch_and_own_records() {
        let customer = user("customer", None);
        assert_eq!(
            AccessPolicy::resolve_scope(&customer, Some(5)).unwrap(),
            EffectiveScope::Branch(5)
        );
        assert!(AccessPolicy::resolve_scope(&customer, None).is_err());
        assert!(AccessPolicy::check_owner(&customer, Some(10)).is_ok());
        assert!(AccessPolicy::check_owner(&customer, Some(11)).is_err());
        assert!(AccessPolicy::check_owner(&customer, None).is_err());
        assert!(AccessPolicy::require_operator(&customer).is_err());
    }

    #[test]
    fn scope_helpers() {
        assert_eq!(EffectiveScope::AllBranches.branch_id(), None);
        assert!(EffectiveScope::AllBranches.require_branch().is_err());
        assert_eq!(EffectiveScope::Branch(1).require_branch().unwrap(), 1);
    }
}
