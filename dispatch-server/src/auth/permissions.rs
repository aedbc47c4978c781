//! Role and permission definitions
//!
//! Basic operations (order entry, kitchen queue, location pings) only need a
//! staff-side role. Sensitive operations carry their own permission string.
//! `admin` is a super-role: it implicitly holds every permission and every
//! branch, see [`super::policy::AccessPolicy`].

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_RIDER: &str = "rider";
pub const ROLE_CUSTOMER: &str = "customer";

/// Roles that operate a branch (counter, kitchen, dispatch desk)
pub const BRANCH_OPERATOR_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_MANAGER, ROLE_STAFF];

/// Super permission, never granted through configuration
pub const PERMISSION_ALL: &str = "all";

pub const ORDERS_DISCOUNT: &str = "orders:discount";
pub const ORDERS_VOID: &str = "orders:void";
pub const ORDERS_MODIFY_PRICE: &str = "orders:modify_price";
pub const CASH_DRAWER_OPEN: &str = "cash_drawer:open";
pub const RIDERS_MANAGE: &str = "riders:manage";
pub const DELIVERIES_DISPATCH: &str = "deliveries:dispatch";
pub const INVENTORY_MANAGE: &str = "inventory:manage";

/// Configurable permissions
pub const ALL_PERMISSIONS: &[&str] = &[
    ORDERS_DISCOUNT,
    ORDERS_VOID,
    ORDERS_MODIFY_PRICE,
    CASH_DRAWER_OPEN,
    RIDERS_MANAGE,
    DELIVERIES_DISPATCH,
    INVENTORY_MANAGE,
];

pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &[PERMISSION_ALL];

/// Managers get every configurable permission
pub const DEFAULT_MANAGER_PERMISSIONS: &[&str] = ALL_PERMISSIONS;

/// Counter staff: till, POS price override and dispatch desk
pub const DEFAULT_STAFF_PERMISSIONS: &[&str] =
    &[CASH_DRAWER_OPEN, ORDERS_MODIFY_PRICE, DELIVERIES_DISPATCH];

/// Default permissions for a role, used when a token carries none
pub fn get_default_permissions(role_name: &str) -> Vec<String> {
    let perms: &[&str] = match role_name {
        ROLE_ADMIN => DEFAULT_ADMIN_PERMISSIONS,
        ROLE_MANAGER => DEFAULT_MANAGER_PERMISSIONS,
        ROLE_STAFF => DEFAULT_STAFF_PERMISSIONS,
        _ => &[],
    };
    perms.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults() {
        assert_eq!(get_default_permissions("admin"), vec!["all".to_string()]);
        assert_eq!(get_default_permissions("manager").len(), ALL_PERMISSIONS.len());
        assert!(get_default_permissions("staff").contains(&CASH_DRAWER_OPEN.to_string()));
        assert!(get_default_permissions("rider").is_empty());
        assert!(get_default_permissions("customer").is_empty());
    }
}
