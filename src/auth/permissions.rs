/*!
 * # Permissions Module
 *
 * Permissions are `resource:action` strings. Roles expand to a fixed
 * permission set that is embedded in the access token at login.
 */

use crate::models::UserRole;

/// Permission actions
pub struct Actions;

impl Actions {
    pub const READ: &'static str = "read";
    pub const MANAGE: &'static str = "manage";
    pub const ALL: &'static str = "*";
}

/// Resource types
pub struct Resources;

impl Resources {
    pub const COMPANIES: &'static str = "companies";
    pub const CLIENTS: &'static str = "clients";
    pub const SKUS: &'static str = "skus";
    pub const PURCHASE_ORDERS: &'static str = "purchaseorders";
    pub const GRNS: &'static str = "grns";
    pub const INVENTORY: &'static str = "inventory";
    pub const INVOICES: &'static str = "invoices";
    pub const PAYMENTS: &'static str = "payments";
    pub const CREDIT_NOTES: &'static str = "creditnotes";
    pub const PROCESSES: &'static str = "processes";
    pub const MACHINES: &'static str = "machines";
    pub const USERS: &'static str = "users";
}

/// Every resource that carries business data; users are managed separately.
pub const BUSINESS_RESOURCES: &[&str] = &[
    Resources::COMPANIES,
    Resources::CLIENTS,
    Resources::SKUS,
    Resources::PURCHASE_ORDERS,
    Resources::GRNS,
    Resources::INVENTORY,
    Resources::INVOICES,
    Resources::PAYMENTS,
    Resources::CREDIT_NOTES,
    Resources::PROCESSES,
    Resources::MACHINES,
];

/// Resources staff may write to.
const STAFF_WRITABLE: &[&str] = &[Resources::GRNS, Resources::INVENTORY, Resources::PAYMENTS];

/// Common permission string constants for compile-time safety
pub mod consts {
    pub const COMPANIES_READ: &str = "companies:read";
    pub const COMPANIES_MANAGE: &str = "companies:manage";

    pub const CLIENTS_READ: &str = "clients:read";
    pub const CLIENTS_MANAGE: &str = "clients:manage";

    pub const SKUS_READ: &str = "skus:read";
    pub const SKUS_MANAGE: &str = "skus:manage";

    pub const PURCHASEORDERS_READ: &str = "purchaseorders:read";
    pub const PURCHASEORDERS_MANAGE: &str = "purchaseorders:manage";

    pub const GRNS_READ: &str = "grns:read";
    pub const GRNS_MANAGE: &str = "grns:manage";

    pub const INVENTORY_READ: &str = "inventory:read";
    pub const INVENTORY_MANAGE: &str = "inventory:manage";

    pub const INVOICES_READ: &str = "invoices:read";
    pub const INVOICES_MANAGE: &str = "invoices:manage";

    pub const PAYMENTS_READ: &str = "payments:read";
    pub const PAYMENTS_MANAGE: &str = "payments:manage";

    pub const CREDITNOTES_READ: &str = "creditnotes:read";
    pub const CREDITNOTES_MANAGE: &str = "creditnotes:manage";

    pub const PROCESSES_READ: &str = "processes:read";
    pub const PROCESSES_MANAGE: &str = "processes:manage";

    pub const MACHINES_READ: &str = "machines:read";
    pub const MACHINES_MANAGE: &str = "machines:manage";

    pub const USERS_READ: &str = "users:read";
    pub const USERS_MANAGE: &str = "users:manage";
}

/// Format a permission string
pub fn format_permission(resource: &str, action: &str) -> String {
    format!("{}:{}", resource, action)
}

/// Permissions granted to a role.
pub fn role_permissions(role: UserRole) -> Vec<String> {
    match role {
        UserRole::Admin => vec![Actions::ALL.to_string()],
        UserRole::Manager => BUSINESS_RESOURCES
            .iter()
            .map(|resource| format_permission(resource, Actions::ALL))
            .collect(),
        UserRole::Staff => BUSINESS_RESOURCES
            .iter()
            .map(|resource| format_permission(resource, Actions::READ))
            .chain(
                STAFF_WRITABLE
                    .iter()
                    .map(|resource| format_permission(resource, Actions::MANAGE)),
            )
            .collect(),
    }
}

/// Check if a permission is implied by another permission
pub fn is_permission_implied(user_perm: &str, required_perm: &str) -> bool {
    if user_perm == required_perm || user_perm == Actions::ALL {
        return true;
    }

    match (user_perm.split_once(':'), required_perm.split_once(':')) {
        (Some((user_resource, user_action)), Some((required_resource, _))) => {
            user_resource == required_resource && user_action == Actions::ALL
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted(role: UserRole, required: &str) -> bool {
        role_permissions(role)
            .iter()
            .any(|perm| is_permission_implied(perm, required))
    }

    #[test]
    fn wildcard_matching() {
        assert!(is_permission_implied("*", consts::USERS_MANAGE));
        assert!(is_permission_implied("grns:*", consts::GRNS_MANAGE));
        assert!(!is_permission_implied("grns:*", consts::INVENTORY_MANAGE));
        assert!(!is_permission_implied("grns:read", consts::GRNS_MANAGE));
    }

    #[test]
    fn manager_cannot_manage_users() {
        assert!(granted(UserRole::Manager, consts::INVOICES_MANAGE));
        assert!(!granted(UserRole::Manager, consts::USERS_MANAGE));
        assert!(!granted(UserRole::Manager, consts::USERS_READ));
    }

    #[test]
    fn staff_reads_everything_but_writes_only_floor_resources() {
        assert!(granted(UserRole::Staff, consts::COMPANIES_READ));
        assert!(granted(UserRole::Staff, consts::GRNS_MANAGE));
        assert!(granted(UserRole::Staff, consts::PAYMENTS_MANAGE));
        assert!(granted(UserRole::Staff, consts::INVENTORY_MANAGE));
        assert!(!granted(UserRole::Staff, consts::INVOICES_MANAGE));
        assert!(!granted(UserRole::Staff, consts::COMPANIES_MANAGE));
    }
}
