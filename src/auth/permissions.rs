/*!
 * # Permissions Module
 *
 * Permission strings are `resource:action`. Each role carries a fixed set;
 * platform admins bypass permission checks entirely.
 */

use crate::entities::user::UserRole;

/// Common permission string constants for compile-time safety
pub mod consts {
    // Consignors
    pub const CONSIGNORS_READ: &str = "consignors:read";
    pub const CONSIGNORS_MANAGE: &str = "consignors:manage";

    // Categories and items
    pub const INVENTORY_READ: &str = "inventory:read";
    pub const INVENTORY_MANAGE: &str = "inventory:manage";

    // Sales
    pub const SALES_READ: &str = "sales:read";
    pub const SALES_CREATE: &str = "sales:create";

    // Payouts
    pub const PAYOUTS_READ: &str = "payouts:read";
    pub const PAYOUTS_CREATE: &str = "payouts:create";

    // Statements
    pub const STATEMENTS_READ: &str = "statements:read";
    pub const STATEMENTS_GENERATE: &str = "statements:generate";

    // Shop settings
    pub const ORGANIZATION_MANAGE: &str = "organization:manage";

    // Platform administration
    pub const REGISTRATIONS_APPROVE: &str = "registrations:approve";

    // Consignor portal
    pub const PORTAL_READ: &str = "portal:read";
}

use consts::*;

const OWNER_PERMISSIONS: &[&str] = &[
    CONSIGNORS_READ,
    CONSIGNORS_MANAGE,
    INVENTORY_READ,
    INVENTORY_MANAGE,
    SALES_READ,
    SALES_CREATE,
    PAYOUTS_READ,
    PAYOUTS_CREATE,
    STATEMENTS_READ,
    STATEMENTS_GENERATE,
    ORGANIZATION_MANAGE,
];

const STAFF_PERMISSIONS: &[&str] = &[
    CONSIGNORS_READ,
    INVENTORY_READ,
    INVENTORY_MANAGE,
    SALES_READ,
    SALES_CREATE,
    PAYOUTS_READ,
    STATEMENTS_READ,
];

const CONSIGNOR_PERMISSIONS: &[&str] = &[PORTAL_READ];

/// Permissions granted to a role.
pub fn permissions_for_role(role: UserRole) -> Vec<String> {
    let granted: &[&str] = match role {
        UserRole::Admin => &[REGISTRATIONS_APPROVE],
        UserRole::Owner => OWNER_PERMISSIONS,
        UserRole::Staff => STAFF_PERMISSIONS,
        UserRole::Consignor => CONSIGNOR_PERMISSIONS,
    };
    granted.iter().map(|p| p.to_string()).collect()
}
