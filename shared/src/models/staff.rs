//! Staff / Principal Model

use serde::{Deserialize, Serialize};

/// Application section gated by access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Dashboard,
    Billing,
    Menu,
    Tables,
    Orders,
    Investment,
    Payroll,
    Staff,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Dashboard,
        Section::Billing,
        Section::Menu,
        Section::Tables,
        Section::Orders,
        Section::Investment,
        Section::Payroll,
        Section::Staff,
    ];
}

/// Staff profile document, keyed by email in the `staff` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffProfile {
    pub name: String,
    #[serde(default)]
    pub access: Vec<Section>,
}

/// Authenticated principal
///
/// An account without a staff profile is the owner account: admin with
/// every section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    pub email: String,
    pub name: String,
    /// Ignored for admins
    pub access: Vec<Section>,
    pub is_admin: bool,
}

impl Principal {
    pub fn admin(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            name: "Admin".to_string(),
            access: Vec::new(),
            is_admin: true,
        }
    }

    pub fn staff(uid: impl Into<String>, email: impl Into<String>, profile: StaffProfile) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            name: profile.name,
            access: profile.access,
            is_admin: false,
        }
    }

    /// Dashboard is admin-only; admins see everything else too
    pub fn has_access(&self, section: Section) -> bool {
        if section == Section::Dashboard {
            return self.is_admin;
        }
        self.is_admin || self.access.contains(&section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        let admin = Principal::admin("u1", "owner@example.com");
        assert!(Section::ALL.iter().all(|s| admin.has_access(*s)));
        assert_eq!(admin.name, "Admin");
    }

    #[test]
    fn test_staff_access_list() {
        let staff = Principal::staff(
            "u2",
            "cashier@example.com",
            StaffProfile {
                name: "Ravi".to_string(),
                access: vec![Section::Billing, Section::Dashboard],
            },
        );
        assert!(staff.has_access(Section::Billing));
        assert!(!staff.has_access(Section::Payroll));
        // Dashboard stays admin-only even when listed
        assert!(!staff.has_access(Section::Dashboard));
    }
}
