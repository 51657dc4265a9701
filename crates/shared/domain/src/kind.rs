//! Store kinds and the role router.

use serde::{Deserialize, Serialize};

use crate::constants::{canonical_role, ADMIN_ROLES, EMPLOYER_ROLES};

/// The three disjoint stores a user record can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StoreKind {
    Candidate,
    Employer,
    Admin,
}

impl StoreKind {
    /// Order in which stores are probed when only an id is known.
    pub const PROBE_ORDER: [StoreKind; 3] =
        [StoreKind::Candidate, StoreKind::Employer, StoreKind::Admin];

    /// Classify a role string into the store that must hold it.
    ///
    /// Total: admin roles first, then employer aliases, and everything
    /// else (including typos) lands in the candidate store.
    pub fn classify(role: &str) -> Self {
        let role = canonical_role(role);
        if ADMIN_ROLES.contains(&role.as_str()) {
            StoreKind::Admin
        } else if EMPLOYER_ROLES.contains(&role.as_str()) {
            StoreKind::Employer
        } else {
            StoreKind::Candidate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Candidate => "CANDIDATE",
            StoreKind::Employer => "EMPLOYER",
            StoreKind::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
