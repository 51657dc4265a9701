//! Domain-level constants.
//!
//! These constants define business rules, role sets and wire field names.

// =============================================================================
// Roles
// =============================================================================

/// Roles held by records in the admin store
pub const ADMIN_ROLES: &[&str] = &["SUPER_ADMIN", "ADMIN", "MODERATOR", "SUPPORT"];

/// Role aliases that place a record in the employer store
pub const EMPLOYER_ROLES: &[&str] = &["EMPLOYER", "RECRUITER", "COMPANY", "HIRING_MANAGER"];

/// Roles that are expected to land in the candidate store
pub const CANDIDATE_ROLES: &[&str] = &["CANDIDATE", "STUDENT", "JOB_SEEKER"];

/// Role assigned when a candidate is created without one
pub const DEFAULT_CANDIDATE_ROLE: &str = "CANDIDATE";

/// Canonical form of a role string (trimmed, ASCII uppercase).
pub fn canonical_role(role: &str) -> String {
    role.trim().to_ascii_uppercase()
}

/// Check if a role value belongs to any known role set
pub fn is_known_role(role: &str) -> bool {
    let role = canonical_role(role);
    ADMIN_ROLES
        .iter()
        .chain(EMPLOYER_ROLES)
        .chain(CANDIDATE_ROLES)
        .any(|known| *known == role)
}

/// Check if a role grants administrative privileges
pub fn is_admin_role(role: &str) -> bool {
    ADMIN_ROLES.contains(&canonical_role(role).as_str())
}

// =============================================================================
// Payload field names
// =============================================================================

pub const FIELD_ROLE: &str = "role";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_NAME: &str = "name";
pub const FIELD_PHONE: &str = "phone";
pub const FIELD_GENDER: &str = "gender";
pub const FIELD_DATE_OF_BIRTH: &str = "dateOfBirth";
pub const FIELD_SUMMARY: &str = "summary";
pub const FIELD_BLOCKED: &str = "blocked";
pub const FIELD_DELETED: &str = "deleted";
pub const FIELD_EMAIL_VERIFIED: &str = "emailVerified";

pub const FIELD_EDUCATION: &str = "education";
pub const FIELD_EXPERIENCE: &str = "experience";
pub const FIELD_SKILLS: &str = "skills";
pub const FIELD_COMPANY_EXPERIENCE: &str = "companyExperience";
pub const FIELD_PERMISSIONS: &str = "permissions";

// =============================================================================
// Encodings
// =============================================================================

/// Separator for scalar lists sent as a single string (`"SQL, Rust"`)
pub const LIST_DELIMITER: char = ',';

/// Separator between entries in the compact row form (`"a|b;c|d"`)
pub const ROW_DELIMITER: char = ';';

/// Separator between fields of one entry in the compact row form
pub const FIELD_DELIMITER: char = '|';

// =============================================================================
// Asset slots
// =============================================================================

/// Identity document upload slot
pub const SLOT_IDENTITY_DOCUMENT: &str = "identityDocument";

/// Profile image upload slot
pub const SLOT_PROFILE_IMAGE: &str = "profileImage";

/// Per-education-entry certificate upload slot
pub const SLOT_CERTIFICATES: &str = "certificates";

/// All slots accepted by the upload middleware
pub const UPLOAD_SLOTS: &[&str] = &[SLOT_IDENTITY_DOCUMENT, SLOT_PROFILE_IMAGE, SLOT_CERTIFICATES];

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Verification status given to freshly created records
pub const DEFAULT_VERIFICATION_STATUS: &str = "pending";
