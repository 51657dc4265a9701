//! Record assembly: carry parts forward, apply a payload, and emit a
//! record in the shape of a target store.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use validator::ValidateEmail;

use domain::normalize::{assign_missing_ids, normalize_entries, normalize_list};
use domain::{
    canonical_role, normalize, resolve_assets, Account, AdminUserRecord, CandidateRecord,
    CompanyExperience, Documents, DomainError, DomainResult, Education, EmployerRecord,
    ExistingAssets, Experience, FieldPatch, FileRef, NormalizedFields, Password, Profile, RawUpdate,
    ReviewStatus, SlotSchema, StoreKind, UploadedFiles, UserRecord, DEFAULT_VERIFICATION_STATUS,
    FIELD_BLOCKED, FIELD_COMPANY_EXPERIENCE, FIELD_DATE_OF_BIRTH, FIELD_DELETED, FIELD_EDUCATION,
    FIELD_EMAIL, FIELD_EMAIL_VERIFIED, FIELD_EXPERIENCE, FIELD_GENDER, FIELD_NAME, FIELD_PASSWORD,
    FIELD_PERMISSIONS, FIELD_PHONE, FIELD_SKILLS, FIELD_SUMMARY,
};

/// Everything a record carries, independent of its store schema.
#[derive(Debug, Clone)]
pub(crate) struct RecordParts {
    pub account: Account,
    pub profile: Profile,
    pub identity_document: Option<String>,
    pub identity_document_status: ReviewStatus,
    pub profile_image: Option<String>,
    pub nested: NormalizedFields,
    pub migrating_from: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl RecordParts {
    /// Parts of a record that does not exist yet.
    pub fn blank(role: &str) -> Self {
        Self {
            account: Account {
                email: String::new(),
                password_hash: String::new(),
                role: canonical_role(role),
                blocked: false,
                deleted: false,
                email_verified: false,
                verification_status: DEFAULT_VERIFICATION_STATUS.to_string(),
                verification_token: None,
                verification_token_expires_at: None,
            },
            profile: Profile::default(),
            identity_document: None,
            identity_document_status: ReviewStatus::Pending,
            profile_image: None,
            nested: NormalizedFields::default(),
            migrating_from: None,
            created_at: Utc::now(),
        }
    }

    pub fn from_record(record: &UserRecord) -> Self {
        let nested = match record {
            UserRecord::Candidate(r) => NormalizedFields {
                education: r.education.clone(),
                experience: r.experience.clone(),
                ..Default::default()
            },
            UserRecord::Employer(r) => NormalizedFields {
                skills: r.skills.clone(),
                company_experience: r.company_experience.clone(),
                ..Default::default()
            },
            UserRecord::Admin(r) => NormalizedFields {
                permissions: r.permissions.clone(),
                ..Default::default()
            },
        };
        let documents = record.documents();

        Self {
            account: record.account().clone(),
            profile: record.profile().clone(),
            identity_document: documents.and_then(|d| d.identity_document.clone()),
            identity_document_status: documents
                .map(|d| d.identity_document_status)
                .unwrap_or_default(),
            profile_image: record.profile_image().map(str::to_string),
            nested,
            migrating_from: record.migrating_from(),
            created_at: record.created_at(),
        }
    }

    /// Apply scalar account and profile fields.
    ///
    /// Absent fields keep their value and empty strings clear them. Email
    /// cannot be cleared and an empty password keeps the current hash.
    pub fn apply_scalars(&mut self, fields: &RawUpdate) -> DomainResult<()> {
        match fields.text(FIELD_EMAIL) {
            FieldPatch::Keep => {}
            FieldPatch::Clear => return Err(DomainError::validation("Email cannot be empty")),
            FieldPatch::Set(email) => {
                let email = email.trim().to_ascii_lowercase();
                if !email.validate_email() {
                    return Err(DomainError::validation(format!("Invalid email: {}", email)));
                }
                self.account.email = email;
            }
        }

        if let FieldPatch::Set(password) = fields.text(FIELD_PASSWORD) {
            self.account.password_hash = Password::new(&password)?.into_string();
        }
        if let Some(role) = fields.role() {
            self.account.role = canonical_role(&role);
        }
        if let Some(blocked) = fields.flag(FIELD_BLOCKED) {
            self.account.blocked = blocked;
        }
        if let Some(deleted) = fields.flag(FIELD_DELETED) {
            self.account.deleted = deleted;
        }
        if let Some(verified) = fields.flag(FIELD_EMAIL_VERIFIED) {
            self.account.email_verified = verified;
        }

        let profile = &mut self.profile;
        profile.name = fields.text(FIELD_NAME).resolve(&profile.name);
        profile.phone = fields.text(FIELD_PHONE).resolve(&profile.phone);
        profile.gender = fields.text(FIELD_GENDER).resolve(&profile.gender);
        profile.summary = fields.text(FIELD_SUMMARY).resolve(&profile.summary);
        match fields.text(FIELD_DATE_OF_BIRTH) {
            FieldPatch::Keep => {}
            FieldPatch::Clear => profile.date_of_birth = None,
            FieldPatch::Set(value) => profile.date_of_birth = Some(parse_date(&value)?),
        }

        Ok(())
    }

    /// Replace every nested list with the payload's, empty when absent.
    ///
    /// Education status and certificate paths are never taken from the
    /// payload: entries start Pending and only keep a certificate these
    /// parts already held.
    pub fn replace_nested(&mut self, fields: &RawUpdate) {
        let stored = std::mem::take(&mut self.nested.education);
        let mut nested = normalize(fields);
        nested.education = merge_education(&stored, nested.education);
        self.nested = nested;
    }

    /// Replace only the nested lists the payload mentions.
    ///
    /// Education entries that keep their id keep their certificate and
    /// review status unless a different certificate is supplied. Any other
    /// entry is Pending and may only name a certificate already held.
    pub fn merge_nested(&mut self, fields: &RawUpdate) {
        if fields.contains(FIELD_EDUCATION) {
            let incoming = normalize_entries::<Education>(fields, FIELD_EDUCATION);
            self.nested.education = merge_education(&self.nested.education, incoming);
        }
        if fields.contains(FIELD_EXPERIENCE) {
            self.nested.experience = normalize_entries::<Experience>(fields, FIELD_EXPERIENCE);
        }
        if fields.contains(FIELD_SKILLS) {
            self.nested.skills = normalize_list(fields, FIELD_SKILLS);
        }
        if fields.contains(FIELD_COMPANY_EXPERIENCE) {
            self.nested.company_experience =
                normalize_entries::<CompanyExperience>(fields, FIELD_COMPANY_EXPERIENCE);
        }
        if fields.contains(FIELD_PERMISSIONS) {
            self.nested.permissions = normalize_list(fields, FIELD_PERMISSIONS);
        }
    }

    /// Emit a record of `kind`, dropping whatever its schema has no slot for.
    pub fn into_record(self, kind: StoreKind, id: Uuid, uploads: &UploadedFiles) -> UserRecord {
        let schema = SlotSchema::for_kind(kind);

        let mut education = if schema.certificates {
            self.nested.education
        } else {
            Vec::new()
        };
        assign_missing_ids(&mut education);
        for entry in &mut education {
            entry.certificate = entry
                .certificate
                .take()
                .filter(|path| FileRef::new(path.as_str()).is_ok());
        }

        let existing = ExistingAssets {
            identity_document: self.identity_document,
            profile_image: self.profile_image,
            certificates: education.iter().map(|e| e.certificate.clone()).collect(),
        };
        let paths = resolve_assets(&existing, uploads, schema);

        for (entry, path) in education.iter_mut().zip(paths.certificates) {
            if entry.certificate.is_none() && path.is_some() {
                entry.status = ReviewStatus::Pending;
            }
            entry.certificate = path;
        }

        let identity_document_status =
            if paths.identity_document_replaced || paths.identity_document.is_none() {
                ReviewStatus::Pending
            } else {
                self.identity_document_status
            };
        let documents = Documents {
            identity_document: paths.identity_document,
            identity_document_status,
            profile_image: paths.profile_image.clone(),
        };

        let updated_at = Utc::now();
        match kind {
            StoreKind::Candidate => UserRecord::Candidate(CandidateRecord {
                id,
                account: self.account,
                profile: self.profile,
                documents,
                education,
                experience: self.nested.experience,
                migrating_from: self.migrating_from,
                created_at: self.created_at,
                updated_at,
            }),
            StoreKind::Employer => UserRecord::Employer(EmployerRecord {
                id,
                account: self.account,
                profile: self.profile,
                documents,
                skills: self.nested.skills,
                company_experience: self.nested.company_experience,
                migrating_from: self.migrating_from,
                created_at: self.created_at,
                updated_at,
            }),
            StoreKind::Admin => UserRecord::Admin(AdminUserRecord {
                id,
                account: self.account,
                profile: self.profile,
                profile_image: paths.profile_image,
                permissions: self.nested.permissions,
                migrating_from: self.migrating_from,
                created_at: self.created_at,
                updated_at,
            }),
        }
    }
}

fn merge_education(current: &[Education], incoming: Vec<Education>) -> Vec<Education> {
    incoming
        .into_iter()
        .map(|mut entry| {
            let stored = current
                .iter()
                .find(|stored| !entry.id.is_nil() && stored.id == entry.id);
            match stored {
                Some(stored)
                    if entry.certificate.is_none() || entry.certificate == stored.certificate =>
                {
                    entry.certificate = stored.certificate.clone();
                    entry.status = stored.status;
                }
                _ => {
                    // A payload path must name a file this record already holds.
                    entry.certificate = entry.certificate.take().filter(|path| {
                        current
                            .iter()
                            .any(|held| held.certificate.as_deref() == Some(path.as_str()))
                    });
                    entry.status = ReviewStatus::Pending;
                }
            }
            entry
        })
        .collect()
}

/// `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
fn parse_date(value: &str) -> DomainResult<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| DomainError::validation(format!("Invalid {}: {}", FIELD_DATE_OF_BIRTH, value)))
}
