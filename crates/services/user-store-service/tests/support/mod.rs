//! In-memory stores and record fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{
    Account, CandidateRecord, Documents, Education, EmployerRecord, Experience, Password, Profile,
    ReviewStatus, StoreKind, UserRecord,
};
use user_store_service::repository::{RecordRepository, RecordStores};

pub const PASSWORD: &str = "correct-horse";

/// A store backed by a map, with switches to inject failures.
pub struct MemoryStore {
    kind: StoreKind,
    records: Mutex<HashMap<Uuid, UserRecord>>,
    /// Deletes fail with a database error
    pub fail_delete: AtomicBool,
    /// Deletes report that no row was removed
    pub vanish_on_delete: AtomicBool,
    /// Updates fail with a database error
    pub fail_update: AtomicBool,
    /// Runs once at the start of the next delete
    pub before_delete: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl MemoryStore {
    pub fn new(kind: StoreKind) -> Self {
        Self {
            kind,
            records: Mutex::new(HashMap::new()),
            fail_delete: AtomicBool::new(false),
            vanish_on_delete: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            before_delete: Mutex::new(None),
        }
    }

    /// Put a record in place as-is, keeping its id.
    pub fn seed(&self, record: UserRecord) -> Uuid {
        assert_eq!(record.kind(), self.kind);
        let id = record.id();
        self.records.lock().unwrap().insert(id, record);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<UserRecord> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<UserRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl RecordRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.account().email == email)
            .cloned())
    }

    async fn insert(&self, record: UserRecord) -> AppResult<UserRecord> {
        assert_eq!(record.kind(), self.kind);
        let record = with_id(record, Uuid::new_v4());
        self.records
            .lock()
            .unwrap()
            .insert(record.id(), record.clone());
        Ok(record)
    }

    async fn update(&self, record: UserRecord) -> AppResult<UserRecord> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(AppError::internal("update failed"));
        }
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&record.id()) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(AppError::NotFound),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        let hook = self.before_delete.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::internal("connection reset"));
        }
        if self.vanish_on_delete.load(Ordering::SeqCst) {
            // Another request removed the row first.
            self.records.lock().unwrap().remove(&id);
            return Ok(false);
        }
        Ok(self.records.lock().unwrap().remove(&id).is_some())
    }

    async fn list(&self) -> AppResult<Vec<UserRecord>> {
        Ok(self.all())
    }

    async fn list_migrating(&self) -> AppResult<Vec<UserRecord>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|r| r.migrating_from().is_some())
            .collect())
    }
}

/// The three in-memory stores.
pub struct MemoryStores {
    pub candidates: Arc<MemoryStore>,
    pub employers: Arc<MemoryStore>,
    pub admins: Arc<MemoryStore>,
}

impl MemoryStores {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            candidates: Arc::new(MemoryStore::new(StoreKind::Candidate)),
            employers: Arc::new(MemoryStore::new(StoreKind::Employer)),
            admins: Arc::new(MemoryStore::new(StoreKind::Admin)),
        })
    }

    pub fn memory(&self, kind: StoreKind) -> &Arc<MemoryStore> {
        match kind {
            StoreKind::Candidate => &self.candidates,
            StoreKind::Employer => &self.employers,
            StoreKind::Admin => &self.admins,
        }
    }

    /// Total records across every store.
    pub fn total(&self) -> usize {
        self.candidates.len() + self.employers.len() + self.admins.len()
    }
}

impl RecordStores for MemoryStores {
    fn store(&self, kind: StoreKind) -> Arc<dyn RecordRepository> {
        self.memory(kind).clone()
    }
}

pub fn with_id(record: UserRecord, id: Uuid) -> UserRecord {
    match record {
        UserRecord::Candidate(r) => UserRecord::Candidate(CandidateRecord { id, ..r }),
        UserRecord::Employer(r) => UserRecord::Employer(EmployerRecord { id, ..r }),
        UserRecord::Admin(mut r) => {
            r.id = id;
            UserRecord::Admin(r)
        }
    }
}

pub fn account(email: &str, role: &str) -> Account {
    Account {
        email: email.to_string(),
        password_hash: Password::new(PASSWORD).unwrap().into_string(),
        role: role.to_string(),
        blocked: false,
        deleted: false,
        email_verified: true,
        verification_status: "verified".to_string(),
        verification_token: None,
        verification_token_expires_at: None,
    }
}

pub fn profile(name: &str) -> Profile {
    Profile {
        name: name.to_string(),
        phone: "555-0100".to_string(),
        gender: "female".to_string(),
        date_of_birth: chrono::NaiveDate::from_ymd_opt(1990, 5, 17),
        summary: String::new(),
    }
}

/// A candidate with one approved certificate and an approved identity document.
pub fn candidate(email: &str) -> UserRecord {
    let created = Utc::now() - chrono::Duration::days(30);
    UserRecord::Candidate(CandidateRecord {
        id: Uuid::new_v4(),
        account: account(email, "CANDIDATE"),
        profile: profile("Ada"),
        documents: Documents {
            identity_document: Some("identityDocument/passport.pdf".to_string()),
            identity_document_status: ReviewStatus::Approve,
            profile_image: Some("profileImage/ada.png".to_string()),
        },
        education: vec![Education {
            id: Uuid::new_v4(),
            degree: "BSc".to_string(),
            institution: "MIT".to_string(),
            year: "2020".to_string(),
            certificate: Some("certificates/bsc.pdf".to_string()),
            status: ReviewStatus::Approve,
        }],
        experience: vec![Experience {
            company: "Acme".to_string(),
            role: "Engineer".to_string(),
            years: "2".to_string(),
        }],
        migrating_from: None,
        created_at: created,
        updated_at: created,
    })
}

pub fn employer(email: &str) -> UserRecord {
    let created = Utc::now() - chrono::Duration::days(10);
    UserRecord::Employer(EmployerRecord {
        id: Uuid::new_v4(),
        account: account(email, "EMPLOYER"),
        profile: profile("Grace"),
        documents: Documents::default(),
        skills: vec!["Hiring".to_string()],
        company_experience: Vec::new(),
        migrating_from: None,
        created_at: created,
        updated_at: created,
    })
}
