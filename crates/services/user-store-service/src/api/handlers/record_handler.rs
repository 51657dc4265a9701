//! Record handlers, scoped by store.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult};
use domain::{
    canonical_role, StoreKind, UploadedFiles, UserRecord, FIELD_BLOCKED, FIELD_DELETED,
    FIELD_EMAIL_VERIFIED,
};

use crate::api::extractors::{UpdateForm, ValidatedJson};
use crate::api::middleware::{require_privileged, require_self_or_privileged, CurrentUser};
use crate::api::AppState;
use crate::service::MigrateResult;

/// Store segment of a route (`candidates`, `employers`, `admins`).
#[derive(Debug, Clone, Copy)]
pub struct StorePath(pub StoreKind);

impl StorePath {
    pub fn parse(segment: &str) -> AppResult<Self> {
        match segment {
            "candidates" => Ok(Self(StoreKind::Candidate)),
            "employers" => Ok(Self(StoreKind::Employer)),
            "admins" | "admin-users" => Ok(Self(StoreKind::Admin)),
            _ => Err(AppError::NotFound),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_record))
        .route("/users/:id", get(get_record))
        .route("/stores/:store", get(list_records))
        .route(
            "/stores/:store/:id",
            get(get_store_record)
                .put(update_record)
                .delete(delete_record),
        )
        .route(
            "/stores/:store/:id/identity-document/review",
            post(review_identity_document),
        )
        .route(
            "/stores/:store/:id/education/:entry_id/review",
            post(review_education),
        )
}

/// Create a record in the store its role selects.
pub async fn create_record(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    form: UpdateForm,
) -> AppResult<(StatusCode, Json<UserRecord>)> {
    let wants_admin = form
        .fields
        .role()
        .is_some_and(|role| StoreKind::classify(&role) == StoreKind::Admin);
    if wants_admin {
        require_privileged(&current_user)?;
    }

    let files = state.uploads.save_all(form.uploads).await?;
    let result = state.records.create(form.fields, files.clone()).await;
    let record = discard_on_failure(&state, &files, result).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Find a record in whichever store holds it.
pub async fn get_record(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserRecord>> {
    require_self_or_privileged(&current_user, id)?;
    Ok(Json(state.records.get(id).await?))
}

pub async fn list_records(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(store): Path<String>,
) -> AppResult<Json<Vec<UserRecord>>> {
    require_privileged(&current_user)?;
    let StorePath(kind) = StorePath::parse(&store)?;
    Ok(Json(state.records.list(kind).await?))
}

pub async fn get_store_record(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((store, id)): Path<(String, Uuid)>,
) -> AppResult<Json<UserRecord>> {
    require_self_or_privileged(&current_user, id)?;
    let StorePath(kind) = StorePath::parse(&store)?;
    Ok(Json(state.records.get_in(kind, id).await?))
}

/// Update in place, or migrate when the role moves the record to another
/// store. The response carries the new id so clients can re-point.
pub async fn update_record(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((store, id)): Path<(String, Uuid)>,
    form: UpdateForm,
) -> AppResult<Json<MigrateResult>> {
    require_self_or_privileged(&current_user, id)?;
    let StorePath(kind) = StorePath::parse(&store)?;

    if !current_user.is_privileged() {
        let changes_role = form
            .fields
            .role()
            .is_some_and(|role| canonical_role(&role) != canonical_role(&current_user.role));
        let touches_lifecycle = [FIELD_BLOCKED, FIELD_DELETED, FIELD_EMAIL_VERIFIED]
            .iter()
            .any(|field| form.fields.get(field).is_some());
        if changes_role || touches_lifecycle {
            return Err(AppError::Forbidden);
        }
    }

    let files = state.uploads.save_all(form.uploads).await?;
    let result = state
        .records
        .update(kind, id, form.fields, files.clone())
        .await;
    let result = discard_on_failure(&state, &files, result).await?;
    Ok(Json(result))
}

/// Remove this request's uploads when no record ended up referencing them.
/// A partial migration leaves two copies that may both point at the files.
async fn discard_on_failure<T>(
    state: &AppState,
    files: &UploadedFiles,
    result: AppResult<T>,
) -> AppResult<T> {
    if let Err(e) = &result {
        if !matches!(e, AppError::PartialMigration { .. }) {
            state.uploads.discard(files).await;
        }
    }
    result
}

pub async fn delete_record(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((store, id)): Path<(String, Uuid)>,
) -> AppResult<StatusCode> {
    require_self_or_privileged(&current_user, id)?;
    let StorePath(kind) = StorePath::parse(&store)?;
    state.records.soft_delete(kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn review_identity_document(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((store, id)): Path<(String, Uuid)>,
    ValidatedJson(payload): ValidatedJson<ReviewRequest>,
) -> AppResult<Json<UserRecord>> {
    require_privileged(&current_user)?;
    let StorePath(kind) = StorePath::parse(&store)?;
    let record = state
        .records
        .review_identity_document(kind, id, &payload.status)
        .await?;
    Ok(Json(record))
}

/// Review one education entry, addressed by its stable id. Only candidates
/// have education.
pub async fn review_education(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((store, id, entry_id)): Path<(String, Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<ReviewRequest>,
) -> AppResult<Json<UserRecord>> {
    require_privileged(&current_user)?;
    if StorePath::parse(&store)?.0 != StoreKind::Candidate {
        return Err(AppError::NotFound);
    }
    let record = state
        .records
        .review_education(id, entry_id, &payload.status)
        .await?;
    Ok(Json(record))
}
