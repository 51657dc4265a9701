//! Update payload extractor.
//!
//! Accepts multipart forms, url-encoded forms and JSON objects. Multipart
//! text parts become raw fields; file parts are buffered and left for the
//! handler to store once the caller is authorized.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde_json::{Map, Value};
use tracing::debug;

use common::AppError;
use domain::RawUpdate;

use crate::api::uploads::PendingUpload;

/// Raw fields plus the file parts of this request, not yet written.
#[derive(Debug, Default)]
pub struct UpdateForm {
    pub fields: RawUpdate,
    pub uploads: Vec<PendingUpload>,
}

#[async_trait]
impl<S> FromRequest<S> for UpdateForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            return read_multipart(multipart).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            return Ok(Self {
                fields: RawUpdate::from_pairs(pairs),
                uploads: Vec::new(),
            });
        }

        let Json(map) = Json::<Map<String, Value>>::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        Ok(Self {
            fields: RawUpdate::from(map),
            uploads: Vec::new(),
        })
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<UpdateForm, AppError> {
    let mut form = UpdateForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(e.body_text()))?;
                if bytes.is_empty() {
                    debug!("Skipping empty upload in {}", name);
                    continue;
                }
                form.uploads.push(PendingUpload {
                    slot: name,
                    file_name: Some(file_name),
                    bytes,
                });
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(e.body_text()))?;
                form.fields.push(name, Value::String(text));
            }
        }
    }

    Ok(form)
}
