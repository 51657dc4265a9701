//! Request extractors.

mod update_form;
mod validated_json;

pub use update_form::UpdateForm;
pub use validated_json::ValidatedJson;
