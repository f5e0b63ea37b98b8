//! Mapping between user records and store documents.

use chrono::{DateTime, Utc};

use common::{AppError, AppResult};
use domain::{
    Gender, User, UserFormData, DOB_FORMAT, FIELD_CREATED_AT, FIELD_DOB, FIELD_EMAIL,
    FIELD_GENDER, FIELD_NAME, FIELD_PROFILE_PICTURE, FIELD_UPDATED_AT,
};

use crate::store::{Document, FieldValue, Fields};

/// Fields shared by the insert document and the update patch
fn profile_fields(form: &UserFormData, picture_url: Option<String>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(FIELD_NAME.to_string(), FieldValue::from(form.name.as_str()));
    fields.insert(FIELD_EMAIL.to_string(), FieldValue::from(form.email.as_str()));
    fields.insert(FIELD_DOB.to_string(), FieldValue::from(form.dob.as_str()));
    fields.insert(FIELD_GENDER.to_string(), FieldValue::from(form.gender.as_str()));
    fields.insert(FIELD_PROFILE_PICTURE.to_string(), FieldValue::from(picture_url));
    fields
}

/// Document written by a create: both timestamps set to `now`.
pub(crate) fn encode_new_user(
    form: &UserFormData,
    picture_url: Option<String>,
    now: DateTime<Utc>,
) -> Fields {
    let mut fields = profile_fields(form, picture_url);
    fields.insert(FIELD_CREATED_AT.to_string(), FieldValue::from(now));
    fields.insert(FIELD_UPDATED_AT.to_string(), FieldValue::from(now));
    fields
}

/// Patch written by an update. `createdAt` is never part of it.
pub(crate) fn encode_user_patch(
    form: &UserFormData,
    picture_url: Option<String>,
    now: DateTime<Utc>,
) -> Fields {
    let mut fields = profile_fields(form, picture_url);
    fields.insert(FIELD_UPDATED_AT.to_string(), FieldValue::from(now));
    fields
}

/// Date of birth as `YYYY-MM-DD`.
///
/// Timestamps are reduced to their UTC date, strings pass through and
/// anything else becomes empty.
pub(crate) fn decode_dob(value: Option<&FieldValue>) -> String {
    match value {
        Some(FieldValue::Timestamp(ts)) => ts.date_naive().format(DOB_FORMAT).to_string(),
        Some(FieldValue::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn decode_text(doc: &Document, field: &str) -> String {
    doc.get(field)
        .and_then(FieldValue::as_str)
        .unwrap_or_default()
        .to_string()
}

fn decode_timestamp(doc: &Document, field: &str) -> AppResult<DateTime<Utc>> {
    doc.get(field)
        .and_then(FieldValue::as_timestamp)
        .ok_or_else(|| AppError::malformed(&doc.id, field))
}

/// Decode a stored document into a user.
///
/// Fails with `MalformedDocument` when a timestamp field is missing.
pub(crate) fn decode_user(doc: Document) -> AppResult<User> {
    let created_at = decode_timestamp(&doc, FIELD_CREATED_AT)?;
    let updated_at = decode_timestamp(&doc, FIELD_UPDATED_AT)?;

    let profilepicture = doc
        .get(FIELD_PROFILE_PICTURE)
        .and_then(FieldValue::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    Ok(User {
        name: decode_text(&doc, FIELD_NAME),
        email: decode_text(&doc, FIELD_EMAIL),
        dob: decode_dob(doc.get(FIELD_DOB)),
        gender: Gender::from_stored(&decode_text(&doc, FIELD_GENDER)),
        profilepicture,
        created_at,
        updated_at,
        id: doc.id,
    })
}
