//! User domain entity and related types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{
    DEFAULT_CONTENT_TYPE, FIELD_CREATED_AT, FIELD_DOB, FIELD_EMAIL, FIELD_GENDER, FIELD_NAME,
    FIELD_UPDATED_AT, GENDER_FEMALE, GENDER_MALE, GENDER_OTHER, GENDER_UNSPECIFIED,
};
use crate::error::DomainError;

/// Gender enumeration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "male")]
    Male,
    #[serde(rename = "female")]
    Female,
    #[serde(rename = "other")]
    Other,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl Gender {
    /// Stored string form (`""` for unspecified)
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => GENDER_MALE,
            Gender::Female => GENDER_FEMALE,
            Gender::Other => GENDER_OTHER,
            Gender::Unspecified => GENDER_UNSPECIFIED,
        }
    }

    /// Check if a concrete gender was chosen
    pub fn is_specified(&self) -> bool {
        !matches!(self, Gender::Unspecified)
    }

    /// Lenient conversion used when decoding stored documents.
    ///
    /// Unknown values decode as [`Gender::Unspecified`].
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for Gender {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            GENDER_MALE => Ok(Gender::Male),
            GENDER_FEMALE => Ok(Gender::Female),
            GENDER_OTHER => Ok(Gender::Other),
            "" | "unspecified" => Ok(Gender::Unspecified),
            other => Err(DomainError::unknown("gender", other)),
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Unspecified => write!(f, "unspecified"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// User domain entity, as read back from the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier assigned by the document store
    pub id: String,
    pub name: String,
    pub email: String,
    /// Date of birth as `YYYY-MM-DD`
    pub dob: String,
    pub gender: Gender,
    /// Download URL of the stored profile picture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profilepicture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw profile picture payload waiting to be uploaded
#[derive(Clone, PartialEq, Eq)]
pub struct ProfilePicture {
    /// Original file name, used to build the storage key
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ProfilePicture {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Declared content type, or the generic binary type
    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

impl std::fmt::Debug for ProfilePicture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilePicture")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Input for create and update operations.
///
/// Field rules are checked by callers; the data-access service stores
/// whatever it is given.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct UserFormData {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Date of birth is required"))]
    pub dob: String,
    pub gender: Gender,
    /// New picture to upload; `None` keeps the current one
    pub profilepicture: Option<ProfilePicture>,
}

impl UserFormData {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        dob: impl Into<String>,
        gender: Gender,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            dob: dob.into(),
            gender,
            profilepicture: None,
        }
    }

    pub fn with_picture(mut self, picture: ProfilePicture) -> Self {
        self.profilepicture = Some(picture);
        self
    }
}

/// Optional list predicates.
///
/// `name` and `email` are prefix matches, `gender` is exact. The remaining
/// fields are accepted for symmetry with the record shape and ignored by
/// the listing query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub name: Option<String>,
    pub email: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<Gender>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Fields a user listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Email,
    Dob,
    Gender,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Document field the ordering applies to
    pub fn field_name(&self) -> &'static str {
        match self {
            SortField::Name => FIELD_NAME,
            SortField::Email => FIELD_EMAIL,
            SortField::Dob => FIELD_DOB,
            SortField::Gender => FIELD_GENDER,
            SortField::CreatedAt => FIELD_CREATED_AT,
            SortField::UpdatedAt => FIELD_UPDATED_AT,
        }
    }
}

impl FromStr for SortField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            FIELD_NAME => Ok(SortField::Name),
            FIELD_EMAIL => Ok(SortField::Email),
            FIELD_DOB => Ok(SortField::Dob),
            FIELD_GENDER => Ok(SortField::Gender),
            FIELD_CREATED_AT | "created_at" => Ok(SortField::CreatedAt),
            FIELD_UPDATED_AT | "updated_at" => Ok(SortField::UpdatedAt),
            other => Err(DomainError::unknown("sort field", other)),
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.field_name())
    }
}

/// Sort direction, ascending unless asked otherwise
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(DomainError::unknown("sort order", other)),
        }
    }
}
