//! Domain-level constants.

// =============================================================================
// Storage layout
// =============================================================================

/// Document collection holding user records
pub const USERS_COLLECTION: &str = "users";

/// Object-store namespace for uploaded profile pictures
pub const PROFILE_PHOTOS_PATH: &str = "profile_photos";

/// Highest private-use code point, appended to a prefix to form the upper
/// bound of a "starts with" range query
pub const PREFIX_RANGE_SENTINEL: char = '\u{f8ff}';

/// Content type used when an upload does not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// =============================================================================
// Document fields
// =============================================================================

pub const FIELD_NAME: &str = "name";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_DOB: &str = "dob";
pub const FIELD_GENDER: &str = "gender";
pub const FIELD_PROFILE_PICTURE: &str = "profilepicture";
pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_UPDATED_AT: &str = "updatedAt";

// =============================================================================
// Gender values
// =============================================================================

pub const GENDER_MALE: &str = "male";
pub const GENDER_FEMALE: &str = "female";
pub const GENDER_OTHER: &str = "other";

/// Stored representation of an unspecified gender
pub const GENDER_UNSPECIFIED: &str = "";

/// Date format of the `dob` field
pub const DOB_FORMAT: &str = "%Y-%m-%d";
