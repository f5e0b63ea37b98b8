//! Domain layer - User records and the inputs accepted by write operations.
//!
//! This crate contains plain data types with no storage dependencies.
//! They are shared between the data-access service and its callers.

pub mod constants;
pub mod error;
pub mod user;

pub use constants::*;
pub use error::DomainError;
pub use user::{FilterOptions, Gender, ProfilePicture, SortField, SortOrder, User, UserFormData};
