//! Service layer - Business logic and use cases.

mod codec;
mod profile_picture;
mod user_service;

pub use profile_picture::PictureCleanup;
pub use user_service::{build_user_query, UserManager, UserService};
