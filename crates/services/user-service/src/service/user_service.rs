//! User service - Create, list, update and delete user records.
//!
//! Each operation is a linear sequence of calls against the injected
//! document store and object store. Failures are logged and returned to
//! the caller unchanged, except for picture removal which is best-effort.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info};

use common::{AppResult, OptionExt};
use domain::{
    FilterOptions, SortField, SortOrder, User, UserFormData, FIELD_EMAIL, FIELD_GENDER,
    FIELD_NAME, PREFIX_RANGE_SENTINEL, USERS_COLLECTION,
};

use super::codec;
use super::profile_picture::{delete_profile_picture, upload_profile_picture, PictureCleanup};
use crate::store::{Direction, DocumentStore, FieldFilter, ObjectStore, Query};

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create a user, uploading its picture first if one is given.
    /// Returns the identifier assigned by the document store.
    async fn add_user(&self, form: UserFormData) -> AppResult<String>;

    /// List users matching the filters, optionally ordered by one field
    async fn get_users(
        &self,
        sort_field: Option<SortField>,
        sort_order: SortOrder,
        filters: &FilterOptions,
    ) -> AppResult<Vec<User>>;

    /// Get a single user by identifier
    async fn get_user(&self, id: &str) -> AppResult<User>;

    /// Replace a user's profile fields.
    ///
    /// A new picture replaces `current_picture`; without one the current
    /// URL is kept.
    async fn update_user(
        &self,
        id: &str,
        form: UserFormData,
        current_picture: Option<&str>,
    ) -> AppResult<PictureCleanup>;

    /// Delete a user, removing its picture first on a best-effort basis
    async fn delete_user(&self, id: &str, picture: Option<&str>) -> AppResult<PictureCleanup>;
}

/// Build the listing query.
///
/// Text filters become prefix ranges `[prefix, prefix + U+F8FF]`. Empty
/// text filters and an unspecified gender are ignored.
pub fn build_user_query(
    sort_field: Option<SortField>,
    sort_order: SortOrder,
    filters: &FilterOptions,
) -> Query {
    let mut query = Query::new();

    for (field, prefix) in [(FIELD_NAME, &filters.name), (FIELD_EMAIL, &filters.email)] {
        if let Some(prefix) = prefix.as_deref().filter(|p| !p.is_empty()) {
            query = query
                .filter(FieldFilter::gte(field, prefix))
                .filter(FieldFilter::lte(
                    field,
                    format!("{}{}", prefix, PREFIX_RANGE_SENTINEL),
                ));
        }
    }

    if let Some(gender) = filters.gender.filter(|g| g.is_specified()) {
        query = query.filter(FieldFilter::eq(FIELD_GENDER, gender.as_str()));
    }

    if let Some(sort_field) = sort_field {
        let direction = match sort_order {
            SortOrder::Asc => Direction::Ascending,
            SortOrder::Desc => Direction::Descending,
        };
        query = query.order_by(sort_field.field_name(), direction);
    }

    query
}

fn non_empty(url: Option<&str>) -> Option<&str> {
    url.filter(|u| !u.is_empty())
}

/// Concrete implementation of UserService over the two stores.
pub struct UserManager {
    documents: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
}

impl UserManager {
    /// Create new user service instance with its stores
    pub fn new(documents: Arc<dyn DocumentStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { documents, objects }
    }

    async fn insert_user(&self, mut form: UserFormData) -> AppResult<String> {
        let now = Utc::now();

        let picture_url = match form.profilepicture.take() {
            Some(picture) => Some(upload_profile_picture(self.objects.as_ref(), picture).await?),
            None => None,
        };

        let fields = codec::encode_new_user(&form, picture_url, now);
        self.documents.add(USERS_COLLECTION, fields).await
    }

    async fn list_users(
        &self,
        sort_field: Option<SortField>,
        sort_order: SortOrder,
        filters: &FilterOptions,
    ) -> AppResult<Vec<User>> {
        let query = build_user_query(sort_field, sort_order, filters);
        debug!("Fetching users with query: {:?}", query);

        let docs = self.documents.query(USERS_COLLECTION, &query).await?;
        docs.into_iter().map(codec::decode_user).collect()
    }

    async fn patch_user(
        &self,
        id: &str,
        mut form: UserFormData,
        current_picture: Option<&str>,
    ) -> AppResult<PictureCleanup> {
        let now = Utc::now();
        let current_picture = non_empty(current_picture);
        let mut cleanup = PictureCleanup::Skipped;
        let mut picture_url = current_picture.map(str::to_string);

        if let Some(picture) = form.profilepicture.take() {
            if let Some(old) = current_picture {
                cleanup = delete_profile_picture(self.objects.as_ref(), old).await;
            }
            picture_url = Some(upload_profile_picture(self.objects.as_ref(), picture).await?);
        }

        let patch = codec::encode_user_patch(&form, picture_url, now);
        self.documents.update(USERS_COLLECTION, id, patch).await?;

        Ok(cleanup)
    }

    async fn remove_user(&self, id: &str, picture: Option<&str>) -> AppResult<PictureCleanup> {
        let cleanup = match non_empty(picture) {
            Some(location) => delete_profile_picture(self.objects.as_ref(), location).await,
            None => PictureCleanup::Skipped,
        };

        self.documents.delete(USERS_COLLECTION, id).await?;
        Ok(cleanup)
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn add_user(&self, form: UserFormData) -> AppResult<String> {
        let id = self
            .insert_user(form)
            .await
            .inspect_err(|e| error!("Error adding user: {}", e))?;

        info!(user_id = %id, "User created");
        Ok(id)
    }

    async fn get_users(
        &self,
        sort_field: Option<SortField>,
        sort_order: SortOrder,
        filters: &FilterOptions,
    ) -> AppResult<Vec<User>> {
        let users = self
            .list_users(sort_field, sort_order, filters)
            .await
            .inspect_err(|e| error!("Error getting users: {}", e))?;

        debug!(count = users.len(), "Fetched users");
        Ok(users)
    }

    async fn get_user(&self, id: &str) -> AppResult<User> {
        let result = async {
            let doc = self
                .documents
                .get(USERS_COLLECTION, id)
                .await?
                .ok_or_not_found()?;
            codec::decode_user(doc)
        }
        .await;

        result.inspect_err(|e| error!(user_id = %id, "Error getting user: {}", e))
    }

    async fn update_user(
        &self,
        id: &str,
        form: UserFormData,
        current_picture: Option<&str>,
    ) -> AppResult<PictureCleanup> {
        let cleanup = self
            .patch_user(id, form, current_picture)
            .await
            .inspect_err(|e| error!(user_id = %id, "Error updating user: {}", e))?;

        info!(user_id = %id, "User updated");
        Ok(cleanup)
    }

    async fn delete_user(&self, id: &str, picture: Option<&str>) -> AppResult<PictureCleanup> {
        let cleanup = self
            .remove_user(id, picture)
            .await
            .inspect_err(|e| error!(user_id = %id, "Error deleting user: {}", e))?;

        info!(user_id = %id, "User deleted");
        Ok(cleanup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use common::AppError;
    use domain::{Gender, ProfilePicture, FIELD_CREATED_AT, FIELD_PROFILE_PICTURE, FIELD_UPDATED_AT};
    use mockall::predicate::eq;
    use mockall::Sequence;

    use crate::store::{Document, FieldValue, Fields, MockDocumentStore, MockObjectStore};

    const OLD_URL: &str = "memory://test/o/profile_photos%2F1_old.png?alt=media";
    const NEW_URL: &str = "memory://test/o/profile_photos%2F2_new.png?alt=media";

    fn form() -> UserFormData {
        UserFormData::new("Alice", "alice@example.com", "1990-04-01", Gender::Female)
    }

    fn picture() -> ProfilePicture {
        ProfilePicture::new("new.png", vec![0x89, 0x50, 0x4e, 0x47]).with_content_type("image/png")
    }

    fn stored(id: &str, name: &str, created_at: DateTime<Utc>) -> Document {
        let mut fields = Fields::new();
        fields.insert(FIELD_NAME.to_string(), FieldValue::from(name));
        fields.insert(FIELD_GENDER.to_string(), FieldValue::from("female"));
        fields.insert(FIELD_CREATED_AT.to_string(), FieldValue::from(created_at));
        fields.insert(FIELD_UPDATED_AT.to_string(), FieldValue::from(created_at));
        Document::new(id, fields)
    }

    fn service(documents: MockDocumentStore, objects: MockObjectStore) -> UserManager {
        UserManager::new(Arc::new(documents), Arc::new(objects))
    }

    #[test]
    fn test_build_query_prefix_filters() {
        let filters = FilterOptions {
            name: Some("Al".to_string()),
            email: Some(String::new()),
            gender: Some(Gender::Male),
            ..Default::default()
        };

        let query = build_user_query(None, SortOrder::Asc, &filters);

        let expected = Query::new()
            .filter(FieldFilter::gte("name", "Al"))
            .filter(FieldFilter::lte("name", "Al\u{f8ff}"))
            .filter(FieldFilter::eq("gender", "male"));
        assert_eq!(query, expected);
    }

    #[test]
    fn test_build_query_ignores_unspecified_gender_and_unused_filters() {
        let filters = FilterOptions {
            gender: Some(Gender::Unspecified),
            dob: Some("1990-04-01".to_string()),
            created_at: Some("2024-01-01".to_string()),
            ..Default::default()
        };

        assert_eq!(build_user_query(None, SortOrder::Asc, &filters), Query::new());
    }

    #[test]
    fn test_build_query_sorting() {
        let query = build_user_query(
            Some(SortField::CreatedAt),
            SortOrder::Desc,
            &FilterOptions::default(),
        );
        assert_eq!(
            query,
            Query::new().order_by("createdAt", Direction::Descending)
        );
    }

    #[tokio::test]
    async fn test_add_user_without_picture_skips_object_store() {
        let mut documents = MockDocumentStore::new();
        let mut objects = MockObjectStore::new();

        objects.expect_put().never();
        documents
            .expect_add()
            .times(1)
            .withf(|collection: &str, fields: &Fields| {
                collection == USERS_COLLECTION
                    && fields[FIELD_PROFILE_PICTURE].is_null()
                    && fields[FIELD_CREATED_AT] == fields[FIELD_UPDATED_AT]
            })
            .returning(|_, _| Ok("user-1".to_string()));

        let id = service(documents, objects).add_user(form()).await.unwrap();
        assert_eq!(id, "user-1");
    }

    #[tokio::test]
    async fn test_add_user_uploads_before_insert() {
        let mut seq = Sequence::new();
        let mut documents = MockDocumentStore::new();
        let mut objects = MockObjectStore::new();

        objects
            .expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|key: &str, data: &Vec<u8>, content_type: &String| {
                key.starts_with("profile_photos/")
                    && key.ends_with("_new.png")
                    && data.len() == 4
                    && content_type == "image/png"
            })
            .returning(|_, _, _| Ok(()));
        objects
            .expect_download_url()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(NEW_URL.to_string()));
        documents
            .expect_add()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|_, fields: &Fields| fields[FIELD_PROFILE_PICTURE] == FieldValue::from(NEW_URL))
            .returning(|_, _| Ok("user-1".to_string()));

        let result = service(documents, objects)
            .add_user(form().with_picture(picture()))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_add_user_upload_failure_writes_no_document() {
        let mut documents = MockDocumentStore::new();
        let mut objects = MockObjectStore::new();

        objects
            .expect_put()
            .returning(|_, _, _| Err(AppError::storage("bucket unavailable")));
        objects.expect_download_url().never();
        documents.expect_add().never();

        let result = service(documents, objects)
            .add_user(form().with_picture(picture()))
            .await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_get_users_passes_query_and_decodes() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let filters = FilterOptions {
            name: Some("Al".to_string()),
            ..Default::default()
        };
        let expected = build_user_query(Some(SortField::Name), SortOrder::Asc, &filters);

        let mut documents = MockDocumentStore::new();
        documents
            .expect_query()
            .times(1)
            .withf(move |collection: &str, query: &Query| {
                collection == USERS_COLLECTION && *query == expected
            })
            .returning(move |_, _| {
                Ok(vec![
                    stored("a", "Alan", created),
                    stored("b", "Alice", created),
                ])
            });

        let users = service(documents, MockObjectStore::new())
            .get_users(Some(SortField::Name), SortOrder::Asc, &filters)
            .await
            .unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Alan");
        assert_eq!(users[1].created_at, created);
    }

    #[tokio::test]
    async fn test_get_users_empty_result_is_ok() {
        let mut documents = MockDocumentStore::new();
        documents.expect_query().returning(|_, _| Ok(Vec::new()));

        let users = service(documents, MockObjectStore::new())
            .get_users(None, SortOrder::default(), &FilterOptions::default())
            .await
            .unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_get_users_fails_on_malformed_document() {
        let mut broken = stored("b", "Bob", Utc::now());
        broken.fields.remove(FIELD_CREATED_AT);

        let mut documents = MockDocumentStore::new();
        documents
            .expect_query()
            .returning(move |_, _| Ok(vec![broken.clone()]));

        let result = service(documents, MockObjectStore::new())
            .get_users(None, SortOrder::Asc, &FilterOptions::default())
            .await;
        assert!(matches!(result, Err(AppError::MalformedDocument { .. })));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut documents = MockDocumentStore::new();
        documents
            .expect_get()
            .with(eq(USERS_COLLECTION), eq("missing"))
            .returning(|_, _| Ok(None));

        let result = service(documents, MockObjectStore::new()).get_user("missing").await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_user_replaces_picture_in_order_despite_delete_failure() {
        let mut seq = Sequence::new();
        let mut documents = MockDocumentStore::new();
        let mut objects = MockObjectStore::new();

        objects
            .expect_delete()
            .with(eq(OLD_URL))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::NotFound));
        objects
            .expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        objects
            .expect_download_url()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(NEW_URL.to_string()));
        documents
            .expect_update()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|collection: &str, id: &str, patch: &Fields| {
                collection == USERS_COLLECTION
                    && id == "user-1"
                    && patch[FIELD_PROFILE_PICTURE] == FieldValue::from(NEW_URL)
                    && !patch.contains_key(FIELD_CREATED_AT)
            })
            .returning(|_, _, _| Ok(()));

        let cleanup = service(documents, objects)
            .update_user("user-1", form().with_picture(picture()), Some(OLD_URL))
            .await
            .unwrap();

        assert!(cleanup.is_failed());
        assert!(matches!(
            cleanup,
            PictureCleanup::Failed { ref location, .. } if location == OLD_URL
        ));
    }

    #[tokio::test]
    async fn test_update_user_without_new_picture_keeps_current_url() {
        let mut documents = MockDocumentStore::new();
        let mut objects = MockObjectStore::new();

        objects.expect_delete().never();
        objects.expect_put().never();
        documents
            .expect_update()
            .times(1)
            .withf(|_, _, patch: &Fields| patch[FIELD_PROFILE_PICTURE] == FieldValue::from(OLD_URL))
            .returning(|_, _, _| Ok(()));

        let cleanup = service(documents, objects)
            .update_user("user-1", form(), Some(OLD_URL))
            .await
            .unwrap();
        assert_eq!(cleanup, PictureCleanup::Skipped);
    }

    #[tokio::test]
    async fn test_update_user_upload_failure_skips_patch() {
        let mut documents = MockDocumentStore::new();
        let mut objects = MockObjectStore::new();

        objects.expect_delete().returning(|_| Ok(()));
        objects
            .expect_put()
            .returning(|_, _, _| Err(AppError::storage("quota exceeded")));
        documents.expect_update().never();

        let result = service(documents, objects)
            .update_user("user-1", form().with_picture(picture()), Some(OLD_URL))
            .await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_update_missing_user_propagates_not_found() {
        let mut documents = MockDocumentStore::new();
        documents
            .expect_update()
            .returning(|_, _, _| Err(AppError::NotFound));

        let result = service(documents, MockObjectStore::new())
            .update_user("missing", form(), None)
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_user_removes_document_even_if_picture_delete_fails() {
        let mut seq = Sequence::new();
        let mut documents = MockDocumentStore::new();
        let mut objects = MockObjectStore::new();

        objects
            .expect_delete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::storage("permission denied")));
        documents
            .expect_delete()
            .with(eq(USERS_COLLECTION), eq("user-1"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let cleanup = service(documents, objects)
            .delete_user("user-1", Some(OLD_URL))
            .await
            .unwrap();
        assert!(cleanup.is_failed());
    }

    #[tokio::test]
    async fn test_delete_user_without_picture() {
        let mut documents = MockDocumentStore::new();
        let mut objects = MockObjectStore::new();

        objects.expect_delete().never();
        documents.expect_delete().times(1).returning(|_, _| Ok(()));

        let cleanup = service(documents, objects)
            .delete_user("user-1", Some(""))
            .await
            .unwrap();
        assert_eq!(cleanup, PictureCleanup::Skipped);
    }

    #[tokio::test]
    async fn test_delete_user_propagates_document_failure() {
        let mut documents = MockDocumentStore::new();
        let mut objects = MockObjectStore::new();

        objects.expect_delete().returning(|_| Ok(()));
        documents
            .expect_delete()
            .returning(|_, _| Err(AppError::storage("unavailable")));

        let result = service(documents, objects).delete_user("user-1", Some(OLD_URL)).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
