//! Entries service
//!
//! High-level operations used by the presentation layer: grouped listing,
//! entry details with overall progress, validated creation, partial
//! updates and part progress edits. Reads are served from the query cache
//! when fresh; every write invalidates the keys it changed.

use crate::cache::{CachedQuery, Mutation, QueryCache, QueryKey};
use crate::database::{
    is_valid_date, Category, EntryDetail, EntryPart, EntrySummary, EntryUpdate,
    PartProgressUpdate, Repository,
};
use crate::error::{AppError, FieldError, Result};
use crate::services::edit_session::EditSession;
use crate::services::form::EntryForm;
use crate::services::progress::{group_by_status, overall_progress, GroupedEntries};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Service for managing tracked entries
#[derive(Clone)]
pub struct EntriesService {
    repo: Repository,
    cache: QueryCache,
    /// Held while a creation form is being written
    submission: Arc<Mutex<()>>,
}

impl EntriesService {
    pub fn new(repo: Repository, cache: QueryCache) -> Self {
        Self {
            repo,
            cache,
            submission: Arc::new(Mutex::new(())),
        }
    }

    async fn invalidate(&self, mutation: Mutation<'_>) {
        self.cache.invalidate(&mutation.invalidation_keys()).await;
    }

    /// Entries grouped by status, newest change first in each group
    pub async fn list_entries_grouped(&self) -> Result<GroupedEntries> {
        if let Some(CachedQuery::Grouped(grouped)) = self.cache.get(&QueryKey::AllEntries).await {
            return Ok(grouped);
        }

        let generation = self.cache.generation();
        let summaries = self.repo.list_entry_summaries().await?;
        let grouped = group_by_status(summaries);

        self.cache
            .insert(
                QueryKey::AllEntries,
                CachedQuery::Grouped(grouped.clone()),
                generation,
            )
            .await;

        Ok(grouped)
    }

    /// Favorite entries, newest change first
    pub async fn list_favorites(&self) -> Result<Vec<EntrySummary>> {
        if let Some(CachedQuery::Summaries(favorites)) = self.cache.get(&QueryKey::Favorites).await {
            return Ok(favorites);
        }

        let generation = self.cache.generation();
        let favorites = self.repo.list_favorite_summaries().await?;

        self.cache
            .insert(
                QueryKey::Favorites,
                CachedQuery::Summaries(favorites.clone()),
                generation,
            )
            .await;

        Ok(favorites)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        if let Some(CachedQuery::Categories(categories)) =
            self.cache.get(&QueryKey::Categories).await
        {
            return Ok(categories);
        }

        let generation = self.cache.generation();
        let categories = self.repo.list_categories().await?;

        self.cache
            .insert(
                QueryKey::Categories,
                CachedQuery::Categories(categories.clone()),
                generation,
            )
            .await;

        Ok(categories)
    }

    pub async fn count_entries(&self) -> Result<i64> {
        self.repo.count_entries().await
    }

    /// Entry, category name, parts and overall progress for the detail screen
    pub async fn get_entry_detail(&self, entry_id: &str) -> Result<EntryDetail> {
        let key = QueryKey::EntryDetail(entry_id.to_string());

        if let Some(CachedQuery::Detail(detail)) = self.cache.get(&key).await {
            return Ok(*detail);
        }

        let generation = self.cache.generation();
        let (entry, category_name) = self.repo.get_entry_with_category(entry_id).await?;
        let parts = self.repo.list_entry_parts(entry_id).await?;
        let detail = EntryDetail {
            overall_progress: overall_progress(&parts),
            entry,
            category_name,
            parts,
        };

        self.cache
            .insert(key, CachedQuery::Detail(Box::new(detail.clone())), generation)
            .await;

        Ok(detail)
    }

    /// Validate the creation form and store the entry with its first part.
    ///
    /// Returns the new entry id. Validation happens before any write; a
    /// second submission while one is in flight is rejected.
    pub async fn create_entry(&self, form: EntryForm) -> Result<String> {
        let req = form.into_request()?;

        let _guard = self.submission.try_lock().map_err(|_| {
            tracing::warn!("Rejected duplicate submission for: {}", req.title);
            AppError::SubmissionInProgress
        })?;

        tracing::info!("Creating new entry: {} ({})", req.title, req.category_name);

        let (entry, _) = self.repo.create_entry(req).await?;

        self.invalidate(Mutation::CreateEntry).await;

        tracing::info!("Entry created successfully: {}", entry.entry_id);

        Ok(entry.entry_id)
    }

    /// Apply only the changed fields of an entry and return the fresh detail
    pub async fn apply_entry_update(
        &self,
        entry_id: &str,
        update: EntryUpdate,
    ) -> Result<EntryDetail> {
        if update.is_empty() {
            return self.get_entry_detail(entry_id).await;
        }

        if let Some(date) = &update.completed_date {
            if !is_valid_date(date) {
                return Err(AppError::validation(
                    "completed_date",
                    "Completed date must be a date (YYYY-MM-DD)",
                ));
            }
        }

        tracing::debug!("Updating entry: {} with {:?}", entry_id, update);

        self.repo.update_entry(entry_id, &update).await?;

        self.invalidate(Mutation::UpdateEntry { entry_id }).await;

        self.get_entry_detail(entry_id).await
    }

    /// Persist the pending edits of a detail screen session.
    ///
    /// On success the session is rebased onto the saved entry; on failure
    /// the draft is kept so the user can retry.
    pub async fn save_edit_session(&self, session: &mut EditSession) -> Result<EntryDetail> {
        let update = session.diff();
        let detail = self
            .apply_entry_update(session.entry_id(), update)
            .await?;

        session.rebase(&detail);
        Ok(detail)
    }

    /// Persist progress edits of one part
    pub async fn update_part_progress(
        &self,
        part_id: &str,
        update: PartProgressUpdate,
    ) -> Result<EntryPart> {
        let mut errors = Vec::new();
        if matches!(update.total_parts, Some(total) if total < 1) {
            errors.push(FieldError::new("total_parts", "Total parts must be at least 1"));
        }
        if matches!(update.current_part, Some(current) if current < 0) {
            errors.push(FieldError::new("current_part", "Current part cannot be negative"));
        }
        if matches!(update.current_progress, Some(current) if current < 0) {
            errors.push(FieldError::new(
                "current_progress",
                "Current progress cannot be negative",
            ));
        }
        if matches!(update.total_progress, Some(total) if total < 0) {
            errors.push(FieldError::new("total_progress", "Total progress cannot be negative"));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let part = self.repo.update_entry_part(part_id, &update).await?;

        self.invalidate(Mutation::UpdatePart {
            entry_id: &part.entry_id,
        })
        .await;

        Ok(part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, ProgressUnit, Status, Tier};
    use chrono::Utc;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::time::Duration;

    async fn create_test_service() -> EntriesService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        EntriesService::new(Repository::new(pool), QueryCache::new(Duration::from_secs(120)))
    }

    fn form(title: &str, category: &str, status: Status) -> EntryForm {
        EntryForm {
            title: title.to_string(),
            category: category.to_string(),
            status,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_detail() {
        let service = create_test_service().await;

        let entry_id = service
            .create_entry(EntryForm {
                total_units: 12,
                progress_unit: ProgressUnit::Episodes,
                current_progress: 3,
                ..form("One Piece", "anime", Status::Current)
            })
            .await
            .unwrap();

        let detail = service.get_entry_detail(&entry_id).await.unwrap();
        assert_eq!(detail.entry.title, "One Piece");
        assert_eq!(detail.category_name.as_deref(), Some("anime"));
        assert_eq!(detail.parts.len(), 1);
        assert_eq!(detail.parts[0].current_progress, 3);
        assert_eq!(detail.parts[0].total_progress, Some(12));
        assert_eq!(detail.overall_progress, 25);
    }

    #[tokio::test]
    async fn test_empty_title_writes_nothing() {
        let service = create_test_service().await;

        let result = service.create_entry(form("", "anime", Status::Planned)).await;

        let err = result.unwrap_err();
        assert_eq!(err.field_errors()[0].field, "title");
        assert_eq!(service.count_entries().await.unwrap(), 0);
        assert!(service.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_submission_rejected() {
        let service = create_test_service().await;

        let _held = service.submission.try_lock().unwrap();
        let result = service
            .create_entry(form("Naruto", "anime", Status::Planned))
            .await;

        assert!(matches!(result, Err(AppError::SubmissionInProgress)));
        assert_eq!(service.count_entries().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_invalidates_grouped_listing() {
        let service = create_test_service().await;

        assert!(service.list_entries_grouped().await.unwrap().is_empty());

        service
            .create_entry(form("Dune", "light novel", Status::Planned))
            .await
            .unwrap();

        let grouped = service.list_entries_grouped().await.unwrap();
        assert_eq!(grouped.total(), 1);
        assert_eq!(grouped.count(Status::Planned), 1);
    }

    #[tokio::test]
    async fn test_update_invalidates_detail_and_listing() {
        let service = create_test_service().await;
        let entry_id = service
            .create_entry(form("Steins;Gate", "visual novel", Status::Current))
            .await
            .unwrap();

        // Warm both caches
        service.get_entry_detail(&entry_id).await.unwrap();
        service.list_entries_grouped().await.unwrap();

        let detail = service
            .apply_entry_update(
                &entry_id,
                EntryUpdate {
                    status: Some(Status::Completed),
                    tier: Some(Tier::S),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(detail.entry.status, Status::Completed);
        assert_eq!(
            detail.entry.completed_date,
            Some(Utc::now().format("%Y-%m-%d").to_string())
        );

        let cached = service.get_entry_detail(&entry_id).await.unwrap();
        assert_eq!(cached.entry.tier, Some(Tier::S));

        let grouped = service.list_entries_grouped().await.unwrap();
        assert_eq!(grouped.count(Status::Current), 0);
        assert_eq!(grouped.count(Status::Completed), 1);
    }

    #[tokio::test]
    async fn test_completing_twice_keeps_date() {
        let service = create_test_service().await;
        let entry_id = service
            .create_entry(form("Clannad", "visual novel", Status::Current))
            .await
            .unwrap();

        let complete = EntryUpdate {
            status: Some(Status::Completed),
            ..Default::default()
        };

        let first = service
            .apply_entry_update(&entry_id, complete.clone())
            .await
            .unwrap();
        let second = service.apply_entry_update(&entry_id, complete).await.unwrap();

        assert_eq!(
            first.entry.completed_date,
            Some(Utc::now().format("%Y-%m-%d").to_string())
        );
        assert_eq!(first.entry.completed_date, second.entry.completed_date);
    }

    #[tokio::test]
    async fn test_malformed_completed_date_rejected() {
        let service = create_test_service().await;
        let entry_id = service
            .create_entry(EntryForm {
                completed_date: "2019-06-01".to_string(),
                ..form("Mob Psycho 100", "anime", Status::Completed)
            })
            .await
            .unwrap();

        let err = service
            .apply_entry_update(
                &entry_id,
                EntryUpdate {
                    completed_date: Some("garbage".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert_eq!(err.field_errors()[0].field, "completed_date");

        let detail = service.get_entry_detail(&entry_id).await.unwrap();
        assert_eq!(detail.entry.completed_date.as_deref(), Some("2019-06-01"));
    }

    #[tokio::test]
    async fn test_malformed_completed_date_writes_nothing() {
        let service = create_test_service().await;

        let err = service
            .create_entry(EntryForm {
                completed_date: "next tuesday-ish".to_string(),
                ..form("Frieren", "anime", Status::Completed)
            })
            .await
            .unwrap_err();

        assert_eq!(err.field_errors()[0].field, "completed_date");
        assert_eq!(service.count_entries().await.unwrap(), 0);
        assert!(service.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_read_before_write_is_not_cached() {
        let service = create_test_service().await;

        // A listing read that started before the creation below committed
        let generation = service.cache.generation();
        let stale = group_by_status(service.repo.list_entry_summaries().await.unwrap());

        service
            .create_entry(form("Vinland Saga", "manga", Status::Current))
            .await
            .unwrap();

        service
            .cache
            .insert(QueryKey::AllEntries, CachedQuery::Grouped(stale), generation)
            .await;

        assert_eq!(service.list_entries_grouped().await.unwrap().total(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_entry() {
        let service = create_test_service().await;

        let err = service
            .apply_entry_update(
                "missing",
                EntryUpdate {
                    is_favorite: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
        assert!(matches!(
            service.get_entry_detail("missing").await,
            Err(AppError::EntryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_edit_session() {
        let service = create_test_service().await;
        let entry_id = service
            .create_entry(form("Monogatari", "anime", Status::Current))
            .await
            .unwrap();

        let detail = service.get_entry_detail(&entry_id).await.unwrap();
        let mut session = EditSession::new(&detail);
        session.toggle_favorite();
        session.set_notes("Watch in broadcast order");

        let saved = service.save_edit_session(&mut session).await.unwrap();

        assert!(saved.entry.is_favorite);
        assert_eq!(saved.entry.notes.as_deref(), Some("Watch in broadcast order"));
        assert!(!session.has_changes());

        let favorites = service.list_favorites().await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].entry_id, entry_id);
    }

    #[tokio::test]
    async fn test_update_part_progress_refreshes_detail() {
        let service = create_test_service().await;
        let entry_id = service
            .create_entry(form("Haikyu", "anime", Status::Current))
            .await
            .unwrap();

        let detail = service.get_entry_detail(&entry_id).await.unwrap();
        assert_eq!(detail.overall_progress, 0);
        let part_id = detail.parts[0].part_id.clone();

        service
            .update_part_progress(
                &part_id,
                PartProgressUpdate {
                    current_progress: Some(6),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let detail = service.get_entry_detail(&entry_id).await.unwrap();
        assert_eq!(detail.parts[0].current_progress, 6);
        assert_eq!(detail.overall_progress, 50);
    }

    #[tokio::test]
    async fn test_update_part_progress_validation() {
        let service = create_test_service().await;

        let err = service
            .update_part_progress(
                "any",
                PartProgressUpdate {
                    total_parts: Some(0),
                    current_progress: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.field_errors().len(), 2);
    }
}
