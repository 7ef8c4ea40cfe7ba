//! Repository layer for database operations
//!
//! Create, read and update operations for categories, entries and entry
//! parts. Multi-statement writes run inside a transaction.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[derive(sqlx::FromRow)]
struct EntryWithCategoryRow {
    #[sqlx(flatten)]
    entry: EntryRow,
    category_name: Option<String>,
}

/// Insert the category or, when the name exists, refresh its access time.
/// One statement, so two writers racing on a new name end up sharing a row.
async fn upsert_category(
    conn: &mut SqliteConnection,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Category> {
    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (category_id, name, last_accessed, ord)
        VALUES (?, ?, ?, 0)
        ON CONFLICT(name) DO UPDATE SET last_accessed = excluded.last_accessed
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(now)
    .fetch_one(conn)
    .await?;

    Ok(category)
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Categories =====

    /// Get or create a category by exact name
    pub async fn upsert_category(&self, name: &str) -> Result<Category> {
        let mut conn = self.pool.acquire().await?;
        let category = upsert_category(&mut *conn, name, Utc::now()).await?;

        tracing::debug!("Upserted category: {} ({})", category.name, category.category_id);
        Ok(category)
    }

    pub async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    pub async fn get_category(&self, category_id: &str) -> Result<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE category_id = ?")
                .bind(category_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    /// List categories, explicit order first then most recently used
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories
            ORDER BY ord ASC, last_accessed DESC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    // ===== Entries =====

    /// Create an entry together with its category and its first part.
    ///
    /// All three writes share one transaction; nothing is visible unless
    /// every insert succeeds.
    pub async fn create_entry(&self, req: CreateEntryRequest) -> Result<(Entry, EntryPart)> {
        let entry_id = Uuid::new_v4().to_string();
        let part_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let genres = serde_json::to_string(&req.genres)?;

        let mut tx = self.pool.begin().await?;

        let category = upsert_category(&mut *tx, &req.category_name, now).await?;

        let entry_row = sqlx::query_as::<_, EntryRow>(
            r#"
            INSERT INTO entries (
                entry_id, category_id, title, cover_image_url, description, genres,
                release_year, release_status, status, tier, is_favorite, notes,
                completed_date, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&entry_id)
        .bind(&category.category_id)
        .bind(&req.title)
        .bind(&req.cover_image_url)
        .bind(&req.description)
        .bind(&genres)
        .bind(req.release_year)
        .bind(req.release_status.map(|s| s.as_str()))
        .bind(req.status.as_str())
        .bind(req.tier.map(|t| t.as_str()))
        .bind(&req.notes)
        .bind(&req.completed_date)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let part = &req.initial_part;
        let part_row = sqlx::query_as::<_, EntryPartRow>(
            r#"
            INSERT INTO entry_parts (
                part_id, entry_id, current_part, total_parts, part_type,
                current_progress, total_progress, progress_unit, status,
                completed_date, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&part_id)
        .bind(&entry_id)
        .bind(part.current_part)
        .bind(part.total_parts)
        .bind(part.part_type.as_str())
        .bind(part.current_progress)
        .bind(part.total_progress)
        .bind(part.progress_unit.map(|u| u.as_str()))
        .bind(part.status.as_str())
        .bind(&part.completed_date)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            "Created entry: {} in category {} with part {}",
            entry_id,
            category.category_id,
            part_id
        );

        Ok((Entry::try_from(entry_row)?, EntryPart::try_from(part_row)?))
    }

    /// Get an entry by ID
    pub async fn get_entry(&self, entry_id: &str) -> Result<Entry> {
        let row = sqlx::query_as::<_, EntryRow>("SELECT * FROM entries WHERE entry_id = ?")
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::EntryNotFound(entry_id.to_string()))?;

        Entry::try_from(row)
    }

    /// Get an entry by ID together with its category name
    pub async fn get_entry_with_category(&self, entry_id: &str) -> Result<(Entry, Option<String>)> {
        let row = sqlx::query_as::<_, EntryWithCategoryRow>(
            r#"
            SELECT e.*, c.name AS category_name
            FROM entries e
            LEFT JOIN categories c ON e.category_id = c.category_id
            WHERE e.entry_id = ?
            LIMIT 1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::EntryNotFound(entry_id.to_string()))?;

        Ok((Entry::try_from(row.entry)?, row.category_name))
    }

    /// List all entries joined with their category, newest change first
    pub async fn list_entry_summaries(&self) -> Result<Vec<EntrySummary>> {
        let rows = sqlx::query_as::<_, EntrySummaryRow>(
            r#"
            SELECT e.entry_id, e.title, e.status, e.cover_image_url, e.tier,
                   e.is_favorite, c.name AS category_name, e.updated_at
            FROM entries e
            LEFT JOIN categories c ON e.category_id = c.category_id
            ORDER BY e.updated_at DESC, e.entry_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        convert_rows(rows)
    }

    /// List favorite entries, newest change first
    pub async fn list_favorite_summaries(&self) -> Result<Vec<EntrySummary>> {
        let rows = sqlx::query_as::<_, EntrySummaryRow>(
            r#"
            SELECT e.entry_id, e.title, e.status, e.cover_image_url, e.tier,
                   e.is_favorite, c.name AS category_name, e.updated_at
            FROM entries e
            LEFT JOIN categories c ON e.category_id = c.category_id
            WHERE e.is_favorite = 1
            ORDER BY e.updated_at DESC, e.entry_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        convert_rows(rows)
    }

    pub async fn count_entries(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Apply a partial update to an entry.
    ///
    /// Every changed column and `updated_at` go out in a single UPDATE.
    /// Moving to `completed` without an explicit date fills
    /// `completed_date` only when it is still NULL.
    pub async fn update_entry(&self, entry_id: &str, update: &EntryUpdate) -> Result<Entry> {
        let now = Utc::now();
        let today = today();

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE entries SET updated_at = ");
        query.push_bind(now);

        if let Some(status) = update.status {
            query.push(", status = ").push_bind(status.as_str());
        }

        if let Some(tier) = update.tier {
            query.push(", tier = ").push_bind(tier.as_str());
        }

        if let Some(is_favorite) = update.is_favorite {
            query.push(", is_favorite = ").push_bind(is_favorite);
        }

        if let Some(notes) = &update.notes {
            query.push(", notes = ").push_bind(notes.as_str());
        }

        match (&update.completed_date, update.status) {
            (Some(date), _) => {
                query.push(", completed_date = ").push_bind(date.as_str());
            }
            (None, Some(Status::Completed)) => {
                query
                    .push(", completed_date = COALESCE(completed_date, ")
                    .push_bind(today.as_str())
                    .push(")");
            }
            _ => {}
        }

        query.push(" WHERE entry_id = ").push_bind(entry_id);

        let rows_affected = query.build().execute(&self.pool).await?.rows_affected();

        if rows_affected == 0 {
            return Err(AppError::EntryNotFound(entry_id.to_string()));
        }

        tracing::debug!("Updated entry: {}", entry_id);

        self.get_entry(entry_id).await
    }

    // ===== Entry parts =====

    /// List parts of an entry ordered by part number
    pub async fn list_entry_parts(&self, entry_id: &str) -> Result<Vec<EntryPart>> {
        let rows = sqlx::query_as::<_, EntryPartRow>(
            r#"
            SELECT * FROM entry_parts
            WHERE entry_id = ?
            ORDER BY current_part ASC, created_at ASC
            "#,
        )
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await?;

        convert_rows(rows)
    }

    pub async fn get_entry_part(&self, part_id: &str) -> Result<EntryPart> {
        let row = sqlx::query_as::<_, EntryPartRow>("SELECT * FROM entry_parts WHERE part_id = ?")
            .bind(part_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::PartNotFound(part_id.to_string()))?;

        EntryPart::try_from(row)
    }

    /// Update a part's counters and status.
    ///
    /// `current_progress` is clamped to `total_progress` and `current_part`
    /// to `total_parts`. The owning entry's `updated_at` is bumped so list
    /// ordering reflects the activity.
    pub async fn update_entry_part(
        &self,
        part_id: &str,
        update: &PartProgressUpdate,
    ) -> Result<EntryPart> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction holds the write lock before reading
        let touched = sqlx::query("UPDATE entry_parts SET updated_at = ? WHERE part_id = ?")
            .bind(now)
            .bind(part_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if touched == 0 {
            return Err(AppError::PartNotFound(part_id.to_string()));
        }

        let current = sqlx::query_as::<_, EntryPartRow>("SELECT * FROM entry_parts WHERE part_id = ?")
            .bind(part_id)
            .fetch_one(&mut *tx)
            .await?;

        let total_parts = update.total_parts.unwrap_or(current.total_parts);
        let current_part = update
            .current_part
            .unwrap_or(current.current_part)
            .min(total_parts);
        let total_progress = update.total_progress.or(current.total_progress);
        let mut current_progress = update.current_progress.unwrap_or(current.current_progress);
        if let Some(total) = total_progress {
            current_progress = current_progress.min(total);
        }
        let status = match update.status {
            Some(status) => status,
            None => current.status.parse()?,
        };
        let completed_date = match (status, current.completed_date) {
            (Status::Completed, None) => Some(today()),
            (_, existing) => existing,
        };

        let row = sqlx::query_as::<_, EntryPartRow>(
            r#"
            UPDATE entry_parts
            SET current_part = ?, total_parts = ?, current_progress = ?,
                total_progress = ?, status = ?, completed_date = ?, updated_at = ?
            WHERE part_id = ?
            RETURNING *
            "#,
        )
        .bind(current_part)
        .bind(total_parts)
        .bind(current_progress)
        .bind(total_progress)
        .bind(status.as_str())
        .bind(&completed_date)
        .bind(now)
        .bind(part_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE entries SET updated_at = ? WHERE entry_id = ?")
            .bind(now)
            .bind(&current.entry_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Updated entry part: {} of entry {}", part_id, current.entry_id);

        EntryPart::try_from(row)
    }
}
