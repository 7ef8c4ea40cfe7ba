//! Database models
//!
//! Rust structs representing database entities.
//! Rows are read into flat `*Row` structs and converted into the typed
//! models, so an unknown enum value in storage surfaces as an error
//! instead of a panic.

use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

// ===== Enumerations =====

/// Lifecycle state of an entry or a part
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Current,
    #[default]
    Planned,
    Completed,
    Dropped,
    Hold,
}

impl Status {
    /// All statuses in display order
    pub const ALL: [Status; 5] = [
        Status::Current,
        Status::Planned,
        Status::Completed,
        Status::Dropped,
        Status::Hold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Current => "current",
            Status::Planned => "planned",
            Status::Completed => "completed",
            Status::Dropped => "dropped",
            Status::Hold => "hold",
        }
    }

    /// Human readable section title
    pub fn label(&self) -> &'static str {
        match self {
            Status::Current => "Currently Watching",
            Status::Planned => "Planned",
            Status::Completed => "Completed",
            Status::Dropped => "Dropped",
            Status::Hold => "On Hold",
        }
    }
}

impl FromStr for Status {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(Status::Current),
            "planned" => Ok(Status::Planned),
            "completed" => Ok(Status::Completed),
            "dropped" => Ok(Status::Dropped),
            "hold" => Ok(Status::Hold),
            other => Err(AppError::InvalidValue(format!("unknown status '{}'", other))),
        }
    }
}

/// Publication state of the media itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Ongoing => "ongoing",
            ReleaseStatus::Completed => "completed",
            ReleaseStatus::Hiatus => "hiatus",
            ReleaseStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ReleaseStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ongoing" => Ok(ReleaseStatus::Ongoing),
            "completed" => Ok(ReleaseStatus::Completed),
            "hiatus" => Ok(ReleaseStatus::Hiatus),
            "cancelled" => Ok(ReleaseStatus::Cancelled),
            other => Err(AppError::InvalidValue(format!(
                "unknown release status '{}'",
                other
            ))),
        }
    }
}

/// User-assigned rank, S best through E worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
    E,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
            Tier::E => "E",
        }
    }
}

impl FromStr for Tier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" => Ok(Tier::S),
            "A" => Ok(Tier::A),
            "B" => Ok(Tier::B),
            "C" => Ok(Tier::C),
            "D" => Ok(Tier::D),
            "E" => Ok(Tier::E),
            other => Err(AppError::InvalidValue(format!("unknown tier '{}'", other))),
        }
    }
}

/// How an entry is subdivided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartType {
    Season,
    Volume,
    Arc,
    Part,
}

impl PartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartType::Season => "season",
            PartType::Volume => "volume",
            PartType::Arc => "arc",
            PartType::Part => "part",
        }
    }
}

impl FromStr for PartType {
    type Err = AppError;

    // The older creation screen sent capitalized names ("Season").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "season" => Ok(PartType::Season),
            "volume" => Ok(PartType::Volume),
            "arc" => Ok(PartType::Arc),
            "part" => Ok(PartType::Part),
            _ => Err(AppError::InvalidValue(format!("unknown part type '{}'", s))),
        }
    }
}

/// Unit counted by a part's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressUnit {
    Episodes,
    Chapters,
    Pages,
}

impl ProgressUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressUnit::Episodes => "episodes",
            ProgressUnit::Chapters => "chapters",
            ProgressUnit::Pages => "pages",
        }
    }
}

impl FromStr for ProgressUnit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "episodes" => Ok(ProgressUnit::Episodes),
            "chapters" => Ok(ProgressUnit::Chapters),
            "pages" => Ok(ProgressUnit::Pages),
            _ => Err(AppError::InvalidValue(format!(
                "unknown progress unit '{}'",
                s
            ))),
        }
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display_as_str!(Status, ReleaseStatus, Tier, PartType, ProgressUnit);

/// Format of `completed_date` columns
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current UTC date in [`DATE_FORMAT`]
pub fn today() -> String {
    Utc::now().format(DATE_FORMAT).to_string()
}

/// Whether `value` is a calendar date in [`DATE_FORMAT`]
pub fn is_valid_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok()
}

fn parse_optional<T: FromStr<Err = AppError>>(value: Option<String>) -> Result<Option<T>, AppError> {
    value.as_deref().map(str::parse).transpose()
}

// ===== Categories =====

/// User-defined category label (anime, manga, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub category_id: String,
    pub name: String,
    pub last_accessed: DateTime<Utc>,
    pub ord: i64,
}

// ===== Entries =====

#[derive(Debug, Clone, FromRow)]
pub struct EntryRow {
    pub entry_id: String,
    pub category_id: String,
    pub title: String,
    pub cover_image_url: Option<String>,
    pub description: Option<String>,
    pub genres: Option<String>,
    pub release_year: Option<i64>,
    pub release_status: Option<String>,
    pub status: Option<String>,
    pub tier: Option<String>,
    pub is_favorite: bool,
    pub notes: Option<String>,
    pub completed_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One tracked media title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub entry_id: String,
    pub category_id: String,
    pub title: String,
    pub cover_image_url: Option<String>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub release_year: Option<i64>,
    pub release_status: Option<ReleaseStatus>,
    pub status: Status,
    pub tier: Option<Tier>,
    pub is_favorite: bool,
    pub notes: Option<String>,
    /// ISO-8601 date the entry was finished
    pub completed_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for Entry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let genres = match row.genres.as_deref() {
            Some(json) if !json.trim().is_empty() => serde_json::from_str(json)?,
            _ => Vec::new(),
        };

        Ok(Entry {
            entry_id: row.entry_id,
            category_id: row.category_id,
            title: row.title,
            cover_image_url: row.cover_image_url,
            description: row.description,
            genres,
            release_year: row.release_year,
            release_status: parse_optional(row.release_status)?,
            status: parse_optional(row.status)?.unwrap_or_default(),
            tier: parse_optional(row.tier)?,
            is_favorite: row.is_favorite,
            notes: row.notes,
            completed_date: row.completed_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct EntrySummaryRow {
    pub entry_id: String,
    pub title: String,
    pub status: Option<String>,
    pub cover_image_url: Option<String>,
    pub tier: Option<String>,
    pub is_favorite: bool,
    pub category_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// List-view projection of an entry joined with its category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub entry_id: String,
    pub title: String,
    /// `None` when the stored row carries no status; grouped as planned
    pub status: Option<Status>,
    pub cover_image_url: Option<String>,
    pub tier: Option<Tier>,
    pub is_favorite: bool,
    pub category_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EntrySummaryRow> for EntrySummary {
    type Error = AppError;

    fn try_from(row: EntrySummaryRow) -> Result<Self, Self::Error> {
        Ok(EntrySummary {
            entry_id: row.entry_id,
            title: row.title,
            status: parse_optional(row.status)?,
            cover_image_url: row.cover_image_url,
            tier: parse_optional(row.tier)?,
            is_favorite: row.is_favorite,
            category_name: row.category_name,
            updated_at: row.updated_at,
        })
    }
}

/// Create entry request; the category is referenced by name and upserted
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntryRequest {
    pub category_name: String,
    pub title: String,
    pub cover_image_url: Option<String>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub release_year: Option<i64>,
    pub release_status: Option<ReleaseStatus>,
    pub status: Status,
    pub tier: Option<Tier>,
    pub notes: Option<String>,
    pub completed_date: Option<String>,
    pub initial_part: CreatePartRequest,
}

/// Partial entry update; `None` means "leave unchanged"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryUpdate {
    pub status: Option<Status>,
    pub tier: Option<Tier>,
    pub is_favorite: Option<bool>,
    pub notes: Option<String>,
    pub completed_date: Option<String>,
}

impl EntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.tier.is_none()
            && self.is_favorite.is_none()
            && self.notes.is_none()
            && self.completed_date.is_none()
    }
}

// ===== Entry parts =====

#[derive(Debug, Clone, FromRow)]
pub struct EntryPartRow {
    pub part_id: String,
    pub entry_id: String,
    pub current_part: i64,
    pub total_parts: i64,
    pub part_type: String,
    pub current_progress: i64,
    pub total_progress: Option<i64>,
    pub progress_unit: Option<String>,
    pub status: String,
    pub completed_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A season/volume/arc/part of an entry with its own progress counters.
///
/// `current_part`/`total_parts` count parts; `current_progress` and
/// `total_progress` count `progress_unit`s inside the current part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPart {
    pub part_id: String,
    pub entry_id: String,
    pub current_part: i64,
    pub total_parts: i64,
    pub part_type: PartType,
    pub current_progress: i64,
    pub total_progress: Option<i64>,
    pub progress_unit: Option<ProgressUnit>,
    pub status: Status,
    pub completed_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EntryPartRow> for EntryPart {
    type Error = AppError;

    fn try_from(row: EntryPartRow) -> Result<Self, Self::Error> {
        Ok(EntryPart {
            part_id: row.part_id,
            entry_id: row.entry_id,
            current_part: row.current_part,
            total_parts: row.total_parts,
            part_type: row.part_type.parse()?,
            current_progress: row.current_progress,
            total_progress: row.total_progress,
            progress_unit: parse_optional(row.progress_unit)?,
            status: row.status.parse()?,
            completed_date: row.completed_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Initial part state supplied with a new entry
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePartRequest {
    pub current_part: i64,
    pub total_parts: i64,
    pub part_type: PartType,
    pub current_progress: i64,
    pub total_progress: Option<i64>,
    pub progress_unit: Option<ProgressUnit>,
    pub status: Status,
    pub completed_date: Option<String>,
}

/// Partial progress update for one part
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PartProgressUpdate {
    pub current_part: Option<i64>,
    pub total_parts: Option<i64>,
    pub current_progress: Option<i64>,
    pub total_progress: Option<i64>,
    pub status: Option<Status>,
}

// ===== Aggregates =====

/// Everything the detail screen shows for one entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryDetail {
    pub entry: Entry,
    pub category_name: Option<String>,
    /// Ordered by `current_part`
    pub parts: Vec<EntryPart>,
    /// 0..=100
    pub overall_progress: u8,
}
