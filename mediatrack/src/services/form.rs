//! Entry creation form
//!
//! Raw values as typed on the creation screen, their validation, and the
//! conversion into a repository request.

use crate::config::{MAX_CATEGORY_LENGTH, MAX_RELEASE_YEAR, MAX_TITLE_LENGTH, MIN_RELEASE_YEAR};
use crate::database::{
    is_valid_date, today, CreateEntryRequest, CreatePartRequest, PartType, ProgressUnit,
    ReleaseStatus, Status, Tier,
};
use crate::error::{AppError, FieldError, Result};
use chrono::{Datelike, Utc};
use serde::Deserialize;

/// Values of the "Add New Entry" screen
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EntryForm {
    pub title: String,
    pub category: String,
    pub status: Status,
    pub tier: Option<Tier>,
    pub notes: String,
    pub completed_date: String,
    pub cover_image_url: String,
    pub description: String,
    /// Comma separated, e.g. "Action, Drama"
    pub genres: String,
    /// Free text; anything non-numeric is stored as no year
    pub release_year: String,
    pub release_status: ReleaseStatus,
    pub part_type: PartType,
    pub current_part: i64,
    pub total_parts: i64,
    /// Units in the current part (episodes, chapters, pages)
    pub total_units: i64,
    pub progress_unit: ProgressUnit,
    pub current_progress: i64,
}

impl Default for EntryForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            category: String::new(),
            status: Status::Planned,
            tier: Some(Tier::B),
            notes: String::new(),
            completed_date: String::new(),
            cover_image_url: String::new(),
            description: String::new(),
            genres: String::new(),
            release_year: Utc::now().year().to_string(),
            release_status: ReleaseStatus::Ongoing,
            part_type: PartType::Season,
            current_part: 1,
            total_parts: 1,
            total_units: 12,
            progress_unit: ProgressUnit::Episodes,
            current_progress: 0,
        }
    }
}

/// Split a comma separated genre list, trimming and dropping empties
pub fn parse_genres(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl EntryForm {
    /// Every field error at once, empty when the form can be submitted
    pub fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let title = self.title.trim();
        let category = self.category.trim();

        if title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title.chars().count() > MAX_TITLE_LENGTH {
            errors.push(FieldError::new(
                "title",
                format!("Title must be at most {} characters", MAX_TITLE_LENGTH),
            ));
        }

        if category.is_empty() {
            errors.push(FieldError::new("category", "Category is required"));
        } else if category.chars().count() > MAX_CATEGORY_LENGTH {
            errors.push(FieldError::new(
                "category",
                format!("Category must be at most {} characters", MAX_CATEGORY_LENGTH),
            ));
        }

        if let Some(year) = self.parsed_release_year() {
            if !(MIN_RELEASE_YEAR..=MAX_RELEASE_YEAR).contains(&year) {
                errors.push(FieldError::new(
                    "release_year",
                    format!(
                        "Release year must be between {} and {}",
                        MIN_RELEASE_YEAR, MAX_RELEASE_YEAR
                    ),
                ));
            }
        }

        if let Some(date) = non_empty(&self.completed_date) {
            if !is_valid_date(&date) {
                errors.push(FieldError::new(
                    "completed_date",
                    "Completed date must be a date (YYYY-MM-DD)",
                ));
            }
        }

        if self.total_parts < 1 {
            errors.push(FieldError::new("total_parts", "Total parts must be at least 1"));
        }
        if self.current_part < 0 {
            errors.push(FieldError::new("current_part", "Current part cannot be negative"));
        }
        if self.total_units < 0 {
            errors.push(FieldError::new("total_units", "Total units cannot be negative"));
        }
        if self.current_progress < 0 {
            errors.push(FieldError::new(
                "current_progress",
                "Current progress cannot be negative",
            ));
        }

        errors
    }

    pub fn validate(&self) -> Result<()> {
        let errors = self.field_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }

    fn parsed_release_year(&self) -> Option<i64> {
        self.release_year.trim().parse().ok()
    }

    /// Validate and convert into a repository request.
    ///
    /// Progress counters are clamped into their totals the way the
    /// sliders on the screen are. An entry created as completed without a
    /// date is dated today.
    pub fn into_request(self) -> Result<CreateEntryRequest> {
        self.validate()?;

        let completed_date = match non_empty(&self.completed_date) {
            None if self.status == Status::Completed => Some(today()),
            date => date,
        };
        let current_part = self.current_part.min(self.total_parts);
        let current_progress = self.current_progress.min(self.total_units);

        Ok(CreateEntryRequest {
            category_name: self.category.trim().to_string(),
            title: self.title.trim().to_string(),
            cover_image_url: non_empty(&self.cover_image_url),
            description: non_empty(&self.description),
            genres: parse_genres(&self.genres),
            release_year: self.parsed_release_year(),
            release_status: Some(self.release_status),
            status: self.status,
            tier: self.tier,
            notes: non_empty(&self.notes),
            completed_date: completed_date.clone(),
            initial_part: CreatePartRequest {
                current_part,
                total_parts: self.total_parts,
                part_type: self.part_type,
                current_progress,
                total_progress: Some(self.total_units),
                progress_unit: Some(self.progress_unit),
                status: self.status,
                completed_date,
            },
        })
    }
}
