//! Sample library
//!
//! A few well-known titles so a fresh install has something to show.

use crate::database::{PartType, ProgressUnit, ReleaseStatus, Status, Tier};
use crate::error::Result;
use crate::services::entries::EntriesService;
use crate::services::form::EntryForm;

fn sample_forms() -> Vec<EntryForm> {
    vec![
        EntryForm {
            title: "Attack on Titan".to_string(),
            category: "Anime".to_string(),
            status: Status::Completed,
            tier: Some(Tier::S),
            description: "A story about humanity fighting titans".to_string(),
            genres: "Action, Dark Fantasy".to_string(),
            release_year: "2013".to_string(),
            release_status: ReleaseStatus::Completed,
            part_type: PartType::Season,
            current_part: 4,
            total_parts: 4,
            total_units: 30,
            progress_unit: ProgressUnit::Episodes,
            current_progress: 30,
            ..Default::default()
        },
        EntryForm {
            title: "One Piece".to_string(),
            category: "Anime".to_string(),
            status: Status::Current,
            tier: Some(Tier::A),
            description: "Pirate adventure".to_string(),
            genres: "Adventure, Comedy".to_string(),
            release_year: "1999".to_string(),
            part_type: PartType::Arc,
            current_part: 1,
            total_parts: 1,
            total_units: 12,
            progress_unit: ProgressUnit::Episodes,
            current_progress: 3,
            ..Default::default()
        },
        EntryForm {
            title: "Breaking Bad".to_string(),
            category: "Drama".to_string(),
            status: Status::Completed,
            tier: Some(Tier::S),
            description: "A chemistry teacher turned meth manufacturer".to_string(),
            genres: "Crime, Drama".to_string(),
            release_year: "2008".to_string(),
            release_status: ReleaseStatus::Completed,
            part_type: PartType::Season,
            current_part: 5,
            total_parts: 5,
            total_units: 16,
            progress_unit: ProgressUnit::Episodes,
            current_progress: 16,
            ..Default::default()
        },
    ]
}

/// Create the sample entries when the library is empty.
///
/// Returns how many entries were created.
pub async fn seed_sample_library(service: &EntriesService) -> Result<usize> {
    if service.count_entries().await? > 0 {
        tracing::debug!("Library not empty, skipping sample data");
        return Ok(0);
    }

    let forms = sample_forms();
    let count = forms.len();
    for form in forms {
        service.create_entry(form).await?;
    }

    tracing::info!("Seeded {} sample entries", count);
    Ok(count)
}
