//! Integration tests for mediatrack
//!
//! These tests verify end-to-end functionality against a file database:
//! - Entry creation, detail and grouped listing
//! - Category reuse, including concurrent creation in a new category
//! - Completion dates and persistence across reopening

use mediatrack::app::{self, AppState};
use mediatrack::config::AppConfig;
use mediatrack::database::{
    create_pool, CreateEntryRequest, CreatePartRequest, EntryUpdate, PartType, ProgressUnit,
    Repository, Status,
};
use mediatrack::error::ErrorKind;
use mediatrack::services::{EditSession, EntryForm};
use std::collections::HashSet;
use tempfile::TempDir;

/// Helper to open a fresh library in a temporary directory
async fn create_test_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = AppConfig {
        data_dir: temp_dir.path().join("library"),
        database_file: "test.db".to_string(),
    };

    let state = app::setup(config).await.unwrap();
    (state, temp_dir)
}

fn form(title: &str, category: &str, status: Status) -> EntryForm {
    EntryForm {
        title: title.to_string(),
        category: category.to_string(),
        status,
        ..Default::default()
    }
}

fn raw_request(title: &str, category: &str) -> CreateEntryRequest {
    CreateEntryRequest {
        category_name: category.to_string(),
        title: title.to_string(),
        cover_image_url: None,
        description: None,
        genres: Vec::new(),
        release_year: None,
        release_status: None,
        status: Status::Planned,
        tier: None,
        notes: None,
        completed_date: None,
        initial_part: CreatePartRequest {
            current_part: 0,
            total_parts: 1,
            part_type: PartType::Volume,
            current_progress: 0,
            total_progress: None,
            progress_unit: Some(ProgressUnit::Chapters),
            status: Status::Planned,
            completed_date: None,
        },
    }
}

#[tokio::test]
async fn test_one_piece_end_to_end() {
    let (state, _temp) = create_test_state().await;
    let service = &state.entries_service;

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
    assert_eq!(detail.parts.len(), 1);
    assert_eq!(detail.parts[0].current_progress, 3);
    assert_eq!(detail.parts[0].total_progress, Some(12));
    assert_eq!(detail.parts[0].progress_unit, Some(ProgressUnit::Episodes));
    assert_eq!(detail.overall_progress, 25);

    let grouped = service.list_entries_grouped().await.unwrap();
    assert_eq!(grouped.get(Status::Current)[0].entry_id, entry_id);
}

#[tokio::test]
async fn test_genres_are_normalized() {
    let (state, _temp) = create_test_state().await;
    let service = &state.entries_service;

    let entry_id = service
        .create_entry(EntryForm {
            genres: "Action, Drama,  , Comedy".to_string(),
            ..form("Gintama", "anime", Status::Planned)
        })
        .await
        .unwrap();

    let detail = service.get_entry_detail(&entry_id).await.unwrap();
    assert_eq!(detail.entry.genres, vec!["Action", "Drama", "Comedy"]);
}

#[tokio::test]
async fn test_category_reused_by_exact_name() {
    let (state, _temp) = create_test_state().await;
    let service = &state.entries_service;

    let first = service
        .create_entry(form("Berserk", "manga", Status::Current))
        .await
        .unwrap();
    let second = service
        .create_entry(form("Vagabond", " manga ", Status::Planned))
        .await
        .unwrap();

    let first = service.get_entry_detail(&first).await.unwrap();
    let second = service.get_entry_detail(&second).await.unwrap();
    assert_eq!(first.entry.category_id, second.entry.category_id);
    assert_eq!(service.list_categories().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_creation_in_new_category() {
    let (state, _temp) = create_test_state().await;
    let repo = state.db.clone();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.create_entry(raw_request(&format!("Volume {}", i), "light novel"))
                    .await
            })
        })
        .collect();

    let mut category_ids = HashSet::new();
    for handle in handles {
        let (entry, _) = handle.await.unwrap().unwrap();
        category_ids.insert(entry.category_id);
    }

    assert_eq!(category_ids.len(), 1);
    assert_eq!(repo.list_categories().await.unwrap().len(), 1);
    assert_eq!(repo.count_entries().await.unwrap(), 8);
}

#[tokio::test]
async fn test_validation_blocks_write() {
    let (state, _temp) = create_test_state().await;
    let service = &state.entries_service;

    let err = service
        .create_entry(form("", "anime", Status::Planned))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.user_message(), "Title is required");
    assert_eq!(service.count_entries().await.unwrap(), 0);
    assert!(state.db.find_category_by_name("anime").await.unwrap().is_none());
}

#[tokio::test]
async fn test_grouping_partitions_library() {
    let (state, _temp) = create_test_state().await;
    let service = &state.entries_service;

    let statuses = [
        Status::Current,
        Status::Planned,
        Status::Completed,
        Status::Dropped,
        Status::Hold,
        Status::Current,
        Status::Completed,
    ];
    let mut created = HashSet::new();
    for (i, status) in statuses.iter().enumerate() {
        let id = service
            .create_entry(form(&format!("Title {}", i), "anime", *status))
            .await
            .unwrap();
        created.insert(id);
    }

    let grouped = service.list_entries_grouped().await.unwrap();
    assert_eq!(grouped.total(), statuses.len());

    let mut seen = HashSet::new();
    for (status, bucket) in grouped.iter() {
        for summary in bucket {
            assert_eq!(summary.status, Some(status));
            assert!(seen.insert(summary.entry_id.clone()));
        }
        assert!(bucket
            .windows(2)
            .all(|pair| pair[0].updated_at >= pair[1].updated_at));
    }
    assert_eq!(seen, created);
    assert_eq!(grouped.count(Status::Current), 2);
    assert_eq!(grouped.count(Status::Hold), 1);
}

#[tokio::test]
async fn test_completion_date_survives_recompletion() {
    let (state, _temp) = create_test_state().await;
    let service = &state.entries_service;

    let entry_id = service
        .create_entry(form("Planetes", "manga", Status::Current))
        .await
        .unwrap();

    let detail = service.get_entry_detail(&entry_id).await.unwrap();
    let mut session = EditSession::new(&detail);
    session.set_status(Status::Completed);
    let completed = service.save_edit_session(&mut session).await.unwrap();
    let date = completed.entry.completed_date.clone().unwrap();

    // Drop back to current, then complete again
    service
        .apply_entry_update(
            &entry_id,
            EntryUpdate {
                status: Some(Status::Current),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let again = service
        .apply_entry_update(
            &entry_id,
            EntryUpdate {
                status: Some(Status::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(again.entry.completed_date, Some(date));
}

#[tokio::test]
async fn test_library_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("persist.db");

    let entry_id = {
        let repo = Repository::new(create_pool(&db_path).await.unwrap());
        let (entry, _) = repo.create_entry(raw_request("Mushoku", "light novel")).await.unwrap();
        entry.entry_id
    };

    let repo = Repository::new(create_pool(&db_path).await.unwrap());
    let entry = repo.get_entry(&entry_id).await.unwrap();
    assert_eq!(entry.title, "Mushoku");
    assert_eq!(repo.list_entry_parts(&entry_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_entry_is_not_found() {
    let (state, _temp) = create_test_state().await;

    let err = state
        .entries_service
        .get_entry_detail("does-not-exist")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.user_message(), "Entry not found");
}
