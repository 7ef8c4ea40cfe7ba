// mediatrack - personal media tracking library
// Entry point: opens the library, seeds a fresh one and logs a summary

use anyhow::Context;
use mediatrack::config::AppConfig;
use mediatrack::services::seed_sample_library;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediatrack=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting mediatrack");

    let config = AppConfig::from_env();
    let state = mediatrack::app::setup(config)
        .await
        .context("failed to open the media library")?;

    seed_sample_library(&state.entries_service)
        .await
        .context("failed to seed sample entries")?;

    let grouped = state.entries_service.list_entries_grouped().await?;
    tracing::info!("Library holds {} entries", grouped.total());

    for (status, entries) in grouped.iter() {
        tracing::info!("{}: {}", status.label(), entries.len());
        for summary in entries {
            let detail = state
                .entries_service
                .get_entry_detail(&summary.entry_id)
                .await?;
            tracing::info!(
                "  {} [{}] {}%",
                summary.title,
                summary.category_name.as_deref().unwrap_or("-"),
                detail.overall_progress
            );
        }
    }

    Ok(())
}
