//! Snapshot command - builds one snapshot and prints it to stdout

use anyhow::Context;
use tracing::info;

/// Build a snapshot from the configured store and print it as JSON
pub async fn run(pretty: bool) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let state = crate::create_app_state_with_config(&config).await?;

    let snapshot = state
        .snapshot_service
        .build_snapshot()
        .await
        .context("Failed to build snapshot")?;

    info!(
        credentials = snapshot.total_count,
        failed = snapshot.failure_count(),
        "Snapshot ready"
    );

    let output = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };

    println!("{}", output);

    Ok(())
}
