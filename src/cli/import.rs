//! Import command - loads secrets from a file into the credential store

use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::infrastructure::storage::StorageType;

/// Import every secret in `file` and report what was added
pub async fn run(file: &Path) -> anyhow::Result<()> {
    let config = super::bootstrap();

    if config.storage.backend == StorageType::Memory {
        warn!("Storage backend is in-memory; imported credentials are lost when this command exits");
    }

    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let state = crate::create_app_state_with_config(&config).await?;
    let result = state.credential_service.import(secret_lines(&contents)).await?;

    for credential in &result.added {
        println!("{}\t{}", credential.id(), credential.masked_secret());
    }

    info!(
        added = result.added.len(),
        skipped = result.skipped,
        "Import finished"
    );

    Ok(())
}

fn secret_lines(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .collect()
}
