use std::path::Path;

use anyhow::{Context, Result};

use crate::catalog;
use crate::enrich;
use crate::models::ShowCatalog;

/// Result of a transform run.
#[derive(Debug)]
pub struct TransformResult {
    pub shows: usize,
    pub tracks: usize,
    pub written: bool,
}

/// Load raw tracks and enrich them into shows.
///
/// A missing or malformed input file yields an empty catalog; an unparsable
/// show date is an error.
pub fn build_catalog(raw_path: &Path) -> Result<ShowCatalog> {
    let tracks = catalog::load_tracks_or_empty(raw_path);
    enrich::build_shows(&tracks)
        .with_context(|| format!("Failed to enrich tracks from {}", raw_path.display()))
}

/// Transform `raw_path` into the nested show document at `shows_path`.
/// Nothing is written when there are no tracks.
pub fn transform(raw_path: &Path, shows_path: &Path) -> Result<TransformResult> {
    let catalog = build_catalog(raw_path)?;
    if catalog.is_empty() {
        return Ok(TransformResult {
            shows: 0,
            tracks: 0,
            written: false,
        });
    }

    log::info!("Saving to {}", shows_path.display());
    catalog::write_json(shows_path, &catalog)?;

    Ok(TransformResult {
        shows: catalog.len(),
        tracks: catalog.track_count(),
        written: true,
    })
}
