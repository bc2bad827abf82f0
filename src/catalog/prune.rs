use std::path::Path;

use anyhow::{Context, Result};

use super::{load_tracks, write_json};
use crate::enrich::{format_show_date, parse_show_date};
use crate::models::RawTrack;

pub struct PruneResult {
    pub original: usize,
    pub removed: usize,
    pub remaining: usize,
}

/// Keep only tracks on or before `cutoff` (inclusive).
pub fn retain_through(tracks: &mut Vec<RawTrack>, cutoff: &str) -> Result<usize> {
    let cutoff = format_show_date(parse_show_date(cutoff).context("Invalid cutoff date")?);
    let before = tracks.len();
    // YYYY-MM-DD compares chronologically as a string
    tracks.retain(|t| t.show_date.as_str() <= cutoff.as_str());
    Ok(before - tracks.len())
}

/// Rewrite the track file at `path`, dropping every track after `cutoff`.
pub fn prune_file(path: &Path, cutoff: &str) -> Result<PruneResult> {
    let mut tracks = load_tracks(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let original = tracks.len();
    let removed = retain_through(&mut tracks, cutoff)?;

    if removed > 0 {
        write_json(path, &tracks)?;
    } else {
        log::info!("Nothing after {cutoff}, leaving {} untouched", path.display());
    }

    Ok(PruneResult {
        original,
        removed,
        remaining: tracks.len(),
    })
}
