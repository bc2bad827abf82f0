//! Reading and writing the JSON files on either side of the enrichment pass.

pub mod prune;

use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::RawTrack;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Track file not found: {0}")]
    NotFound(String),
    #[error("Invalid JSON in {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Track payloads come either as a bare array or wrapped with paging info.
#[derive(Debug)]
pub enum TrackPayload {
    List(Vec<RawTrack>),
    Page {
        tracks: Vec<RawTrack>,
        total_pages: Option<u32>,
    },
}

#[derive(Deserialize)]
struct WrappedPage {
    tracks: Vec<RawTrack>,
    #[serde(default)]
    total_pages: Option<u32>,
}

impl TrackPayload {
    /// Parse either payload shape, chosen by the first JSON token.
    ///
    /// Each shape is parsed directly so a bad record reports serde's own
    /// error with its line and column.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        if text.trim_start().starts_with('{') {
            let page: WrappedPage = serde_json::from_str(text)?;
            Ok(Self::Page {
                tracks: page.tracks,
                total_pages: page.total_pages,
            })
        } else {
            serde_json::from_str(text).map(Self::List)
        }
    }

    pub fn total_pages(&self) -> Option<u32> {
        match self {
            Self::List(_) => None,
            Self::Page { total_pages, .. } => *total_pages,
        }
    }

    pub fn into_tracks(self) -> Vec<RawTrack> {
        match self {
            Self::List(tracks) | Self::Page { tracks, .. } => tracks,
        }
    }
}

/// Load the raw track sequence from `path`.
pub fn load_tracks(path: &Path) -> Result<Vec<RawTrack>, LoadError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadError::NotFound(display.clone()),
        _ => LoadError::Io {
            path: display.clone(),
            source: e,
        },
    })?;

    let tracks = TrackPayload::from_json(&text)
        .map_err(|source| LoadError::Malformed {
            path: display.clone(),
            source,
        })?
        .into_tracks();

    log::info!("Loaded {} tracks from {}", tracks.len(), display);
    if let (Some(first), Some(last)) = (tracks.first(), tracks.last()) {
        let shows: std::collections::HashSet<&str> =
            tracks.iter().map(|t| t.show_date.as_str()).collect();
        log::info!(
            "Spanning {} shows, {} to {}",
            shows.len(),
            first.show_date,
            last.show_date
        );
    }
    Ok(tracks)
}

/// Load tracks, treating a missing or unreadable file as an empty catalog.
pub fn load_tracks_or_empty(path: &Path) -> Vec<RawTrack> {
    match load_tracks(path) {
        Ok(tracks) => tracks,
        Err(LoadError::NotFound(p)) => {
            log::error!("File {p} not found. Run `showgap fetch` first.");
            Vec::new()
        }
        Err(e) => {
            log::error!("{e}");
            Vec::new()
        }
    }
}

/// Write `value` as 2-space indented JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to serialize to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Date of the last record in an existing track file, if any.
pub fn last_show_date(path: &Path) -> Option<String> {
    match load_tracks(path) {
        Ok(tracks) => tracks.last().map(|t| t.show_date.clone()),
        Err(e) => {
            log::debug!("No previous tracks: {e}");
            None
        }
    }
}
