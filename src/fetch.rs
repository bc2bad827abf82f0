//! Paged download of raw track records from the catalog API.

use std::collections::HashSet;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::{self, TrackPayload};
use crate::config::{ApiConfig, DataMode};
use crate::enrich::{format_show_date, parse_show_date};
use crate::models::RawTrack;

/// Result of a fetch run.
pub struct FetchResult {
    pub fetched: usize,
    pub total_tracks: usize,
    pub total_shows: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub written: bool,
}

/// Accumulates tracks across pages and enforces the show cap.
struct Collector {
    tracks: Vec<RawTrack>,
    shows: HashSet<String>,
    show_limit: Option<usize>,
}

impl Collector {
    fn new(show_limit: Option<usize>) -> Self {
        Self {
            tracks: Vec::new(),
            shows: HashSet::new(),
            show_limit,
        }
    }

    /// Add a page of tracks. Returns `true` once the show cap is reached;
    /// the first track of the show past the cap is not kept.
    fn absorb(&mut self, page: Vec<RawTrack>) -> bool {
        for track in page {
            if !self.shows.contains(&track.show_date) {
                if let Some(limit) = self.show_limit {
                    if self.shows.len() >= limit {
                        return true;
                    }
                }
                self.shows.insert(track.show_date.clone());
            }
            self.tracks.push(track);
        }
        false
    }
}

/// Whether `page` is the last one, given the payload shape and size.
fn is_last_page(payload: &TrackPayload, page: u32, page_len: usize, per_page: u32) -> bool {
    match payload {
        TrackPayload::Page { .. } => page >= payload.total_pages().unwrap_or(page),
        TrackPayload::List(_) => page_len < per_page as usize,
    }
}

fn page_url(api: &ApiConfig, page: u32, start_date: Option<&str>) -> String {
    let mut url = format!(
        "{}/tracks?page={page}&per_page={}&sort=date:asc",
        api.base_url.trim_end_matches('/'),
        api.per_page
    );
    if let Some(start) = start_date {
        url.push_str(&format!("&start_date={start}"));
    }
    url
}

fn fetch_page(url: &str) -> Result<TrackPayload> {
    log::debug!("Fetching {url}");
    let body = ureq::get(url)
        .call()
        .with_context(|| format!("HTTP request failed for {url}"))?
        .body_mut()
        .read_to_string()
        .with_context(|| format!("Failed to read response for {url}"))?;
    TrackPayload::from_json(&body).with_context(|| format!("Failed to parse JSON for {url}"))
}

/// Page through the API until it runs dry, the show cap is hit, or a request fails.
///
/// A failed request ends paging but keeps what was already collected.
pub fn fetch_tracks(
    api: &ApiConfig,
    start_date: Option<&str>,
    show_limit: Option<usize>,
) -> Vec<RawTrack> {
    let mut collector = Collector::new(show_limit);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} page {pos} {msg}").unwrap());

    let mut page = 1u32;
    loop {
        pb.set_position(page as u64);
        let payload = match fetch_page(&page_url(api, page, start_date)) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Stopping at page {page}: {e:#}");
                break;
            }
        };

        let last = is_last_page(&payload, page, payload_len(&payload), api.per_page);
        let tracks = payload.into_tracks();
        if tracks.is_empty() {
            log::info!("No more tracks at page {page}");
            break;
        }

        let page_len = tracks.len();
        if collector.absorb(tracks) {
            log::info!("Reached {} shows", collector.shows.len());
            break;
        }
        pb.set_message(format!(
            "{page_len} tracks (total: {}, shows: {})",
            collector.tracks.len(),
            collector.shows.len()
        ));

        if last {
            log::info!("Reached last page ({page})");
            break;
        }

        page += 1;
        thread::sleep(Duration::from_millis(api.rate_limit_ms));
    }

    pb.finish_with_message(format!("{} tracks", collector.tracks.len()));
    collector.tracks
}

fn payload_len(payload: &TrackPayload) -> usize {
    match payload {
        TrackPayload::List(tracks) | TrackPayload::Page { tracks, .. } => tracks.len(),
    }
}

/// Day after the last show already on disk, for incremental updates.
fn resume_date(raw_path: &Path) -> Result<Option<String>> {
    let Some(last) = catalog::last_show_date(raw_path) else {
        return Ok(None);
    };
    let date = parse_show_date(&last)
        .with_context(|| format!("Bad last show date in {}", raw_path.display()))?;
    Ok(date.succ_opt().map(format_show_date))
}

/// Fetch tracks and write them to `raw_path`.
///
/// In update mode (ignored for test runs) only shows after the last date on
/// disk are requested, and the new tracks are appended to the existing ones.
pub fn run_fetch(
    api: &ApiConfig,
    raw_path: &Path,
    mode: DataMode,
    update: bool,
) -> Result<FetchResult> {
    let start_date = if update && mode == DataMode::Full {
        resume_date(raw_path)?
    } else {
        None
    };
    if let Some(start) = &start_date {
        println!("UPDATE MODE: fetching from {start}");
    }

    let show_limit = match mode {
        DataMode::Test => Some(api.test_show_limit),
        DataMode::Full => None,
    };
    if let Some(limit) = show_limit {
        println!("TEST MODE: stopping after {limit} shows");
    }

    let fetched = fetch_tracks(api, start_date.as_deref(), show_limit);
    if fetched.is_empty() {
        return Ok(FetchResult {
            fetched: 0,
            total_tracks: 0,
            total_shows: 0,
            first_date: None,
            last_date: None,
            written: false,
        });
    }

    let fetched_count = fetched.len();
    let tracks = if start_date.is_some() {
        let mut existing = catalog::load_tracks(raw_path)
            .with_context(|| format!("Failed to reload {}", raw_path.display()))?;
        println!("Merging {} existing + {} new tracks", existing.len(), fetched_count);
        existing.extend(fetched);
        existing
    } else {
        fetched
    };

    catalog::write_json(raw_path, &tracks)?;

    let shows: HashSet<&str> = tracks.iter().map(|t| t.show_date.as_str()).collect();
    Ok(FetchResult {
        fetched: fetched_count,
        total_tracks: tracks.len(),
        total_shows: shows.len(),
        first_date: tracks.first().map(|t| t.show_date.clone()),
        last_date: tracks.last().map(|t| t.show_date.clone()),
        written: true,
    })
}
