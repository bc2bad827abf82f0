use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::enrich::{format_show_date, parse_show_date};
use crate::models::{Show, ShowCatalog, ShowTrack};

/// Summary of an enriched catalog.
pub struct CatalogStats {
    pub shows: usize,
    pub tracks: usize,
    pub songs: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub shows_per_year: BTreeMap<i32, usize>,
    /// Tracks played at the same show as their recorded first performance.
    pub debuts: usize,
}

impl CatalogStats {
    pub fn from_catalog(catalog: &ShowCatalog) -> Self {
        let mut songs: HashSet<&str> = HashSet::new();
        let mut shows_per_year: BTreeMap<i32, usize> = BTreeMap::new();
        let mut debuts = 0;

        for show in catalog.shows() {
            if let Some(first) = show.tracks.first() {
                *shows_per_year.entry(first.year).or_insert(0) += 1;
            }
            for track in &show.tracks {
                songs.extend(track.song_ids.iter().map(String::as_str));
                if !track.song_ids.is_empty() && track.first_date_played == track.datestr {
                    debuts += 1;
                }
            }
        }

        Self {
            shows: catalog.len(),
            tracks: catalog.track_count(),
            songs: songs.len(),
            first_date: catalog.shows().first().map(|s| s.datestr.clone()),
            last_date: catalog.shows().last().map(|s| s.datestr.clone()),
            shows_per_year,
            debuts,
        }
    }
}

/// Tracks that ended the longest absences, most shows first.
/// Ties go to the longer absence in days, then the earlier date.
pub fn bust_outs(catalog: &ShowCatalog, limit: usize) -> Vec<&ShowTrack> {
    let mut tracks: Vec<&ShowTrack> = catalog
        .tracks()
        .filter(|t| t.shows_since_played > 0)
        .collect();
    tracks.sort_by(|a, b| {
        b.shows_since_played
            .cmp(&a.shows_since_played)
            .then(b.days_since_played.cmp(&a.days_since_played))
            .then(a.datestr.cmp(&b.datestr))
    });
    tracks.truncate(limit);
    tracks
}

/// Date of the previous performance, recovered from the day gap.
/// `None` for a first performance or an unparsable date.
pub fn last_played(track: &ShowTrack) -> Option<String> {
    if track.days_since_played <= 0 {
        return None;
    }
    let gap = chrono::Days::new(track.days_since_played as u64);
    parse_show_date(&track.datestr)
        .ok()
        .and_then(|d| d.checked_sub_days(gap))
        .map(format_show_date)
}

/// Song slug to the shows it was played at, each list in date order.
pub struct SongIndex<'a> {
    shows: BTreeMap<&'a str, Vec<&'a Show>>,
}

impl<'a> SongIndex<'a> {
    pub fn from_catalog(catalog: &'a ShowCatalog) -> Self {
        let mut shows: BTreeMap<&str, Vec<&Show>> = BTreeMap::new();
        for show in catalog.shows() {
            for track in &show.tracks {
                for slug in &track.song_ids {
                    let list = shows.entry(slug.as_str()).or_default();
                    // A song can recur within a show (reprises, medleys)
                    if list.last().is_none_or(|s| s.show_id != show.show_id) {
                        list.push(show);
                    }
                }
            }
        }
        Self { shows }
    }

    pub fn song_count(&self) -> usize {
        self.shows.len()
    }

    pub fn shows_for(&self, slug: &str) -> &[&'a Show] {
        self.shows.get(slug).map(Vec::as_slice).unwrap_or_default()
    }

    /// Shows containing any of `slugs`, in date order, each once.
    pub fn filter_to_songs<S: AsRef<str>>(&self, slugs: &[S]) -> Vec<&'a Show> {
        let mut selected: Vec<&Show> = slugs
            .iter()
            .flat_map(|slug| self.shows_for(slug.as_ref()).iter().copied())
            .collect();
        selected.sort_by(|a, b| a.datestr.cmp(&b.datestr));
        selected.dedup_by(|a, b| a.show_id == b.show_id);
        selected
    }

    /// Tracks in the selected shows that carry at least one of `slugs`.
    pub fn matching_tracks<S: AsRef<str>>(&self, slugs: &[S]) -> Vec<&'a ShowTrack> {
        let wanted: HashSet<&str> = slugs.iter().map(|s| s.as_ref()).collect();
        self.filter_to_songs(slugs)
            .into_iter()
            .flat_map(|show| show.tracks.iter())
            .filter(|t| t.song_ids.iter().any(|id| wanted.contains(id.as_str())))
            .collect()
    }
}

/// Years since a song's first performance, counting 365-day years.
/// `None` when the date is missing or unparsable.
pub fn song_age_years(first_date_played: &str, today: NaiveDate) -> Option<f64> {
    let first = parse_show_date(first_date_played).ok()?;
    Some((today - first).num_days() as f64 / 365.0)
}
