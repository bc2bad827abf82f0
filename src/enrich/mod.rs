//! Enrichment engine: turns a flat track list into assembled, gap-annotated shows.
//!
//! Three phases, each a pure function over the raw tracks:
//! - [`position::index_positions`]: rank of each show within its year
//! - [`gaps::analyze_gaps`]: per-song recurrence statistics
//! - [`assemble::assemble_shows`]: grouping, set timing, and final merge

pub mod assemble;
pub mod gaps;
pub mod position;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{RawTrack, ShowCatalog};

/// Date format used for show dates on both input and output.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Invalid show date {date:?}: {source}")]
    InvalidDate {
        date: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, EnrichError>;

/// Parse a `YYYY-MM-DD` show date.
pub fn parse_show_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|source| EnrichError::InvalidDate {
        date: date.to_string(),
        source,
    })
}

/// Format a date the way it appears in the output (`datestr`, `first_date_played`).
pub fn format_show_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Run the full enrichment pass over a track list.
pub fn build_shows(tracks: &[RawTrack]) -> Result<ShowCatalog> {
    if tracks.is_empty() {
        log::info!("No tracks to enrich");
        return Ok(ShowCatalog::default());
    }

    let positions = position::index_positions(tracks)?;
    let gaps = gaps::analyze_gaps(tracks)?;
    log::debug!(
        "Indexed {} shows, {} songs",
        positions.len(),
        gaps.song_count()
    );

    let catalog = assemble::assemble_shows(tracks, &positions, &gaps)?;
    log::info!(
        "Transformed {} tracks into {} shows",
        catalog.track_count(),
        catalog.len()
    );
    Ok(catalog)
}


#[cfg(test)]
mod tests {
    use super::test_support::track;
    use super::*;

    #[test]
    fn test_parse_show_date() {
        let d = parse_show_date("1997-12-31").unwrap();
        assert_eq!(format_show_date(d), "1997-12-31");
        assert!(matches!(
            parse_show_date("12/31/1997"),
            Err(EnrichError::InvalidDate { .. })
        ));
        assert!(parse_show_date("1997-02-30").is_err());
    }

    #[test]
    fn test_build_shows_reference_scenario() {
        let tracks = vec![
            track("A", "2021-01-01", "Set 1", 1, 180_000, &["song-a"]),
            track("B", "2021-01-08", "Set 1", 1, 120_000, &["song-a"]),
            track("C", "2021-01-08", "Set 1", 2, 90_000, &["song-b"]),
        ];
        let catalog = build_shows(&tracks).unwrap();
        assert_eq!(catalog.len(), 2);

        let first = catalog.get("1").unwrap();
        assert_eq!(first.datestr, "2021-01-01");
        let a = &first.tracks[0];
        assert_eq!(a.show_position, 1);
        assert_eq!((a.shows_since_played, a.days_since_played), (0, 0));
        assert_eq!(a.start_time, 0.0);
        assert_eq!(a.duration, 3.0);

        let second = catalog.get("2").unwrap();
        assert_eq!(second.datestr, "2021-01-08");
        let b = &second.tracks[0];
        let c = &second.tracks[1];
        assert_eq!(b.track_id, "B");
        assert_eq!(b.show_position, 2);
        assert_eq!((b.shows_since_played, b.days_since_played), (0, 7));
        assert_eq!(b.start_time, 0.0);
        assert_eq!(b.duration, 2.0);
        assert_eq!(c.track_id, "C");
        assert_eq!((c.shows_since_played, c.days_since_played), (0, 0));
        assert_eq!(c.start_time, 2.0);
        assert_eq!(c.duration, 1.5);
    }

    #[test]
    fn test_build_shows_empty_input() {
        let catalog = build_shows(&[]).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_build_shows_bad_date_is_fatal() {
        let tracks = vec![
            track("A", "2021-01-01", "Set 1", 1, 1000, &["a"]),
            track("B", "not-a-date", "Set 1", 1, 1000, &["a"]),
        ];
        let err = build_shows(&tracks).unwrap_err();
        assert!(err.to_string().contains("not-a-date"));
    }

    #[test]
    fn test_unpadded_dates_merge_into_one_show() {
        let tracks = vec![
            track("A", "2021-1-9", "Set 1", 1, 60_000, &["song-a"]),
            track("B", "2021-01-09", "Set 1", 2, 60_000, &["song-b"]),
            track("C", "2021-01-10", "Set 1", 1, 60_000, &["song-a"]),
        ];
        let catalog = build_shows(&tracks).unwrap();

        // Keyed by calendar date, not by the raw string
        assert_eq!(catalog.len(), 2);
        let first = catalog.get("1").unwrap();
        assert_eq!(first.datestr, "2021-01-09");
        assert_eq!(first.tracks.len(), 2);
        assert!(first.tracks.iter().all(|t| t.datestr == "2021-01-09"));
        assert_eq!(first.tracks[1].start_time, 1.0);

        let c = &catalog.get("2").unwrap().tracks[0];
        assert_eq!(c.first_date_played, "2021-01-09");
        assert_eq!((c.shows_since_played, c.days_since_played), (0, 1));
    }

    #[test]
    fn test_build_shows_preserves_track_count() {
        let tracks = vec![
            track("1", "2019-06-01", "Set 1", 1, 1000, &["a"]),
            track("2", "2019-06-01", "Set 2", 1, 1000, &["b", "c"]),
            track("3", "2019-06-02", "Encore", 1, 1000, &[]),
            track("4", "2019-06-01", "Set 1", 2, 1000, &["a"]),
            track("5", "2020-01-01", "Set 1", 1, 1000, &["b"]),
        ];
        let catalog = build_shows(&tracks).unwrap();
        assert_eq!(catalog.track_count(), tracks.len());

        let mut ids: Vec<&str> = catalog.tracks().map(|t| t.track_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }
}
