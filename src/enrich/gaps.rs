use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use super::{parse_show_date, Result};
use crate::models::RawTrack;

/// How long a song sat unplayed before a given performance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gap {
    /// Distinct catalog shows strictly between the two performances.
    pub shows_since_played: usize,
    /// Calendar days since the previous performance.
    pub days_since_played: i64,
}

/// Recurrence statistics for every song in the catalog.
#[derive(Debug, Default)]
pub struct GapIndex {
    gaps: HashMap<(String, NaiveDate), Gap>,
    first_played: HashMap<String, NaiveDate>,
}

impl GapIndex {
    pub fn gap(&self, slug: &str, date: NaiveDate) -> Option<Gap> {
        self.gaps.get(&(slug.to_string(), date)).copied()
    }

    pub fn first_played(&self, slug: &str) -> Option<NaiveDate> {
        self.first_played.get(slug).copied()
    }

    pub fn song_count(&self) -> usize {
        self.first_played.len()
    }
}

/// Compute per-song gaps across the whole track list.
///
/// Show counts are taken over every distinct show date in the catalog, not
/// just the shows where the song appeared. A song performed more than once
/// on the same date keeps a single entry for that date: the last one
/// processed, which measures against the earlier same-day performance and
/// is therefore zero.
pub fn analyze_gaps(tracks: &[RawTrack]) -> Result<GapIndex> {
    let mut all_dates: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut performances: HashMap<&str, Vec<NaiveDate>> = HashMap::new();

    for track in tracks {
        let date = parse_show_date(&track.show_date)?;
        all_dates.insert(date);
        for song in &track.songs {
            performances.entry(song.slug.as_str()).or_default().push(date);
        }
    }

    let all_dates: Vec<NaiveDate> = all_dates.into_iter().collect();
    let mut index = GapIndex::default();

    for (slug, mut dates) in performances {
        // Stable, so same-date performances keep arrival order
        dates.sort();

        let Some(&first) = dates.first() else {
            continue;
        };
        index.first_played.insert(slug.to_string(), first);
        index.gaps.insert((slug.to_string(), first), Gap::default());

        for pair in dates.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let gap = Gap {
                shows_since_played: shows_between(&all_dates, prev, curr),
                days_since_played: (curr - prev).num_days(),
            };
            index.gaps.insert((slug.to_string(), curr), gap);
        }
    }

    log::debug!("Processed {} unique songs", index.song_count());
    Ok(index)
}

/// Count dates in `sorted` strictly after `prev` and strictly before `curr`.
fn shows_between(sorted: &[NaiveDate], prev: NaiveDate, curr: NaiveDate) -> usize {
    let after_prev = sorted.partition_point(|d| *d <= prev);
    let before_curr = sorted.partition_point(|d| *d < curr);
    before_curr.saturating_sub(after_prev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::test_support::track;

    fn date(s: &str) -> NaiveDate {
        parse_show_date(s).unwrap()
    }

    #[test]
    fn test_first_performance_has_zero_gap() {
        let tracks = vec![
            track("1", "2003-02-28", "Set 1", 1, 1000, &["tweezer"]),
            track("2", "2003-01-02", "Set 1", 1, 1000, &["tweezer"]),
        ];
        let index = analyze_gaps(&tracks).unwrap();

        assert_eq!(index.first_played("tweezer"), Some(date("2003-01-02")));
        assert_eq!(index.gap("tweezer", date("2003-01-02")), Some(Gap::default()));
        let later = index.gap("tweezer", date("2003-02-28")).unwrap();
        assert_eq!(later.days_since_played, 57);
    }

    #[test]
    fn test_shows_counted_over_whole_catalog() {
        // Song plays on the 1st and 10th; three other shows fall in between,
        // plus one after that must not be counted.
        let tracks = vec![
            track("1", "2010-03-01", "Set 1", 1, 1000, &["harry-hood"]),
            track("2", "2010-03-03", "Set 1", 1, 1000, &["other"]),
            track("3", "2010-03-05", "Set 1", 1, 1000, &["other"]),
            track("4", "2010-03-07", "Set 1", 1, 1000, &[]),
            track("5", "2010-03-10", "Set 2", 4, 1000, &["harry-hood"]),
            track("6", "2010-03-12", "Set 1", 1, 1000, &["other"]),
        ];
        let index = analyze_gaps(&tracks).unwrap();

        let gap = index.gap("harry-hood", date("2010-03-10")).unwrap();
        assert_eq!(gap.shows_since_played, 3);
        assert_eq!(gap.days_since_played, 9);

        let other = index.gap("other", date("2010-03-12")).unwrap();
        assert_eq!(other.shows_since_played, 2);
        assert_eq!(other.days_since_played, 7);
    }

    #[test]
    fn test_gap_measured_from_immediately_preceding_performance() {
        let tracks = vec![
            track("1", "2015-07-21", "Set 1", 1, 1000, &["fuego"]),
            track("2", "2015-08-01", "Set 1", 1, 1000, &["fuego"]),
            track("3", "2016-01-01", "Set 1", 1, 1000, &["fuego"]),
        ];
        let index = analyze_gaps(&tracks).unwrap();

        assert_eq!(index.gap("fuego", date("2015-08-01")).unwrap().days_since_played, 11);
        let last = index.gap("fuego", date("2016-01-01")).unwrap();
        assert_eq!(last.days_since_played, 153);
        assert_eq!(last.shows_since_played, 0);
    }

    #[test]
    fn test_same_date_repeat_keeps_last_entry() {
        let tracks = vec![
            track("1", "1994-06-11", "Set 1", 1, 1000, &["tweezer"]),
            track("2", "1994-06-18", "Set 1", 3, 1000, &["tweezer"]),
            track("3", "1994-06-18", "Set 2", 9, 1000, &["tweezer"]),
        ];
        let index = analyze_gaps(&tracks).unwrap();

        // Second same-day performance overwrites the 7-day gap with a zero gap
        assert_eq!(index.gap("tweezer", date("1994-06-18")), Some(Gap::default()));
        assert_eq!(index.song_count(), 1);
    }

    #[test]
    fn test_medley_songs_tracked_independently() {
        let tracks = vec![
            track("1", "2009-03-06", "Set 2", 1, 1000, &["mikes-song"]),
            track("2", "2009-03-08", "Set 2", 1, 1000, &["mikes-song", "weekapaug-groove"]),
        ];
        let index = analyze_gaps(&tracks).unwrap();

        assert_eq!(index.song_count(), 2);
        assert_eq!(index.gap("mikes-song", date("2009-03-08")).unwrap().days_since_played, 2);
        assert_eq!(index.gap("weekapaug-groove", date("2009-03-08")), Some(Gap::default()));
        assert_eq!(index.first_played("weekapaug-groove"), Some(date("2009-03-08")));
    }

    #[test]
    fn test_trackless_songs_absent() {
        let tracks = vec![track("1", "2009-03-06", "Set 1", 1, 1000, &[])];
        let index = analyze_gaps(&tracks).unwrap();
        assert_eq!(index.song_count(), 0);
        assert!(index.first_played("anything").is_none());
    }

    #[test]
    fn test_shows_between_exclusive() {
        let dates: Vec<NaiveDate> = ["2020-01-01", "2020-01-02", "2020-01-03", "2020-01-04"]
            .iter()
            .map(|d| date(d))
            .collect();
        assert_eq!(shows_between(&dates, dates[0], dates[3]), 2);
        assert_eq!(shows_between(&dates, dates[0], dates[1]), 0);
        assert_eq!(shows_between(&dates, dates[2], dates[2]), 0);
    }
}
