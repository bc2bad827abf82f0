use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};

use super::{parse_show_date, Result};
use crate::models::RawTrack;

/// Map each show date to its 1-based rank among the year's distinct show dates.
pub fn index_positions(tracks: &[RawTrack]) -> Result<HashMap<NaiveDate, u32>> {
    let mut by_year: BTreeMap<i32, BTreeSet<NaiveDate>> = BTreeMap::new();
    for track in tracks {
        let date = parse_show_date(&track.show_date)?;
        by_year.entry(date.year()).or_default().insert(date);
    }

    let mut positions = HashMap::new();
    for dates in by_year.values() {
        // BTreeSet iterates ascending and holds no duplicates
        for (rank, date) in dates.iter().enumerate() {
            positions.insert(*date, rank as u32 + 1);
        }
    }

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::test_support::track;

    fn date(s: &str) -> NaiveDate {
        parse_show_date(s).unwrap()
    }

    #[test]
    fn test_positions_restart_each_year() {
        let tracks = vec![
            track("1", "1999-12-31", "Set 1", 1, 1000, &["a"]),
            track("2", "1999-07-04", "Set 1", 1, 1000, &["a"]),
            track("3", "2000-01-01", "Set 1", 1, 1000, &["a"]),
            track("4", "1999-07-04", "Set 2", 1, 1000, &["b"]),
            track("5", "2000-06-15", "Set 1", 1, 1000, &["a"]),
        ];
        let positions = index_positions(&tracks).unwrap();

        assert_eq!(positions.len(), 4);
        assert_eq!(positions[&date("1999-07-04")], 1);
        assert_eq!(positions[&date("1999-12-31")], 2);
        assert_eq!(positions[&date("2000-01-01")], 1);
        assert_eq!(positions[&date("2000-06-15")], 2);
    }

    #[test]
    fn test_positions_dense_within_year() {
        let dates = ["2022-08-05", "2022-02-01", "2022-12-30", "2022-04-20", "2022-02-01"];
        let tracks: Vec<_> = dates
            .iter()
            .enumerate()
            .map(|(i, d)| track(&i.to_string(), d, "Set 1", 1, 1000, &[]))
            .collect();
        let positions = index_positions(&tracks).unwrap();

        let mut ranks: Vec<u32> = positions.values().copied().collect();
        ranks.sort();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        assert_eq!(positions[&date("2022-12-30")], 4);
    }

    #[test]
    fn test_positions_invalid_date() {
        let tracks = vec![track("1", "2022-13-01", "Set 1", 1, 1000, &[])];
        assert!(index_positions(&tracks).is_err());
    }
}
