use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};

use super::gaps::{Gap, GapIndex};
use super::{format_show_date, parse_show_date, Result};
use crate::models::{RawTrack, Show, ShowCatalog, ShowTrack};

/// Separator between song titles of a medley track.
pub const MEDLEY_SEPARATOR: &str = " > ";

const MS_PER_MINUTE: f64 = 60_000.0;

/// Venue data captured from the first record seen for a show date.
struct ShowGroup<'a> {
    venue_name: &'a str,
    location: &'a str,
    album_cover_url: &'a str,
    tracks: Vec<&'a RawTrack>,
}

/// Map a free-form set label to its short code.
/// "Set 1".."Set 3" become "1".."3", "Encore" becomes "E" (case-insensitive);
/// anything else passes through unchanged.
pub fn normalize_set(label: &str) -> String {
    match label.to_lowercase().as_str() {
        "set 1" => "1".to_string(),
        "set 2" => "2".to_string(),
        "set 3" => "3".to_string(),
        "encore" => "E".to_string(),
        _ => label.to_string(),
    }
}

/// Group tracks into shows and fill in timing, position, and gap fields.
///
/// Shows are numbered "1".."N" by ascending date. Within a show, tracks are
/// ordered by the raw set label compared as a plain string, then position.
/// That string order puts "Encore" ahead of "Set 1"; start times are
/// accumulated per set, so the ordering does not affect them.
pub fn assemble_shows(
    tracks: &[RawTrack],
    positions: &HashMap<NaiveDate, u32>,
    gaps: &GapIndex,
) -> Result<ShowCatalog> {
    let mut groups: BTreeMap<NaiveDate, ShowGroup<'_>> = BTreeMap::new();
    for track in tracks {
        let date = parse_show_date(&track.show_date)?;
        groups
            .entry(date)
            .or_insert_with(|| ShowGroup {
                venue_name: &track.venue_name,
                location: &track.venue_location,
                album_cover_url: &track.show_album_cover_url,
                tracks: Vec::new(),
            })
            .tracks
            .push(track);
    }

    let mut shows = Vec::with_capacity(groups.len());
    for (idx, (date, mut group)) in groups.into_iter().enumerate() {
        let show_id = (idx + 1).to_string();
        let datestr = format_show_date(date);
        let show_position = positions.get(&date).copied().unwrap_or(0);

        group.tracks.sort_by(|a, b| {
            a.set_name
                .cmp(&b.set_name)
                .then(a.position.cmp(&b.position))
        });

        // Minutes elapsed so far in each set of this show
        let mut set_elapsed: HashMap<&str, f64> = HashMap::new();
        let mut show_tracks = Vec::with_capacity(group.tracks.len());

        for track in &group.tracks {
            let duration = track.duration as f64 / MS_PER_MINUTE;
            let elapsed = set_elapsed.entry(track.set_name.as_str()).or_insert(0.0);
            let start_time = *elapsed;
            *elapsed += duration;

            let (gap, first_date_played) = track_gap(track, date, gaps);

            show_tracks.push(ShowTrack {
                track_id: track.id.clone(),
                song_name: display_name(track),
                song_ids: track.songs.iter().map(|s| s.slug.clone()).collect(),
                show_id: show_id.clone(),
                duration,
                datestr: datestr.clone(),
                position: track.position,
                set: normalize_set(&track.set_name),
                set_name: track.set_name.clone(),
                start_time,
                year: date.year(),
                month: date.month(),
                day: date.day(),
                venue: track.venue_name.clone(),
                city: track.venue_location.clone(),
                show_position,
                shows_since_played: gap.shows_since_played,
                days_since_played: gap.days_since_played,
                first_date_played,
                mp3_url: track.mp3_url.clone(),
                album_cover_url: track.show_album_cover_url.clone(),
            });
        }

        log::trace!("Show {show_id} ({datestr}): {} tracks", show_tracks.len());
        shows.push(Show {
            show_id,
            datestr,
            venue_name: group.venue_name.to_string(),
            location: group.location.to_string(),
            album_cover_url: group.album_cover_url.to_string(),
            tracks: show_tracks,
        });
    }

    Ok(ShowCatalog::new(shows))
}

/// Song titles joined for medleys; the raw title for songless tracks.
fn display_name(track: &RawTrack) -> String {
    if track.songs.is_empty() {
        track.title.clone()
    } else {
        track
            .songs
            .iter()
            .map(|s| s.title.as_str())
            .collect::<Vec<_>>()
            .join(MEDLEY_SEPARATOR)
    }
}

/// Gap fields for a track come from the last song on it.
fn track_gap(track: &RawTrack, date: NaiveDate, gaps: &GapIndex) -> (Gap, String) {
    let Some(song) = track.songs.last() else {
        return (Gap::default(), String::new());
    };
    let gap = gaps.gap(&song.slug, date).unwrap_or_default();
    let first = gaps
        .first_played(&song.slug)
        .map(format_show_date)
        .unwrap_or_default();
    (gap, first)
}
