use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A song attached to a raw track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSong {
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
}

/// A track record as delivered by the upstream catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrack {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub show_date: String,
    pub set_name: String,
    pub position: i64,
    /// Milliseconds.
    pub duration: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub songs: Vec<RawSong>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub venue_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub venue_location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub show_album_cover_url: String,
    /// Display name used when no songs are attached (e.g. banter, jams).
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mp3_url: String,
}

/// One track of an assembled show, with timing and gap analytics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowTrack {
    pub track_id: String,
    pub song_name: String,
    pub song_ids: Vec<String>,
    pub show_id: String,
    /// Minutes.
    pub duration: f64,
    pub datestr: String,
    pub position: i64,
    pub set: String,
    pub set_name: String,
    /// Minutes elapsed in this set before the track starts.
    pub start_time: f64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub venue: String,
    pub city: String,
    pub show_position: u32,
    pub shows_since_played: usize,
    pub days_since_played: i64,
    pub first_date_played: String,
    pub mp3_url: String,
    pub album_cover_url: String,
}

/// A single show date with its ordered tracks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Show {
    /// Dense chronological ordinal ("1".."N"); emitted as the map key.
    #[serde(skip)]
    pub show_id: String,
    pub datestr: String,
    pub venue_name: String,
    pub location: String,
    pub album_cover_url: String,
    pub tracks: Vec<ShowTrack>,
}

/// All shows of a run, in ascending date order.
///
/// Serializes as a JSON object keyed by show id, keys in chronological
/// order (so "10" follows "9", not "1").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowCatalog {
    shows: Vec<Show>,
}

impl ShowCatalog {
    pub fn new(shows: Vec<Show>) -> Self {
        Self { shows }
    }

    pub fn shows(&self) -> &[Show] {
        &self.shows
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn get(&self, show_id: &str) -> Option<&Show> {
        self.shows.iter().find(|s| s.show_id == show_id)
    }

    pub fn find_by_date(&self, date: &str) -> Option<&Show> {
        self.shows.iter().find(|s| s.datestr == date)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &ShowTrack> {
        self.shows.iter().flat_map(|s| s.tracks.iter())
    }

    pub fn track_count(&self) -> usize {
        self.shows.iter().map(|s| s.tracks.len()).sum()
    }
}

impl Serialize for ShowCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.shows.len()))?;
        for show in &self.shows {
            map.serialize_entry(&show.show_id, show)?;
        }
        map.end()
    }
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Track ids arrive as integers from the API but as strings in older dumps.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_track_full_record() {
        let json = r#"{
            "id": 4021,
            "show_date": "1997-11-22",
            "set_name": "Set 2",
            "position": 3,
            "duration": 1260000,
            "songs": [{"slug": "tweezer", "title": "Tweezer"}],
            "venue_name": "Hampton Coliseum",
            "venue_location": "Hampton, VA",
            "show_album_cover_url": "https://example.org/cover.jpg",
            "title": "Tweezer",
            "mp3_url": "https://example.org/4021.mp3",
            "likes_count": 12
        }"#;
        let t: RawTrack = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, "4021");
        assert_eq!(t.songs.len(), 1);
        assert_eq!(t.songs[0].slug, "tweezer");
        assert_eq!(t.venue_location, "Hampton, VA");
    }

    #[test]
    fn test_raw_track_optional_fields_default() {
        let json = r#"{
            "id": "abc",
            "show_date": "1997-11-22",
            "set_name": "Encore",
            "position": 1,
            "duration": 60000,
            "songs": null,
            "venue_name": null
        }"#;
        let t: RawTrack = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, "abc");
        assert!(t.songs.is_empty());
        assert_eq!(t.venue_name, "");
        assert_eq!(t.mp3_url, "");
        assert_eq!(t.title, "");
    }

    #[test]
    fn test_raw_track_missing_required_field() {
        let json = r#"{"id": 1, "set_name": "Set 1", "position": 1, "duration": 1}"#;
        assert!(serde_json::from_str::<RawTrack>(json).is_err());
    }

    fn empty_show(id: &str, date: &str) -> Show {
        Show {
            show_id: id.to_string(),
            datestr: date.to_string(),
            venue_name: String::new(),
            location: String::new(),
            album_cover_url: String::new(),
            tracks: Vec::new(),
        }
    }

    #[test]
    fn test_catalog_serializes_in_show_order() {
        let shows: Vec<Show> = (1..=11)
            .map(|i| empty_show(&i.to_string(), &format!("2020-01-{i:02}")))
            .collect();
        let catalog = ShowCatalog::new(shows);
        let json = serde_json::to_string(&catalog).unwrap();

        let pos_9 = json.find("\"9\":").unwrap();
        let pos_10 = json.find("\"10\":").unwrap();
        assert!(pos_9 < pos_10);
        // show_id is carried by the key, not repeated in the body
        assert!(!json.contains("show_id"));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = ShowCatalog::new(vec![
            empty_show("1", "2021-01-01"),
            empty_show("2", "2021-01-08"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("2").unwrap().datestr, "2021-01-08");
        assert_eq!(catalog.find_by_date("2021-01-01").unwrap().show_id, "1");
        assert!(catalog.get("3").is_none());
        assert_eq!(catalog.track_count(), 0);
    }
}
