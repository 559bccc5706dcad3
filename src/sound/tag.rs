//! Music metadata tags
//!
//! Ogg Vorbis files carry `KEY=value` comments; the keys recognised here are
//! the usual Vorbis ones, matched without regard to case. WAV files carry no
//! tags, so their `MusicTag` stays empty.

/// Title, artist and friends of a music file; empty strings when unknown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MusicTag {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub track: String,
    pub genre: String,
}

impl MusicTag {
    /// Builds a tag from Vorbis comment pairs; a repeated key keeps its last value
    pub fn from_comments<'a>(comments: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut tag = Self::default();
        for (key, value) in comments {
            let field = match key.to_ascii_lowercase().as_str() {
                "title" => &mut tag.title,
                "artist" | "performer" => &mut tag.artist,
                "album" => &mut tag.album,
                "date" => &mut tag.year,
                "tracknumber" => &mut tag.track,
                "genre" => &mut tag.genre,
                _ => continue,
            };
            *field = value.trim().to_string();
        }
        tag
    }

    /// True when no field is known
    pub fn is_empty(&self) -> bool {
        [
            &self.title,
            &self.artist,
            &self.album,
            &self.year,
            &self.track,
            &self.genre,
        ]
        .iter()
        .all(|field| field.is_empty())
    }
}
