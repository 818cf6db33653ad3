/// Track domain type
use serde::{Deserialize, Serialize};

/// Stable catalog identifier of a track
pub type TrackId = String;

/// Where a track's audio (or artwork) comes from
///
/// Serialized untagged so persisted records keep the catalog's shape:
/// a string for remote locators, a number for bundled assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaSource {
    /// Remote locator (URL) that can be streamed or downloaded
    Remote(String),

    /// Opaque handle to an asset bundled with the application
    ///
    /// Bundled assets can be played but never downloaded.
    Bundled(u64),
}

impl MediaSource {
    /// Create a remote source
    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote(url.into())
    }

    /// Remote locator, if this source is downloadable
    pub fn as_remote(&self) -> Option<&str> {
        match self {
            Self::Remote(url) if !url.trim().is_empty() => Some(url),
            _ => None,
        }
    }

    /// Whether the source can be handed to the download manager
    pub fn is_downloadable(&self) -> bool {
        self.as_remote().is_some()
    }
}

/// Immutable catalog record for one song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique, stable track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    #[serde(default)]
    pub album: Option<String>,

    /// Genres, in catalog order
    #[serde(default)]
    pub genre: Vec<String>,

    /// Artwork location
    #[serde(default)]
    pub image_source: Option<MediaSource>,

    /// Audio location
    pub audio_source: MediaSource,

    /// Raw timed lyrics (LRC text)
    #[serde(default)]
    pub lyrics: Option<String>,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        audio_source: MediaSource,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            genre: Vec::new(),
            image_source: None,
            audio_source,
            lyrics: None,
        }
    }

    /// Set the album name
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Set the genres
    #[must_use]
    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genre = genres.into_iter().map(Into::into).collect();
        self
    }

    /// Set the raw LRC lyrics
    #[must_use]
    pub fn with_lyrics(mut self, lyrics: impl Into<String>) -> Self {
        self.lyrics = Some(lyrics.into());
        self
    }

    /// A track is usable only with a non-empty id
    pub fn has_valid_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}
