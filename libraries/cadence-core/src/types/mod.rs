mod track;

pub use track::{MediaSource, Track, TrackId};
