//! Queue reordering
//!
//! Both orderings keep the active track at the front, so "next" always
//! advances from the entry that is currently playing.

use cadence_core::Track;
use rand::seq::SliceRandom;
use rand::Rng;

/// Random permutation of `tracks` with the anchor track moved to the front
///
/// Fisher-Yates via `SliceRandom`; an anchor not present leaves the
/// permutation as is.
pub fn shuffled_around<R: Rng>(
    tracks: &[Track],
    anchor: Option<&str>,
    rng: &mut R,
) -> Vec<Track> {
    let mut shuffled = tracks.to_vec();
    shuffled.shuffle(rng);

    if let Some(index) = anchor.and_then(|id| shuffled.iter().position(|t| t.id == id)) {
        let current = shuffled.remove(index);
        shuffled.insert(0, current);
    }
    shuffled
}

/// `tracks` rotated so the anchor track comes first
///
/// Tracks before the anchor move to the end, in order. An anchor not
/// present returns the original order.
pub fn rotated_to(tracks: &[Track], anchor: Option<&str>) -> Vec<Track> {
    let mut rotated = tracks.to_vec();
    if let Some(index) = anchor.and_then(|id| rotated.iter().position(|t| t.id == id)) {
        rotated.rotate_left(index);
    }
    rotated
}
