//! # Queue Manager
//!
//! The active, ordered list of tracks together with the current position and
//! the pre-shuffle snapshot.
//!
//! Invariants:
//! - When the queue is non-empty, `current` is a valid index.
//! - `original_order` is `Some` exactly while shuffle is enabled.
//! - Replacing the contents (filter change, playlist load) turns shuffle off.

use core_library::{Track, TrackFilter, TrackId};
use rand::Rng;
use tracing::debug;

use crate::error::{PlaybackError, Result};

/// Result of applying filter criteria to the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// No predicate was active; the queue holds the whole library.
    Unfiltered(usize),
    /// At least one predicate was active and this many tracks matched.
    Matched(usize),
    /// Predicates were active and nothing matched.
    NoMatches,
}

impl FilterOutcome {
    pub fn len(&self) -> usize {
        match self {
            FilterOutcome::Unfiltered(n) | FilterOutcome::Matched(n) => *n,
            FilterOutcome::NoMatches => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Status line shown under the filter inputs.
    pub fn status_text(&self) -> String {
        match self {
            FilterOutcome::Unfiltered(0) => "The library is empty".to_string(),
            FilterOutcome::Unfiltered(1) => "1 track in library".to_string(),
            FilterOutcome::Unfiltered(n) => format!("{} tracks in library", n),
            FilterOutcome::Matched(1) => "1 track found".to_string(),
            FilterOutcome::Matched(n) => format!("{} tracks found", n),
            FilterOutcome::NoMatches => "No tracks match the current filters".to_string(),
        }
    }
}

/// What `remove_at` took out and how the position moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub track: Track,
    /// The removed entry was the current one; the queue now points at its successor.
    pub was_current: bool,
}

/// Ordered play queue.
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    tracks: Vec<Track>,
    current: usize,
    original_order: Option<Vec<Track>>,
}

impl PlayQueue {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            current: 0,
            original_order: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_shuffled(&self) -> bool {
        self.original_order.is_some()
    }

    pub fn current_index(&self) -> Option<usize> {
        (!self.tracks.is_empty()).then_some(self.current)
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.current)
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    /// Display labels, numbered from 1.
    pub fn labels(&self) -> Vec<String> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(i, t)| t.queue_label(i))
            .collect()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Swap in new contents, e.g. a resolved playlist. Shuffle is turned off.
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.current = 0;
        self.original_order = None;
        debug!(len = self.tracks.len(), "Queue replaced");
    }

    /// Rebuild the queue from `library` under `filter`.
    pub fn apply_filter(&mut self, library: &[Track], filter: &TrackFilter) -> FilterOutcome {
        self.replace(filter.apply(library));

        if !filter.is_active() {
            FilterOutcome::Unfiltered(self.tracks.len())
        } else if self.tracks.is_empty() {
            FilterOutcome::NoMatches
        } else {
            FilterOutcome::Matched(self.tracks.len())
        }
    }

    /// Toggle shuffle and return the new state.
    ///
    /// `anchor` is the track that must stay selected; when `None` the queue's
    /// own current entry is used. If the anchor is not in the queue after the
    /// toggle the position falls back to 0.
    pub fn toggle_shuffle<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        anchor: Option<&TrackId>,
    ) -> Result<bool> {
        if self.tracks.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }

        let anchor = anchor
            .cloned()
            .or_else(|| self.current().map(|t| t.id.clone()));

        match self.original_order.take() {
            Some(original) => {
                self.tracks = original;
            }
            None => {
                let snapshot = self.tracks.clone();
                shuffle(&mut self.tracks, rng);
                self.original_order = Some(snapshot);
            }
        }

        self.current = anchor
            .and_then(|id| self.position_of(&id))
            .unwrap_or(0);

        debug!(
            shuffled = self.is_shuffled(),
            index = self.current,
            "Shuffle toggled"
        );
        Ok(self.is_shuffled())
    }

    /// Move the position by `delta`, wrapping at both ends.
    pub fn advance(&mut self, delta: isize) -> Result<usize> {
        let next = advance_index(self.current, delta, self.tracks.len())
            .ok_or(PlaybackError::EmptyQueue)?;
        self.current = next;
        Ok(next)
    }

    /// Point at `index` and return the selected track.
    pub fn select(&mut self, index: usize) -> Result<&Track> {
        if self.tracks.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }
        if index >= self.tracks.len() {
            return Err(PlaybackError::IndexOutOfRange {
                index,
                len: self.tracks.len(),
            });
        }
        self.current = index;
        Ok(&self.tracks[index])
    }

    /// Remove the entry at `index`.
    ///
    /// The last remaining entry cannot be removed. While shuffled, the track
    /// is also dropped from the pre-shuffle snapshot.
    pub fn remove_at(&mut self, index: usize) -> Result<Removal> {
        let len = self.tracks.len();
        if len == 0 {
            return Err(PlaybackError::EmptyQueue);
        }
        if index >= len {
            return Err(PlaybackError::IndexOutOfRange { index, len });
        }
        if len == 1 {
            return Err(PlaybackError::WouldEmpty);
        }

        let track = self.tracks.remove(index);
        let was_current = index == self.current;

        if index < self.current {
            self.current -= 1;
        } else if was_current && self.current >= self.tracks.len() {
            self.current = 0;
        }

        if let Some(original) = self.original_order.as_mut() {
            if let Some(pos) = original.iter().position(|t| t.id == track.id) {
                original.remove(pos);
            }
        }

        debug!(index, track_id = %track.id, current = self.current, "Removed queue entry");
        Ok(Removal { track, was_current })
    }
}

/// `(current + delta) mod len`, or `None` for an empty queue.
pub fn advance_index(current: usize, delta: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    Some((current as i64 + delta as i64).rem_euclid(len) as usize)
}

/// Unbiased in-place Fisher–Yates shuffle.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn track(id: &str, artist: &str) -> Track {
        Track::new(id, format!("Song {}", id), artist, "Album", format!("{}.mp3", id))
    }

    fn abc() -> PlayQueue {
        PlayQueue::new(vec![track("A", "x"), track("B", "y"), track("C", "z")])
    }

    fn ids(queue: &PlayQueue) -> Vec<String> {
        queue.tracks().iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn test_advance_wraps_both_ways() {
        let mut queue = abc();
        assert_eq!(queue.advance(-1).unwrap(), 2);
        assert_eq!(queue.advance(1).unwrap(), 0);
        assert_eq!(advance_index(0, -1, 3), Some(2));
        assert_eq!(advance_index(1, 7, 3), Some(2));
        assert_eq!(advance_index(0, 1, 0), None);
    }

    #[test]
    fn test_advance_full_cycle_returns_to_start() {
        for n in 1..6usize {
            for start in 0..n {
                let mut index = start;
                for _ in 0..n {
                    index = advance_index(index, 1, n).unwrap();
                }
                assert_eq!(index, start);
            }
        }
    }

    #[test]
    fn test_advance_on_empty_queue() {
        let mut queue = PlayQueue::default();
        assert!(queue.advance(1).unwrap_err().is_empty_queue());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn test_filter_resets_shuffle_and_position() {
        let library = vec![track("1", "W"), track("2", "X"), track("3", "Y")];
        let mut queue = PlayQueue::new(library.clone());
        let mut rng = StdRng::seed_from_u64(7);
        queue.select(2).unwrap();
        queue.toggle_shuffle(&mut rng, None).unwrap();

        let outcome = queue.apply_filter(&library, &TrackFilter::from_inputs("X", "", ""));
        assert_eq!(outcome, FilterOutcome::Matched(1));
        assert_eq!(outcome.status_text(), "1 track found");
        assert_eq!(ids(&queue), vec!["2"]);
        assert_eq!(queue.current_index(), Some(0));
        assert!(!queue.is_shuffled());
    }

    #[test]
    fn test_filter_outcomes_are_distinguishable() {
        let library = vec![track("1", "W")];
        let mut queue = PlayQueue::default();

        let none = queue.apply_filter(&library, &TrackFilter::from_inputs("Nobody", "", ""));
        assert_eq!(none, FilterOutcome::NoMatches);
        assert!(queue.is_empty());

        let all = queue.apply_filter(&library, &TrackFilter::default());
        assert_eq!(all, FilterOutcome::Unfiltered(1));
        assert_ne!(none.status_text(), FilterOutcome::Unfiltered(0).status_text());
    }

    #[test]
    fn test_shuffle_keeps_current_identity() {
        for seed in 0..20 {
            let mut queue = abc();
            queue.select(2).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            assert!(queue.toggle_shuffle(&mut rng, None).unwrap());
            assert_eq!(queue.current().unwrap().id.as_str(), "C");

            let mut sorted = ids(&queue);
            sorted.sort();
            assert_eq!(sorted, vec!["A", "B", "C"]);
        }
    }

    #[test]
    fn test_unshuffle_restores_snapshot() {
        let mut queue = PlayQueue::new((0..10).map(|i| track(&i.to_string(), "a")).collect());
        let before = ids(&queue);
        let mut rng = StdRng::seed_from_u64(42);

        queue.select(4).unwrap();
        queue.toggle_shuffle(&mut rng, None).unwrap();
        assert!(queue.toggle_shuffle(&mut rng, None).map(|on| !on).unwrap());

        assert_eq!(ids(&queue), before);
        assert_eq!(queue.current_index(), Some(4));
    }

    #[test]
    fn test_shuffle_falls_back_to_zero_for_missing_anchor() {
        let mut queue = abc();
        let mut rng = StdRng::seed_from_u64(1);
        queue
            .toggle_shuffle(&mut rng, Some(&TrackId::new("gone")))
            .unwrap();
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn test_shuffle_small_queues() {
        let mut rng = StdRng::seed_from_u64(3);

        let mut empty = PlayQueue::default();
        assert!(empty.toggle_shuffle(&mut rng, None).unwrap_err().is_empty_queue());
        assert!(!empty.is_shuffled());

        let mut single = PlayQueue::new(vec![track("A", "x")]);
        assert!(single.toggle_shuffle(&mut rng, None).unwrap());
        assert_eq!(ids(&single), vec!["A"]);
        assert!(!single.toggle_shuffle(&mut rng, None).unwrap());
    }

    #[test]
    fn test_remove_shifts_position() {
        let mut queue = abc();
        queue.select(2).unwrap();
        let removal = queue.remove_at(0).unwrap();
        assert_eq!(removal.track.id.as_str(), "A");
        assert!(!removal.was_current);
        assert_eq!(queue.current().unwrap().id.as_str(), "C");
    }

    #[test]
    fn test_remove_current_moves_to_successor() {
        let mut queue = abc();
        queue.select(1).unwrap();
        assert!(queue.remove_at(1).unwrap().was_current);
        assert_eq!(queue.current().unwrap().id.as_str(), "C");

        // Removing the current last entry wraps to the front.
        queue.select(1).unwrap();
        queue.remove_at(1).unwrap();
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn test_remove_refuses_last_entry() {
        let mut queue = PlayQueue::new(vec![track("A", "x")]);
        assert!(matches!(queue.remove_at(0), Err(PlaybackError::WouldEmpty)));
        assert!(matches!(
            abc().remove_at(3),
            Err(PlaybackError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_remove_prunes_shuffle_snapshot() {
        let mut queue = abc();
        let mut rng = StdRng::seed_from_u64(9);
        queue.toggle_shuffle(&mut rng, None).unwrap();
        let b = queue.position_of(&TrackId::new("B")).unwrap();
        queue.remove_at(b).unwrap();

        queue.toggle_shuffle(&mut rng, None).unwrap();
        assert_eq!(ids(&queue), vec!["A", "C"]);
    }

    #[test]
    fn test_fisher_yates_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut items: Vec<u32> = (0..50).collect();
        shuffle(&mut items, &mut rng);
        assert_ne!(items, (0..50).collect::<Vec<_>>());
        items.sort_unstable();
        assert_eq!(items, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_labels() {
        assert_eq!(abc().labels()[1], "2. Song B - y");
    }
}
