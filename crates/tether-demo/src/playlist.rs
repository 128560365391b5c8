#![forbid(unsafe_code)]

//! Playlist of tracks backed by an immutable-style list.
//!
//! Every mutation builds the next list from the current one and then fires
//! the subject once. A [`ChangeAwareAdapter`](tether_adapters::ChangeAwareAdapter)
//! turns those fires into row-level operations.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tether_adapters::{DiffItem, ListModel};
use tether_core::{Observable, Subject};

pub const MIN_PLAYS: u8 = 1;
pub const MAX_PLAYS: u8 = 4;

/// Row colour, assigned round-robin as tracks are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Colour {
    Rose,
    Peach,
    Lemon,
    Mint,
    Sky,
}

impl Colour {
    pub const ALL: [Colour; 5] = [
        Colour::Rose,
        Colour::Peach,
        Colour::Lemon,
        Colour::Mint,
        Colour::Sky,
    ];

    #[must_use]
    pub fn for_id(id: u64) -> Self {
        Self::ALL[(id % Self::ALL.len() as u64) as usize]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rose => "rose",
            Self::Peach => "peach",
            Self::Lemon => "lemon",
            Self::Mint => "mint",
            Self::Sky => "sky",
        }
    }
}

/// One playlist row. Plays requested are always within
/// `MIN_PLAYS..=MAX_PLAYS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    id: u64,
    colour: Colour,
    plays: u8,
}

impl Track {
    /// Plays outside the allowed range are clamped.
    #[must_use]
    pub fn new(id: u64, colour: Colour, plays: u8) -> Self {
        Self {
            id,
            colour,
            plays: plays.clamp(MIN_PLAYS, MAX_PLAYS),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn colour(&self) -> Colour {
        self.colour
    }

    #[must_use]
    pub fn plays(&self) -> u8 {
        self.plays
    }

    #[must_use]
    pub fn can_increase_plays(&self) -> bool {
        self.plays < MAX_PLAYS
    }

    #[must_use]
    pub fn can_decrease_plays(&self) -> bool {
        self.plays > MIN_PLAYS
    }

    #[must_use]
    pub fn with_more_plays(self) -> Self {
        Self::new(self.id, self.colour, self.plays.saturating_add(1))
    }

    #[must_use]
    pub fn with_fewer_plays(self) -> Self {
        Self::new(self.id, self.colour, self.plays.saturating_sub(1))
    }
}

impl DiffItem for Track {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }

    fn same_content(&self, other: &Self) -> bool {
        self.plays == other.plays && self.colour == other.colour
    }
}

#[derive(Debug, Default)]
struct PlaylistState {
    tracks: Vec<Track>,
    next_id: u64,
}

#[derive(Debug)]
pub struct Playlist {
    subject: Subject,
    state: Mutex<PlaylistState>,
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new(Subject::new("playlist"))
    }
}

impl Playlist {
    #[must_use]
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            state: Mutex::new(PlaylistState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlaylistState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `edit` and fire once if it reports a change.
    fn update(&self, op: &'static str, edit: impl FnOnce(&mut PlaylistState) -> bool) {
        let (changed, len) = {
            let mut state = self.lock();
            let changed = edit(&mut state);
            (changed, state.tracks.len())
        };
        if changed {
            tracing::info!(op, len, "playlist updated");
            self.subject.notify();
        } else {
            tracing::debug!(op, "playlist unchanged");
        }
    }

    #[must_use]
    pub fn tracks(&self) -> Vec<Track> {
        self.lock().tracks.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().tracks.is_empty()
    }

    #[must_use]
    pub fn total_plays(&self) -> u32 {
        self.lock().tracks.iter().map(|t| u32::from(t.plays)).sum()
    }

    /// Append `n` fresh tracks with one play each.
    pub fn add_tracks(&self, n: usize) {
        self.update("add_tracks", |state| {
            for _ in 0..n {
                let id = state.next_id;
                state.next_id += 1;
                state.tracks.push(Track::new(id, Colour::for_id(id), MIN_PLAYS));
            }
            n > 0
        });
    }

    /// Drop the first `n` tracks (all of them if fewer remain).
    pub fn remove_first(&self, n: usize) {
        self.update("remove_first", |state| {
            let count = n.min(state.tracks.len());
            state.tracks.drain(..count);
            count > 0
        });
    }

    pub fn remove_all(&self) {
        self.update("remove_all", |state| {
            let had_tracks = !state.tracks.is_empty();
            state.tracks.clear();
            had_tracks
        });
    }

    pub fn remove_track(&self, id: u64) {
        self.update("remove_track", |state| {
            let before = state.tracks.len();
            state.tracks.retain(|t| t.id != id);
            before != state.tracks.len()
        });
    }

    pub fn increase_plays(&self, id: u64) {
        self.update("increase_plays", |state| {
            replace_track(&mut state.tracks, id, Track::with_more_plays)
        });
    }

    pub fn decrease_plays(&self, id: u64) {
        self.update("decrease_plays", |state| {
            replace_track(&mut state.tracks, id, Track::with_fewer_plays)
        });
    }
}

fn replace_track(tracks: &mut [Track], id: u64, next: fn(Track) -> Track) -> bool {
    match tracks.iter_mut().find(|t| t.id == id) {
        Some(track) => {
            let updated = next(*track);
            let changed = updated != *track;
            *track = updated;
            changed
        }
        None => false,
    }
}

impl Observable for Playlist {
    fn subject(&self) -> &Subject {
        &self.subject
    }
}

impl ListModel for Playlist {
    type Item = Track;

    fn item_count(&self) -> usize {
        self.len()
    }

    fn item_at(&self, position: usize) -> Option<Track> {
        self.lock().tracks.get(position).copied()
    }

    fn snapshot(&self) -> Vec<Track> {
        self.tracks()
    }
}
