// src/player.rs
use crate::episode::Episode;
use crate::event::PlayerEvent;
use chrono::Utc;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Read-only view of the player handed to renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub episode_list: Vec<Episode>,
    pub current_episode_index: usize,
    pub is_playing: bool,
    pub is_looping: bool,
    pub is_shuffling: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PlayerSnapshot {
    pub fn current_episode(&self) -> Option<&Episode> {
        self.episode_list.get(self.current_episode_index)
    }
}

/// Owns the playback queue and transport flags.
///
/// Every operation is total and emits [`PlayerEvent::Changed`] once it has run.
/// `play_list` trusts its caller: an index outside the list is stored as is and
/// `current_episode` then returns `None`.
#[derive(Debug)]
pub struct PlayerStore {
    episode_list: Vec<Episode>,
    current_episode_index: usize,
    is_playing: bool,
    is_looping: bool,
    is_shuffling: bool,
    rng: StdRng,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic shuffle, for tests and reproducible sessions.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            episode_list: Vec::new(),
            current_episode_index: 0,
            is_playing: false,
            is_looping: false,
            is_shuffling: false,
            rng,
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    fn notify(&self, operation: &'static str) {
        trace!(
            "Player: {} -> index {} of {}, playing={} looping={} shuffling={}",
            operation,
            self.current_episode_index,
            self.episode_list.len(),
            self.is_playing,
            self.is_looping,
            self.is_shuffling
        );
        // No receivers is fine: nobody is rendering yet.
        let _ = self.event_tx.send(PlayerEvent::Changed { operation, timestamp: Utc::now() });
    }

    // ======================================= Queue ===============================================

    pub fn play(&mut self, episode: Episode) {
        debug!("Player: play '{}'", episode.title());
        self.episode_list = vec![episode];
        self.current_episode_index = 0;
        self.is_playing = true;
        self.notify("play");
    }

    pub fn play_list(&mut self, list: Vec<Episode>, index: usize) {
        debug!("Player: play list of {} at index {}", list.len(), index);
        self.episode_list = list;
        self.current_episode_index = index;
        self.is_playing = true;
        self.notify("play_list");
    }

    pub fn clear_player_state(&mut self) {
        debug!("Player: clear");
        self.episode_list.clear();
        self.current_episode_index = 0;
        self.notify("clear_player_state");
    }

    // ===================================== Transport =============================================

    pub fn toggle_play(&mut self) {
        self.is_playing = !self.is_playing;
        self.notify("toggle_play");
    }

    pub fn set_playing_state(&mut self, state: bool) {
        self.is_playing = state;
        self.notify("set_playing_state");
    }

    pub fn toggle_loop(&mut self) {
        self.is_looping = !self.is_looping;
        self.notify("toggle_loop");
    }

    pub fn toggle_shuffle(&mut self) {
        self.is_shuffling = !self.is_shuffling;
        self.notify("toggle_shuffle");
    }

    // ==================================== Navigation =============================================

    pub fn play_next(&mut self) {
        if self.is_shuffling {
            // An empty queue has no index to pick.
            if !self.episode_list.is_empty() {
                self.current_episode_index = self.rng.random_range(0..self.episode_list.len());
            }
        } else if self.has_next() {
            self.current_episode_index += 1;
        }
        self.notify("play_next");
    }

    pub fn play_previous(&mut self) {
        if self.has_previous() {
            self.current_episode_index -= 1;
        }
        self.notify("play_previous");
    }

    // ===================================== Getters ===============================================

    /// True while shuffling regardless of queue length.
    pub fn has_next(&self) -> bool {
        self.is_shuffling || self.current_episode_index + 1 < self.episode_list.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current_episode_index > 0
    }

    pub fn episode_list(&self) -> &[Episode] {
        &self.episode_list
    }

    pub fn current_episode_index(&self) -> usize {
        self.current_episode_index
    }

    pub fn current_episode(&self) -> Option<&Episode> {
        self.episode_list.get(self.current_episode_index)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_looping(&self) -> bool {
        self.is_looping
    }

    pub fn is_shuffling(&self) -> bool {
        self.is_shuffling
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            episode_list: self.episode_list.clone(),
            current_episode_index: self.current_episode_index,
            is_playing: self.is_playing,
            is_looping: self.is_looping,
            is_shuffling: self.is_shuffling,
            has_next: self.has_next(),
            has_previous: self.has_previous(),
        }
    }
}
