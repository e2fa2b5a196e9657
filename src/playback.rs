// src/playback.rs
use crate::episode::EpisodeID;
use crate::player::PlayerStore;
use log::info;
use std::time::Duration;

/// What happened when the current episode ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeEnd {
    Restarted,
    Advanced,
    Cleared,
}

/// Elapsed time of whatever the player is on.
///
/// No audio is produced. The clock only advances while the player reports
/// `is_playing`, and it drives the end-of-episode transitions an audio element would:
/// restart when looping, otherwise next, otherwise clear.
#[derive(Debug, Default)]
pub struct PlaybackClock {
    elapsed: Duration,
    tracked: Option<(EpisodeID, usize)>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Fraction of the current episode already played, in `[0, 1]`.
    pub fn progress(&self, store: &PlayerStore) -> f64 {
        match store.current_episode() {
            Some(episode) if episode.duration() > 0 => {
                (self.elapsed.as_secs_f64() / episode.duration() as f64).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// Resets the clock when the player moved to another episode.
    pub fn sync(&mut self, store: &PlayerStore) {
        let current = store
            .current_episode()
            .map(|episode| (episode.id().clone(), store.current_episode_index()));
        if current != self.tracked {
            self.elapsed = Duration::ZERO;
            self.tracked = current;
        }
    }

    pub fn tick(&mut self, store: &mut PlayerStore, dt: Duration) -> Option<EpisodeEnd> {
        self.sync(store);
        if !store.is_playing() {
            return None;
        }
        let duration = Duration::from_secs(store.current_episode()?.duration());

        self.elapsed += dt;
        if self.elapsed < duration {
            return None;
        }

        self.elapsed = Duration::ZERO;
        let end = if store.is_looping() {
            EpisodeEnd::Restarted
        } else if store.has_next() {
            store.play_next();
            EpisodeEnd::Advanced
        } else {
            store.clear_player_state();
            EpisodeEnd::Cleared
        };
        info!("Playback: episode ended ({:?})", end);
        self.sync(store);
        Some(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::Episode;
    use crate::episode::test_support::sample_episode;

    const HOUR: Duration = Duration::from_secs(3600);

    fn two_episode_store() -> PlayerStore {
        let mut store = PlayerStore::with_seed(7);
        let list: Vec<Episode> = vec![sample_episode("a"), sample_episode("b")];
        store.play_list(list, 0);
        store
    }

    #[test]
    fn test_clock_advances_only_while_playing() {
        let mut store = two_episode_store();
        let mut clock = PlaybackClock::new();

        clock.tick(&mut store, Duration::from_secs(10));
        store.set_playing_state(false);
        clock.tick(&mut store, Duration::from_secs(10));

        assert_eq!(clock.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn test_end_advances_to_next() {
        let mut store = two_episode_store();
        let mut clock = PlaybackClock::new();

        assert_eq!(clock.tick(&mut store, HOUR), Some(EpisodeEnd::Advanced));
        assert_eq!(store.current_episode_index(), 1);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_end_of_last_episode_clears() {
        let mut store = two_episode_store();
        store.play_next();
        let mut clock = PlaybackClock::new();

        assert_eq!(clock.tick(&mut store, HOUR), Some(EpisodeEnd::Cleared));
        assert!(store.episode_list().is_empty());
    }

    #[test]
    fn test_end_while_looping_restarts() {
        let mut store = two_episode_store();
        store.toggle_loop();
        let mut clock = PlaybackClock::new();

        assert_eq!(clock.tick(&mut store, HOUR), Some(EpisodeEnd::Restarted));
        assert_eq!(store.current_episode_index(), 0);
        assert!(store.is_playing());
    }

    #[test]
    fn test_switching_episode_resets_progress() {
        let mut store = two_episode_store();
        let mut clock = PlaybackClock::new();
        clock.tick(&mut store, Duration::from_secs(1800));
        assert!((clock.progress(&store) - 0.5).abs() < f64::EPSILON);

        store.play_next();
        clock.sync(&store);
        assert_eq!(clock.progress(&store), 0.0);
    }
}
