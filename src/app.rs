use crate::episode::Episode;
use crate::episode_download::FeedState;
use crate::event::PlayerEvent;
use crate::playback::PlaybackClock;
use crate::player::{PlayerSnapshot, PlayerStore};
use crate::ui::format_episode_details;
use crate::widgets::scrollable_paragraph::ScrollableParagraphState;
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, info, warn};
use ratatui::{Terminal, backend::Backend};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{self, error::TryRecvError};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum FocusedPanel {
    #[default]
    Latest,
    AllEpisodes,
    ShowNotes,
}

pub struct App {
    pub should_quit: bool,
    pub feed_state: FeedState,
    pub selected_latest_index: Option<usize>,
    pub selected_all_index: Option<usize>,
    pub focused_panel: FocusedPanel,
    /// The list whose selection the show notes follow.
    pub active_list: FocusedPanel,
    pub show_notes_state: ScrollableParagraphState,
    pub player: PlayerStore,
    /// Last snapshot pulled after a player change notification.
    pub player_snapshot: PlayerSnapshot,
    pub clock: PlaybackClock,
    player_rx: broadcast::Receiver<PlayerEvent>,
}

impl App {
    pub fn new(feed_state: FeedState, player: PlayerStore) -> App {
        let player_rx = player.subscribe();
        let player_snapshot = player.snapshot();
        let mut app = App {
            should_quit: false,
            feed_state,
            selected_latest_index: None,
            selected_all_index: None,
            focused_panel: FocusedPanel::default(),
            active_list: FocusedPanel::Latest,
            show_notes_state: ScrollableParagraphState::default(),
            player,
            player_snapshot,
            clock: PlaybackClock::new(),
            player_rx,
        };

        app.select_initial_items();

        app
    }

    // =================================== Update show notes =======================================

    // Called whenever the selected episode changes.
    fn update_show_notes_content(&mut self) {
        let new_content = match (&self.feed_state, self.selected_episode()) {
            (_, Some(episode)) => format_episode_details(episode),
            (FeedState::Unavailable(_), None) => "Episódios indisponíveis.".to_string(),
            (FeedState::Loaded(_), None) => "Selecione um episódio para ver os detalhes.".to_string(),
        };
        self.show_notes_state.set_content(new_content);
    }

    pub fn select_initial_items(&mut self) {
        let (latest_len, all_len) = self.list_lengths();
        self.selected_latest_index = if latest_len > 0 { Some(0) } else { None };
        self.selected_all_index = if all_len > 0 { Some(0) } else { None };
        self.focused_panel = FocusedPanel::Latest;
        self.active_list = FocusedPanel::Latest;
        self.update_show_notes_content();
    }

    fn list_lengths(&self) -> (usize, usize) {
        self.feed_state.feed().map_or((0, 0), |feed| (feed.latest.len(), feed.all.len()))
    }

    // --- Navigation methods for focused panel ---
    pub fn focus_next_panel(&mut self) {
        self.set_focus(match self.focused_panel {
            FocusedPanel::Latest => FocusedPanel::AllEpisodes,
            FocusedPanel::AllEpisodes => FocusedPanel::ShowNotes,
            FocusedPanel::ShowNotes => FocusedPanel::Latest,
        });
    }

    pub fn focus_prev_panel(&mut self) {
        self.set_focus(match self.focused_panel {
            FocusedPanel::Latest => FocusedPanel::ShowNotes,
            FocusedPanel::AllEpisodes => FocusedPanel::Latest,
            FocusedPanel::ShowNotes => FocusedPanel::AllEpisodes,
        });
    }

    fn set_focus(&mut self, panel: FocusedPanel) {
        self.focused_panel = panel;
        if panel != FocusedPanel::ShowNotes && panel != self.active_list {
            self.active_list = panel;
            self.update_show_notes_content();
        }
    }

    // ==================================== Scrolling lists ========================================
    fn step_selection(selected: Option<usize>, len: usize, forward: bool) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(match (selected, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        })
    }

    pub fn select_next_item_in_focused_list(&mut self) {
        self.move_selection(true);
    }

    pub fn select_prev_item_in_focused_list(&mut self) {
        self.move_selection(false);
    }

    fn move_selection(&mut self, forward: bool) {
        let (latest_len, all_len) = self.list_lengths();
        match self.focused_panel {
            FocusedPanel::Latest => {
                self.selected_latest_index =
                    Self::step_selection(self.selected_latest_index, latest_len, forward);
            }
            FocusedPanel::AllEpisodes => {
                self.selected_all_index =
                    Self::step_selection(self.selected_all_index, all_len, forward);
            }
            FocusedPanel::ShowNotes => return,
        }
        self.update_show_notes_content();
    }

    // ===================================== Player intents ========================================

    /// Queues the whole feed and starts at the selected episode.
    pub fn play_selected_in_list(&mut self) {
        let Some(feed) = self.feed_state.feed() else {
            return;
        };
        let index = match self.active_list {
            FocusedPanel::AllEpisodes => self.selected_all_index.map(|row| feed.all_index(row)),
            _ => self.selected_latest_index.map(|row| feed.latest_index(row)),
        };
        if let Some(index) = index {
            let list = feed.playback_list();
            info!("App: playing list of {} from index {}", list.len(), index);
            self.player.play_list(list, index);
        }
    }

    /// Queues only the selected episode.
    pub fn play_selected_alone(&mut self) {
        if let Some(episode) = self.selected_episode().cloned() {
            info!("App: playing '{}' alone", episode.title());
            self.player.play(episode);
        }
    }

    /// Pulls a fresh snapshot if the player announced any change. Returns whether it did.
    pub fn refresh_player_snapshot(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.player_rx.try_recv() {
                Ok(PlayerEvent::Changed { operation, .. }) => {
                    debug!("App: player changed by {}", operation);
                    changed = true;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("App: skipped {} player notifications", skipped);
                    changed = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if changed {
            self.player_snapshot = self.player.snapshot();
            self.clock.sync(&self.player);
        }
        changed
    }

    pub fn on_tick(&mut self, dt: Duration) {
        self.clock.tick(&mut self.player, dt);
        self.refresh_player_snapshot();
    }

    // --- Key Handler ---
    pub fn on_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char(' ') => self.player.toggle_play(),
            KeyCode::Char('n') => self.player.play_next(),
            KeyCode::Char('b') => self.player.play_previous(),
            KeyCode::Char('l') => self.player.toggle_loop(),
            KeyCode::Char('s') => self.player.toggle_shuffle(),
            KeyCode::Char('c') => self.player.clear_player_state(),
            KeyCode::Char('p') => self.play_selected_alone(),
            KeyCode::Enter => self.play_selected_in_list(),
            KeyCode::Right | KeyCode::Tab => self.focus_next_panel(),
            KeyCode::Left | KeyCode::BackTab => self.focus_prev_panel(),
            _ => match self.focused_panel {
                FocusedPanel::Latest | FocusedPanel::AllEpisodes => match key {
                    KeyCode::Down => self.select_next_item_in_focused_list(),
                    KeyCode::Up => self.select_prev_item_in_focused_list(),
                    _ => {}
                },
                FocusedPanel::ShowNotes => match key {
                    KeyCode::Down => self.show_notes_state.scroll_down(1),
                    KeyCode::Up => self.show_notes_state.scroll_up(1),
                    KeyCode::PageDown => self.show_notes_state.scroll_down(5),
                    KeyCode::PageUp => self.show_notes_state.scroll_up(5),
                    _ => {}
                },
            },
        }
        self.refresh_player_snapshot();
    }

    // --- Getters for selected items ---
    pub fn selected_episode(&self) -> Option<&Episode> {
        let feed = self.feed_state.feed()?;
        match self.active_list {
            FocusedPanel::AllEpisodes => self.selected_all_index.and_then(|i| feed.all.get(i)),
            _ => self.selected_latest_index.and_then(|i| feed.latest.get(i)),
        }
    }
}

pub fn start_ui(mut app: App) -> Result<()> {
    // Set up the terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app_loop(&mut terminal, &mut app);

    // Restore the terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

pub fn run_app_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let mut last_tick = Instant::now();
    while !app.should_quit {
        let frame_size = terminal.get_frame().size(); // Fetch once before drawing
        crate::ui::prepare_ui_layout(app, frame_size);
        terminal.draw(|f| crate::ui::ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key_event) = event::read()? {
                // Windows reports releases too.
                if key_event.kind == KeyEventKind::Press {
                    app.on_key(key_event.code);
                }
            }
        }

        let now = Instant::now();
        app.on_tick(now - last_tick);
        last_tick = now;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::test_support::sample_episode;
    use crate::episode_factory::{DEFAULT_LATEST_COUNT, EpisodeFeed};

    fn app_with(ids: &[&str]) -> App {
        let feed = EpisodeFeed::partition(
            ids.iter().map(|id| sample_episode(id)).collect(),
            DEFAULT_LATEST_COUNT,
        );
        App::new(FeedState::Loaded(feed), PlayerStore::with_seed(3))
    }

    #[test]
    fn test_initial_selection() {
        let app = app_with(&["a", "b", "c"]);
        assert_eq!(app.selected_latest_index, Some(0));
        assert_eq!(app.selected_all_index, Some(0));
        assert_eq!(app.selected_episode().map(|e| e.id().as_str()), Some("a"));
    }

    #[test]
    fn test_enter_on_all_episodes_uses_offset_index() {
        let mut app = app_with(&["a", "b", "c", "d"]);
        app.on_key(KeyCode::Tab);
        app.on_key(KeyCode::Down);
        app.on_key(KeyCode::Enter);

        let snapshot = &app.player_snapshot;
        assert_eq!(snapshot.episode_list.len(), 4);
        assert_eq!(snapshot.current_episode_index, 3);
        assert_eq!(snapshot.current_episode().map(|e| e.id().as_str()), Some("d"));
        assert!(snapshot.is_playing);
    }

    #[test]
    fn test_play_alone_then_transport_keys() {
        let mut app = app_with(&["a", "b", "c"]);
        app.on_key(KeyCode::Down);
        app.on_key(KeyCode::Char('p'));
        assert_eq!(app.player_snapshot.episode_list, vec![sample_episode("b")]);

        app.on_key(KeyCode::Char(' '));
        assert!(!app.player_snapshot.is_playing);
        app.on_key(KeyCode::Char('l'));
        app.on_key(KeyCode::Char('s'));
        assert!(app.player_snapshot.is_looping);
        assert!(app.player_snapshot.is_shuffling);
        assert!(app.player_snapshot.has_next);

        app.on_key(KeyCode::Char('c'));
        assert!(app.player_snapshot.episode_list.is_empty());
    }

    #[test]
    fn test_unavailable_feed_ignores_play() {
        let mut app =
            App::new(FeedState::Unavailable("offline".to_string()), PlayerStore::with_seed(3));
        app.on_key(KeyCode::Enter);
        app.on_key(KeyCode::Char('p'));

        assert!(app.player_snapshot.episode_list.is_empty());
        assert_eq!(app.show_notes_state.content, "Episódios indisponíveis.");
    }

    #[test]
    fn test_quit() {
        let mut app = app_with(&["a"]);
        app.on_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
