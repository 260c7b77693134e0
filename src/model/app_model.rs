//! Main application model with state management

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use super::content::{ContentState, ContentView};
use super::player::{PlaybackInfo, PlayerCore};
use super::session::Session;
use super::types::{ActiveSection, AuthForm, AuthMode, Playlist, Song, UiState};

/// Main application model containing all state
pub struct AppModel {
    pub session: Option<Session>,
    player: Arc<Mutex<PlayerCore>>,
    pub ui_state: Arc<Mutex<UiState>>,
    pub content_state: Arc<Mutex<ContentState>>,
    pub should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new(player: PlayerCore) -> Self {
        Self {
            session: None,
            player: Arc::new(Mutex::new(player)),
            ui_state: Arc::new(Mutex::new(UiState::default())),
            content_state: Arc::new(Mutex::new(ContentState::default())),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub async fn get_session(&self) -> Option<Session> {
        self.session.clone()
    }

    // ========================================================================
    // Playback state
    // ========================================================================

    /// Handle to the single playback queue core.
    pub fn player(&self) -> Arc<Mutex<PlayerCore>> {
        self.player.clone()
    }

    pub async fn get_playback_info(&self) -> PlaybackInfo {
        self.player.lock().await.playback_info()
    }

    pub async fn get_queue_snapshot(&self) -> (Vec<Song>, Option<usize>) {
        let player = self.player.lock().await;
        (player.queue().to_vec(), player.current_index())
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }

    // ========================================================================
    // UI state
    // ========================================================================

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn cycle_section_forward(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.next();
    }

    pub async fn cycle_section_backward(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.prev();
    }

    pub async fn set_active_section(&self, section: ActiveSection) {
        let mut state = self.ui_state.lock().await;
        state.active_section = section;
    }

    pub async fn move_selection_up(&self) {
        let mut state = self.ui_state.lock().await;
        match state.active_section {
            ActiveSection::Library => {
                if state.library_selected > 0 {
                    state.library_selected -= 1;
                }
            }
            ActiveSection::Playlists => {
                if state.playlist_selected > 0 {
                    state.playlist_selected -= 1;
                }
            }
            _ => {}
        }
    }

    pub async fn move_selection_down(&self) {
        let mut state = self.ui_state.lock().await;
        match state.active_section {
            ActiveSection::Library => {
                if state.library_selected < state.library_items.len().saturating_sub(1) {
                    state.library_selected += 1;
                }
            }
            ActiveSection::Playlists => {
                if state.playlist_selected < state.playlists.len().saturating_sub(1) {
                    state.playlist_selected += 1;
                }
            }
            _ => {}
        }
    }

    pub async fn update_search_query(&self, query: String) {
        let mut state = self.ui_state.lock().await;
        state.search_query = query;
    }

    pub async fn append_to_search(&self, c: char) {
        let mut state = self.ui_state.lock().await;
        state.search_query.push(c);
    }

    pub async fn backspace_search(&self) {
        let mut state = self.ui_state.lock().await;
        state.search_query.pop();
    }

    pub async fn set_playlists(&self, playlists: Vec<Playlist>) {
        let mut state = self.ui_state.lock().await;
        state.playlists = playlists;
        state.playlist_selected = 0;
    }

    pub async fn set_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut state = self.ui_state.lock().await;
        if let Some(timestamp) = state.error_timestamp {
            if timestamp.elapsed().as_secs() > 5 {
                state.error_message = None;
                state.error_timestamp = None;
            }
        }
    }

    pub async fn show_help_popup(&self) {
        let mut state = self.ui_state.lock().await;
        state.show_help_popup = true;
    }

    pub async fn hide_help_popup(&self) {
        let mut state = self.ui_state.lock().await;
        state.show_help_popup = false;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }

    // ========================================================================
    // Auth form
    // ========================================================================

    pub async fn get_auth_form(&self) -> AuthForm {
        self.ui_state.lock().await.auth_form.clone()
    }

    pub async fn auth_input(&self, c: char) {
        let mut state = self.ui_state.lock().await;
        let focus = state.auth_form.focus;
        state.auth_form.field_mut(focus).push(c);
        state.auth_form.error = None;
    }

    pub async fn auth_backspace(&self) {
        let mut state = self.ui_state.lock().await;
        let focus = state.auth_form.focus;
        state.auth_form.field_mut(focus).pop();
    }

    pub async fn auth_focus_next(&self) {
        let mut state = self.ui_state.lock().await;
        state.auth_form.focus = state.auth_form.focus.next(state.auth_form.mode);
    }

    pub async fn auth_focus_prev(&self) {
        let mut state = self.ui_state.lock().await;
        state.auth_form.focus = state.auth_form.focus.prev(state.auth_form.mode);
    }

    pub async fn toggle_auth_mode(&self) {
        let mut state = self.ui_state.lock().await;
        state.auth_form.mode = match state.auth_form.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        state.auth_form.focus = super::types::AuthField::Email;
        state.auth_form.error = None;
    }

    pub async fn toggle_remember(&self) {
        let mut state = self.ui_state.lock().await;
        state.auth_form.remember = !state.auth_form.remember;
    }

    pub async fn set_auth_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.auth_form.error = Some(message);
    }

    pub async fn set_auth_submitting(&self, submitting: bool) {
        let mut state = self.ui_state.lock().await;
        state.auth_form.submitting = submitting;
    }

    pub async fn reset_auth_form(&self) {
        let mut state = self.ui_state.lock().await;
        state.auth_form = AuthForm::default();
    }

    // ========================================================================
    // Playlist picker / create-playlist overlays
    // ========================================================================

    pub async fn open_playlist_picker(&self, song: Song) {
        let mut state = self.ui_state.lock().await;
        state.playlist_picker_song = Some(song);
        state.picker_selected = 0;
    }

    pub async fn close_playlist_picker(&self) {
        let mut state = self.ui_state.lock().await;
        state.playlist_picker_song = None;
    }

    pub async fn is_playlist_picker_open(&self) -> bool {
        self.ui_state.lock().await.playlist_picker_song.is_some()
    }

    pub async fn picker_move_up(&self) {
        let mut state = self.ui_state.lock().await;
        if state.picker_selected > 0 {
            state.picker_selected -= 1;
        }
    }

    pub async fn picker_move_down(&self) {
        let mut state = self.ui_state.lock().await;
        if state.picker_selected < state.playlists.len().saturating_sub(1) {
            state.picker_selected += 1;
        }
    }

    /// The playlist currently highlighted in the picker together with the
    /// song waiting to be added.
    pub async fn get_picker_selection(&self) -> Option<(Playlist, Song)> {
        let state = self.ui_state.lock().await;
        let playlist = state.playlists.get(state.picker_selected)?.clone();
        let song = state.playlist_picker_song.clone()?;
        Some((playlist, song))
    }

    pub async fn open_create_playlist(&self) {
        let mut state = self.ui_state.lock().await;
        state.show_create_playlist = true;
        state.create_playlist_input.clear();
    }

    pub async fn close_create_playlist(&self) {
        let mut state = self.ui_state.lock().await;
        state.show_create_playlist = false;
        state.create_playlist_input.clear();
    }

    pub async fn is_create_playlist_open(&self) -> bool {
        self.ui_state.lock().await.show_create_playlist
    }

    pub async fn create_playlist_input_char(&self, c: char) {
        let mut state = self.ui_state.lock().await;
        state.create_playlist_input.push(c);
    }

    pub async fn create_playlist_backspace(&self) {
        let mut state = self.ui_state.lock().await;
        state.create_playlist_input.pop();
    }

    pub async fn get_create_playlist_input(&self) -> String {
        self.ui_state.lock().await.create_playlist_input.clone()
    }

    // ========================================================================
    // Content state
    // ========================================================================

    pub async fn get_content_state(&self) -> ContentState {
        self.content_state.lock().await.clone()
    }

    pub async fn set_songs(&self, title: String, songs: Vec<Song>) {
        let mut state = self.content_state.lock().await;
        if !matches!(state.view, ContentView::Empty) {
            let previous_view = state.view.clone();
            state.navigation_stack.push(previous_view);
        }
        state.view = ContentView::Songs {
            title,
            songs,
            selected: 0,
        };
        state.is_loading = false;
    }

    pub async fn show_queue_view(&self) {
        let mut state = self.content_state.lock().await;
        if !matches!(state.view, ContentView::Empty | ContentView::Queue { .. }) {
            let previous_view = state.view.clone();
            state.navigation_stack.push(previous_view);
        }
        state.view = ContentView::Queue { selected: 0 };
        state.is_loading = false;
    }

    pub async fn content_move_up(&self) {
        let mut state = self.content_state.lock().await;
        match &mut state.view {
            ContentView::Songs { selected, .. } | ContentView::Queue { selected } => {
                if *selected > 0 {
                    *selected -= 1;
                }
            }
            ContentView::Empty => {}
        }
    }

    /// Move the content selection down. `queue_len` bounds the queue view,
    /// whose items live in the player core rather than the content state.
    pub async fn content_move_down(&self, queue_len: usize) {
        let mut state = self.content_state.lock().await;
        match &mut state.view {
            ContentView::Songs { songs, selected, .. } => {
                if *selected < songs.len().saturating_sub(1) {
                    *selected += 1;
                }
            }
            ContentView::Queue { selected } => {
                if *selected < queue_len.saturating_sub(1) {
                    *selected += 1;
                }
            }
            ContentView::Empty => {}
        }
    }

    /// Selected song plus the full list it came from, for queue replacement.
    pub async fn get_selected_songs_context(&self) -> Option<(Vec<Song>, usize)> {
        let state = self.content_state.lock().await;
        if let ContentView::Songs { songs, selected, .. } = &state.view {
            if songs.is_empty() {
                return None;
            }
            return Some((songs.clone(), *selected));
        }
        None
    }

    pub async fn get_selected_song(&self) -> Option<Song> {
        let state = self.content_state.lock().await;
        if let ContentView::Songs { songs, selected, .. } = &state.view {
            return songs.get(*selected).cloned();
        }
        None
    }

    pub async fn get_selected_queue_index(&self) -> Option<usize> {
        let state = self.content_state.lock().await;
        if let ContentView::Queue { selected } = &state.view {
            Some(*selected)
        } else {
            None
        }
    }

    pub async fn navigate_back(&self) -> bool {
        let mut state = self.content_state.lock().await;
        if let Some(previous_view) = state.navigation_stack.pop() {
            state.view = previous_view;
            true
        } else {
            state.view = ContentView::Empty;
            false
        }
    }

    pub async fn set_content_loading(&self, loading: bool) {
        let mut state = self.content_state.lock().await;
        state.is_loading = loading;
    }

    /// Drop all fetched content and playback state. Used on logout.
    pub async fn clear_user_content(&self) {
        {
            let mut state = self.content_state.lock().await;
            state.view = ContentView::Empty;
            state.navigation_stack.clear();
            state.is_loading = false;
        }
        let mut ui = self.ui_state.lock().await;
        ui.playlists.clear();
        ui.playlist_selected = 0;
        ui.search_query.clear();
        ui.playlist_picker_song = None;
        ui.show_create_playlist = false;
    }
}
