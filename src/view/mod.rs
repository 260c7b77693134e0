//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (formatting, truncation)
//! - `auth`: Login/register screen
//! - `layout`: Main layout structure (top bar, sidebar)
//! - `content`: Main content area rendering
//! - `progress`: Transport bar rendering
//! - `overlays`: Modal overlays (error, playlist picker, help)

mod auth;
mod content;
mod layout;
mod overlays;
mod progress;
mod utils;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{ContentState, PlaybackInfo, SessionPhase, SessionState, Song, UiState};

pub struct AppView;

impl AppView {
    pub fn render(
        frame: &mut Frame,
        session: &SessionState,
        playback: &PlaybackInfo,
        queue: &[Song],
        ui_state: &UiState,
        content_state: &ContentState,
    ) {
        if session.phase != SessionPhase::Authenticated {
            auth::render_auth_screen(frame, ui_state, session.phase);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search bar + user
                Constraint::Min(0),    // Main content (sidebar + content)
                Constraint::Length(3), // Transport bar
            ])
            .split(frame.area());

        let username = session
            .user
            .as_ref()
            .map(|user| user.username.as_str())
            .unwrap_or("unknown");

        // Top bar: Search + signed-in user
        layout::render_top_bar(frame, chunks[0], ui_state, username);

        // Middle: Sidebar (Library + Playlists) and Main Content
        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30), // Sidebar (Library + Playlists)
                Constraint::Percentage(70), // Main content
            ])
            .split(chunks[1]);

        layout::render_sidebar(frame, main_chunks[0], ui_state);

        let playing_song_id = playback.song.as_ref().map(|song| song.id.as_str());
        content::render_main_content(
            frame,
            main_chunks[1],
            ui_state,
            content_state,
            queue,
            playback.queue_position,
            playing_song_id,
        );

        // Bottom: Transport bar with song info and progress
        progress::render_progress_bar(frame, chunks[2], playback);

        // Error notification overlay (if there's an error)
        if ui_state.error_message.is_some() {
            overlays::render_error_notification(frame, ui_state);
        }

        // Add-to-playlist picker overlay (if open)
        if ui_state.playlist_picker_song.is_some() {
            overlays::render_playlist_picker(frame, ui_state);
        }

        // Create-playlist input overlay (if open)
        if ui_state.show_create_playlist {
            overlays::render_create_playlist(frame, ui_state);
        }

        // Help popup overlay (if open)
        if ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
