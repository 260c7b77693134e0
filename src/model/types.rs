//! Core type definitions for the application

use std::time::Instant;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A song as served by the remote API.
///
/// Immutable once fetched; the queue stores clones (string fields only).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    /// Track length in whole seconds as reported by the server.
    pub duration: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Profile of the authenticated user.
#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A playlist summary. The list endpoint reports a song count, not contents.
#[derive(Clone, Debug, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub songs_count: u32,
}

/// Which section of the UI is currently active/focused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveSection {
    Search,
    Library,
    Playlists,
    MainContent,
}

impl ActiveSection {
    pub fn next(self) -> Self {
        match self {
            ActiveSection::Search => ActiveSection::Library,
            ActiveSection::Library => ActiveSection::Playlists,
            ActiveSection::Playlists => ActiveSection::MainContent,
            ActiveSection::MainContent => ActiveSection::Search,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ActiveSection::Search => ActiveSection::MainContent,
            ActiveSection::Library => ActiveSection::Search,
            ActiveSection::Playlists => ActiveSection::Library,
            ActiveSection::MainContent => ActiveSection::Playlists,
        }
    }
}

/// An item in the Library section
#[derive(Clone, Debug)]
pub struct LibraryItem {
    pub name: String,
}

/// Whether the auth screen shows the login or the register form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Focused input on the auth screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthField {
    Email,
    Username,
    Password,
}

impl AuthField {
    /// Cycle forward through the fields visible in the given mode. The
    /// username field only exists on the register form.
    pub fn next(self, mode: AuthMode) -> Self {
        match (self, mode) {
            (AuthField::Email, AuthMode::Login) => AuthField::Password,
            (AuthField::Email, AuthMode::Register) => AuthField::Username,
            (AuthField::Username, _) => AuthField::Password,
            (AuthField::Password, _) => AuthField::Email,
        }
    }

    pub fn prev(self, mode: AuthMode) -> Self {
        match (self, mode) {
            (AuthField::Email, _) => AuthField::Password,
            (AuthField::Username, _) => AuthField::Email,
            (AuthField::Password, AuthMode::Login) => AuthField::Email,
            (AuthField::Password, AuthMode::Register) => AuthField::Username,
        }
    }
}

/// State of the login/register form shown while the session is anonymous.
#[derive(Clone, Debug)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub username: String,
    pub password: String,
    pub remember: bool,
    pub focus: AuthField,
    pub error: Option<String>,
    pub submitting: bool,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            email: String::new(),
            username: String::new(),
            password: String::new(),
            remember: false,
            focus: AuthField::Email,
            error: None,
            submitting: false,
        }
    }
}

impl AuthForm {
    pub fn field_mut(&mut self, field: AuthField) -> &mut String {
        match field {
            AuthField::Email => &mut self.email,
            AuthField::Username => &mut self.username,
            AuthField::Password => &mut self.password,
        }
    }
}

/// UI state for the application
#[derive(Clone)]
pub struct UiState {
    pub active_section: ActiveSection,
    pub search_query: String,
    pub library_items: Vec<LibraryItem>,
    pub library_selected: usize,
    pub playlists: Vec<Playlist>,
    pub playlist_selected: usize,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub show_help_popup: bool,
    pub auth_form: AuthForm,
    /// Song waiting to be added to a playlist via the picker overlay.
    pub playlist_picker_song: Option<Song>,
    pub picker_selected: usize,
    pub show_create_playlist: bool,
    pub create_playlist_input: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_section: ActiveSection::Search,
            search_query: String::new(),
            library_items: vec![
                LibraryItem { name: "All songs".to_string() },
                LibraryItem { name: "Queue".to_string() },
            ],
            library_selected: 0,
            playlists: vec![], // Loaded from the server after login
            playlist_selected: 0,
            error_message: None,
            error_timestamp: None,
            show_help_popup: false,
            auth_form: AuthForm::default(),
            playlist_picker_song: None,
            picker_selected: 0,
            show_create_playlist: false,
            create_playlist_input: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_field_cycle_skips_username_on_login() {
        assert_eq!(AuthField::Email.next(AuthMode::Login), AuthField::Password);
        assert_eq!(AuthField::Password.next(AuthMode::Login), AuthField::Email);
    }

    #[test]
    fn auth_field_cycle_visits_username_on_register() {
        assert_eq!(AuthField::Email.next(AuthMode::Register), AuthField::Username);
        assert_eq!(AuthField::Username.next(AuthMode::Register), AuthField::Password);
        assert_eq!(AuthField::Password.prev(AuthMode::Register), AuthField::Username);
    }
}
