//! Model module - Application state and data types
//!
//! This module contains all the data structures and state management for the application.
//! It is organized into submodules by responsibility:
//!
//! - `types`: Core type definitions (songs, playlists, users, UI state)
//! - `player`: The playback queue core driving the audio transport
//! - `content`: Content view data for the main area
//! - `api_client`: HTTP client for the music server API
//! - `session`: Session state machine and credential lifecycle
//! - `app_model`: Main application model with state management methods

mod types;
mod player;
mod content;
mod api_client;
mod session;
mod app_model;

// Re-export all public types for convenient access
pub use types::{
    ActiveSection, AuthField, AuthForm, AuthMode, LibraryItem, Playlist, Song, UiState, User,
};

pub use player::{PlaybackInfo, PlayerCore, PlayerState};

pub use content::{ContentState, ContentView};

pub use api_client::{ApiClient, ApiError, ApiResult, AuthResponse, stream_url};

pub use session::{Session, SessionPhase, SessionState};

pub use app_model::AppModel;
