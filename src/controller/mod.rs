//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input,
//! coordinates between the model and view, and manages playback operations.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key event handling
//! - `auth`: Login/register form submission and logout
//! - `playback`: Playback control methods
//! - `navigation`: Library/playlist/search loading
//! - `transport_events`: Audio transport event listener

mod auth;
mod input;
mod navigation;
mod playback;
mod transport_events;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::model::{ApiError, AppModel};

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<Mutex<AppModel>>,
}

impl AppController {
    pub fn new(model: Arc<Mutex<AppModel>>) -> Self {
        Self { model }
    }

    pub(crate) fn format_error(error: &ApiError) -> String {
        match error {
            ApiError::Unauthorized => "Session expired. Please log in again.".to_string(),
            ApiError::Network(_) => "Cannot reach the server. Check your connection.".to_string(),
            ApiError::Api { status, message } => format!("Server error {}: {}", status, message),
            ApiError::Parse(_) => "Unexpected response from the server.".to_string(),
        }
    }

    /// Shared failure path for data fetches: an unauthorized response forces
    /// a logout, everything else becomes a transient error message.
    pub(crate) async fn handle_api_error(&self, error: &ApiError) {
        let model = self.model.lock().await;
        if matches!(error, ApiError::Unauthorized) {
            if let Some(session) = model.get_session().await {
                session.handle_unauthorized().await;
            }
        }
        model.set_error(Self::format_error(error)).await;
    }
}
