//! Library, playlist and search loading

use crate::model::ActiveSection;
use super::AppController;

impl AppController {
    /// Fetch everything the main screen needs after authentication.
    pub async fn load_initial_content(&self) {
        self.load_user_playlists().await;
        self.load_songs().await;
    }

    pub async fn load_songs(&self) {
        let model = self.model.lock().await;
        let Some(session) = model.get_session().await else {
            return;
        };
        model.set_content_loading(true).await;
        drop(model);

        match session.api().get_songs().await {
            Ok(songs) => {
                tracing::info!(count = songs.len(), "Loaded song library");
                let model = self.model.lock().await;
                model.set_songs("All songs".to_string(), songs).await;
                model.set_active_section(ActiveSection::MainContent).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load songs");
                let model = self.model.lock().await;
                model.set_content_loading(false).await;
                drop(model);
                self.handle_api_error(&e).await;
            }
        }
    }

    pub async fn perform_search(&self, query: &str) {
        let model = self.model.lock().await;
        let Some(session) = model.get_session().await else {
            return;
        };
        model.set_content_loading(true).await;
        drop(model);

        tracing::debug!(query, "Searching songs");
        match session.api().search_songs(query).await {
            Ok(songs) => {
                tracing::info!(query, count = songs.len(), "Search finished");
                let model = self.model.lock().await;
                model
                    .set_songs(format!("Search: {}", query), songs)
                    .await;
                model.set_active_section(ActiveSection::MainContent).await;
            }
            Err(e) => {
                tracing::error!(query, error = %e, "Search failed");
                let model = self.model.lock().await;
                model.set_content_loading(false).await;
                drop(model);
                self.handle_api_error(&e).await;
            }
        }
    }

    pub async fn load_user_playlists(&self) {
        let model = self.model.lock().await;
        let Some(session) = model.get_session().await else {
            return;
        };
        drop(model);

        match session.api().get_playlists().await {
            Ok(playlists) => {
                tracing::info!(count = playlists.len(), "Loaded playlists");
                let model = self.model.lock().await;
                model.set_playlists(playlists).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load playlists");
                self.handle_api_error(&e).await;
            }
        }
    }

    pub async fn create_playlist(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            let model = self.model.lock().await;
            model.set_error("Playlist name is required.".to_string()).await;
            return;
        }

        let model = self.model.lock().await;
        let Some(session) = model.get_session().await else {
            return;
        };
        drop(model);

        match session.api().create_playlist(name).await {
            Ok(playlist) => {
                tracing::info!(playlist_id = %playlist.id, name = %playlist.name, "Playlist created");
                self.load_user_playlists().await;
            }
            Err(e) => {
                tracing::error!(name, error = %e, "Failed to create playlist");
                self.handle_api_error(&e).await;
            }
        }
    }

    pub async fn add_song_to_playlist(&self, playlist_id: &str, song_id: &str) {
        let model = self.model.lock().await;
        let Some(session) = model.get_session().await else {
            return;
        };
        drop(model);

        match session.api().add_song_to_playlist(playlist_id, song_id).await {
            Ok(()) => {
                tracing::info!(playlist_id, song_id, "Song added to playlist");
                // The sidebar shows song counts, refresh them.
                self.load_user_playlists().await;
            }
            Err(e) => {
                tracing::error!(playlist_id, song_id, error = %e, "Failed to add song to playlist");
                self.handle_api_error(&e).await;
            }
        }
    }

    pub async fn open_library_item(&self, index: usize) {
        match index {
            0 => self.load_songs().await,
            1 => {
                let model = self.model.lock().await;
                model.show_queue_view().await;
                model.set_active_section(ActiveSection::MainContent).await;
            }
            _ => {}
        }
    }
}
