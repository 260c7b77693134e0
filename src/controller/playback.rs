//! Playback control methods

use super::AppController;

const VOLUME_STEP: f32 = 0.05;
const SEEK_STEP_SECS: f64 = 5.0;

impl AppController {
    /// Play the highlighted item: in a song list this replaces the queue
    /// with the whole list starting at the selection, in the queue view it
    /// jumps the cursor.
    pub async fn play_selected(&self) {
        let model = self.model.lock().await;

        if let Some(index) = model.get_selected_queue_index().await {
            let player = model.player();
            drop(model);
            tracing::debug!(index, "Jumping to queue position");
            player.lock().await.play_at(index);
            return;
        }

        if let Some((songs, selected)) = model.get_selected_songs_context().await {
            let player = model.player();
            drop(model);
            tracing::info!(count = songs.len(), start = selected, "Playing song list");
            player.lock().await.play_queue(songs, selected);
        }
    }

    pub async fn toggle_playback(&self) {
        let model = self.model.lock().await;
        let player = model.player();
        drop(model);

        let mut player = player.lock().await;
        let is_playing = player.state().is_playing;
        tracing::debug!(is_playing, "Toggling playback");
        if is_playing {
            player.pause();
        } else {
            player.play(None);
        }
    }

    pub async fn next_track(&self) {
        let model = self.model.lock().await;
        let player = model.player();
        drop(model);
        player.lock().await.next();
    }

    pub async fn previous_track(&self) {
        let model = self.model.lock().await;
        let player = model.player();
        drop(model);
        player.lock().await.previous();
    }

    pub async fn volume_up(&self) {
        self.adjust_volume(VOLUME_STEP).await;
    }

    pub async fn volume_down(&self) {
        self.adjust_volume(-VOLUME_STEP).await;
    }

    async fn adjust_volume(&self, delta: f32) {
        let model = self.model.lock().await;
        let player = model.player();
        drop(model);

        let mut player = player.lock().await;
        // The core does not validate volume; clamp at the caller like the
        // percentage slider the server UI uses.
        let volume = (player.state().volume + delta).clamp(0.0, 1.0);
        player.set_volume(volume);
    }

    pub async fn seek_forward(&self) {
        self.seek_by(SEEK_STEP_SECS).await;
    }

    pub async fn seek_backward(&self) {
        self.seek_by(-SEEK_STEP_SECS).await;
    }

    async fn seek_by(&self, delta: f64) {
        let model = self.model.lock().await;
        let player = model.player();
        drop(model);

        let mut player = player.lock().await;
        if player.state().current_song.is_none() {
            return;
        }
        let mut target = (player.state().current_time + delta).max(0.0);
        let duration = player.state().duration;
        if duration > 0.0 {
            target = target.min(duration);
        }
        player.seek_to(target);
    }
}
