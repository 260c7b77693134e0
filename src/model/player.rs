//! Playback queue state and the intents that drive the audio transport.
//!
//! One `PlayerCore` exists per running client, owned by the `AppModel` and
//! handed to whoever needs it — never reached through a global. Intents
//! mutate state synchronously and issue transport commands; the transport
//! answers asynchronously through `handle_transport_event`.

use crate::audio::{Transport, TransportEvent};
use super::api_client::stream_url;
use super::types::Song;

/// Transport-mirrored playback fields.
///
/// `is_playing` mirrors intent, not the transport's true buffering state.
/// `current_time` is optimistic after a seek; the transport's time updates
/// are the source of truth afterwards.
#[derive(Clone, Debug)]
pub struct PlayerState {
    pub current_song: Option<Song>,
    pub is_playing: bool,
    pub volume: f32,
    pub current_time: f64,
    pub duration: f64,
    /// Last transport failure, if any. Cleared when a new track loads.
    pub error: Option<String>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_song: None,
            is_playing: false,
            volume: 1.0,
            current_time: 0.0,
            duration: 0.0,
            error: None,
        }
    }
}

/// Snapshot of playback state for rendering the transport bar.
#[derive(Clone, Debug)]
pub struct PlaybackInfo {
    pub song: Option<Song>,
    pub is_playing: bool,
    pub volume: f32,
    pub current_time: f64,
    pub duration: f64,
    pub queue_len: usize,
    pub queue_position: Option<usize>,
    pub error: Option<String>,
}

/// The playback queue core: ordered songs, a cursor, and the mirrored
/// transport fields, kept consistent with the underlying audio transport.
pub struct PlayerCore {
    state: PlayerState,
    queue: Vec<Song>,
    current_index: Option<usize>,
    /// Which song's resource the transport currently has loaded. Guards
    /// against reissuing a load for an unchanged song, which would restart
    /// playback from zero.
    loaded_song_id: Option<String>,
    base_url: String,
    transport: Box<dyn Transport>,
}

impl PlayerCore {
    pub fn new(transport: Box<dyn Transport>, base_url: String) -> Self {
        Self {
            state: PlayerState::default(),
            queue: Vec::new(),
            current_index: None,
            loaded_song_id: None,
            base_url,
            transport,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn queue(&self) -> &[Song] {
        &self.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn playback_info(&self) -> PlaybackInfo {
        PlaybackInfo {
            song: self.state.current_song.clone(),
            is_playing: self.state.is_playing,
            volume: self.state.volume,
            current_time: self.state.current_time,
            duration: self.state.duration,
            queue_len: self.queue.len(),
            queue_position: self.current_index,
            error: self.state.error.clone(),
        }
    }

    /// Replace the queue with `songs` and start playing from `start_index`.
    ///
    /// No-op on an empty list. An out-of-range start index falls back to 0:
    /// replacing the queue always selects a song from the new queue.
    pub fn play_queue(&mut self, songs: Vec<Song>, start_index: usize) {
        if songs.is_empty() {
            tracing::debug!("play_queue called with empty list, ignoring");
            return;
        }
        let start = if start_index < songs.len() { start_index } else { 0 };

        tracing::info!(count = songs.len(), start, "Playing queue");
        self.queue = songs;
        self.current_index = Some(start);
        let song = self.queue[start].clone();
        self.load_if_changed(&song);
        self.state.current_song = Some(song);
        self.state.is_playing = true;
        self.transport.play();
    }

    /// Resume playback, optionally selecting `song` first.
    ///
    /// Selecting a bare song leaves the queue and cursor untouched, so the
    /// cursor may point at a different song until the next queue operation.
    /// This mirrors the historical behavior of the transport bar; `play_at`
    /// is the strict alternative that keeps cursor and song in lockstep.
    pub fn play(&mut self, song: Option<Song>) {
        if let Some(song) = song {
            tracing::debug!(song_id = %song.id, title = %song.title, "Selecting song");
            self.load_if_changed(&song);
            self.state.current_song = Some(song);
        }
        self.state.is_playing = true;
        self.transport.play();
    }

    /// Select and play the song at `index` in the queue, moving the cursor.
    pub fn play_at(&mut self, index: usize) {
        if index >= self.queue.len() {
            return;
        }
        self.current_index = Some(index);
        let song = self.queue[index].clone();
        self.load_if_changed(&song);
        self.state.current_song = Some(song);
        self.state.is_playing = true;
        self.transport.play();
    }

    pub fn pause(&mut self) {
        self.state.is_playing = false;
        self.transport.pause();
    }

    /// Store and forward the volume. Expected in [0, 1]; callers clamp,
    /// the core does not validate.
    pub fn set_volume(&mut self, volume: f32) {
        self.state.volume = volume;
        self.transport.set_volume(volume);
    }

    /// Optimistically set the position and forward the seek. The transport's
    /// subsequent time updates take over as the source of truth.
    pub fn seek_to(&mut self, time: f64) {
        self.state.current_time = time;
        self.transport.seek(time);
    }

    /// Advance the cursor by one. No-op at the last index; the queue does
    /// not wrap.
    pub fn next(&mut self) {
        let Some(index) = self.current_index else {
            return;
        };
        let next_index = index + 1;
        if next_index >= self.queue.len() {
            tracing::debug!("Already at the end of the queue");
            return;
        }
        self.move_cursor(next_index);
    }

    /// Retreat the cursor by one. No-op at index 0.
    pub fn previous(&mut self) {
        let Some(index) = self.current_index else {
            return;
        };
        let Some(prev_index) = index.checked_sub(1) else {
            tracing::debug!("Already at the start of the queue");
            return;
        };
        self.move_cursor(prev_index);
    }

    /// Apply an asynchronous transport event.
    ///
    /// Track completion advances the queue exactly like `next()`; at the
    /// last index the state is left untouched, so `is_playing` stays true
    /// with nothing playing (see DESIGN.md).
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::TimeUpdate(t) => self.state.current_time = t,
            TransportEvent::DurationKnown(d) => self.state.duration = d,
            TransportEvent::Ended => self.next(),
            TransportEvent::Error(message) => self.state.error = Some(message),
        }
    }

    fn move_cursor(&mut self, index: usize) {
        self.current_index = Some(index);
        let song = self.queue[index].clone();
        self.load_if_changed(&song);
        self.state.current_song = Some(song);
        if self.state.is_playing {
            self.transport.play();
        }
    }

    fn load_if_changed(&mut self, song: &Song) {
        if self.loaded_song_id.as_deref() == Some(song.id.as_str()) {
            return;
        }
        let url = stream_url(&self.base_url, &song.id);
        self.transport.load(&url);
        self.loaded_song_id = Some(song.id.clone());
        self.state.current_time = 0.0;
        self.state.duration = 0.0;
        self.state.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Load(String),
        Play,
        Pause,
        Seek(f64),
        Volume(f32),
    }

    #[derive(Clone, Default)]
    struct MockTransport {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl MockTransport {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        fn load(&self, url: &str) {
            self.calls.lock().unwrap().push(Call::Load(url.to_string()));
        }
        fn play(&self) {
            self.calls.lock().unwrap().push(Call::Play);
        }
        fn pause(&self) {
            self.calls.lock().unwrap().push(Call::Pause);
        }
        fn seek(&self, position: f64) {
            self.calls.lock().unwrap().push(Call::Seek(position));
        }
        fn set_volume(&self, volume: f32) {
            self.calls.lock().unwrap().push(Call::Volume(volume));
        }
    }

    fn song(id: &str, title: &str, duration: u32) -> Song {
        Song {
            id: id.to_string(),
            title: title.to_string(),
            artist: "Artist".to_string(),
            album: None,
            duration,
            created_at: None,
        }
    }

    fn core() -> (PlayerCore, MockTransport) {
        let transport = MockTransport::default();
        let core = PlayerCore::new(
            Box::new(transport.clone()),
            "http://localhost:8000".to_string(),
        );
        (core, transport)
    }

    #[test]
    fn play_queue_selects_requested_index() {
        let (mut core, _transport) = core();
        let songs = vec![song("1", "One", 100), song("2", "Two", 120), song("3", "Three", 90)];

        core.play_queue(songs.clone(), 1);

        assert_eq!(core.current_index(), Some(1));
        assert_eq!(core.state().current_song, Some(songs[1].clone()));
        assert!(core.state().is_playing);
    }

    #[test]
    fn play_queue_empty_is_noop() {
        let (mut core, transport) = core();

        core.play_queue(vec![], 0);

        assert_eq!(core.current_index(), None);
        assert!(core.state().current_song.is_none());
        assert!(!core.state().is_playing);
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn play_queue_issues_load_then_play() {
        let (mut core, transport) = core();

        core.play_queue(vec![song("42", "Answer", 60)], 0);

        assert_eq!(
            transport.calls(),
            vec![
                Call::Load("http://localhost:8000/songs/stream/42".to_string()),
                Call::Play,
            ]
        );
    }

    #[test]
    fn play_queue_out_of_range_start_falls_back_to_first() {
        let (mut core, _transport) = core();
        let songs = vec![song("1", "One", 100), song("2", "Two", 100)];

        core.play_queue(songs.clone(), 9);

        assert_eq!(core.current_index(), Some(0));
        assert_eq!(core.state().current_song, Some(songs[0].clone()));
    }

    #[test]
    fn next_at_last_index_is_noop() {
        let (mut core, _transport) = core();
        let songs = vec![song("1", "One", 100), song("2", "Two", 100)];

        core.play_queue(songs.clone(), 1);
        core.next();

        assert_eq!(core.current_index(), Some(1));
        assert_eq!(core.state().current_song, Some(songs[1].clone()));
    }

    #[test]
    fn previous_at_first_index_is_noop() {
        let (mut core, _transport) = core();
        let songs = vec![song("1", "One", 100), song("2", "Two", 100)];

        core.play_queue(songs, 0);
        core.previous();

        assert_eq!(core.current_index(), Some(0));
    }

    #[test]
    fn next_and_previous_move_the_cursor() {
        let (mut core, _transport) = core();
        let songs = vec![song("1", "One", 100), song("2", "Two", 100), song("3", "Three", 100)];

        core.play_queue(songs.clone(), 0);
        core.next();
        assert_eq!(core.current_index(), Some(1));
        assert_eq!(core.state().current_song, Some(songs[1].clone()));

        core.previous();
        assert_eq!(core.current_index(), Some(0));
        assert_eq!(core.state().current_song, Some(songs[0].clone()));
    }

    #[test]
    fn pause_then_play_keeps_current_song() {
        let (mut core, _transport) = core();
        let songs = vec![song("1", "One", 100)];

        core.play_queue(songs.clone(), 0);
        core.pause();
        assert!(!core.state().is_playing);

        core.play(None);
        assert!(core.state().is_playing);
        assert_eq!(core.state().current_song, Some(songs[0].clone()));
    }

    #[test]
    fn set_volume_stores_exactly() {
        let (mut core, transport) = core();

        core.set_volume(0.42);

        assert_eq!(core.state().volume, 0.42);
        assert_eq!(transport.calls(), vec![Call::Volume(0.42)]);
    }

    #[test]
    fn seek_is_optimistic_and_forwarded() {
        let (mut core, transport) = core();
        core.play_queue(vec![song("1", "One", 100)], 0);

        core.seek_to(37.5);

        assert_eq!(core.state().current_time, 37.5);
        assert!(transport.calls().contains(&Call::Seek(37.5)));
    }

    #[test]
    fn time_and_duration_follow_transport_events() {
        let (mut core, _transport) = core();
        core.play_queue(vec![song("1", "One", 180)], 0);

        core.handle_transport_event(TransportEvent::DurationKnown(180.0));
        core.handle_transport_event(TransportEvent::TimeUpdate(12.25));

        assert_eq!(core.state().duration, 180.0);
        assert_eq!(core.state().current_time, 12.25);
    }

    #[test]
    fn ended_auto_advances_to_the_next_song() {
        let (mut core, transport) = core();
        let songs = vec![song("a", "SongA", 180), song("b", "SongB", 200)];

        core.play_queue(songs.clone(), 0);
        assert_eq!(core.state().current_song, Some(songs[0].clone()));
        assert!(core.state().is_playing);

        core.handle_transport_event(TransportEvent::DurationKnown(180.0));
        assert_eq!(core.state().duration, 180.0);

        core.handle_transport_event(TransportEvent::Ended);
        assert_eq!(core.state().current_song, Some(songs[1].clone()));
        assert_eq!(core.current_index(), Some(1));
        assert!(transport
            .calls()
            .contains(&Call::Load("http://localhost:8000/songs/stream/b".to_string())));
    }

    #[test]
    fn ended_at_the_tail_leaves_is_playing_set() {
        // Historical behavior: running off the end of the queue stops the
        // audio but the intent flag stays on.
        let (mut core, _transport) = core();
        core.play_queue(vec![song("1", "One", 100)], 0);

        core.handle_transport_event(TransportEvent::Ended);

        assert_eq!(core.current_index(), Some(0));
        assert!(core.state().is_playing);
    }

    #[test]
    fn playing_the_same_song_does_not_reload() {
        let (mut core, transport) = core();
        let one = song("1", "One", 100);

        core.play_queue(vec![one.clone()], 0);
        core.pause();
        core.play(Some(one));

        let loads = transport
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Load(_)))
            .count();
        assert_eq!(loads, 1);
    }

    #[test]
    fn bare_play_leaves_the_cursor_untouched() {
        // Selecting a song outside the queue desyncs cursor from song; the
        // cursor keeps its old position until the next queue operation.
        let (mut core, _transport) = core();
        let songs = vec![song("1", "One", 100), song("2", "Two", 100)];

        core.play_queue(songs, 0);
        core.play(Some(song("99", "Loose", 50)));

        assert_eq!(core.current_index(), Some(0));
        assert_eq!(core.state().current_song.as_ref().map(|s| s.id.as_str()), Some("99"));
    }

    #[test]
    fn play_at_moves_cursor_and_song_together() {
        let (mut core, _transport) = core();
        let songs = vec![song("1", "One", 100), song("2", "Two", 100), song("3", "Three", 100)];

        core.play_queue(songs.clone(), 0);
        core.pause();
        core.play_at(2);

        assert_eq!(core.current_index(), Some(2));
        assert_eq!(core.state().current_song, Some(songs[2].clone()));
        assert!(core.state().is_playing);
    }

    #[test]
    fn manual_next_while_paused_does_not_resume() {
        let (mut core, transport) = core();
        let songs = vec![song("1", "One", 100), song("2", "Two", 100)];

        core.play_queue(songs, 0);
        core.pause();
        let calls_before = transport.calls().len();

        core.next();

        assert!(!core.state().is_playing);
        // The new song is loaded but playback is not resumed.
        let new_calls = &transport.calls()[calls_before..];
        assert!(new_calls.contains(&Call::Load("http://localhost:8000/songs/stream/2".to_string())));
        assert!(!new_calls.contains(&Call::Play));
    }

    #[test]
    fn transport_error_is_surfaced_in_state() {
        let (mut core, _transport) = core();
        core.play_queue(vec![song("1", "One", 100)], 0);

        core.handle_transport_event(TransportEvent::Error("Stream failed: 404".to_string()));

        assert_eq!(core.state().error.as_deref(), Some("Stream failed: 404"));
    }

    #[test]
    fn loading_a_new_song_clears_a_previous_error() {
        let (mut core, _transport) = core();
        core.play_queue(vec![song("1", "One", 100), song("2", "Two", 100)], 0);

        core.handle_transport_event(TransportEvent::Error("Decode failed".to_string()));
        core.next();

        assert!(core.state().error.is_none());
    }
}
