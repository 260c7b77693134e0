//! Audio transport backed by rodio.
//!
//! The transport is opaque to the playback core: it accepts load/play/pause/
//! seek/volume commands and reports progress only through `TransportEvent`s.
//! Audio output lives on a dedicated thread because the rodio output stream
//! is not `Send`; the async side fetches stream bytes and forwards commands.

use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use rodio::Source;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;

/// Position poll cadence for `TimeUpdate` events.
const TICK_INTERVAL: Duration = Duration::from_millis(200);

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Events emitted asynchronously by the transport.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    /// Playback position changed (seconds).
    TimeUpdate(f64),
    /// Track duration became known after decoding (seconds).
    DurationKnown(f64),
    /// The loaded track played to completion.
    Ended,
    /// The transport failed to fetch or decode a resource.
    Error(String),
}

/// Controllable playback primitive the queue core drives.
///
/// Commands are fire-and-forget; the transport reports back through the
/// subscribed event channel only.
pub trait Transport: Send {
    fn load(&self, url: &str);
    fn play(&self);
    fn pause(&self);
    fn seek(&self, position: f64);
    fn set_volume(&self, volume: f32);
}

enum Command {
    Load(Vec<u8>),
    Play,
    Pause,
    Seek(f64),
    Volume(f32),
}

type EventSink = Arc<Mutex<Option<UnboundedSender<TransportEvent>>>>;

fn emit(events: &EventSink, event: TransportEvent) {
    if let Ok(guard) = events.lock() {
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(event);
        }
    }
}

/// rodio-backed transport.
pub struct AudioBackend {
    commands: std_mpsc::Sender<Command>,
    events: EventSink,
    http: reqwest::Client,
    token: Arc<RwLock<Option<String>>>,
    runtime: tokio::runtime::Handle,
}

impl AudioBackend {
    /// Spin up the audio thread and wait for the output device to open.
    ///
    /// `token` is the shared bearer token cell; stream fetches pick up
    /// whatever credential the session currently holds.
    pub fn new(token: Arc<RwLock<Option<String>>>) -> Result<Self> {
        let (command_tx, command_rx) = std_mpsc::channel();
        let events: EventSink = Arc::new(Mutex::new(None));
        let events_for_thread = events.clone();
        let (init_tx, init_rx) = std_mpsc::channel();

        std::thread::Builder::new()
            .name("cadence-audio".to_string())
            .spawn(move || audio_thread(command_rx, events_for_thread, init_tx))?;

        match init_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(anyhow::anyhow!("Audio device init failed: {e}")),
            Err(_) => return Err(anyhow::anyhow!("Audio thread exited during init")),
        }

        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()?;

        tracing::info!("Audio backend initialized");

        Ok(Self {
            commands: command_tx,
            events,
            http,
            token,
            runtime: tokio::runtime::Handle::current(),
        })
    }

    /// Subscribe to transport events.
    ///
    /// Replaces any previous subscription, so re-registration never produces
    /// duplicate deliveries; the old receiver simply closes.
    pub fn subscribe(&self) -> UnboundedReceiver<TransportEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut guard) = self.events.lock() {
            *guard = Some(tx);
        }
        rx
    }
}

impl Transport for AudioBackend {
    fn load(&self, url: &str) {
        let url = url.to_string();
        let http = self.http.clone();
        let token = self.token.clone();
        let commands = self.commands.clone();
        let events = self.events.clone();

        tracing::debug!(url = %url, "Transport: load");

        self.runtime.spawn(async move {
            let mut request = http.get(&url);
            if let Some(token) = token.read().await.clone() {
                request = request.bearer_auth(token);
            }

            let result = async {
                let response = request.send().await?.error_for_status()?;
                response.bytes().await
            }
            .await;

            match result {
                Ok(bytes) => {
                    tracing::debug!(url = %url, len = bytes.len(), "Stream fetched");
                    let _ = commands.send(Command::Load(bytes.to_vec()));
                }
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "Stream fetch failed");
                    emit(&events, TransportEvent::Error(format!("Stream failed: {e}")));
                }
            }
        });
    }

    fn play(&self) {
        let _ = self.commands.send(Command::Play);
    }

    fn pause(&self) {
        let _ = self.commands.send(Command::Pause);
    }

    fn seek(&self, position: f64) {
        let _ = self.commands.send(Command::Seek(position));
    }

    fn set_volume(&self, volume: f32) {
        let _ = self.commands.send(Command::Volume(volume));
    }
}

fn audio_thread(
    commands: std_mpsc::Receiver<Command>,
    events: EventSink,
    init: std_mpsc::Sender<std::result::Result<(), String>>,
) {
    let (_stream, handle) = match rodio::OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = init.send(Err(e.to_string()));
            return;
        }
    };
    let _ = init.send(Ok(()));

    let mut sink: Option<rodio::Sink> = None;
    let mut volume: f32 = 1.0;
    let mut track_loaded = false;
    let mut ended_sent = false;

    loop {
        match commands.recv_timeout(TICK_INTERVAL) {
            Ok(Command::Load(bytes)) => {
                // Dropping the previous sink stops whatever was playing.
                sink = None;
                track_loaded = false;
                ended_sent = false;

                let source = match rodio::Decoder::new(Cursor::new(bytes)) {
                    Ok(source) => source,
                    Err(e) => {
                        tracing::error!(error = %e, "Decode failed");
                        emit(&events, TransportEvent::Error(format!("Decode failed: {e}")));
                        continue;
                    }
                };

                if let Some(duration) = source.total_duration() {
                    emit(&events, TransportEvent::DurationKnown(duration.as_secs_f64()));
                }

                let new_sink = match rodio::Sink::try_new(&handle) {
                    Ok(sink) => sink,
                    Err(e) => {
                        tracing::error!(error = %e, "Sink creation failed");
                        emit(&events, TransportEvent::Error(format!("Playback failed: {e}")));
                        continue;
                    }
                };
                new_sink.set_volume(volume);
                new_sink.append(source);
                // Loading never autoplays; the core issues an explicit play.
                new_sink.pause();
                sink = Some(new_sink);
                track_loaded = true;
            }
            Ok(Command::Play) => {
                if let Some(sink) = &sink {
                    sink.play();
                }
            }
            Ok(Command::Pause) => {
                if let Some(sink) = &sink {
                    sink.pause();
                }
            }
            Ok(Command::Seek(position)) => {
                if let Some(sink) = &sink {
                    if let Err(e) = sink.try_seek(Duration::from_secs_f64(position.max(0.0))) {
                        tracing::warn!(position, error = %e, "Seek failed");
                    }
                }
            }
            Ok(Command::Volume(value)) => {
                volume = value;
                if let Some(sink) = &sink {
                    sink.set_volume(value);
                }
            }
            Err(std_mpsc::RecvTimeoutError::Timeout) => {}
            Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if let Some(current) = &sink {
            if track_loaded && !ended_sent {
                if current.empty() {
                    ended_sent = true;
                    emit(&events, TransportEvent::Ended);
                } else if !current.is_paused() {
                    emit(
                        &events,
                        TransportEvent::TimeUpdate(current.get_pos().as_secs_f64()),
                    );
                }
            }
        }
    }

    tracing::debug!("Audio thread shutting down");
}

/// Fallback transport used when no audio device is available. Commands are
/// accepted and dropped so the rest of the UI keeps working.
pub struct NullTransport;

impl Transport for NullTransport {
    fn load(&self, _url: &str) {}
    fn play(&self) {}
    fn pause(&self) {}
    fn seek(&self, _position: f64) {}
    fn set_volume(&self, _volume: f32) {}
}
