//! Audio transport event listener

use tokio::sync::mpsc::UnboundedReceiver;

use crate::audio::TransportEvent;
use super::AppController;

impl AppController {
    /// Consume transport events for the lifetime of the application.
    ///
    /// Started once at startup. Subscribing to the transport replaces its
    /// previous delivery channel, so restarting the listener can never
    /// produce duplicate event delivery.
    pub fn start_transport_event_listener(&self, mut events: UnboundedReceiver<TransportEvent>) {
        let model = self.model.clone();
        tracing::info!("Starting transport event listener");

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let model_guard = model.lock().await;

                if model_guard.should_quit().await {
                    tracing::debug!("Transport event listener shutting down");
                    break;
                }

                match &event {
                    TransportEvent::TimeUpdate(position) => {
                        tracing::trace!(position = *position, "TransportEvent::TimeUpdate");
                    }
                    TransportEvent::DurationKnown(duration) => {
                        tracing::debug!(duration = *duration, "TransportEvent::DurationKnown");
                    }
                    TransportEvent::Ended => {
                        tracing::debug!("TransportEvent::Ended");
                    }
                    TransportEvent::Error(message) => {
                        tracing::warn!(message = %message, "TransportEvent::Error");
                    }
                }

                let player = model_guard.player();
                drop(model_guard);
                player.lock().await.handle_transport_event(event);
            }
        });
    }
}
