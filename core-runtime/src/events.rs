//! # Event Bus System
//!
//! Typed player events broadcast over `tokio::sync::broadcast`, so the UI
//! layer can react to queue, playback, and library changes without the
//! controller knowing who listens.
//!
//! ## Event Types
//!
//! - [`LibraryEvent`]: catalog and playlist loads and writes
//! - [`QueueEvent`]: filter results, shuffle changes, selection, removals
//! - [`PlaybackEvent`]: loads, play/pause transitions, progress, volume
//! - [`StatusMessage`]: the user-facing status line
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, EventSeverity, StatusMessage};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Status(StatusMessage::info("3 tracks found")))
//!     .ok();
//!
//! let event = stream.try_recv().unwrap();
//! assert_eq!(event.severity(), EventSeverity::Info);
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; it can keep
//!   receiving. Progress events are the usual culprit.
//! - **`RecvError::Closed`**: the controller was dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Library(LibraryEvent),
    Queue(QueueEvent),
    Playback(PlaybackEvent),
    /// A message for the status line
    Status(StatusMessage),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Queue(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Status(status) => &status.text,
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Status(status) => status.severity,
            CoreEvent::Library(LibraryEvent::LoadFailed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::PlayBlocked { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::AnalysisUnavailable { .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Library(LibraryEvent::CatalogLoaded { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::Started { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::Progress { .. }) => EventSeverity::Debug,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Text shown in the player's status line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusMessage {
    pub severity: EventSeverity,
    pub text: String,
}

impl StatusMessage {
    pub fn new(severity: EventSeverity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(EventSeverity::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(EventSeverity::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(EventSeverity::Error, text)
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Catalog and playlist collection changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    CatalogLoaded { track_count: usize },
    LoadFailed { message: String },
    PlaylistsLoaded { count: usize },
    PlaylistOpened { name: String, track_count: usize, dropped: usize },
    PlaylistSaved { name: String, track_count: usize },
    PlaylistRenamed { from: String, to: String },
    PlaylistDeleted { name: String },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::CatalogLoaded { .. } => "Catalog loaded",
            LibraryEvent::LoadFailed { .. } => "Library request failed",
            LibraryEvent::PlaylistsLoaded { .. } => "Playlists loaded",
            LibraryEvent::PlaylistOpened { .. } => "Playlist opened",
            LibraryEvent::PlaylistSaved { .. } => "Playlist saved",
            LibraryEvent::PlaylistRenamed { .. } => "Playlist renamed",
            LibraryEvent::PlaylistDeleted { .. } => "Playlist deleted",
        }
    }
}

// ============================================================================
// Queue Events
// ============================================================================

/// Changes to the active queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum QueueEvent {
    /// A filter produced `matches` entries (possibly zero).
    Filtered { matches: usize },
    /// The queue was replaced wholesale (catalog refresh or playlist open).
    Replaced { len: usize },
    ShuffleChanged { enabled: bool },
    CurrentChanged { index: usize, track_id: String },
    TrackRemoved { index: usize, track_id: String },
}

impl QueueEvent {
    fn description(&self) -> &str {
        match self {
            QueueEvent::Filtered { .. } => "Queue filtered",
            QueueEvent::Replaced { .. } => "Queue replaced",
            QueueEvent::ShuffleChanged { .. } => "Shuffle toggled",
            QueueEvent::CurrentChanged { .. } => "Current track changed",
            QueueEvent::TrackRemoved { .. } => "Track removed from queue",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Playback state machine transitions and media feedback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    TrackLoaded { track_id: String, now_playing: String },
    Started { track_id: String },
    Paused { track_id: String },
    Ended { track_id: String },
    /// Autoplay policy rejected the play request.
    PlayBlocked { track_id: String },
    Failed { track_id: String, message: String },
    Progress { position: f64, duration: f64 },
    VolumeChanged { volume: f64, muted: bool },
    VisualizerChanged { mode: String },
    /// The analysis graph could not be built; playback continues without it.
    AnalysisUnavailable { reason: String },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::TrackLoaded { .. } => "Track loaded",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Ended { .. } => "Track ended",
            PlaybackEvent::PlayBlocked { .. } => "Playback blocked by autoplay policy",
            PlaybackEvent::Failed { .. } => "Playback failed",
            PlaybackEvent::Progress { .. } => "Playback position updated",
            PlaybackEvent::VolumeChanged { .. } => "Volume changed",
            PlaybackEvent::VisualizerChanged { .. } => "Visualizer mode changed",
            PlaybackEvent::AnalysisUnavailable { .. } => "Audio analysis unavailable",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, CoreEvent, QueueEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut subscriber1 = event_bus.subscribe();
/// let mut subscriber2 = event_bus.subscribe();
///
/// event_bus
///     .emit(CoreEvent::Queue(QueueEvent::ShuffleChanged { enabled: true }))
///     .ok();
///
/// assert!(subscriber1.try_recv().is_ok());
/// assert!(subscriber2.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    ///
    /// A subscriber that falls further behind receives `RecvError::Lagged`.
    /// Progress events fire several times a second while playing, so keep
    /// this comfortably above the UI's redraw latency.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if nobody is listening. Callers that don't care use `.ok()`.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future events.
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering capabilities.
///
/// This provides a more ergonomic API for consuming events with optional filtering
/// by event type or severity.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(100);
/// let status_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Status(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// This will skip events that don't match the filter and return the next matching event.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn status(text: &str) -> CoreEvent {
        CoreEvent::Status(StatusMessage::info(text))
    }

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(status("nobody home")).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Queue(QueueEvent::Filtered { matches: 1 });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Status(_)));

        bus.emit(CoreEvent::Queue(QueueEvent::ShuffleChanged { enabled: true }))
            .unwrap();
        bus.emit(status("Shuffle on")).unwrap();

        let received = stream.recv().await.unwrap();
        assert_eq!(received.description(), "Shuffle on");
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(CoreEvent::Playback(PlaybackEvent::Progress {
                position: i as f64,
                duration: 100.0,
            }))
            .unwrap();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
        assert!(sub.recv().await.is_ok());
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(
            CoreEvent::Status(StatusMessage::error("boom")).severity(),
            EventSeverity::Error
        );
        assert_eq!(
            CoreEvent::Playback(PlaybackEvent::PlayBlocked {
                track_id: "1".into()
            })
            .severity(),
            EventSeverity::Warning
        );
        assert_eq!(
            CoreEvent::Library(LibraryEvent::LoadFailed {
                message: "503".into()
            })
            .severity(),
            EventSeverity::Error
        );
        assert_eq!(
            CoreEvent::Queue(QueueEvent::Replaced { len: 3 }).severity(),
            EventSeverity::Debug
        );
        assert!(EventSeverity::Error > EventSeverity::Warning);
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Queue(QueueEvent::CurrentChanged {
            index: 2,
            track_id: "9".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Queue");
        assert_eq!(json["payload"]["event"], "CurrentChanged");
        assert_eq!(json["payload"]["index"], 2);

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_try_recv_empty_and_filtered() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Library(_)));
        assert!(stream.try_recv().is_none());

        bus.emit(status("ignored")).unwrap();
        assert!(stream.try_recv().is_none());

        bus.emit(CoreEvent::Library(LibraryEvent::PlaylistDeleted {
            name: "Old".into(),
        }))
        .unwrap();
        assert!(matches!(stream.try_recv(), Some(Ok(CoreEvent::Library(_)))));
    }
}
