//! # Playback Core
//!
//! Platform-independent heart of the player.
//!
//! ## Overview
//!
//! This crate handles:
//! - Media address resolution from catalog locators ([`address`])
//! - The play queue: filtering, shuffle, wraparound navigation ([`queue`])
//! - The playback state machine with stale-request detection ([`engine`])
//! - The lazily built, one-time audio analysis graph ([`analysis`])
//! - Per-frame visualization rendering ([`visualizer`])
//!
//! Host capabilities (media element, audio graph, canvas) come in through
//! `bridge-traits`; nothing here depends on a browser.

pub mod address;
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod queue;
pub mod visualizer;

pub use address::MediaAddressResolver;
pub use analysis::{AnalysisGraph, GraphState, SampleKind};
pub use config::PlaybackConfig;
pub use engine::{
    format_time, LoadedTrack, PlaySettlement, PlayTicket, PlaybackEngine, PlaybackProgress,
    PlaybackStatus, VolumeState,
};
pub use error::{PlaybackError, Result};
pub use queue::{FilterOutcome, PlayQueue, Removal};
pub use visualizer::{FrameOutcome, Visualizer, VisualizerMode};
