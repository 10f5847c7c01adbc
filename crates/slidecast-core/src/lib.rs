//! Slidecast Core - Carousel Video Library
//!
//! This crate keeps externally hosted video (YouTube, Vimeo, native
//! `<video>`) in step with a carousel's navigation:
//! - Provider adapters behind one capability set
//! - A per-slide player lifecycle state machine
//! - A bridge from carousel navigation to player sessions
//! - Video-ID extraction from slide markup
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Slidecast Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   carousel nav ──▶ ┌──────────────┐ ──▶ video:play / pause /    │
//! │                    │    Video     │     ended / error           │
//! │                    │    Bridge    │                             │
//! │                    └──────┬───────┘                             │
//! │                           │ one per video slide                 │
//! │                    ┌──────┴───────┐                             │
//! │   SDK callbacks ──▶│    Player    │                             │
//! │   (generation-     │   Session    │                             │
//! │    tagged)         └──────┬───────┘                             │
//! │                           │ owns at most one                    │
//! │  ┌──────────────┐  ┌──────┴───────┐  ┌──────────────┐           │
//! │  │   YouTube    │  │    Vimeo     │  │  HTML video  │           │
//! │  │   adapter    │  │   adapter    │  │   adapter    │           │
//! │  └──────────────┘  └──────────────┘  └──────────────┘           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod provider;
pub mod config;
pub mod events;
pub mod session;
pub mod bridge;
#[cfg(feature = "sim")]
pub mod sim;

pub use error::{Error, Result};
pub use types::*;
pub use provider::{
    CreateRequest, PlayerOptions, ProviderKind, SdkDispatch, SdkEvent, SdkEventKind, SdkHandle,
    SdkLoader, VideoPlayer, VideoProvider,
};
pub use config::{DeactivationPolicy, VideoConfig};
pub use events::{Carousel, VideoEvent};
pub use session::PlayerSession;
pub use bridge::VideoBridge;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "Slidecast Core initialized");
}
