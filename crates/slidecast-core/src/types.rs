//! Core types for Slidecast

use crate::ProviderKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Carousel slide identifier (the carousel's slide index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(pub usize);

impl std::fmt::Display for SlideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier for a player session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to the embed container element.
///
/// The element belongs to the carousel; this is only its DOM id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerRef(pub String);

impl ContainerRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Video source as found in the slide markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Provider that hosts the video
    pub provider: ProviderKind,
    /// Raw attribute value (usually a URL)
    pub raw: String,
}

impl VideoSource {
    pub fn new(provider: ProviderKind, raw: impl Into<String>) -> Self {
        Self {
            provider,
            raw: raw.into(),
        }
    }

    /// Provider-specific video ID, if the source can be parsed
    pub fn video_id(&self) -> Option<String> {
        self.provider.extract_video_id(&self.raw)
    }
}

/// A carousel slide hosting a video embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSlide {
    pub id: SlideId,
    pub source: VideoSource,
    pub container: ContainerRef,
}

impl VideoSlide {
    pub fn new(id: SlideId, source: VideoSource, container: ContainerRef) -> Self {
        Self {
            id,
            source,
            container,
        }
    }
}

/// Player lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// No adapter exists
    Idle,
    /// Adapter created, waiting for SDK readiness
    Initializing,
    /// Adapter ready, not playing
    Ready,
    /// Playback requested or confirmed
    Playing,
    /// Slide deactivated before the SDK confirmed playback
    PlayAborted,
}

impl PlayerState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: PlayerState) -> bool {
        use PlayerState::*;
        matches!(
            (self, target),
            // From Idle
            (Idle, Initializing) |
            // From Initializing
            (Initializing, Ready) | (Initializing, Playing) | (Initializing, PlayAborted) |
            // From Ready
            (Ready, Playing) |
            // From Playing
            (Playing, Ready) | (Playing, PlayAborted) |
            // From PlayAborted
            (PlayAborted, Playing) | (PlayAborted, Ready) | (PlayAborted, Idle)
        ) || (target == Idle && *self != Idle)
    }

    /// Whether an adapter is expected to exist in this state
    pub fn has_player(&self) -> bool {
        !matches!(self, PlayerState::Idle)
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerState::Idle => write!(f, "idle"),
            PlayerState::Initializing => write!(f, "initializing"),
            PlayerState::Ready => write!(f, "ready"),
            PlayerState::Playing => write!(f, "playing"),
            PlayerState::PlayAborted => write!(f, "play_aborted"),
        }
    }
}

/// SDK readiness as reported by an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Pending,
    Ready,
}
