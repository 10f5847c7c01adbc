//! Carousel-facing events and the carousel context
//!
//! The bridge never reaches for global carousel state. Everything it reads
//! (which slide is active) and everything it writes (events, placeholder
//! visibility) goes through a [`Carousel`] passed in by the host.

use crate::{Error, SlideId};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Video events re-emitted on the carousel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum VideoEvent {
    /// Entered `Playing`
    #[serde(rename = "video:play")]
    Play { slide: SlideId, video_id: String },

    /// Left `Playing` for `Ready`
    #[serde(rename = "video:pause")]
    Pause { slide: SlideId, video_id: String },

    /// The SDK reported the end of the video
    #[serde(rename = "video:ended")]
    Ended { slide: SlideId, video_id: String },

    /// Player creation failed; video is disabled on this slide until
    /// the next activation
    #[serde(rename = "video:error")]
    Error {
        slide: SlideId,
        code: String,
        message: String,
    },
}

impl VideoEvent {
    pub fn error(slide: SlideId, err: &Error) -> Self {
        VideoEvent::Error {
            slide,
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }

    /// Carousel event name
    pub fn name(&self) -> &'static str {
        match self {
            VideoEvent::Play { .. } => "video:play",
            VideoEvent::Pause { .. } => "video:pause",
            VideoEvent::Ended { .. } => "video:ended",
            VideoEvent::Error { .. } => "video:error",
        }
    }

    pub fn slide(&self) -> SlideId {
        match self {
            VideoEvent::Play { slide, .. }
            | VideoEvent::Pause { slide, .. }
            | VideoEvent::Ended { slide, .. }
            | VideoEvent::Error { slide, .. } => *slide,
        }
    }
}

/// The surrounding carousel, as seen by the video core
pub trait Carousel {
    /// Whether the slide is currently the active one. Read live.
    fn is_active(&self, slide: SlideId) -> bool;

    /// Emit a carousel-level event
    fn emit(&self, event: VideoEvent);

    /// Show or hide the non-video placeholder of a slide
    fn set_placeholder_visible(&self, slide: SlideId, visible: bool);
}

impl<T: Carousel + ?Sized> Carousel for &T {
    fn is_active(&self, slide: SlideId) -> bool {
        (**self).is_active(slide)
    }

    fn emit(&self, event: VideoEvent) {
        (**self).emit(event)
    }

    fn set_placeholder_visible(&self, slide: SlideId, visible: bool) {
        (**self).set_placeholder_visible(slide, visible)
    }
}

impl<T: Carousel + ?Sized> Carousel for Rc<T> {
    fn is_active(&self, slide: SlideId) -> bool {
        (**self).is_active(slide)
    }

    fn emit(&self, event: VideoEvent) {
        (**self).emit(event)
    }

    fn set_placeholder_visible(&self, slide: SlideId, visible: bool) {
        (**self).set_placeholder_visible(slide, visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_uses_carousel_names() {
        let event = VideoEvent::Play {
            slide: SlideId(3),
            video_id: "123".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "video:play");
        assert_eq!(json["slide"], 3);
        assert_eq!(json["video_id"], "123");
        assert_eq!(event.name(), "video:play");
    }

    #[test]
    fn test_error_event_carries_code() {
        let err = Error::InvalidSource {
            slide: SlideId(1),
            raw: "nope".into(),
        };
        let event = VideoEvent::error(SlideId(1), &err);
        assert_eq!(event.slide(), SlideId(1));
        match event {
            VideoEvent::Error { code, .. } => assert_eq!(code, "INVALID_SOURCE"),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
