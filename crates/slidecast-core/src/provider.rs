//! Provider adapters - the uniform capability set over external video SDKs
//!
//! A [`VideoProvider`] creates one [`VideoPlayer`] per slide. Players never
//! report readiness synchronously: the SDK calls back later through the
//! [`SdkHandle`] it was given at creation.

use crate::{ContainerRef, Error, Readiness, Result, SlideId, VideoSlide};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use url::Url;

/// Supported video sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    YouTube,
    Vimeo,
    /// Native `<video>` element
    Html,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::YouTube, ProviderKind::Vimeo, ProviderKind::Html];

    /// Slide attribute carrying the video source for this provider
    pub fn attribute(&self) -> &'static str {
        match self {
            ProviderKind::YouTube => "data-slidecast-youtube",
            ProviderKind::Vimeo => "data-slidecast-vimeo",
            ProviderKind::Html => "data-slidecast-html-video",
        }
    }

    /// Extract the provider-specific video ID from a markup source.
    ///
    /// Returns `None` when the source does not identify a video.
    pub fn extract_video_id(&self, source: &str) -> Option<String> {
        let source = source.trim();
        if source.is_empty() {
            return None;
        }

        match self {
            ProviderKind::YouTube => youtube_id(source),
            ProviderKind::Vimeo => vimeo_id(source),
            ProviderKind::Html => Some(source.to_string()),
        }
    }

    /// Guess the provider from a source URL
    pub fn detect(source: &str) -> Option<ProviderKind> {
        let source = source.trim();
        let url = parse_source(source)?;
        let host = normalized_host(&url)?;

        if is_youtube_host(&host) || host == "youtu.be" {
            Some(ProviderKind::YouTube)
        } else if is_vimeo_host(&host) {
            Some(ProviderKind::Vimeo)
        } else if Url::parse(source).is_ok() && matches!(url.scheme(), "http" | "https") {
            // Scheme-less sources only ever name YouTube or Vimeo
            Some(ProviderKind::Html)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::YouTube => write!(f, "youtube"),
            ProviderKind::Vimeo => write!(f, "vimeo"),
            ProviderKind::Html => write!(f, "html"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "youtube" | "yt" => Ok(ProviderKind::YouTube),
            "vimeo" => Ok(ProviderKind::Vimeo),
            "html" | "html-video" | "video" => Ok(ProviderKind::Html),
            other => Err(Error::InvalidConfig(format!("unknown provider '{}'", other))),
        }
    }
}

/// Parse a markup source as a URL. Protocol-relative (`//vimeo.com/1`) and
/// scheme-less (`vimeo.com/1`) sources are read as `https:`.
fn parse_source(source: &str) -> Option<Url> {
    match Url::parse(source) {
        Ok(url) => Some(url),
        Err(_) if source.starts_with("//") => Url::parse(&format!("https:{}", source)).ok(),
        Err(_) if source.starts_with('/') => None,
        Err(_) => Url::parse(&format!("https://{}", source)).ok(),
    }
}

fn normalized_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(&host)
        .to_string();
    Some(host)
}

fn is_youtube_host(host: &str) -> bool {
    host == "youtube.com" || host == "youtube-nocookie.com" || host.ends_with(".youtube.com")
}

fn is_vimeo_host(host: &str) -> bool {
    host == "vimeo.com" || host.ends_with(".vimeo.com")
}

fn is_youtube_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn youtube_id(source: &str) -> Option<String> {
    let url = parse_source(source)?;
    let host = normalized_host(&url)?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let id = if host == "youtu.be" {
        segments.next().map(str::to_string)
    } else if is_youtube_host(&host) {
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed" | "shorts" | "live" | "v") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };

    id.filter(|id| is_youtube_id(id))
}

fn vimeo_id(source: &str) -> Option<String> {
    let url = parse_source(source)?;
    let host = normalized_host(&url)?;
    if !is_vimeo_host(&host) {
        return None;
    }

    url.path_segments()?
        .find(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
}

/// Options handed to an adapter at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerOptions {
    /// Show the provider's native controls
    pub controls: bool,
    /// Loop the video
    pub loop_video: bool,
    /// Start muted
    pub muted: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            controls: true,
            loop_video: false,
            muted: false,
        }
    }
}

/// Callback kinds an SDK reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdkEventKind {
    /// SDK is prepared to accept play commands
    Ready,
    /// Playback started
    Started,
    /// Playback paused
    Paused,
    /// Playback reached the end
    Ended,
    /// The SDK gave up on the video after creation (private or unknown ID,
    /// embedding disabled)
    Failed,
}

impl std::fmt::Display for SdkEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SdkEventKind::Ready => write!(f, "ready"),
            SdkEventKind::Started => write!(f, "started"),
            SdkEventKind::Paused => write!(f, "paused"),
            SdkEventKind::Ended => write!(f, "ended"),
            SdkEventKind::Failed => write!(f, "failed"),
        }
    }
}

/// An SDK callback tagged with the adapter instance that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkEvent {
    pub slide: SlideId,
    /// Adapter generation within the slide's session
    pub generation: u64,
    pub kind: SdkEventKind,
    /// SDK message, set for `Failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Host-supplied delivery of SDK callbacks back to the bridge
pub type SdkDispatch = Rc<dyn Fn(SdkEvent)>;

/// Handle an adapter uses to report SDK callbacks
#[derive(Clone)]
pub struct SdkHandle {
    slide: SlideId,
    generation: u64,
    dispatch: SdkDispatch,
}

impl SdkHandle {
    pub fn new(slide: SlideId, generation: u64, dispatch: SdkDispatch) -> Self {
        Self {
            slide,
            generation,
            dispatch,
        }
    }

    pub fn slide(&self) -> SlideId {
        self.slide
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, kind: SdkEventKind) {
        self.send(kind, None);
    }

    fn send(&self, kind: SdkEventKind, message: Option<String>) {
        (self.dispatch)(SdkEvent {
            slide: self.slide,
            generation: self.generation,
            kind,
            message,
        });
    }

    pub fn ready(&self) {
        self.emit(SdkEventKind::Ready);
    }

    pub fn started(&self) {
        self.emit(SdkEventKind::Started);
    }

    pub fn paused(&self) {
        self.emit(SdkEventKind::Paused);
    }

    pub fn ended(&self) {
        self.emit(SdkEventKind::Ended);
    }

    /// Report an SDK error that arrived after creation
    pub fn failed(&self, message: impl Into<String>) {
        self.send(SdkEventKind::Failed, Some(message.into()));
    }
}

impl std::fmt::Debug for SdkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkHandle")
            .field("slide", &self.slide)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Everything an adapter needs to instantiate its SDK
#[derive(Debug)]
pub struct CreateRequest<'a> {
    pub slide: &'a VideoSlide,
    /// Non-empty, already extracted from the slide source
    pub video_id: &'a str,
    pub options: PlayerOptions,
    pub handle: SdkHandle,
}

impl CreateRequest<'_> {
    pub fn container(&self) -> &ContainerRef {
        &self.slide.container
    }
}

/// Factory half of the adapter capability set, one per provider
pub trait VideoProvider {
    fn kind(&self) -> ProviderKind;

    /// Instantiate the SDK player.
    ///
    /// Must return before the SDK is ready; readiness arrives through
    /// `request.handle`.
    fn create(&self, request: CreateRequest<'_>) -> Result<Box<dyn VideoPlayer>>;
}

/// A live SDK player bound to one slide
pub trait VideoPlayer {
    fn play(&mut self);

    fn pause(&mut self);

    /// Fire-and-forget, valid as soon as the player exists
    fn set_muted(&mut self, muted: bool);

    fn readiness(&self) -> Readiness;

    /// Release SDK resources and detach listeners. Idempotent.
    fn destroy(&mut self);
}

/// Loads a provider SDK (script injection in the browser)
#[async_trait(?Send)]
pub trait SdkLoader {
    async fn load(&self, provider: ProviderKind) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vimeo_ids() {
        let vimeo = ProviderKind::Vimeo;
        assert_eq!(vimeo.extract_video_id("https://vimeo.com/123").as_deref(), Some("123"));
        assert_eq!(
            vimeo.extract_video_id("https://player.vimeo.com/video/76979871").as_deref(),
            Some("76979871")
        );
        assert_eq!(
            vimeo.extract_video_id("https://vimeo.com/channels/staffpicks/4567").as_deref(),
            Some("4567")
        );
        assert_eq!(vimeo.extract_video_id("https://vimeo.com/about"), None);
        assert_eq!(vimeo.extract_video_id("https://example.com/123"), None);
        assert_eq!(vimeo.extract_video_id(""), None);
    }

    #[test]
    fn test_ids_without_scheme() {
        let vimeo = ProviderKind::Vimeo;
        assert_eq!(vimeo.extract_video_id("vimeo.com/123").as_deref(), Some("123"));
        assert_eq!(vimeo.extract_video_id("//vimeo.com/123").as_deref(), Some("123"));
        assert_eq!(
            vimeo.extract_video_id("//player.vimeo.com/video/76979871").as_deref(),
            Some("76979871")
        );
        assert_eq!(
            ProviderKind::YouTube
                .extract_video_id("www.youtube.com/watch?v=dQw4w9WgXcQ")
                .as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            ProviderKind::YouTube.extract_video_id("//youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(vimeo.extract_video_id("/videos/123"), None);
        assert_eq!(ProviderKind::detect("vimeo.com/123"), Some(ProviderKind::Vimeo));
        assert_eq!(ProviderKind::detect("//youtu.be/x"), Some(ProviderKind::YouTube));
    }

    #[test]
    fn test_youtube_ids() {
        let yt = ProviderKind::YouTube;
        assert_eq!(
            yt.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(yt.extract_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            yt.extract_video_id("https://www.youtube-nocookie.com/embed/abc_DEF-1").as_deref(),
            Some("abc_DEF-1")
        );
        assert_eq!(yt.extract_video_id("https://www.youtube.com/watch"), None);
        assert_eq!(yt.extract_video_id("https://www.youtube.com/watch?v=bad id"), None);
        assert_eq!(yt.extract_video_id("not a url"), None);
    }

    #[test]
    fn test_html_source_is_the_id() {
        assert_eq!(
            ProviderKind::Html.extract_video_id("  /media/intro.mp4 ").as_deref(),
            Some("/media/intro.mp4")
        );
        assert_eq!(ProviderKind::Html.extract_video_id("   "), None);
    }

    #[test]
    fn test_detect_provider() {
        assert_eq!(ProviderKind::detect("https://youtu.be/x"), Some(ProviderKind::YouTube));
        assert_eq!(ProviderKind::detect("https://vimeo.com/1"), Some(ProviderKind::Vimeo));
        assert_eq!(
            ProviderKind::detect("https://cdn.example.com/a.mp4"),
            Some(ProviderKind::Html)
        );
        assert_eq!(ProviderKind::detect("intro.mp4"), None);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("YouTube".parse::<ProviderKind>().unwrap(), ProviderKind::YouTube);
        assert_eq!("html-video".parse::<ProviderKind>().unwrap(), ProviderKind::Html);
        assert!("dailymotion".parse::<ProviderKind>().is_err());
    }
}
