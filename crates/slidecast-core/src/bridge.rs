//! Carousel Bridge - maps carousel navigation onto player sessions
//!
//! Coordinates:
//! - Slide registration and provider selection
//! - Activation / deactivation (pause or destroy policy)
//! - SDK callback routing by slide and adapter generation
//! - Carousel teardown
//!
//! Nothing here returns an error to the carousel. Failures are logged and
//! re-emitted as `video:error` so navigation keeps working when every video
//! fails.

use crate::{
    config::{DeactivationPolicy, VideoConfig},
    events::{Carousel, VideoEvent},
    provider::{ProviderKind, SdkDispatch, SdkEvent, SdkLoader, VideoProvider},
    session::PlayerSession,
    types::*,
    Error,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, instrument, warn};

/// Bridge between one carousel instance and its video slides
pub struct VideoBridge<C: Carousel> {
    /// Carousel context (activity, events, placeholders)
    carousel: C,
    /// Video options
    config: VideoConfig,
    /// Delivery of SDK callbacks back into `handle_sdk_event`
    dispatch: SdkDispatch,
    /// One adapter factory per provider
    providers: HashMap<ProviderKind, Box<dyn VideoProvider>>,
    /// Providers whose SDK failed to load, with the reason
    unavailable: HashMap<ProviderKind, String>,
    /// Registered video slides
    slides: BTreeMap<SlideId, VideoSlide>,
    /// Sessions, created lazily on first play intent
    sessions: BTreeMap<SlideId, PlayerSession>,
    /// Last adapter generation of discarded sessions
    retired: HashMap<SlideId, u64>,
}

impl<C: Carousel> VideoBridge<C> {
    /// Create a bridge for one carousel
    pub fn new(carousel: C, config: VideoConfig, dispatch: SdkDispatch) -> Self {
        info!(
            policy = %config.deactivation_policy,
            autoplay = config.autoplay,
            "Video bridge created"
        );

        Self {
            carousel,
            config,
            dispatch,
            providers: HashMap::new(),
            unavailable: HashMap::new(),
            slides: BTreeMap::new(),
            sessions: BTreeMap::new(),
            retired: HashMap::new(),
        }
    }

    /// Register an adapter factory, replacing any previous one for its provider
    pub fn register_provider(&mut self, provider: Box<dyn VideoProvider>) {
        let kind = provider.kind();
        debug!(provider = %kind, "Provider registered");
        self.providers.insert(kind, provider);
    }

    pub fn with_provider(mut self, provider: Box<dyn VideoProvider>) -> Self {
        self.register_provider(provider);
        self
    }

    pub fn carousel(&self) -> &C {
        &self.carousel
    }

    pub fn config(&self) -> &VideoConfig {
        &self.config
    }

    /// Register a slide carrying video markup.
    ///
    /// Re-registering a slide with a different source drops its session.
    pub fn register_slide(&mut self, slide: VideoSlide) {
        let id = slide.id;
        if let Some(previous) = self.slides.get(&id) {
            if *previous != slide {
                self.discard_session(id);
            }
        }

        debug!(slide = %id, provider = %slide.source.provider, "Video slide registered");
        self.slides.insert(id, slide);
    }

    /// Forget a slide the carousel removed or recycled
    pub fn remove_slide(&mut self, slide: SlideId) {
        self.discard_session(slide);
        if self.slides.remove(&slide).is_some() {
            debug!(slide = %slide, "Video slide removed");
        }
    }

    /// A registered video slide
    pub fn slide(&self, slide: SlideId) -> crate::Result<&VideoSlide> {
        self.slides.get(&slide).ok_or(Error::UnknownSlide(slide))
    }

    pub fn slides(&self) -> impl Iterator<Item = &VideoSlide> {
        self.slides.values()
    }

    /// Carousel moved to `slide`
    #[instrument(skip(self))]
    pub fn on_slide_activated(&mut self, slide: SlideId) {
        if !self.config.autoplay {
            debug!("Autoplay disabled, waiting for a play click");
            return;
        }
        self.request_play(slide);
    }

    /// User clicked the play button of `slide`
    #[instrument(skip(self))]
    pub fn on_play_requested(&mut self, slide: SlideId) {
        if !self.carousel.is_active(slide) {
            debug!("Ignoring play click on an inactive slide");
            return;
        }
        self.request_play(slide);
    }

    /// Carousel moved away from `slide`; applies the configured policy
    #[instrument(skip(self))]
    pub fn on_slide_deactivated(&mut self, slide: SlideId) {
        match self.config.deactivation_policy {
            DeactivationPolicy::Pause => self.deactivate_pause(slide),
            DeactivationPolicy::Destroy => self.deactivate_destroy(slide),
        }
    }

    /// Pause-only deactivation: the player stays warm
    pub fn deactivate_pause(&mut self, slide: SlideId) {
        if let Some(session) = self.sessions.get_mut(&slide) {
            session.pause(&self.carousel);
        }
    }

    /// Full-destroy deactivation: the player and its session are discarded
    pub fn deactivate_destroy(&mut self, slide: SlideId) {
        self.discard_session(slide);
    }

    /// Carousel teardown: every live session is destroyed
    #[instrument(skip(self))]
    pub fn on_carousel_destroyed(&mut self) {
        let sessions = std::mem::take(&mut self.sessions);
        let count = sessions.len();

        for (slide, mut session) in sessions {
            session.destroy(&self.carousel);
            self.retired.insert(slide, session.generation());
        }
        self.slides.clear();

        info!(sessions = count, "Carousel destroyed, video sessions released");
    }

    /// Route an SDK callback to the session that owns the adapter
    pub fn handle_sdk_event(&mut self, event: SdkEvent) {
        match self.sessions.get_mut(&event.slide) {
            Some(session) => session.handle_sdk_event(event, &self.carousel),
            None => debug!(
                slide = %event.slide,
                event = %event.kind,
                "Callback for a slide without session"
            ),
        }
    }

    /// Forward a mute toggle; returns false when no player is live
    pub fn set_muted(&mut self, slide: SlideId, muted: bool) -> bool {
        self.sessions
            .get_mut(&slide)
            .map(|session| session.set_muted(muted))
            .unwrap_or(false)
    }

    /// Remember that a provider SDK could not be loaded
    pub fn mark_sdk_unavailable(&mut self, provider: ProviderKind, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(provider = %provider, reason = %reason, "SDK unavailable");
        self.unavailable.insert(provider, reason);
    }

    /// Clear a previous load failure
    pub fn mark_sdk_available(&mut self, provider: ProviderKind) {
        if self.unavailable.remove(&provider).is_some() {
            info!(provider = %provider, "SDK available again");
        }
    }

    pub fn is_sdk_available(&self, provider: ProviderKind) -> bool {
        self.providers.contains_key(&provider) && !self.unavailable.contains_key(&provider)
    }

    /// Load the SDK of every registered provider.
    ///
    /// Failures only disable the affected provider.
    pub async fn load_sdks(&mut self, loader: &dyn SdkLoader) {
        let mut kinds: Vec<ProviderKind> = self.providers.keys().copied().collect();
        kinds.sort();

        for kind in kinds {
            match loader.load(kind).await {
                Ok(()) => {
                    self.mark_sdk_available(kind);
                    debug!(provider = %kind, "SDK loaded");
                }
                Err(err) => self.mark_sdk_unavailable(kind, err.to_string()),
            }
        }
    }

    /// State of a registered video slide
    pub fn state(&self, slide: SlideId) -> Option<PlayerState> {
        match self.sessions.get(&slide) {
            Some(session) => Some(session.state()),
            None if self.slides.contains_key(&slide) => Some(PlayerState::Idle),
            None => None,
        }
    }

    pub fn session(&self, slide: SlideId) -> Option<&PlayerSession> {
        self.sessions.get(&slide)
    }

    /// Number of adapters currently alive
    pub fn live_players(&self) -> usize {
        self.sessions.values().filter(|session| session.has_player()).count()
    }

    fn request_play(&mut self, slide: SlideId) {
        let Some(video_slide) = self.slides.get(&slide) else {
            debug!(slide = %slide, "Not a video slide");
            return;
        };

        let kind = video_slide.source.provider;
        let provider = match (self.providers.get(&kind), self.unavailable.get(&kind)) {
            (Some(_), Some(reason)) => {
                let err = Error::SdkUnavailable {
                    provider: kind,
                    reason: reason.clone(),
                };
                self.report_failure(slide, err);
                return;
            }
            (Some(provider), None) => provider,
            (None, _) => {
                let err = Error::SdkUnavailable {
                    provider: kind,
                    reason: "no adapter registered".to_string(),
                };
                self.report_failure(slide, err);
                return;
            }
        };

        let floor = self.retired.get(&slide).copied().unwrap_or(0);
        let session = self
            .sessions
            .entry(slide)
            .or_insert_with(|| PlayerSession::new(video_slide.clone()).with_generation_floor(floor));

        let result = session.request_play(
            provider.as_ref(),
            self.config.player_options(),
            &self.dispatch,
            &self.carousel,
        );

        if let Err(err) = result {
            self.report_failure(slide, err);
        }
    }

    fn discard_session(&mut self, slide: SlideId) {
        if let Some(mut session) = self.sessions.remove(&slide) {
            session.destroy(&self.carousel);
            self.retired.insert(slide, session.generation());
        }
    }

    fn report_failure(&self, slide: SlideId, err: Error) {
        if err.is_recoverable() {
            warn!(slide = %slide, code = err.error_code(), error = %err, "Video disabled on slide");
        } else {
            error!(slide = %slide, code = err.error_code(), error = %err, "Video invariant violated");
        }
        self.carousel.emit(VideoEvent::error(slide, &err));
    }
}

impl<C: Carousel> std::fmt::Debug for VideoBridge<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoBridge")
            .field("config", &self.config)
            .field("slides", &self.slides.len())
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}
