//! Player Session - the per-slide lifecycle state machine
//!
//! Owns at most one adapter and reconciles SDK callbacks against the
//! carousel's *current* activity. Activity is read when a callback is
//! processed, never cached from the moment play was requested, so a
//! readiness or play confirmation that shows up after navigation moved on
//! is resolved against where the carousel actually is.

use crate::{
    events::{Carousel, VideoEvent},
    provider::{CreateRequest, PlayerOptions, SdkDispatch, SdkEvent, SdkEventKind, SdkHandle, VideoPlayer, VideoProvider},
    types::*,
    Error, Result,
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Player session bound to one video slide
pub struct PlayerSession {
    /// Unique session ID
    id: SessionId,
    /// Slide this session plays on
    slide: VideoSlide,
    /// Current state
    state: PlayerState,
    /// State change broadcaster
    state_tx: watch::Sender<PlayerState>,
    /// Live adapter, exclusively owned
    player: Option<Box<dyn VideoPlayer>>,
    /// Video ID of the live adapter
    video_id: Option<String>,
    /// Generation of the most recent adapter; SDK callbacks carry it
    generation: u64,
    /// `play()` was issued and the SDK has not confirmed it yet
    play_pending: bool,
}

impl PlayerSession {
    /// Create a new, idle session
    pub fn new(slide: VideoSlide) -> Self {
        let (state_tx, _) = watch::channel(PlayerState::Idle);

        Self {
            id: SessionId::new(),
            slide,
            state: PlayerState::Idle,
            state_tx,
            player: None,
            video_id: None,
            generation: 0,
            play_pending: false,
        }
    }

    /// Continue adapter generations after those of a discarded session,
    /// so its late callbacks never match this session's players
    pub fn with_generation_floor(mut self, generation: u64) -> Self {
        self.generation = self.generation.max(generation);
        self
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn slide(&self) -> &VideoSlide {
        &self.slide
    }

    /// Get current state
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Subscribe to state changes
    pub fn subscribe_state(&self) -> watch::Receiver<PlayerState> {
        self.state_tx.subscribe()
    }

    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_play_pending(&self) -> bool {
        self.play_pending
    }

    /// Readiness reported by the live adapter
    pub fn readiness(&self) -> Option<Readiness> {
        self.player.as_ref().map(|player| player.readiness())
    }

    /// Transition to new state
    fn set_state(&mut self, new_state: PlayerState) {
        let current = self.state;
        if current == new_state {
            return;
        }

        if !current.can_transition_to(new_state) {
            error!(
                slide = %self.slide.id,
                from = %current,
                to = %new_state,
                "Unexpected state transition"
            );
        }

        self.state = new_state;
        self.state_tx.send_replace(new_state);

        info!(
            slide = %self.slide.id,
            session_id = %self.id,
            from = %current,
            to = %new_state,
            "State transition"
        );
    }

    /// Play intent from the carousel.
    ///
    /// From `Idle` this creates the adapter and waits for readiness; once the
    /// adapter is ready it starts playback directly.
    pub fn request_play(
        &mut self,
        provider: &dyn VideoProvider,
        options: PlayerOptions,
        dispatch: &SdkDispatch,
        carousel: &dyn Carousel,
    ) -> Result<()> {
        match self.state {
            PlayerState::Idle => {
                self.create_player(provider, options, dispatch)?;
                self.set_state(PlayerState::Initializing);
            }
            PlayerState::Initializing => {
                debug!(slide = %self.slide.id, "Play requested while waiting for readiness");
            }
            PlayerState::Ready | PlayerState::PlayAborted => self.start_playback(carousel),
            PlayerState::Playing => {}
        }
        Ok(())
    }

    fn create_player(
        &mut self,
        provider: &dyn VideoProvider,
        options: PlayerOptions,
        dispatch: &SdkDispatch,
    ) -> Result<()> {
        if self.player.is_some() {
            error!(
                slide = %self.slide.id,
                generation = self.generation,
                "Refusing to create a second player for one slide"
            );
            return Err(Error::RaceResolutionFault(format!(
                "slide {} already owns player generation {}",
                self.slide.id, self.generation
            )));
        }

        let video_id = self.slide.source.video_id().ok_or_else(|| Error::InvalidSource {
            slide: self.slide.id,
            raw: self.slide.source.raw.clone(),
        })?;

        // Bumped even when creation fails so callbacks of a failed attempt
        // can never match a later player.
        self.generation += 1;
        let handle = SdkHandle::new(self.slide.id, self.generation, dispatch.clone());

        let player = provider.create(CreateRequest {
            slide: &self.slide,
            video_id: &video_id,
            options,
            handle,
        })?;

        info!(
            slide = %self.slide.id,
            provider = %provider.kind(),
            video_id = %video_id,
            generation = self.generation,
            "Player created"
        );

        self.player = Some(player);
        self.video_id = Some(video_id);
        Ok(())
    }

    fn start_playback(&mut self, carousel: &dyn Carousel) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        player.play();
        self.play_pending = true;
        self.enter_playing(carousel);
    }

    fn enter_playing(&mut self, carousel: &dyn Carousel) {
        self.set_state(PlayerState::Playing);
        carousel.set_placeholder_visible(self.slide.id, false);
        carousel.emit(VideoEvent::Play {
            slide: self.slide.id,
            video_id: self.current_video_id(),
        });
    }

    fn current_video_id(&self) -> String {
        self.video_id.clone().unwrap_or_default()
    }

    /// Reconcile an SDK callback with the current carousel activity
    pub fn handle_sdk_event(&mut self, event: SdkEvent, carousel: &dyn Carousel) {
        if self.player.is_none() || event.generation != self.generation {
            debug!(
                slide = %self.slide.id,
                event = %event.kind,
                generation = event.generation,
                current = self.generation,
                "Discarding callback from a released player"
            );
            return;
        }

        match event.kind {
            SdkEventKind::Ready => self.on_ready(carousel),
            SdkEventKind::Started => self.on_started(carousel),
            SdkEventKind::Paused => self.on_paused(carousel),
            SdkEventKind::Ended => self.on_ended(carousel),
            SdkEventKind::Failed => self.on_failed(event.message, carousel),
        }
    }

    fn on_ready(&mut self, carousel: &dyn Carousel) {
        if self.state != PlayerState::Initializing {
            debug!(slide = %self.slide.id, state = %self.state, "Ignoring late readiness");
            return;
        }

        if carousel.is_active(self.slide.id) {
            self.start_playback(carousel);
        } else {
            self.set_state(PlayerState::Ready);
        }
    }

    fn on_started(&mut self, carousel: &dyn Carousel) {
        let active = carousel.is_active(self.slide.id);

        match (self.state, active) {
            (PlayerState::Playing, true) => {
                self.play_pending = false;
                debug!(slide = %self.slide.id, "Playback confirmed");
            }
            (PlayerState::PlayAborted, true) => {
                self.play_pending = false;
                self.enter_playing(carousel);
            }
            // Started from inside the embed, e.g. the provider's own controls
            (PlayerState::Ready | PlayerState::Initializing, true) => {
                self.play_pending = false;
                self.enter_playing(carousel);
            }
            (PlayerState::Ready, false) => {
                debug!(slide = %self.slide.id, "Ignoring stale play confirmation");
            }
            (PlayerState::Playing | PlayerState::Initializing, false) => {
                self.set_state(PlayerState::PlayAborted);
                self.resolve_abort(carousel);
            }
            (PlayerState::PlayAborted, false) => self.resolve_abort(carousel),
            (PlayerState::Idle, _) => {}
        }
    }

    /// The SDK is playing although the slide was left: drop the player so
    /// the visible placeholder matches reality.
    fn resolve_abort(&mut self, carousel: &dyn Carousel) {
        warn!(
            slide = %self.slide.id,
            generation = self.generation,
            "Playback confirmed after deactivation, releasing player"
        );
        self.release_player();
        carousel.set_placeholder_visible(self.slide.id, true);
        self.set_state(PlayerState::Idle);
    }

    fn on_paused(&mut self, carousel: &dyn Carousel) {
        let was_playing = self.state == PlayerState::Playing;
        self.play_pending = false;
        self.set_state(PlayerState::Ready);

        if was_playing {
            carousel.emit(VideoEvent::Pause {
                slide: self.slide.id,
                video_id: self.current_video_id(),
            });
        }
    }

    fn on_ended(&mut self, carousel: &dyn Carousel) {
        self.play_pending = false;
        self.set_state(PlayerState::Ready);
        carousel.emit(VideoEvent::Ended {
            slide: self.slide.id,
            video_id: self.current_video_id(),
        });
    }

    /// The SDK abandoned this attempt after creation. The player is
    /// released so the next activation creates a fresh one.
    fn on_failed(&mut self, message: Option<String>, carousel: &dyn Carousel) {
        let err = Error::sdk(
            self.slide.source.provider,
            message.unwrap_or_else(|| "player reported an error".to_string()),
        );
        warn!(
            slide = %self.slide.id,
            generation = self.generation,
            state = %self.state,
            error = %err,
            "Player failed after creation"
        );

        self.release_player();
        self.play_pending = false;
        carousel.set_placeholder_visible(self.slide.id, true);
        self.set_state(PlayerState::Idle);
        carousel.emit(VideoEvent::error(self.slide.id, &err));
    }

    /// Pause-only deactivation: keep the player, stop playback.
    ///
    /// An unconfirmed play becomes `PlayAborted`; the SDK's confirmation,
    /// when it finally arrives, is reversed then.
    pub fn pause(&mut self, carousel: &dyn Carousel) {
        if self.state != PlayerState::Playing {
            debug!(slide = %self.slide.id, state = %self.state, "Nothing to pause");
            return;
        }

        if self.play_pending {
            self.set_state(PlayerState::PlayAborted);
            return;
        }

        if let Some(player) = self.player.as_mut() {
            player.pause();
        }
        self.set_state(PlayerState::Ready);
        carousel.emit(VideoEvent::Pause {
            slide: self.slide.id,
            video_id: self.current_video_id(),
        });
    }

    /// Tear the player down and show the placeholder. Idempotent.
    pub fn destroy(&mut self, carousel: &dyn Carousel) {
        if self.state == PlayerState::Idle && self.player.is_none() {
            return;
        }

        self.release_player();
        self.play_pending = false;
        carousel.set_placeholder_visible(self.slide.id, true);
        self.set_state(PlayerState::Idle);
    }

    /// Forward a mute toggle to the live adapter
    pub fn set_muted(&mut self, muted: bool) -> bool {
        match self.player.as_mut() {
            Some(player) => {
                player.set_muted(muted);
                true
            }
            None => false,
        }
    }

    fn release_player(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.destroy();
            debug!(slide = %self.slide.id, generation = self.generation, "Player destroyed");
        }
        self.video_id = None;
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.release_player();
    }
}

impl std::fmt::Debug for PlayerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSession")
            .field("id", &self.id)
            .field("slide", &self.slide.id)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("play_pending", &self.play_pending)
            .finish()
    }
}
