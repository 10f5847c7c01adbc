//! Simulated provider and carousel
//!
//! A deterministic stand-in for a browser SDK: every command an adapter
//! receives is recorded, and SDK callbacks are fired explicitly by the
//! driver, in whatever order a race needs. Used by the test suites and by
//! `slidecast-cli simulate`.

use crate::{
    bridge::VideoBridge,
    config::VideoConfig,
    events::{Carousel, VideoEvent},
    provider::{CreateRequest, ProviderKind, SdkDispatch, SdkEvent, SdkEventKind, SdkHandle, VideoPlayer, VideoProvider},
    types::*,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

/// Command received by a simulated player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimCommand {
    Create,
    Play,
    Pause,
    Mute,
    Unmute,
    Destroy,
}

/// A recorded adapter command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimRecord {
    pub slide: SlideId,
    pub generation: u64,
    pub command: SimCommand,
}

#[derive(Default)]
struct SimState {
    records: Vec<SimRecord>,
    handles: HashMap<SlideId, SdkHandle>,
    ready: HashMap<(SlideId, u64), bool>,
    live: HashMap<SlideId, usize>,
    max_live: HashMap<SlideId, usize>,
    fail_next: Option<Error>,
}

/// Shared view of everything the simulated SDK saw
#[derive(Clone, Default)]
pub struct SimSdk {
    state: Rc<RefCell<SimState>>,
}

impl SimSdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapter factory for `kind` backed by this SDK
    pub fn provider(&self, kind: ProviderKind) -> SimulatedProvider {
        SimulatedProvider {
            kind,
            sdk: self.clone(),
        }
    }

    /// Make the next `create` fail with `err`
    pub fn fail_next(&self, err: Error) {
        self.state.borrow_mut().fail_next = Some(err);
    }

    /// Fire a callback from the most recent player of `slide`.
    ///
    /// Returns false when no player was ever created there.
    pub fn fire(&self, slide: SlideId, kind: SdkEventKind) -> bool {
        let Some(handle) = self.latest_handle(slide, kind) else {
            return false;
        };
        match kind {
            SdkEventKind::Failed => handle.failed("simulated SDK error"),
            kind => handle.emit(kind),
        }
        true
    }

    /// Fail the most recent player of `slide` with an SDK message
    pub fn fail(&self, slide: SlideId, message: &str) -> bool {
        let Some(handle) = self.latest_handle(slide, SdkEventKind::Failed) else {
            return false;
        };
        handle.failed(message);
        true
    }

    fn latest_handle(&self, slide: SlideId, kind: SdkEventKind) -> Option<SdkHandle> {
        let mut state = self.state.borrow_mut();
        let handle = state.handles.get(&slide).cloned()?;
        if kind == SdkEventKind::Ready {
            state.ready.insert((slide, handle.generation()), true);
        }
        Some(handle)
    }

    pub fn records(&self) -> Vec<SimRecord> {
        self.state.borrow().records.clone()
    }

    /// Commands received on `slide`, in order
    pub fn commands(&self, slide: SlideId) -> Vec<SimCommand> {
        self.state
            .borrow()
            .records
            .iter()
            .filter(|record| record.slide == slide)
            .map(|record| record.command)
            .collect()
    }

    pub fn count(&self, slide: SlideId, command: SimCommand) -> usize {
        self.commands(slide).into_iter().filter(|c| *c == command).count()
    }

    /// Players currently alive on `slide`
    pub fn live(&self, slide: SlideId) -> usize {
        self.state.borrow().live.get(&slide).copied().unwrap_or(0)
    }

    /// Highest number of players ever alive at once on `slide`
    pub fn max_live(&self, slide: SlideId) -> usize {
        self.state.borrow().max_live.get(&slide).copied().unwrap_or(0)
    }

    fn record(&self, slide: SlideId, generation: u64, command: SimCommand) {
        self.state.borrow_mut().records.push(SimRecord {
            slide,
            generation,
            command,
        });
    }
}

/// Adapter factory of the simulated SDK
pub struct SimulatedProvider {
    kind: ProviderKind,
    sdk: SimSdk,
}

impl VideoProvider for SimulatedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn create(&self, request: CreateRequest<'_>) -> Result<Box<dyn VideoPlayer>> {
        let slide = request.slide.id;
        let generation = request.handle.generation();

        {
            let mut state = self.sdk.state.borrow_mut();
            if let Some(err) = state.fail_next.take() {
                return Err(err);
            }

            state.handles.insert(slide, request.handle.clone());
            let live = state.live.entry(slide).or_insert(0);
            *live += 1;
            let live = *live;
            let max = state.max_live.entry(slide).or_insert(0);
            *max = (*max).max(live);
        }
        self.sdk.record(slide, generation, SimCommand::Create);
        if request.options.muted {
            self.sdk.record(slide, generation, SimCommand::Mute);
        }

        Ok(Box::new(SimPlayer {
            slide,
            generation,
            sdk: self.sdk.clone(),
            destroyed: false,
        }))
    }
}

/// Player handle of the simulated SDK
pub struct SimPlayer {
    slide: SlideId,
    generation: u64,
    sdk: SimSdk,
    destroyed: bool,
}

impl VideoPlayer for SimPlayer {
    fn play(&mut self) {
        self.sdk.record(self.slide, self.generation, SimCommand::Play);
    }

    fn pause(&mut self) {
        self.sdk.record(self.slide, self.generation, SimCommand::Pause);
    }

    fn set_muted(&mut self, muted: bool) {
        let command = if muted { SimCommand::Mute } else { SimCommand::Unmute };
        self.sdk.record(self.slide, self.generation, command);
    }

    fn readiness(&self) -> Readiness {
        let ready = self
            .sdk
            .state
            .borrow()
            .ready
            .get(&(self.slide, self.generation))
            .copied()
            .unwrap_or(false);
        if ready {
            Readiness::Ready
        } else {
            Readiness::Pending
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        if let Some(live) = self.sdk.state.borrow_mut().live.get_mut(&self.slide) {
            *live = live.saturating_sub(1);
        }
        self.sdk.record(self.slide, self.generation, SimCommand::Destroy);
    }
}

/// In-memory carousel with a single active slide
#[derive(Default)]
pub struct SimCarousel {
    active: Cell<Option<SlideId>>,
    events: RefCell<Vec<VideoEvent>>,
    placeholders: RefCell<BTreeMap<SlideId, bool>>,
}

impl SimCarousel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&self, slide: Option<SlideId>) {
        self.active.set(slide);
    }

    pub fn active(&self) -> Option<SlideId> {
        self.active.get()
    }

    pub fn events(&self) -> Vec<VideoEvent> {
        self.events.borrow().clone()
    }

    pub fn take_events(&self) -> Vec<VideoEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Events named `name` (e.g. `video:play`) emitted for `slide`
    pub fn count(&self, slide: SlideId, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.slide() == slide && event.name() == name)
            .count()
    }

    /// Placeholders start out visible
    pub fn placeholder_visible(&self, slide: SlideId) -> bool {
        self.placeholders.borrow().get(&slide).copied().unwrap_or(true)
    }
}

impl Carousel for SimCarousel {
    fn is_active(&self, slide: SlideId) -> bool {
        self.active.get() == Some(slide)
    }

    fn emit(&self, event: VideoEvent) {
        self.events.borrow_mut().push(event);
    }

    fn set_placeholder_visible(&self, slide: SlideId, visible: bool) {
        self.placeholders.borrow_mut().insert(slide, visible);
    }
}

/// FIFO of dispatched SDK callbacks, delivered when the driver pumps
#[derive(Clone, Default)]
pub struct SdkQueue {
    events: Rc<RefCell<VecDeque<SdkEvent>>>,
}

impl SdkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self) -> SdkDispatch {
        let events = self.events.clone();
        Rc::new(move |event| events.borrow_mut().push_back(event))
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn pop(&self) -> Option<SdkEvent> {
        self.events.borrow_mut().pop_front()
    }
}

/// A bridge wired to the simulated SDK and carousel
pub struct SimHarness {
    pub bridge: VideoBridge<Rc<SimCarousel>>,
    pub carousel: Rc<SimCarousel>,
    pub sdk: SimSdk,
    pub queue: SdkQueue,
}

impl SimHarness {
    /// Harness with a simulated adapter registered for every provider
    pub fn new(config: VideoConfig) -> Self {
        let carousel = Rc::new(SimCarousel::new());
        let sdk = SimSdk::new();
        let queue = SdkQueue::new();

        let mut bridge = VideoBridge::new(carousel.clone(), config, queue.dispatch());
        for kind in ProviderKind::ALL {
            bridge.register_provider(Box::new(sdk.provider(kind)));
        }

        Self {
            bridge,
            carousel,
            sdk,
            queue,
        }
    }

    /// Register a video slide with a generated container id
    pub fn add_slide(&mut self, slide: SlideId, provider: ProviderKind, source: &str) {
        self.bridge.register_slide(VideoSlide::new(
            slide,
            VideoSource::new(provider, source),
            ContainerRef::new(format!("slidecast-video-{}", slide.0)),
        ));
    }

    /// Navigate to `slide`: the previous slide deactivates first
    pub fn go_to(&mut self, slide: SlideId) {
        if let Some(previous) = self.carousel.active() {
            if previous == slide {
                return;
            }
            self.carousel.set_active(None);
            self.bridge.on_slide_deactivated(previous);
        }
        self.carousel.set_active(Some(slide));
        self.bridge.on_slide_activated(slide);
    }

    /// Leave `slide` without activating another one
    pub fn leave(&mut self, slide: SlideId) {
        if self.carousel.active() == Some(slide) {
            self.carousel.set_active(None);
        }
        self.bridge.on_slide_deactivated(slide);
    }

    pub fn play_clicked(&mut self, slide: SlideId) {
        self.bridge.on_play_requested(slide);
    }

    /// Fire an SDK callback and deliver everything queued
    pub fn fire(&mut self, slide: SlideId, kind: SdkEventKind) -> bool {
        let fired = self.sdk.fire(slide, kind);
        self.pump();
        fired
    }

    /// Fail the slide's latest player and deliver everything queued
    pub fn fail(&mut self, slide: SlideId, message: &str) -> bool {
        let failed = self.sdk.fail(slide, message);
        self.pump();
        failed
    }

    /// Deliver queued SDK callbacks in order
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.queue.pop() {
            self.bridge.handle_sdk_event(event);
            delivered += 1;
        }
        delivered
    }

    pub fn destroy_carousel(&mut self) {
        self.carousel.set_active(None);
        self.bridge.on_carousel_destroyed();
    }

    pub fn state(&self, slide: SlideId) -> Option<PlayerState> {
        self.bridge.state(slide)
    }
}
