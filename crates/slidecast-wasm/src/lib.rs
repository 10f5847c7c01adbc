//! Slidecast WASM - carousel video bindings for the browser
//!
//! Drives YouTube, Vimeo and native `<video>` players from a carousel:
//! - Plays the video of the active slide
//! - Pauses or destroys players on navigation
//! - Resolves late SDK callbacks against the slide's live state
//!
//! ## Integration
//!
//! ```javascript
//! import init, { SlidecastVideo } from '@slidecast/wasm';
//!
//! await init();
//! const video = new SlidecastVideo(carousel, { mute: true, deactivationPolicy: 'destroy' });
//! await video.loadSdks();
//! video.registerSlide(2, 'youtube', 'https://youtu.be/dQw4w9WgXcQ', 'slide-2-video');
//! carousel.on('move', (next, prev) => { video.deactivate(prev); video.activate(next); });
//! ```

use serde::Serialize;
use slidecast_core::{
    ContainerRef, ProviderKind, SdkDispatch, SdkEvent, SdkLoader, SlideId, VideoBridge,
    VideoConfig, VideoSlide, VideoSource,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;

mod carousel;
mod loader;
mod logging;
mod providers;

pub use carousel::{JsCarousel, ACTIVE_CLASS};
pub use loader::ScriptLoader;
pub use providers::{HtmlVideoProvider, VimeoProvider, YouTubeProvider};

type Bridge = VideoBridge<Rc<JsCarousel>>;

/// Log to browser console
macro_rules! console_log {
    ($($t:tt)*) => {
        web_sys::console::log_1(&format!($($t)*).into());
    }
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init();
    slidecast_core::init();
    web_sys::console::log_1(&"[Slidecast WASM] Initialized".into());
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    slidecast_core::VERSION.to_string()
}

/// Snapshot of one registered slide
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SlideStatus {
    slide: usize,
    provider: ProviderKind,
    state: String,
    live_player: bool,
}

/// Video controller attached to one carousel instance
#[wasm_bindgen]
pub struct SlidecastVideo {
    bridge: Rc<RefCell<Bridge>>,
    carousel: Rc<JsCarousel>,
}

#[wasm_bindgen]
impl SlidecastVideo {
    /// `carousel` must expose `isActive(index)` and `emit(name, detail)`.
    /// `options` takes the camelCase video options; omit for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(carousel: JsValue, options: JsValue) -> Result<SlidecastVideo, JsValue> {
        let config: VideoConfig = if options.is_undefined() || options.is_null() {
            VideoConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|err| JsValue::from_str(&format!("invalid video options: {}", err)))?
        };

        let carousel = Rc::new(JsCarousel::new(carousel)?);

        let bridge = Rc::new_cyclic(|weak: &Weak<RefCell<Bridge>>| {
            let dispatch = deferred_dispatch(weak.clone(), carousel.clone());
            let bridge = VideoBridge::new(carousel.clone(), config, dispatch)
                .with_provider(Box::new(YouTubeProvider::new()))
                .with_provider(Box::new(VimeoProvider::new()))
                .with_provider(Box::new(HtmlVideoProvider::new()));
            RefCell::new(bridge)
        });

        Ok(Self { bridge, carousel })
    }

    /// Register a slide's video. `provider` is `youtube`, `vimeo` or `html`.
    #[wasm_bindgen(js_name = registerSlide)]
    pub fn register_slide(
        &self,
        index: usize,
        provider: &str,
        source: &str,
        container_id: &str,
    ) -> Result<(), JsValue> {
        let provider: ProviderKind = provider
            .parse()
            .map_err(to_js)?;

        let slide = SlideId(index);
        let video_slide = VideoSlide::new(
            slide,
            VideoSource::new(provider, source),
            ContainerRef::new(container_id),
        );
        self.with_bridge(|bridge| bridge.register_slide(video_slide))?;
        self.carousel.track_container(slide, container_id);
        Ok(())
    }

    #[wasm_bindgen(js_name = removeSlide)]
    pub fn remove_slide(&self, index: usize) -> Result<(), JsValue> {
        let slide = SlideId(index);
        self.with_bridge(|bridge| bridge.remove_slide(slide))?;
        self.carousel.forget_container(slide);
        Ok(())
    }

    /// The carousel moved onto `index`
    pub fn activate(&self, index: usize) -> Result<(), JsValue> {
        self.with_bridge(|bridge| bridge.on_slide_activated(SlideId(index)))
    }

    /// The carousel moved away from `index`
    pub fn deactivate(&self, index: usize) -> Result<(), JsValue> {
        self.with_bridge(|bridge| bridge.on_slide_deactivated(SlideId(index)))
    }

    #[wasm_bindgen(js_name = playClicked)]
    pub fn play_clicked(&self, index: usize) -> Result<(), JsValue> {
        self.with_bridge(|bridge| bridge.on_play_requested(SlideId(index)))
    }

    /// Returns false when the slide has no live player
    #[wasm_bindgen(js_name = setMuted)]
    pub fn set_muted(&self, index: usize, muted: bool) -> Result<bool, JsValue> {
        let slide = SlideId(index);
        self.with_bridge(|bridge| {
            bridge.slide(slide).map_err(to_js)?;
            Ok(bridge.set_muted(slide, muted))
        })?
    }

    /// Tear down every player; the carousel is going away
    pub fn destroy(&self) -> Result<(), JsValue> {
        self.with_bridge(|bridge| bridge.on_carousel_destroyed())?;
        self.carousel.clear_containers();
        Ok(())
    }

    /// Lifecycle state of a slide, or `undefined` for non-video slides
    pub fn state(&self, index: usize) -> Option<String> {
        let bridge = self.bridge.try_borrow().ok()?;
        bridge.state(SlideId(index)).map(|state| state.to_string())
    }

    /// Every registered slide with its state
    pub fn status(&self) -> Result<JsValue, JsValue> {
        let bridge = self.bridge.try_borrow().map_err(|_| busy())?;
        let status: Vec<SlideStatus> = bridge
            .slides()
            .map(|slide| SlideStatus {
                slide: slide.id.0,
                provider: slide.source.provider,
                state: bridge
                    .state(slide.id)
                    .map(|state| state.to_string())
                    .unwrap_or_default(),
                live_player: bridge
                    .session(slide.id)
                    .map(|session| session.has_player())
                    .unwrap_or(false),
            })
            .collect();

        serde_wasm_bindgen::to_value(&status).map_err(|err| JsValue::from_str(&err.to_string()))
    }

    /// Inject the provider SDK scripts. Resolves once every load settled;
    /// failed providers are reported as `video:error` on their slides.
    #[wasm_bindgen(js_name = loadSdks)]
    pub fn load_sdks(&self) -> js_sys::Promise {
        let bridge = self.bridge.clone();

        wasm_bindgen_futures::future_to_promise(async move {
            let loader = ScriptLoader::new();

            // No borrow across the await; the page keeps navigating meanwhile
            for kind in ProviderKind::ALL {
                let result = loader.load(kind).await;
                let mut bridge = bridge.try_borrow_mut().map_err(|_| busy())?;
                match result {
                    Ok(()) => bridge.mark_sdk_available(kind),
                    Err(err) => {
                        console_log!("[Slidecast WASM] {} SDK unavailable: {}", kind, err);
                        bridge.mark_sdk_unavailable(kind, err.to_string());
                    }
                }
            }

            Ok(JsValue::UNDEFINED)
        })
    }
}

impl SlidecastVideo {
    /// Run against the bridge, then deliver the events it emitted
    fn with_bridge<R>(&self, f: impl FnOnce(&mut Bridge) -> R) -> Result<R, JsValue> {
        let result = {
            let mut bridge = self.bridge.try_borrow_mut().map_err(|_| busy())?;
            f(&mut bridge)
        };
        self.carousel.flush();
        Ok(result)
    }
}

/// SDK callbacks can fire synchronously inside a player command, while the
/// bridge is borrowed. They are queued as microtasks instead.
fn deferred_dispatch(bridge: Weak<RefCell<Bridge>>, carousel: Rc<JsCarousel>) -> SdkDispatch {
    Rc::new(move |event: SdkEvent| deliver(bridge.clone(), carousel.clone(), event))
}

/// Hand one callback to the bridge on the next microtask, retrying while
/// the bridge is borrowed
fn deliver(bridge: Weak<RefCell<Bridge>>, carousel: Rc<JsCarousel>, event: SdkEvent) {
    wasm_bindgen_futures::spawn_local(async move {
        let Some(shared) = bridge.upgrade() else {
            return;
        };
        let delivered = match shared.try_borrow_mut() {
            Ok(mut inner) => {
                inner.handle_sdk_event(event);
                None
            }
            Err(_) => Some(event),
        };

        match delivered {
            None => carousel.flush(),
            Some(event) => {
                tracing::debug!(slide = %event.slide, event = %event.kind, "Bridge busy, callback requeued");
                deliver(bridge, carousel, event);
            }
        }
    });
}

fn to_js(err: slidecast_core::Error) -> JsValue {
    JsValue::from_str(&format!("{}: {}", err.error_code(), err))
}

fn busy() -> JsValue {
    JsValue::from_str("slidecast: re-entrant call while the video bridge is busy")
}
