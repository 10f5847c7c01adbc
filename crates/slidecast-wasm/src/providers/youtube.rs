//! YouTube IFrame Player adapter

use super::{js_error, mount, object, ready_flag, ReadyFlag};
use slidecast_core::{
    CreateRequest, ProviderKind, Readiness, Result, SdkHandle, VideoPlayer, VideoProvider,
};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::Element;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = YT, js_name = Player)]
    type YtPlayer;

    #[wasm_bindgen(catch, constructor, js_namespace = YT, js_class = "Player")]
    fn new(element: &Element, options: &JsValue) -> std::result::Result<YtPlayer, JsValue>;

    #[wasm_bindgen(method, js_name = playVideo)]
    fn play_video(this: &YtPlayer);

    #[wasm_bindgen(method, js_name = pauseVideo)]
    fn pause_video(this: &YtPlayer);

    #[wasm_bindgen(method)]
    fn mute(this: &YtPlayer);

    #[wasm_bindgen(method, js_name = unMute)]
    fn un_mute(this: &YtPlayer);

    #[wasm_bindgen(method)]
    fn destroy(this: &YtPlayer);
}

/// `onStateChange` data codes
const STATE_ENDED: i32 = 0;
const STATE_PLAYING: i32 = 1;
const STATE_PAUSED: i32 = 2;

#[derive(Debug, Default)]
pub struct YouTubeProvider;

impl YouTubeProvider {
    pub fn new() -> Self {
        Self
    }
}

impl VideoProvider for YouTubeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::YouTube
    }

    fn create(&self, request: CreateRequest<'_>) -> Result<Box<dyn VideoPlayer>> {
        let element = mount(ProviderKind::YouTube, request.container(), "div")?;
        let ready = ready_flag();
        let muted = Rc::new(Cell::new(request.options.muted));

        let on_ready = {
            let handle = request.handle.clone();
            let ready = ready.clone();
            let muted = muted.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
                // The player only accepts mute once it is ready
                if muted.get() {
                    call_target(&event, "mute");
                }
                ready.set(Readiness::Ready);
                handle.ready();
            })
        };

        let on_state_change = {
            let handle = request.handle.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
                forward_state(&handle, &event);
            })
        };

        let on_error = {
            let handle = request.handle.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
                forward_error(&handle, &event);
            })
        };

        let flag = |on: bool| JsValue::from_f64(if on { 1.0 } else { 0.0 });
        let options = request.options;
        let mut vars = vec![
            ("controls", flag(options.controls)),
            ("loop", flag(options.loop_video)),
            ("playsinline", flag(true)),
            ("rel", flag(false)),
        ];
        if options.loop_video {
            // Looping a single video needs it as its own playlist
            vars.push(("playlist", JsValue::from_str(request.video_id)));
        }

        let config = object(&[
            ("videoId", JsValue::from_str(request.video_id)),
            ("playerVars", object(&vars)),
            (
                "events",
                object(&[
                    ("onReady", on_ready.as_ref().clone()),
                    ("onStateChange", on_state_change.as_ref().clone()),
                    ("onError", on_error.as_ref().clone()),
                ]),
            ),
        ]);

        let player = match YtPlayer::new(&element, &config) {
            Ok(player) => player,
            Err(err) => {
                element.remove();
                return Err(js_error(ProviderKind::YouTube, err));
            }
        };

        tracing::debug!(slide = %request.slide.id, video_id = request.video_id, "YouTube player created");

        Ok(Box::new(YouTubePlayer {
            player: Some(player),
            element,
            ready,
            muted,
            _callbacks: vec![on_ready, on_state_change, on_error],
        }))
    }
}

struct YouTubePlayer {
    player: Option<YtPlayer>,
    element: Element,
    ready: ReadyFlag,
    muted: Rc<Cell<bool>>,
    _callbacks: Vec<Closure<dyn FnMut(JsValue)>>,
}

impl VideoPlayer for YouTubePlayer {
    fn play(&mut self) {
        if let Some(player) = &self.player {
            player.play_video();
        }
    }

    fn pause(&mut self) {
        if let Some(player) = &self.player {
            player.pause_video();
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted.set(muted);
        if self.ready.get() != Readiness::Ready {
            return;
        }
        if let Some(player) = &self.player {
            if muted {
                player.mute();
            } else {
                player.un_mute();
            }
        }
    }

    fn readiness(&self) -> Readiness {
        self.ready.get()
    }

    fn destroy(&mut self) {
        if let Some(player) = self.player.take() {
            player.destroy();
            self.element.remove();
            self._callbacks.clear();
        }
    }
}

impl Drop for YouTubePlayer {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn forward_state(handle: &SdkHandle, event: &JsValue) {
    let data = js_sys::Reflect::get(event, &JsValue::from_str("data"))
        .ok()
        .and_then(|data| data.as_f64());

    match data.map(|code| code as i32) {
        Some(STATE_PLAYING) => handle.started(),
        Some(STATE_PAUSED) => handle.paused(),
        Some(STATE_ENDED) => handle.ended(),
        _ => {}
    }
}

fn forward_error(handle: &SdkHandle, event: &JsValue) {
    let code = js_sys::Reflect::get(event, &JsValue::from_str("data"))
        .ok()
        .and_then(|data| data.as_f64())
        .map(|code| code as i32);

    match code {
        Some(code) => handle.failed(format!("YouTube error {}: {}", code, error_reason(code))),
        None => handle.failed("YouTube player error"),
    }
}

/// `onError` data codes
fn error_reason(code: i32) -> &'static str {
    match code {
        2 => "invalid video id",
        5 => "HTML5 player error",
        100 => "video not found or private",
        101 | 150 => "embedding disabled by the owner",
        _ => "unknown error",
    }
}

fn call_target(event: &JsValue, method: &str) {
    let target = match js_sys::Reflect::get(event, &JsValue::from_str("target")) {
        Ok(target) => target,
        Err(_) => return,
    };
    if let Ok(func) = js_sys::Reflect::get(&target, &JsValue::from_str(method)) {
        if let Some(func) = func.dyn_ref::<js_sys::Function>() {
            let _ = func.call0(&target);
        }
    }
}
