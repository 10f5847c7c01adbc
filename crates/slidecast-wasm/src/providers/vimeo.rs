//! Vimeo Player SDK adapter

use super::{js_error, mount, object, ready_flag, watch_promise, ReadyFlag};
use js_sys::Promise;
use slidecast_core::{
    CreateRequest, ProviderKind, Readiness, Result, SdkHandle, VideoPlayer, VideoProvider,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::Element;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Vimeo, js_name = Player)]
    type VimeoSdkPlayer;

    #[wasm_bindgen(catch, constructor, js_namespace = Vimeo, js_class = "Player")]
    fn new(element: &Element, options: &JsValue) -> std::result::Result<VimeoSdkPlayer, JsValue>;

    #[wasm_bindgen(method)]
    fn ready(this: &VimeoSdkPlayer) -> Promise;

    #[wasm_bindgen(method)]
    fn play(this: &VimeoSdkPlayer) -> Promise;

    #[wasm_bindgen(method)]
    fn pause(this: &VimeoSdkPlayer) -> Promise;

    #[wasm_bindgen(method, js_name = setMuted)]
    fn set_muted(this: &VimeoSdkPlayer, muted: bool) -> Promise;

    #[wasm_bindgen(method)]
    fn on(this: &VimeoSdkPlayer, event: &str, callback: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn off(this: &VimeoSdkPlayer, event: &str, callback: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn destroy(this: &VimeoSdkPlayer) -> Promise;
}

type Listener = (&'static str, Closure<dyn FnMut(JsValue)>);

#[derive(Debug, Default)]
pub struct VimeoProvider;

impl VimeoProvider {
    pub fn new() -> Self {
        Self
    }
}

impl VideoProvider for VimeoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Vimeo
    }

    fn create(&self, request: CreateRequest<'_>) -> Result<Box<dyn VideoPlayer>> {
        let element = mount(ProviderKind::Vimeo, request.container(), "div")?;
        let options = request.options;

        let id = request
            .video_id
            .parse::<f64>()
            .map(JsValue::from_f64)
            .unwrap_or_else(|_| JsValue::from_str(request.video_id));

        let config = object(&[
            ("id", id),
            ("controls", JsValue::from_bool(options.controls)),
            ("loop", JsValue::from_bool(options.loop_video)),
            ("muted", JsValue::from_bool(options.muted)),
            ("playsinline", JsValue::TRUE),
        ]);

        let player = match VimeoSdkPlayer::new(&element, &config) {
            Ok(player) => player,
            Err(err) => {
                element.remove();
                return Err(js_error(ProviderKind::Vimeo, err));
            }
        };

        let listeners: Vec<Listener> = vec![
            listener("play", &request.handle, SdkHandle::started),
            listener("pause", &request.handle, SdkHandle::paused),
            listener("ended", &request.handle, SdkHandle::ended),
        ];
        for (event, callback) in &listeners {
            player.on(event, callback.as_ref().unchecked_ref());
        }

        let ready = ready_flag();
        {
            let ready = ready.clone();
            let handle = request.handle.clone();
            let pending = player.ready();
            wasm_bindgen_futures::spawn_local(async move {
                match JsFuture::from(pending).await {
                    Ok(_) => {
                        ready.set(Readiness::Ready);
                        handle.ready();
                    }
                    Err(err) => {
                        tracing::warn!(slide = %handle.slide(), error = ?err, "Vimeo player never became ready");
                        handle.failed(format!("Vimeo player failed: {}", describe(&err)));
                    }
                }
            });
        }

        tracing::debug!(slide = %request.slide.id, video_id = request.video_id, "Vimeo player created");

        Ok(Box::new(VimeoPlayer {
            player: Some(player),
            element,
            ready,
            listeners,
        }))
    }
}

fn listener(event: &'static str, handle: &SdkHandle, report: fn(&SdkHandle)) -> Listener {
    let handle = handle.clone();
    let callback = Closure::<dyn FnMut(JsValue)>::new(move |_: JsValue| report(&handle));
    (event, callback)
}

/// Vimeo rejects with an `Error` whose `name` says why (`PrivacyError`, `NotFoundError`)
fn describe(err: &JsValue) -> String {
    let field = |key: &str| {
        js_sys::Reflect::get(err, &JsValue::from_str(key))
            .ok()
            .and_then(|value| value.as_string())
    };
    match (field("name"), field("message")) {
        (Some(name), Some(message)) => format!("{}: {}", name, message),
        (None, Some(message)) => message,
        _ => err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    }
}

struct VimeoPlayer {
    player: Option<VimeoSdkPlayer>,
    element: Element,
    ready: ReadyFlag,
    listeners: Vec<Listener>,
}

impl VideoPlayer for VimeoPlayer {
    fn play(&mut self) {
        if let Some(player) = &self.player {
            watch_promise(ProviderKind::Vimeo, "play", player.play());
        }
    }

    fn pause(&mut self) {
        if let Some(player) = &self.player {
            watch_promise(ProviderKind::Vimeo, "pause", player.pause());
        }
    }

    fn set_muted(&mut self, muted: bool) {
        if let Some(player) = &self.player {
            watch_promise(ProviderKind::Vimeo, "setMuted", player.set_muted(muted));
        }
    }

    fn readiness(&self) -> Readiness {
        self.ready.get()
    }

    fn destroy(&mut self) {
        let Some(player) = self.player.take() else {
            return;
        };

        for (event, callback) in self.listeners.drain(..) {
            player.off(event, callback.as_ref().unchecked_ref());
        }
        watch_promise(ProviderKind::Vimeo, "destroy", player.destroy());
        self.element.remove();
    }
}

impl Drop for VimeoPlayer {
    fn drop(&mut self) {
        self.destroy();
    }
}
