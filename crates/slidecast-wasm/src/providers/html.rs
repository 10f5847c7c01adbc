//! Native `<video>` adapter

use super::{js_error, mount, ready_flag, watch_promise, ReadyFlag};
use slidecast_core::{
    CreateRequest, ProviderKind, Readiness, Result, SdkHandle, VideoPlayer, VideoProvider,
};
use wasm_bindgen::prelude::*;
use web_sys::HtmlVideoElement;

type Listener = (&'static str, Closure<dyn FnMut(web_sys::Event)>);

#[derive(Debug, Default)]
pub struct HtmlVideoProvider;

impl HtmlVideoProvider {
    pub fn new() -> Self {
        Self
    }
}

impl VideoProvider for HtmlVideoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Html
    }

    fn create(&self, request: CreateRequest<'_>) -> Result<Box<dyn VideoPlayer>> {
        let element = mount(ProviderKind::Html, request.container(), "video")?;
        let video: HtmlVideoElement = element
            .dyn_into()
            .map_err(|err| js_error(ProviderKind::Html, err.into()))?;

        let options = request.options;
        video.set_src(request.video_id);
        video.set_controls(options.controls);
        video.set_loop(options.loop_video);
        video.set_muted(options.muted);
        video.set_preload("auto");
        let _ = video.set_attribute("playsinline", "");

        let ready = ready_flag();
        let on_loaded = {
            let ready = ready.clone();
            let handle = request.handle.clone();
            Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| {
                ready.set(Readiness::Ready);
                handle.ready();
            })
        };

        let listeners: Vec<Listener> = vec![
            ("loadeddata", on_loaded),
            listener("play", &request.handle, SdkHandle::started),
            listener("pause", &request.handle, SdkHandle::paused),
            listener("ended", &request.handle, SdkHandle::ended),
        ];
        for (event, callback) in &listeners {
            video
                .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
                .map_err(|err| js_error(ProviderKind::Html, err))?;
        }

        tracing::debug!(slide = %request.slide.id, src = request.video_id, "Video element created");

        Ok(Box::new(HtmlPlayer {
            video: Some(video),
            ready,
            listeners,
        }))
    }
}

fn listener(event: &'static str, handle: &SdkHandle, report: fn(&SdkHandle)) -> Listener {
    let handle = handle.clone();
    let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| report(&handle));
    (event, callback)
}

struct HtmlPlayer {
    video: Option<HtmlVideoElement>,
    ready: ReadyFlag,
    listeners: Vec<Listener>,
}

impl VideoPlayer for HtmlPlayer {
    fn play(&mut self) {
        let Some(video) = &self.video else {
            return;
        };
        match video.play() {
            Ok(promise) => watch_promise(ProviderKind::Html, "play", promise),
            Err(err) => tracing::debug!(error = ?err, "Video element refused to play"),
        }
    }

    fn pause(&mut self) {
        if let Some(video) = &self.video {
            let _ = video.pause();
        }
    }

    fn set_muted(&mut self, muted: bool) {
        if let Some(video) = &self.video {
            video.set_muted(muted);
        }
    }

    fn readiness(&self) -> Readiness {
        self.ready.get()
    }

    fn destroy(&mut self) {
        let Some(video) = self.video.take() else {
            return;
        };

        for (event, callback) in self.listeners.drain(..) {
            let _ = video.remove_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
        }
        let _ = video.pause();
        video.remove_attribute("src").ok();
        video.remove();
    }
}

impl Drop for HtmlPlayer {
    fn drop(&mut self) {
        self.destroy();
    }
}
