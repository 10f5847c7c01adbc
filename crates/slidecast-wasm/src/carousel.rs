//! JavaScript carousel seen through the `Carousel` trait

use js_sys::{Function, Reflect};
use slidecast_core::{Carousel, SlideId, VideoEvent};
use std::cell::RefCell;
use std::collections::HashMap;
use wasm_bindgen::{JsCast, JsValue};

/// Class set on a video container while its player is showing
pub const ACTIVE_CLASS: &str = "is-video-active";

/// Wraps the host carousel object.
///
/// The host must expose `isActive(index) -> boolean` and
/// `emit(name, detail)`. Events are buffered and handed to `emit` by
/// [`JsCarousel::flush`] once the bridge borrow is released, so a listener
/// may call back into the player API.
pub struct JsCarousel {
    target: JsValue,
    is_active: Function,
    emit: Function,
    containers: RefCell<HashMap<SlideId, String>>,
    pending: RefCell<Vec<VideoEvent>>,
}

impl JsCarousel {
    pub fn new(target: JsValue) -> Result<Self, JsValue> {
        let is_active = method(&target, "isActive")?;
        let emit = method(&target, "emit")?;

        Ok(Self {
            target,
            is_active,
            emit,
            containers: RefCell::new(HashMap::new()),
            pending: RefCell::new(Vec::new()),
        })
    }

    /// Remember which element hosts the player of a slide
    pub fn track_container(&self, slide: SlideId, container_id: &str) {
        self.containers
            .borrow_mut()
            .insert(slide, container_id.to_string());
    }

    pub fn forget_container(&self, slide: SlideId) {
        self.containers.borrow_mut().remove(&slide);
    }

    pub fn clear_containers(&self) {
        self.containers.borrow_mut().clear();
    }

    /// Deliver buffered events to the host
    pub fn flush(&self) {
        let events = std::mem::take(&mut *self.pending.borrow_mut());

        for event in events {
            let detail = match serde_wasm_bindgen::to_value(&event) {
                Ok(detail) => detail,
                Err(err) => {
                    tracing::warn!(event = event.name(), error = %err, "Event not serializable");
                    continue;
                }
            };

            let name = JsValue::from_str(event.name());
            if let Err(err) = self.emit.call2(&self.target, &name, &detail) {
                tracing::warn!(event = event.name(), error = ?err, "Carousel listener threw");
            }
        }
    }
}

impl Carousel for JsCarousel {
    fn is_active(&self, slide: SlideId) -> bool {
        let index = JsValue::from_f64(slide.0 as f64);
        match self.is_active.call1(&self.target, &index) {
            Ok(active) => active.is_truthy(),
            Err(err) => {
                tracing::warn!(slide = %slide, error = ?err, "isActive threw");
                false
            }
        }
    }

    fn emit(&self, event: VideoEvent) {
        self.pending.borrow_mut().push(event);
    }

    fn set_placeholder_visible(&self, slide: SlideId, visible: bool) {
        let containers = self.containers.borrow();
        let Some(id) = containers.get(&slide) else {
            return;
        };

        let element = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(id));

        if let Some(element) = element {
            // A hidden placeholder means the player is showing
            let _ = element.class_list().toggle_with_force(ACTIVE_CLASS, !visible);
        }
    }
}

fn method(target: &JsValue, name: &str) -> Result<Function, JsValue> {
    Reflect::get(target, &JsValue::from_str(name))?
        .dyn_into::<Function>()
        .map_err(|_| JsValue::from_str(&format!("carousel is missing `{}`", name)))
}
