//! Browser adapters, one per provider SDK

mod html;
mod vimeo;
mod youtube;

pub use html::HtmlVideoProvider;
pub use vimeo::VimeoProvider;
pub use youtube::YouTubeProvider;

use slidecast_core::{ContainerRef, Error, ProviderKind, Readiness, Result};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use web_sys::Element;

/// Readiness shared between an adapter and its SDK callbacks
pub(crate) type ReadyFlag = Rc<Cell<Readiness>>;

pub(crate) fn ready_flag() -> ReadyFlag {
    Rc::new(Cell::new(Readiness::Pending))
}

pub(crate) fn document(provider: ProviderKind) -> Result<web_sys::Document> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| Error::sdk(provider, "no document available"))
}

/// Append a fresh element to the slide container for the SDK to take over
pub(crate) fn mount(provider: ProviderKind, container: &ContainerRef, tag: &str) -> Result<Element> {
    let document = document(provider)?;
    let host = document
        .get_element_by_id(container.as_str())
        .ok_or_else(|| Error::sdk(provider, format!("container `{}` not found", container.as_str())))?;

    let element = document
        .create_element(tag)
        .map_err(|err| js_error(provider, err))?;
    element.set_class_name("slidecast-player");
    host.append_child(&element)
        .map_err(|err| js_error(provider, err))?;
    Ok(element)
}

/// Build a plain JS object from key/value pairs
pub(crate) fn object(entries: &[(&str, JsValue)]) -> JsValue {
    let object = js_sys::Object::new();
    for (key, value) in entries {
        let _ = js_sys::Reflect::set(&object, &JsValue::from_str(key), value);
    }
    object.into()
}

pub(crate) fn js_error(provider: ProviderKind, err: JsValue) -> Error {
    let message = err.as_string().unwrap_or_else(|| format!("{:?}", err));
    Error::sdk(provider, message)
}

/// Await a promise only to surface its rejection in the log
pub(crate) fn watch_promise(provider: ProviderKind, action: &'static str, promise: js_sys::Promise) {
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(err) = wasm_bindgen_futures::JsFuture::from(promise).await {
            tracing::debug!(provider = %provider, action, error = ?err, "SDK promise rejected");
        }
    });
}
