//! Provider SDK script injection

use async_trait::async_trait;
use js_sys::{Function, Promise, Reflect};
use slidecast_core::{Error, ProviderKind, Result, SdkLoader};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlScriptElement, Window};

const YOUTUBE_API: &str = "https://www.youtube.com/iframe_api";
const VIMEO_API: &str = "https://player.vimeo.com/api/player.js";

/// Global the YouTube script calls once `YT.Player` is usable
const YOUTUBE_READY_HOOK: &str = "onYouTubeIframeAPIReady";

/// Loads SDKs by appending `<script>` tags to the document head
#[derive(Debug, Default)]
pub struct ScriptLoader;

impl ScriptLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl SdkLoader for ScriptLoader {
    async fn load(&self, provider: ProviderKind) -> Result<()> {
        let window = web_sys::window().ok_or_else(|| unavailable(provider, "no window"))?;

        match provider {
            ProviderKind::Html => Ok(()),
            ProviderKind::YouTube => {
                if has_player(&window, "YT") {
                    return Ok(());
                }
                inject(&window, provider, YOUTUBE_API, Some(YOUTUBE_READY_HOOK)).await
            }
            ProviderKind::Vimeo => {
                if has_player(&window, "Vimeo") {
                    return Ok(());
                }
                inject(&window, provider, VIMEO_API, None).await
            }
        }
    }
}

/// Whether `window[namespace].Player` already exists
fn has_player(window: &Window, namespace: &str) -> bool {
    Reflect::get(window, &JsValue::from_str(namespace))
        .ok()
        .filter(|ns| !ns.is_undefined() && !ns.is_null())
        .and_then(|ns| Reflect::get(&ns, &JsValue::from_str("Player")).ok())
        .map(|player| player.is_function())
        .unwrap_or(false)
}

/// Append the script and wait for it. With `ready_hook`, the global callback
/// of that name resolves the load instead of the script's `onload`.
async fn inject(
    window: &Window,
    provider: ProviderKind,
    src: &str,
    ready_hook: Option<&str>,
) -> Result<()> {
    let document = window
        .document()
        .ok_or_else(|| unavailable(provider, "no document"))?;
    let head = document
        .head()
        .ok_or_else(|| unavailable(provider, "document has no head"))?;

    let script: HtmlScriptElement = document
        .create_element("script")
        .map_err(|err| unavailable(provider, describe(&err)))?
        .dyn_into()
        .map_err(|_| unavailable(provider, "not a script element"))?;
    script.set_src(src);
    script.set_async(true);

    let loaded = Promise::new(&mut |resolve: Function, reject: Function| {
        match ready_hook {
            Some(hook) => {
                let _ = Reflect::set(window, &JsValue::from_str(hook), &resolve);
            }
            None => script.set_onload(Some(&resolve)),
        }
        script.set_onerror(Some(&reject));
    });

    head.append_child(&script)
        .map_err(|err| unavailable(provider, describe(&err)))?;
    tracing::debug!(provider = %provider, src, "SDK script injected");

    JsFuture::from(loaded)
        .await
        .map(|_| ())
        .map_err(|err| unavailable(provider, format!("{} failed to load: {}", src, describe(&err))))
}

fn unavailable(provider: ProviderKind, reason: impl Into<String>) -> Error {
    Error::SdkUnavailable {
        provider,
        reason: reason.into(),
    }
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
