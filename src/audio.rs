use log::{debug, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, HtmlAudioElement};

use crate::presenter::{AudioNotifier, Sound};

const MATCH_ID: &str = "sfx-match";
const MATCH_SRC: &str = "sounds/match.wav";
const ERROR_ID: &str = "sfx-error";
const ERROR_SRC: &str = "sounds/error.wav";

/// Sound effects backed by `<audio>` elements. Every failure is swallowed.
pub struct WebAudio {
    match_sfx: Option<HtmlAudioElement>,
    error_sfx: Option<HtmlAudioElement>,
    muted: bool,
    unlocked: bool,
    ignore_rejection: Closure<dyn FnMut(JsValue)>,
}

impl WebAudio {
    pub fn new(document: &Document) -> Self {
        Self {
            match_sfx: load_audio(document, MATCH_ID, MATCH_SRC),
            error_sfx: load_audio(document, ERROR_ID, ERROR_SRC),
            muted: false,
            unlocked: false,
            ignore_rejection: Closure::new(|_: JsValue| {}),
        }
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn toggle_muted(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Mobile browsers only allow playback after a user gesture, so the first
    /// click plays each clip silently once.
    pub fn unlock(&mut self) {
        if self.unlocked {
            return;
        }
        self.unlocked = true;

        for audio in [&self.match_sfx, &self.error_sfx].into_iter().flatten() {
            audio.set_muted(true);
            self.swallow(audio.play());
            let _ = audio.pause();
            audio.set_muted(false);
            audio.set_current_time(0.0);
        }
    }

    /// Blocked or failed playback rejects the promise; drop the rejection.
    fn swallow(&self, played: Result<js_sys::Promise, JsValue>) {
        if let Ok(promise) = played {
            let _ = promise.catch(&self.ignore_rejection);
        }
    }
}

impl AudioNotifier for WebAudio {
    fn notify(&mut self, sound: Sound) {
        if self.muted {
            debug!("muted, skipping {sound:?}");
            return;
        }

        let source = match sound {
            Sound::Match => &self.match_sfx,
            Sound::InvalidSwap => &self.error_sfx,
        };
        let Some(source) = source else {
            warn!("no audio element for {sound:?}");
            return;
        };

        // Overlapping effects each get their own copy of the element.
        let Some(copy) = source
            .clone_node()
            .ok()
            .and_then(|node| node.dyn_into::<HtmlAudioElement>().ok())
        else {
            return;
        };
        self.swallow(copy.play());
    }
}

fn load_audio(document: &Document, id: &str, src: &str) -> Option<HtmlAudioElement> {
    if let Some(existing) = document.get_element_by_id(id) {
        return existing.dyn_into::<HtmlAudioElement>().ok();
    }

    let audio = document
        .create_element("audio")
        .ok()?
        .dyn_into::<HtmlAudioElement>()
        .ok()?;
    audio.set_id(id);
    audio.set_src(src);
    audio.set_preload("auto");
    let _ = audio.style().set_property("display", "none");
    document.body()?.append_child(&audio).ok()?;

    Some(audio)
}
