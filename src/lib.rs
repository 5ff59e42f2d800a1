pub mod game;
pub mod generator;
pub mod gravity;
pub mod grid;
pub mod level;
pub mod matching;
pub mod presenter;
pub mod rng;
pub mod session;

#[cfg(target_arch = "wasm32")]
mod audio;
#[cfg(target_arch = "wasm32")]
mod logging;
#[cfg(target_arch = "wasm32")]
mod ui;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    ui::start()
}
