pub mod runner;
pub mod storage;

use std::cell::RefCell;

use glam::Vec2;
use quest_engine::{InputEvent, MediaKind};
use wasm_bindgen::prelude::*;

pub use runner::QuestRunner;
pub use storage::{JsClock, LocalStorage};

thread_local! {
    static RUNNER: RefCell<Option<QuestRunner>> = RefCell::new(None);
}

/// Run `f` against the runner, or log and return `None` before `quest_init`.
fn with_runner<R>(f: impl FnOnce(&mut QuestRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(runner) => Some(f(runner)),
            None => {
                log::warn!("quest-web: not initialized, call quest_init() first");
                None
            }
        }
    })
}

fn push(event: InputEvent) {
    with_runner(|r| r.push_input(event));
}

/// Current window size, or zero when the page cannot report it (the quest
/// then falls back to its configured viewport).
fn window_viewport() -> Vec2 {
    let Some(window) = web_sys::window() else {
        return Vec2::ZERO;
    };
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Vec2::new(width as f32, height as f32)
}

/// Parse the manifest, load progress and show the first screen.
/// Returns false when the manifest is unusable.
#[wasm_bindgen]
pub fn quest_init(manifest_json: &str) -> bool {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let mut runner = match QuestRunner::new(manifest_json, window_viewport()) {
        Ok(runner) => runner,
        Err(e) => {
            log::error!("quest-web: {}", e);
            return false;
        }
    };
    runner.init();

    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(runner);
    });
    log::info!("quest-web: initialized");
    true
}

#[wasm_bindgen]
pub fn quest_tick(dt_ms: f64) {
    with_runner(|r| r.tick(dt_ms));
}

// ---- Input ----

#[wasm_bindgen]
pub fn quest_start() {
    push(InputEvent::Start);
}

#[wasm_bindgen]
pub fn quest_kickoff() {
    push(InputEvent::Kickoff);
}

#[wasm_bindgen]
pub fn quest_dismiss_start_hint() {
    push(InputEvent::DismissStartHint);
}

#[wasm_bindgen]
pub fn quest_restore(accept: bool) {
    push(if accept {
        InputEvent::RestoreAccepted
    } else {
        InputEvent::RestoreDeclined
    });
}

#[wasm_bindgen]
pub fn quest_restart() {
    push(InputEvent::Restart);
}

#[wasm_bindgen]
pub fn quest_select_option(index: u32) {
    push(InputEvent::SelectOption { index: index as usize });
}

#[wasm_bindgen]
pub fn quest_action_pressed() {
    push(InputEvent::ActionPressed);
}

#[wasm_bindgen]
pub fn quest_penalty_shot(x: f32, y: f32, area_width: f32, area_height: f32) {
    push(InputEvent::PenaltyShot { x, y, area_width, area_height });
}

#[wasm_bindgen]
pub fn quest_continue() {
    push(InputEvent::Continue);
}

#[wasm_bindgen]
pub fn quest_modal_next() {
    push(InputEvent::ModalNext);
}

#[wasm_bindgen]
pub fn quest_modal_close() {
    push(InputEvent::ModalClose);
}

#[wasm_bindgen]
pub fn quest_point_tapped(index: u32) {
    push(InputEvent::PointTapped { index: index as usize });
}

#[wasm_bindgen]
pub fn quest_toggle_music() {
    push(InputEvent::ToggleMusic);
}

#[wasm_bindgen]
pub fn quest_music_ended() {
    push(InputEvent::MusicEnded);
}

#[wasm_bindgen]
pub fn quest_music_failed() {
    push(InputEvent::MusicFailed);
}

#[wasm_bindgen]
pub fn quest_media_loaded() {
    push(InputEvent::MediaLoaded);
}

/// `kind`: 0 = music, 1 = sound, 2 = image, 3 = video.
#[wasm_bindgen]
pub fn quest_media_error(kind: u32) {
    match MediaKind::from_code(kind) {
        Some(kind) => push(InputEvent::MediaFailed { kind }),
        None => log::warn!("quest-web: unknown media kind {}", kind),
    }
}

#[wasm_bindgen]
pub fn quest_resize(width: f32, height: f32) {
    push(InputEvent::Resize { width, height });
}

// ---- Output ----

/// UI commands produced since the last call, as a JSON array.
#[wasm_bindgen]
pub fn quest_drain_commands() -> String {
    with_runner(|r| r.drain_commands_json()).unwrap_or_else(|| "[]".to_string())
}

#[wasm_bindgen]
pub fn get_points_ptr() -> *const f32 {
    with_runner(|r| r.points_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_point_count() -> u32 {
    with_runner(|r| r.point_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_current_stage() -> u32 {
    with_runner(|r| r.current_stage()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_total_stages() -> u32 {
    with_runner(|r| r.total_stages()).unwrap_or(0)
}
