use serde::Serialize;

/// Top-level screens. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Start,
    Map,
    Task,
    Restore,
    Final,
}

/// Which screen is showing and which overlays sit on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenState {
    active: Screen,
    modal_open: bool,
    loader_visible: bool,
}

impl ScreenState {
    pub fn new() -> Self {
        Self {
            active: Screen::Start,
            modal_open: false,
            loader_visible: false,
        }
    }

    pub fn active(&self) -> Screen {
        self.active
    }

    pub fn is_active(&self, screen: Screen) -> bool {
        self.active == screen
    }

    /// Switch screens. Returns false if `screen` was already active.
    pub fn show(&mut self, screen: Screen) -> bool {
        let changed = self.active != screen;
        self.active = screen;
        changed
    }

    pub fn modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn open_modal(&mut self) {
        self.modal_open = true;
    }

    /// Close the content modal. Returns false if it was not open.
    pub fn close_modal(&mut self) -> bool {
        std::mem::replace(&mut self.modal_open, false)
    }

    pub fn loader_visible(&self) -> bool {
        self.loader_visible
    }

    pub fn set_loader(&mut self, visible: bool) {
        self.loader_visible = visible;
    }
}

impl Default for ScreenState {
    fn default() -> Self {
        Self::new()
    }
}

/// "Stage N of M" label with a 1-based stage number.
pub fn progress_label(current_stage: usize, total_stages: usize) -> String {
    format!("Stage {} of {}", current_stage + 1, total_stages)
}
