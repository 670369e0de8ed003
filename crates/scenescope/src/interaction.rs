//! Pointer tracking: drag deltas, click-versus-drag and double clicks.

use std::time::{Duration, Instant};

use glam::Vec2;

/// Maximum time between two clicks of a double click.
pub const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(400);

/// Maximum distance in device pixels between two clicks of a double click.
pub const DOUBLE_CLICK_DISTANCE: f64 = 4.0;

/// Mouse buttons the tracker distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
}

/// What the viewer should do in response to a pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    None,
    /// Rotate the camera by a window-normalized delta.
    Orbit(Vec2),
    /// Pan the camera by a window-normalized delta.
    Pan(Vec2),
    /// Run a pick query at a device pixel.
    Click { x: u32, y: u32, is_double_click: bool },
}

/// Tracks pointer state between events.
///
/// Drag deltas are normalized by the window size, with y pointing up. The
/// accumulated `|dx| + |dy|` of a left press decides on release whether the
/// press was a click (below the threshold) or a drag.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    position: (f64, f64),
    left_down: bool,
    right_down: bool,
    shift_down: bool,
    press_in_ui: bool,
    drag_distance: f32,
    click_drag_threshold: f32,
    last_click: Option<(Instant, (f64, f64))>,
}

impl PointerTracker {
    /// Creates a tracker with the given click/drag threshold.
    pub fn new(click_drag_threshold: f32) -> Self {
        Self {
            position: (0.0, 0.0),
            left_down: false,
            right_down: false,
            shift_down: false,
            press_in_ui: false,
            drag_distance: 0.0,
            click_drag_threshold,
            last_click: None,
        }
    }

    /// Current pointer position in device pixels.
    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    /// Drag distance accumulated since the last press.
    pub fn drag_distance(&self) -> f32 {
        self.drag_distance
    }

    pub fn set_click_drag_threshold(&mut self, threshold: f32) {
        self.click_drag_threshold = threshold;
    }

    pub fn set_shift(&mut self, down: bool) {
        self.shift_down = down;
    }

    /// Handles a pointer move to `position` in a window of `size` device pixels.
    ///
    /// `ui_claims` is whether the UI wants the pointer; the camera then stays
    /// put but the drag distance still accumulates.
    #[allow(clippy::cast_possible_truncation)]
    pub fn moved(
        &mut self,
        position: (f64, f64),
        size: (u32, u32),
        ui_claims: bool,
    ) -> PointerAction {
        let dx = position.0 - self.position.0;
        let dy = position.1 - self.position.1;
        self.position = position;

        if !self.left_down && !self.right_down {
            return PointerAction::None;
        }

        let width = f64::from(size.0.max(1));
        let height = f64::from(size.1.max(1));
        let delta = Vec2::new((dx / width) as f32, (-dy / height) as f32);
        self.drag_distance += delta.x.abs() + delta.y.abs();

        if ui_claims || self.press_in_ui {
            return PointerAction::None;
        }
        if self.right_down || self.shift_down {
            PointerAction::Pan(delta)
        } else {
            PointerAction::Orbit(delta)
        }
    }

    /// Handles a button press or release at the current position.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn button(
        &mut self,
        button: PointerButton,
        pressed: bool,
        ui_claims: bool,
        now: Instant,
    ) -> PointerAction {
        match (button, pressed) {
            (PointerButton::Left, true) => {
                self.left_down = true;
                self.press_in_ui = ui_claims;
                self.drag_distance = 0.0;
                PointerAction::None
            }
            (PointerButton::Right, true) => {
                self.right_down = true;
                self.drag_distance = 0.0;
                PointerAction::None
            }
            (PointerButton::Right, false) => {
                self.right_down = false;
                PointerAction::None
            }
            (PointerButton::Left, false) => {
                let was_down = std::mem::replace(&mut self.left_down, false);
                let is_click = was_down
                    && !self.press_in_ui
                    && self.drag_distance < self.click_drag_threshold;
                self.drag_distance = 0.0;
                self.press_in_ui = false;
                if !is_click {
                    return PointerAction::None;
                }

                let is_double_click = self.last_click.is_some_and(|(time, pos)| {
                    now.saturating_duration_since(time) <= DOUBLE_CLICK_INTERVAL
                        && (pos.0 - self.position.0).hypot(pos.1 - self.position.1)
                            <= DOUBLE_CLICK_DISTANCE
                });
                // A double click does not start another pair.
                self.last_click = if is_double_click {
                    None
                } else {
                    Some((now, self.position))
                };

                PointerAction::Click {
                    x: self.position.0.max(0.0) as u32,
                    y: self.position.1.max(0.0) as u32,
                    is_double_click,
                }
            }
        }
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(0.01)
    }
}
