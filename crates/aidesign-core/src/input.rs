//! Input types and per-session pointer/keyboard state.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    /// Wheel or trackpad scroll; positive y scrolls down.
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

/// Keyboard event using DOM-style key names ("a", "Escape", "ArrowLeft", " ").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u64 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Tracks pointer and keyboard state between events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Last pointer position in screen coordinates.
    pub pointer_position: Point,
    pub modifiers: Modifiers,
    /// Whether the space bar is held (temporary hand tool).
    pub space_held: bool,
    /// Button that started the current press, if any.
    pub pressed_button: Option<MouseButton>,
    /// Screen position of the current press.
    press_position: Option<Point>,
    /// Where and when the last click (press + release without travel) ended.
    last_click: Option<(Point, Instant)>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press. Returns true if it completes a double-click.
    pub fn press(&mut self, position: Point, button: MouseButton, now: Instant) -> bool {
        self.pointer_position = position;
        self.pressed_button = Some(button);
        self.press_position = Some(position);
        if button != MouseButton::Left {
            return false;
        }
        let is_double = self.last_click.is_some_and(|(at, time)| {
            now.saturating_duration_since(time) <= Duration::from_millis(DOUBLE_CLICK_TIME_MS)
                && at.distance(position) <= DOUBLE_CLICK_DISTANCE
        });
        if is_double {
            self.last_click = None;
        }
        is_double
    }

    /// Record a release, remembering it as a click if the pointer stayed put.
    pub fn release(&mut self, position: Point, button: MouseButton, now: Instant) {
        self.pointer_position = position;
        let was_click = button == MouseButton::Left
            && self
                .press_position
                .is_some_and(|start| start.distance(position) <= DOUBLE_CLICK_DISTANCE);
        self.last_click = if was_click { Some((position, now)) } else { None };
        self.pressed_button = None;
        self.press_position = None;
    }

    pub fn move_to(&mut self, position: Point) {
        self.pointer_position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_click_detection() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        let p = Point::new(10.0, 10.0);
        assert!(!input.press(p, MouseButton::Left, t0));
        input.release(p, MouseButton::Left, t0);
        let t1 = t0 + Duration::from_millis(200);
        assert!(input.press(Point::new(12.0, 11.0), MouseButton::Left, t1));
    }

    #[test]
    fn test_slow_second_click_is_single() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        let p = Point::new(10.0, 10.0);
        input.press(p, MouseButton::Left, t0);
        input.release(p, MouseButton::Left, t0);
        assert!(!input.press(p, MouseButton::Left, t0 + Duration::from_millis(800)));
    }

    #[test]
    fn test_drag_is_not_a_click() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.press(Point::new(0.0, 0.0), MouseButton::Left, t0);
        input.release(Point::new(100.0, 0.0), MouseButton::Left, t0);
        assert!(!input.press(Point::new(100.0, 0.0), MouseButton::Left, t0));
    }

    #[test]
    fn test_command_modifier() {
        assert!(Modifiers::ctrl().command());
        assert!(!Modifiers::shift().command());
    }
}
