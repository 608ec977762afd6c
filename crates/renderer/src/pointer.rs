//! Pointer position in normalized device-independent coordinates.
//!
//! `(-1, -1)` is the top-left of the viewport and `(1, 1)` the bottom-right.
//! Values are not clamped; a pointer moving past an edge may briefly report
//! coordinates outside `[-1, 1]`.

use crossbeam_channel::{unbounded, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved {
        client_x: f64,
        client_y: f64,
        viewport_width: f64,
        viewport_height: f64,
    },
    Entered,
    Left,
}

/// Snapshot read by the frame scheduler once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub x: f64,
    pub y: f64,
    pub inside: bool,
}

impl PointerState {
    /// Bounded pseudo-zoom derived from the distance to the centre.
    pub fn zoom(&self) -> f64 {
        (self.x * self.x + self.y * self.y).min(1.0)
    }
}

fn normalize(coordinate: f64, extent: f64) -> f64 {
    if extent > 0.0 {
        (coordinate / extent) * 2.0 - 1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct PointerFeed {
    sender: Sender<PointerEvent>,
}

impl PointerFeed {
    pub fn send(&self, event: PointerEvent) {
        let _ = self.sender.send(event);
    }

    pub fn moved(&self, client_x: f64, client_y: f64, viewport_width: f64, viewport_height: f64) {
        self.send(PointerEvent::Moved {
            client_x,
            client_y,
            viewport_width,
            viewport_height,
        });
    }

    pub fn entered(&self) {
        self.send(PointerEvent::Entered);
    }

    pub fn left(&self) {
        self.send(PointerEvent::Left);
    }
}

pub struct PointerTracker {
    state: PointerState,
    receiver: Receiver<PointerEvent>,
}

impl PointerTracker {
    pub fn new() -> (Self, PointerFeed) {
        let (sender, receiver) = unbounded();
        (
            Self {
                state: PointerState::default(),
                receiver,
            },
            PointerFeed { sender },
        )
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Moved {
                client_x,
                client_y,
                viewport_width,
                viewport_height,
            } => {
                self.state.x = normalize(client_x, viewport_width);
                self.state.y = normalize(client_y, viewport_height);
            }
            PointerEvent::Entered => self.state.inside = true,
            PointerEvent::Left => self.state.inside = false,
        }
    }

    /// Applies every queued event and returns the resulting state.
    pub fn sync(&mut self) -> PointerState {
        while let Ok(event) = self.receiver.try_recv() {
            self.handle(event);
        }
        self.state
    }

    pub fn state(&self) -> PointerState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_maps_viewport_to_unit_square() {
        let (mut tracker, feed) = PointerTracker::new();
        feed.moved(0.0, 0.0, 800.0, 600.0);
        let state = tracker.sync();
        assert_eq!((state.x, state.y), (-1.0, -1.0));

        feed.moved(400.0, 300.0, 800.0, 600.0);
        let state = tracker.sync();
        assert_eq!((state.x, state.y), (0.0, 0.0));

        feed.moved(600.0, 150.0, 800.0, 600.0);
        let state = tracker.sync();
        assert!((state.x - 0.5).abs() < 1e-12);
        assert!((state.y + 0.5).abs() < 1e-12);
    }

    #[test]
    fn coordinates_outside_viewport_are_not_clamped() {
        let (mut tracker, feed) = PointerTracker::new();
        feed.moved(900.0, -60.0, 800.0, 600.0);
        let state = tracker.sync();
        assert!(state.x > 1.0);
        assert!(state.y < -1.0);
        assert!((state.zoom() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_viewport_does_not_produce_nan() {
        let (mut tracker, _feed) = PointerTracker::new();
        tracker.handle(PointerEvent::Moved {
            client_x: 10.0,
            client_y: 10.0,
            viewport_width: 0.0,
            viewport_height: 0.0,
        });
        let state = tracker.state();
        assert_eq!((state.x, state.y), (0.0, 0.0));
    }

    #[test]
    fn enter_and_leave_toggle_inside_flag() {
        let (mut tracker, feed) = PointerTracker::new();
        assert!(!tracker.sync().inside);
        feed.entered();
        assert!(tracker.sync().inside);
        feed.left();
        feed.entered();
        feed.left();
        assert!(!tracker.sync().inside);
    }

    #[test]
    fn zoom_is_bounded() {
        let state = PointerState {
            x: 0.3,
            y: 0.4,
            inside: true,
        };
        assert!((state.zoom() - 0.25).abs() < 1e-12);
    }
}
