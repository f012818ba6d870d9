// Desktop surface: a minifb window showing the composited frame, plus the
// translation from polled mouse state into the editor's input events.

use crate::error::Error;
use crate::gesture::InputEvent;
use crate::types::{FrameBuffer, Point};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window,
}

impl Drawer {
    /// Create a window sized to the logical canvas.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// False once the window lost focus.
    pub fn is_active(&mut self) -> bool {
        self.window.is_active()
    }

    pub fn esc_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
    }

    pub fn s_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::S, KeyRepeat::No)
    }

    pub fn p_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::P, KeyRepeat::No)
    }

    /// Mouse position in canvas pixels, `None` while outside the window.
    pub fn mouse_pos(&self) -> Option<Point> {
        self.window.get_mouse_pos(MouseMode::Discard).map(|(x, y)| Point::new(x, y))
    }

    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }

    pub fn shift_down(&self) -> bool {
        self.window.is_key_down(Key::LeftShift) || self.window.is_key_down(Key::RightShift)
    }

    /// Vertical wheel movement this frame (positive = away from the user).
    pub fn scroll_y(&self) -> Option<f32> {
        self.window.get_scroll_wheel().map(|(_, y)| y)
    }
}

/// Turns once-per-frame mouse polling into edge events.
#[derive(Debug, Default)]
pub struct PointerTracker {
    was_down: bool,
    last_pos: Option<Point>,
}

impl PointerTracker {
    pub fn update(&mut self, pos: Option<Point>, down: bool, shift: bool, scroll_y: Option<f32>) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let Some(p) = pos else {
            if self.last_pos.take().is_some() {
                events.push(InputEvent::PointerLeave);
            }
            self.was_down = down;
            return events;
        };

        if down && !self.was_down {
            events.push(InputEvent::PointerDown { pos: p });
        }
        if let Some(last) = self.last_pos {
            if last != p {
                events.push(InputEvent::PointerMove { pos: p, movement_x: p.x - last.x, modifier: shift });
            }
        }
        if !down && self.was_down {
            events.push(InputEvent::PointerUp);
        }
        // Wheel up means zoom in, which the interpreter expects as a negative delta.
        if let Some(y) = scroll_y.filter(|y| *y != 0.0) {
            events.push(InputEvent::Wheel { pos: p, delta_y: -y });
        }

        self.was_down = down;
        self.last_pos = Some(p);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_move_release_sequence() {
        let mut t = PointerTracker::default();
        assert!(t.update(Some(Point::new(10.0, 10.0)), false, false, None).is_empty());
        assert_eq!(
            t.update(Some(Point::new(10.0, 10.0)), true, false, None),
            vec![InputEvent::PointerDown { pos: Point::new(10.0, 10.0) }]
        );
        assert_eq!(
            t.update(Some(Point::new(14.0, 12.0)), true, true, None),
            vec![InputEvent::PointerMove { pos: Point::new(14.0, 12.0), movement_x: 4.0, modifier: true }]
        );
        assert_eq!(t.update(Some(Point::new(14.0, 12.0)), false, false, None), vec![InputEvent::PointerUp]);
    }

    #[test]
    fn leaving_the_window_and_scrolling() {
        let mut t = PointerTracker::default();
        t.update(Some(Point::new(5.0, 5.0)), true, false, None);
        assert_eq!(t.update(None, true, false, None), vec![InputEvent::PointerLeave]);
        assert!(t.update(None, false, false, None).is_empty());
        assert_eq!(
            t.update(Some(Point::new(1.0, 2.0)), false, false, Some(1.0)),
            vec![InputEvent::Wheel { pos: Point::new(1.0, 2.0), delta_y: -1.0 }]
        );
    }
}
