//! Pull-model event pump on top of winit.
//!
//! winit normally owns the main loop and pushes events into an
//! `ApplicationHandler`. The game instead polls: `Platform::poll_events`
//! pumps the OS queue with a zero timeout (`pump_app_events`), the handler
//! translates window events into `GameEvent`s, and the queued events are
//! drained and returned. This lets both the game loop and the blocking
//! cutscene loop read input whenever they need it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use saga_core::input::{EventSource, GameEvent, InputState, Key, KeyState, MouseBtn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::window::{create_window, PlatformConfig, PlatformError};

const WINDOW_WAIT_PUMPS: u32 = 500;
const WINDOW_WAIT_TIMEOUT: Duration = Duration::from_millis(10);

/// Turns raw platform input into queued `GameEvent`s and tracks held keys.
#[derive(Default)]
struct InputTranslator {
    queue: VecDeque<GameEvent>,
    input: InputState,
}

impl InputTranslator {
    fn close_requested(&mut self) {
        self.queue.push_back(GameEvent::Quit);
    }

    fn key(&mut self, key: Key, pressed: bool) {
        if pressed {
            if !self.input.key_down(key) {
                return;
            }
            if key == Key::Escape {
                self.queue.push_back(GameEvent::Quit);
            } else {
                self.queue.push_back(GameEvent::KeyPressed(key));
            }
        } else if self.input.key_up(key) {
            self.queue.push_back(GameEvent::KeyReleased(key));
        }
    }

    fn pointer_moved(&mut self, x: f64, y: f64) {
        self.input.pointer_position = (x, y);
    }

    fn mouse(&mut self, button: MouseBtn, pressed: bool) {
        if !pressed {
            self.input.mouse_up(button);
            return;
        }
        if self.input.mouse_down(button) {
            let (x, y) = self.input.pointer_position;
            self.queue
                .push_back(GameEvent::PointerPressed { button, x, y });
        }
    }

    fn focus_lost(&mut self) {
        self.input.release_all();
    }

    fn drain(&mut self) -> Vec<GameEvent> {
        self.input.end_frame();
        self.queue.drain(..).collect()
    }
}

struct PumpHandler {
    config: PlatformConfig,
    window: Option<Arc<Window>>,
    window_error: Option<PlatformError>,
    translator: InputTranslator,
}

impl ApplicationHandler for PumpHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match create_window(event_loop, &self.config) {
            Ok(window) => {
                log::info!(
                    "Window created: {}x{}",
                    self.config.width,
                    self.config.height
                );
                self.window = Some(window);
            }
            Err(err) => self.window_error = Some(err),
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.translator.close_requested();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        let pressed = event.state == ElementState::Pressed;
                        self.translator.key(key, pressed);
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.translator.pointer_moved(position.x, position.y);
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(btn) = map_button(button) {
                    self.translator
                        .mouse(btn, state == ElementState::Pressed);
                }
            }

            WindowEvent::Focused(false) => self.translator.focus_lost(),

            _ => {}
        }
    }
}

/// Owns the OS event loop and the window it created.
pub struct Platform {
    event_loop: EventLoop<()>,
    handler: PumpHandler,
    exited: bool,
}

impl Platform {
    /// Create the event loop and pump it until the window exists.
    pub fn new(config: PlatformConfig) -> Result<Self, PlatformError> {
        let event_loop = EventLoop::new().map_err(PlatformError::EventLoop)?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut platform = Self {
            event_loop,
            handler: PumpHandler {
                config,
                window: None,
                window_error: None,
                translator: InputTranslator::default(),
            },
            exited: false,
        };

        for _ in 0..WINDOW_WAIT_PUMPS {
            platform.pump(Some(WINDOW_WAIT_TIMEOUT));
            if let Some(err) = platform.handler.window_error.take() {
                return Err(err);
            }
            if platform.handler.window.is_some() {
                return Ok(platform);
            }
        }
        Err(PlatformError::NoWindow(WINDOW_WAIT_PUMPS))
    }

    pub fn window(&self) -> Option<Arc<Window>> {
        self.handler.window.clone()
    }

    fn pump(&mut self, timeout: Option<Duration>) {
        if self.exited {
            return;
        }
        let status = self
            .event_loop
            .pump_app_events(timeout, &mut self.handler);
        if let PumpStatus::Exit(code) = status {
            log::info!("Event loop exited with code {}", code);
            self.exited = true;
            self.handler.translator.close_requested();
        }
    }
}

impl EventSource for Platform {
    fn poll_events(&mut self) -> Vec<GameEvent> {
        self.pump(Some(Duration::ZERO));
        self.handler.translator.drain()
    }

    fn key_state(&self) -> KeyState {
        self.handler.translator.input.key_state()
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ShiftLeft => Some(Key::LShift),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyD => Some(Key::D),
        _ => None,
    }
}

fn map_button(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        MouseButton::Middle => Some(MouseBtn::Middle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_and_release_are_queued_once() {
        let mut t = InputTranslator::default();
        t.key(Key::Right, true);
        t.key(Key::Right, true); // OS repeat
        t.key(Key::Right, false);
        assert_eq!(
            t.drain(),
            vec![
                GameEvent::KeyPressed(Key::Right),
                GameEvent::KeyReleased(Key::Right)
            ]
        );
    }

    #[test]
    fn drain_empties_the_queue() {
        let mut t = InputTranslator::default();
        t.close_requested();
        assert_eq!(t.drain(), vec![GameEvent::Quit]);
        assert!(t.drain().is_empty());
    }

    #[test]
    fn escape_requests_quit() {
        let mut t = InputTranslator::default();
        t.key(Key::Escape, true);
        assert_eq!(t.drain(), vec![GameEvent::Quit]);
    }

    #[test]
    fn pointer_press_carries_last_cursor_position() {
        let mut t = InputTranslator::default();
        t.pointer_moved(320.0, 200.0);
        t.mouse(MouseBtn::Left, true);
        t.mouse(MouseBtn::Left, false);
        assert_eq!(
            t.drain(),
            vec![GameEvent::PointerPressed {
                button: MouseBtn::Left,
                x: 320.0,
                y: 200.0
            }]
        );
    }

    #[test]
    fn held_keys_survive_drain_until_released() {
        let mut t = InputTranslator::default();
        t.key(Key::LShift, true);
        t.key(Key::Right, true);
        t.drain();
        assert!(t.input.key_state().is_down(Key::Right));
        assert!(t.input.key_state().is_down(Key::LShift));

        t.focus_lost();
        assert!(t.input.key_state().is_empty());
    }

    #[test]
    fn map_key_covers_movement_keys() {
        assert_eq!(map_key(KeyCode::ArrowLeft), Some(Key::Left));
        assert_eq!(map_key(KeyCode::ShiftLeft), Some(Key::LShift));
        assert_eq!(map_key(KeyCode::KeyD), Some(Key::D));
        assert_eq!(map_key(KeyCode::KeyQ), None);
        assert_eq!(map_key(KeyCode::F3), None);
        assert_eq!(map_key(KeyCode::Space), None);
    }

    #[test]
    fn map_button_ignores_extra_buttons() {
        assert_eq!(map_button(MouseButton::Left), Some(MouseBtn::Left));
        assert_eq!(map_button(MouseButton::Back), None);
    }
}
