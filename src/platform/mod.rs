//! Platform abstraction layer
//!
//! The runner reaches its environment only through [`Host`]:
//! - Time (monotonic milliseconds)
//! - Frame scheduling (single outstanding request)
//! - Sound and haptics
//! - The drawing surface (`Host: Renderer`)
//!
//! `headless` drives sessions from tests and the native binary; `web` is the
//! browser implementation.

pub mod headless;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use headless::HeadlessHost;

use serde::{Deserialize, Serialize};

use crate::audio::SoundEffect;
use crate::renderer::Renderer;

/// Identifies one frame request. Handles are never reused within a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

/// Player input, already mapped from keys/touches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Jump key or touch start. `touch` distinguishes taps on the surface.
    JumpPressed { touch: bool },
    JumpReleased,
    DuckPressed,
    DuckReleased,
    RestartPressed,
    Resize { width: i32, height: i32 },
}

impl InputEvent {
    /// Map a `KeyboardEvent.key` going down
    pub fn from_key_down(key: &str) -> Option<Self> {
        match key {
            " " | "ArrowUp" => Some(InputEvent::JumpPressed { touch: false }),
            "ArrowDown" => Some(InputEvent::DuckPressed),
            _ => None,
        }
    }

    /// Map a `KeyboardEvent.key` coming back up
    pub fn from_key_up(key: &str) -> Option<Self> {
        match key {
            " " | "ArrowUp" => Some(InputEvent::JumpReleased),
            "ArrowDown" => Some(InputEvent::DuckReleased),
            "Enter" => Some(InputEvent::RestartPressed),
            _ => None,
        }
    }
}

/// Everything the runner needs from its environment
pub trait Host: Renderer {
    /// Monotonic clock in milliseconds
    fn now(&self) -> f64;

    /// Ask for `Runner::on_frame` to be called on the next frame.
    /// `None` when the host cannot schedule one.
    fn request_frame(&mut self) -> Option<FrameHandle>;

    fn cancel_frame(&mut self, handle: FrameHandle);

    fn play_sound(&mut self, effect: SoundEffect);

    /// Haptic feedback; hosts without a vibration motor ignore it
    fn vibrate(&mut self, _duration_ms: u32) {}
}
