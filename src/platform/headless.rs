//! Headless host: manual clock, recorded frames and sounds

use crate::audio::SoundEffect;
use crate::renderer::{RecordingRenderer, Rect, Renderer, Sprite};

use super::{FrameHandle, Host};

/// A host whose time only moves when told to
#[derive(Debug, Default)]
pub struct HeadlessHost {
    time: f64,
    next_handle: u64,
    pending: Option<FrameHandle>,
    pub renderer: RecordingRenderer,
    pub sounds: Vec<SoundEffect>,
    pub vibrations: Vec<u32>,
    /// Frame requests issued over the host's lifetime
    pub frames_requested: u64,
    /// Refuse frame requests, like a browser without a scheduler
    pub frames_unavailable: bool,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, ms: f64) {
        self.time += ms;
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    /// Outstanding frame request, if any
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Hand out the pending frame, as a browser would when the frame fires
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn count_sounds(&self, effect: SoundEffect) -> usize {
        self.sounds.iter().filter(|s| **s == effect).count()
    }
}

impl Renderer for HeadlessHost {
    fn draw_sprite(&mut self, sprite: Sprite, source: Rect, dest: Rect) {
        self.renderer.draw_sprite(sprite, source, dest);
    }

    fn clear(&mut self, area: Rect) {
        self.renderer.clear(area);
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.renderer.set_alpha(alpha);
    }
}

impl Host for HeadlessHost {
    fn now(&self) -> f64 {
        self.time
    }

    fn request_frame(&mut self) -> Option<FrameHandle> {
        if self.frames_unavailable {
            return None;
        }
        self.next_handle += 1;
        self.frames_requested += 1;
        let handle = FrameHandle(self.next_handle);
        self.pending = Some(handle);
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }

    fn play_sound(&mut self, effect: SoundEffect) {
        log::debug!("Sound: {:?}", effect);
        self.sounds.push(effect);
    }

    fn vibrate(&mut self, duration_ms: u32) {
        self.vibrations.push(duration_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_handles_are_unique_and_cancellable() {
        let mut host = HeadlessHost::new();
        let a = host.request_frame().unwrap();
        let b = host.request_frame().unwrap();
        assert_ne!(a, b);
        assert_eq!(host.pending_frame(), Some(b));

        // Cancelling a stale handle leaves the live one alone
        host.cancel_frame(a);
        assert_eq!(host.pending_frame(), Some(b));
        host.cancel_frame(b);
        assert_eq!(host.pending_frame(), None);
    }

    #[test]
    fn test_unavailable_frames_are_not_recorded() {
        let mut host = HeadlessHost::new();
        host.frames_unavailable = true;
        assert_eq!(host.request_frame(), None);
        assert_eq!(host.pending_frame(), None);
        assert_eq!(host.frames_requested, 0);
    }

    #[test]
    fn test_clock_is_manual() {
        let mut host = HeadlessHost::new();
        assert_eq!(host.now(), 0.0);
        host.advance(16.5);
        assert_eq!(host.now(), 16.5);
        host.set_time(100.0);
        assert_eq!(host.now(), 100.0);
    }
}
