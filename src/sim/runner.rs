//! Game loop and session state machine
//!
//! `Runner` owns every game object plus the host. The host calls
//! [`Runner::on_frame`] for each frame the runner requested, and forwards
//! input, visibility changes and remote controller commands.
//!
//! Session flow: waiting for the first jump, the intro slide, running,
//! crashed, and back to running on restart. Pausing (tab hidden, resize) is
//! orthogonal and only stops the frame loop.

use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::SimRng;
use super::collision::check_for_collision;
use super::distance_meter::{DistanceMeter, actual_distance};
use super::game_over_panel::GameOverPanel;
use super::horizon::Horizon;
use super::trex::{START_X_POS, Trex, TrexStatus};
use crate::audio::SoundEffect;
use crate::consts::{
    DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_REMOTE_JUMP_VELOCITY, MIN_REMOTE_JUMP_VELOCITY,
    MS_PER_FRAME,
};
use crate::platform::{FrameHandle, Host, InputEvent};
use crate::relay::ControllerCommand;
use crate::renderer::Rect;
use crate::settings::RunnerConfig;

const CRASH_VIBRATION_MS: u32 = 200;

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Before the first jump has landed, or while the intro slide plays
    WaitingIntro,
    Running,
    Crashed,
}

/// Serializable summary of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub seed: u64,
    pub phase: SessionPhase,
    pub activated: bool,
    pub paused: bool,
    pub play_count: u32,
    pub current_speed: f64,
    pub running_time: f64,
    pub distance_ran: f64,
    /// Score as shown by the distance meter
    pub distance: u64,
    pub high_score: u64,
    pub jump_count: u32,
    pub obstacles: usize,
    pub trex_x: i32,
    pub trex_y: i32,
}

pub struct Runner<H: Host> {
    host: H,
    config: RunnerConfig,
    seed: u64,
    rng: SimRng,
    width: i32,
    height: i32,

    trex: Trex,
    horizon: Horizon,
    distance_meter: DistanceMeter,
    game_over_panel: GameOverPanel,

    started: bool,
    activated: bool,
    crashed: bool,
    paused: bool,
    playing_intro: bool,
    /// Visibility changes are honoured once the intro has finished
    visibility_tracking: bool,
    play_count: u32,
    current_speed: f64,
    running_time: f64,
    distance_ran: f64,
    highest_score: f64,
    /// Timestamp of the last tick; after a crash, the restart cool-down reference
    time: Option<f64>,
    pending_frame: Option<FrameHandle>,
}

impl<H: Host> Runner<H> {
    /// Create a runner on a surface of the default size and start its frame loop
    pub fn new(host: H, config: RunnerConfig, seed: u64) -> Self {
        Self::with_dimensions(host, config, seed, DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    pub fn with_dimensions(
        host: H,
        config: RunnerConfig,
        seed: u64,
        width: i32,
        height: i32,
    ) -> Self {
        let config = config.sanitized();
        let mut rng = SimRng::seed_from_u64(seed);
        let horizon = Horizon::new(
            width,
            height,
            config.gap_coefficient,
            config.cloud_frequency,
            config.max_clouds,
            &mut rng,
        );
        let trex = Trex::new(height, &mut rng);

        let mut runner = Self {
            host,
            current_speed: config.speed,
            config,
            seed,
            rng,
            width,
            height,
            trex,
            horizon,
            distance_meter: DistanceMeter::new(width),
            game_over_panel: GameOverPanel::new(width, height),
            started: false,
            activated: false,
            crashed: false,
            paused: false,
            playing_intro: false,
            visibility_tracking: false,
            play_count: 0,
            running_time: 0.0,
            distance_ran: 0.0,
            highest_score: 0.0,
            time: None,
            pending_frame: None,
        };
        runner.set_speed(None);
        log::info!("Runner ready ({}x{}, seed {})", width, height, seed);
        runner.tick();
        runner
    }

    // === Accessors ===

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn trex(&self) -> &Trex {
        &self.trex
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn distance_meter(&self) -> &DistanceMeter {
        &self.distance_meter
    }

    pub fn current_speed(&self) -> f64 {
        self.current_speed
    }

    pub fn distance_ran(&self) -> f64 {
        self.distance_ran
    }

    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_crashed(&self) -> bool {
        self.crashed
    }

    /// The frame loop has a request outstanding
    pub fn is_running(&self) -> bool {
        self.pending_frame.is_some()
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending_frame
    }

    pub fn phase(&self) -> SessionPhase {
        if self.crashed {
            SessionPhase::Crashed
        } else if self.started && !self.playing_intro {
            SessionPhase::Running
        } else {
            SessionPhase::WaitingIntro
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            seed: self.seed,
            phase: self.phase(),
            activated: self.activated,
            paused: self.paused,
            play_count: self.play_count,
            current_speed: self.current_speed,
            running_time: self.running_time,
            distance_ran: self.distance_ran,
            distance: actual_distance(self.distance_ran.ceil()),
            high_score: actual_distance(self.highest_score),
            jump_count: self.trex.jump_count,
            obstacles: self.horizon.obstacles.len(),
            trex_x: self.trex.pos.x,
            trex_y: self.trex.pos.y,
        }
    }

    // === Frame loop ===

    /// Frame callback from the host. Frames other than the pending one are ignored.
    pub fn on_frame(&mut self, handle: FrameHandle) {
        if self.pending_frame != Some(handle) {
            log::debug!("Ignoring stale frame {:?}", handle);
            return;
        }
        self.pending_frame = None;
        self.tick();
    }

    fn schedule_frame(&mut self) {
        if self.pending_frame.is_none() {
            self.pending_frame = self.host.request_frame();
        }
    }

    fn tick(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.host.cancel_frame(handle);
        }

        let now = self.host.now();
        let mut delta_time = (now - self.time.unwrap_or(now)).max(0.0);
        self.time = Some(now);

        if self.activated {
            if self.trex.jumping {
                self.trex
                    .update_jump(delta_time, self.config.gravity, &mut self.rng);
            }

            self.running_time += delta_time;
            let has_obstacles = self.running_time > self.config.clear_time;

            // First jump has landed
            if self.trex.jump_count == 1 && !self.playing_intro {
                self.play_intro();
            }

            if self.playing_intro {
                self.horizon
                    .update(0.0, self.current_speed, has_obstacles, &mut self.rng);
            } else {
                if !self.started {
                    delta_time = 0.0;
                }
                self.horizon
                    .update(delta_time, self.current_speed, has_obstacles, &mut self.rng);
            }

            // Distance and speed only build up once there is something to clear
            if has_obstacles && let Some(obstacle) = self.horizon.obstacles.first() {
                if check_for_collision(obstacle, &self.trex) {
                    self.game_over();
                } else {
                    self.distance_ran += self.current_speed * delta_time / MS_PER_FRAME;
                    if self.current_speed < self.config.max_speed {
                        self.current_speed += self.config.acceleration;
                    }
                }
            }

            self.distance_ran = self.distance_meter.wrap(self.distance_ran);
            if self
                .distance_meter
                .update(delta_time, self.distance_ran.ceil())
            {
                self.host.play_sound(SoundEffect::Score);
            }
        }

        if !self.crashed {
            self.trex.update(delta_time, None, &mut self.rng);
            if self.playing_intro && self.trex.pos.x >= START_X_POS {
                self.start_game();
            }
            self.schedule_frame();
        }

        self.render();
    }

    fn render(&mut self) {
        self.host
            .clear(Rect::from_pixels(0, 0, self.width, self.height));
        self.horizon.draw(&mut self.host);
        self.distance_meter.draw(&mut self.host);
        self.trex.draw(&mut self.host);
        if self.crashed {
            self.game_over_panel.draw(&mut self.host);
        }
    }

    // === Session transitions ===

    fn play_intro(&mut self) {
        if !self.started && !self.crashed {
            self.playing_intro = true;
            self.trex.playing_intro = true;
            self.activated = true;
            self.started = true;
            log::info!("Intro started");
        }
    }

    fn start_game(&mut self) {
        self.running_time = 0.0;
        self.playing_intro = false;
        self.trex.playing_intro = false;
        self.play_count += 1;
        self.visibility_tracking = true;
        log::info!("Run {} started", self.play_count);
    }

    fn game_over(&mut self) {
        self.host.play_sound(SoundEffect::Hit);
        self.host.vibrate(CRASH_VIBRATION_MS);
        self.stop();
        self.crashed = true;
        self.distance_meter.stop_flashing();
        self.trex
            .update(100.0, Some(TrexStatus::Crashed), &mut self.rng);

        if self.distance_ran > self.highest_score {
            self.highest_score = self.distance_ran.ceil();
            self.distance_meter.set_high_score(self.highest_score);
        }
        self.time = Some(self.host.now());

        log::info!(
            "Game over: distance {}, high score {}",
            actual_distance(self.distance_ran.ceil()),
            actual_distance(self.highest_score)
        );
    }

    /// Halt the frame loop
    pub fn stop(&mut self) {
        self.activated = false;
        self.paused = true;
        if let Some(handle) = self.pending_frame.take() {
            self.host.cancel_frame(handle);
        }
    }

    /// Resume after a stop. No-op once crashed.
    pub fn play(&mut self) {
        if self.crashed {
            return;
        }
        self.activated = true;
        self.paused = false;
        // Mid-air the jump keeps its own animation timing
        if !self.trex.jumping {
            self.trex
                .update(0.0, Some(TrexStatus::Running), &mut self.rng);
        }
        self.time = Some(self.host.now());
        self.tick();
    }

    /// Start a fresh run, keeping the high score. Ignored while a frame is pending.
    pub fn restart(&mut self) {
        if self.pending_frame.is_some() {
            return;
        }
        self.play_count += 1;
        self.running_time = 0.0;
        self.activated = true;
        self.crashed = false;
        self.paused = false;
        self.distance_ran = 0.0;
        self.set_speed(Some(self.config.speed));
        self.time = Some(self.host.now());
        self.distance_meter.reset(self.highest_score);
        self.horizon.reset();
        self.trex.reset(&mut self.rng);
        self.host.play_sound(SoundEffect::ButtonPress);
        log::info!("Restarted (run {})", self.play_count);
        self.tick();
    }

    /// Apply `opt_speed` (or re-apply the current speed), scaled down on narrow surfaces
    pub fn set_speed(&mut self, opt_speed: Option<f64>) {
        let speed = opt_speed.unwrap_or(self.current_speed);
        if self.width < DEFAULT_WIDTH {
            let mobile_speed = speed * self.width as f64 / DEFAULT_WIDTH as f64
                * self.config.mobile_speed_coefficient;
            self.current_speed = mobile_speed.min(speed);
        } else if let Some(speed) = opt_speed {
            self.current_speed = speed;
        }
    }

    // === Input ===

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::JumpPressed { touch } => self.on_jump_pressed(touch),
            InputEvent::JumpReleased => self.on_jump_released(),
            InputEvent::DuckPressed => {
                if self.trex.jumping {
                    self.trex.set_speed_drop();
                }
            }
            InputEvent::DuckReleased => self.trex.speed_drop = false,
            InputEvent::RestartPressed => {
                if self.crashed {
                    self.restart();
                }
            }
            InputEvent::Resize { width, height } => self.resize(width, height),
        }
    }

    fn on_jump_pressed(&mut self, touch: bool) {
        if self.crashed {
            if touch {
                self.restart();
            }
            return;
        }
        self.jump(self.config.initial_jump_velocity);
    }

    fn on_jump_released(&mut self) {
        if self.is_running() {
            self.trex.end_jump();
        } else if self.crashed {
            let now = self.host.now();
            let since_crash = now - self.time.unwrap_or(now);
            if since_crash >= self.config.gameover_clear_time {
                self.restart();
            }
        } else if self.paused {
            self.play();
        }
    }

    fn jump(&mut self, velocity: f64) {
        if !self.activated {
            self.activated = true;
            log::info!("Session activated");
        }
        if !self.trex.jumping {
            self.host.play_sound(SoundEffect::ButtonPress);
            self.trex.start_jump(velocity, &mut self.rng);
        }
    }

    /// Apply a command from the remote controller
    pub fn remote_command(&mut self, command: ControllerCommand) {
        log::debug!("Remote command: {:?}", command);
        match command {
            ControllerCommand::Start => {
                if self.crashed {
                    self.restart();
                } else if self.paused {
                    self.play();
                } else if !self.activated {
                    self.on_jump_pressed(false);
                }
            }
            ControllerCommand::Jump { velocity } => {
                if self.crashed {
                    return;
                }
                let velocity = match velocity {
                    Some(v) if v.is_finite() => {
                        v.clamp(MIN_REMOTE_JUMP_VELOCITY, MAX_REMOTE_JUMP_VELOCITY)
                    }
                    _ => self.config.initial_jump_velocity,
                };
                if self.paused {
                    self.play();
                }
                self.jump(velocity);
            }
        }
    }

    /// Page visibility changed. Ignored until the first run has started.
    pub fn visibility_changed(&mut self, visible: bool) {
        if !self.visibility_tracking {
            return;
        }
        if visible {
            log::info!("Resumed (visible)");
            self.play();
        } else {
            log::info!("Paused (hidden)");
            self.stop();
        }
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        let width = width.max(1);
        let height = height.max(1);
        log::debug!("Resize to {}x{}", width, height);

        self.width = width;
        self.height = height;
        self.distance_meter.calc_x_pos(width);
        self.horizon.resize(width, height);
        self.trex.set_surface_height(height);
        self.game_over_panel.update_dimensions(width, Some(height));
        self.set_speed(None);

        if self.activated || self.crashed {
            self.distance_meter.update(0.0, self.distance_ran.ceil());
            self.stop();
        }
        self.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessHost;
    use crate::renderer::Sprite;

    type TestRunner = Runner<HeadlessHost>;

    fn runner_with(config: RunnerConfig, seed: u64) -> TestRunner {
        Runner::new(HeadlessHost::new(), config, seed)
    }

    fn runner() -> TestRunner {
        runner_with(RunnerConfig::default(), 7)
    }

    /// Advance one reference frame and deliver it if one was requested
    fn step(runner: &mut TestRunner) {
        runner.host_mut().advance(MS_PER_FRAME);
        if let Some(handle) = runner.host_mut().take_frame() {
            runner.on_frame(handle);
        }
    }

    fn press_and_release(runner: &mut TestRunner) {
        runner.handle_input(InputEvent::JumpPressed { touch: false });
        runner.handle_input(InputEvent::JumpReleased);
    }

    /// First jump plus intro, until the run proper begins
    fn start_session(runner: &mut TestRunner) {
        press_and_release(runner);
        for _ in 0..300 {
            if runner.phase() == SessionPhase::Running {
                return;
            }
            step(runner);
        }
        panic!("intro never finished");
    }

    fn run_until_crash(runner: &mut TestRunner) {
        for _ in 0..3000 {
            if runner.is_crashed() {
                return;
            }
            step(runner);
        }
        panic!("never crashed");
    }

    #[test]
    fn test_waiting_runner_loops_and_draws() {
        let mut r = runner();
        assert_eq!(r.phase(), SessionPhase::WaitingIntro);
        assert!(!r.is_activated());
        assert!(r.is_running());
        step(&mut r);
        assert!(r.is_running());
        assert!(r.host().renderer.has_drawn(Sprite::Trex));
        assert!(r.host().renderer.has_drawn(Sprite::Horizon));
        assert!(!r.host().renderer.has_drawn(Sprite::Restart));
        assert!(r.host().sounds.is_empty());
    }

    #[test]
    fn test_first_jump_activates_and_intro_runs() {
        let mut r = runner();
        r.handle_input(InputEvent::JumpPressed { touch: false });
        assert!(r.is_activated());
        assert!(r.trex().jumping);
        assert_eq!(r.host().count_sounds(SoundEffect::ButtonPress), 1);

        // World stays still until the first jump lands
        step(&mut r);
        assert_eq!(r.distance_ran(), 0.0);

        start_session(&mut r);
        assert_eq!(r.play_count(), 1);
        assert_eq!(r.trex().pos.x, START_X_POS);
        assert_eq!(r.trex().jump_count, 1);
        assert_eq!(r.distance_ran(), 0.0);
    }

    #[test]
    fn test_grace_period_has_no_obstacles() {
        let mut r = runner();
        start_session(&mut r);
        // Just under the 3s grace period
        for _ in 0..170 {
            step(&mut r);
        }
        assert!(r.horizon().obstacles.is_empty());
        assert_eq!(r.distance_ran(), 0.0);
        assert_eq!(r.current_speed(), r.config().speed);
        for _ in 0..20 {
            step(&mut r);
        }
        assert!(!r.horizon().obstacles.is_empty());
        assert!(r.distance_ran() > 0.0);
    }

    #[test]
    fn test_speed_accelerates_up_to_max() {
        let mut r = runner();
        start_session(&mut r);
        for _ in 0..190 {
            step(&mut r);
        }
        assert!(!r.is_crashed());
        assert!(r.current_speed() > r.config().speed);

        let config = RunnerConfig {
            speed: 11.999,
            ..Default::default()
        };
        let mut r = runner_with(config, 7);
        start_session(&mut r);
        for _ in 0..400 {
            if r.is_crashed() {
                break;
            }
            step(&mut r);
        }
        assert!(r.current_speed() > 11.999);
        assert!(r.current_speed() < 12.0 + 0.001 + 1e-9);
    }

    #[test]
    fn test_collision_ends_run() {
        let mut r = runner();
        start_session(&mut r);
        run_until_crash(&mut r);

        assert_eq!(r.phase(), SessionPhase::Crashed);
        assert!(!r.is_activated());
        assert!(r.is_paused());
        assert!(!r.is_running());
        assert_eq!(r.host().pending_frame(), None);
        assert_eq!(r.host().count_sounds(SoundEffect::Hit), 1);
        assert_eq!(r.host().vibrations, vec![200]);
        assert_eq!(r.trex().status, TrexStatus::Crashed);
        assert!(r.host().renderer.has_drawn(Sprite::Restart));

        let snapshot = r.snapshot();
        assert!(snapshot.high_score > 0);
        assert_eq!(snapshot.high_score, snapshot.distance);
    }

    #[test]
    fn test_restart_waits_for_cool_down() {
        let mut r = runner();
        start_session(&mut r);
        run_until_crash(&mut r);
        let high_score = r.snapshot().high_score;

        r.handle_input(InputEvent::JumpReleased);
        assert!(r.is_crashed());

        r.host_mut().advance(750.0);
        r.handle_input(InputEvent::JumpReleased);
        assert!(!r.is_crashed());
        assert_eq!(r.phase(), SessionPhase::Running);
        assert_eq!(r.play_count(), 2);
        assert_eq!(r.distance_ran(), 0.0);
        assert!(r.horizon().obstacles.is_empty());
        assert!(r.is_running());
        assert_eq!(r.snapshot().high_score, high_score);
    }

    #[test]
    fn test_restart_key_and_touch_skip_cool_down() {
        let mut r = runner();
        start_session(&mut r);
        run_until_crash(&mut r);
        r.handle_input(InputEvent::RestartPressed);
        assert!(!r.is_crashed());

        run_until_crash(&mut r);
        r.handle_input(InputEvent::JumpPressed { touch: false });
        assert!(r.is_crashed());
        r.handle_input(InputEvent::JumpPressed { touch: true });
        assert!(!r.is_crashed());
        assert_eq!(r.play_count(), 3);
    }

    #[test]
    fn test_stale_frames_are_ignored() {
        let mut r = runner();
        let live = r.pending_frame().unwrap();
        r.host_mut().advance(500.0);
        r.on_frame(FrameHandle(live.0 + 100));
        assert_eq!(r.pending_frame(), Some(live));
        assert_eq!(r.host().pending_frame(), Some(live));
    }

    #[test]
    fn test_single_pending_frame() {
        let mut r = runner();
        start_session(&mut r);
        r.play();
        r.play();
        assert_eq!(r.pending_frame(), r.host().pending_frame());
        r.stop();
        assert_eq!(r.pending_frame(), None);
        assert_eq!(r.host().pending_frame(), None);
    }

    #[test]
    fn test_visibility_only_after_intro() {
        let mut r = runner();
        r.visibility_changed(false);
        assert!(r.is_running());
        assert!(!r.is_paused());

        start_session(&mut r);
        r.visibility_changed(false);
        assert!(!r.is_running());
        assert!(r.is_paused());
        r.visibility_changed(true);
        assert!(r.is_running());
        assert!(!r.is_paused());
    }

    #[test]
    fn test_release_resumes_after_pause() {
        let mut r = runner();
        start_session(&mut r);
        r.stop();
        r.handle_input(InputEvent::JumpReleased);
        assert!(r.is_running());
        assert!(r.is_activated());
    }

    #[test]
    fn test_resize_scales_speed_and_pauses_active_run() {
        let mut r = runner();
        r.handle_input(InputEvent::Resize {
            width: 300,
            height: 150,
        });
        assert!((r.current_speed() - 3.6).abs() < 1e-9);
        // Waiting runners keep looping
        assert!(r.is_running());

        start_session(&mut r);
        r.handle_input(InputEvent::Resize {
            width: 600,
            height: 150,
        });
        assert!(r.is_paused());
        assert!(!r.is_running());
        assert_eq!(r.distance_meter().x, 600 - 66);
    }

    #[test]
    fn test_duck_mid_air_drops_fast() {
        let mut r = runner();
        start_session(&mut r);
        r.handle_input(InputEvent::JumpPressed { touch: false });
        step(&mut r);
        r.handle_input(InputEvent::DuckPressed);
        assert!(r.trex().speed_drop);
        r.handle_input(InputEvent::DuckReleased);
        assert!(!r.trex().speed_drop);
    }

    #[test]
    fn test_remote_jump_velocity_is_clamped() {
        let mut r = runner();
        r.remote_command(ControllerCommand::Jump {
            velocity: Some(40.0),
        });
        assert!(r.is_activated());
        assert_eq!(r.trex().jump_velocity, -MAX_REMOTE_JUMP_VELOCITY);

        let mut r = runner();
        r.remote_command(ControllerCommand::Jump {
            velocity: Some(1.0),
        });
        assert_eq!(r.trex().jump_velocity, -MIN_REMOTE_JUMP_VELOCITY);

        let mut r = runner();
        r.remote_command(ControllerCommand::Jump { velocity: None });
        assert_eq!(r.trex().jump_velocity, -r.config().initial_jump_velocity);
    }

    #[test]
    fn test_remote_start_begins_and_restarts() {
        let mut r = runner();
        r.remote_command(ControllerCommand::Start);
        assert!(r.is_activated());
        assert!(r.trex().jumping);

        start_session(&mut r);
        run_until_crash(&mut r);
        r.remote_command(ControllerCommand::Start);
        assert!(!r.is_crashed());
        assert_eq!(r.play_count(), 2);
    }

    #[test]
    fn test_milestone_plays_score_sound() {
        let mut r = runner_with(RunnerConfig::default(), 11);
        start_session(&mut r);
        // Shows 98, a few frames of obstacles away from 100
        r.distance_ran = 3900.0;
        for _ in 0..400 {
            if r.is_crashed() {
                break;
            }
            step(&mut r);
        }
        assert!(r.snapshot().distance >= 100);
        assert_eq!(r.host().count_sounds(SoundEffect::Score), 1);
    }

    /// Advance by `dt` milliseconds and deliver the pending frame
    fn step_by(runner: &mut TestRunner, dt: f64) {
        runner.host_mut().advance(dt);
        if let Some(handle) = runner.host_mut().take_frame() {
            runner.on_frame(handle);
        }
    }

    fn start_session_at(config: RunnerConfig, dt: f64) -> TestRunner {
        let mut r = runner_with(config, 5);
        press_and_release(&mut r);
        for _ in 0..300 {
            if r.phase() == SessionPhase::Running {
                return r;
            }
            step_by(&mut r, dt);
        }
        panic!("intro never finished");
    }

    #[test]
    fn test_distance_independent_of_frame_rate() {
        let config = RunnerConfig {
            clear_time: 0.0,
            acceleration: 0.0,
            ..Default::default()
        };
        let ran_for_one_second = |fps: u32| {
            let dt = 1000.0 / fps as f64;
            let mut r = start_session_at(config.clone(), dt);
            // Make sure the first obstacle is out before measuring
            step_by(&mut r, dt);
            assert!(!r.horizon().obstacles.is_empty());
            let start = r.distance_ran();
            for _ in 0..fps {
                step_by(&mut r, dt);
            }
            assert!(!r.is_crashed());
            r.distance_ran() - start
        };
        let at_60 = ran_for_one_second(60);
        let at_30 = ran_for_one_second(30);
        assert!((at_60 - 360.0).abs() < 1e-6, "60Hz ran {}", at_60);
        assert!((at_30 - 360.0).abs() < 1e-6, "30Hz ran {}", at_30);
        assert!((at_60 - at_30).abs() < 1e-6);
    }

    #[test]
    fn test_jump_landing_independent_of_frame_rate() {
        let config = RunnerConfig {
            clear_time: 60_000.0,
            ..Default::default()
        };
        let airtime = |fps: u32| {
            let dt = 1000.0 / fps as f64;
            let mut r = start_session_at(config.clone(), dt);
            r.handle_input(InputEvent::JumpPressed { touch: false });
            assert!(r.trex().jumping);
            let took_off = r.host().now();
            for _ in 0..fps * 2 {
                step_by(&mut r, dt);
                if !r.trex().jumping {
                    return r.host().now() - took_off;
                }
            }
            panic!("never landed at {}Hz", fps);
        };
        let at_60 = airtime(60);
        let at_30 = airtime(30);
        // Landing is only observed on frame boundaries
        assert!(
            (at_60 - at_30).abs() <= 1000.0 / 30.0 + 1e-6,
            "60Hz {} vs 30Hz {}",
            at_60,
            at_30
        );
    }

    #[test]
    fn test_no_frame_scheduled_when_host_refuses() {
        let mut host = HeadlessHost::new();
        host.frames_unavailable = true;
        let mut r = Runner::new(host, RunnerConfig::default(), 7);
        assert_eq!(r.pending_frame(), None);
        assert!(!r.is_running());

        r.host_mut().frames_unavailable = false;
        r.play();
        assert!(r.pending_frame().is_some());
        assert_eq!(r.pending_frame(), r.host().pending_frame());
    }

    #[test]
    fn test_same_seed_same_session() {
        let play = |seed| {
            let mut r = runner_with(RunnerConfig::default(), seed);
            start_session(&mut r);
            for i in 0..400 {
                if i % 45 == 0 {
                    press_and_release(&mut r);
                }
                step(&mut r);
            }
            serde_json::to_string(&r.snapshot()).unwrap()
        };
        assert_eq!(play(99), play(99));
    }
}
