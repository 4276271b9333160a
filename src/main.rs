//! Rex Runner entry point
//!
//! In the browser this wires the runner to the page. Natively it plays a
//! headless session with a simple autopilot and prints the final snapshot:
//! ```sh
//! cargo run -- [seed] [frames]
//! ```

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    log::info!("Rex runner starting...");
    let config = rex_runner::RunnerConfig::load();
    rex_runner::platform::web::run(config)
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let frames = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(autopilot::DEFAULT_FRAMES);

    let config = rex_runner::RunnerConfig::load();
    let snapshot = autopilot::play(config, seed, frames);

    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to encode snapshot: {}", e),
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use rex_runner::consts::MS_PER_FRAME;
    use rex_runner::platform::{HeadlessHost, InputEvent};
    use rex_runner::sim::{SessionPhase, SessionSnapshot, trex};
    use rex_runner::{Runner, RunnerConfig};

    /// One minute at the reference frame rate
    pub const DEFAULT_FRAMES: u32 = 60 * 60;

    /// Frames of travel ahead of the character at which to take off
    const TAKE_OFF_FRAMES: f64 = 12.0;

    fn obstacle_close(runner: &Runner<HeadlessHost>) -> bool {
        let trex = runner.trex();
        let Some(obstacle) = runner.horizon().obstacles.first() else {
            return false;
        };
        let gap = obstacle.pos.x - (trex.pos.x + trex::WIDTH);
        gap > 0 && (gap as f64) < runner.current_speed() * TAKE_OFF_FRAMES
    }

    /// Run one session for at most `frames` frames, jumping over whatever comes
    pub fn play(config: RunnerConfig, seed: u64, frames: u32) -> SessionSnapshot {
        let mut runner = Runner::new(HeadlessHost::new(), config, seed);
        runner.handle_input(InputEvent::JumpPressed { touch: false });
        runner.handle_input(InputEvent::JumpReleased);

        let mut played = 0;
        while played < frames && !runner.is_crashed() {
            if runner.phase() == SessionPhase::Running
                && !runner.trex().jumping
                && obstacle_close(&runner)
            {
                runner.handle_input(InputEvent::JumpPressed { touch: false });
            }

            runner.host_mut().advance(MS_PER_FRAME);
            if let Some(handle) = runner.host_mut().take_frame() {
                runner.on_frame(handle);
            }
            played += 1;
        }

        log::info!(
            "Autopilot finished after {} frames ({:?})",
            played,
            runner.phase()
        );
        runner.snapshot()
    }
}
