//! Runner simulation module
//!
//! All gameplay logic lives here. Everything is driven by the host clock and
//! the session's seeded RNG:
//! - Timestep-proportional physics (`delta / ms_per_frame`)
//! - One seeded RNG per session, passed down explicitly
//! - Ordered entity lists (oldest first)
//! - No platform dependencies; drawing goes through the `Renderer` sink

pub mod cloud;
pub mod collision;
pub mod distance_meter;
pub mod game_over_panel;
pub mod horizon;
pub mod horizon_line;
pub mod obstacle;
pub mod runner;
pub mod trex;

/// Session RNG. Seeded once per `Runner` so sessions replay exactly.
pub type SimRng = rand_pcg::Pcg32;

pub use cloud::Cloud;
pub use collision::{
    Collidable, CollisionBox, check_collision, check_for_collision, intersects, offset,
};
pub use distance_meter::DistanceMeter;
pub use game_over_panel::GameOverPanel;
pub use horizon::Horizon;
pub use horizon_line::HorizonLine;
pub use obstacle::{Obstacle, ObstacleField, ObstacleKind};
pub use runner::{Runner, SessionPhase, SessionSnapshot};
pub use trex::{Trex, TrexStatus};
