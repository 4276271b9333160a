//! Horizon: everything that scrolls with the world
//!
//! Owns the ground line, the cloud layer and the obstacle field.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::SimRng;
use super::cloud::Cloud;
use super::horizon_line::HorizonLine;
use super::obstacle::ObstacleField;
use crate::renderer::Renderer;

/// Cloud speed relative to the world speed
pub const BG_CLOUD_SPEED: f64 = 0.2;
pub const CLOUD_FREQUENCY: f64 = 0.5;
pub const MAX_CLOUDS: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Horizon {
    pub width: i32,
    pub cloud_frequency: f64,
    pub max_clouds: usize,
    clouds: Vec<Cloud>,
    pub line: HorizonLine,
    pub obstacles: ObstacleField,
}

impl Horizon {
    pub fn new(
        width: i32,
        height: i32,
        gap_coefficient: f64,
        cloud_frequency: f64,
        max_clouds: usize,
        rng: &mut SimRng,
    ) -> Self {
        let mut horizon = Self {
            width,
            cloud_frequency,
            max_clouds,
            clouds: Vec::with_capacity(max_clouds),
            line: HorizonLine::new(height, rng),
            obstacles: ObstacleField::new(width, height, gap_coefficient),
        };
        horizon.add_cloud(rng);
        horizon
    }

    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    fn add_cloud(&mut self, rng: &mut SimRng) {
        self.clouds.push(Cloud::new(self.width, rng));
    }

    /// Advance the scene. Obstacles only move (and spawn) when `spawn_obstacles` is set.
    pub fn update(
        &mut self,
        delta_time: f64,
        current_speed: f64,
        spawn_obstacles: bool,
        rng: &mut SimRng,
    ) {
        self.line.update(delta_time, current_speed, rng);
        self.update_clouds(delta_time, current_speed, rng);
        if spawn_obstacles {
            self.obstacles.update(delta_time, current_speed, rng);
        }
    }

    fn update_clouds(&mut self, delta_time: f64, speed: f64, rng: &mut SimRng) {
        let cloud_speed = BG_CLOUD_SPEED / 1000.0 * delta_time * speed;

        if self.clouds.is_empty() {
            self.add_cloud(rng);
            return;
        }

        for cloud in &mut self.clouds {
            cloud.update(cloud_speed);
        }

        if let Some(last) = self.clouds.last()
            && self.clouds.len() < self.max_clouds
            && self.width - last.x_pos > last.cloud_gap
            && self.cloud_frequency > rng.random::<f64>()
        {
            self.add_cloud(rng);
        }

        self.clouds.retain(|c| !c.remove);
    }

    /// Back to an empty scene for a new run
    pub fn reset(&mut self) {
        self.obstacles.clear();
        self.clouds.clear();
        self.line.reset();
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width;
        self.line.set_surface_height(height);
        self.obstacles.resize(width, height);
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) {
        for cloud in &self.clouds {
            cloud.draw(renderer);
        }
        self.line.draw(renderer);
        self.obstacles.draw(renderer);
    }
}
