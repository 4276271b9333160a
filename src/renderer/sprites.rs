//! Sprite sheet identifiers

use serde::{Deserialize, Serialize};

/// Every image the runner draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sprite {
    CactusLarge,
    CactusSmall,
    Cloud,
    Horizon,
    Restart,
    Text,
    Trex,
}

impl Sprite {
    pub const ALL: [Sprite; 7] = [
        Sprite::CactusLarge,
        Sprite::CactusSmall,
        Sprite::Cloud,
        Sprite::Horizon,
        Sprite::Restart,
        Sprite::Text,
        Sprite::Trex,
    ];

    /// DOM id of the `<img>` element holding this sheet
    pub fn element_id(&self, hidpi: bool) -> &'static str {
        match (self, hidpi) {
            (Sprite::CactusLarge, false) => "1x-obstacle-large",
            (Sprite::CactusSmall, false) => "1x-obstacle-small",
            (Sprite::Cloud, false) => "1x-cloud",
            (Sprite::Horizon, false) => "1x-horizon",
            (Sprite::Restart, false) => "1x-restart",
            (Sprite::Text, false) => "1x-text",
            (Sprite::Trex, false) => "1x-trex",
            (Sprite::CactusLarge, true) => "2x-obstacle-large",
            (Sprite::CactusSmall, true) => "2x-obstacle-small",
            (Sprite::Cloud, true) => "2x-cloud",
            (Sprite::Horizon, true) => "2x-horizon",
            (Sprite::Restart, true) => "2x-restart",
            (Sprite::Text, true) => "2x-text",
            (Sprite::Trex, true) => "2x-trex",
        }
    }
}
