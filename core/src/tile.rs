use serde::{Deserialize, Serialize};

/// Identifies a portal pair; both entrances of the pair carry the same id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortalId(u8);

impl PortalId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl core::fmt::Display for PortalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One cell of the rink as authored in the layout.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Tile {
    Ice,
    Wall,
    Target,
    Hole,
    Portal(PortalId),
}

impl Tile {
    pub const fn is_wall(self) -> bool {
        matches!(self, Self::Wall)
    }

    /// Tiles that catch a slider on the cell itself instead of letting it pass.
    pub const fn catches_slider(self) -> bool {
        matches!(self, Self::Target | Self::Hole | Self::Portal(_))
    }
}
