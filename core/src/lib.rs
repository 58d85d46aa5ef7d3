#![no_std]

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::ops::Index;
use core::time::Duration;

use hashbrown::HashMap;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub use engine::*;
pub use error::*;
pub use tile::*;
pub use types::*;

mod engine;
mod error;
pub mod layout;
mod tile;
mod types;

/// Hold durations the engine attaches to the transitions it emits: 300 ms
/// for slides and settles, a 400 ms dwell on a hole or portal before its
/// effect fires.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    pub slide: Duration,
    pub effect_pause: Duration,
    pub settle: Duration,
}

impl Timings {
    pub const DEFAULT: Self = Self {
        slide: Duration::from_millis(300),
        effect_pause: Duration::from_millis(400),
        settle: Duration::from_millis(300),
    };
}

impl Default for Timings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Immutable rink geometry plus the lookups derived from it at construction:
/// spawn cells in player order and the portal-partner map. Built from a
/// tile-code table (see [`layout`]), never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    grid: Array2<Tile>,
    spawns: SmallVec<[Coord2; 2]>,
    #[serde(with = "portal_pairs")]
    portals: HashMap<Coord2, Coord2>,
}

impl Board {
    /// Rows must already be rectangular and fit in `Coord`; portal pairing
    /// is validated here.
    pub(crate) fn from_tile_rows(
        rows: Vec<Vec<Tile>>,
        spawns: SmallVec<[Coord2; 2]>,
    ) -> Result<Self> {
        let shape = (rows.len(), rows.first().map(Vec::len).unwrap_or(0));
        let flat: Vec<Tile> = rows.into_iter().flatten().collect();
        let grid = Array2::from_shape_vec(shape, flat).expect("rows should be rectangular");

        let size = (shape.0.try_into().unwrap(), shape.1.try_into().unwrap());
        let portals = pair_portals(&grid, size)?;

        Ok(Self {
            grid,
            spawns,
            portals,
        })
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.grid.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds { coords, size })
        }
    }

    pub fn in_bounds(&self, coords: Coord2) -> bool {
        self.validate_coords(coords).is_ok()
    }

    pub fn tile_at(&self, coords: Coord2) -> Result<Tile> {
        Ok(self[self.validate_coords(coords)?])
    }

    /// True when `coords` is off the grid or holds a wall. Off-board counts
    /// as wall so sliding needs only one stopping test.
    pub fn is_wall(&self, coords: Coord2) -> bool {
        !self.in_bounds(coords) || self[coords].is_wall()
    }

    /// The cell one step in `direction`, or `None` when the step leaves the
    /// grid; a `None` stops a slide exactly like a wall.
    pub fn neighbor(&self, coords: Coord2, direction: Direction) -> Option<Coord2> {
        apply_delta(coords, direction.delta(), self.size())
    }

    pub fn portal_partner(&self, coords: Coord2) -> Option<Coord2> {
        self.portals.get(&coords).copied()
    }

    /// Spawn cells in player order.
    pub fn spawns(&self) -> &[Coord2] {
        &self.spawns
    }
}

impl Index<Coord2> for Board {
    type Output = Tile;

    fn index(&self, (r, c): Coord2) -> &Self::Output {
        &self.grid[(r as usize, c as usize)]
    }
}

// JSON map keys must be strings, so the portal map crosses serde as a
// sorted list of coordinate pairs.
mod portal_pairs {
    use core::result::Result;

    use serde::{Deserializer, Serializer};

    use super::*;

    pub fn serialize<S: Serializer>(
        portals: &HashMap<Coord2, Coord2>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut pairs: Vec<(Coord2, Coord2)> =
            portals.iter().map(|(&from, &to)| (from, to)).collect();
        pairs.sort_unstable();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<Coord2, Coord2>, D::Error> {
        let pairs = Vec::<(Coord2, Coord2)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

fn pair_portals(grid: &Array2<Tile>, size: Coord2) -> Result<HashMap<Coord2, Coord2>> {
    let mut entrances: BTreeMap<PortalId, SmallVec<[Coord2; 2]>> = BTreeMap::new();

    let (rows, cols) = size;
    for r in 0..rows {
        for c in 0..cols {
            if let Tile::Portal(id) = grid[(r, c).to_nd_index()] {
                entrances.entry(id).or_default().push((r, c));
            }
        }
    }

    let mut portals = HashMap::new();
    for (id, cells) in entrances {
        let [a, b] = cells[..] else {
            return Err(GameError::UnpairedPortal {
                id,
                count: cells.len(),
            });
        };
        portals.insert(a, b);
        portals.insert(b, a);
    }

    Ok(portals)
}
