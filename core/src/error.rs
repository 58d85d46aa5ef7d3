use alloc::string::String;
use thiserror::Error;

use crate::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Layout has no cells")]
    EmptyLayout,
    #[error("Layout is {rows}x{cols}, maximum is 255x255")]
    OversizedLayout { rows: usize, cols: usize },
    #[error("Row {row} has {len} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("Unknown tile code {code:?} at row {row}, column {col}")]
    UnknownCode {
        code: String,
        row: usize,
        col: usize,
    },
    #[error("Missing spawn marker for {0}")]
    MissingSpawn(PlayerId),
    #[error("More than one spawn marker for {0}")]
    DuplicateSpawn(PlayerId),
    #[error("Portal {id} has {count} entrances, expected exactly 2")]
    UnpairedPortal { id: PortalId, count: usize },
    #[error("Coordinates {coords:?} are outside the {size:?} board")]
    OutOfBounds { coords: Coord2, size: Coord2 },
}

pub type Result<T> = core::result::Result<T, GameError>;
