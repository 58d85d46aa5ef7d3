//! Parsing of tile-code tables into [`Board`]s.
//!
//! A layout is a table of whitespace-separated codes, one row per line:
//! `E` ice, `W` wall, `T` target, `H` hole, `O<id>` portal entrance with
//! a plain decimal id (`O1` style), and `P1`/`P2` the players' spawn
//! cells (read as ice once the position is extracted). Blank lines are
//! skipped so layouts can be written as indented string literals.

use alloc::string::ToString;
use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::*;

pub use classic::*;

mod classic;

/// Largest cell count per side, so every coordinate and the board size
/// itself stay within [`Coord`].
pub const MAX_SIDE: usize = Coord::MAX as usize;

/// Parses a layout text into a [`Board`].
pub fn parse(text: &str) -> Result<Board> {
    from_rows(
        text.lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>())
            .filter(|row| !row.is_empty()),
    )
}

/// Builds a [`Board`] from rows of tile codes, the in-memory form of the
/// table [`parse`] reads from text.
pub fn from_rows<'a, R, C>(rows: R) -> Result<Board>
where
    R: IntoIterator<Item = C>,
    C: IntoIterator<Item = &'a str>,
{
    let rows: Vec<Vec<&str>> = rows
        .into_iter()
        .map(|row| row.into_iter().collect())
        .collect();

    let width = rows.first().map_or(0, Vec::len);
    if width == 0 {
        return Err(GameError::EmptyLayout);
    }
    if rows.len() > MAX_SIDE || width > MAX_SIDE {
        return Err(GameError::OversizedLayout {
            rows: rows.len(),
            cols: width,
        });
    }
    for (r, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(GameError::RaggedRow {
                row: r,
                len: row.len(),
                expected: width,
            });
        }
    }

    let mut tiles: Vec<Vec<Tile>> = Vec::with_capacity(rows.len());
    let mut spawns: [Option<Coord2>; 2] = [None, None];

    for (r, row) in rows.iter().enumerate() {
        let mut decoded = Vec::with_capacity(width);
        for (c, &code) in row.iter().enumerate() {
            // casts cannot wrap, the size check above bounds both axes
            let coords = (r as Coord, c as Coord);
            let tile = match code {
                "E" => Tile::Ice,
                "W" => Tile::Wall,
                "T" => Tile::Target,
                "H" => Tile::Hole,
                "P1" => note_spawn(&mut spawns[0], PlayerId::new(1), coords)?,
                "P2" => note_spawn(&mut spawns[1], PlayerId::new(2), coords)?,
                _ => match portal_id(code) {
                    Some(id) => Tile::Portal(id),
                    None => {
                        return Err(GameError::UnknownCode {
                            code: code.to_string(),
                            row: r,
                            col: c,
                        });
                    }
                },
            };
            decoded.push(tile);
        }
        tiles.push(decoded);
    }

    let mut spawn_cells = SmallVec::new();
    for (index, slot) in spawns.into_iter().enumerate() {
        let Some(coords) = slot else {
            return Err(GameError::MissingSpawn(PlayerId::new(index as u8 + 1)));
        };
        spawn_cells.push(coords);
    }

    Board::from_tile_rows(tiles, spawn_cells)
}

fn note_spawn(slot: &mut Option<Coord2>, id: PlayerId, coords: Coord2) -> Result<Tile> {
    if slot.replace(coords).is_some() {
        return Err(GameError::DuplicateSpawn(id));
    }
    Ok(Tile::Ice)
}

fn portal_id(code: &str) -> Option<PortalId> {
    let digits = code.strip_prefix('O')?;
    // u8::from_str alone would also take "+1" or "01" and alias pair 1
    match digits.as_bytes() {
        [b'0'] => {}
        [b'1'..=b'9', rest @ ..] if rest.iter().all(u8::is_ascii_digit) => {}
        _ => return None,
    }
    digits.parse().ok().map(PortalId::new)
}
