//! Built-in level catalogue.

use ghost_trail_core::FINAL_LEVEL;

use crate::{LevelError, Tilemap};

/// Packed level strings; index 0 holds level 1 and the last entry is the bonus stage.
pub const LEVEL_DATA: [&str; FINAL_LEVEL] = [
    "95000000000020000000000111000000000070000000000",
    "a40000000000023040007000001000000000100000",
    "95000000000025550000011111100000000070000000000",
    "a500000000000200080000011111111000000070000000000000",
    "86000000000200000000006000000060700000600000000000",
    "a5000000000002009000000111111b1100000000700000000000",
    "a5000000000002ddddd0000000000g000007000g00000ffffg00",
    "b400000000000023300400700000001000000000000000",
    "a50000000000020h000c000111111b1100000000700000000000",
    "a500000000000204444070001111110000000000000080000000",
    "b60000000000002030405070011101110100000000000007000g0080000000000000",
    "c60000000000000200003000400111011110100005000000700d000b009000000000000000",
    "e6000000000000000200000000007001111011101110070000000000000111011101111000000000000070",
];

/// Packed data of the one-based `level`.
pub fn level_data(level: usize) -> Result<&'static str, LevelError> {
    level
        .checked_sub(1)
        .and_then(|index| LEVEL_DATA.get(index))
        .copied()
        .ok_or(LevelError::UnknownLevel(level))
}

/// Decodes the one-based `level` from the catalogue.
pub fn load_level(level: usize) -> Result<Tilemap, LevelError> {
    let tilemap = Tilemap::decode(level_data(level)?)?;
    log::debug!(
        "decoded level {level} ({}x{})",
        tilemap.width(),
        tilemap.height()
    );
    Ok(tilemap)
}
