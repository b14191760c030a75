#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative puzzle state for Ghost Trail.
//!
//! Levels arrive as compact base-32 strings that decode into a [`Tilemap`].
//! A [`PuzzleState`] splits the tilemap into a static bottom layer and a
//! dynamic top layer and answers the solidity questions the movement system
//! asks. The state is plain data: cloning it produces an independent
//! snapshot, which is what the undo history stores.

mod levels;
mod state;
mod tilemap;

use thiserror::Error;

pub use levels::{level_data, load_level, LEVEL_DATA};
pub use state::{Cell, PuzzleState};
pub use tilemap::Tilemap;

/// Errors raised while decoding or looking up level data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    /// The packed string does not describe a well-formed grid.
    #[error("level data is malformed: {0}")]
    MalformedLevelData(String),
    /// A character is not a base-32 digit.
    #[error("invalid tile digit {digit:?} at offset {offset}")]
    InvalidTileDigit {
        /// Offending character.
        digit: char,
        /// Character offset within the packed string.
        offset: usize,
    },
    /// The one-based level index is outside the catalogue.
    #[error("unknown level {0}")]
    UnknownLevel(usize),
}

/// Read-only helpers over a puzzle state.
pub mod query {
    use ghost_trail_core::{tile, CellCoord, Layer};

    use crate::PuzzleState;

    /// Cell holding the player, if any.
    #[must_use]
    pub fn player_cell(state: &PuzzleState) -> Option<CellCoord> {
        let mut found = None;
        state.iterate(|_, top, x, y| {
            if found.is_none() && top == tile::PLAYER {
                found = Some(CellCoord::new(x, y));
            }
        });
        found
    }

    /// Number of coins still lying on the bottom layer.
    #[must_use]
    pub fn coins_remaining(state: &PuzzleState) -> usize {
        state.count(Layer::Bottom, tile::COIN)
    }
}
