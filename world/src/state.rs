//! Two-layer puzzle state and its solidity rules.

use ghost_trail_core::{tile, Direction, Layer};
use serde::{Deserialize, Serialize};

use crate::Tilemap;

/// Contents of a single layer cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Bare tile code.
    pub code: u8,
    /// Facing stamped by the occupant, if any.
    pub direction: Direction,
}

impl Cell {
    /// Creates a cell from a code, masking it into the valid code range.
    #[must_use]
    pub const fn new(code: u8, direction: Direction) -> Self {
        Self {
            code: code & tile::CODE_MASK,
            direction,
        }
    }

    /// Legacy packed encoding `code | direction << 5`.
    #[must_use]
    pub const fn packed(self) -> u8 {
        self.code | (self.direction.bits() << tile::DIRECTION_SHIFT)
    }
}

/// Live puzzle: static bottom layer, dynamic top layer and the turn counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleState {
    width: usize,
    height: usize,
    bottom: Vec<Cell>,
    top: Vec<Cell>,
    turns_left: i32,
}

impl PuzzleState {
    /// Splits a tilemap into the two layers.
    #[must_use]
    pub fn new(tilemap: &Tilemap, turns_left: i32) -> Self {
        let to_cells = |codes: Vec<u8>| {
            codes
                .into_iter()
                .map(|code| Cell::new(code, Direction::None))
                .collect::<Vec<_>>()
        };
        Self {
            width: tilemap.width(),
            height: tilemap.height(),
            bottom: to_cells(tilemap.filter_tiles(tile::is_bottom_layer)),
            top: to_cells(tilemap.filter_tiles(|code| tile::TOP_LAYER.contains(&code))),
            turns_left,
        }
    }

    /// Grid width including the wall margin.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height including the wall margin.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Remaining human turns; zero or less means ghost form.
    #[must_use]
    pub const fn turns_left(&self) -> i32 {
        self.turns_left
    }

    /// Overwrites the turn counter.
    pub fn set_turns_left(&mut self, turns_left: i32) {
        self.turns_left = turns_left;
    }

    /// Bare code at the cell, 0 outside the grid.
    #[must_use]
    pub fn tile(&self, layer: Layer, x: i32, y: i32) -> u8 {
        self.tile_or(layer, x, y, tile::EMPTY)
    }

    /// Bare code at the cell, `default` outside the grid.
    #[must_use]
    pub fn tile_or(&self, layer: Layer, x: i32, y: i32, default: u8) -> u8 {
        self.cell(layer, x, y).map_or(default, |cell| cell.code)
    }

    /// Facing stored at the cell.
    #[must_use]
    pub fn direction(&self, layer: Layer, x: i32, y: i32) -> Direction {
        self.cell(layer, x, y)
            .map_or(Direction::None, |cell| cell.direction)
    }

    /// Packed `code | direction << 5` value at the cell, 0 outside the grid.
    #[must_use]
    pub fn packed(&self, layer: Layer, x: i32, y: i32) -> u8 {
        self.cell(layer, x, y).map_or(0, Cell::packed)
    }

    /// Writes a cell. Out-of-range writes are ignored.
    pub fn set_tile(&mut self, layer: Layer, x: i32, y: i32, code: u8, direction: Direction) {
        if let Some(index) = self.index(x, y) {
            if let Some(slot) = self.layer_mut(layer).get_mut(index) {
                *slot = Cell::new(code, direction);
            }
        }
    }

    /// Whether a mover may not enter the cell.
    ///
    /// `rock_mode` applies to rocks and to the ghost: holes stop blocking,
    /// while slime and unpressed pink buttons start to.
    #[must_use]
    pub fn is_solid(&self, x: i32, y: i32, rock_mode: bool) -> bool {
        let bottom = self.tile(Layer::Bottom, x, y);
        let top = self.tile(Layer::Top, x, y);

        top != tile::EMPTY
            || tile::ALWAYS_SOLID.contains(&bottom)
            || (!rock_mode && bottom == tile::HOLE)
            || (rock_mode && tile::ROCK_SOLID.contains(&bottom))
    }

    /// Visits every cell in raster order with its bottom and top codes.
    pub fn iterate<F>(&self, mut visit: F)
    where
        F: FnMut(u8, u8, i32, i32),
    {
        for (index, (bottom, top)) in self.bottom.iter().zip(&self.top).enumerate() {
            let x = i32::try_from(index % self.width).unwrap_or(i32::MAX);
            let y = i32::try_from(index / self.width).unwrap_or(i32::MAX);
            visit(bottom.code, top.code, x, y);
        }
    }

    /// Copies both layers and the turn counter into `target`, reusing its buffers.
    pub fn clone_to(&self, target: &mut PuzzleState) {
        target.width = self.width;
        target.height = self.height;
        target.bottom.clone_from(&self.bottom);
        target.top.clone_from(&self.top);
        target.turns_left = self.turns_left;
    }

    /// Swaps bottom codes `first` and `second` on every cell with an empty top layer.
    pub fn swap_bottom_layer_tile(&mut self, first: u8, second: u8) {
        for (bottom, top) in self.bottom.iter_mut().zip(&self.top) {
            if top.code != tile::EMPTY {
                continue;
            }
            if bottom.code == first {
                bottom.code = second;
            } else if bottom.code == second {
                bottom.code = first;
            }
        }
    }

    /// Number of cells on `layer` holding `code`.
    #[must_use]
    pub fn count(&self, layer: Layer, code: u8) -> usize {
        self.layer(layer)
            .iter()
            .filter(|cell| cell.code == code)
            .count()
    }

    /// Whether every coin has been collected.
    #[must_use]
    pub fn is_stage_clear(&self) -> bool {
        self.count(Layer::Bottom, tile::COIN) == 0
    }

    fn cell(&self, layer: Layer, x: i32, y: i32) -> Option<Cell> {
        let index = self.index(x, y)?;
        self.layer(layer).get(index).copied()
    }

    fn layer(&self, layer: Layer) -> &[Cell] {
        match layer {
            Layer::Bottom => &self.bottom,
            Layer::Top => &self.top,
        }
    }

    fn layer_mut(&mut self, layer: Layer) -> &mut Vec<Cell> {
        match layer {
            Layer::Bottom => &mut self.bottom,
            Layer::Top => &mut self.top,
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let column = usize::try_from(x).ok()?;
        let row = usize::try_from(y).ok()?;
        if column < self.width && row < self.height {
            Some(row * self.width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(packed: &str) -> PuzzleState {
        PuzzleState::new(&Tilemap::decode(packed).expect("decode"), 13)
    }

    #[test]
    fn layers_split_occupants_from_terrain() {
        let state = state("3223b0470");

        assert_eq!(state.tile(Layer::Top, 1, 1), tile::PLAYER);
        assert_eq!(state.tile(Layer::Bottom, 1, 1), tile::EMPTY);
        assert_eq!(state.tile(Layer::Top, 2, 1), tile::ROCK);
        assert_eq!(state.tile(Layer::Bottom, 3, 1), tile::PINK_BLOCK);
        assert_eq!(state.tile(Layer::Bottom, 2, 2), tile::HOLE);
        assert_eq!(state.tile(Layer::Bottom, 3, 2), tile::COIN);
        assert_eq!(state.tile(Layer::Bottom, 0, 0), tile::WALL);
        assert_eq!(state.tile(Layer::Top, 0, 0), tile::EMPTY);
    }

    #[test]
    fn set_tile_masks_code_and_keeps_direction() {
        let mut state = state("220000");
        state.set_tile(Layer::Top, 1, 1, tile::PLAYER | 0b1110_0000, Direction::Left);

        assert_eq!(state.tile(Layer::Top, 1, 1), tile::PLAYER);
        assert_eq!(state.direction(Layer::Top, 1, 1), Direction::Left);
        assert_eq!(
            state.packed(Layer::Top, 1, 1),
            tile::PLAYER | (Direction::Left.bits() << 5)
        );
        assert_eq!(state.packed(Layer::Top, 1, 1) & 31, tile::PLAYER);
    }

    #[test]
    fn out_of_range_access_is_harmless() {
        let mut state = state("110");
        let before = state.clone();

        state.set_tile(Layer::Bottom, -1, 0, tile::COIN, Direction::None);
        state.set_tile(Layer::Top, 3, 3, tile::ROCK, Direction::None);

        assert_eq!(state, before);
        assert_eq!(state.tile_or(Layer::Bottom, -1, -1, 7), 7);
    }

    #[test]
    fn solidity_depends_on_rock_mode() {
        let state = state("51469b0");
        // interior row: hole, slime, pink button, pink block, empty
        assert!(state.is_solid(1, 1, false));
        assert!(!state.is_solid(1, 1, true));
        assert!(!state.is_solid(2, 1, false));
        assert!(state.is_solid(2, 1, true));
        assert!(!state.is_solid(3, 1, false));
        assert!(state.is_solid(3, 1, true));
        assert!(state.is_solid(4, 1, false));
        assert!(state.is_solid(4, 1, true));
        assert!(!state.is_solid(5, 1, false));
        assert!(!state.is_solid(5, 1, true));
        assert!(state.is_solid(0, 1, true));
    }

    #[test]
    fn occupied_cells_are_solid_for_everyone() {
        let state = state("2123");
        assert!(state.is_solid(1, 1, false));
        assert!(state.is_solid(2, 1, true));
    }

    #[test]
    fn clone_to_produces_equal_independent_copy() {
        let source = state("3223b0470");
        let mut target = state("110");

        source.clone_to(&mut target);
        assert_eq!(target, source);

        target.set_tile(Layer::Bottom, 3, 2, tile::EMPTY, Direction::None);
        target.set_turns_left(2);
        assert_eq!(source.tile(Layer::Bottom, 3, 2), tile::COIN);
        assert_eq!(source.turns_left(), 13);
    }

    #[test]
    fn swap_skips_occupied_cells() {
        let mut state = state("31b9c");
        state.set_tile(Layer::Top, 3, 1, tile::ROCK, Direction::None);

        state.swap_bottom_layer_tile(tile::PINK_BLOCK, tile::PINK_BLOCK_LOWERED);

        assert_eq!(state.tile(Layer::Bottom, 1, 1), tile::PINK_BLOCK_LOWERED);
        assert_eq!(state.tile(Layer::Bottom, 2, 1), tile::PINK_BUTTON);
        assert_eq!(state.tile(Layer::Bottom, 3, 1), tile::PINK_BLOCK_LOWERED);
    }

    #[test]
    fn stage_clears_once_coins_are_gone() {
        let mut state = state("2127");
        assert!(!state.is_stage_clear());

        state.set_tile(Layer::Bottom, 2, 1, tile::EMPTY, Direction::None);
        assert!(state.is_stage_clear());
    }

    #[test]
    fn state_round_trips_through_bincode() {
        let mut state = state("3223b0470");
        state.set_tile(Layer::Top, 1, 1, tile::PLAYER, Direction::Down);

        let bytes = bincode::serialize(&state).expect("serialize");
        let restored: PuzzleState = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, state);
    }
}
