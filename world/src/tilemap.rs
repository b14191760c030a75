//! Decoding of packed level strings.

use ghost_trail_core::{tile, CellCoord};

use crate::LevelError;

const RADIX: u32 = 32;
const BORDER: usize = 1;

/// Immutable tile grid decoded from a packed level string.
///
/// The stored grid is two cells wider and taller than the packed interior;
/// the extra margin is filled with walls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tilemap {
    width: usize,
    height: usize,
    tiles: Vec<u8>,
}

impl Tilemap {
    /// Decodes a packed level: one base-32 digit each for the interior width
    /// and height, followed by one base-32 digit per interior cell in
    /// row-major order.
    pub fn decode(packed: &str) -> Result<Self, LevelError> {
        let digits = packed
            .chars()
            .enumerate()
            .map(|(offset, digit)| {
                digit
                    .to_digit(RADIX)
                    .and_then(|value| u8::try_from(value).ok())
                    .ok_or(LevelError::InvalidTileDigit { digit, offset })
            })
            .collect::<Result<Vec<u8>, LevelError>>()?;

        let (&[interior_width, interior_height], cells) = match digits.split_first_chunk::<2>() {
            Some(split) => split,
            None => {
                return Err(LevelError::MalformedLevelData(format!(
                    "expected a two digit header, found {} characters",
                    digits.len()
                )))
            }
        };

        let interior_width = usize::from(interior_width);
        let interior_height = usize::from(interior_height);
        if interior_width == 0 || interior_height == 0 {
            return Err(LevelError::MalformedLevelData(format!(
                "interior dimensions {interior_width}x{interior_height} must be non-zero"
            )));
        }

        let expected = interior_width * interior_height;
        if cells.len() != expected {
            return Err(LevelError::MalformedLevelData(format!(
                "expected {expected} tiles for a {interior_width}x{interior_height} interior, found {}",
                cells.len()
            )));
        }

        let width = interior_width + 2 * BORDER;
        let height = interior_height + 2 * BORDER;
        let mut tiles = vec![tile::WALL; width * height];
        for (row, chunk) in cells.chunks(interior_width).enumerate() {
            let start = (row + BORDER) * width + BORDER;
            tiles[start..start + interior_width].copy_from_slice(chunk);
        }

        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Stored width including the wall margin.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Stored height including the wall margin.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Code at the given cell, or `default` outside the grid.
    #[must_use]
    pub fn tile_or(&self, x: i32, y: i32, default: u8) -> u8 {
        self.index(x, y)
            .and_then(|index| self.tiles.get(index).copied())
            .unwrap_or(default)
    }

    /// Copy of the grid with every code rejected by `allowed` replaced by 0.
    #[must_use]
    pub fn filter_tiles<F>(&self, allowed: F) -> Vec<u8>
    where
        F: Fn(u8) -> bool,
    {
        self.tiles
            .iter()
            .map(|&code| if allowed(code) { code } else { tile::EMPTY })
            .collect()
    }

    /// Iterates cells in raster order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, u8)> + '_ {
        let width = self.width;
        self.tiles.iter().enumerate().map(move |(index, &code)| {
            let column = i32::try_from(index % width).unwrap_or(i32::MAX);
            let row = i32::try_from(index / width).unwrap_or(i32::MAX);
            (CellCoord::new(column, row), code)
        })
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
