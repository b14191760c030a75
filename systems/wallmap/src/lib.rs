#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Half-cell wall border and shadow derivation for static level geometry.
//!
//! Every wall cell is split into four quarters. Each quarter picks a border
//! sprite from the 3×3 neighbourhood of its cell: quarters that touch open
//! floor get an edge or corner piece, quarters fully surrounded by walls get
//! the ambient fill. Cells beyond the map edge count as walls so the level
//! border never shows a seam.

use ghost_trail_core::tile;
use ghost_trail_world::Tilemap;

/// Sentinel for half-cells without any wall or shadow sprite.
pub const NO_TILE: i8 = -1;

/// Border value for half-cells painted with the plain wall fill.
pub const WALL_FILL: i8 = 0;

/// Shadow selector: walls both left and above.
pub const SHADOW_CORNER: i8 = 1;
/// Shadow selector: wall to the left only.
pub const SHADOW_LEFT: i8 = 2;
/// Shadow selector: wall above only.
pub const SHADOW_TOP: i8 = 3;
/// Shadow selector: wall only on the upper-left diagonal.
pub const SHADOW_DIAGONAL: i8 = 4;

/// Border sprites for one quarter of a wall cell.
#[derive(Clone, Copy, Debug)]
struct CornerSprites {
    /// Horizontal offset of the quarter's neighbour column.
    dx: i32,
    /// Vertical offset of the quarter's neighbour row.
    dy: i32,
    open: i8,
    vertical_wall: i8,
    horizontal_wall: i8,
    inner: i8,
}

const CORNERS: [CornerSprites; 4] = [
    CornerSprites {
        dx: -1,
        dy: -1,
        open: 1,
        vertical_wall: 4,
        horizontal_wall: 3,
        inner: 5,
    },
    CornerSprites {
        dx: 1,
        dy: -1,
        open: 2,
        vertical_wall: 10,
        horizontal_wall: 3,
        inner: 6,
    },
    CornerSprites {
        dx: -1,
        dy: 1,
        open: 7,
        vertical_wall: 4,
        horizontal_wall: 9,
        inner: 11,
    },
    CornerSprites {
        dx: 1,
        dy: 1,
        open: 8,
        vertical_wall: 10,
        horizontal_wall: 9,
        inner: 12,
    },
];

/// Wall classification of a cell and its eight neighbours.
#[derive(Clone, Copy, Debug)]
struct Neighbourhood {
    walls: [bool; 9],
}

impl Neighbourhood {
    fn around(tilemap: &Tilemap, x: i32, y: i32) -> Self {
        let mut walls = [false; 9];
        for (index, slot) in walls.iter_mut().enumerate() {
            let dx = (index % 3) as i32 - 1;
            let dy = (index / 3) as i32 - 1;
            *slot = is_wall(tilemap, x + dx, y + dy);
        }
        Self { walls }
    }

    fn wall(&self, dx: i32, dy: i32) -> bool {
        let index = (dy + 1) * 3 + (dx + 1);
        usize::try_from(index)
            .ok()
            .and_then(|index| self.walls.get(index))
            .copied()
            .unwrap_or(true)
    }

    fn corner(&self, sprites: &CornerSprites) -> i8 {
        let vertical = self.wall(0, sprites.dy);
        let horizontal = self.wall(sprites.dx, 0);
        match (vertical, horizontal) {
            (true, true) if self.wall(sprites.dx, sprites.dy) => WALL_FILL,
            (true, true) => sprites.inner,
            (true, false) => sprites.vertical_wall,
            (false, true) => sprites.horizontal_wall,
            (false, false) => sprites.open,
        }
    }
}

/// Derived wall border and shadow layers at half-cell resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallMap {
    width: usize,
    height: usize,
    borders: Vec<i8>,
    shadows: Vec<i8>,
}

impl WallMap {
    /// Derives both layers from the static tilemap.
    #[must_use]
    pub fn generate(tilemap: &Tilemap) -> Self {
        let width = tilemap.width() * 2;
        let height = tilemap.height() * 2;
        let mut borders = vec![NO_TILE; width * height];

        for (cell, code) in tilemap.iter() {
            if code != tile::WALL {
                continue;
            }
            let neighbourhood = Neighbourhood::around(tilemap, cell.column(), cell.row());
            for sprites in &CORNERS {
                let half_x = cell.column() * 2 + (sprites.dx + 1) / 2;
                let half_y = cell.row() * 2 + (sprites.dy + 1) / 2;
                if let Some(index) = half_index(width, height, half_x, half_y) {
                    borders[index] = neighbourhood.corner(sprites);
                }
            }
        }

        let mut shadows = vec![NO_TILE; width * height];
        for (index, slot) in shadows.iter_mut().enumerate() {
            let half_x = (index % width) as i32;
            let half_y = (index / width) as i32;
            *slot = shadow_at(tilemap, half_x, half_y);
        }

        log::debug!(
            "generated {width}x{height} wall map with {} border quarters",
            borders.iter().filter(|value| **value != NO_TILE).count()
        );

        Self {
            width,
            height,
            borders,
            shadows,
        }
    }

    /// Width in half-cells.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in half-cells.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Border selector at the half-cell, [`NO_TILE`] outside the map.
    #[must_use]
    pub fn border(&self, x: i32, y: i32) -> i8 {
        half_index(self.width, self.height, x, y)
            .and_then(|index| self.borders.get(index).copied())
            .unwrap_or(NO_TILE)
    }

    /// Shadow selector at the half-cell, [`NO_TILE`] outside the map.
    #[must_use]
    pub fn shadow(&self, x: i32, y: i32) -> i8 {
        half_index(self.width, self.height, x, y)
            .and_then(|index| self.shadows.get(index).copied())
            .unwrap_or(NO_TILE)
    }

    /// Border selectors in raster order.
    #[must_use]
    pub fn borders(&self) -> &[i8] {
        &self.borders
    }

    /// Shadow selectors in raster order.
    #[must_use]
    pub fn shadows(&self) -> &[i8] {
        &self.shadows
    }
}

fn is_wall(tilemap: &Tilemap, x: i32, y: i32) -> bool {
    tilemap.tile_or(x, y, tile::WALL) == tile::WALL
}

fn is_wall_half(tilemap: &Tilemap, half_x: i32, half_y: i32) -> bool {
    is_wall(tilemap, half_x.div_euclid(2), half_y.div_euclid(2))
}

fn shadow_at(tilemap: &Tilemap, half_x: i32, half_y: i32) -> i8 {
    if is_wall_half(tilemap, half_x, half_y) {
        return NO_TILE;
    }
    let left = is_wall_half(tilemap, half_x - 1, half_y);
    let up = is_wall_half(tilemap, half_x, half_y - 1);
    match (left, up) {
        (true, true) => SHADOW_CORNER,
        (true, false) => SHADOW_LEFT,
        (false, true) => SHADOW_TOP,
        (false, false) if is_wall_half(tilemap, half_x - 1, half_y - 1) => SHADOW_DIAGONAL,
        (false, false) => NO_TILE,
    }
}

fn half_index(width: usize, height: usize, x: i32, y: i32) -> Option<usize> {
    let column = usize::try_from(x).ok()?;
    let row = usize::try_from(y).ok()?;
    if column < width && row < height {
        Some(row * width + column)
    } else {
        None
    }
}
