//! Plain-text board dumps for terminals and test diagnostics.

use ghost_trail_core::{tile, Form, Layer};
use ghost_trail_world::PuzzleState;

/// Character used for a bottom-layer code.
#[must_use]
pub const fn bottom_glyph(code: u8) -> char {
    match code {
        tile::WALL => '#',
        tile::HOLE => 'O',
        tile::CROSS => '+',
        tile::SLIME => '~',
        tile::COIN => '$',
        tile::APPLE => 'a',
        tile::PINK_BUTTON => 'p',
        tile::PINK_BUTTON_PRESSED => '_',
        tile::PINK_BLOCK => 'X',
        tile::PINK_BLOCK_LOWERED => 'x',
        tile::ARROW_RIGHT => '>',
        tile::ARROW_UP => '^',
        tile::ARROW_LEFT => '<',
        tile::ARROW_DOWN => 'v',
        tile::BLUE_BUTTON => 'b',
        tile::BLUE_BUTTON_PRESSED => 'd',
        _ => '.',
    }
}

/// Renders the state one character per cell, top layer over bottom layer.
///
/// The player is drawn as `@` in human form and `&` as a ghost; rocks are `o`.
#[must_use]
pub fn render_state(state: &PuzzleState) -> String {
    let player = match Form::from_turns(state.turns_left()) {
        Form::Human => '@',
        Form::Ghost => '&',
    };

    let mut out = String::with_capacity((state.width() + 1) * state.height());
    state.iterate(|bottom, top, x, _| {
        out.push(match top {
            tile::PLAYER => player,
            tile::ROCK => 'o',
            _ => bottom_glyph(bottom),
        });
        if usize::try_from(x).map_or(false, |x| x + 1 == state.width()) {
            out.push('\n');
        }
    });
    out
}

/// Renders one layer only, ignoring the other.
#[must_use]
pub fn render_layer(state: &PuzzleState, layer: Layer) -> String {
    let mut out = String::with_capacity((state.width() + 1) * state.height());
    state.iterate(|bottom, top, x, _| {
        out.push(match layer {
            Layer::Bottom => bottom_glyph(bottom),
            Layer::Top => match top {
                tile::PLAYER => '@',
                tile::ROCK => 'o',
                _ => '.',
            },
        });
        if usize::try_from(x).map_or(false, |x| x + 1 == state.width()) {
            out.push('\n');
        }
    });
    out
}
