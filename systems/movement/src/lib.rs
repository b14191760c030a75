#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Mobile puzzle entities and their tile-triggered side effects.
//!
//! A [`GameObject`] is either idle, interpolating toward a neighbouring cell,
//! or inactive once consumed. Objects never talk to each other directly: a
//! rock reads the top layer of the shared [`PuzzleState`] behind it to find
//! the player driving a push chain, and the chain resolves over repeated
//! control passes within a single update.

use ghost_trail_core::{
    tile, CellCoord, Direction, EffectKind, Event, InputSnapshot, Layer, ObjectKind,
    Rules, SoundEffect, TILE_SIZE,
};
use ghost_trail_world::PuzzleState;

/// A player, rock, coin or apple living on the puzzle grid.
#[derive(Clone, Debug, PartialEq)]
pub struct GameObject {
    kind: ObjectKind,
    pos: CellCoord,
    target: CellCoord,
    move_timer: f32,
    render_pos: [f32; 2],
    direction: Direction,
    active: bool,
    moving: bool,
    jumping: bool,
    automatically_moving: bool,
    fresh_arrival: bool,
    death_timer: f32,
}

impl GameObject {
    /// Creates an idle, active object at the given cell.
    #[must_use]
    pub fn new(kind: ObjectKind, pos: CellCoord) -> Self {
        Self {
            kind,
            pos,
            target: pos,
            move_timer: 0.0,
            render_pos: pixel_position(pos),
            direction: Direction::None,
            active: true,
            moving: false,
            jumping: false,
            automatically_moving: false,
            fresh_arrival: false,
            death_timer: 0.0,
        }
    }

    /// Kind of the object.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Cell the object occupies, or departs from while moving.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        self.pos
    }

    /// Cell the object is heading to; equals [`Self::position`] when idle.
    #[must_use]
    pub const fn target(&self) -> CellCoord {
        self.target
    }

    /// Current facing.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Interpolation progress of the current move in `[0, 1)`.
    #[must_use]
    pub const fn move_timer(&self) -> f32 {
        self.move_timer
    }

    /// Interpolated top-left corner in presentation pixels.
    #[must_use]
    pub const fn render_position(&self) -> [f32; 2] {
        self.render_pos
    }

    /// Whether the object is still part of the puzzle.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the object is between cells.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.moving
    }

    /// Whether the current move hops onto a raised tile.
    #[must_use]
    pub const fn is_jumping(&self) -> bool {
        self.jumping
    }

    /// Whether the current move was forced by an arrow.
    #[must_use]
    pub const fn is_automatically_moving(&self) -> bool {
        self.automatically_moving
    }

    /// Remaining vanish animation after being collected.
    #[must_use]
    pub const fn death_timer(&self) -> f32 {
        self.death_timer
    }

    /// Decides whether the object starts a move this pass.
    ///
    /// Returns `true` only when a move actually started. Rocks move when a
    /// player pushes them directly or through a line of rocks facing the
    /// same way; collectables never move.
    pub fn control(
        &mut self,
        state: &mut PuzzleState,
        input: &InputSnapshot,
        ignore_auto_movement: bool,
        out: &mut Vec<Event>,
    ) -> bool {
        if !self.active || self.moving {
            return false;
        }

        match self.kind {
            ObjectKind::Player => self.control_player(state, input, ignore_auto_movement, out),
            ObjectKind::Rock => self.control_rock(state, input, out),
            ObjectKind::Coin | ObjectKind::Apple => false,
        }
    }

    fn control_player(
        &mut self,
        state: &mut PuzzleState,
        input: &InputSnapshot,
        ignore_auto_movement: bool,
        out: &mut Vec<Event>,
    ) -> bool {
        self.automatically_moving = false;

        let mut direction = None;
        if !ignore_auto_movement && state.turns_left() > 0 {
            direction = tile::arrow_direction(self.bottom_tile(state));
            self.automatically_moving = direction.is_some();
        }
        let Some(direction) = direction.or_else(|| input.held_direction()) else {
            return false;
        };

        self.face(state, direction);
        if self.move_to(state, self.pos.step(direction), out) {
            return true;
        }

        if self.automatically_moving {
            return self.control(state, input, true, out);
        }
        false
    }

    fn control_rock(
        &mut self,
        state: &mut PuzzleState,
        input: &InputSnapshot,
        out: &mut Vec<Event>,
    ) -> bool {
        let Some(direction) = Direction::CARDINALS
            .into_iter()
            .find(|direction| is_pushed(state, self.pos, *direction, input))
        else {
            return false;
        };

        // blocked rocks still turn toward the push
        self.face(state, direction);
        self.move_to(state, self.pos.step(direction), out)
    }

    /// Starts moving into `target` unless it is solid for this mover.
    pub fn move_to(
        &mut self,
        state: &mut PuzzleState,
        target: CellCoord,
        out: &mut Vec<Event>,
    ) -> bool {
        let rock_mode = self.kind == ObjectKind::Rock || state.turns_left() <= 0;
        if state.is_solid(target.column(), target.row(), rock_mode) {
            return false;
        }

        state.set_tile(
            Layer::Top,
            self.pos.column(),
            self.pos.row(),
            tile::EMPTY,
            Direction::None,
        );
        self.precheck_underlying_tiles(state, out);

        self.target = target;
        self.move_timer = 0.0;
        self.moving = true;
        self.jumping = self.kind == ObjectKind::Player
            && tile::JUMPABLE.contains(&state.tile(Layer::Bottom, target.column(), target.row()));

        if self.kind == ObjectKind::Rock {
            out.push(Event::Sound(SoundEffect::PushBoulder));
        }
        if self.jumping {
            out.push(Event::Sound(SoundEffect::Jump));
        }
        true
    }

    fn precheck_underlying_tiles(&mut self, state: &mut PuzzleState, out: &mut Vec<Event>) {
        if self.kind != ObjectKind::Player {
            return;
        }

        let (x, y) = (self.pos.column(), self.pos.row());
        match state.tile(Layer::Bottom, x, y) {
            tile::CROSS => {
                state.set_tile(Layer::Bottom, x, y, tile::HOLE, Direction::None);
                effect(out, EffectKind::SpreadingHole, self.pos);
                out.push(Event::Sound(SoundEffect::SpreadingHole));
            }
            tile::EMPTY if state.turns_left() <= 0 => {
                state.set_tile(Layer::Bottom, x, y, tile::SLIME, Direction::None);
                effect(out, EffectKind::EmergingSlime, self.pos);
                out.push(Event::Sound(SoundEffect::EmergingSlime));
            }
            _ => {}
        }
    }

    /// Advances the move interpolation and the vanish animation by one tick.
    pub fn update(&mut self, state: &mut PuzzleState, move_speed: f32, tick: f32) {
        if self.death_timer > 0.0 {
            self.death_timer = (self.death_timer - move_speed * tick).max(0.0);
        }
        if !self.moving {
            return;
        }

        self.move_timer += move_speed * tick;
        if self.move_timer >= 1.0 {
            self.move_timer = 0.0;
            self.moving = false;
            self.jumping = false;
            self.pos = self.target;
            self.fresh_arrival = true;
            if self.kind.layer() == Layer::Top {
                state.set_tile(
                    Layer::Top,
                    self.pos.column(),
                    self.pos.row(),
                    self.kind.code(),
                    self.direction,
                );
            }
        }
        self.render_pos = self.interpolated_position();
    }

    /// Resolves the trigger under the object once movement has settled.
    ///
    /// Returns `true` when a collectable was consumed, in which case every
    /// object must be checked again.
    pub fn check_underlying_tiles(
        &mut self,
        state: &mut PuzzleState,
        rules: &Rules,
        out: &mut Vec<Event>,
    ) -> bool {
        if !self.active {
            return false;
        }

        let (x, y) = (self.pos.column(), self.pos.row());
        let bottom = state.tile(Layer::Bottom, x, y);
        match self.kind {
            ObjectKind::Rock => {
                if bottom == tile::HOLE {
                    self.active = false;
                    state.set_tile(Layer::Bottom, x, y, tile::EMPTY, Direction::None);
                    state.set_tile(Layer::Top, x, y, tile::EMPTY, Direction::None);
                    effect(out, EffectKind::ShrinkingHole, self.pos);
                    out.push(Event::Sound(SoundEffect::FallingBoulder));
                }
                false
            }
            ObjectKind::Player => self.check_player_tile(state, rules, bottom, out),
            ObjectKind::Coin | ObjectKind::Apple => {
                if bottom != self.kind.code() {
                    self.active = false;
                    self.death_timer = 1.0;
                }
                false
            }
        }
    }

    fn check_player_tile(
        &mut self,
        state: &mut PuzzleState,
        rules: &Rules,
        bottom: u8,
        out: &mut Vec<Event>,
    ) -> bool {
        let (x, y) = (self.pos.column(), self.pos.row());
        let ghost = state.turns_left() <= 0;
        let fresh_arrival = std::mem::take(&mut self.fresh_arrival);

        match bottom {
            tile::SLIME if !ghost => {
                state.set_tile(Layer::Bottom, x, y, tile::EMPTY, Direction::None);
                effect(out, EffectKind::SplashingSlime, self.pos);
                out.push(Event::Sound(SoundEffect::Splash));
                false
            }
            tile::PINK_BUTTON => {
                state.set_tile(Layer::Bottom, x, y, tile::PINK_BUTTON_PRESSED, Direction::None);
                swap_pink_blocks(state, out);
                false
            }
            tile::BLUE_BUTTON | tile::BLUE_BUTTON_PRESSED if fresh_arrival => {
                let toggled = if bottom == tile::BLUE_BUTTON {
                    tile::BLUE_BUTTON_PRESSED
                } else {
                    tile::BLUE_BUTTON
                };
                state.set_tile(Layer::Bottom, x, y, toggled, Direction::None);
                swap_pink_blocks(state, out);
                false
            }
            tile::COIN if ghost => {
                state.set_tile(Layer::Bottom, x, y, tile::EMPTY, Direction::None);
                out.push(Event::Sound(SoundEffect::Coin));
                true
            }
            tile::APPLE => {
                state.set_tile(Layer::Bottom, x, y, tile::EMPTY, Direction::None);
                state.set_turns_left(rules.apple_turns);
                out.push(Event::Sound(SoundEffect::Coin));
                true
            }
            _ => false,
        }
    }

    /// Cancels any in-flight move and leaves the object idle on its cell.
    pub fn stop_moving(&mut self) {
        self.moving = false;
        self.jumping = false;
        self.automatically_moving = false;
        self.fresh_arrival = false;
        self.move_timer = 0.0;
        self.target = self.pos;
        self.render_pos = pixel_position(self.pos);
    }

    /// Removes the object from play without a vanish animation.
    pub fn deactivate(&mut self) {
        self.stop_moving();
        self.active = false;
        self.death_timer = 0.0;
    }

    /// Places the object on a cell as an idle, active entity.
    pub fn set_position(&mut self, pos: CellCoord, direction: Direction) {
        self.pos = pos;
        self.direction = direction;
        self.active = true;
        self.death_timer = 0.0;
        self.stop_moving();
    }

    fn face(&mut self, state: &mut PuzzleState, direction: Direction) {
        self.direction = direction;
        state.set_tile(
            Layer::Top,
            self.pos.column(),
            self.pos.row(),
            self.kind.code(),
            direction,
        );
    }

    fn bottom_tile(&self, state: &PuzzleState) -> u8 {
        state.tile(Layer::Bottom, self.pos.column(), self.pos.row())
    }

    fn interpolated_position(&self) -> [f32; 2] {
        let t = self.move_timer;
        let [from_x, from_y] = pixel_position(self.pos);
        let [to_x, to_y] = pixel_position(self.target);
        [
            (1.0 - t) * from_x + t * to_x,
            (1.0 - t) * from_y + t * to_y,
        ]
    }
}

/// Whether a rock at `rock` is being pushed toward `direction`.
///
/// Walks back over the occupied cells behind the rock. The chain is pushed
/// when it ends at a player heading `direction` this frame; stamped facings
/// are not consulted, so the result does not depend on raster order.
fn is_pushed(
    state: &PuzzleState,
    rock: CellCoord,
    direction: Direction,
    input: &InputSnapshot,
) -> bool {
    let behind = direction.opposite();
    let mut cell = rock.step(behind);
    loop {
        match state.tile(Layer::Top, cell.column(), cell.row()) {
            tile::ROCK => cell = cell.step(behind),
            tile::PLAYER => return intended_direction(state, cell, input) == Some(direction),
            _ => return false,
        }
    }
}

/// Direction the idle player at `player` heads this frame.
///
/// A live arrow wins unless its target is blocked by something other than a
/// rock, in which case the first held direction is used.
fn intended_direction(
    state: &PuzzleState,
    player: CellCoord,
    input: &InputSnapshot,
) -> Option<Direction> {
    if state.turns_left() > 0 {
        let arrow = tile::arrow_direction(state.tile(Layer::Bottom, player.column(), player.row()));
        if let Some(arrow) = arrow {
            let ahead = player.step(arrow);
            let (x, y) = (ahead.column(), ahead.row());
            if !state.is_solid(x, y, false) || state.tile(Layer::Top, x, y) == tile::ROCK {
                return Some(arrow);
            }
        }
    }
    input.held_direction()
}

fn swap_pink_blocks(state: &mut PuzzleState, out: &mut Vec<Event>) {
    state.swap_bottom_layer_tile(tile::PINK_BLOCK, tile::PINK_BLOCK_LOWERED);
    out.push(Event::TilesSwapped {
        first: tile::PINK_BLOCK,
        second: tile::PINK_BLOCK_LOWERED,
    });
}

fn effect(out: &mut Vec<Event>, kind: EffectKind, cell: CellCoord) {
    log::trace!("effect {kind:?} at ({}, {})", cell.column(), cell.row());
    out.push(Event::EffectStarted { kind, cell });
}

fn pixel_position(cell: CellCoord) -> [f32; 2] {
    [cell.column() as f32 * TILE_SIZE, cell.row() as f32 * TILE_SIZE]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_trail_core::{Action, InputState};
    use ghost_trail_world::Tilemap;

    fn state(packed: &str, turns_left: i32) -> PuzzleState {
        PuzzleState::new(&Tilemap::decode(packed).expect("decode"), turns_left)
    }

    fn holding(action: Action) -> InputSnapshot {
        InputSnapshot::new().with(action, InputState::Down)
    }

    #[test]
    fn collectables_never_move() {
        let mut state = state("31700", 13);
        let mut coin = GameObject::new(ObjectKind::Coin, CellCoord::new(1, 1));
        let mut events = Vec::new();

        assert!(!coin.control(&mut state, &holding(Action::Right), false, &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn blocked_player_still_turns() {
        let mut state = state("112", 13);
        let mut player = GameObject::new(ObjectKind::Player, CellCoord::new(1, 1));
        let mut events = Vec::new();

        assert!(!player.control(&mut state, &holding(Action::Up), false, &mut events));
        assert_eq!(player.direction(), Direction::Up);
        assert_eq!(state.direction(Layer::Top, 1, 1), Direction::Up);
        assert_eq!(state.tile(Layer::Top, 1, 1), tile::PLAYER);
    }

    #[test]
    fn interpolation_reaches_target_after_full_timer() {
        let mut state = state("2120", 13);
        let mut player = GameObject::new(ObjectKind::Player, CellCoord::new(1, 1));
        let mut events = Vec::new();

        assert!(player.control(&mut state, &holding(Action::Right), false, &mut events));
        assert_eq!(state.tile(Layer::Top, 1, 1), tile::EMPTY);

        for _ in 0..8 {
            player.update(&mut state, 1.0 / 16.0, 1.0);
        }
        assert!(player.is_moving());
        assert_eq!(player.render_position(), [24.0, 16.0]);

        for _ in 0..8 {
            player.update(&mut state, 1.0 / 16.0, 1.0);
        }
        assert!(!player.is_moving());
        assert_eq!(player.position(), CellCoord::new(2, 1));
        assert_eq!(player.render_position(), [32.0, 16.0]);
        assert_eq!(state.tile(Layer::Top, 2, 1), tile::PLAYER);
        assert_eq!(state.direction(Layer::Top, 2, 1), Direction::Right);
    }

    #[test]
    fn death_timer_counts_down_after_collection() {
        let mut state = state("2178", 0);
        let mut coin = GameObject::new(ObjectKind::Coin, CellCoord::new(1, 1));
        let mut events = Vec::new();
        state.set_tile(Layer::Bottom, 1, 1, tile::EMPTY, Direction::None);

        assert!(!coin.check_underlying_tiles(&mut state, &Rules::default(), &mut events));
        assert!(!coin.is_active());
        assert_eq!(coin.death_timer(), 1.0);

        coin.update(&mut state, 0.25, 1.0);
        assert_eq!(coin.death_timer(), 0.75);
        for _ in 0..10 {
            coin.update(&mut state, 0.25, 1.0);
        }
        assert_eq!(coin.death_timer(), 0.0);
    }

    #[test]
    fn set_position_revives_and_parks_object() {
        let mut rock = GameObject::new(ObjectKind::Rock, CellCoord::new(1, 1));
        rock.deactivate();
        assert!(!rock.is_active());

        rock.set_position(CellCoord::new(3, 2), Direction::Left);
        assert!(rock.is_active());
        assert!(!rock.is_moving());
        assert_eq!(rock.target(), CellCoord::new(3, 2));
        assert_eq!(rock.direction(), Direction::Left);
        assert_eq!(rock.render_position(), [48.0, 32.0]);
    }
}
