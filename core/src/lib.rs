#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Ghost Trail engine.
//!
//! This crate defines the vocabulary that connects the puzzle world, the
//! pure systems and the adapters. Systems read [`InputSnapshot`] values,
//! mutate the authoritative puzzle state they own, and report everything the
//! presentation layer needs to know through [`Event`] values: visual effects,
//! audio cues, turn bookkeeping and scene changes. Adapters drain those events
//! and never feed decisions back into the simulation.

use serde::{Deserialize, Serialize};

/// Number of regular stages tracked by the progress store.
pub const NORMAL_LEVEL_COUNT: usize = 12;

/// One-based index of the bonus stage unlocked after all regular stages.
pub const FINAL_LEVEL: usize = NORMAL_LEVEL_COUNT + 1;

/// Width and height of a single tile in presentation pixels.
pub const TILE_SIZE: f32 = 16.0;

/// Tile codes stored in the puzzle layers.
///
/// Codes below [`tile::CODE_LIMIT`] are valid; anything else is masked.
pub mod tile {
    /// Floor without any feature.
    pub const EMPTY: u8 = 0;
    /// Solid wall, also used for the implicit level border.
    pub const WALL: u8 = 1;
    /// Player occupancy on the top layer.
    pub const PLAYER: u8 = 2;
    /// Rock occupancy on the top layer.
    pub const ROCK: u8 = 3;
    /// Hole that swallows rocks and blocks the human player.
    pub const HOLE: u8 = 4;
    /// Cracked floor that collapses into a hole once the player leaves it.
    pub const CROSS: u8 = 5;
    /// Slime left behind by the ghost; washed away by the human player.
    pub const SLIME: u8 = 6;
    /// Coin collectable only in ghost form.
    pub const COIN: u8 = 7;
    /// Apple that refills the turn counter.
    pub const APPLE: u8 = 8;
    /// Pink button that has not been pressed yet.
    pub const PINK_BUTTON: u8 = 9;
    /// Pink button after being pressed.
    pub const PINK_BUTTON_PRESSED: u8 = 10;
    /// Raised pink block.
    pub const PINK_BLOCK: u8 = 11;
    /// Lowered pink block.
    pub const PINK_BLOCK_LOWERED: u8 = 12;
    /// Conveyor arrow pointing right.
    pub const ARROW_RIGHT: u8 = 13;
    /// Conveyor arrow pointing up.
    pub const ARROW_UP: u8 = 14;
    /// Conveyor arrow pointing left.
    pub const ARROW_LEFT: u8 = 15;
    /// Conveyor arrow pointing down.
    pub const ARROW_DOWN: u8 = 16;
    /// Blue toggle button in its raised position.
    pub const BLUE_BUTTON: u8 = 17;
    /// Blue toggle button in its lowered position.
    pub const BLUE_BUTTON_PRESSED: u8 = 18;

    /// Exclusive upper bound of valid tile codes.
    pub const CODE_LIMIT: u8 = 31;
    /// Mask that strips direction information from packed cells.
    pub const CODE_MASK: u8 = 31;
    /// Bit offset of the direction stored in packed cells.
    pub const DIRECTION_SHIFT: u8 = 5;

    /// Codes that live on the dynamic top layer.
    pub const TOP_LAYER: [u8; 2] = [PLAYER, ROCK];

    /// Codes that are solid for every mover.
    pub const ALWAYS_SOLID: [u8; 2] = [WALL, PINK_BLOCK];

    /// Codes that are solid only for rocks and for the ghost.
    pub const ROCK_SOLID: [u8; 2] = [SLIME, PINK_BUTTON];

    /// Codes that make the player hop instead of walk when entered.
    pub const JUMPABLE: [u8; 4] = [SLIME, PINK_BUTTON, BLUE_BUTTON, BLUE_BUTTON_PRESSED];

    /// Returns `true` when the code belongs on the static bottom layer.
    #[must_use]
    pub fn is_bottom_layer(code: u8) -> bool {
        code != EMPTY && code < CODE_LIMIT && !TOP_LAYER.contains(&code)
    }

    /// Direction forced by an arrow tile, if the code is an arrow.
    #[must_use]
    pub const fn arrow_direction(code: u8) -> Option<super::Direction> {
        match code {
            ARROW_RIGHT => Some(super::Direction::Right),
            ARROW_UP => Some(super::Direction::Up),
            ARROW_LEFT => Some(super::Direction::Left),
            ARROW_DOWN => Some(super::Direction::Down),
            _ => None,
        }
    }
}

/// Selects one of the two parallel puzzle layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Static terrain: walls, holes, buttons, arrows and collectables.
    Bottom,
    /// Dynamic occupancy: the player and rocks.
    Top,
}

impl Layer {
    /// Both layers in scan order.
    pub const ALL: [Layer; 2] = [Layer::Bottom, Layer::Top];
}

/// Facing and movement directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// No facing; freshly spawned objects.
    #[default]
    None,
    /// Toward increasing column indices.
    Right,
    /// Toward decreasing row indices.
    Up,
    /// Toward decreasing column indices.
    Left,
    /// Toward increasing row indices.
    Down,
}

impl Direction {
    /// Cardinal directions in the input priority order.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::Down,
    ];

    /// Column and row offset of a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::None => (0, 0),
            Self::Right => (1, 0),
            Self::Up => (0, -1),
            Self::Left => (-1, 0),
            Self::Down => (0, 1),
        }
    }

    /// Direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Left => Self::Right,
            Self::Down => Self::Up,
        }
    }

    /// Numeric encoding used in packed cells (0..=4).
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Right => 1,
            Self::Up => 2,
            Self::Left => 3,
            Self::Down => 4,
        }
    }
}

/// Location of a single grid cell. Signed so neighbour lookups can leave the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Neighbouring cell one step in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.column + dx, self.row + dy)
    }
}

/// Kinds of mobile entities tracked by the turn controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// The controllable character.
    Player,
    /// A pushable rock.
    Rock,
    /// A coin that vanishes once collected.
    Coin,
    /// An apple that vanishes once eaten.
    Apple,
}

impl ObjectKind {
    /// Tile code representing the object on its layer.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Player => tile::PLAYER,
            Self::Rock => tile::ROCK,
            Self::Coin => tile::COIN,
            Self::Apple => tile::APPLE,
        }
    }

    /// Layer the object is recorded on.
    #[must_use]
    pub const fn layer(self) -> Layer {
        match self {
            Self::Player | Self::Rock => Layer::Top,
            Self::Coin | Self::Apple => Layer::Bottom,
        }
    }

    /// Resolves the object spawned by a tile code on the given layer.
    #[must_use]
    pub const fn from_code(layer: Layer, code: u8) -> Option<Self> {
        match (layer, code) {
            (Layer::Top, tile::PLAYER) => Some(Self::Player),
            (Layer::Top, tile::ROCK) => Some(Self::Rock),
            (Layer::Bottom, tile::COIN) => Some(Self::Coin),
            (Layer::Bottom, tile::APPLE) => Some(Self::Apple),
            _ => None,
        }
    }
}

/// The two forms of the player character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Form {
    /// Turns remain; regular solidity rules.
    Human,
    /// Turn counter depleted; rock solidity rules, leaves slime behind.
    Ghost,
}

impl Form {
    /// Form implied by the remaining turn counter.
    #[must_use]
    pub const fn from_turns(turns_left: i32) -> Self {
        if turns_left <= 0 {
            Self::Ghost
        } else {
            Self::Human
        }
    }
}

/// Logical input actions.
///
/// Every action has its own value; several physical keys may map to the same
/// action through adapter configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Move right.
    Right,
    /// Move up.
    Up,
    /// Move left.
    Left,
    /// Move down.
    Down,
    /// Confirm a menu selection.
    Choose,
    /// Open or close the pause menu.
    Pause,
    /// Restart the current stage.
    Restart,
    /// Undo the last turn.
    Undo,
}

impl Action {
    /// Every action in slot order.
    pub const ALL: [Action; 8] = [
        Action::Right,
        Action::Up,
        Action::Left,
        Action::Down,
        Action::Choose,
        Action::Pause,
        Action::Restart,
        Action::Undo,
    ];

    /// Movement action matching a cardinal direction.
    #[must_use]
    pub const fn for_direction(direction: Direction) -> Option<Self> {
        match direction {
            Direction::Right => Some(Self::Right),
            Direction::Up => Some(Self::Up),
            Direction::Left => Some(Self::Left),
            Direction::Down => Some(Self::Down),
            Direction::None => None,
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Right => 0,
            Self::Up => 1,
            Self::Left => 2,
            Self::Down => 3,
            Self::Choose => 4,
            Self::Pause => 5,
            Self::Restart => 6,
            Self::Undo => 7,
        }
    }
}

/// Edge-aware state of a single action for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputState {
    /// Not held.
    #[default]
    Up,
    /// Held since an earlier frame.
    Down,
    /// Released on this frame.
    Released,
    /// Pressed on this frame.
    Pressed,
}

impl InputState {
    /// Held on this frame, whether newly pressed or not.
    #[must_use]
    pub const fn is_down(self) -> bool {
        matches!(self, Self::Down | Self::Pressed)
    }
}

/// Input snapshot gathered by adapters before updating the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    states: [InputState; 8],
}

impl InputSnapshot {
    /// Snapshot with every action released.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            states: [InputState::Up; 8],
        }
    }

    /// Returns a copy with `action` set to `state`.
    #[must_use]
    pub const fn with(mut self, action: Action, state: InputState) -> Self {
        self.states[action.slot()] = state;
        self
    }

    /// Sets the state of a single action.
    pub fn set(&mut self, action: Action, state: InputState) {
        self.states[action.slot()] = state;
    }

    /// State recorded for `action`.
    #[must_use]
    pub const fn state(&self, action: Action) -> InputState {
        self.states[action.slot()]
    }

    /// Whether `action` is held on this frame.
    #[must_use]
    pub const fn is_down(&self, action: Action) -> bool {
        self.state(action).is_down()
    }

    /// Whether `action` went down on this frame.
    #[must_use]
    pub const fn is_pressed(&self, action: Action) -> bool {
        matches!(self.state(action), InputState::Pressed)
    }

    /// First held movement direction in priority order.
    #[must_use]
    pub fn held_direction(&self) -> Option<Direction> {
        Direction::CARDINALS.into_iter().find(|direction| {
            Action::for_direction(*direction).is_some_and(|action| self.is_down(action))
        })
    }
}

/// Short-lived tile animations triggered by puzzle mechanics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// A cross collapsing into a hole.
    SpreadingHole,
    /// A hole closing after swallowing a rock.
    ShrinkingHole,
    /// Slime growing behind the ghost.
    EmergingSlime,
    /// Slime splashing under the human player.
    SplashingSlime,
}

impl EffectKind {
    /// Whether the effect holds back new moves until it finishes.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        !matches!(self, Self::SplashingSlime)
    }
}

/// Audio cues requested by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// A rock starts sliding.
    PushBoulder,
    /// A rock drops into a hole.
    FallingBoulder,
    /// Slime washed away.
    Splash,
    /// A cross collapses.
    SpreadingHole,
    /// Slime left behind by the ghost.
    EmergingSlime,
    /// A coin or apple is collected.
    Coin,
    /// The player hops onto slime or a button.
    Jump,
    /// Human and ghost forms swap.
    Transform,
    /// A turn was undone.
    Undo,
    /// The stage was restarted.
    Restart,
    /// A plain footstep.
    Walk,
    /// Menu cursor moved.
    Select,
    /// The stage was cleared.
    StageClear,
    /// The pause menu opened or closed.
    Pause,
    /// An action was refused.
    Reject,
    /// A menu entry was activated.
    Choose,
    /// The bonus stage is about to start.
    FinalStageTransition,
}

/// Scenes the game may hand control to once it fades out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneTarget {
    /// Stage selection screen.
    LevelSelect,
    /// Closing scene shown after the bonus stage.
    Ending,
}

/// Events broadcast by the simulation for adapters to present.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A stage finished loading and the fade-in started.
    LevelStarted {
        /// One-based index of the stage.
        level: usize,
    },
    /// A tile animation started at the given cell.
    EffectStarted {
        /// Kind of effect.
        kind: EffectKind,
        /// Cell the effect is anchored to.
        cell: CellCoord,
    },
    /// An audio cue should be played.
    Sound(SoundEffect),
    /// Linked bottom-layer tiles were swapped by a button.
    TilesSwapped {
        /// First code of the swapped pair.
        first: u8,
        /// Second code of the swapped pair.
        second: u8,
    },
    /// A turn settled and was recorded.
    TurnCompleted {
        /// Turn counter after the turn.
        turns_left: i32,
        /// Whether the turn came from conveyor arrows rather than input.
        automatic: bool,
    },
    /// The player switched forms.
    Transformed {
        /// Form after the switch.
        form: Form,
    },
    /// The live state was rolled back to the previous snapshot.
    TurnUndone {
        /// Number of snapshots left in the history.
        history_len: usize,
    },
    /// The stage was reset to its initial layout.
    StageRestarted,
    /// The clear predicate became true.
    StageCleared {
        /// One-based index of the stage.
        level: usize,
    },
    /// Completion flags changed and should be persisted.
    ProgressChanged {
        /// Updated completion flags.
        completed: CompletedLevels,
    },
    /// The player toggled audio from the pause menu.
    AudioToggled,
    /// A fade-out finished; the adapter should switch scenes.
    SceneChangeRequested {
        /// Scene to activate.
        target: SceneTarget,
    },
}

/// Completion flags for the regular stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletedLevels {
    flags: [bool; NORMAL_LEVEL_COUNT],
}

impl CompletedLevels {
    /// Creates flags from an explicit array.
    #[must_use]
    pub const fn from_flags(flags: [bool; NORMAL_LEVEL_COUNT]) -> Self {
        Self { flags }
    }

    /// Whether the one-based `level` was cleared. Unknown levels report `false`.
    #[must_use]
    pub fn is_complete(&self, level: usize) -> bool {
        level
            .checked_sub(1)
            .and_then(|index| self.flags.get(index))
            .copied()
            .unwrap_or(false)
    }

    /// Marks the one-based `level` as cleared. Returns `true` if the flag changed.
    pub fn mark(&mut self, level: usize) -> bool {
        let Some(slot) = level
            .checked_sub(1)
            .and_then(|index| self.flags.get_mut(index))
        else {
            return false;
        };
        let changed = !*slot;
        *slot = true;
        changed
    }

    /// Whether every regular stage has been cleared.
    #[must_use]
    pub fn all_complete(&self) -> bool {
        self.flags.iter().all(|flag| *flag)
    }

    /// Raw flags in stage order.
    #[must_use]
    pub const fn flags(&self) -> &[bool; NORMAL_LEVEL_COUNT] {
        &self.flags
    }
}

/// Persistence collaborator for completion flags.
pub trait ProgressStore {
    /// Loads stored flags, falling back to all-incomplete on any failure.
    fn load(&self) -> CompletedLevels;

    /// Persists the flags. Failures are the store's concern.
    fn store(&mut self, completed: &CompletedLevels);
}

/// Gameplay tuning shared by the systems.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Fraction of a tile travelled per tick.
    pub move_speed: f32,
    /// Maximum number of undo snapshots.
    pub history_capacity: usize,
    /// Turn counter at the start of a regular stage.
    pub initial_turns: i32,
    /// Turn counter after eating an apple, before the move is charged.
    pub apple_turns: i32,
    /// Ticks the transformation animation blocks input.
    pub transform_ticks: f32,
    /// Ticks before the stage clear banner is fully shown.
    pub clear_text_ticks: f32,
    /// Ticks the stage clear banner stays before leaving the stage.
    pub clear_leave_ticks: f32,
    /// Fraction of a fade completed per tick.
    pub transition_speed: f32,
    /// Fraction of an arrow flicker cycle completed per tick.
    pub arrow_flicker_speed: f32,
    /// Ticks of screen shake when the bonus stage starts.
    pub final_level_shake: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            move_speed: 1.0 / 16.0,
            history_capacity: 64,
            initial_turns: 13,
            apple_turns: 14,
            transform_ticks: 24.0,
            clear_text_ticks: 30.0,
            clear_leave_ticks: 90.0,
            transition_speed: 1.0 / 20.0,
            arrow_flicker_speed: 1.0 / 60.0,
            final_level_shake: 30.0,
        }
    }
}
