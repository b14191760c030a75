#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Ghost Trail adapters.
//!
//! [`redraw`] turns a read-only view of a [`Game`] into a [`Frame`]: an
//! ordered list of backend-agnostic [`DrawCall`]s in screen pixels. Backends
//! rasterise the calls however they like; nothing here touches the
//! simulation.

pub mod ascii;

use anyhow::Result as AnyResult;
use glam::Vec2;
use ghost_trail_core::{
    tile, Direction, EffectKind, Form, Layer, ObjectKind, FINAL_LEVEL, TILE_SIZE,
};
use ghost_trail_system_movement::GameObject;
use ghost_trail_system_turns::{Game, PauseMenu, Phase};
use ghost_trail_system_wallmap::NO_TILE;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{error::Error, fmt};

const HALF_TILE: f32 = TILE_SIZE / 2.0;
const GRID_SIZE: f32 = 32.0;
const STAR_COUNT: usize = 6;
const MAX_STAR_DISTANCE: f32 = 32.0;
const COUNTER_ROLL_DISTANCE: f32 = 8.0;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with a different alpha.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Palette used by [`redraw`].
pub mod palette {
    use super::Color;

    /// Background of regular stages.
    pub const SKY: Color = Color::from_rgb_u8(0x49, 0x92, 0xdb);
    /// Checker squares over [`SKY`].
    pub const SKY_GRID: Color = Color::from_rgb_u8(0x24, 0x6d, 0xb6);
    /// Background of the final stage.
    pub const FOG: Color = Color::from_rgb_u8(0xb6, 0xb6, 0xb6);
    /// Checker squares over [`FOG`].
    pub const FOG_GRID: Color = Color::from_rgb_u8(0x92, 0x92, 0x92);
    /// Wooden frame around the board.
    pub const FRAME: Color = Color::from_rgb_u8(0x92, 0x49, 0x00);
    /// Light floor checker.
    pub const FLOOR_LIGHT: Color = Color::from_rgb_u8(0xff, 0xdb, 0x92);
    /// Dark floor checker.
    pub const FLOOR_DARK: Color = Color::from_rgb_u8(0xdb, 0xb6, 0x6d);
    /// Splash ring and other slime accents.
    pub const SLIME: Color = Color::from_rgb_u8(0x6d, 0x6d, 0xb6);
    /// Overlays and fades.
    pub const BLACK: Color = Color::from_rgb_u8(0, 0, 0);
}

/// Horizontal anchoring of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Align {
    /// Text starts at the position.
    Left,
    /// Text is centred on the position.
    Center,
}

/// Sprite identifiers understood by backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sprite {
    /// Open hole.
    Hole,
    /// Cracked floor.
    Cross,
    /// Slime puddle.
    Slime,
    /// Pink button.
    PinkButton {
        /// Pressed variant.
        pressed: bool,
    },
    /// Pink block.
    PinkBlock {
        /// Lowered variant.
        lowered: bool,
    },
    /// One of the two chevrons of an arrow tile.
    Arrow {
        /// Direction the arrow pushes toward.
        direction: Direction,
        /// Flicker frame, 0 or 1.
        frame: u8,
    },
    /// Blue toggle button.
    BlueButton {
        /// Pressed variant.
        pressed: bool,
    },
    /// Wall border quarter; the selector comes from the wall map.
    WallBorder(i8),
    /// Wall shadow quarter; the selector comes from the wall map.
    WallShadow(i8),
    /// Animation frame of a tile effect.
    Effect {
        /// Effect being played.
        kind: EffectKind,
        /// Frame index within the effect strip.
        frame: u8,
    },
    /// Drop shadow under a mobile object.
    ObjectShadow,
    /// The player character.
    Player {
        /// Current form.
        form: Form,
        /// Facing.
        direction: Direction,
        /// Whether the player is mid-hop.
        jumping: bool,
    },
    /// A rock.
    Rock,
    /// A coin.
    Coin,
    /// An apple.
    Apple,
    /// Sparkle orbiting the player while transforming.
    TransformStar {
        /// Frame index, 0..3.
        frame: u8,
    },
}

/// Single backend-agnostic drawing instruction in screen pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    /// Fill the whole target.
    Clear(Color),
    /// Fill an axis-aligned rectangle.
    FillRect {
        /// Top-left corner.
        origin: Vec2,
        /// Width and height.
        size: Vec2,
        /// Fill color.
        color: Color,
    },
    /// Blit a sprite with its top-left corner at `position`.
    Sprite {
        /// Sprite to draw.
        sprite: Sprite,
        /// Top-left corner.
        position: Vec2,
        /// Opacity in 0.0..=1.0.
        alpha: f32,
    },
    /// Draw a line of text.
    Text {
        /// Text content.
        text: String,
        /// Anchor position.
        position: Vec2,
        /// Anchoring of `position`.
        align: Align,
        /// Opacity in 0.0..=1.0.
        alpha: f32,
    },
}

/// Ordered draw calls for one presented frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    calls: Vec<DrawCall>,
}

impl Frame {
    /// Draw calls in painter's order.
    #[must_use]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Number of draw calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether the frame draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Sprites in painter's order.
    pub fn sprites(&self) -> impl Iterator<Item = (Sprite, Vec2)> + '_ {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::Sprite {
                sprite, position, ..
            } => Some((*sprite, *position)),
            _ => None,
        })
    }

    /// Text lines in painter's order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn push(&mut self, call: DrawCall) {
        self.calls.push(call);
    }

    fn fill(&mut self, origin: Vec2, size: Vec2, color: Color) {
        self.push(DrawCall::FillRect {
            origin,
            size,
            color,
        });
    }

    fn sprite(&mut self, sprite: Sprite, position: Vec2, alpha: f32) {
        self.push(DrawCall::Sprite {
            sprite,
            position,
            alpha,
        });
    }

    fn text(&mut self, text: impl Into<String>, position: Vec2, align: Align, alpha: f32) {
        self.push(DrawCall::Text {
            text: text.into(),
            position,
            align,
            alpha,
        });
    }
}

/// Screen layout and randomness used by [`redraw`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    screen: Vec2,
    shake_seed: u64,
}

impl RenderConfig {
    /// Default virtual screen size in pixels.
    pub const DEFAULT_SCREEN: Vec2 = Vec2::new(256.0, 192.0);

    /// Creates a configuration for a virtual screen.
    ///
    /// Returns an error when either screen dimension is not positive.
    pub fn new(screen: Vec2, shake_seed: u64) -> Result<Self, RenderingError> {
        if !(screen.x > 0.0 && screen.y > 0.0) {
            return Err(RenderingError::InvalidScreenSize {
                width: screen.x,
                height: screen.y,
            });
        }
        Ok(Self { screen, shake_seed })
    }

    /// Virtual screen size in pixels.
    #[must_use]
    pub const fn screen(&self) -> Vec2 {
        self.screen
    }

    /// Seed mixed into the screen shake generator.
    #[must_use]
    pub const fn shake_seed(&self) -> u64 {
        self.shake_seed
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            screen: Self::DEFAULT_SCREEN,
            shake_seed: 0,
        }
    }
}

/// Rendering backend capable of presenting Ghost Trail frames.
pub trait RenderingBackend {
    /// Presents one frame.
    fn present(&mut self, frame: &Frame) -> AnyResult<()>;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The virtual screen must have a positive area.
    InvalidScreenSize {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidScreenSize { width, height } => {
                write!(f, "screen size must be positive (received {width}x{height})")
            }
        }
    }
}

impl Error for RenderingError {}

/// Builds the draw calls for the current state of the stage scene.
#[must_use]
pub fn redraw(game: &Game, config: &RenderConfig) -> Frame {
    let mut frame = Frame::default();
    let screen = config.screen();

    draw_background(&mut frame, game, screen);

    let board = Vec2::new(
        game.tilemap().width() as f32,
        game.tilemap().height() as f32,
    ) * TILE_SIZE;
    let mut origin = (screen * 0.5 - board * 0.5).floor();
    origin += shake_offset(game, config);

    draw_frame(&mut frame, origin, board);
    draw_bottom_layer(&mut frame, game, origin);
    draw_wall_map(&mut frame, game, origin);
    draw_effect(&mut frame, game, origin);
    draw_objects(&mut frame, game, origin);
    draw_transformation(&mut frame, game, origin);
    draw_hud(&mut frame, game, screen);

    if game.phase() == Phase::Paused {
        draw_pause_menu(&mut frame, game.pause_menu(), game.audio_enabled(), screen);
    }
    if game.leave() {
        draw_stage_clear(&mut frame, game, screen);
    }
    if matches!(game.phase(), Phase::FadingIn | Phase::FadingOut(_)) {
        let alpha = match game.phase() {
            Phase::FadingOut(_) => 1.0 - game.transition_timer(),
            _ => game.transition_timer(),
        };
        frame.fill(Vec2::ZERO, screen, palette::BLACK.with_alpha(alpha));
    }
    frame
}

fn shake_offset(game: &Game, config: &RenderConfig) -> Vec2 {
    if game.shake_timer() <= 0.0 {
        return Vec2::ZERO;
    }
    let seed = config
        .shake_seed()
        .wrapping_add(u64::from(game.shake_timer().to_bits()));
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Vec2::new(
        rng.gen_range(-2i32..=2) as f32,
        rng.gen_range(-2i32..=2) as f32,
    )
}

fn draw_background(frame: &mut Frame, game: &Game, screen: Vec2) {
    let (sky, grid) = if game.level() == FINAL_LEVEL {
        (palette::FOG, palette::FOG_GRID)
    } else {
        (palette::SKY, palette::SKY_GRID)
    };
    frame.push(DrawCall::Clear(sky));

    let loop_x = ((screen.x / GRID_SIZE + 1.0) / 2.0) as i32 + 1;
    let loop_y = ((screen.y / GRID_SIZE + 1.0) / 2.0) as i32 + 1;
    let center = screen * 0.5;
    let scroll = game.grid_timer();
    for y in (-loop_y - 1)..=loop_y {
        for x in (-loop_x - 1)..=loop_x {
            if (y + loop_y * 2).rem_euclid(2) == (x + loop_x * 2).rem_euclid(2) {
                continue;
            }
            let origin = Vec2::new(
                center.x - x as f32 * GRID_SIZE - scroll,
                center.y - y as f32 * GRID_SIZE + scroll,
            );
            frame.fill(origin, Vec2::splat(GRID_SIZE), grid);
        }
    }
}

fn draw_frame(frame: &mut Frame, origin: Vec2, board: Vec2) {
    frame.fill(
        origin - Vec2::splat(2.0),
        board + Vec2::splat(4.0),
        palette::FRAME,
    );
    frame.fill(
        origin + Vec2::splat(HALF_TILE),
        board - Vec2::splat(TILE_SIZE),
        palette::BLACK,
    );
}

fn draw_bottom_layer(frame: &mut Frame, game: &Game, origin: Vec2) {
    let state = game.state();
    let hidden = game.effect().map(|effect| effect.cell);
    let arrow_frame = u8::from(game.arrow_timer() >= 0.5);

    for y in 1..(state.height() as i32 - 1) {
        for x in 1..(state.width() as i32 - 1) {
            let position = origin + Vec2::new(x as f32, y as f32) * TILE_SIZE;
            let floor = if x % 2 == y % 2 {
                palette::FLOOR_LIGHT
            } else {
                palette::FLOOR_DARK
            };
            frame.fill(position, Vec2::splat(TILE_SIZE), floor);

            if hidden.is_some_and(|cell| cell.column() == x && cell.row() == y) {
                continue;
            }
            let code = state.tile(Layer::Bottom, x, y);
            if let Some(direction) = tile::arrow_direction(code) {
                draw_arrow(frame, position, direction, arrow_frame);
                continue;
            }
            let (sprite, offset) = match code {
                tile::HOLE => (Sprite::Hole, Vec2::ZERO),
                tile::CROSS => (Sprite::Cross, Vec2::splat(4.0)),
                tile::SLIME => (Sprite::Slime, Vec2::ZERO),
                tile::PINK_BUTTON | tile::PINK_BUTTON_PRESSED => (
                    Sprite::PinkButton {
                        pressed: code == tile::PINK_BUTTON_PRESSED,
                    },
                    Vec2::ZERO,
                ),
                tile::PINK_BLOCK | tile::PINK_BLOCK_LOWERED => (
                    Sprite::PinkBlock {
                        lowered: code == tile::PINK_BLOCK_LOWERED,
                    },
                    Vec2::ZERO,
                ),
                tile::BLUE_BUTTON | tile::BLUE_BUTTON_PRESSED => (
                    Sprite::BlueButton {
                        pressed: code == tile::BLUE_BUTTON_PRESSED,
                    },
                    Vec2::ZERO,
                ),
                _ => continue,
            };
            frame.sprite(sprite, position + offset, 1.0);
        }
    }
}

/// Two chevrons per arrow tile, alternating frames to suggest motion.
fn draw_arrow(frame: &mut Frame, position: Vec2, direction: Direction, flicker: u8) {
    let (dx, dy) = direction.delta();
    let step = Vec2::new(dx as f32, dy as f32) * HALF_TILE;
    let start = position + Vec2::splat(HALF_TILE) - step * 0.5 - Vec2::splat(HALF_TILE / 2.0);
    for index in 0..2u8 {
        frame.sprite(
            Sprite::Arrow {
                direction,
                frame: (index + flicker) % 2,
            },
            start + step * f32::from(index),
            1.0,
        );
    }
}

fn draw_wall_map(frame: &mut Frame, game: &Game, origin: Vec2) {
    let walls = game.wall_map();
    for y in 0..walls.height() as i32 {
        for x in 0..walls.width() as i32 {
            let position = origin + Vec2::new(x as f32, y as f32) * HALF_TILE;
            let shadow = walls.shadow(x, y);
            if shadow != NO_TILE {
                frame.sprite(Sprite::WallShadow(shadow), position, 0.5);
            }
            let border = walls.border(x, y);
            if border != NO_TILE {
                frame.sprite(Sprite::WallBorder(border), position, 1.0);
            }
        }
    }
}

fn draw_effect(frame: &mut Frame, game: &Game, origin: Vec2) {
    let Some(effect) = game.effect() else {
        return;
    };
    let cell = origin + Vec2::new(effect.cell.column() as f32, effect.cell.row() as f32) * TILE_SIZE;
    let elapsed = (1.0 - effect.timer).clamp(0.0, 1.0);

    match effect.kind {
        EffectKind::SpreadingHole => {
            let index = ((elapsed * 3.0) as u8).min(2);
            frame.sprite(
                Sprite::Effect {
                    kind: effect.kind,
                    frame: index,
                },
                cell + Vec2::splat(4.0),
                1.0,
            );
        }
        EffectKind::ShrinkingHole => {
            let index = ((effect.timer * 3.0).ceil() as u8).clamp(1, 3);
            let inset = if index == 3 { 0.0 } else { 4.0 };
            frame.sprite(
                Sprite::Effect {
                    kind: effect.kind,
                    frame: index,
                },
                cell + Vec2::splat(inset),
                1.0,
            );
        }
        EffectKind::EmergingSlime => {
            let index = ((elapsed * 3.0) as u8).min(2);
            if index > 0 {
                frame.sprite(
                    Sprite::Effect {
                        kind: effect.kind,
                        frame: index,
                    },
                    cell + Vec2::splat(4.0),
                    1.0,
                );
            }
        }
        EffectKind::SplashingSlime => {
            if elapsed <= 0.5 {
                let radius = elapsed * 2.0 * HALF_TILE;
                frame.fill(
                    cell + Vec2::splat(HALF_TILE - radius),
                    Vec2::splat(radius * 2.0),
                    palette::SLIME.with_alpha(1.0 - elapsed * 2.0),
                );
            }
        }
    }
}

fn draw_objects(frame: &mut Frame, game: &Game, origin: Vec2) {
    let mut visible: Vec<&GameObject> = game
        .objects()
        .iter()
        .filter(|object| object.is_active() || object.death_timer() > 0.0)
        .collect();
    visible.sort_by(|a, b| a.render_position()[1].total_cmp(&b.render_position()[1]));

    for object in &visible {
        if object.is_active() && object.kind().layer() == Layer::Top {
            let [x, y] = object.render_position();
            frame.sprite(Sprite::ObjectShadow, origin + Vec2::new(x, y + 2.0), 0.25);
        }
    }

    let form = Form::from_turns(game.state().turns_left());
    for object in visible {
        let [x, y] = object.render_position();
        let mut position = origin + Vec2::new(x, y);
        let sprite = match object.kind() {
            ObjectKind::Player => {
                if object.is_jumping() {
                    let t = object.move_timer();
                    position.y -= (t * std::f32::consts::PI).sin() * 6.0;
                }
                Sprite::Player {
                    form,
                    direction: object.direction(),
                    jumping: object.is_jumping(),
                }
            }
            ObjectKind::Rock => Sprite::Rock,
            ObjectKind::Coin => Sprite::Coin,
            ObjectKind::Apple => Sprite::Apple,
        };
        let alpha = if object.is_active() {
            1.0
        } else {
            position.y -= (1.0 - object.death_timer()) * HALF_TILE;
            object.death_timer()
        };
        frame.sprite(sprite, position, alpha);
    }
}

fn draw_transformation(frame: &mut Frame, game: &Game, origin: Vec2) {
    let timer = game.transform_timer();
    if timer <= 0.0 {
        return;
    }
    let Some(player) = game.player() else {
        return;
    };

    let t = 1.0 - timer / game.rules().transform_ticks;
    let distance = MAX_STAR_DISTANCE * t;
    let star_frame = ((timer / 2.0) as u8) % 3;
    let [x, y] = player.render_position();
    let center = origin + Vec2::new(x, y) + Vec2::splat(HALF_TILE);
    let angle_step = std::f32::consts::TAU / STAR_COUNT as f32;

    for index in 0..STAR_COUNT {
        let angle = angle_step * (index as f32 + 0.5);
        let position = center + Vec2::from_angle(angle) * distance - Vec2::splat(4.0);
        frame.sprite(Sprite::TransformStar { frame: star_frame }, position, 1.0);
    }
}

fn draw_hud(frame: &mut Frame, game: &Game, screen: Vec2) {
    let label = if game.level() == FINAL_LEVEL {
        "NIGHTMARE".to_owned()
    } else {
        format!("STAGE {}", game.level())
    };
    frame.text(label, Vec2::new(screen.x / 2.0, screen.y - 19.0), Align::Center, 1.0);

    if ((game.transform_timer() / 4.0) as i32) % 2 != 0 {
        return;
    }

    let anchor = Vec2::new(screen.x / 2.0 + 4.0, 2.0);
    let turns = game.state().turns_left();
    if turns <= 0 {
        frame.text("SPOOKY!", anchor, Align::Center, 1.0);
        return;
    }
    frame.text("#", anchor - Vec2::new(22.0, 0.0), Align::Left, 1.0);

    let rolling = game.animation_timer() > 0.0
        && game
            .player()
            .is_some_and(|player| player.is_moving() && !player.is_automatically_moving());
    if !rolling {
        frame.text(turns.to_string(), anchor, Align::Center, 1.0);
        return;
    }

    let timer = game.animation_timer();
    let t = 1.0 - timer;
    frame.text(
        turns.to_string(),
        anchor + Vec2::new(0.0, t * COUNTER_ROLL_DISTANCE),
        Align::Center,
        timer,
    );
    frame.text(
        (turns - 1).to_string(),
        anchor - Vec2::new(0.0, timer * COUNTER_ROLL_DISTANCE),
        Align::Center,
        t,
    );
}

fn draw_pause_menu(frame: &mut Frame, menu: &PauseMenu, audio_enabled: bool, screen: Vec2) {
    const LINE_HEIGHT: f32 = 12.0;

    frame.fill(Vec2::ZERO, screen, palette::BLACK.with_alpha(0.5));
    let top = screen.y / 2.0 - LINE_HEIGHT * PauseMenu::ENTRIES.len() as f32 / 2.0;
    for (index, entry) in PauseMenu::ENTRIES.iter().enumerate() {
        let label = entry.label(audio_enabled);
        let text = if index == menu.cursor() {
            format!("> {label}")
        } else {
            label.to_owned()
        };
        let alpha = if index == menu.cursor() { 1.0 } else { 0.75 };
        frame.text(
            text,
            Vec2::new(screen.x / 2.0, top + index as f32 * LINE_HEIGHT),
            Align::Center,
            alpha,
        );
    }
}

fn draw_stage_clear(frame: &mut Frame, game: &Game, screen: Vec2) {
    frame.fill(Vec2::ZERO, screen, palette::BLACK.with_alpha(0.5));
    let appear = game.rules().clear_text_ticks.max(1.0);
    let alpha = (game.clear_timer() / appear).min(1.0);
    frame.text("STAGE CLEAR", screen * 0.5, Align::Center, alpha);
}
