#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn controller that drives a Ghost Trail stage frame by frame.
//!
//! [`Game`] owns the live [`PuzzleState`], the object list and the undo
//! history. Each update runs the control passes to a fixed point, advances
//! interpolation, and finalises the turn once every object has settled:
//! triggers are resolved, the turn counter is charged, a snapshot is recorded
//! and the clear predicate is evaluated. Everything the presentation layer
//! needs is exposed through read-only accessors and [`Event`] values.

mod history;
mod menu;

use std::collections::{HashMap, VecDeque};

use ghost_trail_core::{
    Action, CellCoord, CompletedLevels, EffectKind, Event, Form, InputSnapshot, Layer,
    ObjectKind, Rules, SceneTarget, SoundEffect, FINAL_LEVEL,
};
use ghost_trail_system_movement::GameObject;
use ghost_trail_system_wallmap::WallMap;
use ghost_trail_world::{load_level, LevelError, PuzzleState, Tilemap};

pub use history::History;
pub use menu::{MenuEntry, PauseMenu};

/// Length of one simulation step.
pub const TICK: f32 = 1.0;

const GRID_SCROLL_SPEED: f32 = 0.5;
const GRID_PERIOD: f32 = 32.0;

/// Coarse state of the stage scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Fade-in after the stage loaded; input is ignored.
    FadingIn,
    /// Regular play.
    Playing,
    /// Pause menu overlay.
    Paused,
    /// Clear banner; objects finish animating.
    StageCleared,
    /// Fade-out toward another scene.
    FadingOut(SceneTarget),
    /// Fade-out completed and the scene change was requested.
    Finished,
}

/// Tile animation currently playing on the board.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveEffect {
    /// Kind of effect.
    pub kind: EffectKind,
    /// Anchor cell.
    pub cell: CellCoord,
    /// Remaining fraction, counting down from 1.
    pub timer: f32,
}

/// Stage scene: puzzle state, mobile objects, history and presentation timers.
#[derive(Debug)]
pub struct Game {
    rules: Rules,
    level: usize,
    tilemap: Tilemap,
    wall_map: WallMap,
    active: PuzzleState,
    history: History,
    objects: Vec<GameObject>,
    player: Option<usize>,
    phase: Phase,
    pause_menu: PauseMenu,
    completed: CompletedLevels,
    audio_enabled: bool,
    moving: bool,
    effect: Option<ActiveEffect>,
    transform_timer: f32,
    animation_timer: f32,
    arrow_timer: f32,
    grid_timer: f32,
    shake_timer: f32,
    transition_timer: f32,
    clear_timer: f32,
    stage_cleared: bool,
    bonus_unlocked: bool,
}

impl Game {
    /// Loads a level from the built-in catalogue and starts fading it in.
    pub fn start(
        level: usize,
        rules: Rules,
        completed: CompletedLevels,
        out: &mut Vec<Event>,
    ) -> Result<Self, LevelError> {
        let tilemap = load_level(level)?;
        Ok(Self::from_tilemap(level, tilemap, rules, completed, out))
    }

    /// Starts a stage from an already decoded tilemap.
    #[must_use]
    pub fn from_tilemap(
        level: usize,
        tilemap: Tilemap,
        rules: Rules,
        completed: CompletedLevels,
        out: &mut Vec<Event>,
    ) -> Self {
        let active = PuzzleState::new(&tilemap, initial_turns(&rules, level));
        let mut game = Self {
            wall_map: WallMap::generate(&tilemap),
            history: History::new(active.clone(), rules.history_capacity),
            active,
            tilemap,
            rules,
            level,
            objects: Vec::new(),
            player: None,
            phase: Phase::FadingIn,
            pause_menu: PauseMenu::default(),
            completed,
            audio_enabled: true,
            moving: false,
            effect: None,
            transform_timer: 0.0,
            animation_timer: 0.0,
            arrow_timer: 0.0,
            grid_timer: 0.0,
            shake_timer: 0.0,
            transition_timer: 1.0,
            clear_timer: 0.0,
            stage_cleared: false,
            bonus_unlocked: false,
        };
        game.enter_stage(out);
        game
    }

    /// Replaces the current stage with another catalogue level.
    pub fn start_level(&mut self, level: usize, out: &mut Vec<Event>) -> Result<(), LevelError> {
        let tilemap = load_level(level)?;
        self.level = level;
        self.wall_map = WallMap::generate(&tilemap);
        self.active = PuzzleState::new(&tilemap, initial_turns(&self.rules, level));
        self.history = History::new(self.active.clone(), self.rules.history_capacity);
        self.tilemap = tilemap;
        self.enter_stage(out);
        Ok(())
    }

    fn enter_stage(&mut self, out: &mut Vec<Event>) {
        self.objects = spawn_objects(&self.active);
        self.player = self
            .objects
            .iter()
            .position(|object| object.kind() == ObjectKind::Player);
        if self.player.is_none() {
            log::warn!("level {} has no player", self.level);
        }

        self.phase = Phase::FadingIn;
        self.moving = false;
        self.effect = None;
        self.transform_timer = 0.0;
        self.animation_timer = 0.0;
        self.grid_timer = 0.0;
        self.shake_timer = if self.level == FINAL_LEVEL {
            self.rules.final_level_shake
        } else {
            0.0
        };
        self.transition_timer = 1.0;
        self.clear_timer = 0.0;
        self.stage_cleared = false;
        self.bonus_unlocked = false;

        log::debug!(
            "level {} started with {} objects",
            self.level,
            self.objects.len()
        );
        out.push(Event::LevelStarted { level: self.level });
    }

    /// Advances the scene by one tick.
    pub fn update(&mut self, input: &InputSnapshot, out: &mut Vec<Event>) {
        match self.phase {
            Phase::FadingIn => {
                self.transition_timer -= self.rules.transition_speed * TICK;
                if self.transition_timer <= 0.0 {
                    self.transition_timer = 0.0;
                    self.phase = Phase::Playing;
                }
            }
            Phase::FadingOut(target) => {
                self.transition_timer -= self.rules.transition_speed * TICK;
                if self.transition_timer <= 0.0 {
                    self.transition_timer = 0.0;
                    self.phase = Phase::Finished;
                    log::info!("leaving level {} for {target:?}", self.level);
                    out.push(Event::SceneChangeRequested { target });
                }
            }
            Phase::Finished => {}
            Phase::StageCleared => self.update_cleared(out),
            Phase::Paused => self.update_paused(input, out),
            Phase::Playing => {
                self.play(input, out);
                self.advance_timers();
            }
        }
    }

    fn update_cleared(&mut self, out: &mut Vec<Event>) {
        for object in &mut self.objects {
            object.update(&mut self.active, self.rules.move_speed, TICK);
        }

        self.clear_timer += TICK;
        if self.clear_timer < self.rules.clear_leave_ticks {
            return;
        }

        if self.level != FINAL_LEVEL && self.bonus_unlocked {
            out.push(Event::Sound(SoundEffect::FinalStageTransition));
            log::info!("all regular levels complete, entering the final level");
            match self.start_level(FINAL_LEVEL, out) {
                Ok(()) => self.shake_timer = self.rules.final_level_shake,
                Err(error) => {
                    log::error!("failed to load the final level: {error}");
                    self.fade_out(SceneTarget::LevelSelect);
                }
            }
            return;
        }

        let target = if self.level == FINAL_LEVEL {
            SceneTarget::Ending
        } else {
            SceneTarget::LevelSelect
        };
        self.fade_out(target);
    }

    fn update_paused(&mut self, input: &InputSnapshot, out: &mut Vec<Event>) {
        let Some(entry) = self.pause_menu.update(input, out) else {
            return;
        };
        match entry {
            MenuEntry::Resume => self.phase = Phase::Playing,
            MenuEntry::Undo => {
                self.undo(out);
                self.phase = Phase::Playing;
            }
            MenuEntry::Restart => {
                self.restart(out);
                self.phase = Phase::Playing;
            }
            MenuEntry::Audio => {
                self.audio_enabled = !self.audio_enabled;
                out.push(Event::AudioToggled);
            }
            MenuEntry::Quit => self.fade_out(SceneTarget::LevelSelect),
        }
    }

    fn play(&mut self, input: &InputSnapshot, out: &mut Vec<Event>) {
        if input.is_pressed(Action::Pause) {
            out.push(Event::Sound(SoundEffect::Pause));
            self.pause_menu.open();
            self.phase = Phase::Paused;
            return;
        }
        if input.is_pressed(Action::Undo) {
            out.push(Event::Sound(SoundEffect::Undo));
            self.undo(out);
            return;
        }
        if input.is_pressed(Action::Restart) {
            out.push(Event::Sound(SoundEffect::Restart));
            self.restart(out);
        }

        let was_player_moving = self.player_object().is_some_and(GameObject::is_moving);
        let mut non_player_moved = false;
        let blocked_by_effect = self
            .effect
            .is_some_and(|effect| effect.kind.is_blocking());

        if self.transform_timer <= 0.0 && !blocked_by_effect {
            let first_new = out.len();
            non_player_moved = self.resolve_control(input, out);
            self.absorb_effects(first_new, out);
        }

        if let Some(player) = self.player_object() {
            if !was_player_moving
                && player.is_moving()
                && !player.is_jumping()
                && !non_player_moved
                && self.active.turns_left() > 0
            {
                out.push(Event::Sound(SoundEffect::Walk));
            }
        }

        let was_moving = self.moving;
        self.moving = false;
        for object in &mut self.objects {
            object.update(&mut self.active, self.rules.move_speed, TICK);
            self.moving |= object.is_moving();
        }

        if was_moving && !self.moving {
            self.finish_turn(was_player_moving, out);
        }
    }

    /// Runs control passes until no object starts moving.
    ///
    /// Returns whether any non-player object started moving.
    fn resolve_control(&mut self, input: &InputSnapshot, out: &mut Vec<Event>) -> bool {
        let mut non_player_moved = false;
        let max_passes = self.objects.len() + 1;

        for _ in 0..max_passes {
            let mut any_moved = false;
            for object in &mut self.objects {
                if object.control(&mut self.active, input, false, out) {
                    any_moved = true;
                    non_player_moved |= object.kind() != ObjectKind::Player;
                }
            }
            if !any_moved {
                return non_player_moved;
            }
            self.animation_timer = 1.0;
        }

        log::warn!("control resolution hit the {max_passes} pass limit");
        non_player_moved
    }

    fn finish_turn(&mut self, was_player_moving: bool, out: &mut Vec<Event>) {
        self.animation_timer = 0.0;
        let turns_before = self.active.turns_left();

        self.check_underlying_tiles(out);

        let automatic = self
            .player_object()
            .is_some_and(GameObject::is_automatically_moving);
        let charged_from = self.active.turns_left();
        if was_player_moving && !automatic {
            self.active.set_turns_left((charged_from - 1).max(0));
        }
        let turns_left = self.active.turns_left();

        if charged_from == 1 && turns_left == 0 {
            self.transform_timer = self.rules.transform_ticks;
            out.push(Event::Sound(SoundEffect::Transform));
            out.push(Event::Transformed { form: Form::Ghost });
        }
        if charged_from > 0 && turns_left == 0 {
            self.check_underlying_tiles(out);
        }

        if !automatic {
            self.history.push(&self.active);
        }

        if turns_before <= 0 && self.active.turns_left() > 0 {
            self.transform_timer = self.rules.transform_ticks;
            out.push(Event::Sound(SoundEffect::Transform));
            out.push(Event::Transformed { form: Form::Human });
        }

        log::debug!(
            "turn finished: {} turns left, automatic: {automatic}, history: {}",
            self.active.turns_left(),
            self.history.len()
        );
        out.push(Event::TurnCompleted {
            turns_left: self.active.turns_left(),
            automatic,
        });

        if self.active.is_stage_clear() {
            self.clear_stage(out);
        }
    }

    fn clear_stage(&mut self, out: &mut Vec<Event>) {
        self.stage_cleared = true;
        self.phase = Phase::StageCleared;
        self.clear_timer = 0.0;
        out.push(Event::Sound(SoundEffect::StageClear));
        out.push(Event::StageCleared { level: self.level });
        log::info!("level {} cleared", self.level);

        let all_before = self.completed.all_complete();
        if self.completed.mark(self.level) {
            out.push(Event::ProgressChanged {
                completed: self.completed,
            });
        }
        self.bonus_unlocked = !all_before && self.completed.all_complete();
    }

    /// Resolves triggers, rescanning every object when a collectable vanished.
    fn check_underlying_tiles(&mut self, out: &mut Vec<Event>) {
        let first_new = out.len();
        let mut recheck = false;
        for object in &mut self.objects {
            recheck |= object.check_underlying_tiles(&mut self.active, &self.rules, out);
        }
        if recheck {
            for object in &mut self.objects {
                let _ = object.check_underlying_tiles(&mut self.active, &self.rules, out);
            }
        }
        self.absorb_effects(first_new, out);
    }

    fn absorb_effects(&mut self, first_new: usize, out: &[Event]) {
        for event in out.iter().skip(first_new) {
            if let Event::EffectStarted { kind, cell } = event {
                self.effect = Some(ActiveEffect {
                    kind: *kind,
                    cell: *cell,
                    timer: 1.0,
                });
            }
        }
    }

    fn advance_timers(&mut self) {
        let step = self.rules.move_speed * TICK;
        if let Some(effect) = &mut self.effect {
            effect.timer -= step;
            if effect.timer <= 0.0 {
                self.effect = None;
            }
        }
        self.transform_timer = (self.transform_timer - TICK).max(0.0);
        self.animation_timer = (self.animation_timer - step).max(0.0);
        self.arrow_timer = (self.arrow_timer + self.rules.arrow_flicker_speed * TICK) % 1.0;
        if self.level == FINAL_LEVEL {
            self.grid_timer = (self.grid_timer + GRID_SCROLL_SPEED * TICK) % GRID_PERIOD;
        }
        self.shake_timer = (self.shake_timer - TICK).max(0.0);
    }

    /// Rolls the live state back to the previous snapshot.
    ///
    /// Ignored while only the initial snapshot remains.
    pub fn undo(&mut self, out: &mut Vec<Event>) {
        if !self.history.undo_into(&mut self.active) {
            log::debug!("nothing to undo");
            return;
        }
        self.reset_objects();
        log::debug!("undo, {} snapshots left", self.history.len());
        out.push(Event::TurnUndone {
            history_len: self.history.len(),
        });
    }

    /// Resets the stage to its initial layout. The reset itself can be undone.
    pub fn restart(&mut self, out: &mut Vec<Event>) {
        self.active = PuzzleState::new(&self.tilemap, initial_turns(&self.rules, self.level));
        self.reset_objects();
        self.history.push(&self.active);
        log::debug!("level {} restarted", self.level);
        out.push(Event::StageRestarted);
    }

    /// Re-derives every object from the live state in one raster pass.
    ///
    /// Objects are matched by `(layer, kind)`; the first free object in list
    /// order wins. Objects without a matching cell stay inactive.
    fn reset_objects(&mut self) {
        self.moving = false;
        self.effect = None;
        self.transform_timer = 0.0;
        self.animation_timer = 0.0;

        let mut free: HashMap<(Layer, ObjectKind), VecDeque<usize>> = HashMap::new();
        for (index, object) in self.objects.iter_mut().enumerate() {
            object.deactivate();
            free.entry((object.kind().layer(), object.kind()))
                .or_default()
                .push_back(index);
        }

        let objects = &mut self.objects;
        let active = &self.active;
        active.iterate(|bottom, top, x, y| {
            for (layer, code) in [(Layer::Bottom, bottom), (Layer::Top, top)] {
                let Some(kind) = ObjectKind::from_code(layer, code) else {
                    continue;
                };
                let claimed = free
                    .get_mut(&(layer, kind))
                    .and_then(VecDeque::pop_front)
                    .and_then(|index| objects.get_mut(index));
                if let Some(object) = claimed {
                    object.set_position(CellCoord::new(x, y), active.direction(layer, x, y));
                }
            }
        });
    }

    fn fade_out(&mut self, target: SceneTarget) {
        self.transition_timer = 1.0;
        self.phase = Phase::FadingOut(target);
    }

    /// Whether the stage was cleared; queried when the scene is left.
    #[must_use]
    pub const fn leave(&self) -> bool {
        self.stage_cleared
    }

    fn player_object(&self) -> Option<&GameObject> {
        self.player.and_then(|index| self.objects.get(index))
    }

    /// One-based index of the running level.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Current scene phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Live puzzle state.
    #[must_use]
    pub const fn state(&self) -> &PuzzleState {
        &self.active
    }

    /// Tilemap the stage was built from.
    #[must_use]
    pub const fn tilemap(&self) -> &Tilemap {
        &self.tilemap
    }

    /// Derived wall borders and shadows.
    #[must_use]
    pub const fn wall_map(&self) -> &WallMap {
        &self.wall_map
    }

    /// Every object, including inactive ones still playing a vanish animation.
    #[must_use]
    pub fn objects(&self) -> &[GameObject] {
        &self.objects
    }

    /// The player object, if the level has one.
    #[must_use]
    pub fn player(&self) -> Option<&GameObject> {
        self.player_object()
    }

    /// Undo history.
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Pause menu cursor.
    #[must_use]
    pub const fn pause_menu(&self) -> &PauseMenu {
        &self.pause_menu
    }

    /// Completion flags, including any clear made in this scene.
    #[must_use]
    pub const fn completed(&self) -> &CompletedLevels {
        &self.completed
    }

    /// Gameplay tuning in effect.
    #[must_use]
    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Whether the audio toggle is on.
    #[must_use]
    pub const fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    /// Whether any object is between cells.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.moving
    }

    /// Tile animation in progress, if any.
    #[must_use]
    pub const fn effect(&self) -> Option<&ActiveEffect> {
        self.effect.as_ref()
    }

    /// Remaining ticks of the transformation animation.
    #[must_use]
    pub const fn transform_timer(&self) -> f32 {
        self.transform_timer
    }

    /// Turn counter roll animation, counting down from 1.
    #[must_use]
    pub const fn animation_timer(&self) -> f32 {
        self.animation_timer
    }

    /// Arrow flicker phase in `[0, 1)`.
    #[must_use]
    pub const fn arrow_timer(&self) -> f32 {
        self.arrow_timer
    }

    /// Background scroll offset on the final level.
    #[must_use]
    pub const fn grid_timer(&self) -> f32 {
        self.grid_timer
    }

    /// Remaining ticks of screen shake.
    #[must_use]
    pub const fn shake_timer(&self) -> f32 {
        self.shake_timer
    }

    /// Fade progress, 1 when fully covered.
    #[must_use]
    pub const fn transition_timer(&self) -> f32 {
        self.transition_timer
    }

    /// Ticks spent on the clear banner.
    #[must_use]
    pub const fn clear_timer(&self) -> f32 {
        self.clear_timer
    }
}

fn initial_turns(rules: &Rules, level: usize) -> i32 {
    if level == FINAL_LEVEL {
        0
    } else {
        rules.initial_turns
    }
}

fn spawn_objects(state: &PuzzleState) -> Vec<GameObject> {
    let mut objects = Vec::new();
    state.iterate(|bottom, top, x, y| {
        for (layer, code) in [(Layer::Bottom, bottom), (Layer::Top, top)] {
            if let Some(kind) = ObjectKind::from_code(layer, code) {
                objects.push(GameObject::new(kind, CellCoord::new(x, y)));
            }
        }
    });
    objects
}
