use ghost_trail_core::{
    tile, Action, CellCoord, CompletedLevels, Direction, Event, Form, InputSnapshot, InputState,
    Layer, Rules, SceneTarget, SoundEffect, FINAL_LEVEL, NORMAL_LEVEL_COUNT,
};
use ghost_trail_system_movement::GameObject;
use ghost_trail_system_turns::{Game, MenuEntry, Phase};
use ghost_trail_world::{query, Tilemap};
use proptest::prelude::*;

/// Open 4x3 room with a rock and a coin walled off in the corner.
const SEALED_COIN: &str = "43200003010017";

fn start(packed: &str, rules: Rules, completed: CompletedLevels) -> Game {
    let mut events = Vec::new();
    let tilemap = Tilemap::decode(packed).expect("decode");
    let mut game = Game::from_tilemap(1, tilemap, rules, completed, &mut events);
    while game.phase() == Phase::FadingIn {
        game.update(&InputSnapshot::new(), &mut events);
    }
    game
}

fn with_turns(initial_turns: i32) -> Rules {
    Rules {
        initial_turns,
        ..Rules::default()
    }
}

fn held(action: Action) -> InputSnapshot {
    InputSnapshot::new().with(action, InputState::Down)
}

fn pressed(action: Action) -> InputSnapshot {
    InputSnapshot::new().with(action, InputState::Pressed)
}

/// Feeds one frame of `input`, then idles until every object has settled.
fn play(game: &mut Game, input: &InputSnapshot, events: &mut Vec<Event>) {
    game.update(input, events);
    while game.is_moving() {
        game.update(&InputSnapshot::new(), events);
    }
}

fn player_position(game: &Game) -> Option<CellCoord> {
    game.player().map(GameObject::position)
}

#[test]
fn single_step_settles_after_sixteen_ticks() {
    let mut game = start("33200000000", Rules::default(), CompletedLevels::default());
    let mut events = Vec::new();

    game.update(&held(Action::Right), &mut events);
    assert!(events.contains(&Event::Sound(SoundEffect::Walk)));
    for _ in 0..14 {
        game.update(&InputSnapshot::new(), &mut events);
    }
    assert!(game.player().is_some_and(GameObject::is_moving));

    game.update(&InputSnapshot::new(), &mut events);
    assert!(!game.is_moving());
    assert_eq!(player_position(&game), Some(CellCoord::new(2, 1)));
    assert_eq!(game.state().tile(Layer::Top, 2, 1), tile::PLAYER);
    assert_eq!(game.history().len(), 2);
    assert_eq!(game.state().turns_left(), 12);
    assert!(events.contains(&Event::TurnCompleted {
        turns_left: 12,
        automatic: false,
    }));
    // a board without coins is clear as soon as a turn settles
    assert_eq!(game.phase(), Phase::StageCleared);
}

#[test]
fn blocked_moves_do_not_record_history() {
    let mut game = start(SEALED_COIN, Rules::default(), CompletedLevels::default());
    let mut events = Vec::new();

    play(&mut game, &held(Action::Up), &mut events);
    assert_eq!(game.history().len(), 1);
    assert_eq!(game.state().turns_left(), 13);
    assert_eq!(game.state().direction(Layer::Top, 1, 1), Direction::Up);
}

#[test]
fn history_is_bounded_by_capacity() {
    let rules = Rules {
        history_capacity: 4,
        ..Rules::default()
    };
    let mut game = start(SEALED_COIN, rules, CompletedLevels::default());
    let mut events = Vec::new();

    for step in 0..10 {
        let action = if step % 2 == 0 {
            Action::Right
        } else {
            Action::Left
        };
        play(&mut game, &held(action), &mut events);
    }
    assert_eq!(game.history().len(), 4);

    events.clear();
    for _ in 0..4 {
        game.undo(&mut events);
    }
    let undone = events
        .iter()
        .filter(|event| matches!(event, Event::TurnUndone { .. }))
        .count();
    assert_eq!(undone, 3);
    assert_eq!(game.history().len(), 1);
}

#[test]
fn last_turn_transforms_into_ghost() {
    let mut game = start("32200107", with_turns(1), CompletedLevels::default());
    let mut events = Vec::new();

    play(&mut game, &held(Action::Right), &mut events);
    assert_eq!(game.state().turns_left(), 0);
    assert!(events.contains(&Event::Transformed { form: Form::Ghost }));
    assert!(events.contains(&Event::Sound(SoundEffect::Transform)));
    assert_eq!(
        game.transform_timer(),
        Rules::default().transform_ticks - 1.0
    );

    game.update(&held(Action::Left), &mut events);
    assert!(!game.is_moving(), "input is ignored while transforming");
}

#[test]
fn apple_turns_the_ghost_human_again() {
    let mut game = start("32280107", with_turns(0), CompletedLevels::default());
    let mut events = Vec::new();

    play(&mut game, &held(Action::Right), &mut events);

    assert_eq!(game.state().turns_left(), Rules::default().apple_turns - 1);
    assert_eq!(game.state().tile(Layer::Bottom, 2, 1), tile::EMPTY);
    assert_eq!(game.state().tile(Layer::Bottom, 1, 1), tile::SLIME);
    assert!(events.contains(&Event::Transformed { form: Form::Human }));

    let apple = game
        .objects()
        .iter()
        .find(|object| object.kind() == ghost_trail_core::ObjectKind::Apple)
        .expect("apple");
    assert!(!apple.is_active());
    assert_eq!(apple.death_timer(), 1.0);
}

#[test]
fn arrow_moves_are_free_and_not_recorded() {
    let mut game = start("422d001117", Rules::default(), CompletedLevels::default());
    let mut events = Vec::new();

    play(&mut game, &held(Action::Right), &mut events);
    assert_eq!(player_position(&game), Some(CellCoord::new(2, 1)));
    assert_eq!(game.state().turns_left(), 12);
    assert_eq!(game.history().len(), 2);

    play(&mut game, &InputSnapshot::new(), &mut events);
    assert_eq!(player_position(&game), Some(CellCoord::new(3, 1)));
    assert_eq!(game.state().turns_left(), 12);
    assert_eq!(game.history().len(), 2);
    assert!(events.contains(&Event::TurnCompleted {
        turns_left: 12,
        automatic: true,
    }));
}

#[test]
fn collecting_the_last_coin_clears_and_leaves() {
    let mut game = start("31270", with_turns(0), CompletedLevels::default());
    let mut events = Vec::new();

    play(&mut game, &held(Action::Right), &mut events);
    assert_eq!(game.phase(), Phase::StageCleared);
    assert!(game.leave());
    assert!(events.contains(&Event::StageCleared { level: 1 }));
    assert!(events.contains(&Event::Sound(SoundEffect::StageClear)));

    let mut expected = CompletedLevels::default();
    let _ = expected.mark(1);
    assert!(events.contains(&Event::ProgressChanged {
        completed: expected
    }));

    events.clear();
    for _ in 0..200 {
        game.update(&InputSnapshot::new(), &mut events);
    }
    assert_eq!(game.phase(), Phase::Finished);
    assert_eq!(
        events.last(),
        Some(&Event::SceneChangeRequested {
            target: SceneTarget::LevelSelect
        })
    );
}

#[test]
fn clearing_the_last_regular_level_opens_the_final_one() {
    let mut flags = [true; NORMAL_LEVEL_COUNT];
    flags[0] = false;
    let mut game = start("31270", with_turns(0), CompletedLevels::from_flags(flags));
    let mut events = Vec::new();

    play(&mut game, &held(Action::Right), &mut events);
    assert!(game.completed().all_complete());

    events.clear();
    for _ in 0..90 {
        game.update(&InputSnapshot::new(), &mut events);
    }
    assert!(events.contains(&Event::Sound(SoundEffect::FinalStageTransition)));
    assert!(events.contains(&Event::LevelStarted { level: FINAL_LEVEL }));
    assert_eq!(game.level(), FINAL_LEVEL);
    assert_eq!(game.phase(), Phase::FadingIn);
    assert_eq!(game.state().turns_left(), 0);
}

#[test]
fn replaying_a_beaten_level_does_not_reopen_the_final_one() {
    let completed = CompletedLevels::from_flags([true; NORMAL_LEVEL_COUNT]);
    let mut game = start("31270", with_turns(0), completed);
    let mut events = Vec::new();

    play(&mut game, &held(Action::Right), &mut events);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::ProgressChanged { .. })));

    for _ in 0..90 {
        game.update(&InputSnapshot::new(), &mut events);
    }
    assert_eq!(game.level(), 1);
    assert_eq!(game.phase(), Phase::FadingOut(SceneTarget::LevelSelect));
}

#[test]
fn pause_menu_undo_rolls_back_and_resumes() {
    let mut game = start(SEALED_COIN, Rules::default(), CompletedLevels::default());
    let mut events = Vec::new();
    play(&mut game, &held(Action::Right), &mut events);
    assert_eq!(game.history().len(), 2);

    game.update(&pressed(Action::Pause), &mut events);
    assert_eq!(game.phase(), Phase::Paused);
    game.update(&pressed(Action::Down), &mut events);
    assert_eq!(game.pause_menu().selected(), MenuEntry::Undo);

    game.update(&pressed(Action::Choose), &mut events);
    assert_eq!(game.phase(), Phase::Playing);
    assert_eq!(game.history().len(), 1);
    assert_eq!(player_position(&game), Some(CellCoord::new(1, 1)));
    assert!(events.contains(&Event::TurnUndone { history_len: 1 }));
}

#[test]
fn pause_menu_toggles_audio_and_quits() {
    let mut game = start(SEALED_COIN, Rules::default(), CompletedLevels::default());
    let mut events = Vec::new();

    game.update(&pressed(Action::Pause), &mut events);
    for _ in 0..3 {
        game.update(&pressed(Action::Down), &mut events);
    }
    game.update(&pressed(Action::Choose), &mut events);
    assert!(!game.audio_enabled());
    assert!(events.contains(&Event::AudioToggled));
    assert_eq!(game.phase(), Phase::Paused);

    game.update(&pressed(Action::Down), &mut events);
    game.update(&pressed(Action::Choose), &mut events);
    assert_eq!(game.phase(), Phase::FadingOut(SceneTarget::LevelSelect));
}

#[test]
fn restart_can_be_undone() {
    let mut game = start(SEALED_COIN, Rules::default(), CompletedLevels::default());
    let initial = game.state().clone();
    let mut events = Vec::new();

    play(&mut game, &held(Action::Right), &mut events);
    let moved = game.state().clone();

    game.update(&pressed(Action::Restart), &mut events);
    assert_eq!(game.state(), &initial);
    assert_eq!(game.history().len(), 3);
    assert!(events.contains(&Event::StageRestarted));
    assert!(events.contains(&Event::Sound(SoundEffect::Restart)));

    game.update(&pressed(Action::Undo), &mut events);
    assert_eq!(game.state(), &moved);
    assert_eq!(player_position(&game), Some(CellCoord::new(2, 1)));
}

#[test]
fn undo_with_nothing_recorded_still_sounds() {
    let mut game = start(SEALED_COIN, Rules::default(), CompletedLevels::default());
    let mut events = Vec::new();

    game.update(&pressed(Action::Undo), &mut events);
    assert_eq!(events, vec![Event::Sound(SoundEffect::Undo)]);
    assert_eq!(game.history().len(), 1);
}

#[test]
fn single_press_pushes_a_rock_in_every_direction() {
    for direction in Direction::CARDINALS {
        // 5x5 room with the player in the middle and a rock next to it
        let centre = CellCoord::new(2, 2);
        let rock = centre.step(direction);
        let mut digits = vec!['0'; 25];
        digits[12] = '2';
        digits[(rock.row() * 5 + rock.column()) as usize] = '3';
        let packed: String = "55".chars().chain(digits).collect();

        let mut game = start(&packed, Rules::default(), CompletedLevels::default());
        let mut events = Vec::new();
        let action = Action::for_direction(direction).expect("movement action");
        play(&mut game, &pressed(action), &mut events);

        let player = CellCoord::new(3, 3).step(direction);
        let pushed = player.step(direction);
        assert_eq!(player_position(&game), Some(player), "{direction:?}");
        assert_eq!(
            game.state().tile(Layer::Top, pushed.column(), pushed.row()),
            tile::ROCK,
            "{direction:?}"
        );
        assert_eq!(game.state().direction(Layer::Top, pushed.column(), pushed.row()), direction);
        assert_eq!(game.history().len(), 2, "{direction:?}");
        assert_eq!(game.state().turns_left(), 12, "{direction:?}");
    }
}

#[test]
fn rock_stays_when_the_player_heads_elsewhere() {
    // rock two cells left of the player, coin out of reach in the corner
    let mut game = start("4200070302", Rules::default(), CompletedLevels::default());
    let mut events = Vec::new();

    play(&mut game, &pressed(Action::Left), &mut events);
    assert_eq!(player_position(&game), Some(CellCoord::new(3, 2)));
    assert_eq!(game.state().direction(Layer::Top, 3, 2), Direction::Left);

    let up_and_left = InputSnapshot::new()
        .with(Action::Up, InputState::Down)
        .with(Action::Left, InputState::Down);
    play(&mut game, &up_and_left, &mut events);

    assert_eq!(player_position(&game), Some(CellCoord::new(3, 1)));
    assert_eq!(game.state().tile(Layer::Top, 2, 2), tile::ROCK);
    assert_eq!(game.state().tile(Layer::Top, 1, 2), tile::EMPTY);
}

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Right),
        Just(Direction::Up),
        Just(Direction::Left),
        Just(Direction::Down),
    ]
}

/// Cell a rock must reach when the next move pushes it, if the game takes input.
fn expected_push(game: &Game, direction: Direction) -> Option<CellCoord> {
    if game.transform_timer() > 0.0 || game.effect().is_some() {
        return None;
    }
    let state = game.state();
    let rock = query::player_cell(state)?.step(direction);
    let beyond = rock.step(direction);
    let free = !state.is_solid(beyond.column(), beyond.row(), true);
    (state.tile(Layer::Top, rock.column(), rock.row()) == tile::ROCK && free).then_some(beyond)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn undo_walks_back_through_every_settled_turn(
        moves in prop::collection::vec(direction(), 0..40)
    ) {
        let mut game = start(SEALED_COIN, Rules::default(), CompletedLevels::default());
        let mut events = Vec::new();
        let mut recorded = vec![game.state().clone()];

        for direction in moves {
            let before = game.history().len();
            let push = expected_push(&game, direction);
            let action = Action::for_direction(direction).expect("movement action");
            play(&mut game, &held(action), &mut events);
            prop_assert!((1..=64).contains(&game.history().len()));
            if let Some(cell) = push {
                prop_assert_eq!(game.state().tile(Layer::Top, cell.column(), cell.row()), tile::ROCK);
            }
            if game.history().len() > before {
                recorded.push(game.state().clone());
            }
        }

        for expected in recorded.iter().rev().skip(1) {
            game.undo(&mut events);
            prop_assert_eq!(game.state(), expected);
            prop_assert_eq!(player_position(&game), query::player_cell(game.state()));
        }
        prop_assert_eq!(game.history().len(), 1);
    }
}
