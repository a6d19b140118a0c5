#![allow(dead_code)]

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use varipoker_engine::engine::Engine;
use varipoker_engine::game::{GameState, TableSettings};
use varipoker_engine::player::{Action, ActionKind, PlayerId};
use varipoker_engine::rules::GameRules;

pub const HOLDEM: &str = r#"{
    "game": "Texas Hold'em",
    "players": {"min": 2, "max": 9},
    "deck": {"type": "standard", "cards": 52},
    "forcedBets": {"style": "blinds"},
    "bettingStructures": ["no-limit", "pot-limit", "limit"],
    "gamePlay": [
        {"name": "Post Blinds", "bet": {"type": "blinds"}},
        {"name": "Deal Hole Cards", "deal": {"location": "player", "cards": [{"number": 2, "state": "face down"}]}},
        {"name": "Pre-Flop Bet", "bet": {"type": "small"}},
        {"name": "Deal Flop", "deal": {"location": "community", "cards": [{"number": 3, "state": "face up"}]}},
        {"name": "Flop Bet", "bet": {"type": "small"}},
        {"name": "Deal Turn", "deal": {"location": "community", "cards": [{"number": 1, "state": "face up"}]}},
        {"name": "Turn Bet", "bet": {"type": "big"}},
        {"name": "Deal River", "deal": {"location": "community", "cards": [{"number": 1, "state": "face up"}]}},
        {"name": "River Bet", "bet": {"type": "big"}},
        {"name": "Showdown", "showdown": {"type": "final"}}
    ],
    "showdown": {
        "order": "clockwise",
        "startingFrom": "dealer",
        "bestHand": [{"name": "High Hand", "evaluationType": "high", "anyCards": 5}]
    }
}"#;

pub const OMAHA_HI_LO: &str = r#"{
    "game": "Omaha Hi-Lo",
    "players": {"min": 2, "max": 9},
    "deck": {"type": "standard", "cards": 52},
    "forcedBets": {"style": "blinds"},
    "bettingStructures": ["pot-limit", "limit"],
    "gamePlay": [
        {"name": "Post Blinds", "bet": {"type": "blinds"}},
        {"name": "Deal Hole Cards", "deal": {"location": "player", "cards": [{"number": 4, "state": "face down"}]}},
        {"name": "Pre-Flop Bet", "bet": {"type": "small"}},
        {"name": "Deal Flop", "deal": {"location": "community", "zone": "board", "cards": [{"number": 3, "state": "face up"}]}},
        {"name": "Flop Bet", "bet": {"type": "small"}},
        {"name": "Deal Turn", "deal": {"location": "community", "zone": "board", "cards": [{"number": 1, "state": "face up"}]}},
        {"name": "Turn Bet", "bet": {"type": "big"}},
        {"name": "Deal River", "deal": {"location": "community", "zone": "board", "cards": [{"number": 1, "state": "face up"}]}},
        {"name": "River Bet", "bet": {"type": "big"}},
        {"name": "Showdown", "showdown": {"type": "final"}}
    ],
    "showdown": {
        "order": "clockwise",
        "startingFrom": "dealer",
        "bestHand": [
            {"name": "High Hand", "evaluationType": "high", "holeCards": 2, "communityCards": 3},
            {"name": "Low Hand", "evaluationType": "a5_low", "holeCards": 2, "communityCards": 3, "qualifier": "8"}
        ]
    }
}"#;

pub const STUD: &str = r#"{
    "game": "Seven Card Stud",
    "players": {"min": 2, "max": 7},
    "deck": {"type": "standard", "cards": 52},
    "forcedBets": {"style": "bring-in"},
    "bettingStructures": ["limit"],
    "gamePlay": [
        {"name": "Post Antes", "bet": {"type": "antes"}},
        {"name": "Deal Third Street", "deal": {"location": "player", "cards": [
            {"number": 2, "state": "face down"}, {"number": 1, "state": "face up"}]}},
        {"name": "Post Bring-In", "bet": {"type": "bring-in"}},
        {"name": "Third Street Bet", "bet": {"type": "small"}},
        {"name": "Deal Fourth Street", "deal": {"location": "player", "cards": [{"number": 1, "state": "face up"}]}},
        {"name": "Fourth Street Bet", "bet": {"type": "small"}},
        {"name": "Deal Fifth Street", "deal": {"location": "player", "cards": [{"number": 1, "state": "face up"}]}},
        {"name": "Fifth Street Bet", "bet": {"type": "big"}},
        {"name": "Deal Sixth Street", "deal": {"location": "player", "cards": [{"number": 1, "state": "face up"}]}},
        {"name": "Sixth Street Bet", "bet": {"type": "big"}},
        {"name": "Deal Seventh Street", "deal": {"location": "player", "cards": [{"number": 1, "state": "face down"}]}},
        {"name": "Seventh Street Bet", "bet": {"type": "big"}},
        {"name": "Showdown", "showdown": {"type": "final"}}
    ],
    "showdown": {
        "order": "clockwise",
        "startingFrom": "last_aggressor",
        "bestHand": [{"name": "High Hand", "evaluationType": "high", "anyCards": 5}]
    }
}"#;

pub const BADUGI: &str = r#"{
    "game": "Badugi",
    "players": {"min": 2, "max": 6},
    "deck": {"type": "standard", "cards": 52},
    "forcedBets": {"style": "blinds"},
    "bettingStructures": ["limit"],
    "gamePlay": [
        {"name": "Post Blinds", "bet": {"type": "blinds"}},
        {"name": "Deal Hand", "deal": {"location": "player", "cards": [{"number": 4, "state": "face down"}]}},
        {"name": "Pre-Draw Bet", "bet": {"type": "small"}},
        {"name": "First Draw", "draw": {"cards": [{"min": 0, "max": 4, "state": "face down"}]}},
        {"name": "First Bet", "bet": {"type": "small"}},
        {"name": "Second Draw", "draw": {"cards": [{"min": 0, "max": 4, "state": "face down"}]}},
        {"name": "Second Bet", "bet": {"type": "big"}},
        {"name": "Third Draw", "draw": {"cards": [{"min": 0, "max": 4, "state": "face down"}]}},
        {"name": "Final Bet", "bet": {"type": "big"}},
        {"name": "Showdown", "showdown": {"type": "final"}}
    ],
    "showdown": {
        "bestHand": [{"name": "Badugi", "evaluationType": "badugi", "anyCards": 4}]
    }
}"#;

pub const TRIPLE_DRAW: &str = r#"{
    "game": "2-7 Triple Draw",
    "players": {"min": 2, "max": 6},
    "deck": {"type": "standard", "cards": 52},
    "forcedBets": {"style": "blinds"},
    "bettingStructures": ["limit"],
    "gamePlay": [
        {"name": "Post Blinds", "bet": {"type": "blinds"}},
        {"name": "Deal Hand", "deal": {"location": "player", "cards": [{"number": 5, "state": "face down"}]}},
        {"name": "Pre-Draw Bet", "bet": {"type": "small"}},
        {"name": "First Draw", "draw": {"cards": [{"min": 0, "max": 5, "state": "face down"}]}},
        {"name": "First Bet", "bet": {"type": "small"}},
        {"name": "Second Draw", "draw": {"cards": [{"min": 0, "max": 5, "state": "face down"}]}},
        {"name": "Second Bet", "bet": {"type": "big"}},
        {"name": "Third Draw", "draw": {"cards": [{"min": 0, "max": 5, "state": "face down"}]}},
        {"name": "Final Bet", "bet": {"type": "big"}},
        {"name": "Showdown", "showdown": {"type": "final"}}
    ],
    "showdown": {
        "bestHand": [{"name": "Low Hand", "evaluationType": "27_low", "anyCards": 5}]
    }
}"#;

pub const DECLARE: &str = r#"{
    "game": "Five Card Draw Hi-Lo Declare",
    "players": {"min": 2, "max": 6},
    "deck": {"type": "standard", "cards": 52},
    "forcedBets": {"style": "antes_only"},
    "bettingStructures": ["limit"],
    "gamePlay": [
        {"name": "Post Antes", "bet": {"type": "antes"}},
        {"name": "Deal Hand", "deal": {"location": "player", "cards": [{"number": 5, "state": "face down"}]}},
        {"name": "First Bet", "bet": {"type": "small"}},
        {"name": "Draw", "draw": {"cards": [{"min": 0, "max": 5, "state": "face down"}]}},
        {"name": "Second Bet", "bet": {"type": "big"}},
        {"name": "Declare", "declare": {"options": ["high", "low", "high_low"]}},
        {"name": "Showdown", "showdown": {"type": "final"}}
    ],
    "showdown": {
        "bestHand": [
            {"name": "High Hand", "evaluationType": "high", "anyCards": 5},
            {"name": "Low Hand", "evaluationType": "a5_low", "anyCards": 5}
        ]
    }
}"#;

pub const PASS_THE_TRASH: &str = r#"{
    "game": "Pass the Trash",
    "players": {"min": 2, "max": 6},
    "deck": {"type": "standard", "cards": 52},
    "forcedBets": {"style": "antes_only"},
    "bettingStructures": ["limit"],
    "gamePlay": [
        {"name": "Post Antes", "bet": {"type": "antes"}},
        {"name": "Deal Hand", "deal": {"location": "player", "cards": [{"number": 7, "state": "face down"}]}},
        {"name": "Pass", "pass": {"cards": [{"number": 3}], "direction": "left"}},
        {"name": "Discard", "discard": {"cards": [{"number": 1}]}},
        {"name": "Expose", "expose": {"cards": [{"number": 1}]}},
        {"name": "Bet", "bet": {"type": "small"}},
        {"name": "Showdown", "showdown": {"type": "final"}}
    ],
    "showdown": {
        "bestHand": [{"name": "High Hand", "evaluationType": "high", "anyCards": 5}]
    }
}"#;

pub fn rules(config: &str) -> Arc<GameRules> {
    Arc::new(GameRules::load(config).expect("fixture loads"))
}

/// Routes engine logs to the test harness; `RUST_LOG` picks the level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Engine with one player per seat, ids equal to seat numbers.
pub fn table(config: &str, stacks: &[u32], settings: TableSettings) -> Engine {
    init_logging();
    let settings = TableSettings {
        seats: stacks.len(),
        ..settings
    };
    let mut engine = Engine::new(rules(config), settings).expect("engine");
    for (seat, &stack) in stacks.iter().enumerate() {
        engine
            .add_player(seat, format!("p{seat}"), stack, seat)
            .expect("seat free");
    }
    engine
}

pub fn auto(seed: u64) -> TableSettings {
    TableSettings {
        seed: Some(seed),
        auto_progress: true,
        ..TableSettings::default()
    }
}

pub fn stacks(engine: &Engine) -> Vec<u32> {
    engine.players().map(|p| p.stack()).collect()
}

pub fn chips_in_play(engine: &Engine) -> u64 {
    engine.players().map(|p| u64::from(p.stack())).sum::<u64>() + u64::from(engine.pot_total())
}

/// Check or call, take no cards, declare the first option offered.
pub fn passive_action(engine: &Engine, player: PlayerId) -> Action {
    let choices = engine.valid_actions(player);
    let first_n = |n: u32| (0..n as usize).collect::<Vec<_>>();
    for c in &choices {
        match c.kind {
            ActionKind::Check => return Action::Check,
            ActionKind::Call => return Action::Call,
            ActionKind::Draw => return Action::Draw(first_n(c.min)),
            ActionKind::Discard => return Action::Discard(first_n(c.min)),
            ActionKind::Expose => return Action::Expose(first_n(c.min)),
            ActionKind::Pass => return Action::Pass(first_n(c.min)),
            ActionKind::Declare => {
                let d = engine.declare_options()[0];
                return Action::Declare(d);
            }
            _ => {}
        }
    }
    Action::Fold
}

/// Plays the hand out passively, advancing steps when nobody owes an action.
pub fn play_out(engine: &mut Engine) {
    for _ in 0..1000 {
        if engine.state() == GameState::Complete {
            return;
        }
        match engine.current_player() {
            Some(p) => {
                let action = passive_action(engine, p);
                let result = engine.player_action(p, action);
                assert!(result.success, "{:?}", result.error);
            }
            None => engine.advance_step().expect("step advances"),
        }
    }
    panic!("hand did not finish");
}
