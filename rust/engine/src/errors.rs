use serde::Serialize;
use thiserror::Error;

use crate::player::{ActionKind, PlayerId};

/// Broad classification a host uses to decide who sees an error.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad rules document or table settings, raised at load time.
    Config,
    /// User mistake; re-query valid actions and retry.
    InvalidAction,
    /// Engine bug or caller contract violation; log and escalate.
    InvariantViolation,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    InvalidAction(#[from] InvalidAction),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::Config(_) => ErrorKind::Config,
            GameError::InvalidAction(_) => ErrorKind::InvalidAction,
            GameError::Invariant(_) => ErrorKind::InvariantViolation,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("malformed rules document: {0}")]
    Parse(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("step `{step}` has unknown action kind `{kind}`")]
    UnknownAction { step: String, kind: String },
    #[error("step `{step}` must name exactly one action kind, found {found}")]
    AmbiguousStep { step: String, found: usize },
    #[error("step `{step}`: {reason}")]
    InvalidStep { step: String, reason: String },
    #[error("unknown evaluation type `{0}`")]
    UnknownEvaluation(String),
    #[error("evaluation `{evaluation}` cannot be played with this deck: {reason}")]
    IncompatibleDeck { evaluation: String, reason: String },
    #[error("deck declares {declared} cards but its composition has {actual}")]
    DeckSizeMismatch { declared: usize, actual: usize },
    #[error("dealing needs {needed} cards for {players} players but the deck has {available}")]
    DeckTooSmall {
        needed: usize,
        players: usize,
        available: usize,
    },
    #[error("best hand `{hand}` reads unknown community zone `{zone}`")]
    UnknownZone { hand: String, zone: String },
    #[error("invalid player range {min}..={max}")]
    InvalidPlayerRange { min: usize, max: usize },
    #[error("betting structure {0:?} is not permitted by these rules")]
    UnsupportedStructure(crate::betting::BettingStructure),
    #[error("table has {seats} seats but the game allows at most {max} players")]
    TooManySeats { seats: usize, max: usize },
    #[error("{0}")]
    Inconsistent(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidAction {
    #[error("no hand in progress")]
    NoHandInProgress,
    #[error("a hand is already in progress")]
    HandInProgress,
    #[error("player {0} is not seated")]
    UnknownPlayer(PlayerId),
    #[error("it's not player {actual}'s turn (expected {expected:?})")]
    NotPlayersTurn {
        expected: Option<PlayerId>,
        actual: PlayerId,
    },
    #[error("{kind:?} is not a legal action for player {player} now")]
    NotAllowed { player: PlayerId, kind: ActionKind },
    #[error("{kind:?} amount {amount} outside {min}..={max}")]
    OutOfBounds {
        kind: ActionKind,
        amount: u32,
        min: u32,
        max: u32,
    },
    #[error("card index {index} is not in player {player}'s hand")]
    BadCardIndex { player: PlayerId, index: usize },
    #[error("seat {0} is not available")]
    SeatUnavailable(usize),
    #[error("player {0} is already seated")]
    AlreadySeated(PlayerId),
    #[error("need at least {min} players with chips, found {found}")]
    NotEnoughPlayers { min: usize, found: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("advance_step called after the hand completed")]
    AdvanceAfterComplete,
    #[error("advance_step called while {0} is still pending")]
    PendingDecision(&'static str),
    #[error("chips not conserved: expected {expected}, found {found}")]
    ChipsNotConserved { expected: u64, found: u64 },
    #[error("pots hold {pots} chips but {wagered} were wagered")]
    PotMismatch { pots: u64, wagered: u64 },
    #[error("deck exhausted while dealing step `{0}`")]
    DeckExhausted(String),
    #[error("step `{0}` ran out of rules")]
    NoMoreSteps(String),
    #[error("game state cannot move from {from:?} to {to:?}")]
    StateRegression {
        from: crate::game::GameState,
        to: crate::game::GameState,
    },
}
