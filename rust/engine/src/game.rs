use serde::{Deserialize, Serialize};

use crate::betting::{BettingStructure, Stakes};
use crate::cards::{Card, DealtCard};
use crate::errors::GameError;
use crate::hand::HandRank;
use crate::player::PlayerId;
use crate::pot::Pot;
use crate::table::Zone;

/// Phase of the current hand. Moves forward only, except through
/// `Engine::start_hand`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    Waiting,
    Dealing,
    Betting,
    Showdown,
    Complete,
}

impl GameState {
    /// Dealing and betting alternate street by street, so they share a stage.
    fn stage(self) -> u8 {
        match self {
            GameState::Waiting => 0,
            GameState::Dealing | GameState::Betting => 1,
            GameState::Showdown => 2,
            GameState::Complete => 3,
        }
    }

    pub fn can_move_to(self, next: GameState) -> bool {
        self != GameState::Complete && next.stage() >= self.stage()
    }
}

/// Per-table settings supplied by the host.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableSettings {
    pub seats: usize,
    pub structure: BettingStructure,
    pub stakes: Stakes,
    pub seed: Option<u64>,
    /// Advance through non-interactive steps automatically once a round
    /// of decisions completes.
    pub auto_progress: bool,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            seats: 9,
            structure: BettingStructure::NoLimit,
            stakes: Stakes::default(),
            seed: None,
            auto_progress: false,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub seat: usize,
    pub stack: u32,
    pub active: bool,
    /// Cards as seen by everyone: face-down cards are hidden.
    pub visible: Vec<Option<Card>>,
}

/// Observable state after an operation.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub hand_number: u64,
    pub state: GameState,
    pub step: Option<String>,
    pub dealer_seat: Option<usize>,
    pub current_player: Option<PlayerId>,
    pub pots: Vec<Pot>,
    pub zones: Vec<Zone>,
    pub players: Vec<PlayerSnapshot>,
}

/// What `player_action` reports back to the host.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub error_kind: Option<crate::errors::ErrorKind>,
    pub error: Option<String>,
    pub snapshot: Snapshot,
}

impl ActionResult {
    pub fn from_outcome(outcome: Result<(), GameError>, snapshot: Snapshot) -> Self {
        match outcome {
            Ok(()) => Self {
                success: true,
                error_kind: None,
                error: None,
                snapshot,
            },
            Err(e) => Self {
                success: false,
                error_kind: Some(e.kind()),
                error: Some(e.to_string()),
                snapshot,
            },
        }
    }
}

/// A player's hand as evaluated for one best-hand rule.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShownHand {
    pub player: PlayerId,
    pub hand_name: String,
    pub rank: HandRank,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Award {
    pub player: PlayerId,
    pub amount: u32,
    /// Best-hand rule that won the chips; `None` when uncontested.
    pub hand_name: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PotResult {
    pub amount: u32,
    pub eligible: Vec<PlayerId>,
    pub awards: Vec<Award>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandResults {
    pub pots: Vec<PotResult>,
    pub hands: Vec<ShownHand>,
    pub winning_hands: Vec<ShownHand>,
    pub winners: Vec<PlayerId>,
    /// Won without a showdown because everyone else folded.
    pub uncontested: bool,
}

impl HandResults {
    pub fn total_awarded(&self) -> u64 {
        self.pots
            .iter()
            .flat_map(|p| &p.awards)
            .map(|a| u64::from(a.amount))
            .sum()
    }

    pub fn won_by(&self, player: PlayerId) -> u32 {
        self.pots
            .iter()
            .flat_map(|p| &p.awards)
            .filter(|a| a.player == player)
            .map(|a| a.amount)
            .sum()
    }
}

/// Masks face-down cards unless `viewer` owns them.
pub fn visible_cards(hand: &[DealtCard], owner: PlayerId, viewer: Option<PlayerId>) -> Vec<Option<Card>> {
    hand.iter()
        .map(|d| (d.is_face_up() || viewer == Some(owner)).then_some(d.card))
        .collect()
}
