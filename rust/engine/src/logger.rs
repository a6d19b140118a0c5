use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::game::HandResults;
use crate::player::{Action, PlayerId};
use crate::table::Zone;

/// Records a single player decision.
/// Associates the action with the player and the step where it occurred.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub player: PlayerId,
    /// Name of the step being played
    pub step: String,
    pub action: Action,
    /// Chips moved from the player's stack by this action
    pub paid: u32,
}

/// Complete record of one hand: steps walked, decisions, board, and outcome.
/// Serialized to JSONL for hand history storage and replay.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandRecord {
    /// Unique identifier for this hand (format: SEED-NNNNNN)
    pub hand_id: String,
    pub game: String,
    /// RNG seed of the table (enables deterministic replay)
    pub seed: u64,
    pub dealer_seat: Option<usize>,
    /// Step names in the order they were played
    pub steps: Vec<String>,
    pub actions: Vec<ActionRecord>,
    /// Community zones as they stood when the hand ended
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub result: Option<HandResults>,
    /// Timestamp when the record was stamped (RFC3339 format)
    #[serde(default)]
    pub ts: Option<String>,
}

pub fn format_hand_id(seed: u64, seq: u64) -> String {
    format!("{:016x}-{:06}", seed, seq)
}

impl HandRecord {
    pub fn new(game: impl Into<String>, seed: u64, seq: u64, dealer_seat: Option<usize>) -> Self {
        Self {
            hand_id: format_hand_id(seed, seq),
            game: game.into(),
            seed,
            dealer_seat,
            steps: Vec::new(),
            actions: Vec::new(),
            zones: Vec::new(),
            result: None,
            ts: None,
        }
    }

    /// Copy with the current time injected if no timestamp is set yet.
    pub fn stamped(&self) -> Self {
        let mut rec = self.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        rec
    }

    /// One JSON line, LF-terminated.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
