use serde::{Deserialize, Serialize};

use crate::cards::{Card, DealtCard, Visibility};

pub type PlayerId = usize;

/// Hi/lo declaration made in a declare step.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Declaration {
    High,
    Low,
    HighLow,
}

impl Declaration {
    pub fn contests_high(self) -> bool {
        matches!(self, Declaration::High | Declaration::HighLow)
    }

    pub fn contests_low(self) -> bool {
        matches!(self, Declaration::Low | Declaration::HighLow)
    }
}

/// Represents a player decision.
/// Chip amounts are always the chips moved from the stack by this action;
/// card lists are indices into the player's current hand.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Fold and forfeit the hand
    Fold,
    /// Check (no bet, only valid if no bet to call)
    Check,
    /// Call the current bet
    Call,
    /// Open the betting with the given chips
    Bet(u32),
    /// Put in the given chips, call included
    Raise(u32),
    /// Put in the whole stack as whichever of call/bet/raise fits
    AllIn,
    /// Replace the listed cards from the deck
    Draw(Vec<usize>),
    /// Discard the listed cards without replacement
    Discard(Vec<usize>),
    /// Turn the listed cards face up
    Expose(Vec<usize>),
    /// Hand the listed cards to a neighbour
    Pass(Vec<usize>),
    Declare(Declaration),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    Draw,
    Discard,
    Expose,
    Pass,
    Declare,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Fold => ActionKind::Fold,
            Action::Check => ActionKind::Check,
            Action::Call => ActionKind::Call,
            Action::Bet(_) => ActionKind::Bet,
            Action::Raise(_) | Action::AllIn => ActionKind::Raise,
            Action::Draw(_) => ActionKind::Draw,
            Action::Discard(_) => ActionKind::Discard,
            Action::Expose(_) => ActionKind::Expose,
            Action::Pass(_) => ActionKind::Pass,
            Action::Declare(_) => ActionKind::Declare,
        }
    }
}

/// A seated player with their chip stack and current hand.
/// Persists across hands; only the hand and the active flag are reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    stack: u32,
    seat: usize,
    hand: Vec<DealtCard>,
    /// False once folded this hand, or removed from the table.
    active: bool,
    removed: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, stack: u32, seat: usize) -> Self {
        Self {
            id,
            name: name.into(),
            stack,
            seat,
            hand: Vec::new(),
            active: false,
            removed: false,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn stack(&self) -> u32 {
        self.stack
    }
    pub fn seat(&self) -> usize {
        self.seat
    }
    pub fn is_active(&self) -> bool {
        self.active
    }
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn hand(&self) -> &[DealtCard] {
        &self.hand
    }

    pub fn cards(&self) -> Vec<Card> {
        self.hand.iter().map(|d| d.card).collect()
    }

    pub fn face_up_cards(&self) -> Vec<Card> {
        self.hand
            .iter()
            .filter(|d| d.is_face_up())
            .map(|d| d.card)
            .collect()
    }

    pub fn give_card(&mut self, card: Card, visibility: Visibility) {
        self.hand.push(DealtCard::new(card, visibility));
    }

    /// Removes the cards at `indices` (any order, no duplicates) and returns them
    /// in hand order. Callers validate indices first.
    pub fn take_cards(&mut self, indices: &[usize]) -> Vec<DealtCard> {
        let mut taken = Vec::with_capacity(indices.len());
        let mut kept = Vec::with_capacity(self.hand.len());
        for (i, c) in self.hand.drain(..).enumerate() {
            if indices.contains(&i) {
                taken.push(c);
            } else {
                kept.push(c);
            }
        }
        self.hand = kept;
        taken
    }

    pub fn expose(&mut self, indices: &[usize]) {
        for &i in indices {
            if let Some(c) = self.hand.get_mut(i) {
                c.visibility = Visibility::FaceUp;
            }
        }
    }

    pub fn clear_cards(&mut self) {
        self.hand.clear();
    }

    pub fn add_chips(&mut self, amount: u32) {
        self.stack = self.stack.saturating_add(amount);
    }

    /// Moves up to `amount` chips out of the stack and returns how many moved.
    pub fn take_chips(&mut self, amount: u32) -> u32 {
        let paid = amount.min(self.stack);
        self.stack -= paid;
        paid
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn mark_removed(&mut self) {
        self.removed = true;
        self.active = false;
    }
}
