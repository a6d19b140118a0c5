//! Betting rounds: forced bets, action legality, and contribution tracking.
//!
//! The manager only does accounting. It tells the caller how many chips an
//! action moves; the caller moves them out of the player's stack.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::InvalidAction;
use crate::player::{Action, ActionKind, PlayerId};
use crate::pot::{build_pots, Contribution, Pot};
use crate::rules::BetSize;

/// Bets and raises allowed per limit round (bet plus three raises).
pub const LIMIT_BET_CAP: u8 = 4;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum BettingStructure {
    #[serde(rename = "limit")]
    Limit,
    #[serde(rename = "no-limit")]
    NoLimit,
    #[serde(rename = "pot-limit")]
    PotLimit,
}

/// Chip amounts for forced bets and limit increments.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stakes {
    pub small_blind: u32,
    pub big_blind: u32,
    pub ante: u32,
    pub bring_in: u32,
    pub small_bet: u32,
    pub big_bet: u32,
}

impl Default for Stakes {
    fn default() -> Self {
        Self {
            small_blind: 1,
            big_blind: 2,
            ante: 0,
            bring_in: 1,
            small_bet: 2,
            big_bet: 4,
        }
    }
}

/// A legal action with the inclusive range of chips (or cards) it may use.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActionChoice {
    pub kind: ActionKind,
    pub min: u32,
    pub max: u32,
}

impl ActionChoice {
    pub fn new(kind: ActionKind, min: u32, max: u32) -> Self {
        Self { kind, min, max }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum RoundPhase {
    NotStarted,
    Open,
    AwaitingAction(PlayerId),
    Closed,
}

/// Outcome of an accepted betting action.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum RoundStatus {
    /// Waiting on this player next.
    Continue(PlayerId),
    /// Every live player has matched the bet or is all-in.
    Complete,
    /// Everyone else folded.
    SingleSurvivor(PlayerId),
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BetRecord {
    pub player: PlayerId,
    /// Chips put in during the current round.
    pub contributed: u32,
    /// Chips put in during the whole hand.
    pub total: u32,
    pub acted: bool,
    pub posted_forced: bool,
    pub all_in: bool,
    pub folded: bool,
    can_raise: bool,
}

/// Chips moved by an accepted action.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Applied {
    pub paid: u32,
    pub all_in: bool,
    pub status: RoundStatus,
}

#[derive(Debug, Clone)]
pub struct BettingManager {
    structure: BettingStructure,
    stakes: Stakes,
    /// Records in seating order, one per player dealt into the hand.
    records: Vec<BetRecord>,
    phase: RoundPhase,
    increment: u32,
    last_raise: u32,
    bets_this_round: u8,
}

impl BettingManager {
    pub fn new(structure: BettingStructure, stakes: Stakes) -> Self {
        Self {
            structure,
            stakes,
            records: Vec::new(),
            phase: RoundPhase::NotStarted,
            increment: 0,
            last_raise: 0,
            bets_this_round: 0,
        }
    }

    pub fn structure(&self) -> BettingStructure {
        self.structure
    }

    pub fn stakes(&self) -> Stakes {
        self.stakes
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Resets all accounting for a new hand dealt to `order` (seating order).
    pub fn start_hand(&mut self, order: &[PlayerId]) {
        self.records = order
            .iter()
            .map(|&player| BetRecord {
                player,
                can_raise: true,
                ..BetRecord::default()
            })
            .collect();
        self.phase = RoundPhase::NotStarted;
        self.bets_this_round = 0;
        self.last_raise = 0;
        self.increment = 0;
    }

    pub fn record(&self, player: PlayerId) -> Option<&BetRecord> {
        self.records.iter().find(|r| r.player == player)
    }

    pub fn records(&self) -> &[BetRecord] {
        &self.records
    }

    fn index_of(&self, player: PlayerId) -> Option<usize> {
        self.records.iter().position(|r| r.player == player)
    }

    /// Clears per-round state unless a round is already collecting chips.
    fn ensure_round(&mut self) {
        if matches!(self.phase, RoundPhase::NotStarted | RoundPhase::Closed) {
            for r in &mut self.records {
                r.contributed = 0;
                r.acted = false;
                r.posted_forced = false;
                r.can_raise = !r.folded && !r.all_in;
            }
            self.bets_this_round = 0;
            self.last_raise = 0;
            self.phase = RoundPhase::Open;
        }
    }

    /// Posts a forced bet of up to `amount` from a stack of `stack` chips and
    /// returns the chips paid. Not a voluntary act: the player still acts.
    pub fn post_forced(&mut self, player: PlayerId, amount: u32, stack: u32) -> u32 {
        self.ensure_round();
        let Some(i) = self.index_of(player) else {
            return 0;
        };
        let paid = amount.min(stack);
        let r = &mut self.records[i];
        r.contributed += paid;
        r.total += paid;
        r.posted_forced = true;
        if paid > 0 && paid == stack {
            r.all_in = true;
        }
        debug!(player, amount = paid, "forced bet posted");
        paid
    }

    /// Antes go straight into the pot without setting the round's bet level.
    pub fn post_ante(&mut self, player: PlayerId, amount: u32, stack: u32) -> u32 {
        let Some(i) = self.index_of(player) else {
            return 0;
        };
        let paid = amount.min(stack);
        let r = &mut self.records[i];
        r.total += paid;
        if paid > 0 && paid == stack {
            r.all_in = true;
        }
        paid
    }

    /// Opens a betting round, starting the search for the first actor at `first`.
    pub fn open_round(&mut self, size: BetSize, first: PlayerId) -> RoundStatus {
        self.ensure_round();
        self.increment = match (self.structure, size) {
            (BettingStructure::Limit, BetSize::Small) => self.stakes.small_bet,
            (BettingStructure::Limit, BetSize::Big) => self.stakes.big_bet,
            _ if self.stakes.big_blind > 0 => self.stakes.big_blind,
            _ => self.stakes.small_bet,
        }
        .max(1);
        // a full blind is the round's opening bet
        if self.bets_this_round == 0 && self.level() >= self.increment {
            self.bets_this_round = 1;
        }
        if let Some(winner) = self.single_survivor() {
            self.phase = RoundPhase::Closed;
            return RoundStatus::SingleSurvivor(winner);
        }
        let start = self.index_of(first).unwrap_or(0);
        self.next_to_act(start, true)
    }

    fn level(&self) -> u32 {
        self.records.iter().map(|r| r.contributed).max().unwrap_or(0)
    }

    pub fn pot_total(&self) -> u32 {
        self.records.iter().map(|r| r.total).sum()
    }

    fn live(&self) -> impl Iterator<Item = &BetRecord> {
        self.records.iter().filter(|r| !r.folded)
    }

    fn single_survivor(&self) -> Option<PlayerId> {
        let mut live = self.live();
        match (live.next(), live.next()) {
            (Some(only), None) => Some(only.player),
            _ => None,
        }
    }

    /// Players that can still put chips in.
    fn actors(&self) -> usize {
        self.live().filter(|r| !r.all_in).count()
    }

    fn needs_action(&self, r: &BetRecord) -> bool {
        if r.folded || r.all_in {
            return false;
        }
        let level = self.level();
        if self.actors() == 1 {
            return r.contributed < level;
        }
        !r.acted || r.contributed < level
    }

    /// Finds the next player needing action from `start` (inclusive when
    /// `inclusive`), or closes the round.
    fn next_to_act(&mut self, start: usize, inclusive: bool) -> RoundStatus {
        let n = self.records.len();
        let offset = usize::from(!inclusive);
        for step in 0..n {
            let i = (start + offset + step) % n;
            if self.needs_action(&self.records[i]) {
                let p = self.records[i].player;
                self.phase = RoundPhase::AwaitingAction(p);
                return RoundStatus::Continue(p);
            }
        }
        self.phase = RoundPhase::Closed;
        RoundStatus::Complete
    }

    pub fn awaiting(&self) -> Option<PlayerId> {
        match self.phase {
            RoundPhase::AwaitingAction(p) => Some(p),
            _ => None,
        }
    }

    fn full_raise_size(&self) -> u32 {
        self.last_raise.max(self.increment)
    }

    fn cap_reached(&self) -> bool {
        self.structure == BettingStructure::Limit
            && self.bets_this_round >= LIMIT_BET_CAP
            && self.live().count() > 2
    }

    /// Legal actions for `player` holding `stack` chips. Empty when it is
    /// not their turn.
    pub fn valid_actions(&self, player: PlayerId, stack: u32) -> Vec<ActionChoice> {
        if self.awaiting() != Some(player) {
            return Vec::new();
        }
        let Some(r) = self.record(player) else {
            return Vec::new();
        };
        let level = self.level();
        let owed = level - r.contributed;
        let to_call = owed.min(stack);
        let mut choices = Vec::with_capacity(4);
        if owed > 0 {
            choices.push(ActionChoice::new(ActionKind::Fold, 0, 0));
            choices.push(ActionChoice::new(ActionKind::Call, to_call, to_call));
        } else {
            choices.push(ActionChoice::new(ActionKind::Check, 0, 0));
        }

        let others_can_call = self
            .live()
            .any(|o| o.player != player && !o.all_in);
        if r.can_raise && stack > owed && others_can_call && !self.cap_reached() {
            let target = if level < self.increment {
                self.increment
            } else {
                level + self.full_raise_size()
            };
            let min_chips = target - r.contributed;
            let max_chips = match self.structure {
                BettingStructure::Limit => min_chips,
                BettingStructure::NoLimit => stack,
                BettingStructure::PotLimit => {
                    // call first, then raise by the pot that results
                    let pot_after_call = self.pot_total() + owed;
                    (owed + pot_after_call).max(min_chips)
                }
            };
            let kind = if level == 0 {
                ActionKind::Bet
            } else {
                ActionKind::Raise
            };
            choices.push(ActionChoice::new(
                kind,
                min_chips.min(stack),
                max_chips.min(stack),
            ));
        }
        choices
    }

    /// Applies `action` for `player`, who holds `stack` chips.
    ///
    /// # Errors
    ///
    /// [`InvalidAction`] when it is not the player's turn, the action is not
    /// legal now, or its amount is outside the legal range. State is left
    /// untouched on error.
    pub fn apply_action(
        &mut self,
        player: PlayerId,
        action: &Action,
        stack: u32,
    ) -> Result<Applied, InvalidAction> {
        if self.awaiting() != Some(player) {
            return Err(InvalidAction::NotPlayersTurn {
                expected: self.awaiting(),
                actual: player,
            });
        }
        let choices = self.valid_actions(player, stack);
        let find = |kind: ActionKind| choices.iter().find(|c| c.kind == kind).copied();
        let not_allowed = |kind| InvalidAction::NotAllowed { player, kind };

        let action = match action {
            Action::AllIn => {
                let owed = self.record(player).map_or(0, |r| self.level() - r.contributed);
                if stack <= owed {
                    Action::Call
                } else if self.level() == 0 {
                    Action::Bet(stack)
                } else {
                    Action::Raise(stack)
                }
            }
            other => other.clone(),
        };
        let kind = action.kind();
        let choice = find(kind).ok_or_else(|| not_allowed(kind))?;
        let paid = match action {
            Action::Fold | Action::Check => 0,
            Action::Call => choice.min,
            Action::Bet(amount) | Action::Raise(amount) => {
                if amount < choice.min || amount > choice.max {
                    return Err(InvalidAction::OutOfBounds {
                        kind,
                        amount,
                        min: choice.min,
                        max: choice.max,
                    });
                }
                amount
            }
            _ => return Err(not_allowed(kind)),
        };

        let Some(i) = self.index_of(player) else {
            return Err(InvalidAction::UnknownPlayer(player));
        };
        let old_level = self.level();
        let full = self.full_raise_size();
        let increment = self.increment;
        {
            let r = &mut self.records[i];
            r.contributed += paid;
            r.total += paid;
            r.acted = true;
            r.can_raise = false;
            if paid > 0 && paid == stack {
                r.all_in = true;
            }
            if kind == ActionKind::Fold {
                r.folded = true;
            }
        }
        let new_level = self.level();
        if new_level > old_level {
            let raise = new_level - old_level;
            // completing a bring-in counts as the opening bet
            let full_raise = raise >= full || (old_level < increment && new_level >= increment);
            if full_raise {
                self.last_raise = raise.max(increment);
                self.bets_this_round += 1;
            }
            for (j, o) in self.records.iter_mut().enumerate() {
                if j == i || o.folded || o.all_in {
                    continue;
                }
                o.acted = false;
                if full_raise {
                    o.can_raise = true;
                }
            }
        }
        let all_in = self.records[i].all_in;
        debug!(player, ?kind, amount = paid, all_in, "betting action applied");

        let status = if let Some(winner) = self.single_survivor() {
            self.phase = RoundPhase::Closed;
            RoundStatus::SingleSurvivor(winner)
        } else {
            self.next_to_act(i, false)
        };
        Ok(Applied {
            paid,
            all_in,
            status,
        })
    }

    /// Folds a player outside the normal turn order (e.g. removed from the
    /// table). Returns the new status when it was their turn.
    pub fn force_fold(&mut self, player: PlayerId) -> Option<RoundStatus> {
        let i = self.index_of(player)?;
        self.records[i].folded = true;
        if let Some(winner) = self.single_survivor() {
            self.phase = RoundPhase::Closed;
            return Some(RoundStatus::SingleSurvivor(winner));
        }
        if self.awaiting() == Some(player) {
            return Some(self.next_to_act(i, false));
        }
        None
    }

    /// Closes the round and returns any uncalled excess to its owner.
    pub fn close_round(&mut self) -> Option<(PlayerId, u32)> {
        self.phase = RoundPhase::Closed;
        let mut totals: Vec<(u32, usize)> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.total, i))
            .collect();
        totals.sort_unstable_by(|a, b| b.cmp(a));
        let (top, i) = *totals.first()?;
        let second = totals.get(1).map_or(0, |t| t.0);
        let excess = (top - second).min(self.records[i].contributed);
        if excess == 0 {
            return None;
        }
        let r = &mut self.records[i];
        r.contributed -= excess;
        r.total -= excess;
        r.all_in = false;
        debug!(player = r.player, amount = excess, "uncalled bet returned");
        Some((r.player, excess))
    }

    pub fn contributions(&self) -> Vec<Contribution> {
        self.records
            .iter()
            .map(|r| Contribution {
                player: r.player,
                amount: r.total,
                folded: r.folded,
                all_in: r.all_in,
            })
            .collect()
    }

    /// Current pot partition, recomputed from hand contributions.
    pub fn pots(&self) -> Vec<Pot> {
        build_pots(&self.contributions())
    }

    pub fn is_folded(&self, player: PlayerId) -> bool {
        self.record(player).is_some_and(|r| r.folded)
    }

    pub fn is_all_in(&self, player: PlayerId) -> bool {
        self.record(player).is_some_and(|r| r.all_in)
    }

    /// Whether fewer than two live players can still bet, so remaining
    /// rounds are dealt out without action.
    pub fn is_runout(&self) -> bool {
        self.actors() < 2
    }

    /// Drops all contributions once pots have been paid out.
    pub fn clear_pots(&mut self) {
        for r in &mut self.records {
            r.contributed = 0;
            r.total = 0;
        }
    }
}
