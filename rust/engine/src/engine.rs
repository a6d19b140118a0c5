use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::betting::{ActionChoice, BettingManager, RoundStatus};
use crate::cards::{Card, DealtCard};
use crate::errors::{ConfigError, ErrorKind, GameError, InvalidAction, InvariantViolation};
use crate::game::{
    visible_cards, ActionResult, Award, GameState, HandResults, PlayerSnapshot, PotResult, Snapshot,
    TableSettings,
};
use crate::hand::evaluate_best_with_wilds;
use crate::logger::{ActionRecord, HandRecord};
use crate::player::{Action, ActionKind, Declaration, Player, PlayerId};
use crate::pot::Pot;
use crate::rules::{BetSize, ForcedBetKind, ForcedBetStyle, GameRules, StartingFrom, Step, StepSpec};
use crate::showdown;
use crate::table::Table;

/// Players still owing a decision in a draw/discard/expose/pass/declare step.
#[derive(Debug, Clone)]
struct DecisionRound {
    step: usize,
    waiting: VecDeque<PlayerId>,
    /// Seating order at the start of the round, for passing.
    order: Vec<PlayerId>,
    passes: Vec<(PlayerId, Vec<usize>)>,
}

fn violation(v: InvariantViolation) -> GameError {
    error!(error = %v, "invariant violated");
    GameError::Invariant(v)
}

/// Card-count bounds for a decision, capped at the cards the player holds.
fn held_bounds(held: usize, min: usize, max: usize) -> (usize, usize) {
    (min.min(held), max.min(held))
}

/// Sort key for the bring-in: lowest rank, then clubs < diamonds < hearts < spades.
fn bring_in_key(c: &Card) -> (u8, usize) {
    (c.rank.value(), c.suit.index())
}

/// Game flow controller for one table. Walks the variant's sequence of play
/// one step at a time, delegating to the table, the betting manager and the
/// showdown resolver.
///
/// Callers serialize access: the engine is a plain synchronous state machine.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use varipoker_engine::engine::Engine;
/// use varipoker_engine::game::{GameState, TableSettings};
/// use varipoker_engine::player::Action;
/// use varipoker_engine::rules::GameRules;
///
/// let rules = GameRules::load(r#"{
///     "game": "Heads Up Hold'em",
///     "players": {"min": 2, "max": 2},
///     "deck": {"type": "standard"},
///     "forcedBets": {"style": "blinds"},
///     "bettingStructures": ["no-limit"],
///     "gamePlay": [
///         {"name": "Post Blinds", "bet": {"type": "blinds"}},
///         {"name": "Deal Hole Cards", "deal": {"location": "player",
///             "cards": [{"number": 2, "state": "face down"}]}},
///         {"name": "Pre-Flop Bet", "bet": {"type": "small"}},
///         {"name": "Showdown", "showdown": {"type": "final"}}
///     ],
///     "showdown": {"bestHand": [{"name": "High Hand", "evaluationType": "high", "anyCards": 5}]}
/// }"#).unwrap();
///
/// let settings = TableSettings { seats: 2, seed: Some(7), auto_progress: true, ..Default::default() };
/// let mut engine = Engine::new(Arc::new(rules), settings).unwrap();
/// engine.add_player(0, "alice", 100, 0).unwrap();
/// engine.add_player(1, "bob", 100, 1).unwrap();
/// engine.start_hand().unwrap();
///
/// // the dealer posts the small blind and acts first
/// assert_eq!(engine.current_player(), Some(0));
/// assert!(engine.player_action(0, Action::Fold).success);
/// assert_eq!(engine.state(), GameState::Complete);
/// assert_eq!(engine.player(1).map(|p| p.stack()), Some(101));
/// ```
#[derive(Debug)]
pub struct Engine {
    rules: Arc<GameRules>,
    settings: TableSettings,
    seed: u64,
    table: Table,
    betting: BettingManager,
    state: GameState,
    hand_number: u64,
    /// Index of the next step to process.
    next_step: usize,
    decisions: Option<DecisionRound>,
    declarations: BTreeMap<PlayerId, Declaration>,
    /// First actor of the next betting round, set by blinds or a bring-in.
    first_to_act: Option<PlayerId>,
    last_aggressor: Option<PlayerId>,
    results: Option<HandResults>,
    starting_total: u64,
    record: HandRecord,
}

impl Engine {
    /// Creates an engine for one table of `rules`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedStructure`] when the rules do not permit the
    /// requested betting structure, [`ConfigError::TooManySeats`] when the
    /// table is larger than the game allows.
    pub fn new(rules: Arc<GameRules>, settings: TableSettings) -> Result<Self, GameError> {
        if !rules.permits(settings.structure) {
            return Err(ConfigError::UnsupportedStructure(settings.structure).into());
        }
        if settings.seats > rules.max_players {
            return Err(ConfigError::TooManySeats {
                seats: settings.seats,
                max: rules.max_players,
            }
            .into());
        }
        if settings.seats < rules.min_players {
            return Err(ConfigError::Inconsistent(format!(
                "table has {} seats but the game needs {} players",
                settings.seats, rules.min_players
            ))
            .into());
        }
        let seed = settings.seed.unwrap_or_else(rand::random);
        let table = Table::new(settings.seats, rules.deck.clone(), seed, &rules.zones);
        let betting = BettingManager::new(settings.structure, settings.stakes);
        let record = HandRecord::new(rules.name.clone(), seed, 0, None);
        Ok(Self {
            rules,
            settings,
            seed,
            table,
            betting,
            state: GameState::Waiting,
            hand_number: 0,
            next_step: 0,
            decisions: None,
            declarations: BTreeMap::new(),
            first_to_act: None,
            last_aggressor: None,
            results: None,
            starting_total: 0,
            record,
        })
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    fn in_hand(&self) -> bool {
        matches!(
            self.state,
            GameState::Dealing | GameState::Betting | GameState::Showdown
        )
    }

    /// Seats a player. Players joining mid-hand sit out until the next hand.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        stack: u32,
        seat: usize,
    ) -> Result<(), GameError> {
        self.table.seat_player(Player::new(id, name, stack, seat))?;
        if self.in_hand() {
            self.starting_total += u64::from(stack);
        }
        info!(player = id, seat, stack, "player seated");
        Ok(())
    }

    /// Removes a player. Mid-hand this folds them; the seat is vacated when
    /// the next hand starts.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<(), GameError> {
        if self.table.remove_player(id).is_none() {
            return Err(InvalidAction::UnknownPlayer(id).into());
        }
        info!(player = id, "player removed");
        if !matches!(self.state, GameState::Dealing | GameState::Betting) {
            return Ok(());
        }
        self.table.muck_hand(id);
        if let Some(round) = self.decisions.as_mut() {
            round.waiting.retain(|&p| p != id);
            round.order.retain(|&p| p != id);
            round.passes.retain(|(p, _)| *p != id);
        }
        if let Some(status) = self.betting.force_fold(id) {
            self.on_round_status(status)?;
        }
        if self.state != GameState::Complete {
            let live = self.table.hand_order();
            if let [only] = live.as_slice() {
                let winner = *only;
                self.close_round();
                self.award_uncontested(winner)?;
            } else {
                self.complete_decisions();
            }
        }
        self.audit()?;
        self.auto_progress()
    }

    /// Starts a new hand: resets the table and betting, moves the button,
    /// and processes the first step.
    pub fn start_hand(&mut self) -> Result<(), GameError> {
        if self.in_hand() {
            return Err(InvalidAction::HandInProgress.into());
        }
        let ready = self
            .table
            .players()
            .filter(|p| !p.is_removed() && p.stack() > 0)
            .count();
        if ready < self.rules.min_players {
            return Err(InvalidAction::NotEnoughPlayers {
                min: self.rules.min_players,
                found: ready,
            }
            .into());
        }
        self.table.reset_for_hand();
        let dealer = self.table.rotate_dealer();
        let order = self.table.hand_order();
        self.betting.start_hand(&order);
        self.hand_number += 1;
        self.state = GameState::Waiting;
        self.next_step = 0;
        self.decisions = None;
        self.declarations.clear();
        self.first_to_act = None;
        self.last_aggressor = None;
        self.results = None;
        self.starting_total = self.table.total_chips();
        self.record = HandRecord::new(self.rules.name.clone(), self.seed, self.hand_number, dealer);
        info!(
            hand = self.hand_number,
            dealer = ?dealer,
            seed = self.seed,
            players = order.len(),
            "hand started"
        );
        self.step()?;
        self.auto_progress()
    }

    /// Processes the next step of the sequence of play.
    ///
    /// # Errors
    ///
    /// [`InvariantViolation::AdvanceAfterComplete`] once the hand is over,
    /// [`InvariantViolation::PendingDecision`] while players still owe
    /// actions for the current step.
    pub fn advance_step(&mut self) -> Result<(), GameError> {
        if self.state == GameState::Complete {
            return Err(violation(InvariantViolation::AdvanceAfterComplete));
        }
        if !self.in_hand() {
            return Err(InvalidAction::NoHandInProgress.into());
        }
        if self.betting.awaiting().is_some() {
            return Err(violation(InvariantViolation::PendingDecision("betting round")));
        }
        if self.decisions.is_some() {
            return Err(violation(InvariantViolation::PendingDecision("decision round")));
        }
        self.step()?;
        self.auto_progress()
    }

    fn auto_progress(&mut self) -> Result<(), GameError> {
        if !self.settings.auto_progress {
            return Ok(());
        }
        while self.in_hand() && self.current_player().is_none() {
            self.step()?;
        }
        Ok(())
    }

    fn set_state(&mut self, next: GameState) -> Result<(), GameError> {
        if self.state == next {
            return Ok(());
        }
        if !self.state.can_move_to(next) {
            return Err(violation(InvariantViolation::StateRegression {
                from: self.state,
                to: next,
            }));
        }
        debug!(from = ?self.state, to = ?next, "state changed");
        self.state = next;
        Ok(())
    }

    fn step(&mut self) -> Result<(), GameError> {
        let index = self.next_step;
        let rules = Arc::clone(&self.rules);
        let Some(step) = rules.step_at(index) else {
            return Err(violation(InvariantViolation::NoMoreSteps(format!(
                "#{index} of {}",
                rules.name
            ))));
        };
        self.next_step += 1;
        info!(hand = self.hand_number, step = %step.name, index, "step");
        self.record.steps.push(step.name.clone());

        match &step.spec {
            StepSpec::PostForcedBet(kind) => {
                self.set_state(GameState::Betting)?;
                self.post_forced_bets(*kind);
            }
            StepSpec::Bet(size) => {
                self.set_state(GameState::Betting)?;
                self.open_betting(*size)?;
            }
            StepSpec::Deal(spec) => {
                self.set_state(GameState::Dealing)?;
                let order = self.table.hand_order();
                self.table
                    .deal_cards(&step.name, spec, &order)
                    .map_err(violation)?;
                debug!(step = %step.name, cards = spec.card_count(), zone = ?spec.zone, "cards dealt");
            }
            StepSpec::Draw(_)
            | StepSpec::Discard(_)
            | StepSpec::Expose(_)
            | StepSpec::Pass(_)
            | StepSpec::Declare(_) => {
                self.set_state(GameState::Dealing)?;
                let order = self.table.hand_order();
                if !order.is_empty() {
                    self.decisions = Some(DecisionRound {
                        step: index,
                        waiting: order.iter().copied().collect(),
                        order,
                        passes: Vec::new(),
                    });
                }
            }
            StepSpec::Showdown => {
                self.set_state(GameState::Showdown)?;
                self.showdown()?;
            }
        }
        self.audit()
    }

    /// Moves up to `amount` chips from a player's stack into the pot.
    fn post(&mut self, id: PlayerId, amount: u32, ante: bool) -> u32 {
        let stack = self.table.player(id).map_or(0, Player::stack);
        let paid = if ante {
            self.betting.post_ante(id, amount, stack)
        } else {
            self.betting.post_forced(id, amount, stack)
        };
        if let Some(p) = self.table.player_mut(id) {
            p.take_chips(paid);
        }
        paid
    }

    fn post_forced_bets(&mut self, kind: ForcedBetKind) {
        let order = self.table.hand_order();
        let stakes = self.settings.stakes;
        let after = |id: PlayerId| {
            order
                .iter()
                .position(|&p| p == id)
                .map(|i| order[(i + 1) % order.len()])
        };
        match kind {
            ForcedBetKind::Antes => {
                if stakes.ante == 0 {
                    return;
                }
                for &id in &order {
                    self.post(id, stakes.ante, true);
                }
            }
            ForcedBetKind::Blinds => {
                let (sb, bb) = match order.as_slice() {
                    // heads-up: the dealer, last in order, posts the small blind
                    [a, b] => (*b, *a),
                    [a, b, ..] => (*a, *b),
                    _ => return,
                };
                self.post(sb, stakes.small_blind, false);
                self.post(bb, stakes.big_blind, false);
                self.first_to_act = after(bb);
            }
            ForcedBetKind::BringIn => {
                let lowest = order
                    .iter()
                    .filter_map(|&id| {
                        let up = self.table.player(id)?.face_up_cards();
                        up.iter().map(bring_in_key).min().map(|key| (key, id))
                    })
                    .min()
                    .map(|(_, id)| id)
                    .or_else(|| order.first().copied());
                if let Some(id) = lowest {
                    self.post(id, stakes.bring_in, false);
                    self.first_to_act = after(id);
                }
            }
        }
    }

    /// Owner of the best face-up hand under the first best-hand rule.
    fn best_visible(&self, live: &[PlayerId]) -> Option<PlayerId> {
        let bh = self.rules.showdown.best_hand.first()?;
        let mut best: Option<(u32, PlayerId)> = None;
        for &id in live {
            let Some(p) = self.table.player(id) else {
                continue;
            };
            let up = p.face_up_cards();
            let Some((rank, _)) = evaluate_best_with_wilds(&up, 5, bh.evaluation, &bh.wild_ranks)
            else {
                continue;
            };
            if best.is_none_or(|(b, _)| rank.ordinal < b) {
                best = Some((rank.ordinal, id));
            }
        }
        best.map(|(_, id)| id)
    }

    fn open_betting(&mut self, size: BetSize) -> Result<(), GameError> {
        let live = self.table.hand_order();
        let first = match self.first_to_act.take() {
            Some(p) => Some(p),
            None if self.rules.forced_bets == ForcedBetStyle::BringIn => {
                self.best_visible(&live).or_else(|| live.first().copied())
            }
            None => live.first().copied(),
        };
        let Some(first) = first else {
            return Ok(());
        };
        let status = self.betting.open_round(size, first);
        debug!(?size, first, ?status, runout = self.betting.is_runout(), "betting round opened");
        self.on_round_status(status)
    }

    fn on_round_status(&mut self, status: RoundStatus) -> Result<(), GameError> {
        match status {
            RoundStatus::Continue(p) => {
                debug!(player = p, "awaiting action");
                Ok(())
            }
            RoundStatus::Complete => {
                self.close_round();
                Ok(())
            }
            RoundStatus::SingleSurvivor(winner) => {
                self.close_round();
                self.award_uncontested(winner)
            }
        }
    }

    fn close_round(&mut self) {
        if let Some((player, refund)) = self.betting.close_round() {
            if let Some(p) = self.table.player_mut(player) {
                p.add_chips(refund);
            }
        }
        debug!(pots = ?self.betting.pots(), "betting round closed");
    }

    /// Everyone else folded: the survivor takes every pot unseen.
    fn award_uncontested(&mut self, winner: PlayerId) -> Result<(), GameError> {
        let total = self.betting.pot_total();
        let pots = self
            .betting
            .pots()
            .into_iter()
            .map(|pot| PotResult {
                awards: vec![Award {
                    player: winner,
                    amount: pot.amount,
                    hand_name: None,
                }],
                amount: pot.amount,
                eligible: pot.eligible,
            })
            .collect();
        if let Some(p) = self.table.player_mut(winner) {
            p.add_chips(total);
        }
        info!(player = winner, amount = total, "uncontested pot awarded");
        self.finish(HandResults {
            pots,
            winners: vec![winner],
            uncontested: true,
            ..HandResults::default()
        })
    }

    fn showdown(&mut self) -> Result<(), GameError> {
        self.close_round();
        let order = self.table.hand_order();
        let pots = self.betting.pots();
        let first = match self.rules.showdown.starting_from {
            StartingFrom::LastAggressor => self.last_aggressor,
            StartingFrom::Dealer => None,
        };
        let results = showdown::resolve(
            &self.rules.showdown,
            &self.table,
            &pots,
            &order,
            first,
            &self.declarations,
        );
        let wagered = u64::from(self.betting.pot_total());
        let awarded = results.total_awarded();
        if awarded != wagered {
            return Err(violation(InvariantViolation::PotMismatch {
                pots: awarded,
                wagered,
            }));
        }
        for award in results.pots.iter().flat_map(|p| &p.awards) {
            if let Some(p) = self.table.player_mut(award.player) {
                p.add_chips(award.amount);
            }
        }
        self.finish(results)
    }

    fn finish(&mut self, results: HandResults) -> Result<(), GameError> {
        self.betting.clear_pots();
        self.decisions = None;
        self.record.zones = self.table.zones().to_vec();
        self.record.result = Some(results.clone());
        self.results = Some(results);
        self.set_state(GameState::Complete)?;
        info!(hand = self.hand_number, "hand complete");
        self.audit()
    }

    /// Stacks plus pots must always equal the chips at the start of the hand.
    fn audit(&self) -> Result<(), GameError> {
        let found = self.table.total_chips() + u64::from(self.betting.pot_total());
        if found != self.starting_total {
            return Err(violation(InvariantViolation::ChipsNotConserved {
                expected: self.starting_total,
                found,
            }));
        }
        Ok(())
    }

    /// Applies an action and reports the outcome with a state snapshot.
    /// Rejected actions leave the hand untouched.
    pub fn player_action(&mut self, player: PlayerId, action: Action) -> ActionResult {
        let outcome = self.apply_action(player, action);
        ActionResult::from_outcome(outcome, self.snapshot())
    }

    /// Like [`Engine::player_action`], returning the error directly.
    pub fn apply_action(&mut self, player: PlayerId, action: Action) -> Result<(), GameError> {
        let outcome = self.try_action(player, &action);
        if let Err(e) = &outcome {
            if e.kind() == ErrorKind::InvalidAction {
                warn!(player, ?action, error = %e, "action rejected");
            }
        }
        outcome
    }

    fn try_action(&mut self, player: PlayerId, action: &Action) -> Result<(), GameError> {
        if !matches!(self.state, GameState::Dealing | GameState::Betting) {
            return Err(InvalidAction::NoHandInProgress.into());
        }
        let Some(stack) = self.table.player(player).map(Player::stack) else {
            return Err(InvalidAction::UnknownPlayer(player).into());
        };
        if self.betting.awaiting().is_some() {
            self.apply_bet(player, action, stack)?;
        } else if self.decisions.is_some() {
            self.apply_decision(player, action)?;
        } else {
            return Err(InvalidAction::NotPlayersTurn {
                expected: None,
                actual: player,
            }
            .into());
        }
        self.audit()?;
        self.auto_progress()
    }

    fn step_name(&self, index: usize) -> String {
        self.rules
            .step_at(index)
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }

    fn apply_bet(&mut self, player: PlayerId, action: &Action, stack: u32) -> Result<(), GameError> {
        let to_call = self
            .betting
            .valid_actions(player, stack)
            .iter()
            .find(|c| c.kind == ActionKind::Call)
            .map_or(0, |c| c.min);
        let applied = self.betting.apply_action(player, action, stack)?;
        let folded = action.kind() == ActionKind::Fold;
        if let Some(p) = self.table.player_mut(player) {
            p.take_chips(applied.paid);
            if folded {
                p.set_active(false);
            }
        }
        if folded {
            self.table.muck_hand(player);
        } else if applied.paid > to_call {
            self.last_aggressor = Some(player);
        }
        let step = self.step_name(self.next_step.saturating_sub(1));
        debug!(player, step = %step, ?action, paid = applied.paid, all_in = applied.all_in, "action applied");
        self.record.actions.push(ActionRecord {
            player,
            step,
            action: action.clone(),
            paid: applied.paid,
        });
        self.on_round_status(applied.status)
    }

    fn check_cards(
        &self,
        player: PlayerId,
        kind: ActionKind,
        indices: &[usize],
        min: usize,
        max: usize,
    ) -> Result<(), InvalidAction> {
        let held = self.table.player(player).map_or(0, |p| p.hand().len());
        let (min, max) = held_bounds(held, min, max);
        if indices.len() < min || indices.len() > max {
            return Err(InvalidAction::OutOfBounds {
                kind,
                amount: indices.len() as u32,
                min: min as u32,
                max: max as u32,
            });
        }
        self.table.check_indices(player, indices)
    }

    fn apply_decision(&mut self, player: PlayerId, action: &Action) -> Result<(), GameError> {
        let (expected, index) = match &self.decisions {
            Some(round) => (round.waiting.front().copied(), round.step),
            None => (None, self.next_step),
        };
        if expected != Some(player) {
            return Err(InvalidAction::NotPlayersTurn {
                expected,
                actual: player,
            }
            .into());
        }
        let rules = Arc::clone(&self.rules);
        let Some(step) = rules.step_at(index) else {
            return Err(violation(InvariantViolation::NoMoreSteps(format!("#{index}"))));
        };
        let not_allowed = InvalidAction::NotAllowed {
            player,
            kind: action.kind(),
        };
        match (&step.spec, action) {
            (StepSpec::Draw(spec), Action::Draw(cards)) => {
                self.check_cards(player, ActionKind::Draw, cards, spec.min, spec.max)?;
                self.table
                    .draw(&step.name, player, cards, spec.visibility)
                    .map_err(violation)?;
            }
            (StepSpec::Discard(count), Action::Discard(cards)) => {
                self.check_cards(player, ActionKind::Discard, cards, count.min, count.max)?;
                self.table.discard(player, cards);
            }
            (StepSpec::Expose(count), Action::Expose(cards)) => {
                self.check_cards(player, ActionKind::Expose, cards, count.min, count.max)?;
                self.table.expose(player, cards);
            }
            (StepSpec::Pass(spec), Action::Pass(cards)) => {
                self.check_cards(player, ActionKind::Pass, cards, spec.count, spec.count)?;
                if let Some(round) = self.decisions.as_mut() {
                    round.passes.push((player, cards.clone()));
                }
            }
            (StepSpec::Declare(options), Action::Declare(d)) => {
                if !options.contains(d) {
                    return Err(not_allowed.into());
                }
                self.declarations.insert(player, *d);
            }
            _ => return Err(not_allowed.into()),
        }
        debug!(player, step = %step.name, ?action, "decision applied");
        self.record.actions.push(ActionRecord {
            player,
            step: step.name.clone(),
            action: action.clone(),
            paid: 0,
        });
        if let Some(round) = self.decisions.as_mut() {
            round.waiting.pop_front();
        }
        self.complete_decisions();
        Ok(())
    }

    /// Ends the decision round once nobody is waiting; passes are exchanged
    /// all at once.
    fn complete_decisions(&mut self) {
        if !self
            .decisions
            .as_ref()
            .is_some_and(|round| round.waiting.is_empty())
        {
            return;
        }
        let Some(round) = self.decisions.take() else {
            return;
        };
        if let Some(StepSpec::Pass(spec)) = self.rules.step_at(round.step).map(|s| &s.spec) {
            self.table.pass_cards(&round.order, &round.passes, spec.direction);
            debug!(direction = ?spec.direction, players = round.passes.len(), "cards passed");
        }
    }

    /// Legal actions for `player` right now; empty when it is not their turn.
    /// Card decisions report `(kind, min cards, max cards)`.
    pub fn valid_actions(&self, player: PlayerId) -> Vec<ActionChoice> {
        let Some(p) = self.table.player(player) else {
            return Vec::new();
        };
        if self.betting.awaiting().is_some() {
            return self.betting.valid_actions(player, p.stack());
        }
        let Some(round) = &self.decisions else {
            return Vec::new();
        };
        if round.waiting.front() != Some(&player) {
            return Vec::new();
        }
        let held = p.hand().len();
        let cards = |kind, min, max| {
            let (min, max) = held_bounds(held, min, max);
            ActionChoice::new(kind, min as u32, max as u32)
        };
        let choice = match self.rules.step_at(round.step).map(|s| &s.spec) {
            Some(StepSpec::Draw(d)) => cards(ActionKind::Draw, d.min, d.max),
            Some(StepSpec::Discard(c)) => cards(ActionKind::Discard, c.min, c.max),
            Some(StepSpec::Expose(c)) => cards(ActionKind::Expose, c.min, c.max),
            Some(StepSpec::Pass(s)) => cards(ActionKind::Pass, s.count, s.count),
            Some(StepSpec::Declare(_)) => ActionChoice::new(ActionKind::Declare, 0, 0),
            _ => return Vec::new(),
        };
        vec![choice]
    }

    /// Declarations offered by the current declare step.
    pub fn declare_options(&self) -> &[Declaration] {
        let step = self
            .decisions
            .as_ref()
            .and_then(|round| self.rules.step_at(round.step));
        match step.map(|s| &s.spec) {
            Some(StepSpec::Declare(options)) => options.as_slice(),
            _ => &[],
        }
    }

    pub fn declarations(&self) -> &BTreeMap<PlayerId, Declaration> {
        &self.declarations
    }

    /// Player whose action the hand is waiting on.
    pub fn current_player(&self) -> Option<PlayerId> {
        self.betting.awaiting().or_else(|| {
            self.decisions
                .as_ref()
                .and_then(|round| round.waiting.front().copied())
        })
    }

    /// Most recently processed step of the current (or last) hand.
    pub fn current_step(&self) -> Option<&Step> {
        self.next_step
            .checked_sub(1)
            .and_then(|i| self.rules.step_at(i))
    }

    pub fn community(&self, zone: &str) -> Option<&[DealtCard]> {
        self.table.community(zone)
    }

    pub fn pot_total(&self) -> u32 {
        self.betting.pot_total()
    }

    pub fn pots(&self) -> Vec<Pot> {
        self.betting.pots()
    }

    pub fn hand_results(&self) -> Option<&HandResults> {
        self.results.as_ref()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.table.player(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.table.players()
    }

    pub fn dealer_seat(&self) -> Option<usize> {
        self.table.dealer_seat()
    }

    /// `owner`'s hand as `viewer` sees it; `None` entries are face down.
    pub fn visible_hand(&self, owner: PlayerId, viewer: Option<PlayerId>) -> Option<Vec<Option<Card>>> {
        self.table
            .player(owner)
            .map(|p| visible_cards(p.hand(), owner, viewer))
    }

    pub fn record(&self) -> &HandRecord {
        &self.record
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            hand_number: self.hand_number,
            state: self.state,
            step: self.current_step().map(|s| s.name.clone()),
            dealer_seat: self.table.dealer_seat(),
            current_player: self.current_player(),
            pots: self.betting.pots(),
            zones: self.table.zones().to_vec(),
            players: self
                .table
                .players()
                .map(|p| PlayerSnapshot {
                    id: p.id(),
                    seat: p.seat(),
                    stack: p.stack(),
                    active: p.is_active(),
                    visible: visible_cards(p.hand(), p.id(), None),
                })
                .collect(),
        }
    }
}
