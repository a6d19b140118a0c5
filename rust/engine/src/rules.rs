//! Rules catalog: turns a declarative game description into an immutable
//! [`GameRules`] that every hand of that variant walks step by step.
//!
//! ```
//! use varipoker_engine::rules::{GameRules, StepSpec};
//!
//! let rules = GameRules::load(r#"{
//!     "game": "Heads Up Hold'em",
//!     "players": {"min": 2, "max": 2},
//!     "deck": {"type": "standard", "cards": 52},
//!     "forcedBets": {"style": "blinds"},
//!     "bettingStructures": ["no-limit"],
//!     "gamePlay": [
//!         {"name": "Post Blinds", "bet": {"type": "blinds"}},
//!         {"name": "Deal Hole Cards", "deal": {"location": "player",
//!             "cards": [{"number": 2, "state": "face down"}]}},
//!         {"name": "Pre-Flop Bet", "bet": {"type": "small"}},
//!         {"name": "Showdown", "showdown": {"type": "final"}}
//!     ],
//!     "showdown": {"order": "clockwise", "startingFrom": "dealer",
//!         "bestHand": [{"name": "High Hand", "evaluationType": "high", "anyCards": 2}]}
//! }"#).unwrap();
//! assert!(matches!(rules.step_at(3).map(|s| &s.spec), Some(StepSpec::Showdown)));
//! assert!(rules.step_at(4).is_none());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::betting::BettingStructure;
use crate::cards::{Rank, Suit, Visibility};
use crate::deck::{DeckSpec, DeckType};
use crate::errors::ConfigError;
use crate::hand::EvalType;
use crate::player::Declaration;

/// Name of the community zone used when a deal step does not name one.
pub const DEFAULT_ZONE: &str = "board";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ForcedBetStyle {
    #[serde(rename = "blinds")]
    Blinds,
    #[serde(rename = "bring-in")]
    BringIn,
    #[serde(rename = "antes_only")]
    AntesOnly,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ForcedBetKind {
    Blinds,
    Antes,
    BringIn,
}

/// Which fixed increment a limit betting round uses.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum BetSize {
    Small,
    Big,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealLocation {
    Player,
    Community,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CardBatch {
    pub number: usize,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DealSpec {
    pub location: DealLocation,
    /// Community zone receiving the cards; `None` for player deals.
    pub zone: Option<String>,
    pub batches: Vec<CardBatch>,
}

impl DealSpec {
    pub fn card_count(&self) -> usize {
        self.batches.iter().map(|b| b.number).sum()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DrawSpec {
    pub min: usize,
    pub max: usize,
    pub visibility: Visibility,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CardCount {
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassDirection {
    Left,
    Right,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PassSpec {
    pub count: usize,
    pub direction: PassDirection,
}

/// One tagged step of the sequence of play.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum StepSpec {
    PostForcedBet(ForcedBetKind),
    Bet(BetSize),
    Deal(DealSpec),
    Draw(DrawSpec),
    Discard(CardCount),
    Expose(CardCount),
    Pass(PassSpec),
    Declare(Vec<Declaration>),
    Showdown,
}

impl StepSpec {
    /// Steps that wait on every active player's decision.
    pub fn is_decision_round(&self) -> bool {
        matches!(
            self,
            StepSpec::Draw(_)
                | StepSpec::Discard(_)
                | StepSpec::Expose(_)
                | StepSpec::Pass(_)
                | StepSpec::Declare(_)
        )
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub spec: StepSpec,
}

/// How many cards from where make up a showdown hand.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum CardSelection {
    /// Best `k` of hole and community cards together.
    Any(usize),
    /// Exactly `hole` hole cards and `community` community cards.
    Split { hole: usize, community: usize },
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BestHandSpec {
    pub name: String,
    pub evaluation: EvalType,
    pub selection: CardSelection,
    /// Community zones this hand may use; `None` means all of them.
    pub zones: Option<Vec<String>>,
    /// Low hands qualify only without pairs and with a high card at most this rank.
    pub qualifier: Option<Rank>,
    pub wild_ranks: Vec<Rank>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowdownOrder {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartingFrom {
    Dealer,
    LastAggressor,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShowdownSpec {
    pub order: ShowdownOrder,
    pub starting_from: StartingFrom,
    pub best_hand: Vec<BestHandSpec>,
}

impl ShowdownSpec {
    pub fn is_split(&self) -> bool {
        self.best_hand.len() > 1
    }
}

/// Immutable description of one poker variant. Safe to share between
/// concurrently running hands behind an `Arc`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    pub name: String,
    pub min_players: usize,
    pub max_players: usize,
    pub deck: DeckSpec,
    pub forced_bets: ForcedBetStyle,
    pub structures: Vec<BettingStructure>,
    pub steps: Vec<Step>,
    pub showdown: ShowdownSpec,
    /// Community zones in the order they are first dealt.
    pub zones: Vec<String>,
}

// Raw document shapes. Every field is optional so absence maps to
// `ConfigError::MissingField` instead of a serde message.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRules {
    game: Option<String>,
    players: Option<RawPlayers>,
    deck: Option<RawDeck>,
    forced_bets: Option<RawForcedBets>,
    betting_structures: Option<Vec<BettingStructure>>,
    game_play: Option<Vec<RawStep>>,
    showdown: Option<RawShowdown>,
}

#[derive(Debug, Deserialize)]
struct RawPlayers {
    min: usize,
    max: usize,
}

#[derive(Debug, Deserialize)]
struct RawDeck {
    #[serde(rename = "type")]
    deck_type: DeckType,
    cards: Option<usize>,
    ranks: Option<Vec<String>>,
    suits: Option<Vec<String>>,
    jokers: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct RawForcedBets {
    style: ForcedBetStyle,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    name: String,
    #[serde(flatten)]
    action: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawBet {
    #[serde(rename = "type")]
    bet_type: String,
}

#[derive(Debug, Deserialize)]
struct RawCards {
    number: Option<usize>,
    min: Option<usize>,
    max: Option<usize>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDeal {
    location: DealLocation,
    zone: Option<String>,
    cards: Vec<RawCards>,
}

#[derive(Debug, Deserialize)]
struct RawCardStep {
    cards: Vec<RawCards>,
    direction: Option<PassDirection>,
}

#[derive(Debug, Deserialize)]
struct RawDeclare {
    options: Vec<Declaration>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShowdown {
    order: Option<ShowdownOrder>,
    starting_from: Option<StartingFrom>,
    best_hand: Option<Vec<RawBestHand>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBestHand {
    name: String,
    evaluation_type: String,
    any_cards: Option<usize>,
    hole_cards: Option<usize>,
    community_cards: Option<usize>,
    zones: Option<Vec<String>>,
    qualifier: Option<String>,
    #[serde(default)]
    wild_cards: Vec<String>,
}

impl GameRules {
    /// Parses and validates a JSON rules document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when required fields are absent, a step names an
    /// unknown action kind, or the showdown asks for an evaluation the deck
    /// cannot support.
    pub fn load(config: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(config)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let raw: RawRules = serde_json::from_value(value)?;
        let name = raw.game.ok_or(ConfigError::MissingField("game"))?;
        let players = raw.players.ok_or(ConfigError::MissingField("players"))?;
        if players.min < 2 || players.min > players.max {
            return Err(ConfigError::InvalidPlayerRange {
                min: players.min,
                max: players.max,
            });
        }
        let deck = parse_deck(raw.deck.ok_or(ConfigError::MissingField("deck"))?)?;
        let forced_bets = raw
            .forced_bets
            .ok_or(ConfigError::MissingField("forcedBets"))?
            .style;
        let structures = raw
            .betting_structures
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingField("bettingStructures"))?;
        let raw_steps = raw
            .game_play
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingField("gamePlay"))?;
        let steps = raw_steps
            .into_iter()
            .map(parse_step)
            .collect::<Result<Vec<_>, _>>()?;
        let showdown = parse_showdown(raw.showdown.ok_or(ConfigError::MissingField("showdown"))?)?;

        let mut zones: Vec<String> = Vec::new();
        for step in &steps {
            if let StepSpec::Deal(DealSpec {
                zone: Some(zone), ..
            }) = &step.spec
            {
                if !zones.contains(zone) {
                    zones.push(zone.clone());
                }
            }
        }

        let rules = Self {
            name,
            min_players: players.min,
            max_players: players.max,
            deck,
            forced_bets,
            structures,
            steps,
            showdown,
            zones,
        };
        rules.validate()?;
        Ok(rules)
    }

    /// Step at `index`, or `None` once the sequence is exhausted.
    pub fn step_at(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn has_declare(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.spec, StepSpec::Declare(_)))
    }

    pub fn permits(&self, structure: BettingStructure) -> bool {
        self.structures.contains(&structure)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.steps.last() {
            Some(Step {
                spec: StepSpec::Showdown,
                ..
            }) => {}
            _ => {
                return Err(ConfigError::Inconsistent(
                    "the sequence of play must end with a showdown step".into(),
                ))
            }
        }

        for step in &self.steps {
            match &step.spec {
                StepSpec::PostForcedBet(ForcedBetKind::Blinds)
                    if self.forced_bets != ForcedBetStyle::Blinds =>
                {
                    return Err(ConfigError::InvalidStep {
                        step: step.name.clone(),
                        reason: format!("blinds posted in a {:?} game", self.forced_bets),
                    });
                }
                StepSpec::PostForcedBet(ForcedBetKind::BringIn)
                    if self.forced_bets != ForcedBetStyle::BringIn =>
                {
                    return Err(ConfigError::InvalidStep {
                        step: step.name.clone(),
                        reason: format!("bring-in posted in a {:?} game", self.forced_bets),
                    });
                }
                _ => {}
            }
        }

        for hand in &self.showdown.best_hand {
            check_deck_supports(&self.deck, hand)?;
            if let Some(zones) = &hand.zones {
                if let Some(zone) = zones.iter().find(|z| !self.zones.contains(z)) {
                    return Err(ConfigError::UnknownZone {
                        hand: hand.name.clone(),
                        zone: zone.clone(),
                    });
                }
            }
        }
        if self.has_declare() && !self.showdown.is_split() {
            return Err(ConfigError::Inconsistent(
                "a declare step needs both a high and a low best hand".into(),
            ));
        }

        let mut per_player = 0;
        let mut community = 0;
        for step in &self.steps {
            if let StepSpec::Deal(deal) = &step.spec {
                match deal.location {
                    DealLocation::Player => per_player += deal.card_count(),
                    DealLocation::Community => community += deal.card_count(),
                }
            }
        }
        let needed = per_player * self.max_players + community;
        if needed > self.deck.size() {
            return Err(ConfigError::DeckTooSmall {
                needed,
                players: self.max_players,
                available: self.deck.size(),
            });
        }
        Ok(())
    }
}

fn parse_deck(raw: RawDeck) -> Result<DeckSpec, ConfigError> {
    let mut spec = DeckSpec::of_type(raw.deck_type);
    if let Some(ranks) = raw.ranks {
        spec.ranks = ranks
            .iter()
            .map(|r| r.parse::<Rank>().map_err(ConfigError::Parse))
            .collect::<Result<_, _>>()?;
    }
    if let Some(suits) = raw.suits {
        spec.suits = suits
            .iter()
            .map(|s| s.parse::<Suit>().map_err(ConfigError::Parse))
            .collect::<Result<_, _>>()?;
    }
    if let Some(jokers) = raw.jokers {
        spec.jokers = jokers;
    }
    if spec.ranks.contains(&Rank::Joker) {
        return Err(ConfigError::Parse(
            "jokers are declared with `jokers`, not as a rank".into(),
        ));
    }
    if let Some(declared) = raw.cards {
        if declared != spec.size() {
            return Err(ConfigError::DeckSizeMismatch {
                declared,
                actual: spec.size(),
            });
        }
    }
    Ok(spec)
}

fn parse_visibility(step: &str, state: Option<&str>) -> Result<Visibility, ConfigError> {
    match state.unwrap_or("face down") {
        "face down" | "face_down" => Ok(Visibility::FaceDown),
        "face up" | "face_up" => Ok(Visibility::FaceUp),
        other => Err(ConfigError::InvalidStep {
            step: step.to_string(),
            reason: format!("unknown card state `{other}`"),
        }),
    }
}

fn payload<T: serde::de::DeserializeOwned>(step: &str, value: Value) -> Result<T, ConfigError> {
    serde_json::from_value(value).map_err(|e| ConfigError::InvalidStep {
        step: step.to_string(),
        reason: e.to_string(),
    })
}

/// Reads a `{number}` or `{min, max}` card count.
fn card_count(step: &str, cards: &[RawCards]) -> Result<(CardCount, Visibility), ConfigError> {
    let [raw] = cards else {
        return Err(ConfigError::InvalidStep {
            step: step.to_string(),
            reason: "expected exactly one card entry".into(),
        });
    };
    let (min, max) = match (raw.number, raw.min, raw.max) {
        (Some(n), None, None) => (n, n),
        (None, min, Some(max)) => (min.unwrap_or(0), max),
        _ => {
            return Err(ConfigError::InvalidStep {
                step: step.to_string(),
                reason: "card entry needs `number` or `max`".into(),
            })
        }
    };
    if min > max {
        return Err(ConfigError::InvalidStep {
            step: step.to_string(),
            reason: format!("min {min} exceeds max {max}"),
        });
    }
    Ok((
        CardCount { min, max },
        parse_visibility(step, raw.state.as_deref())?,
    ))
}

fn parse_step(raw: RawStep) -> Result<Step, ConfigError> {
    let name = raw.name;
    if raw.action.len() != 1 {
        return Err(ConfigError::AmbiguousStep {
            step: name,
            found: raw.action.len(),
        });
    }
    let Some((kind, value)) = raw.action.into_iter().next() else {
        return Err(ConfigError::AmbiguousStep {
            step: name,
            found: 0,
        });
    };
    let spec = match kind.as_str() {
        "bet" => {
            let bet: RawBet = payload(&name, value)?;
            match bet.bet_type.as_str() {
                "blinds" => StepSpec::PostForcedBet(ForcedBetKind::Blinds),
                "antes" => StepSpec::PostForcedBet(ForcedBetKind::Antes),
                "bring-in" => StepSpec::PostForcedBet(ForcedBetKind::BringIn),
                "small" => StepSpec::Bet(BetSize::Small),
                "big" => StepSpec::Bet(BetSize::Big),
                other => {
                    return Err(ConfigError::InvalidStep {
                        step: name,
                        reason: format!("unknown bet type `{other}`"),
                    })
                }
            }
        }
        "deal" => {
            let deal: RawDeal = payload(&name, value)?;
            let batches = deal
                .cards
                .iter()
                .map(|c| {
                    Ok(CardBatch {
                        number: c.number.unwrap_or(0),
                        visibility: parse_visibility(&name, c.state.as_deref())?,
                    })
                })
                .collect::<Result<Vec<_>, ConfigError>>()?;
            if batches.iter().all(|b| b.number == 0) {
                return Err(ConfigError::InvalidStep {
                    step: name,
                    reason: "deal step deals no cards".into(),
                });
            }
            let zone = match deal.location {
                DealLocation::Player => None,
                DealLocation::Community => {
                    Some(deal.zone.unwrap_or_else(|| DEFAULT_ZONE.to_string()))
                }
            };
            StepSpec::Deal(DealSpec {
                location: deal.location,
                zone,
                batches,
            })
        }
        "draw" => {
            let draw: RawCardStep = payload(&name, value)?;
            let (count, visibility) = card_count(&name, &draw.cards)?;
            StepSpec::Draw(DrawSpec {
                min: count.min,
                max: count.max,
                visibility,
            })
        }
        "discard" => {
            let discard: RawCardStep = payload(&name, value)?;
            StepSpec::Discard(card_count(&name, &discard.cards)?.0)
        }
        "expose" => {
            let expose: RawCardStep = payload(&name, value)?;
            StepSpec::Expose(card_count(&name, &expose.cards)?.0)
        }
        "pass" => {
            let pass: RawCardStep = payload(&name, value)?;
            let (count, _) = card_count(&name, &pass.cards)?;
            if count.min != count.max || count.max == 0 {
                return Err(ConfigError::InvalidStep {
                    step: name,
                    reason: "pass needs a fixed, non-zero card count".into(),
                });
            }
            StepSpec::Pass(PassSpec {
                count: count.max,
                direction: pass.direction.unwrap_or(PassDirection::Left),
            })
        }
        "declare" => {
            let declare: RawDeclare = payload(&name, value)?;
            if declare.options.is_empty() {
                return Err(ConfigError::InvalidStep {
                    step: name,
                    reason: "declare needs at least one option".into(),
                });
            }
            StepSpec::Declare(declare.options)
        }
        "showdown" => StepSpec::Showdown,
        _ => return Err(ConfigError::UnknownAction { step: name, kind }),
    };
    Ok(Step { name, spec })
}

fn parse_showdown(raw: RawShowdown) -> Result<ShowdownSpec, ConfigError> {
    let hands = raw
        .best_hand
        .filter(|h| !h.is_empty())
        .ok_or(ConfigError::MissingField("showdown.bestHand"))?;
    let best_hand = hands
        .into_iter()
        .map(|h| {
            let evaluation: EvalType = h
                .evaluation_type
                .parse()
                .map_err(|_| ConfigError::UnknownEvaluation(h.evaluation_type.clone()))?;
            let selection = match (h.any_cards, h.hole_cards, h.community_cards) {
                (Some(k), None, None) if k > 0 => CardSelection::Any(k),
                (None, Some(hole), Some(community)) if hole + community > 0 => {
                    CardSelection::Split { hole, community }
                }
                _ => {
                    return Err(ConfigError::Inconsistent(format!(
                        "best hand `{}` needs `anyCards` or `holeCards` + `communityCards`",
                        h.name
                    )))
                }
            };
            let qualifier = h
                .qualifier
                .as_deref()
                .map(str::parse::<Rank>)
                .transpose()
                .map_err(ConfigError::Parse)?;
            let wild_ranks = h
                .wild_cards
                .iter()
                .map(|r| r.parse::<Rank>().map_err(ConfigError::Parse))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(BestHandSpec {
                name: h.name,
                evaluation,
                selection,
                zones: h.zones,
                qualifier,
                wild_ranks,
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;
    Ok(ShowdownSpec {
        order: raw.order.unwrap_or(ShowdownOrder::Clockwise),
        starting_from: raw.starting_from.unwrap_or(StartingFrom::Dealer),
        best_hand,
    })
}

fn check_deck_supports(deck: &DeckSpec, hand: &BestHandSpec) -> Result<(), ConfigError> {
    let incompatible = |reason: String| ConfigError::IncompatibleDeck {
        evaluation: hand.evaluation.to_string(),
        reason,
    };
    match hand.evaluation {
        EvalType::Badugi => {
            if deck.distinct_suits() < 4 {
                return Err(incompatible(format!(
                    "badugi needs 4 distinct suits, deck has {}",
                    deck.distinct_suits()
                )));
            }
            if deck.distinct_ranks() < 4 {
                return Err(incompatible(format!(
                    "badugi needs 4 distinct ranks, deck has {}",
                    deck.distinct_ranks()
                )));
            }
        }
        EvalType::A5Low | EvalType::Low27 if deck.distinct_ranks() < 5 => {
            return Err(incompatible(format!(
                "lowball needs 5 distinct ranks, deck has {}",
                deck.distinct_ranks()
            )));
        }
        EvalType::HighWild if deck.jokers == 0 && hand.wild_ranks.is_empty() => {
            return Err(incompatible(
                "wild evaluation needs jokers or `wildCards`".into(),
            ));
        }
        _ => {}
    }
    if let Some(q) = hand.qualifier {
        if !hand.evaluation.is_low() {
            return Err(incompatible(format!(
                "qualifier {q:?} only applies to low evaluations"
            )));
        }
    }
    Ok(())
}
