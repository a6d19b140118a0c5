//! Showdown: best hands per best-hand rule, then pot-by-pot awards.
//!
//! Pots are settled independently. Each pot is shared between the best-hand
//! rules that have a winner (the first rule, conventionally high, takes the
//! odd chip). A rule nobody qualifies for hands its share to the others.
//! Within one rule, tied winners split evenly and odd chips go one at a time
//! in seat order starting left of the dealer.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::cards::Card;
use crate::game::{Award, HandResults, PotResult, ShownHand};
use crate::hand::{evaluate_best_split, evaluate_best_with_wilds, HandRank};
use crate::player::{Declaration, PlayerId};
use crate::pot::{split, Pot};
use crate::rules::{BestHandSpec, CardSelection, ShowdownOrder, ShowdownSpec};
use crate::table::Table;

/// Best hand `hole` makes under `spec` with the table's community cards,
/// or `None` when no legal hand exists or a low qualifier is missed.
pub fn best_hand(spec: &BestHandSpec, hole: &[Card], table: &Table) -> Option<(HandRank, Vec<Card>)> {
    let board = table.community_cards(spec.zones.as_deref());
    let best = match spec.selection {
        CardSelection::Any(k) => {
            let all: Vec<Card> = hole.iter().chain(board.iter()).copied().collect();
            evaluate_best_with_wilds(&all, k, spec.evaluation, &spec.wild_ranks)
        }
        CardSelection::Split { hole: h, community } => {
            evaluate_best_split(hole, h, &board, community, spec.evaluation, &spec.wild_ranks)
        }
    }?;
    match spec.qualifier {
        Some(q) if !best.0.qualifies_low(q) => None,
        _ => Some(best),
    }
}

/// Which best-hand rules a declaration lets a player contest. Rule 0 is the
/// high side, rule 1 the low side.
fn may_contest(declaration: Option<Declaration>, rule: usize) -> bool {
    match (declaration, rule) {
        (None, _) => true,
        (Some(d), 0) => d.contests_high(),
        (Some(d), 1) => d.contests_low(),
        (Some(_), _) => true,
    }
}

/// Players in `contenders` holding the best hand for `rule`.
fn best_of(hands: &BTreeMap<(usize, PlayerId), ShownHand>, rule: usize, contenders: &[PlayerId]) -> Vec<PlayerId> {
    let best = contenders
        .iter()
        .filter_map(|p| hands.get(&(rule, *p)))
        .map(|h| h.rank.ordinal)
        .min();
    let Some(best) = best else {
        return Vec::new();
    };
    contenders
        .iter()
        .copied()
        .filter(|p| hands.get(&(rule, *p)).is_some_and(|h| h.rank.ordinal == best))
        .collect()
}

/// Resolves every pot among the live players.
///
/// `order` lists live players clockwise starting left of the dealer and sets
/// odd-chip priority. `first_to_show` rotates the reveal order (the last
/// aggressor shows first in some games).
pub fn resolve(
    spec: &ShowdownSpec,
    table: &Table,
    pots: &[Pot],
    order: &[PlayerId],
    first_to_show: Option<PlayerId>,
    declarations: &BTreeMap<PlayerId, Declaration>,
) -> HandResults {
    let mut reveal: Vec<PlayerId> = order.to_vec();
    if spec.order == ShowdownOrder::CounterClockwise {
        reveal.reverse();
    }
    if let Some(pos) = first_to_show.and_then(|f| reveal.iter().position(|&p| p == f)) {
        reveal.rotate_left(pos);
    }

    let mut hands: BTreeMap<(usize, PlayerId), ShownHand> = BTreeMap::new();
    let mut shown = Vec::new();
    for &player in &reveal {
        let Some(hole) = table.player(player).map(|p| p.cards()) else {
            continue;
        };
        for (rule, bh) in spec.best_hand.iter().enumerate() {
            if let Some((rank, cards)) = best_hand(bh, &hole, table) {
                let hand = ShownHand {
                    player,
                    hand_name: bh.name.clone(),
                    rank,
                    cards,
                };
                debug!(player, hand = %bh.name, ordinal = rank.ordinal, "hand shown");
                shown.push(hand.clone());
                hands.insert((rule, player), hand);
            }
        }
    }

    let mut results = HandResults {
        hands: shown,
        ..HandResults::default()
    };
    for (index, pot) in pots.iter().enumerate() {
        let eligible: Vec<PlayerId> = order
            .iter()
            .copied()
            .filter(|p| pot.eligible.contains(p))
            .collect();
        let awards = award_pot(spec, pot.amount, &eligible, &hands, declarations);
        for a in &awards {
            info!(pot = index, player = a.player, amount = a.amount, hand = ?a.hand_name, "pot awarded");
            if !results.winners.contains(&a.player) {
                results.winners.push(a.player);
            }
            if let Some(name) = &a.hand_name {
                let rule = spec.best_hand.iter().position(|b| &b.name == name);
                if let Some(h) = rule.and_then(|r| hands.get(&(r, a.player))) {
                    if !results.winning_hands.contains(h) {
                        results.winning_hands.push(h.clone());
                    }
                }
            }
        }
        results.pots.push(PotResult {
            amount: pot.amount,
            eligible: pot.eligible.clone(),
            awards,
        });
    }
    results
}

fn award_pot(
    spec: &ShowdownSpec,
    amount: u32,
    eligible: &[PlayerId],
    hands: &BTreeMap<(usize, PlayerId), ShownHand>,
    declarations: &BTreeMap<PlayerId, Declaration>,
) -> Vec<Award> {
    let rules = spec.best_hand.len();
    let mut contenders: Vec<Vec<PlayerId>> = (0..rules)
        .map(|rule| {
            eligible
                .iter()
                .copied()
                .filter(|p| may_contest(declarations.get(p).copied(), rule))
                .collect()
        })
        .collect();

    // Declaring both ways means winning (or tying) both ways; anyone who
    // falls short is out of the pot entirely.
    let winners = loop {
        let winners: Vec<Vec<PlayerId>> = (0..rules).map(|r| best_of(hands, r, &contenders[r])).collect();
        let busted: Vec<PlayerId> = eligible
            .iter()
            .copied()
            .filter(|p| declarations.get(p) == Some(&Declaration::HighLow))
            .filter(|p| contenders.iter().any(|c| c.contains(p)))
            .filter(|p| winners.iter().take(2).any(|w| !w.contains(p)))
            .collect();
        if busted.is_empty() {
            break winners;
        }
        debug!(?busted, "both-way declarations failed");
        for c in &mut contenders {
            c.retain(|p| !busted.contains(p));
        }
    };

    let sides: Vec<usize> = (0..rules).filter(|&r| !winners[r].is_empty()).collect();
    if sides.is_empty() {
        // nobody holds a scoring hand: the eligible players chop
        return split(amount, eligible)
            .into_iter()
            .map(|(player, amount)| Award {
                player,
                amount,
                hand_name: None,
            })
            .collect();
    }
    let shares = split(amount, &sides);
    let mut awards: Vec<Award> = Vec::new();
    for (rule, share) in shares {
        for (player, chips) in split(share, &winners[rule]) {
            if chips == 0 {
                continue;
            }
            awards.push(Award {
                player,
                amount: chips,
                hand_name: Some(spec.best_hand[rule].name.clone()),
            });
        }
    }
    awards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;
    use crate::hand::{evaluate, EvalType};

    fn shown(rule: usize, player: PlayerId, cards: &str, eval: EvalType) -> ((usize, PlayerId), ShownHand) {
        let cards = parse_cards(cards).unwrap();
        let rank = evaluate(&cards, eval).unwrap();
        (
            (rule, player),
            ShownHand {
                player,
                hand_name: format!("rule{rule}"),
                rank,
                cards,
            },
        )
    }

    fn spec(rules: usize) -> ShowdownSpec {
        let bh = |i: usize, evaluation| BestHandSpec {
            name: format!("rule{i}"),
            evaluation,
            selection: CardSelection::Any(5),
            zones: None,
            qualifier: None,
            wild_ranks: Vec::new(),
        };
        let mut best_hand = vec![bh(0, EvalType::High)];
        if rules > 1 {
            best_hand.push(bh(1, EvalType::A5Low));
        }
        ShowdownSpec {
            order: ShowdownOrder::Clockwise,
            starting_from: crate::rules::StartingFrom::Dealer,
            best_hand,
        }
    }

    #[test]
    fn high_takes_odd_chip_in_hi_lo_split() {
        let hands: BTreeMap<_, _> = [
            shown(0, 0, "As Ad Ac Kd Kc", EvalType::High),
            shown(1, 0, "As Ad Ac Kd Kc", EvalType::A5Low),
            shown(0, 1, "5c 4d 3h 2s Ah", EvalType::High),
            shown(1, 1, "5c 4d 3h 2s Ah", EvalType::A5Low),
        ]
        .into_iter()
        .collect();
        let awards = award_pot(&spec(2), 101, &[0, 1], &hands, &BTreeMap::new());
        assert_eq!(awards[0].player, 0);
        assert_eq!(awards[0].amount, 51);
        assert_eq!(awards[1].player, 1);
        assert_eq!(awards[1].amount, 50);
    }

    #[test]
    fn high_scoops_without_a_low() {
        let hands: BTreeMap<_, _> = [
            shown(0, 0, "As Ad Ac Kd Kc", EvalType::High),
            shown(0, 1, "Qc Qd Jh 9s 8h", EvalType::High),
        ]
        .into_iter()
        .collect();
        let awards = award_pot(&spec(2), 100, &[0, 1], &hands, &BTreeMap::new());
        assert_eq!(awards.len(), 1);
        assert_eq!((awards[0].player, awards[0].amount), (0, 100));
    }

    #[test]
    fn failed_both_way_declaration_forfeits_the_pot() {
        let hands: BTreeMap<_, _> = [
            shown(0, 0, "As Ad Ac Kd Kc", EvalType::High),
            shown(1, 0, "As Ad Ac Kd Kc", EvalType::A5Low),
            shown(0, 1, "Qc Qd Jh 9s 8h", EvalType::High),
            shown(1, 1, "Qc Qd Jh 9s 8h", EvalType::A5Low),
        ]
        .into_iter()
        .collect();
        let declarations = BTreeMap::from([(0, Declaration::HighLow), (1, Declaration::Low)]);
        let awards = award_pot(&spec(2), 100, &[0, 1], &hands, &declarations);
        // player 0 would win high but has the worse low; player 1 scoops
        assert_eq!(awards.len(), 1);
        assert_eq!((awards[0].player, awards[0].amount), (1, 100));
    }

    #[test]
    fn tied_winners_split_odd_chip_from_the_front() {
        let hands: BTreeMap<_, _> = [
            shown(0, 3, "As Kd Qc Jd 9c", EvalType::High),
            shown(0, 1, "Ac Kh Qs Jh 9d", EvalType::High),
        ]
        .into_iter()
        .collect();
        let awards = award_pot(&spec(1), 7, &[3, 1], &hands, &BTreeMap::new());
        assert_eq!((awards[0].player, awards[0].amount), (3, 4));
        assert_eq!((awards[1].player, awards[1].amount), (1, 3));
    }
}
