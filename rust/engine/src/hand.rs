//! Hand evaluation under named policies.
//!
//! Every policy returns a [`HandRank`] whose ordering is normalized so the
//! smaller value is always the better hand.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cards::{all_ranks, Card, Rank, Suit};
use crate::lookup::{self, Signature, MAX_TABLE_CARDS};

/// Named policy deciding what makes a winning hand.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum EvalType {
    #[serde(rename = "high")]
    High,
    /// Ace always low; straights and flushes are ignored.
    #[serde(rename = "a5_low")]
    A5Low,
    /// Ace always high; straights and flushes count against.
    #[serde(rename = "27_low")]
    Low27,
    #[serde(rename = "badugi")]
    Badugi,
    /// High hand with wild cards; five of a kind tops the ranking.
    #[serde(rename = "high_wild")]
    HighWild,
    /// Highest pip total wins (a perfect hand totals 49).
    #[serde(rename = "49")]
    Pip49,
    /// Lowest pip total wins.
    #[serde(rename = "zero")]
    PipZero,
    /// Pip total closest to six wins, under beating over.
    #[serde(rename = "6")]
    Pip6,
    /// Blackjack total closest to 21.
    #[serde(rename = "21")]
    TwentyOne,
}

impl EvalType {
    pub fn name(self) -> &'static str {
        match self {
            EvalType::High => "high",
            EvalType::A5Low => "a5_low",
            EvalType::Low27 => "27_low",
            EvalType::Badugi => "badugi",
            EvalType::HighWild => "high_wild",
            EvalType::Pip49 => "49",
            EvalType::PipZero => "zero",
            EvalType::Pip6 => "6",
            EvalType::TwentyOne => "21",
        }
    }

    pub fn is_low(self) -> bool {
        matches!(self, EvalType::A5Low | EvalType::Low27 | EvalType::Badugi)
    }

    fn uses_table(self) -> bool {
        matches!(
            self,
            EvalType::High | EvalType::HighWild | EvalType::A5Low | EvalType::Low27
        )
    }
}

impl fmt::Display for EvalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EvalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let eval = match s {
            "high" => EvalType::High,
            "a5_low" => EvalType::A5Low,
            "27_low" => EvalType::Low27,
            "badugi" => EvalType::Badugi,
            "high_wild" => EvalType::HighWild,
            "49" => EvalType::Pip49,
            "zero" => EvalType::PipZero,
            "6" => EvalType::Pip6,
            "21" => EvalType::TwentyOne,
            other => return Err(format!("unknown evaluation type `{other}`")),
        };
        Ok(eval)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Category {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    FiveOfAKind,
    /// Badugi with this many qualifying cards.
    Badugi(u8),
    /// Pip-count and 21 policies report the counted total.
    Points(u32),
}

impl Category {
    /// Position in the standard high ranking (zero for non-category results).
    pub fn index(self) -> u32 {
        match self {
            Category::HighCard => 0,
            Category::OnePair => 1,
            Category::TwoPair => 2,
            Category::ThreeOfAKind => 3,
            Category::Straight => 4,
            Category::Flush => 5,
            Category::FullHouse => 6,
            Category::FourOfAKind => 7,
            Category::StraightFlush => 8,
            Category::FiveOfAKind => 9,
            Category::Badugi(_) | Category::Points(_) => 0,
        }
    }
}

/// Totally ordered hand value; smaller is better under every policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct HandRank {
    pub ordinal: u32,
    pub category: Category,
    // kickers: ordered by tiebreak priority, in policy terms (ace low = 1)
    pub kickers: [u8; 5],
}

impl HandRank {
    pub fn is_better_than(&self, other: &HandRank) -> bool {
        self.ordinal < other.ordinal
    }

    /// Whether a low hand meets an "N or better" qualifier: no pair and no
    /// card above `ceiling`.
    pub fn qualifies_low(&self, ceiling: Rank) -> bool {
        let ceiling = ceiling.value();
        match self.category {
            Category::HighCard => self.kickers[0] <= ceiling,
            Category::Badugi(n) => n == 4 && self.kickers[0] <= ceiling,
            _ => false,
        }
    }
}

/// Evaluates `cards` under `eval`, treating jokers as wild.
///
/// Jokers substitute under every category policy, not only `HighWild`;
/// only the `HighWild` table ranks five of a kind. Pip policies count a
/// joker as zero and badugi leaves it out.
///
/// Category policies accept one to five cards; use [`evaluate_best`] to
/// pick the best five out of more.
pub fn evaluate(cards: &[Card], eval: EvalType) -> Option<HandRank> {
    evaluate_with_wilds(cards, eval, &[])
}

/// Like [`evaluate`], with extra ranks (e.g. deuces) playing wild.
pub fn evaluate_with_wilds(cards: &[Card], eval: EvalType, wild_ranks: &[Rank]) -> Option<HandRank> {
    if cards.is_empty() {
        return None;
    }
    match eval {
        _ if eval.uses_table() => evaluate_table(cards, eval, wild_ranks),
        EvalType::Badugi => Some(evaluate_badugi(cards)),
        EvalType::TwentyOne => Some(evaluate_twenty_one(cards)),
        _ => Some(evaluate_pips(cards, eval)),
    }
}

fn evaluate_table(cards: &[Card], eval: EvalType, wild_ranks: &[Rank]) -> Option<HandRank> {
    if cards.len() > MAX_TABLE_CARDS {
        return None;
    }
    let is_wild = |c: &Card| c.is_joker() || wild_ranks.contains(&c.rank);
    let naturals: Vec<Card> = cards.iter().filter(|c| !is_wild(c)).copied().collect();
    let wilds = cards.len() - naturals.len();
    let natural_ranks: Vec<u8> = naturals.iter().map(|c| c.rank.value()).collect();
    let one_suit = naturals
        .first()
        .map_or(true, |f| naturals.iter().all(|c| c.suit == f.suit));

    let to_rank = |e: lookup::TableEntry| HandRank {
        ordinal: e.ordinal,
        category: e.category,
        kickers: e.kickers,
    };
    if wilds == 0 {
        let sig = Signature::new(&natural_ranks, one_suit);
        return lookup::lookup(eval, &sig).map(to_rank);
    }

    let mut best: Option<HandRank> = None;
    for subs in rank_multisets(wilds) {
        let mut ranks = natural_ranks.clone();
        ranks.extend(subs);
        let suit_options: &[bool] = if one_suit { &[false, true] } else { &[false] };
        for &suited in suit_options {
            if let Some(entry) = lookup::lookup(eval, &Signature::new(&ranks, suited)) {
                let candidate = to_rank(entry);
                if best.map_or(true, |b| candidate < b) {
                    best = Some(candidate);
                }
            }
        }
    }
    best
}

/// Non-increasing sequences of `n` natural rank values.
fn rank_multisets(n: usize) -> Vec<Vec<u8>> {
    let values: Vec<u8> = all_ranks().iter().map(|r| r.value()).collect();
    let mut out = Vec::new();
    let mut cur = Vec::with_capacity(n);
    fn go(values: &[u8], n: usize, start: usize, cur: &mut Vec<u8>, out: &mut Vec<Vec<u8>>) {
        if cur.len() == n {
            out.push(cur.clone());
            return;
        }
        for i in start..values.len() {
            cur.push(values[i]);
            go(values, n, i, cur, out);
            cur.pop();
        }
    }
    go(&values, n, 0, &mut cur, &mut out);
    out
}

fn ace_low(r: Rank) -> u8 {
    if r == Rank::Ace {
        1
    } else {
        r.value()
    }
}

/// Best badugi inside `cards`: the largest subset with distinct ranks and
/// suits, then the lowest top card (ace low). Jokers never play.
fn evaluate_badugi(cards: &[Card]) -> HandRank {
    let usable: Vec<Card> = cards.iter().filter(|c| !c.is_joker()).copied().collect();
    let mut best: Option<(u8, [u8; 4])> = None;
    for size in (1..=usable.len().min(4)).rev() {
        for idx in combinations(usable.len(), size) {
            let subset: Vec<Card> = idx.iter().map(|&i| usable[i]).collect();
            let mut suits: Vec<Suit> = subset.iter().map(|c| c.suit).collect();
            let mut ranks: Vec<u8> = subset.iter().map(|c| ace_low(c.rank)).collect();
            suits.sort_unstable();
            suits.dedup();
            ranks.sort_unstable_by(|a, b| b.cmp(a));
            let distinct_ranks = ranks.windows(2).all(|w| w[0] != w[1]);
            if suits.len() != size || !distinct_ranks {
                continue;
            }
            let mut key = [0u8; 4];
            key[..size].copy_from_slice(&ranks);
            if best.map_or(true, |(_, k)| key < k) {
                best = Some((size as u8, key));
            }
        }
        if best.is_some() {
            break;
        }
    }
    let (size, key) = best.unwrap_or((0, [0; 4]));
    let ordinal = key
        .iter()
        .fold(u32::from(4 - size), |acc, r| acc * 16 + u32::from(*r));
    HandRank {
        ordinal,
        category: Category::Badugi(size),
        kickers: [key[0], key[1], key[2], key[3], 0],
    }
}

/// Pip value used by the `49`, `zero` and `6` policies: ace 1, number cards
/// face value, court cards and jokers 0.
pub fn pip_value(c: &Card) -> u32 {
    match c.rank {
        Rank::Ace => 1,
        Rank::Jack | Rank::Queen | Rank::King | Rank::Joker => 0,
        r => u32::from(r.value()),
    }
}

fn sorted_kickers(cards: &[Card]) -> [u8; 5] {
    let mut ranks: Vec<u8> = cards.iter().map(|c| c.rank.value()).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));
    let mut k = [0u8; 5];
    for (slot, r) in k.iter_mut().zip(ranks) {
        *slot = r;
    }
    k
}

fn evaluate_pips(cards: &[Card], eval: EvalType) -> HandRank {
    let total: u32 = cards.iter().map(pip_value).sum();
    let ordinal = match eval {
        EvalType::Pip49 => 10_000u32.saturating_sub(total),
        EvalType::Pip6 => total.abs_diff(6) * 2 + u32::from(total > 6),
        _ => total,
    };
    HandRank {
        ordinal,
        category: Category::Points(total),
        kickers: sorted_kickers(cards),
    }
}

/// Blackjack total: aces count 11 while that stays at or under 21.
pub fn blackjack_total(cards: &[Card]) -> u32 {
    let mut total: u32 = 0;
    let mut aces = 0;
    for c in cards {
        total += match c.rank {
            Rank::Ace => {
                aces += 1;
                1
            }
            Rank::Jack | Rank::Queen | Rank::King => 10,
            Rank::Joker => 0,
            r => u32::from(r.value()),
        };
    }
    while aces > 0 && total + 10 <= 21 {
        total += 10;
        aces -= 1;
    }
    total
}

fn evaluate_twenty_one(cards: &[Card]) -> HandRank {
    let total = blackjack_total(cards);
    let distance = total.abs_diff(21);
    // Equal distance: highest card by rank then suit wins.
    let top = cards
        .iter()
        .map(|c| u32::from(c.rank.value()) * 4 + c.suit.index() as u32)
        .max()
        .unwrap_or(0);
    HandRank {
        ordinal: (distance << 8) | (255 - top),
        category: Category::Points(total),
        kickers: sorted_kickers(cards),
    }
}

/// Index sets of every `k`-subset of `0..n`, in lexicographic order.
pub fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k > n {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());
        let Some(i) = (0..k).rev().find(|&i| idx[i] != i + n - k) else {
            return out;
        };
        idx[i] += 1;
        for j in i + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

/// Best `k`-card subset of `cards` (all of them when fewer than `k`).
/// Ties keep the first subset found in lexicographic order.
pub fn evaluate_best(cards: &[Card], k: usize, eval: EvalType) -> Option<(HandRank, Vec<Card>)> {
    evaluate_best_with_wilds(cards, k, eval, &[])
}

pub fn evaluate_best_with_wilds(
    cards: &[Card],
    k: usize,
    eval: EvalType,
    wild_ranks: &[Rank],
) -> Option<(HandRank, Vec<Card>)> {
    let k = k.min(cards.len());
    let mut best: Option<(HandRank, Vec<Card>)> = None;
    for idx in combinations(cards.len(), k) {
        let subset: Vec<Card> = idx.iter().map(|&i| cards[i]).collect();
        if let Some(rank) = evaluate_with_wilds(&subset, eval, wild_ranks) {
            if best.as_ref().map_or(true, |(b, _)| rank < *b) {
                best = Some((rank, subset));
            }
        }
    }
    best
}

/// Best hand using exactly `hole_k` cards from `hole` and `board_k` from
/// `board` (Omaha style).
pub fn evaluate_best_split(
    hole: &[Card],
    hole_k: usize,
    board: &[Card],
    board_k: usize,
    eval: EvalType,
    wild_ranks: &[Rank],
) -> Option<(HandRank, Vec<Card>)> {
    if hole.len() < hole_k || board.len() < board_k {
        return None;
    }
    let mut best: Option<(HandRank, Vec<Card>)> = None;
    for h in combinations(hole.len(), hole_k) {
        for b in combinations(board.len(), board_k) {
            let subset: Vec<Card> = h
                .iter()
                .map(|&i| hole[i])
                .chain(b.iter().map(|&i| board[i]))
                .collect();
            if let Some(rank) = evaluate_with_wilds(&subset, eval, wild_ranks) {
                if best.as_ref().map_or(true, |(r, _)| rank < *r) {
                    best = Some((rank, subset));
                }
            }
        }
    }
    best
}
