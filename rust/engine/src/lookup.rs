//! Rank tables for the category-based evaluation policies.
//!
//! A table maps a canonical hand signature (rank multiset plus a suited
//! flag) to a dense ordinal where 0 is the best hand. Tables are produced by
//! a [`TableLoader`] on first use of each policy and cached for the rest of
//! the process; after warm-up they are read-only.

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::{debug, info};

use crate::hand::{Category, EvalType};

/// Largest hand a table covers.
pub const MAX_TABLE_CARDS: usize = 5;

/// Canonical signature of up to five cards: rank values sorted high to low
/// (Ace = 14, zero padded) and whether they are five distinct ranks of one suit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Signature {
    pub ranks: [u8; MAX_TABLE_CARDS],
    pub suited: bool,
}

impl Signature {
    /// `ranks` may be in any order; at most five values in `2..=14`.
    pub fn new(ranks: &[u8], suited: bool) -> Self {
        let mut sorted = [0u8; MAX_TABLE_CARDS];
        for (slot, r) in sorted.iter_mut().zip(ranks) {
            *slot = *r;
        }
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let distinct = ranks.len() == MAX_TABLE_CARDS && sorted.windows(2).all(|w| w[0] != w[1]);
        Self {
            ranks: sorted,
            suited: suited && distinct,
        }
    }

    pub fn key(&self) -> u32 {
        let packed = self
            .ranks
            .iter()
            .fold(0u32, |acc, r| (acc << 4) | u32::from(*r));
        (packed << 1) | u32::from(self.suited)
    }

    fn len(&self) -> usize {
        self.ranks.iter().filter(|r| **r != 0).count()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TableEntry {
    pub ordinal: u32,
    pub category: Category,
    /// Tiebreak ranks in policy terms (Ace = 1 under ace-low policies).
    pub kickers: [u8; MAX_TABLE_CARDS],
}

pub type RankTable = HashMap<u32, TableEntry>;

/// Source of rank tables. The default enumerates and ranks every signature;
/// a host may supply precomputed data instead.
pub trait TableLoader: Send + Sync {
    fn load(&self, eval: EvalType) -> RankTable;
}

/// Builds tables by enumerating every signature of one to five cards.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeneratedTables;

impl TableLoader for GeneratedTables {
    fn load(&self, eval: EvalType) -> RankTable {
        let allow_five = eval == EvalType::HighWild;
        let mut scored: Vec<(u32, Signature, Category, [u8; MAX_TABLE_CARDS])> = Vec::new();
        for len in 1..=MAX_TABLE_CARDS {
            for ranks in multisets(len, if allow_five { 5 } else { 4 }) {
                let plain = Signature::new(&ranks, false);
                let (value, category, kickers) = score(eval, &plain);
                scored.push((value, plain, category, kickers));
                let suited = Signature::new(&ranks, true);
                if suited.suited {
                    let (value, category, kickers) = score(eval, &suited);
                    scored.push((value, suited, category, kickers));
                }
            }
        }
        // Sizes are ranked separately: only equal-sized hands ever meet.
        scored.sort_by_key(|(s, sig, _, _)| (sig.len(), *s));
        let mut table = RankTable::with_capacity(scored.len());
        let mut ordinal = 0u32;
        let mut prev: Option<(usize, u32)> = None;
        for (s, sig, category, kickers) in scored {
            match prev {
                Some((len, p)) if len == sig.len() && p == s => {}
                Some((len, _)) if len == sig.len() => ordinal += 1,
                _ => ordinal = 0,
            }
            prev = Some((sig.len(), s));
            table.insert(
                sig.key(),
                TableEntry {
                    ordinal,
                    category,
                    kickers,
                },
            );
        }
        table
    }
}

/// All non-increasing rank sequences of `len` values in `2..=14` where no
/// rank repeats more than `max_repeat` times.
fn multisets(len: usize, max_repeat: usize) -> Vec<Vec<u8>> {
    fn go(
        len: usize,
        max_repeat: usize,
        top: u8,
        cur: &mut Vec<u8>,
        out: &mut Vec<Vec<u8>>,
    ) {
        if cur.len() == len {
            out.push(cur.clone());
            return;
        }
        for r in (2..=top).rev() {
            if cur.iter().filter(|x| **x == r).count() >= max_repeat {
                continue;
            }
            cur.push(r);
            go(len, max_repeat, r, cur, out);
            cur.pop();
        }
    }
    let mut out = Vec::new();
    go(len, max_repeat, 14, &mut Vec::with_capacity(len), &mut out);
    out
}

/// Groups ranks into `(count, rank)` ordered by count then rank, both descending.
fn groups(ranks: &[u8]) -> Vec<(u8, u8)> {
    let mut g: Vec<(u8, u8)> = Vec::new();
    for &r in ranks.iter().filter(|r| **r != 0) {
        match g.iter_mut().find(|(_, x)| *x == r) {
            Some(entry) => entry.0 += 1,
            None => g.push((1, r)),
        }
    }
    g.sort_unstable_by(|a, b| b.cmp(a));
    g
}

fn pattern_category(g: &[(u8, u8)]) -> Category {
    match (g.first().map(|x| x.0), g.get(1).map(|x| x.0)) {
        (Some(5), _) => Category::FiveOfAKind,
        (Some(4), _) => Category::FourOfAKind,
        (Some(3), Some(2)) => Category::FullHouse,
        (Some(3), _) => Category::ThreeOfAKind,
        (Some(2), Some(2)) => Category::TwoPair,
        (Some(2), _) => Category::OnePair,
        _ => Category::HighCard,
    }
}

fn group_kickers(g: &[(u8, u8)]) -> [u8; MAX_TABLE_CARDS] {
    let mut k = [0u8; MAX_TABLE_CARDS];
    let mut i = 0;
    for &(count, rank) in g {
        for _ in 0..count {
            if i < MAX_TABLE_CARDS {
                k[i] = rank;
                i += 1;
            }
        }
    }
    k
}

/// Standard category and kickers, with or without the A-5 wheel.
fn classify_high(sig: &Signature, wheel: bool) -> (Category, [u8; MAX_TABLE_CARDS]) {
    let g = groups(&sig.ranks);
    let full = sig.len() == MAX_TABLE_CARDS && g.len() == MAX_TABLE_CARDS;
    let r = sig.ranks;
    let straight_high = if full && r[0] - r[4] == 4 {
        Some(r[0])
    } else if full && wheel && r == [14, 5, 4, 3, 2] {
        Some(5)
    } else {
        None
    };
    let pattern = pattern_category(&g);
    let kickers = group_kickers(&g);
    match (straight_high, sig.suited) {
        (Some(high), true) => (Category::StraightFlush, [high, 0, 0, 0, 0]),
        _ if pattern >= Category::FullHouse => (pattern, kickers),
        (_, true) => (Category::Flush, kickers),
        (Some(high), false) => (Category::Straight, [high, 0, 0, 0, 0]),
        _ => (pattern, kickers),
    }
}

fn pack(category_index: u32, kickers: &[u8; MAX_TABLE_CARDS], invert: bool) -> u32 {
    let k = kickers.iter().fold(0u32, |acc, x| {
        let v = if invert { 15 - u32::from(*x) } else { u32::from(*x) };
        (acc << 4) | v
    });
    (category_index << 20) | k
}

/// Returns a score where lower is better, plus the category and kickers to
/// report for the signature.
fn score(eval: EvalType, sig: &Signature) -> (u32, Category, [u8; MAX_TABLE_CARDS]) {
    match eval {
        EvalType::A5Low => {
            let low: Vec<u8> = sig
                .ranks
                .iter()
                .map(|r| if *r == 14 { 1 } else { *r })
                .collect();
            let g = groups(&low);
            let category = pattern_category(&g);
            let kickers = group_kickers(&g);
            (pack(category.index(), &kickers, false), category, kickers)
        }
        EvalType::Low27 => {
            let (category, kickers) = classify_high(sig, false);
            (pack(category.index(), &kickers, false), category, kickers)
        }
        _ => {
            let (category, kickers) = classify_high(sig, true);
            let worst = Category::FiveOfAKind.index();
            (
                pack(worst - category.index(), &kickers, true),
                category,
                kickers,
            )
        }
    }
}

static LOADER: OnceLock<Box<dyn TableLoader>> = OnceLock::new();
static HIGH: OnceLock<RankTable> = OnceLock::new();
static HIGH_WILD: OnceLock<RankTable> = OnceLock::new();
static A5_LOW: OnceLock<RankTable> = OnceLock::new();
static LOW_27: OnceLock<RankTable> = OnceLock::new();

/// Installs the loader used for every table not yet built. Fails (returning
/// the loader) once any table has been requested or a loader was installed.
pub fn install_loader(loader: Box<dyn TableLoader>) -> Result<(), Box<dyn TableLoader>> {
    LOADER.set(loader)
}

/// Table for a category-based policy, loading it on first use.
/// Concurrent first uses block on a single load.
pub fn table(eval: EvalType) -> Option<&'static RankTable> {
    let cell = match eval {
        EvalType::High => &HIGH,
        EvalType::HighWild => &HIGH_WILD,
        EvalType::A5Low => &A5_LOW,
        EvalType::Low27 => &LOW_27,
        _ => return None,
    };
    Some(cell.get_or_init(|| {
        let loader = LOADER.get_or_init(|| Box::new(GeneratedTables));
        let table = loader.load(eval);
        info!(evaluation = %eval, entries = table.len(), "rank table loaded");
        table
    }))
}

pub fn lookup(eval: EvalType, sig: &Signature) -> Option<TableEntry> {
    let entry = table(eval)?.get(&sig.key()).copied();
    if entry.is_none() {
        debug!(evaluation = %eval, ?sig, "signature not in rank table");
    }
    entry
}
