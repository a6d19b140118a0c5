use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

/// One pot tier and the players who can win it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: u32,
    pub eligible: Vec<PlayerId>,
}

/// What one player has put in this hand.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Contribution {
    pub player: PlayerId,
    pub amount: u32,
    pub folded: bool,
    pub all_in: bool,
}

/// Partitions hand contributions into a main pot and side pots.
///
/// Tier boundaries are the all-in levels of live players plus the largest
/// contribution. Each tier takes every player's chips between the previous
/// boundary and its own, and is winnable by live players who reached the
/// boundary (or can still match it). Chips from folded players above every
/// live boundary fall into the top pot.
///
/// ```
/// use varipoker_engine::pot::{build_pots, Contribution};
///
/// let c = |player, amount, all_in| Contribution { player, amount, folded: false, all_in };
/// let pots = build_pots(&[c(0, 30, true), c(1, 80, false), c(2, 80, false)]);
/// assert_eq!(pots[0].amount, 90);
/// assert_eq!(pots[0].eligible, vec![0, 1, 2]);
/// assert_eq!(pots[1].amount, 100);
/// assert_eq!(pots[1].eligible, vec![1, 2]);
/// ```
pub fn build_pots(contribs: &[Contribution]) -> Vec<Pot> {
    let mut levels: Vec<u32> = contribs
        .iter()
        .filter(|c| c.all_in && !c.folded && c.amount > 0)
        .map(|c| c.amount)
        .collect();
    if let Some(max) = contribs.iter().map(|c| c.amount).max() {
        levels.push(max);
    }
    levels.sort_unstable();
    levels.dedup();

    let mut pots: Vec<Pot> = Vec::with_capacity(levels.len());
    let mut prev = 0u32;
    for level in levels {
        let amount: u32 = contribs
            .iter()
            .map(|c| c.amount.min(level) - c.amount.min(prev))
            .sum();
        let eligible: Vec<PlayerId> = contribs
            .iter()
            .filter(|c| !c.folded && (c.amount >= level || !c.all_in))
            .map(|c| c.player)
            .collect();
        prev = level;
        if amount == 0 {
            continue;
        }
        match pots.last_mut() {
            Some(last) if eligible.is_empty() || last.eligible == eligible => {
                last.amount += amount;
            }
            _ => pots.push(Pot { amount, eligible }),
        }
    }
    pots
}

/// Splits `amount` evenly among `winners`, which the caller lists in
/// odd-chip order; leftover chips go one each from the front.
pub fn split(amount: u32, winners: &[PlayerId]) -> Vec<(PlayerId, u32)> {
    if winners.is_empty() {
        return Vec::new();
    }
    let n = winners.len() as u32;
    let share = amount / n;
    let remainder = (amount % n) as usize;
    winners
        .iter()
        .enumerate()
        .map(|(i, &p)| (p, share + u32::from(i < remainder)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(player: PlayerId, amount: u32, folded: bool, all_in: bool) -> Contribution {
        Contribution {
            player,
            amount,
            folded,
            all_in,
        }
    }

    #[test]
    fn equal_stacks_no_side_pot() {
        let pots = build_pots(&[c(0, 1000, false, false), c(1, 1000, false, false)]);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 2000);
    }

    #[test]
    fn folded_chips_stay_in_the_pot_without_eligibility() {
        let pots = build_pots(&[
            c(0, 20, true, false),
            c(1, 50, false, true),
            c(2, 100, false, false),
            c(3, 100, false, false),
        ]);
        assert_eq!(pots[0].amount, 20 + 50 * 3);
        assert_eq!(pots[0].eligible, vec![1, 2, 3]);
        assert_eq!(pots[1].amount, 100);
        assert_eq!(pots[1].eligible, vec![2, 3]);
    }

    #[test]
    fn folded_overage_joins_the_top_live_pot() {
        let pots = build_pots(&[c(0, 100, true, false), c(1, 30, false, true), c(2, 50, false, true)]);
        let total: u32 = pots.iter().map(|p| p.amount).sum();
        assert_eq!(total, 180);
        assert_eq!(pots.last().unwrap().eligible, vec![2]);
        assert!(pots.iter().all(|p| !p.eligible.contains(&0)));
    }

    #[test]
    fn split_gives_odd_chips_in_order() {
        assert_eq!(split(10, &[4, 2, 7]), vec![(4, 4), (2, 3), (7, 3)]);
        assert!(split(10, &[]).is_empty());
    }
}
