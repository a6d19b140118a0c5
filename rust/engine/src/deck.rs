use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::cards::{all_ranks, all_suits, Card, Rank, Suit};

/// Named deck compositions understood by the rules catalog.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DeckType {
    #[serde(rename = "standard")]
    Standard,
    /// 36 cards, Six through Ace.
    #[serde(rename = "short_6a")]
    Short6A,
    /// 20 cards, Ten through Ace.
    #[serde(rename = "short_ta")]
    ShortTA,
    /// 52 cards plus one joker.
    #[serde(rename = "standard_joker")]
    StandardJoker,
    /// Composition given explicitly by `ranks`/`suits`.
    #[serde(rename = "custom")]
    Custom,
}

/// Deck composition: every rank in `ranks` crossed with every suit in
/// `suits`, plus `jokers` jokers.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeckSpec {
    pub ranks: Vec<Rank>,
    pub suits: Vec<Suit>,
    pub jokers: u8,
}

impl DeckSpec {
    pub fn of_type(deck_type: DeckType) -> Self {
        let ranks = all_ranks().to_vec();
        let suits = all_suits().to_vec();
        match deck_type {
            DeckType::Standard | DeckType::Custom => Self {
                ranks,
                suits,
                jokers: 0,
            },
            DeckType::Short6A => Self {
                ranks: ranks.into_iter().filter(|r| *r >= Rank::Six).collect(),
                suits,
                jokers: 0,
            },
            DeckType::ShortTA => Self {
                ranks: ranks.into_iter().filter(|r| *r >= Rank::Ten).collect(),
                suits,
                jokers: 0,
            },
            DeckType::StandardJoker => Self {
                ranks,
                suits,
                jokers: 1,
            },
        }
    }

    pub fn size(&self) -> usize {
        self.ranks.len() * self.suits.len() + usize::from(self.jokers)
    }

    pub fn distinct_suits(&self) -> usize {
        self.suits.len()
    }

    pub fn distinct_ranks(&self) -> usize {
        self.ranks.len()
    }

    /// Cards in unshuffled order: suit-major, then rank, jokers last.
    pub fn cards(&self) -> Vec<Card> {
        let mut v = Vec::with_capacity(self.size());
        for &s in &self.suits {
            for &r in &self.ranks {
                v.push(Card { suit: s, rank: r });
            }
        }
        let joker_suits = all_suits();
        for i in 0..usize::from(self.jokers) {
            v.push(Card {
                suit: joker_suits[i % joker_suits.len()],
                rank: Rank::Joker,
            });
        }
        v
    }
}

impl Default for DeckSpec {
    fn default() -> Self {
        Self::of_type(DeckType::Standard)
    }
}

#[derive(Debug)]
pub struct Deck {
    spec: DeckSpec,
    cards: Vec<Card>,
    position: usize,
    rng: ChaCha20Rng,
}

impl Deck {
    pub fn new_with_seed(spec: DeckSpec, seed: u64) -> Self {
        let rng = ChaCha20Rng::seed_from_u64(seed);
        // Keep initial order until shuffle is called explicitly
        Self {
            cards: spec.cards(),
            spec,
            position: 0,
            rng,
        }
    }

    pub fn spec(&self) -> &DeckSpec {
        &self.spec
    }

    pub fn shuffle(&mut self) {
        self.cards = self.spec.cards();
        self.cards.shuffle(&mut self.rng);
        self.position = 0;
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        let c = self.cards.get(self.position).copied()?;
        self.position += 1;
        Some(c)
    }

    pub fn reset(&mut self) {
        self.cards = self.spec.cards();
        self.position = 0;
    }

    /// Shuffles discarded cards back in behind the undealt ones.
    pub fn recycle(&mut self, mut muck: Vec<Card>) {
        muck.shuffle(&mut self.rng);
        self.cards.drain(..self.position);
        self.position = 0;
        self.cards.extend(muck);
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }
}
