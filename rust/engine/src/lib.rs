//! # varipoker-engine: Variant-Agnostic Poker Rules Engine
//!
//! One interpreter for many poker variants. A game is described as data
//! (deck, forced bets, betting structures, an ordered sequence of play, and
//! showdown rules) and the engine walks that description step by step.
//! Shuffles are seeded, so hands are reproducible for testing and replay.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and dealt-card visibility
//! - [`deck`] - Deck composition and deterministic ChaCha20 shuffling
//! - [`rules`] - Rules catalog: parses and validates a game description
//! - [`player`] - Player state, actions, and stack management
//! - [`table`] - Seating, dealer button, community zones and dealing
//! - [`betting`] - Betting rounds, action legality and bet sizing
//! - [`pot`] - Side-pot partitioning and odd-chip splitting
//! - [`hand`] - Hand evaluation under every supported policy
//! - [`lookup`] - Lazily built rank tables keyed by canonical signature
//! - [`showdown`] - Pot awards, hi/lo splits and declarations
//! - [`game`] - Game state, table settings, snapshots and results
//! - [`engine`] - The game flow controller
//! - [`logger`] - HandRecord serialization
//! - [`errors`] - Error types for configuration, actions and invariants
//!
//! ## Quick Start
//!
//! ```rust
//! use varipoker_engine::cards::parse_cards;
//! use varipoker_engine::hand::{evaluate_best, Category, EvalType};
//!
//! // Best five of seven cards
//! let cards = parse_cards("Ah Kh Qh Jh Th 2c 3d").unwrap();
//! let (rank, best) = evaluate_best(&cards, 5, EvalType::High).unwrap();
//! assert_eq!(rank.category, Category::StraightFlush);
//! assert_eq!(best.len(), 5);
//! ```
//!
//! ## Deterministic Gameplay
//!
//! All game outcomes are reproducible using seeded RNG:
//!
//! ```rust
//! use varipoker_engine::deck::{Deck, DeckSpec};
//!
//! let mut a = Deck::new_with_seed(DeckSpec::default(), 42);
//! let mut b = Deck::new_with_seed(DeckSpec::default(), 42);
//! a.shuffle();
//! b.shuffle();
//! assert_eq!(a.deal_card(), b.deal_card());
//! ```
//!
//! ## Lower Is Better
//!
//! Every evaluation policy returns a [`hand::HandRank`] whose ordinal is
//! smaller for the better hand, whether the game plays high, low, badugi,
//! pip counts or 21.
//!
//! ```rust
//! use varipoker_engine::cards::parse_cards;
//! use varipoker_engine::hand::{evaluate, EvalType};
//!
//! let wheel = parse_cards("5c 4d 3h 2s Ac").unwrap();
//! let nine = parse_cards("9c 4d 3h 2s Ac").unwrap();
//! let a5 = |c: &[_]| evaluate(c, EvalType::A5Low).unwrap();
//! assert!(a5(&wheel).is_better_than(&a5(&nine)));
//! ```

pub mod betting;
pub mod cards;
pub mod deck;
pub mod engine;
pub mod errors;
pub mod game;
pub mod hand;
pub mod logger;
pub mod lookup;
pub mod player;
pub mod pot;
pub mod rules;
pub mod showdown;
pub mod table;
