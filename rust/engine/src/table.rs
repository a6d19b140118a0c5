use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cards::{Card, DealtCard, Visibility};
use crate::deck::{Deck, DeckSpec};
use crate::errors::{InvalidAction, InvariantViolation};
use crate::player::{Player, PlayerId};
use crate::rules::{DealLocation, DealSpec, PassDirection};

/// Community cards of one named zone.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub cards: Vec<DealtCard>,
}

/// Seats, dealer button, community zones and the deck for one table.
#[derive(Debug)]
pub struct Table {
    seats: Vec<Option<Player>>,
    dealer: Option<usize>,
    zones: Vec<Zone>,
    deck: Deck,
    muck: Vec<Card>,
}

impl Table {
    pub fn new(capacity: usize, deck: DeckSpec, seed: u64, zones: &[String]) -> Self {
        Self {
            seats: (0..capacity).map(|_| None).collect(),
            dealer: None,
            zones: zones
                .iter()
                .map(|name| Zone {
                    name: name.clone(),
                    cards: Vec::new(),
                })
                .collect(),
            deck: Deck::new_with_seed(deck, seed),
            muck: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.seats.len()
    }

    pub fn seat_player(&mut self, player: Player) -> Result<(), InvalidAction> {
        if self.player(player.id()).is_some() {
            return Err(InvalidAction::AlreadySeated(player.id()));
        }
        let seat = player.seat();
        match self.seats.get_mut(seat) {
            Some(slot) if slot.is_none() => {
                *slot = Some(player);
                Ok(())
            }
            _ => Err(InvalidAction::SeatUnavailable(seat)),
        }
    }

    /// Marks a player removed. The seat stays occupied until the next hand
    /// starts, so seating order is unchanged mid-hand.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<&Player> {
        let p = self.player_mut(id)?;
        p.mark_removed();
        self.player(id)
    }

    fn vacate_removed(&mut self) {
        for slot in &mut self.seats {
            if slot.as_ref().is_some_and(Player::is_removed) {
                *slot = None;
            }
        }
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.seats.iter().flatten()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players().find(|p| p.id() == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.seats.iter_mut().flatten().find(|p| p.id() == id)
    }

    pub fn dealer_seat(&self) -> Option<usize> {
        self.dealer
    }

    fn can_play(p: &Player) -> bool {
        !p.is_removed() && p.stack() > 0
    }

    /// Moves the button to the next seat, in seating order and wrapping,
    /// whose player can play a hand.
    pub fn rotate_dealer(&mut self) -> Option<usize> {
        let n = self.seats.len();
        let start = self.dealer.map_or(0, |d| d + 1);
        self.dealer = (0..n)
            .map(|i| (start + i) % n)
            .find(|&s| self.seats[s].as_ref().is_some_and(Self::can_play));
        self.dealer
    }

    /// Active players in seating order starting with the first seat after `seat`.
    pub fn order_after(&self, seat: usize) -> Vec<PlayerId> {
        let n = self.seats.len();
        (1..=n)
            .filter_map(|i| self.seats[(seat + i) % n].as_ref())
            .filter(|p| p.is_active())
            .map(Player::id)
            .collect()
    }

    /// Active players starting left of the dealer.
    pub fn hand_order(&self) -> Vec<PlayerId> {
        self.order_after(self.dealer.unwrap_or(self.seats.len().saturating_sub(1)))
    }

    /// Clears hands and zones, vacates removed seats, activates everyone with
    /// chips, and reshuffles.
    pub fn reset_for_hand(&mut self) {
        self.vacate_removed();
        for p in self.seats.iter_mut().flatten() {
            p.clear_cards();
            let playing = Self::can_play(p);
            p.set_active(playing);
        }
        for z in &mut self.zones {
            z.cards.clear();
        }
        self.muck.clear();
        self.deck.shuffle();
    }

    /// Next card, recycling the muck when the deck runs dry.
    fn draw_card(&mut self) -> Option<Card> {
        if self.deck.remaining() == 0 && !self.muck.is_empty() {
            debug!(cards = self.muck.len(), "reshuffling muck into deck");
            let muck = std::mem::take(&mut self.muck);
            self.deck.recycle(muck);
        }
        self.deck.deal_card()
    }

    /// Deals per `spec`: player deals go round-robin over `order`, batch by
    /// batch; community deals go to the spec's zone.
    pub fn deal_cards(
        &mut self,
        step: &str,
        spec: &DealSpec,
        order: &[PlayerId],
    ) -> Result<(), InvariantViolation> {
        let exhausted = || InvariantViolation::DeckExhausted(step.to_string());
        for batch in &spec.batches {
            match spec.location {
                DealLocation::Player => {
                    for _ in 0..batch.number {
                        for &id in order {
                            let card = self.draw_card().ok_or_else(exhausted)?;
                            if let Some(p) = self.player_mut(id) {
                                p.give_card(card, batch.visibility);
                            }
                        }
                    }
                }
                DealLocation::Community => {
                    let name = spec.zone.as_deref().unwrap_or(crate::rules::DEFAULT_ZONE);
                    for _ in 0..batch.number {
                        let card = self.draw_card().ok_or_else(exhausted)?;
                        match self.zones.iter_mut().find(|z| z.name == name) {
                            Some(z) => z.cards.push(DealtCard::new(card, batch.visibility)),
                            None => self.zones.push(Zone {
                                name: name.to_string(),
                                cards: vec![DealtCard::new(card, batch.visibility)],
                            }),
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Checks card indices against a player's hand: in range, no repeats.
    pub fn check_indices(&self, id: PlayerId, indices: &[usize]) -> Result<(), InvalidAction> {
        let p = self.player(id).ok_or(InvalidAction::UnknownPlayer(id))?;
        for (n, &i) in indices.iter().enumerate() {
            if i >= p.hand().len() || indices[..n].contains(&i) {
                return Err(InvalidAction::BadCardIndex {
                    player: id,
                    index: i,
                });
            }
        }
        Ok(())
    }

    /// Replaces the cards at `indices` with fresh ones.
    pub fn draw(
        &mut self,
        step: &str,
        id: PlayerId,
        indices: &[usize],
        visibility: Visibility,
    ) -> Result<(), InvariantViolation> {
        // own discards join the muck only after the replacements are drawn
        if self.deck.remaining() + self.muck.len() < indices.len() {
            return Err(InvariantViolation::DeckExhausted(step.to_string()));
        }
        let gone = match self.player_mut(id) {
            Some(p) => p.take_cards(indices),
            None => return Ok(()),
        };
        for _ in 0..gone.len() {
            let card = self
                .draw_card()
                .ok_or_else(|| InvariantViolation::DeckExhausted(step.to_string()))?;
            if let Some(p) = self.player_mut(id) {
                p.give_card(card, visibility);
            }
        }
        self.muck.extend(gone.into_iter().map(|d| d.card));
        Ok(())
    }

    pub fn discard(&mut self, id: PlayerId, indices: &[usize]) {
        if let Some(p) = self.player_mut(id) {
            let gone = p.take_cards(indices);
            self.muck.extend(gone.into_iter().map(|d| d.card));
        }
    }

    pub fn expose(&mut self, id: PlayerId, indices: &[usize]) {
        if let Some(p) = self.player_mut(id) {
            p.expose(indices);
        }
    }

    /// Moves each player's chosen cards to their neighbour in `order`
    /// (seating order). All selections are taken before any are handed over.
    pub fn pass_cards(
        &mut self,
        order: &[PlayerId],
        selections: &[(PlayerId, Vec<usize>)],
        direction: PassDirection,
    ) {
        let n = order.len();
        if n < 2 {
            return;
        }
        let mut moving: Vec<(PlayerId, Vec<DealtCard>)> = Vec::with_capacity(selections.len());
        for (id, indices) in selections {
            let Some(pos) = order.iter().position(|p| p == id) else {
                continue;
            };
            let to = match direction {
                PassDirection::Left => order[(pos + 1) % n],
                PassDirection::Right => order[(pos + n - 1) % n],
            };
            if let Some(p) = self.player_mut(*id) {
                moving.push((to, p.take_cards(indices)));
            }
        }
        for (to, cards) in moving {
            if let Some(p) = self.player_mut(to) {
                for c in cards {
                    p.give_card(c.card, c.visibility);
                }
            }
        }
    }

    /// Folded hands go to the muck.
    pub fn muck_hand(&mut self, id: PlayerId) {
        if let Some(p) = self.player_mut(id) {
            let all: Vec<usize> = (0..p.hand().len()).collect();
            let gone = p.take_cards(&all);
            self.muck.extend(gone.into_iter().map(|d| d.card));
        }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn community(&self, zone: &str) -> Option<&[DealtCard]> {
        self.zones
            .iter()
            .find(|z| z.name == zone)
            .map(|z| z.cards.as_slice())
    }

    /// Community cards from `zones` (all zones when `None`), in zone order.
    pub fn community_cards(&self, zones: Option<&[String]>) -> Vec<Card> {
        self.zones
            .iter()
            .filter(|z| zones.is_none_or(|names| names.contains(&z.name)))
            .flat_map(|z| z.cards.iter().map(|d| d.card))
            .collect()
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.remaining()
    }

    pub fn total_chips(&self) -> u64 {
        self.players().map(|p| u64::from(p.stack())).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    fn table_with(seats: &[usize]) -> Table {
        let mut t = Table::new(6, DeckSpec::default(), 7, &["board".to_string()]);
        for (id, &seat) in seats.iter().enumerate() {
            t.seat_player(Player::new(id, format!("p{id}"), 100, seat)).unwrap();
        }
        t
    }

    #[test]
    fn dealer_rotates_over_occupied_seats_and_wraps() {
        let mut t = table_with(&[1, 3, 4]);
        assert_eq!(t.rotate_dealer(), Some(1));
        assert_eq!(t.rotate_dealer(), Some(3));
        assert_eq!(t.rotate_dealer(), Some(4));
        assert_eq!(t.rotate_dealer(), Some(1));
    }

    #[test]
    fn removal_keeps_seat_until_next_hand() {
        let mut t = table_with(&[0, 2, 5]);
        t.reset_for_hand();
        t.remove_player(1);
        assert!(t.player(1).is_some_and(|p| !p.is_active()));
        assert_eq!(t.order_after(0), vec![2, 0]);
        t.reset_for_hand();
        assert!(t.player(1).is_none());
    }

    #[test]
    fn short_deck_draw_leaves_the_hand_whole() {
        let six = DeckSpec {
            ranks: vec![Rank::Ace, Rank::King, Rank::Queen],
            suits: vec![Suit::Clubs, Suit::Spades],
            jokers: 0,
        };
        let mut t = Table::new(2, six, 1, &[]);
        for id in 0..2 {
            t.seat_player(Player::new(id, format!("p{id}"), 100, id)).unwrap();
        }
        t.reset_for_hand();
        for _ in 0..3 {
            for id in 0..2 {
                let card = t.draw_card().unwrap();
                t.player_mut(id).unwrap().give_card(card, Visibility::FaceDown);
            }
        }
        let before = t.player(0).unwrap().hand().to_vec();
        assert_eq!(
            t.draw("draw", 0, &[0, 1], Visibility::FaceDown),
            Err(InvariantViolation::DeckExhausted("draw".into()))
        );
        assert_eq!(t.player(0).unwrap().hand(), before.as_slice());

        // a folded hand refills the deck
        t.muck_hand(1);
        t.draw("draw", 0, &[0, 1], Visibility::FaceDown).unwrap();
        let hand = t.player(0).unwrap().hand();
        assert_eq!(hand.len(), 3);
        assert_eq!(hand[0], before[2]);
    }

    #[test]
    fn seat_conflicts_are_rejected() {
        let mut t = table_with(&[0]);
        assert_eq!(
            t.seat_player(Player::new(9, "x", 10, 0)),
            Err(InvalidAction::SeatUnavailable(0))
        );
        assert_eq!(
            t.seat_player(Player::new(0, "x", 10, 1)),
            Err(InvalidAction::AlreadySeated(0))
        );
    }
}
