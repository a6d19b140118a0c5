use varipoker_engine::betting::{
    ActionChoice, BettingManager, BettingStructure, RoundStatus, Stakes, LIMIT_BET_CAP,
};
use varipoker_engine::errors::InvalidAction;
use varipoker_engine::player::{Action, ActionKind};
use varipoker_engine::rules::BetSize;

fn manager(structure: BettingStructure, players: usize) -> BettingManager {
    let mut bm = BettingManager::new(structure, Stakes::default());
    let order: Vec<usize> = (0..players).collect();
    bm.start_hand(&order);
    bm
}

fn choice(bm: &BettingManager, player: usize, stack: u32, kind: ActionKind) -> Option<ActionChoice> {
    bm.valid_actions(player, stack)
        .into_iter()
        .find(|c| c.kind == kind)
}

#[test]
fn unopened_round_offers_check_and_bet() {
    let mut bm = manager(BettingStructure::NoLimit, 3);
    assert_eq!(bm.open_round(BetSize::Small, 0), RoundStatus::Continue(0));
    let choices = bm.valid_actions(0, 100);
    assert_eq!(choices[0], ActionChoice::new(ActionKind::Check, 0, 0));
    assert_eq!(choices[1], ActionChoice::new(ActionKind::Bet, 2, 100));
    assert!(bm.valid_actions(1, 100).is_empty(), "not player 1's turn");
}

#[test]
fn blinds_set_the_level_and_the_big_blind_gets_an_option() {
    let mut bm = manager(BettingStructure::NoLimit, 3);
    bm.post_forced(1, 1, 100);
    bm.post_forced(2, 2, 100);
    assert_eq!(bm.open_round(BetSize::Small, 0), RoundStatus::Continue(0));
    assert_eq!(choice(&bm, 0, 100, ActionKind::Call).map(|c| c.min), Some(2));
    // minimum raise is to twice the big blind
    assert_eq!(choice(&bm, 0, 100, ActionKind::Raise).map(|c| c.min), Some(4));

    let a = bm.apply_action(0, &Action::Call, 100).unwrap();
    assert_eq!(a.paid, 2);
    assert_eq!(a.status, RoundStatus::Continue(1));
    let a = bm.apply_action(1, &Action::Call, 99).unwrap();
    assert_eq!(a.paid, 1);
    // the big blind still has the option to raise
    assert_eq!(a.status, RoundStatus::Continue(2));
    assert!(choice(&bm, 2, 98, ActionKind::Check).is_some());
    let a = bm.apply_action(2, &Action::Check, 98).unwrap();
    assert_eq!(a.status, RoundStatus::Complete);
    assert_eq!(bm.pot_total(), 6);
}

#[test]
fn out_of_turn_and_illegal_actions_leave_state_alone() {
    let mut bm = manager(BettingStructure::NoLimit, 2);
    bm.open_round(BetSize::Small, 0);
    assert_eq!(
        bm.apply_action(1, &Action::Check, 100),
        Err(InvalidAction::NotPlayersTurn {
            expected: Some(0),
            actual: 1
        })
    );
    assert_eq!(
        bm.apply_action(0, &Action::Call, 100),
        Err(InvalidAction::NotAllowed {
            player: 0,
            kind: ActionKind::Call
        })
    );
    assert_eq!(
        bm.apply_action(0, &Action::Bet(1), 100),
        Err(InvalidAction::OutOfBounds {
            kind: ActionKind::Bet,
            amount: 1,
            min: 2,
            max: 100
        })
    );
    assert_eq!(bm.awaiting(), Some(0));
    assert_eq!(bm.pot_total(), 0);
}

#[test]
fn pot_limit_caps_at_call_plus_pot() {
    let mut bm = manager(BettingStructure::PotLimit, 3);
    bm.post_forced(1, 1, 100);
    bm.post_forced(2, 2, 100);
    bm.open_round(BetSize::Small, 0);
    // pot 3, call 2 makes 5, raise by 5: 7 chips in total
    let raise = choice(&bm, 0, 100, ActionKind::Raise).unwrap();
    assert_eq!((raise.min, raise.max), (4, 7));
    assert!(bm.apply_action(0, &Action::Raise(8), 100).is_err());
    assert!(bm.apply_action(0, &Action::Raise(7), 100).is_ok());
}

#[test]
fn pot_limit_bet_into_a_pot() {
    let mut bm = manager(BettingStructure::PotLimit, 2);
    bm.post_ante(0, 10, 100);
    bm.post_ante(1, 10, 100);
    bm.open_round(BetSize::Small, 0);
    let bet = choice(&bm, 0, 90, ActionKind::Bet).unwrap();
    assert_eq!((bet.min, bet.max), (2, 20));
}

#[test]
fn limit_bets_are_fixed_and_capped() {
    let mut bm = manager(BettingStructure::Limit, 3);
    bm.open_round(BetSize::Big, 0);
    let bet = choice(&bm, 0, 100, ActionKind::Bet).unwrap();
    assert_eq!((bet.min, bet.max), (4, 4));
    bm.apply_action(0, &Action::Bet(4), 100).unwrap();
    bm.apply_action(1, &Action::Raise(8), 100).unwrap();
    bm.apply_action(2, &Action::Raise(12), 100).unwrap();
    bm.apply_action(0, &Action::Raise(12), 96).unwrap();
    assert_eq!(LIMIT_BET_CAP, 4);
    // bet plus three raises: player 1 may only call
    assert_eq!(bm.awaiting(), Some(1));
    assert!(choice(&bm, 1, 92, ActionKind::Raise).is_none());
    assert_eq!(choice(&bm, 1, 92, ActionKind::Call).map(|c| c.min), Some(8));
}

#[test]
fn big_blind_counts_toward_the_limit_cap() {
    let mut bm = manager(BettingStructure::Limit, 3);
    bm.post_forced(1, 1, 100);
    bm.post_forced(2, 2, 100);
    bm.open_round(BetSize::Small, 0);
    bm.apply_action(0, &Action::Raise(4), 100).unwrap();
    bm.apply_action(1, &Action::Raise(5), 99).unwrap();
    bm.apply_action(2, &Action::Raise(6), 98).unwrap();
    // blind plus three raises: the level is 8 and nobody may raise again
    assert_eq!(bm.awaiting(), Some(0));
    assert!(choice(&bm, 0, 96, ActionKind::Raise).is_none());
    assert_eq!(choice(&bm, 0, 96, ActionKind::Call).map(|c| c.min), Some(4));
}

#[test]
fn limit_cap_lifts_heads_up() {
    let mut bm = manager(BettingStructure::Limit, 2);
    bm.open_round(BetSize::Small, 0);
    let mut stacks = [100u32, 100];
    for turn in 0..6 {
        let p = turn % 2;
        let raise = choice(&bm, p, stacks[p], ActionKind::Raise)
            .or_else(|| choice(&bm, p, stacks[p], ActionKind::Bet))
            .expect("heads-up raising is never capped");
        let action = if turn == 0 {
            Action::Bet(raise.min)
        } else {
            Action::Raise(raise.min)
        };
        let applied = bm.apply_action(p, &action, stacks[p]).unwrap();
        stacks[p] -= applied.paid;
    }
    assert!(choice(&bm, 0, stacks[0], ActionKind::Raise).is_some());
}

#[test]
fn short_all_in_does_not_reopen_the_betting() {
    let mut bm = manager(BettingStructure::NoLimit, 3);
    bm.open_round(BetSize::Small, 0);
    bm.apply_action(0, &Action::Bet(10), 100).unwrap();
    // 14 is a raise of only 4
    let a = bm.apply_action(1, &Action::AllIn, 14).unwrap();
    assert_eq!(a.paid, 14);
    assert!(a.all_in);
    // player 2 has not acted and keeps full rights
    assert!(choice(&bm, 2, 100, ActionKind::Raise).is_some());
    bm.apply_action(2, &Action::Call, 100).unwrap();
    assert_eq!(bm.awaiting(), Some(0));
    assert_eq!(
        bm.valid_actions(0, 90),
        vec![
            ActionChoice::new(ActionKind::Fold, 0, 0),
            ActionChoice::new(ActionKind::Call, 4, 4),
        ]
    );
}

#[test]
fn full_raise_reopens_the_betting() {
    let mut bm = manager(BettingStructure::NoLimit, 3);
    bm.open_round(BetSize::Small, 0);
    bm.apply_action(0, &Action::Bet(10), 100).unwrap();
    bm.apply_action(1, &Action::Raise(20), 100).unwrap();
    bm.apply_action(2, &Action::Call, 100).unwrap();
    let raise = choice(&bm, 0, 90, ActionKind::Raise).unwrap();
    // min re-raise matches the last raise of 10
    assert_eq!(raise.min, 20);
}

#[test]
fn all_in_short_of_a_call_is_a_call() {
    let mut bm = manager(BettingStructure::NoLimit, 2);
    bm.open_round(BetSize::Small, 0);
    bm.apply_action(0, &Action::Bet(50), 100).unwrap();
    assert_eq!(choice(&bm, 1, 30, ActionKind::Call).map(|c| c.min), Some(30));
    let a = bm.apply_action(1, &Action::AllIn, 30).unwrap();
    assert_eq!(a.paid, 30);
    assert_eq!(a.status, RoundStatus::Complete);
    // the uncalled 20 goes back to the bettor
    assert_eq!(bm.close_round(), Some((0, 20)));
    assert_eq!(bm.pot_total(), 60);
}

#[test]
fn bring_in_can_be_completed() {
    let mut bm = manager(BettingStructure::Limit, 3);
    bm.post_forced(0, 1, 100);
    bm.open_round(BetSize::Small, 1);
    let complete = choice(&bm, 1, 100, ActionKind::Raise).unwrap();
    assert_eq!((complete.min, complete.max), (2, 2));
    bm.apply_action(1, &Action::Raise(2), 100).unwrap();
    // completing counts as the opening bet, so the next raise is a full one
    let raise = choice(&bm, 2, 100, ActionKind::Raise).unwrap();
    assert_eq!(raise.min, 4);
    bm.apply_action(2, &Action::Call, 100).unwrap();
    // the bring-in owes the difference
    assert_eq!(bm.awaiting(), Some(0));
    assert_eq!(choice(&bm, 0, 99, ActionKind::Call).map(|c| c.min), Some(1));
}

#[test]
fn everyone_folding_leaves_a_single_survivor() {
    let mut bm = manager(BettingStructure::NoLimit, 3);
    bm.post_forced(1, 1, 100);
    bm.post_forced(2, 2, 100);
    bm.open_round(BetSize::Small, 0);
    bm.apply_action(0, &Action::Fold, 100).unwrap();
    let a = bm.apply_action(1, &Action::Fold, 99).unwrap();
    assert_eq!(a.status, RoundStatus::SingleSurvivor(2));
    assert!(bm.is_folded(0) && bm.is_folded(1));
}

#[test]
fn antes_build_the_pot_without_a_bet_level() {
    let mut bm = manager(BettingStructure::Limit, 3);
    for p in 0..3 {
        assert_eq!(bm.post_ante(p, 1, 100), 1);
    }
    bm.open_round(BetSize::Small, 0);
    assert!(choice(&bm, 0, 99, ActionKind::Check).is_some());
    assert_eq!(bm.pot_total(), 3);
    // a short stack posts what it has and is all-in
    let mut short = manager(BettingStructure::Limit, 2);
    assert_eq!(short.post_ante(0, 5, 3), 3);
    assert!(short.is_all_in(0));
}

#[test]
fn side_pots_follow_all_in_levels() {
    let mut bm = manager(BettingStructure::NoLimit, 3);
    bm.open_round(BetSize::Small, 0);
    bm.apply_action(0, &Action::AllIn, 30).unwrap();
    bm.apply_action(1, &Action::AllIn, 100).unwrap();
    bm.apply_action(2, &Action::Call, 100).unwrap();
    let pots = bm.pots();
    assert_eq!(pots.len(), 2);
    assert_eq!((pots[0].amount, pots[0].eligible.clone()), (90, vec![0, 1, 2]));
    assert_eq!((pots[1].amount, pots[1].eligible.clone()), (140, vec![1, 2]));
    assert!(bm.is_runout());
}
