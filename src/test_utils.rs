//! Shared helpers for unit tests.

/// Serde round-trip assertions shared across test modules.
pub mod serde {
    use std::fmt::Debug;

    /// Assert that a value survives a serde_json round-trip using structural
    /// equality.
    pub fn assert_round_trip_eq<T>(value: &T)
    where
        T: ::serde::Serialize + ::serde::de::DeserializeOwned + PartialEq + Debug,
    {
        let json = serde_json::to_string(value)
            .expect("serialization should succeed during round-trip testing");
        let restored: T = serde_json::from_str(&json)
            .expect("deserialization should succeed during round-trip testing");
        assert_eq!(restored, *value, "serde_json round-trip altered the value");
    }
}

/// Builders for table snapshots used by reducer and view tests.
pub mod state {
    use crate::table::types::{
        BettingRoundView, Chips, PlayerId, Seat, SeatIndex, TableId, TableState, TableStatus,
    };

    pub fn seat(player: &str, stack: Chips) -> Seat {
        Seat {
            player_id: PlayerId::new(player),
            display_name: player.to_owned(),
            stack,
            folded: false,
            sitting_out: false,
            committed: 0,
            blind: None,
            hole_cards: vec![],
            last_action: None,
        }
    }

    pub fn waiting_state(seats: Vec<Seat>) -> TableState {
        TableState {
            table_id: TableId::new("t1"),
            seats,
            community_cards: vec![],
            pots: vec![],
            current_bet: 0,
            current_seat: None,
            status: TableStatus::Waiting,
            betting_round: BettingRoundView::default(),
            action_deadline: None,
            winners: vec![],
        }
    }

    /// An in-hand snapshot with `current_seat`, a table bet, and per-player
    /// round commitments.
    pub fn in_hand_state(
        seats: Vec<Seat>,
        current_seat: SeatIndex,
        current_bet: Chips,
        round_bets: &[(&str, Chips)],
    ) -> TableState {
        let mut state = waiting_state(seats);
        state.status = TableStatus::InHand;
        state.current_seat = Some(current_seat);
        state.current_bet = current_bet;
        for (player, chips) in round_bets {
            state
                .betting_round
                .0
                .insert(PlayerId::new(*player), *chips);
        }
        state
    }
}
