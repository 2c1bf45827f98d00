//! Per-room round state

use std::collections::BTreeSet;

use crate::geo::{fold, ExportRecord};
use crate::ws::transport::ConnectionId;

/// Clues shown when a round starts
pub const INITIAL_REVEAL: usize = 3;
/// Reveal counter never goes past this
pub const MAX_REVEAL: usize = 10;

/// Round phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Room exists but no round has started yet
    Idle,
    /// Secret chosen, guesses accepted
    Active,
    /// Someone won, waiting for rematch votes
    Over { winner: ConnectionId },
}

/// The secret country of a round
#[derive(Debug, Clone)]
struct Secret {
    /// Display form
    name: String,
    folded: String,
    exports: Vec<ExportRecord>,
}

/// Mutable state of the round in play
#[derive(Debug, Clone)]
pub struct RoundState {
    phase: RoundPhase,
    secret: Option<Secret>,
    /// Number of clues disclosed so far; counts up even past the last record
    revealed: usize,
    rematch_votes: BTreeSet<ConnectionId>,
}

impl RoundState {
    pub fn new() -> Self {
        Self {
            phase: RoundPhase::Idle,
            secret: None,
            revealed: INITIAL_REVEAL,
            rematch_votes: BTreeSet::new(),
        }
    }

    /// Start a new round with the given secret.
    ///
    /// Returns the initial clues in rank order.
    pub fn begin(&mut self, name: String, exports: Vec<ExportRecord>) -> &[ExportRecord] {
        self.phase = RoundPhase::Active;
        self.revealed = INITIAL_REVEAL;
        self.rematch_votes.clear();

        let secret = self.secret.insert(Secret {
            folded: fold(&name),
            name,
            exports,
        });
        let shown = secret.exports.len().min(INITIAL_REVEAL);
        &secret.exports[..shown]
    }

    /// Exact comparison after case-folding only
    pub fn matches_answer(&self, guess: &str) -> bool {
        self.secret
            .as_ref()
            .is_some_and(|secret| secret.folded == fold(guess))
    }

    /// Close the round with a winner
    pub fn finish(&mut self, winner: ConnectionId) {
        if self.phase == RoundPhase::Active {
            self.phase = RoundPhase::Over { winner };
        }
    }

    /// Advance the reveal counter by one.
    ///
    /// Returns the newly disclosed record, or `None` when the counter is
    /// capped or the secret has no record at the new position.
    pub fn reveal_next(&mut self) -> Option<&ExportRecord> {
        if self.phase != RoundPhase::Active || self.revealed >= MAX_REVEAL {
            return None;
        }
        self.revealed += 1;
        self.secret
            .as_ref()
            .and_then(|secret| secret.exports.get(self.revealed - 1))
    }

    /// Record a rematch vote, returning the number of distinct voters
    pub fn vote_rematch(&mut self, connection_id: ConnectionId) -> usize {
        self.rematch_votes.insert(connection_id);
        self.rematch_votes.len()
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Secret in display form
    pub fn answer(&self) -> Option<&str> {
        self.secret.as_ref().map(|s| s.name.as_str())
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    /// Clues actually disclosed (bounded by the secret's record count)
    pub fn visible_clues(&self) -> usize {
        self.secret
            .as_ref()
            .map_or(0, |s| s.exports.len().min(self.revealed))
    }
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<ExportRecord> {
        (0..n)
            .map(|i| ExportRecord {
                label: format!("item-{i}"),
                value: 1000.0 * (n - i) as f64,
            })
            .collect()
    }

    #[test]
    fn begin_shows_first_three_in_rank_order() {
        let mut round = RoundState::new();
        let clues = round.begin("Brazil".into(), records(12));

        let labels: Vec<_> = clues.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["item-0", "item-1", "item-2"]);
        assert_eq!(round.phase(), RoundPhase::Active);
        assert_eq!(round.revealed(), 3);
    }

    #[test]
    fn begin_with_few_records_shows_what_exists() {
        let mut round = RoundState::new();
        assert_eq!(round.begin("Tuvalu".into(), records(2)).len(), 2);
        assert_eq!(round.visible_clues(), 2);
    }

    #[test]
    fn answer_matching_ignores_case_only() {
        let mut round = RoundState::new();
        round.begin("Brazil".into(), records(3));

        assert!(round.matches_answer("brazil"));
        assert!(round.matches_answer("BRAZIL"));
        assert!(round.matches_answer("Brazil"));
        assert!(!round.matches_answer(" Brazil"));
        assert!(!round.matches_answer("Brasil"));
        assert_eq!(round.answer(), Some("Brazil"));
    }

    #[test]
    fn idle_round_matches_nothing() {
        let round = RoundState::new();
        assert!(!round.matches_answer(""));
        assert_eq!(round.phase(), RoundPhase::Idle);
    }

    #[test]
    fn reveal_caps_at_ten() {
        let mut round = RoundState::new();
        round.begin("Brazil".into(), records(15));

        let revealed: Vec<String> = (0..9)
            .filter_map(|_| round.reveal_next().map(|r| r.label.clone()))
            .collect();

        assert_eq!(revealed.len(), 7);
        assert_eq!(revealed.first().map(String::as_str), Some("item-3"));
        assert_eq!(revealed.last().map(String::as_str), Some("item-9"));
        assert_eq!(round.revealed(), MAX_REVEAL);
    }

    #[test]
    fn reveal_counts_past_short_export_lists() {
        let mut round = RoundState::new();
        round.begin("Tuvalu".into(), records(4));

        assert_eq!(
            round.reveal_next().map(|r| r.label.clone()),
            Some("item-3".into())
        );
        assert!(round.reveal_next().is_none());
        assert_eq!(round.revealed(), 5);
        assert_eq!(round.visible_clues(), 4);
    }

    #[test]
    fn finished_round_stops_revealing() {
        let mut round = RoundState::new();
        round.begin("Brazil".into(), records(12));
        let winner = ConnectionId::new();
        round.finish(winner);

        assert_eq!(round.phase(), RoundPhase::Over { winner });
        assert!(round.reveal_next().is_none());
        assert_eq!(round.revealed(), 3);
    }

    #[test]
    fn votes_are_deduplicated_and_cleared_on_begin() {
        let mut round = RoundState::new();
        round.begin("Brazil".into(), records(3));
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        assert_eq!(round.vote_rematch(a), 1);
        assert_eq!(round.vote_rematch(a), 1);
        assert_eq!(round.vote_rematch(b), 2);

        round.begin("Peru".into(), records(3));
        assert_eq!(round.vote_rematch(a), 1);
    }
}
