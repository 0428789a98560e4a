//! The turn/round engine: a room's state and every rule that changes it.
//!
//! Everything here is synchronous and side-effect free apart from the
//! `&mut self` it's given: no channels, no broadcasts, no clocks other than
//! timestamps on new records. The actor in `room.rs` owns one [`Room`] and
//! calls into it one command at a time, which is what makes each room's
//! mutations serialized.
//!
//! # Turn and round model
//!
//! ```text
//!            submit_turn (current player only)
//!                        │
//!      append story_part tagged with current_round
//!                        │
//!             next_turn: index = (index + 1) % len
//!                        │
//!      human parts in current_round >= player count?
//!               │ no              │ yes
//!             done        current_round += 1
//!                                 │
//!                    current_round > max_rounds?
//!                        │ no          │ yes
//!                      done        Finished
//! ```
//!
//! A leave runs the same completion check against the remaining players,
//! so a round never waits on a part from someone who is gone.
//!
//! Twists are tagged with a round too, but only `story_part` entries count
//! toward completion, so a twist can never complete or stall a round.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use storychain_protocol::{
    AiMode, Player, PlayerId, RoomCode, RoomSnapshot, RoundProgress, StoryEntry,
};

use crate::{RoomSettings, RoomState, StoryError};

/// What [`Room::join`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStatus {
    /// The player took a new seat at the end of the turn order.
    Added,
    /// A player with this id was already seated; nothing changed.
    AlreadySeated,
}

/// A player removed by [`Room::leave`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub player: Player,
    /// Set when the smaller table had already written enough parts, so the
    /// leave itself closed the current round.
    pub progress: Option<RoundProgress>,
}

/// A story part accepted by [`Room::submit_turn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub entry: StoryEntry,
    pub progress: RoundProgress,
}

/// One collaborative story and the players writing it.
#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    settings: RoomSettings,
    state: RoomState,
    /// Turn order.
    players: Vec<Player>,
    /// Append-only.
    story: Vec<StoryEntry>,
    /// Index into `players`; `< players.len()` whenever `players` is non-empty.
    current_turn: usize,
    current_round: u32,
    created_at: DateTime<Utc>,
    round_started_at: DateTime<Utc>,
}

impl Room {
    /// Creates an empty, active room in round 1.
    pub fn new(code: RoomCode, settings: RoomSettings) -> Self {
        let now = Utc::now();
        Self {
            code,
            settings,
            state: RoomState::Active,
            players: Vec::new(),
            story: Vec::new(),
            current_turn: 0,
            current_round: 1,
            created_at: now,
            round_started_at: now,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn settings(&self) -> RoomSettings {
        self.settings
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn story(&self) -> &[StoryEntry] {
        &self.story
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The player whose turn it is, if anyone is seated.
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_turn)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Seats `player` at the end of the turn order.
    ///
    /// Joining twice with the same id is a no-op.
    ///
    /// # Errors
    /// [`StoryError::RoomInactive`] if the story is finished.
    pub fn join(&mut self, player: Player) -> Result<JoinStatus, StoryError> {
        if !self.state.is_active() {
            return Err(StoryError::RoomInactive(self.code.clone()));
        }
        if self.player(&player.id).is_some() {
            return Ok(JoinStatus::AlreadySeated);
        }
        self.players.push(player);
        Ok(JoinStatus::Added)
    }

    /// Removes a player and returns them.
    ///
    /// If the turn index now points past the end it wraps around to the
    /// front. An index that's still in range is left alone, so when a
    /// player earlier in the order leaves, the turn passes to whoever
    /// slid into the current slot.
    ///
    /// Round completion is then re-checked against the remaining players:
    /// if the current round already holds a part per remaining player, it
    /// closes here exactly as it would after a submission.
    ///
    /// # Errors
    /// [`StoryError::PlayerNotFound`] if no such player is seated.
    pub fn leave(&mut self, id: &PlayerId) -> Result<Departure, StoryError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == *id)
            .ok_or_else(|| StoryError::PlayerNotFound(id.clone()))?;
        let player = self.players.remove(index);

        if self.players.is_empty() {
            self.current_turn = 0;
        } else if self.current_turn >= self.players.len() {
            self.current_turn %= self.players.len();
        }

        let progress = (self.state.is_active() && self.is_round_complete())
            .then(|| self.settle_round());
        Ok(Departure { player, progress })
    }

    // -----------------------------------------------------------------------
    // Turns and rounds
    // -----------------------------------------------------------------------

    /// Appends `content` as `player_id`'s part of the story.
    ///
    /// Checks run in this order: finished, out of turn, blank. On success
    /// the content is trimmed and screened, the turn rotates, and round
    /// completion is evaluated.
    ///
    /// # Errors
    /// - [`StoryError::GameFinished`] if the story is finished
    /// - [`StoryError::NotYourTurn`] unless `player_id` is the current player
    /// - [`StoryError::EmptyContent`] if `content` is blank after trimming
    pub fn submit_turn(
        &mut self,
        player_id: &PlayerId,
        content: &str,
    ) -> Result<Submission, StoryError> {
        if !self.state.is_active() {
            return Err(StoryError::GameFinished(self.code.clone()));
        }
        let author = match self.current_player() {
            Some(current) if current.id == *player_id => current.clone(),
            _ => return Err(StoryError::NotYourTurn(player_id.clone())),
        };
        let content = content.trim();
        if content.is_empty() {
            return Err(StoryError::EmptyContent);
        }

        let entry =
            StoryEntry::story_part(storychain_ai::screen(content), &author, self.current_round);
        self.story.push(entry.clone());
        self.next_turn();

        let progress = self.settle_round();
        Ok(Submission { entry, progress })
    }

    /// Rotates the turn to the next player and returns them.
    pub fn next_turn(&mut self) -> Option<&Player> {
        if self.players.is_empty() {
            return None;
        }
        self.current_turn = (self.current_turn + 1) % self.players.len();
        self.current_player()
    }

    /// Number of human parts tagged with `round`.
    pub fn human_parts_in_round(&self, round: u32) -> usize {
        self.story
            .iter()
            .filter(|entry| entry.is_human() && entry.round() == round)
            .count()
    }

    /// Returns `true` once every seated player's worth of human parts has
    /// been written in the current round.
    pub fn is_round_complete(&self) -> bool {
        !self.players.is_empty()
            && self.human_parts_in_round(self.current_round) >= self.players.len()
    }

    /// Whether the room's AI mode makes a twist eligible for `round`.
    ///
    /// Advisory only; nothing in the engine acts on it.
    pub fn automated_turn_eligible(&self, round: u32) -> bool {
        let round_done = !self.players.is_empty()
            && self.human_parts_in_round(round) >= self.players.len();
        match self.settings.ai_mode {
            AiMode::EveryRound => round_done,
            AiMode::EveryTwoRounds => round_done && round % 2 == 0,
            AiMode::ManualOnly => false,
        }
    }

    /// Closes the current round if it's complete and reports where the
    /// room stands.
    fn settle_round(&mut self) -> RoundProgress {
        let round = self.current_round;
        let round_complete = self.is_round_complete();
        let mut automated_twist_eligible = false;
        if round_complete {
            automated_twist_eligible = self.automated_turn_eligible(round);
            self.advance_round();
            // No twist after the last round.
            if !self.state.is_active() {
                automated_twist_eligible = false;
            }
        }
        RoundProgress {
            round,
            round_complete,
            current_round: self.current_round,
            finished: !self.state.is_active(),
            automated_twist_eligible,
        }
    }

    fn advance_round(&mut self) {
        self.current_round += 1;
        self.round_started_at = Utc::now();
        if self.current_round > self.settings.max_rounds {
            self.state = RoomState::Finished;
            tracing::info!(
                room = %self.code,
                final_round = self.settings.max_rounds,
                "story finished"
            );
        } else {
            tracing::info!(room = %self.code, round = self.current_round, "round advanced");
        }
    }

    // -----------------------------------------------------------------------
    // Order and twists
    // -----------------------------------------------------------------------

    /// Randomizes the turn order (Fisher–Yates) and restarts it from the
    /// first seat.
    ///
    /// Returns `false` without touching anything when fewer than two
    /// players are seated.
    pub fn shuffle(&mut self) -> bool {
        if self.players.len() < 2 {
            return false;
        }
        self.players.shuffle(&mut rand::rng());
        self.current_turn = 0;
        true
    }

    /// Appends an automated twist tagged with the current round.
    ///
    /// # Errors
    /// [`StoryError::GameFinished`] if the story is finished.
    pub fn append_twist(&mut self, content: String) -> Result<StoryEntry, StoryError> {
        if !self.state.is_active() {
            return Err(StoryError::GameFinished(self.code.clone()));
        }
        let entry = StoryEntry::ai_twist(content, self.current_round);
        self.story.push(entry.clone());
        Ok(entry)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.code.clone(),
            players: self.players.clone(),
            story: self.story.clone(),
            current_turn: self.current_turn,
            current_player: self.current_player().cloned(),
            current_round: self.current_round,
            max_rounds: self.settings.max_rounds,
            ai_mode: self.settings.ai_mode,
            is_active: self.state.is_active(),
            created_at: self.created_at,
            round_started_at: self.round_started_at,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the turn/round engine.
    //!
    //! Naming: `test_{function}_{scenario}_{expected}`.

    use super::*;
    use storychain_protocol::RoomSummary;

    fn player(id: &str) -> Player {
        Player::new(PlayerId::from(id), id.to_uppercase())
    }

    fn pid(id: &str) -> PlayerId {
        PlayerId::from(id)
    }

    fn room_with(ids: &[&str], max_rounds: u32, ai_mode: AiMode) -> Room {
        let mut room = Room::new(
            RoomCode::new("TEST01"),
            RoomSettings {
                max_rounds,
                ai_mode,
            },
        );
        for id in ids {
            room.join(player(id)).unwrap();
        }
        room
    }

    fn current_id(room: &Room) -> String {
        room.current_player().unwrap().id.0.clone()
    }

    // =====================================================================
    // join()
    // =====================================================================

    #[test]
    fn test_join_appends_in_order() {
        let room = room_with(&["a", "b", "c"], 5, AiMode::ManualOnly);
        let ids: Vec<_> = room.players().iter().map(|p| p.id.0.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(room.current_turn(), 0);
    }

    #[test]
    fn test_join_duplicate_id_is_noop() {
        let mut room = room_with(&["a"], 5, AiMode::ManualOnly);
        let status = room.join(Player::new(pid("a"), "Someone Else")).unwrap();

        assert_eq!(status, JoinStatus::AlreadySeated);
        assert_eq!(room.players().len(), 1);
        assert_eq!(room.players()[0].name, "A");
    }

    #[test]
    fn test_join_finished_room_returns_room_inactive() {
        let mut room = room_with(&["a"], 1, AiMode::ManualOnly);
        room.submit_turn(&pid("a"), "The end.").unwrap();
        assert_eq!(room.state(), RoomState::Finished);

        let err = room.join(player("b")).unwrap_err();
        assert!(matches!(err, StoryError::RoomInactive(_)));
    }

    // =====================================================================
    // leave()
    // =====================================================================

    #[test]
    fn test_leave_unknown_player_returns_player_not_found() {
        let mut room = room_with(&["a"], 5, AiMode::ManualOnly);
        let err = room.leave(&pid("zed")).unwrap_err();
        assert_eq!(err, StoryError::PlayerNotFound(pid("zed")));
    }

    #[test]
    fn test_leave_last_seat_while_current_wraps_to_front() {
        let mut room = room_with(&["a", "b", "c"], 5, AiMode::ManualOnly);
        room.next_turn();
        room.next_turn();
        assert_eq!(current_id(&room), "c");

        room.leave(&pid("c")).unwrap();

        assert_eq!(room.current_turn(), 0);
        assert_eq!(current_id(&room), "a");
    }

    #[test]
    fn test_leave_earlier_seat_keeps_index() {
        let mut room = room_with(&["a", "b", "c"], 5, AiMode::ManualOnly);
        room.next_turn();
        assert_eq!(current_id(&room), "b");

        room.leave(&pid("a")).unwrap();

        // Index 1 is still in range and now holds "c".
        assert_eq!(room.current_turn(), 1);
        assert_eq!(current_id(&room), "c");
    }

    #[test]
    fn test_leave_everyone_empties_room() {
        let mut room = room_with(&["a", "b"], 5, AiMode::ManualOnly);
        room.leave(&pid("a")).unwrap();
        room.leave(&pid("b")).unwrap();
        assert!(room.is_empty());
        assert!(room.current_player().is_none());
    }

    #[test]
    fn test_leave_completes_round_when_remaining_players_done() {
        let mut room = room_with(&["a", "b", "c"], 3, AiMode::EveryRound);
        room.submit_turn(&pid("a"), "One.").unwrap();
        room.submit_turn(&pid("b"), "Two.").unwrap();

        let departure = room.leave(&pid("c")).unwrap();

        let progress = departure.progress.unwrap();
        assert_eq!(departure.player.id, pid("c"));
        assert!(progress.round_complete);
        assert_eq!(progress.round, 1);
        assert_eq!(progress.current_round, 2);
        assert!(!progress.finished);
        assert!(progress.automated_twist_eligible);
        assert_eq!(room.current_round(), 2);
        assert_eq!(current_id(&room), "a");
    }

    #[test]
    fn test_leave_finishes_story_on_last_round() {
        let mut room = room_with(&["a", "b", "c"], 1, AiMode::EveryRound);
        room.submit_turn(&pid("a"), "One.").unwrap();
        room.submit_turn(&pid("b"), "Two.").unwrap();

        let progress = room.leave(&pid("c")).unwrap().progress.unwrap();

        assert!(progress.finished);
        assert!(!progress.automated_twist_eligible);
        assert_eq!(room.state(), RoomState::Finished);
        let err = room.submit_turn(&pid("a"), "Again.").unwrap_err();
        assert!(matches!(err, StoryError::GameFinished(_)));
        assert_eq!(room.human_parts_in_round(1), 2);
    }

    #[test]
    fn test_leave_round_still_short_reports_nothing() {
        let mut room = room_with(&["a", "b", "c"], 5, AiMode::ManualOnly);
        room.submit_turn(&pid("a"), "One.").unwrap();

        let departure = room.leave(&pid("c")).unwrap();

        assert!(departure.progress.is_none());
        assert_eq!(room.current_round(), 1);
    }

    #[test]
    fn test_leave_finished_room_does_not_advance() {
        let mut room = room_with(&["a", "b"], 1, AiMode::ManualOnly);
        room.submit_turn(&pid("a"), "One.").unwrap();
        room.submit_turn(&pid("b"), "Two.").unwrap();
        let round = room.current_round();

        let departure = room.leave(&pid("b")).unwrap();

        assert!(departure.progress.is_none());
        assert_eq!(room.current_round(), round);
    }

    #[test]
    fn test_leave_index_always_in_range() {
        let mut room = room_with(&["a", "b", "c", "d"], 5, AiMode::ManualOnly);
        for _ in 0..3 {
            room.next_turn();
        }
        for id in ["b", "d", "a"] {
            room.leave(&pid(id)).unwrap();
            assert!(room.current_turn() < room.players().len());
        }
    }

    // =====================================================================
    // submit_turn()
    // =====================================================================

    #[test]
    fn test_submit_turn_out_of_order_does_not_mutate() {
        let mut room = room_with(&["a", "b"], 5, AiMode::ManualOnly);

        let err = room.submit_turn(&pid("b"), "Me first!").unwrap_err();

        assert_eq!(err, StoryError::NotYourTurn(pid("b")));
        assert!(room.story().is_empty());
        assert_eq!(current_id(&room), "a");
    }

    #[test]
    fn test_submit_turn_unknown_player_not_your_turn() {
        let mut room = room_with(&["a"], 5, AiMode::ManualOnly);
        let err = room.submit_turn(&pid("ghost"), "Boo").unwrap_err();
        assert!(matches!(err, StoryError::NotYourTurn(_)));
    }

    #[test]
    fn test_submit_turn_blank_content_returns_empty_content() {
        let mut room = room_with(&["a"], 5, AiMode::ManualOnly);
        let err = room.submit_turn(&pid("a"), "   \n\t").unwrap_err();
        assert_eq!(err, StoryError::EmptyContent);
        assert!(room.story().is_empty());
    }

    #[test]
    fn test_submit_turn_out_of_turn_checked_before_blank() {
        let mut room = room_with(&["a", "b"], 5, AiMode::ManualOnly);
        let err = room.submit_turn(&pid("b"), "  ").unwrap_err();
        assert!(matches!(err, StoryError::NotYourTurn(_)));
    }

    #[test]
    fn test_submit_turn_trims_and_tags_round() {
        let mut room = room_with(&["a", "b"], 5, AiMode::ManualOnly);

        let submission = room.submit_turn(&pid("a"), "  It was a dark night.  ").unwrap();

        match &submission.entry {
            StoryEntry::StoryPart {
                content,
                author,
                author_id,
                round,
                ..
            } => {
                assert_eq!(content, "It was a dark night.");
                assert_eq!(author, "A");
                assert_eq!(author_id, &pid("a"));
                assert_eq!(*round, 1);
            }
            other => panic!("expected a story part, got {other:?}"),
        }
        assert_eq!(current_id(&room), "b");
    }

    #[test]
    fn test_submit_turn_flagged_content_is_replaced() {
        let mut room = room_with(&["a"], 5, AiMode::ManualOnly);
        let submission = room.submit_turn(&pid("a"), "Pure VIOLENCE ensued").unwrap();
        assert_eq!(submission.entry.content(), storychain_ai::SCREENED_REPLACEMENT);
    }

    #[test]
    fn test_submit_turn_worked_example_two_rounds() {
        let mut room = room_with(&["a", "b"], 2, AiMode::ManualOnly);

        let p = room.submit_turn(&pid("a"), "A1").unwrap().progress;
        assert!(!p.round_complete);
        assert_eq!(p.current_round, 1);

        let p = room.submit_turn(&pid("b"), "B1").unwrap().progress;
        assert!(p.round_complete);
        assert_eq!(p.round, 1);
        assert_eq!(p.current_round, 2);
        assert!(!p.finished);

        let p = room.submit_turn(&pid("a"), "A2").unwrap().progress;
        assert!(!p.round_complete);

        let p = room.submit_turn(&pid("b"), "B2").unwrap().progress;
        assert!(p.round_complete);
        assert!(p.finished);
        assert_eq!(p.round, 2);
        assert_eq!(room.state(), RoomState::Finished);
        assert!(!room.snapshot().is_active);

        let err = room.submit_turn(&pid("a"), "A3").unwrap_err();
        assert!(matches!(err, StoryError::GameFinished(_)));
        assert_eq!(room.story().len(), 4);
    }

    #[test]
    fn test_submit_turn_finished_checked_before_turn() {
        let mut room = room_with(&["a", "b"], 1, AiMode::ManualOnly);
        room.submit_turn(&pid("a"), "A").unwrap();
        room.submit_turn(&pid("b"), "B").unwrap();

        // "b" isn't the current player either, but finished wins.
        let err = room.submit_turn(&pid("b"), "").unwrap_err();
        assert!(matches!(err, StoryError::GameFinished(_)));
    }

    #[test]
    fn test_submit_turn_round_started_at_resets_on_advance() {
        let mut room = room_with(&["a"], 3, AiMode::ManualOnly);
        let before = room.snapshot().round_started_at;
        room.submit_turn(&pid("a"), "One").unwrap();
        assert!(room.snapshot().round_started_at >= before);
        assert_eq!(room.current_round(), 2);
    }

    // =====================================================================
    // automated_turn_eligible()
    // =====================================================================

    #[test]
    fn test_automated_turn_eligible_every_round() {
        let mut room = room_with(&["a", "b"], 5, AiMode::EveryRound);
        let p = room.submit_turn(&pid("a"), "A1").unwrap().progress;
        assert!(!p.automated_twist_eligible);
        let p = room.submit_turn(&pid("b"), "B1").unwrap().progress;
        assert!(p.automated_twist_eligible);
    }

    #[test]
    fn test_automated_turn_eligible_every_two_rounds_only_even() {
        let mut room = room_with(&["a"], 5, AiMode::EveryTwoRounds);
        let eligible: Vec<bool> = ["1", "2", "3", "4"]
            .iter()
            .map(|text| {
                room.submit_turn(&pid("a"), text)
                    .unwrap()
                    .progress
                    .automated_twist_eligible
            })
            .collect();
        assert_eq!(eligible, [false, true, false, true]);
    }

    #[test]
    fn test_automated_turn_eligible_manual_only_never() {
        let mut room = room_with(&["a"], 5, AiMode::ManualOnly);
        for _ in 0..3 {
            let p = room.submit_turn(&pid("a"), "text").unwrap().progress;
            assert!(p.round_complete);
            assert!(!p.automated_twist_eligible);
        }
    }

    #[test]
    fn test_automated_turn_eligible_false_on_final_round() {
        let mut room = room_with(&["a"], 1, AiMode::EveryRound);
        let p = room.submit_turn(&pid("a"), "The end").unwrap().progress;
        assert!(p.finished);
        assert!(!p.automated_twist_eligible);
    }

    #[test]
    fn test_automated_turn_eligible_predicate_counts_round() {
        let mut room = room_with(&["a", "b"], 5, AiMode::EveryRound);
        room.submit_turn(&pid("a"), "A1").unwrap();
        assert!(!room.automated_turn_eligible(1));
        room.submit_turn(&pid("b"), "B1").unwrap();
        assert!(room.automated_turn_eligible(1));
        assert!(!room.automated_turn_eligible(2));
    }

    // =====================================================================
    // Twists
    // =====================================================================

    #[test]
    fn test_append_twist_does_not_count_toward_round() {
        let mut room = room_with(&["a", "b"], 5, AiMode::ManualOnly);
        room.submit_turn(&pid("a"), "A1").unwrap();
        room.append_twist("A storm rolls in.".into()).unwrap();
        room.append_twist("Then another.".into()).unwrap();

        assert_eq!(room.current_round(), 1);
        assert_eq!(current_id(&room), "b");

        let p = room.submit_turn(&pid("b"), "B1").unwrap().progress;
        assert!(p.round_complete);
    }

    #[test]
    fn test_append_twist_tagged_with_current_round() {
        let mut room = room_with(&["a"], 5, AiMode::ManualOnly);
        room.submit_turn(&pid("a"), "A1").unwrap();
        let twist = room.append_twist("Surprise!".into()).unwrap();
        assert_eq!(twist.round(), 2);
        assert!(!twist.is_human());
    }

    #[test]
    fn test_append_twist_finished_returns_game_finished() {
        let mut room = room_with(&["a"], 1, AiMode::ManualOnly);
        room.submit_turn(&pid("a"), "Fin").unwrap();
        let err = room.append_twist("Too late".into()).unwrap_err();
        assert!(matches!(err, StoryError::GameFinished(_)));
    }

    // =====================================================================
    // next_turn() / shuffle()
    // =====================================================================

    #[test]
    fn test_next_turn_wraps_around() {
        let mut room = room_with(&["a", "b"], 5, AiMode::ManualOnly);
        assert_eq!(room.next_turn().unwrap().id, pid("b"));
        assert_eq!(room.next_turn().unwrap().id, pid("a"));
    }

    #[test]
    fn test_next_turn_empty_room_returns_none() {
        let mut room = room_with(&[], 5, AiMode::ManualOnly);
        assert!(room.next_turn().is_none());
    }

    #[test]
    fn test_shuffle_single_player_is_noop() {
        let mut room = room_with(&["a"], 5, AiMode::ManualOnly);
        assert!(!room.shuffle());
        assert_eq!(room.players().len(), 1);
    }

    #[test]
    fn test_shuffle_is_permutation_and_resets_turn() {
        let mut room = room_with(&["a", "b", "c", "d", "e"], 5, AiMode::ManualOnly);
        room.next_turn();
        room.next_turn();

        assert!(room.shuffle());

        let mut ids: Vec<_> = room.players().iter().map(|p| p.id.0.clone()).collect();
        ids.sort();
        assert_eq!(ids, ["a", "b", "c", "d", "e"]);
        assert_eq!(room.current_turn(), 0);
    }

    // =====================================================================
    // Views
    // =====================================================================

    #[test]
    fn test_snapshot_reflects_state() {
        let mut room = room_with(&["a", "b"], 3, AiMode::EveryRound);
        room.submit_turn(&pid("a"), "Hello").unwrap();

        let snap = room.snapshot();
        assert_eq!(snap.id, RoomCode::new("TEST01"));
        assert_eq!(snap.players.len(), 2);
        assert_eq!(snap.story.len(), 1);
        assert_eq!(snap.current_turn, 1);
        assert_eq!(snap.current_player.as_ref().unwrap().id, pid("b"));
        assert_eq!(snap.max_rounds, 3);
        assert_eq!(snap.ai_mode, AiMode::EveryRound);
        assert!(snap.is_active);

        let summary = RoomSummary::from(&snap);
        assert_eq!(summary.player_count, 2);
        assert_eq!(summary.current_round, 1);
    }
}
