//! # Drill Sessions
//!
//! A drill steps the trainee through recorded lines one ply at a time. The user
//! plays their side; the session replies with the recorded opponent moves after
//! a short pause. Every mode runs the same state machine:
//!
//! ```text
//! Idle ──next──▶ AwaitingUserMove ──match──▶ OpponentReplying ──reply──▶ AwaitingUserMove
//!                     │   ▲                                                  │
//!                     │   └──────────── mismatch (move taken back) ◀─────────┘
//!                     └──line finished / reveal──▶ Complete ──next──▶ ...
//! ```
//!
//! Modes differ only in the policy looked up from [`DrillMode::policy`]: when a
//! line counts as finished, whether results feed the scheduler, and what a
//! reveal does to the queue.
//!
//! Sessions never touch storage directly. Scheduling outcomes collect as
//! pending reviews and are written by [`DrillSession::persist_reviews`], which
//! the API layer calls after every session operation.

pub mod tasks;

use crate::error::{RepertoireError, Result};
use crate::model::Color;
use crate::queue::DueEntry;
use crate::rules::{san_core, RulesEngine};
use crate::scheduler::compute_next_review;
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tasks::{TaskKind, TaskQueue};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrillMode {
    Spaced,
    Practice,
    Learn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every ply of the trainee's colour has been played.
    UserPlies,
    /// The cursor has reached the end of the line.
    AllPlies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPolicy {
    /// Drop the line from this session.
    Dequeue,
    /// Put the line back at the tail of the queue.
    Requeue,
    /// Show the answer and keep drilling the same line.
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePolicy {
    pub completion: Completion,
    pub schedules: bool,
    pub reveal: RevealPolicy,
    pub reports_expected: bool,
    pub reply_delay: Duration,
    pub status_hide: Duration,
}

impl DrillMode {
    pub const ALL: [DrillMode; 3] = [DrillMode::Spaced, DrillMode::Practice, DrillMode::Learn];

    pub fn policy(self) -> ModePolicy {
        match self {
            DrillMode::Spaced => ModePolicy {
                completion: Completion::UserPlies,
                schedules: true,
                reveal: RevealPolicy::Dequeue,
                reports_expected: false,
                reply_delay: Duration::from_millis(500),
                status_hide: Duration::from_millis(3000),
            },
            DrillMode::Practice => ModePolicy {
                completion: Completion::AllPlies,
                schedules: false,
                reveal: RevealPolicy::Requeue,
                reports_expected: false,
                reply_delay: Duration::from_millis(300),
                status_hide: Duration::from_millis(2000),
            },
            DrillMode::Learn => ModePolicy {
                completion: Completion::AllPlies,
                schedules: false,
                reveal: RevealPolicy::Keep,
                reports_expected: true,
                reply_delay: Duration::from_millis(500),
                status_hide: Duration::from_millis(3000),
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DrillMode::Spaced => "review",
            DrillMode::Practice => "practice",
            DrillMode::Learn => "learn",
        }
    }
}

impl fmt::Display for DrillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrillMode {
    type Err = RepertoireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "review" | "spaced" => Ok(DrillMode::Spaced),
            "practice" => Ok(DrillMode::Practice),
            "learn" => Ok(DrillMode::Learn),
            other => Err(RepertoireError::Validation(format!(
                "Unknown drill mode '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillState {
    Idle,
    AwaitingUserMove,
    OpponentReplying,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Rejected before matching: no line, wrong phase, or not a legal move.
    Illegal,
    Mismatch {
        played: String,
        /// Only reported by modes that teach rather than test.
        expected: Option<String>,
    },
    Matched {
        san: String,
    },
    Completed {
        san: String,
        flawless: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrillEvent {
    OpponentMoved { san: String },
    Completed { flawless: bool },
    /// The recorded reply is not legal in the current position.
    LineBroken { san: String },
    StatusCleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Classifies a SAN move by its leading letter. Castling moves the king.
    pub fn from_san(san: &str) -> Self {
        match san.trim().chars().next() {
            Some('N') => PieceKind::Knight,
            Some('B') => PieceKind::Bishop,
            Some('R') => PieceKind::Rook,
            Some('Q') => PieceKind::Queen,
            Some('K') | Some('O') => PieceKind::King,
            _ => PieceKind::Pawn,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "Pawn",
            PieceKind::Knight => "Knight",
            PieceKind::Bishop => "Bishop",
            PieceKind::Rook => "Rook",
            PieceKind::Queen => "Queen",
            PieceKind::King => "King",
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    pub moves: Vec<String>,
    pub remaining: Vec<String>,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Started {
        key: String,
        name: String,
        playing_as: Color,
        /// White's first move, already played when drilling Black.
        opponent_opened: Option<String>,
    },
    SessionComplete {
        completed: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Progress: {} of {} completed", self.completed, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReview {
    pub key: String,
    pub was_correct: bool,
}

pub fn session_complete_message(completed: usize) -> String {
    format!(
        "All done! Completed {} opening{} this session!",
        completed,
        if completed == 1 { "" } else { "s" }
    )
}

pub struct DrillSession<E: RulesEngine> {
    mode: DrillMode,
    policy: ModePolicy,
    engine: E,
    queue: VecDeque<DueEntry>,
    active: Option<DueEntry>,
    cursor: usize,
    has_mistakes: bool,
    completed_count: usize,
    state: DrillState,
    status: Option<String>,
    tasks: TaskQueue,
    reviews: Vec<PendingReview>,
}

impl<E: RulesEngine> DrillSession<E> {
    pub fn new(mode: DrillMode, queue: Vec<DueEntry>, engine: E) -> Self {
        debug!(mode = %mode, queued = queue.len(), "drill session created");
        Self {
            mode,
            policy: mode.policy(),
            engine,
            queue: queue.into(),
            active: None,
            cursor: 0,
            has_mistakes: false,
            completed_count: 0,
            state: DrillState::Idle,
            status: None,
            tasks: TaskQueue::new(),
            reviews: Vec::new(),
        }
    }

    pub fn mode(&self) -> DrillMode {
        self.mode
    }

    pub fn state(&self) -> DrillState {
        self.state
    }

    pub fn active(&self) -> Option<&DueEntry> {
        self.active.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn has_mistakes(&self) -> bool {
        self.has_mistakes
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    pub fn pending_reviews(&self) -> &[PendingReview] {
        &self.reviews
    }

    /// A line is loaded and not yet finished.
    pub fn in_flight(&self) -> bool {
        matches!(
            self.state,
            DrillState::AwaitingUserMove | DrillState::OpponentReplying
        )
    }

    pub fn progress(&self) -> Progress {
        let remaining = self.queue.len() + usize::from(self.in_flight());
        Progress {
            completed: self.completed_count,
            total: self.completed_count + remaining,
        }
    }

    /// Loads the next queued line, or reports the end of the session.
    /// Returns `None` while a line is in flight; finish or reveal it first.
    pub fn next(&mut self) -> Option<Advance> {
        if self.in_flight() {
            debug!(mode = %self.mode, "next refused while a line is in flight");
            return None;
        }
        self.tasks.cancel_kind(TaskKind::OpponentReply);
        let advance = match self.queue.pop_front() {
            Some(entry) => {
                self.active = Some(entry);
                self.begin_line()
            }
            None => {
                self.active = None;
                self.state = DrillState::Idle;
                let completed = self.completed_count;
                self.set_status(session_complete_message(completed));
                info!(mode = %self.mode, completed, "drill session complete");
                Advance::SessionComplete { completed }
            }
        };
        Some(advance)
    }

    /// Replays the active line from its first move.
    pub fn restart(&mut self) -> Option<Advance> {
        self.active.as_ref()?;
        self.tasks.cancel_kind(TaskKind::OpponentReply);
        Some(self.begin_line())
    }

    fn begin_line(&mut self) -> Advance {
        self.engine.reset();
        self.cursor = 0;
        self.has_mistakes = false;
        self.state = DrillState::AwaitingUserMove;

        let Some(entry) = self.active.as_ref() else {
            return Advance::SessionComplete {
                completed: self.completed_count,
            };
        };
        let key = entry.key.clone();
        let name = entry.record.name.clone();
        let playing_as = entry.record.playing_as;
        let first = entry.record.moves.first().cloned();

        let mut opponent_opened = None;
        if playing_as == Color::Black {
            if let Some(first) = first {
                match self.engine.play_san(&first, true) {
                    Some(san) => {
                        self.cursor = 1;
                        opponent_opened = Some(san);
                    }
                    None => {
                        warn!(key = %key, san = %first, "recorded first move is illegal");
                        self.state = DrillState::Complete;
                    }
                }
            }
        }
        debug!(mode = %self.mode, key = %key, cursor = self.cursor, "line started");

        // Only a black line holding White's first move gets here
        if self.state == DrillState::AwaitingUserMove && self.is_line_finished() {
            warn!(key = %key, "line has no moves for the trainee, skipping");
            self.state = DrillState::Complete;
            self.set_status(format!("{} has no moves for you to play.", name));
        }

        Advance::Started {
            key,
            name,
            playing_as,
            opponent_opened,
        }
    }

    /// Submits a move given by its squares, as a board widget would.
    pub fn submit_move(&mut self, from: &str, to: &str, promotion: Option<char>) -> MoveOutcome {
        if !self.accepts_user_move() {
            return MoveOutcome::Illegal;
        }
        match self.engine.play_squares(from, to, promotion) {
            Some(san) => self.match_played(san),
            None => MoveOutcome::Illegal,
        }
    }

    /// Submits a move typed in SAN or coordinate notation.
    pub fn submit_san(&mut self, text: &str) -> MoveOutcome {
        if !self.accepts_user_move() {
            return MoveOutcome::Illegal;
        }
        match self.engine.play_san(text, true) {
            Some(san) => self.match_played(san),
            None => MoveOutcome::Illegal,
        }
    }

    fn accepts_user_move(&self) -> bool {
        match &self.active {
            Some(entry) => {
                self.state == DrillState::AwaitingUserMove
                    && self.cursor < entry.record.moves.len()
                    && self.engine.turn() == entry.record.playing_as
            }
            None => false,
        }
    }

    fn expected(&self) -> Option<&str> {
        self.active
            .as_ref()
            .and_then(|entry| entry.record.moves.get(self.cursor))
            .map(String::as_str)
    }

    fn match_played(&mut self, san: String) -> MoveOutcome {
        let expected = self.expected().unwrap_or_default().to_string();

        if san_core(&san) != san_core(&expected) {
            self.engine.undo();
            self.has_mistakes = true;
            debug!(mode = %self.mode, played = %san, expected = %expected, "mismatch");

            if self.policy.schedules {
                self.queue_review(false);
            }
            if self.policy.reports_expected {
                self.set_status(format!("Wrong move! The line continues {}.", expected));
                return MoveOutcome::Mismatch {
                    played: san,
                    expected: Some(expected),
                };
            }
            self.set_status("Wrong move! Try again.".to_string());
            return MoveOutcome::Mismatch {
                played: san,
                expected: None,
            };
        }

        self.cursor += 1;
        if self.is_line_finished() {
            let flawless = self.finish_line();
            return MoveOutcome::Completed { san, flawless };
        }

        self.state = DrillState::OpponentReplying;
        self.tasks
            .schedule(TaskKind::OpponentReply, self.policy.reply_delay);
        MoveOutcome::Matched { san }
    }

    fn is_line_finished(&self) -> bool {
        let Some(entry) = self.active.as_ref() else {
            return false;
        };
        let record = &entry.record;
        match self.policy.completion {
            Completion::AllPlies => self.cursor >= record.moves.len(),
            Completion::UserPlies => {
                let played = (0..self.cursor.min(record.moves.len()))
                    .filter(|&ply| record.playing_as.owns_ply(ply))
                    .count();
                played >= record.user_ply_count()
            }
        }
    }

    /// Marks the active line complete. Returns whether it was flawless.
    fn finish_line(&mut self) -> bool {
        let flawless = !self.has_mistakes;
        self.state = DrillState::Complete;
        self.completed_count += 1;
        self.tasks.cancel_kind(TaskKind::OpponentReply);

        if self.policy.schedules && flawless {
            self.queue_review(true);
        }
        let message = if flawless {
            "Perfect! Line completed without mistakes."
        } else {
            "Line completed with mistakes. Keep practicing!"
        };
        self.set_status(message.to_string());
        info!(mode = %self.mode, flawless, completed = self.completed_count, "line completed");
        flawless
    }

    /// Piece type of the expected move. The destination is never revealed.
    pub fn hint(&self) -> Option<PieceKind> {
        if !self.accepts_user_move() {
            return None;
        }
        self.expected().map(PieceKind::from_san)
    }

    /// Shows the whole line and applies the mode's reveal policy.
    pub fn reveal(&mut self) -> Option<Reveal> {
        let entry = self.active.as_ref()?;
        if self.state == DrillState::Complete {
            return None;
        }
        let moves = entry.record.moves.clone();
        let reveal = Reveal {
            remaining: moves[self.cursor.min(moves.len())..].to_vec(),
            moves,
            cursor: self.cursor,
        };
        self.set_status(format!("Answer: {}", reveal.moves.join(" ")));

        match self.policy.reveal {
            RevealPolicy::Keep => return Some(reveal),
            RevealPolicy::Dequeue => {
                if self.policy.schedules {
                    self.queue_review(false);
                }
            }
            RevealPolicy::Requeue => {
                if let Some(entry) = self.active.clone() {
                    self.queue.push_back(entry);
                }
            }
        }
        self.tasks.cancel_kind(TaskKind::OpponentReply);
        self.state = DrillState::Complete;
        debug!(mode = %self.mode, policy = ?self.policy.reveal, "line revealed");
        Some(reveal)
    }

    /// Runs the deferred tasks that became due after `elapsed`.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<DrillEvent> {
        let due = self.tasks.advance(elapsed);
        self.run_tasks(due.into_iter().map(|(_, kind)| kind))
    }

    /// Runs every pending task, including ones scheduled while settling.
    pub fn settle(&mut self) -> Vec<DrillEvent> {
        let mut events = Vec::new();
        while !self.tasks.is_empty() {
            let due = self.tasks.drain();
            events.extend(self.run_tasks(due.into_iter().map(|(_, kind)| kind)));
        }
        events
    }

    /// Runs pending opponent replies but leaves status hiding queued.
    pub fn settle_replies(&mut self) -> Vec<DrillEvent> {
        let mut events = Vec::new();
        while self.tasks.has_pending(TaskKind::OpponentReply) {
            let due = self.tasks.drain_kind(TaskKind::OpponentReply);
            events.extend(self.run_tasks(due.into_iter().map(|(_, kind)| kind)));
        }
        events
    }

    fn run_tasks(&mut self, kinds: impl Iterator<Item = TaskKind>) -> Vec<DrillEvent> {
        let mut events = Vec::new();
        for kind in kinds {
            match kind {
                TaskKind::OpponentReply => events.extend(self.opponent_reply()),
                TaskKind::HideStatus => {
                    if self.status.take().is_some() {
                        events.push(DrillEvent::StatusCleared);
                    }
                }
            }
        }
        events
    }

    fn opponent_reply(&mut self) -> Option<DrillEvent> {
        if self.state != DrillState::OpponentReplying {
            return None;
        }
        let expected = self.expected()?.to_string();
        match self.engine.play_san(&expected, true) {
            Some(san) => {
                self.cursor += 1;
                if self.is_line_finished() {
                    let flawless = self.finish_line();
                    return Some(DrillEvent::Completed { flawless });
                }
                self.state = DrillState::AwaitingUserMove;
                Some(DrillEvent::OpponentMoved { san })
            }
            None => {
                warn!(mode = %self.mode, san = %expected, "recorded reply is illegal, ending line");
                self.state = DrillState::Complete;
                self.set_status(format!("The recorded move {} is not legal here.", expected));
                Some(DrillEvent::LineBroken { san: expected })
            }
        }
    }

    /// Cancels every deferred task. The session is unusable afterwards until
    /// `next` is called.
    pub fn leave(&mut self) {
        self.tasks.cancel_all();
        self.status = None;
        self.state = DrillState::Idle;
        debug!(mode = %self.mode, "drill session left");
    }

    fn set_status(&mut self, message: String) {
        self.status = Some(message);
        self.tasks.cancel_kind(TaskKind::HideStatus);
        self.tasks
            .schedule(TaskKind::HideStatus, self.policy.status_hide);
    }

    fn queue_review(&mut self, was_correct: bool) {
        if let Some(entry) = &self.active {
            self.reviews.push(PendingReview {
                key: entry.key.clone(),
                was_correct,
            });
        }
    }

    /// Applies the scheduler to every pending review and writes the results.
    /// Lines deleted from the store since the session started are skipped.
    pub fn persist_reviews<S: KeyValueStore>(
        &mut self,
        store: &mut OpeningStore<S>,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let reviews = std::mem::take(&mut self.reviews);
        let mut written = 0;
        for review in reviews {
            let record = match store.get(&review.key) {
                Ok(record) => record,
                Err(RepertoireError::OpeningNotFound(_)) => {
                    warn!(key = %review.key, "reviewed line no longer exists, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let updated = compute_next_review(&record, review.was_correct, now);
            info!(
                key = %review.key,
                correct = review.was_correct,
                review_count = updated.review_count,
                "review recorded"
            );
            store.save(&review.key, updated)?;
            written += 1;
        }
        Ok(written)
    }
}
