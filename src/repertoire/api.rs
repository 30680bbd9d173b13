//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the drill
//! sessions. It is the single entry point for every repertoire operation,
//! regardless of the UI in front of it.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** record management to `commands/*.rs`
//! - **Owns the drill sessions**, one per [`DrillMode`], created when the user
//!   enters a mode and discarded when they leave it
//! - **Persists** the scheduling results a spaced-review session produces,
//!   right after the operation that produced them
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: record rules live in `commands/*.rs`, drill rules in `drill/`
//! - **I/O operations**: no stdout, stderr, or file formatting
//! - **Pacing**: callers decide when time passes and call [`TrainerApi::advance`]
//!
//! ## Generic Over KeyValueStore
//!
//! `TrainerApi<S: KeyValueStore>` is generic over the storage backend:
//! - Production: `TrainerApi<FileStore>`
//! - Testing: `TrainerApi<InMemoryStore>`

use crate::commands::{self, config::ConfigAction, edit::OpeningUpdate, save::SaveRequest};
use crate::drill::{
    Advance, DrillEvent, DrillMode, DrillSession, MoveOutcome, PieceKind, Reveal,
};
use crate::error::{RepertoireError, Result};
use crate::facets::{filter_records, OpeningFilter};
use crate::queue::{build_due_queue, shuffle_entries, DueEntry, QueueSeed};
use crate::rules::ChessBoard;
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;
use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub type Session = DrillSession<ChessBoard>;

/// The main API facade for repertoire operations.
pub struct TrainerApi<S: KeyValueStore> {
    store: OpeningStore<S>,
    sessions: BTreeMap<DrillMode, Session>,
    seed: QueueSeed,
}

impl<S: KeyValueStore> TrainerApi<S> {
    pub fn new(kv: S) -> Self {
        Self {
            store: OpeningStore::new(kv),
            sessions: BTreeMap::new(),
            seed: QueueSeed::default(),
        }
    }

    /// Fixes the shuffle seed so queues come out in a reproducible order.
    pub fn with_queue_seed(mut self, seed: QueueSeed) -> Self {
        self.seed = seed;
        self
    }

    pub fn store(&self) -> &OpeningStore<S> {
        &self.store
    }

    // --- Record management ---

    pub fn save_opening(&mut self, request: SaveRequest) -> Result<commands::CmdResult> {
        commands::save::run(&mut self.store, request)
    }

    pub fn edit_opening(&mut self, key: &str, update: OpeningUpdate) -> Result<commands::CmdResult> {
        commands::edit::run(&mut self.store, key, update)
    }

    pub fn delete_openings(&mut self, keys: &[String]) -> Result<commands::CmdResult> {
        commands::delete::run(&mut self.store, keys)
    }

    pub fn list_openings(
        &self,
        filter: &OpeningFilter,
        search: Option<&str>,
        due_only: bool,
    ) -> Result<commands::CmdResult> {
        commands::list::run(&self.store, filter, search, due_only)
    }

    pub fn view_openings(&self, keys: &[String]) -> Result<commands::CmdResult> {
        commands::view::run(&self.store, keys)
    }

    pub fn facets(&self) -> Result<commands::CmdResult> {
        commands::facets::run(&self.store)
    }

    pub fn status(&self) -> Result<commands::CmdResult> {
        commands::status::run(&self.store, Utc::now())
    }

    pub fn import_pgn(&mut self, text: &str) -> Result<commands::CmdResult> {
        commands::pgn::run(&mut self.store, text, Utc::now())
    }

    pub fn export_backup(&self) -> Result<commands::CmdResult> {
        commands::backup::export(&self.store, Utc::now())
    }

    pub fn import_backup(&mut self, content: &str) -> Result<commands::CmdResult> {
        commands::backup::import(&mut self.store, content)
    }

    pub fn reset_progress(&mut self) -> Result<commands::CmdResult> {
        commands::progress::reset(&mut self.store)
    }

    pub fn wipe(&mut self) -> Result<commands::CmdResult> {
        self.leave_all();
        commands::progress::wipe(&mut self.store)
    }

    pub fn migrate(&mut self) -> Result<commands::CmdResult> {
        commands::migrate::run(&mut self.store)
    }

    pub fn config(&mut self, action: ConfigAction) -> Result<commands::CmdResult> {
        commands::config::run(&mut self.store, action)
    }

    // --- Drill sessions ---

    /// Starts spaced review over every line due now.
    pub fn enter_review(&mut self) -> Result<Advance> {
        let openings = self.store.openings()?;
        let mut rng = self.seed.rng();
        let queue = build_due_queue(&openings, Utc::now(), &mut rng);
        self.enter(DrillMode::Spaced, queue)
    }

    /// Starts practice over the lines matching `filter`, in random order.
    pub fn enter_practice(&mut self, filter: &OpeningFilter) -> Result<Advance> {
        let openings = self.store.openings()?;
        let mut queue: Vec<DueEntry> = filter_records(&openings, filter)
            .into_iter()
            .map(|(key, record)| DueEntry::new(key, record))
            .collect();
        shuffle_entries(&mut queue, &mut self.seed.rng());
        self.enter(DrillMode::Practice, queue)
    }

    /// Starts learning a single line.
    pub fn enter_learn(&mut self, key: &str) -> Result<Advance> {
        let record = self.store.get(key)?;
        self.enter(DrillMode::Learn, vec![DueEntry::new(key, record)])
    }

    fn enter(&mut self, mode: DrillMode, queue: Vec<DueEntry>) -> Result<Advance> {
        self.leave(mode);
        let mut session = DrillSession::new(mode, queue, ChessBoard::new());
        let advance = session
            .next()
            .ok_or_else(|| RepertoireError::Api(format!("{} session already in progress", mode)))?;
        session.persist_reviews(&mut self.store, Utc::now())?;
        self.sessions.insert(mode, session);
        debug!(mode = %mode, "entered drill mode");
        Ok(advance)
    }

    /// Discards the session for `mode`, cancelling its pending tasks.
    pub fn leave(&mut self, mode: DrillMode) {
        if let Some(mut session) = self.sessions.remove(&mode) {
            session.leave();
        }
    }

    pub fn leave_all(&mut self) {
        for mode in DrillMode::ALL {
            self.leave(mode);
        }
    }

    pub fn session(&self, mode: DrillMode) -> Option<&Session> {
        self.sessions.get(&mode)
    }

    /// Runs `op` against the session for `mode`, then persists whatever
    /// reviews it produced.
    fn with_session<T>(&mut self, mode: DrillMode, op: impl FnOnce(&mut Session) -> T) -> Result<T> {
        let session = self
            .sessions
            .get_mut(&mode)
            .ok_or_else(|| RepertoireError::Api(format!("No active {} session", mode)))?;
        let value = op(session);
        session.persist_reviews(&mut self.store, Utc::now())?;
        Ok(value)
    }

    pub fn submit_move(
        &mut self,
        mode: DrillMode,
        from: &str,
        to: &str,
        promotion: Option<char>,
    ) -> Result<MoveOutcome> {
        self.with_session(mode, |s| s.submit_move(from, to, promotion))
    }

    pub fn submit_san(&mut self, mode: DrillMode, text: &str) -> Result<MoveOutcome> {
        self.with_session(mode, |s| s.submit_san(text))
    }

    pub fn hint(&mut self, mode: DrillMode) -> Result<Option<PieceKind>> {
        self.with_session(mode, |s| s.hint())
    }

    pub fn reveal(&mut self, mode: DrillMode) -> Result<Option<Reveal>> {
        self.with_session(mode, |s| s.reveal())
    }

    pub fn restart(&mut self, mode: DrillMode) -> Result<Option<Advance>> {
        self.with_session(mode, |s| s.restart())
    }

    /// Moves past a finished line. `None` while the current line is in flight.
    pub fn next(&mut self, mode: DrillMode) -> Result<Option<Advance>> {
        self.with_session(mode, |s| s.next())
    }

    pub fn advance(&mut self, mode: DrillMode, elapsed: Duration) -> Result<Vec<DrillEvent>> {
        self.with_session(mode, |s| s.advance(elapsed))
    }

    pub fn settle(&mut self, mode: DrillMode) -> Result<Vec<DrillEvent>> {
        self.with_session(mode, |s| s.settle())
    }
}
