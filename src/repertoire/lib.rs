//! # Repertoire Architecture
//!
//! Repertoire is a **UI-agnostic chess opening trainer**. The terminal client in
//! `cli/` is one way to drive it; everything it does goes through [`api`].
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, paces drill replies    │
//! │  - The ONLY place that knows about stdin/stdout/exit codes  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands and drill sessions             │
//! │  - Owns one session per drill mode                          │
//! │  - Persists review outcomes as they happen                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//! ┌──────────────────────────┐   ┌──────────────────────────────┐
//! │  Commands (commands/)    │   │  Drill (drill/)              │
//! │  - Record management     │   │  - Session state machine     │
//! │  - Import, export, PGN   │   │  - Logical-time task queue   │
//! └──────────────────────────┘   └──────────────────────────────┘
//!              │                               │
//!              ▼                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - KeyValueStore trait: FileStore, InMemoryStore            │
//! │  - OpeningStore: namespaced records with a short read cache │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code takes plain arguments and returns plain types.
//! It never prints, never sleeps and never exits. Time passes for a drill
//! session only when the caller says so through [`api::TrainerApi::advance`].
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Record management, import and export
//! - [`drill`]: Spaced, practice and learn sessions
//! - [`scheduler`]: Interval ladder and difficulty tracking
//! - [`queue`]: Due-queue construction and shuffling
//! - [`facets`]: Color, category and first-move filters
//! - [`rules`]: Chess rules engine seam and its `chess` crate adapter
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Core data types (`OpeningRecord`, `Color`)
//! - [`config`]: Board preferences
//! - [`init`]: Data directory resolution
//! - [`error`]: Error types
//! - `cli`: Argument parsing, rendering and the interactive drill loop (binary only)

pub mod api;
pub mod commands;
pub mod config;
pub mod drill;
pub mod error;
pub mod facets;
pub mod init;
pub mod model;
pub mod queue;
pub mod rules;
pub mod scheduler;
pub mod store;
