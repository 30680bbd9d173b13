use crate::config::TrainerConfig;
use crate::facets::Facets;
use crate::model::OpeningRecord;
use crate::store::openings::QuotaStatus;
use chrono::{DateTime, Utc};

pub mod backup;
pub mod config;
pub mod delete;
pub mod edit;
pub mod facets;
pub mod helpers;
pub mod list;
pub mod migrate;
pub mod pgn;
pub mod progress;
pub mod save;
pub mod status;
pub mod view;

#[derive(Debug, Clone)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// A record paired with its store key, as shown in listings.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedOpening {
    pub key: String,
    pub record: OpeningRecord,
    pub due: bool,
}

impl ListedOpening {
    pub fn new(key: impl Into<String>, record: OpeningRecord, now: DateTime<Utc>) -> Self {
        let due = record.is_due(now);
        Self {
            key: key.into(),
            record,
            due,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreStatus {
    pub total: usize,
    pub due: usize,
    pub quota: QuotaStatus,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_openings: Vec<ListedOpening>,
    pub listed_openings: Vec<ListedOpening>,
    pub facets: Option<Facets>,
    pub status: Option<StoreStatus>,
    pub config: Option<TrainerConfig>,
    /// Serialized backup document produced by an export.
    pub backup: Option<String>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_openings(mut self, openings: Vec<ListedOpening>) -> Self {
        self.affected_openings = openings;
        self
    }

    pub fn with_listed_openings(mut self, openings: Vec<ListedOpening>) -> Self {
        self.listed_openings = openings;
        self
    }

    pub fn with_facets(mut self, facets: Facets) -> Self {
        self.facets = Some(facets);
        self
    }

    pub fn with_status(mut self, status: StoreStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_config(mut self, config: TrainerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_backup(mut self, backup: String) -> Self {
        self.backup = Some(backup);
        self
    }
}
