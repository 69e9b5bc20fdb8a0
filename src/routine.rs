use rand::{distributions::Alphanumeric, Rng};

use crate::config::Configuration;
use crate::error::{ImporterError, Result};
use crate::models::Transaction;
use crate::{csv_source, gocardless, saltedge};

// ---------------------------------------------------------------------------
// Supported flows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Csv,
    GoCardless,
    SaltEdge,
}

pub const ALL_FLOWS: &[Flow] = &[Flow::Csv, Flow::GoCardless, Flow::SaltEdge];

impl Flow {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::GoCardless => "gocardless",
            Self::SaltEdge => "saltedge",
        }
    }

    pub fn from_key(key: &str) -> Option<Flow> {
        ALL_FLOWS.iter().find(|f| f.key() == key).copied()
    }
}

/// Validates the configured flow against the supported set and binds a
/// routine manager to it. Pure construction; the first I/O happens in
/// `start`.
pub fn resolve(flow: &str, identifier: Option<String>) -> Result<RoutineManager> {
    match Flow::from_key(flow) {
        Some(flow) => Ok(RoutineManager::new(flow, identifier)),
        None => Err(ImporterError::UnsupportedFlow(flow.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Routine manager
// ---------------------------------------------------------------------------

/// Source-agnostic conversion driver: one instance per job, bound to a flow
/// and a (possibly still unminted) job identifier.
#[derive(Debug)]
pub struct RoutineManager {
    flow: Flow,
    identifier: Option<String>,
    configuration: Option<Configuration>,
}

impl RoutineManager {
    pub fn new(flow: Flow, identifier: Option<String>) -> Self {
        Self {
            flow,
            identifier: identifier.filter(|id| !id.is_empty()),
            configuration: None,
        }
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    /// Returns the job identifier, minting a fresh random token on first call
    /// when none was supplied. Later calls return the same value; this is the
    /// stable polling key for the run.
    pub fn identifier(&mut self) -> String {
        match &self.identifier {
            Some(id) => id.clone(),
            None => {
                let minted = mint_identifier();
                log::debug!("minted conversion job identifier \"{minted}\"");
                self.identifier = Some(minted.clone());
                minted
            }
        }
    }

    pub fn set_configuration(&mut self, configuration: Configuration) {
        self.configuration = Some(configuration);
    }

    /// The configuration after a run, including account/requisition data the
    /// adapters discovered mid-flow, for the caller to persist.
    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    /// Runs the adapter pipeline for this flow to completion within the call.
    /// Calling `start` before `set_configuration` is a programmer error and
    /// panics.
    pub fn start(&mut self) -> Result<Vec<Transaction>> {
        let config = self
            .configuration
            .as_mut()
            .expect("set_configuration must be called before start");
        match self.flow {
            Flow::Csv => csv_source::convert(config),
            Flow::GoCardless => gocardless::convert(config),
            Flow::SaltEdge => saltedge::convert(config),
        }
    }
}

fn mint_identifier() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}
