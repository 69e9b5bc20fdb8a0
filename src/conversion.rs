use std::path::Path;

use rusqlite::Connection;

use crate::config::Configuration;
use crate::models::{ConversionStatus, JobStatus};
use crate::routine::RoutineManager;
use crate::{status_store, storage};

/// Drives one conversion job to completion: start-or-find the status record,
/// mark it running, run the routine, persist the batch, mark it done. Every
/// failure transitions the job to `errored` and is logged; the caller always
/// gets a status payload back, never an error.
///
/// A batch of zero transactions from a non-empty source is treated as a
/// failure: it nearly always means a mapping mistake, not an empty statement.
pub fn run(
    conn: &Connection,
    jobs_dir: &Path,
    routine: &mut RoutineManager,
    configuration: Configuration,
) -> ConversionStatus {
    let identifier = routine.identifier();
    log::debug!("conversion routine identifier is \"{identifier}\"");

    if let Err(e) = status_store::start_or_find(conn, &identifier) {
        log::error!("could not open status record for \"{identifier}\": {e}");
        return ConversionStatus {
            status: JobStatus::Errored,
            job_identifier: identifier,
        };
    }
    set_status(conn, &identifier, JobStatus::Running);

    routine.set_configuration(configuration);

    let transactions = match routine.start() {
        Ok(transactions) => transactions,
        Err(e) => {
            log::error!("conversion failed: {e}");
            return errored(conn, identifier);
        }
    };
    if transactions.is_empty() {
        log::error!("conversion produced zero transactions");
        return errored(conn, identifier);
    }
    if let Err(e) = storage::save(jobs_dir, &identifier, &transactions) {
        log::error!("could not persist transaction batch: {e}");
        return errored(conn, identifier);
    }

    set_status(conn, &identifier, JobStatus::Done);
    ConversionStatus {
        status: JobStatus::Done,
        job_identifier: identifier,
    }
}

fn errored(conn: &Connection, identifier: String) -> ConversionStatus {
    set_status(conn, &identifier, JobStatus::Errored);
    ConversionStatus {
        status: JobStatus::Errored,
        job_identifier: identifier,
    }
}

fn set_status(conn: &Connection, identifier: &str, status: JobStatus) {
    if let Err(e) = status_store::set_status(conn, identifier, status) {
        log::error!("could not record {} status for \"{identifier}\": {e}", status.as_str());
    }
}
