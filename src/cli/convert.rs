use std::path::PathBuf;

use colored::Colorize;

use crate::error::{ImporterError, Result};
use crate::models::JobStatus;
use crate::{config, conversion, routine, settings, status_store};

pub fn run(config_path: &str, file: Option<&str>, identifier: Option<String>) -> Result<()> {
    let path = PathBuf::from(config_path);
    let mut configuration = config::load(&path)?;
    if let Some(file) = file {
        configuration.csv_file = Some(file.to_string());
    }
    let accounts_before = configuration.accounts.clone();

    // Unsupported flows must fail before any status or adapter I/O.
    let mut routine = routine::resolve(&configuration.flow, identifier)?;

    let conn = status_store::open(&settings::db_path())?;
    let status = conversion::run(&conn, &settings::jobs_dir(), &mut routine, configuration);

    // Persist account data the adapters discovered mid-flow.
    if let Some(updated) = routine.configuration() {
        if updated.accounts != accounts_before {
            config::save(updated, &path)?;
        }
    }

    match status.status {
        JobStatus::Done => println!(
            "Job {} finished: {}",
            status.job_identifier,
            "done".green()
        ),
        JobStatus::Errored => println!(
            "Job {} finished: {}",
            status.job_identifier,
            "errored".red()
        ),
        _ => {}
    }
    let json = serde_json::to_string_pretty(&status)
        .map_err(|e| ImporterError::Persistence(e.to_string()))?;
    println!("{json}");
    Ok(())
}
