use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::error::Result;
use crate::models::{ConversionStatus, JobStatus};
use crate::{config, conversion, routine, settings, status_store};

/// Converts every `<name>.json` configuration found in a directory, pairing
/// it with a sibling `<name>.csv` when one exists. An empty directory is a
/// normal exit, not an error; individual failures don't abort the sweep.
pub fn run(directory: Option<&str>) -> Result<()> {
    let directory = PathBuf::from(directory.unwrap_or("."));
    let mut configs: Vec<PathBuf> = std::fs::read_dir(&directory)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().map_or(false, |ext| ext == "json")
                && !path
                    .file_name()
                    .map_or(false, |name| name.to_string_lossy().starts_with('.'))
        })
        .collect();
    configs.sort();

    if configs.is_empty() {
        println!("There are no configuration files in {}", directory.display());
        return Ok(());
    }
    println!(
        "Found {} configuration file(s) in {}",
        configs.len(),
        directory.display()
    );

    let conn = status_store::open(&settings::db_path())?;
    let jobs_dir = settings::jobs_dir();

    for config_path in &configs {
        let name = config_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        match convert_one(&conn, &jobs_dir, config_path) {
            Ok(status) => {
                let label = match status.status {
                    JobStatus::Done => "done".green(),
                    _ => "errored".red(),
                };
                println!("{name}: {label} (job {})", status.job_identifier);
            }
            Err(e) => {
                log::error!("auto-import of {} failed: {e}", config_path.display());
                println!("{name}: {} ({e})", "failed".red());
            }
        }
    }
    Ok(())
}

fn convert_one(
    conn: &rusqlite::Connection,
    jobs_dir: &Path,
    config_path: &Path,
) -> Result<ConversionStatus> {
    let mut configuration = config::load(config_path)?;
    if configuration.csv_file.is_none() {
        let sibling = config_path.with_extension("csv");
        if sibling.exists() {
            configuration.csv_file = Some(sibling.to_string_lossy().to_string());
        }
    }
    let mut routine = routine::resolve(&configuration.flow, None)?;
    Ok(conversion::run(conn, jobs_dir, &mut routine, configuration))
}
