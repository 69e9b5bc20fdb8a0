use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::models::JobStatus;
use crate::{settings, status_store};

pub fn run() -> Result<()> {
    let conn = status_store::open(&settings::db_path())?;
    let jobs = status_store::list(&conn)?;

    if jobs.is_empty() {
        println!("No conversion jobs yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Identifier", "Status", "Updated"]);
    for (identifier, status, updated_at) in jobs {
        let label = match status {
            JobStatus::Done => status.as_str().green().to_string(),
            JobStatus::Errored => status.as_str().red().to_string(),
            JobStatus::Running => status.as_str().yellow().to_string(),
            JobStatus::NotStarted => status.as_str().to_string(),
        };
        table.add_row(vec![Cell::new(identifier), Cell::new(label), Cell::new(updated_at)]);
    }
    println!("Conversion jobs\n{table}");
    Ok(())
}
