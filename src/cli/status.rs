use crate::error::{ImporterError, Result};
use crate::models::ConversionStatus;
use crate::{settings, status_store};

pub fn run(identifier: Option<&str>) -> Result<()> {
    let status = match identifier {
        // no identifier yet: report a zero-value status rather than an error
        None => ConversionStatus::empty(),
        Some(identifier) => {
            let conn = status_store::open(&settings::db_path())?;
            status_store::start_or_find(&conn, identifier)?
        }
    };
    let json = serde_json::to_string_pretty(&status)
        .map_err(|e| ImporterError::Persistence(e.to_string()))?;
    println!("{json}");
    Ok(())
}
