use std::path::PathBuf;

use crate::error::Result;
use crate::routine::{self, Flow};
use crate::{config, gocardless, saltedge};

pub fn run(config_path: &str) -> Result<()> {
    let path = PathBuf::from(config_path);
    let mut configuration = config::load(&path)?;
    let routine = routine::resolve(&configuration.flow, None)?;

    match routine.flow() {
        Flow::GoCardless => {
            let outcome = gocardless::link(&mut configuration)?;
            config::save(&configuration, &path)?;
            if outcome.created {
                println!(
                    "Created requisition {} (reference {})",
                    outcome.requisition_id, outcome.reference
                );
                if let Some(link) = outcome.link {
                    println!("Complete the consent flow at: {link}");
                }
            } else {
                println!(
                    "Reusing requisition {}; {} linked account(s)",
                    outcome.requisition_id,
                    outcome.accounts.len()
                );
            }
        }
        Flow::SaltEdge => {
            let accounts = saltedge::link(&mut configuration)?;
            config::save(&configuration, &path)?;
            println!("Connection verified; {} linked account(s)", accounts.len());
        }
        Flow::Csv => {
            println!("The csv flow reads local files; nothing to link.");
        }
    }
    Ok(())
}
