mod config;
mod console;
mod driver;
mod dynamodb;
mod logging;
mod utils;

#[cfg(test)]
mod tests;

use anyhow::{bail, Result};
use tracing::info;

use config::{Backend, DemoConfig};
use driver::Driver;
use dynamodb::{DynamoDb, KeyValueStore, MemoryStore};

/// Status polls a memory table answers with `CREATING`, so offline runs exercise the wait.
const MEMORY_ACTIVATION_POLLS: u32 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = DemoConfig::from_env()?;
    logging::init_logging(config.log_level)?;

    let store: Box<dyn KeyValueStore> = match config.backend {
        Backend::DynamoDb => {
            let sdk_config = aws_config::load_from_env().await;
            info!("Using DynamoDB in region {:?}", sdk_config.region());
            Box::new(DynamoDb::new(&sdk_config))
        }
        Backend::Memory => {
            info!("Using the in-memory store");
            Box::new(MemoryStore::new().with_activation_polls(MEMORY_ACTIVATION_POLLS))
        }
    };

    let report = Driver::new(store.as_ref(), &config).run().await;
    console::print_report(&report);

    if config.pause_on_exit {
        console::wait_for_enter()?;
    }

    if config.strict && !report.is_success() {
        bail!("{} step(s) failed", report.failures().count());
    }
    Ok(())
}
