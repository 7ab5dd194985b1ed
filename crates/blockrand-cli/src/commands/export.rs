use std::error::Error;
use std::path::PathBuf;

use blockrand_log::{export_csv, CSV_FILE_NAME};
use clap::Args;

use crate::commands::open_store;
use crate::config::SessionConfig;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Destination CSV path
    #[arg(long, default_value = CSV_FILE_NAME)]
    pub out: PathBuf,
}

pub fn run(args: &ExportArgs, config: &SessionConfig) -> Result<(), Box<dyn Error>> {
    let store = open_store(config)?;
    let rows = export_csv(&store, &args.out)?;
    println!("exported {rows} assignments to {}", args.out.display());
    Ok(())
}
