use std::error::Error;
use std::path::PathBuf;

use blockrand_web::build_report;
use clap::Args;

use crate::commands::open_store;
use crate::config::SessionConfig;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Output directory for the generated report
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &ReportArgs, config: &SessionConfig) -> Result<(), Box<dyn Error>> {
    let store = open_store(config)?;
    let manifest = build_report(&store, &config.report, &args.out)?;
    println!(
        "report with {} assignments written to {}",
        manifest.record_count,
        args.out.display()
    );
    Ok(())
}
