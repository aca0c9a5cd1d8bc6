use clap::Parser;

use fitsim::args::Args;
use fitsim::runner::Runner;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let runner = Runner::new(args)?;
    runner.start()
}
