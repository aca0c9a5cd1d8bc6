use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Path to settings (yaml file). Defaults are used if omitted.
    #[clap(long)]
    pub settings: Option<String>,

    /// Seed of the first trial, overrides the settings.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Number of trials, overrides the settings.
    #[clap(long, short)]
    pub trials: Option<usize>,

    /// Path to log file.
    #[clap(long, default_value = "fitsim.log")]
    pub log_file: String,

    /// Increase logging verbosity.
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable the progress bar.
    #[clap(long)]
    pub disable_progress_bar: bool,

    /// Number of threads used for parallel trials.
    #[clap(long)]
    pub threads: Option<usize>,

    /// Print the effective settings as yaml and exit.
    #[clap(long)]
    pub dump_settings: bool,
}
