use clap::{Parser, ValueEnum};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rewrite::PathStyle;

mod discover;
mod run;
mod sink;

use run::{RunOptions, RunSummary};

#[derive(Parser)]
#[command(name = "msr")]
#[command(about = "Complements the file extension of relative module specifiers")]
#[command(version)]
struct Cli {
    /// Directory to search for source files
    #[arg(short = 'b', long, default_value = ".")]
    base_path: PathBuf,
    /// tsconfig.json to take paths, baseUrl and newLine from [default: ./tsconfig.json]
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
    /// Write the results to module-specifier-resolver.log instead of the files
    #[arg(short = 'd', long)]
    dry_run: bool,
    /// Ask for confirmation before writing
    #[arg(short = 'r', long)]
    repl: bool,
    /// Number of worker threads
    #[arg(short = 'j', long)]
    jobs: Option<usize>,
    /// Extension probing order, e.g. `.ts,.tsx,.js`
    #[arg(long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,
    #[arg(long, value_enum, default_value_t = PathStyleArg::Compatible)]
    path_style: PathStyleArg,
    /// Log resolution details to stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PathStyleArg {
    Compatible,
    Segment,
}

impl From<PathStyleArg> for PathStyle {
    fn from(style: PathStyleArg) -> Self {
        match style {
            PathStyleArg::Compatible => PathStyle::Compatible,
            PathStyleArg::Segment => PathStyle::Segment,
        }
    }
}

impl Cli {
    fn into_options(self) -> RunOptions {
        RunOptions {
            base_path: self.base_path,
            config_path: self.config,
            dry_run: self.dry_run,
            repl: self.repl,
            jobs: self.jobs,
            extensions: self.extensions,
            path_style: self.path_style.into(),
            ..RunOptions::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = cli.into_options();
    match run::run(&options, &mut io::stdin().lock()) {
        Ok(RunSummary { failed: 0, .. }) => {}
        Ok(summary) => {
            eprintln!("Error: {} files failed", summary.failed);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
