use clap::Parser;
use markweave::{MarkweaveError, ParseMode, expand_file, expand_reader};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Expand the <template-instance> elements of a markup document.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Change to DIR before doing anything else
    #[arg(short = 'C', value_name = "DIR")]
    directory: Option<PathBuf>,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Parse sources and templates leniently, as HTML
    #[arg(long, default_value_t = false)]
    html: bool,

    /// Host document; standard input when absent or `-`
    file: Option<PathBuf>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(args: &Args) -> Result<Vec<u8>, MarkweaveError> {
    if let Some(dir) = &args.directory {
        std::env::set_current_dir(dir).map_err(|source| MarkweaveError::Io {
            path: dir.clone(),
            source,
        })?;
    }
    let mode = if args.html { ParseMode::Html } else { ParseMode::Xml };

    match args.file.as_deref() {
        Some(path) if path.as_os_str() != "-" => expand_file(path, mode),
        _ => expand_reader(std::io::stdin().lock(), ".", mode),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let output = match run(&args) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("markweave: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(&output).and_then(|_| stdout.flush()) {
        eprintln!("markweave: writing output: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
