use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use postgen_lib::{ErrorHandlerPolicy, MatchMode, PostgenConfig, PostgenError, Strategy, generate};
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for every reported failure.
const FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "postgen",
    version,
    about = "Split an ogen Handler interface into per-group service interfaces"
)]
struct Cli {
    /// Folder holding the ogen output
    #[arg(long = "ogen", short = 'f', default_value = "api")]
    ogen_folder: String,

    /// Separation strategy: each, tag or paths
    #[arg(long, short = 's', default_value = "paths")]
    separate: String,

    /// Package name of the generated file
    #[arg(long, short = 'p', default_value = "api")]
    package: String,

    /// Output file (defaults to <ogen>/oas_postgen_services_gen.go)
    #[arg(long = "out", short = 'o')]
    out_file: Option<PathBuf>,

    /// OpenAPI document the ogen output was generated from
    #[arg(long = "openapi", short = 'a', default_value = "")]
    openapi_file: String,

    /// How operation ids are found in doc comments: word or contains
    #[arg(long = "match", default_value = "word")]
    match_mode: String,

    /// Where NewError goes: separate, splice or omit
    #[arg(long, default_value = "separate")]
    error_handler: String,

    /// Interface to split
    #[arg(long, default_value = "Handler")]
    interface: String,

    /// Print the generated source instead of writing it
    #[arg(long)]
    dry_run: bool,

    /// Print the generation info as JSON (-vv for trace logs)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> Result<PostgenConfig, PostgenError> {
        let mut config = PostgenConfig::new()
            .ogen_folder(&self.ogen_folder)
            .strategy(self.separate.parse::<Strategy>()?)
            .match_mode(self.match_mode.parse::<MatchMode>()?)
            .error_policy(self.error_handler.parse::<ErrorHandlerPolicy>()?)
            .interface_name(&self.interface)
            .package(&self.package)
            .openapi_file(&self.openapi_file);

        if let Some(out_file) = &self.out_file {
            config = config.out_file(out_file);
        }

        Ok(config)
    }
}

/// Initialize tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "info".to_string(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose >= 2)
                .with_level(true)
                .with_thread_ids(false)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn run(cli: &Cli) -> Result<(), PostgenError> {
    let config = cli.config()?;
    let generated = generate(&config)?;

    if cli.verbose > 0 {
        println!("{}", generated.to_json()?);
    }

    if cli.dry_run {
        print!("{}", generated.source);
        return Ok(());
    }

    generated.write()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(stage = err.stage(), "{err}");
            ExitCode::from(FAILURE)
        }
    }
}
