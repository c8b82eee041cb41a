use cadastre_core::application::{ParsingServiceImpl, Throttle};
use cadastre_core::domain::RunSummary;
use cadastre_core::ports::Result;
use cadastre_core::utils::derive_output_path;
use clap::{CommandFactory, Parser};
use csv_adapter::CsvReportWriter;
use log::info;
use nspd_adapter::{NspdConfig, NspdLookupClient, DEFAULT_BASE_URL};
use source_adapter::FileTextSource;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Looks up cadastral numbers listed in a CSV (or a CSV inside a ZIP archive)
/// and writes the registry data to `<name>_PARSED.csv` next to the input
#[derive(Parser, Debug)]
#[command(name = "cadastre-parser")]
#[command(about = "Enriches a list of cadastral numbers with data from the public cadastral map")]
struct Cli {
    /// Path to the input .csv or .zip file
    input: Option<PathBuf>,

    /// Report path, defaults to <input-dir>/<input-name>_PARSED.csv
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Base URL of the cadastral map service
    #[arg(long, env = "NSPD_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Pause after each lookup, in milliseconds
    #[arg(long, env = "PARSER_DELAY_MS", default_value_t = 50)]
    delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, env = "PARSER_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Accept TLS certificates that cannot be verified
    #[arg(long)]
    insecure: bool,

    /// Wait for Enter before exiting
    #[arg(long)]
    pause: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let Some(input) = cli.input.clone() else {
        println!("Drop a CSV or ZIP file onto the program, or pass its path as the first argument.\n");
        let _ = Cli::command().print_help();
        wait_for_enter(cli.pause);
        return;
    };

    let exit_code = match run(&cli, input) {
        Ok(summary) => {
            println!("{}", "-".repeat(30));
            println!("Done: {} cadastral numbers processed", summary.total);
            println!(
                "  found: {}, not found: {}, errors: {}",
                summary.records, summary.placeholders, summary.errors
            );
            println!("Result saved to: {}", summary.output_path.display());
            println!("{}", "-".repeat(30));
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    wait_for_enter(cli.pause);
    std::process::exit(exit_code);
}

fn run(cli: &Cli, input: PathBuf) -> Result<RunSummary> {
    info!("Input path: {}", input.display());
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| derive_output_path(&input));

    // Instantiate concrete adapters for the three ports
    let lookup_client = NspdLookupClient::new(NspdConfig {
        base_url: cli.base_url.clone(),
        timeout: Duration::from_secs(cli.timeout_secs),
        accept_invalid_certs: cli.insecure,
    })?;

    let mut service = ParsingServiceImpl::new(
        Box::new(FileTextSource::new(input)),
        Box::new(lookup_client),
        Box::new(CsvReportWriter::new(output)),
        Throttle::new(Duration::from_millis(cli.delay_ms)),
    );

    service.execute()
}

fn wait_for_enter(enabled: bool) {
    if !enabled {
        return;
    }
    print!("Press Enter to close...");
    let _ = io::stdout().flush();
    let _ = io::stdin().lock().read_line(&mut String::new());
}
