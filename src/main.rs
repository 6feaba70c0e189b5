// reset; cargo run -- validate --file ./data/numbers.xlsx
// reset; cargo run -- preview --file ./data/numbers.csv --page 2
// reset; RUST_LOG=info cargo run -- serve

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rpassword::prompt_password;
use tracing_subscriber::{EnvFilter, fmt};
use validator_lib::presenter::PAGE_SIZE;
use validator_lib::reqwest::blocking::Client;
use validator_lib::{
    FileKind, IngestError, NumberLookup, ProviderClient, ProxyClient, RunOutcome, RunState,
    SkipReason, export_to_path, page, proxy::PROVIDER_URL, run,
};
use wa_validator::{
    ERRORS_LOG_FILE,
    config::ServerConfig,
    console::{render_page, render_progress, render_summary},
    server,
};

#[derive(Parser)]
#[command(name = "wa-validator")]
#[command(about = "A tool to check a spreadsheet of phone numbers against a WhatsApp number lookup API")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate every number of a spreadsheet and write the annotated results
    Validate {
        /// Path to the CSV, XLS or XLSX file. Numbers are read from the first column, the first row is a header
        #[arg(short, long)]
        file: PathBuf,

        /// The provider API key. If not specified, the key will be required during runtime.
        #[arg(long)]
        api_key: Option<String>,

        /// Send lookups through a running `serve` proxy (e.g. http://localhost:3000) instead of the provider
        #[arg(long)]
        proxy_url: Option<String>,

        /// Provider lookup endpoint, used when no proxy is given
        #[arg(long, default_value = PROVIDER_URL)]
        provider_url: String,

        /// Directory the results file is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Results page to print once the run is over
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Show a page of the numbers found in a spreadsheet, without validating them
    Preview {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Run the `/api/validate` proxy (configured through PROXY_PORT and PROVIDER_URL)
    Serve,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Args::parse().command {
        Command::Validate {
            file,
            api_key,
            proxy_url,
            provider_url,
            output_dir,
            page,
        } => {
            let api_key = match api_key {
                Some(key) => key,
                None => prompt_password("API key: ")?,
            };
            let client = Client::new();
            let lookup: Box<dyn NumberLookup> = match proxy_url {
                Some(url) => Box::new(ProxyClient::new(client, &url)),
                None => Box::new(ProviderClient::new(client, &provider_url)),
            };
            validate_command(&file, &api_key, lookup.as_ref(), &output_dir, page)
        }
        Command::Preview { file, page } => {
            let mut state = load_or_exit(&file);
            print_page(&mut state, page);
            Ok(())
        }
        Command::Serve => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();

            let config = ServerConfig::load()?;
            // Built outside the runtime: the blocking client owns a runtime of its own
            let upstream: server::SharedLookup =
                Arc::new(ProviderClient::new(Client::new(), &config.provider_url));

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(server::start_server(config, upstream.clone()))?;
            Ok(())
        }
    }
}

fn validate_command(
    file: &Path,
    api_key: &str,
    lookup: &dyn NumberLookup,
    output_dir: &Path,
    page_number: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = load_or_exit(file);

    let outcome = run(&mut state, api_key, lookup, |snapshot| {
        print!("\r{}", render_progress(snapshot));
        let _ = std::io::stdout().flush();
    });
    println!();

    match &outcome {
        RunOutcome::Completed { failed, .. } => {
            println!("✅ Validation completed! {}", render_summary(&state.summary()));
            if *failed > 0 {
                eprintln!("❌ {failed} lookups failed. Check {ERRORS_LOG_FILE} for details.");
            }
        }
        RunOutcome::Halted { at_row, reason } => {
            eprintln!("❌ {reason} at row {} ({}%).", at_row + 1, state.progress());
            eprintln!("❌ Check your API key and run again.");
        }
        RunOutcome::Skipped(SkipReason::MissingApiKey) => {
            eprintln!("❌ An API key is required.");
            std::process::exit(1);
        }
        RunOutcome::Skipped(SkipReason::NoRows) => {
            eprintln!("❌ No phone numbers found in {}.", file.display());
            std::process::exit(1);
        }
        RunOutcome::Skipped(SkipReason::AlreadyRunning) => {
            eprintln!("❌ A validation run is already in progress.");
            std::process::exit(1);
        }
    }

    print_page(&mut state, page_number);

    if state.has_results() {
        let path = export_to_path(state.rows(), output_dir)?;
        println!("✅ Results written to {}", path.display());
    }

    if matches!(outcome, RunOutcome::Halted { .. }) {
        std::process::exit(1);
    }
    Ok(())
}

fn read_upload(file: &Path, state: &mut RunState) -> Result<usize, IngestError> {
    let kind = FileKind::from_path(file)?;
    let bytes = std::fs::read(file)?;
    state.load(&bytes, kind)
}

fn load_or_exit(file: &Path) -> RunState {
    let mut state = RunState::new();
    match read_upload(file, &mut state) {
        Ok(count) => {
            println!("✅ Loaded {count} phone numbers from {}", file.display());
            state
        }
        Err(e @ IngestError::TooManyRows(_)) => {
            eprintln!("❌ {e}");
            eprintln!("❌ Please split the file and upload the parts separately.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    }
}

fn print_page(state: &mut RunState, page_number: usize) {
    state.set_current_page(page_number);
    print!("{}", render_page(&page(state.rows(), PAGE_SIZE, state.current_page())));
}
