use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;

use contact_book::api::client::ContactClient;
use contact_book::app::AppSettings;
use contact_book::ui::shell::Shell;

#[derive(Debug, Parser)]
#[command(name = "contact-book", version, about = "Browse and edit contacts on a REST contacts API")]
struct Cli {
    /// Contacts resource URL; overrides the settings file and environment.
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Quiet period before a search is sent, in milliseconds.
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Write the effective settings back to the settings file.
    #[arg(long)]
    save_settings: bool,

    /// Log debug output from this crate to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    contact_book::logging::init(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("contact-book: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = AppSettings::load()?;
    if let Some(url) = cli.api_url {
        settings.api_url = url;
    }
    if let Some(ms) = cli.debounce_ms {
        settings.search_debounce_ms = ms;
    }
    if cli.save_settings {
        let path = settings.save()?;
        log::info!("settings saved to {}", path.display());
    }

    let client = ContactClient::new(settings.client_config()?)?;
    log::debug!("using contacts API at {}", client.base_url());

    let mut shell = Shell::new(
        Arc::new(client),
        settings.debounce(),
        BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
    );
    shell.run().await?;
    Ok(())
}
