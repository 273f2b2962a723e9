use clap::Parser;
use clap::error::ErrorKind;
use log::error;
use privat_rates::app::USAGE;
use privat_rates::{BASE_URL, Client, ConsoleApp, FetchMode, RateFetcher, RatesError};
use std::ffi::OsString;
use std::io::{self, Write};

#[derive(Debug, Parser)]
#[command(
    name = "privat-rates",
    version,
    about = "Print PrivatBank EUR/USD exchange rates for the last N days"
)]
struct Cli {
    /// Number of days to fetch, counting back from today (1-10)
    #[arg(allow_negative_numbers = true)]
    days: String,

    /// API endpoint the DD.MM.YYYY date is appended to
    #[arg(long, env = "PRIVAT_RATES_BASE_URL", default_value = BASE_URL)]
    base_url: String,

    /// Request one day at a time instead of all at once
    #[arg(long)]
    sequential: bool,
}

impl Cli {
    fn mode(&self) -> FetchMode {
        if self.sequential {
            FetchMode::Sequential
        } else {
            FetchMode::Concurrent
        }
    }
}

/// Parse the command line; help/version text or the usage line go to `out`
/// and yield `None`.
fn parse_cli<I, T, W>(args: I, out: &mut W) -> io::Result<Option<Cli>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            write!(out, "{err}")?;
            Ok(None)
        }
        Err(_) => {
            writeln!(out, "{USAGE}")?;
            Ok(None)
        }
    }
}

fn build_client(base_url: &str) -> Result<Client, RatesError> {
    let client = Client::new()?;
    if base_url == BASE_URL {
        return Ok(client);
    }
    Ok(client.with_base_url(base_url))
}

async fn run<I, T, W>(args: I, out: &mut W) -> io::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
{
    let Some(cli) = parse_cli(args, out)? else {
        return Ok(());
    };

    let client = match build_client(&cli.base_url) {
        Ok(client) => client,
        Err(err) => return writeln!(out, "Error: {err}"),
    };

    let app = ConsoleApp::new(RateFetcher::new(client).with_mode(cli.mode()));
    app.run(&cli.days, out).await?;
    out.flush()
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    // Output failures are logged only; the exit status stays zero.
    if let Err(err) = run(std::env::args_os(), &mut out).await {
        error!("Failed to write output: {}", err);
    }
}
