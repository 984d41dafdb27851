use anyhow::Result;
use clap::Parser;
use reqwest::Method;
use std::time::Duration;
use tsprobe::config::ProbeConfig;
use tsprobe::converter::ConversionRequest;

/// tsprobe - unix timestamp converter probe
///
/// Checks a unix-timestamp/date-string converter service against a table of
/// known answers. Requests answered with 503 are re-sent once per poll
/// interval until the service recovers or the maximum wait runs out.
///
/// Examples:
///   tsprobe check                      # Run every scenario against the public service
///   tsprobe convert --s 1451613802     # Convert a single timestamp
#[derive(Parser, Debug)]
#[command(author, version = env!("TSPROBE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Converter endpoint (defaults to the public helloacm service; also via TSPROBE_BASE_URL)
    #[arg(long = "base-url", env = "TSPROBE_BASE_URL", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Longest time to keep polling a single request, in seconds
    #[arg(long = "max-wait", value_name = "SECONDS", value_parser = parse_seconds, global = true)]
    pub max_wait: Option<Duration>,

    /// Delay between polling attempts, in seconds
    #[arg(long = "poll-interval", value_name = "SECONDS", value_parser = parse_seconds, global = true)]
    pub poll_interval: Option<Duration>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the scenario suite
    Check(CheckArgs),

    /// List the scenarios and their expected answers
    List,

    /// Convert a single value with a GET request
    Convert(ConvertArgs),

    /// Send a request with an arbitrary HTTP method
    Send(SendArgs),
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Only run scenarios whose name starts with PREFIX
    #[arg(long, value_name = "PREFIX")]
    pub only: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Date string or unix timestamp to convert
    #[arg(long = "s", value_name = "VALUE", conflicts_with = "no_s")]
    pub s: Option<String>,

    /// Send `s` without a value
    #[arg(long = "no-s")]
    pub no_s: bool,

    /// Value of the `cached` parameter
    #[arg(long, value_name = "VALUE")]
    pub cached: Option<String>,

    /// Send no query parameters at all
    #[arg(long, conflicts_with_all = ["s", "no_s", "cached"])]
    pub bare: bool,
}

#[derive(clap::Args, Debug)]
pub struct SendArgs {
    /// HTTP method, e.g. POST or DELETE
    #[arg(value_name = "METHOD", value_parser = parse_method)]
    pub method: Method,

    /// Raw request body (defaults to the JSON form of the default request, empty for DELETE)
    #[arg(long, value_name = "BODY")]
    pub body: Option<String>,
}

impl ConvertArgs {
    fn into_request(self) -> Option<ConversionRequest> {
        if self.bare {
            return None;
        }
        let mut request = ConversionRequest {
            cached: self.cached,
            ..ConversionRequest::default()
        };
        if self.no_s {
            request.s = None;
        } else if let Some(s) = self.s {
            request.s = Some(s);
        }
        Some(request)
    }
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("'{}': {}", value, e))
}

fn parse_method(value: &str) -> Result<Method, String> {
    Method::from_bytes(value.to_ascii_uppercase().as_bytes())
        .map_err(|_| format!("'{}' is not a valid HTTP method", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = ProbeConfig::new(cli.base_url, cli.max_wait, cli.poll_interval)?;

    match cli.command {
        Commands::Check(args) => tsprobe::commands::check(&config, args.only.as_deref()).await?,
        Commands::List => tsprobe::commands::list()?,
        Commands::Convert(args) => {
            tsprobe::commands::convert(&config, args.into_request()).await?
        }
        Commands::Send(args) => tsprobe::commands::send(&config, args.method, args.body).await?,
    }
    Ok(())
}
