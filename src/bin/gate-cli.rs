use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use script_gate::config::schema::{
    DEFAULT_API_KEY_HEADER, DEFAULT_SIGNATURE_HEADER, DEFAULT_TIMESTAMP_HEADER,
};
use script_gate::security::{signature, Clock, SystemClock};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Client for script-gate: sign and fetch", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the timestamp and signature headers for a request
    Sign {
        /// HMAC signing secret
        #[arg(short, long, env = "SIGNING_SECRET")]
        secret: String,

        /// Epoch milliseconds to sign (defaults to now)
        #[arg(short, long)]
        timestamp: Option<i64>,
    },
    /// Fetch the script through a running gate
    Fetch {
        #[arg(short, long, default_value = "http://localhost:3000/obtener-script")]
        url: String,

        /// Shared API key
        #[arg(short, long, env = "PROXY_API_KEY")]
        key: String,

        /// HMAC signing secret; signs the request when given
        #[arg(short, long, env = "SIGNING_SECRET")]
        secret: Option<String>,

        /// User-Agent to present
        #[arg(long)]
        user_agent: Option<String>,

        #[arg(long, default_value = DEFAULT_API_KEY_HEADER)]
        key_header: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sign { secret, timestamp } => {
            let (ts, sig) = signed_pair(&secret, timestamp)?;
            println!("{}: {}", DEFAULT_TIMESTAMP_HEADER, ts);
            println!("{}: {}", DEFAULT_SIGNATURE_HEADER, sig);
        }
        Commands::Fetch {
            url,
            key,
            secret,
            user_agent,
            key_header,
        } => {
            let mut headers = HeaderMap::new();
            headers.insert(
                HeaderName::from_bytes(key_header.as_bytes())?,
                HeaderValue::from_str(&key)?,
            );
            if let Some(agent) = user_agent {
                headers.insert(USER_AGENT, HeaderValue::from_str(&agent)?);
            }
            if let Some(secret) = secret {
                let (ts, sig) = signed_pair(&secret, None)?;
                headers.insert(DEFAULT_TIMESTAMP_HEADER, HeaderValue::from_str(&ts)?);
                headers.insert(DEFAULT_SIGNATURE_HEADER, HeaderValue::from_str(&sig)?);
            }

            let res = reqwest::Client::new().get(&url).headers(headers).send().await?;
            let status = res.status();
            let body = res.text().await?;
            if status.is_success() {
                print!("{}", body);
            } else {
                eprintln!("Error: gate returned status {}", status);
                if !body.is_empty() {
                    eprintln!("Response: {}", body);
                }
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn signed_pair(
    secret: &str,
    timestamp: Option<i64>,
) -> Result<(String, String), Box<dyn std::error::Error>> {
    let ts = timestamp.unwrap_or_else(|| SystemClock.now_millis()).to_string();
    let sig = signature::sign(secret, &ts).map_err(|e| format!("cannot sign: {:?}", e))?;
    Ok((ts, sig))
}
