use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LOCATION};
use reqwest::redirect::Policy;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "driver-cli")]
#[command(about = "Management CLI for a running driver hub", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:4444")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show hub build and readiness
    Status,
    /// List open sessions
    Sessions,
    /// Open a session and print its capabilities
    NewSession {
        /// Desired capabilities as a JSON object
        #[arg(short, long, default_value = "{}")]
        capabilities: String,
    },
    /// Close a session
    DeleteSession { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = cli.url.trim_end_matches('/').to_string();

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(Policy::none())
        .build()?;

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/status", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Sessions => {
            let res = client.get(format!("{}/sessions", base)).send().await?;
            print_response(res).await?;
        }
        Commands::NewSession { capabilities } => {
            let desired: Value = serde_json::from_str(&capabilities)?;
            let res = client
                .post(format!("{}/session", base))
                .json(&json!({ "desiredCapabilities": desired }))
                .send()
                .await?;

            let location = res
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            match location {
                Some(location) if res.status().is_redirection() => {
                    let res = client.get(resolve(&base, &location)).send().await?;
                    print_response(res).await?;
                }
                _ => print_response(res).await?,
            }
        }
        Commands::DeleteSession { id } => {
            let res = client
                .delete(format!("{}/session/{}", base, id))
                .send()
                .await?;
            if res.status().is_success() {
                println!("Deleted session {}", id);
            } else {
                print_response(res).await?;
            }
        }
    }

    Ok(())
}

/// Redirect targets are absolute paths on the hub.
fn resolve(base: &str, location: &str) -> String {
    if location.starts_with("http://") || location.starts_with("https://") {
        return location.to_string();
    }
    match reqwest::Url::parse(base) {
        Ok(url) => format!("{}{}", url.origin().ascii_serialization(), location),
        Err(_) => format!("{}{}", base, location),
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: hub returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if !text.is_empty() => println!("{}", text),
        Err(_) => {}
    }
    Ok(())
}
