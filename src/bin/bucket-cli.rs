use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::redirect::Policy;
use serde_json::Value;

use edge_bucket_router::config::{load_config, load_from_env};
use edge_bucket_router::decision::{build_service, DecisionGateway};
use edge_bucket_router::pages::try_static_paths;

#[derive(Parser)]
#[command(name = "bucket-cli")]
#[command(about = "Management CLI for the edge bucket router", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bucket paths that get a pre-rendered page
    Paths {
        /// TOML configuration file. Defaults plus environment when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check a running instance
    Status {
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,
    },
    /// Send one request to `/` and show how it was routed
    Simulate {
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,
        /// Identity cookie value to send
        #[arg(long, value_name = "UID")]
        cookie: Option<String>,
        #[arg(long, default_value = "uid")]
        cookie_name: String,
        /// Country header value to send
        #[arg(long)]
        country: Option<String>,
        #[arg(long, default_value = "x-vercel-ip-country")]
        country_header: String,
        /// Real-IP header value to send
        #[arg(long)]
        ip: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Paths { config } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => load_from_env()?,
            };
            let service = build_service(&config)?;
            let gateway = Arc::new(DecisionGateway::new(service, &config.decision));
            for bucket in try_static_paths(&gateway, &config.experiment).await? {
                println!("/{}", bucket);
            }
        }
        Commands::Status { url } => {
            let res = reqwest::Client::new()
                .get(format!("{}/healthz", url.trim_end_matches('/')))
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::Simulate {
            url,
            cookie,
            cookie_name,
            country,
            country_header,
            ip,
        } => {
            let mut headers = HeaderMap::new();
            if let Some(uid) = cookie {
                headers.insert(COOKIE, HeaderValue::from_str(&format!("{}={}", cookie_name, uid))?);
            }
            if let Some(country) = country {
                headers.insert(
                    reqwest::header::HeaderName::from_bytes(country_header.as_bytes())?,
                    HeaderValue::from_str(&country)?,
                );
            }
            if let Some(ip) = ip {
                headers.insert("x-real-ip", HeaderValue::from_str(&ip)?);
            }

            let client = reqwest::Client::builder().redirect(Policy::none()).build()?;
            let res = client
                .get(format!("{}/", url.trim_end_matches('/')))
                .headers(headers)
                .send()
                .await?;

            println!("status:     {}", res.status());
            match res.headers().get(reqwest::header::LOCATION) {
                Some(location) => println!("action:     redirect -> {}", location.to_str().unwrap_or("<binary>")),
                None => println!("action:     rewrite"),
            }
            for cookie in res.headers().get_all(reqwest::header::SET_COOKIE) {
                println!("set-cookie: {}", cookie.to_str().unwrap_or("<binary>"));
            }
        }
    }

    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
