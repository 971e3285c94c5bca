use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::json;

#[derive(Parser)]
#[command(name = "safety-im-cli")]
#[command(about = "Safety Incident Manager CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "SAFETY_IM_ENDPOINT", default_value = "http://localhost:5000")]
    endpoint: String,

    /// Caller id forwarded as X-User-Id
    #[arg(short = 'u', long, env = "SAFETY_IM_USER_ID")]
    user_id: Option<String>,

    /// Caller role forwarded as X-User-Role (operator, supervisor, admin)
    #[arg(short = 'r', long, env = "SAFETY_IM_ROLE", default_value = "operator")]
    role: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,

    /// List incidents
    List {
        #[arg(short, long)]
        page: Option<u64>,

        #[arg(short, long)]
        limit: Option<u64>,

        #[arg(short = 'T', long = "type")]
        incident_type: Option<String>,

        #[arg(short = 'S', long)]
        severity: Option<String>,

        #[arg(short = 's', long)]
        sector: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,
    },

    /// Get incident details
    Get {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,
    },

    /// Overall statistics
    Stats {
        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(short, long)]
        sector: Option<String>,
    },

    /// Per-sector breakdown
    BySector {
        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,
    },

    /// Time series (hour, day, week, month)
    ByTime {
        #[arg(short, long, default_value = "day")]
        interval: String,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(short, long)]
        sector: Option<String>,
    },

    /// Change an incident's status
    SetStatus {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,

        #[arg(value_name = "STATUS")]
        status: String,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Remove an incident (admin only)
    Delete {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,
    },
}

impl Cli {
    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.endpoint.trim_end_matches('/'), path)
    }

    fn identify(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.user_id {
            Some(user_id) => request
                .header("X-User-Id", user_id)
                .header("X-User-Role", &self.role),
            None => request,
        }
    }
}

/// Query pairs with absent values dropped
fn params(pairs: &[(&str, Option<String>)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| (k.to_string(), v.clone())))
        .collect()
}

async fn print_response(response: Response) -> anyhow::Result<()> {
    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .context("Server returned a non-JSON body")?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        bail!("request failed with status {}", status);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();

    match &cli.command {
        Commands::Health => {
            let response = client.get(cli.url("/health")).send().await?;
            print_response(response).await?;
        }

        Commands::List {
            page,
            limit,
            incident_type,
            severity,
            sector,
            status,
            from,
            to,
        } => {
            let query = params(&[
                ("page", page.map(|p| p.to_string())),
                ("limit", limit.map(|l| l.to_string())),
                ("type", incident_type.clone()),
                ("severity", severity.clone()),
                ("sector", sector.clone()),
                ("status", status.clone()),
                ("from", from.clone()),
                ("to", to.clone()),
            ]);

            let response = cli
                .identify(client.get(cli.url("/incidents")).query(&query))
                .send()
                .await?;
            print_response(response).await?;
        }

        Commands::Get { id } => {
            let response = cli
                .identify(client.get(cli.url(&format!("/incidents/{}", id))))
                .send()
                .await?;
            print_response(response).await?;
        }

        Commands::Stats { from, to, sector } => {
            let query = params(&[
                ("from", from.clone()),
                ("to", to.clone()),
                ("sector", sector.clone()),
            ]);

            let response = cli
                .identify(client.get(cli.url("/stats")).query(&query))
                .send()
                .await?;
            print_response(response).await?;
        }

        Commands::BySector { from, to } => {
            let query = params(&[("from", from.clone()), ("to", to.clone())]);

            let response = cli
                .identify(client.get(cli.url("/stats/by-sector")).query(&query))
                .send()
                .await?;
            print_response(response).await?;
        }

        Commands::ByTime {
            interval,
            from,
            to,
            sector,
        } => {
            let query = params(&[
                ("interval", Some(interval.clone())),
                ("from", from.clone()),
                ("to", to.clone()),
                ("sector", sector.clone()),
            ]);

            let response = cli
                .identify(client.get(cli.url("/stats/by-time")).query(&query))
                .send()
                .await?;
            print_response(response).await?;
        }

        Commands::SetStatus { id, status, notes } => {
            let response = cli
                .identify(client.put(cli.url(&format!("/incidents/{}", id))))
                .json(&json!({
                    "status": status,
                    "resolution_notes": notes,
                }))
                .send()
                .await?;
            print_response(response).await?;
        }

        Commands::Delete { id } => {
            let response = cli
                .identify(client.delete(cli.url(&format!("/incidents/{}", id))))
                .send()
                .await?;
            print_response(response).await?;
        }
    }

    Ok(())
}
