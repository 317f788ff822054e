use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use gift_registry::pix::{self, qr, Amount, PaymentRequest, QrOptions};

#[derive(Parser)]
#[command(name = "registry-cli")]
#[command(about = "Pix codes and admin tasks for the gift registry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with Pix payment codes offline
    Pix {
        #[command(subcommand)]
        command: PixCommand,
    },
    /// Call the admin API of a running service
    Admin {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,

        #[arg(short, long, env = "REGISTRY_ADMIN_KEY")]
        key: String,

        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand)]
enum PixCommand {
    /// Generate a "copia e cola" payload
    Generate {
        #[arg(long)]
        key: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        city: String,
        /// Decimal BRL, e.g. 150.50
        #[arg(long)]
        amount: Option<Amount>,
        #[arg(long)]
        txid: Option<String>,
        /// Also print the QR code to the terminal
        #[arg(long)]
        qr: bool,
    },
    /// Verify and print the fields of a payload
    Decode { payload: String },
    /// Render a payload as a QR code
    Qr {
        payload: String,
        /// Write an SVG here instead of printing to the terminal
        #[arg(long)]
        svg: Option<PathBuf>,
        #[arg(long, default_value_t = 240)]
        size: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DonationState {
    Pending,
    Confirmed,
    Cancelled,
}

impl DonationState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Service and catalog summary
    Status,
    /// Full gift list, including reservers
    Gifts,
    /// Free a gift's reservation
    ClearReservation { id: i64 },
    /// Delete an unreserved gift
    DeleteGift { id: i64 },
    /// List Pix contributions
    Donations,
    /// Set a contribution's status
    SetDonation { id: i64, status: DonationState },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Pix { command } => run_pix(command)?,
        Commands::Admin { url, key, command } => run_admin(&url, &key, command).await?,
    }

    Ok(())
}

fn run_pix(command: PixCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        PixCommand::Generate { key, name, city, amount, txid, qr: show_qr } => {
            let mut request = PaymentRequest::new(key, name, city);
            request.amount = amount;
            request.transaction_id = txid;

            let payload = pix::generate(&request)?;
            println!("{}", payload);
            if show_qr {
                println!("{}", qr::render_terminal(&payload)?);
            }
        }
        PixCommand::Decode { payload } => {
            let decoded = pix::decode(&payload)?;
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
        PixCommand::Qr { payload, svg, size } => {
            pix::decode(&payload)?;
            match svg {
                Some(path) => {
                    let options = QrOptions { size, ..Default::default() };
                    std::fs::write(&path, qr::render_svg(&payload, &options)?)?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", qr::render_terminal(&payload)?),
            }
        }
    }
    Ok(())
}

async fn run_admin(url: &str, key: &str, command: AdminCommand) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let url = url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);

    let request = match command {
        AdminCommand::Status => client.get(format!("{}/admin/status", url)),
        AdminCommand::Gifts => client.get(format!("{}/admin/gifts", url)),
        AdminCommand::ClearReservation { id } => {
            client.post(format!("{}/admin/gifts/{}/clear-reservation", url, id))
        }
        AdminCommand::DeleteGift { id } => client.delete(format!("{}/admin/gifts/{}", url, id)),
        AdminCommand::Donations => client.get(format!("{}/admin/pix-donations", url)),
        AdminCommand::SetDonation { id, status } => client
            .put(format!("{}/admin/pix-donations/{}/status", url, id))
            .json(&json!({ "status": status.as_str() })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
