use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Operator CLI for the token relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3100")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay and chain health
    Health,
    /// Token balance of an address
    Balance { address: String },
    /// Hot wallet address
    Receive,
    /// Deposit address for a deposit id
    DepositAddress { deposit_id: u32 },
    /// Find a derived address with no token balance
    ZeroBalanceAddress {
        #[arg(long)]
        deposit_id: Option<u32>,
    },
    /// Send tokens from the hot wallet
    Send {
        to: String,
        /// Amount in base units
        amount: String,
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Sweep a deposit address back to the hot wallet
    Sweep {
        from: String,
        deposit_id: u32,
        /// Amount in base units
        amount: String,
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Status of a transaction
    TxStatus { tx_hash: String },
    /// Recent incoming transfers to an address
    Transfers { address: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Balance { address } => {
            client.get(format!("{}/balance/{}", base, address)).send().await?
        }
        Commands::Receive => client.post(format!("{}/receive", base)).send().await?,
        Commands::DepositAddress { deposit_id } => {
            client
                .get(format!("{}/deposit-address/{}", base, deposit_id))
                .send()
                .await?
        }
        Commands::ZeroBalanceAddress { deposit_id } => {
            client
                .post(format!("{}/zero-balance-address", base))
                .json(&json!({ "deposit_id": deposit_id }))
                .send()
                .await?
        }
        Commands::Send {
            to,
            amount,
            request_id,
        } => {
            client
                .post(format!("{}/send", base))
                .json(&json!({ "to": to, "amount": amount, "request_id": request_id }))
                .send()
                .await?
        }
        Commands::Sweep {
            from,
            deposit_id,
            amount,
            request_id,
        } => {
            client
                .post(format!("{}/sweep", base))
                .json(&json!({
                    "from": from,
                    "deposit_id": deposit_id,
                    "amount": amount,
                    "request_id": request_id,
                }))
                .send()
                .await?
        }
        Commands::TxStatus { tx_hash } => {
            client.get(format!("{}/tx-status/{}", base, tx_hash)).send().await?
        }
        Commands::Transfers { address } => {
            client.get(format!("{}/transfers/{}", base, address)).send().await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    // Error bodies are JSON too; print them the same way, on stderr.
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: relay returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }
    Ok(())
}
