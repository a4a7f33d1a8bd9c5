use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use validades::components::ProductRecord;
use validades::startup;

#[derive(Parser)]
#[command(name = "validades", version, about = "Product expiry register with calendar reminders")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a product batch and schedule its expiry reminder
    Submit {
        /// EAN-13 barcode of the product
        #[arg(long)]
        ean: u64,
        /// Product brand
        #[arg(long)]
        brand: String,
        /// Expiry date, YYYY-MM-DD or DD-MM-YYYY
        #[arg(long, value_parser = parse_date)]
        expiry: NaiveDate,
        /// Units about to expire
        #[arg(long, default_value_t = 0)]
        quantity: u32,
    },
    /// List registered products
    List,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d-%m-%Y"))
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    startup::init_logging()?;

    info!("Starting validades");

    // Load configuration
    let config = startup::load_config()?;

    let message = match cli.command {
        Command::Submit {
            ean,
            brand,
            expiry,
            quantity,
        } => {
            let record = ProductRecord {
                ean_13: ean,
                brand,
                expiry_date: expiry,
                quantity,
            };
            startup::submit_record(&config, record).await?
        }
        Command::List => startup::list_records(&config).await?,
    };

    println!("{}", message);
    Ok(())
}
