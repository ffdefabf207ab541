//! Sheets Console - Main entry point
//!
//! Connects to a workbook with the configured bearer token, lists its sheets
//! and runs an interactive menu of range operations on the chosen sheet.
//!
//! Usage:
//! ```bash
//! export SHEETS_TOKEN=your_token_here
//! export SHEETS_WORKBOOK_ID=your_workbook_id
//! cargo run --bin sheets_console
//! ```

use sheets_client::config::{ClientConfig, ENV_TOKEN, ENV_URI, ENV_WORKBOOK_ID};
use sheets_client::console::Console;
use sheets_client::sheets::{HttpTransport, TabularStoreClient};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    println!("Sheets Console v{}", env!("CARGO_PKG_VERSION"));
    println!("---------------------------------");

    let args: Vec<String> = std::env::args().collect();
    let config = match ClientConfig::from_args_and_env(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ {}", e);
            eprintln!("\nNote: To run the console, set environment variables:");
            eprintln!("  export {}=https://sheets.googleapis.com/v4/  # optional", ENV_URI);
            eprintln!("  export {}=your_token_here", ENV_TOKEN);
            eprintln!("  export {}=your_workbook_id", ENV_WORKBOOK_ID);
            std::process::exit(1);
        }
    };

    println!("Endpoint: {}", config.endpoint);
    println!("Workbook: {}", config.workbook_id);
    println!("Token: {}", config.token_preview());

    if let Err(e) = run(&config).await {
        eprintln!("\n✗ Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: &ClientConfig) -> anyhow::Result<()> {
    let transport = Arc::new(HttpTransport::connect(config)?);
    let client = TabularStoreClient::new(transport, config.workbook_id.clone())?;

    let mut console = Console::new(&client, std::io::stdin().lock(), std::io::stdout().lock());
    console.run().await?;
    Ok(())
}
