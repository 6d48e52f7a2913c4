use clap::Parser;
use crossterm::style::Stylize;
use metamorph::{analyzer::Analyzer, config::Config, eth::EthClient, signature::Signatures};
use tracing_subscriber::EnvFilter;

// cargo run --release --bin inspect -- 0x000000009B988FbecFd83C55252f78592E609648

/// Check a deployed contract for signs that its code can be replaced in place.
#[derive(Parser)]
#[command(name = "inspect")]
struct Args {
    /// Contract address: `0x` followed by 40 hex digits
    address: String,

    /// JSON-RPC endpoint with `trace_block` support (default: $URL)
    #[arg(long)]
    url: Option<String>,

    /// Additional metamorphic init-code signature in hex (repeatable)
    #[arg(long = "signature")]
    signatures: Vec<String>,

    /// Print the verdict as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = args.url {
        config.url = Some(url);
    }
    for signature in &args.signatures {
        config.signatures.extend(Signatures::parse_list(signature)?);
    }

    let eth = EthClient::new(config.url()?)?;
    let analyzer = Analyzer::new(eth).with_signatures(config.signatures);
    let analysis = analyzer.analyze(&args.address).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("Address: {}", analysis.address);
    println!("Deployment block: {}", analysis.deployment_block);
    if let Some(deployer) = analysis.deployer {
        println!("Deployer: {deployer}");
    }
    for (indicator, value) in analysis.indicators() {
        let flag = if value {
            "TRUE".red().bold()
        } else {
            "FALSE".green().bold()
        };
        println!("{}: {flag}", indicator.label());
    }
    Ok(())
}
