use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use goaffpro_sdk::{Config, FileStorage, Goaffpro, GoaffproOptions, Order, ReferralStore, SystemClock};

#[derive(Parser, Debug)]
#[command(name = "goaffpro")]
#[command(about = "Referral attribution and conversion tracking for GoAffPro stores")]
struct Cli {
    /// Store public token
    #[arg(long, env = "GOAFFPRO_PUBLIC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API base URL
    #[arg(long, env = "GOAFFPRO_BASE_URL")]
    base_url: Option<String>,

    /// Directory holding persisted referral state
    #[arg(long, env = "GOAFFPRO_STORAGE_DIR", default_value = ".goaffpro")]
    storage_dir: PathBuf,

    /// JSON file with an attribution config, used instead of the dashboard settings
    #[arg(long, env = "GOAFFPRO_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Log SDK activity to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch the app, optionally through a deep link, and report the page view
    Open {
        /// Launch URL, e.g. myapp://product/42?ref=jane
        url: Option<String>,
    },
    /// Report a completed order
    Convert {
        /// Order as JSON, or a bare order id
        #[arg(long)]
        order: String,
    },
    /// Show the public profile of an affiliate
    Affiliate {
        /// Referral code (default: the stored one)
        code: Option<String>,
    },
    /// Show the stored referral state. A code older than the cookie duration
    /// (from --config, or the 7 day default) is dropped, as on the next launch.
    Status,
    /// Forget the stored referral state
    Reset,
}

fn load_config(path: &Path) -> Config {
    let contents = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read config file {}: {}", path.display(), e);
        std::process::exit(1);
    });
    Config::from_json(&contents).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    })
}

fn require_token(cli: &Cli) -> String {
    match cli.token.as_deref() {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => {
            eprintln!("A public token is required (--token or GOAFFPRO_PUBLIC_TOKEN)");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "goaffpro_sdk=debug,goaffpro=debug"
    } else {
        "goaffpro_sdk=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let storage = FileStorage::open(&cli.storage_dir).await.unwrap_or_else(|e| {
        eprintln!("Failed to open storage: {}", e);
        std::process::exit(1);
    });
    let storage = Arc::new(storage);

    let goaffpro = Goaffpro::new(GoaffproOptions {
        base_url: cli.base_url.clone(),
        storage: Some(storage.clone()),
        ..Default::default()
    })
    .unwrap_or_else(|e| {
        eprintln!("Failed to create client: {}", e);
        std::process::exit(1);
    });

    let config = cli.config.as_deref().map(load_config);

    match &cli.command {
        Command::Open { url } => {
            let token = require_token(&cli);
            match goaffpro.init(&token, config, url.as_deref()).await {
                Ok(result) => {
                    println!("Referral code: {}", result.ref_code.as_deref().unwrap_or("-"));
                    println!("Visit id:      {}", goaffpro.visit_id().await.as_deref().unwrap_or("-"));
                    println!("Affiliate id:  {}", goaffpro.affiliate_id().await.as_deref().unwrap_or("-"));
                }
                Err(e) => {
                    eprintln!("Init failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Convert { order } => {
            let token = require_token(&cli);
            if let Err(e) = goaffpro.init(&token, config, None).await {
                eprintln!("Init failed: {}", e);
                std::process::exit(1);
            }

            let result = match serde_json::from_str::<Order>(order) {
                Ok(order) => goaffpro.track_conversion(order).await,
                Err(_) => goaffpro.track_conversion(order.as_str()).await,
            };

            match result {
                Ok(response) => println!("{}", response),
                Err(e) => {
                    eprintln!("Conversion not tracked: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Affiliate { code } => {
            let token = require_token(&cli);
            if let Err(e) = goaffpro.init(&token, config, None).await {
                eprintln!("Init failed: {}", e);
                std::process::exit(1);
            }

            match goaffpro.get_affiliate_details(code.as_deref()).await {
                Ok(Some(profile)) => {
                    println!("Name:    {}", profile.name.as_deref().unwrap_or("-"));
                    println!("Company: {}", profile.company_name.as_deref().unwrap_or("-"));
                    println!("Coupon:  {}", profile.coupon.as_deref().unwrap_or("-"));
                    println!("Photo:   {}", profile.profile_photo_url.as_deref().unwrap_or("-"));
                    if let Some(bio) = profile.bio {
                        println!();
                        println!("{}", bio);
                    }
                }
                Ok(None) => println!("No referral code stored"),
                Err(e) => {
                    eprintln!("Lookup failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Status => {
            let cookie_duration_ms = config.unwrap_or_default().cookie_duration_ms;
            let referrals = ReferralStore::new(storage, Arc::new(SystemClock));
            let code = referrals.get(Some(cookie_duration_ms)).await;
            println!("Referral code: {}", code.as_deref().unwrap_or("-"));
            println!("Visit id:      {}", goaffpro.visit_id().await.as_deref().unwrap_or("-"));
            println!("Affiliate id:  {}", goaffpro.affiliate_id().await.as_deref().unwrap_or("-"));
        }
        Command::Reset => {
            goaffpro.clear_referral().await;
            println!("Referral state cleared");
        }
    }
}
