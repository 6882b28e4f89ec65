//! Floricultura CLI - storefront and admin console in the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password read from stdin when omitted)
//! flora login -e ana@flora.test
//!
//! # Browse and fill the cart
//! flora products --search rosa
//! flora cart add 64f0c2
//! flora cart set 64f0c2 3
//! flora cart clear --yes
//!
//! # Check the payment intent against the cart total
//! flora checkout
//!
//! # Admin console
//! flora admin metrics
//! flora admin create-product -n Tulipa -p 12.50 -d "Holandesa" -u https://img/t.png
//! ```
//!
//! # Environment Variables
//!
//! - `FLORICULTURA_API_URL` - Backend base URL (default `http://localhost:8000`)
//! - `FLORICULTURA_TIMEOUT_SECS` - Request timeout (default 30)
//! - `FLORICULTURA_CATALOG_TTL_SECS` - Product list cache TTL (default 300)
//! - `FLORICULTURA_SESSION_FILE` - Where the login token is kept
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - Error tracking
//! - `RUST_LOG` - Log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use floricultura_storefront::StoreConfig;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "flora")]
#[command(author, version, about = "Floricultura store client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and keep the session token
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the session token
    Logout,
    /// Show the role claimed by the session token
    Whoami,
    /// List the catalog
    Products {
        /// Filter by name or description
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Request a payment intent and check it against the cart total
    Checkout,
    /// Admin console
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add { product_id: String },
    /// Remove a product line
    Remove { product_id: String },
    /// Set a line's quantity (0 or less removes it)
    Set {
        product_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List registered products
    Products,
    /// Register a product
    CreateProduct {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        price: Decimal,

        #[arg(short, long)]
        description: String,

        /// Photo URL
        #[arg(short = 'u', long)]
        photo_url: String,
    },
    /// List registered users
    Users,
    /// List every cart
    Carts,
    /// Active users, total and best-selling items
    Metrics,
    /// Empty a user's cart
    ClearCart {
        user_id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StoreConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Errors and warnings go to Sentry as events, info and debug as breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Configuration error: {e}");
            }
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "floricultura_storefront=info,floricultura_admin=info,floricultura_cli=info".into()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StoreConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = commands::Context::open(&config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&ctx, &email, password).await?;
        }
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Whoami => commands::auth::whoami(&ctx).await,
        Commands::Products { search } => {
            commands::products::list(&ctx, search.as_deref()).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add { product_id } => commands::cart::add(&ctx, &product_id).await?,
            CartAction::Remove { product_id } => {
                commands::cart::remove(&ctx, &product_id).await?;
            }
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&ctx, &product_id, quantity).await?,
            CartAction::Clear { yes } => commands::cart::clear(&ctx, yes).await?,
        },
        Commands::Checkout => commands::checkout::prepare(&ctx).await?,
        Commands::Admin { action } => match action {
            AdminAction::Products => commands::admin::products(&ctx).await?,
            AdminAction::CreateProduct {
                name,
                price,
                description,
                photo_url,
            } => {
                commands::admin::create_product(&ctx, &name, price, &description, &photo_url)
                    .await?;
            }
            AdminAction::Users => commands::admin::users(&ctx).await?,
            AdminAction::Carts => commands::admin::carts(&ctx).await?,
            AdminAction::Metrics => commands::admin::metrics(&ctx).await?,
            AdminAction::ClearCart { user_id, yes } => {
                commands::admin::clear_cart(&ctx, &user_id, yes).await?;
            }
        },
    }
    Ok(())
}
