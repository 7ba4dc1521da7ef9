//! Storefront Config

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{catalog::http::DEFAULT_CATALOG_URL, products::ProductId};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level or filter directives (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Storefront command line configuration
#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront cart and catalog", long_about = None)]
pub struct StorefrontConfig {
    /// Directory holding the persisted cart
    #[arg(long, env = "STOREFRONT_DATA_DIR", default_value = ".storefront")]
    pub data_dir: PathBuf,

    /// Product catalog base URL
    #[arg(long, env = "CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

impl StorefrontConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Storefront commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List catalog products
    Products {
        /// Case-insensitive search over title and description
        #[arg(long)]
        search: Option<String>,

        /// Only show this category ("All" shows everything)
        #[arg(long)]
        category: Option<String>,
    },

    /// Show a single product
    Product {
        /// Product id
        id: u64,
    },

    /// List catalog categories
    Categories,

    /// Show the cart
    Cart,

    /// Add one unit of a product to the cart
    Add {
        /// Product id
        id: u64,
    },

    /// Set the quantity of a cart line; zero or less removes it
    Set {
        /// Product id
        id: u64,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Remove a product from the cart
    Remove {
        /// Product id
        id: u64,
    },

    /// Empty the cart
    Clear,

    /// Print an order summary and empty the cart
    Checkout {
        /// Keep the cart after checking out
        #[arg(long)]
        keep: bool,
    },
}

impl Command {
    /// Product id the command targets, if any.
    #[must_use]
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            Self::Product { id }
            | Self::Add { id }
            | Self::Set { id, .. }
            | Self::Remove { id } => Some(ProductId::new(*id)),
            Self::Products { .. }
            | Self::Categories
            | Self::Cart
            | Self::Clear
            | Self::Checkout { .. } => None,
        }
    }
}
