//! Storefront command line entry point

use std::{io, process::ExitCode, sync::Arc};

use storefront::{
    cart::store::CartStore,
    catalog::HttpCatalog,
    cli::{CliError, Storefront},
    config::StorefrontConfig,
    observability,
    storage::FileStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match StorefrontConfig::load() {
        Ok(config) => config,
        Err(error) => {
            _ = error.print();

            return ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(2));
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            #[expect(
                clippy::print_stderr,
                reason = "the error must reach the shell even when logging is filtered"
            )]
            {
                eprintln!("Error: {error}");
            }

            ExitCode::FAILURE
        }
    }
}

async fn run(config: StorefrontConfig) -> Result<(), CliError> {
    observability::init(&config.logging)?;

    let store = FileStore::open(&config.data_dir)?;
    let cart = CartStore::new(Arc::new(store));

    cart.initialize().await;

    let catalog = HttpCatalog::new(config.catalog_url);
    let result = Storefront::new(&cart, &catalog)
        .execute(&config.command, io::stdout().lock())
        .await;

    cart.flush().await;

    result
}
