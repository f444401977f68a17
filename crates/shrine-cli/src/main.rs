mod account;
mod cart;
mod catalog;
mod display;

use clap::{Parser, Subcommand};
use shrine_client::{ApiClient, CartContext, ClientError};
use shrine_core::{FileStore, LocalState};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shrine")]
#[command(about = "Storefront client for the shrine spiritual-goods shop")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in and move the guest cart into your account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SHRINE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SHRINE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out; the cart falls back to the local guest cart
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Show cart and wishlist badge counts
    Counts,
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    Wishlist {
        #[command(subcommand)]
        command: WishlistCommands,
    },
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },
}

#[derive(Debug, Subcommand)]
enum CartCommands {
    /// List cart lines
    Show,
    /// Add a product to the cart
    Add {
        product_id: String,
        #[arg(long, short, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
}

#[derive(Debug, Subcommand)]
enum WishlistCommands {
    Show,
    Add { product_id: String },
}

#[derive(Debug, Subcommand)]
enum ProductCommands {
    /// List catalog products with their best coupon
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one product and its best coupon
    Show { product_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = shrine_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let state = LocalState::new(FileStore::new(config.state_dir.clone()));
    let api = ApiClient::from_config(&config, state.clone())?;
    let ctx = CartContext::new(api);
    tracing::debug!(env = %config.env, api_url = %config.api_url, "storefront client ready");

    run(&ctx, cli.command)
        .await
        .map_err(|err| recover_session(err, &state))
}

/// Clears a session the server rejected and turns the error into a sign-in
/// hint. Every other error, including rejected credentials, passes through
/// and leaves the stored session alone.
fn recover_session(err: anyhow::Error, state: &LocalState) -> anyhow::Error {
    let session_invalid = err
        .downcast_ref::<ClientError>()
        .is_some_and(ClientError::is_session_invalid);
    if !session_invalid {
        return err;
    }
    if let Err(e) = state.clear_session() {
        tracing::warn!(error = %e, "could not clear rejected session");
    }
    anyhow::anyhow!("you are not signed in (or your session expired); run `shrine login`")
}

async fn run(ctx: &CartContext, command: Option<Commands>) -> anyhow::Result<()> {
    match command {
        Some(Commands::Login { email, password }) => account::login(ctx, &email, &password).await,
        Some(Commands::Register {
            name,
            email,
            password,
        }) => account::register(ctx, &name, &email, &password).await,
        Some(Commands::Logout) => account::logout(ctx).await,
        Some(Commands::Whoami) => {
            account::whoami(ctx);
            Ok(())
        }
        Some(Commands::Counts) => cart::counts(ctx).await,
        Some(Commands::Cart { command }) => match command {
            CartCommands::Show => cart::show(ctx).await,
            CartCommands::Add {
                product_id,
                quantity,
            } => cart::add(ctx, &product_id, quantity).await,
        },
        Some(Commands::Wishlist { command }) => match command {
            WishlistCommands::Show => cart::wishlist(ctx).await,
            WishlistCommands::Add { product_id } => cart::add_to_wishlist(ctx, &product_id).await,
        },
        Some(Commands::Products { command }) => match command {
            ProductCommands::List { category } => catalog::list(ctx, category.as_deref()).await,
            ProductCommands::Show { product_id } => catalog::show(ctx, &product_id).await,
        },
        None => {
            account::whoami(ctx);
            cart::counts(ctx).await
        }
    }
}

#[cfg(test)]
mod tests;
