//! Storekeep CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the schema and the session table
//! sk-cli migrate
//!
//! # Create an admin account
//! STOREKEEP_ADMIN_PASSWORD='...' sk-cli admin create -u boss -e boss@example.com
//!
//! # Manage the catalog
//! sk-cli tag create Sports
//! sk-cli product create -n Ball --price 19.99 -c out_door -t Sports
//!
//! # Manage customers
//! sk-cli customer create -n "Peter Piper" -e peter@example.com
//! sk-cli customer delete 7
//!
//! # Load demo data
//! sk-cli seed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use storekeep_core::{CustomerId, ProductId};

mod commands;

#[derive(Parser)]
#[command(name = "sk-cli")]
#[command(author, version, about = "Storekeep CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage customers
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage product tags
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },
    /// Load demo tags, products, customers and orders
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address (used for password resets)
        #[arg(short, long)]
        email: Option<String>,

        /// Password
        #[arg(long, env = "STOREKEEP_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum CustomerAction {
    /// Create a customer without a login
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        phone: Option<String>,

        #[arg(short, long)]
        email: Option<String>,
    },
    /// Delete a customer and their orders
    Delete { id: CustomerId },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Create a product
    Create {
        #[arg(short, long)]
        name: String,

        /// Unit price, e.g. 19.99
        #[arg(long)]
        price: String,

        /// Category (`indoor`, `out_door`)
        #[arg(short, long)]
        category: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Existing tag to attach (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// Delete a product no order references
    Delete { id: ProductId },
}

#[derive(Subcommand)]
enum TagAction {
    /// Create a tag
    Create { name: String },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                email,
                password,
            } => {
                commands::admin::create_user(&username, email.as_deref(), &password).await?;
            }
        },
        Commands::Customer { action } => match action {
            CustomerAction::Create { name, phone, email } => {
                commands::customer::create(&name, phone.as_deref(), email.as_deref()).await?;
            }
            CustomerAction::Delete { id } => commands::customer::delete(id).await?,
        },
        Commands::Product { action } => match action {
            ProductAction::Create {
                name,
                price,
                category,
                description,
                tags,
            } => {
                commands::catalog::create_product(
                    &name,
                    &price,
                    &category,
                    description.as_deref(),
                    &tags,
                )
                .await?;
            }
            ProductAction::Delete { id } => commands::catalog::delete_product(id).await?,
        },
        Commands::Tag { action } => match action {
            TagAction::Create { name } => {
                commands::catalog::create_tag(&name).await?;
            }
        },
        Commands::Seed => commands::seed::demo().await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_product_create_collects_tags() {
        let parsed = Cli::try_parse_from([
            "sk-cli", "product", "create", "-n", "Ball", "--price", "9.99", "-c", "out_door",
            "-t", "Sports", "-t", "Summer",
        ]);
        match parsed.map(|cli| cli.command) {
            Ok(Commands::Product {
                action: ProductAction::Create { tags, price, .. },
            }) => {
                assert_eq!(tags, ["Sports", "Summer"]);
                assert_eq!(price, "9.99");
            }
            Ok(_) => panic!("parsed into the wrong command"),
            Err(e) => panic!("{e}"),
        }
    }

    #[test]
    fn test_customer_delete_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["sk-cli", "customer", "delete", "seven"]).is_err());
    }
}
