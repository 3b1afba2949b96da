use anyhow::{bail, Context, Result};
use bar_price_tracker::autofill;
use bar_price_tracker::config::{self, Config};
use bar_price_tracker::db::{self, SqliteItemStore};
use bar_price_tracker::inventory::Inventory;
use bar_price_tracker::listing::{ItemQuery, SortKey, SortOrder};
use bar_price_tracker::scraper::HttpScraper;
use bar_price_tracker::{ItemFields, RefreshOptions, Refresher, Session};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write an example config file
    Init,
    /// Re-scrape every item with a source URL and update its price
    Refresh {
        #[arg(long)]
        user: String,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Scrape one product page and print what could be extracted
    Autofill { url: String },
    /// List a user's items
    List {
        #[arg(long)]
        user: String,
        /// Case-insensitive substring of the item type
        #[arg(long = "type")]
        type_filter: Option<String>,
        #[arg(long, value_enum, default_value_t = SortKey::Name)]
        sort: SortKey,
        #[arg(long, value_enum, default_value_t = SortOrder::Asc)]
        order: SortOrder,
    },
    /// Add an item, optionally pre-filled from its product page
    Add(AddArgs),
    /// Delete an item
    Remove {
        #[arg(long)]
        user: String,
        id: String,
    },
    /// Show recorded price changes for an item
    History {
        #[arg(long)]
        user: String,
        id: String,
    },
}

#[derive(Debug, ClapArgs)]
struct AddArgs {
    #[arg(long)]
    user: String,
    /// Scrape the source URL first; explicit flags override scraped values
    #[arg(long)]
    from_url: bool,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long = "type")]
    item_type: Option<String>,
    /// Container size in milliliters
    #[arg(long)]
    size: Option<f64>,
    #[arg(long)]
    abv: Option<f64>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    shop: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::Init = args.command {
        if args.config.exists() {
            bail!("{} already exists", args.config.display());
        }
        std::fs::write(&args.config, config::example())
            .with_context(|| format!("failed to write {}", args.config.display()))?;
        println!("wrote {}", args.config.display());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    cfg.ensure_dirs()?;
    let scraper = Arc::new(HttpScraper::from_config(&cfg)?);

    if let Command::Autofill { url } = &args.command {
        let res = autofill::scrape_one(scraper.as_ref(), url).await;
        println!("{}", serde_json::to_string_pretty(&res)?);
        return Ok(());
    }

    let store = Arc::new(open_store(&cfg).await?);
    let inventory = Inventory::new(store.clone());

    match args.command {
        Command::Init | Command::Autofill { .. } => unreachable!("handled above"),
        Command::Refresh { user, json } => {
            let session = Session::new(user)?;
            let refresher = Refresher::new(store, scraper, RefreshOptions::from_config(&cfg));
            let outcome = refresher.refresh_all_prices(&session).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", outcome.summary());
                for err in &outcome.errors {
                    println!("  {err}");
                }
            }
        }
        Command::List {
            user,
            type_filter,
            sort,
            order,
        } => {
            let session = Session::new(user)?;
            let query = ItemQuery {
                type_filter,
                sort,
                order,
            };
            for item in inventory.list_items(&session, &query).await? {
                println!(
                    "{}  {:<32} {:>7.0}ml {:>9.2} {:>9.2}/L  {}",
                    item.id, item.name, item.size_ml, item.price, item.price_per_liter, item.shop
                );
            }
        }
        Command::Add(add) => {
            let session = Session::new(add.user.clone())?;
            let mut fields = ItemFields {
                source_url: add.url.clone(),
                ..Default::default()
            };
            if add.from_url {
                let Some(url) = add.url.as_deref() else {
                    bail!("--from-url needs --url");
                };
                let res = autofill::scrape_one(scraper.as_ref(), url).await;
                match res.data {
                    Some(data) => fields.merge_scraped(&data),
                    None => info!(error = ?res.error, "auto-fill returned nothing; using flags only"),
                }
            }
            apply_flags(&mut fields, &add);
            let item = inventory.create_item(&session, fields).await?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        Command::Remove { user, id } => {
            let session = Session::new(user)?;
            inventory.delete_item(&session, &id).await?;
            println!("deleted {id}");
        }
        Command::History { user, id } => {
            let session = Session::new(user)?;
            for entry in store.price_history(session.user_id(), &id).await? {
                println!("{}  {:>9.2}  {}", entry.recorded_at.to_rfc3339(), entry.price, entry.shop);
            }
        }
    }

    Ok(())
}

async fn open_store(cfg: &Config) -> Result<SqliteItemStore> {
    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;
    Ok(SqliteItemStore::new(pool))
}

fn apply_flags(fields: &mut ItemFields, add: &AddArgs) {
    if let Some(v) = &add.name {
        fields.name = v.clone();
    }
    if let Some(v) = &add.brand {
        fields.brand = v.clone();
    }
    if let Some(v) = &add.item_type {
        fields.item_type = v.clone();
    }
    if let Some(v) = add.size {
        fields.size_ml = v;
    }
    if let Some(v) = add.abv {
        fields.alcohol_percentage = v;
    }
    if let Some(v) = add.price {
        fields.price = v;
    }
    if let Some(v) = &add.shop {
        fields.shop = v.clone();
    }
    if let Some(v) = &add.image_url {
        fields.image_url = Some(v.clone());
    }
}
