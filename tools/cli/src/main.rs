//! Idealista CLI - Command line interface for the Idealista listings API.
//!
//! This tool manages API credentials, prints access tokens, searches
//! listings, and summarises listing prices.

mod report;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use idealista_client::{IdealistaClient, DEFAULT_SCOPE};
use idealista_common::{keys, Credentials, SearchParams, SearchResult};
use idealista_storage::{ConfigStore, StateDirs};

#[derive(Parser)]
#[command(name = "idealista")]
#[command(about = "Idealista - Listings API client")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage stored credentials.
    Config {
        #[arg(value_enum, default_value_t = ConfigAction::Show)]
        action: ConfigAction,

        /// API key to store.
        #[arg(long)]
        api_key: Option<String>,

        /// API secret to store.
        #[arg(long)]
        api_secret: Option<String>,
    },

    /// Print an OAuth access token.
    Token {
        /// Token scope.
        #[arg(long, default_value = DEFAULT_SCOPE)]
        scope: String,

        /// Ignore the cached token.
        #[arg(long)]
        refresh: bool,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Search listings.
    Search {
        #[command(flatten)]
        search: SearchArgs,

        #[arg(long, value_enum, default_value_t = SearchFormat::Table)]
        format: SearchFormat,

        /// Maximum rows in table output.
        #[arg(long)]
        limit: Option<usize>,

        /// Comma-separated fields for table output.
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },

    /// Compute price averages over all fetched pages.
    Avg {
        #[command(flatten)]
        search: SearchArgs,

        /// Listing field to group by.
        #[arg(long, value_enum)]
        group_by: Option<GroupBy>,

        #[arg(long, value_enum, default_value_t = AvgFormat::Table)]
        format: AvgFormat,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum ConfigAction {
    Show,
    Set,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum SearchFormat {
    Table,
    Json,
    Summary,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum AvgFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum GroupBy {
    #[value(name = "propertyType")]
    PropertyType,
    #[value(name = "municipality")]
    Municipality,
    #[value(name = "district")]
    District,
}

impl GroupBy {
    fn field(self) -> &'static str {
        match self {
            GroupBy::PropertyType => "propertyType",
            GroupBy::Municipality => "municipality",
            GroupBy::District => "district",
        }
    }
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Retries for rate limits and transient errors.
    #[arg(long, default_value_t = 3)]
    retries: u32,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("area")
        .required(true)
        .multiple(true)
        .args(["center", "location_id"])
))]
struct SearchArgs {
    #[arg(long, default_value = "es")]
    country: String,

    /// sale or rent.
    #[arg(long, default_value = "sale")]
    operation: String,

    /// homes, offices, premises, garages or bedrooms.
    #[arg(long, default_value = "homes")]
    property_type: String,

    /// Search center as lat,lon.
    #[arg(long)]
    center: Option<String>,

    /// Radius around the center in meters.
    #[arg(long)]
    distance: Option<i64>,

    #[arg(long)]
    location_id: Option<String>,

    #[arg(long)]
    locale: Option<String>,

    #[arg(long, default_value_t = 50)]
    max_items: u32,

    #[arg(long, default_value_t = 1)]
    num_page: u32,

    /// Limit pages when fetching all pages.
    #[arg(long)]
    pages: Option<u32>,

    /// Fetch every page and merge the listings.
    #[arg(long)]
    all_pages: bool,

    /// Extra filter as key=value. Repeatable; overrides built-in fields.
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    #[command(flatten)]
    request: RequestArgs,
}

impl SearchArgs {
    fn params(&self) -> SearchParams {
        let mut params = SearchParams::listing(&self.operation, &self.property_type);
        params
            .set_opt(keys::CENTER, self.center.clone())
            .set_opt(keys::DISTANCE, self.distance)
            .set_opt(keys::LOCATION_ID, self.location_id.clone())
            .set_opt(keys::LOCALE, self.locale.clone())
            .set(keys::MAX_ITEMS, self.max_items)
            .set(keys::NUM_PAGE, self.num_page)
            .extend_filters(self.filters.iter().cloned());
        params
    }
}

fn parse_filter(text: &str) -> std::result::Result<(String, String), String> {
    match text.split_once('=') {
        Some((key, value)) => Ok((key.trim().to_string(), value.trim().to_string())),
        None => Err("Expected key=value".to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for command output
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Config {
            action,
            api_key,
            api_secret,
        } => cmd_config(action, api_key, api_secret).await,

        Commands::Token {
            scope,
            refresh,
            request,
        } => cmd_token(&scope, refresh, &request).await,

        Commands::Search {
            search,
            format,
            limit,
            fields,
        } => cmd_search(&search, format, limit, fields).await,

        Commands::Avg {
            search,
            group_by,
            format,
        } => cmd_avg(&search, group_by, format).await,
    }
}

async fn build_client(request: &RequestArgs) -> Result<IdealistaClient> {
    IdealistaClient::builder()
        .timeout(Duration::from_secs(request.timeout))
        .max_retries(request.retries)
        .build()
        .await
        .context("Failed to set up API client")
}

/// Show or store credentials.
async fn cmd_config(
    action: ConfigAction,
    api_key: Option<String>,
    api_secret: Option<String>,
) -> Result<()> {
    let dirs = StateDirs::from_env().context("Failed to locate config directory")?;
    let config = ConfigStore::open(&dirs);

    match action {
        ConfigAction::Set => {
            let api_key = api_key.filter(|s| !s.is_empty());
            let api_secret = api_secret.filter(|s| !s.is_empty());
            let (Some(api_key), Some(api_secret)) = (api_key, api_secret) else {
                anyhow::bail!("Both --api-key and --api-secret are required");
            };

            let credentials = Credentials::new(api_key, api_secret)?;
            info!("Saving credentials to {}", config.path().display());
            let path = config
                .save(&credentials)
                .await
                .context("Failed to save config")?;

            println!("Saved config to {}", path.display());
        }

        ConfigAction::Show => {
            let stored = config.load().await.context("Failed to read config")?;
            let masked_secret = if stored.api_secret.is_some() {
                "***"
            } else {
                "(missing)"
            };

            println!("Config path: {}", config.path().display());
            println!(
                "API key: {}",
                stored.api_key.as_deref().unwrap_or("(missing)")
            );
            println!("API secret: {}", masked_secret);
        }
    }

    Ok(())
}

/// Print an access token.
async fn cmd_token(scope: &str, refresh: bool, request: &RequestArgs) -> Result<()> {
    let client = build_client(request).await?;
    let token = client
        .get_token(Some(scope), refresh)
        .await
        .context("Failed to obtain access token")?;

    println!("{}", token);
    Ok(())
}

/// Run the search described by `search`, following pages if asked to.
async fn fetch(search: &SearchArgs, all_pages: bool) -> Result<SearchResult> {
    let client = build_client(&search.request).await?;
    let params = search.params();
    debug!(country = %search.country, all_pages, "running search");

    let result = if all_pages {
        client
            .search_all(&search.country, search.pages, &params)
            .await
    } else {
        client.search(&search.country, &params).await
    };
    result.context("Search failed")
}

/// Search listings and print them.
async fn cmd_search(
    search: &SearchArgs,
    format: SearchFormat,
    limit: Option<usize>,
    fields: Option<Vec<String>>,
) -> Result<()> {
    let result = fetch(search, search.all_pages).await?;

    match format {
        SearchFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        SearchFormat::Summary => {
            println!(
                "total={} pages={} summary={}",
                json_text(result.total()),
                json_text(result.get("totalPages")),
                json_text(result.summary())
            );
        }
        SearchFormat::Table => {
            let fields = fields.unwrap_or_else(|| {
                report::DEFAULT_FIELDS
                    .iter()
                    .map(|f| f.to_string())
                    .collect()
            });
            println!(
                "{}",
                report::render_listing_table(result.element_list(), &fields, limit)
            );
        }
    }

    Ok(())
}

/// Fetch all pages and print price statistics.
async fn cmd_avg(search: &SearchArgs, group_by: Option<GroupBy>, format: AvgFormat) -> Result<()> {
    let result = fetch(search, true).await?;
    let groups = report::group_stats(result.element_list(), group_by.map(GroupBy::field));

    match format {
        AvgFormat::Json => println!("{}", serde_json::to_string_pretty(&groups)?),
        AvgFormat::Table => println!("{}", report::render_group_table(&groups)),
    }

    Ok(())
}

fn json_text(value: Option<&serde_json::Value>) -> String {
    value.map_or_else(|| "null".to_string(), |v| v.to_string())
}
