//! Command-line front end for the insights library.
//!
//! Every report prints JSON to stdout; logs go to stderr.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use gsc_insights::{
    analytics::{
        CannibalizationOptions, CannibalizationSort, CtrBenchmarkOptions, CtrCurve, DecayOptions,
        DropAlertOptions, StrikingDistanceOptions,
    },
    reports::{self, PageHealthOptions},
    AnalyticsQuery, Dimension, FormFactor, InsightsConfig, InsightsContext, InsightsError, Period,
    SearchType, Strategy,
};
use search_console_client::{PageSpeedClient, SearchConsoleClient};
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "gsc-insights")]
#[command(about = "Search Console insights: trends, decay, cannibalization, health")]
#[command(version)]
struct Cli {
    /// Property identifier, e.g. https://example.com/ or sc-domain:example.com
    #[arg(short, long, global = true, default_value = "")]
    site: String,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Copy)]
struct PeriodArgs {
    /// First day of the (recent) period
    #[arg(long)]
    start: NaiveDate,

    /// Last day of the (recent) period
    #[arg(long)]
    end: NaiveDate,
}

#[derive(clap::Args, Clone, Copy)]
struct EarlierArgs {
    /// First day of the earlier period (defaults to the window before --start)
    #[arg(long, requires = "earlier_end")]
    earlier_start: Option<NaiveDate>,

    #[arg(long, requires = "earlier_start")]
    earlier_end: Option<NaiveDate>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DimensionArg {
    Query,
    Page,
    Country,
    Device,
    SearchAppearance,
    Date,
}

impl From<DimensionArg> for Dimension {
    fn from(arg: DimensionArg) -> Self {
        match arg {
            DimensionArg::Query => Dimension::Query,
            DimensionArg::Page => Dimension::Page,
            DimensionArg::Country => Dimension::Country,
            DimensionArg::Device => Dimension::Device,
            DimensionArg::SearchAppearance => Dimension::SearchAppearance,
            DimensionArg::Date => Dimension::Date,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SearchTypeArg {
    Web,
    Image,
    Video,
    News,
    Discover,
    GoogleNews,
}

impl From<SearchTypeArg> for SearchType {
    fn from(arg: SearchTypeArg) -> Self {
        match arg {
            SearchTypeArg::Web => SearchType::Web,
            SearchTypeArg::Image => SearchType::Image,
            SearchTypeArg::Video => SearchType::Video,
            SearchTypeArg::News => SearchType::News,
            SearchTypeArg::Discover => SearchType::Discover,
            SearchTypeArg::GoogleNews => SearchType::GoogleNews,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the properties the credential can access
    Sites,

    /// Period-over-period comparison
    Compare {
        #[command(flatten)]
        period: PeriodArgs,
        #[command(flatten)]
        earlier: EarlierArgs,
        #[arg(short, long, value_enum, default_values = ["query"])]
        dimension: Vec<DimensionArg>,
        #[arg(long, value_enum, default_value = "web")]
        search_type: SearchTypeArg,
    },

    /// Pages losing clicks
    Decay {
        #[command(flatten)]
        period: PeriodArgs,
        #[command(flatten)]
        earlier: EarlierArgs,
        #[arg(long, default_value_t = 0)]
        min_clicks: u64,
    },

    /// Pages whose click loss crosses a threshold
    Drops {
        #[command(flatten)]
        period: PeriodArgs,
        #[command(flatten)]
        earlier: EarlierArgs,
        /// Loss in percent that raises an alert
        #[arg(long, default_value_t = 50.0)]
        threshold: f64,
        #[arg(long, default_value_t = 0)]
        min_clicks: u64,
    },

    /// Queries where several pages compete
    Cannibalization {
        #[command(flatten)]
        period: PeriodArgs,
        /// Sort by position variance instead of impressions
        #[arg(long)]
        by_variance: bool,
        #[arg(long, default_value_t = 1)]
        min_impressions: u64,
        /// Recommend redirect / consolidate / differentiate per page
        #[arg(long)]
        resolve: bool,
    },

    /// Queries gained and lost
    Keywords {
        #[command(flatten)]
        period: PeriodArgs,
        #[command(flatten)]
        earlier: EarlierArgs,
    },

    /// Rows underperforming the expected CTR for their position
    Ctr {
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(short, long, value_enum, default_values = ["query"])]
        dimension: Vec<DimensionArg>,
        #[arg(long, default_value_t = 0.3)]
        shortfall: f64,
        #[arg(long, default_value_t = 100)]
        min_impressions: u64,
    },

    /// Queries ranking just off the top positions
    Striking {
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(long, default_value_t = 4.0)]
        min_position: f64,
        #[arg(long, default_value_t = 20.0)]
        max_position: f64,
        #[arg(long, default_value_t = 100)]
        min_impressions: u64,
    },

    /// Inspect a batch of URLs, one per second by default
    Inspect {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Inspection, analytics, speed and vitals for one page
    Health {
        url: String,
        #[command(flatten)]
        period: PeriodArgs,
        /// Run Lighthouse with the desktop profile
        #[arg(long)]
        desktop: bool,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gsc_insights=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            if let Some(err) = e.downcast_ref::<InsightsError>() {
                let auth_mode = InsightsConfig::from_env()
                    .map(|c| c.auth_mode)
                    .unwrap_or_default();
                eprintln!("{} {}", "Hint:".yellow().bold(), err.hint(auth_mode));
            }
            ExitCode::from(1)
        }
    }
}

fn build_context(config: &Config) -> InsightsContext {
    let mut client = SearchConsoleClient::new(config.access_token.clone());
    if let Some(base_url) = &config.api_base_url {
        client = client.with_base_url(base_url.clone());
    }

    let ctx = InsightsContext::new(client, config.insights.clone());
    match &config.pagespeed_api_key {
        Some(key) => ctx.with_page_experience(PageSpeedClient::new(key.clone())),
        None => {
            tracing::info!("PAGESPEED_API_KEY not set; speed and vitals sections disabled");
            ctx
        }
    }
}

fn period(args: PeriodArgs) -> Result<Period> {
    Period::new(args.start, args.end).context("Invalid --start/--end")
}

/// The earlier period: explicit, or the equal-length window before `recent`.
fn earlier_period(args: EarlierArgs, recent: Period) -> Result<Period> {
    match (args.earlier_start, args.earlier_end) {
        (Some(start), Some(end)) => {
            Period::new(start, end).context("Invalid --earlier-start/--earlier-end")
        }
        _ => recent.preceding().context("No period precedes --start/--end"),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn require_site(site: &str) -> Result<&str> {
    if site.is_empty() {
        anyhow::bail!("--site is required for this command");
    }
    Ok(site)
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let pretty = cli.pretty;

    if let Commands::Sites = cli.command {
        let mut client = SearchConsoleClient::new(config.access_token.clone());
        if let Some(base_url) = &config.api_base_url {
            client = client.with_base_url(base_url.clone());
        }
        let sites = client
            .list_sites()
            .await
            .map_err(InsightsError::from)
            .context("Failed to list sites")?;
        let listed: Vec<_> = sites
            .iter()
            .map(|s| serde_json::json!({"site_url": s.site_url, "permission_level": s.permission_level}))
            .collect();
        return print_json(&listed, pretty);
    }

    let site = require_site(&cli.site)?;
    let ctx = build_context(&config);

    match cli.command {
        Commands::Sites => Ok(()),

        Commands::Compare {
            period: p,
            earlier,
            dimension,
            search_type,
        } => {
            let later = period(p)?;
            let earlier = earlier_period(earlier, later)?;
            let query = AnalyticsQuery::new(later, dimension.into_iter().map(Dimension::from))
                .with_search_type(search_type.into());
            let comparison = reports::compare_periods(&ctx, site, &query, earlier, later).await?;
            print_json(&comparison, pretty)
        }

        Commands::Decay {
            period: p,
            earlier,
            min_clicks,
        } => {
            let recent = period(p)?;
            let earlier = earlier_period(earlier, recent)?;
            let options = DecayOptions {
                min_earlier_clicks: min_clicks,
            };
            let signals = reports::detect_decay(&ctx, site, earlier, recent, &options).await?;
            print_json(&signals, pretty)
        }

        Commands::Drops {
            period: p,
            earlier,
            threshold,
            min_clicks,
        } => {
            let recent = period(p)?;
            let earlier = earlier_period(earlier, recent)?;
            let options = DropAlertOptions {
                threshold_percent: threshold,
                min_earlier_clicks: min_clicks,
            };
            let alerts = reports::drop_alerts(&ctx, site, earlier, recent, &options).await?;
            print_json(&alerts, pretty)
        }

        Commands::Cannibalization {
            period: p,
            by_variance,
            min_impressions,
            resolve,
        } => {
            let options = CannibalizationOptions {
                sort: if by_variance {
                    CannibalizationSort::Variance
                } else {
                    CannibalizationSort::Impressions
                },
                min_impressions,
            };
            let period = period(p)?;
            if resolve {
                let resolved =
                    reports::resolve_cannibalization(&ctx, site, period, &options).await?;
                print_json(&resolved, pretty)
            } else {
                let groups = reports::detect_cannibalization(&ctx, site, period, &options).await?;
                print_json(&groups, pretty)
            }
        }

        Commands::Keywords { period: p, earlier } => {
            let later = period(p)?;
            let earlier = earlier_period(earlier, later)?;
            let diff = reports::keyword_diff(&ctx, site, earlier, later).await?;
            print_json(&diff, pretty)
        }

        Commands::Ctr {
            period: p,
            dimension,
            shortfall,
            min_impressions,
        } => {
            let query = AnalyticsQuery::new(period(p)?, dimension.into_iter().map(Dimension::from));
            let options = CtrBenchmarkOptions {
                shortfall_threshold: shortfall,
                min_impressions,
            };
            let rows = reports::ctr_benchmark(&ctx, site, &query, &CtrCurve::default(), &options).await?;
            print_json(&rows, pretty)
        }

        Commands::Striking {
            period: p,
            min_position,
            max_position,
            min_impressions,
        } => {
            let options = StrikingDistanceOptions {
                min_position,
                max_position,
                min_impressions,
            };
            let queries = reports::striking_distance(&ctx, site, period(p)?, &options).await?;
            print_json(&queries, pretty)
        }

        Commands::Inspect { urls } => {
            let results = reports::batch_inspect(&ctx, site, &urls).await?;
            print_json(&results, pretty)
        }

        Commands::Health {
            url,
            period: p,
            desktop,
        } => {
            let options = PageHealthOptions {
                strategy: if desktop { Strategy::Desktop } else { Strategy::Mobile },
                form_factor: if desktop { FormFactor::Desktop } else { FormFactor::Phone },
                ..Default::default()
            };
            let report = reports::page_health(&ctx, site, &url, period(p)?, &options).await?;
            print_json(&report, pretty)
        }
    }
}
