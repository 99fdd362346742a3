//! cadence - command-line study dashboard.

mod cli;
mod render;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use cadence_client::ScheduleClient;
use cadence_core::{Dashboard, DashboardConfig, Performance, ReviewAction, TopicId, TopicRef};
use chrono::Local;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands, ReviewArgs};

const DEFAULT_LOG_FILTER: &str = "warn,cadence=info";

fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let path = DashboardConfig::default_path();
            if path.exists() {
                debug!(path = %path.display(), "Using default config file");
                DashboardConfig::from_file(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?
            } else {
                DashboardConfig::default()
            }
        }
    };

    let mut config = config.apply_env().context("Invalid CADENCE_* environment")?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` when set and valid, else `warn` with `cadence=info`.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Turn a dashboard failure into a process error carrying the banner text.
fn check(dashboard: &Dashboard, result: cadence_core::CadenceResult<()>) -> Result<()> {
    if let Err(e) = result {
        let banner = dashboard.error().unwrap_or_else(|| e.user_message());
        dashboard.dismiss_error();
        match e.suggestion() {
            Some(hint) => bail!("{} ({})", banner, hint),
            None => bail!("{}", banner),
        }
    }
    Ok(())
}

async fn review(dashboard: &Dashboard, args: ReviewArgs) -> Result<()> {
    let Some(topic_id) = TopicId::parse(&args.topic_id) else {
        bail!("Topic id must not be empty");
    };
    let topic = TopicRef::new(topic_id);

    check(dashboard, dashboard.load().await)?;

    let result = if let Some(score) = args.score {
        let score = Performance::new(score)?;
        dashboard.update_performance(&topic, score).await
    } else if args.good {
        dashboard.record_review(&topic, ReviewAction::Good).await
    } else {
        dashboard
            .record_review(&topic, ReviewAction::NeedsImprovement)
            .await
    };

    let mut outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return check(dashboard, Err(e)),
    };
    print!("{}", render::outcome(&outcome, &Local));

    if let Some(Err(e)) = outcome.wait_for_refill().await {
        debug!(error = %e, "Refill after review failed");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(base_url = %config.base_url, "Using scheduling service");

    let client = ScheduleClient::from_config(&config)?;
    let dashboard = Dashboard::from_config(Arc::new(client), &config);

    match cli.command {
        Commands::Overview { json } => {
            check(&dashboard, dashboard.load().await)?;
            let buckets = dashboard.overview(Local::now()).await;
            let stats = dashboard.stats().await;
            if json {
                let body = serde_json::json!({ "stats": stats, "buckets": buckets });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print!("{}", render::stats(&stats));
                print!("{}", render::overview(&buckets, &Local));
            }
        }
        Commands::Due { json } => {
            check(&dashboard, dashboard.refresh_recommendations().await.map(|_| ()))?;
            let recs = dashboard.recommendations().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&recs)?);
            } else {
                print!("{}", render::recommendations(&recs, &Local));
            }
        }
        Commands::Review(args) => review(&dashboard, args).await?,
        Commands::AddSubject { name } => {
            check(&dashboard, dashboard.add_subject(&name).await)?;
            println!("Added subject {}", name.trim());
        }
        Commands::AddSubskill { subject, name } => {
            check(&dashboard, dashboard.add_subskill(&subject, &name).await)?;
            println!("Added subskill {} to {}", name.trim(), subject.trim());
        }
        Commands::AddTopic {
            subject,
            subskill,
            name,
        } => {
            let created = dashboard.add_topic(&subject, &subskill, &name).await;
            match created {
                Ok(Some(topic)) => println!("Added topic {} [{}]", topic.name, topic.id),
                Ok(None) => bail!("Subject, subskill and topic name are required"),
                Err(e) => check(&dashboard, Err(e))?,
            }
        }
        Commands::Retrain => {
            let status = dashboard.retrain().await;
            match status {
                Ok(status) => println!("{}", status.status),
                Err(e) => check(&dashboard, Err(e))?,
            }
        }
    }

    Ok(())
}
