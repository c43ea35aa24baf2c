use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use recommendation::{
    Channel, ChannelRecommendation, JsonFileStore, Recommendation, RecommendationManager,
    RecommendationStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use taste_client::TasteClient;
use tracing::info;

/// recbot - recommendation checkout tool
#[derive(Parser)]
#[command(name = "recbot")]
#[command(about = "Evaluate channel recommendations once and keep their history", long_about = None)]
struct Cli {
    /// Path to the JSON recommendation store
    #[arg(short, long, default_value = "recommendations.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a channel recommendation and save the result
    CheckOut {
        /// Channel the recommendation came from
        #[arg(long)]
        channel: String,

        /// JSON file holding the channel's recommendation payload
        #[arg(long)]
        payload: PathBuf,

        /// Address of the taste service
        #[arg(long, default_value = "http://localhost:50051")]
        taste_addr: String,
    },

    /// Show a stored recommendation
    Show {
        /// Channel the recommendation came from
        #[arg(long)]
        channel: String,

        /// Recommendation id within the channel
        #[arg(long)]
        id: String,
    },

    /// List stored recommendations
    List,
}

/// A channel known only by name
struct NamedChannel(String);

impl Channel for NamedChannel {
    fn name(&self) -> &str {
        &self.0
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = Arc::new(JsonFileStore::new(cli.store));

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::CheckOut {
            channel,
            payload,
            taste_addr,
        } => handle_check_out(store, channel, &payload, taste_addr).await?,
        Commands::Show { channel, id } => handle_show(store, &channel, &id).await?,
        Commands::List => handle_list(store).await?,
    }

    Ok(())
}

/// Handle the 'check-out' command
async fn handle_check_out(
    store: Arc<JsonFileStore>,
    channel: String,
    payload: &Path,
    taste_addr: String,
) -> Result<()> {
    let incoming = read_payload(payload)?;

    // Connects on first use, so a duplicate checkout never touches the service
    let taste = TasteClient::connect_lazy(taste_addr)?;
    let manager = RecommendationManager::new(store.clone(), Arc::new(taste));
    let channel = NamedChannel(channel);

    let start = Instant::now();
    match manager.check_out(&channel, incoming).await {
        Ok(recommendation) => {
            store
                .save(&recommendation)
                .await
                .context("Saving checked out recommendation")?;
            info!("Saved {} to {}", recommendation.channel_id, store.path().display());
            println!("{} Checked out in {:?}", "✓".green(), start.elapsed());
            print_recommendation(&recommendation);
        }
        Err(e) if e.is_conflict() => {
            println!("{} {}", "•".yellow(), e);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Handle the 'show' command
async fn handle_show(store: Arc<JsonFileStore>, channel: &str, id: &str) -> Result<()> {
    let recommendation = store
        .find_by_channel_and_channel_id(channel, id)
        .await?
        .ok_or_else(|| anyhow!("Recommendation {} on {} not found", id, channel))?;

    println!("{}", serde_json::to_string_pretty(&recommendation)?);
    Ok(())
}

/// Handle the 'list' command
async fn handle_list(store: Arc<JsonFileStore>) -> Result<()> {
    let recommendations = store.list().await?;

    println!(
        "{}",
        format!("{} recommendations in {}", recommendations.len(), store.path().display())
            .bold()
            .blue()
    );
    for rec in &recommendations {
        println!("{}", summary_line(rec));
    }
    Ok(())
}

fn read_payload(path: &Path) -> Result<ChannelRecommendation> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Reading payload {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Parsing payload {}", path.display()))
}

/// One line per record: key, decision and match state
fn summary_line(rec: &Recommendation) -> String {
    let decision = match (rec.is_checked_out(), rec.like) {
        (false, _) => "pending",
        (true, true) => "like",
        (true, false) => "pass",
    };
    let similarity = rec
        .photos_similarity_mean
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "-".to_string());
    let matched = match &rec.match_id {
        Some(id) => format!(" match={}", id),
        None => String::new(),
    };

    format!(
        "{}/{} {} similarity={}{}",
        rec.channel, rec.channel_id, decision, similarity, matched
    )
}

/// Helper function to format and print a recommendation
fn print_recommendation(rec: &Recommendation) {
    println!("{}", format!("{}/{}", rec.channel, rec.channel_id).bold().blue());
    if let Some(date) = rec.last_checked_out_date {
        println!("{}Checked out: {}", "• ".green(), date.to_rfc3339());
    }
    let decision = if rec.like { "like".green() } else { "pass".red() };
    println!("{}Decision: {}", "• ".green(), decision);
    if let Some(similarity) = rec.photos_similarity_mean {
        println!("{}Photo similarity: {:.3}", "• ".cyan(), similarity);
    }
    if let Some(data) = &rec.data {
        println!("{}Photos: {}", "• ".cyan(), data.photos.len());
    }
}
