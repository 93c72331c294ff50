use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;
use email_delivery::{ReportAssembler, SmtpMailer};
use interfaces::defs::ReportSink;
use news_digest::processor::DEFAULT_MAX_ARTICLES;
use news_digest::{
    AppConfig, ChatSummarizer, ContentExtractor, DigestCollector, FeedProcessor, FetchConfig,
    Fetcher, PacingConfig, RunConfig, Summarizer,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Collect topic news from RSS feeds, summarize it and email the digest.
#[derive(Debug, Parser)]
#[command(name = "news-digest", version)]
struct Cli {
    /// JSON file overriding the feed table, content selectors or article cap
    #[arg(long)]
    config: Option<PathBuf>,

    /// Entries to process per feed
    #[arg(long)]
    max_articles: Option<usize>,

    /// Print the digest instead of emailing it
    #[arg(long)]
    dry_run: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    info!("Starting news digest at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    tokio::select! {
        outcome = run(cli) => match outcome {
            Ok(total) => {
                info!("Digest complete: {} articles processed", total);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Digest failed: {:#}", e);
                eprintln!("news-digest failed: {:#}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted by user");
            eprintln!("news-digest interrupted by user, nothing was sent");
            ExitCode::from(130)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<usize> {
    let app_config = AppConfig::from_env().context("Failed to read environment configuration")?;
    let run_config = match &cli.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("Failed to load run configuration {}", path.display()))?,
        None => RunConfig::default(),
    };

    // Checked before any network work so a misconfigured run fails fast.
    let mailer = if cli.dry_run {
        None
    } else {
        Some(SmtpMailer::new(app_config.mail_settings()?))
    };

    if app_config.api_key.is_none() {
        warn!("DEEPSEEK_API_KEY is not set, summaries will be placeholders");
    }

    let feed_table = run_config.feed_table();
    let max_articles = cli
        .max_articles
        .or(run_config.max_articles)
        .unwrap_or(DEFAULT_MAX_ARTICLES);

    let extractor = ContentExtractor::new(&run_config.extractor_config())?;
    let fetcher = Fetcher::new(FetchConfig::default(), extractor)?;
    let summarizer = ChatSummarizer::new(app_config.summarizer_config())?;
    info!("Summarizing with {}", summarizer.adapter_name());
    let pacing = PacingConfig::default();

    let processor = FeedProcessor::new(&fetcher, &summarizer, pacing.clone());
    let collector = DigestCollector::new(processor, max_articles, pacing.between_feeds);

    let (report, stats) = collector.collect_with_stats(&feed_table).await;
    let total = report.total();

    if total == 0 {
        eprintln!("No articles were collected. Possible causes:");
        eprintln!("  - RSS feeds are unavailable");
        eprintln!("  - the network connection is poor");
        eprintln!("  - websites are blocking requests");
        bail!(
            "no articles collected from {} feeds",
            stats.feeds_attempted
        );
    }

    match mailer {
        Some(mailer) => {
            mailer
                .deliver(&report)
                .await
                .context("Failed to send digest email")?;
            info!("Digest sent to {}", mailer.settings().recipient);
        }
        None => {
            let email = ReportAssembler::default().assemble(&report, Local::now());
            println!("Subject: {}\n\n{}", email.subject, email.body);
        }
    }

    Ok(total)
}
