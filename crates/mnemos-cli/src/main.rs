//! Mnemos CLI
//!
//! Command-line flashcard reviewer driven by the FSRS-6 scheduling engine.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use mnemos_core::{ItemState, MemoryState, Rating, SystemClock};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mnemos_cli::{App, Card, Config, Seed};

/// Mnemos - spaced repetition flashcards
#[derive(Parser)]
#[command(name = "mnemos")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Review flashcards on an FSRS-6 schedule")]
#[command(long_about = "Mnemos keeps a deck of flashcards and tells you which one you are most likely to forget next.\n\nRetrievability and intervals come from the FSRS-6 forgetting curve.")]
struct Cli {
    /// Deck file (defaults to MNEMOS_DECK or the platform data directory)
    #[arg(long, global = true)]
    deck: Option<PathBuf>,

    /// JSON config file with model parameters
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a deck with three sample cards
    Init {
        /// Overwrite an existing deck
        #[arg(long)]
        force: bool,
    },

    /// List all cards with their current retrievability
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the card most at risk of being forgotten
    Next {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what each rating would do to a card
    Preview {
        /// Card id
        id: String,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Submit a review for a card
    Review {
        /// Card id
        id: String,
        /// Rating: 1-4 or again/hard/good/easy
        rating: Rating,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a card
    Add {
        /// Question side
        question: String,
        /// Answer side
        answer: String,
        /// Initial stability in days
        #[arg(long, requires = "difficulty", conflicts_with = "rating")]
        stability: Option<f64>,
        /// Initial difficulty (1-10)
        #[arg(long, requires = "stability")]
        difficulty: Option<f64>,
        /// Seed from an FSRS first review with this rating
        #[arg(long)]
        rating: Option<Rating>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = Config::load(cli.deck, cli.config).context("Failed to load configuration")?;
    debug!(deck = %config.deck_path.display(), core = mnemos_core::VERSION, "Using deck");

    let app = App::new(config.deck_path.clone(), config.scheduler()?, SystemClock);

    match cli.command {
        Commands::Init { force } => run_init(&app, force),
        Commands::List { json } => run_list(&app, json),
        Commands::Next { json } => run_next(&app, json),
        Commands::Preview { id, json } => run_preview(&app, &id, json),
        Commands::Review { id, rating, json } => run_review(&app, &id, rating, json),
        Commands::Add {
            question,
            answer,
            stability,
            difficulty,
            rating,
        } => run_add(&app, &question, &answer, stability, difficulty, rating),
    }
}

/// Run init command
fn run_init(app: &App<SystemClock>, force: bool) -> anyhow::Result<()> {
    let deck = app.init(force)?;
    println!(
        "{} {} cards written to {}",
        "Deck created:".green().bold(),
        deck.len(),
        app.deck_path().display()
    );
    Ok(())
}

/// Run list command
fn run_list(app: &App<SystemClock>, json: bool) -> anyhow::Result<()> {
    let cards = app.list()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    println!("{}", "=== Mnemos Deck ===".cyan().bold());
    if cards.is_empty() {
        println!("{}", "No cards found.".dimmed());
        return Ok(());
    }
    for card in &cards {
        print_card_line(card);
    }
    Ok(())
}

/// Run next command
fn run_next(app: &App<SystemClock>, json: bool) -> anyhow::Result<()> {
    let next = app.next()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&next)?);
        return Ok(());
    }

    match next {
        Some(card) => {
            println!("{}", "=== Next Card ===".cyan().bold());
            println!("{}: {}", "Id".white().bold(), card.id);
            println!("{}: {}", "Question".white().bold(), card.question);
            if let Some(r) = card.retrievability {
                println!("{}: {}", "Retrievability".white().bold(), colored_retrievability(r));
            }
            if let Some(interval) = card.next_review_interval {
                println!("{}: {:.1} days", "Interval if Good".white().bold(), interval);
            }
        }
        None => println!("{}", "No cards to review".dimmed()),
    }
    Ok(())
}

/// Run preview command
fn run_preview(app: &App<SystemClock>, id: &str, json: bool) -> anyhow::Result<()> {
    let preview = app.preview(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    println!("{}", "=== Review Preview ===".cyan().bold());
    println!("{}: {}", "Question".white().bold(), preview.card.question);
    println!("{}: {:.1}", "Days Since Review".white().bold(), preview.elapsed_days);
    println!(
        "{}: {}",
        "Retrievability".white().bold(),
        colored_retrievability(preview.retrievability)
    );
    println!();
    for rating in Rating::ALL {
        print_branch(rating, preview.next_states.get(rating));
    }
    Ok(())
}

/// Run review command
fn run_review(app: &App<SystemClock>, id: &str, rating: Rating, json: bool) -> anyhow::Result<()> {
    let receipt = app.review(id, rating)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        return Ok(());
    }

    println!("{}", "Review submitted".green().bold());
    println!("{}: {}", "Rating".white().bold(), rating);
    println!(
        "{}: {}",
        "Retrievability at Review".white().bold(),
        colored_retrievability(receipt.outcome.retrievability)
    );
    println!("{}: {:.2}", "Stability".white().bold(), receipt.card.memory.stability());
    println!("{}: {:.2}", "Difficulty".white().bold(), receipt.card.memory.difficulty());
    println!(
        "{}: {}",
        "Next Review".white().bold(),
        receipt.next_review_date().format("%Y-%m-%d")
    );
    Ok(())
}

/// Run add command
fn run_add(
    app: &App<SystemClock>,
    question: &str,
    answer: &str,
    stability: Option<f64>,
    difficulty: Option<f64>,
    rating: Option<Rating>,
) -> anyhow::Result<()> {
    let seed = match (stability, difficulty, rating) {
        (Some(s), Some(d), None) => Seed::Explicit(MemoryState::new(s, d)?),
        (None, None, Some(r)) => Seed::FirstRating(r),
        _ => bail!("Provide either --stability with --difficulty, or --rating"),
    };

    let card = app.add(question, answer, seed)?;
    println!("{} {}", "Card added:".green().bold(), card.id);
    Ok(())
}

fn print_card_line(card: &Card) {
    let r = card.retrievability.unwrap_or(1.0);
    println!(
        "  {:<36} {} S={:<7.2} D={:<5.2} {}",
        card.id.dimmed(),
        colored_retrievability(r),
        card.memory.stability(),
        card.memory.difficulty(),
        card.question
    );
}

fn print_branch(rating: Rating, item: &ItemState) {
    println!(
        "  {:<6} S={:<8.2} D={:<5.2} interval={:.1}d ({}d)",
        rating.as_str().bold(),
        item.memory.stability(),
        item.memory.difficulty(),
        item.interval,
        item.scheduled_days()
    );
}

fn colored_retrievability(r: f64) -> colored::ColoredString {
    let text = format!("{:>5.1}%", r * 100.0);
    if r >= 0.9 {
        text.green()
    } else if r >= 0.7 {
        text.yellow()
    } else {
        text.red()
    }
}
