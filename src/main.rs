//! Command-line driver: find the best way to lay down one hand.

use clap::Parser;
use rummy_solver::{
    DiscardPile, Hand, Meld, SearchConfig, Table, api, commit_play, find_best_play,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rummy")]
#[command(about = "Find the lowest-scoring way to lay down a rummy hand")]
struct Args {
    /// Round number; cards of this rank are wild
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=13))]
    round: u8,

    /// Hand as space-separated cards, e.g. "H1 H2 H3 W"
    #[arg(long)]
    hand: String,

    /// A meld already on the table, e.g. "S5 S6 S7" (repeatable)
    #[arg(long = "table")]
    table: Vec<String>,

    /// Anchor rank for melds made only of wilds
    #[arg(long, default_value = "1")]
    fix_value: u8,

    /// Stop searching after this many milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Stop searching after this many outcomes
    #[arg(long)]
    max_outcomes: Option<usize>,

    /// Stop at the first outcome that goes out
    #[arg(long)]
    stop_at_go_out: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Show search progress
    #[arg(long)]
    show_output: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Silent by default; RUST_LOG overrides the flags
    let filter = if args.verbose {
        "debug"
    } else if args.show_output {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let hand = Hand::from_string(&args.hand)?;
    let mut table = Table::new();
    for meld in &args.table {
        table.add_meld(Meld::from_string(meld, args.round)?);
    }

    let config = SearchConfig {
        fix_value: args.fix_value,
        time_limit_ms: args.time_limit_ms,
        max_outcomes: args.max_outcomes,
        stop_at_go_out: args.stop_at_go_out,
    };
    config.validate()?;

    info!("Round {}: hand {} against {} table melds", args.round, hand, table.len());

    if args.json {
        let response = api::solve_turn(hand, table, args.round, &config)?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let result = find_best_play(&hand, args.round, &table, &config);
    if !result.search_completed {
        warn!(
            "Search stopped after {} outcomes; the play below may not be optimal",
            result.outcomes_examined
        );
    }

    let mut committed_hand = hand.clone();
    let mut pile = DiscardPile::new();
    let report = commit_play(
        &mut committed_hand,
        &mut table,
        &mut pile,
        &result.best,
        config.fix_value,
    )?;

    println!("Hand: {}", hand);
    if result.best.plays().is_empty() {
        println!("No melds to lay down");
    }
    for play in result.best.plays() {
        println!("  {}", play);
    }
    if let Some(card) = report.discard {
        println!("Discard: {}", card);
    }
    println!("Remaining: {}", committed_hand);
    println!("Residual score: {}", report.residual_score);
    if report.went_out() {
        let kind = if report.natural { "naturally" } else { "with wilds" };
        println!(
            "Goes out {} (bonus if first: {})",
            kind,
            report.go_out_adjustment(true)
        );
    }
    println!("Table:");
    print!("{}", table);
    info!("Examined {} outcomes", result.outcomes_examined);

    Ok(())
}
