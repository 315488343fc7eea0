use clap::{Parser, Subcommand};
use mtg_goldfish::card::CardDatabase;
use mtg_goldfish::simulation::{
    simulate, AggroPilot, Deck, DeckReport, DeckStats, GameRecord, SimulationReport, SimulatorConfig, Start,
    Summary,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mtg-goldfish")]
#[command(about = "Goldfish simulator: how fast does a deck kill a passive opponent?", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Card database
    #[arg(short, long, global = true, default_value = "cards.json")]
    cards: PathBuf,

    /// Debug diagnostics on stderr (RUST_LOG overrides)
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate games of one deck
    Run {
        /// Deck file to use
        #[arg(short, long, default_value = "deck.txt")]
        deck: PathBuf,

        /// Number of games to simulate
        #[arg(short = 'n', long, default_value = "10000")]
        num_games: usize,

        /// Seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Who starts
        #[arg(long, value_enum, default_value = "both")]
        start: Start,

        /// Games not won by then are timeouts
        #[arg(long, default_value = "20")]
        max_turns: u32,

        /// Play a single game and print its log
        #[arg(short, long)]
        verbose: bool,

        /// Also write the statistics as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Compare two decks
    Compare {
        /// First deck file
        deck1: PathBuf,

        /// Second deck file
        deck2: PathBuf,

        /// Number of games per deck
        #[arg(short = 'n', long, default_value = "10000")]
        num_games: usize,

        /// Seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn main() {
    let cli = Cli::parse();

    let debug = cli.debug || matches!(cli.command, Commands::Run { verbose: true, .. });
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Load the card database
    let db = match CardDatabase::from_file(&cli.cards) {
        Ok(db) => {
            eprintln!("✓ Loaded {} cards from {}", db.card_count(), cli.cards.display());
            Arc::new(db)
        }
        Err(e) => {
            eprintln!("✗ Failed to load cards: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Run {
            deck,
            num_games,
            seed,
            start,
            max_turns,
            verbose,
            json,
        } => {
            let config = SimulatorConfig {
                iterations: if verbose { 1 } else { num_games },
                start,
                max_turns,
                seed: Some(seed.unwrap_or_else(rand::random)),
                verbose,
                progress: !verbose,
                ..SimulatorConfig::default()
            };
            run_simulation(&db, &deck, &config, json.as_deref());
        }
        Commands::Compare {
            deck1,
            deck2,
            num_games,
            seed,
        } => {
            let config = SimulatorConfig {
                iterations: num_games,
                seed: Some(seed.unwrap_or_else(rand::random)),
                progress: true,
                ..SimulatorConfig::default()
            };
            compare_decks(&db, &deck1, &deck2, &config);
        }
    }
}

fn load_deck(path: &Path, db: &CardDatabase) -> Deck {
    let deck = Deck::from_file(path).and_then(|deck| deck.validate(db).map(|_| deck));
    match deck {
        Ok(deck) => deck,
        Err(e) => {
            eprintln!("✗ Failed to parse deck file '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn play_games(db: &Arc<CardDatabase>, deck: &Deck, config: &SimulatorConfig) -> Vec<GameRecord> {
    match simulate(&deck.main, Arc::clone(db), config, AggroPilot::new) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("✗ Simulation of '{}' failed: {}", deck.name, e);
            std::process::exit(1);
        }
    }
}

fn format_turn(turn: Option<f64>) -> String {
    turn.map_or_else(|| "-".to_string(), |t| format!("{:.2}", t))
}

fn print_summary(label: &str, summary: &Summary) {
    println!(
        "  {:14} {:5.1}% ({}/{})  avg {} ± {} (sd {})",
        label,
        summary.win_rate * 100.0,
        summary.wins,
        summary.games,
        format_turn(summary.average_win_turn),
        format_turn(summary.win_turn_mad),
        format_turn(summary.win_turn_sd),
    );
}

fn run_simulation(db: &Arc<CardDatabase>, deck_file: &Path, config: &SimulatorConfig, json: Option<&Path>) {
    let deck = load_deck(deck_file, db);

    println!("\n=== MTG Goldfish Simulator ===\n");
    println!("Deck: {} ({} cards)", deck_file.display(), deck.main.len());
    println!("Games: {}", config.iterations);
    if let Some(s) = config.seed {
        println!("Seed: {}", s);
    }
    println!();

    let start = std::time::Instant::now();
    let records = play_games(db, &deck, config);
    let elapsed = start.elapsed();

    if config.verbose {
        for record in &records {
            for line in &record.log {
                println!("{}", line);
            }
            println!();
        }
    }

    let stats = DeckStats::from_records(&deck.name, &records);
    let report = stats.report();
    print_report(&report, config.iterations);

    println!();
    println!(
        "Simulation completed in {:.2?} ({:.0} games/sec)",
        elapsed,
        config.iterations as f64 / elapsed.as_secs_f64()
    );

    if let Some(path) = json {
        write_report(path, &SimulationReport::new(config, vec![report]));
    }
}

fn print_report(report: &DeckReport, games: usize) {
    println!("=== Results ===\n");
    print_summary("Overall", &report.overall);
    print_summary("On the play", &report.on_the_play);
    print_summary("On the draw", &report.on_the_draw);
    for (mulligans, summary) in &report.by_mulligans {
        print_summary(&format!("{} mulligan(s)", mulligans), summary);
    }
    println!();

    println!("Turn distribution:");
    for (turn, count) in &report.win_turns {
        let pct = *count as f64 / games as f64 * 100.0;
        let bar = "█".repeat((pct / 2.0) as usize);
        println!("  Turn {:2}: {:5.1}% {} ({})", turn, pct, bar, count);
    }
    if report.timeouts > 0 {
        let pct = report.timeouts as f64 / games as f64 * 100.0;
        println!("  No win: {:5.1}% ({})", pct, report.timeouts);
    }
    if report.lost > 0 {
        let pct = report.lost as f64 / games as f64 * 100.0;
        println!("  Decked: {:5.1}% ({})", pct, report.lost);
    }
}

fn write_report(path: &Path, report: &SimulationReport) {
    let written = std::fs::File::create(path)
        .map_err(serde_json::Error::io)
        .and_then(|file| serde_json::to_writer_pretty(file, report));
    match written {
        Ok(()) => println!("Report written to {}", path.display()),
        Err(e) => {
            eprintln!("✗ Failed to write report '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn compare_decks(db: &Arc<CardDatabase>, deck1_file: &Path, deck2_file: &Path, config: &SimulatorConfig) {
    println!("\n=== MTG Deck Comparison ===\n");
    println!("Deck 1: {}", deck1_file.display());
    println!("Deck 2: {}", deck2_file.display());
    println!("Games per deck: {}", config.iterations);
    println!();

    let deck1 = load_deck(deck1_file, db);
    let deck2 = load_deck(deck2_file, db);

    let start = std::time::Instant::now();

    // Both decks see the same seeds
    println!("Running deck 1...");
    let stats1 = DeckStats::from_records(&deck1.name, &play_games(db, &deck1, config)).report();
    println!("Running deck 2...");
    let stats2 = DeckStats::from_records(&deck2.name, &play_games(db, &deck2, config)).report();

    let elapsed = start.elapsed();

    let name1 = deck1_file.display().to_string();
    let name2 = deck2_file.display().to_string();
    let (s1, s2) = (&stats1.overall, &stats2.overall);

    println!("\n=== Results ===\n");
    println!("{:20} {:>12} {:>12}", "Metric", name1, name2);
    println!("{:-<50}", "");
    println!(
        "{:20} {:>11.1}% {:>11.1}%",
        "Win rate",
        s1.win_rate * 100.0,
        s2.win_rate * 100.0
    );
    println!(
        "{:20} {:>12} {:>12}",
        "Avg win turn",
        format_turn(s1.average_win_turn),
        format_turn(s2.average_win_turn)
    );
    println!(
        "{:20} {:>12} {:>12}",
        "Win turn MAD",
        format_turn(s1.win_turn_mad),
        format_turn(s2.win_turn_mad)
    );
    println!(
        "{:20} {:>12} {:>12}",
        "Win turn SD",
        format_turn(s1.win_turn_sd),
        format_turn(s2.win_turn_sd)
    );

    // Determine winner
    println!();
    if s1.win_rate > s2.win_rate {
        println!("✓ {} has {:.1}% higher win rate", name1, (s1.win_rate - s2.win_rate) * 100.0);
    } else if s2.win_rate > s1.win_rate {
        println!("✓ {} has {:.1}% higher win rate", name2, (s2.win_rate - s1.win_rate) * 100.0);
    } else {
        println!("Both decks have the same win rate");
    }

    if let (Some(avg1), Some(avg2)) = (s1.average_win_turn, s2.average_win_turn) {
        if avg1 < avg2 {
            println!("✓ {} wins {:.2} turns faster on average", name1, avg2 - avg1);
        } else if avg2 < avg1 {
            println!("✓ {} wins {:.2} turns faster on average", name2, avg1 - avg2);
        }
    }

    println!("\nCompleted in {:.2?}", elapsed);
}
