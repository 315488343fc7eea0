use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mtg_goldfish::card::{CardDatabase, CardType};
use mtg_goldfish::game::{plan, Cards, GameLog, GameState, Mana, ManaSources, Phase};
use mtg_goldfish::rng::GameRng;
use mtg_goldfish::simulation::{run_game, AggroPilot, Deck, SimulatorConfig};
use std::sync::Arc;

fn load() -> (Arc<CardDatabase>, Deck) {
    let db = CardDatabase::from_file("cards.json").expect("Failed to load cards");
    let deck = Deck::from_file("deck.txt").expect("Failed to parse deck");
    (Arc::new(db), deck)
}

/// First main phase with three lands in play and a full library
fn midgame(db: &Arc<CardDatabase>, deck: &Deck) -> GameState {
    let mut game = GameState::new(Arc::clone(db), GameLog::disabled());
    game.start(true);
    game.keep_hand_and_start(deck.main.clone(), Cards::of(&["seething song", "lotus petal"]));
    for land in ["mountain", "mountain", "stomping ground"] {
        game.create_token(land, &[CardType::Land]);
    }
    game.start_next_turn();
    game.start_phase(Phase::FirstMain).expect("first main");
    game
}

fn benchmark_single_game(c: &mut Criterion) {
    let (db, deck) = load();
    let config = SimulatorConfig::default();

    c.bench_function("single_game_seed_12345", |b| {
        b.iter(|| {
            let mut rng = GameRng::new(Some(12345));
            run_game(black_box(&deck.main), &db, true, &mut rng, &config, &AggroPilot::new)
        })
    });
}

fn benchmark_multiple_games(c: &mut Criterion) {
    let (db, deck) = load();
    let config = SimulatorConfig::default();

    c.bench_function("100_games", |b| {
        b.iter(|| {
            for seed in 0..100 {
                let mut rng = GameRng::for_game(black_box(7), seed);
                let _ = run_game(&deck.main, &db, seed % 2 == 0, &mut rng, &config, &AggroPilot::new);
            }
        })
    });
}

fn benchmark_fork(c: &mut Criterion) {
    let (db, deck) = load();
    let game = midgame(&db, &deck);

    c.bench_function("fork_game_state", |b| b.iter(|| black_box(&game).fork()));
}

fn benchmark_planner(c: &mut Criterion) {
    let (db, deck) = load();
    let game = midgame(&db, &deck);
    let sources = ManaSources::from_database(&game).build();
    let cost: Mana = "1RR".parse().expect("valid mana");

    c.bench_function("plan_1rr", |b| {
        b.iter(|| plan(black_box(&game), black_box(&sources), black_box(cost)))
    });
}

fn benchmark_deck_parsing(c: &mut Criterion) {
    c.bench_function("parse_deck_file", |b| {
        b.iter(|| Deck::from_file(black_box("deck.txt")))
    });
}

criterion_group!(
    benches,
    benchmark_single_game,
    benchmark_multiple_games,
    benchmark_fork,
    benchmark_planner,
    benchmark_deck_parsing
);
criterion_main!(benches);
