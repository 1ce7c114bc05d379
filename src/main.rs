//! Village Economy - headless runner
//!
//! Loads a layout (or the built-in village), spawns villagers and customers,
//! runs the simulation and prints what happened.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use village_economy::core::error::Result;
use village_economy::core::types::{EntityId, Vec2};
use village_economy::core::SimulationConfig;
use village_economy::ecs::store::ComponentKind;
use village_economy::ecs::World;
use village_economy::goods::Item;
use village_economy::ledger::TransferRecord;
use village_economy::roles::RoleRegistry;
use village_economy::simulation::{run_simulation_tick, SimulationEvent};
use village_economy::tiles::parse_layout;
use village_economy::view::{agent_view, AgentView};

const DEFAULT_LAYOUT: &str = "\
~~~~~~..............
~~~~~~..F...F.......
~~~~~~..............
....................
..P..P....O.....H...
....................
..<table:fish>..<table:potato>....W.........
....................
..#######...........
..#=_=_=#..<register:fish>.<register:meal>.<register:potato>....
..#b___t#...........
..###+###...........
";

/// Headless village economy runner
#[derive(Parser, Debug)]
#[command(name = "village-economy")]
#[command(about = "Run the village economy headless and report the outcome")]
struct Args {
    /// ASCII layout file (defaults to the built-in village)
    #[arg(long)]
    layout: Option<PathBuf>,

    /// TOML config file; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 3000)]
    ticks: u64,

    /// Unassigned villagers looking for work
    #[arg(long, default_value_t = 10)]
    villagers: usize,

    /// Customers buying fish and meals
    #[arg(long, default_value_t = 3)]
    consumers: usize,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    household_money: i64,
    reputation: i64,
    claimed_nodes: usize,
    deliveries: usize,
    purchases: usize,
    spoiled: usize,
    constructions: usize,
    agents: Vec<AgentView>,
    recent_transfers: Vec<TransferRecord>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("village_economy=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    let source = match &args.layout {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_LAYOUT.to_string(),
    };
    let layout = parse_layout(&source)?;

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut world = World::from_layout(layout, config);
    world.spawn_household();
    populate(&mut world, &mut rng, args.villagers, args.consumers);

    tracing::info!(
        seed,
        rows = world.grid.rows,
        cols = world.grid.cols,
        agents = world.store.len(),
        "village ready"
    );

    let roles = RoleRegistry::standard();
    let mut events = Vec::new();
    for _ in 0..args.ticks {
        events.extend(run_simulation_tick(&mut world, &roles));
    }

    let summary = summarize(&world, &events, seed, args.ticks);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn random_point(world: &World, rng: &mut ChaCha8Rng) -> Vec2 {
    let width = world.grid.cols as f32 * world.grid.tile_size;
    let height = world.grid.rows as f32 * world.grid.tile_size;
    Vec2::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height))
}

fn populate(world: &mut World, rng: &mut ChaCha8Rng, villagers: usize, consumers: usize) {
    for _ in 0..villagers {
        let pos = random_point(world, rng);
        world.spawn_villager(pos);
    }
    for _ in 0..consumers {
        let home = random_point(world, rng);
        let good = if rng.gen_bool(0.5) { Item::Fish } else { Item::Meal };
        let price = rng.gen_range(8..=25);
        let money = rng.gen_range(50..=150);
        world.spawn_consumer(home, good, price, money);
    }
}

fn summarize(world: &World, events: &[SimulationEvent], seed: u64, ticks: u64) -> RunSummary {
    let count = |pred: fn(&SimulationEvent) -> bool| events.iter().filter(|e| pred(e)).count();

    let mut agents: Vec<AgentView> = world
        .store
        .query(&[ComponentKind::Position])
        .into_iter()
        .filter_map(|id: EntityId| agent_view(world, id).ok())
        .collect();
    agents.sort_by_key(|a| a.id);

    RunSummary {
        seed,
        ticks,
        household_money: world.household().map_or(0, |h| world.money(h)),
        reputation: world.reputation,
        claimed_nodes: count(|e| matches!(e, SimulationEvent::NodeClaimed { .. })),
        deliveries: count(|e| matches!(e, SimulationEvent::Delivered { .. })),
        purchases: count(|e| matches!(e, SimulationEvent::Purchased { .. })),
        spoiled: count(|e| matches!(e, SimulationEvent::Spoiled { .. })),
        constructions: count(|e| matches!(e, SimulationEvent::ConstructionCompleted { .. })),
        agents,
        recent_transfers: world.ledger.history().copied().collect(),
    }
}

fn print_summary(summary: &RunSummary) {
    println!("\n=== VILLAGE ECONOMY ===");
    println!("Seed: {}  Ticks: {}", summary.seed, summary.ticks);
    println!("Household money: {}", summary.household_money);
    println!("Reputation: {}", summary.reputation);
    println!(
        "Nodes claimed: {}  Deliveries: {}  Purchases: {}  Spoiled: {}  Built: {}",
        summary.claimed_nodes, summary.deliveries, summary.purchases, summary.spoiled, summary.constructions
    );
    println!("\nAgents:");
    for agent in &summary.agents {
        let wage = agent.wage.map_or(String::new(), |w| format!(" wage {w}"));
        let satisfaction = agent
            .satisfaction
            .map_or(String::new(), |s| format!(" satisfaction {s}"));
        println!(
            "  {:>4} {:<14} money {:>5}{}{}",
            agent.id.to_string(),
            agent.role,
            agent.money,
            wage,
            satisfaction
        );
    }
}
