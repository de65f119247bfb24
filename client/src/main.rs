use clap::Parser;
use client::game::Commander;
use client::network::GameClient;
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{GameState, Position, Unit};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:20000")]
    server: String,

    /// Number of units in the generated roster
    #[arg(short = 'u', long, default_value = "3")]
    units: usize,

    /// Status polling interval in milliseconds
    #[arg(short = 'p', long, default_value = "1000")]
    poll_ms: u64,
}

const BOARD_SIZE: i32 = 16;

/// Builds a roster on distinct random tiles.
fn random_roster<R: Rng>(rng: &mut R, count: usize) -> Vec<Unit> {
    let count = count.min((BOARD_SIZE * BOARD_SIZE) as usize);
    let mut taken = HashSet::new();
    let mut units = Vec::with_capacity(count);

    while units.len() < count {
        let position = Position::new(rng.gen_range(0..BOARD_SIZE), rng.gen_range(0..BOARD_SIZE));
        if !taken.insert(position) {
            continue;
        }
        let minreach = rng.gen_range(0..=1);
        units.push(
            Unit::at(position.x, position.y)
                .with_hp(10)
                .with_speed(rng.gen_range(2..=5))
                .with_reach(minreach, minreach + rng.gen_range(1..=3)),
        );
    }

    units
}

fn log_status(state: &GameState) {
    let turn = state
        .turn
        .map_or_else(|| "nobody".to_string(), |uid| uid.to_string());
    info!("Turn: {} | players: {}", turn, state.players.len());
    for player in &state.players {
        let positions: Vec<String> = player
            .units
            .iter()
            .map(|u| format!("({}, {})", u.x, u.y))
            .collect();
        info!("  player {}: {}", player.uid, positions.join(" "));
    }
}

/// Plays one turn: tries a random step with a random unit, then finishes.
async fn take_turn<R: Rng>(
    rng: &mut R,
    client: &mut GameClient,
    commander: &mut Commander,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = commander
        .own_units()
        .choose(rng)
        .map(|unit| (unit.position(), unit.speed as i32));

    if let Some((from, speed)) = start {
        commander.select_unit(from.x, from.y)?;
        let x = from.x + rng.gen_range(-speed..=speed);
        let y = from.y + rng.gen_range(-speed..=speed);
        match commander.plan_move(x, y) {
            Ok(order) => {
                info!("Moving ({}, {}) to ({}, {})", from.x, from.y, x, y);
                client.submit(&order).await?;
            }
            Err(e) => info!("Skipping move to ({}, {}): {}", x, y, e),
        }
    }

    client.submit(&commander.plan_finish()).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut rng = rand::thread_rng();

    info!("Connecting to: {}", args.server);
    let mut client = GameClient::connect(&args.server).await?;
    let mut commander = Commander::new();

    let uid = client.register(Some(random_roster(&mut rng, args.units))).await?;
    commander.set_uid(uid);
    info!("Registered as player {}", uid);

    let mut interval = tokio::time::interval(Duration::from_millis(args.poll_ms.max(1)));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let state = client.status().await?;
                log_status(&state);
                commander.apply_status(state);

                if commander.is_my_turn() {
                    info!("Your turn");
                    if let Err(e) = take_turn(&mut rng, &mut client, &mut commander).await {
                        warn!("Turn failed: {}", e);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, leaving the game");
                break;
            }
        }
    }

    client.quit().await?;
    Ok(())
}
