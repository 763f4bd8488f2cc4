//! Headless catching-game simulation
//!
//! Plays the mini-game against an in-memory field with a fake clock and an
//! auto-steering pointer that chases the lowest falling object. Useful for
//! checking game tuning (goal, speed, field size) without a browser.
//!
//! Optionally hides the page mid-game to exercise auto-pause and resume.
//!
//! Usage:
//!   cargo run --bin catch_sim -- --seed 7 --width 360 --height 480
//!   cargo run --bin catch_sim -- --hide-at-ms 5000 --hide-for-ms 3000

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tracing::info;
use valentine_relay::game::{
    Controller, GameConfig, GameEngine, GameStatus, HeadlessField, PointerEvent, RevealStage,
    Visibility,
};
use valentine_relay::infra::init_logging;

#[derive(Parser, Debug)]
#[command(name = "catch_sim")]
#[command(about = "Headless simulation of the catching mini-game")]
struct Args {
    /// RNG seed for spawn positions
    #[arg(long, default_value = "7")]
    seed: u64,

    /// Objects to catch
    #[arg(long, default_value = "15")]
    goal: u32,

    /// Play-field width (px)
    #[arg(long, default_value = "360")]
    width: f64,

    /// Play-field height (px)
    #[arg(long, default_value = "480")]
    height: f64,

    /// Redraw period (ms)
    #[arg(long, default_value = "16")]
    frame_ms: u64,

    /// Give up after this much simulated time (s)
    #[arg(long, default_value = "300")]
    max_secs: u64,

    /// Catcher speed limit per frame (px); 0 = teleport to target
    #[arg(long, default_value = "6")]
    max_step: f64,

    /// Hide the page at this simulated time (ms)
    #[arg(long)]
    hide_at_ms: Option<u64>,

    /// How long the page stays hidden (ms)
    #[arg(long, default_value = "2000")]
    hide_for_ms: u64,
}

/// Pointer x that puts the catcher's centre under the lowest object
fn steer_target(engine: &GameEngine<HeadlessField>) -> Option<f64> {
    let size = engine.config().object_size;
    engine
        .state()
        .active_objects
        .iter()
        .max_by(|a, b| a.y.total_cmp(&b.y))
        .map(|object| object.x + size / 2.0)
}

fn main() {
    init_logging();
    let args = Args::parse();

    let config = GameConfig { goal: args.goal, ..GameConfig::default() };
    let catcher_width = config.catcher_width;
    let mut controller = Controller::new(&config);
    let mut engine = GameEngine::new(
        config,
        Some(HeadlessField::new(args.width, args.height)),
        StdRng::seed_from_u64(args.seed),
    );

    let frame = Duration::from_millis(args.frame_ms.max(1));
    let limit = Duration::from_secs(args.max_secs);
    let hide_at = args.hide_at_ms.map(Duration::from_millis);
    let show_at = hide_at.map(|at| at + Duration::from_millis(args.hide_for_ms));

    let mut now = Duration::ZERO;
    let (mut spawned, mut caught, mut missed) = (0u32, 0u32, 0u32);
    let mut won_at = None;

    controller.on_start_clicked(&mut engine, now);

    while now < limit {
        now += frame;

        if hide_at.is_some_and(|at| now >= at) && show_at.is_some_and(|at| now < at) {
            controller.on_visibility(&mut engine, Visibility::Hidden, now);
        } else if show_at.is_some_and(|at| now >= at) && controller.is_auto_paused() {
            controller.on_visibility(&mut engine, Visibility::Visible, now);
        }

        if let Some(target) = steer_target(&engine) {
            let current = engine.state().catcher_x + catcher_width / 2.0;
            let step = target - current;
            let pointer_x = if args.max_step > 0.0 {
                current + step.clamp(-args.max_step, args.max_step)
            } else {
                target
            };
            controller.on_pointer(&mut engine, &PointerEvent::Mouse { client_x: pointer_x });
        }

        let report = controller.tick(&mut engine, now);
        spawned += report.spawned;
        caught += report.caught;
        missed += report.missed;

        if report.won {
            won_at = Some(now);
        }
        if won_at.is_some() && controller.reveal_stage() == RevealStage::Envelope {
            controller.on_envelope_clicked(&mut engine, now);
        }
        if controller.reveal_stage() == RevealStage::ReasonsAvailable {
            break;
        }
    }

    info!(
        status = %engine.status().as_str(),
        score = %engine.score(),
        spawned = %spawned,
        caught = %caught,
        missed = %missed,
        simulated_ms = %now.as_millis(),
        "simulation_finished"
    );

    println!();
    println!("Seed:       {}", args.seed);
    println!("Field:      {}x{}", args.width, args.height);
    println!("Status:     {}", engine.status().as_str());
    println!("Score:      {}/{}", engine.score(), args.goal);
    println!("Spawned:    {}", spawned);
    println!("Caught:     {}", caught);
    println!("Missed:     {}", missed);
    match won_at {
        Some(at) => println!("Won after:  {:.1}s", at.as_secs_f64()),
        None => println!("Won after:  - (gave up after {}s)", args.max_secs),
    }
    println!("Reveal:     {:?}", controller.reveal_stage());

    if engine.status() != GameStatus::Won {
        std::process::exit(1);
    }
}
