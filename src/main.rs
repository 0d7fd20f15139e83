//! Vault Guardian entry point
//!
//! Natively this is a headless demo runner: the autopilot plays a number of
//! games on a simulated 60 fps clock, every game is recorded on the
//! leaderboard, and the board is printed at the end.
//!
//! ```text
//! vault-guardian [--config PATH] [--games COUNT] [--seed SEED] [--full]
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod runner {
    use clap::Parser;
    use vault_guardian::highscores::format_age;
    use vault_guardian::platform;
    use vault_guardian::sim::{
        GameEvent, GamePhase, Simulation, Viewport, autopilot_activation, autopilot_input,
    };
    use vault_guardian::{GameConfig, HighScores};

    const FRAME_DT: f64 = 1.0 / 60.0;
    const VIEWPORT_WIDTH: f32 = 1280.0;
    const VIEWPORT_HEIGHT: f32 = 720.0;
    const BOT_INITIALS: &str = "BOT";

    /// Headless demo runner: the autopilot plays games and fills the leaderboard
    #[derive(Debug, Parser)]
    #[command(author, version, about, long_about = None)]
    pub struct Options {
        /// Game configuration document (JSON); the embedded defaults otherwise
        #[arg(long, value_name = "PATH")]
        pub config: Option<String>,
        /// Number of games to play
        #[arg(long, value_name = "COUNT", default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
        pub games: u32,
        /// Seed for the gameplay rng
        #[arg(long, default_value_t = 0x5eed)]
        pub seed: u64,
        /// Use full-length waves instead of the demo timings
        #[arg(long)]
        pub full: bool,
    }

    pub fn run(opts: &Options) {
        let config = match &opts.config {
            Some(path) => GameConfig::load_path_or_default(path),
            None => GameConfig::default(),
        };
        // Every game ends by the clock at the latest
        let max_sim_seconds = (config.duration_seconds as f64 + 60.0) * opts.games as f64;

        let mut board = HighScores::load(config.leaderboard_size);
        let viewport = Viewport::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT);
        let mut sim = Simulation::new(config, viewport, opts.seed).with_demo(!opts.full);
        log::info!(
            "Running {} game(s), seed {}, {} timings",
            opts.games,
            opts.seed,
            if sim.is_demo() { "demo" } else { "full" }
        );

        let mut now = 0.0;
        let mut finished = 0;
        while finished < opts.games {
            now += FRAME_DT;
            if now > max_sim_seconds {
                log::warn!("Stopping after {:.0}s of simulated time", now);
                break;
            }

            match sim.phase() {
                GamePhase::Attract => sim.start(now),
                GamePhase::Paused => sim.dismiss_popup(now),
                GamePhase::Summary => {
                    if sim.awaiting_initials() {
                        sim.submit_initials(BOT_INITIALS, now);
                    } else {
                        sim.restart();
                    }
                }
                GamePhase::Playing => {
                    if let Some(kind) = autopilot_activation(&sim) {
                        if let Err(e) = sim.activate(kind) {
                            log::debug!("Autopilot activation refused: {e}");
                        }
                    }
                }
            }

            let input = autopilot_input(&sim, now);
            sim.frame(&input, now);

            for event in sim.drain_events() {
                match event {
                    GameEvent::Sound(cue) => log::trace!("Sound: {}", cue.name()),
                    GameEvent::GameOver(summary) => {
                        log::info!(
                            "Game {} over: {} with {} points ({}), {} kills, integrity {}/{}",
                            finished + 1,
                            if summary.survived { "survived" } else { "breached" },
                            summary.score,
                            summary.rank,
                            summary.kills,
                            summary.integrity,
                            summary.max_integrity
                        );
                    }
                    GameEvent::ScoreRecorded(record) => {
                        match board.add_entry(&record) {
                            Some(rank) => log::info!("Leaderboard position #{rank}"),
                            None => log::info!("Did not make the leaderboard"),
                        }
                        finished += 1;
                    }
                    other => log::debug!("{other:?}"),
                }
            }
        }

        board.save();
        print_board(&board);
    }

    fn print_board(board: &HighScores) {
        let now = platform::unix_time_ms();
        println!("\n=== Leaderboard ===");
        if board.is_empty() {
            println!("No scores yet.");
            return;
        }
        if let Some(best) = board.top_score() {
            println!("Best: {best}");
        }
        for (i, e) in board.all_time().iter().enumerate() {
            println!(
                "{:>2}. {:<3} {:>6}  {:<22} {}",
                i + 1,
                e.initials,
                e.score,
                e.rank,
                format_age(e.timestamp, now)
            );
        }
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    vault_guardian::platform::init_logging();
    log::info!("Vault Guardian (native demo runner) starting...");

    let opts = runner::Options::parse();
    runner::run(&opts);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser shell drives `Simulation` directly through the library
}
