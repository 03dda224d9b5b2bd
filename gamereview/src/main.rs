//! Command-line front-end: review a PGN file and stream the review events
//! as JSON lines on stdout.

use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use chess::PieceColor;
use engine::{EnginePool, EngineSettings};
use review::{
    extract_puzzles, review_game, solve_puzzles, GameRecord, RecordedMove, ReviewConfig,
    ReviewEvent, ReviewOptions,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Color {
    White,
    Black,
}

impl From<Color> for PieceColor {
    fn from(c: Color) -> Self {
        match c {
            Color::White => PieceColor::White,
            Color::Black => PieceColor::Black,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "gamereview", about = "Engine-driven chess game review")]
struct Args {
    /// PGN file containing one game.
    pgn: PathBuf,

    /// Which side the reviewed player had.
    #[arg(long, value_enum, default_value_t = Color::White)]
    color: Color,

    /// Fixed analysis depth (otherwise progressive).
    #[arg(long)]
    depth: Option<u32>,

    /// Also extract puzzles and generate their solutions.
    #[arg(long)]
    puzzles: bool,

    /// Player rating, used for puzzle rating assignment.
    #[arg(long)]
    rating: Option<u32>,

    /// Print the engine pool status after the review.
    #[arg(long)]
    status: bool,
}

fn emit(event: &ReviewEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::error!("Failed to serialise event: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let text = std::fs::read_to_string(&args.pgn)
        .with_context(|| format!("reading {}", args.pgn.display()))?;
    let parsed = chess::parse_pgn(&text).context("parsing PGN")?;
    let replayed = chess::replay(&parsed).context("replaying moves")?;

    let mut game = GameRecord::new(
        parsed.start_fen(),
        replayed.into_iter().map(RecordedMove::from).collect(),
    );
    game.winner = parsed.winner();
    game.opening = parsed.tags.get("Opening").cloned().or_else(|| {
        // Fall back to the last theory position the game passed through.
        game.moves
            .iter()
            .rev()
            .find_map(|m| review::book::opening_name(&m.fen_after))
            .map(str::to_string)
    });
    game.rating = args.rating;

    let config = ReviewConfig::from_env();
    let settings = EngineSettings::from_env();
    tracing::info!(engine = %settings.engine_path, workers = settings.pool_size, "Starting engine pool");
    let pool = EnginePool::new(settings).await.context("starting engine pool")?;

    // Callbacks run on the driver task; forward events through a channel so
    // stdout writing stays out of the analysis path.
    let (event_tx, event_rx) = mpsc::channel::<ReviewEvent>();
    let printer = std::thread::spawn(move || {
        for event in event_rx {
            emit(&event);
        }
    });

    let progress_tx = event_tx.clone();
    let move_tx = event_tx.clone();
    let options = ReviewOptions {
        depth: args.depth,
        on_progress: Some(Box::new(move |current, total| {
            let percentage = if total == 0 {
                100.0
            } else {
                current as f64 * 100.0 / total as f64
            };
            progress_tx
                .send(ReviewEvent::Progress {
                    current_move: current,
                    total_moves: total,
                    percentage,
                })
                .map_err(|_| review::Cancelled)
        })),
        on_move: Some(Box::new(move |report| {
            move_tx
                .send(ReviewEvent::Move(report.clone()))
                .map_err(|_| review::Cancelled)
        })),
    };

    let outcome = review_game(&pool, &game, &config, options).await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            event_tx
                .send(ReviewEvent::Error {
                    message: e.to_string(),
                    code: Some(e.code().to_string()),
                })
                .ok();
            drop(event_tx);
            let _ = printer.join();
            pool.dispose().await;
            return Err(e.into());
        }
    };

    event_tx
        .send(ReviewEvent::Complete {
            review_id: uuid::Uuid::new_v4().to_string(),
            accuracy: result.accuracy,
            summary: result.summary,
            total_moves: result.total_moves,
        })
        .ok();
    drop(event_tx);
    let _ = printer.join();

    println!("{}", serde_json::to_string_pretty(&result)?);

    if args.puzzles {
        let candidates = extract_puzzles(
            &result,
            args.color.into(),
            game.opening.as_deref(),
            game.rating,
            &config,
        );
        tracing::info!(
            mistakes = candidates.mistakes.len(),
            missed = candidates.missed_tactics.len(),
            positive = candidates.brilliancies.len(),
            "Extracted puzzle candidates"
        );
        let puzzles = solve_puzzles(&pool, candidates, &config).await;
        println!("{}", serde_json::to_string_pretty(&puzzles)?);
    }

    if args.status {
        let status = pool.status();
        tracing::info!(
            workers = status.worker_count,
            active = status.active_analyses,
            queued = status.queue_length,
            "Pool status"
        );
    }

    pool.dispose().await;
    Ok(())
}
