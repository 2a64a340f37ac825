use anyhow::{bail, Context, Result};
use chess_analysis::{format_report, GameAnalyzer};
use chess_core::Color;
use chess_rules::{apply_move, build_san, check_suffix, status, BoardState, Game};
use chess_session::{
    format_captures, write_pgn, Session, SessionConfig, SessionError, SessionEvent,
};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chess-review")]
#[command(about = "Play against a UCI engine and review the game move by move")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game on the terminal
    Play {
        /// Start from this position instead of the standard one
        #[arg(long)]
        fen: Option<String>,
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Analyze a game given as UCI moves from the start position
    Analyze {
        /// Moves, e.g. e2e4 e7e5 g1f3
        moves: Vec<String>,
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the legal moves of a position
    Legal {
        #[arg(long)]
        fen: Option<String>,
    },
}

/// How long `play` waits for an engine move before prompting again.
const ENGINE_WAIT: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Play { fen, config } => play(load_config(config.as_deref())?, fen.as_deref()),
        Commands::Analyze {
            moves,
            config,
            json,
        } => analyze(&load_config(config.as_deref())?, &moves, json),
        Commands::Legal { fen } => legal(fen.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let config = match path {
        Some(path) => SessionConfig::load_from(path),
        None => SessionConfig::load(),
    };
    config.context("loading configuration")
}

fn play(config: SessionConfig, fen: Option<&str>) -> Result<()> {
    let mut session = Session::launch(config)?;
    if let Some(fen) = fen {
        session.load_fen(fen)?;
    }
    print_events(&session);
    print_prompt(&session)?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        match input.split_once(' ').unwrap_or((input, "")) {
            ("", _) => {}
            ("quit", _) => break,
            ("resign", _) => {
                let side = session
                    .human_side()
                    .unwrap_or_else(|| session.game().side_to_move());
                if let Err(e) = session.resign(side) {
                    println!("{}", e);
                }
            }
            ("fen", _) => println!("{}", session.game().board().to_fen()),
            ("pgn", path) if !path.is_empty() => {
                write_pgn(path, session.game(), session.engine_side())
                    .with_context(|| format!("writing {}", path))?;
                println!("Saved {}", path);
            }
            ("new", _) => session.new_game()?,
            ("analyze", _) => match analyze_in_play(&mut session) {
                Ok(report) => {
                    print_events(&session);
                    for line in report {
                        println!("{}", line);
                    }
                }
                Err(e) => println!("{}", e),
            },
            (mv, _) => {
                if let Err(e) = session.play_uci(mv) {
                    println!("{}", e);
                }
            }
        }
        print_events(&session);

        if session.is_engine_thinking() && session.wait_for_engine(ENGINE_WAIT) {
            print_events(&session);
        }
        session.poll();
        print_events(&session);
        print_prompt(&session)?;
    }

    session.shutdown();
    Ok(())
}

/// Analyze the live game, collect the report and return to live play.
/// A failed run leaves the session live and yields an empty report; the
/// failure itself arrives as an event.
fn analyze_in_play(session: &mut Session) -> Result<Vec<String>, SessionError> {
    session.start_analysis()?;
    session.wait_for_analysis();
    let report = session
        .review()
        .map(|review| format_report(review.analysis()))
        .unwrap_or_default();
    if session.is_reviewing() {
        session.exit_review()?;
    }
    Ok(report)
}

fn print_prompt(session: &Session) -> Result<()> {
    let game = session.game();
    if game.is_over() {
        print!("[game over] > ");
    } else {
        let clock = session.clock();
        print!(
            "[{} {} | {} {}] {} to move > ",
            Color::White,
            clock.display(Color::White),
            Color::Black,
            clock.display(Color::Black),
            game.side_to_move()
        );
    }
    io::stdout().flush()?;
    Ok(())
}

fn print_events(session: &Session) {
    for event in session.drain_events() {
        match event {
            SessionEvent::MoveApplied {
                display,
                by_engine,
                captured_by_white,
                captured_by_black,
                material,
                ..
            } => {
                let who = if by_engine { "engine" } else { "you" };
                println!("{} ({})", display, who);
                println!(
                    "  captures: White {} | Black {} | {}",
                    format_captures(&captured_by_white),
                    format_captures(&captured_by_black),
                    material
                );
            }
            SessionEvent::GameOver { tag, message, .. } => println!("{} ({})", message, tag),
            SessionEvent::EngineUnavailable { reason } => println!("Engine unavailable: {}", reason),
            SessionEvent::AnalysisStarted { plies } => println!("Analyzing {} moves...", plies),
            SessionEvent::AnalysisProgress { .. } => {}
            SessionEvent::AnalysisFinished { summary } => println!(
                "Analysis done: White {:.2}% | Black {:.2}%",
                summary.white_accuracy, summary.black_accuracy
            ),
            SessionEvent::AnalysisFailed { reason } => println!("Analysis failed: {}", reason),
        }
    }
}

fn analyze(config: &SessionConfig, moves: &[String], json: bool) -> Result<()> {
    let Some(engine_path) = config.engine_path.as_deref() else {
        bail!("no engine_path configured");
    };
    let analyzer = GameAnalyzer::launch(Some(engine_path), config.analysis_think_time())?
        .with_thresholds(config.thresholds);
    let analysis = analyzer.analyze_game(moves)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        for line in format_report(&analysis) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn legal(fen: Option<&str>) -> Result<()> {
    let game = match fen {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::new(),
    };
    let board: &BoardState = game.board();

    let sans: Vec<String> = game
        .legal_moves()
        .iter()
        .map(|mv| {
            let (after, _) = apply_move(board, mv);
            format!("{}{}", build_san(mv, board), check_suffix(&after))
        })
        .collect();

    println!("{}", board.to_fen());
    match status(board) {
        Some(result) => println!("{}", result.message()),
        None if game.is_check() => println!("{} to move, in check", board.side_to_move()),
        None => println!("{} to move", board.side_to_move()),
    }
    println!("{} legal moves: {}", sans.len(), sans.join(" "));
    Ok(())
}
