//! Play command - drive a board through a script
//!
//! A script is one command per line; `#` starts a comment.
//!
//! ```text
//! touch 1 3        primary touch on a cell
//! alt 1 3          secondary touch
//! hover 2 2        hover a cell
//! unhover          clear the hover
//! choose move      pick the active piece's movement (as the action bar would)
//! choose 0         pick the active piece's first ability
//! spawn trooper enemy 4 4
//! dispose 4 4      remove the piece on a cell
//! show             print the board
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;

use hexfront_core::{
    Board, BoardState, EventBus, EventKind, Faction, GameError, GameEvent, Hex, InteractionId, Scenario,
};

use crate::render::{render_board, style_label, LEGEND};

#[derive(Args)]
pub struct PlayArgs {
    /// Scenario JSON file (defaults to the demo skirmish)
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Script file, one command per line
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Inline command, may be repeated; runs after the script
    #[arg(short = 'c', long = "command")]
    pub commands: Vec<String>,

    /// Print the board after every command
    #[arg(long)]
    pub render: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Touch(Hex),
    AltTouch(Hex),
    Hover(Hex),
    Unhover,
    Choose(InteractionId),
    Spawn { unit: String, faction: Faction, position: Hex },
    Dispose(Hex),
    Show,
}

impl Command {
    /// Parse one script line. Blank lines and comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.split('#').next().unwrap_or_default().trim();
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, rest)) = words.split_first() else {
            return Ok(None);
        };

        let command = match (verb, rest) {
            ("touch", [x, y]) => Command::Touch(parse_hex(x, y)?),
            ("alt", [x, y]) => Command::AltTouch(parse_hex(x, y)?),
            ("hover", [x, y]) => Command::Hover(parse_hex(x, y)?),
            ("unhover", []) => Command::Unhover,
            ("choose", ["move"]) => Command::Choose(InteractionId::Movement),
            ("choose", [index]) => Command::Choose(InteractionId::Ability(
                index.parse().with_context(|| format!("Bad ability index: {}", index))?,
            )),
            ("spawn", [unit, faction, x, y]) => Command::Spawn {
                unit: unit.to_string(),
                faction: Faction::new(*faction),
                position: parse_hex(x, y)?,
            },
            ("dispose", [x, y]) => Command::Dispose(parse_hex(x, y)?),
            ("show", []) => Command::Show,
            _ => bail!("Unrecognized command: {}", line),
        };
        Ok(Some(command))
    }
}

fn parse_hex(x: &str, y: &str) -> Result<Hex> {
    let x = x.parse().with_context(|| format!("Bad column: {}", x))?;
    let y = y.parse().with_context(|| format!("Bad row: {}", y))?;
    Ok(Hex::new(x, y))
}

pub fn parse_script(text: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if let Some(command) = Command::parse(line).with_context(|| format!("Line {}", number + 1))? {
            commands.push(command);
        }
    }
    Ok(commands)
}

pub fn run(args: PlayArgs) -> Result<()> {
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path).with_context(|| format!("Failed to load {}", path.display()))?,
        None => Scenario::default(),
    };

    let mut commands = match &args.script {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
            parse_script(&text)?
        }
        None => Vec::new(),
    };
    for line in &args.commands {
        commands.extend(Command::parse(line)?);
    }

    let bus = EventBus::new();
    bus.subscribe_multiple(&EventKind::ALL, |event| {
        tracing::info!("event: {}", describe(event));
        Ok(())
    });

    let mut board = Board::from_scenario(bus, &scenario)?;
    tracing::info!("Scenario '{}': {} commands", scenario.name, commands.len());

    for command in &commands {
        execute(&mut board, command)?;
        if args.render {
            print!("{}", render_board(&board));
        }
    }

    print!("{}", render_board(&board));
    println!("{}", LEGEND);
    println!("{}", status(&board));
    board.dispose()?;
    Ok(())
}

/// Apply one command. Touches off the board are reported and skipped.
pub fn execute(board: &mut Board, command: &Command) -> Result<()> {
    let result = match command {
        Command::Touch(hex) => board.touch_cell(*hex),
        Command::AltTouch(hex) => board.secondary_touch(*hex),
        Command::Hover(hex) => {
            board.hover_cell(*hex);
            Ok(())
        }
        Command::Unhover => {
            board.clear_hover();
            Ok(())
        }
        Command::Choose(interaction) => {
            let piece = board
                .active_piece()
                .map(|p| p.id)
                .ok_or_else(|| anyhow!("choose needs an active piece"))?;
            let bus = board.bus().clone();
            bus.publish(&GameEvent::InteractionButtonClicked {
                piece,
                interaction: *interaction,
            })
            .and_then(|_| board.pump())
        }
        Command::Spawn { unit, faction, position } => {
            let bus = board.bus().clone();
            bus.publish(&GameEvent::SpawnRequested {
                unit: unit.clone(),
                faction: faction.clone(),
                position: *position,
            })
            .and_then(|_| board.pump())
        }
        Command::Dispose(hex) => match board.piece_at(*hex).map(|p| p.id) {
            Some(id) => board.dispose_piece(id).map(|_| ()),
            None => Ok(()),
        },
        Command::Show => {
            print!("{}", render_board(board));
            println!("{}", status(board));
            Ok(())
        }
    };

    match result {
        Err(GameError::CellNotFound(hex)) => {
            tracing::warn!("{:?}: no cell at {}", command, hex);
            Ok(())
        }
        other => other.with_context(|| format!("{:?} failed", command)),
    }
}

/// One-line summary of the selection state
pub fn status(board: &Board) -> String {
    let selection = match board.state() {
        BoardState::Idle => "idle".to_string(),
        BoardState::CellActive => match board.active_piece() {
            Some(piece) => format!("{} selected", piece.id),
            None => "cell selected".to_string(),
        },
        BoardState::AwaitingTarget => {
            let style = board.highlight().map_or("no range", |h| style_label(h.style));
            let interaction = board
                .pending_interaction()
                .map_or_else(String::new, |i| i.to_string());
            format!("awaiting target for {} ({})", interaction, style)
        }
    };
    format!("{} pieces, {}", board.piece_count(), selection)
}

fn describe(event: &GameEvent) -> String {
    match event {
        GameEvent::NavGraphChanged { graph } => {
            format!("NavGraphChanged {{ points: {}, edges: {} }}", graph.point_count(), graph.edge_count())
        }
        GameEvent::GroundCellsChanged { cells } => format!("GroundCellsChanged {{ cells: {} }}", cells.len()),
        other => format!("{:?}", other),
    }
}
