// SPDX-License-Identifier: MIT OR Apache-2.0
//! `blockwire` - command line front end for Blockwire graph files.
//!
//! Creates sample graphs, inspects saved graphs and replays scripted
//! gestures through the interaction controller.

mod script;

use anyhow::Context;
use blockwire_graph::settings::SETTINGS_FILE_NAME;
use blockwire_graph::{Block, EditorSettings, Graph, NodesEditor};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "blockwire", version, about = "Inspect and edit Blockwire graph files")]
struct Cli {
    /// Editor settings file (RON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a small sample graph
    Demo {
        /// Output file
        out: PathBuf,
    },
    /// List every port of every block
    Inspect {
        /// Graph file
        file: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print block, port and connection counts
    Stats {
        /// Graph file
        file: PathBuf,
    },
    /// Apply a gesture script to a graph
    Replay {
        /// Graph file
        file: PathBuf,
        /// RON gesture script
        script: PathBuf,
        /// Where to write the result (defaults to the input file)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// B1(in, out) and B2(x) joined by B1.out -> B2.x
pub(crate) fn demo_graph() -> Graph {
    let mut graph = Graph::new();
    let b1 = graph.add_block(Block::new("B1").with_input("in").with_output("out"));
    let b2 = graph.add_block(Block::new("B2").with_position(300.0, 0.0).with_input("x"));
    let out = graph.block(b1).and_then(|b| b.port_named("out")).map(|p| p.id);
    let x = graph.block(b2).and_then(|b| b.port_named("x")).map(|p| p.id);
    if let (Some(out), Some(x)) = (out, x) {
        if let Err(err) = graph.connect(out, x) {
            tracing::warn!(error = %err, "demo connection rejected");
        }
    }
    graph
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<EditorSettings> {
    match path {
        Some(path) => EditorSettings::load(path)
            .with_context(|| format!("reading settings {}", path.display())),
        None if Path::new(SETTINGS_FILE_NAME).exists() => {
            EditorSettings::load(Path::new(SETTINGS_FILE_NAME))
                .with_context(|| format!("reading settings {SETTINGS_FILE_NAME}"))
        }
        None => Ok(EditorSettings::default()),
    }
}

fn open_editor(settings: EditorSettings, file: &Path) -> anyhow::Result<NodesEditor> {
    let mut editor = NodesEditor::with_settings(settings).context("invalid editor settings")?;
    let reader = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    editor
        .load(BufReader::new(reader))
        .with_context(|| format!("loading graph {}", file.display()))?;
    Ok(editor)
}

fn write_graph(graph: &Graph, file: &Path) -> anyhow::Result<()> {
    let out = File::create(file).with_context(|| format!("creating {}", file.display()))?;
    let mut writer = BufWriter::new(out);
    graph
        .save(&mut writer)
        .with_context(|| format!("saving graph {}", file.display()))?;
    writer.flush()?;
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Demo { out } => {
            write_graph(&demo_graph(), &out)?;
            tracing::info!(path = %out.display(), "wrote demo graph");
        }
        Command::Inspect { file, json } => {
            let editor = open_editor(settings, &file)?;
            let report = editor.execute();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
        Command::Stats { file } => {
            let editor = open_editor(settings, &file)?;
            let graph = editor.graph();
            println!("blocks:      {}", graph.block_count());
            println!("ports:       {}", graph.port_count());
            println!("connections: {}", graph.connection_count());
        }
        Command::Replay { file, script: script_path, out } => {
            let mut editor = open_editor(settings, &file)?;
            let text = std::fs::read_to_string(&script_path)
                .with_context(|| format!("reading script {}", script_path.display()))?;
            let steps = script::parse(&text)
                .with_context(|| format!("parsing script {}", script_path.display()))?;
            script::replay(&mut editor, &steps);
            let target = out.unwrap_or(file);
            write_graph(editor.graph(), &target)?;
            tracing::info!(
                steps = steps.len(),
                blocks = editor.graph().block_count(),
                connections = editor.graph().connection_count(),
                "replayed script"
            );
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("blockwire_graph=info".parse()?)
        .add_directive("blockwire_cli=info".parse()?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse())
}
