//! ScrumDesk CLI entry point

use anyhow::Result;
use clap::Parser;
use std::io;

use scrumdesk::config::Cli;
use scrumdesk::{Console, Dispatcher, Document, JsonBoardExporter, WindowEngine};

fn main() -> Result<()> {
    // stdout is the menu surface, so stay quiet unless asked
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    log::info!("ScrumDesk v{}", env!("CARGO_PKG_VERSION"));

    let mut doc = Document::load(&cli.data)?;
    let export_file = cli
        .export
        .clone()
        .unwrap_or_else(|| doc.parameters.export_file.clone());
    log::info!("Board exports go to {}", export_file.display());

    let dispatcher = Dispatcher::new(Box::new(JsonBoardExporter::new(export_file)));
    let mut engine = WindowEngine::new(dispatcher);

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    engine.run(&doc.windows, &mut doc.store, &mut console)?;

    doc.save(&cli.output_path())?;
    Ok(())
}
