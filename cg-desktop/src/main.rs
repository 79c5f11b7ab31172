mod config_gen;
mod setup;

use std::env;
use std::io::{self, BufRead, Stdout, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use cg_core::chapter::list_chapters;
use cg_core::config::SystemConfig;
use cg_core::renderer::driver::drive;
use cg_core::renderer::terminal::TerminalRenderer;
use cg_core::renderer::Renderer;
use cg_core::{Player, StageSnapshot};
use tokio::sync::mpsc;

const FRAME: Duration = Duration::from_millis(50);

const HELP: &str = "commands: <enter> skip | p pause | r resume | a auto | f fast-forward | l language | h hide | s show | q quit";

/// Writes each distinct snapshot as one JSON line, and nothing else.
struct JsonRenderer<W: Write = Stdout> {
    out: W,
    last: Option<StageSnapshot>,
}

impl JsonRenderer {
    fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonRenderer<W> {
    fn new(out: W) -> Self {
        Self { out, last: None }
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, snapshot: &StageSnapshot) {
        if self.last.as_ref() == Some(snapshot) {
            return;
        }
        let written = serde_json::to_writer(&mut self.out, snapshot)
            .map_err(io::Error::from)
            .and_then(|_| writeln!(self.out));
        if let Err(e) = written {
            log::warn!("snapshot output failed: {}", e);
        }
        self.last = Some(snapshot.clone());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");

    setup::init(json);
    log::info!(">>> CG Player Started (json: {}) <<<", json);

    let sys_cfg: SystemConfig = cg_shared::config::get("system");
    let chapter = match args.iter().find(|a| !a.starts_with("--")) {
        Some(id) => id.clone(),
        None => {
            let ids = list_chapters(&sys_cfg.chapters_path);
            log::info!("Chapters found in {}: {:?}", sys_cfg.chapters_path, ids);
            ids.into_iter()
                .next()
                .with_context(|| format!("no chapter under '{}'", sys_cfg.chapters_path))?
        }
    };

    let player = Player::from_config();
    player
        .initialize(&chapter)
        .await
        .with_context(|| format!("failed to load chapter '{}'", chapter))?;

    let session = player.play()?;
    // stdout 只留给渲染输出，--json 时每行都必须是 JSON
    eprintln!("{HELP}");
    let input = tokio::spawn(handle_commands(player.clone(), read_stdin()));

    let result = if json {
        drive(&player, session, &mut JsonRenderer::stdout(), FRAME).await
    } else {
        drive(&player, session, &mut TerminalRenderer::stdout(), FRAME).await
    };
    input.abort();

    result.with_context(|| format!("playback of '{}' failed", chapter))?;
    log::info!("Bye");
    Ok(())
}

/// Stdin lines, read on a plain thread so a pending read never holds up
/// runtime shutdown.
fn read_stdin() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn handle_commands(player: Player, mut lines: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = lines.recv().await {
        match line.trim() {
            "" => player.skip(),
            "p" => player.pause(),
            "r" => player.resume(),
            "a" => player.set_auto_play(!player.auto_play()),
            "f" => player.set_fast_forward(!player.fast_forward()),
            "l" => player.set_language(player.language().toggled()),
            "h" => player.hide_text(),
            "s" => player.show_text(),
            "q" => {
                player.stop();
                break;
            }
            _ => eprintln!("{HELP}"),
        }
    }
}
