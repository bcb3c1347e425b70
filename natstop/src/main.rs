//! Entry point for nats-top. Parses args, checks the server once, then runs
//! either a single snapshot or the live screen.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use crossterm::event::EventStream;
use tokio::sync::{mpsc, watch};

use natstop::app::{shutdown_signal, App};
use natstop::cli::Cli;
use natstop::engine::Engine;
use natstop::http::StatusClient;
use natstop::logging::{self, LogTarget};
use natstop::profiles::{self, ProfileEntry, ProfileRequest, ResolveProfile};
use natstop::screen::TerminalScreen;
use natstop::ui;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("nats-top: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    logging::init(&LogTarget::choose(cli.log_file.clone(), !cli.is_one_shot()))
        .context("could not open log file")?;

    let profile = resolve_profile(&cli)?;
    let target = cli.target(profile.as_ref())?;
    let client = StatusClient::new(&target)?;
    tracing::info!(base = %client.base(), "monitoring");

    let (opt_tx, opt_rx) = watch::channel(cli.display_options());
    let (stop_tx, stop_rx) = watch::channel(false);
    let engine = Engine::new(client, opt_rx, stop_rx);

    // Smoke test the server once before touching the terminal.
    engine.check_connectivity().await?;

    if cli.is_one_shot() {
        return one_shot(&cli, engine).await;
    }

    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(engine.run(tx, cli.poll_interval()));

    let mut screen = TerminalScreen::enter().context("could not set up the terminal")?;
    let mut app = App::new(opt_tx, stop_tx)
        .with_max_refresh(cli.max_refresh.and_then(|n| usize::try_from(n).ok()));
    let res = app
        .run(&mut screen, rx, EventStream::new(), shutdown_signal())
        .await;
    screen.restore()?;
    res?;
    Ok(())
}

async fn one_shot(cli: &Cli, mut engine: Engine) -> anyhow::Result<()> {
    let mut snapshot = engine.fetch_once().await;
    if let Some(err) = snapshot.error.take() {
        return Err(err.into());
    }
    let text = ui::render(
        &snapshot,
        &cli.display_options(),
        cli.delimiter.as_deref(),
    );
    match cli.output.as_deref() {
        Some(path) if path != Path::new("-") => fs::write(path, text)
            .with_context(|| format!("could not write {}", path.display()))?,
        _ => {
            let mut out = io::stdout().lock();
            out.write_all(text.as_bytes())?;
            out.flush()?;
        }
    }
    Ok(())
}

fn resolve_profile(cli: &Cli) -> anyhow::Result<Option<ProfileEntry>> {
    let Some(name) = cli.profile.as_deref() else {
        return Ok(None);
    };
    let path = profiles::profiles_path();
    let mut pf = profiles::load_from(&path)?;
    let req = ProfileRequest {
        profile_name: Some(name.to_string()),
        entry: cli.profile_entry(),
    };
    match req.resolve(&pf) {
        ResolveProfile::Direct(entry) => {
            if profiles::remember(&path, &mut pf, name, &entry, cli.save)? {
                tracing::info!(profile = name, path = %path.display(), "profile saved");
            } else if pf.profiles.get(name) != Some(&entry) {
                tracing::warn!(profile = name, "profile differs from flags; pass --save to overwrite");
            }
            Ok(Some(entry))
        }
        ResolveProfile::Loaded(entry) => Ok(Some(entry)),
        ResolveProfile::Unknown(name) => {
            bail!("unknown profile {name:?}; pass -s HOST to create it")
        }
        ResolveProfile::None => Ok(None),
    }
}
