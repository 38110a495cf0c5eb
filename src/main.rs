mod app;
mod docker;
mod error;
mod event;
mod handler;
mod hosts;
mod interactive;
mod manager;
mod ops;
mod runner;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use app::{App, Event, Handoff};
use event::{AppEvent, EventHandler};
use manager::ConnectionManager;

#[derive(Parser)]
#[command(
    name = "dockside",
    about = "Browse your Docker hosts and dive into containers, all from one terminal.",
    long_about = "Dockside shows the hosts from your host list, the containers running\n\
                  on each of them, and drops you into a shell on either -- over SSH,\n\
                  without leaving the TUI.",
    version
)]
struct Cli {
    /// Path to the host list
    #[arg(long, default_value = "~/.dockside/hosts.json")]
    config: String,
}

fn resolve_config_path(path: &str) -> Result<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(rest))
    } else {
        Ok(PathBuf::from(path))
    }
}

fn main() -> Result<()> {
    ui::theme::init();
    let cli = Cli::parse();
    let config_path = resolve_config_path(&cli.config)?;

    let manager = Arc::new(ConnectionManager::new());
    let app = App::new(Arc::clone(&manager));
    let result = run_tui(app, config_path);

    manager.close_all();
    result
}

fn run_tui(mut app: App, config_path: PathBuf) -> Result<()> {
    let mut terminal = tui::Tui::new()?;
    terminal.enter()?;
    let events = EventHandler::new(250);
    let events_tx = events.sender();

    app.machine.apply(Event::LoadStarted);
    ops::load_hosts(config_path, events.sender());

    while app.running {
        terminal.draw(&mut app)?;

        match events.next()? {
            AppEvent::Key(key) => handler::handle_key_event(&mut app, key, &events_tx)?,
            AppEvent::Tick => app.tick_status(),
            AppEvent::HostsLoaded(hosts) => app.hosts_loaded(hosts),
            AppEvent::ContainersLoaded(containers) => app.containers_loaded(containers),
            AppEvent::OperationFailed(e) => app.operation_failed(e),
        }

        // Handle a pending terminal hand-off
        if let Some(handoff) = app.pending_handoff.take() {
            run_handoff(&mut app, &handoff, &mut terminal, &events)?;
        }
    }

    terminal.exit()?;
    Ok(())
}

/// Hand the terminal to a remote interactive process and take it back.
///
/// The event thread is parked and the alternate screen left before the
/// remote process gets the terminal; both are restored afterwards, whatever
/// happened in between.
fn run_handoff(
    app: &mut App,
    handoff: &Handoff,
    terminal: &mut tui::Tui,
    events: &EventHandler,
) -> Result<()> {
    let Some(host) = app.selected_host().map(Arc::clone) else {
        return Ok(());
    };

    events.pause();
    terminal.suspend()?;

    let (start_event, command) = match handoff {
        Handoff::HostShell => (Event::ShellStarted, None),
        Handoff::ContainerExec { container_id } => {
            (Event::ExecStarted, Some(docker::exec_command(container_id)))
        }
    };
    app.machine.apply(start_event);

    let outcome = app
        .manager
        .connect(&host)
        .and_then(|session| interactive::run(&session, command.as_deref()));

    app.machine.apply(Event::HandoffEnded);
    match outcome {
        Ok(()) => app.set_status(format!("Session on {} ended.", host.name), false),
        Err(e) => app.operation_failed(e),
    }

    terminal.resume()?;
    events.resume();
    Ok(())
}
