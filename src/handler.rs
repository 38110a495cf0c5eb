use std::sync::Arc;
use std::sync::mpsc::Sender;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Event, Handoff, State};
use crate::event::AppEvent;
use crate::ops;

/// Handle a key event based on the current state.
pub fn handle_key_event(app: &mut App, key: KeyEvent, tx: &Sender<AppEvent>) -> Result<()> {
    // Global Ctrl+C handler — works in every state
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.running = false;
        return Ok(());
    }

    match app.state() {
        State::SelectingHost => handle_host_selection(app, key, tx),
        State::ListingContainers => handle_container_list(app, key),
        State::Failed => handle_failed(app, key),
        // Loading states and active hand-offs only honor quit; a hand-off
        // never sees keys here anyway since the event thread is parked.
        State::Init
        | State::LoadingConfig
        | State::Connecting
        | State::ShellActive
        | State::ExecActive => handle_busy(app, key),
    }
    Ok(())
}

fn handle_host_selection(app: &mut App, key: KeyEvent, tx: &Sender<AppEvent>) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.running = false;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
        }
        KeyCode::Enter => {
            if let Some(host) = app.selected_host() {
                let host = Arc::clone(host);
                app.machine.apply(Event::ConnectRequested);
                ops::load_containers(Arc::clone(&app.manager), host, tx.clone());
            }
        }
        KeyCode::Char('s') => {
            if app.selected_host().is_some() {
                app.pending_handoff = Some(Handoff::HostShell);
            }
        }
        _ => {}
    }
}

fn handle_container_list(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
        }
        KeyCode::Enter => {
            if let Some(container) = app.selected_container() {
                app.pending_handoff = Some(Handoff::ContainerExec {
                    container_id: container.id.clone(),
                });
            }
        }
        KeyCode::Char('s') => {
            app.pending_handoff = Some(Handoff::HostShell);
        }
        KeyCode::Esc | KeyCode::Backspace => {
            app.back_to_hosts();
        }
        _ => {}
    }
}

fn handle_failed(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
        app.running = false;
    }
}

fn handle_busy(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('q') {
        app.running = false;
    }
}
