use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};

use crate::docker::ContainerRecord;
use crate::error::Error;
use crate::hosts::HostRecord;

/// Application events.
///
/// `HostsLoaded`, `ContainersLoaded` and `OperationFailed` are the closed set
/// of completion messages worker threads send back into the loop; everything
/// else is local terminal traffic.
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    HostsLoaded(Vec<Arc<HostRecord>>),
    ContainersLoaded(Vec<ContainerRecord>),
    OperationFailed(Error),
}

#[derive(PartialEq)]
enum Gate {
    Open,
    PauseRequested,
    Parked,
}

/// Polls crossterm events in a background thread.
///
/// The thread can be parked with `pause` while the terminal is handed off to
/// a remote process, so the interactive runner is the only reader of the
/// input stream; `resume` wakes it afterwards. `pause` does not return until
/// the thread has confirmed it is parked.
pub struct EventHandler {
    tx: mpsc::Sender<AppEvent>,
    rx: mpsc::Receiver<AppEvent>,
    gate: Arc<(Mutex<Gate>, Condvar)>,
    // Keep the thread handle alive
    _handle: thread::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::channel();
        let tick_rate = Duration::from_millis(tick_rate_ms);
        let event_tx = tx.clone();
        let gate = Arc::new((Mutex::new(Gate::Open), Condvar::new()));
        let thread_gate = Arc::clone(&gate);

        let handle = thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                wait_while_paused(&thread_gate);

                // Short poll window so a pause request is honored quickly.
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::ZERO)
                    .min(Duration::from_millis(50));

                if event::poll(timeout).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        match evt {
                            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                                if event_tx.send(AppEvent::Key(key)).is_err() {
                                    return;
                                }
                            }
                            _ => {}
                        }
                    }
                }

                if last_tick.elapsed() >= tick_rate {
                    if event_tx.send(AppEvent::Tick).is_err() {
                        return;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self {
            tx,
            rx,
            gate,
            _handle: handle,
        }
    }

    /// Get the next event (blocks until available).
    pub fn next(&self) -> Result<AppEvent> {
        Ok(self.rx.recv()?)
    }

    /// Get a clone of the sender for sending events from worker threads.
    pub fn sender(&self) -> mpsc::Sender<AppEvent> {
        self.tx.clone()
    }

    /// Stop the poll thread reading the input stream. Returns once the
    /// thread is parked.
    pub fn pause(&self) {
        let (lock, cvar) = &*self.gate;
        let mut state = lock.lock().unwrap_or_else(|e| e.into_inner());
        if *state == Gate::Open {
            *state = Gate::PauseRequested;
        }
        while *state != Gate::Parked {
            state = cvar.wait(state).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Wake the poll thread after a hand-off.
    pub fn resume(&self) {
        let (lock, cvar) = &*self.gate;
        let mut state = lock.lock().unwrap_or_else(|e| e.into_inner());
        *state = Gate::Open;
        cvar.notify_all();
    }
}

fn wait_while_paused(gate: &(Mutex<Gate>, Condvar)) {
    let (lock, cvar) = gate;
    let mut state = lock.lock().unwrap_or_else(|e| e.into_inner());
    if *state == Gate::PauseRequested {
        *state = Gate::Parked;
        cvar.notify_all();
    }
    while *state == Gate::Parked {
        state = cvar.wait(state).unwrap_or_else(|e| e.into_inner());
    }
}
