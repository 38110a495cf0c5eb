use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use crate::docker;
use crate::event::AppEvent;
use crate::hosts;
use crate::manager::ConnectionManager;

/// Discovery operations run off the render path, one worker thread each,
/// reporting back with exactly one completion event. The state machine keeps
/// at most one outstanding at a time: the keys that start them are only live
/// in states where none is running.

/// Load and validate the host list document.
pub fn load_hosts(path: PathBuf, tx: Sender<AppEvent>) {
    thread::spawn(move || {
        let event = match hosts::load(&path) {
            Ok(hosts) => AppEvent::HostsLoaded(hosts),
            Err(e) => AppEvent::OperationFailed(e),
        };
        let _ = tx.send(event);
    });
}

/// Connect (or reuse the managed connection) and list containers on `host`.
pub fn load_containers(
    manager: Arc<ConnectionManager>,
    host: Arc<hosts::HostRecord>,
    tx: Sender<AppEvent>,
) {
    thread::spawn(move || {
        let event = match docker::list_containers(&manager, &host) {
            Ok(containers) => AppEvent::ContainersLoaded(containers),
            Err(e) => AppEvent::OperationFailed(e),
        };
        let _ = tx.send(event);
    });
}
