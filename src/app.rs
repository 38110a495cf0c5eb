use std::sync::Arc;

use ratatui::widgets::ListState;

use crate::docker::ContainerRecord;
use crate::error::Error;
use crate::hosts::HostRecord;
use crate::manager::ConnectionManager;

/// Where the interaction currently is.
///
/// `ShellActive` and `ExecActive` are never rendered: while one of them is
/// current the terminal belongs to the remote process, and the machine
/// remembers which state to restore when control comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    LoadingConfig,
    SelectingHost,
    Connecting,
    ListingContainers,
    ShellActive,
    ExecActive,
    Failed,
}

/// Everything that can move the machine. The three completion variants are
/// sent by worker threads; the rest are operator intents or the hand-off
/// driver reporting.
#[derive(Debug)]
pub enum Event {
    LoadStarted,
    HostsLoaded,
    ConnectRequested,
    ContainersLoaded,
    Back,
    ShellStarted,
    ExecStarted,
    HandoffEnded,
    OperationFailed(Error),
}

/// The interaction state machine. `apply` is the only way to change state.
pub struct StateMachine {
    current: State,
    resume: State,
    error: Option<Error>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: State::Init,
            resume: State::SelectingHost,
            error: None,
        }
    }

    pub fn current(&self) -> State {
        self.current
    }

    /// The fault that put the machine into `Failed`, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Advance the machine. Total over every (state, event) pair: anything
    /// not listed as a legal transition is deliberately inert, so a stale
    /// completion message or an out-of-state intent can never move the
    /// machine somewhere it didn't earn.
    pub fn apply(&mut self, event: Event) {
        use Event::*;
        use State::*;

        self.current = match (self.current, event) {
            (_, OperationFailed(e)) => {
                self.error = Some(e);
                Failed
            }
            (Init, LoadStarted) => LoadingConfig,
            (LoadingConfig, HostsLoaded) => SelectingHost,
            (SelectingHost, ConnectRequested) => Connecting,
            (Connecting, ContainersLoaded) => ListingContainers,
            (ListingContainers, Back) => SelectingHost,
            (SelectingHost | ListingContainers, ShellStarted) => {
                self.resume = self.current;
                ShellActive
            }
            (ListingContainers, ExecStarted) => {
                self.resume = self.current;
                ExecActive
            }
            (ShellActive | ExecActive, HandoffEnded) => self.resume,
            (
                state,
                LoadStarted | HostsLoaded | ConnectRequested | ContainersLoaded | Back
                | ShellStarted | ExecStarted | HandoffEnded,
            ) => state,
        };
    }
}

/// A terminal hand-off requested by the handler, picked up by the main loop
/// once the current frame is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handoff {
    HostShell,
    ContainerExec { container_id: String },
}

/// Status message displayed at the bottom.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub tick_count: u32,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub machine: StateMachine,
    pub manager: Arc<ConnectionManager>,

    pub hosts: Vec<Arc<HostRecord>>,
    pub containers: Vec<ContainerRecord>,

    // List cursors
    pub host_list: ListState,
    pub container_list: ListState,

    // Status bar
    pub status: Option<StatusMessage>,

    // Pending terminal hand-off
    pub pending_handoff: Option<Handoff>,
}

impl App {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self {
            running: true,
            machine: StateMachine::new(),
            manager,
            hosts: Vec::new(),
            containers: Vec::new(),
            host_list: ListState::default(),
            container_list: ListState::default(),
            status: None,
            pending_handoff: None,
        }
    }

    pub fn state(&self) -> State {
        self.machine.current()
    }

    pub fn selected_host(&self) -> Option<&Arc<HostRecord>> {
        self.host_list.selected().and_then(|i| self.hosts.get(i))
    }

    pub fn selected_container(&self) -> Option<&ContainerRecord> {
        self.container_list
            .selected()
            .and_then(|i| self.containers.get(i))
    }

    /// Host list arrived from the loader.
    pub fn hosts_loaded(&mut self, hosts: Vec<Arc<HostRecord>>) {
        self.hosts = hosts;
        self.host_list = ListState::default();
        if !self.hosts.is_empty() {
            self.host_list.select(Some(0));
        }
        self.machine.apply(Event::HostsLoaded);
    }

    /// Container snapshot arrived for the selected host. Supersedes the
    /// previous snapshot wholesale.
    pub fn containers_loaded(&mut self, containers: Vec<ContainerRecord>) {
        self.containers = containers;
        self.container_list = ListState::default();
        if !self.containers.is_empty() {
            self.container_list.select(Some(0));
        }
        self.machine.apply(Event::ContainersLoaded);
    }

    pub fn operation_failed(&mut self, error: Error) {
        self.machine.apply(Event::OperationFailed(error));
    }

    /// Leave the container list back to host selection, dropping the
    /// snapshot.
    pub fn back_to_hosts(&mut self) {
        self.machine.apply(Event::Back);
        self.containers.clear();
        self.container_list = ListState::default();
    }

    /// Move selection up in whichever list the current state shows.
    pub fn select_prev(&mut self) {
        match self.state() {
            State::SelectingHost => select_prev_wrapping(&mut self.host_list, self.hosts.len()),
            State::ListingContainers => {
                select_prev_wrapping(&mut self.container_list, self.containers.len());
            }
            _ => {}
        }
    }

    /// Move selection down in whichever list the current state shows.
    pub fn select_next(&mut self) {
        match self.state() {
            State::SelectingHost => select_next_wrapping(&mut self.host_list, self.hosts.len()),
            State::ListingContainers => {
                select_next_wrapping(&mut self.container_list, self.containers.len());
            }
            _ => {}
        }
    }

    /// Set a status message.
    pub fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
            tick_count: 0,
        });
    }

    /// Tick the status message timer. Errors show for 5s, notices for 3s.
    pub fn tick_status(&mut self) {
        if let Some(ref mut status) = self.status {
            status.tick_count += 1;
            let timeout = if status.is_error { 20 } else { 12 };
            if status.tick_count > timeout {
                self.status = None;
            }
        }
    }
}

fn select_prev_wrapping(list: &mut ListState, len: usize) {
    if len == 0 {
        return;
    }
    let i = match list.selected() {
        Some(0) | None => len - 1,
        Some(i) => i - 1,
    };
    list.select(Some(i));
}

fn select_next_wrapping(list: &mut ListState, len: usize) {
    if len == 0 {
        return;
    }
    let i = match list.selected() {
        Some(i) if i + 1 < len => i + 1,
        _ => 0,
    };
    list.select(Some(i));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosts;

    fn two_hosts() -> Vec<Arc<HostRecord>> {
        hosts::parse(
            r#"{"hosts":[
                {"id":"web-1","name":"Web 1","host":"10.0.0.1","port":22,"user":"ops","password":"x"},
                {"id":"web-2","name":"Web 2","host":"10.0.0.2","port":22,"user":"ops","password":"x"}
            ]}"#,
        )
        .unwrap()
    }

    fn one_container() -> Vec<ContainerRecord> {
        vec![ContainerRecord {
            id: "abc123".into(),
            name: "web".into(),
            image: "nginx:latest".into(),
            status: "Up 2 minutes".into(),
        }]
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut machine = StateMachine::new();
        machine.apply(Event::LoadStarted);
        assert_eq!(machine.current(), State::LoadingConfig);
        machine.apply(Event::HostsLoaded);
        assert_eq!(machine.current(), State::SelectingHost);
        machine.apply(Event::ConnectRequested);
        assert_eq!(machine.current(), State::Connecting);
        machine.apply(Event::ContainersLoaded);
        assert_eq!(machine.current(), State::ListingContainers);
    }

    #[test]
    fn test_no_listing_without_connecting() {
        // A stray completion message must not skip the Connecting state.
        let mut machine = StateMachine::new();
        machine.apply(Event::LoadStarted);
        machine.apply(Event::HostsLoaded);
        machine.apply(Event::ContainersLoaded);
        assert_eq!(machine.current(), State::SelectingHost);
    }

    #[test]
    fn test_back_returns_to_host_selection() {
        let mut machine = StateMachine::new();
        machine.apply(Event::LoadStarted);
        machine.apply(Event::HostsLoaded);
        machine.apply(Event::ConnectRequested);
        machine.apply(Event::ContainersLoaded);
        machine.apply(Event::Back);
        assert_eq!(machine.current(), State::SelectingHost);
    }

    #[test]
    fn test_shell_handoff_resumes_prior_state() {
        let mut machine = StateMachine::new();
        machine.apply(Event::LoadStarted);
        machine.apply(Event::HostsLoaded);

        // From host selection
        machine.apply(Event::ShellStarted);
        assert_eq!(machine.current(), State::ShellActive);
        machine.apply(Event::HandoffEnded);
        assert_eq!(machine.current(), State::SelectingHost);

        // From the container list
        machine.apply(Event::ConnectRequested);
        machine.apply(Event::ContainersLoaded);
        machine.apply(Event::ShellStarted);
        machine.apply(Event::HandoffEnded);
        assert_eq!(machine.current(), State::ListingContainers);
    }

    #[test]
    fn test_exec_handoff_resumes_container_list() {
        let mut machine = StateMachine::new();
        machine.apply(Event::LoadStarted);
        machine.apply(Event::HostsLoaded);
        machine.apply(Event::ConnectRequested);
        machine.apply(Event::ContainersLoaded);
        machine.apply(Event::ExecStarted);
        assert_eq!(machine.current(), State::ExecActive);
        machine.apply(Event::HandoffEnded);
        assert_eq!(machine.current(), State::ListingContainers);
    }

    #[test]
    fn test_exec_not_possible_from_host_selection() {
        let mut machine = StateMachine::new();
        machine.apply(Event::LoadStarted);
        machine.apply(Event::HostsLoaded);
        machine.apply(Event::ExecStarted);
        assert_eq!(machine.current(), State::SelectingHost);
    }

    #[test]
    fn test_failure_from_any_state_carries_error() {
        let mut machine = StateMachine::new();
        machine.apply(Event::LoadStarted);
        machine.apply(Event::HostsLoaded);
        machine.apply(Event::ConnectRequested);
        machine.apply(Event::OperationFailed(Error::config("boom")));
        assert_eq!(machine.current(), State::Failed);
        assert!(machine.error().unwrap().to_string().contains("boom"));
    }

    #[test]
    fn test_failed_is_sticky() {
        let mut machine = StateMachine::new();
        machine.apply(Event::OperationFailed(Error::config("boom")));
        machine.apply(Event::HostsLoaded);
        machine.apply(Event::ConnectRequested);
        machine.apply(Event::Back);
        assert_eq!(machine.current(), State::Failed);
    }

    #[test]
    fn test_end_to_end_discovery_and_back() {
        let manager = Arc::new(ConnectionManager::new());
        let mut app = App::new(manager);

        app.machine.apply(Event::LoadStarted);
        app.hosts_loaded(two_hosts());
        assert_eq!(app.state(), State::SelectingHost);
        assert_eq!(app.host_list.selected(), Some(0));

        app.machine.apply(Event::ConnectRequested);
        app.containers_loaded(one_container());
        assert_eq!(app.state(), State::ListingContainers);
        assert_eq!(app.containers.len(), 1);
        assert_eq!(app.containers[0].id, "abc123");

        app.back_to_hosts();
        assert_eq!(app.state(), State::SelectingHost);
        assert!(app.containers.is_empty());
        assert_eq!(app.container_list.selected(), None);
    }

    #[test]
    fn test_selection_wraps() {
        let manager = Arc::new(ConnectionManager::new());
        let mut app = App::new(manager);
        app.machine.apply(Event::LoadStarted);
        app.hosts_loaded(two_hosts());

        app.select_next();
        assert_eq!(app.host_list.selected(), Some(1));
        app.select_next();
        assert_eq!(app.host_list.selected(), Some(0));
        app.select_prev();
        assert_eq!(app.host_list.selected(), Some(1));
    }

    #[test]
    fn test_status_expires() {
        let manager = Arc::new(ConnectionManager::new());
        let mut app = App::new(manager);
        app.set_status("done", false);
        for _ in 0..13 {
            app.tick_status();
        }
        assert!(app.status.is_none());
    }
}
