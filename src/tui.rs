use std::io::{Stdout, stdout};
use std::sync::Once;

use anyhow::Result;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, prelude::CrosstermBackend};

use crate::app::App;
use crate::ui;

static PANIC_HOOK: Once = Once::new();

/// Terminal ownership for the UI loop.
///
/// `enter`/`exit` bracket the whole run; `suspend`/`resume` bracket a
/// hand-off, where the terminal is lent to a remote process and must be
/// fully released (cooked mode, main screen, cursor visible) before the
/// remote writes its first byte.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl Tui {
    pub fn new() -> Result<Self> {
        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            active: false,
        })
    }

    /// Take over the terminal: raw mode plus alternate screen. The panic
    /// hook is installed once, before raw mode, so a panic mid-draw still
    /// leaves the terminal usable.
    pub fn enter(&mut self) -> Result<()> {
        PANIC_HOOK.call_once(|| {
            let original_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |panic_info| {
                let _ = Self::release();
                original_hook(panic_info);
            }));
        });

        enable_raw_mode()?;
        if let Err(e) = execute!(stdout(), EnterAlternateScreen) {
            disable_raw_mode()?;
            return Err(e.into());
        }

        self.active = true;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    /// Give the terminal back for good.
    pub fn exit(&mut self) -> Result<()> {
        self.active = false;
        Self::release()?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Release the terminal ahead of a hand-off.
    pub fn suspend(&mut self) -> Result<()> {
        self.exit()
    }

    /// Take the terminal back after a hand-off. The next draw repaints from
    /// scratch; whatever the remote process printed stays in the main
    /// screen's scrollback.
    pub fn resume(&mut self) -> Result<()> {
        self.enter()
    }

    /// Restore cooked mode and the main screen.
    fn release() -> Result<()> {
        disable_raw_mode()?;
        execute!(stdout(), LeaveAlternateScreen)?;
        Ok(())
    }

    /// Draw the UI.
    pub fn draw(&mut self, app: &mut App) -> Result<()> {
        self.terminal.draw(|frame| ui::render(frame, app))?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        // Only reset a terminal we still own; after a clean `exit` there is
        // nothing left to restore.
        if self.active {
            let _ = Self::release();
            let _ = self.terminal.show_cursor();
        }
    }
}
