use std::io::{self, BufWriter, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{self, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use haunt_engine::{Color, Command, Direction, Surface};
use tracing::{info, warn};

/// Alternate-screen, raw-mode terminal. Restored on drop.
pub(crate) struct TerminalSurface {
    out: BufWriter<Stdout>,
    pending_error: Option<io::Error>,
    active: bool,
}

impl TerminalSurface {
    pub(crate) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = BufWriter::new(io::stdout());
        if let Err(err) = execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All)) {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        info!("terminal_entered");
        Ok(Self {
            out,
            pending_error: None,
            active: true,
        })
    }

    pub(crate) fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Err(err) = execute!(self.out, ResetColor, Show, LeaveAlternateScreen) {
            warn!(error = %err, "terminal_restore_failed");
        }
        if let Err(err) = terminal::disable_raw_mode() {
            warn!(error = %err, "raw_mode_disable_failed");
        }
        info!("terminal_restored");
    }

    fn remember(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            self.pending_error.get_or_insert(err);
        }
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.restore();
    }
}

fn to_terminal_color(color: Color) -> style::Color {
    match color {
        Color::Default => style::Color::Reset,
        Color::Black => style::Color::Black,
        Color::DarkGray => style::Color::DarkGrey,
        Color::Red => style::Color::Red,
        Color::Green => style::Color::Green,
    }
}

impl Surface for TerminalSurface {
    fn clear(&mut self) {
        let result = queue!(self.out, ResetColor, Clear(ClearType::All));
        self.remember(result);
    }

    fn set_cell(&mut self, x: u16, y: u16, glyph: char, fg: Color, bg: Color) {
        let result = queue!(
            self.out,
            MoveTo(x, y),
            SetForegroundColor(to_terminal_color(fg)),
            SetBackgroundColor(to_terminal_color(bg)),
            Print(glyph),
            ResetColor
        );
        self.remember(result);
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }
        self.out.flush()
    }
}

pub(crate) fn map_key(key: &KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
            .then_some(Command::Quit);
    }
    let command = match key.code {
        KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Up => Command::Move(Direction::Up),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Down => Command::Move(Direction::Down),
        KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => Command::Move(Direction::Left),
        KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Right => {
            Command::Move(Direction::Right)
        }
        KeyCode::Char('e') | KeyCode::Char('E') => Command::Interact,
        KeyCode::Esc => Command::Quit,
        _ => return None,
    };
    Some(command)
}

/// Blocking keyboard reader. Ends when the terminal stops delivering events.
pub(crate) struct KeyCommands;

impl Iterator for KeyCommands {
    type Item = Command;

    fn next(&mut self) -> Option<Command> {
        loop {
            match event::read() {
                Ok(Event::Key(key)) => {
                    if let Some(command) = map_key(&key) {
                        return Some(command);
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "input_read_failed");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventState;

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn wasd_and_arrows_move() {
        assert_eq!(
            map_key(&press(KeyCode::Char('w'))),
            Some(Command::Move(Direction::Up))
        );
        assert_eq!(
            map_key(&press(KeyCode::Char('A'))),
            Some(Command::Move(Direction::Left))
        );
        assert_eq!(
            map_key(&press(KeyCode::Down)),
            Some(Command::Move(Direction::Down))
        );
        assert_eq!(
            map_key(&press(KeyCode::Right)),
            Some(Command::Move(Direction::Right))
        );
    }

    #[test]
    fn interact_and_quit_keys() {
        assert_eq!(map_key(&press(KeyCode::Char('e'))), Some(Command::Interact));
        assert_eq!(map_key(&press(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(
            map_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
    }

    #[test]
    fn other_keys_and_releases_are_ignored() {
        assert_eq!(map_key(&press(KeyCode::Char('q'))), None);
        assert_eq!(
            map_key(&KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL)),
            None
        );
        let release = KeyEvent {
            code: KeyCode::Char('w'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key(&release), None);
    }

    #[test]
    fn colors_map_to_terminal_palette() {
        assert_eq!(to_terminal_color(Color::Default), style::Color::Reset);
        assert_eq!(to_terminal_color(Color::DarkGray), style::Color::DarkGrey);
    }
}
