//! Terminal event collection: crossterm polling, key → byte translation and
//! mouse-wheel coalescing.
//!
//! The pager works on single-byte keystrokes, so every key event is reduced to
//! the byte a raw-mode tty would deliver for it. Keys with no single-byte form
//! are dropped.

use crate::error::Result;
use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Window in which wheel ticks of one direction are merged.
const DEFAULT_COALESCE_WINDOW_MS: u64 = 12;
/// Lines scrolled per wheel tick.
const WHEEL_LINES: usize = 3;
/// Poll timeout used when the caller does not provide one.
const DEFAULT_POLL_TIMEOUT_MS: u64 = 50;

/// Wheel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
}

/// Events forwarded to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInputEvent {
    Key(u8),
    Wheel {
        direction: WheelDirection,
        lines: usize,
    },
    Resize {
        cols: u16,
        rows: u16,
    },
}

/// Reduce a key event to the byte a raw-mode terminal would send.
pub fn key_to_byte(key: KeyEvent) -> Option<u8> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let c = c.to_ascii_lowercase();
            c.is_ascii_lowercase().then(|| c as u8 - b'a' + 1)
        }
        KeyCode::Char(c) if c.is_ascii() => Some(c as u8),
        KeyCode::Enter => Some(0x0d),
        KeyCode::Esc => Some(0x1b),
        KeyCode::Backspace => Some(0x7f),
        KeyCode::Tab => Some(b'\t'),
        KeyCode::Down => Some(b'j'),
        KeyCode::Up => Some(b'k'),
        KeyCode::PageDown => Some(b'f'),
        KeyCode::PageUp => Some(b'b'),
        KeyCode::Home => Some(b'g'),
        KeyCode::End => Some(b'G'),
        _ => None,
    }
}

/// Merges bursts of same-direction wheel ticks.
#[derive(Debug, Clone)]
pub struct WheelCoalescer {
    window: Duration,
    pending: Option<PendingWheel>,
}

#[derive(Debug, Clone)]
struct PendingWheel {
    direction: WheelDirection,
    lines: usize,
    last_tick: Instant,
}

impl WheelCoalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Add a tick; returns a burst of the other direction that must go out first.
    pub fn push(
        &mut self,
        direction: WheelDirection,
        lines: usize,
        now: Instant,
    ) -> Option<(WheelDirection, usize)> {
        if let Some(pending) = self.pending.as_mut() {
            if pending.direction == direction {
                pending.lines = pending.lines.saturating_add(lines);
                pending.last_tick = now;
                return None;
            }
        }
        let flushed = self.flush();
        self.pending = Some(PendingWheel {
            direction,
            lines,
            last_tick: now,
        });
        flushed
    }

    pub fn flush_if_stale(&mut self, now: Instant) -> Option<(WheelDirection, usize)> {
        let stale = self
            .pending
            .as_ref()
            .is_some_and(|pending| now.duration_since(pending.last_tick) >= self.window);
        if stale {
            self.flush()
        } else {
            None
        }
    }

    pub fn flush(&mut self) -> Option<(WheelDirection, usize)> {
        self.pending
            .take()
            .map(|pending| (pending.direction, pending.lines))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}

/// Polls crossterm and queues translated events.
#[derive(Debug)]
pub struct RawInputCollector {
    wheel: WheelCoalescer,
    queued: VecDeque<RawInputEvent>,
}

impl RawInputCollector {
    pub fn new() -> Self {
        Self::with_window(Duration::from_millis(DEFAULT_COALESCE_WINDOW_MS))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            wheel: WheelCoalescer::new(window),
            queued: VecDeque::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.queued.is_empty() && self.wheel.is_empty()
    }

    /// Feed a terminal event without polling.
    pub fn process_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                if let Some(byte) = key_to_byte(key) {
                    self.flush_wheel();
                    self.queued.push_back(RawInputEvent::Key(byte));
                }
            }
            Event::Resize(cols, rows) => {
                self.flush_wheel();
                self.queued.push_back(RawInputEvent::Resize { cols, rows });
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    /// Next queued or stale-coalesced event, without blocking.
    pub fn try_next(&mut self) -> Option<RawInputEvent> {
        if let Some(event) = self.queued.pop_front() {
            return Some(event);
        }
        self.wheel
            .flush_if_stale(Instant::now())
            .map(|(direction, lines)| RawInputEvent::Wheel { direction, lines })
    }

    /// Next event, blocking up to `timeout`.
    pub fn poll_event(&mut self, timeout: Option<Duration>) -> Result<Option<RawInputEvent>> {
        if let Some(event) = self.try_next() {
            return Ok(Some(event));
        }

        let timeout = timeout.unwrap_or(Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS));
        if event::poll(timeout)? {
            let event = event::read()?;
            self.process_event(event);
        }
        Ok(self.try_next())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let direction = match mouse.kind {
            MouseEventKind::ScrollUp => WheelDirection::Up,
            MouseEventKind::ScrollDown => WheelDirection::Down,
            _ => return,
        };
        if let Some((flushed, lines)) = self.wheel.push(direction, WHEEL_LINES, Instant::now()) {
            self.queued.push_back(RawInputEvent::Wheel {
                direction: flushed,
                lines,
            });
        }
    }

    fn flush_wheel(&mut self) {
        if let Some((direction, lines)) = self.wheel.flush() {
            self.queued
                .push_back(RawInputEvent::Wheel { direction, lines });
        }
    }
}

impl Default for RawInputCollector {
    fn default() -> Self {
        Self::new()
    }
}
