//! Event loop
//!
//! A single task owns the [`Session`]. Terminal input arrives over a channel
//! from a blocking thread; while a global search or root visit is running the
//! loop drains input without waiting and advances the run one commit at a
//! time, yielding in between so the interrupt task gets a chance to run.

pub mod runtime;

use crate::error::Result;
use crate::input::{RawInputEvent, WheelDirection};
use crate::render::{TerminalUI, UIRenderer, ViewState};
use crate::session::{Effect, Session};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct Application<R: UIRenderer = TerminalUI> {
    session: Session,
    renderer: R,
}

impl<R: UIRenderer> Application<R> {
    pub fn new(session: Session, renderer: R) -> Self {
        Self { session, renderer }
    }

    /// Take over the terminal and run until quit.
    ///
    /// The terminal is restored whether the loop ends normally or with an error.
    pub async fn run(&mut self) -> Result<()> {
        self.renderer.initialize()?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let input = runtime::spawn_input_thread(tx, Arc::clone(&shutdown), INPUT_POLL_INTERVAL);
        let interrupt = runtime::spawn_interrupt_task(self.session.cancel_token());

        let result = self.run_with_events(&mut rx).await;

        shutdown.store(true, Ordering::SeqCst);
        interrupt.abort();
        drop(rx);
        if input.join().is_err() {
            log::warn!("input thread panicked");
        }
        self.renderer.cleanup()?;
        result
    }

    /// Process events until quit or until the sender side goes away.
    pub async fn run_with_events(
        &mut self,
        events: &mut UnboundedReceiver<RawInputEvent>,
    ) -> Result<()> {
        let (cols, rows) = self.renderer.get_terminal_size()?;
        self.session.resize(cols, rows);
        self.draw()?;

        let mut connected = true;
        loop {
            let effect = if self.session.is_busy() {
                let effect = match events.try_recv() {
                    Ok(event) => self.apply(event)?,
                    Err(TryRecvError::Empty) => self.session.step()?,
                    Err(TryRecvError::Disconnected) => {
                        connected = false;
                        self.session.step()?
                    }
                };
                tokio::task::yield_now().await;
                effect
            } else {
                if !connected {
                    break;
                }
                match events.recv().await {
                    Some(event) => self.apply(event)?,
                    None => break,
                }
            };

            match effect {
                Effect::Quit => break,
                Effect::Redraw => self.draw()?,
                Effect::None => {}
            }
        }
        log::debug!("event loop finished");
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    fn apply(&mut self, event: RawInputEvent) -> Result<Effect> {
        match event {
            RawInputEvent::Key(key) => self.session.handle_key(key),
            RawInputEvent::Wheel { direction, lines } => {
                let lines = isize::try_from(lines).unwrap_or(isize::MAX);
                match direction {
                    WheelDirection::Up => self.session.scroll(-lines),
                    WheelDirection::Down => self.session.scroll(lines),
                }
            }
            RawInputEvent::Resize { cols, rows } => {
                self.session.resize(cols, rows);
                Ok(Effect::Redraw)
            }
        }
    }

    fn draw(&mut self) -> Result<()> {
        let view = ViewState::from_session(&self.session);
        self.renderer.render(&view)
    }
}
