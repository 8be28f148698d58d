//! Background producers feeding the event loop.

use crate::input::{InputService, RawInputEvent};
use crate::session::CancelToken;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Spawn a blocking thread that collects terminal input and forwards it onto a channel.
pub fn spawn_input_thread(
    tx: UnboundedSender<RawInputEvent>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut service = InputService::new();
        while !shutdown.load(Ordering::SeqCst) {
            match service.poll_events(Some(poll_interval)) {
                Ok(events) => {
                    for event in events {
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    log::error!("input thread stopped: {err}");
                    break;
                }
            }
        }
    })
}

/// Turn SIGINT into a cancellation request for the running search or root visit.
pub fn spawn_interrupt_task(cancel: CancelToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            log::debug!("interrupt received");
            cancel.request();
        }
    })
}
