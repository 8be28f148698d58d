//! Keyboard and terminal input.
//!
//! - [`raw`]: crossterm events reduced to single-byte keys, wheel bursts and resizes
//! - [`keymap`]: the key → command tables for each prompt
//! - [`service`]: batch polling used by the input thread

pub mod keymap;
pub mod raw;
pub mod service;

pub use keymap::{Command, FilterFollowUp};
pub use raw::{key_to_byte, RawInputEvent, WheelDirection};
pub use service::InputService;
