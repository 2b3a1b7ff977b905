//! Core module - configuration, time and error plumbing shared by every layer
//!
//! # Module Organization
//!
//! - `clock` - [`Clock`] capability with [`SystemClock`] and [`FixedClock`]
//! - `config` - [`ReviewConfig`], [`Settings`] (settings.json) and [`TrainerPaths`]
//! - `error` - [`CoreError`] and the [`CoreResult`] alias

pub mod clock;
pub mod config;
pub mod error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{color_name, parse_duration, ReviewConfig, Settings, TrainerPaths};
pub use error::{CoreError, CoreResult};
