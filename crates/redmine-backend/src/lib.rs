pub mod client;
mod convert;
pub mod error;
pub mod models;
mod resources;
mod trait_impl;


pub use client::{RedmineClient, RedmineClientBuilder, DEFAULT_MAX_PARALLEL, DEFAULT_TIMEOUT};
pub use convert::{date_to_seconds, hours_to_seconds, seconds_to_date, seconds_to_hours};
pub use error::{RedmineError, Result};
pub use models::*;

pub use tracker_core::{TrackerClient, TrackerError};
