//! tee-cloud: tee sheet booking service
//!
//! - Members register, browse the daily tee sheet and reserve a spot
//! - The administrator generates, resets and edits the schedule
//! - Reservations race through row locks with lock skipping, so a slot is
//!   never booked past its capacity

pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod error;
pub mod members;
pub mod schedule;
pub mod state;
pub mod store;
pub mod util;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use state::AppState;
