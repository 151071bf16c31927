//! Deterministic two-sided arena combat simulation.
//!
//! This crate provides the match substrate the training harness drives:
//!
//! - [`Side`] - the two adversarial roles (Raider and Warden)
//! - [`RaiderAction`] / [`WardenAction`] - closed per-side action sets
//! - [`arbitrate`] - removal of contradictory action pairs
//! - [`Arena`] - tick-by-tick physics with tagged terminal outcomes
//! - [`encode_observation`] - the frozen policy input layout
//!
//! The simulation is fully deterministic: it holds no random state, so two
//! runs with the same policies produce bit-identical episodes. That property
//! is what lets parallel and sequential evaluation agree exactly.

pub use self::{action::*, agent::*, arena::*, observation::*, side::*};

mod action;
mod agent;
mod arena;
mod observation;
mod side;

/// Version tag embedded in every episode record. Bump when simulation rules
/// change in a way that makes old recordings incomparable.
pub const GAME_VERSION: &str = "0.4";
