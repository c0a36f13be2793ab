//! Engine-agnostic game logic: the stage director and the contracts it drives.
//!
//! Nothing here touches a window or the GPU. Platform and render crates plug in
//! through the traits in [`input`], [`render`], [`time`], [`stage`] and
//! [`cutscene`], which keeps the director testable with plain fakes.

pub mod animation;
pub mod config;
pub mod cutscene;
pub mod director;
pub mod input;
pub mod render;
pub mod stage;
pub mod time;

#[cfg(test)]
mod testing;
