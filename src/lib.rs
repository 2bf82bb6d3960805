//! fruitclash: cascade-resolution engine for a tile-matching combat game.
//!
//! A swap that lines up three or more equal symbols starts a cascade:
//! matched cells and everything their special tiles reach are cleared,
//! scored against the enemy, and refilled by gravity, pass after pass until
//! the board settles. [`TurnController`] drives this one observable step at
//! a time.

pub mod app;
pub mod chain;
pub mod combat;
pub mod config;
pub mod game;
pub mod gravity;
pub mod grid;
pub mod matcher;
pub mod rng;
pub mod scoring;
pub mod tile;
pub mod turn;

pub use config::{ConfigError, Rules};
pub use game::{BattleStatus, GameState};
pub use grid::{GRID_SIZE, Grid, GridError, Position};
pub use rng::{GameRng, RandomSource};
pub use tile::{Modifier, Symbol, Tile, TileId};
pub use turn::{CascadeEvent, Phase, Rejection, TurnController};
