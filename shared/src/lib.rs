//! Shared types for the Game-Nights server.
//!
//! This crate contains the types spoken on the wire between the server and
//! its clients: cards and effects, player and lobby snapshots, game views,
//! and the client/server message enums. The server crate owns all game
//! logic; everything here is plain serializable data.

pub mod cards;
pub mod game;
pub mod lobby;
pub mod messages;
pub mod player;

pub use cards::*;
pub use game::*;
pub use lobby::*;
pub use messages::*;
pub use player::*;
