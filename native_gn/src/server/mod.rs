pub mod bot_driver;
pub mod lobby;
pub mod run;
pub mod session;
pub mod state;
pub mod ws;

pub use run::{build_router, run_server};
pub use state::AppState;
