pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, GameData, load_config, load_game_data, load_map};
