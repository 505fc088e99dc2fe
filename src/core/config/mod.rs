pub mod data;
pub mod io;


pub use data::{AddModelOutcome, Config, RemoveModelOutcome, DEFAULT_MODELS};
pub use io::ConfigPersistenceError;
