pub mod export;
pub(crate) mod lenient;
pub mod persist;

pub use persist::{InMemory, JsonFile, Persistence, Snapshot};
