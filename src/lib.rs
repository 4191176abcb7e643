pub mod buffer;
pub mod config;
pub mod edit;
pub mod editor;
pub mod error;
pub mod loader;
pub mod logging;
pub mod mode;
pub mod persist;
pub mod search;
pub mod ui;

pub use buffer::{Cursor, Document, Motion, Resident, Window, CACHE_SIZE};
pub use config::{Cli, Config};
pub use editor::Session;
pub use error::{CoreError, CoreResult};
pub use loader::{CancellationSignal, LoadRequest, LoaderResponse, PrefetchLoader};
pub use persist::{SaveOptions, SaveReport};
pub use search::{Match, SearchState};
