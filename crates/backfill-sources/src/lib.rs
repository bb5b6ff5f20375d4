pub mod error;
pub mod export;
pub mod traits;
pub mod trakt;

pub use error::SourceError;
pub use export::{read_export, ExportError, ExportFormat};
pub use traits::ShowCatalog;
pub use trakt::{trakt_authenticate, TraktClient};
