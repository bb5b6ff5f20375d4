pub mod error;
pub mod title;
pub mod matching;
pub mod selector;
pub mod store;
pub mod resolver;
pub mod throttle;
pub mod import;

#[cfg(test)]
mod testing;

pub use error::{ImportError, StoreError};
pub use title::{normalize_title, NormalizedTitle};
pub use matching::titles_match;
pub use selector::{filter_candidates, select_candidates, Selection};
pub use store::{DisambiguationStore, ImportLedger, JsonDisambiguationStore, JsonImportLedger, JsonTable};
pub use resolver::{parse_selection, Choice, PromptRequest, Prompter, Resolution, Resolver, Unresolved, SKIP_TOKEN};
pub use throttle::{Throttle, ThrottledCatalog};
pub use import::{ImportDriver, ImportSettings, ImportSummary};
