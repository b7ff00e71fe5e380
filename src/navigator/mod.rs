//! Navigation and content resolution.
//!
//! Maps an externally supplied URL to a locally addressable chapter through
//! tiered lookup, in increasing cost order:
//!
//! ```text
//! URL → normalize → memory indices → persistent store → network fetch
//! ```
//!
//! - [`Navigator`]: the tiered resolver ([`Navigator::handle_navigate`])
//! - [`Hydrator`]: loads a chapter + active translation from the store,
//!   with an exit-safe "hydrating" signal
//! - [`FetchRegistry`]: coalesces concurrent fetches per normalized key
//! - [`FetchCoordinator`]: resolves still-unknown URLs via store mapping
//!   or coalesced network fetch
//! - [`SessionHistory`]/[`update_browser_history`]: history-stack sync so
//!   back/forward re-enters the resolver

mod dedup;
mod fetch;
mod history;
mod hydrator;
mod resolver;

pub use dedup::{FetchRegistry, SharedFetch};
pub use fetch::FetchCoordinator;
pub use history::{update_browser_history, BrowserHistory, HistoryEntry, SessionHistory};
pub use hydrator::{ChapterLoader, HydratedChapter, HydratingCallback, Hydrator};
pub use resolver::Navigator;
