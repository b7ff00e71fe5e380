pub mod chapter;
pub mod navigation;
pub mod translation;

pub use chapter::{Chapter, ImportSource};
pub use navigation::{
    FetchOutcome, NavigationContext, NavigationOutcome, NavigationResult, MAX_NAVIGATION_HISTORY,
};
pub use translation::{
    TranslationRecord, TranslationResult, TranslationSettingsSnapshot, UsageMetrics,
};
