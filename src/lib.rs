//! # Lectern
//!
//! Navigation and content-resolution core for a chapter reader /
//! translation-study tool.
//!
//! ## Architecture
//!
//! A URL entering the system is resolved through tiers of increasing cost:
//!
//! ```text
//! URL → Normalizer → memory indices → Store (Hydrator) → network (Fetch)
//! ```
//!
//! - [`normalizer`]: canonicalizes URLs into lookup keys and detects
//!   supported provider domains
//! - [`navigator`]: tiered resolver, hydration with exit-safe signals,
//!   per-key fetch coalescing, history synchronization
//! - [`provider`]: site adapter trait + reqwest-based implementation
//! - [`store`]: SQLite persistence for chapters, URL mappings, and
//!   translation versions
//!
//! ## Quick Start
//!
//! ```bash
//! # Resolve a chapter URL (fetches on first sight)
//! lectern open https://ncode.syosetu.com/n0000a/1/
//!
//! # List the local library
//! lectern list
//!
//! # Show a chapter by stable ID
//! lectern show 92b4c1
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all
/// components: store, provider, navigator, hydrator, fetch coordinator.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/lectern/config.toml`: provider site list, fetch
/// settings, optional database path override.
pub mod config;

/// Core domain models.
///
/// - [`Chapter`](domain::Chapter): imported chapter with a stable SHA256 ID
/// - [`TranslationResult`](domain::TranslationResult): active translation
///   attached to a chapter at runtime
/// - [`NavigationContext`](domain::NavigationContext): session-lived
///   indices, threaded through calls as an immutable value
pub mod domain;

/// Navigation and content resolution — the core.
///
/// - [`Navigator`](navigator::Navigator): memory → store → fetch-needed
/// - [`Hydrator`](navigator::Hydrator): store loads with the exit-safe
///   hydrating signal
/// - [`FetchCoordinator`](navigator::FetchCoordinator) /
///   [`FetchRegistry`](navigator::FetchRegistry): coalesced fetching
pub mod navigator;

/// URL canonicalization and provider-domain detection.
pub mod normalizer;

/// Site adapters.
///
/// - [`Provider`](provider::Provider): async trait for fetch+parse
/// - [`HttpProvider`](provider::HttpProvider): reqwest-based implementation
/// - [`transform_imported_chapters`](provider::transform_imported_chapters):
///   raw payloads → chapters with stable IDs and URL mappings
pub mod provider;

/// SQLite persistence layer.
///
/// - [`ChapterStore`](store::ChapterStore): trait defining storage ops
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
