/// State management module
///
/// This module handles the presentation-side state, including:
/// - Persisted viewer settings (settings.rs)
/// - Shared data structures (data.rs)
/// - Directory listing and the virtualized thumbnail list (browser.rs)

pub mod browser;
pub mod data;
pub mod settings;
