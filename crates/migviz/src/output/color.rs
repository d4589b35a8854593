//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success:   green   (consistent graphs, recorded snapshots)
//!   - Warning:   yellow  (catalog load warnings, removed replacements)
//!   - Info:      cyan    (record keys, file names)
//!   - Muted:     dimmed  (timestamps, digests)
//!   - Emphasis:  bold    (section headers)

use colored::Colorize;

use super::OutputConfig;
use crate::graph::ReplacementOutcome;

/// Apply semantic "success" color (green) to text.
pub(crate) fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub(crate) fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply semantic "info" color (cyan) to text.
pub(crate) fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Apply dimmed style to text.
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Color a replacement outcome: green when the replacing record was kept,
/// yellow when it was removed.
pub(crate) fn colorize_outcome(outcome: &ReplacementOutcome, config: &OutputConfig) -> String {
    if outcome.keeps_replacing() {
        success(outcome.as_str(), config)
    } else {
        warning(outcome.as_str(), config)
    }
}

/// Success icon, with ASCII fallback.
pub(crate) fn ok_icon(config: &OutputConfig) -> String {
    let icon = if config.use_ascii { "+" } else { "✓" };
    success(icon, config)
}

/// Warning icon, with ASCII fallback.
pub(crate) fn warn_icon(config: &OutputConfig) -> String {
    let icon = if config.use_ascii { "!" } else { "⚠" };
    warning(icon, config)
}
