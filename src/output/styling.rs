//! Semantic terminal palette. Rendering code asks for a meaning (ok,
//! notice, alert) rather than a color, so the scheme stays consistent
//! across the summary sections and can change in one place.

use console::style;

pub fn heading(text: impl std::fmt::Display) -> String {
    style(text.to_string()).bright().underlined().to_string()
}

pub fn emphasis(text: impl std::fmt::Display) -> String {
    style(text.to_string()).bright().to_string()
}

pub fn ok(text: impl std::fmt::Display) -> String {
    style(text.to_string()).green().bright().to_string()
}

pub fn notice(text: impl std::fmt::Display) -> String {
    style(text.to_string()).yellow().bright().to_string()
}

pub fn alert(text: impl std::fmt::Display) -> String {
    style(text.to_string()).red().bright().to_string()
}

pub fn accent(text: impl std::fmt::Display) -> String {
    style(text.to_string()).cyan().to_string()
}

pub fn muted(text: impl std::fmt::Display) -> String {
    style(text.to_string()).dim().to_string()
}

pub fn brand(text: impl std::fmt::Display) -> String {
    style(text.to_string()).magenta().bold().to_string()
}
