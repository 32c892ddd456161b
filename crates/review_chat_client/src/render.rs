//! Text rendering of the chat view. Functions here return plain strings;
//! colouring is applied by the caller through [`Palette`].

use std::fmt::Write as _;

use crate::messages::Source;
use crate::session::{ChatSession, Message, Role};
use crate::theme::Palette;

pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    }
}

pub fn status_label(busy: bool) -> &'static str {
    if busy {
        "Thinking…"
    } else {
        "Ready"
    }
}

/// Label of the sources toggle, or `None` when the message has no toggle.
pub fn sources_toggle_label(message: &Message, expanded: bool) -> Option<String> {
    if !message.has_sources() {
        return None;
    }
    Some(if expanded {
        "Hide sources".to_string()
    } else {
        format!("View sources ({})", message.sources.len())
    })
}

/// `"{brand} {model}"`, with `Unknown` standing in for a missing brand.
pub fn source_title(source: &Source) -> String {
    let meta = &source.metadata;
    format!(
        "{} {}",
        meta.brand().unwrap_or("Unknown"),
        meta.model().unwrap_or("")
    )
}

pub fn source_badges(source: &Source) -> Vec<String> {
    let meta = &source.metadata;
    let mut badges = Vec::new();
    if let Some(rating) = meta.rating() {
        badges.push(format!("rating {rating}"));
    }
    if let Some(battery) = meta.battery_life_rating() {
        badges.push(format!("battery {battery}"));
    }
    if let Some(sentiment) = meta.sentiment() {
        badges.push(sentiment.to_string());
    }
    badges
}

pub fn error_banner(message: &str) -> String {
    format!("Error: {message}")
}

/// Render one message. `number` is the 1-based position used by commands.
pub fn render_message(message: &Message, number: usize, expanded: bool, palette: &Palette) -> String {
    let mut out = String::new();
    let who = role_label(message.role);
    let who = match message.role {
        Role::User => palette.user(who),
        Role::Assistant => palette.assistant(who),
    };
    let _ = writeln!(
        out,
        "{} {} {}",
        palette.muted(&format!("[{number}]")),
        who,
        palette.muted(&message.timestamp)
    );
    for line in message.text.lines() {
        let _ = writeln!(out, "  {line}");
    }
    if let Some(label) = sources_toggle_label(message, expanded) {
        let _ = writeln!(out, "  {}", palette.muted(&format!("({label}: /sources {number})")));
    }
    if expanded && message.has_sources() {
        for source in &message.sources {
            out.push_str(&render_source(source, palette));
        }
    }
    out
}

pub fn render_source(source: &Source, palette: &Palette) -> String {
    let mut out = String::new();
    let badges = source_badges(source)
        .iter()
        .map(|b| palette.badge(&format!("[{b}]")).to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "    - {} {}", source_title(source).trim_end(), badges);
    for line in source.snippet.lines() {
        let _ = writeln!(out, "      {line}");
    }
    out
}

/// Full transcript followed by the error banner, if any.
pub fn render_transcript(session: &ChatSession, palette: &Palette) -> String {
    let mut out = String::new();
    for (i, message) in session.messages().iter().enumerate() {
        out.push_str(&render_message(
            message,
            i + 1,
            session.is_expanded(message.id),
            palette,
        ));
    }
    if let Some(error) = session.error() {
        let _ = writeln!(out, "{}", palette.error(&error_banner(error)));
    }
    out
}
