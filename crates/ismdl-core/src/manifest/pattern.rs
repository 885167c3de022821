//! Pluggable scanning rules for fragment markers.

use regex::Regex;

/// A manifest dialect: finds fragment identifier tokens in manifest text.
///
/// Implementations return the digit runs in order of occurrence.
pub trait FragmentPattern: Send + Sync {
    fn name(&self) -> &str;
    fn scan<'t>(&self, text: &'t str) -> Vec<&'t str>;
}

/// Numeric token between a fixed prefix and a fixed marker, e.g.
/// `video=<digits>,format=`.
#[derive(Debug, Clone)]
pub struct MarkerPattern {
    name: String,
    regex: Regex,
}

impl MarkerPattern {
    /// Builds a rule matching `<prefix><digits><marker>`. Both strings are literal.
    pub fn new(name: impl Into<String>, prefix: &str, marker: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(
            r"{}([0-9]+){}",
            regex::escape(prefix),
            regex::escape(marker)
        ))?;
        Ok(Self {
            name: name.into(),
            regex,
        })
    }

    /// The Smooth Streaming HLS manifest rule: `video=<id>,format=`.
    pub fn smooth_streaming() -> Self {
        Self {
            name: "smooth-streaming".to_string(),
            regex: Regex::new(r"video=([0-9]+),format=").expect("static regex"),
        }
    }
}

impl FragmentPattern for MarkerPattern {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.regex
            .captures_iter(text)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }
}
