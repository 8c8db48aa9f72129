// Text cleanup module
// Strips configured noise (edition tags and the like) from the strings shown in the presence

use crate::config::CleanupConfig;
use regex::Regex;
use std::borrow::Cow;

#[derive(Debug, Default)]
pub struct TextCleaner {
    patterns: Vec<Regex>,
}

impl TextCleaner {
    /// Compile the configured patterns. Invalid patterns are logged and skipped.
    pub fn new(config: &CleanupConfig) -> Self {
        if !config.enabled {
            return Self::default();
        }

        let patterns = config
            .patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("Ignoring invalid cleanup pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    /// Remove every pattern from `text`. Borrows when nothing matched.
    pub fn clean<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !self.patterns.iter().any(|re| re.is_match(text)) {
            return Cow::Borrowed(text);
        }

        let mut result = text.to_string();
        for pattern in &self.patterns {
            result = pattern.replace_all(&result, "").into_owned();
        }

        let trimmed = result.trim();
        if trimmed.is_empty() {
            // Never blank out a name entirely
            return Cow::Borrowed(text);
        }
        Cow::Owned(trimmed.to_string())
    }
}
