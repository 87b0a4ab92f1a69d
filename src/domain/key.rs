//! Identity of a rate-limited log pattern.
//!
//! A pattern is identified by its message template, optionally paired with a
//! severity level. Templates must be the un-interpolated form of the message
//! (`"saw event {}"`), otherwise every distinct value creates a new key.

use crate::domain::level::Level;
use std::fmt;
use std::sync::Arc;

/// Key of a rate-limited pattern: the template plus an optional level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    template: Arc<str>,
    level: Option<Level>,
}

impl PatternKey {
    /// Key shared by every level logged with this template.
    pub fn new(template: impl Into<Arc<str>>) -> Self {
        Self {
            template: template.into(),
            level: None,
        }
    }

    /// Key that only covers `level`.
    pub fn with_level(template: impl Into<Arc<str>>, level: Level) -> Self {
        Self {
            template: template.into(),
            level: Some(level),
        }
    }

    /// The message template.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub(crate) fn shared_template(&self) -> &Arc<str> {
        &self.template
    }

    /// The level this key is bound to, if any.
    pub fn level(&self) -> Option<Level> {
        self.level
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Some(level) => write!(f, "[{}] {}", level, self.template),
            None => f.write_str(&self.template),
        }
    }
}
