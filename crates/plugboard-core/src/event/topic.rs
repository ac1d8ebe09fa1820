use std::fmt;
use std::str::FromStr;

use crate::event::error::EventSystemError;

/// Delimiter joining topic segments in their string form
pub const DELIMITER: char = ':';

/// Top-level segment of every lifecycle topic
pub const PLUGIN_NAMESPACE: &str = "plugin";

/// Stand-in segment for plugins without a usable name
pub const ANONYMOUS: &str = "anonymous";

/// Outcome segment of error topics
pub const ERROR_OUTCOME: &str = "error";

/// A concrete, fully specified event name such as `plugin:cache:initializer`.
///
/// Segments are kept separately, so a segment containing the delimiter is
/// still a single segment for matching purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    segments: Vec<String>,
}

impl Topic {
    /// Build a topic from its segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// `plugin:<name>:<outcome>`, with `anonymous` standing in for an empty name
    pub fn plugin(name: &str, outcome: &str) -> Self {
        Self::new([PLUGIN_NAMESPACE, plugin_segment(name), outcome])
    }

    /// `plugin:<name>:error`
    pub fn plugin_error(name: &str) -> Self {
        Self::plugin(name, ERROR_OUTCOME)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Append segments, returning the extended topic
    pub fn join<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.extend(segments.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, "{}", DELIMITER)?;
            }
            first = false;
            f.write_str(segment)?;
        }
        Ok(())
    }
}

fn plugin_segment(name: &str) -> &str {
    if name.is_empty() { ANONYMOUS } else { name }
}

/// One segment of a subscription pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Matches exactly this segment
    Literal(String),
    /// `*`: matches any single segment
    Any,
    /// `**`: matches zero or more segments
    Rest,
}

/// A subscription pattern such as `plugin:*:error` or `plugin:**`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPattern {
    segments: Vec<PatternSegment>,
}

impl TopicPattern {
    /// Parse a delimiter-joined pattern
    pub fn parse(pattern: &str) -> Result<Self, EventSystemError> {
        if pattern.is_empty() {
            return Err(EventSystemError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "pattern is empty".to_string(),
            });
        }

        let mut segments = Vec::new();
        for (index, raw) in pattern.split(DELIMITER).enumerate() {
            let segment = match raw {
                "" => {
                    return Err(EventSystemError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: format!("segment {} is empty", index),
                    });
                }
                "*" => PatternSegment::Any,
                "**" => PatternSegment::Rest,
                literal => PatternSegment::Literal(literal.to_string()),
            };
            segments.push(segment);
        }
        Ok(Self { segments })
    }

    /// Pattern matching exactly the given topic, segment for segment
    pub fn exact(topic: &Topic) -> Self {
        Self {
            segments: topic
                .segments()
                .iter()
                .cloned()
                .map(PatternSegment::Literal)
                .collect(),
        }
    }

    /// Everything under the plugin namespace: `plugin:**`
    pub fn all_plugins() -> Self {
        Self {
            segments: vec![
                PatternSegment::Literal(PLUGIN_NAMESPACE.to_string()),
                PatternSegment::Rest,
            ],
        }
    }

    /// Every lifecycle outcome of one plugin: `plugin:<name>:*`
    pub fn plugin(name: &str) -> Self {
        Self {
            segments: vec![
                PatternSegment::Literal(PLUGIN_NAMESPACE.to_string()),
                PatternSegment::Literal(plugin_segment(name).to_string()),
                PatternSegment::Any,
            ],
        }
    }

    /// One outcome across all plugins: `plugin:*:<outcome>`
    pub fn outcome(outcome: &str) -> Self {
        Self {
            segments: vec![
                PatternSegment::Literal(PLUGIN_NAMESPACE.to_string()),
                PatternSegment::Any,
                PatternSegment::Literal(outcome.to_string()),
            ],
        }
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    pub fn matches(&self, topic: &Topic) -> bool {
        matches_segments(&self.segments, topic.segments())
    }
}

fn matches_segments(pattern: &[PatternSegment], topic: &[String]) -> bool {
    match pattern.split_first() {
        None => topic.is_empty(),
        Some((PatternSegment::Rest, rest)) => {
            (0..=topic.len()).any(|skip| matches_segments(rest, &topic[skip..]))
        }
        Some((PatternSegment::Any, rest)) => {
            !topic.is_empty() && matches_segments(rest, &topic[1..])
        }
        Some((PatternSegment::Literal(literal), rest)) => match topic.split_first() {
            Some((head, tail)) => head == literal && matches_segments(rest, tail),
            None => false,
        },
    }
}

impl FromStr for TopicPattern {
    type Err = EventSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                write!(f, "{}", DELIMITER)?;
            }
            match segment {
                PatternSegment::Literal(literal) => f.write_str(literal)?,
                PatternSegment::Any => f.write_str("*")?,
                PatternSegment::Rest => f.write_str("**")?,
            }
        }
        Ok(())
    }
}

impl From<&Topic> for TopicPattern {
    fn from(topic: &Topic) -> Self {
        Self::exact(topic)
    }
}
