//! Topic validation for bridged event topics.
//!
//! Callers use plain event topics such as `org/example/event`. A pattern may
//! end in a whole `*` level to match everything below a prefix; that marker
//! is translated to the broker's multi-level wildcard `#` before it reaches
//! the wire.
//! The broker's own pattern syntax (`#`, `+`, `$`) is reserved and rejected.

use core::fmt;

/// Maximum topic length in bytes (UTF-8 encoded).
pub const MAX_TOPIC_LENGTH: usize = 1024;

/// Marker a caller may put at the end of a subscription pattern.
pub const PATTERN_WILDCARD: char = '*';

/// Multi-level wildcard understood by the broker.
pub const MULTI_LEVEL_WILDCARD: char = '#';

const RESERVED_CHARS: [char; 3] = ['#', '+', '$'];

/// Error type for topic validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicValidationError {
    /// Topic is empty (zero length).
    Empty,
    /// Topic exceeds maximum length.
    TooLong,
    /// Topic contains null character (U+0000).
    ContainsNullChar,
    /// Topic contains one of the broker's reserved characters.
    ReservedChar(char),
    /// `*` is not a whole final level of a pattern.
    MisplacedWildcard,
    /// Wildcards are not allowed in publish topics.
    WildcardInPublishTopic,
}

impl fmt::Display for TopicValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicValidationError::Empty => write!(f, "topic cannot be empty"),
            TopicValidationError::TooLong => {
                write!(
                    f,
                    "topic exceeds maximum length of {} bytes",
                    MAX_TOPIC_LENGTH
                )
            }
            TopicValidationError::ContainsNullChar => {
                write!(f, "topic cannot contain null character")
            }
            TopicValidationError::ReservedChar(c) => {
                write!(f, "topic cannot contain reserved character '{}'", c)
            }
            TopicValidationError::MisplacedWildcard => {
                write!(f, "wildcard (*) is only allowed as the whole last level")
            }
            TopicValidationError::WildcardInPublishTopic => {
                write!(f, "wildcard (*) not allowed in publish topics")
            }
        }
    }
}

impl std::error::Error for TopicValidationError {}

/// Validate a subscription pattern and translate it to a broker topic filter.
///
/// # Examples
///
/// ```
/// use herald_core::topic::to_topic_filter;
///
/// assert_eq!(to_topic_filter("org/example/*").unwrap(), "org/example/#");
/// assert_eq!(to_topic_filter("org/example").unwrap(), "org/example");
/// assert!(to_topic_filter("org/+/example").is_err());
/// assert!(to_topic_filter("org/*/example").is_err());
/// assert!(to_topic_filter("org/ex*").is_err());
/// ```
pub fn to_topic_filter(pattern: &str) -> Result<String, TopicValidationError> {
    validate_common(pattern)?;

    match pattern.find(PATTERN_WILDCARD) {
        None => Ok(pattern.to_string()),
        Some(pos)
            if pos == pattern.len() - 1 && (pos == 0 || pattern[..pos].ends_with('/')) =>
        {
            let mut filter = String::with_capacity(pattern.len());
            filter.push_str(&pattern[..pos]);
            filter.push(MULTI_LEVEL_WILDCARD);
            Ok(filter)
        }
        Some(_) => Err(TopicValidationError::MisplacedWildcard),
    }
}

/// Validate a topic name for publishing.
pub fn validate_publish_topic(topic: &str) -> Result<(), TopicValidationError> {
    validate_common(topic)?;

    if topic.contains(PATTERN_WILDCARD) {
        return Err(TopicValidationError::WildcardInPublishTopic);
    }

    Ok(())
}

fn validate_common(topic: &str) -> Result<(), TopicValidationError> {
    if topic.is_empty() {
        return Err(TopicValidationError::Empty);
    }

    if topic.len() > MAX_TOPIC_LENGTH {
        return Err(TopicValidationError::TooLong);
    }

    if topic.contains('\0') {
        return Err(TopicValidationError::ContainsNullChar);
    }

    if let Some(c) = topic.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(TopicValidationError::ReservedChar(c));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_patterns_pass_through() {
        assert_eq!(to_topic_filter("a").unwrap(), "a");
        assert_eq!(to_topic_filter("a/b/c").unwrap(), "a/b/c");
        assert_eq!(to_topic_filter("/leading/slash").unwrap(), "/leading/slash");
    }

    #[test]
    fn test_trailing_wildcard_translated() {
        assert_eq!(to_topic_filter("*").unwrap(), "#");
        assert_eq!(to_topic_filter("org/example/*").unwrap(), "org/example/#");
        assert_eq!(to_topic_filter("/*").unwrap(), "/#");
    }

    #[test]
    fn test_misplaced_wildcard() {
        assert_eq!(
            to_topic_filter("org/*/event"),
            Err(TopicValidationError::MisplacedWildcard)
        );
        assert_eq!(
            to_topic_filter("**"),
            Err(TopicValidationError::MisplacedWildcard)
        );
        // `#` must fill a whole level on the wire.
        assert_eq!(
            to_topic_filter("org/ex*"),
            Err(TopicValidationError::MisplacedWildcard)
        );
    }

    #[test]
    fn test_reserved_chars_rejected() {
        assert_eq!(
            to_topic_filter("org/#"),
            Err(TopicValidationError::ReservedChar('#'))
        );
        assert_eq!(
            to_topic_filter("org/+/event"),
            Err(TopicValidationError::ReservedChar('+'))
        );
        assert_eq!(
            validate_publish_topic("$SYS/broker"),
            Err(TopicValidationError::ReservedChar('$'))
        );
    }

    #[test]
    fn test_empty_and_null() {
        assert_eq!(to_topic_filter(""), Err(TopicValidationError::Empty));
        assert_eq!(
            validate_publish_topic("foo\0bar"),
            Err(TopicValidationError::ContainsNullChar)
        );
    }

    #[test]
    fn test_too_long() {
        let long_topic = "a".repeat(MAX_TOPIC_LENGTH + 1);
        assert_eq!(
            validate_publish_topic(&long_topic),
            Err(TopicValidationError::TooLong)
        );

        let max_topic = "a".repeat(MAX_TOPIC_LENGTH);
        assert!(validate_publish_topic(&max_topic).is_ok());
    }

    #[test]
    fn test_publish_topic_rejects_wildcard() {
        assert!(validate_publish_topic("org/example/event").is_ok());
        assert_eq!(
            validate_publish_topic("org/example/*"),
            Err(TopicValidationError::WildcardInPublishTopic)
        );
    }
}
