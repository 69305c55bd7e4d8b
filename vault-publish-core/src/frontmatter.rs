//! Frontmatter extraction for markdown documents.
//!
//! A frontmatter block is YAML between a `---` line at the very start of the
//! file and the next `---` (or `...`) line. Anything that is not a YAML
//! mapping is treated as "no metadata", the same as a missing block.

use tracing::debug;

use crate::document::{MetaValue, Metadata};

/// Returns the raw YAML of the leading frontmatter block, if any.
pub fn split(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed == "---" || trimmed == "..." {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

/// Parses the frontmatter of `content` into [`Metadata`].
pub fn parse(content: &str) -> Option<Metadata> {
    let raw = split(content)?;
    if raw.trim().is_empty() {
        return Some(Metadata::new());
    }

    let mapping = match serde_yaml::from_str::<serde_yaml::Value>(raw) {
        Ok(serde_yaml::Value::Mapping(mapping)) => mapping,
        Ok(other) => {
            debug!(kind = ?other, "Frontmatter is not a mapping, ignoring");
            return None;
        }
        Err(e) => {
            debug!(error = %e, "Failed to parse frontmatter YAML, ignoring");
            return None;
        }
    };

    let metadata = mapping
        .into_iter()
        .filter_map(|(key, value)| match key {
            serde_yaml::Value::String(k) => Some((k, MetaValue::from(value))),
            _ => None,
        })
        .collect();
    Some(metadata)
}
