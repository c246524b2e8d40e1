//! Source path resolution
//!
//! Field declarations name their source value with a dotted key path where any
//! segment may carry bracket indices (`order.lines[2].sku`). Keys starting with
//! `$$` are sentinels handled by injection providers; they are classified once
//! into a [`SourceRef`] so nothing downstream re-inspects the prefix.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// Sentinel naming the whole source object
pub const ROOT_SENTINEL: &str = "$$ROOT";

/// Prefix reserved for injected sources
pub const SENTINEL_PREFIX: &str = "$$";

static SEGMENT_PATTERN: OnceLock<Regex> = OnceLock::new();

fn segment_pattern() -> &'static Regex {
    SEGMENT_PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<key>[^\[\]]*)(?P<indices>(?:\[\d+\])*)$").expect("segment pattern is valid")
    })
}

/// One step of a key path: an optional property name followed by array indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub key: String,
    pub indices: Vec<usize>,
}

/// A parsed dotted/indexed key path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl KeyPath {
    /// Parse a key path such as `a.b[2].c`
    ///
    /// Segments whose brackets do not hold plain indices are kept verbatim as
    /// property names, so parsing never fails.
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .map(|segment| match segment_pattern().captures(segment) {
                Some(caps) => {
                    let indices = caps["indices"]
                        .split(|c| c == '[' || c == ']')
                        .filter(|part| !part.is_empty())
                        .filter_map(|part| part.parse::<usize>().ok())
                        .collect();
                    PathSegment {
                        key: caps["key"].to_string(),
                        indices,
                    }
                }
                None => PathSegment {
                    key: segment.to_string(),
                    indices: Vec::new(),
                },
            })
            .collect();

        Self {
            raw: path.to_string(),
            segments,
        }
    }

    /// The path as written in the schema
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walk the path through `source`
    ///
    /// Returns `None` as soon as a step is absent or `null`. Present falsy
    /// values (`0`, `false`, `""`) resolve normally.
    pub fn resolve<'v>(&self, source: &'v Value) -> Option<&'v Value> {
        let mut current = source;

        for segment in &self.segments {
            if !segment.key.is_empty() || segment.indices.is_empty() {
                current = property(current, &segment.key)?;
            }
            for index in &segment.indices {
                current = match current {
                    Value::Array(items) => items.get(*index)?,
                    _ => return None,
                };
                if current.is_null() {
                    return None;
                }
            }
        }

        Some(current)
    }
}

fn property<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    let found = match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    };
    found.filter(|v| !v.is_null())
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Where a field's starting value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// An ordinary key path into the source object
    Path(KeyPath),
    /// `$$ROOT`: the entire source object, supplied by injection
    Root,
    /// Any other `$$` key, looked up in the field's `inject` map
    Global(String),
}

impl SourceRef {
    /// Classify a raw `from` string
    pub fn parse(raw: &str) -> Self {
        if raw == ROOT_SENTINEL {
            SourceRef::Root
        } else if raw.starts_with(SENTINEL_PREFIX) {
            SourceRef::Global(raw.to_string())
        } else {
            SourceRef::Path(KeyPath::parse(raw))
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, SourceRef::Path(_))
    }

    /// The raw key as written in the schema
    pub fn key(&self) -> &str {
        match self {
            SourceRef::Path(path) => path.as_str(),
            SourceRef::Root => ROOT_SENTINEL,
            SourceRef::Global(key) => key,
        }
    }

    /// Resolve against the source object; sentinels never resolve here
    pub fn resolve<'v>(&self, source: &'v Value) -> Option<&'v Value> {
        match self {
            SourceRef::Path(path) => path.resolve(source),
            SourceRef::Root | SourceRef::Global(_) => None,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Resolve `path` against `source`, passing `$$` sentinels through unresolved
pub fn resolve(path: &str, source: &Value) -> Option<Value> {
    SourceRef::parse(path).resolve(source).cloned()
}
