//! Typecast placement
//!
//! Providers may declare that built-in coercion must run before them, after
//! them, or not at all; the field may ask for its own placement. This module
//! folds those requests into at most one leading and one trailing coercion
//! and rejects combinations that contradict each other.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::options::TypecastMode;
use crate::planner::Pipeline;
use crate::provider::{Provider, TypecastPlacement};
use crate::{Error, Result};
use std::sync::Arc;

pub use crate::coerce::{coerce, should_coerce};

/// Where built-in coercion runs for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypecastPlan {
    /// Coerce the starting value before the providers run
    pub before: bool,
    /// Coerce the providers' result
    pub after: bool,
}

impl TypecastPlan {
    /// Coercion disabled in both positions
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Resolve placement from the selected providers and the field's option
    ///
    /// `selected` must hold only providers whose predicate holds for the field.
    pub fn resolve(field: &str, selected: &Pipeline, mode: Option<TypecastMode>) -> Result<Self> {
        let requires_start = first_with(selected, TypecastPlacement::Start);
        let requires_end = first_with(selected, TypecastPlacement::End);
        let disables = first_with(selected, TypecastPlacement::Off);

        if let (Some(start), Some(end)) = (&requires_start, &requires_end) {
            return Err(conflict(
                field,
                format!(
                    "pipeline requires typecast at start ('{}') and end ('{}') together",
                    start.name(),
                    end.name()
                ),
            ));
        }

        if let Some(off) = &disables {
            if let Some(requiring) = requires_start.as_ref().or(requires_end.as_ref()) {
                return Err(conflict(
                    field,
                    format!(
                        "pipeline both disables ('{}') and requires ('{}') typecast",
                        off.name(),
                        requiring.name()
                    ),
                ));
            }
            if let Some(mode) = mode.filter(|m| *m != TypecastMode::Off) {
                return Err(conflict(
                    field,
                    format!(
                        "provider '{}' disables typecast but the field requests '{}'",
                        off.name(),
                        mode
                    ),
                ));
            }
            return Ok(Self::disabled());
        }

        if mode == Some(TypecastMode::Off) {
            return Ok(Self::disabled());
        }

        Ok(Self {
            before: mode.map_or(true, TypecastMode::at_start) || requires_start.is_some(),
            after: mode.is_some_and(TypecastMode::at_end) || requires_end.is_some(),
        })
    }
}

fn first_with(selected: &Pipeline, placement: TypecastPlacement) -> Option<Arc<dyn Provider>> {
    selected
        .iter()
        .find(|p| p.typecast() == Some(placement))
        .cloned()
}

fn conflict(field: &str, message: String) -> Error {
    Error::TypecastConflict {
        field: field.to_string(),
        message,
    }
}
