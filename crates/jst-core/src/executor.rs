//! Translation of a single field value
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::coerce::coerce;
use crate::context::ExecutionContext;
use crate::planner::plan_pipeline;
use crate::typecast::TypecastPlan;
use crate::{Error, Result};
use serde_json::Value;
use tracing::{debug, trace};

/// Run one field's value through its planned providers
///
/// Plans the pipeline, keeps the providers whose predicate holds for the
/// starting value, resolves typecast placement, then threads the value
/// through the optional leading coercion, each provider in order, and the
/// optional trailing coercion. Each step is awaited before the next starts.
pub async fn translate_value(value: Option<Value>, ctx: &ExecutionContext<'_>) -> Result<Option<Value>> {
    let field = ctx.target_key;
    let pipeline = plan_pipeline(field, ctx.options, ctx.conversion, ctx.registry)?;
    let selected = pipeline.runnable(value.as_ref(), ctx);
    let plan = TypecastPlan::resolve(field, &selected, ctx.options.typecast)?;

    debug!(
        field,
        source = %ctx.source,
        planned = ?pipeline.names(),
        selected = ?selected.names(),
        typecast_before = plan.before,
        typecast_after = plan.after,
        "translating field"
    );

    let target_type = ctx.field.field_type;
    let mut current = value;

    if plan.before {
        current = coerce(field, current, target_type, ctx.options)?;
    }

    for provider in selected.iter() {
        trace!(field, provider = provider.name(), "running provider");
        current = provider
            .get_value(current, ctx.field, ctx)
            .await
            .map_err(|source| Error::Provider {
                provider: provider.name().to_string(),
                field: field.to_string(),
                source,
            })?;
    }

    if plan.after {
        current = coerce(field, current, target_type, ctx.options)?;
    }

    Ok(current)
}
