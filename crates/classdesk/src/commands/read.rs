//! `classdesk read <resource> [param]`

use std::sync::Arc;

use classdesk_core::{CacheEntry, Dashboard, ResourceQuery};
use futures_util::StreamExt;
use serde_json::{Value, json};

use super::Ctx;
use crate::cli::ReadArgs;
use crate::error::CliError;

pub async fn handle(args: ReadArgs, dashboard: &Dashboard, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let query = match args.param {
        Some(param) => ResourceQuery::with_param(args.resource, param),
        None => ResourceQuery::new(args.resource),
    };
    if !query.is_ready() {
        return Err(CliError::Validation {
            field: "param".into(),
            reason: format!(
                "{} requires {}",
                query.kind,
                query.kind.param().unwrap_or("a parameter")
            ),
        });
    }

    let entry = if args.watch {
        watch(dashboard, &query, ctx).await?
    } else {
        dashboard.fetch(&query).await
    };

    if let Some(err) = entry.error.as_ref().filter(|_| !entry.is_success()) {
        return Err(CliError::from_core(err, ctx.profile()));
    }

    ctx.print(entry.data.as_deref().unwrap_or(&Value::Null));
    Ok(())
}

/// Print each state transition on stderr until the read settles.
async fn watch(
    dashboard: &Dashboard,
    query: &ResourceQuery,
    ctx: &Ctx<'_>,
) -> Result<Arc<CacheEntry<Value>>, CliError> {
    let mut stream = dashboard.read(query).into_stream();
    while let Some(entry) = stream.next().await {
        if !ctx.global.quiet {
            eprintln!(
                "{}",
                json!({ "key": entry.key.to_string(), "status": entry.status.to_string() })
            );
        }
        if !entry.is_loading() {
            return Ok(entry);
        }
    }
    Err(CliError::Internal {
        message: format!("{} was evicted before it settled", query.key()),
    })
}
