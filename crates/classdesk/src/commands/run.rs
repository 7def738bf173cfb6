//! `classdesk run <operation> [--target id] [--payload json]`

use serde_json::Value;

use classdesk_core::Dashboard;

use super::Ctx;
use crate::cli::RunArgs;
use crate::error::CliError;

pub async fn handle(args: RunArgs, dashboard: &Dashboard, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let payload: Value = match (&args.payload, &args.payload_file) {
        (Some(json), _) => serde_json::from_str(json)?,
        (None, Some(path)) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        (None, None) => Value::Object(serde_json::Map::new()),
    };

    let response = dashboard
        .run(args.operation, payload, args.target.as_deref())
        .await
        .map_err(|e| CliError::from_core(&e, ctx.profile()))?;

    ctx.print(&response);
    Ok(())
}
