//! `classdesk resources`: the readable kinds and write operations.

use serde_json::{Value, json};
use strum::IntoEnumIterator;

use classdesk_core::{InvalidationRouter, OperationKind, ResourceKind};

use crate::cli::GlobalOpts;
use crate::output;

pub fn handle(global: &GlobalOpts) {
    let router = InvalidationRouter::standard();

    let resources: Vec<Value> = ResourceKind::iter()
        .map(|kind| {
            let endpoint = kind.endpoint();
            json!({
                "name": kind.to_string(),
                "method": endpoint.method.as_str(),
                "path": endpoint.path,
                "param": kind.param(),
            })
        })
        .collect();

    let operations: Vec<Value> = OperationKind::iter()
        .map(|op| {
            json!({
                "name": op.to_string(),
                "path": op.endpoint().path,
                "id_field": op.id_field(),
                "invalidates": router
                    .rules_for(op)
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    let rendered = output::render(
        &global.output,
        &json!({ "resources": resources, "operations": operations }),
    );
    output::print_output(&rendered, global.quiet);
}
