//! The JSON transformation engine (spec §4.5) and the per-request
//! migration passes built on top of it (spec §4.7, steps 4-7).

use std::collections::BTreeMap;

use apiver_build::{EndpointDefinition, MigrationChain, Operation, TypeDescriptor, TypeRef, VersionChange};
use apiver_core::{json, CapturedFields, Error, ErrorKind, RequestInfo, ResponseInfo, Version};
use serde_json::Value;

/// How deep [`TypeDescriptor::analyze_fn`] is allowed to recurse for any one
/// endpoint's request/response type. Generous enough for realistic nested
/// payloads; exists to turn a missing cycle-breaking declaration into a
/// diagnosable error instead of a hang.
pub const DEFAULT_MAX_DEPTH: usize = 32;

fn schema_maps(
    type_ref: Option<&TypeRef>,
    extra_arrays: &BTreeMap<String, TypeRef>,
    max_depth: usize,
) -> Result<TypeDescriptor, Error> {
    let mut descriptor = match type_ref {
        Some(t) => TypeDescriptor::analyze_fn(t.descriptor, max_depth)
            .map_err(|e| Error::new(ErrorKind::MigrationPlanFailure, e.to_string()))?,
        None => TypeDescriptor::default(),
    };
    for (path, type_ref) in extra_arrays {
        descriptor.nested_arrays.insert(path.clone(), *type_ref);
    }
    Ok(descriptor)
}

/// Depth-first walk driven by the type descriptor, not by JSON shape (spec
/// §4.5, "Recursion discipline"). Applies `change`'s ops for `type_name` to
/// `node`, then recurses into every nested object/array the descriptor
/// declares at this path.
///
/// `is_final_step` marks the last change applied in a backward route — the
/// one that lands the body in the client's actual requested version. Only
/// there does an `AddField` restore a captured value instead of just
/// stripping (spec §4.7, step 7): earlier steps in the route still have
/// further stripping/renaming ahead of them, so restoring early would just
/// get re-mangled by a later step.
#[allow(clippy::too_many_arguments)]
fn transform_node(
    node: &mut Value,
    path: &str,
    type_name: &str,
    change: &VersionChange,
    nested_objects: &BTreeMap<String, TypeRef>,
    nested_arrays: &BTreeMap<String, TypeRef>,
    forward: bool,
    is_error: bool,
    is_client_error: bool,
    is_final_step: bool,
    captured: &mut CapturedFields,
) {
    // Step 1: non-object nodes (or a shape mismatch against the declared
    // schema) are a graceful skip, never an error.
    if !node.is_object() {
        return;
    }

    // Step 2: apply this change's ops for `type_name`, in declaration order.
    if let Some(ops) = change.ops_by_schema.get(type_name) {
        for schema_op in ops {
            if forward {
                schema_op.op.apply_forward(node, captured);
            } else {
                let should_apply = !is_error || schema_op.migrate_http_errors || matches!(schema_op.op, Operation::Rename { .. });
                if should_apply {
                    schema_op.op.apply_backward(node, is_client_error, captured);
                    // Step 7: on the final step, an AddField that the client
                    // itself sent a value for on the way in gets that value
                    // back, instead of being left stripped.
                    if is_final_step {
                        if let Operation::AddField { name, .. } = &schema_op.op {
                            if !json::has_field(node, name) {
                                if let Some(value) = captured.get(name).cloned() {
                                    let _ = json::set_field(node, name, value);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    // Steps 3-4: recurse into declared nested children. `node` is still an
    // object at this point (ops above don't change its top-level kind).
    let Value::Object(map) = node else { return };
    let field_names: Vec<String> = map.keys().cloned().collect();
    for field in field_names {
        let child_path = if path.is_empty() { field.clone() } else { format!("{path}.{field}") };
        if let Some(type_ref) = nested_objects.get(&child_path) {
            if let Some(child) = map.get_mut(&field) {
                transform_node(
                    child,
                    &child_path,
                    type_ref.name,
                    change,
                    nested_objects,
                    nested_arrays,
                    forward,
                    is_error,
                    is_client_error,
                    is_final_step,
                    captured,
                );
            }
        } else if let Some(type_ref) = nested_arrays.get(&child_path) {
            // Step 5: an unregistered-shape array (or a non-array under a
            // registered path) is left untouched.
            if let Some(Value::Array(items)) = map.get_mut(&field) {
                for item in items.iter_mut() {
                    transform_node(
                        item,
                        &child_path,
                        type_ref.name,
                        change,
                        nested_objects,
                        nested_arrays,
                        forward,
                        is_error,
                        is_client_error,
                        is_final_step,
                        captured,
                    );
                }
            }
        }
    }
}

/// Migrate a request forward from the client's version to head (spec §4.7,
/// step 4).
///
/// # Errors
///
/// Propagates a [`Operation::CustomRequest`](apiver_build::Operation::CustomRequest)
/// transformer's error, aborting migration.
pub fn migrate_request_forward(
    req: &mut RequestInfo,
    route: &[&VersionChange],
    request_type: Option<&TypeRef>,
    max_depth: usize,
    captured: &mut CapturedFields,
) -> Result<(), Error> {
    let descriptor = schema_maps(request_type, &BTreeMap::new(), max_depth)?;
    let type_name = request_type.map_or("", |t| t.name);
    for change in route {
        if request_type.is_some() {
            transform_node(
                &mut req.body,
                "",
                type_name,
                change,
                &descriptor.nested_objects,
                &descriptor.nested_arrays,
                true,
                false,
                false,
                false,
                captured,
            );
        }
        for op in &change.global_ops {
            op.apply_forward_global(req, captured)?;
        }
    }
    Ok(())
}

/// Migrate a response backward from head to the client's version (spec
/// §4.7, steps 6-7).
///
/// `route` must already be in tail-first (newest-to-oldest) order, as
/// produced by [`MigrationChain::route`] when `src > dst`.
pub fn migrate_response_backward(
    resp: &mut ResponseInfo,
    route: &[&VersionChange],
    response_type: Option<&TypeRef>,
    endpoint: &EndpointDefinition,
    max_depth: usize,
    captured: &mut CapturedFields,
) {
    let descriptor = match schema_maps(response_type, &endpoint.nested_array_element_types, max_depth) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, "type descriptor analysis failed during response migration");
            TypeDescriptor::default()
        }
    };
    let type_name = response_type.map_or("", |t| t.name);
    let is_error = resp.is_error();
    let is_client_error = resp.status.is_client_error();
    let last_index = route.len().checked_sub(1);

    for (i, change) in route.iter().enumerate() {
        let is_final_step = last_index == Some(i);
        if response_type.is_some() {
            transform_node(
                &mut resp.body,
                "",
                type_name,
                change,
                &descriptor.nested_objects,
                &descriptor.nested_arrays,
                false,
                is_error,
                is_client_error,
                is_final_step,
                captured,
            );
        }
        for op in &change.global_ops {
            if let Err(e) = op.apply_backward_global(resp, captured) {
                tracing::warn!(error = %e, "custom response transformer failed, continuing");
            }
        }
    }

    // Step 7: on the final step, `transform_node` restores a captured value
    // into any `AddField` the client itself had supplied (see its doc
    // comment). `RemoveField`'s own `apply_backward` separately restores its
    // own captures on every step, per its own (distinct, §4.2) symmetric
    // forward/backward contract. What's left here is diagnostic: a captured
    // field neither mechanism ever claims back, most likely because a
    // version change was edited after the fact.
    let claimed_names: Vec<String> = route
        .iter()
        .enumerate()
        .flat_map(|(i, change)| {
            let is_final_step = last_index == Some(i);
            change.ops_by_schema.values().flatten().filter_map(move |schema_op| match &schema_op.op {
                Operation::RemoveField { name } => Some((*name).to_string()),
                Operation::AddField { name, .. } if is_final_step => Some((*name).to_string()),
                _ => None,
            })
        })
        .collect();
    let unconsumed = captured.unconsumed(&claimed_names);
    if !unconsumed.is_empty() {
        tracing::debug!(fields = ?unconsumed, "captured request fields not restored by any response operation");
    }
}

/// Plan the forward route for a request: client version → head.
#[must_use]
pub fn forward_route<'a>(chain: &'a MigrationChain, client_version: &Version) -> Vec<&'a VersionChange> {
    chain.route(client_version, &Version::head())
}

/// Plan the backward route for a response: head → client version.
#[must_use]
pub fn backward_route<'a>(chain: &'a MigrationChain, client_version: &Version) -> Vec<&'a VersionChange> {
    chain.route(&Version::head(), client_version)
}
