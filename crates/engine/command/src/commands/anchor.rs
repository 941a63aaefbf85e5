//! Commands of multi model trackers, where each model group is an anchor
//!
//! Most anchor operations are ordinary model tracker commands wrapped in
//! `anchorCommand`, which scopes them to one anchor.

use super::model_tracker::{
    add_model_command, add_model_data_command, init_pose_command, model_enabled_command,
    model_occluder_command, model_uri_command, multiple_model_properties_command,
    remove_model_command, reset_parameter_command, rotation_constraint_command,
};
use super::{push_param, submit, AttributeParam};
use crate::command::{BinaryPayload, Command, ANCHOR_COMMAND};
use crate::error::{Error, Result};
use crate::pending::PendingCommand;
use crate::types::{
    AnchorValue, ModelDataDescriptorList, ModelDeserializationResultList, ModelProperties,
    ValueResult,
};
use crate::value::{from_backend_value, BackendValue};
use crate::warnings::CommandWarnings;
use crate::worker::Worker;
use glam::Vec3;
use serde::Serialize;
use std::future::Future;
use tracklink_transform::InitPose;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnchorNameParam<'a> {
    anchor_name: &'a str,
}

#[derive(Serialize)]
struct AddAnchorParam<'a> {
    name: &'a str,
    enabled: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnchorParentParam<'a> {
    anchor_name: &'a str,
    parent_anchor_name: &'a str,
}

#[derive(Serialize)]
struct SeparateAttributeParam<'a> {
    name: &'a str,
    values: &'a [AnchorValue],
}

fn push_anchor_name(worker: &Worker, name: &str, anchor: &str) -> PendingCommand {
    push_param(worker, name, &AnchorNameParam { anchor_name: anchor })
}

/// Push `inner` scoped to `anchor`
fn push_anchored(worker: &Worker, anchor: &str, inner: Result<Command>) -> PendingCommand {
    submit(
        worker,
        ANCHOR_COMMAND,
        inner.map(|command| Command::anchored(anchor, command)),
    )
}

pub fn add_anchor(
    worker: &Worker,
    name: &str,
    enabled: bool,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_param(worker, "addAnchor", &AddAnchorParam { name, enabled }).into_warnings()
}

/// Make the pose of `anchor` relative to `parent`
pub fn set_anchor_parent(
    worker: &Worker,
    anchor: &str,
    parent: &str,
) -> impl Future<Output = Result<()>> + Send + 'static {
    let param = AnchorParentParam {
        anchor_name: anchor,
        parent_anchor_name: parent,
    };
    push_param(worker, "setAnchorParent", &param).into_unit()
}

pub fn remove_anchor_parent(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_anchor_name(worker, "removeAnchorParent", anchor).into_unit()
}

pub fn anchor_exists(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<bool>> + Send + 'static {
    let pending = push_anchor_name(worker, "anchorExists", anchor);
    async move { Ok(pending.into_json::<ValueResult<bool>>().await?.value) }
}

pub fn remove_anchor(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_anchor_name(worker, "removeAnchor", anchor).into_unit()
}

pub fn enable_anchor(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_anchor_name(worker, "enableAnchor", anchor).into_unit()
}

pub fn disable_anchor(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_anchor_name(worker, "disableAnchor", anchor).into_unit()
}

pub fn anchor_enabled(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<bool>> + Send + 'static {
    let pending = push_anchor_name(worker, "anchorEnabled", anchor);
    async move { Ok(pending.into_json::<ValueResult<bool>>().await?.value) }
}

pub fn anchor_reset_soft(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_anchored(worker, anchor, Ok(Command::new("resetSoft"))).into_unit()
}

pub fn anchor_reset_hard(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_anchored(worker, anchor, Ok(Command::new("resetHard"))).into_unit()
}

pub fn anchor_get_init_pose(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<Option<InitPose>>> + Send + 'static {
    push_anchored(worker, anchor, Ok(Command::new("getInitPose"))).into_nullable_json()
}

pub fn anchor_add_model(
    worker: &Worker,
    anchor: &str,
    properties: &ModelProperties,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_anchored(worker, anchor, add_model_command(properties)).into_warnings()
}

pub fn anchor_remove_model(
    worker: &Worker,
    anchor: &str,
    model_name: &str,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_anchored(worker, anchor, remove_model_command(model_name)).into_unit()
}

pub fn anchor_set_model_enabled(
    worker: &Worker,
    anchor: &str,
    name: &str,
    enabled: bool,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_anchored(worker, anchor, model_enabled_command(name, enabled)).into_warnings()
}

pub fn anchor_set_model_occluder(
    worker: &Worker,
    anchor: &str,
    name: &str,
    occluder: bool,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_anchored(worker, anchor, model_occluder_command(name, occluder)).into_warnings()
}

pub fn anchor_set_model_uri(
    worker: &Worker,
    anchor: &str,
    name: &str,
    uri: &str,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_anchored(worker, anchor, model_uri_command(name, uri)).into_warnings()
}

pub fn anchor_set_model_properties(
    worker: &Worker,
    anchor: &str,
    models: &ModelDataDescriptorList,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_anchored(worker, anchor, multiple_model_properties_command(models)).into_warnings()
}

/// Set one attribute to a separate value per anchor
pub fn anchor_set_attribute(
    worker: &Worker,
    attribute: &str,
    values: &[AnchorValue],
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    let param = SeparateAttributeParam {
        name: attribute,
        values,
    };
    push_param(worker, "setAttributeSeparately", &param).into_warnings()
}

/// Value of an attribute on one anchor
///
/// The engine answers with the values of all anchors; the entry for
/// `anchor` is picked out, [`Error::AnchorNotFound`] if there is none.
pub fn anchor_get_attribute<T: BackendValue + Send + 'static>(
    worker: &Worker,
    anchor: &str,
    attribute: &str,
) -> impl Future<Output = Result<T>> + Send + 'static {
    let pending = push_param(worker, "getAttributeSeparately", &AttributeParam { att: attribute });
    let anchor = anchor.to_string();
    async move {
        let values: Vec<AnchorValue> = pending.into_json().await?;
        let entry = values
            .into_iter()
            .find(|v| v.anchor == anchor)
            .ok_or(Error::AnchorNotFound(anchor))?;
        from_backend_value(&entry.value)
    }
}

pub fn anchor_reset_parameter(
    worker: &Worker,
    anchor: &str,
    parameter_name: &str,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_anchored(worker, anchor, reset_parameter_command(parameter_name)).into_warnings()
}

pub fn anchor_add_model_data(
    worker: &Worker,
    anchor: &str,
    models: &ModelDataDescriptorList,
    data: impl Into<BinaryPayload>,
) -> impl Future<Output = Result<ModelDeserializationResultList>> + Send + 'static {
    push_anchored(worker, anchor, add_model_data_command(models, data.into())).into_json()
}

pub fn anchor_set_init_pose(
    worker: &Worker,
    anchor: &str,
    pose: &InitPose,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_anchored(worker, anchor, init_pose_command("setInitPose", pose)).into_warnings()
}

pub fn anchor_set_global_object_pose(
    worker: &Worker,
    anchor: &str,
    pose: &InitPose,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_anchored(worker, anchor, init_pose_command("setGlobalObjectPose", pose)).into_warnings()
}

pub fn anchor_set_relative_init_pose(
    worker: &Worker,
    anchor: &str,
    pose: &InitPose,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_anchored(worker, anchor, init_pose_command("setRelativeInitPose", pose)).into_warnings()
}

/// Sending `setRelativeInitPose` without a pose disables it
pub fn anchor_disable_relative_init_pose(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_anchored(worker, anchor, Ok(Command::new("setRelativeInitPose"))).into_warnings()
}

pub fn anchor_disable_init_pose(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    push_anchored(worker, anchor, Ok(Command::new("setInitPose"))).into_warnings()
}

pub fn anchor_set_1d_rotation_constraint(
    worker: &Worker,
    anchor: &str,
    up_world: Vec3,
    up_model: Vec3,
    center_model: Vec3,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_anchored(
        worker,
        anchor,
        rotation_constraint_command(up_world, up_model, center_model),
    )
    .into_unit()
}

pub fn anchor_disable_constraints(
    worker: &Worker,
    anchor: &str,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_anchored(worker, anchor, Ok(Command::new("disableConstraints"))).into_unit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimulatedEngine, SimulatedEngineConfig};
    use serde_json::json;

    fn start() -> (SimulatedEngine, Worker) {
        let engine = SimulatedEngine::start(SimulatedEngineConfig::default());
        let worker = Worker::new(engine.clone());
        worker.start().unwrap();
        (engine, worker)
    }

    #[tokio::test]
    async fn test_anchor_get_attribute() {
        let (engine, worker) = start();
        engine.respond(
            "getAttributeSeparately",
            json!([
                { "anchor": "car", "value": "0.5" },
                { "anchor": "door", "value": "0.75" }
            ])
            .to_string(),
        );

        let value: f32 = anchor_get_attribute(&worker, "door", "minInlierRatioInit").await.unwrap();
        assert!((value - 0.75).abs() < 1e-6);

        let missing = anchor_get_attribute::<f32>(&worker, "seat", "minInlierRatioInit").await;
        assert!(matches!(missing, Err(Error::AnchorNotFound(anchor)) if anchor == "seat"));
    }

    #[tokio::test]
    async fn test_anchored_commands_reach_inner_handler() {
        let (engine, worker) = start();
        engine.register_fn("setModelProperties", |command| async move {
            assert_eq!(command.anchor.as_deref(), Some("car"));
            Ok(r#"{"warnings":[]}"#.to_string())
        });

        let warnings = anchor_set_model_enabled(&worker, "car", "wheel", false).await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(engine.history(), vec!["setModelProperties"]);
    }

    #[tokio::test]
    async fn test_anchor_queries() {
        let (engine, worker) = start();
        engine.respond("anchorExists", r#"{"value":true}"#);
        engine.respond("anchorEnabled", r#"{"value":false}"#);

        assert!(anchor_exists(&worker, "car").await.unwrap());
        assert!(!anchor_enabled(&worker, "car").await.unwrap());
    }

    #[tokio::test]
    async fn test_disable_init_pose_has_no_param() {
        let (engine, worker) = start();
        engine.register_fn("setInitPose", |command| async move {
            assert!(command.param.is_none());
            Ok(String::new())
        });
        assert!(anchor_disable_init_pose(&worker, "car").await.unwrap().is_empty());
    }
}
