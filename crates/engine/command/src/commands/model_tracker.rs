//! Commands of model based trackers

use super::{build, push, push_param, submit, ModelNameParam, UriParam};
use crate::command::{BinaryPayload, Command};
use crate::error::Result;
use crate::pending::PendingCommand;
use crate::types::{
    ModelDataDescriptorList, ModelDeserializationResultList, ModelProperties, ModelPropertiesList,
    RotationConstraint,
};
use crate::warnings::CommandWarnings;
use crate::worker::Worker;
use glam::Vec3;
use serde::Serialize;
use std::future::Future;
use tracing::{error, warn};
use tracklink_transform::InitPose;

#[derive(Serialize)]
struct ModelEnabledParam<'a> {
    name: &'a str,
    enabled: bool,
}

#[derive(Serialize)]
struct ModelOccluderParam<'a> {
    name: &'a str,
    occluder: bool,
}

#[derive(Serialize)]
struct ModelUriParam<'a> {
    name: &'a str,
    uri: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParameterNameParam<'a> {
    parameter_name: &'a str,
}

// Builders shared with the anchor scoped variants

pub(crate) fn init_pose_command(name: &str, pose: &InitPose) -> Result<Command> {
    build(name, pose)
}

pub(crate) fn add_model_command(properties: &ModelProperties) -> Result<Command> {
    build("addModel", properties)
}

pub(crate) fn remove_model_command(model_name: &str) -> Result<Command> {
    build("removeModel", &ModelNameParam { model_name })
}

pub(crate) fn model_enabled_command(name: &str, enabled: bool) -> Result<Command> {
    build("setModelProperties", &ModelEnabledParam { name, enabled })
}

pub(crate) fn model_occluder_command(name: &str, occluder: bool) -> Result<Command> {
    build("setModelProperties", &ModelOccluderParam { name, occluder })
}

pub(crate) fn model_uri_command(name: &str, uri: &str) -> Result<Command> {
    build("setModelProperties", &ModelUriParam { name, uri })
}

pub(crate) fn multiple_model_properties_command(
    models: &ModelDataDescriptorList,
) -> Result<Command> {
    build("setMultipleModelProperties", models)
}

pub(crate) fn rotation_constraint_command(
    up_world: Vec3,
    up_model: Vec3,
    center_model: Vec3,
) -> Result<Command> {
    build(
        "set1DRotationConstraint",
        &RotationConstraint::new(up_world, up_model, center_model),
    )
}

pub(crate) fn reset_parameter_command(parameter_name: &str) -> Result<Command> {
    build("resetParameter", &ParameterNameParam { parameter_name })
}

pub(crate) fn add_model_data_command(
    models: &ModelDataDescriptorList,
    data: BinaryPayload,
) -> Result<Command> {
    let expected = models.binary_size();
    if data.len() < expected {
        warn!(
            expected,
            actual = data.len(),
            "Binary model data is smaller than its descriptors require"
        );
    }
    Ok(build("addModelData", models)?.with_binary(data))
}

pub fn reset_soft(worker: &Worker) -> impl Future<Output = Result<()>> + Send + 'static {
    push(worker, "resetSoft").into_unit()
}

/// Reset tracking and discard all learned init data
pub fn reset_hard(worker: &Worker) -> impl Future<Output = Result<()>> + Send + 'static {
    push(worker, "resetHard").into_unit()
}

/// Current init pose, `None` if the tracker has none
pub fn get_init_pose(
    worker: &Worker,
) -> impl Future<Output = Result<Option<InitPose>>> + Send + 'static {
    push(worker, "getInitPose").into_nullable_json()
}

pub fn set_init_pose(
    worker: &Worker,
    pose: &InitPose,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    submit(worker, "setInitPose", init_pose_command("setInitPose", pose)).into_warnings()
}

/// Init pose relative to the global object pose
pub fn set_relative_init_pose(
    worker: &Worker,
    pose: &InitPose,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    submit(
        worker,
        "setRelativeInitPose",
        init_pose_command("setRelativeInitPose", pose),
    )
    .into_warnings()
}

/// Pose of the tracked object in the global coordinate system
pub fn set_global_object_pose(
    worker: &Worker,
    pose: &InitPose,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    submit(
        worker,
        "setGlobalObjectPose",
        init_pose_command("setGlobalObjectPose", pose),
    )
    .into_warnings()
}

/// Raw JSON of all tracker parameters that differ from their defaults
pub fn get_non_default_attributes(
    worker: &Worker,
) -> impl Future<Output = Result<String>> + Send + 'static {
    push(worker, "getNonDefaultAttributes")
}

/// Write learned init data, to the default location if `uri` is `None`
pub fn write_init_data(
    worker: &Worker,
    uri: Option<&str>,
) -> impl Future<Output = Result<()>> + Send + 'static {
    let pending = match uri {
        Some(uri) => push_param(worker, "writeInitData", &UriParam { uri }),
        None => push(worker, "writeInitData"),
    };
    pending.into_unit()
}

pub fn read_init_data(
    worker: &Worker,
    uri: &str,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_param(worker, "readInitData", &UriParam { uri }).into_unit()
}

pub fn reset_init_data(worker: &Worker) -> impl Future<Output = Result<()>> + Send + 'static {
    push(worker, "resetInitData").into_unit()
}

pub fn add_model(
    worker: &Worker,
    properties: &ModelProperties,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    submit(worker, "addModel", add_model_command(properties)).into_warnings()
}

pub fn get_model_properties(
    worker: &Worker,
) -> impl Future<Output = Result<ModelPropertiesList>> + Send + 'static {
    push(worker, "getModelProperties").into_json()
}

pub fn remove_model(
    worker: &Worker,
    model_name: &str,
) -> impl Future<Output = Result<()>> + Send + 'static {
    submit(worker, "removeModel", remove_model_command(model_name)).into_unit()
}

pub fn set_model_enabled(
    worker: &Worker,
    name: &str,
    enabled: bool,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    submit(worker, "setModelProperties", model_enabled_command(name, enabled)).into_warnings()
}

/// Occluders hide other models but are not tracked themselves
pub fn set_model_occluder(
    worker: &Worker,
    name: &str,
    occluder: bool,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    submit(worker, "setModelProperties", model_occluder_command(name, occluder)).into_warnings()
}

pub fn set_model_uri(
    worker: &Worker,
    name: &str,
    uri: &str,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    submit(worker, "setModelProperties", model_uri_command(name, uri)).into_warnings()
}

pub fn set_multiple_model_properties(
    worker: &Worker,
    models: &ModelDataDescriptorList,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    submit(
        worker,
        "setMultipleModelProperties",
        multiple_model_properties_command(models),
    )
    .into_warnings()
}

/// Restrict the model rotation to the axis `up_model`, aligned with
/// `up_world`. All vectors are in engine space.
pub fn set_1d_rotation_constraint(
    worker: &Worker,
    up_world: Vec3,
    up_model: Vec3,
    center_model: Vec3,
) -> impl Future<Output = Result<()>> + Send + 'static {
    submit(
        worker,
        "set1DRotationConstraint",
        rotation_constraint_command(up_world, up_model, center_model),
    )
    .into_unit()
}

pub fn disable_constraints(worker: &Worker) -> impl Future<Output = Result<()>> + Send + 'static {
    push(worker, "disableConstraints").into_unit()
}

/// Add models whose geometry is sent as binary data
pub fn add_model_data(
    worker: &Worker,
    models: &ModelDataDescriptorList,
    data: impl Into<BinaryPayload>,
) -> impl Future<Output = Result<ModelDeserializationResultList>> + Send + 'static {
    submit(worker, "addModelData", add_model_data_command(models, data.into())).into_json()
}

/// Pass the platform's spatial coordinate system to the engine.
/// A null handle is logged and nothing is sent.
pub fn set_global_coordinate_system(
    worker: &Worker,
    handle: u64,
) -> impl Future<Output = Result<()>> + Send + 'static {
    const NAME: &str = "setGlobalCoordinateSystem";
    let pending = if handle == 0 {
        error!("Can not set the global coordinate system to a null handle");
        PendingCommand::ready(NAME, Ok(String::new()))
    } else {
        worker.push_command(Command::new(NAME).with_binary(BinaryPayload::Handle(handle)))
    };
    pending.into_unit()
}

/// Reset a tracking parameter to its default value
pub fn reset_parameter(
    worker: &Worker,
    parameter_name: &str,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    submit(worker, "resetParameter", reset_parameter_command(parameter_name)).into_warnings()
}
