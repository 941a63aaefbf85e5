//! Commands understood by every tracker

use super::{push, push_param, AttributeParam, UriParam};
use crate::error::Result;
use crate::types::{TrackerInfo, ValueResult};
use crate::value::{from_backend_value, BackendValue};
use crate::warnings::CommandWarnings;
use crate::worker::Worker;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackerFromStringParam<'a> {
    str: &'a str,
    fake_filename: &'a str,
}

#[derive(Serialize)]
struct TargetFpsParam {
    #[serde(rename = "targetFPS")]
    target_fps: i32,
}

#[derive(Serialize)]
struct SetAttributeParam<'a> {
    att: &'a str,
    val: &'a str,
}

#[derive(Serialize)]
struct DeviceOrientationParam {
    mode: i32,
}

#[derive(Serialize)]
struct TimestampParam {
    timestamp: f64,
}

/// Create a tracker from a tracking configuration file
pub fn create_tracker(
    worker: &Worker,
    uri: &str,
) -> impl Future<Output = Result<TrackerInfo>> + Send + 'static {
    push_param(worker, "createTracker", &UriParam { uri }).into_json()
}

/// Create a tracker from configuration text. `fake_filename` is used to
/// resolve relative paths inside the configuration.
pub fn create_tracker_from_string(
    worker: &Worker,
    configuration: &str,
    fake_filename: &str,
) -> impl Future<Output = Result<TrackerInfo>> + Send + 'static {
    let param = TrackerFromStringParam {
        str: configuration,
        fake_filename,
    };
    push_param(worker, "createTrackerFromString", &param).into_json()
}

/// Target frame rate of the tracking thread
pub fn set_target_fps(
    worker: &Worker,
    target_fps: i32,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_param(worker, "setTargetFPS", &TargetFpsParam { target_fps }).into_unit()
}

/// Current value of an attribute, in its string form
pub fn get_attribute(
    worker: &Worker,
    attribute: &str,
) -> impl Future<Output = Result<String>> + Send + 'static {
    get_attribute_as::<String>(worker, attribute)
}

/// Current value of an attribute, interpreted as `T`
pub fn get_attribute_as<T: BackendValue + Send + 'static>(
    worker: &Worker,
    attribute: &str,
) -> impl Future<Output = Result<T>> + Send + 'static {
    let pending = push_param(worker, "getAttribute", &AttributeParam { att: attribute });
    async move {
        let result: ValueResult<Value> = pending.into_json().await?;
        from_backend_value(&result.value)
    }
}

pub fn set_attribute(
    worker: &Worker,
    attribute: &str,
    value: &str,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    let param = SetAttributeParam {
        att: attribute,
        val: value,
    };
    push_param(worker, "setAttribute", &param).into_warnings()
}

/// Set an attribute from a typed value
pub fn set_attribute_value<T: BackendValue>(
    worker: &Worker,
    attribute: &str,
    value: &T,
) -> impl Future<Output = Result<CommandWarnings>> + Send + 'static {
    set_attribute(worker, attribute, &value.to_backend_string())
}

pub fn run_tracking(worker: &Worker) -> impl Future<Output = Result<()>> + Send + 'static {
    push(worker, "runTracking").into_unit()
}

pub fn pause_tracking(worker: &Worker) -> impl Future<Output = Result<()>> + Send + 'static {
    push(worker, "pauseTracking").into_unit()
}

/// Orientation of the device, as a screen orientation code
pub fn set_device_orientation(
    worker: &Worker,
    mode: i32,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_param(worker, "setDeviceOrientation", &DeviceOrientationParam { mode }).into_unit()
}

/// Timestamp for the next frame, in seconds
pub fn set_timestamp(
    worker: &Worker,
    timestamp: f64,
) -> impl Future<Output = Result<()>> + Send + 'static {
    push_param(worker, "setTimestamp", &TimestampParam { timestamp }).into_unit()
}
