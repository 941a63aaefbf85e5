//! Engine issues: error codes, warnings and command errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for info fields the engine did not send
const MISSING_VALUE: &str = "XXX";

/// Numeric issue code reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueCode(pub i32);

impl IssueCode {
    pub const INTERNAL_ERROR: IssueCode = IssueCode(100);

    // Command execution
    pub const COMMAND_CANCELED: IssueCode = IssueCode(200);
    pub const COMMAND_NOT_SUPPORTED: IssueCode = IssueCode(201);
    pub const COMMAND_INTERNAL_PROBLEM: IssueCode = IssueCode(202);
    pub const COMMAND_INVALID_PARAMETER: IssueCode = IssueCode(203);
    pub const COMMAND_PARAMETER_VALUE_NOT_SUPPORTED: IssueCode = IssueCode(204);
    pub const COMMAND_CURRENTLY_NOT_POSSIBLE: IssueCode = IssueCode(205);
    pub const PARAMETER_CONSTANT_VALUE: IssueCode = IssueCode(206);

    // Files and configuration
    pub const FILE_READING_FAILED: IssueCode = IssueCode(300);
    pub const FILE_WRITING_FAILED: IssueCode = IssueCode(301);
    pub const FILE_INVALID: IssueCode = IssueCode(302);
    pub const FILE_SYNTAX_ERROR: IssueCode = IssueCode(303);
    pub const FILE_FORMAT_NOT_ALLOWED: IssueCode = IssueCode(304);
    pub const JSON_FILE_INVALID_PARAMETER: IssueCode = IssueCode(305);
    pub const UNSUPPORTED_SCHEME: IssueCode = IssueCode(306);
    pub const DEPRECATION_WARNING: IssueCode = IssueCode(307);

    // Models
    pub const MODEL_LOAD_FAILED: IssueCode = IssueCode(400);
    pub const MODEL_DECODE_FAILED: IssueCode = IssueCode(401);
    pub const MODEL_NOT_FOUND: IssueCode = IssueCode(402);
    pub const DUPLICATE_MODEL_NAME: IssueCode = IssueCode(403);
    pub const DUPLICATE_MODEL_ID: IssueCode = IssueCode(404);
    pub const IMPLAUSIBLE_METRIC: IssueCode = IssueCode(405);

    // Anchors
    pub const DUPLICATE_ANCHOR_NAME: IssueCode = IssueCode(500);
    pub const ANCHOR_NAME_NOT_FOUND: IssueCode = IssueCode(501);
    pub const ANCHOR_IS_DESCENDANT: IssueCode = IssueCode(502);

    // Licensing
    pub const LICENSE_INVALID: IssueCode = IssueCode(600);
    pub const LICENSE_EXPIRED: IssueCode = IssueCode(601);
    pub const LICENSE_NOT_SET: IssueCode = IssueCode(602);
    pub const LICENSE_INVALID_FEATURE: IssueCode = IssueCode(603);
    pub const LICENSE_UNREGISTERED_MODELS: IssueCode = IssueCode(604);
    pub const LICENSE_EXPIRING_SOON: IssueCode = IssueCode(605);

    // Devices
    pub const NO_CAMERA_CONNECTED: IssueCode = IssueCode(700);
    pub const NO_CAMERA_ACCESS: IssueCode = IssueCode(701);
    pub const FEATURE_NOT_SUPPORTED: IssueCode = IssueCode(702);

    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Info,
    Notification,
    #[default]
    Warning,
    Error,
}

/// A problem reported by the engine, either as a warning next to a
/// successful result or as the body of a [`CommandError`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Issue {
    pub level: IssueLevel,
    pub code: IssueCode,
    pub command_name: String,
    pub info: String,
    pub message: String,
}

impl Issue {
    pub fn warning(code: IssueCode, info: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            code,
            info: info.into(),
            ..Default::default()
        }
    }

    pub fn with_command(mut self, command_name: impl Into<String>) -> Self {
        self.command_name = command_name.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Human readable description of the issue
    pub fn describe(&self) -> String {
        let info = self.info.as_str();
        let command = self.command_name.as_str();

        match self.code {
            IssueCode::INTERNAL_ERROR => "Internal error occurred".to_string(),
            IssueCode::COMMAND_CANCELED => format!("The command \"{command}\" was aborted"),
            IssueCode::COMMAND_NOT_SUPPORTED => format!(
                "The command \"{command}\" is not supported by the current pipeline ({info})"
            ),
            IssueCode::COMMAND_INTERNAL_PROBLEM => {
                format!("The command \"{command}\" failed because of an internal problem: {info}")
            }
            IssueCode::COMMAND_INVALID_PARAMETER => {
                let [parameter, structure] = split_values(info, " :: ");
                format!(
                    "The command \"{command}\" could not be executed: parameter \"{parameter}\" \
                     must have the structure {structure}"
                )
            }
            IssueCode::COMMAND_PARAMETER_VALUE_NOT_SUPPORTED => {
                let [parameter, value, pipeline] = split_values(info, " :: ");
                format!(
                    "The command \"{command}\" could not be executed: \"{parameter}\" = \"{value}\" \
                     is not supported by the current pipeline ({pipeline})"
                )
            }
            IssueCode::COMMAND_CURRENTLY_NOT_POSSIBLE => {
                format!("The command \"{command}\" is currently not possible: \"{}\"", self.message)
            }
            IssueCode::PARAMETER_CONSTANT_VALUE => {
                let [parameter, value, reason] = split_values(info, " :: ");
                let value = if value.is_empty() {
                    "It has a fixed value".to_string()
                } else {
                    format!("It has the fixed value \"{value}\"")
                };
                let reason = if reason.is_empty() {
                    "a requirement is not met".to_string()
                } else {
                    format!("a requirement is not met: {reason}")
                };
                format!("The parameter \"{parameter}\" could not be set. {value} because {reason}")
            }
            IssueCode::FILE_READING_FAILED => {
                format!("Failed to load from file {}", describe_uri(info))
            }
            IssueCode::FILE_WRITING_FAILED => {
                format!("Failed to write into file {}", describe_uri(info))
            }
            IssueCode::FILE_INVALID => format!("File is not valid: {}", describe_uri(info)),
            IssueCode::FILE_SYNTAX_ERROR => {
                format!("Failed to parse file because of a syntax error: {info}")
            }
            IssueCode::FILE_FORMAT_NOT_ALLOWED => {
                format!("Files with extension \"{info}\" can not be loaded here")
            }
            IssueCode::JSON_FILE_INVALID_PARAMETER => {
                let [file, parameter, structure] = split_values(info, " :: ");
                format!(
                    "Invalid parameter in \"{file}\": \"{parameter}\" must have the structure \"{structure}\""
                )
            }
            IssueCode::UNSUPPORTED_SCHEME => {
                let [scheme, _] = split_values(info, " :: ");
                format!("Unsupported file path scheme: \"{scheme}\"")
            }
            IssueCode::DEPRECATION_WARNING => {
                let [old, new] = split_values(info, "-");
                format!("Used deprecated parameter \"{old}\"; use \"{new}\" instead")
            }
            IssueCode::MODEL_LOAD_FAILED => format!("Failed to load model \"{info}\""),
            IssueCode::MODEL_DECODE_FAILED => format!("Failed to decode model \"{info}\""),
            IssueCode::MODEL_NOT_FOUND => format!("The model \"{info}\" does not exist"),
            IssueCode::DUPLICATE_MODEL_NAME => {
                format!("The model name \"{info}\" is already in use")
            }
            IssueCode::DUPLICATE_MODEL_ID => {
                let [first, second] = split_values(info, " :: ");
                format!("The models \"{first}\" and \"{second}\" produce the same model ID")
            }
            IssueCode::IMPLAUSIBLE_METRIC => {
                format!("The model metric is implausible, bounding box dimensions: {info}")
            }
            IssueCode::DUPLICATE_ANCHOR_NAME => {
                format!("The anchor name \"{info}\" is used more than once")
            }
            IssueCode::ANCHOR_NAME_NOT_FOUND => format!("No anchor named \"{info}\" exists"),
            IssueCode::ANCHOR_IS_DESCENDANT => {
                let [anchor, ancestor] = split_values(info, " :: ");
                format!("Anchor \"{anchor}\" is a descendant of \"{ancestor}\"")
            }
            IssueCode::LICENSE_INVALID => format!("License file is not valid: \"{info}\""),
            IssueCode::LICENSE_EXPIRED => format!("License expired on {info}"),
            IssueCode::LICENSE_NOT_SET => "No license file has been set".to_string(),
            IssueCode::LICENSE_INVALID_FEATURE => {
                format!("The license does not cover the feature \"{info}\"")
            }
            IssueCode::LICENSE_UNREGISTERED_MODELS => {
                if info.is_empty() {
                    "Models are used which are not registered in the license".to_string()
                } else {
                    format!("Models are used which are not registered in the license: {info}")
                }
            }
            IssueCode::LICENSE_EXPIRING_SOON => format!("License will expire in {info} days"),
            IssueCode::NO_CAMERA_CONNECTED => "No camera found".to_string(),
            IssueCode::NO_CAMERA_ACCESS => "Camera access is not possible".to_string(),
            IssueCode::FEATURE_NOT_SUPPORTED => {
                format!("\"{info}\" is not supported on this device")
            }
            code => format!(
                "Unspecific issue when executing \"{command}\": {}\nError code {code}\nInfo: {info}",
                self.message
            ),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Splits `value` at `separator` into exactly `N` parts, padding missing
/// parts with a placeholder and keeping surplus text in the last part.
fn split_values<const N: usize>(value: &str, separator: &str) -> [String; N] {
    let mut parts = value.splitn(N, separator);
    std::array::from_fn(|_| parts.next().unwrap_or(MISSING_VALUE).to_string())
}

/// Formats `file?key=value&key=value` as the file plus its parameters
fn describe_uri(uri: &str) -> String {
    match uri.split_once('?') {
        None => format!("\"{uri}\""),
        Some((file, query)) => {
            let parameters: Vec<String> = query.split('&').map(|p| format!("\"{p}\"")).collect();
            format!("\"{file}\" with parameters {}", parameters.join(", "))
        }
    }
}

/// Error reported by the engine for a single command
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandError {
    pub error_code: IssueCode,
    pub command_name: String,
    pub info: String,
    pub message: String,
}

impl CommandError {
    pub fn new(error_code: IssueCode, command_name: impl Into<String>) -> Self {
        Self {
            error_code,
            command_name: command_name.into(),
            ..Default::default()
        }
    }

    /// The error the engine reports for commands aborted by a reset
    pub fn canceled(command_name: impl Into<String>) -> Self {
        Self::new(IssueCode::COMMAND_CANCELED, command_name)
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn is_canceled(&self) -> bool {
        self.error_code == IssueCode::COMMAND_CANCELED
    }

    pub fn issue(&self) -> Issue {
        Issue {
            level: IssueLevel::Error,
            code: self.error_code,
            command_name: self.command_name.clone(),
            info: self.info.clone(),
            message: self.message.clone(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code, self.issue().describe())
    }
}

impl std::error::Error for CommandError {}
