use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::config::{self, Error};

/// A single entry of the parameter file, in the shape the AWS CLI uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct StackParameter {
    #[validate(length(min = 1))]
    pub parameter_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_previous_value: Option<bool>,
}

impl StackParameter {
    pub fn new(key: &str, value: &str) -> Self {
        return Self {
            parameter_key: String::from(key),
            parameter_value: Some(String::from(value)),
            use_previous_value: None,
        };
    }
}

pub type Parameters = Vec<StackParameter>;

pub fn load(path: Option<&Path>) -> Result<Parameters, Error> {
    let path = match path {
        Some(path) => path,
        None => return Ok(Vec::new()),
    };

    log::info!("Parsing parameters from file: {}", path.display());

    let contents = config::read_file(path)?;

    let parameters: Parameters = if is_yaml(path) {
        serde_yaml::from_str(&contents).map_err(|error| Error::ParsingError(error.to_string()))?
    } else {
        serde_json::from_str(&contents).map_err(|error| Error::ParsingError(error.to_string()))?
    };

    for parameter in &parameters {
        match parameter.validate() {
            Ok(_) => (),
            Err(error) => return Err(Error::ValidationError(error.to_string())),
        }
    }

    return Ok(parameters);
}

fn is_yaml(path: &Path) -> bool {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some(extension) => extension == "yaml" || extension == "yml",
        None => false,
    }
}
