use clap::Parser;
use log::LevelFilter;
use std::{fs, io, path::Path, path::PathBuf};
use validator::{Validate, ValidationError};

use crate::parameters::{self, Parameters};
use crate::template::{self, TemplateSource, MAX_TEMPLATE_BODY_BYTES};

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Validation errors: {0}")]
    ValidationError(String),

    #[error(
        "Template body is {0} bytes, the limit is {} bytes. Upload the template to S3 and pass it with --template-url instead",
        MAX_TEMPLATE_BODY_BYTES
    )]
    TemplateTooLarge(usize),

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}

/// Creates an empty CloudFormation stack if it is missing, then updates it.
///
/// Starting from a stack without infrastructure means a failed update rolls
/// back to the empty stack instead of leaving a stack that has to be deleted.
#[derive(Debug, Parser, Validate)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Name of stack to update
    #[arg(long = "name")]
    #[validate(length(min = 1, max = 128), custom = "validate_stack_name")]
    pub stack_name: String,

    /// CloudFormation template file location
    #[arg(long, conflicts_with = "template_url")]
    pub template: Option<PathBuf>,

    /// URL of a CloudFormation template stored in S3
    #[arg(long)]
    #[validate(url)]
    pub template_url: Option<String>,

    /// Parameter file to use with the CloudFormation template
    #[arg(long = "parameters")]
    pub parameters: Option<PathBuf>,

    /// Acknowledge that the template creates named IAM resources
    #[arg(long)]
    pub iam: bool,

    /// AWS region the stack lives in
    #[arg(long, default_value = DEFAULT_REGION)]
    pub region: String,

    /// Log verbosity: off, error, warn, info, debug or trace
    #[arg(long, default_value = "warn")]
    pub log_level: LevelFilter,

    /// Delete the stack instead of creating or updating it
    #[arg(long, conflicts_with_all = ["template", "template_url", "parameters", "iam"])]
    pub delete: bool,
}

/// Everything a run needs, loaded from disk and checked up front.
#[derive(Debug, PartialEq)]
pub struct Settings {
    pub stack_name: String,
    pub region: String,
    pub iam: bool,
    pub action: Action,
}

#[derive(Debug, PartialEq)]
pub enum Action {
    Reconcile {
        template: Option<TemplateSource>,
        parameters: Parameters,
    },
    Delete,
}

impl Args {
    pub fn into_settings(self) -> Result<Settings, Error> {
        match self.validate() {
            Ok(_) => (),
            Err(error) => return Err(Error::ValidationError(error.to_string())),
        }

        let action = if self.delete {
            Action::Delete
        } else {
            let parameters = parameters::load(self.parameters.as_deref())?;
            let template = match (&self.template, self.template_url) {
                (Some(path), _) => Some(template::read(path)?),
                (None, Some(url)) => Some(TemplateSource::Url(url)),
                (None, None) => None,
            };
            Action::Reconcile {
                template,
                parameters,
            }
        };

        return Ok(Settings {
            stack_name: self.stack_name,
            region: self.region,
            iam: self.iam,
            action,
        });
    }
}

/// Reads a whole input file, telling a missing file apart from other I/O errors.
pub fn read_file(path: &Path) -> Result<String, Error> {
    match fs::read_to_string(path) {
        Ok(raw_contents) => Ok(raw_contents),
        Err(error) => match error.kind() {
            io::ErrorKind::NotFound => Err(Error::FileNotFound(path.display().to_string())),
            _ => Err(Error::Unknown(error.to_string())),
        },
    }
}

fn validate_stack_name(stack_name: &str) -> Result<(), ValidationError> {
    let mut chars = stack_name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => (),
        _ => return Err(ValidationError::new("stack_name_first_char")),
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::new("stack_name_chars"));
    }

    return Ok(());
}
