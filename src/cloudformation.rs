use aws_sdk_cloudformation::model::{Parameter, StackStatus};
use aws_sdk_cloudformation::types::SdkError;
use aws_types::region::Region;

use crate::api::{ApiError, StackApi, StackPage, UpdateRequest};
use crate::parameters::StackParameter;
use crate::template::TemplateSource;

macro_rules! api_error {
    ($error:expr) => {
        match $error {
            SdkError::ServiceError { err, .. } => ApiError::service(
                err.code(),
                err.message()
                    .map(String::from)
                    .unwrap_or_else(|| err.to_string()),
            ),
            err => ApiError::UnknownError(err.to_string()),
        }
    };
}

pub struct CloudFormation {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormation {
    pub async fn new(region: &str) -> Self {
        let sdk_config = aws_config::from_env()
            .region(Region::new(region.to_string()))
            .load()
            .await;
        let client = aws_sdk_cloudformation::Client::new(&sdk_config);

        return Self { client };
    }
}

fn to_parameter(parameter: &StackParameter) -> Parameter {
    Parameter::builder()
        .parameter_key(&parameter.parameter_key)
        .set_parameter_value(parameter.parameter_value.clone())
        .set_use_previous_value(parameter.use_previous_value)
        .build()
}

#[async_trait::async_trait]
impl StackApi for CloudFormation {
    async fn list_stacks(&self, next_token: Option<String>) -> Result<StackPage, ApiError> {
        let result = self
            .client
            .list_stacks()
            .set_next_token(next_token)
            .send()
            .await;

        let result = match result {
            Ok(data) => data,
            Err(error) => return Err(api_error!(error)),
        };

        return Ok(StackPage {
            summaries: result.stack_summaries().unwrap_or_else(|| &[]).to_vec(),
            next_token: result.next_token().map(String::from),
        });
    }

    async fn stack_status(&self, stack_name: &str) -> Result<Option<StackStatus>, ApiError> {
        let result = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await;

        let result = match result {
            Ok(data) => data,
            Err(error) => {
                let error = api_error!(error);
                if error.is_missing_stack() {
                    return Ok(None);
                }
                return Err(error);
            }
        };

        let status = result
            .stacks()
            .unwrap_or_else(|| &[])
            .first()
            .and_then(|stack| stack.stack_status())
            .cloned();

        return Ok(status);
    }

    async fn create_stack(&self, stack_name: &str, template_body: &str) -> Result<(), ApiError> {
        match self
            .client
            .create_stack()
            .stack_name(stack_name)
            .template_body(template_body)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(error) => Err(api_error!(error)),
        }
    }

    async fn update_stack(&self, request: &UpdateRequest) -> Result<(), ApiError> {
        let parameters = request.parameters.iter().map(to_parameter).collect();

        let builder = self
            .client
            .update_stack()
            .stack_name(&request.stack_name)
            .set_parameters(Some(parameters))
            .set_capabilities(Some(request.capabilities.clone()));

        let builder = match &request.template {
            TemplateSource::Body(body) => builder.template_body(body),
            TemplateSource::Url(url) => builder.template_url(url),
        };

        match builder.send().await {
            Ok(_) => Ok(()),
            Err(error) => Err(api_error!(error)),
        }
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<(), ApiError> {
        match self
            .client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(error) => Err(api_error!(error)),
        }
    }
}
