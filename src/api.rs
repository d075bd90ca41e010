use aws_sdk_cloudformation::model::{Capability, StackStatus, StackSummary};

use crate::parameters::StackParameter;
use crate::template::TemplateSource;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Service error ocurred: {message}.")]
    ServiceError {
        code: Option<String>,
        message: String,
    },

    #[error("Unknown error ocurred: {0}.")]
    UnknownError(String),
}

impl ApiError {
    pub fn service(code: Option<&str>, message: impl Into<String>) -> Self {
        return ApiError::ServiceError {
            code: code.map(String::from),
            message: message.into(),
        };
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::ServiceError { code, .. } => code.as_deref(),
            ApiError::UnknownError(_) => None,
        }
    }

    /// CloudFormation rejects an update whose template and parameters match
    /// the live stack with a plain `ValidationError`. There is no dedicated
    /// error code, so the message has to be inspected as well.
    pub fn is_no_updates(&self) -> bool {
        self.is_validation_error_containing("No updates")
    }

    pub fn is_missing_stack(&self) -> bool {
        self.is_validation_error_containing("does not exist")
    }

    fn is_validation_error_containing(&self, needle: &str) -> bool {
        let validation = match self.code() {
            Some(code) => code == "ValidationError",
            None => true,
        };
        match self {
            ApiError::ServiceError { message, .. } => validation && message.contains(needle),
            ApiError::UnknownError(_) => false,
        }
    }
}

/// One page of the stack listing.
#[derive(Debug, Clone, Default)]
pub struct StackPage {
    pub summaries: Vec<StackSummary>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub stack_name: String,
    pub template: TemplateSource,
    pub parameters: Vec<StackParameter>,
    pub capabilities: Vec<Capability>,
}

/// The subset of the CloudFormation API the reconciler talks to.
#[async_trait::async_trait]
pub trait StackApi {
    async fn list_stacks(&self, next_token: Option<String>) -> Result<StackPage, ApiError>;

    /// Current status of the stack, `None` when CloudFormation does not know it.
    async fn stack_status(&self, stack_name: &str) -> Result<Option<StackStatus>, ApiError>;

    async fn create_stack(&self, stack_name: &str, template_body: &str) -> Result<(), ApiError>;

    async fn update_stack(&self, request: &UpdateRequest) -> Result<(), ApiError>;

    async fn delete_stack(&self, stack_name: &str) -> Result<(), ApiError>;
}

#[cfg(test)]
pub mod fake {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use aws_sdk_cloudformation::model::{StackStatus, StackSummary};

    use super::{ApiError, StackApi, StackPage, UpdateRequest};

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        ListStacks(Option<String>),
        StackStatus(String),
        CreateStack(String, String),
        UpdateStack(UpdateRequest),
        DeleteStack(String),
    }

    /// Scripted `StackApi`. Every call is recorded; responses are served in
    /// order from per-operation queues. Once the status queue runs dry the
    /// last served status keeps being returned.
    #[derive(Default)]
    pub struct FakeApi {
        pub pages: Mutex<VecDeque<Result<StackPage, ApiError>>>,
        pub statuses: Mutex<VecDeque<Result<Option<StackStatus>, ApiError>>>,
        pub last_status: Mutex<Option<Result<Option<StackStatus>, ApiError>>>,
        pub create_result: Mutex<Option<ApiError>>,
        pub update_result: Mutex<Option<ApiError>>,
        pub delete_result: Mutex<Option<ApiError>>,
        pub calls: Mutex<Vec<Call>>,
    }

    impl FakeApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(self, entries: &[(&str, StackStatus)], next_token: Option<&str>) -> Self {
            let summaries = entries
                .iter()
                .map(|(name, status)| summary(name, status.clone()))
                .collect();
            self.pages.lock().unwrap().push_back(Ok(StackPage {
                summaries,
                next_token: next_token.map(String::from),
            }));
            self
        }

        pub fn with_list_error(self, error: ApiError) -> Self {
            self.pages.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn with_statuses(self, statuses: &[StackStatus]) -> Self {
            {
                let mut queue = self.statuses.lock().unwrap();
                for status in statuses {
                    queue.push_back(Ok(Some(status.clone())));
                }
            }
            self
        }

        pub fn with_missing_stack(self) -> Self {
            self.statuses.lock().unwrap().push_back(Ok(None));
            self
        }

        pub fn with_status_error(self, error: ApiError) -> Self {
            self.statuses.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn failing_create(self, error: ApiError) -> Self {
            *self.create_result.lock().unwrap() = Some(error);
            self
        }

        pub fn failing_update(self, error: ApiError) -> Self {
            *self.update_result.lock().unwrap() = Some(error);
            self
        }

        pub fn failing_delete(self, error: ApiError) -> Self {
            *self.delete_result.lock().unwrap() = Some(error);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    pub fn summary(name: &str, status: StackStatus) -> StackSummary {
        StackSummary::builder()
            .stack_name(name)
            .stack_status(status)
            .build()
    }

    #[async_trait::async_trait]
    impl StackApi for FakeApi {
        async fn list_stacks(&self, next_token: Option<String>) -> Result<StackPage, ApiError> {
            self.record(Call::ListStacks(next_token));
            match self.pages.lock().unwrap().pop_front() {
                Some(page) => page,
                None => Ok(StackPage::default()),
            }
        }

        async fn stack_status(&self, stack_name: &str) -> Result<Option<StackStatus>, ApiError> {
            self.record(Call::StackStatus(stack_name.to_string()));
            let next = self.statuses.lock().unwrap().pop_front();
            let mut last = self.last_status.lock().unwrap();
            match next {
                Some(status) => {
                    *last = Some(status.clone());
                    status
                }
                None => last.clone().unwrap_or(Ok(None)),
            }
        }

        async fn create_stack(
            &self,
            stack_name: &str,
            template_body: &str,
        ) -> Result<(), ApiError> {
            let call = Call::CreateStack(stack_name.to_string(), template_body.to_string());
            self.record(call);
            match self.create_result.lock().unwrap().clone() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }

        async fn update_stack(&self, request: &UpdateRequest) -> Result<(), ApiError> {
            self.record(Call::UpdateStack(request.clone()));
            match self.update_result.lock().unwrap().clone() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }

        async fn delete_stack(&self, stack_name: &str) -> Result<(), ApiError> {
            self.record(Call::DeleteStack(stack_name.to_string()));
            match self.delete_result.lock().unwrap().clone() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }
    }
}
