use std::time::Duration;

use aws_sdk_cloudformation::model::StackStatus;
use tokio::time::sleep;

use crate::api::{ApiError, StackApi};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WaitError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("stack reached {0} while waiting for {1}")]
    Failed(String, &'static str),

    #[error("stack is gone while waiting for {0}")]
    Missing(&'static str),

    #[error("gave up waiting for {target} after {attempts} attempts, last status: {}", .last_status.as_deref().unwrap_or("unknown"))]
    Timeout {
        target: &'static str,
        attempts: u32,
        last_status: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitConfig {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl WaitConfig {
    pub const CREATE: WaitConfig = WaitConfig {
        delay: Duration::from_secs(3),
        max_attempts: 100,
    };

    pub const UPDATE: WaitConfig = WaitConfig {
        delay: Duration::from_secs(10),
        max_attempts: 180,
    };

    pub const DELETE: WaitConfig = WaitConfig {
        delay: Duration::from_secs(10),
        max_attempts: 180,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    CreateComplete,
    UpdateComplete,
    DeleteComplete,
}

#[derive(Debug, PartialEq)]
enum Acceptor {
    Success,
    Failure,
    Retry,
}

impl Target {
    pub fn name(&self) -> &'static str {
        match self {
            Target::CreateComplete => "CREATE_COMPLETE",
            Target::UpdateComplete => "UPDATE_COMPLETE",
            Target::DeleteComplete => "DELETE_COMPLETE",
        }
    }

    fn accept(&self, status: &StackStatus) -> Acceptor {
        match self {
            Target::CreateComplete => match status {
                StackStatus::CreateComplete => Acceptor::Success,
                StackStatus::CreateFailed
                | StackStatus::DeleteComplete
                | StackStatus::DeleteFailed
                | StackStatus::RollbackFailed
                | StackStatus::RollbackComplete => Acceptor::Failure,
                _ => Acceptor::Retry,
            },
            Target::UpdateComplete => match status {
                StackStatus::UpdateComplete => Acceptor::Success,
                StackStatus::UpdateFailed
                | StackStatus::UpdateRollbackFailed
                | StackStatus::UpdateRollbackComplete => Acceptor::Failure,
                _ => Acceptor::Retry,
            },
            Target::DeleteComplete => match status {
                StackStatus::DeleteComplete => Acceptor::Success,
                StackStatus::DeleteFailed
                | StackStatus::CreateFailed
                | StackStatus::RollbackFailed
                | StackStatus::UpdateRollbackFailed
                | StackStatus::UpdateRollbackInProgress => Acceptor::Failure,
                _ => Acceptor::Retry,
            },
        }
    }
}

/// Polls the stack status until `target` is reached, a failure state shows up
/// or `config.max_attempts` queries have been made.
pub async fn wait<A>(
    api: &A,
    stack_name: &str,
    target: Target,
    config: WaitConfig,
) -> Result<(), WaitError>
where
    A: StackApi + ?Sized,
{
    let mut last_status = None;

    for attempt in 1..=config.max_attempts {
        let status = match api.stack_status(stack_name).await? {
            Some(status) => status,
            None if target == Target::DeleteComplete => return Ok(()),
            None => return Err(WaitError::Missing(target.name())),
        };

        log::debug!(
            "Stack {} is {} (attempt {}/{})",
            stack_name,
            status.as_str(),
            attempt,
            config.max_attempts
        );

        let observed = status.as_str().to_string();
        match target.accept(&status) {
            Acceptor::Success => return Ok(()),
            Acceptor::Failure => return Err(WaitError::Failed(observed, target.name())),
            Acceptor::Retry => (),
        }
        last_status = Some(observed);

        if attempt < config.max_attempts {
            sleep(config.delay).await;
        }
    }

    return Err(WaitError::Timeout {
        target: target.name(),
        attempts: config.max_attempts,
        last_status,
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use aws_sdk_cloudformation::model::StackStatus;

    use super::{wait, Target, WaitConfig, WaitError};
    use crate::api::fake::{Call, FakeApi};
    use crate::api::ApiError;

    const FAST: WaitConfig = WaitConfig {
        delay: Duration::ZERO,
        max_attempts: 5,
    };

    #[tokio::test]
    async fn returns_once_target_is_reached() {
        let api = FakeApi::new().with_statuses(&[
            StackStatus::CreateInProgress,
            StackStatus::CreateInProgress,
            StackStatus::CreateComplete,
        ]);

        let result = wait(&api, "vpc", Target::CreateComplete, FAST).await;
        assert_eq!(Ok(()), result);
        assert_eq!(3, api.calls().len());
        assert_eq!(Call::StackStatus(String::from("vpc")), api.calls()[0]);
    }

    #[tokio::test]
    async fn fails_on_failure_state() {
        let api = FakeApi::new().with_statuses(&[
            StackStatus::UpdateInProgress,
            StackStatus::UpdateRollbackInProgress,
            StackStatus::UpdateRollbackComplete,
        ]);

        let result = wait(&api, "vpc", Target::UpdateComplete, FAST).await;
        assert_eq!(
            Err(WaitError::Failed(
                String::from("UPDATE_ROLLBACK_COMPLETE"),
                "UPDATE_COMPLETE"
            )),
            result
        );
    }

    #[tokio::test]
    async fn times_out_after_max_attempts() {
        let api = FakeApi::new().with_statuses(&[StackStatus::CreateInProgress]);

        let result = wait(&api, "vpc", Target::CreateComplete, FAST).await;
        assert_eq!(
            Err(WaitError::Timeout {
                target: "CREATE_COMPLETE",
                attempts: 5,
                last_status: Some(String::from("CREATE_IN_PROGRESS")),
            }),
            result
        );
        assert_eq!(5, api.calls().len());
    }

    #[tokio::test]
    async fn missing_stack_fails_create() {
        let api = FakeApi::new().with_missing_stack();

        let result = wait(&api, "vpc", Target::CreateComplete, FAST).await;
        assert_eq!(Err(WaitError::Missing("CREATE_COMPLETE")), result);
    }

    #[tokio::test]
    async fn missing_stack_completes_delete() {
        let api = FakeApi::new()
            .with_statuses(&[StackStatus::DeleteInProgress])
            .with_missing_stack();

        let result = wait(&api, "vpc", Target::DeleteComplete, FAST).await;
        assert_eq!(Ok(()), result);
        assert_eq!(2, api.calls().len());
    }

    #[tokio::test]
    async fn api_errors_are_not_retried() {
        let error = ApiError::UnknownError(String::from("connection reset"));
        let api = FakeApi::new().with_status_error(error.clone());

        let result = wait(&api, "vpc", Target::UpdateComplete, FAST).await;
        assert_eq!(Err(WaitError::Api(error)), result);
        assert_eq!(1, api.calls().len());
    }

    #[test]
    fn default_budgets() {
        assert_eq!(Duration::from_secs(3), WaitConfig::CREATE.delay);
        assert_eq!(100, WaitConfig::CREATE.max_attempts);
        assert_eq!(Duration::from_secs(10), WaitConfig::UPDATE.delay);
        assert_eq!(180, WaitConfig::UPDATE.max_attempts);
    }
}
