use aws_sdk_cloudformation::model::{Capability, StackStatus};
use futures::{pin_mut, stream, Stream, TryStreamExt};

use crate::api::{ApiError, StackApi, StackPage, UpdateRequest};
use crate::parameters::Parameters;
use crate::template::{TemplateSource, PLACEHOLDER_TEMPLATE};
use crate::waiter::{self, Target, WaitConfig, WaitError};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Failed to look up stack {stack}: {source}")]
    ExistenceCheck { stack: String, source: ApiError },

    #[error("Failed to create empty stack {stack}: {source}")]
    CreatePlaceholder { stack: String, source: ApiError },

    #[error("Failed to update stack {stack}: {source}")]
    Update { stack: String, source: ApiError },

    #[error("Failed to delete stack {stack}: {source}")]
    Delete { stack: String, source: ApiError },

    #[error("Stack {stack} did not finish {phase}: {source}")]
    Wait {
        stack: String,
        phase: &'static str,
        source: WaitError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    Updated,
    NoChanges,
}

/// What a reconciliation did to the stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciliation {
    pub created: bool,
    pub update: Option<UpdateOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    pub create: WaitConfig,
    pub update: WaitConfig,
    pub delete: WaitConfig,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            create: WaitConfig::CREATE,
            update: WaitConfig::UPDATE,
            delete: WaitConfig::DELETE,
        }
    }
}

pub struct StackReconciler<A> {
    api: A,
    timings: Timings,
}

impl<A: StackApi> StackReconciler<A> {
    pub fn new(api: A) -> Self {
        Self::with_timings(api, Timings::default())
    }

    pub fn with_timings(api: A, timings: Timings) -> Self {
        return Self { api, timings };
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Walks the stack listing one page at a time. Nothing is requested until
    /// the stream is polled, and every call starts again from the first page.
    pub fn pages(&self) -> impl Stream<Item = Result<StackPage, ApiError>> + '_ {
        stream::try_unfold(Some(None), move |next: Option<Option<String>>| async move {
            let token = match next {
                Some(token) => token,
                None => return Ok(None),
            };

            let page = self.api.list_stacks(token).await?;
            let following = page
                .next_token
                .clone()
                .filter(|token| !token.is_empty())
                .map(Some);
            Ok::<_, ApiError>(Some((page, following)))
        })
    }

    /// A stack counts as existing unless its only records are DELETE_COMPLETE
    /// ones, which CloudFormation keeps around after a deletion.
    pub async fn exists(&self, stack_name: &str) -> Result<bool, Error> {
        let pages = self.pages().map_err(|source| Error::ExistenceCheck {
            stack: stack_name.to_string(),
            source,
        });
        pin_mut!(pages);

        while let Some(page) = pages.try_next().await? {
            let found = page.summaries.iter().any(|summary| {
                summary.stack_name() == Some(stack_name)
                    && summary.stack_status() != Some(&StackStatus::DeleteComplete)
            });
            if found {
                log::info!("Found existing stack with name: {}", stack_name);
                return Ok(true);
            }
        }

        return Ok(false);
    }

    pub async fn create_placeholder(&self, stack_name: &str) -> Result<(), Error> {
        log::info!("Creating stack with name: {}", stack_name);

        self.api
            .create_stack(stack_name, PLACEHOLDER_TEMPLATE)
            .await
            .map_err(|source| Error::CreatePlaceholder {
                stack: stack_name.to_string(),
                source,
            })?;

        waiter::wait(
            &self.api,
            stack_name,
            Target::CreateComplete,
            self.timings.create,
        )
        .await
        .map_err(|source| Error::Wait {
            stack: stack_name.to_string(),
            phase: "creating",
            source,
        })?;

        log::info!("Successfully created stack: {}", stack_name);
        return Ok(());
    }

    pub async fn update(&self, request: &UpdateRequest) -> Result<UpdateOutcome, Error> {
        let stack_name = &request.stack_name;
        log::info!("Updating stack: {}", stack_name);

        match self.api.update_stack(request).await {
            Ok(()) => (),
            Err(error) if error.is_no_updates() => {
                log::info!("No updates are to be performed on stack: {}", stack_name);
                return Ok(UpdateOutcome::NoChanges);
            }
            Err(source) => {
                return Err(Error::Update {
                    stack: stack_name.clone(),
                    source,
                })
            }
        }

        waiter::wait(
            &self.api,
            stack_name,
            Target::UpdateComplete,
            self.timings.update,
        )
        .await
        .map_err(|source| Error::Wait {
            stack: stack_name.clone(),
            phase: "updating",
            source,
        })?;

        log::info!("Successfully updated stack: {}", stack_name);
        return Ok(UpdateOutcome::Updated);
    }

    /// Makes sure the stack exists, then applies `template` to it if given.
    pub async fn reconcile(
        &self,
        stack_name: &str,
        template: Option<TemplateSource>,
        parameters: Parameters,
        capabilities: Vec<Capability>,
    ) -> Result<Reconciliation, Error> {
        let created = if self.exists(stack_name).await? {
            false
        } else {
            self.create_placeholder(stack_name).await?;
            true
        };

        let update = match template {
            Some(template) => {
                let request = UpdateRequest {
                    stack_name: stack_name.to_string(),
                    template,
                    parameters,
                    capabilities,
                };
                Some(self.update(&request).await?)
            }
            None => None,
        };

        return Ok(Reconciliation { created, update });
    }

    /// Returns false when there was no stack to delete.
    pub async fn delete(&self, stack_name: &str) -> Result<bool, Error> {
        if !self.exists(stack_name).await? {
            log::info!("No stack to delete with name: {}", stack_name);
            return Ok(false);
        }

        self.api
            .delete_stack(stack_name)
            .await
            .map_err(|source| Error::Delete {
                stack: stack_name.to_string(),
                source,
            })?;

        waiter::wait(
            &self.api,
            stack_name,
            Target::DeleteComplete,
            self.timings.delete,
        )
        .await
        .map_err(|source| Error::Wait {
            stack: stack_name.to_string(),
            phase: "deleting",
            source,
        })?;

        log::info!("Successfully deleted stack: {}", stack_name);
        return Ok(true);
    }
}
