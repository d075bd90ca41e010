use std::process::ExitCode;

use aws_sdk_cloudformation::model::Capability;
use clap::Parser;

pub mod api;
pub mod cloudformation;
pub mod config;
pub mod logger;
pub mod parameters;
pub mod reconciler;
pub mod template;
pub mod waiter;

use crate::api::StackApi;
use crate::cloudformation::CloudFormation;
use crate::config::{Action, Args, Settings};
use crate::reconciler::StackReconciler;

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),

    #[error(transparent)]
    Reconcile(#[from] reconciler::Error),
}

async fn run<Api: StackApi>(
    reconciler: &StackReconciler<Api>,
    settings: Settings,
) -> Result<(), Error> {
    match settings.action {
        Action::Delete => {
            reconciler.delete(&settings.stack_name).await?;
        }
        Action::Reconcile {
            template,
            parameters,
        } => {
            let capabilities = if settings.iam {
                vec![Capability::CapabilityNamedIam]
            } else {
                vec![]
            };

            let reconciliation = reconciler
                .reconcile(&settings.stack_name, template, parameters, capabilities)
                .await?;

            if reconciliation.created && reconciliation.update.is_none() {
                log::info!("Stack {} is empty", settings.stack_name);
            }
        }
    }

    return Ok(());
}

/// 0 on success, 1 after logging the error.
fn exit_code(result: Result<(), Error>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(error) => {
            log::error!("{}", error);
            1
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.log_level);

    let result = match args.into_settings() {
        Ok(settings) => {
            let api = CloudFormation::new(&settings.region).await;
            run(&StackReconciler::new(api), settings).await
        }
        Err(error) => Err(Error::from(error)),
    };

    ExitCode::from(exit_code(result))
}
