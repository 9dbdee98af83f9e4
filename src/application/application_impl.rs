use snafu::Snafu;
use snafu::prelude::*;
use tracing::debug;

use crate::application::{ArgumentError, RuntimeConfig, Scheduler, SchedulerError};
use crate::cli::Cli;
use crate::config::{MirrorConfig, MirrorConfigError};
use crate::mirror::MirrorEngine;

pub struct Application;

impl Application {
    pub async fn run(cli: Cli) -> Result<(), ApplicationError> {
        let file_config = match &cli.config {
            Some(path) => MirrorConfig::read(path).await.context(ConfigSnafu)?,
            None => MirrorConfig::default(),
        };
        let runtime_config =
            RuntimeConfig::from_sources(&cli, file_config).context(InvalidArgumentsSnafu)?;
        debug!("Resolved runtime config: {:?}", runtime_config);

        let engine = MirrorEngine::new(runtime_config.failure_policy);
        Scheduler::new(&runtime_config, engine)
            .run()
            .await
            .context(MirroringSnafu)?;

        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while reading the config file"))]
    ConfigError { source: MirrorConfigError },
    #[snafu(display("Invalid arguments"))]
    InvalidArgumentsError { source: ArgumentError },
    #[snafu(display("Critical failure encountered while mirroring"))]
    MirroringError { source: SchedulerError },
}
