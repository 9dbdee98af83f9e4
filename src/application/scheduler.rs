use std::{
    fs::{File, OpenOptions},
    io,
    pin::pin,
};

use futures::future::{Either, select};
use snafu::{Report, prelude::*};
use supports_color::Stream;
use tracing::{error, info, warn};

use crate::{
    application::RuntimeConfig,
    changelog::WriterChangeLog,
    ext::BestEffortPathExt,
    mirror::{EntryFailure, MirrorEngine, PassSummary, ReconcileError},
};

/// Runs mirror passes back to back, sleeping for the configured interval
/// after each one finishes.
pub struct Scheduler<'a> {
    config: &'a RuntimeConfig,
    engine: MirrorEngine,
}

impl<'a> Scheduler<'a> {
    pub fn new(config: &'a RuntimeConfig, engine: MirrorEngine) -> Self {
        Self { config, engine }
    }

    /// Loops until interrupted with Ctrl-C. A failed pass is logged and the
    /// next one is attempted as usual, unless only a single pass was asked
    /// for.
    pub async fn run(&self) -> Result<(), SchedulerError> {
        let mut passes = 0u64;
        loop {
            passes += 1;
            match self.run_pass()? {
                Ok(summary) if summary.is_empty() => info!("Pass {passes}: replica up to date"),
                Ok(summary) => info!("Pass {passes}: {summary}"),
                Err(pass_error) => {
                    if let ReconcileError::IncompleteError { failures, .. } = &pass_error {
                        error!("Pass {passes}: failed entries: {}", failed_entries(failures));
                    }
                    if self.config.once {
                        return Err(pass_error).context(PassSnafu);
                    }
                    error!("Pass {passes}: {}", Report::from_error(&pass_error));
                }
            }

            if self.config.once || !self.wait_for_next_pass().await {
                return Ok(());
            }
        }
    }

    /// Opens the log file for the duration of a single pass.
    fn run_pass(&self) -> Result<Result<PassSummary, ReconcileError>, SchedulerError> {
        let log_file = self.open_log_file()?;
        let colorize = supports_color::on(Stream::Stdout).is_some();
        let mut change_log = WriterChangeLog::new(log_file, io::stdout()).with_color(colorize);

        Ok(self
            .engine
            .reconcile(&self.config.source, &self.config.replica, &mut change_log))
    }

    fn open_log_file(&self) -> Result<File, SchedulerError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.log_file)
            .context(OpenLogFileSnafu {
                file_path: self.config.log_file.best_effort_path_display(),
            })
    }

    /// Sleeps for the interval. Returns `false` when interrupted.
    async fn wait_for_next_pass(&self) -> bool {
        let sleep = pin!(compio::time::sleep(self.config.interval));
        let interrupt = pin!(compio::signal::ctrl_c());

        match select(sleep, interrupt).await {
            Either::Left(_) => true,
            Either::Right((Ok(()), _)) => {
                info!("Interrupted, stopping after the last completed pass");
                false
            }
            Either::Right((Err(e), sleep)) => {
                warn!("Cannot listen for Ctrl-C: {e}");
                sleep.await;
                true
            }
        }
    }
}

fn failed_entries(failures: &[EntryFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.path().display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Snafu)]
pub enum SchedulerError {
    #[snafu(display("Failed to open the log file: {}", file_path))]
    OpenLogFileError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("The mirror pass did not complete"))]
    PassError { source: ReconcileError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::FailurePolicy;
    use std::{fs, path::Path, time::Duration};
    use tempfile::TempDir;

    struct Setup {
        _temp_dir: TempDir,
        config: RuntimeConfig,
    }

    fn setup() -> Setup {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();
        for dir in ["source", "replica"] {
            fs::create_dir(root.join(dir)).expect("Failed to create directory");
        }
        let config = RuntimeConfig {
            source: root.join("source"),
            replica: root.join("replica"),
            interval: Duration::ZERO,
            log_file: root.join("mirror.log"),
            failure_policy: FailurePolicy::Abort,
            once: true,
        };
        Setup {
            _temp_dir: temp_dir,
            config,
        }
    }

    fn read_log(path: &Path) -> String {
        fs::read_to_string(path).expect("Failed to read log file")
    }

    #[compio::test]
    async fn single_pass_mirrors_and_appends_to_the_log() {
        let Setup { _temp_dir, config } = setup();
        fs::write(config.source.join("a.txt"), "hello").expect("Failed to write file");
        fs::write(config.log_file.as_path(), "earlier entry\n\n").expect("Failed to seed log");

        Scheduler::new(&config, MirrorEngine::default())
            .run()
            .await
            .expect("Scheduler failed");

        assert_eq!(
            fs::read_to_string(config.replica.join("a.txt")).unwrap(),
            "hello"
        );
        let log = read_log(&config.log_file);
        let expected_tail = format!(
            "] a.txt was created in path {}\n\n",
            config.replica.display()
        );
        assert!(log.starts_with("earlier entry\n\n["));
        assert!(log.ends_with(&expected_tail));
    }

    #[compio::test]
    async fn up_to_date_pass_writes_nothing() {
        let Setup { _temp_dir, config } = setup();

        Scheduler::new(&config, MirrorEngine::default())
            .run()
            .await
            .expect("Scheduler failed");

        assert_eq!(read_log(&config.log_file), "");
    }

    #[compio::test]
    async fn single_pass_failure_is_returned() {
        let Setup { _temp_dir, mut config } = setup();
        config.replica = config.replica.join("missing");

        let result = Scheduler::new(&config, MirrorEngine::default()).run().await;

        assert!(matches!(result, Err(SchedulerError::PassError { .. })));
    }

    #[cfg(unix)]
    #[compio::test]
    async fn incomplete_pass_names_every_failed_entry() {
        let Setup { _temp_dir, mut config } = setup();
        config.failure_policy = FailurePolicy::Continue;
        fs::create_dir(config.source.join("docs")).expect("Failed to create directory");
        fs::create_dir(config.replica.join("docs")).expect("Failed to create directory");
        fs::write(config.replica.join("docs/stale.txt"), "x").expect("Failed to write file");
        std::os::unix::fs::symlink("/nonexistent/target", config.source.join("broken"))
            .expect("Failed to create link");
        std::os::unix::fs::symlink("/nonexistent/target", config.source.join("docs/gone"))
            .expect("Failed to create link");
        fs::write(config.source.join("ok.txt"), "ok").expect("Failed to write file");

        let result = Scheduler::new(&config, MirrorEngine::new(config.failure_policy))
            .run()
            .await;

        match result {
            Err(SchedulerError::PassError {
                source: ReconcileError::IncompleteError { failures, .. },
            }) => assert_eq!(failed_entries(&failures), "broken, docs/gone"),
            other => panic!("Expected an incomplete pass, got {other:?}"),
        }
        assert!(config.replica.join("ok.txt").is_file());
    }

    #[compio::test]
    async fn unwritable_log_file_stops_the_scheduler() {
        let Setup { _temp_dir, mut config } = setup();
        config.log_file = config.source.join("missing/mirror.log");

        let result = Scheduler::new(&config, MirrorEngine::default()).run().await;

        assert!(matches!(result, Err(SchedulerError::OpenLogFileError { .. })));
    }
}
