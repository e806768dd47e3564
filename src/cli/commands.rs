//! The recovery pipeline behind the command line
//!
//! validate → resolve → classify → confirm → recover → report
//!
//! Validation happens before the store is touched. Resolution must scan
//! the whole history, so any listing failure aborts the run. From
//! classification on, failures are per object.

use std::sync::Arc;

use crate::classifier::ClassifiedSet;
use crate::config::{RecoveryConfig, RunSettings, ValidationError};
use crate::dispatch::{CancelFlag, WorkerSlots};
use crate::error::{RunError, RunResult};
use crate::observability::{log_event, Event, Logger, MetricsRegistry, ObservationScope, Severity};
use crate::recovery::{Orchestrator, RecoveryError, RecoveryPolicy};
use crate::resolver::resolve_observed;
use crate::store::LocalVersionStore;

use super::args::Cli;
use super::io::{write_json, Prompter};
use super::report::{PartitionCounts, Plan, RunReport};

/// Environment variable holding the default log level
pub const LOG_LEVEL_ENV: &str = "REWIND_LOG";

/// Set the process-wide log level from the flag, then the environment
pub fn configure_logging(flag: Option<&str>) -> Result<(), ValidationError> {
    let from_env = std::env::var(LOG_LEVEL_ENV).ok();
    let level = match flag.or(from_env.as_deref()) {
        Some(value) => value
            .parse::<Severity>()
            .map_err(ValidationError::invalid_argument)?,
        None => Severity::Info,
    };
    Logger::set_min_severity(level);
    Ok(())
}

/// Merge the config file and flags, then validate
pub fn load_settings(cli: &Cli) -> Result<RunSettings, ValidationError> {
    let mut config = match cli.config.as_deref() {
        Some(path) => RecoveryConfig::load(path)?,
        None => RecoveryConfig::default(),
    };
    config.apply(cli.overrides());

    let settings = config.validate()?;

    let point = settings.point.to_string();
    let destination = settings.destination.to_string();
    log_event(
        Event::ConfigValidated,
        &[
            ("bucket", &settings.bucket),
            ("destination", &destination),
            ("prefix", &settings.prefix),
            ("point", &point),
            ("thaw_tier", settings.thaw.tier.as_str()),
            ("concurrency", &settings.concurrency.to_string()),
        ],
    );

    Ok(settings)
}

/// Decide which partitions to act on
///
/// Each question is only asked for a non-empty partition. Objects whose
/// probe failed are counted with the cold ones.
pub async fn decide_policy(
    cli: &Cli,
    settings: &RunSettings,
    classified: &ClassifiedSet,
    prompter: &mut dyn Prompter,
) -> RunResult<RecoveryPolicy> {
    let mut policy = RecoveryPolicy::all(settings.thaw);
    if classified.cancelled {
        return Ok(policy);
    }
    if cli.dry_run {
        return Ok(RecoveryPolicy::none(settings.thaw));
    }

    let cold = classified.cold.len() + classified.probe_failures.len();
    policy.recover_cold = !cli.skip_cold
        && cold > 0
        && (cli.yes
            || prompter.confirm(&format!(
                "Found {} objects in cold storage. Objects in cold storage cannot be recovered until they have been thawed. Send restore requests for these objects?",
                cold
            ))
            .await?);

    let standard = classified.standard.len();
    policy.recover_standard = !cli.skip_standard
        && standard > 0
        && (cli.yes
            || prompter.confirm(&format!(
                "Found {} objects in standard storage. Do you want to restore them?",
                standard
            ))
            .await?);

    Ok(policy)
}

/// Run one recovery end to end and build its report
pub async fn execute(cli: &Cli, cancel: &CancelFlag, prompter: &mut dyn Prompter) -> RunResult<RunReport> {
    let scope = ObservationScope::new("RUN");
    match pipeline(cli, cancel, prompter).await {
        Ok(report) => {
            scope.complete_with_fields(&[
                ("succeeded", &report.succeeded.to_string()),
                ("failed", &report.failed.to_string()),
                ("cancelled", &report.cancelled.to_string()),
            ]);
            Ok(report)
        }
        Err(err) => {
            scope.fail(&err.to_string());
            Err(err)
        }
    }
}

async fn pipeline(cli: &Cli, cancel: &CancelFlag, prompter: &mut dyn Prompter) -> RunResult<RunReport> {
    let settings = load_settings(cli)?;

    let store = Arc::new(
        LocalVersionStore::new(settings.store_root.clone(), settings.bucket.clone())
            .with_page_size(settings.page_size),
    );
    let metrics = Arc::new(MetricsRegistry::new());

    let resolved = resolve_observed(&settings.prefix, settings.point, store.as_ref(), &metrics, cancel).await?;

    let orchestrator = Orchestrator::new(store, WorkerSlots::new(settings.concurrency))
        .with_cancel(cancel.clone())
        .with_metrics(Arc::clone(&metrics));

    let classified = orchestrator.classify(resolved).await;
    let counts = PartitionCounts::of(&classified);
    let policy = decide_policy(cli, &settings, &classified, prompter).await?;

    let plan = cli.dry_run.then(|| Plan {
        copy: classified.standard.clone(),
        thaw: classified.cold.clone(),
    });

    let recovery = orchestrator
        .recover(classified, &settings.destination, &policy)
        .await?;

    let report = RunReport {
        bucket: settings.bucket,
        destination: settings.destination,
        target: settings.point.to_string(),
        prefix: settings.prefix,
        dry_run: cli.dry_run,
        counts,
        plan,
        outcomes: Vec::new(),
        succeeded: 0,
        failed: 0,
        skipped_standard: 0,
        skipped_cold: 0,
        unscheduled: 0,
        cancelled: false,
        metrics: metrics.snapshot(),
    };

    Ok(report.with_recovery(recovery))
}

/// Print the report; a cancelled run or one with failed objects still
/// fails after printing
pub fn finish(report: &RunReport) -> RunResult<()> {
    write_json(report)?;

    if report.cancelled {
        return Err(RunError::from(RecoveryError::cancelled(report.unscheduled)));
    }
    if report.failed > 0 {
        return Err(RunError::from(RecoveryError::actions_failed(
            report.failed,
            report.outcomes.len(),
        )));
    }
    Ok(())
}
