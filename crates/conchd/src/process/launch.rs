//! Supervises server start-up and the tick schedule.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use conch_eval::{Evaluator, ExpressionEvaluator};
use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to run the server.
pub(crate) struct LaunchPlan<L, S, E> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
    pub(crate) evaluator: E,
}

/// Runs the server with the production collaborators until a termination
/// signal arrives.
pub fn run_server() -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal::install()?,
        evaluator: ExpressionEvaluator::new(),
    };
    run_server_with(plan)
}

/// Runs the server with injected collaborators.
///
/// This is the external scheduler: it calls `tick()`, reports any error,
/// waits one tick interval and repeats. A failed tick never stops the loop.
pub(crate) fn run_server_with<L, S, E>(plan: LaunchPlan<L, S, E>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
    E: Evaluator,
{
    let LaunchPlan {
        loader,
        reporter,
        mut shutdown,
        evaluator,
    } = plan;

    info!(target: PROCESS_TARGET, "starting server runtime");
    let bootstrapped = bootstrap_with(&loader, reporter.as_ref())?;
    let interval = bootstrapped.config().tick_interval();
    let mut server = bootstrapped.into_server(evaluator);
    info!(
        target: PROCESS_TARGET,
        listen = %server.settings().listen,
        interval_ms = interval.as_millis(),
        "ticking server"
    );

    let mut announced: Option<SocketAddr> = None;
    while !shutdown.requested() {
        if let Err(error) = server.tick() {
            reporter.tick_failed(&error);
        }
        if let Some(addr) = server.local_addr()
            && announced != Some(addr)
        {
            reporter.server_listening(addr);
            announced = Some(addr);
        }
        thread::sleep(interval);
    }

    reporter.shutdown_requested();
    server.shutdown();
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}
