//! Fan-out/fan-in pipeline: one worker task per device, one aggregator
//! draining their results.
//!
//! The completion protocol has two phases with two-sided bookkeeping:
//!
//! 1. **Submit** — the dispatcher resolves every device's options (any
//!    configuration error aborts the run here, before anything launches),
//!    spawns one worker per device, and counts submissions. Each worker
//!    posts exactly one [`DeviceResult`] on the result channel and then
//!    decrements the shared outstanding counter.
//!
//! 2. **Drain** — the aggregator consumes results and hands each to the
//!    writer. It exits only once it has been told, over a separate stop
//!    channel, how many results were confirmed sent -- and it has
//!    processed that many. The stop message is sent after every worker
//!    has been joined, never inferred from the result stream itself.
//!
//! A premature stop would drop buffered results; a missing stop would
//! hang the drain. Neither can happen as long as the counter and the stop
//! token stay on opposite sides of the channel.
//!
//! There is deliberately no pool bound, no per-device timeout, and no
//! cancellation: a hung session hangs its worker and the run. The result
//! channel's rendezvous capacity is the single point of backpressure.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use convoy_session::SessionFactory;

use crate::error::CoreError;
use crate::inventory::Inventory;
use crate::options::OptionBuilder;
use crate::output::ResponseWriter;
use crate::worker::{self, DeviceResult};

/// Outcome of one run. Individual device failures live here, not in a
/// process-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Workers launched (devices after filtering).
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Launches device workers and aggregates their results into a writer.
pub struct Dispatcher {
    factory: Arc<dyn SessionFactory>,
}

impl Dispatcher {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self { factory }
    }

    /// Run every device in the inventory to completion.
    ///
    /// Fails fast with a configuration error if any device's profiles do
    /// not resolve; otherwise always returns a summary, however many
    /// devices failed individually.
    pub async fn run(
        &self,
        inventory: &Inventory,
        writer: ResponseWriter,
    ) -> Result<RunSummary, CoreError> {
        // Resolve all connection options up front so configuration errors
        // surface before any worker launches.
        let builder = OptionBuilder::new(inventory);
        let mut jobs = Vec::with_capacity(inventory.devices.len());

        for (name, device) in &inventory.devices {
            let options = builder.resolve(name, device)?;
            jobs.push((name.clone(), device.clone(), options));
        }

        let submitted = jobs.len();

        // Rendezvous-sized result channel: a worker's final send waits for
        // the aggregator, the single point of convergence.
        let (result_tx, result_rx) = mpsc::channel::<DeviceResult>(1);
        let (stop_tx, stop_rx) = mpsc::channel::<usize>(1);

        let aggregator = tokio::spawn(aggregate(result_rx, stop_rx, writer));

        // Phase 1: submit.
        let outstanding = Arc::new(AtomicUsize::new(submitted));
        let mut handles = Vec::with_capacity(submitted);

        for (name, device, options) in jobs {
            let factory = Arc::clone(&self.factory);
            let result_tx = result_tx.clone();
            let outstanding = Arc::clone(&outstanding);

            handles.push(tokio::spawn(async move {
                let result = worker::run_device(&name, &device, options, factory.as_ref()).await;

                if result_tx.send(result).await.is_err() {
                    error!(device = %name, "aggregator gone before result could be posted");
                    return;
                }

                outstanding.fetch_sub(1, Ordering::AcqRel);
            }));
        }

        drop(result_tx);

        for handle in handles {
            if let Err(err) = handle.await {
                error!(error = %err, "device worker panicked");
            }
        }

        // Every joined worker has completed its send; the counter tells us
        // how many actually made it onto the channel.
        let confirmed = submitted - outstanding.load(Ordering::Acquire);

        // Phase 2: tell the aggregator to drain exactly that many. The
        // send only fails when the aggregator already drained the closed
        // channel and exited, which is not a loss.
        if stop_tx.send(confirmed).await.is_err() {
            debug!("aggregator exited before the stop signal");
        }

        let (processed, failed) = match aggregator.await {
            Ok(counts) => counts,
            Err(err) => {
                error!(error = %err, "aggregator panicked");
                (0, 0)
            }
        };

        if processed != submitted {
            // Either a worker panicked before posting or a result was
            // lost; both are bugs worth shouting about.
            warn!(submitted, processed, "result count mismatch");
        }

        info!(
            dispatched = submitted,
            succeeded = processed - failed,
            failed,
            "run complete"
        );

        Ok(RunSummary {
            dispatched: submitted,
            succeeded: processed - failed,
            failed,
        })
    }
}

/// Drain the result channel, dispatching each message to the writer.
///
/// Returns `(processed, failed)`. Writer errors are logged and the message
/// still counts as processed -- an output failure must never leave the
/// count short.
async fn aggregate(
    mut result_rx: mpsc::Receiver<DeviceResult>,
    mut stop_rx: mpsc::Receiver<usize>,
    writer: ResponseWriter,
) -> (usize, usize) {
    let mut processed = 0usize;
    let mut failed = 0usize;
    let mut confirmed: Option<usize> = None;

    loop {
        tokio::select! {
            biased;

            maybe = result_rx.recv() => {
                let Some(result) = maybe else {
                    // All senders dropped and the channel is drained;
                    // nothing more can arrive regardless of the stop
                    // signal.
                    break;
                };

                debug!(device = %result.name, ok = result.records.is_some(), "result received");

                if result.records.is_none() {
                    failed += 1;
                }

                if let Err(err) = writer.write(&result) {
                    error!(device = %result.name, error = %err, "failed to write result");
                }

                processed += 1;

                if confirmed.is_some_and(|count| processed >= count) {
                    break;
                }
            }

            Some(count) = stop_rx.recv(), if confirmed.is_none() => {
                debug!(count, "stop signal received");
                confirmed = Some(count);

                if processed >= count {
                    break;
                }
            }
        }
    }

    (processed, failed)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use crate::inventory::CredentialProfile;
    use crate::testing::{test_device, MockFactory};

    use super::*;

    fn inventory_of(devices: &[(&str, &str)]) -> Inventory {
        let mut inventory = Inventory::default();
        inventory
            .credentials
            .insert("default".into(), CredentialProfile::default());

        for (name, address) in devices {
            inventory.devices.insert(
                (*name).to_string(),
                test_device("arista_eos", address, &["show version"]),
            );
        }

        inventory
    }

    #[tokio::test]
    async fn every_dispatched_device_yields_exactly_one_result() {
        let devices: Vec<(String, String)> = (0..10)
            .map(|i| (format!("dev-{i}"), format!("10.0.0.{i}")))
            .collect();
        let pairs: Vec<(&str, &str)> = devices
            .iter()
            .map(|(n, a)| (n.as_str(), a.as_str()))
            .collect();

        let inventory = inventory_of(&pairs);
        let dir = tempfile::tempdir().unwrap();

        // A sleep inside open lets workers finish in shuffled order
        // relative to spawn order.
        let dispatcher = Dispatcher::new(Arc::new(
            MockFactory::new()
                .fail_open("10.0.0.3")
                .open_delay(Duration::from_millis(5)),
        ));

        let summary = dispatcher
            .run(
                &inventory,
                ResponseWriter::file_at(dir.path().join("outputs")),
            )
            .await
            .unwrap();

        assert_eq!(summary.dispatched, 10);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 9);

        // One subdirectory per successful device, none for the failure.
        let entries: Vec<String> = std::fs::read_dir(dir.path().join("outputs"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries.len(), 9);
        assert!(!entries.contains(&"dev-3".to_string()));
    }

    #[tokio::test]
    async fn file_sink_layout_one_file_per_command() {
        let mut inventory = inventory_of(&[]);
        let mut device = test_device("genericOS", "10.1.1.1", &[]);
        device.send_commands = vec!["show version".into(), "show ip route".into()];
        inventory.devices.insert("edge-router".into(), device);

        let dir = tempfile::tempdir().unwrap();
        let dispatcher = Dispatcher::new(Arc::new(MockFactory::new()));

        let summary = dispatcher
            .run(
                &inventory,
                ResponseWriter::file_at(dir.path().join("outputs")),
            )
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 1);

        let base = dir.path().join("outputs").join("edge-router");
        assert_eq!(
            std::fs::read_to_string(base.join("show-version")).unwrap(),
            "output of show version"
        );
        assert_eq!(
            std::fs::read_to_string(base.join("show-ip-route")).unwrap(),
            "output of show ip route"
        );
    }

    #[tokio::test]
    async fn unresolved_profile_aborts_before_any_worker_launches() {
        let mut inventory = inventory_of(&[("edge-1", "10.0.0.1")]);
        let mut bad = test_device("arista_eos", "10.0.0.2", &["show version"]);
        bad.credentials = Some("missing".into());
        inventory.devices.insert("edge-2".into(), bad);

        let factory = Arc::new(MockFactory::new());
        let dispatcher = Dispatcher::new(Arc::clone(&factory) as Arc<dyn SessionFactory>);

        let err = dispatcher
            .run(&inventory, ResponseWriter::console())
            .await
            .unwrap_err();

        assert!(
            matches!(err, CoreError::UnknownCredentialProfile { ref name, .. } if name == "missing")
        );
        // Nothing was opened: the good device never dispatched either.
        assert!(factory.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_inventory_completes_with_zero_results() {
        let inventory = inventory_of(&[]);
        let dispatcher = Dispatcher::new(Arc::new(MockFactory::new()));

        let summary = dispatcher
            .run(&inventory, ResponseWriter::console())
            .await
            .unwrap();

        assert_eq!(
            summary,
            RunSummary {
                dispatched: 0,
                succeeded: 0,
                failed: 0
            }
        );
    }
}
