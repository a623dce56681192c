//! Exporter lifecycle: connect, capture identity, serve, poll, shut down.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::ExporterConfig;
use crate::dish::{DishClient, GrpcDishClient};
use crate::error::{ExporterError, Result};
use crate::metrics::{DishMetrics, Poller};
use crate::web;

/// Connect to the dish, bind the metrics endpoint and run until `shutdown`
/// resolves.
pub async fn run(
    config: ExporterConfig,
    shutdown: impl Future<Output = ()> + Send,
) -> Result<()> {
    let client = GrpcDishClient::connect(&config.dish, config.timeouts()).await?;

    let listener = TcpListener::bind(config.listen).await.map_err(|e| {
        ExporterError::web_server_error(format!("Failed to bind to {}: {}", config.listen, e))
    })?;

    serve(client, listener, config.interval, shutdown).await
}

/// Run the exporter over an established dish client and a bound listener.
///
/// The device identity is fetched once and fixes the bootcount labels for
/// the rest of the process. The first update cycle runs immediately, then
/// one per `interval`. Once `shutdown` resolves no new cycle starts; the
/// cycle in flight finishes before the HTTP server is stopped.
pub async fn serve<C>(
    mut client: C,
    listener: TcpListener,
    interval: Duration,
    shutdown: impl Future<Output = ()> + Send,
) -> Result<()>
where
    C: DishClient + Send + 'static,
{
    let info = client.device_info().await?;
    let identity = info.identity;
    info!(
        id = %identity.id,
        hardware_version = %identity.hardware_version,
        software_version = %identity.software_version,
        country_code = %identity.country_code,
        "Dish identified"
    );

    let metrics = Arc::new(DishMetrics::new()?);
    let (stop_tx, stop_rx) = watch::channel(false);

    let mut server_stop = stop_rx.clone();
    let server = tokio::spawn(web::serve_metrics(listener, metrics.clone(), async move {
        let _ = server_stop.changed().await;
    }));

    let poller = Poller::new(client, metrics, identity);
    let poller_task = tokio::spawn(poll_loop(poller, interval, stop_rx));

    shutdown.await;
    info!("Shutdown requested, waiting for the current update to finish");
    let _ = stop_tx.send(true);

    if let Err(e) = poller_task.await {
        error!("Poll loop ended abnormally: {}", e);
    }

    match server.await {
        Ok(result) => result?,
        Err(e) => warn!("Metrics server task ended abnormally: {}", e),
    }

    info!("Exporter stopped");
    Ok(())
}

/// Run update cycles every `interval` until `stop` flips.
///
/// The stop flag is only checked between cycles, so a cycle that has started
/// always runs to completion. Cycles never overlap: a cycle that overruns
/// the interval pushes the next tick back instead of queueing extra ones.
pub async fn poll_loop<C: DishClient>(
    mut poller: Poller<C>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *stop.borrow() {
            break;
        }

        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = ticker.tick() => {
                let report = poller.run_cycle().await;
                if !report.is_clean() {
                    warn!(failed = ?report.failed, "Update cycle finished with failures");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dish::fake::FakeDish;
    use crate::dish::{DeviceIdentity, HistoryWindow, RequestKind, StatusSnapshot};

    fn poller(dish: &FakeDish) -> (Poller<FakeDish>, Arc<DishMetrics>) {
        let metrics = Arc::new(DishMetrics::new().unwrap());
        let poller = Poller::new(dish.clone(), metrics.clone(), DeviceIdentity::default());
        (poller, metrics)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_runs_immediately() {
        let dish = FakeDish::new();
        let (poller, metrics) = poller(&dish);
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(poll_loop(poller, Duration::from_secs(30), stop_rx));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(metrics.updates.get(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(metrics.updates.get(), 2);

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(
            &dish.calls()[..3],
            &[RequestKind::DeviceInfo, RequestKind::Status, RequestKind::History]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_waits_for_in_flight_cycle() {
        let dish = FakeDish::new().with_delay(Duration::from_secs(2));
        dish.push_status(Ok(StatusSnapshot {
            gps_sats: 7,
            ..Default::default()
        }));
        dish.push_history(Ok(HistoryWindow::default()));
        let (poller, metrics) = poller(&dish);
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(poll_loop(poller, Duration::from_secs(30), stop_rx));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(metrics.updates.get(), 0);

        stop_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(metrics.updates.get(), 1);
        assert_eq!(metrics.gps_sats.get(), 7.0);
        assert_eq!(dish.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_stop_before_start_runs_nothing() {
        let dish = FakeDish::new();
        let (poller, metrics) = poller(&dish);
        let (stop_tx, stop_rx) = watch::channel(false);
        stop_tx.send(true).unwrap();

        poll_loop(poller, Duration::from_secs(30), stop_rx).await;

        assert_eq!(metrics.updates.get(), 0);
        assert!(dish.calls().is_empty());
    }
}
