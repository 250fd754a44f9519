use courtrank_engine::{events::EventProducers, ChallengeApi, MatchFlowApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the settlement and expiry sweep worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Each tick auto-accepts overdue results (finalizing their ratings) and expires stale challenges and invites. Both
/// sweeps are idempotent, so overlapping runs with the admin sweep endpoints are harmless. Errors are logged and the
/// loop carries on.
pub fn start_sweep_worker(db: SqliteDatabase, producers: EventProducers, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        let matches = MatchFlowApi::new(db.clone(), producers.clone());
        let challenges = ChallengeApi::new(db, producers);
        info!("🕰️ Sweep worker started, running every {interval_secs} seconds");
        loop {
            timer.tick().await;
            debug!("🕰️ Running settlement sweep");
            match matches.settle_overdue_matches().await {
                Ok(report) => info!("🕰️ {report}"),
                Err(e) => error!("🕰️ Error running the settlement sweep: {e}"),
            }
            debug!("🕰️ Running challenge expiry sweep");
            match challenges.expire_stale().await {
                Ok(report) => info!("🕰️ {report}"),
                Err(e) => error!("🕰️ Error running the challenge expiry sweep: {e}"),
            }
        }
    })
}
