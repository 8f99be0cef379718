//! Clock producer: publishes the current time to every subscriber.

use beacon_hub::{Event, Hub};
use beacon_kernel::domain::constants::TICK_EVENT;
use chrono::{SecondsFormat, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Starts publishing `tick` events every `interval` until the hub shuts down.
pub fn spawn_clock(hub: Hub, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(run_clock(hub, interval))
}

async fn run_clock(hub: Hub, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;
    info!(interval_ms = interval.as_millis(), "Clock producer started");

    loop {
        ticker.tick().await;
        let message = format!("the time is {}", Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        if hub.publish(Event::named(TICK_EVENT, message)).await.is_err() {
            info!("Clock producer stopped");
            return;
        }
        debug!(subscribers = hub.subscriber_count(), "Clock tick published");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn publishes_ticks_until_hub_shutdown() {
        let hub = Hub::with_defaults();
        let mut subscriber = hub.attach().await.unwrap();
        let producer = spawn_clock(hub.clone(), Duration::from_secs(2));

        for _ in 0..2 {
            let event = subscriber.recv().await.expect("tick");
            assert_eq!(event.name(), Some(TICK_EVENT));
            assert!(event.text().starts_with("the time is "));
        }

        hub.shutdown().await;
        producer.await.expect("producer exits cleanly");
    }
}
