// Non-blocking command driver for the MWRover base
//
// Requests are handed to a background worker that owns the HTTP link.
// Only one request is in flight at a time; anything queued behind it
// collapses to the most recent request. Move requests start at least
// `min_interval` apart, stops go out as soon as the link is free.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use super::link::CommandLink;
use crate::messages::DriveRequest;

/// High-level driver for the rover's wheel servos
pub struct CommandDriver {
    tx: mpsc::UnboundedSender<DriveRequest>,
    worker: JoinHandle<u64>,
}

impl CommandDriver {
    /// Start the send worker on the current tokio runtime
    pub fn spawn(link: CommandLink, min_interval: Duration) -> Self {
        info!("Sending wheel commands to {}", link.endpoint());
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(send_loop(link, min_interval, rx));
        Self { tx, worker }
    }

    /// Queue a request without waiting for the network
    pub fn submit(&self, request: DriveRequest) {
        if self.tx.send(request).is_err() {
            warn!("Command worker has stopped, dropping {:?}", request);
        }
    }

    /// Flush the pending request and stop the worker
    ///
    /// Returns how many requests the worker attempted.
    pub async fn shutdown(self) -> u64 {
        drop(self.tx);
        match self.worker.await {
            Ok(attempted) => attempted,
            Err(e) => {
                warn!("Command worker failed: {}", e);
                0
            }
        }
    }
}

async fn send_loop(
    link: CommandLink,
    min_interval: Duration,
    mut rx: mpsc::UnboundedReceiver<DriveRequest>,
) -> u64 {
    let mut attempted = 0;
    let mut last_move: Option<Instant> = None;
    let mut pending: Option<DriveRequest> = None;
    let mut closed = false;

    loop {
        let mut request = match pending.take() {
            Some(request) => request,
            None => match rx.recv().await {
                Some(request) => request,
                None => break,
            },
        };

        // Drain everything queued while the last request was in flight, keep latest
        let mut skipped = 0;
        while let Ok(next) = rx.try_recv() {
            request = next;
            skipped += 1;
        }
        if skipped > 0 {
            debug!("Collapsed {} stale requests", skipped);
        }

        if let (true, Some(last)) = (request.is_move(), last_move) {
            let ready = last + min_interval;
            if closed {
                sleep_until(ready).await;
            } else if Instant::now() < ready {
                // Hold the move back; a newer request replaces it while waiting
                tokio::select! {
                    _ = sleep_until(ready) => {}
                    next = rx.recv() => {
                        match next {
                            Some(next) => pending = Some(next),
                            None => {
                                closed = true;
                                pending = Some(request);
                            }
                        }
                        continue;
                    }
                }
            }
        }

        if request.is_move() {
            last_move = Some(Instant::now());
        }
        attempted += 1;
        let command = request.command();
        if let Err(e) = link.send(&command).await {
            warn!("Failed to send {:?}: {}", command.values(), e);
        }
    }

    debug!("Command worker stopped after {} requests", attempted);
    attempted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriveConfig;
    use crate::messages::WheelCommand;
    use crate::motor::link::tests::{Captured, fake_controller, fake_controller_with};
    use tokio::sync::mpsc::UnboundedReceiver;

    const INTERVAL: Duration = Duration::from_millis(250);

    fn link_for(url: String) -> CommandLink {
        CommandLink::new(&DriveConfig {
            controller_url: url,
            ..DriveConfig::default()
        })
        .unwrap()
    }

    fn moving(value: u16) -> DriveRequest {
        DriveRequest::Move(WheelCommand([value; 4]))
    }

    fn stopping() -> DriveRequest {
        DriveRequest::Stop(WheelCommand([1500; 4]))
    }

    async fn collect(requests: &mut UnboundedReceiver<Captured>, count: u64) -> Vec<Captured> {
        let mut captured = Vec::new();
        for _ in 0..count {
            captured.push(requests.recv().await.unwrap());
        }
        captured
    }

    #[tokio::test]
    async fn test_single_command_is_sent() {
        let (url, mut requests) = fake_controller(200, Duration::ZERO).await;
        let driver = CommandDriver::spawn(link_for(url), INTERVAL);

        driver.submit(DriveRequest::Move(WheelCommand([1600, 1600, 1400, 1400])));
        assert_eq!(driver.shutdown().await, 1);

        let req = requests.recv().await.unwrap();
        assert_eq!(req.body, "0=1600&1=1600&2=1400&3=1400");
    }

    #[tokio::test]
    async fn test_burst_collapses_to_latest() {
        let (url, mut requests) = fake_controller(200, Duration::from_millis(200)).await;
        let driver = CommandDriver::spawn(link_for(url), INTERVAL);

        driver.submit(moving(1600));
        // Let the first request go in flight before queueing the rest
        tokio::time::sleep(Duration::from_millis(50)).await;
        driver.submit(moving(1700));
        driver.submit(moving(1800));
        driver.submit(stopping());

        assert_eq!(driver.shutdown().await, 2);

        let captured = collect(&mut requests, 2).await;
        assert_eq!(captured[0].body, "0=1600&1=1600&2=1600&3=1600");
        assert_eq!(captured[1].body, "0=1500&1=1500&2=1500&3=1500");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_moves_spaced_after_slow_response() {
        // Only the first answer is slow, so queued moves would bunch up behind it
        let (url, mut requests) = fake_controller_with(200, |n| {
            if n == 0 {
                Duration::from_millis(400)
            } else {
                Duration::ZERO
            }
        })
        .await;
        let driver = CommandDriver::spawn(link_for(url), INTERVAL);

        driver.submit(moving(1600));
        tokio::time::sleep(Duration::from_millis(260)).await;
        driver.submit(moving(1700));
        tokio::time::sleep(Duration::from_millis(260)).await;
        driver.submit(moving(1800));

        assert_eq!(driver.shutdown().await, 3);

        let captured = collect(&mut requests, 3).await;
        let bodies: Vec<&str> = captured.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(
            bodies,
            [
                "0=1600&1=1600&2=1600&3=1600",
                "0=1700&1=1700&2=1700&3=1700",
                "0=1800&1=1800&2=1800&3=1800",
            ]
        );
        for pair in captured.windows(2) {
            let gap = pair[1].at.duration_since(pair[0].at);
            // Loopback jitter can shave a few ms off the start-to-start gap
            assert!(gap >= Duration::from_millis(240), "moves {:?} apart", gap);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_is_not_held_back() {
        let (url, mut requests) = fake_controller(200, Duration::ZERO).await;
        let driver = CommandDriver::spawn(link_for(url), INTERVAL);

        driver.submit(moving(1600));
        tokio::time::sleep(Duration::from_millis(50)).await;
        driver.submit(stopping());

        assert_eq!(driver.shutdown().await, 2);

        let captured = collect(&mut requests, 2).await;
        assert_eq!(captured[1].body, "0=1500&1=1500&2=1500&3=1500");
        let gap = captured[1].at.duration_since(captured[0].at);
        assert!(gap < Duration::from_millis(200), "stop waited {:?}", gap);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_replaces_held_move() {
        let (url, mut requests) = fake_controller(200, Duration::ZERO).await;
        let driver = CommandDriver::spawn(link_for(url), INTERVAL);

        driver.submit(moving(1600));
        tokio::time::sleep(Duration::from_millis(20)).await;
        // Held until the interval has passed
        driver.submit(moving(1700));
        tokio::time::sleep(Duration::from_millis(80)).await;
        driver.submit(stopping());

        assert_eq!(driver.shutdown().await, 2);

        let captured = collect(&mut requests, 2).await;
        assert_eq!(captured[0].body, "0=1600&1=1600&2=1600&3=1600");
        assert_eq!(captured[1].body, "0=1500&1=1500&2=1500&3=1500");
        let gap = captured[1].at.duration_since(captured[0].at);
        assert!(gap < Duration::from_millis(200), "stop waited {:?}", gap);
    }

    #[tokio::test]
    async fn test_held_move_flushed_on_shutdown() {
        let (url, mut requests) = fake_controller(200, Duration::ZERO).await;
        let driver = CommandDriver::spawn(link_for(url), INTERVAL);

        driver.submit(moving(1600));
        tokio::time::sleep(Duration::from_millis(20)).await;
        driver.submit(moving(1700));

        assert_eq!(driver.shutdown().await, 2);

        let captured = collect(&mut requests, 2).await;
        assert_eq!(captured[1].body, "0=1700&1=1700&2=1700&3=1700");
        assert!(captured[1].at.duration_since(captured[0].at) >= Duration::from_millis(240));
    }

    #[tokio::test]
    async fn test_failed_send_does_not_stop_worker() {
        let (url, mut requests) = fake_controller(500, Duration::ZERO).await;
        let driver = CommandDriver::spawn(link_for(url), INTERVAL);

        driver.submit(moving(1600));
        tokio::time::sleep(Duration::from_millis(100)).await;
        driver.submit(stopping());

        assert_eq!(driver.shutdown().await, 2);
        let captured = collect(&mut requests, 2).await;
        assert_eq!(captured[0].body, "0=1600&1=1600&2=1600&3=1600");
        assert_eq!(captured[1].body, "0=1500&1=1500&2=1500&3=1500");
    }

    #[tokio::test]
    async fn test_unreachable_controller_is_logged_not_fatal() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let driver = CommandDriver::spawn(link_for(url), INTERVAL);
        driver.submit(stopping());
        assert_eq!(driver.shutdown().await, 1);
    }
}
