//! The capture/query/deadline race.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::CaptureLoop;
use crate::capture::FrameSource;
use crate::config::Config;
use crate::domain::CaptureOutcome;
use crate::error::{CaptureError, RunError};
use crate::query::{QueryDriver, Resolver};

type CaptureResult = Result<Ipv4Addr, CaptureError>;

/// Runs one capture against lookups and a deadline.
///
/// A run moves from idle to capturing once the capture task is spawned,
/// and resolves exactly once: on the first matching frame, on a capture
/// or lookup failure, or when the deadline passes.
pub struct Correlator {
    domain: String,
    timeout: Duration,
    poll_interval: Duration,
    query_count: u32,
    queries: QueryDriver,
}

impl Correlator {
    pub fn new(config: &Config, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            domain: config.domain.clone(),
            timeout: config.timeout,
            poll_interval: config.poll_interval,
            query_count: config.query_count,
            queries: QueryDriver::new(resolver),
        }
    }

    /// Capture on `source` until an outcome is reached.
    ///
    /// The source is moved into the capture task and has been dropped by
    /// the time this returns, whatever the outcome.
    pub async fn run<S>(&self, source: S) -> CaptureOutcome
    where
        S: FrameSource + 'static,
    {
        let deadline = Instant::now() + self.timeout;
        let running = Arc::new(AtomicBool::new(true));
        let (tx, mut capture_rx) = oneshot::channel::<CaptureResult>();

        info!(
            "Capturing on {} for up to {:?}",
            source.interface_name(),
            self.timeout
        );

        let capture = CaptureLoop::new(source, Arc::clone(&running), self.poll_interval);
        let capture_task = tokio::task::spawn_blocking(move || {
            if let Some(result) = capture.run() {
                // The coordinator may already have resolved; a closed channel is fine
                let _ = tx.send(result);
            }
        });

        let queries = self.queries.issue_queries(&self.domain, self.query_count);
        tokio::pin!(queries);
        let expiry = tokio::time::sleep_until(deadline);
        tokio::pin!(expiry);
        let mut queries_done = false;

        let outcome = loop {
            tokio::select! {
                biased;

                result = &mut capture_rx => break match result {
                    Ok(Ok(addr)) => CaptureOutcome::Responder(addr),
                    Ok(Err(e)) => CaptureOutcome::Failed(RunError::Capture(e)),
                    Err(_) => CaptureOutcome::Failed(RunError::Capture(CaptureError::TaskAborted(
                        "capture task exited without a result".to_string(),
                    ))),
                },

                result = &mut queries, if !queries_done => match result {
                    Ok(()) => {
                        queries_done = true;
                        debug!(
                            "All {} lookups for {} issued, waiting for a response",
                            self.query_count, self.domain
                        );
                    }
                    Err(e) => break CaptureOutcome::Failed(RunError::Query(e)),
                },

                () = &mut expiry => break CaptureOutcome::TimedOut,
            }
        };

        // Resolved: stop the capture task and wait for it to release the socket
        running.store(false, Ordering::SeqCst);
        if let Err(e) = capture_task.await {
            warn!("Capture task did not shut down cleanly: {}", e);
        }

        match &outcome {
            CaptureOutcome::Responder(addr) => info!("DNS response observed from {}", addr),
            CaptureOutcome::Failed(e) => warn!("Capture failed: {}", e),
            CaptureOutcome::TimedOut => warn!("No DNS response within {:?}", self.timeout),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;
    use std::net::IpAddr;
    use std::sync::atomic::AtomicU32;
    use std::sync::{mpsc, Mutex};
    use std::time::Instant as StdInstant;

    use crate::error::QueryError;

    enum Script {
        Frame(Vec<u8>),
        Idle,
        Fail,
    }

    /// Frame source that replays a script, then stays idle forever.
    struct ScriptedSource {
        script: VecDeque<Script>,
        current: Vec<u8>,
        released: Arc<AtomicBool>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Script>) -> (Self, Arc<AtomicBool>) {
            let released = Arc::new(AtomicBool::new(false));
            let source = Self {
                script: script.into(),
                current: Vec::new(),
                released: Arc::clone(&released),
            };
            (source, released)
        }
    }

    impl FrameSource for ScriptedSource {
        fn read_frame(&mut self) -> Result<Option<&[u8]>, CaptureError> {
            match self.script.pop_front() {
                Some(Script::Frame(frame)) => {
                    self.current = frame;
                    Ok(Some(self.current.as_slice()))
                }
                Some(Script::Fail) => Err(CaptureError::Read(io::Error::other("network is down"))),
                Some(Script::Idle) | None => Ok(None),
            }
        }

        fn interface_name(&self) -> &str {
            "test0"
        }
    }

    impl Drop for ScriptedSource {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    struct StaticResolver {
        calls: AtomicU32,
        fail_on: Option<u32>,
    }

    impl StaticResolver {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail_on: None,
            })
        }

        fn failing_on(attempt: u32) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail_on: Some(attempt),
            })
        }
    }

    impl Resolver for StaticResolver {
        fn lookup(&self, _domain: &str) -> io::Result<Vec<IpAddr>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on == Some(call) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such host"));
            }
            Ok(vec![IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))])
        }
    }

    /// Resolver whose lookups block until the test releases them.
    struct GatedResolver {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl Resolver for GatedResolver {
        fn lookup(&self, _domain: &str) -> io::Result<Vec<IpAddr>> {
            let gate = self.gate.lock().unwrap();
            let _ = gate.recv_timeout(Duration::from_secs(10));
            Ok(vec![IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))])
        }
    }

    fn dns_frame(src_ip: [u8; 4], src_port: u16) -> Vec<u8> {
        let mut frame = vec![0u8; 12];
        frame.extend(0x0800u16.to_be_bytes());
        let mut ip = [0u8; 20];
        ip[0] = 0x45;
        ip[9] = 17;
        ip[12..16].copy_from_slice(&src_ip);
        frame.extend(ip);
        frame.extend(src_port.to_be_bytes());
        frame.extend(33000u16.to_be_bytes());
        frame.extend(8u16.to_be_bytes());
        frame.extend([0u8, 0]);
        frame
    }

    fn config(timeout: Duration) -> Config {
        Config::default()
            .with_timeout(timeout)
            .with_poll_interval(Duration::from_millis(1))
    }

    mod match_tests {
        use super::*;

        #[tokio::test]
        async fn reports_responder_after_noise() {
            let mut arp = vec![0u8; 42];
            arp[12] = 0x08;
            arp[13] = 0x06;
            let (source, released) = ScriptedSource::new(vec![
                Script::Idle,
                Script::Frame(arp),
                Script::Frame(dns_frame([10, 0, 0, 2], 443)),
                Script::Frame(vec![0xff; 10]),
                Script::Idle,
                Script::Frame(dns_frame([1, 1, 1, 1], 53)),
            ]);
            let correlator = Correlator::new(&config(Duration::from_secs(5)), StaticResolver::ok());

            let outcome = correlator.run(source).await;

            assert_eq!(outcome.responder(), Some(Ipv4Addr::new(1, 1, 1, 1)));
            assert!(released.load(Ordering::SeqCst));
        }

        #[tokio::test]
        async fn first_match_wins() {
            let (source, _released) = ScriptedSource::new(vec![
                Script::Frame(dns_frame([8, 8, 8, 8], 53)),
                Script::Frame(dns_frame([1, 1, 1, 1], 53)),
            ]);
            let correlator = Correlator::new(&config(Duration::from_secs(5)), StaticResolver::ok());

            let outcome = correlator.run(source).await;

            assert_eq!(outcome.responder(), Some(Ipv4Addr::new(8, 8, 8, 8)));
        }

        #[tokio::test]
        async fn match_does_not_wait_for_lookups() {
            let (release, gate) = mpsc::channel();
            let resolver = Arc::new(GatedResolver {
                gate: Mutex::new(gate),
            });
            let (source, released) =
                ScriptedSource::new(vec![Script::Frame(dns_frame([9, 9, 9, 9], 53))]);
            let correlator = Correlator::new(&config(Duration::from_secs(5)), resolver);

            let started = StdInstant::now();
            let outcome = correlator.run(source).await;
            let elapsed = started.elapsed();
            let _ = release.send(());

            assert_eq!(outcome.responder(), Some(Ipv4Addr::new(9, 9, 9, 9)));
            assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
            assert!(released.load(Ordering::SeqCst));
        }
    }

    mod failure_tests {
        use super::*;

        #[tokio::test]
        async fn read_error_is_fatal() {
            let (source, released) = ScriptedSource::new(vec![Script::Idle, Script::Fail]);
            let correlator = Correlator::new(&config(Duration::from_secs(5)), StaticResolver::ok());

            let outcome = correlator.run(source).await;

            assert!(matches!(
                outcome,
                CaptureOutcome::Failed(RunError::Capture(CaptureError::Read(_)))
            ));
            assert_eq!(outcome.exit_code(), 2);
            assert!(released.load(Ordering::SeqCst));
        }

        #[tokio::test]
        async fn lookup_failure_is_fatal() {
            let resolver = StaticResolver::failing_on(2);
            let (source, released) = ScriptedSource::new(Vec::new());
            let correlator = Correlator::new(&config(Duration::from_secs(5)), resolver.clone());

            let started = StdInstant::now();
            let outcome = correlator.run(source).await;

            match outcome {
                CaptureOutcome::Failed(RunError::Query(e)) => assert_eq!(e.attempt(), Some(2)),
                other => panic!("unexpected outcome: {other:?}"),
            }
            assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
            assert!(started.elapsed() < Duration::from_secs(5));
            assert!(released.load(Ordering::SeqCst));
        }

        #[tokio::test]
        async fn lookup_failure_carries_domain() {
            let (source, _released) = ScriptedSource::new(Vec::new());
            let settings = config(Duration::from_secs(5)).with_domain("nx.invalid");
            let correlator = Correlator::new(&settings, StaticResolver::failing_on(1));

            match correlator.run(source).await {
                CaptureOutcome::Failed(RunError::Query(QueryError::Lookup { domain, attempt, .. })) => {
                    assert_eq!(domain, "nx.invalid");
                    assert_eq!(attempt, 1);
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    mod deadline_tests {
        use super::*;

        #[tokio::test]
        async fn times_out_without_traffic() {
            let timeout = Duration::from_millis(150);
            let resolver = StaticResolver::ok();
            let (source, released) = ScriptedSource::new(Vec::new());
            let correlator = Correlator::new(&config(timeout), resolver.clone());

            let started = StdInstant::now();
            let outcome = correlator.run(source).await;
            let elapsed = started.elapsed();

            assert!(matches!(outcome, CaptureOutcome::TimedOut));
            assert!(elapsed >= timeout, "resolved early: {elapsed:?}");
            assert!(elapsed < timeout + Duration::from_millis(500), "resolved late: {elapsed:?}");
            // Lookups finishing is not an outcome on its own
            assert_eq!(resolver.calls.load(Ordering::SeqCst), 4);
            assert!(released.load(Ordering::SeqCst));
        }

        #[tokio::test]
        async fn non_matching_traffic_still_times_out() {
            let timeout = Duration::from_millis(100);
            let script = (0..50)
                .map(|i| Script::Frame(dns_frame([10, 0, 0, i as u8], 80)))
                .collect();
            let (source, _released) = ScriptedSource::new(script);
            let correlator = Correlator::new(&config(timeout), StaticResolver::ok());

            let outcome = correlator.run(source).await;

            assert!(matches!(outcome, CaptureOutcome::TimedOut));
        }
    }
}
