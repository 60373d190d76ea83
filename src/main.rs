//! whichdns - DNS responder finder
//!
//! Captures link-layer traffic while issuing DNS lookups and prints the
//! address of the server that answered.

use std::future::Future;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use whichdns::capture::{ensure_capture_privilege, select_interface, PnetFrameSource};
use whichdns::domain::{EXIT_CAPTURE_FAILURE, EXIT_SETUP_FAILURE, EXIT_SUCCESS};
use whichdns::query::SystemResolver;
use whichdns::reporter::{reporter_for, OutcomeReporter};
use whichdns::{CaptureError, CaptureOutcome, Config, Correlator, VERSION};

#[derive(Parser)]
#[command(name = "whichdns")]
#[command(about = "Find which DNS server is being used")]
#[command(long_about = "Detects which DNS server responds to DNS queries by capturing network packets.\n\n\
Performs DNS lookups while monitoring network traffic to identify which DNS server \
actually responds to the queries. Requires root privileges.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// The domain for DNS lookup
    #[arg(long)]
    domain: Option<String>,

    /// Print only the IP address of the DNS server
    #[arg(long)]
    iponly: bool,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    /// Network interface to capture on (default: first with a global unicast address)
    #[arg(short, long)]
    interface: Option<String>,

    /// Seconds to wait for a DNS response
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the version number
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(Commands::Version) = cli.command {
        println!("Version: {}", VERSION);
        return ExitCode::from(EXIT_SUCCESS);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            if !cli.iponly {
                eprintln!("error: {:#}", e);
            }
            return ExitCode::from(EXIT_SETUP_FAILURE);
        }
    };

    init_tracing(&config);
    tracing::debug!(
        "Parsed arguments: domain={}, ip_only={}, debug={}",
        config.domain,
        config.ip_only,
        config.debug
    );

    let reporter = reporter_for(&config);

    let code = match block_on_detached(run(config, reporter.as_ref())) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            EXIT_SETUP_FAILURE
        }
    };

    ExitCode::from(code)
}

/// Drive `future` to completion on a fresh multi-thread runtime.
///
/// A resolved run may leave lookups blocked in the system resolver. The
/// runtime is shut down without waiting for them, so the process exits as
/// soon as the outcome is known.
fn block_on_detached<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

/// Defaults, then environment, then command-line flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env().context("Invalid environment configuration")?;

    if let Some(domain) = &cli.domain {
        config = config.with_domain(domain.clone());
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if cli.interface.is_some() {
        config = config.with_interface(cli.interface.clone());
    }
    config = config.with_ip_only(cli.iponly).with_debug(cli.debug);

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.tracing_filter()));

    // Logs go to stderr so stdout only ever carries results
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Run one detection and return the process exit code.
async fn run(config: Config, reporter: &dyn OutcomeReporter) -> u8 {
    let setup = ensure_capture_privilege()
        .and_then(|()| select_interface(config.interface.as_deref()))
        .and_then(|iface| {
            tracing::info!("Default network interface obtained: {}", iface);
            if let Err(e) = reporter.on_start(&iface, &mut io::stdout().lock()) {
                tracing::warn!("Failed to write interface line: {}", e);
            }
            PnetFrameSource::open(&iface)
        });

    let source = match setup {
        Ok(source) => source,
        Err(e) => return setup_failed(reporter, &e),
    };

    let correlator = Correlator::new(&config, Arc::new(SystemResolver));
    let outcome = correlator.run(source).await;

    report_outcome(
        reporter,
        &outcome,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )
}

/// Render `outcome` and return the exit code for what was actually written.
///
/// Success is only reported when the responder line reached `out`.
fn report_outcome(
    reporter: &dyn OutcomeReporter,
    outcome: &CaptureOutcome,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> u8 {
    let written = reporter
        .report(outcome, out, err)
        .and_then(|()| out.flush());

    match written {
        Ok(()) => outcome.exit_code(),
        Err(e) if outcome.is_success() => {
            tracing::error!("Failed to write DNS server address: {}", e);
            EXIT_CAPTURE_FAILURE
        }
        Err(e) => {
            tracing::warn!("Failed to write failure report: {}", e);
            outcome.exit_code()
        }
    }
}

fn setup_failed(reporter: &dyn OutcomeReporter, error: &CaptureError) -> u8 {
    tracing::debug!("Setup failed: {}", error);
    if let Err(e) = reporter.setup_failed(error, &mut io::stderr().lock()) {
        tracing::warn!("Failed to write setup error: {}", e);
    }
    EXIT_SETUP_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Instant;

    use whichdns::capture::FrameSource;
    use whichdns::query::Resolver;
    use whichdns::reporter::{ConsoleReporter, IpOnlyReporter};
    use whichdns::RunError;

    /// Writer whose every write fails like a closed pipe.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    /// Yields one DNS response from 1.1.1.1, then stays idle.
    struct OneResponse {
        frame: Option<Vec<u8>>,
        current: Vec<u8>,
    }

    impl OneResponse {
        fn new() -> Self {
            let mut frame = vec![0u8; 12];
            frame.extend(0x0800u16.to_be_bytes());
            let mut ip = [0u8; 20];
            ip[0] = 0x45;
            ip[9] = 17;
            ip[12..16].copy_from_slice(&[1, 1, 1, 1]);
            frame.extend(ip);
            frame.extend(53u16.to_be_bytes());
            frame.extend(40000u16.to_be_bytes());
            frame.extend(8u16.to_be_bytes());
            frame.extend([0u8, 0]);
            Self {
                frame: Some(frame),
                current: Vec::new(),
            }
        }
    }

    impl FrameSource for OneResponse {
        fn read_frame(&mut self) -> Result<Option<&[u8]>, CaptureError> {
            match self.frame.take() {
                Some(frame) => {
                    self.current = frame;
                    Ok(Some(self.current.as_slice()))
                }
                None => Ok(None),
            }
        }

        fn interface_name(&self) -> &str {
            "test0"
        }
    }

    /// Resolver that blocks well past any reasonable exit.
    struct HungResolver;

    impl Resolver for HungResolver {
        fn lookup(&self, _domain: &str) -> io::Result<Vec<IpAddr>> {
            std::thread::sleep(Duration::from_secs(3));
            Ok(vec![IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))])
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "whichdns", "--domain", "test.com", "--iponly", "--debug", "-i", "eth1", "--timeout", "3",
        ])
        .unwrap();
        assert_eq!(cli.domain.as_deref(), Some("test.com"));
        assert!(cli.iponly);
        assert!(cli.debug);
        assert_eq!(cli.interface.as_deref(), Some("eth1"));
        assert_eq!(cli.timeout, Some(3));
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_version_subcommand() {
        let cli = Cli::try_parse_from(["whichdns", "version"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Version)));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "whichdns", "--domain", "test.com", "--iponly", "--timeout", "4",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.domain, "test.com");
        assert_eq!(config.timeout, Duration::from_secs(4));
        assert!(config.ip_only);
        assert!(!config.debug);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cli = Cli::try_parse_from(["whichdns", "--timeout", "0"]).unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn exit_does_not_wait_for_abandoned_lookups() {
        let config = Config::default().with_timeout(Duration::from_secs(5));
        let correlator = Correlator::new(&config, Arc::new(HungResolver));

        let started = Instant::now();
        let outcome = block_on_detached(correlator.run(OneResponse::new())).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome.responder(), Some(Ipv4Addr::new(1, 1, 1, 1)));
        assert!(
            elapsed < Duration::from_secs(2),
            "runtime shutdown waited {:?} for lookups",
            elapsed
        );
    }

    #[test]
    fn unwritten_address_is_not_success() {
        let outcome = CaptureOutcome::Responder(Ipv4Addr::new(192, 168, 1, 1));
        let mut err = Vec::new();

        let code = report_outcome(&IpOnlyReporter::new(), &outcome, &mut ClosedPipe, &mut err);
        assert_eq!(code, EXIT_CAPTURE_FAILURE);

        let console = ConsoleReporter::new();
        let code = report_outcome(&console, &outcome, &mut ClosedPipe, &mut err);
        assert_eq!(code, EXIT_CAPTURE_FAILURE);
    }

    #[test]
    fn written_address_is_success() {
        let outcome = CaptureOutcome::Responder(Ipv4Addr::new(192, 168, 1, 1));
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let code = report_outcome(&IpOnlyReporter::new(), &outcome, &mut out, &mut err);
        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(out, b"192.168.1.1\n");
    }

    #[test]
    fn failure_exit_code_survives_write_errors() {
        let mut err = Vec::new();
        let code = report_outcome(
            &IpOnlyReporter::new(),
            &CaptureOutcome::TimedOut,
            &mut ClosedPipe,
            &mut err,
        );
        assert_eq!(code, EXIT_CAPTURE_FAILURE);

        let failed = CaptureOutcome::Failed(RunError::Capture(CaptureError::Read(
            io::Error::other("network is down"),
        )));
        let code = report_outcome(
            &ConsoleReporter::new(),
            &failed,
            &mut ClosedPipe,
            &mut ClosedPipe,
        );
        assert_eq!(code, EXIT_CAPTURE_FAILURE);
    }
}
