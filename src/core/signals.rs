//! # OS signal listener.
//!
//! One [`SignalListener`] runs per orchestrated run. It is the only part of the
//! orchestrator that executes on its own task.
//!
//! ```text
//! SignalListener::spawn(signals)          (foreground: install streams, may fail)
//!     └─► tokio::spawn
//!           ├─► wait for the first configured signal
//!           ├─► root.cancel()
//!           ├─► publish SignalCaught
//!           ├─► process.on_signal(sig)        (if SignalAware)
//!           └─► wait again: a second delivery re-raises it with the default disposition
//! ```
//!
//! ## Rules
//! - Streams are installed **before** the run starts, so registration errors are
//!   reported to the caller and no signal can slip through unobserved.
//! - The root token is cancelled **at most once** per run.
//! - After the first delivery the run stops reacting; the next delivery restores the
//!   default disposition and re-raises the signal, so the parent sees death by signal.
//! - Between runs tokio's handler stays installed (it cannot be uninstalled without
//!   breaking later runs), so deliveries outside a run are swallowed.
//! - The listener is aborted when the run returns (drop).
//!
//! ## Platforms
//! **Unix:** any [`Signal`], including [`Signal::Raw`].
//!
//! **Other platforms:** only [`Signal::Interrupt`] via [`tokio::signal::ctrl_c`].

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::process::Process;

/// A termination signal the orchestrator can intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT` (Ctrl-C in terminal).
    Interrupt,
    /// `SIGTERM` (default kill signal, used by systemd/Kubernetes).
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`.
    Hangup,
    /// `SIGUSR1`.
    User1,
    /// `SIGUSR2`.
    User2,
    /// Any other signal by raw number (Unix only).
    Raw(i32),
}

#[cfg(unix)]
impl Signal {
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Quit => SignalKind::quit(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
            Signal::Raw(n) => SignalKind::from_raw(n),
        }
    }

    /// Returns the platform signal number.
    pub fn as_raw(self) -> i32 {
        self.kind().as_raw_value()
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Interrupt => f.write_str("SIGINT"),
            Signal::Terminate => f.write_str("SIGTERM"),
            Signal::Quit => f.write_str("SIGQUIT"),
            Signal::Hangup => f.write_str("SIGHUP"),
            Signal::User1 => f.write_str("SIGUSR1"),
            Signal::User2 => f.write_str("SIGUSR2"),
            Signal::Raw(n) => write!(f, "signal {n}"),
        }
    }
}

/// Installed signal streams for one run.
#[cfg(unix)]
struct SignalSet {
    streams: Vec<(Signal, tokio::signal::unix::Signal)>,
}

#[cfg(unix)]
impl SignalSet {
    fn install(signals: &[Signal]) -> io::Result<Self> {
        let mut streams = Vec::with_capacity(signals.len());
        for &sig in signals {
            streams.push((sig, tokio::signal::unix::signal(sig.kind())?));
        }
        Ok(Self { streams })
    }

    /// Waits for the next delivery of any configured signal.
    ///
    /// Never completes for an empty set. Returns `None` if the signal driver is gone.
    async fn recv(&mut self) -> Option<Signal> {
        if self.streams.is_empty() {
            return std::future::pending().await;
        }
        let waits = self.streams.iter_mut().map(|(sig, stream)| {
            let sig = *sig;
            Box::pin(async move { stream.recv().await.map(|()| sig) })
        });
        let (got, _, _) = futures::future::select_all(waits).await;
        got
    }
}

#[cfg(not(unix))]
struct SignalSet {
    interrupt: bool,
}

#[cfg(not(unix))]
impl SignalSet {
    fn install(signals: &[Signal]) -> io::Result<Self> {
        Ok(Self {
            interrupt: signals.contains(&Signal::Interrupt),
        })
    }

    async fn recv(&mut self) -> Option<Signal> {
        if !self.interrupt {
            return std::future::pending().await;
        }
        tokio::signal::ctrl_c().await.ok().map(|()| Signal::Interrupt)
    }
}

/// Terminates the process with the default disposition of `sig`.
///
/// Falls back to exit status `128 + signo` when the default disposition does not
/// terminate (or the number is unknown to the platform).
#[cfg(unix)]
fn force_quit(sig: Signal) -> ! {
    use nix::sys::signal::{self as nix_signal, SigHandler, Signal as NixSignal};

    if let Ok(native) = NixSignal::try_from(sig.as_raw()) {
        // SAFETY: `SigDfl` installs no handler code; tokio's handler is simply bypassed.
        if unsafe { nix_signal::signal(native, SigHandler::SigDfl) }.is_ok() {
            let _ = nix_signal::raise(native);
        }
    }
    std::process::exit(128 + sig.as_raw())
}

#[cfg(not(unix))]
fn force_quit(_sig: Signal) -> ! {
    std::process::exit(130)
}

/// Background listener bound to one run. Aborted on drop.
pub(crate) struct SignalListener {
    handle: JoinHandle<()>,
}

impl SignalListener {
    /// Installs the configured signals and spawns the listener task.
    ///
    /// `signals` is copied here; later configuration changes do not affect this run.
    pub(crate) fn spawn<P>(
        signals: &[Signal],
        root: CancellationToken,
        process: Arc<P>,
        bus: Bus,
    ) -> io::Result<Self>
    where
        P: Process + ?Sized,
    {
        let mut set = SignalSet::install(signals)?;

        let handle = tokio::spawn(async move {
            let Some(sig) = set.recv().await else {
                return;
            };
            root.cancel();
            bus.publish(
                Event::new(EventKind::SignalCaught)
                    .with_process(process.name())
                    .with_signal(sig),
            );
            if let Some(aware) = process.as_signal_aware() {
                aware.on_signal(sig);
            }

            if let Some(again) = set.recv().await {
                force_quit(again);
            }
        });
        Ok(Self { handle })
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_conventional_names() {
        assert_eq!(Signal::Interrupt.to_string(), "SIGINT");
        assert_eq!(Signal::Terminate.to_string(), "SIGTERM");
        assert_eq!(Signal::Raw(34).to_string(), "signal 34");
    }

    #[cfg(unix)]
    #[test]
    fn raw_numbers_match_the_platform() {
        assert_eq!(Signal::Interrupt.as_raw(), 2);
        assert_eq!(Signal::Terminate.as_raw(), 15);
        assert_eq!(Signal::Raw(12).as_raw(), 12);
    }
}
