use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Notify;
use tracing::{Instrument, debug, debug_span};

/// CloseSignal is shared by both relay directions. Closing it is
/// idempotent: only the first call has any effect.
#[derive(Clone, Default)]
pub struct CloseSignal {
    closed: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CloseSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// close marks the relay closed and wakes every waiter.
    /// Returns true only for the call that actually closed it.
    pub fn close(&self) -> bool {
        let first = !self.closed.swap(true, Ordering::AcqRel);
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// closed resolves once close has been called
    pub async fn closed(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);

        // Register before checking the flag so a concurrent close can't be missed
        notified.as_mut().enable();
        if self.is_closed() {
            return;
        }
        notified.await;
    }
}

/// relay copies bytes between the client and the destination until either
/// side finishes, then closes both.
///
/// Each direction runs on its own task; relay returns immediately and the
/// tasks release both streams when they exit.
pub fn relay<C, D>(inbound: C, outbound: D)
where
    C: AsyncRead + AsyncWrite + Send + 'static,
    D: AsyncRead + AsyncWrite + Send + 'static,
{
    let (client_read, client_write) = tokio::io::split(inbound);
    let (target_read, target_write) = tokio::io::split(outbound);
    let signal = CloseSignal::new();

    tokio::spawn(
        pipe(client_read, target_write, signal.clone()).instrument(debug_span!("upstream")),
    );
    tokio::spawn(pipe(target_read, client_write, signal).instrument(debug_span!("downstream")));
}

/// pipe drives one direction of the relay
async fn pipe<R, W>(mut reader: ReadHalf<R>, mut writer: WriteHalf<W>, signal: CloseSignal)
where
    R: AsyncRead,
    W: AsyncWrite,
{
    tokio::select! {
        copied = tokio::io::copy(&mut reader, &mut writer) => match copied {
            Ok(bytes) => debug!(bytes, "source finished"),
            Err(e) => debug!("copy ended with error: {e}"),
        },
        _ = signal.closed() => debug!("peer direction closed"),
    }

    // Send FIN so the far side stops waiting on us
    if let Err(e) = writer.shutdown().await {
        debug!("shutdown failed: {e}");
    }

    signal.close();
}
