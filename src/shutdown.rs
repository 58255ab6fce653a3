use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Shared interrupt flag. Clones observe the same flag, and a pending
/// [`Shutdown::sleep`] wakes as soon as the flag is raised.
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        let (flag, wake) = &*self.inner;
        *lock(flag) = true;
        wake.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *lock(&self.inner.0)
    }

    /// Wait up to `duration`. Returns `true` if interrupted.
    pub fn sleep(&self, duration: Duration) -> bool {
        let (flag, wake) = &*self.inner;
        // past the end of `Instant`, only an interrupt ends the wait
        let deadline = Instant::now().checked_add(duration);
        let mut triggered = lock(flag);

        while !*triggered {
            triggered = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    match wake.wait_timeout(triggered, deadline - now) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    }
                }
                None => wake
                    .wait(triggered)
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
            };
        }

        true
    }
}

fn lock(flag: &Mutex<bool>) -> MutexGuard<'_, bool> {
    flag.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Raise `shutdown` on Ctrl-C (and SIGTERM on unix).
///
/// The poll loop itself is blocking, so the signal future runs on its own
/// thread with a single-threaded runtime.
pub fn install_interrupt_handler(shutdown: Shutdown) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("signal".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if let Err(e) = wait_for_signal().await {
                    warn!("cannot listen for interrupts: {}", e);
                    return;
                }
                debug!("interrupt received");
                shutdown.trigger();
            })
        })?;

    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
