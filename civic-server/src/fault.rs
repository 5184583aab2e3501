//! Process-level fault logging
//!
//! Last-resort sinks for failures nothing else observed:
//! - panics that escaped every handler (process-wide panic hook)
//! - errors from detached background tasks ([`spawn_logged`])
//!
//! Both only log. They never abort the process and never retry.

use std::fmt::Display;
use std::future::Future;
use std::panic::{self, PanicHookInfo};
use std::sync::Once;

use tokio::task::JoinHandle;

static INSTALL: Once = Once::new();

/// Install the process-wide panic hook. Idempotent.
pub fn install() {
    INSTALL.call_once(|| {
        chain_hook();
        tracing::debug!("Fault log installed");
    });
}

/// Log first, then hand the panic to whatever hook was installed before.
fn chain_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log_panic(info);
        previous(info);
    }));
}

fn log_panic(info: &PanicHookInfo<'_>) {
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string panic payload>".to_owned());
    let location = info
        .location()
        .map(|l| format!("{}:{}", l.file(), l.line()))
        .unwrap_or_else(|| "<unknown>".to_owned());

    tracing::error!(%location, %payload, "Uncaught panic");
}

/// Spawn a task whose result nobody awaits; a failure is logged instead of lost.
pub fn spawn_logged<F, T, E>(task: &'static str, future: F) -> JoinHandle<()>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = future.await {
            tracing::error!(task, error = %e, "Unobserved background task failure");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_is_idempotent() {
        install();
        install();
        assert!(INSTALL.is_completed());
    }

    #[test]
    fn previous_hook_still_runs() {
        use std::sync::atomic::{AtomicBool, Ordering};

        static CALLED: AtomicBool = AtomicBool::new(false);

        let original = panic::take_hook();
        panic::set_hook(Box::new(|_| CALLED.store(true, Ordering::SeqCst)));
        chain_hook();

        let result = panic::catch_unwind(|| panic!("background fault"));

        // chain_hook wrapped the recorder; drop both and restore
        let _ = panic::take_hook();
        panic::set_hook(original);

        assert!(result.is_err());
        assert!(CALLED.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failed_task_is_contained() {
        let handle = spawn_logged("test", async { Err::<(), _>("connection refused") });
        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn successful_task_completes() {
        let handle = spawn_logged("test", async { Ok::<_, String>(42) });
        assert!(handle.await.is_ok());
    }
}
