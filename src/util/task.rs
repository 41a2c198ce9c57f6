use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Run `future`, turning a panic inside it into `Err(message)`.
///
/// Spawned gateway calls go through this so a panicking task is reported back
/// to the event loop as `AppEvent::TaskPanicked` instead of vanishing inside
/// the runtime.
///
/// ```ignore
/// tokio::spawn(async move {
///     if let Err(panic_msg) = catch_task_panic(work()).await {
///         tracing::error!(error = %panic_msg, "Task panicked");
///     }
/// });
/// ```
pub async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic payload".to_string()
            }
        })
}
