//! Bootstrap chain and the self-rescheduling status poll.
//!
//! Both run as spawned tasks that only talk to the event loop through
//! `AppEvent`s. Neither retries: a failed stage is reported and the chain
//! moves on (bootstrap) or stops (poll).
use crate::api::Gateway;
use crate::app::{send_event, AppEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Initial load: status, tags, folders with feeds, then `BootstrapComplete`.
///
/// Stages run strictly in order. A failing stage is reported as
/// `RequestFailed` and the next stage still runs against whatever data exists.
pub async fn bootstrap(gateway: Arc<dyn Gateway>, tx: mpsc::Sender<AppEvent>) {
    match gateway.status().await {
        Ok(status) => {
            send_event(
                &tx,
                AppEvent::StatusLoaded {
                    status,
                    loop_mode: false,
                    chained: false,
                },
            )
            .await
        }
        Err(e) => report_failure(&tx, "status", e).await,
    }

    match gateway.list_tags().await {
        Ok(tags) => send_event(&tx, AppEvent::TagsLoaded(tags)).await,
        Err(e) => report_failure(&tx, "tags", e).await,
    }

    match futures::try_join!(gateway.list_folders(), gateway.list_feeds()) {
        Ok((folders, feeds)) => send_event(&tx, AppEvent::TreeLoaded { folders, feeds }).await,
        Err(e) => report_failure(&tx, "folders and feeds", e).await,
    }

    send_event(&tx, AppEvent::BootstrapComplete).await;
}

/// Poll the server status until it reports idle.
///
/// Each response is forwarded as `StatusLoaded { chained: true }`. While
/// `running` holds, the next poll is issued `interval` after the previous
/// response; every poll after the first is in loop mode. A gateway error ends
/// the chain.
pub async fn poll_status(
    gateway: Arc<dyn Gateway>,
    tx: mpsc::Sender<AppEvent>,
    interval: Duration,
    delay_first: bool,
    mut loop_mode: bool,
) {
    if delay_first {
        tokio::time::sleep(interval).await;
    }
    loop {
        let running = match gateway.status().await {
            Ok(status) => {
                let running = status.running;
                send_event(
                    &tx,
                    AppEvent::StatusLoaded {
                        status,
                        loop_mode,
                        chained: true,
                    },
                )
                .await;
                running
            }
            Err(e) => {
                report_failure(&tx, "status", e).await;
                false
            }
        };

        if !running {
            tracing::debug!("Server idle, status poll stopped");
            break;
        }
        tokio::time::sleep(interval).await;
        loop_mode = true;
    }
}

async fn report_failure(tx: &mpsc::Sender<AppEvent>, action: &'static str, error: impl std::fmt::Display) {
    tracing::warn!(action, error = %error, "Gateway call failed");
    send_event(
        tx,
        AppEvent::RequestFailed {
            action,
            error: error.to_string(),
        },
    )
    .await;
}
