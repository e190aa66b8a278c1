//! Queue command handler

use uuid::Uuid;

use crate::application::ports::{ResponseApi, ResponseStore, StoreError};
use crate::application::sync::{DrainMode, SyncEngine, SyncReport};
use crate::domain::response::ResponseStatus;

use super::args::QueueAction;
use super::presenter::Presenter;

/// Handle queue subcommand
pub async fn handle_queue_command<S, A>(
    action: QueueAction,
    store: &S,
    engine: &SyncEngine<S, A>,
    presenter: &mut Presenter,
) -> Result<(), StoreError>
where
    S: ResponseStore,
    A: ResponseApi,
{
    match action {
        QueueAction::List => handle_list(store, presenter).await,
        QueueAction::Sync => {
            run_drain(engine, presenter, DrainMode::Auto, "Syncing queued answers...").await
        }
        QueueAction::Retry => {
            run_drain(
                engine,
                presenter,
                DrainMode::Manual,
                "Retrying queued answers...",
            )
            .await
        }
        QueueAction::Count => handle_count(store, presenter).await,
    }
}

async fn handle_list<S: ResponseStore>(
    store: &S,
    presenter: &Presenter,
) -> Result<(), StoreError> {
    let responses = store.list_pending().await?;
    let mutations = store.list_mutations().await?;

    if responses.is_empty() && mutations.is_empty() {
        presenter.success("Queue is empty, everything is synced");
        return Ok(());
    }

    presenter.info(&format!(
        "{} answer(s) waiting, {} queued action(s)",
        responses.len(),
        mutations.len()
    ));

    for response in responses {
        let mut detail = format!(
            "answer {} · {}s · recorded {}",
            short_id(response.question_id),
            response.duration_secs,
            response.recorded_at.format("%Y-%m-%d %H:%M"),
        );
        if response.retry_count > 0 {
            detail.push_str(&format!(" · {} attempt(s)", response.retry_count));
        }
        if let Some(error) = &response.last_error {
            detail.push_str(&format!(" · last error: {}", error));
        }
        presenter.queue_row(response.status.as_str(), &detail);
    }

    for mutation in mutations {
        let status = if mutation.attempts > 0 {
            "failed"
        } else {
            "pending"
        };
        let mut detail = format!(
            "{} {} · queued {}",
            mutation.kind.as_str(),
            short_id(mutation.id),
            mutation.created_at.format("%Y-%m-%d %H:%M"),
        );
        if mutation.attempts > 0 {
            detail.push_str(&format!(" · {} attempt(s)", mutation.attempts));
        }
        presenter.queue_row(status, &detail);
    }

    Ok(())
}

async fn run_drain<S, A>(
    engine: &SyncEngine<S, A>,
    presenter: &mut Presenter,
    mode: DrainMode,
    label: &str,
) -> Result<(), StoreError>
where
    S: ResponseStore,
    A: ResponseApi,
{
    presenter.start_spinner(label);

    match engine.drain(mode).await {
        None => {
            presenter.stop_spinner();
            presenter.warn("A sync pass is already running");
        }
        Some(report) if report.is_empty() => {
            presenter.spinner_success("Nothing to sync");
        }
        Some(report) => {
            let summary = describe_report(&report);
            if report.failed > 0 || report.mutations_failed > 0 {
                presenter.spinner_fail(&summary);
            } else {
                presenter.spinner_success(&summary);
            }
            if matches!(mode, DrainMode::Auto) && report.skipped > 0 {
                presenter.hint("run 'rehearse queue retry' to include skipped answers");
            }
        }
    }

    Ok(())
}

async fn handle_count<S: ResponseStore>(
    store: &S,
    presenter: &Presenter,
) -> Result<(), StoreError> {
    let pending = store.count(ResponseStatus::Pending).await?;
    let syncing = store.count(ResponseStatus::Syncing).await?;
    let failed = store.count(ResponseStatus::Failed).await?;
    let mutations = store.list_mutations().await?.len();

    presenter.key_value("pending", &pending.to_string());
    presenter.key_value("syncing", &syncing.to_string());
    presenter.key_value("failed", &failed.to_string());
    presenter.key_value("actions", &mutations.to_string());

    Ok(())
}

/// Summarize a drain report in one line
pub(super) fn describe_report(report: &SyncReport) -> String {
    let mut parts = Vec::new();
    if report.synced > 0 {
        parts.push(format!("{} synced", report.synced));
    }
    if report.failed > 0 {
        parts.push(format!("{} failed", report.failed));
    }
    if report.skipped > 0 {
        parts.push(format!("{} skipped", report.skipped));
    }
    if report.mutations_applied > 0 {
        parts.push(format!("{} action(s) applied", report.mutations_applied));
    }
    if report.mutations_failed > 0 {
        parts.push(format!("{} action(s) failed", report.mutations_failed));
    }
    parts.join(", ")
}

/// First segment of a UUID, enough to tell records apart in a listing
fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_report_lists_only_nonzero_counts() {
        let report = SyncReport {
            synced: 2,
            failed: 1,
            ..Default::default()
        };
        assert_eq!(describe_report(&report), "2 synced, 1 failed");
    }

    #[test]
    fn describe_report_includes_actions() {
        let report = SyncReport {
            synced: 1,
            mutations_applied: 1,
            ..Default::default()
        };
        assert_eq!(describe_report(&report), "1 synced, 1 action(s) applied");
    }

    #[test]
    fn short_id_is_first_uuid_segment() {
        let id: Uuid = "6ba7b810-9dad-11d1-80b4-00c04fd430c8".parse().unwrap();
        assert_eq!(short_id(id), "6ba7b810");
    }
}
