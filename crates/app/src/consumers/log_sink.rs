use tokio::sync::mpsc::Receiver;
use tracing::info;

use commentary_core::domain::events::{CommentEvent, EventPayload};

pub async fn run(mut receiver: Receiver<CommentEvent>) {
    while let Some(event) = receiver.recv().await {
        record(&event);
    }
    info!("event log sink stopped");
}

fn record(event: &CommentEvent) {
    match &event.payload {
        EventPayload::Comment(comment) => info!(
            event = event.name.as_str(),
            comment_id = %comment.id,
            entity_context_id = %comment.entity_context_id,
            status = %comment.status,
            "comment event"
        ),
        EventPayload::Report(report) => info!(
            event = event.name.as_str(),
            report_id = %report.id,
            comment_id = %report.comment_id,
            "report event"
        ),
    }
}
