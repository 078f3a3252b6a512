use super::hub::EventHub;
use super::AssetEvent;
use crate::application::pipeline::PipelineTrigger;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Forwards hub events to the pipeline until the hub is dropped.
pub fn start(event_hub: &EventHub, trigger: Arc<dyn PipelineTrigger>) -> JoinHandle<()> {
    let mut rx = event_hub.subscribe();

    tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event listener lagged, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            dispatch(trigger.as_ref(), event).await;
        }
        info!("Event listener stopped");
    })
}

async fn dispatch(trigger: &dyn PipelineTrigger, event: AssetEvent) {
    match event {
        AssetEvent::Created(asset) => {
            let asset_id = asset.id;
            if let Err(e) = trigger.on_created(asset).await {
                error!(%asset_id, error = %e, "Failed to start pipeline");
            }
        }
        AssetEvent::Deleted(asset) => {
            let asset_id = asset.id;
            match trigger.on_deleted(asset).await {
                Ok(report) if !report.is_clean() => {
                    warn!(%asset_id, failed = report.failed.len(), "Cleanup incomplete")
                }
                Ok(_) => {}
                Err(e) => error!(%asset_id, error = %e, "Failed to clean up asset"),
            }
        }
    }
}
