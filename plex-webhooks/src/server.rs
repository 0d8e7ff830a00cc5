use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::router;
use crate::sinks::hass::HassSink;
use crate::sinks::print::PrintSink;
use crate::sinks::Event;

fn create_sink(config: &Config) -> anyhow::Result<Arc<dyn Event + Send + Sync>> {
    if config.print_sink {
        tracing::warn!("print sink enabled, events will only be logged");
        Ok(Arc::new(PrintSink {}))
    } else {
        Ok(Arc::new(HassSink::new(&config.hass)?))
    }
}

pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let webhook_ids = config.webhook_ids();
    if webhook_ids.is_empty() {
        tracing::warn!("no webhook ids configured, every webhook call will be rejected");
    }

    let sink = create_sink(&config).expect("failed to create sink");

    let app = router::router(
        sink,
        webhook_ids,
        config.event_type.clone(),
        config.max_body_size,
        config.export_prometheus,
    );

    tracing::info!("listening on {:?}", listener.local_addr().unwrap());

    match axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        Ok(_) => tracing::info!("HTTP server graceful shutdown completed"),
        Err(e) => tracing::error!("failed to run plex-webhooks http server, {}", e),
    }
}
