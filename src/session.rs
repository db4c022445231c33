use tracing::{debug, info};

use crate::filter::ViewFilter;
use crate::gateway::TodoGateway;
use crate::manager::TaskManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Authenticated,
    Unauthenticated,
}

/// Asks the gateway who we are. Any failure, network included, counts as
/// unauthenticated.
pub async fn probe<G: TodoGateway + ?Sized>(gateway: &G) -> SessionStatus {
    let envelope = gateway.probe_session().await;
    if envelope.success {
        SessionStatus::Authenticated
    } else {
        debug!(status = ?envelope.status, error = ?envelope.error_message(), "session probe rejected");
        SessionStatus::Unauthenticated
    }
}

/// Guard for the protected task views: probe, then load the `all` view.
pub async fn enter<G: TodoGateway>(manager: &TaskManager<G>) -> SessionStatus {
    let status = probe(manager.gateway()).await;
    match status {
        SessionStatus::Authenticated => {
            info!("session authenticated");
            manager.load(ViewFilter::All).await;
        }
        SessionStatus::Unauthenticated => info!("no session; redirecting to login"),
    }
    status
}
