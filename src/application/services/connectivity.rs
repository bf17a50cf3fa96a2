use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

/// Reachability transitions published to background listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
    /// Emitted once per offline-to-online transition; this edge, not the
    /// steady online state, is what triggers automatic synchronization.
    Reconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Online,
    Offline,
}

#[derive(Debug)]
struct MonitorState {
    link: LinkState,
    reconnected: bool,
}

/// Two-state connectivity monitor fed by platform reachability events.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    state: Arc<RwLock<MonitorState>>,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Arc::new(RwLock::new(MonitorState {
                link: if initially_online {
                    LinkState::Online
                } else {
                    LinkState::Offline
                },
                reconnected: false,
            })),
            events,
        }
    }

    /// Feed a platform reachability reading. Repeats of the current state
    /// are no-ops and emit nothing.
    pub async fn set_online(&self, online: bool) {
        let mut state = self.state.write().await;
        match (state.link, online) {
            (LinkState::Offline, true) => {
                state.link = LinkState::Online;
                state.reconnected = true;
                drop(state);
                info!("Connectivity restored");
                let _ = self.events.send(ConnectivityEvent::Online);
                let _ = self.events.send(ConnectivityEvent::Reconnected);
            }
            (LinkState::Online, false) => {
                state.link = LinkState::Offline;
                state.reconnected = false;
                drop(state);
                warn!("Connectivity lost");
                let _ = self.events.send(ConnectivityEvent::Offline);
            }
            _ => {}
        }
    }

    pub async fn is_online(&self) -> bool {
        self.state.read().await.link == LinkState::Online
    }

    /// True only after an offline-to-online transition, until consumed by
    /// [`take_reconnected`](Self::take_reconnected).
    pub async fn was_offline(&self) -> bool {
        self.state.read().await.reconnected
    }

    /// One-shot consume of the reconnect edge.
    pub async fn take_reconnected(&self) -> bool {
        let mut state = self.state.write().await;
        std::mem::take(&mut state.reconnected)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}
