//! Sync Session Controller: owns the single live run stream and feeds its
//! events through [`SessionMachine`].

use std::sync::Arc;

use futures::StreamExt;
use shared::{
    domain::{ActionControl, SessionId, SessionStatus},
    protocol::RUN_CLOSE_SENTINEL,
};
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    log::SessionLog,
    session::{SessionMachine, SessionUpdate, StreamCommand, Transition},
    SyncApi,
};

const MESSAGE_EVENT: &str = "message";

#[derive(Debug)]
enum StreamSignal {
    Message { session: SessionId, data: String },
    Failed { session: SessionId, reason: String },
}

struct ActiveStream {
    session: SessionId,
    reader: JoinHandle<()>,
}

pub struct SessionController<A: SyncApi> {
    api: Arc<A>,
    machine: SessionMachine,
    stream: Option<ActiveStream>,
    signals_tx: UnboundedSender<StreamSignal>,
    signals_rx: UnboundedReceiver<StreamSignal>,
}

impl<A: SyncApi> SessionController<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (signals_tx, signals_rx) = unbounded_channel();
        Self {
            api,
            machine: SessionMachine::new(),
            stream: None,
            signals_tx,
            signals_rx,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.machine.status()
    }

    pub fn control(&self) -> ActionControl {
        self.machine.control()
    }

    pub fn log(&self) -> &SessionLog {
        self.machine.log()
    }

    pub fn has_open_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Starts a new run, closing any stream that is still open. Must be
    /// called from inside a tokio runtime.
    pub fn start(&mut self) -> Vec<SessionUpdate> {
        let transition = self.machine.start();
        self.apply(transition)
    }

    /// Asks the service to stop the job. The session ends client-side whether
    /// or not the request succeeds.
    pub async fn stop(&mut self) -> Vec<SessionUpdate> {
        let transition = match self.api.stop().await {
            Ok(response) => self.machine.on_stop_response(&response.message),
            Err(err) => {
                error!(error = %err, "sync: stop request failed");
                self.machine.on_stop_failed()
            }
        };
        self.apply(transition)
    }

    /// Waits for the next signal of the open stream and applies it. Returns
    /// `None` once no session is running. Cancel safe.
    pub async fn next_updates(&mut self) -> Option<Vec<SessionUpdate>> {
        self.machine.active_session()?;
        let signal = self.signals_rx.recv().await?;
        let transition = match signal {
            StreamSignal::Message { session, data } => self.machine.on_message(session, &data),
            StreamSignal::Failed { session, reason } => {
                if self.machine.active_session() == Some(session) {
                    warn!(session = session.0, %reason, "sync: run stream lost");
                }
                self.machine.on_transport_error(session)
            }
        };
        Some(self.apply(transition))
    }

    fn apply(&mut self, transition: Transition) -> Vec<SessionUpdate> {
        for command in transition.commands {
            match command {
                StreamCommand::Close(session) => self.close_stream(session),
                StreamCommand::Open(session) => self.open_stream(session),
            }
        }
        transition.updates
    }

    fn open_stream(&mut self, session: SessionId) {
        let reader = tokio::spawn(read_run_stream(
            Arc::clone(&self.api),
            session,
            self.signals_tx.clone(),
        ));
        info!(session = session.0, "sync: session started");
        self.stream = Some(ActiveStream { session, reader });
    }

    fn close_stream(&mut self, session: SessionId) {
        match self.stream.take() {
            Some(active) if active.session == session => {
                active.reader.abort();
                debug!(session = session.0, "sync: run stream closed");
            }
            other => self.stream = other,
        }
    }
}

impl<A: SyncApi> Drop for SessionController<A> {
    fn drop(&mut self) {
        if let Some(active) = self.stream.take() {
            active.reader.abort();
        }
    }
}

async fn read_run_stream<A: SyncApi>(
    api: Arc<A>,
    session: SessionId,
    signals: UnboundedSender<StreamSignal>,
) {
    let mut events = match api.open_run_stream().await {
        Ok(events) => events,
        Err(err) => {
            let _ = signals.send(StreamSignal::Failed {
                session,
                reason: err.to_string(),
            });
            return;
        }
    };

    while let Some(item) = events.next().await {
        match item {
            Ok(event) if event.event == MESSAGE_EVENT || event.event == RUN_CLOSE_SENTINEL => {
                let message = StreamSignal::Message {
                    session,
                    data: event.data,
                };
                if signals.send(message).is_err() {
                    return;
                }
            }
            Ok(event) => {
                debug!(session = session.0, event = %event.event, "sync: ignoring event type");
            }
            Err(err) => {
                let _ = signals.send(StreamSignal::Failed {
                    session,
                    reason: err.to_string(),
                });
                return;
            }
        }
    }

    let _ = signals.send(StreamSignal::Failed {
        session,
        reason: "event stream ended".to_string(),
    });
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
