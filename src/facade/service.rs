//! A configuration session running as a tokio task.
//!
//! The facade is owned by a single task and driven by [`ServiceMessage`]s.
//! Messages are handled strictly one at a time, so an operation never
//! observes a cascade with a resolution still in flight. Callers hold a
//! cloneable [`ConfigurationHandle`] and await a `oneshot` reply.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{ConfigurationFacade, FacadeError};
use crate::cascade::CascadeSnapshot;
use crate::effects::{DialogCloser, OptionSource, SettingsStore};
use crate::types::{DisplayOptionChange, Step};

/// Capacity of the request channel.
const SERVICE_CHANNEL_BUFFER: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, FacadeError>>;

/// Requests accepted by the session task.
#[derive(Debug)]
pub enum ServiceMessage {
    Initialize {
        reply: Reply<CascadeSnapshot>,
    },
    Snapshot {
        reply: oneshot::Sender<CascadeSnapshot>,
    },
    Select {
        step: Step,
        value: String,
        reply: Reply<CascadeSnapshot>,
    },
    Lock {
        step: Step,
        reply: Reply<CascadeSnapshot>,
    },
    Unlock {
        step: Step,
        reply: Reply<CascadeSnapshot>,
    },
    Reset {
        reply: Reply<CascadeSnapshot>,
    },
    SetOption {
        change: DisplayOptionChange,
        reply: Reply<CascadeSnapshot>,
    },
    Finalize {
        reply: Reply<String>,
    },

    /// Stop the session. Requests already queued behind this are dropped.
    Shutdown,
}

/// Errors returned through a [`ConfigurationHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The session task has stopped.
    #[error("configuration session has stopped")]
    Stopped,

    #[error(transparent)]
    Facade(#[from] FacadeError),
}

/// Cloneable sender side of a running session.
#[derive(Debug, Clone)]
pub struct ConfigurationHandle {
    tx: mpsc::Sender<ServiceMessage>,
}

impl ConfigurationHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ServiceMessage,
    ) -> Result<T, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ServiceError::Stopped)?;
        rx.await.map_err(|_| ServiceError::Stopped)
    }

    pub async fn initialize(&self) -> Result<CascadeSnapshot, ServiceError> {
        Ok(self
            .request(|reply| ServiceMessage::Initialize { reply })
            .await??)
    }

    pub async fn snapshot(&self) -> Result<CascadeSnapshot, ServiceError> {
        self.request(|reply| ServiceMessage::Snapshot { reply })
            .await
    }

    pub async fn select(
        &self,
        step: Step,
        value: impl Into<String>,
    ) -> Result<CascadeSnapshot, ServiceError> {
        let value = value.into();
        Ok(self
            .request(|reply| ServiceMessage::Select { step, value, reply })
            .await??)
    }

    pub async fn lock(&self, step: Step) -> Result<CascadeSnapshot, ServiceError> {
        Ok(self
            .request(|reply| ServiceMessage::Lock { step, reply })
            .await??)
    }

    pub async fn unlock(&self, step: Step) -> Result<CascadeSnapshot, ServiceError> {
        Ok(self
            .request(|reply| ServiceMessage::Unlock { step, reply })
            .await??)
    }

    pub async fn reset(&self) -> Result<CascadeSnapshot, ServiceError> {
        Ok(self.request(|reply| ServiceMessage::Reset { reply }).await??)
    }

    pub async fn set_option(
        &self,
        change: DisplayOptionChange,
    ) -> Result<CascadeSnapshot, ServiceError> {
        Ok(self
            .request(|reply| ServiceMessage::SetOption { change, reply })
            .await??)
    }

    /// Persists and closes; returns the closing worksheet name.
    pub async fn finalize(&self) -> Result<String, ServiceError> {
        Ok(self
            .request(|reply| ServiceMessage::Finalize { reply })
            .await??)
    }

    /// Asks the session to stop. Succeeds even if it already has.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(ServiceMessage::Shutdown).await;
    }
}

/// Spawns a session task that owns `facade`.
///
/// The task exits on [`ServiceMessage::Shutdown`] or once every handle has
/// been dropped.
pub fn spawn<S, P, D>(facade: ConfigurationFacade<S, P, D>) -> (ConfigurationHandle, JoinHandle<()>)
where
    S: OptionSource + Send + Sync + 'static,
    P: SettingsStore + Send + 'static,
    D: DialogCloser + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel(SERVICE_CHANNEL_BUFFER);
    let task = tokio::spawn(run(facade, rx));
    (ConfigurationHandle { tx }, task)
}

async fn run<S, P, D>(
    mut facade: ConfigurationFacade<S, P, D>,
    mut rx: mpsc::Receiver<ServiceMessage>,
) where
    S: OptionSource + Send + Sync,
    P: SettingsStore + Send,
    D: DialogCloser + Send + Sync,
{
    info!("configuration session started");

    while let Some(msg) = rx.recv().await {
        // A dropped reply receiver only means the caller stopped waiting.
        match msg {
            ServiceMessage::Initialize { reply } => {
                let _ = reply.send(facade.initialize().await);
            }
            ServiceMessage::Snapshot { reply } => {
                let _ = reply.send(facade.snapshot());
            }
            ServiceMessage::Select { step, value, reply } => {
                let _ = reply.send(facade.select(step, &value).await);
            }
            ServiceMessage::Lock { step, reply } => {
                let _ = reply.send(facade.lock(step).await);
            }
            ServiceMessage::Unlock { step, reply } => {
                let _ = reply.send(facade.unlock(step).await);
            }
            ServiceMessage::Reset { reply } => {
                let _ = reply.send(facade.reset().await);
            }
            ServiceMessage::SetOption { change, reply } => {
                let _ = reply.send(facade.set_option(change));
            }
            ServiceMessage::Finalize { reply } => {
                let _ = reply.send(facade.finalize().await);
            }
            ServiceMessage::Shutdown => {
                debug!("shutdown requested");
                break;
            }
        }
    }

    info!("configuration session stopped");
}
