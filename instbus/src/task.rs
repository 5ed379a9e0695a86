//! Long-running task objects and the bridge for waiting on them.
//!
//! A started unit of work is reachable through an object-path handle.
//! The handle has exactly one terminal event: the payload-free
//! `Finished` signal. `Finish` then reports the outcome, raising the
//! task's typed failure if it failed. The work itself runs on a
//! background tokio task; abandoning a completion wait never stops it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use log::{debug, warn};
use thiserror::Error;
use tokio::sync::Mutex;
use zbus::object_server::SignalEmitter;
use zbus::{Connection, ObjectServer, fdo, interface};
use zvariant::OwnedObjectPath;

use crate::constants::installer;
use crate::proxies::TaskProxy;

/// Domain failure raised by a task's work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskFailure {
    /// Configuration discovery failed; the message is meant for the end
    /// user.
    #[error("{0}")]
    Discovery(String),
}

/// Wire form of a task outcome, raised by `Finish`.
#[derive(Debug, zbus::DBusError)]
#[zbus(prefix = "org.instbus.Installer.Error")]
pub enum TaskError {
    /// Transport-level failure while talking to the task object.
    #[zbus(error)]
    ZBus(zbus::Error),
    /// The task's configuration discovery failed.
    DiscoveryFailed(String),
    /// `Finish` was called before the task completed.
    NotFinished,
}

impl From<TaskFailure> for TaskError {
    fn from(failure: TaskFailure) -> Self {
        match failure {
            TaskFailure::Discovery(message) => Self::DiscoveryFailed(message),
        }
    }
}

/// The work a task executes once started.
pub type TaskWork = Pin<Box<dyn Future<Output = Result<(), TaskFailure>> + Send>>;

static TASK_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A registered, remotely watchable task.
///
/// Holds its not-yet-started work until `Start` moves it onto a
/// background task; the outcome stays available for `Finish` afterwards.
pub struct TaskInterface {
    path: OwnedObjectPath,
    work: Mutex<Option<TaskWork>>,
    outcome: Arc<Mutex<Option<Result<(), TaskFailure>>>>,
}

#[interface(name = "org.instbus.Installer.Task")]
impl TaskInterface {
    /// Begins executing the task's work in the background and returns
    /// immediately. A second call is an error.
    async fn start(&self, #[zbus(connection)] conn: &Connection) -> fdo::Result<()> {
        let work = self
            .work
            .lock()
            .await
            .take()
            .ok_or_else(|| fdo::Error::Failed("task was already started".into()))?;

        let emitter = SignalEmitter::new(conn, self.path.clone().into_inner())
            .map_err(|e| fdo::Error::Failed(e.to_string()))?;
        let outcome = self.outcome.clone();
        let path = self.path.clone();

        tokio::spawn(async move {
            let result = work.await;
            debug!("task {path} finished: {result:?}");
            *outcome.lock().await = Some(result);

            if let Err(e) = TaskInterface::finished(&emitter).await {
                warn!("task {path} could not signal completion: {e}");
            }
        });

        Ok(())
    }

    /// Reports the task's outcome.
    async fn finish(&self) -> Result<(), TaskError> {
        match self.outcome.lock().await.as_ref() {
            Some(Ok(())) => Ok(()),
            Some(Err(failure)) => Err(failure.clone().into()),
            None => Err(TaskError::NotFinished),
        }
    }

    /// The single terminal event of the task; no payload.
    #[zbus(signal)]
    async fn finished(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;
}

/// Registers a new task object holding `work` and returns its handle
/// path. The work does not run until a caller starts the task.
pub async fn register_task(server: &ObjectServer, work: TaskWork) -> zbus::Result<OwnedObjectPath> {
    let id = TASK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = OwnedObjectPath::try_from(format!("{}/{id}", installer::TASKS_PATH_PREFIX))?;

    let task = TaskInterface {
        path: path.clone(),
        work: Mutex::new(Some(work)),
        outcome: Arc::new(Mutex::new(None)),
    };
    server.at(path.as_str(), task).await?;
    debug!("registered task {path}");

    Ok(path)
}

/// Starts a task and invokes `on_done` exactly once with its `Finish`
/// outcome after the completion event fires.
///
/// The returned handle only abandons the wait when dropped or aborted;
/// the task keeps running on the service side.
pub fn async_run_task<F>(proxy: TaskProxy<'static>, on_done: F) -> tokio::task::JoinHandle<()>
where
    F: FnOnce(Result<(), TaskError>) + Send + 'static,
{
    tokio::spawn(async move {
        // Subscribe before starting so the single completion event
        // cannot be missed.
        let mut finished = match proxy.receive_finished().await {
            Ok(stream) => stream,
            Err(e) => return on_done(Err(TaskError::from(e))),
        };

        if let Err(e) = proxy.start().await {
            return on_done(Err(TaskError::from(e)));
        }

        finished.next().await;
        on_done(proxy.finish().await.map_err(TaskError::from));
    })
}
