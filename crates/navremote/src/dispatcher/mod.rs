//! Dispatcher for NavRemote.
//!
//! The dispatcher owns one standing task per action kind. Each task takes
//! requests from its bus subscription one at a time, runs the matching
//! handler and sends the result to the requesting peer only. Failures go to
//! the configured [`ErrorReporter`].

pub mod config;
pub mod reporter;

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::bus::{Action, ActionBus, ActionRequest, Subscription};
use crate::error::DispatchError;
use crate::handlers::{handle_download_file, handle_download_gpx, handle_list_files};
use crate::history::HistoryStore;
use crate::protocol::{DownloadFileRequest, DownloadGpxRequest, ListFilesRequest, Response};
use crate::transport::Transport;
use crate::trip::TripDecoder;

pub use config::{DispatcherConfig, DispatcherConfigBuilder};
pub use reporter::{ErrorReporter, LogReporter, NackReporter};

/// Everything the handlers need, passed in explicitly
#[derive(Clone)]
pub struct DispatcherDeps {
    pub history: HistoryStore,
    pub transport: Arc<dyn Transport>,
    pub decoder: Arc<dyn TripDecoder>,
}

pub struct Dispatcher {
    deps: Arc<DispatcherDeps>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Dispatcher {
    pub fn new(deps: DispatcherDeps, config: DispatcherConfig) -> Self {
        let reporter: Arc<dyn ErrorReporter> = if config.error_responses {
            Arc::new(NackReporter::new(deps.transport.clone()))
        } else {
            Arc::new(LogReporter)
        };

        Self { deps: Arc::new(deps), reporter }
    }

    /// Replace the failure reporter
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Subscribe to every action kind on `bus` and start the handler tasks.
    pub fn start(self, bus: &ActionBus) -> DispatcherHandle {
        info!("Serving history directory {}", self.deps.history.root().display());

        let tasks = vec![
            self.spawn_handler(bus.subscribe::<ListFilesRequest>(), |deps, request| async move {
                handle_list_files(&deps.history, &request).await
            }),
            self.spawn_handler(bus.subscribe::<DownloadFileRequest>(), |deps, request| async move {
                handle_download_file(&deps.history, &request).await
            }),
            self.spawn_handler(bus.subscribe::<DownloadGpxRequest>(), |deps, request| async move {
                handle_download_gpx(&deps.history, deps.decoder.clone(), &request).await
            }),
        ];

        DispatcherHandle { tasks }
    }

    fn spawn_handler<T, F, Fut>(&self, mut subscription: Subscription<T>, handler: F) -> JoinHandle<()>
    where
        T: Action,
        F: Fn(Arc<DispatcherDeps>, T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Response, DispatchError>> + Send + 'static,
    {
        let deps = self.deps.clone();
        let reporter = self.reporter.clone();

        tokio::spawn(async move {
            debug!("Handler for {} started", T::KIND);

            while let Some(ActionRequest { sender, payload }) = subscription.recv().await {
                let outcome = match handler(deps.clone(), payload).await {
                    Ok(response) => {
                        debug!("Sending {} to {}", response.type_name(), sender);
                        deps.transport
                            .send(response, std::slice::from_ref(&sender))
                            .await
                            .map_err(DispatchError::from)
                    },
                    Err(e) => Err(e),
                };

                if let Err(error) = outcome {
                    reporter.report(&sender, T::KIND, &error).await;
                }
            }

            debug!("Handler for {} stopped", T::KIND);
        })
    }
}

/// Running handler tasks; dropping it leaves them running
pub struct DispatcherHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl DispatcherHandle {
    /// Whether every handler task is still alive
    pub fn is_running(&self) -> bool {
        self.tasks.iter().all(|task| !task.is_finished())
    }

    /// Stop all handlers. In-flight requests are abandoned without a response.
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks {
            let _ = task.await;
        }
        info!("Dispatcher stopped");
    }
}
