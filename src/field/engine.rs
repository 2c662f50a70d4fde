use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::field::service::{ServiceError, SurfacePayload, SurfaceQuery, SurfaceService};

enum FetchCommand {
    Generate { seq: u64, query: SurfaceQuery },
    Stop,
}

/// One finished request. The sequence number is echoed back so the
/// pipeline can discard completions that were superseded while in flight.
pub struct Completion {
    pub seq: u64,
    pub result: Result<SurfacePayload, ServiceError>,
}

/// Runs a `SurfaceService` on its own thread so a slow generation never
/// stalls the event loop. Requests are never cancelled; superseded ones
/// run to completion and are dropped by the caller via `seq`.
pub struct FetchEngine {
    tx_cmd: Sender<FetchCommand>,
    rx_result: Receiver<Completion>,
    last_error: Arc<Mutex<Option<String>>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl FetchEngine {
    pub fn new(service: impl SurfaceService) -> Self {
        let (tx_cmd, rx_cmd) = channel::unbounded::<FetchCommand>();
        let (tx_result, rx_result) = channel::unbounded::<Completion>();
        let last_error = Arc::new(Mutex::new(None));
        let last_error_clone = Arc::clone(&last_error);

        let thread_handle = thread::spawn(move || {
            fetch_thread(service, rx_cmd, tx_result, last_error_clone);
        });

        Self {
            tx_cmd,
            rx_result,
            last_error,
            thread_handle: Some(thread_handle),
        }
    }

    pub fn request(&self, seq: u64, query: SurfaceQuery) {
        let _ = self.tx_cmd.send(FetchCommand::Generate { seq, query });
    }

    pub fn try_recv_completion(&self) -> Option<Completion> {
        self.rx_result.try_recv().ok()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn stop(&self) {
        let _ = self.tx_cmd.send(FetchCommand::Stop);
    }
}

impl Drop for FetchEngine {
    fn drop(&mut self) {
        let _ = self.tx_cmd.send(FetchCommand::Stop);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

fn fetch_thread(
    service: impl SurfaceService,
    rx_cmd: Receiver<FetchCommand>,
    tx_result: Sender<Completion>,
    last_error: Arc<Mutex<Option<String>>>,
) {
    loop {
        let cmd = match rx_cmd.recv() {
            Ok(c) => c,
            Err(_) => return,
        };

        match cmd {
            FetchCommand::Generate { seq, query } => {
                // The service is an external collaborator; its payload is
                // not trusted until the index invariant has been checked.
                let result = service
                    .generate(&query)
                    .and_then(|payload| payload.check_indices().map(|_| payload));
                match &result {
                    Ok(_) => *last_error.lock() = None,
                    Err(e) => *last_error.lock() = Some(e.to_string()),
                }
                let _ = tx_result.send(Completion { seq, result });
            }
            FetchCommand::Stop => return,
        }
    }
}
