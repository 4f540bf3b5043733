use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use tracing::{info, warn};

use super::{load_game_content, ContentError, GameContent};

const LOADER_THREAD_NAME: &str = "content-loader";

/// Loads game content off the main thread. Completion is reported exactly
/// once through [`ContentLoader::poll`]; nothing is waited on by timers.
#[derive(Debug)]
pub struct ContentLoader {
    receiver: Receiver<Result<GameContent, ContentError>>,
}

impl ContentLoader {
    pub fn spawn(assets_dir: PathBuf) -> Self {
        let (sender, receiver) = bounded(1);
        let worker_sender = sender.clone();
        let worker_dir = assets_dir.clone();
        let spawned = thread::Builder::new()
            .name(LOADER_THREAD_NAME.to_string())
            .spawn(move || {
                let result = load_with_timing(worker_dir);
                // The receiver may be gone if the app quit mid-load.
                let _ = worker_sender.send(result);
            });

        if let Err(error) = spawned {
            warn!(error = %error, "content_loader_thread_spawn_failed_loading_inline");
            let _ = sender.send(load_with_timing(assets_dir));
        }
        Self { receiver }
    }

    /// Non-blocking. `None` while the load is still running.
    pub fn poll(&self) -> Option<Result<GameContent, ContentError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ContentError::LoaderDisconnected)),
        }
    }

    /// Blocks until the load finishes.
    pub fn wait(self) -> Result<GameContent, ContentError> {
        self.receiver
            .recv()
            .unwrap_or(Err(ContentError::LoaderDisconnected))
    }
}

fn load_with_timing(assets_dir: PathBuf) -> Result<GameContent, ContentError> {
    let started = Instant::now();
    let result = load_game_content(&assets_dir);
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    match &result {
        Ok(content) => info!(
            levels = content.levels.len(),
            elapsed_ms,
            "content_load_finished"
        ),
        Err(error) => warn!(error = %error, elapsed_ms, "content_load_failed"),
    }
    result
}
