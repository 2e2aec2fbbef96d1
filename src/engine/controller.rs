use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{polling_loop, CameraContext};

/// Owns one camera's polling task and the token that cancels it.
pub struct PollingController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl PollingController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start_polling(&mut self, ctx: CameraContext) -> Result<()> {
        if self.handle.is_some() {
            bail!("polling already active");
        }

        info!("Starting polling loop for camera {}", ctx.camera.camera_key);

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(polling_loop(ctx, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop_polling(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("polling loop task failed to join")
        } else {
            Ok(())
        }
    }
}

impl Default for PollingController {
    fn default() -> Self {
        Self::new()
    }
}

/// Run every camera context to completion concurrently.
///
/// Cameras share no mutable state, so each gets its own spawned loop and a
/// child of the invocation-wide cancellation token.
pub async fn run_cameras(contexts: Vec<CameraContext>, cancel_token: CancellationToken) -> Result<()> {
    let mut handles = Vec::with_capacity(contexts.len());
    for ctx in contexts {
        let camera_key = ctx.camera.camera_key.clone();
        info!("Processing camera: {camera_key}");
        handles.push((
            camera_key,
            tokio::spawn(polling_loop(ctx, cancel_token.child_token())),
        ));
    }

    for (camera_key, handle) in handles {
        handle
            .await
            .with_context(|| format!("polling loop for camera {camera_key} failed"))?;
    }
    Ok(())
}
