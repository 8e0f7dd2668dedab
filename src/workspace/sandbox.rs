use tracing::debug;

/// The code-execution sandbox mirroring the workspace buffer.
///
/// Calls are fire-and-forget: the sandbox rebuilds on its own schedule and
/// the dispatcher only waits a short settle delay afterwards.
pub trait Sandbox: Send + Sync {
    fn add_file(&self, path: &str, content: &str);
    fn update_file(&self, path: &str, content: &str);
    fn delete_file(&self, path: &str);
    fn rebuild(&self);
}

/// Sandbox used when no execution environment is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSandbox;

impl Sandbox for NullSandbox {
    fn add_file(&self, path: &str, content: &str) {
        debug!(path, bytes = content.len(), "sandbox add");
    }

    fn update_file(&self, path: &str, content: &str) {
        debug!(path, bytes = content.len(), "sandbox update");
    }

    fn delete_file(&self, path: &str) {
        debug!(path, "sandbox delete");
    }

    fn rebuild(&self) {
        debug!("sandbox rebuild");
    }
}
