use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn spawn_async<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(fut);
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Owns the single pending run of a debounced action. Every restart cancels
/// whatever was scheduled or running before; dropping the debouncer cancels too.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    current: Option<CancellationToken>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, current: None }
    }

    /// Supersede the pending run. With `wait` the new run sits out the quiet
    /// window first, otherwise it may start right away.
    pub fn restart(&mut self, wait: bool) -> Ticket {
        self.cancel();
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        Ticket { token, delay: if wait { self.window } else { Duration::ZERO } }
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// One scheduled run handed out by [`Debouncer::restart`].
#[derive(Debug, Clone)]
pub struct Ticket {
    token: CancellationToken,
    delay: Duration,
}

impl Ticket {
    /// Wait out the delay. Returns `false` if the run was superseded first.
    pub async fn ready(&self) -> bool {
        if !self.delay.is_zero() {
            tokio::select! {
                biased;
                () = self.token.cancelled() => return false,
                () = tokio::time::sleep(self.delay) => {}
            }
        }
        !self.token.is_cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token to pass into the request this run issues.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
