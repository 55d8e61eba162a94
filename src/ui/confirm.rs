use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether the view behind a modal accepts input. Clones share state.
#[derive(Debug, Clone)]
pub struct Surface {
    interactive: Arc<AtomicBool>,
}

impl Default for Surface {
    fn default() -> Self {
        Self { interactive: Arc::new(AtomicBool::new(true)) }
    }
}

impl Surface {
    pub fn is_interactive(&self) -> bool {
        self.interactive.load(Ordering::SeqCst)
    }

    /// Block background input until the guard is dropped, which puts back
    /// whatever state was there before.
    pub fn lock(&self) -> ModalGuard {
        let previous = self.interactive.swap(false, Ordering::SeqCst);
        ModalGuard { surface: self.clone(), previous }
    }
}

#[derive(Debug)]
pub struct ModalGuard {
    surface: Surface,
    previous: bool,
}

impl Drop for ModalGuard {
    fn drop(&mut self) {
        self.surface.interactive.store(self.previous, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Confirm,
    Cancel,
}

/// Modal yes/no question. Either answer closes it and releases the surface.
#[derive(Debug, Default)]
pub struct ConfirmDialog {
    prompt: Option<Prompt>,
    guard: Option<ModalGuard>,
}

impl ConfirmDialog {
    pub fn is_open(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    /// Opening an already open dialog replaces the question and keeps the lock.
    pub fn open(&mut self, surface: &Surface, prompt: Prompt) {
        if self.guard.is_none() {
            self.guard = Some(surface.lock());
        }
        self.prompt = Some(prompt);
    }

    /// Close with `choice` and run the matching callback. `None` if the
    /// dialog was not open; neither callback runs then.
    pub fn respond<R>(
        &mut self,
        choice: Choice,
        on_confirm: impl FnOnce() -> R,
        on_cancel: impl FnOnce() -> R,
    ) -> Option<R> {
        if !self.is_open() {
            return None;
        }
        self.close();
        Some(match choice {
            Choice::Confirm => on_confirm(),
            Choice::Cancel => on_cancel(),
        })
    }

    fn close(&mut self) {
        self.prompt = None;
        self.guard = None;
    }
}
