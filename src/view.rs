//! Per-command view lifecycle.
//!
//! Commands follow the same shape a page does: idle → loading → ready on
//! first fetch, ready → mutating → ready around every write. Whatever
//! the call answers, the view always lands back in `Ready`, so a failure
//! can never leave a command wedged mid-mutation.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Ready,
    Mutating,
}

#[derive(Debug, Default)]
pub struct View {
    state: ViewState,
}

impl View {
    pub fn new() -> View {
        View::default()
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Runs the initial fetch for a view.
    pub fn load<T, E>(&mut self, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        self.state = ViewState::Loading;
        let result = f();
        self.state = ViewState::Ready;
        result
    }

    /// Runs a create/update/delete against an already loaded view.
    pub fn mutate<T, E>(&mut self, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        self.state = ViewState::Mutating;
        let result = f();
        self.state = ViewState::Ready;
        result
    }
}
