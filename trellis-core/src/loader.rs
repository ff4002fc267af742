//! Async Loaders
//!
//! A loader runs an async producer and exposes its progress as reactive
//! state: `Loading` while the producer runs, then `Loaded(value)` or
//! `Error(error)`. Reloading runs the producer again.
//!
//! Producers are spawned with [`tokio::task::spawn_local`], so the reactive
//! state never leaves the current thread. Loaders must therefore be created
//! (and reloaded) inside a [`tokio::task::LocalSet`].
//!
//! There is no cancellation. When reloads overlap, whichever producer
//! finishes last wins.

use std::fmt::Debug;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::conditional::{when, Case, Conditional};
use crate::reactive::{Effect, ReadSignal, Signal};

/// How long the loading state is shown at least, by default.
pub const DEFAULT_MIN_TIME: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Results arriving sooner are held back until this much time passed.
    pub min_time: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            min_time: DEFAULT_MIN_TIME,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T, E> {
    Loading,
    Loaded(T),
    Error(E),
}

/// Reactive state of an async producer.
pub struct Loader<T: 'static, E: 'static> {
    counter: Signal<u64>,
    status: Signal<LoadStatus>,
    value: Signal<Option<T>>,
    error: Signal<Option<E>>,
    effect: Effect,
}

impl<T: 'static, E: Debug + 'static> Loader<T, E> {
    /// Start loading with the default options.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a [`tokio::task::LocalSet`].
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        Self::with_options(fetch, LoadOptions::default())
    }

    pub fn with_options<F, Fut>(fetch: F, options: LoadOptions) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        let counter = Signal::new(0u64);
        let status = Signal::new(LoadStatus::Loading);
        let value: Signal<Option<T>> = Signal::new(None);
        let error: Signal<Option<E>> = Signal::new(None);

        let effect = {
            let (counter, status) = (counter.clone(), status.clone());
            let (value, error) = (value.clone(), error.clone());

            Effect::new(move || {
                let run = counter.get();
                status.set(LoadStatus::Loading);
                debug!(run, "loading");

                let future = fetch();
                let (status, value, error) = (status.clone(), value.clone(), error.clone());
                tokio::task::spawn_local(async move {
                    let (result, _) = tokio::join!(future, tokio::time::sleep(options.min_time));
                    match result {
                        Ok(loaded) => {
                            trace!(run, "loaded");
                            // value first so readers never see Loaded without one
                            value.update(|slot| *slot = Some(loaded));
                            status.set(LoadStatus::Loaded);
                        }
                        Err(failure) => {
                            debug!(run, error = ?failure, "load failed");
                            error.update(|slot| *slot = Some(failure));
                            status.set(LoadStatus::Error);
                        }
                    }
                });
            })
        };

        Self {
            counter,
            status,
            value,
            error,
            effect,
        }
    }
}

impl<T: 'static, E: 'static> Loader<T, E> {
    /// Current status, tracked.
    pub fn status(&self) -> ReadSignal<LoadStatus> {
        ReadSignal::from(&self.status)
    }

    /// Current state with its payload, tracked.
    pub fn state(&self) -> LoadState<T, E>
    where
        T: Clone,
        E: Clone,
    {
        match self.status.get() {
            LoadStatus::Loading => LoadState::Loading,
            LoadStatus::Loaded => self
                .value
                .with(|value| value.clone())
                .map_or(LoadState::Loading, LoadState::Loaded),
            LoadStatus::Error => self
                .error
                .with(|error| error.clone())
                .map_or(LoadState::Loading, LoadState::Error),
        }
    }

    /// Run the producer again.
    pub fn reload(&self) {
        self.counter.update(|counter| *counter += 1);
    }

    /// How many times the producer was started.
    pub fn load_count(&self) -> usize {
        self.effect.run_count()
    }

    /// Stop reacting to reloads. Producers already running still finish.
    pub fn dispose(&self) {
        self.effect.dispose();
    }

    /// Render the loader's state through `cases`.
    ///
    /// Cases are checked in the order error, loaded, loading. A state without
    /// a case renders `O::default()`.
    pub fn match_state<O: Default + 'static>(&self, cases: LoaderCases<T, E, O>) -> Conditional<LoadStatus, O> {
        let LoaderCases {
            loading,
            loaded,
            error,
        } = cases;
        let (value, failure) = (self.value.clone(), self.error.clone());

        when(
            self.status(),
            [
                Case::value(LoadStatus::Error, move || match &error {
                    Some(render) => failure.with(|e| e.as_ref().map(|e| render(e))).unwrap_or_default(),
                    None => O::default(),
                }),
                Case::value(LoadStatus::Loaded, move || match &loaded {
                    Some(render) => value.with(|v| v.as_ref().map(|v| render(v))).unwrap_or_default(),
                    None => O::default(),
                }),
                Case::value(LoadStatus::Loading, move || {
                    loading.as_ref().map(|render| render()).unwrap_or_default()
                }),
            ],
        )
    }
}

impl<T: 'static, E: 'static> Clone for Loader<T, E> {
    fn clone(&self) -> Self {
        Self {
            counter: self.counter.clone(),
            status: self.status.clone(),
            value: self.value.clone(),
            error: self.error.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T: 'static, E: 'static> Debug for Loader<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("status", &self.status.get_untracked())
            .field("loads", &self.load_count())
            .finish()
    }
}

/// What to render for each loader state.
pub struct LoaderCases<T, E, O> {
    loading: Option<Rc<dyn Fn() -> O>>,
    loaded: Option<Rc<dyn Fn(&T) -> O>>,
    error: Option<Rc<dyn Fn(&E) -> O>>,
}

impl<T, E, O> LoaderCases<T, E, O> {
    pub fn new() -> Self {
        Self {
            loading: None,
            loaded: None,
            error: None,
        }
    }

    pub fn loading(mut self, render: impl Fn() -> O + 'static) -> Self {
        self.loading = Some(Rc::new(render));
        self
    }

    pub fn loaded(mut self, render: impl Fn(&T) -> O + 'static) -> Self {
        self.loaded = Some(Rc::new(render));
        self
    }

    pub fn error(mut self, render: impl Fn(&E) -> O + 'static) -> Self {
        self.error = Some(Rc::new(render));
        self
    }
}

impl<T, E, O> Default for LoaderCases<T, E, O> {
    fn default() -> Self {
        Self::new()
    }
}
