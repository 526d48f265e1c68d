//! Request and response interceptor chains.
//!
//! Entries are kept in registration order and addressed by the index they
//! were registered at. Ejecting an entry marks it [`Interceptor::Ejected`];
//! nothing is ever re-indexed.
//!
//! A run works on a snapshot of the registry taken when it starts. Handlers
//! must not register or eject interceptors on the registry they run in; if
//! they do, the change only affects later runs.

use crate::base::neterror::NetError;
use crate::http::config::RequestConfig;
use crate::http::response::Response;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

/// Success handler: transforms the threaded value.
pub type OnFulfilled<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<T, NetError>> + Send + Sync>;

/// Rejection handler: recovers from the paired success handler's error, or
/// returns a new error.
pub type OnRejected<T> =
    Arc<dyn Fn(NetError) -> BoxFuture<'static, Result<T, NetError>> + Send + Sync>;

/// One registry slot.
pub enum Interceptor<T> {
    Active {
        on_fulfilled: Option<OnFulfilled<T>>,
        on_rejected: Option<OnRejected<T>>,
    },
    Ejected,
}

impl<T> Clone for Interceptor<T> {
    fn clone(&self) -> Self {
        match self {
            Interceptor::Active {
                on_fulfilled,
                on_rejected,
            } => Interceptor::Active {
                on_fulfilled: on_fulfilled.clone(),
                on_rejected: on_rejected.clone(),
            },
            Interceptor::Ejected => Interceptor::Ejected,
        }
    }
}

impl<T> fmt::Debug for Interceptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interceptor::Active {
                on_fulfilled,
                on_rejected,
            } => f
                .debug_struct("Active")
                .field("on_fulfilled", &on_fulfilled.is_some())
                .field("on_rejected", &on_rejected.is_some())
                .finish(),
            Interceptor::Ejected => f.write_str("Ejected"),
        }
    }
}

/// Index of a registered interceptor, used to eject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorHandle(usize);

impl InterceptorHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Ordered registry of interceptors for one phase.
pub struct InterceptorManager<T> {
    entries: RwLock<Vec<Interceptor<T>>>,
}

impl<T> Default for InterceptorManager<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Send + 'static> fmt::Debug for InterceptorManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorManager")
            .field("active", &self.len())
            .finish()
    }
}

impl<T: Send + 'static> InterceptorManager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler pair.
    pub fn register(
        &self,
        on_fulfilled: Option<OnFulfilled<T>>,
        on_rejected: Option<OnRejected<T>>,
    ) -> InterceptorHandle {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.push(Interceptor::Active {
            on_fulfilled,
            on_rejected,
        });
        InterceptorHandle(entries.len() - 1)
    }

    /// Register an async success handler.
    pub fn use_fn<F, Fut>(&self, on_fulfilled: F) -> InterceptorHandle
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, NetError>> + Send + 'static,
    {
        self.register(Some(fulfilled(on_fulfilled)), None)
    }

    /// Register an async success handler with its rejection handler.
    pub fn use_with_rejection<F, Fut, R, RFut>(
        &self,
        on_fulfilled: F,
        on_rejected: R,
    ) -> InterceptorHandle
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, NetError>> + Send + 'static,
        R: Fn(NetError) -> RFut + Send + Sync + 'static,
        RFut: Future<Output = Result<T, NetError>> + Send + 'static,
    {
        self.register(Some(fulfilled(on_fulfilled)), Some(rejected(on_rejected)))
    }

    /// Permanently disable an entry. Ejecting twice or an unknown handle is a no-op.
    pub fn eject(&self, handle: InterceptorHandle) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(handle.0) {
            *entry = Interceptor::Ejected;
        }
    }

    /// Eject every entry. Handles already issued stay unique.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for entry in entries.iter_mut() {
            *entry = Interceptor::Ejected;
        }
    }

    /// Number of entries that have not been ejected.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| matches!(e, Interceptor::Active { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<Interceptor<T>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run the chain on `value`.
    pub async fn run(&self, value: T) -> Result<T, NetError> {
        let chain = self.snapshot();
        run_chain(&chain, value).await
    }
}

/// Thread `value` through every active entry in order.
///
/// An entry without a success handler is skipped. When a success handler
/// fails, the same entry's rejection handler gets the error and its result
/// continues the chain; without one the error ends the run.
pub async fn run_chain<T>(chain: &[Interceptor<T>], mut value: T) -> Result<T, NetError> {
    for (index, entry) in chain.iter().enumerate() {
        let Interceptor::Active {
            on_fulfilled: Some(on_fulfilled),
            on_rejected,
        } = entry
        else {
            continue;
        };

        tracing::trace!(index, "running interceptor");
        value = match on_fulfilled(value).await {
            Ok(next) => next,
            Err(err) => match on_rejected {
                Some(on_rejected) => {
                    tracing::trace!(index, error = %err, "interceptor rejected, recovering");
                    on_rejected(err).await?
                }
                None => return Err(err),
            },
        };
    }
    Ok(value)
}

fn fulfilled<T, F, Fut>(f: F) -> OnFulfilled<T>
where
    T: 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, NetError>> + Send + 'static,
{
    Arc::new(move |value: T| -> BoxFuture<'static, Result<T, NetError>> {
        Box::pin(f(value))
    })
}

fn rejected<T, R, RFut>(f: R) -> OnRejected<T>
where
    T: 'static,
    R: Fn(NetError) -> RFut + Send + Sync + 'static,
    RFut: Future<Output = Result<T, NetError>> + Send + 'static,
{
    Arc::new(move |err: NetError| -> BoxFuture<'static, Result<T, NetError>> {
        Box::pin(f(err))
    })
}

/// The request-phase and response-phase registries of a client.
#[derive(Debug, Default)]
pub struct Interceptors {
    pub request: InterceptorManager<RequestConfig>,
    pub response: InterceptorManager<Response>,
}
