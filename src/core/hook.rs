//! Cancelable lifecycle hooks and the transport bag they share.
//!
//! Hooks are async callbacks invoked during the transition pipeline. A hook
//! resolving to `false` vetoes the in-progress transition; any other outcome
//! lets the pipeline continue. Hooks in one phase run serially, in
//! registration order, and all of them see the same [`Transport`].

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A cancelable lifecycle hook.
///
/// Stored as a factory-style `Arc` so state, transition, and machine-wide
/// hook lists can share the same callback.
pub type Hook = Arc<dyn Fn(HookContext) -> BoxFuture<'static, bool> + Send + Sync>;

/// What a hook sees: the transition being attempted, the pre- and
/// post-transition state names, the shared transport bag, and any extra
/// arguments the caller passed to the mutator.
#[derive(Clone)]
pub struct HookContext {
    pub transition: String,
    pub from: String,
    pub to: String,
    pub transport: Transport,
    pub args: Arc<[Value]>,
}

impl fmt::Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("transition", &self.transition)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("args", &self.args)
            .finish()
    }
}

/// Adapt an async closure into a [`Hook`].
///
/// The closure's resolved `bool` is the veto signal: `false` aborts the
/// pipeline, `true` continues it.
///
/// # Example
///
/// ```
/// use phasic::hook;
///
/// let gate = hook(|ctx| async move { ctx.to != "GAS" });
/// # let _ = gate;
/// ```
pub fn hook<F, Fut>(f: F) -> Hook
where
    F: Fn(HookContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Arc::new(move |ctx: HookContext| -> BoxFuture<'static, bool> { Box::pin(f(ctx)) })
}

/// Adapt a notification-only async closure into a [`Hook`] that never
/// vetoes.
pub fn observer<F, Fut>(f: F) -> Hook
where
    F: Fn(HookContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ctx: HookContext| -> BoxFuture<'static, bool> {
        let fut = f(ctx);
        Box::pin(async move {
            fut.await;
            true
        })
    })
}

/// One hook or an ordered list of hooks, for registration calls and spec
/// fields that accept either.
#[derive(Clone, Default)]
pub struct HookList(pub(crate) Vec<Hook>);

impl HookList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Hook> for HookList {
    fn from(hook: Hook) -> Self {
        Self(vec![hook])
    }
}

impl From<Vec<Hook>> for HookList {
    fn from(hooks: Vec<Hook>) -> Self {
        Self(hooks)
    }
}

impl<const N: usize> From<[Hook; N]> for HookList {
    fn from(hooks: [Hook; N]) -> Self {
        Self(hooks.into())
    }
}

impl FromIterator<Hook> for HookList {
    fn from_iter<I: IntoIterator<Item = Hook>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The free-form mutable bag shared by every hook in a pipeline run and
/// persisted through snapshots.
///
/// Cloning produces another handle to the same bag. Hooks must not assume
/// isolation from one another's writes.
#[derive(Clone, Default)]
pub struct Transport {
    inner: Arc<Mutex<Map<String, Value>>>,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.lock().insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Deep value copy of the bag's current contents.
    pub fn to_map(&self) -> Map<String, Value> {
        self.inner.lock().clone()
    }

    /// Replace the bag wholesale. Used by hydration.
    pub(crate) fn replace(&self, map: Map<String, Value>) {
        *self.inner.lock() = map;
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transport").field(&*self.inner.lock()).finish()
    }
}
