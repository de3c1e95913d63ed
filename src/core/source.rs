//! Transition-target sources.
//!
//! Every public operation that names a state or transition accepts the name
//! as a literal, a zero-argument producer, or a deferred value. [`Source`]
//! is the tagged variant for those three shapes; [`Source::resolve`] reduces
//! all of them to one awaited value so callers never branch on the shape.

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;

/// A literal value, a producer of one, or a deferred one.
pub enum Source<T> {
    Literal(T),
    Producer(Box<dyn FnOnce() -> T + Send>),
    Deferred(BoxFuture<'static, T>),
}

impl<T> Source<T> {
    /// Wrap a zero-argument producer.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::Producer(Box::new(f))
    }

    /// Wrap a deferred value.
    pub fn from_future<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = T> + Send + 'static,
    {
        Self::Deferred(Box::pin(fut))
    }

    /// Reduce any of the three shapes to a concrete value.
    pub async fn resolve(self) -> T {
        match self {
            Self::Literal(value) => value,
            Self::Producer(f) => f(),
            Self::Deferred(fut) => fut.await,
        }
    }
}

impl From<&str> for Source<String> {
    fn from(name: &str) -> Self {
        Self::Literal(name.to_string())
    }
}

impl From<String> for Source<String> {
    fn from(name: String) -> Self {
        Self::Literal(name)
    }
}

impl From<&String> for Source<String> {
    fn from(name: &String) -> Self {
        Self::Literal(name.clone())
    }
}

impl<T> fmt::Debug for Source<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}
