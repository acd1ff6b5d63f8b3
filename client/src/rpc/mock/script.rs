use crate::{Error, Result};
use std::{
    collections::VecDeque,
    fmt,
    sync::{Mutex, PoisonError},
};

enum Matcher<A> {
    Any,
    Equals(A),
    Predicate(Box<dyn Fn(&A) -> bool + Send + Sync>),
}

impl<A: fmt::Debug> fmt::Debug for Matcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Equals(args) => f.debug_tuple("Equals").field(args).finish(),
            Self::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

/// A scripted answer for one call.
///
/// Matches any arguments unless narrowed with [Expectation::with_args] or
/// [Expectation::when].
#[derive(Debug)]
pub struct Expectation<A, R> {
    matcher: Matcher<A>,
    outcome: std::result::Result<R, String>,
}

impl<A, R> Expectation<A, R> {
    pub fn returning(response: R) -> Self {
        Self {
            matcher: Matcher::Any,
            outcome: Ok(response),
        }
    }

    /// Answer with [Error::Scripted] carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Any,
            outcome: Err(message.into()),
        }
    }

    pub fn with_args(mut self, args: A) -> Self {
        self.matcher = Matcher::Equals(args);
        self
    }

    pub fn when(mut self, predicate: impl Fn(&A) -> bool + Send + Sync + 'static) -> Self {
        self.matcher = Matcher::Predicate(Box::new(predicate));
        self
    }
}

impl<A: PartialEq, R> Expectation<A, R> {
    fn matches(&self, args: &A) -> bool {
        match &self.matcher {
            Matcher::Any => true,
            Matcher::Equals(expected) => expected == args,
            Matcher::Predicate(predicate) => predicate(args),
        }
    }
}

/// Ordered, exhaustible queue of expectations for one operation.
pub struct Script<A, R> {
    name: &'static str,
    queue: Mutex<VecDeque<Expectation<A, R>>>,
}

impl<A: PartialEq, R> Script<A, R> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn push(&self, expectation: Expectation<A, R>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(expectation);
    }

    /// Number of expectations not yet consumed.
    pub fn remaining(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Consume the head expectation if it matches `args`.
    ///
    /// A head that does not match stays queued.
    pub fn next(&self, args: &A) -> Result<R> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        match queue.front() {
            None => return Err(Error::NoResponseConfigured(self.name)),
            Some(head) if !head.matches(args) => {
                return Err(Error::NoMatchingExpectation { name: self.name })
            }
            Some(_) => {}
        }
        let Some(expectation) = queue.pop_front() else {
            return Err(Error::NoResponseConfigured(self.name));
        };
        expectation.outcome.map_err(Error::Scripted)
    }
}

impl<A, R> fmt::Debug for Script<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let remaining = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Script")
            .field("name", &self.name)
            .field("remaining", &remaining)
            .finish()
    }
}
