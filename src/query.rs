//! # Query engine
//!
//! The where-step is the single primitive a conjunctive query is built
//! from: given a pattern and an upstream stream of bindings, it
//! substitutes every pattern variable already bound upstream with its
//! value, then asks the [`Store`] for matches. Chaining where-steps
//! realises a nested-loop join driven by upstream cardinality — exactly
//! the semantics of repeated `where(...)` calls in the system this
//! crate's query engine is modelled on.
//!
//! Every combinator here is a thin wrapper over the standard
//! [`Iterator`] adaptor that already does the real work; laziness comes
//! for free from `Iterator` itself; cursor release comes for free from
//! `Drop`. The one thing worth tracking by hand is that errors surfaced
//! mid-stream (a codec error decoding a corrupted row, a backend error
//! from the OKVS) must propagate rather than being silently swallowed
//! by a downstream `filter`/`map` — every combinator below passes `Err`
//! items straight through unexamined.

use std::collections::HashSet;
use std::hash::Hash;

use crate::binding::Binding;
use crate::error::{Result, UsageError};
use crate::okvs::Transaction;
use crate::store::{Pattern, Slot, Store};
use crate::value::Value;

/// A stream of bindings, the currency every where-step and combinator
/// in this module passes along. Errors are carried as stream items
/// rather than aborting iteration outright, so a caller can decide
/// whether to stop at the first error or collect partial results.
pub type BindingStream<'a> = Box<dyn Iterator<Item = Result<Binding>> + 'a>;

/// A pipeline stage: consumes an upstream binding stream, produces a
/// downstream one. `where_step` and [`compose`] both produce values of
/// this type; a pipeline is just a `Step` applied to a seed stream.
pub type Step<'a> = Box<dyn Fn(BindingStream<'a>) -> BindingStream<'a> + 'a>;

/// The seed stream for a pipeline with no upstream: a single empty
/// binding, so that the first where-step in a `compose` sees exactly
/// one input row and runs `Store::from` on the pattern as given.
#[must_use]
pub fn seed<'a>() -> BindingStream<'a> {
    Box::new(std::iter::once(Ok(Binding::new())))
}

/// Replace every `Slot::Var` in `pattern` whose name `binding` already
/// binds with a `Slot::Bound` of that value; variables `binding` does
/// not yet bind pass through unchanged.
fn resolve(pattern: &Pattern, binding: &Binding) -> Pattern {
    let slots = pattern
        .slots()
        .iter()
        .map(|slot| match slot {
            Slot::Var(name) => match binding.get(name) {
                Some(value) => Slot::Bound(value.clone()),
                None => Slot::Var(name.clone()),
            },
            Slot::Bound(value) => Slot::Bound(value.clone()),
        })
        .collect();
    Pattern::new(slots)
}

/// Build the where-step for `pattern` against `store` under `tr`. For
/// each upstream binding, resolves `pattern` against it and asks the
/// store for matches, seeding each result with the upstream binding so
/// earlier variables stay bound downstream.
pub fn where_step<'a>(store: &'a Store, tr: &'a dyn Transaction, pattern: Pattern) -> Step<'a> {
    Box::new(move |upstream: BindingStream<'a>| -> BindingStream<'a> {
        let pattern = pattern.clone();
        Box::new(upstream.flat_map(move |item| -> BindingStream<'a> {
            match item {
                Err(err) => Box::new(std::iter::once(Err(err))),
                Ok(binding) => {
                    let resolved = resolve(&pattern, &binding);
                    match store.from(tr, &resolved, &binding) {
                        Ok(rows) => Box::new(rows.into_iter().map(Ok)),
                        Err(err) => Box::new(std::iter::once(Err(err))),
                    }
                }
            }
        }))
    })
}

/// Left-fold a sequence of steps: each step's output feeds the next.
#[must_use]
pub fn compose<'a>(steps: Vec<Step<'a>>) -> Step<'a> {
    Box::new(move |upstream: BindingStream<'a>| -> BindingStream<'a> { steps.iter().fold(upstream, |acc, step| step(acc)) })
}

/// Skip the first `count` bindings.
#[must_use]
pub fn skip(upstream: BindingStream<'_>, count: usize) -> BindingStream<'_> {
    Box::new(upstream.skip(count))
}

/// Keep only the first `count` bindings.
#[must_use]
pub fn limit(upstream: BindingStream<'_>, count: usize) -> BindingStream<'_> {
    Box::new(upstream.take(count))
}

/// Group a stream into pages of `page_size` items each; the final page
/// may be shorter. Unlike the pagination helper this crate's design is
/// modelled on, no trailing empty page is ever emitted when the stream
/// length is an exact multiple of `page_size`.
pub fn paginate<'a>(upstream: BindingStream<'a>, page_size: usize) -> Box<dyn Iterator<Item = Result<Vec<Binding>>> + 'a> {
    Box::new(Paginate { inner: upstream, page_size, done: false })
}

struct Paginate<'a> {
    inner: BindingStream<'a>,
    page_size: usize,
    done: bool,
}

impl Iterator for Paginate<'_> {
    type Item = Result<Vec<Binding>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut page = Vec::with_capacity(self.page_size);
        for _ in 0..self.page_size {
            match self.inner.next() {
                Some(Ok(binding)) => page.push(binding),
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        if page.is_empty() {
            None
        } else {
            Some(Ok(page))
        }
    }
}

/// Drain the stream, counting its items. Stops at the first error.
pub fn count(upstream: BindingStream<'_>) -> Result<usize> {
    let mut total = 0;
    for item in upstream {
        item?;
        total += 1;
    }
    Ok(total)
}

/// Transform every item of a stream with `f`, preserving errors.
pub fn map<'a, T: 'a, U: 'a>(
    upstream: Box<dyn Iterator<Item = Result<T>> + 'a>,
    mut f: impl FnMut(T) -> U + 'a,
) -> Box<dyn Iterator<Item = Result<U>> + 'a> {
    Box::new(upstream.map(move |item| item.map(|value| f(value))))
}

/// Keep only items for which `predicate` holds; errors always pass through.
pub fn filter<'a, T: 'a>(
    upstream: Box<dyn Iterator<Item = Result<T>> + 'a>,
    mut predicate: impl FnMut(&T) -> bool + 'a,
) -> Box<dyn Iterator<Item = Result<T>> + 'a> {
    Box::new(upstream.filter(move |item| match item {
        Ok(value) => predicate(value),
        Err(_) => true,
    }))
}

/// Drop items equal to one already seen (first occurrence wins).
pub fn unique<'a, T>(upstream: Box<dyn Iterator<Item = Result<T>> + 'a>) -> Box<dyn Iterator<Item = Result<T>> + 'a>
where
    T: Eq + Hash + Clone + 'a,
{
    let mut seen: HashSet<T> = HashSet::new();
    Box::new(upstream.filter(move |item| match item {
        Ok(value) => seen.insert(value.clone()),
        Err(_) => true,
    }))
}

/// The arithmetic mean of a stream of floats. An empty stream yields
/// `NaN`, the same result IEEE 754 division by zero already produces.
pub fn mean(upstream: Box<dyn Iterator<Item = Result<f64>> + '_>) -> Result<f64> {
    let mut total = 0.0_f64;
    let mut count = 0_u64;
    for item in upstream {
        total += item?;
        count += 1;
    }
    Ok(total / count as f64)
}

/// Project a single variable out of every binding in a stream.
pub fn pick<'a>(upstream: BindingStream<'a>, name: &'a str) -> Box<dyn Iterator<Item = Result<Value>> + 'a> {
    Box::new(upstream.map(move |item| item.and_then(|binding| binding.get(name).cloned().ok_or_else(|| UsageError::UnboundVariable(name.to_string()).into()))))
}
