//! Stage execution.
//!
//! `run` drives the stages of a stream from the last one backwards: each
//! stage runs its upstream with a callback that transforms the documents it
//! receives and forwards them to its own downstream callback. A stage
//! returns `ControlFlow::Break` only when its downstream asked to stop; a
//! `Take` that reached its count stops its upstream but reports `Continue`,
//! so sibling branches of a union or concat still run.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::ControlFlow;

use tessera_core::{Document, Path, Value};
use tessera_expr::{AggregateCall, Aggregator, Environment, EvalError, Expr};
use tracing::{debug, trace};

use crate::{Operator, Stream, StreamError, StreamResult};

/// Downstream callback of a stage.
pub(crate) type Emit<'f> = dyn FnMut(&Environment<'_>) -> StreamResult<ControlFlow<()>> + 'f;

const CONTINUE: StreamResult<ControlFlow<()>> = Ok(ControlFlow::Continue(()));
const BREAK: StreamResult<ControlFlow<()>> = Ok(ControlFlow::Break(()));

pub(crate) fn run(ops: &[Operator], env: &Environment<'_>, f: &mut Emit<'_>) -> StreamResult<ControlFlow<()>> {
    let Some((op, upstream)) = ops.split_last() else {
        return f(env);
    };

    match op {
        Operator::SeqScan(table) => seq_scan(table, env, f),
        Operator::DocsEmit(exprs) => docs_emit(exprs, env, f),
        Operator::Union(branches) => union(branches, env, f),
        Operator::Concat(branches) => concat(branches, env, f),
        Operator::Filter(predicate) => run(upstream, env, &mut |e| {
            if predicate.eval(e)?.is_truthy() {
                f(e)
            } else {
                CONTINUE
            }
        }),
        Operator::Project(exprs) => run(upstream, env, &mut |e| {
            let doc = project(exprs, e)?;
            f(&Environment::nested(e, doc))
        }),
        Operator::Sort(key) => sort(upstream, key, false, env, f),
        Operator::SortReverse(key) => sort(upstream, key, true, env, f),
        Operator::Skip(count) => {
            let mut skipped = 0u64;
            run(upstream, env, &mut |e| {
                if skipped < *count {
                    skipped += 1;
                    return CONTINUE;
                }
                f(e)
            })
        }
        Operator::Take(count) => take(upstream, *count, env, f),
        Operator::GroupAggregate { key, aggregators } => {
            group_aggregate(upstream, key.as_ref(), aggregators, env, f)
        }
        Operator::PathsSet(path, value) => run(upstream, env, &mut |e| {
            let mut doc = current_document(e)?;
            let v = value.eval(e)?;
            doc.set_path(path, v)
                .map_err(|err| StreamError::incompatible_path(path.to_string(), err))?;
            f(&Environment::nested(e, doc))
        }),
        Operator::PathsUnset(path) => run(upstream, env, &mut |e| {
            let doc = unset(current_document(e)?, path);
            f(&Environment::nested(e, doc))
        }),
    }
}

fn current_document(env: &Environment<'_>) -> StreamResult<Document> {
    env.document()
        .cloned()
        .ok_or(StreamError::Eval(EvalError::NoDocument))
}

fn check_interrupt(env: &Environment<'_>) -> StreamResult<()> {
    if env.is_interrupted() {
        debug!("interrupt observed");
        return Err(StreamError::Cancelled);
    }
    Ok(())
}

fn ensure_capacity(buffered: usize, limit: Option<usize>, stage: &'static str) -> StreamResult<()> {
    match limit {
        Some(max) if buffered >= max => Err(StreamError::buffer_limit(stage, max)),
        _ => Ok(()),
    }
}

fn emit_all(
    docs: impl IntoIterator<Item = Document>,
    env: &Environment<'_>,
    f: &mut Emit<'_>,
) -> StreamResult<ControlFlow<()>> {
    for doc in docs {
        check_interrupt(env)?;
        if f(&Environment::nested(env, doc))?.is_break() {
            return BREAK;
        }
    }
    CONTINUE
}

fn seq_scan(table: &str, env: &Environment<'_>, f: &mut Emit<'_>) -> StreamResult<ControlFlow<()>> {
    let catalog = env.catalog()?;
    for doc in catalog.scan(table)? {
        check_interrupt(env)?;
        let doc = doc?;
        if f(&Environment::nested(env, doc))?.is_break() {
            trace!(table, "scan stopped by downstream");
            return BREAK;
        }
    }
    CONTINUE
}

fn docs_emit(exprs: &[Expr], env: &Environment<'_>, f: &mut Emit<'_>) -> StreamResult<ControlFlow<()>> {
    for expr in exprs {
        check_interrupt(env)?;
        let doc = match expr.eval(env)? {
            Value::Document(doc) => doc,
            other => {
                return Err(StreamError::NotADocument {
                    stage: "docs.Emit",
                    found: other.value_type(),
                })
            }
        };
        if f(&Environment::nested(env, doc))?.is_break() {
            return BREAK;
        }
    }
    CONTINUE
}

fn project(exprs: &[Expr], env: &Environment<'_>) -> StreamResult<Document> {
    let mut out = Document::with_capacity(exprs.len());
    for expr in exprs {
        match expr {
            Expr::Wildcard => {
                let doc = env.document().ok_or(EvalError::NoDocument)?;
                for (name, value) in doc.iter() {
                    out.set(name, value.clone());
                }
            }
            Expr::Named(named) => out.set(named.name.clone(), named.expr.eval(env)?),
            other => out.set(other.to_string(), other.eval(env)?),
        }
    }
    Ok(out)
}

fn unset(mut doc: Document, path: &Path) -> Document {
    doc.unset_path(path);
    doc
}

fn sort(
    upstream: &[Operator],
    key: &Expr,
    reverse: bool,
    env: &Environment<'_>,
    f: &mut Emit<'_>,
) -> StreamResult<ControlFlow<()>> {
    let limit = env.config().max_buffered_documents;
    let mut buffer: Vec<(Value, Document)> = Vec::new();

    let flow = run(upstream, env, &mut |e| {
        let k = key.eval(e)?;
        let doc = current_document(e)?;
        ensure_capacity(buffer.len(), limit, "sort")?;
        buffer.push((k, doc));
        CONTINUE
    })?;
    if flow.is_break() {
        return BREAK;
    }

    trace!(buffered = buffer.len(), reverse, "sort flushed");
    if reverse {
        buffer.sort_by(|a, b| b.0.compare(&a.0));
    } else {
        buffer.sort_by(|a, b| a.0.compare(&b.0));
    }
    emit_all(buffer.into_iter().map(|(_, doc)| doc), env, f)
}

fn take(upstream: &[Operator], count: u64, env: &Environment<'_>, f: &mut Emit<'_>) -> StreamResult<ControlFlow<()>> {
    if count == 0 {
        return CONTINUE;
    }

    let mut taken = 0u64;
    let mut downstream_stopped = false;
    let flow = run(upstream, env, &mut |e| {
        taken += 1;
        if f(e)?.is_break() {
            downstream_stopped = true;
            return BREAK;
        }
        if taken >= count {
            trace!(count, "take reached its count");
            return BREAK;
        }
        CONTINUE
    })?;

    if downstream_stopped {
        Ok(flow)
    } else {
        CONTINUE
    }
}

type Group = (Value, Vec<Box<dyn Aggregator>>);

fn group_aggregate(
    upstream: &[Operator],
    key: Option<&Expr>,
    calls: &[AggregateCall],
    env: &Environment<'_>,
    f: &mut Emit<'_>,
) -> StreamResult<ControlFlow<()>> {
    let limit = env.config().max_buffered_documents;
    let mut groups: Vec<Document> = Vec::new();
    let mut current: Option<Group> = None;

    let flow = run(upstream, env, &mut |e| {
        let k = match key {
            Some(key) => key.eval(e)?,
            None => Value::Null,
        };
        let boundary = matches!(&current, Some((ck, _)) if ck.compare(&k) != Ordering::Equal);
        if boundary {
            if let Some((ck, aggs)) = current.take() {
                ensure_capacity(groups.len(), limit, "group aggregate")?;
                groups.push(group_document(key, ck, calls, &aggs));
            }
        }
        let (_, aggs) = current.get_or_insert_with(|| (k, new_aggregators(calls)));
        for agg in aggs.iter_mut() {
            agg.aggregate(e)?;
        }
        CONTINUE
    })?;
    if flow.is_break() {
        return BREAK;
    }

    match current {
        Some((ck, aggs)) => {
            ensure_capacity(groups.len(), limit, "group aggregate")?;
            groups.push(group_document(key, ck, calls, &aggs));
        }
        // Without a key there is always exactly one group, even over no input.
        None if key.is_none() => {
            groups.push(group_document(None, Value::Null, calls, &new_aggregators(calls)));
        }
        None => {}
    }

    trace!(groups = groups.len(), "group aggregate flushed");
    emit_all(groups, env, f)
}

fn new_aggregators(calls: &[AggregateCall]) -> Vec<Box<dyn Aggregator>> {
    calls.iter().map(AggregateCall::aggregator).collect()
}

/// The key under its rendering, then each aggregate under its rendering.
fn group_document(
    key: Option<&Expr>,
    key_value: Value,
    calls: &[AggregateCall],
    aggs: &[Box<dyn Aggregator>],
) -> Document {
    let mut doc = Document::with_capacity(calls.len() + 1);
    if let Some(key) = key {
        doc.set(key.to_string(), key_value);
    }
    for (call, agg) in calls.iter().zip(aggs) {
        doc.set(call.to_string(), agg.finish());
    }
    doc
}

fn union(branches: &[Stream], env: &Environment<'_>, f: &mut Emit<'_>) -> StreamResult<ControlFlow<()>> {
    let limit = env.config().max_buffered_documents;
    let mut seen: HashSet<Document> = HashSet::new();

    for (i, branch) in branches.iter().enumerate() {
        if i > 0 {
            check_interrupt(env)?;
        }
        let flow = run(branch.operators(), env, &mut |e| {
            let doc = current_document(e)?;
            if seen.contains(&doc) {
                return CONTINUE;
            }
            ensure_capacity(seen.len(), limit, "union")?;
            seen.insert(doc);
            f(e)
        })?;
        if flow.is_break() {
            return BREAK;
        }
    }

    trace!(distinct = seen.len(), branches = branches.len(), "union finished");
    CONTINUE
}

fn concat(branches: &[Stream], env: &Environment<'_>, f: &mut Emit<'_>) -> StreamResult<ControlFlow<()>> {
    for (i, branch) in branches.iter().enumerate() {
        if i > 0 {
            check_interrupt(env)?;
        }
        if run(branch.operators(), env, f)?.is_break() {
            return BREAK;
        }
    }
    CONTINUE
}
