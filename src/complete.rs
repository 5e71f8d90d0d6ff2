/*!
The completion resolver: a state machine over token *position*, not over
time.

Given the full token list, the last element being the in-progress token
(possibly empty), the resolver decides which descriptor (or flag/key-value) is
active, optionally re-validates everything before it, gathers suggestions
from the highest-priority available source, and ranks them.

Suggestion sources, in strict priority order: predefined list, synchronous
dynamic provider, asynchronous predefined supplier, asynchronous dynamic
provider, and finally the parser's own `complete`. The two asynchronous
sources are awaited with a bounded timeout and go through the debounced
[`CompletionCache`]; a timed-out source is logged and skipped, never an
error.
*/

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use quibble_parser::{Shape, looks_flag_like};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::access::CallerRef;
use crate::arguments::Arguments;
use crate::cache::{CompletionCache, Lookup};
use crate::descriptor::Arg;
use crate::extract::{self, Extraction, Mode};
use crate::outcome::ParseOutcome;
use crate::signature::Signature;
use crate::spec::CompletionSources;
use crate::validate;

/**
An asynchronous predefined suggestion supplier: produces the full candidate
list for an argument, independent of what's been typed. Filtering against
the prefix happens in ranking.
*/
#[async_trait]
pub trait SuggestionSupplier: Send + Sync {
    async fn suggestions(&self) -> Vec<String>;
}

/**
An asynchronous dynamic suggestion provider: sees the effective prefix and
the caller, typically to consult an external lookup.
*/
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn suggest(&self, prefix: &str, caller: &CallerRef) -> Vec<String>;
}

/**
Rank candidate suggestions against a prefix.

Exact case-insensitive matches come first, then prefix matches, then
substring matches; each tier is sorted lexicographically (case-insensitive),
the tiers are concatenated, and candidates that don't match at all are
dropped. Duplicates keep their first occurrence.
*/
#[must_use]
pub fn rank(candidates: impl IntoIterator<Item = String>, prefix: &str) -> Vec<String> {
    let needle = prefix.to_lowercase();

    let mut exact = Vec::new();
    let mut prefixed = Vec::new();
    let mut substring = Vec::new();

    for candidate in candidates {
        let folded = candidate.to_lowercase();

        let tier = if folded == needle {
            &mut exact
        } else if folded.starts_with(&needle) {
            &mut prefixed
        } else if folded.contains(&needle) {
            &mut substring
        } else {
            continue;
        };

        if !tier.iter().any(|(seen, _): &(String, String)| *seen == folded) {
            tier.push((folded, candidate));
        }
    }

    let mut ranked = Vec::with_capacity(exact.len() + prefixed.len() + substring.len());
    for mut tier in [exact, prefixed, substring] {
        tier.sort();
        ranked.extend(tier.into_iter().map(|(_, candidate)| candidate));
    }

    ranked
}

pub(crate) async fn resolve(
    signature: &Signature,
    tokens: &[&str],
    caller: &CallerRef,
    cache: &CompletionCache,
) -> Vec<String> {
    // a denied caller learns nothing, not even partial names
    if !signature.guard.check(caller.as_ref()) {
        return Vec::new();
    }

    let current = tokens.last().copied().unwrap_or_default();

    if !signature.sub_routes.is_empty() && tokens.len() <= 1 {
        return sub_route_suggestions(signature, current, caller);
    }

    let prior = &tokens[..tokens.len().saturating_sub(1)];
    let extraction =
        match extract::extract(signature, prior, caller.as_ref(), Mode::Permissive) {
            Ok(extraction) => extraction,
            Err(_) => return Vec::new(),
        };

    // a key announced by the previous token owns the current one entirely
    if let Some(ref key) = extraction.pending_key {
        return key_value_suggestions(signature, key, current, "", caller);
    }

    if looks_flag_like(current) {
        return flag_suggestions(signature, &extraction, current, caller);
    }

    // map the token index to a descriptor index; everything at or past the
    // greedy descriptor's position belongs to it
    let mut position = extraction.residual.len();
    if let Some(greedy) = signature.greedy_index() {
        position = position.min(greedy);
    }

    let Some(arg) = signature.args.get(position) else {
        // past the last descriptor: only flags can still be useful
        return flag_suggestions(signature, &extraction, current, caller);
    };

    if signature.options.validate_on_tab && !prior_tokens_hold_up(signature, &extraction, caller) {
        return Vec::new();
    }

    if !arg.spec().access.check(caller.as_ref()) {
        return Vec::new();
    }

    // the effective prefix for a greedy descriptor is its whole joined tail
    let prefix = match signature.greedy_index() == Some(position) {
        true => {
            let mut parts: Vec<&str> = extraction.residual[position..]
                .iter()
                .map(String::as_str)
                .collect();
            parts.push(current);
            parts.join(" ")
        }
        false => current.to_owned(),
    };

    let candidates = gather(arg, position, &prefix, caller, cache, signature).await;

    let mut candidates = match candidates {
        Gathered::Suggestions(candidates) => candidates,
        Gathered::Debounced => return Vec::new(),
    };

    // an empty token on an optional descriptor may also want flag names; the
    // merged set is ranked as one list
    if current.is_empty() && arg.is_optional() {
        candidates.extend(flag_suggestions(signature, &extraction, current, caller));
    }

    rank(candidates, &prefix)
}

enum Gathered {
    Suggestions(Vec<String>),
    Debounced,
}

/// Resolve the active descriptor's suggestion sources in priority order.
async fn gather(
    arg: &Arg,
    position: usize,
    prefix: &str,
    caller: &CallerRef,
    cache: &CompletionCache,
    signature: &Signature,
) -> Gathered {
    let sources = &arg.spec().completions;

    if let Some(ref predefined) = sources.predefined {
        return Gathered::Suggestions(predefined.clone());
    }

    if let Some(ref dynamic) = sources.dynamic {
        return Gathered::Suggestions(dynamic(prefix, caller.as_ref()));
    }

    if sources.is_async() {
        match gather_async(sources, position, prefix, caller, cache, signature).await {
            AsyncGathered::Suggestions(candidates) => {
                return Gathered::Suggestions(candidates);
            }
            AsyncGathered::Debounced => return Gathered::Debounced,
            // timed out: fall through to the parser's own completions
            AsyncGathered::Unavailable => {}
        }
    }

    Gathered::Suggestions(arg.parser().complete(prefix, caller.as_ref()))
}

enum AsyncGathered {
    Suggestions(Vec<String>),
    Debounced,
    Unavailable,
}

async fn gather_async(
    sources: &CompletionSources,
    position: usize,
    prefix: &str,
    caller: &CallerRef,
    cache: &CompletionCache,
    signature: &Signature,
) -> AsyncGathered {
    match cache.begin(position, prefix) {
        Lookup::Hit(results) => return AsyncGathered::Suggestions(results),
        Lookup::Debounced => return AsyncGathered::Debounced,
        Lookup::Miss => {}
    }

    let source_timeout = signature.options.source_timeout;

    // Each source gets its own bounded wait; a timed-out source is skipped
    // and the next one tried. The computation itself runs detached and
    // unbounded, so a late finisher still back-fills the cache for the next
    // lookup.
    if let Some(supplier) = sources.async_predefined.clone() {
        let receiver = dispatch(cache, position, prefix, async move {
            supplier.suggestions().await
        });

        match timeout(source_timeout, receiver).await {
            Ok(Ok(results)) => return AsyncGathered::Suggestions(results),
            // the spawned computation panicked
            Ok(Err(_)) => {}
            Err(_) => warn!(
                position,
                "suggestion supplier timed out; trying the next source"
            ),
        }
    }

    if let Some(provider) = sources.async_dynamic.clone() {
        let caller = Arc::clone(caller);
        let owned_prefix = prefix.to_owned();
        let receiver = dispatch(cache, position, prefix, async move {
            provider.suggest(&owned_prefix, &caller).await
        });

        match timeout(source_timeout, receiver).await {
            Ok(Ok(results)) => return AsyncGathered::Suggestions(results),
            Ok(Err(_)) => {}
            Err(_) => warn!(
                position,
                "suggestion provider timed out; abandoning the wait"
            ),
        }
    }

    AsyncGathered::Unavailable
}

/// Spawn one suggestion computation detached, reporting back over a oneshot
/// and filling the cache however late it lands.
fn dispatch(
    cache: &CompletionCache,
    position: usize,
    prefix: &str,
    source: impl Future<Output = Vec<String>> + Send + 'static,
) -> oneshot::Receiver<Vec<String>> {
    let (sender, receiver) = oneshot::channel();
    let cache = cache.clone();
    let prefix = prefix.to_owned();

    tokio::spawn(async move {
        let results = source.await;
        cache.fulfill(position, &prefix, results.clone());

        // the waiter may be long gone; that's fine
        let _ = sender.send(results);
    });

    receiver
}

fn sub_route_suggestions(
    signature: &Signature,
    current: &str,
    caller: &CallerRef,
) -> Vec<String> {
    let names: Vec<String> = signature
        .sub_routes
        .iter()
        .filter(|route| route.access.check(caller.as_ref()))
        .map(|route| route.name.clone())
        .collect();

    let ranked = rank(names.clone(), current);
    if !ranked.is_empty() {
        return ranked;
    }

    let Some(threshold) = signature.options.fuzzy_threshold else {
        return Vec::new();
    };

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, String)> = names
        .into_iter()
        .filter_map(|name| {
            matcher
                .fuzzy_match(&name, current)
                .filter(|&score| score >= threshold)
                .map(|score| (score, name))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, name)| name).collect()
}

/// Suggestions when the in-progress token itself is flag-shaped (or nothing
/// positional remains): unused flag and key-value names, or, for a token
/// already carrying `=`/`:`, the named key-value's value completions.
fn flag_suggestions(
    signature: &Signature,
    extraction: &Extraction,
    current: &str,
    caller: &CallerRef,
) -> Vec<String> {
    match Shape::classify(current) {
        Shape::LongAssign { key, value } => {
            return key_value_suggestions(signature, key, value, &format!("--{key}="), caller);
        }
        Shape::Pair { key, value } => {
            return key_value_suggestions(signature, key, value, &format!("{key}:"), caller);
        }
        _ => {}
    }

    let mut candidates = Vec::new();

    for flag in &signature.flags {
        if !flag.access().check(caller.as_ref()) {
            continue;
        }
        if extraction.used.contains(&flag.name().to_lowercase()) {
            continue;
        }

        candidates.push(format!("--{}", flag.name()));
        if flag.is_negatable() {
            candidates.push(format!("--no-{}", flag.name()));
        }
    }

    for kv in &signature.key_values {
        if !kv.access().check(caller.as_ref()) {
            continue;
        }
        if !kv.allows_multiple() && extraction.used.contains(&kv.key().to_lowercase()) {
            continue;
        }

        candidates.push(format!("--{}=", kv.key()));
    }

    rank(candidates, current)
}

/// Value completions for a known key, re-prefixed so the suggestion replaces
/// the whole token (`--key=value` or `key:value`).
fn key_value_suggestions(
    signature: &Signature,
    key: &str,
    value: &str,
    lead: &str,
    caller: &CallerRef,
) -> Vec<String> {
    let Some(kv) = signature.find_key_value(key) else {
        return Vec::new();
    };

    if !kv.access().check(caller.as_ref()) {
        return Vec::new();
    }

    let completions = kv.parser().complete(value, caller.as_ref());

    rank(completions, value)
        .into_iter()
        .map(|suggestion| format!("{lead}{suggestion}"))
        .collect()
}

/// `validate_on_tab`: re-parse and re-validate every prior positional token;
/// any failure suppresses suggestions entirely.
fn prior_tokens_hold_up(
    signature: &Signature,
    extraction: &Extraction,
    caller: &CallerRef,
) -> bool {
    let residual = &extraction.residual;
    let mut parsed = Arguments::new();
    let mut cursor = 0;

    for (index, arg) in signature.args.iter().enumerate() {
        if cursor >= residual.len() {
            break;
        }

        let spec = arg.spec();

        if let Some(ref condition) = spec.condition {
            if !condition(&parsed) {
                continue;
            }
        }

        if !spec.access.check(caller.as_ref()) {
            debug!(argument = arg.name(), "prior token denied during validate-on-tab");
            return false;
        }

        let token: String = match signature.greedy_index() == Some(index) {
            true => {
                let joined = residual[cursor..].join(" ");
                cursor = residual.len();
                joined
            }
            false => {
                let token = residual[cursor].clone();
                cursor += 1;
                token
            }
        };

        match arg.parser().parse_erased(&token, caller.as_ref()) {
            ParseOutcome::Failure(message) => {
                debug!(
                    argument = arg.name(),
                    %message,
                    "prior token failed to parse during validate-on-tab"
                );
                return false;
            }
            ParseOutcome::Success(None) => {}
            ParseOutcome::Success(Some(value)) => {
                if let Some(message) = validate::run(spec, &value) {
                    debug!(
                        argument = arg.name(),
                        %message,
                        "prior token failed validation during validate-on-tab"
                    );
                    return false;
                }

                parsed.insert(arg.name(), value);
            }
        }
    }

    true
}
