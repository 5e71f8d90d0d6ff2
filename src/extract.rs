/*!
The flag / key-value extraction pre-pass.

Extraction walks the raw tokens left to right *before* positional matching,
resolving flag-shaped tokens against the signature's declared flags and
key-values. Recognized tokens are consumed; everything else, including a
`--token` that matches no declaration, lands in the residual positional
stream, where it can surface as an ordinary parse error instead of being
silently swallowed.

Two modes share the walk. [`Mode::Strict`] (parsing) reports duplicates,
missing values, denied access, and value parse failures as [`ParseError`]s.
[`Mode::Permissive`] (completion) never fails: a token that can't be resolved
simply isn't a flag.
*/

use std::collections::{HashMap, HashSet};

use quibble_parser::Shape;

use crate::access::Caller;
use crate::arguments::BoxedValue;
use crate::errors::ParseError;
use crate::outcome::ParseOutcome;
use crate::signature::Signature;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Strict,
    Permissive,
}

/// What extraction found: the residual positional tokens plus the structured
/// flag and key-value results.
#[derive(Default)]
pub(crate) struct Extraction {
    pub(crate) residual: Vec<String>,

    /// Flag name (canonical casing) → value. Negated flags record `false`.
    pub(crate) flags: Vec<(String, bool)>,

    /// Key (folded) → parsed values, in order of appearance.
    pub(crate) values: HashMap<String, Vec<BoxedValue>>,

    /// Folded names of every flag/key-value consumed, for suggestion
    /// filtering.
    pub(crate) used: HashSet<String>,

    /// Set in permissive mode when the token list ends on a `--key` still
    /// awaiting its value; the in-progress token being completed is that
    /// value.
    pub(crate) pending_key: Option<String>,
}

impl Extraction {
    fn flag_seen(&self, name: &str) -> bool {
        self.flags
            .iter()
            .any(|(seen, _)| seen.eq_ignore_ascii_case(name))
    }

    fn record_flag(&mut self, name: &str, value: bool) {
        self.flags.push((name.to_owned(), value));
        self.used.insert(name.to_lowercase());
    }

    fn record_value(&mut self, key: &str, value: BoxedValue) {
        self.values.entry(key.to_lowercase()).or_default().push(value);
        self.used.insert(key.to_lowercase());
    }
}

pub(crate) fn extract(
    signature: &Signature,
    tokens: &[&str],
    caller: &dyn Caller,
    mode: Mode,
) -> Result<Extraction, ParseError> {
    let strict = mode == Mode::Strict;
    let mut out = Extraction::default();
    let mut index = 0;

    while index < tokens.len() {
        let token = tokens[index];
        index += 1;

        match Shape::classify(token) {
            Shape::LongAssign { key, value } | Shape::Pair { key, value } => {
                match signature.find_key_value(key) {
                    Some(kv) => {
                        consume_value(signature, &mut out, kv.key(), value, caller, strict)?;
                    }
                    None => out.residual.push(token.to_owned()),
                }
            }

            Shape::Long(name) => {
                // tie-break: a key-value beats a flag under the same name,
                // and takes its value from the next token
                if let Some(kv) = signature.find_key_value(name) {
                    let key = kv.key().to_owned();
                    match next_word(tokens, &mut index) {
                        Some(value) => {
                            consume_value(signature, &mut out, &key, value, caller, strict)?;
                        }
                        None if strict => return Err(ParseError::MissingValue { key }),
                        None => {
                            out.used.insert(key.to_lowercase());
                            out.pending_key = Some(key);
                        }
                    }
                } else if signature.find_flag(name).is_some() {
                    consume_flag(signature, &mut out, name, true, caller, strict)?;
                } else {
                    out.residual.push(token.to_owned());
                }
            }

            Shape::NegatedLong(name) => {
                let full = format!("no-{name}");

                // a declaration literally named `no-...` wins over negation
                if let Some(kv) = signature.find_key_value(&full) {
                    let key = kv.key().to_owned();
                    match next_word(tokens, &mut index) {
                        Some(value) => {
                            consume_value(signature, &mut out, &key, value, caller, strict)?;
                        }
                        None if strict => return Err(ParseError::MissingValue { key }),
                        None => {
                            out.used.insert(key.to_lowercase());
                            out.pending_key = Some(key);
                        }
                    }
                } else if signature.find_flag(&full).is_some() {
                    consume_flag(signature, &mut out, &full, true, caller, strict)?;
                } else if signature
                    .find_flag(name)
                    .is_some_and(|flag| flag.is_negatable())
                {
                    consume_flag(signature, &mut out, name, false, caller, strict)?;
                } else {
                    out.residual.push(token.to_owned());
                }
            }

            Shape::Shorts(shorts) => {
                let mut chars = shorts.chars();
                let first = chars.next().unwrap_or_default();

                if shorts.chars().count() == 1 {
                    if let Some(kv) = signature.find_key_value_short(first) {
                        let key = kv.key().to_owned();
                        match next_word(tokens, &mut index) {
                            Some(value) => {
                                consume_value(signature, &mut out, &key, value, caller, strict)?;
                            }
                            None if strict => return Err(ParseError::MissingValue { key }),
                            None => {
                                out.used.insert(key.to_lowercase());
                                out.pending_key = Some(key);
                            }
                        }
                        continue;
                    }
                }

                // a bundle is only consumed when every character names a
                // declared flag; otherwise it stays positional
                let resolved: Option<Vec<&str>> = shorts
                    .chars()
                    .map(|c| signature.find_flag_short(c).map(|flag| flag.name()))
                    .collect();

                match resolved {
                    Some(names) => {
                        let names: Vec<String> =
                            names.into_iter().map(str::to_owned).collect();
                        for name in &names {
                            consume_flag(signature, &mut out, name, true, caller, strict)?;
                        }
                    }
                    None => out.residual.push(token.to_owned()),
                }
            }

            Shape::Word(word) => out.residual.push(word.to_owned()),
        }
    }

    Ok(out)
}

/// A `--key` takes its value from the next token only when that token is a
/// plain word; a flag-shaped token there means the value is missing.
fn next_word<'t>(tokens: &[&'t str], index: &mut usize) -> Option<&'t str> {
    let candidate = *tokens.get(*index)?;

    match Shape::classify(candidate) {
        Shape::Word(word) => {
            *index += 1;
            Some(word)
        }
        _ => None,
    }
}

fn consume_flag(
    signature: &Signature,
    out: &mut Extraction,
    name: &str,
    value: bool,
    caller: &dyn Caller,
    strict: bool,
) -> Result<(), ParseError> {
    // find_flag never fails here; callers resolved the name already
    let Some(flag) = signature.find_flag(name) else {
        return Ok(());
    };

    if !flag.access().check(caller) {
        return match strict {
            true => Err(ParseError::AccessDenied {
                name: flag.name().to_owned(),
            }),
            false => Ok(()),
        };
    }

    if out.flag_seen(flag.name()) {
        return match strict {
            true => Err(ParseError::Duplicate {
                name: flag.name().to_owned(),
            }),
            false => Ok(()),
        };
    }

    out.record_flag(flag.name(), value);
    Ok(())
}

fn consume_value(
    signature: &Signature,
    out: &mut Extraction,
    key: &str,
    raw: &str,
    caller: &dyn Caller,
    strict: bool,
) -> Result<(), ParseError> {
    let Some(kv) = signature.find_key_value(key) else {
        return Ok(());
    };

    if !kv.access().check(caller) {
        return match strict {
            true => Err(ParseError::AccessDenied {
                name: kv.key().to_owned(),
            }),
            false => Ok(()),
        };
    }

    if !kv.allows_multiple() && out.values.contains_key(&kv.key().to_lowercase()) {
        return match strict {
            true => Err(ParseError::Duplicate {
                name: kv.key().to_owned(),
            }),
            false => Ok(()),
        };
    }

    match kv.parser().parse_erased(raw, caller) {
        ParseOutcome::Success(Some(value)) => {
            out.record_value(kv.key(), value);
            Ok(())
        }
        ParseOutcome::Success(None) => {
            out.used.insert(kv.key().to_lowercase());
            Ok(())
        }
        ParseOutcome::Failure(message) => match strict {
            true => Err(ParseError::InvalidValue {
                name: kv.key().to_owned(),
                type_name: kv.parser().type_name(),
                message,
            }),
            false => Ok(()),
        },
    }
}
