/*!
The positional matcher: walks the ordered descriptor list against the
residual token stream with two cursors in lock-step, assembling the result
map.
*/

use tracing::trace;

use crate::access::Caller;
use crate::arguments::{Arguments, BoxedValue};
use crate::errors::ParseError;
use crate::extract::{self, Mode};
use crate::outcome::ParseOutcome;
use crate::signature::Signature;
use crate::validate;

pub(crate) fn run(
    signature: &Signature,
    tokens: &[&str],
    caller: &dyn Caller,
) -> Result<Arguments, ParseError> {
    if !signature.guard.check(caller) {
        return Err(ParseError::GuardDenied);
    }

    let mut extraction = extract::extract(signature, tokens, caller, Mode::Strict)?;
    let residual = extraction.residual;

    let required = signature.required_count();
    if residual.len() < required {
        return Err(ParseError::NotEnoughArguments {
            required,
            given: residual.len(),
        });
    }

    if signature.greedy_index().is_none() && residual.len() > signature.args.len() {
        return Err(ParseError::TooManyArguments {
            limit: signature.args.len(),
            given: residual.len(),
        });
    }

    let mut result = Arguments::new();

    // flags first, so that a key-value sharing a flag's bare name wins the
    // map slot, consistent with the extractor's tie-break
    for (name, value) in extraction.flags.drain(..) {
        result.insert(&name, Box::new(value));
    }

    for kv in &signature.key_values {
        match extraction.values.remove(&kv.key().to_lowercase()) {
            Some(mut values) => match kv.allows_multiple() {
                true => result.insert(kv.key(), Box::new(values)),
                // duplicates were rejected during extraction
                false => match values.pop() {
                    Some(value) => result.insert(kv.key(), value),
                    None => {}
                },
            },
            None => {
                if let Some(default) = kv.default() {
                    result.insert(kv.key(), default);
                }
            }
        }
    }

    let mut cursor = 0;

    for (index, arg) in signature.args.iter().enumerate() {
        let spec = arg.spec();

        // a skipped argument consumes nothing and can't deny access
        if let Some(ref condition) = spec.condition {
            if !condition(&result) {
                trace!(argument = arg.name(), "skipped by condition");
                apply_default(&mut result, arg.name(), spec);
                continue;
            }
        }

        if !spec.access.check(caller) {
            return Err(ParseError::AccessDenied {
                name: arg.name().to_owned(),
            });
        }

        if cursor >= residual.len() {
            if !arg.is_optional() {
                return Err(ParseError::NotEnoughArguments {
                    required,
                    given: residual.len(),
                });
            }

            apply_default(&mut result, arg.name(), spec);
            continue;
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

        match arg.parser().parse_erased(&token, caller) {
            ParseOutcome::Failure(message) => {
                return Err(ParseError::InvalidValue {
                    name: arg.name().to_owned(),
                    type_name: arg.type_name(),
                    message,
                });
            }
            // a legitimate parsed "no value": the name stays absent
            ParseOutcome::Success(None) => {}
            ParseOutcome::Success(Some(value)) => {
                if let Some(message) = validate::run(spec, &value) {
                    return Err(ParseError::InvalidValue {
                        name: arg.name().to_owned(),
                        type_name: arg.type_name(),
                        message,
                    });
                }

                let value: BoxedValue = match spec.transform {
                    Some(ref transform) => transform(value),
                    None => value,
                };

                result.insert(arg.name(), value);
            }
        }
    }

    Ok(result)
}

fn apply_default(result: &mut Arguments, name: &str, spec: &crate::spec::ArgumentSpec) {
    if let Some(ref default) = spec.default {
        result.insert(name, default());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::access::{Access, Caller};
    use crate::arguments::BoxedValue;
    use crate::descriptor::{Arg, Flag, KeyValue};
    use crate::errors::ParseError;
    use crate::impls::{BoolParser, IntParser, StringParser};
    use crate::signature::Signature;
    use crate::spec::{ArgumentSpec, transform, validator};

    struct Nobody;
    impl Caller for Nobody {}

    fn mute_signature() -> Signature {
        Signature::builder()
            .arg(Arg::new("target", StringParser))
            .arg(
                Arg::new("minutes", IntParser).with_spec(
                    ArgumentSpec::builder()
                        .optional(true)
                        .min_int(1)
                        .max_int(1440)
                        .build(),
                ),
            )
            .arg(Arg::new("reason", StringParser).optional(true).greedy())
            .flag(Flag::new("silent").short('s'))
            .key_value(KeyValue::new("channel", StringParser).with_default("global".to_owned()))
            .build()
    }

    #[test]
    fn full_parse_assembles_the_result_map() {
        let signature = mute_signature();
        let tokens = ["--silent", "steve", "30", "being", "a", "creep"];
        let result = signature.parse(&tokens, &Nobody).unwrap();

        assert_eq!(result.get::<String>("target").map(String::as_str), Some("steve"));
        assert_eq!(result.get::<i32>("minutes"), Some(&30));
        assert_eq!(
            result.get::<String>("reason").map(String::as_str),
            Some("being a creep")
        );
        assert_eq!(result.get::<bool>("silent"), Some(&true));
        // defaulted key-value
        assert_eq!(
            result.get::<String>("channel").map(String::as_str),
            Some("global")
        );
    }

    #[test]
    fn absent_optionals_are_absent_not_placeholders() {
        let signature = mute_signature();
        let result = signature.parse(&["steve"], &Nobody).unwrap();

        assert!(result.contains("target"));
        assert!(!result.contains("minutes"));
        assert!(!result.contains("reason"));
        assert!(!result.contains("silent"));
    }

    #[test]
    fn token_counts_are_checked_before_matching() {
        let signature = mute_signature();

        assert_eq!(
            signature.parse(&[], &Nobody).err(),
            Some(ParseError::NotEnoughArguments {
                required: 1,
                given: 0
            })
        );

        let no_greedy = Signature::builder()
            .arg(Arg::new("count", IntParser))
            .build();

        assert_eq!(
            no_greedy.parse(&["1", "2"], &Nobody).err(),
            Some(ParseError::TooManyArguments { limit: 1, given: 2 })
        );
    }

    #[test]
    fn parse_failures_name_the_descriptor_and_type() {
        let signature = mute_signature();

        assert_eq!(
            signature.parse(&["steve", "soon"], &Nobody).err(),
            Some(ParseError::InvalidValue {
                name: "minutes".to_owned(),
                type_name: "integer",
                message: "'soon' is not a valid integer".to_owned(),
            })
        );
    }

    #[test]
    fn validation_failures_abort_like_parse_failures() {
        let signature = mute_signature();

        assert_eq!(
            signature.parse(&["steve", "99999"], &Nobody).err(),
            Some(ParseError::InvalidValue {
                name: "minutes".to_owned(),
                type_name: "integer",
                message: "must be at most 1440, got 99999".to_owned(),
            })
        );
    }

    #[test]
    fn access_denial_short_circuits_before_later_descriptors() {
        let touched = Arc::new(AtomicBool::new(false));
        let probe = Arc::clone(&touched);

        let signature = Signature::builder()
            .arg(Arg::new("gated", StringParser).with_access(Access::guarded(|_| false)))
            .arg(
                Arg::new("count", IntParser).with_spec(
                    ArgumentSpec::builder()
                        .validator(validator::<i32>(move |_| {
                            probe.store(true, Ordering::SeqCst);
                            None
                        }))
                        .build(),
                ),
            )
            .build();

        // the second token wouldn't parse as an integer, but access denial
        // on the first descriptor wins
        assert_eq!(
            signature.parse(&["anything", "not-a-number"], &Nobody).err(),
            Some(ParseError::AccessDenied {
                name: "gated".to_owned()
            })
        );
        assert!(!touched.load(Ordering::SeqCst));
    }

    #[test]
    fn guard_denial_beats_everything() {
        let signature = Signature::builder()
            .arg(Arg::new("count", IntParser))
            .guard(Access::guarded(|_| false))
            .build();

        assert_eq!(
            signature.parse(&["nope"], &Nobody).err(),
            Some(ParseError::GuardDenied)
        );
    }

    #[test]
    fn greedy_round_trip() {
        let signature = Signature::builder()
            .arg(Arg::new("message", StringParser).greedy())
            .build();

        let result = signature.parse(&["a", "b", "c"], &Nobody).unwrap();
        assert_eq!(result.get::<String>("message").map(String::as_str), Some("a b c"));
    }

    #[test]
    fn conditions_skip_without_consuming() {
        let signature = Signature::builder()
            .arg(Arg::new("broadcast", BoolParser))
            .arg(
                Arg::new("audience", StringParser).with_spec(
                    ArgumentSpec::builder()
                        .optional(true)
                        .condition(|parsed| parsed.get::<bool>("broadcast") == Some(&true))
                        .default_value("everyone".to_owned())
                        .build(),
                ),
            )
            .arg(Arg::new("message", StringParser).optional(true).greedy())
            .build();

        // broadcast=false skips `audience`; its default still lands, and the
        // remaining tokens flow to the greedy message
        let result = signature.parse(&["false", "hello", "there"], &Nobody).unwrap();
        assert_eq!(
            result.get::<String>("audience").map(String::as_str),
            Some("everyone")
        );
        assert_eq!(
            result.get::<String>("message").map(String::as_str),
            Some("hello there")
        );

        let result = signature.parse(&["true", "admins", "hi"], &Nobody).unwrap();
        assert_eq!(
            result.get::<String>("audience").map(String::as_str),
            Some("admins")
        );
        assert_eq!(result.get::<String>("message").map(String::as_str), Some("hi"));
    }

    #[test]
    fn transforms_apply_after_validation() {
        let signature = Signature::builder()
            .arg(
                Arg::new("name", StringParser).with_spec(
                    ArgumentSpec::builder()
                        .min_length(2)
                        .transform(transform::<String>(|name| name.to_uppercase()))
                        .build(),
                ),
            )
            .build();

        let result = signature.parse(&["steve"], &Nobody).unwrap();
        assert_eq!(result.get::<String>("name").map(String::as_str), Some("STEVE"));
    }

    #[test]
    fn multiple_key_values_collect() {
        let signature = Signature::builder()
            .key_value(KeyValue::new("tag", StringParser).multiple())
            .build();

        let result = signature
            .parse(&["tag:a", "--tag=b", "--tag", "c"], &Nobody)
            .unwrap();

        let tags = result.get::<Vec<BoxedValue>>("tag").unwrap();
        let tags: Vec<&str> = tags
            .iter()
            .map(|tag| tag.downcast_ref::<String>().unwrap().as_str())
            .collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }
}
