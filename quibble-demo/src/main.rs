use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use quibble::impls::{DurationParser, IntParser, StringParser};
use quibble::{
    Access, Arg, ArgumentSpec, Caller, CallerRef, CompletionCache, Flag, KeyValue, Signature,
    SubRoute,
};

/// The demo's notion of who is typing: a named operator who may or may not
/// hold the moderator bit.
#[derive(Debug)]
struct Operator {
    name: String,
    moderator: bool,
}

impl Caller for Operator {}

fn moderators_only() -> Access {
    Access::guarded(|caller| {
        caller
            .downcast_ref::<Operator>()
            .is_some_and(|operator| operator.moderator)
    })
}

/// A moderation-flavored command: `mute <target> [duration] [reason...]`,
/// with a couple of flags and a key-value thrown in.
fn mute_signature() -> Signature {
    Signature::builder()
        .sub_route(SubRoute::new("mute"))
        .sub_route(SubRoute::new("unmute"))
        .sub_route(SubRoute::new("history").with_access(moderators_only()))
        .arg(
            Arg::new("target", StringParser).with_spec(
                ArgumentSpec::builder()
                    .min_length(2)
                    .completions(["steve", "alex", "herobrine"])
                    .build(),
            ),
        )
        .arg(
            Arg::new("duration", DurationParser).with_spec(
                ArgumentSpec::builder()
                    .optional(true)
                    .default_value(Duration::from_secs(600))
                    .completions(["10m", "1h", "1d"])
                    .build(),
            ),
        )
        .arg(
            Arg::new("reason", StringParser)
                .optional(true)
                .greedy()
                .with_access(moderators_only()),
        )
        .flag(Flag::new("silent").short('s').negatable())
        .key_value(KeyValue::new("strikes", IntParser).with_default(1_i32))
        .guard(Access::open())
        .fuzzy_threshold(30)
        .build()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let signature = mute_signature();
    let operator = Operator {
        name: "console".to_owned(),
        moderator: true,
    };
    println!("acting as {}", operator.name);

    let caller: CallerRef = Arc::new(operator);
    let cache = CompletionCache::default();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let tokens: Vec<&str> = raw.iter().map(String::as_str).collect();

    // Tab-completion preview for whatever was typed so far, then the parse
    // itself. A real host would do one or the other per keystroke.
    let suggestions = signature.complete(&tokens, &caller, &cache).await;
    if !suggestions.is_empty() {
        println!("suggestions: {suggestions:?}");
    }

    // routing is the host's job; the engine only suggests route names
    let tokens = match tokens.split_first() {
        Some((&first, rest)) if ["mute", "unmute", "history"].contains(&first) => rest,
        _ => &tokens[..],
    };

    let arguments = signature
        .parse(tokens, caller.as_ref())
        .with_context(|| format!("parsing {tokens:?}"))?;

    println!("parsed {} argument(s):", arguments.len());
    for name in arguments.names() {
        println!("  {name}");
    }

    if let Some(target) = arguments.get::<String>("target") {
        let duration = arguments
            .get::<Duration>("duration")
            .copied()
            .unwrap_or_default();
        let strikes = arguments.get::<i32>("strikes").copied().unwrap_or(1);
        let silent = arguments.get::<bool>("silent").copied().unwrap_or(false);

        println!(
            "muting {target} for {duration:?} (strike {strikes}{})",
            if silent { ", silently" } else { "" }
        );

        if let Some(reason) = arguments.get::<String>("reason") {
            println!("reason: {reason}");
        }
    }

    Ok(())
}
