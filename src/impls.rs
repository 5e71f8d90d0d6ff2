/*!
Implementations of [`ArgumentParser`] for the built-in argument types:
integers, longs, floats, doubles, booleans, UUIDs, raw strings, durations,
alias-to-value choice maps, enumerations with alias tables, and
first-match-wins unions of other parsers.
*/

use core::fmt::{self, Display};
use core::time::Duration;

use crate::access::Caller;
use crate::arguments::BoxedValue;
use crate::outcome::ParseOutcome;
use crate::parser::{AnyParser, ArcParser, ArgumentParser};

macro_rules! numeric {
    ($(
        $(#[$doc:meta])*
        $name:ident: $type:ty => $label:literal,
    )*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl ArgumentParser for $name {
                type Output = $type;

                fn parse(&self, token: &str, _caller: &dyn Caller) -> ParseOutcome<$type> {
                    match token.parse() {
                        Ok(value) => ParseOutcome::success(value),
                        Err(_) => ParseOutcome::error(format_args!(
                            "'{token}' is not a valid {}", $label
                        )),
                    }
                }

                fn type_name(&self) -> &'static str {
                    $label
                }
            }
        )*
    };
}

numeric! {
    /// Parses 32-bit signed integers.
    IntParser: i32 => "integer",
    /// Parses 64-bit signed integers.
    LongParser: i64 => "long",
    /// Parses 32-bit floating point numbers.
    FloatParser: f32 => "float",
    /// Parses 64-bit floating point numbers.
    DoubleParser: f64 => "double",
}

/// Parses booleans, accepting `true`/`false`, `yes`/`no`, and `on`/`off`
/// case-insensitively. Completes to `true`/`false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolParser;

impl ArgumentParser for BoolParser {
    type Output = bool;

    fn parse(&self, token: &str, _caller: &dyn Caller) -> ParseOutcome<bool> {
        match token.to_lowercase().as_str() {
            "true" | "yes" | "on" => ParseOutcome::success(true),
            "false" | "no" | "off" => ParseOutcome::success(false),
            _ => ParseOutcome::error(format_args!("'{token}' is not a valid boolean")),
        }
    }

    fn complete(&self, prefix: &str, _caller: &dyn Caller) -> Vec<String> {
        prefix_filter(["true", "false"], prefix)
    }

    fn type_name(&self) -> &'static str {
        "boolean"
    }
}

/// Passes the token through untouched. The only parser legal for greedy
/// arguments, whose joined remainder is inherently a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringParser;

impl ArgumentParser for StringParser {
    type Output = String;

    fn parse(&self, token: &str, _caller: &dyn Caller) -> ParseOutcome<String> {
        ParseOutcome::success(token.to_owned())
    }

    fn type_name(&self) -> &'static str {
        "string"
    }
}

/// A 128-bit UUID, parsed from the canonical hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uuid(u128);

impl Uuid {
    #[must_use]
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    fn parse(token: &str) -> Option<Self> {
        // canonical 8-4-4-4-12 grouping
        let bytes = token.as_bytes();
        if bytes.len() != 36 {
            return None;
        }

        let mut value: u128 = 0;
        for (index, &byte) in bytes.iter().enumerate() {
            match index {
                8 | 13 | 18 | 23 => {
                    if byte != b'-' {
                        return None;
                    }
                }
                _ => {
                    let digit = (byte as char).to_digit(16)?;
                    value = (value << 4) | u128::from(digit);
                }
            }
        }

        Some(Self(value))
    }
}

impl Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) & 0xffff_ffff,
            (v >> 80) & 0xffff,
            (v >> 64) & 0xffff,
            (v >> 48) & 0xffff,
            v & 0xffff_ffff_ffff,
        )
    }
}

/// Parses canonical hyphenated UUIDs into [`Uuid`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidParser;

impl ArgumentParser for UuidParser {
    type Output = Uuid;

    fn parse(&self, token: &str, _caller: &dyn Caller) -> ParseOutcome<Uuid> {
        match Uuid::parse(token) {
            Some(uuid) => ParseOutcome::success(uuid),
            None => ParseOutcome::error(format_args!("'{token}' is not a valid uuid")),
        }
    }

    fn type_name(&self) -> &'static str {
        "uuid"
    }
}

/**
Parses duration strings into [`Duration`].

Accepts one or more `<count><unit>` segments where the unit is one of `d`,
`h`, `m`, `s`, or `ms`, such as `90s`, `2h30m`, `1d12h`, or `250ms`. A bare
integer with no unit is a count of seconds.
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationParser;

impl DurationParser {
    fn parse_millis(token: &str) -> Option<u64> {
        if token.is_empty() {
            return None;
        }

        // bare seconds
        if let Ok(seconds) = token.parse::<u64>() {
            return seconds.checked_mul(1000);
        }

        let mut total: u64 = 0;
        let mut rest = token;

        while !rest.is_empty() {
            let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits == 0 {
                return None;
            }

            let count: u64 = rest[..digits].parse().ok()?;
            rest = &rest[digits..];

            let (scale, width) = if let Some(tail) = rest.strip_prefix("ms") {
                rest = tail;
                (1, 0)
            } else {
                let scale = match rest.as_bytes().first()? {
                    b's' => 1_000,
                    b'm' => 60_000,
                    b'h' => 3_600_000,
                    b'd' => 86_400_000,
                    _ => return None,
                };
                (scale, 1)
            };

            rest = &rest[width..];
            total = total.checked_add(count.checked_mul(scale)?)?;
        }

        Some(total)
    }
}

impl ArgumentParser for DurationParser {
    type Output = Duration;

    fn parse(&self, token: &str, _caller: &dyn Caller) -> ParseOutcome<Duration> {
        match Self::parse_millis(token) {
            Some(millis) => ParseOutcome::success(Duration::from_millis(millis)),
            None => ParseOutcome::error(format_args!("'{token}' is not a valid duration")),
        }
    }

    fn type_name(&self) -> &'static str {
        "duration"
    }
}

/**
A fixed alias-to-value map: each alias parses, case-insensitively, to a clone
of its bound value. Completes from the alias table.
*/
#[derive(Clone)]
pub struct ChoiceParser<T> {
    type_name: &'static str,
    choices: Vec<(String, T)>,
}

impl<T: Clone + Send + Sync + 'static> ChoiceParser<T> {
    #[must_use]
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            choices: Vec::new(),
        }
    }

    /// This parser, but also mapping `alias` to `value`.
    #[must_use]
    pub fn choice(mut self, alias: impl Into<String>, value: T) -> Self {
        self.choices.push((alias.into(), value));
        self
    }
}

impl<T: Clone + Send + Sync + 'static> ArgumentParser for ChoiceParser<T> {
    type Output = T;

    fn parse(&self, token: &str, _caller: &dyn Caller) -> ParseOutcome<T> {
        match self
            .choices
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(token))
        {
            Some((_, value)) => ParseOutcome::success(value.clone()),
            None => ParseOutcome::error(format_args!(
                "'{token}' is not one of: {}",
                join_names(self.choices.iter().map(|(alias, _)| alias.as_str()))
            )),
        }
    }

    fn complete(&self, prefix: &str, _caller: &dyn Caller) -> Vec<String> {
        prefix_filter(self.choices.iter().map(|(alias, _)| alias.as_str()), prefix)
    }

    fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/**
An enumeration parser: canonical variant names, each with an optional alias
table. Aliases parse like the canonical name does, but only canonical names
are offered as completions.
*/
#[derive(Clone)]
pub struct EnumParser<T> {
    type_name: &'static str,
    variants: Vec<Variant<T>>,
}

#[derive(Clone)]
struct Variant<T> {
    name: String,
    aliases: Vec<String>,
    value: T,
}

impl<T: Clone + Send + Sync + 'static> EnumParser<T> {
    #[must_use]
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            variants: Vec::new(),
        }
    }

    /// This parser, but with an additional variant.
    #[must_use]
    pub fn variant(mut self, name: impl Into<String>, value: T) -> Self {
        self.variants.push(Variant {
            name: name.into(),
            aliases: Vec::new(),
            value,
        });
        self
    }

    /**
    Add an alias to the most recently added variant.

    # Panics

    Panics if no variant has been added yet.
    */
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        match self.variants.last_mut() {
            Some(variant) => variant.aliases.push(alias.into()),
            None => panic!("alias added before any variant"),
        }
        self
    }
}

impl<T: Clone + Send + Sync + 'static> ArgumentParser for EnumParser<T> {
    type Output = T;

    fn parse(&self, token: &str, _caller: &dyn Caller) -> ParseOutcome<T> {
        let found = self.variants.iter().find(|variant| {
            variant.name.eq_ignore_ascii_case(token)
                || variant
                    .aliases
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(token))
        });

        match found {
            Some(variant) => ParseOutcome::success(variant.value.clone()),
            None => ParseOutcome::error(format_args!(
                "'{token}' is not one of: {}",
                join_names(self.variants.iter().map(|variant| variant.name.as_str()))
            )),
        }
    }

    fn complete(&self, prefix: &str, _caller: &dyn Caller) -> Vec<String> {
        prefix_filter(
            self.variants.iter().map(|variant| variant.name.as_str()),
            prefix,
        )
    }

    fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/**
A first-match-wins union of parsers: the token is offered to each child in
order, and the first success wins. Because the children may produce different
output types, the union's output is the erased [`BoxedValue`], so it
implements [`AnyParser`] directly rather than [`ArgumentParser`].

# Panics

Construction panics on an empty parser list.
*/
pub struct FirstMatchParser {
    type_name: &'static str,
    parsers: Vec<ArcParser>,
}

impl FirstMatchParser {
    #[must_use]
    pub fn new(type_name: &'static str, parsers: impl IntoIterator<Item = ArcParser>) -> Self {
        let parsers: Vec<ArcParser> = parsers.into_iter().collect();
        assert!(!parsers.is_empty(), "a union of no parsers can never match");

        Self { type_name, parsers }
    }

    /// Share this union as an [`ArcParser`], ready to bind to a descriptor.
    #[must_use]
    pub fn share(self) -> ArcParser {
        std::sync::Arc::new(self)
    }
}

impl AnyParser for FirstMatchParser {
    fn parse_erased(&self, token: &str, caller: &dyn Caller) -> ParseOutcome<BoxedValue> {
        for parser in &self.parsers {
            let outcome = parser.parse_erased(token, caller);
            if outcome.is_success() {
                return outcome;
            }
        }

        ParseOutcome::error(format_args!(
            "'{token}' is not a valid {}",
            join_names(self.parsers.iter().map(|parser| parser.type_name()))
        ))
    }

    fn complete(&self, prefix: &str, caller: &dyn Caller) -> Vec<String> {
        let mut suggestions = Vec::new();

        for parser in &self.parsers {
            for suggestion in parser.complete(prefix, caller) {
                if !suggestions.contains(&suggestion) {
                    suggestions.push(suggestion);
                }
            }
        }

        suggestions
    }

    fn type_name(&self) -> &'static str {
        self.type_name
    }
}

fn prefix_filter<'a>(
    candidates: impl IntoIterator<Item = &'a str>,
    prefix: &str,
) -> Vec<String> {
    let prefix = prefix.to_lowercase();

    candidates
        .into_iter()
        .filter(|candidate| candidate.to_lowercase().starts_with(&prefix))
        .map(str::to_owned)
        .collect()
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;
    use crate::access::Caller;
    use crate::parser::erase;

    struct Nobody;
    impl Caller for Nobody {}

    #[test]
    fn numeric_parsers() {
        assert_eq!(IntParser.parse("42", &Nobody), ParseOutcome::success(42));
        assert_eq!(
            LongParser.parse("-7", &Nobody),
            ParseOutcome::success(-7_i64)
        );
        assert!(!IntParser.parse("4.2", &Nobody).is_success());
        assert_eq!(
            IntParser.parse("forty", &Nobody).error_message(),
            Some("'forty' is not a valid integer")
        );
        assert_eq!(
            DoubleParser.parse("2.5", &Nobody),
            ParseOutcome::success(2.5_f64)
        );
    }

    #[test]
    fn bool_parser_accepts_spellings() {
        for token in ["true", "YES", "on"] {
            assert_eq!(BoolParser.parse(token, &Nobody), ParseOutcome::success(true));
        }
        for token in ["false", "No", "OFF"] {
            assert_eq!(BoolParser.parse(token, &Nobody), ParseOutcome::success(false));
        }
        assert!(!BoolParser.parse("maybe", &Nobody).is_success());

        // the blanket erased impl also offers `complete`, so the typed trait
        // must be named explicitly
        assert_eq!(
            ArgumentParser::complete(&BoolParser, "t", &Nobody),
            vec!["true".to_string()]
        );
    }

    #[test]
    fn uuid_round_trip() {
        let text = "123e4567-e89b-12d3-a456-426614174000";
        let outcome = UuidParser.parse(text, &Nobody);
        let uuid = outcome.into_result().unwrap().unwrap();
        assert_eq!(uuid.to_string(), text);

        assert!(!UuidParser.parse("123e4567", &Nobody).is_success());
        assert!(
            !UuidParser
                .parse("123e4567-e89b-12d3-a456-42661417400z", &Nobody)
                .is_success()
        );
    }

    #[test]
    fn duration_segments() {
        let parse = |token| {
            DurationParser
                .parse(token, &Nobody)
                .into_result()
                .unwrap()
                .unwrap()
        };

        assert_eq!(parse("90s"), Duration::from_secs(90));
        assert_eq!(parse("2h30m"), Duration::from_secs(2 * 3600 + 30 * 60));
        assert_eq!(parse("1d12h"), Duration::from_secs(36 * 3600));
        assert_eq!(parse("250ms"), Duration::from_millis(250));
        assert_eq!(parse("45"), Duration::from_secs(45));

        assert!(!DurationParser.parse("h", &Nobody).is_success());
        assert!(!DurationParser.parse("10y", &Nobody).is_success());
        assert!(!DurationParser.parse("", &Nobody).is_success());
    }

    #[test]
    fn choice_is_case_insensitive_and_completes() {
        let parser = ChoiceParser::new("gamemode")
            .choice("survival", 0)
            .choice("creative", 1);

        assert_eq!(parser.parse("SURVIVAL", &Nobody), ParseOutcome::success(0));
        assert_eq!(
            parser.parse("spectator", &Nobody).error_message(),
            Some("'spectator' is not one of: survival, creative")
        );
        assert_eq!(
            ArgumentParser::complete(&parser, "c", &Nobody),
            vec!["creative".to_string()]
        );
    }

    #[test]
    fn enum_aliases_parse_but_do_not_complete() {
        let parser = EnumParser::new("difficulty")
            .variant("peaceful", 0)
            .alias("p")
            .variant("hard", 3);

        assert_eq!(parser.parse("p", &Nobody), ParseOutcome::success(0));
        assert_eq!(parser.parse("HARD", &Nobody), ParseOutcome::success(3));
        assert_eq!(
            ArgumentParser::complete(&parser, "", &Nobody),
            vec!["peaceful".to_string(), "hard".to_string()]
        );
    }

    #[test]
    fn first_match_wins() {
        let union =
            FirstMatchParser::new("integer or string", [erase(IntParser), erase(StringParser)]);

        let as_int = union.parse_erased("42", &Nobody).into_result().unwrap().unwrap();
        assert_eq!(as_int.downcast_ref::<i32>(), Some(&42));

        let as_string = union
            .parse_erased("forty", &Nobody)
            .into_result()
            .unwrap()
            .unwrap();
        assert_eq!(
            as_string.downcast_ref::<String>().map(String::as_str),
            Some("forty")
        );
    }

    #[test]
    #[should_panic(expected = "union of no parsers")]
    fn empty_union_fails_fast() {
        let _ = FirstMatchParser::new("nothing", []);
    }
}
