/*!
The post-parse validation pipeline.

Checks run in a fixed order and the first failure wins: numeric range, then
string length, then string pattern, then each custom validator in
registration order. The ordering is deliberate: the structural checks are
cheap, while custom validators are arbitrary user code.
*/

use crate::arguments::BoxedValue;
use crate::spec::ArgumentSpec;

/// Run the pipeline for one parsed value. Returns the first error, or `None`
/// for a valid value.
pub(crate) fn run(spec: &ArgumentSpec, value: &BoxedValue) -> Option<String> {
    if let Some(error) = numeric_range(spec, value) {
        return Some(error);
    }

    if let Some(text) = string_value(value) {
        if let Some(min) = spec.min_length {
            let length = text.chars().count();
            if length < min {
                return Some(format!("must be at least {min} character(s), got {length}"));
            }
        }

        if let Some(max) = spec.max_length {
            let length = text.chars().count();
            if length > max {
                return Some(format!("must be at most {max} character(s), got {length}"));
            }
        }

        if let Some(ref pattern) = spec.pattern {
            if !pattern.is_match(text) {
                return Some(format!("'{text}' does not match {}", pattern.as_str()));
            }
        }
    }

    spec.validators
        .iter()
        .find_map(|validator| validator(value))
}

fn numeric_range(spec: &ArgumentSpec, value: &BoxedValue) -> Option<String> {
    if let Some(int) = int_value(value) {
        if let Some(min) = spec.min_int {
            if int < min {
                return Some(format!("must be at least {min}, got {int}"));
            }
        }
        if let Some(max) = spec.max_int {
            if int > max {
                return Some(format!("must be at most {max}, got {int}"));
            }
        }
    }

    if let Some(float) = float_value(value) {
        if let Some(min) = spec.min_float {
            if float < min {
                return Some(format!("must be at least {min}, got {float}"));
            }
        }
        if let Some(max) = spec.max_float {
            if float > max {
                return Some(format!("must be at most {max}, got {float}"));
            }
        }
    }

    None
}

fn int_value(value: &BoxedValue) -> Option<i64> {
    value
        .downcast_ref::<i64>()
        .copied()
        .or_else(|| value.downcast_ref::<i32>().map(|&n| i64::from(n)))
}

fn float_value(value: &BoxedValue) -> Option<f64> {
    value
        .downcast_ref::<f64>()
        .copied()
        .or_else(|| value.downcast_ref::<f32>().map(|&n| f64::from(n)))
}

fn string_value(value: &BoxedValue) -> Option<&str> {
    value.downcast_ref::<String>().map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::arguments::BoxedValue;
    use crate::spec::{ArgumentSpec, validator};

    #[test]
    fn range_checks_apply_to_the_runtime_type() {
        let spec = ArgumentSpec::builder().min_int(1).max_int(10).build();

        let ok: BoxedValue = Box::new(5_i32);
        assert_eq!(run(&spec, &ok), None);

        let low: BoxedValue = Box::new(0_i32);
        assert_eq!(run(&spec, &low), Some("must be at least 1, got 0".to_string()));

        // a string sails past numeric bounds
        let text: BoxedValue = Box::new(String::from("hello"));
        assert_eq!(run(&spec, &text), None);
    }

    #[test]
    fn length_then_pattern() {
        let spec = ArgumentSpec::builder()
            .min_length(3)
            .pattern("^[a-z]+$")
            .build();

        let short: BoxedValue = Box::new(String::from("ab"));
        assert_eq!(
            run(&spec, &short),
            Some("must be at least 3 character(s), got 2".to_string())
        );

        let unmatched: BoxedValue = Box::new(String::from("abc123"));
        assert_eq!(
            run(&spec, &unmatched),
            Some("'abc123' does not match ^[a-z]+$".to_string())
        );
    }

    #[test]
    fn range_failure_wins_over_custom_validators() {
        let spec = ArgumentSpec::builder()
            .max_int(10)
            .validator(validator::<i32>(|_| Some("custom says no".to_string())))
            .build();

        let value: BoxedValue = Box::new(99_i32);
        assert_eq!(run(&spec, &value), Some("must be at most 10, got 99".to_string()));
    }

    #[test]
    fn custom_validators_run_in_registration_order() {
        let spec = ArgumentSpec::builder()
            .validator(validator::<i32>(|&n| {
                (n % 2 != 0).then(|| "must be even".to_string())
            }))
            .validator(validator::<i32>(|&n| {
                (n < 0).then(|| "must be positive".to_string())
            }))
            .build();

        let value: BoxedValue = Box::new(-3_i32);
        assert_eq!(run(&spec, &value), Some("must be even".to_string()));

        let value: BoxedValue = Box::new(-2_i32);
        assert_eq!(run(&spec, &value), Some("must be positive".to_string()));

        let value: BoxedValue = Box::new(2_i32);
        assert_eq!(run(&spec, &value), None);
    }
}
