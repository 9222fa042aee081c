//! Builtin `{{$...}}` variables.
//!
//! Identifiers beginning with `$` are generated at resolution time instead of
//! being looked up in a namespace: `{{$guid}}`, `{{$timestamp -1 d}}`,
//! `{{$datetime iso8601}}`, `{{$randomInt 1 100}}`, `{{$processEnv NAME}}`.

use super::error::ResolveError;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng;
use std::env;
use uuid::Uuid;

/// Resolves a builtin variable reference.
///
/// `name` is the full identifier including the `$` prefix and any arguments,
/// e.g. `"$randomInt 1 100"`. `template` is carried for error context.
pub fn resolve_builtin(name: &str, template: &str) -> Result<String, ResolveError> {
    let parts: Vec<&str> = name.split_whitespace().collect();
    let var_name = match parts.first() {
        Some(first) => *first,
        None => {
            return Err(ResolveError::InvalidBuiltin(
                "empty builtin variable name".to_string(),
            ))
        }
    };
    let args = &parts[1..];

    match var_name.trim_start_matches('$') {
        "guid" => Ok(Uuid::new_v4().to_string()),
        "timestamp" => resolve_timestamp(args),
        "datetime" => resolve_datetime(args),
        "randomInt" => resolve_random_int(args),
        "processEnv" => resolve_process_env(args),
        _ => Err(ResolveError::UnresolvedVariable {
            name: name.to_string(),
            template: template.to_string(),
        }),
    }
}

/// Current Unix timestamp in seconds, with an optional `±n unit` offset.
fn resolve_timestamp(args: &[&str]) -> Result<String, ResolveError> {
    let now = Utc::now();

    if args.is_empty() {
        return Ok(now.timestamp().to_string());
    }

    let datetime = apply_offset(now, args)?;
    Ok(datetime.timestamp().to_string())
}

/// Formatted datetime: `{{$datetime iso8601}}` or `{{$datetime rfc1123}}`,
/// with an optional trailing offset.
fn resolve_datetime(args: &[&str]) -> Result<String, ResolveError> {
    let format = args.first().ok_or_else(|| {
        ResolveError::InvalidBuiltin(
            "datetime requires a format argument (rfc1123 or iso8601)".to_string(),
        )
    })?;

    let now = Utc::now();
    let datetime = if args.len() > 1 {
        apply_offset(now, &args[1..])?
    } else {
        now
    };

    match *format {
        "rfc1123" => Ok(datetime.to_rfc2822()),
        "iso8601" => Ok(datetime.to_rfc3339_opts(SecondsFormat::Millis, true)),
        other => Err(ResolveError::InvalidBuiltin(format!(
            "unknown datetime format '{}'. Use 'rfc1123' or 'iso8601'",
            other
        ))),
    }
}

/// Applies a `[±]number unit` offset where unit is s, m, h, or d.
fn apply_offset(base: DateTime<Utc>, args: &[&str]) -> Result<DateTime<Utc>, ResolveError> {
    if args.len() < 2 {
        return Err(ResolveError::InvalidBuiltin(
            "offset requires a number and a unit (e.g. '-1 d' or '+2 h')".to_string(),
        ));
    }

    let number: i64 = args[0].parse().map_err(|_| {
        ResolveError::InvalidBuiltin(format!("invalid offset number: '{}'", args[0]))
    })?;

    let duration = match args[1] {
        "s" => Duration::seconds(number),
        "m" => Duration::minutes(number),
        "h" => Duration::hours(number),
        "d" => Duration::days(number),
        unit => {
            return Err(ResolveError::InvalidBuiltin(format!(
                "invalid offset unit '{}'. Use 's', 'm', 'h', or 'd'",
                unit
            )))
        }
    };

    Ok(base + duration)
}

/// Random integer in an inclusive range: `{{$randomInt min max}}`.
fn resolve_random_int(args: &[&str]) -> Result<String, ResolveError> {
    if args.len() < 2 {
        return Err(ResolveError::InvalidBuiltin(
            "randomInt requires min and max arguments".to_string(),
        ));
    }

    let min: i64 = args[0]
        .parse()
        .map_err(|_| ResolveError::InvalidBuiltin(format!("invalid min value: '{}'", args[0])))?;
    let max: i64 = args[1]
        .parse()
        .map_err(|_| ResolveError::InvalidBuiltin(format!("invalid max value: '{}'", args[1])))?;

    if min > max {
        return Err(ResolveError::InvalidBuiltin(format!(
            "min ({}) cannot be greater than max ({})",
            min, max
        )));
    }

    let value = rand::thread_rng().gen_range(min..=max);
    Ok(value.to_string())
}

/// Process environment variable: `{{$processEnv NAME}}` errors when unset,
/// `{{$processEnv %NAME}}` substitutes an empty string instead.
fn resolve_process_env(args: &[&str]) -> Result<String, ResolveError> {
    let var_name = args.first().ok_or_else(|| {
        ResolveError::InvalidBuiltin("processEnv requires a variable name".to_string())
    })?;

    let (is_optional, clean_name) = match var_name.strip_prefix('%') {
        Some(rest) => (true, rest),
        None => (false, *var_name),
    };

    match env::var(clean_name) {
        Ok(value) => Ok(value),
        Err(_) if is_optional => Ok(String::new()),
        Err(_) => Err(ResolveError::InvalidBuiltin(format!(
            "process environment variable '{}' not set",
            clean_name
        ))),
    }
}
