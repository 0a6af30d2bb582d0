//! Unique, readable resource names.
//!
//! Concurrent harnesses in separate workers share the same deployment, so
//! every created resource gets a short random suffix to avoid name
//! collisions while staying greppable in service logs.

use regex::Regex;
use uuid::Uuid;

/// Generate a unique name with the given prefix, e.g. `volume-negative-3f9a1c2e`.
pub fn rand_name(prefix: &str) -> String {
    let short = Uuid::new_v4().to_string().chars().take(8).collect::<String>();
    format!("{}-{}", sanitize(prefix), short)
}

fn sanitize(input: &str) -> String {
    // Lowercase, keep alnum and dashes only; replace invalid with dash
    let re = Regex::new(r"[^a-z0-9-]+").unwrap();
    let lower = input.to_ascii_lowercase().replace('_', "-");
    let cleaned = re.replace_all(&lower, "-");
    // collapse multiple dashes
    let re2 = Regex::new(r"-+").unwrap();
    let collapsed = re2.replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}
