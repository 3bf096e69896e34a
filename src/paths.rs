//! Resolving `PathTemplate` strings into concrete RFC 6901 JSON Pointers.
//!
//! A `PathTemplate` is a JSON-Pointer-shaped string that may contain `{expr}` tokens,
//! where `expr` is a dotted expression evaluated against the working context. Escaping
//! of the *substituted* value follows RFC 6901: `~` becomes `~0`, then `/` becomes `~1`
//! — in that order, so a literal `~1` typed by a plan author is never mistaken for an
//! escaped `/`.
use crate::dotted::{get_dotted, stringify};
use serde_json::Value;

/// Escape a single resolved token so it is safe to splice into a JSON Pointer segment.
fn escape_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '~' => out.push_str("~0"),
            '/' => out.push_str("~1"),
            _ => out.push(ch),
        }
    }
    out
}

/// Replace every `{expr}` token in `template` with the string form of `expr` resolved
/// against `ctx`, applying pointer-segment escaping to each substituted value.
///
/// This is the Path Resolver's `toPointer` contract: the result is guaranteed to start
/// with `/` (a leading slash is prepended if the template's substitution did not already
/// produce one).
pub fn to_pointer(template: &str, ctx: &Value) -> String {
    let substituted = substitute(template, ctx, true);
    if substituted.starts_with('/') {
        substituted
    } else {
        let mut out = String::with_capacity(substituted.len() + 1);
        out.push('/');
        out.push_str(&substituted);
        out
    }
}

/// Replace every `{expr}` token in `template` with the string form of `expr` resolved
/// against `ctx`, with **no** pointer escaping. Used for human-readable message strings,
/// never for paths.
pub fn interpolate(template: &str, ctx: &Value) -> String {
    substitute(template, ctx, false)
}

fn substitute(template: &str, ctx: &Value, escape: bool) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let inner = after[..end].trim();
                let rendered = stringify(get_dotted(ctx, inner));
                if escape {
                    out.push_str(&escape_segment(&rendered));
                } else {
                    out.push_str(&rendered);
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated token: no closing brace, keep the rest literal.
                out.push_str(&rest[start..]);
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Dereference a fully-resolved RFC 6901 pointer against `ctx`. Missing paths resolve
/// to `Value::Null`, matching the rest of the engine's nullish-propagation rule.
pub fn pointer_get<'a>(ctx: &'a Value, pointer: &str) -> &'a Value {
    ctx.pointer(pointer).unwrap_or(&Value::Null)
}
