//! Template helpers and per-request context values.
//!
//! Helpers are tera functions called with named arguments:
//!
//! ```text
//! {{ text(key="nav.home") }}
//! {% if starts_with(s=current_path, prefix="/blog") %}...{% endif %}
//! {{ replace_pattern(s=current_path, pattern="^/(en|es)", new="") }}
//! ```

use crate::manifest::TranslationTable;
use regex::Regex;
use std::{collections::HashMap, sync::Arc};
use tera::{Tera, Value};

/// Register every helper on `tera`; `text` looks keys up in `lang`.
pub fn register_helpers(tera: &mut Tera, translations: Arc<TranslationTable>, lang: &str) {
    let lang = lang.to_owned();
    tera.register_function(
        "text",
        move |args: &HashMap<String, Value>| -> tera::Result<Value> {
            let key = str_arg(args, "text", "key")?;
            Ok(Value::String(translations.lookup(&lang, key).to_owned()))
        },
    );
    tera.register_function("starts_with", tmpl_starts_with);
    tera.register_function("matches", tmpl_matches);
    tera.register_function("replace", tmpl_replace);
    tera.register_function("replace_all", tmpl_replace_all);
    tera.register_function("replace_pattern", tmpl_replace_pattern);
}

fn tmpl_starts_with(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = str_arg(args, "starts_with", "s")?;
    let prefix = str_arg(args, "starts_with", "prefix")?;
    Ok(Value::Bool(s.starts_with(prefix)))
}

fn tmpl_matches(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = str_arg(args, "matches", "s")?;
    let re = pattern_arg(args, "matches")?;
    Ok(Value::Bool(re.is_match(s)))
}

/// First occurrence only
fn tmpl_replace(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = str_arg(args, "replace", "s")?;
    let old = str_arg(args, "replace", "old")?;
    let new = str_arg(args, "replace", "new")?;
    Ok(Value::String(s.replacen(old, new, 1)))
}

fn tmpl_replace_all(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = str_arg(args, "replace_all", "s")?;
    let old = str_arg(args, "replace_all", "old")?;
    let new = str_arg(args, "replace_all", "new")?;
    Ok(Value::String(s.replace(old, new)))
}

fn tmpl_replace_pattern(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = str_arg(args, "replace_pattern", "s")?;
    let re = pattern_arg(args, "replace_pattern")?;
    let new = str_arg(args, "replace_pattern", "new")?;
    Ok(Value::String(re.replace_all(s, new).into_owned()))
}

fn str_arg<'a>(
    args: &'a HashMap<String, Value>,
    function: &str,
    name: &str,
) -> tera::Result<&'a str> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(tera::Error::msg(format!(
            "`{function}`: argument `{name}` must be a string, got `{other}`"
        ))),
        None => Err(tera::Error::msg(format!(
            "`{function}`: missing argument `{name}`"
        ))),
    }
}

fn pattern_arg(args: &HashMap<String, Value>, function: &str) -> tera::Result<Regex> {
    let pattern = str_arg(args, function, "pattern")?;
    Regex::new(pattern)
        .map_err(|err| tera::Error::msg(format!("`{function}`: invalid pattern: {err}")))
}

/// Canonical URL of `path` in `lang`: the language prefix is always present,
/// whether or not the request carried one.
pub fn canonical_url(origin: &str, lang: &str, path: &str) -> String {
    let rest = match path.strip_prefix('/').and_then(|p| p.strip_prefix(lang)) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    };
    format!("{origin}/{lang}{rest}")
}
