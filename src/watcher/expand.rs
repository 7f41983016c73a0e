//! Environment-variable expansion for configured directory paths.
//!
//! Accepts the Windows `%VAR%` form used by the default journal location as
//! well as POSIX `$VAR` and `${VAR}`. Unknown variables are left untouched.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn env_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"%([^%\s]+)%|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .unwrap_or_else(|e| unreachable!("static regex is valid: {e}"))
    })
}

/// Expand environment variables in `input` using the process environment.
///
/// # Examples
///
/// ```
/// use journal_translator::watcher::expand_env_vars;
///
/// assert_eq!(expand_env_vars("no vars here"), "no vars here");
/// ```
#[must_use]
pub fn expand_env_vars(input: &str) -> String {
    expand_with(input, |name| {
        std::env::var(name)
            .ok()
            .or_else(|| std::env::var(name.to_uppercase()).ok())
    })
}

/// Expand variables in `input` using a custom lookup.
pub fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_var_regex()
        .replace_all(input, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            lookup(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Expand a configured directory string into a path.
#[must_use]
pub fn expand_dir(input: &str) -> PathBuf {
    PathBuf::from(expand_env_vars(input))
}
