//! Data directory resolution.
//!
//! Span traces are written under a per-user data directory:
//!
//! 1. the configured `data_dir`, with a leading `~` expanded,
//! 2. otherwise `$XDG_DATA_HOME/notesync`,
//! 3. otherwise `$HOME/.local/share/notesync`.

use std::path::PathBuf;

const APP_DIR: &str = "notesync";

/// Resolves the data directory from the process environment.
///
/// Returns `None` when neither an override nor `HOME`/`XDG_DATA_HOME` is available.
#[must_use]
pub fn get_data_dir(configured: Option<&str>) -> Option<PathBuf> {
    resolve_data_dir(configured, |key| std::env::var(key).ok())
}

/// Resolves the data directory with an injectable environment lookup.
///
/// # Examples
///
/// ```
/// use notesync::infrastructure::resolve_data_dir;
/// use std::path::PathBuf;
///
/// let env = |key: &str| (key == "HOME").then(|| "/home/ada".to_string());
/// assert_eq!(
///     resolve_data_dir(None, env),
///     Some(PathBuf::from("/home/ada/.local/share/notesync"))
/// );
/// assert_eq!(
///     resolve_data_dir(Some("~/notes"), env),
///     Some(PathBuf::from("/home/ada/notes"))
/// );
/// ```
pub fn resolve_data_dir(
    configured: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    let home = env("HOME").filter(|h| !h.is_empty());

    if let Some(dir) = configured.map(str::trim).filter(|d| !d.is_empty()) {
        return expand_tilde(dir, home.as_deref()).map(PathBuf::from);
    }

    if let Some(xdg) = env("XDG_DATA_HOME").filter(|x| !x.is_empty()) {
        return Some(PathBuf::from(xdg).join(APP_DIR));
    }

    home.map(|h| PathBuf::from(h).join(".local").join("share").join(APP_DIR))
}

/// Expands a leading `~` to `home`. Returns `None` if the path needs a home
/// directory and none is known.
///
/// # Examples
///
/// ```
/// use notesync::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("~/notes", Some("/home/ada")).as_deref(), Some("/home/ada/notes"));
/// assert_eq!(expand_tilde("~", Some("/home/ada")).as_deref(), Some("/home/ada"));
/// assert_eq!(expand_tilde("/var/lib/notes", None).as_deref(), Some("/var/lib/notes"));
/// assert_eq!(expand_tilde("~/notes", None), None);
/// ```
#[must_use]
pub fn expand_tilde(path: &str, home: Option<&str>) -> Option<String> {
    match path.strip_prefix('~') {
        Some("") => home.map(String::from),
        Some(rest) if rest.starts_with('/') => home.map(|h| format!("{h}{rest}")),
        _ => Some(path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_wins_over_home() {
        let env = |key: &str| match key {
            "HOME" => Some("/home/ada".to_string()),
            "XDG_DATA_HOME" => Some("/data".to_string()),
            _ => None,
        };
        assert_eq!(resolve_data_dir(None, env), Some(PathBuf::from("/data/notesync")));
    }

    #[test]
    fn nothing_to_resolve_from() {
        assert_eq!(resolve_data_dir(None, |_| None), None);
        assert_eq!(resolve_data_dir(Some("  "), |_| None), None);
        assert_eq!(
            resolve_data_dir(Some("/srv/notes"), |_| None),
            Some(PathBuf::from("/srv/notes"))
        );
    }

    #[test]
    fn tilde_user_paths_are_left_alone() {
        assert_eq!(expand_tilde("~bob/x", Some("/home/ada")).as_deref(), Some("~bob/x"));
    }
}
