//! Settings-path resolution for the daemon
//!
//! The settings document itself lives in `unison-shared-config`; this module
//! only decides which file to load.

use std::env;
use std::path::PathBuf;

/// Default settings file, relative to the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Environment variable naming the settings file
pub const SETTINGS_ENV_VAR: &str = "UNISON_SETTINGS";

/// Resolve the settings file path
///
/// Precedence: first CLI argument, then `UNISON_SETTINGS`, then
/// `settings.json` in the working directory.
pub fn settings_path() -> PathBuf {
    settings_path_from(env::args().nth(1))
}

fn settings_path_from(cli_arg: Option<String>) -> PathBuf {
    cli_arg
        .or_else(|| env::var(SETTINGS_ENV_VAR).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_argument_wins() {
        temp_env::with_var(SETTINGS_ENV_VAR, Some("/etc/unison/env.json"), || {
            let path = settings_path_from(Some("/tmp/cli.json".to_string()));
            assert_eq!(path, PathBuf::from("/tmp/cli.json"));
        });
    }

    #[test]
    fn test_environment_variable_fallback() {
        temp_env::with_var(SETTINGS_ENV_VAR, Some("/etc/unison/env.json"), || {
            let path = settings_path_from(None);
            assert_eq!(path, PathBuf::from("/etc/unison/env.json"));
        });
    }

    #[test]
    fn test_default_path() {
        temp_env::with_var(SETTINGS_ENV_VAR, None::<&str>, || {
            let path = settings_path_from(None);
            assert_eq!(path, PathBuf::from(DEFAULT_SETTINGS_FILE));
        });
    }
}
