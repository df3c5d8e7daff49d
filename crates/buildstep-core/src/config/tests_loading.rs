//! Loading-focused tests for configuration
//!
//! File parsing, layering, path resolution and environment overrides.

#[cfg(test)]
mod loading_tests {
    use std::collections::HashMap;

    use serial_test::serial;

    use crate::config::{
        global_config_path, load_config, load_toml_file, project_config_path, BuildstepConfig,
    };
    use crate::Error;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).expect("write config");
        path
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(&dir, "config.toml", "[lock]\nretry_interval_ms = 250\n");

        let layer = load_toml_file(&path).expect("load");
        assert_eq!(layer.lock.retry_interval_ms, Some(250));
        assert_eq!(layer.lock.handle_key, None);

        let config = BuildstepConfig::default().merge(layer);

        assert_eq!(config.lock.retry_interval_ms, 250);
        assert_eq!(config.lock.handle_key, "flock_fd");
        assert_eq!(config.lock.max_attempts, None);
    }

    #[test]
    fn test_later_file_restores_default_value() {
        let dir = tempfile::tempdir().expect("tempdir");
        let global = write(
            &dir,
            "global.toml",
            "[lock]\nretry_interval_ms = 250\nhandle_key = \"global_key\"\n",
        );
        let project = write(
            &dir,
            "project.toml",
            "[lock]\nretry_interval_ms = 1000\nhandle_key = \"flock_fd\"\n",
        );

        let config = BuildstepConfig::default()
            .merge(load_toml_file(&global).expect("load global"))
            .merge(load_toml_file(&project).expect("load project"));

        assert_eq!(config.lock.retry_interval_ms, 1000);
        assert_eq!(config.lock.handle_key, "flock_fd");
    }

    #[test]
    fn test_malformed_toml_returns_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(&dir, "bad.toml", "[lock\nretry_interval_ms = ");

        let result = load_toml_file(&path);

        assert!(matches!(result, Err(Error::Parse(_))), "{result:?}");
    }

    #[test]
    fn test_directory_path_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");

        let result = load_toml_file(dir.path());

        assert!(matches!(result, Err(Error::Io(ref msg)) if msg.contains("directory")));
    }

    #[test]
    fn test_env_overrides_apply() {
        let config = BuildstepConfig::default()
            .apply_env_from(env(&[
                ("BUILDSTEP_LOCK_RETRY_MS", "50"),
                ("BUILDSTEP_LOCK_MAX_ATTEMPTS", "7"),
                ("BUILDSTEP_HANDLE_KEY", "board_lock"),
            ]))
            .expect("valid overrides");

        assert_eq!(config.lock.retry_interval_ms, 50);
        assert_eq!(config.lock.max_attempts, Some(7));
        assert_eq!(config.lock.handle_key, "board_lock");
    }

    #[test]
    fn test_env_override_with_garbage_is_invalid_config() {
        let result = BuildstepConfig::default()
            .apply_env_from(env(&[("BUILDSTEP_LOCK_RETRY_MS", "soon")]));

        assert!(matches!(result, Err(Error::InvalidConfig(ref msg)) if msg.contains("BUILDSTEP_LOCK_RETRY_MS")));
    }

    #[test]
    fn test_empty_handle_key_env_rejected() {
        let result =
            BuildstepConfig::default().apply_env_from(env(&[("BUILDSTEP_HANDLE_KEY", "")]));

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    #[serial]
    fn test_explicit_file_layers_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            &dir,
            "ci.toml",
            "[lock]\nmax_attempts = 30\nhandle_key = \"ci_lock\"\n",
        );

        let config = load_config(Some(&path)).expect("load");

        assert_eq!(config.lock.max_attempts, Some(30));
        assert_eq!(config.lock.handle_key, "ci_lock");
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");

        let result = load_config(Some(&dir.path().join("absent.toml")));

        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    #[serial]
    fn test_process_env_override_is_validated() {
        std::env::set_var("BUILDSTEP_LOCK_RETRY_MS", "1");
        let result = load_config(None);
        std::env::remove_var("BUILDSTEP_LOCK_RETRY_MS");

        assert!(matches!(result, Err(Error::InvalidConfig(ref msg)) if msg.contains("10-600000")));
    }

    #[test]
    fn test_config_paths() {
        if let Some(path) = global_config_path() {
            assert!(path.ends_with("config.toml"));
        }
        let project = project_config_path().expect("current dir");
        assert!(project.ends_with(".buildstep/config.toml"));
    }
}
