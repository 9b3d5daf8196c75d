use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use search_core::{
    repository::{DEFAULT_API_BASE_URL, DEFAULT_USER_AGENT},
    ControllerOptions, RepositoryConfig, RepositoryKind, ResponseOrdering,
};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "search.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub repository: RepositoryKind,
    pub api_base_url: String,
    pub user_agent: String,
    pub fake_latency_ms: u64,
    pub response_ordering: ResponseOrdering,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repository: RepositoryKind::GitHub,
            api_base_url: DEFAULT_API_BASE_URL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            fake_latency_ms: 0,
            response_ordering: ResponseOrdering::CompletionOrder,
            log_filter: "warn".into(),
        }
    }
}

impl Settings {
    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig {
            kind: self.repository,
            api_base_url: self.api_base_url.clone(),
            user_agent: self.user_agent.clone(),
            fake_latency: Duration::from_millis(self.fake_latency_ms),
        }
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            ordering: self.response_ordering,
            ..ControllerOptions::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    repository: Option<RepositoryKind>,
    api_base_url: Option<String>,
    user_agent: Option<String>,
    fake_latency_ms: Option<u64>,
    response_ordering: Option<ResponseOrdering>,
    log_filter: Option<String>,
}

/// Defaults, then the TOML file, then environment variables.
///
/// An explicitly requested file must exist; the default `search.toml` is optional.
pub fn load_settings(explicit_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if explicit_path.is_some() => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.repository {
        settings.repository = v;
    }
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.user_agent {
        settings.user_agent = v;
    }
    if let Some(v) = file_cfg.fake_latency_ms {
        settings.fake_latency_ms = v;
    }
    if let Some(v) = file_cfg.response_ordering {
        settings.response_ordering = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

/// Looks up `SEARCH_<NAME>` first, then `APP__<NAME>`.
fn env_value(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(&format!("SEARCH_{name}")).or_else(|| lookup(&format!("APP__{name}")))
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = env_value(&lookup, "REPOSITORY") {
        settings.repository = v.parse().context("invalid SEARCH_REPOSITORY")?;
    }
    if let Some(v) = env_value(&lookup, "API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env_value(&lookup, "USER_AGENT") {
        settings.user_agent = v;
    }
    if let Some(v) = env_value(&lookup, "FAKE_LATENCY_MS") {
        settings.fake_latency_ms = v
            .trim()
            .parse()
            .with_context(|| format!("invalid SEARCH_FAKE_LATENCY_MS '{v}'"))?;
    }
    if let Some(v) = env_value(&lookup, "RESPONSE_ORDERING") {
        settings.response_ordering = v.parse().context("invalid SEARCH_RESPONSE_ORDERING")?;
    }
    if let Some(v) = env_value(&lookup, "LOG") {
        settings.log_filter = v;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        apply_file(
            &mut settings,
            r#"
                repository = "fake"
                fake_latency_ms = 250
                response_ordering = "submission_order"
            "#,
        )
        .expect("apply file");

        assert_eq!(settings.repository, RepositoryKind::Fake);
        assert_eq!(settings.fake_latency_ms, 250);
        assert_eq!(settings.response_ordering, ResponseOrdering::SubmissionOrder);
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(
            settings.repository_config().fake_latency,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let mut settings = Settings::default();
        assert!(apply_file(&mut settings, "bind_addr = \"0.0.0.0\"").is_err());
    }

    #[test]
    fn env_overrides_file_and_prefers_search_prefix() {
        let mut settings = Settings::default();
        apply_file(&mut settings, "api_base_url = \"http://file.example\"").expect("apply file");

        apply_env(
            &mut settings,
            lookup_from(&[
                ("SEARCH_API_BASE_URL", "http://env.example"),
                ("APP__API_BASE_URL", "http://app.example"),
                ("APP__REPOSITORY", "fake"),
                ("SEARCH_LOG", "search_core=debug"),
            ]),
        )
        .expect("apply env");

        assert_eq!(settings.api_base_url, "http://env.example");
        assert_eq!(settings.repository, RepositoryKind::Fake);
        assert_eq!(settings.log_filter, "search_core=debug");
    }

    #[test]
    fn invalid_env_values_are_errors() {
        let mut settings = Settings::default();
        assert!(apply_env(&mut settings, lookup_from(&[("SEARCH_REPOSITORY", "gitlab")])).is_err());
        assert!(
            apply_env(&mut settings, lookup_from(&[("SEARCH_FAKE_LATENCY_MS", "soon")])).is_err()
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let missing = env::temp_dir().join(format!("search_cli_missing_{suffix}.toml"));

        assert!(load_settings(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_file_is_loaded() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("search_cli_config_{suffix}.toml"));
        fs::write(&path, "user_agent = \"tests/1.0\"\n").expect("write config");

        let settings = load_settings(Some(&path)).expect("load");
        assert_eq!(settings.user_agent, "tests/1.0");

        fs::remove_file(path).expect("cleanup");
    }
}
