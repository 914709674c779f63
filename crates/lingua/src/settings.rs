//! Settings for the `lingua` binary.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `LINGUA_*` environment variables. The API key comes from the file
//! or from the provider's conventional variable (`OPENAI_API_KEY` etc).

use std::fmt::{self, Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use std::{env, fs, io};

use lingua_core::{TransportConfig, TransportConfigBuilder, Window};
use lingua_model::{OptionSet, Provider, ProviderName};
use serde::Deserialize;
use thiserror::Error;

/// The file looked up in the working directory when none is given.
pub const DEFAULT_FILE: &str = "lingua.toml";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// The cause.
        source: io::Error,
    },
    /// The settings file is not valid TOML for [`Settings`].
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// The file.
        path: PathBuf,
        /// The cause.
        source: toml::de::Error,
    },
    /// A setting has an invalid value.
    #[error("invalid {name}: {message}")]
    Invalid {
        /// The setting or variable name.
        name: String,
        /// What is wrong with it.
        message: String,
    },
    /// No API key was found for the provider.
    #[error("no API key for {provider}, set `api_key` or {var}")]
    MissingKey {
        /// The provider.
        provider: ProviderName,
        /// The variable that was looked up.
        var: &'static str,
    },
}

/// Settings for one chat session.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// The provider name, e.g. `"anthropic"`.
    pub provider: String,
    /// The API key. Usually left to the environment.
    pub api_key: Option<String>,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    /// Overrides the provider's default endpoint.
    pub base_url: Option<String>,
    /// The system prompt.
    pub system_prompt: Option<String>,
    /// Replays only this many recent exchanges.
    pub window_turns: Option<usize>,
    /// Generation options sent with every turn.
    pub options: OptionSet,
    /// Overall timeout of one exchange, in seconds.
    pub timeout_secs: u64,
    /// Connection timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// Routes traffic through this proxy.
    pub proxy: Option<String>,
    /// Logs request and reply bodies.
    pub log_bodies: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderName::OpenAI.as_str().to_owned(),
            api_key: None,
            model: None,
            base_url: None,
            system_prompt: None,
            window_turns: None,
            options: OptionSet::default(),
            timeout_secs: 300,
            connect_timeout_secs: 10,
            proxy: None,
            log_bodies: false,
        }
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("system_prompt", &self.system_prompt)
            .field("window_turns", &self.window_turns)
            .field("options", &self.options)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("proxy", &self.proxy.as_ref().map(|_| "<redacted>"))
            .field("log_bodies", &self.log_bodies)
            .finish()
    }
}

impl FromStr for Settings {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl Settings {
    /// Loads settings from `path`, or from [`DEFAULT_FILE`] if it exists,
    /// then applies the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_FILE))?
            }
            None => Self::default(),
        };
        settings.apply_env(|name| env::var(name).ok())?;
        Ok(settings)
    }

    /// Reads a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| {
            SettingsError::Read {
                path: path.to_owned(),
                source,
            }
        })?;
        text.parse().map_err(|source| SettingsError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Applies overrides from the environment, read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("LINGUA_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = lookup("LINGUA_MODEL") {
            self.model = Some(model);
        }
        if let Some(base_url) = lookup("LINGUA_BASE_URL") {
            self.base_url = Some(base_url);
        }
        if let Some(system_prompt) = lookup("LINGUA_SYSTEM") {
            self.system_prompt = Some(system_prompt);
        }
        if let Some(timeout) = lookup("LINGUA_TIMEOUT_SECS") {
            self.timeout_secs = parse_var("LINGUA_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(log_bodies) = lookup("LINGUA_LOG_BODIES") {
            self.log_bodies = parse_var("LINGUA_LOG_BODIES", &log_bodies)?;
        }
        if self.api_key.is_none() {
            let name = self.provider_name()?;
            self.api_key = key_vars(name).iter().find_map(|var| lookup(var));
        }
        Ok(())
    }

    /// Resolves the provider name.
    pub fn provider_name(&self) -> Result<ProviderName, SettingsError> {
        self.provider.parse().map_err(|err: lingua_model::Error| {
            SettingsError::Invalid {
                name: "provider".to_owned(),
                message: err.to_string(),
            }
        })
    }

    /// Builds the provider selection.
    pub fn provider(&self) -> Result<Provider, SettingsError> {
        let name = self.provider_name()?;
        let Some(api_key) = self.api_key.as_deref().filter(|key| !key.is_empty())
        else {
            return Err(SettingsError::MissingKey {
                provider: name,
                var: key_vars(name)[0],
            });
        };
        let mut provider = Provider::new(name, api_key);
        if let Some(model) = &self.model {
            provider = provider.with_model(model.as_str());
        }
        if let Some(base_url) = &self.base_url {
            provider = provider.with_base_url(base_url.as_str());
        }
        Ok(provider)
    }

    /// Builds the transport configuration.
    pub fn transport_config(&self) -> TransportConfig {
        let mut builder = TransportConfigBuilder::new()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .with_log_bodies(self.log_bodies);
        if let Some(proxy) = &self.proxy {
            builder = builder.with_proxy(proxy.as_str());
        }
        builder.build()
    }

    /// Returns the history window.
    #[inline]
    pub fn window(&self) -> Window {
        self.window_turns
            .map(Window::LastTurns)
            .unwrap_or(Window::Unbounded)
    }
}

/// The conventional API key variables, most specific first.
fn key_vars(name: ProviderName) -> &'static [&'static str] {
    match name {
        ProviderName::Anthropic => &["ANTHROPIC_API_KEY"],
        ProviderName::OpenAI => &["OPENAI_API_KEY"],
        ProviderName::Google => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        ProviderName::Grok => &["XAI_API_KEY"],
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, SettingsError>
where
    T::Err: Display,
{
    value.trim().parse().map_err(|err: T::Err| SettingsError::Invalid {
        name: name.to_owned(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_parse_file() {
        let settings: Settings = r#"
            provider = "claude"
            model = "claude-opus-4-20250514"
            system_prompt = "Be brief."
            window_turns = 4

            [options]
            temperature = 0.3
            max_tokens = 1024
            stop_sequences = ["END"]
        "#
        .parse()
        .unwrap();
        assert_eq!(settings.provider_name().unwrap(), ProviderName::Anthropic);
        assert_eq!(settings.window(), Window::LastTurns(4));
        assert_eq!(settings.options.temperature, Some(0.3));
        assert_eq!(settings.options.stop_sequences, vec!["END".to_owned()]);
        assert_eq!(settings.timeout_secs, 300);
    }

    #[test]
    fn test_unknown_field() {
        assert!("temprature = 1.0".parse::<Settings>().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_env(env(&[
                ("LINGUA_PROVIDER", "gemini"),
                ("LINGUA_MODEL", "gemini-2.5-pro"),
                ("LINGUA_TIMEOUT_SECS", "30"),
                ("LINGUA_LOG_BODIES", "true"),
                ("GOOGLE_API_KEY", "AIza-fallback"),
            ]))
            .unwrap();
        let provider = settings.provider().unwrap();
        assert_eq!(provider.kind().unwrap(), ProviderName::Google);
        assert_eq!(provider.model(), Some("gemini-2.5-pro"));
        assert_eq!(provider.api_key(), "AIza-fallback");
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.log_bodies);
    }

    #[test]
    fn test_file_key_wins() {
        let mut settings: Settings =
            "provider = \"grok\"\napi_key = \"from-file\"".parse().unwrap();
        settings
            .apply_env(env(&[("XAI_API_KEY", "from-env")]))
            .unwrap();
        assert_eq!(settings.provider().unwrap().api_key(), "from-file");
    }

    #[test]
    fn test_invalid_values() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(env(&[("LINGUA_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { ref name, .. } if name == "LINGUA_TIMEOUT_SECS"));

        let mut settings = Settings::default();
        let err = settings
            .apply_env(env(&[("LINGUA_PROVIDER", "mistral")]))
            .unwrap_err();
        assert!(err.to_string().contains("mistral"));
    }

    #[test]
    fn test_missing_key() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[])).unwrap();
        let err = settings.provider().unwrap_err();
        assert_eq!(
            err.to_string(),
            "no API key for openai, set `api_key` or OPENAI_API_KEY"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = Settings {
            api_key: Some("sk-secret".to_owned()),
            ..Default::default()
        };
        assert!(!format!("{settings:?}").contains("sk-secret"));
    }
}
