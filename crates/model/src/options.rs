use serde::{Deserialize, Serialize};

use crate::capability::{Capability, OptionKey, Overflow, capability};
use crate::{Error, ProviderName, Result};

/// Provider-agnostic generation settings. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionSet {
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Nucleus sampling mass.
    pub top_p: Option<f64>,
    /// Top-k sampling cutoff.
    pub top_k: Option<u32>,
    /// Maximum output tokens.
    pub max_tokens: Option<u32>,
    /// Sequences that stop generation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    /// Sampling seed.
    pub seed: Option<i64>,
    /// Presence penalty.
    pub presence_penalty: Option<f64>,
    /// Frequency penalty.
    pub frequency_penalty: Option<f64>,
    /// Reasoning / thinking token budget.
    pub thinking_budget: Option<u32>,
}

impl OptionSet {
    /// Creates an empty option set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the nucleus sampling mass.
    #[inline]
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Sets the top-k cutoff.
    #[inline]
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Sets the maximum output tokens.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the stop sequences.
    #[inline]
    pub fn with_stop_sequences<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_sequences = stop.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the sampling seed.
    #[inline]
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the presence penalty.
    #[inline]
    pub fn with_presence_penalty(mut self, penalty: f64) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    /// Sets the frequency penalty.
    #[inline]
    pub fn with_frequency_penalty(mut self, penalty: f64) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    /// Sets the reasoning / thinking budget in tokens.
    #[inline]
    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    /// Returns `true` if nothing is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Returns the populated options with their numeric value, in
    /// validation order. List options report their length.
    fn populated(&self) -> Vec<(OptionKey, f64)> {
        let fields = [
            (OptionKey::Temperature, self.temperature),
            (OptionKey::TopP, self.top_p),
            (OptionKey::TopK, self.top_k.map(f64::from)),
            (OptionKey::MaxTokens, self.max_tokens.map(f64::from)),
            (
                OptionKey::StopSequences,
                (!self.stop_sequences.is_empty())
                    .then_some(self.stop_sequences.len() as f64),
            ),
            (OptionKey::Seed, self.seed.map(|s| s as f64)),
            (OptionKey::PresencePenalty, self.presence_penalty),
            (OptionKey::FrequencyPenalty, self.frequency_penalty),
            (OptionKey::ThinkingBudget, self.thinking_budget.map(f64::from)),
        ];
        fields
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect()
    }

    /// Checks every populated option against the capability matrix.
    ///
    /// Support is checked first for all fields so that an unsupported
    /// option is always reported ahead of an out-of-range one. This is a
    /// pure function and safe to call repeatedly.
    pub fn validate(&self, provider: ProviderName) -> Result<()> {
        let populated = self.populated();

        for &(key, _) in &populated {
            if !capability(provider, key).is_supported() {
                return Err(Error::validation(
                    key.name(),
                    format!("not supported by {provider}"),
                ));
            }
        }

        for &(key, value) in &populated {
            let Capability::Supported(limits) = capability(provider, key)
            else {
                continue;
            };
            if key == OptionKey::StopSequences {
                if let Some(max_items) = limits.max_items {
                    if limits.overflow == Overflow::Reject
                        && self.stop_sequences.len() > max_items
                    {
                        return Err(Error::validation(
                            key.name(),
                            format!(
                                "{provider} accepts at most {max_items} \
                                 stop sequences"
                            ),
                        ));
                    }
                }
                continue;
            }
            if !value.is_finite() || !limits.contains(value) {
                return Err(Error::validation(
                    key.name(),
                    format!(
                        "{value} is out of range for {provider}, must be {}",
                        limits.describe()
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Returns the stop sequences to send to `provider`, applying the
    /// provider's down-scoping rule.
    pub fn stop_sequences_for(&self, provider: ProviderName) -> &[String] {
        let limits = capability(provider, OptionKey::StopSequences);
        let Some(limits) = limits.limits() else {
            return &[];
        };
        match limits.max_items {
            Some(max_items)
                if limits.overflow == Overflow::Truncate
                    && self.stop_sequences.len() > max_items =>
            {
                warn!(
                    "{provider} accepts {max_items} stop sequences, dropping {}",
                    self.stop_sequences.len() - max_items
                );
                &self.stop_sequences[..max_items]
            }
            _ => &self.stop_sequences,
        }
    }
}
