//! The per-provider table of optional settings.
//!
//! Lookups are pure and the table is static, so it can be read from any
//! number of threads without synchronization.

use std::fmt::{self, Display, Formatter};

use crate::ProviderName;

/// Names an optional generation setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionKey {
    /// Sampling temperature.
    Temperature,
    /// Nucleus sampling mass.
    TopP,
    /// Top-k sampling cutoff.
    TopK,
    /// Maximum output tokens.
    MaxTokens,
    /// Sequences that stop generation.
    StopSequences,
    /// Sampling seed.
    Seed,
    /// Presence penalty.
    PresencePenalty,
    /// Frequency penalty.
    FrequencyPenalty,
    /// Reasoning / thinking token budget.
    ThinkingBudget,
}

impl OptionKey {
    /// Every option, in validation order.
    pub const ALL: [OptionKey; 9] = [
        OptionKey::Temperature,
        OptionKey::TopP,
        OptionKey::TopK,
        OptionKey::MaxTokens,
        OptionKey::StopSequences,
        OptionKey::Seed,
        OptionKey::PresencePenalty,
        OptionKey::FrequencyPenalty,
        OptionKey::ThinkingBudget,
    ];

    /// Returns the setter name reported in validation errors.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            OptionKey::Temperature => "WithTemperature",
            OptionKey::TopP => "WithTopP",
            OptionKey::TopK => "WithTopK",
            OptionKey::MaxTokens => "WithMaxTokens",
            OptionKey::StopSequences => "WithStopSequences",
            OptionKey::Seed => "WithSeed",
            OptionKey::PresencePenalty => "WithPresencePenalty",
            OptionKey::FrequencyPenalty => "WithFrequencyPenalty",
            OptionKey::ThinkingBudget => "WithThinkingBudget",
        }
    }
}

impl Display for OptionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a provider does with more list items than it accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Overflow {
    /// Fail validation.
    Reject,
    /// Keep the leading items and drop the rest.
    Truncate,
}

/// Legal values and the default for a supported option.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    /// Inclusive lower bound.
    pub min: Option<f64>,
    /// Inclusive upper bound.
    pub max: Option<f64>,
    /// The value sent when the caller leaves the option unset.
    pub default: Option<f64>,
    /// The maximum number of items for list options.
    pub max_items: Option<usize>,
    /// What happens past `max_items`.
    pub overflow: Overflow,
}

impl Limits {
    const ANY: Limits = Limits {
        min: None,
        max: None,
        default: None,
        max_items: None,
        overflow: Overflow::Reject,
    };

    const fn range(min: f64, max: f64) -> Self {
        Limits {
            min: Some(min),
            max: Some(max),
            ..Limits::ANY
        }
    }

    const fn at_least(min: f64) -> Self {
        Limits {
            min: Some(min),
            ..Limits::ANY
        }
    }

    const fn capped(max_items: usize) -> Self {
        Limits {
            max_items: Some(max_items),
            overflow: Overflow::Truncate,
            ..Limits::ANY
        }
    }

    /// Returns `true` if `value` lies within the bounds.
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min)
            && self.max.is_none_or(|max| value <= max)
    }

    /// Describes the bounds for error messages.
    pub fn describe(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("between {min} and {max}"),
            (Some(min), None) => format!("at least {min}"),
            (None, Some(max)) => format!("at most {max}"),
            (None, None) => "any value".to_owned(),
        }
    }
}

/// The result of a capability lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Capability {
    /// The provider has no such setting.
    Unsupported,
    /// The provider accepts the setting within the given limits.
    Supported(Limits),
}

impl Capability {
    /// Returns `true` if the option is supported.
    #[inline]
    pub fn is_supported(&self) -> bool {
        matches!(self, Capability::Supported(_))
    }

    /// Returns the limits of a supported option.
    #[inline]
    pub fn limits(&self) -> Option<&Limits> {
        match self {
            Capability::Supported(limits) => Some(limits),
            Capability::Unsupported => None,
        }
    }
}

/// Anthropic requires `max_tokens` on every request.
pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic's documented floor for the thinking budget.
pub const ANTHROPIC_MIN_THINKING_BUDGET: u32 = 1024;

/// Looks up how `provider` treats `key`.
pub fn capability(provider: ProviderName, key: OptionKey) -> Capability {
    use Capability::*;
    use OptionKey::*;
    use ProviderName::*;

    match (provider, key) {
        (Anthropic, Temperature) => Supported(Limits::range(0.0, 1.0)),
        (OpenAI | Google | Grok, Temperature) => {
            Supported(Limits::range(0.0, 2.0))
        }
        (_, TopP) => Supported(Limits::range(0.0, 1.0)),

        (Anthropic, TopK) => Supported(Limits::at_least(0.0)),
        (Google, TopK) => Supported(Limits::at_least(1.0)),
        (OpenAI | Grok, TopK) => Unsupported,

        (Anthropic, MaxTokens) => Supported(Limits {
            default: Some(ANTHROPIC_DEFAULT_MAX_TOKENS as f64),
            ..Limits::at_least(1.0)
        }),
        (_, MaxTokens) => Supported(Limits::at_least(1.0)),

        (Anthropic, StopSequences) => Supported(Limits::ANY),
        (OpenAI | Grok, StopSequences) => Supported(Limits::capped(4)),
        (Google, StopSequences) => Supported(Limits::capped(5)),

        (OpenAI | Google | Grok, Seed) => Supported(Limits::ANY),
        (Anthropic, Seed) => Unsupported,

        (OpenAI | Google, PresencePenalty | FrequencyPenalty) => {
            Supported(Limits::range(-2.0, 2.0))
        }
        (Anthropic | Grok, PresencePenalty | FrequencyPenalty) => Unsupported,

        (Anthropic, ThinkingBudget) => Supported(Limits::at_least(
            ANTHROPIC_MIN_THINKING_BUDGET as f64,
        )),
        (Google, ThinkingBudget) => Supported(Limits::range(0.0, 24576.0)),
        (OpenAI | Grok, ThinkingBudget) => Unsupported,
    }
}
