//! Error types
//!
//! Failures that callers are expected to handle. Running out of mana is not
//! an error: see [`crate::spell::resolution::CastOutcome`].

use thiserror::Error;

use crate::spell::composition::SpellForm;

/// Which pluggable family a registry lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Effect,
    Augment,
    Motion,
    Impact,
}

impl ComponentKind {
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Effect => "effect",
            ComponentKind::Augment => "augment",
            ComponentKind::Motion => "motion",
            ComponentKind::Impact => "impact",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A composition could not be turned into a spell.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CraftError {
    #[error("unknown {kind} type '{type_id}'")]
    UnknownType { kind: ComponentKind, type_id: String },

    #[error("conjured spells require a geometric body")]
    MissingGeometric,

    #[error("geometric body '{name}' has no prototype")]
    MissingPrototype { name: String },

    #[error("conjured spells require a {what} selection")]
    MissingConjureSelection { what: ComponentKind },

    #[error("a spell needs at least one domain")]
    NoDomains,

    #[error("too many domains: {got} (max {max})")]
    TooManyDomains { max: usize, got: usize },

    #[error("a spell needs at least one effect")]
    NoEffects,

    #[error("too many effects: {got} (max {max})")]
    TooManyEffects { max: usize, got: usize },

    #[error("augment '{augment}' cannot be used with {form:?} spells")]
    IncompatibleAugment { augment: String, form: SpellForm },

    #[error("effect '{effect}' is not available for any selected domain")]
    EffectUnavailable { effect: String },
}

/// A catalog entry was rejected during registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} type '{type_id}' is already registered")]
    Duplicate { kind: ComponentKind, type_id: String },

    #[error("{kind} type '{type_id}' has an empty display name")]
    EmptyDisplayName { kind: ComponentKind, type_id: String },

    #[error("{kind} factory for '{type_id}' produced '{produced}'")]
    FactoryMismatch {
        kind: ComponentKind,
        type_id: String,
        produced: String,
    },
}

/// Loading or validating a config file failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
