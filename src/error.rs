use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} range is not finite: {min}..{max}")]
    NonFiniteRange { name: &'static str, min: f32, max: f32 },

    #[error("{name} range is inverted: {min}..{max}")]
    InvertedRange { name: &'static str, min: f32, max: f32 },

    #[error("{name} must be non-negative and finite, got {value}")]
    NegativeValue { name: &'static str, value: f32 },

    #[error("{name} must lie in {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("invalid config object: {0}")]
    Deserialize(String),
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error("no global window")]
    NoWindow,

    #[error("window has no document")]
    NoDocument,

    #[error("selector `{selector}` failed: {message}")]
    Selector { selector: String, message: String },

    #[error("JS call failed: {0}")]
    Js(String),
}
