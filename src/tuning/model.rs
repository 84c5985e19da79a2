use std::{
    collections::BTreeMap,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::foundation::error::MillError;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
/// Concrete implementation family an op can execute with.
pub enum EngineId {
    /// Built-in pure Rust kernels.
    Native,
    /// Alternate engine (OpenCV-compatible id on the wire).
    Opencv,
}

impl EngineId {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Opencv => "opencv",
        }
    }
}

impl std::fmt::Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
/// Declared engine preference of a component or op instance.
pub enum EnginePolicy {
    /// Defer to the parent component.
    #[default]
    Inherit,
    /// Always native.
    Native,
    /// Alternate engine when possible, native with a fallback reason otherwise.
    Opencv,
    /// Alternate engine when possible, native otherwise (no reason recorded).
    Auto,
}

impl EnginePolicy {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inherit => "inherit",
            Self::Native => "native",
            Self::Opencv => "opencv",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for EnginePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnginePolicy {
    type Err = MillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inherit" => Ok(Self::Inherit),
            "native" => Ok(Self::Native),
            "opencv" => Ok(Self::Opencv),
            "auto" => Ok(Self::Auto),
            other => Err(MillError::validation(format!(
                "unknown engine policy '{other}' (expected inherit|native|opencv|auto)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
/// A single tuning parameter value.
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Numeric value (integers are carried as `f64`).
    Number(f64),
    /// Free text (colors, ids).
    Text(String),
}

impl ParamValue {
    /// Numeric view: booleans map to 0/1, text is parsed when possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Parse a CLI-style literal: `true`/`false`, a number, else text.
    pub fn parse_literal(raw: &str) -> Self {
        match raw.trim() {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            t => t
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Number)
                .unwrap_or_else(|| Self::Text(raw.to_string())),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Parameter map keyed by parameter name.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Numeric parameter with a fallback for missing or non-numeric values.
pub fn param_number(params: &ParamMap, key: &str, default: f64) -> f64 {
    params
        .get(key)
        .and_then(ParamValue::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// Text parameter with a fallback for missing values.
pub fn param_text<'a>(params: &'a ParamMap, key: &str, default: &'a str) -> &'a str {
    match params.get(key) {
        Some(ParamValue::Text(s)) => s,
        _ => default,
    }
}

/// Boolean parameter; numbers are true when non-zero.
pub fn param_flag(params: &ParamMap, key: &str, default: bool) -> bool {
    match params.get(key) {
        Some(ParamValue::Bool(b)) => *b,
        Some(v) => v.as_f64().map(|n| n != 0.0).unwrap_or(default),
        None => default,
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
/// Typed schema for one tuning parameter.
pub enum ParamSchema {
    /// Numeric parameter with optional bounds.
    Number {
        /// UI label.
        label: String,
        /// Lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        /// Upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        /// Increment.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
        /// Default value.
        default: f64,
    },
    /// On/off parameter.
    Boolean {
        /// UI label.
        label: String,
        /// Default value.
        default: bool,
    },
    /// Free text parameter.
    Text {
        /// UI label.
        label: String,
        /// Default value.
        default: String,
    },
}

impl ParamSchema {
    /// Numeric schema with bounds and step.
    pub fn number(label: &str, min: f64, max: f64, step: f64, default: f64) -> Self {
        Self::Number {
            label: label.to_string(),
            min: Some(min),
            max: Some(max),
            step: Some(step),
            default,
        }
    }

    /// Boolean schema.
    pub fn boolean(label: &str, default: bool) -> Self {
        Self::Boolean {
            label: label.to_string(),
            default,
        }
    }

    /// Text schema.
    pub fn text(label: &str, default: &str) -> Self {
        Self::Text {
            label: label.to_string(),
            default: default.to_string(),
        }
    }

    /// Schema default as a value.
    pub fn default_value(&self) -> ParamValue {
        match self {
            Self::Number { default, .. } => ParamValue::Number(*default),
            Self::Boolean { default, .. } => ParamValue::Bool(*default),
            Self::Text { default, .. } => ParamValue::Text(default.clone()),
        }
    }

    /// UI label.
    pub fn label(&self) -> &str {
        match self {
            Self::Number { label, .. } | Self::Boolean { label, .. } | Self::Text { label, .. } => {
                label
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
/// Node of the tuning component tree, as authored.
pub struct ComponentNode {
    /// Dotted hierarchical id, globally unique.
    pub id: String,
    /// UI title.
    pub title: String,
    /// Short description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Engines with code for this component.
    pub implemented_engines: Vec<EngineId>,
    /// Policy used when nothing is stored.
    pub default_engine_policy: EnginePolicy,
    /// Parameters owned by this node.
    pub params: BTreeMap<String, ParamSchema>,
    /// Sub-components.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComponentNode>,
}

impl ComponentNode {
    /// Leaf node implementing both engines.
    pub fn new(id: &str, title: &str, default_engine_policy: EnginePolicy) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            implemented_engines: vec![EngineId::Native, EngineId::Opencv],
            default_engine_policy,
            params: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Replace the implemented engine set.
    pub fn engines(mut self, engines: &[EngineId]) -> Self {
        self.implemented_engines = engines.to_vec();
        self
    }

    /// Attach a description.
    pub fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    /// Add a parameter schema.
    pub fn param(mut self, key: &str, schema: ParamSchema) -> Self {
        self.params.insert(key.to_string(), schema);
        self
    }

    /// Append a child node.
    pub fn child(mut self, node: ComponentNode) -> Self {
        self.children.push(node);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Stored user override for one component. Missing keys mean "use the registry default".
pub struct ComponentConfig {
    /// Policy override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_policy: Option<EnginePolicy>,
    /// Per-key parameter overrides.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: ParamMap,
}

impl ComponentConfig {
    /// True when nothing is overridden.
    pub fn is_empty(&self) -> bool {
        self.engine_policy.is_none() && self.params.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Per-instance override carried by a pipeline step or recipe patch.
pub struct OpOverride {
    /// Engine policy for this instance; `inherit` means "no override".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_policy: Option<EnginePolicy>,
    /// Parameter values winning over the resolved tuning, per key.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: ParamMap,
}

impl OpOverride {
    /// The policy when it is an actual override (present and not `inherit`).
    pub fn explicit_policy(&self) -> Option<EnginePolicy> {
        self.engine_policy.filter(|p| *p != EnginePolicy::Inherit)
    }
}

/// Stored overrides keyed by component id.
pub type StoredConfigs = BTreeMap<String, ComponentConfig>;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
/// Effective tuning of one component.
pub struct ResolvedComponent {
    /// Component id.
    pub id: String,
    /// Policy after inheritance (never `inherit`).
    pub policy: EnginePolicy,
    /// Engine that will run.
    pub engine: EngineId,
    /// Why a requested alternate engine was not selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Schema defaults overlaid with stored overrides.
    pub params: ParamMap,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Snapshot of runtime engine availability.
pub struct RuntimeAvailability {
    /// The alternate engine is loaded and usable in this process.
    pub alternate_engine_ready: bool,
}

/// Source of [`RuntimeAvailability`], polled on every resolution pass.
pub trait AvailabilityProbe: Send + Sync {
    /// Current availability.
    fn availability(&self) -> RuntimeAvailability;
}

impl AvailabilityProbe for RuntimeAvailability {
    fn availability(&self) -> RuntimeAvailability {
        *self
    }
}

/// Shared toggle for alternate engine readiness. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct EngineSwitch {
    ready: Arc<AtomicBool>,
}

impl EngineSwitch {
    /// Switch with an initial state.
    pub fn new(ready: bool) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(ready)),
        }
    }

    /// Flip readiness; the next resolution sees the new value.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl AvailabilityProbe for EngineSwitch {
    fn availability(&self) -> RuntimeAvailability {
        RuntimeAvailability {
            alternate_engine_ready: self.ready.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tuning/model.rs"]
mod tests;
