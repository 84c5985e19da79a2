use crate::{
    foundation::{
        error::{MillError, MillResult},
        log::{DiagnosticsSink, meta},
    },
    tuning::{
        model::{EnginePolicy, ParamValue},
        registry::ComponentRegistry,
        store::{TuningStore, merge_config},
    },
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Engine policy assignment inside a preset.
pub struct PresetPolicy {
    /// Component id.
    pub id: String,
    /// Policy to store.
    pub policy: EnginePolicy,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Parameter assignment inside a preset.
pub struct PresetParam {
    /// Component id.
    pub id: String,
    /// Parameter key.
    pub key: String,
    /// Value to store.
    pub value: ParamValue,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Named bundle of tuning writes applied in one batch.
pub struct TuningPreset {
    /// Stable id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Component the preset is meant for (used for filtering).
    pub target: String,
    /// Policy writes.
    #[serde(default)]
    pub policies: Vec<PresetPolicy>,
    /// Parameter writes.
    #[serde(default)]
    pub params: Vec<PresetParam>,
}

fn preset(id: &str, title: &str, target: &str, params: &[(&str, &str, f64)]) -> TuningPreset {
    TuningPreset {
        id: id.to_string(),
        title: title.to_string(),
        target: target.to_string(),
        policies: Vec::new(),
        params: params
            .iter()
            .map(|(cid, key, v)| PresetParam {
                id: cid.to_string(),
                key: key.to_string(),
                value: ParamValue::Number(*v),
            })
            .collect(),
    }
}

/// Presets for the segmentation components.
pub fn segmentation_presets() -> Vec<TuningPreset> {
    vec![
        preset(
            "seg.recipe.document",
            "Recipe: Document scan",
            "segmentation",
            &[
                ("segmentation.resize", "resizeAlgo", 1.0),
                ("segmentation.resize", "targetMaxW", 1200.0),
                ("segmentation.denoise", "denoiseAlgo", 1.0),
                ("segmentation.denoise", "blurK", 3.0),
                ("segmentation.color", "colorMode", 1.0),
                ("segmentation.threshold", "thresholdAlgo", 2.0),
                ("segmentation.threshold", "adaptBlock", 31.0),
                ("segmentation.threshold", "adaptC", 3.0),
                ("segmentation.morphology", "morphAlgo", 2.0),
                ("segmentation.morphology", "morphK", 5.0),
                ("segmentation.morphology", "morphIters", 1.0),
            ],
        ),
        preset(
            "seg.threshold.otsu",
            "Threshold: Otsu",
            "segmentation.threshold",
            &[("segmentation.threshold", "thresholdAlgo", 1.0)],
        ),
        preset(
            "seg.morph.fill-holes",
            "Morphology: Fill holes (close)",
            "segmentation.morphology",
            &[
                ("segmentation.morphology", "morphAlgo", 3.0),
                ("segmentation.morphology", "morphK", 7.0),
                ("segmentation.morphology", "morphIters", 1.0),
            ],
        ),
    ]
}

/// Presets for the edge components.
pub fn edge_presets() -> Vec<TuningPreset> {
    vec![
        preset(
            "edge.recipe.basic",
            "Recipe: Basic edge",
            "edge",
            &[
                ("edge.resize", "resizeAlgo", 1.0),
                ("edge.resize", "targetMaxW", 1200.0),
                ("edge.threshold", "manualT", 128.0),
                ("edge.morphology", "morphAlgo", 2.0),
                ("edge.morphology", "morphK", 3.0),
                ("edge.morphology", "morphIters", 1.0),
            ],
        ),
        preset(
            "edge.thresh.low",
            "Threshold: Lower (more ink)",
            "edge.threshold",
            &[("edge.threshold", "manualT", 100.0)],
        ),
        preset(
            "edge.clean.specks",
            "Morphology: Remove specks (open)",
            "edge.morphology",
            &[
                ("edge.morphology", "morphAlgo", 4.0),
                ("edge.morphology", "morphK", 5.0),
                ("edge.morphology", "morphIters", 1.0),
            ],
        ),
    ]
}

/// Presets for SVG output.
pub fn svg_presets() -> Vec<TuningPreset> {
    vec![preset(
        "svg.recipe.basic",
        "Recipe: Basic SVG outline",
        "svg",
        &[
            ("edge.resize", "targetMaxW", 1200.0),
            ("edge.threshold", "manualT", 128.0),
            ("edge.morphology", "morphK", 3.0),
            ("svg.create", "scale", 1.0),
            ("svg.create", "transparentBg", 1.0),
        ],
    )]
}

/// Every built-in preset.
pub fn builtin_presets() -> Vec<TuningPreset> {
    let mut all = segmentation_presets();
    all.extend(edge_presets());
    all.extend(svg_presets());
    all
}

/// Find a built-in preset by id.
pub fn find_preset(id: &str) -> Option<TuningPreset> {
    builtin_presets().into_iter().find(|p| p.id == id)
}

/// Apply every write of `preset` in one read-modify-write of the tuning snapshot.
///
/// All referenced components must exist; otherwise nothing is written.
pub fn apply_preset(
    store: &TuningStore,
    registry: &ComponentRegistry,
    preset: &TuningPreset,
    sink: &dyn DiagnosticsSink,
) -> MillResult<()> {
    let ids = preset
        .policies
        .iter()
        .map(|p| p.id.as_str())
        .chain(preset.params.iter().map(|p| p.id.as_str()));
    for id in ids {
        registry.require(id).map_err(|_| {
            MillError::definition(format!(
                "preset '{}' references unknown component '{id}'",
                preset.id
            ))
        })?;
    }

    let mut all = store.load_all();
    for p in &preset.policies {
        let cfg = all.entry(p.id.clone()).or_default();
        merge_config(
            cfg,
            crate::tuning::model::ComponentConfig {
                engine_policy: Some(p.policy),
                ..Default::default()
            },
        );
    }
    for p in &preset.params {
        all.entry(p.id.clone())
            .or_default()
            .params
            .insert(p.key.clone(), p.value.clone());
    }
    store.save_all(&all);

    sink.action(&format!("[tuning] preset {} ({})", preset.id, preset.title));
    sink.debug(
        "[tuning] applyPreset",
        Some(&meta([
            ("id", preset.id.clone().into()),
            ("policies", preset.policies.len().into()),
            ("params", preset.params.len().into()),
        ])),
    );
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/tuning/presets.rs"]
mod tests;
