use std::collections::BTreeMap;

use crate::{
    foundation::error::{MillError, MillResult},
    tuning::model::{ComponentNode, EngineId, EnginePolicy, ParamSchema},
};

#[derive(Clone, Debug, PartialEq)]
/// A registered component with its position in the tree.
pub struct RegisteredComponent {
    /// Authored node (children included).
    pub node: ComponentNode,
    /// Parent id; `None` for the root.
    pub parent: Option<String>,
    /// Depth below the root (root is 0).
    pub depth: usize,
}

#[derive(Clone, Debug)]
/// Indexed tuning component tree.
///
/// Ids are unique across the whole tree; construction fails on duplicates.
pub struct ComponentRegistry {
    root_id: String,
    by_id: BTreeMap<String, RegisteredComponent>,
    order: Vec<String>,
}

impl ComponentRegistry {
    /// Index a tree rooted at `root`.
    pub fn new(root: ComponentNode) -> MillResult<Self> {
        let mut by_id = BTreeMap::new();
        let mut order = Vec::new();
        let root_id = root.id.clone();
        index_node(&root, None, 0, &mut by_id, &mut order)?;
        Ok(Self {
            root_id,
            by_id,
            order,
        })
    }

    /// Root component id.
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Look up a component.
    pub fn get(&self, id: &str) -> Option<&RegisteredComponent> {
        self.by_id.get(id)
    }

    /// Look up a component or fail with a definition error.
    pub fn require(&self, id: &str) -> MillResult<&RegisteredComponent> {
        self.get(id)
            .ok_or_else(|| MillError::definition(format!("unknown tuning component '{id}'")))
    }

    /// Parent id of `id`.
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).and_then(|c| c.parent.as_deref())
    }

    /// Ids in pre-order (parents before children, authored sibling order).
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false for a constructed registry (the root exists).
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn index_node(
    node: &ComponentNode,
    parent: Option<&str>,
    depth: usize,
    by_id: &mut BTreeMap<String, RegisteredComponent>,
    order: &mut Vec<String>,
) -> MillResult<()> {
    if node.id.trim().is_empty() {
        return Err(MillError::definition("component id must be non-empty"));
    }
    if by_id.contains_key(&node.id) {
        return Err(MillError::definition(format!(
            "duplicate component id: {}",
            node.id
        )));
    }
    by_id.insert(
        node.id.clone(),
        RegisteredComponent {
            node: node.clone(),
            parent: parent.map(str::to_string),
            depth,
        },
    );
    order.push(node.id.clone());
    for child in &node.children {
        index_node(child, Some(&node.id), depth + 1, by_id, order)?;
    }
    Ok(())
}

/// Built-in component tree covering every dispatch op and inline op with tuning.
pub fn default_component_tree() -> ComponentNode {
    use EnginePolicy::Auto;

    let resize = |id: &str| {
        ComponentNode::new(id, "Resize", Auto)
            .describe("Prepare image for stable downstream processing.")
            .param(
                "resizeAlgo",
                ParamSchema::number("Resize algo", 0.0, 3.0, 1.0, 1.0),
            )
            .param(
                "targetMaxW",
                ParamSchema::number("Target max width", 100.0, 4000.0, 50.0, 1200.0),
            )
    };
    let morphology = |id: &str, kernel: f64| {
        ComponentNode::new(id, "Morphology cleanup", Auto)
            .param(
                "morphAlgo",
                ParamSchema::number("Morph algo", 0.0, 4.0, 1.0, 2.0),
            )
            .param(
                "morphK",
                ParamSchema::number("Kernel size", 1.0, 31.0, 2.0, kernel),
            )
            .param(
                "morphIters",
                ParamSchema::number("Iterations", 1.0, 5.0, 1.0, 1.0),
            )
    };

    let edge = ComponentNode::new("edge", "Edge", Auto)
        .describe("Fixed-order edge pipeline (image -> mask -> edges).")
        .child(resize("edge.resize"))
        .child(
            ComponentNode::new("edge.threshold", "Threshold", Auto)
                .describe("Convert image into a binary mask before edge extraction.")
                .param(
                    "manualT",
                    ParamSchema::number("Manual threshold", 0.0, 255.0, 1.0, 128.0),
                ),
        )
        .child(
            morphology("edge.morphology", 3.0).describe("Clean the mask before extracting edges."),
        )
        .child(
            ComponentNode::new("edge.extract", "Edge extract", Auto)
                .describe("Extract a 1px outline from the cleaned mask."),
        );

    let svg = ComponentNode::new("svg", "SVG", Auto).child(
        ComponentNode::new("svg.create", "Create SVG", Auto)
            .describe("Convert the edge mask into an SVG.")
            .param("scale", ParamSchema::number("Scale", 1.0, 10.0, 1.0, 1.0))
            .param(
                "transparentBg",
                ParamSchema::number("Transparent bg (0/1)", 0.0, 1.0, 1.0, 1.0),
            )
            .param("color", ParamSchema::text("Color", "#3bca1e")),
    );

    let segmentation = ComponentNode::new("segmentation", "Segmentation", Auto)
        .describe("Fixed-order segmentation pipeline.")
        .child(resize("segmentation.resize"))
        .child(
            ComponentNode::new("segmentation.denoise", "Denoise", Auto)
                .describe("Reduce noise before thresholding.")
                .param(
                    "denoiseAlgo",
                    ParamSchema::number("Denoise algo", 0.0, 2.0, 1.0, 1.0),
                )
                .param(
                    "blurK",
                    ParamSchema::number("Blur kernel", 1.0, 21.0, 2.0, 3.0),
                )
                .param(
                    "bilateralSigma",
                    ParamSchema::number("Bilateral sigma", 1.0, 150.0, 1.0, 35.0),
                ),
        )
        .child(
            ComponentNode::new("segmentation.color", "Color / Gray", Auto)
                .param(
                    "colorMode",
                    ParamSchema::number("Color mode", 0.0, 3.0, 1.0, 1.0),
                )
                .param(
                    "hsvChannel",
                    ParamSchema::number("HSV channel", 0.0, 2.0, 1.0, 2.0),
                ),
        )
        .child(
            ComponentNode::new("segmentation.threshold", "Threshold", Auto)
                .describe("Convert features into a binary mask.")
                .param(
                    "thresholdAlgo",
                    ParamSchema::number("Threshold algo", 0.0, 3.0, 1.0, 1.0),
                )
                .param(
                    "manualT",
                    ParamSchema::number("Manual threshold", 0.0, 255.0, 1.0, 128.0),
                )
                .param(
                    "adaptBlock",
                    ParamSchema::number("Adaptive block", 3.0, 101.0, 2.0, 31.0),
                )
                .param(
                    "adaptC",
                    ParamSchema::number("Adaptive C", -50.0, 50.0, 1.0, 3.0),
                ),
        )
        .child(
            morphology("segmentation.morphology", 5.0)
                .describe("Remove specks, fill holes, and stabilize regions."),
        );

    let cleanup = ComponentNode::new("cleanup", "Cleanup", Auto).child(
        ComponentNode::new(
            "cleanup.removeSmallComponents",
            "Remove small components",
            Auto,
        )
        .describe("Remove connected components smaller than the minimum area.")
        .param(
            "cleanMinArea",
            ParamSchema::number("Min fragment size", 0.0, 5000.0, 1.0, 12.0),
        ),
    );

    let document = ComponentNode::new("document", "Document", Auto)
        .engines(&[EngineId::Native])
        .child(
            ComponentNode::new("document.pdf", "Images to PDF", EnginePolicy::Inherit)
                .engines(&[EngineId::Native])
                .param(
                    "marginPt",
                    ParamSchema::number("Margin (pt)", 0.0, 72.0, 1.0, 18.0),
                )
                .param("contain", ParamSchema::boolean("Fit inside page", true)),
        );

    ComponentNode::new("app", "rastermill", EnginePolicy::Native)
        .child(edge)
        .child(svg)
        .child(segmentation)
        .child(cleanup)
        .child(document)
}

/// Registry over [`default_component_tree`].
pub fn default_registry() -> MillResult<ComponentRegistry> {
    ComponentRegistry::new(default_component_tree())
}

#[cfg(test)]
#[path = "../../tests/unit/tuning/registry.rs"]
mod tests;
