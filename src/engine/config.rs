use serde::{Deserialize, Serialize};

use super::error::LayoutError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingMode {
    #[default]
    ByType,
    ByConnectedComponent,
}

impl GroupingMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::ByType => "by-type",
            Self::ByConnectedComponent => "by-connected-component",
        }
    }
}

/// Immutable parameters for one pipeline run.
///
/// All distances are in layout units; the renderer decides how they map to
/// pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Largest number of members a type hypernode may hold before it is split.
    pub max_group_size: usize,
    pub grouping_mode: GroupingMode,
    /// When false, chemical nodes are emitted as standalone single-node groups.
    pub include_chemicals: bool,
    /// Drop nodes without incident edges unless their kind is protected.
    pub drop_isolated: bool,
    /// Seed for the jitter source used by the intra-group simulation.
    pub seed: u64,
    pub geometry: GeometryConfig,
    pub simulation: SimulationConfig,
    pub collision: CollisionConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_group_size: 4,
            grouping_mode: GroupingMode::ByType,
            include_chemicals: true,
            drop_isolated: true,
            seed: 42,
            geometry: GeometryConfig::default(),
            simulation: SimulationConfig::default(),
            collision: CollisionConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.max_group_size == 0 {
            return Err(LayoutError::InvalidConfig(
                "max_group_size must be at least 1".to_string(),
            ));
        }

        let geometry = &self.geometry;
        let positive = [
            ("geometry.node_radius", geometry.node_radius),
            ("geometry.label_font_size", geometry.label_font_size),
            ("geometry.grid_x_pad", geometry.grid_x_pad),
            ("geometry.grid_y_pad", geometry.grid_y_pad),
            ("simulation.boundary_fraction", self.simulation.boundary_fraction),
            ("collision.push_scale", self.collision.push_scale),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }

        let non_negative = [
            ("geometry.node_gap", geometry.node_gap),
            ("geometry.size_boost", geometry.size_boost),
            ("geometry.hypernode_margin", geometry.hypernode_margin),
            ("geometry.hypernode_padding", geometry.hypernode_padding),
            ("collision.tolerance", self.collision.tolerance),
            ("simulation.repulsion", self.simulation.repulsion),
            ("simulation.centering", self.simulation.centering),
            ("simulation.spring", self.simulation.spring),
            ("simulation.jitter_fraction", self.simulation.jitter_fraction),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} must be a non-negative finite number, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.simulation.damping) {
            return Err(LayoutError::InvalidConfig(format!(
                "simulation.damping must lie in [0, 1], got {}",
                self.simulation.damping
            )));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub node_radius: f32,
    /// Extra clearance between two sibling nodes, on top of their radii.
    pub node_gap: f32,
    /// How much betweenness may grow a node's render radius (0.5 = up to 50%).
    pub size_boost: f32,
    pub hypernode_margin: f32,
    pub hypernode_padding: f32,
    pub min_hypernode_size: f32,
    pub label_font_size: f32,
    pub grid_x_pad: f32,
    pub grid_y_pad: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            node_radius: 12.0,
            node_gap: 8.0,
            size_boost: 0.5,
            hypernode_margin: 16.0,
            hypernode_padding: 18.0,
            min_hypernode_size: 96.0,
            label_font_size: 13.0,
            grid_x_pad: 360.0,
            grid_y_pad: 300.0,
        }
    }
}

impl GeometryConfig {
    /// Smallest center-to-center distance allowed between two siblings.
    pub fn min_distance(&self) -> f32 {
        self.node_radius * 2.0 + self.node_gap
    }

    /// Largest radius a node can be drawn with.
    pub fn max_node_radius(&self) -> f32 {
        self.node_radius * (1.0 + self.size_boost)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub iterations: usize,
    pub damping: f32,
    /// Repulsion constant, expressed in units of `min_distance²`.
    pub repulsion: f32,
    /// Multiplier applied to repulsion between bodies closer than `min_distance`.
    pub overlap_boost: f32,
    pub centering: f32,
    /// Stiffness of the springs between members joined by an edge.
    pub spring: f32,
    /// Spring rest length, in units of `min_distance`.
    pub spring_length: f32,
    /// Multiplier for the centering pull once a body strays past
    /// `soft_boundary_fraction` of the available radius.
    pub edge_centering_boost: f32,
    pub soft_boundary_fraction: f32,
    /// Bodies are clamped inside this fraction of the available radius.
    pub boundary_fraction: f32,
    /// Speed cap, as a fraction of `min_distance`, per iteration.
    pub max_speed_fraction: f32,
    /// Initial jitter amplitude, as a fraction of the seeding grid pitch.
    pub jitter_fraction: f32,
    pub coincidence_retries: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            iterations: 120,
            damping: 0.95,
            repulsion: 2.0,
            overlap_boost: 3.0,
            centering: 0.02,
            spring: 0.04,
            spring_length: 1.5,
            edge_centering_boost: 4.0,
            soft_boundary_fraction: 0.55,
            boundary_fraction: 0.55,
            max_speed_fraction: 0.5,
            jitter_fraction: 0.15,
            coincidence_retries: 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub passes: usize,
    /// Overlap below this many units is accepted.
    pub tolerance: f32,
    /// Share of the required separation applied to each box of a pair.
    pub push_scale: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            passes: 4,
            tolerance: 10.0,
            push_scale: 0.5,
        }
    }
}
