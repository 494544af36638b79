#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Design-pattern reference parameters and adherence report types.
//!
//! Each design pattern is identified by its number and carries the ideal
//! population, density and area ranges a community built on it should fall
//! into. Reports compare detected clusters against those ranges.

use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` range, serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct ParameterRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl ParameterRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    #[must_use]
    pub fn is_below(&self, value: f64) -> bool {
        value < self.min
    }

    #[must_use]
    pub fn is_above(&self, value: f64) -> bool {
        value > self.max
    }

    #[must_use]
    pub fn midpoint(&self) -> f64 {
        f64::midpoint(self.min, self.max)
    }
}

impl From<(f64, f64)> for ParameterRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

impl From<ParameterRange> for (f64, f64) {
    fn from(range: ParameterRange) -> Self {
        (range.min, range.max)
    }
}

impl std::fmt::Display for ParameterRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Ideal ranges a cluster is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternIdealParameters {
    /// Estimated people.
    pub population_range: ParameterRange,
    /// People per km².
    pub density_range: ParameterRange,
    /// Area in km².
    pub area_range: ParameterRange,
}

/// A named design pattern with its ideal parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDefinition {
    /// Pattern number.
    pub number: u32,
    /// Human-readable name.
    pub name: String,
    /// One-sentence description.
    #[serde(default)]
    pub summary: String,
    /// Ideal estimated population.
    #[serde(alias = "population_range")]
    pub population_range: ParameterRange,
    /// Ideal density in people per km².
    #[serde(alias = "density_range")]
    pub density_range: ParameterRange,
    /// Ideal area in km².
    #[serde(alias = "area_range")]
    pub area_range: ParameterRange,
    /// Words that suggest this pattern in free text.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl PatternDefinition {
    #[must_use]
    pub const fn ideal(&self) -> PatternIdealParameters {
        PatternIdealParameters {
            population_range: self.population_range,
            density_range: self.density_range,
            area_range: self.area_range,
        }
    }
}

/// Outcome of comparing one cluster with a pattern's ideal parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceScore {
    /// Adherence in `[0, 1]`; 1 means every check passed.
    pub adherence: f64,
    /// Suggested changes, one per failed check.
    pub recommendations: Vec<String>,
    /// Description of each failed check.
    pub deviations: Vec<String>,
}

/// Adherence of a single cluster, with the figures it was judged on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAdherence {
    /// Run-local cluster id.
    pub cluster_id: String,
    /// Pattern the cluster was compared with.
    pub pattern_number: u32,
    /// Estimated population of the cluster.
    pub estimated_population: u64,
    /// Density of the cluster in people per km².
    pub density: f64,
    /// Area of the cluster in km².
    pub area_km2: f64,
    /// Scoring outcome.
    #[serde(flatten)]
    pub score: AdherenceScore,
}

/// Aggregate interpretation of a set of clusters against one pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretationReport {
    /// Pattern the clusters were compared with.
    pub pattern_number: u32,
    /// Pattern name.
    pub pattern_name: String,
    /// Number of clusters analyzed.
    pub total_clusters: usize,
    /// Clusters with adherence above the conformance threshold.
    pub conforming_clusters: usize,
    /// Mean adherence, 0 when there are no clusters.
    pub mean_adherence: f64,
    /// Per-cluster results, in cluster order.
    pub clusters: Vec<ClusterAdherence>,
    /// System-level recommendations.
    pub recommendations: Vec<String>,
}

/// A pattern ranked by contextual inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    /// Pattern number.
    pub number: u32,
    /// Pattern name.
    pub name: String,
    /// Inference score in `[0, 1]`.
    pub score: f64,
}
