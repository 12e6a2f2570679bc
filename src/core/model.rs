use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::dataset::Dataset;
use crate::core::table::ResultTable;
use crate::error::{DashError, DashResult};

/// Factorial analysis family a fitted model belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Pca,
    Ca,
    Mca,
    Famd,
    Mfa,
    MfaQual,
    MfaMix,
    MfaCt,
}

impl AnalysisKind {
    pub const ALL: [Self; 8] = [
        Self::Pca,
        Self::Ca,
        Self::Mca,
        Self::Famd,
        Self::Mfa,
        Self::MfaQual,
        Self::MfaMix,
        Self::MfaCt,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pca => "pca",
            Self::Ca => "ca",
            Self::Mca => "mca",
            Self::Famd => "famd",
            Self::Mfa => "mfa",
            Self::MfaQual => "mfaqual",
            Self::MfaMix => "mfamix",
            Self::MfaCt => "mfact",
        }
    }

    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Pca => "PCA",
            Self::Ca => "CA",
            Self::Mca => "MCA",
            Self::Famd => "FAMD",
            Self::Mfa => "MFA",
            Self::MfaQual => "MFAQUAL",
            Self::MfaMix => "MFAMIX",
            Self::MfaCt => "MFACT",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Pca => "Principal Component Analysis",
            Self::Ca => "Correspondence Analysis",
            Self::Mca => "Multiple Correspondence Analysis",
            Self::Famd => "Factor Analysis of Mixed Data",
            Self::Mfa => "Multiple Factor Analysis",
            Self::MfaQual => "Multiple Factor Analysis for Qualitative Data",
            Self::MfaMix => "Multiple Factor Analysis for Mixed Data",
            Self::MfaCt => "Multiple Factor Analysis for Contingency Tables",
        }
    }

    pub fn from_code(code: &str) -> DashResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| DashError::InvalidData(format!("unknown analysis kind `{code}`")))
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Entity family a result table describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Individuals,
    Variables,
    Rows,
    Columns,
    Categories,
    QualitativeVariables,
    QuantitativeVariables,
    Groups,
    PartialAxes,
    Frequencies,
    SupplementaryIndividuals,
    SupplementaryRows,
    SupplementaryColumns,
    SupplementaryQuantitative,
    SupplementaryQualitative,
    SupplementaryQualitativeVariables,
    SupplementaryGroups,
    SupplementaryFrequencies,
}

impl EntityKind {
    /// Short identifier used to namespace widget and output keys.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Individuals => "ind",
            Self::Variables => "var",
            Self::Rows => "row",
            Self::Columns => "col",
            Self::Categories => "mod",
            Self::QualitativeVariables => "qual",
            Self::QuantitativeVariables => "quant",
            Self::Groups => "group",
            Self::PartialAxes => "axes",
            Self::Frequencies => "freq",
            Self::SupplementaryIndividuals => "ind_sup",
            Self::SupplementaryRows => "row_sup",
            Self::SupplementaryColumns => "col_sup",
            Self::SupplementaryQuantitative => "quanti_sup",
            Self::SupplementaryQualitative => "quali_sup",
            Self::SupplementaryQualitativeVariables => "quali_var_sup",
            Self::SupplementaryGroups => "group_sup",
            Self::SupplementaryFrequencies => "freq_sup",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Individuals => "Individuals",
            Self::Variables => "Variables",
            Self::Rows => "Rows",
            Self::Columns => "Columns",
            Self::Categories => "Categories",
            Self::QualitativeVariables => "Qualitative variables",
            Self::QuantitativeVariables => "Quantitative variables",
            Self::Groups => "Groups",
            Self::PartialAxes => "Partial axes",
            Self::Frequencies => "Frequencies",
            Self::SupplementaryIndividuals => "Supplementary individuals",
            Self::SupplementaryRows => "Supplementary rows",
            Self::SupplementaryColumns => "Supplementary columns",
            Self::SupplementaryQuantitative => "Supplementary quantitative variables",
            Self::SupplementaryQualitative => "Supplementary categories",
            Self::SupplementaryQualitativeVariables => "Supplementary qualitative variables",
            Self::SupplementaryGroups => "Supplementary groups",
            Self::SupplementaryFrequencies => "Supplementary frequencies",
        }
    }

    /// Header of the label column when the entity is shown as a table.
    #[must_use]
    pub const fn row_header(self) -> &'static str {
        match self {
            Self::Individuals | Self::SupplementaryIndividuals => "Individuals",
            Self::Rows | Self::SupplementaryRows => "Rows",
            Self::Columns | Self::SupplementaryColumns => "Columns",
            Self::Categories | Self::SupplementaryQualitative => "Categories",
            Self::Groups | Self::SupplementaryGroups => "Groups",
            Self::PartialAxes => "Axes",
            Self::Frequencies | Self::SupplementaryFrequencies => "Frequencies",
            Self::Variables
            | Self::QualitativeVariables
            | Self::QuantitativeVariables
            | Self::SupplementaryQuantitative
            | Self::SupplementaryQualitativeVariables => "Variables",
        }
    }

    #[must_use]
    pub const fn is_supplementary(self) -> bool {
        matches!(
            self,
            Self::SupplementaryIndividuals
                | Self::SupplementaryRows
                | Self::SupplementaryColumns
                | Self::SupplementaryQuantitative
                | Self::SupplementaryQualitative
                | Self::SupplementaryQualitativeVariables
                | Self::SupplementaryGroups
                | Self::SupplementaryFrequencies
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of per-entity result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Coord,
    Contrib,
    Cos2,
    Vtest,
    Eta2,
    Corr,
    Dist,
}

impl Measure {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Coord => "coord",
            Self::Contrib => "contrib",
            Self::Cos2 => "cos2",
            Self::Vtest => "vtest",
            Self::Eta2 => "eta2",
            Self::Corr => "corr",
            Self::Dist => "dist",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Coord => "Coordinates",
            Self::Contrib => "Contributions",
            Self::Cos2 => "Cos2 - quality of representation",
            Self::Vtest => "V-test",
            Self::Eta2 => "Eta2 - correlation ratio",
            Self::Corr => "Correlations",
            Self::Dist => "Distances",
        }
    }
}

/// Result tables of one entity family, keyed by measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EntityResults {
    tables: IndexMap<Measure, ResultTable>,
}

impl EntityResults {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, measure: Measure, table: ResultTable) -> Self {
        self.tables.insert(measure, table);
        self
    }

    #[must_use]
    pub fn get(&self, measure: Measure) -> Option<&ResultTable> {
        self.tables.get(&measure)
    }

    #[must_use]
    pub fn coord(&self) -> Option<&ResultTable> {
        self.get(Measure::Coord)
    }

    pub fn measures(&self) -> impl Iterator<Item = Measure> + '_ {
        self.tables.keys().copied()
    }

    /// Labels of the entities, taken from the coordinate table when present.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        self.coord()
            .or_else(|| self.tables.values().next())
            .map_or(&[], |table| table.index.as_slice())
    }
}

/// Per-dimension characterisation produced by the statistics library.
///
/// Tables carry every candidate with its `pvalue` column; significance
/// filtering happens in the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDescription {
    pub dimension: String,
    #[serde(default)]
    pub quantitative: Option<ResultTable>,
    #[serde(default)]
    pub qualitative: Option<ResultTable>,
    #[serde(default)]
    pub categories: Option<ResultTable>,
}

/// Immutable fitted factorial analysis supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub kind: AnalysisKind,
    pub n_components: usize,
    pub eig: ResultTable,
    pub entities: IndexMap<EntityKind, EntityResults>,
    #[serde(default)]
    pub data: Option<Dataset>,
    #[serde(default)]
    pub dimdesc: Vec<DimensionDescription>,
}

impl FittedModel {
    pub fn validate(&self) -> DashResult<()> {
        if self.n_components == 0 {
            return Err(self.invalid("model must have at least one component"));
        }
        self.eig.validate()?;
        if self.eig.len() < self.n_components {
            return Err(self.invalid(&format!(
                "eigenvalue table has {} rows, expected at least {}",
                self.eig.len(),
                self.n_components
            )));
        }

        let required_dims = self.n_components.min(2);
        for (entity, results) in &self.entities {
            for measure in results.measures() {
                if let Some(table) = results.get(measure) {
                    table.validate()?;
                }
            }
            if let Some(coord) = results.coord() {
                if coord.column_count() < required_dims {
                    return Err(self.invalid(&format!(
                        "{entity} coordinates have {} columns, expected at least {required_dims}",
                        coord.column_count()
                    )));
                }
            }
        }

        if let Some(data) = &self.data {
            data.validate()?;
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> DashError {
        DashError::InvalidModel {
            expected: self.kind.short_name().to_owned(),
            found: reason.to_owned(),
        }
    }

    #[must_use]
    pub fn entity(&self, entity: EntityKind) -> Option<&EntityResults> {
        self.entities.get(&entity)
    }

    #[must_use]
    pub fn has_entity(&self, entity: EntityKind) -> bool {
        self.entities.contains_key(&entity)
    }

    #[must_use]
    pub fn table(&self, entity: EntityKind, measure: Measure) -> Option<&ResultTable> {
        self.entity(entity).and_then(|results| results.get(measure))
    }

    /// Number of dimensions that can be plotted.
    #[must_use]
    pub fn plottable_dimensions(&self) -> usize {
        self.entities
            .values()
            .filter_map(EntityResults::coord)
            .map(ResultTable::column_count)
            .min()
            .map_or(self.n_components, |columns| columns.min(self.n_components))
    }

    #[must_use]
    pub fn eigenvalue(&self, dimension: usize) -> Option<f64> {
        let column = self.eig.column_position("eigenvalue").unwrap_or(0);
        self.eig.value(dimension, column)
    }

    /// Explained-variance percentage of `dimension`, when the table carries it.
    #[must_use]
    pub fn proportion(&self, dimension: usize) -> Option<f64> {
        let column = self.eig.column_position("proportion")?;
        self.eig.value(dimension, column)
    }

    /// Axis title such as `Dim.1 (44.73%)`.
    #[must_use]
    pub fn dimension_label(&self, dimension: usize) -> String {
        match self.proportion(dimension) {
            Some(proportion) => format!("Dim.{} ({proportion:.2}%)", dimension + 1),
            None => format!("Dim.{}", dimension + 1),
        }
    }

    #[must_use]
    pub fn dimension_description(&self, dimension: &str) -> Option<&DimensionDescription> {
        self.dimdesc
            .iter()
            .find(|description| description.dimension == dimension)
    }

    /// Names of the quantitative columns available for coloring.
    #[must_use]
    pub fn quantitative_variables(&self) -> Vec<String> {
        self.data
            .as_ref()
            .and_then(|data| data.quantitative.as_ref())
            .map(|table| table.columns.clone())
            .unwrap_or_default()
    }

    /// Names of the qualitative columns available for coloring.
    #[must_use]
    pub fn qualitative_variables(&self) -> Vec<String> {
        self.data
            .as_ref()
            .and_then(|data| data.qualitative.as_ref())
            .map(|table| table.columns.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_kind_codes_round_trip() {
        for kind in AnalysisKind::ALL {
            assert_eq!(AnalysisKind::from_code(kind.code()).expect("code"), kind);
        }
        assert!(AnalysisKind::from_code("lda").is_err());
    }

    #[test]
    fn supplementary_entities_are_flagged() {
        assert!(EntityKind::SupplementaryIndividuals.is_supplementary());
        assert!(!EntityKind::Individuals.is_supplementary());
        assert_eq!(EntityKind::SupplementaryQualitative.row_header(), "Categories");
    }
}
