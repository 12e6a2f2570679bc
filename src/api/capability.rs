use serde::Serialize;

use crate::core::{AnalysisKind, EntityKind, FittedModel, Measure};

/// Coloring modes a factor map may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorModeKind {
    Status,
    Cos2,
    Contrib,
    Quantitative,
    Qualitative,
}

impl ColorModeKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Cos2 => "cos2",
            Self::Contrib => "contrib",
            Self::Quantitative => "quanti",
            Self::Qualitative => "quali",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Status => "Active / supplementary",
            Self::Cos2 => "Cos2",
            Self::Contrib => "Contribution",
            Self::Quantitative => "Quantitative variable",
            Self::Qualitative => "Qualitative variable",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        [
            Self::Status,
            Self::Cos2,
            Self::Contrib,
            Self::Quantitative,
            Self::Qualitative,
        ]
        .into_iter()
        .find(|mode| mode.code() == code)
    }
}

/// One factor map of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorMapSpec {
    /// Prefix of the map's widget and output keys, such as `map.ind`.
    pub key: String,
    pub title: String,
    pub active: EntityKind,
    /// Supplementary groups drawn on this map that the model actually carries.
    pub supplementary: Vec<EntityKind>,
    pub arrows: bool,
    pub color_modes: Vec<ColorModeKind>,
    pub label_by_cos2: bool,
    pub label_by_contrib: bool,
}

impl FactorMapSpec {
    #[must_use]
    pub fn has_supplementary_points(&self) -> bool {
        self.supplementary
            .iter()
            .any(|entity| *entity != EntityKind::SupplementaryQualitative)
    }

    #[must_use]
    pub fn has_categories(&self) -> bool {
        self.supplementary.contains(&EntityKind::SupplementaryQualitative)
    }
}

/// Result tables shown for one entity in the values tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSection {
    pub entity: EntityKind,
    pub measures: Vec<Measure>,
}

impl ResultSection {
    /// Measures that get a bar chart and a correlation-plot modal.
    #[must_use]
    pub fn charted_measures(&self) -> Vec<Measure> {
        if self.entity.is_supplementary() {
            return Vec::new();
        }
        self.measures
            .iter()
            .copied()
            .filter(|measure| matches!(measure, Measure::Contrib | Measure::Cos2))
            .collect()
    }
}

/// What a given model allows the dashboard to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capability {
    pub kind: AnalysisKind,
    pub dimensions: usize,
    pub factor_maps: Vec<FactorMapSpec>,
    pub sections: Vec<ResultSection>,
    pub quantitative_variables: Vec<String>,
    pub qualitative_variables: Vec<String>,
    pub dimdesc_dimensions: Vec<String>,
    pub has_dataset: bool,
}

/// Declared layout of a factor map before model contents are checked.
struct MapTemplate {
    key: &'static str,
    title: &'static str,
    active: EntityKind,
    supplementary: &'static [EntityKind],
    arrows: bool,
    colored_by_data: bool,
}

const fn map(
    key: &'static str,
    title: &'static str,
    active: EntityKind,
    supplementary: &'static [EntityKind],
) -> MapTemplate {
    MapTemplate {
        key,
        title,
        active,
        supplementary,
        arrows: false,
        colored_by_data: false,
    }
}

const fn with_arrows(mut template: MapTemplate) -> MapTemplate {
    template.arrows = true;
    template
}

const fn colored_by_data(mut template: MapTemplate) -> MapTemplate {
    template.colored_by_data = true;
    template
}

fn map_templates(kind: AnalysisKind) -> Vec<MapTemplate> {
    use EntityKind as E;

    let individuals = colored_by_data(map(
        "ind",
        "Individuals factor map",
        E::Individuals,
        &[E::SupplementaryIndividuals, E::SupplementaryQualitative],
    ));
    match kind {
        AnalysisKind::Pca => vec![
            individuals,
            with_arrows(map(
                "var",
                "Variables factor map",
                E::Variables,
                &[E::SupplementaryQuantitative],
            )),
        ],
        AnalysisKind::Ca => vec![
            map("row", "Row points factor map", E::Rows, &[E::SupplementaryRows]),
            map("col", "Column points factor map", E::Columns, &[E::SupplementaryColumns]),
        ],
        AnalysisKind::Mca => vec![
            colored_by_data(map(
                "ind",
                "Individuals factor map",
                E::Individuals,
                &[E::SupplementaryIndividuals],
            )),
            map(
                "mod",
                "Categories factor map",
                E::Categories,
                &[E::SupplementaryQualitative],
            ),
            map(
                "var",
                "Variables representation",
                E::QualitativeVariables,
                &[E::SupplementaryQualitativeVariables],
            ),
        ],
        AnalysisKind::Famd => vec![
            individuals,
            with_arrows(map(
                "quanti",
                "Quantitative variables factor map",
                E::QuantitativeVariables,
                &[E::SupplementaryQuantitative],
            )),
            map(
                "mod",
                "Categories factor map",
                E::Categories,
                &[E::SupplementaryQualitative],
            ),
            map(
                "var",
                "Variables representation",
                E::Variables,
                &[E::SupplementaryQualitativeVariables],
            ),
        ],
        AnalysisKind::Mfa | AnalysisKind::MfaQual | AnalysisKind::MfaMix | AnalysisKind::MfaCt => {
            let mut maps = vec![
                colored_by_data(map(
                    "ind",
                    "Individuals factor map",
                    E::Individuals,
                    &[E::SupplementaryIndividuals, E::SupplementaryQualitative],
                )),
                map("group", "Groups representation", E::Groups, &[E::SupplementaryGroups]),
                with_arrows(map("axes", "Partial axes", E::PartialAxes, &[])),
            ];
            if matches!(kind, AnalysisKind::Mfa | AnalysisKind::MfaMix) {
                maps.push(with_arrows(map(
                    "quanti",
                    "Quantitative variables factor map",
                    E::QuantitativeVariables,
                    &[E::SupplementaryQuantitative],
                )));
            }
            if matches!(kind, AnalysisKind::MfaQual | AnalysisKind::MfaMix) {
                maps.push(map("mod", "Categories factor map", E::Categories, &[]));
            }
            if kind == AnalysisKind::MfaCt {
                maps.push(map(
                    "freq",
                    "Frequencies factor map",
                    E::Frequencies,
                    &[E::SupplementaryFrequencies],
                ));
            }
            maps
        }
    }
}

impl Capability {
    /// Derives the capability descriptor from what `model` carries.
    #[must_use]
    pub fn of(model: &FittedModel) -> Self {
        let dimensions = model.plottable_dimensions();
        let quantitative_variables = model.quantitative_variables();
        let qualitative_variables = model.qualitative_variables();

        let factor_maps = if dimensions < 2 {
            Vec::new()
        } else {
            map_templates(model.kind)
                .into_iter()
                .filter(|template| model.table(template.active, Measure::Coord).is_some())
                .map(|template| {
                    let supplementary: Vec<EntityKind> = template
                        .supplementary
                        .iter()
                        .copied()
                        .filter(|entity| model.table(*entity, Measure::Coord).is_some())
                        .collect();
                    let has_cos2 = model.table(template.active, Measure::Cos2).is_some();
                    let has_contrib = model.table(template.active, Measure::Contrib).is_some();

                    let mut color_modes = vec![ColorModeKind::Status];
                    if has_cos2 {
                        color_modes.push(ColorModeKind::Cos2);
                    }
                    if has_contrib {
                        color_modes.push(ColorModeKind::Contrib);
                    }
                    if template.colored_by_data && !quantitative_variables.is_empty() {
                        color_modes.push(ColorModeKind::Quantitative);
                    }
                    if template.colored_by_data && !qualitative_variables.is_empty() {
                        color_modes.push(ColorModeKind::Qualitative);
                    }

                    FactorMapSpec {
                        key: format!("map.{}", template.key),
                        title: template.title.to_owned(),
                        active: template.active,
                        supplementary,
                        arrows: template.arrows,
                        color_modes,
                        label_by_cos2: has_cos2,
                        label_by_contrib: has_contrib,
                    }
                })
                .collect()
        };

        let sections = model
            .entities
            .iter()
            .map(|(entity, results)| ResultSection {
                entity: *entity,
                measures: results.measures().collect(),
            })
            .filter(|section| !section.measures.is_empty())
            .collect();

        let dimdesc_dimensions = model
            .dimdesc
            .iter()
            .take(3.min(model.n_components))
            .map(|description| description.dimension.clone())
            .collect();

        Self {
            kind: model.kind,
            dimensions,
            factor_maps,
            sections,
            quantitative_variables,
            qualitative_variables,
            dimdesc_dimensions,
            has_dataset: model.data.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_mode_codes_round_trip() {
        for mode in [
            ColorModeKind::Status,
            ColorModeKind::Cos2,
            ColorModeKind::Contrib,
            ColorModeKind::Quantitative,
            ColorModeKind::Qualitative,
        ] {
            assert_eq!(ColorModeKind::from_code(mode.code()), Some(mode));
        }
    }
}
