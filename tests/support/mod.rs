#![allow(dead_code)]

use factor_dash::core::{
    AnalysisKind, CategoricalTable, Dataset, DimensionDescription, EntityKind, EntityResults,
    FittedModel, Measure, ResultTable,
};
use indexmap::IndexMap;

pub const INDIVIDUALS: [&str; 5] = ["ind1", "ind2", "ind3", "ind4", "ind5"];
pub const VARIABLES: [&str; 3] = ["height", "weight", "age"];

pub fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

pub fn dims(count: usize) -> Vec<String> {
    (1..=count).map(|dimension| format!("Dim.{dimension}")).collect()
}

pub fn table(index: &[&str], columns: Vec<String>, data: Vec<Vec<f64>>) -> ResultTable {
    ResultTable::new(labels(index), columns, data).expect("fixture table")
}

pub fn eigenvalues(values: &[f64]) -> ResultTable {
    let total: f64 = values.iter().sum();
    let mut cumulative = 0.0;
    let rows = values
        .iter()
        .map(|value| {
            let proportion = value / total * 100.0;
            cumulative += proportion;
            vec![*value, proportion, cumulative]
        })
        .collect();
    ResultTable::new(
        dims(values.len()),
        vec!["eigenvalue".into(), "proportion".into(), "cumulative".into()],
        rows,
    )
    .expect("eigenvalue table")
}

/// PCA on 5 individuals and 3 variables with 3 retained dimensions.
pub fn pca_model() -> FittedModel {
    let ind = EntityResults::new()
        .with_table(
            Measure::Coord,
            table(
                &INDIVIDUALS,
                dims(3),
                vec![
                    vec![2.1, 0.4, -0.3],
                    vec![-1.2, 1.5, 0.2],
                    vec![0.3, -1.8, 0.5],
                    vec![-2.0, -0.6, -0.1],
                    vec![0.8, 0.5, -0.3],
                ],
            ),
        )
        .with_table(
            Measure::Cos2,
            table(
                &INDIVIDUALS,
                dims(3),
                vec![
                    vec![0.94, 0.03, 0.02],
                    vec![0.38, 0.60, 0.02],
                    vec![0.03, 0.90, 0.07],
                    vec![0.91, 0.08, 0.01],
                    vec![0.45, 0.18, 0.15],
                ],
            ),
        )
        .with_table(
            Measure::Contrib,
            table(
                &INDIVIDUALS,
                dims(3),
                vec![
                    vec![43.0, 2.6, 22.5],
                    vec![14.0, 36.0, 10.0],
                    vec![0.9, 52.0, 62.5],
                    vec![39.0, 5.8, 2.5],
                    vec![3.1, 3.6, 2.5],
                ],
            ),
        );

    let var = EntityResults::new()
        .with_table(
            Measure::Coord,
            table(
                &VARIABLES,
                dims(3),
                vec![vec![0.9, 0.2, 0.1], vec![0.8, -0.4, 0.2], vec![-0.3, 0.9, 0.3]],
            ),
        )
        .with_table(
            Measure::Cos2,
            table(
                &VARIABLES,
                dims(3),
                vec![vec![0.81, 0.04, 0.01], vec![0.64, 0.16, 0.04], vec![0.09, 0.81, 0.09]],
            ),
        )
        .with_table(
            Measure::Contrib,
            table(
                &VARIABLES,
                dims(3),
                vec![vec![52.0, 4.0, 7.0], vec![41.0, 16.0, 29.0], vec![7.0, 80.0, 64.0]],
            ),
        );

    let mut entities = IndexMap::new();
    entities.insert(EntityKind::Individuals, ind);
    entities.insert(EntityKind::Variables, var);

    FittedModel {
        kind: AnalysisKind::Pca,
        n_components: 3,
        eig: eigenvalues(&[1.54, 1.01, 0.45]),
        entities,
        data: Some(pca_dataset()),
        dimdesc: vec![DimensionDescription {
            dimension: "Dim.1".to_owned(),
            quantitative: Some(table(
                &["height", "weight", "age"],
                vec!["correlation".into(), "pvalue".into()],
                vec![vec![0.9, 0.01], vec![0.8, 0.04], vec![-0.3, 0.6]],
            )),
            qualitative: None,
            categories: None,
        }],
    }
}

pub fn pca_dataset() -> Dataset {
    Dataset {
        quantitative: Some(table(
            &INDIVIDUALS,
            labels(&VARIABLES),
            vec![
                vec![180.0, 80.0, 34.0],
                vec![165.0, 60.0, 51.0],
                vec![172.0, 71.0, 22.0],
                vec![158.0, 52.0, 45.0],
                vec![176.0, 77.0, 30.0],
            ],
        )),
        qualitative: Some(CategoricalTable {
            index: labels(&INDIVIDUALS),
            columns: vec!["sex".to_owned()],
            data: ["M", "F", "M", "F", "M"]
                .iter()
                .map(|value| vec![(*value).to_owned()])
                .collect(),
        }),
        supplementary_rows: Vec::new(),
    }
}

/// PCA fixture with 2 supplementary individuals.
pub fn pca_model_with_supplementary() -> FittedModel {
    let mut model = pca_model();
    model.entities.insert(
        EntityKind::SupplementaryIndividuals,
        EntityResults::new().with_table(
            Measure::Coord,
            table(
                &["sup1", "sup2"],
                dims(3),
                vec![vec![1.0, 1.0, 0.0], vec![-0.5, 0.7, 0.1]],
            ),
        ),
    );
    model
}

/// PCA fixture restricted to its first two dimensions.
pub fn two_dimensional_pca_model() -> FittedModel {
    let mut model = pca_model();
    model.n_components = 2;
    model
}

/// CA on a 3 x 3 contingency table.
pub fn ca_model() -> FittedModel {
    let rows = ["r1", "r2", "r3"];
    let cols = ["c1", "c2", "c3"];
    let mut entities = IndexMap::new();
    entities.insert(
        EntityKind::Rows,
        EntityResults::new().with_table(
            Measure::Coord,
            table(&rows, dims(2), vec![vec![0.5, 0.1], vec![-0.3, 0.4], vec![-0.2, -0.5]]),
        ),
    );
    entities.insert(
        EntityKind::Columns,
        EntityResults::new().with_table(
            Measure::Coord,
            table(&cols, dims(2), vec![vec![0.6, -0.1], vec![-0.4, 0.3], vec![0.1, -0.6]]),
        ),
    );
    FittedModel {
        kind: AnalysisKind::Ca,
        n_components: 2,
        eig: eigenvalues(&[0.3, 0.1]),
        entities,
        data: None,
        dimdesc: Vec::new(),
    }
}

/// Result table with `rows` labelled rows `row1..` on 2 dimensions.
pub fn numbered_table(rows: usize) -> ResultTable {
    let index: Vec<String> = (1..=rows).map(|row| format!("row{row}")).collect();
    let data = (0..rows)
        .map(|row| vec![row as f64, (rows - row) as f64])
        .collect();
    ResultTable::new(index, dims(2), data).expect("numbered table")
}

/// PCA on 8 individuals and 4 variables with `dimensions` retained axes and
/// deterministic, well-spread results.
pub fn generated_pca_model(dimensions: usize) -> FittedModel {
    let individuals: Vec<String> = (1..=8).map(|row| format!("ind{row}")).collect();
    let variables: Vec<String> = (1..=4).map(|row| format!("var{row}")).collect();
    let generated = |index: &[String], scale: f64, signed: bool| {
        let data = (0..index.len())
            .map(|row| {
                (0..dimensions)
                    .map(|dimension| {
                        let unit = ((row * 31 + dimension * 17) % 97) as f64 / 97.0;
                        if signed { (unit - 0.5) * 2.0 * scale } else { unit * scale }
                    })
                    .collect()
            })
            .collect();
        ResultTable::new(index.to_vec(), dims(dimensions), data).expect("generated table")
    };

    let mut entities = IndexMap::new();
    entities.insert(
        EntityKind::Individuals,
        EntityResults::new()
            .with_table(Measure::Coord, generated(&individuals, 3.0, true))
            .with_table(Measure::Cos2, generated(&individuals, 0.5, false))
            .with_table(Measure::Contrib, generated(&individuals, 25.0, false)),
    );
    entities.insert(
        EntityKind::Variables,
        EntityResults::new()
            .with_table(Measure::Coord, generated(&variables, 0.9, true))
            .with_table(Measure::Cos2, generated(&variables, 0.5, false))
            .with_table(Measure::Contrib, generated(&variables, 40.0, false)),
    );

    let eig: Vec<f64> = (0..dimensions).map(|dimension| 3.0 / (dimension as f64 + 1.0)).collect();
    FittedModel {
        kind: AnalysisKind::Pca,
        n_components: dimensions,
        eig: eigenvalues(&eig),
        entities,
        data: None,
        dimdesc: Vec::new(),
    }
}
