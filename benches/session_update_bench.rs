use criterion::{Criterion, criterion_group, criterion_main};
use factor_dash::api::{build_factor_map, Dashboard, FactorMapOptions, LabelFilter};
use factor_dash::core::{
    AnalysisKind, AxisPair, EntityKind, EntityResults, FittedModel, Measure, ResultTable, Viewport,
};
use factor_dash::AppOptions;
use indexmap::IndexMap;
use std::hint::black_box;

const INDIVIDUALS: usize = 2_000;
const DIMENSIONS: usize = 5;

fn generated_table(rows: usize, scale: f64) -> ResultTable {
    let index = (0..rows).map(|row| format!("ind{row}")).collect();
    let columns = (1..=DIMENSIONS).map(|dimension| format!("Dim.{dimension}")).collect();
    let data = (0..rows)
        .map(|row| {
            (0..DIMENSIONS)
                .map(|dimension| ((row * 31 + dimension * 17) % 97) as f64 / 97.0 * scale)
                .collect()
        })
        .collect();
    ResultTable::new(index, columns, data).expect("generated table")
}

fn generated_model() -> FittedModel {
    let eigenvalues = [2.4, 1.3, 0.7, 0.4, 0.2];
    let total: f64 = eigenvalues.iter().sum();
    let eig = ResultTable::new(
        (1..=DIMENSIONS).map(|dimension| format!("Dim.{dimension}")).collect(),
        vec!["eigenvalue".to_owned(), "proportion".to_owned()],
        eigenvalues.iter().map(|value| vec![*value, value / total * 100.0]).collect(),
    )
    .expect("eigenvalues");

    let mut entities = IndexMap::new();
    entities.insert(
        EntityKind::Individuals,
        EntityResults::new()
            .with_table(Measure::Coord, generated_table(INDIVIDUALS, 4.0))
            .with_table(Measure::Cos2, generated_table(INDIVIDUALS, 0.5))
            .with_table(Measure::Contrib, generated_table(INDIVIDUALS, 0.1)),
    );
    FittedModel {
        kind: AnalysisKind::Pca,
        n_components: DIMENSIONS,
        eig,
        entities,
        data: None,
        dimdesc: Vec::new(),
    }
}

fn bench_factor_map_build(c: &mut Criterion) {
    let model = generated_model();
    let options = FactorMapOptions::new(EntityKind::Individuals, AxisPair::new(0, 1, DIMENSIONS).expect("axes"))
        .with_label_filter(LabelFilter::Cos2(0.4));

    c.bench_function("factor_map_build_2k", |b| {
        b.iter(|| build_factor_map(black_box(&model), black_box(&options)).expect("map"))
    });
}

fn bench_color_mode_update(c: &mut Criterion) {
    let dashboard = Dashboard::pca(generated_model(), AppOptions::default()).expect("dashboard");
    let mut session = dashboard.session().expect("session");
    let modes = ["cos2", "contrib", "status"];
    let mut next = 0;

    c.bench_function("session_color_mode_update_2k", |b| {
        b.iter(|| {
            next = (next + 1) % modes.len();
            let report = session
                .set_input("map.ind.color_mode", modes[next])
                .expect("update");
            black_box(report);
        })
    });
}

fn bench_map_render_frame(c: &mut Criterion) {
    let model = generated_model();
    let options = FactorMapOptions::new(EntityKind::Individuals, AxisPair::new(0, 1, DIMENSIONS).expect("axes"));
    let chart = build_factor_map(&model, &options).expect("map");

    c.bench_function("factor_map_render_frame_2k", |b| {
        b.iter(|| chart.to_render_frame(black_box(Viewport::new(1200, 800))).expect("frame"))
    });
}

criterion_group!(
    benches,
    bench_factor_map_build,
    bench_color_mode_update,
    bench_map_render_frame
);
criterion_main!(benches);
