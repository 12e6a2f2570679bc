mod support;

use approx::assert_relative_eq;
use factor_dash::api::{
    build_bar_chart, build_scree_plot, expected_contribution, BarChartOptions, ChartBody,
    ScreeChoice, SCREE_MAX_BARS,
};
use factor_dash::core::{EntityKind, Measure};
use support::{eigenvalues, pca_model};

fn bar_labels(chart: &factor_dash::api::Chart) -> Vec<&str> {
    chart.bars().iter().map(|bar| bar.label.as_str()).collect()
}

#[test]
fn contributions_are_sorted_descending_and_truncated() {
    let model = pca_model();
    let table = model.table(EntityKind::Individuals, Measure::Contrib).expect("contrib");
    let options = BarChartOptions {
        top_n: 3,
        reference_line: expected_contribution(table.len()),
        ..BarChartOptions::default()
    };
    let chart = build_bar_chart(table, EntityKind::Individuals, Measure::Contrib, &options).expect("chart");

    assert_eq!(bar_labels(&chart), vec!["ind1", "ind4", "ind2"]);
    assert_eq!(chart.title, "Contribution of individuals to Dim-1");
    match &chart.body {
        ChartBody::Bars(plot) => {
            let line = plot.reference_line.as_ref().expect("reference line");
            assert_relative_eq!(line.value, 20.0);
        }
        other => panic!("expected bars, got {other:?}"),
    }
}

#[test]
fn top_n_beyond_the_row_count_keeps_every_row() {
    let model = pca_model();
    let table = model.table(EntityKind::Variables, Measure::Cos2).expect("cos2");
    let options = BarChartOptions {
        dimension: 1,
        top_n: 50,
        ..BarChartOptions::default()
    };
    let chart = build_bar_chart(table, EntityKind::Variables, Measure::Cos2, &options).expect("chart");

    assert_eq!(bar_labels(&chart), vec!["age", "weight", "height"]);
    assert_eq!(chart.y_title, "Cos2 - Quality of representation");
}

#[test]
fn invalid_dimension_and_width_are_rejected() {
    let model = pca_model();
    let table = model.table(EntityKind::Individuals, Measure::Cos2).expect("cos2");
    let wide = BarChartOptions {
        bar_width: 1.5,
        ..BarChartOptions::default()
    };
    assert!(build_bar_chart(table, EntityKind::Individuals, Measure::Cos2, &wide).is_err());

    let beyond = BarChartOptions {
        dimension: 3,
        ..BarChartOptions::default()
    };
    assert!(build_bar_chart(table, EntityKind::Individuals, Measure::Cos2, &beyond).is_err());
}

#[test]
fn scree_plot_follows_the_selected_column() {
    let model = pca_model();
    let chart = build_scree_plot(&model, ScreeChoice::Proportion, true).expect("scree");
    assert_eq!(bar_labels(&chart), vec!["1", "2", "3"]);
    assert_relative_eq!(chart.bars()[0].value, 51.333_333, epsilon = 1e-5);

    let chart = build_scree_plot(&model, ScreeChoice::Eigenvalue, false).expect("scree");
    assert_relative_eq!(chart.bars()[1].value, 1.01);
    assert_eq!(chart.y_title, "Eigenvalue");
}

#[test]
fn scree_plot_shows_at_most_ten_dimensions() {
    let mut model = pca_model();
    model.eig = eigenvalues(&[12.0, 11.0, 10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
    let chart = build_scree_plot(&model, ScreeChoice::Eigenvalue, false).expect("scree");
    assert_eq!(chart.bars().len(), SCREE_MAX_BARS);
    match &chart.body {
        ChartBody::Bars(plot) => assert_eq!(plot.curve.len(), SCREE_MAX_BARS),
        other => panic!("expected bars, got {other:?}"),
    }
}

#[test]
fn expected_contribution_is_uniform_share() {
    assert_eq!(expected_contribution(0), None);
    assert_relative_eq!(expected_contribution(4).expect("share"), 25.0);
}
