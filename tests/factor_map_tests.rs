mod support;

use approx::assert_relative_eq;
use factor_dash::api::{
    build_factor_map, ChartBody, ColorMode, FactorMapOptions, LabelFilter, PointGroup,
};
use factor_dash::core::{AxisPair, EntityKind};
use factor_dash::DashError;
use support::{ca_model, pca_model, pca_model_with_supplementary, two_dimensional_pca_model};

fn first_plane() -> AxisPair {
    AxisPair::new(0, 1, 3).expect("axes")
}

fn scatter(chart: &factor_dash::api::Chart) -> &factor_dash::api::ScatterPlot {
    match &chart.body {
        ChartBody::Scatter(scatter) => scatter,
        other => panic!("expected a scatter plot, got {other:?}"),
    }
}

#[test]
fn individuals_map_plots_every_active_point() {
    let model = pca_model();
    let chart = build_factor_map(&model, &FactorMapOptions::new(EntityKind::Individuals, first_plane()))
        .expect("map");

    assert_eq!(chart.point_count(), 5);
    assert_eq!(chart.labelled_count(), 5);
    assert_eq!(chart.x_title, "Dim.1 (51.33%)");
    assert_eq!(chart.y_title, "Dim.2 (33.67%)");
    let plot = scatter(&chart);
    assert!(plot.points.iter().all(|point| point.group == PointGroup::Active));
    assert!(plot.legend.is_empty());
    assert!(!plot.unit_circle);
    assert_relative_eq!(plot.points[2].y, -1.8);
}

#[test]
fn two_dimensional_model_plots_five_points_by_status() {
    let model = two_dimensional_pca_model();
    let axes = AxisPair::new(0, 1, model.n_components).expect("axes");
    let options = FactorMapOptions::new(EntityKind::Individuals, axes)
        .with_color_mode(ColorMode::Status)
        .with_supplementary(vec![EntityKind::SupplementaryIndividuals]);
    let chart = build_factor_map(&model, &options).expect("no supplementary individuals is fine");

    assert_eq!(chart.point_count(), 5);
    assert_eq!(chart.axes(), Some(axes));
    let plot = scatter(&chart);
    assert!(plot.points.iter().all(|point| point.group == PointGroup::Active));
    assert!(plot.legend.is_empty());
}

#[test]
fn supplementary_points_join_in_their_own_group() {
    let model = pca_model_with_supplementary();
    let options = FactorMapOptions::new(EntityKind::Individuals, first_plane())
        .with_supplementary(vec![EntityKind::SupplementaryIndividuals]);
    let chart = build_factor_map(&model, &options).expect("map");

    assert_eq!(chart.point_count(), 7);
    let plot = scatter(&chart);
    let supplementary = plot
        .points
        .iter()
        .filter(|point| point.group == PointGroup::Supplementary)
        .count();
    assert_eq!(supplementary, 2);
    assert_eq!(plot.legend.len(), 2);
}

#[test]
fn variables_are_drawn_as_arrows_in_the_unit_circle() {
    let model = pca_model();
    let options = FactorMapOptions::new(EntityKind::Variables, first_plane()).with_arrows(true);
    let chart = build_factor_map(&model, &options).expect("map");

    let plot = scatter(&chart);
    assert!(plot.unit_circle);
    assert_eq!(plot.arrows.len(), 3);
    assert!(plot.points.is_empty());
}

#[test]
fn cos2_filter_hides_labels_of_poorly_represented_points() {
    let model = pca_model();
    let options = FactorMapOptions::new(EntityKind::Individuals, first_plane())
        .with_label_filter(LabelFilter::Cos2(0.9));
    let chart = build_factor_map(&model, &options).expect("map");

    // Plane cos2: 0.97, 0.98, 0.93, 0.99, 0.63.
    assert_eq!(chart.point_count(), 5);
    assert_eq!(chart.labelled_count(), 4);
    let hidden: Vec<&str> = scatter(&chart)
        .points
        .iter()
        .filter(|point| !point.show_label)
        .map(|point| point.label.as_str())
        .collect();
    assert_eq!(hidden, vec!["ind5"]);
}

#[test]
fn contribution_filter_keeps_points_at_the_threshold() {
    let model = pca_model();
    let options = FactorMapOptions::new(EntityKind::Individuals, first_plane())
        .with_label_filter(LabelFilter::Contrib(100.0));
    let chart = build_factor_map(&model, &options).expect("map");
    assert_eq!(chart.labelled_count(), 0);

    let options = FactorMapOptions::new(EntityKind::Individuals, first_plane())
        .with_label_filter(LabelFilter::Contrib(0.0));
    let chart = build_factor_map(&model, &options).expect("map");
    assert_eq!(chart.labelled_count(), 5);
}

#[test]
fn label_filter_without_its_measure_keeps_every_label() {
    let model = ca_model();
    let options = FactorMapOptions::new(EntityKind::Rows, AxisPair::new(0, 1, 2).expect("axes"))
        .with_label_filter(LabelFilter::Cos2(0.99));
    let chart = build_factor_map(&model, &options).expect("map");
    assert_eq!(chart.labelled_count(), 3);
}

#[test]
fn gradient_coloring_spans_the_plane_quality() {
    let model = pca_model();
    let options = FactorMapOptions::new(EntityKind::Individuals, first_plane())
        .with_color_mode(ColorMode::Cos2);
    let chart = build_factor_map(&model, &options).expect("map");

    let gradient = scatter(&chart).gradient.as_ref().expect("gradient");
    assert_relative_eq!(gradient.min, 0.63, epsilon = 1e-9);
    assert_relative_eq!(gradient.max, 0.99, epsilon = 1e-9);
}

#[test]
fn qualitative_coloring_lists_each_level_once() {
    let model = pca_model();
    let options = FactorMapOptions::new(EntityKind::Individuals, first_plane())
        .with_color_mode(ColorMode::Qualitative("sex".to_owned()));
    let chart = build_factor_map(&model, &options).expect("map");

    let labels: Vec<&str> = scatter(&chart)
        .legend
        .iter()
        .map(|entry| entry.label.as_str())
        .collect();
    assert_eq!(labels, vec!["M", "F"]);
    let plot = scatter(&chart);
    assert_eq!(plot.points[0].color, plot.points[2].color);
    assert_ne!(plot.points[0].color, plot.points[1].color);
}

#[test]
fn unknown_coloring_variable_is_a_configuration_error() {
    let model = pca_model();
    let options = FactorMapOptions::new(EntityKind::Individuals, first_plane())
        .with_color_mode(ColorMode::Quantitative("shoe_size".to_owned()));
    let err = build_factor_map(&model, &options).expect_err("missing variable");
    assert!(matches!(err, DashError::Configuration(_)));
}

#[test]
fn identical_axes_are_rejected() {
    let model = pca_model();
    let options = FactorMapOptions {
        axes: AxisPair { x: 1, y: 1 },
        ..FactorMapOptions::new(EntityKind::Individuals, first_plane())
    };
    assert!(build_factor_map(&model, &options).is_err());
}
