mod support;

use factor_dash::api::{
    build_bar_chart, build_factor_map, category_palette, format_table, resolve_axes,
    BarChartOptions, ColorMode, Dashboard, DisplayLength, FactorMapOptions, LabelFilter,
    AXIS_X, AXIS_Y, PREVIEW_ROWS,
};
use factor_dash::core::{AxisPair, EntityKind, Measure, ResultTable};
use factor_dash::{AppOptions, Session};
use proptest::prelude::*;
use support::generated_pca_model;

fn single_column(values: &[f64]) -> ResultTable {
    ResultTable::new(
        (0..values.len()).map(|row| format!("r{row}")).collect(),
        vec!["Dim.1".to_owned()],
        values.iter().map(|value| vec![*value]).collect(),
    )
    .expect("table")
}

fn offered(session: &Session, key: &str) -> Vec<i64> {
    session
        .widget(key)
        .expect("axis widget")
        .choices()
        .expect("choices")
        .iter()
        .filter_map(|choice| choice.value.as_int())
        .collect()
}

fn color_mode(index: usize) -> ColorMode {
    [ColorMode::Status, ColorMode::Cos2, ColorMode::Contrib][index].clone()
}

fn label_filter(index: usize, threshold: f64) -> LabelFilter {
    match index {
        0 => LabelFilter::None,
        1 => LabelFilter::Cos2(threshold),
        _ => LabelFilter::Contrib(threshold * 100.0),
    }
}

proptest! {
    #[test]
    fn truncated_tables_are_unchanged_by_a_later_all_policy(
        rows in 0usize..60,
        policy in 0usize..2,
        filter in any::<bool>()
    ) {
        let values: Vec<f64> = (0..rows).map(|row| row as f64 * 1.5).collect();
        let table = single_column(&values);
        let length = [DisplayLength::Head, DisplayLength::Tail][policy];
        let truncated = format_table(&table, length, filter, "Rows");
        let again = truncated.reformat(DisplayLength::All, filter);

        prop_assert_eq!(&again.rows, &truncated.rows);
        prop_assert_eq!(again.total_rows, rows);
        prop_assert_eq!(again.reformat(DisplayLength::All, filter), again);
    }

    #[test]
    fn factor_map_accepts_every_valid_axis_pair(
        dimensions in 2usize..8,
        x_seed in 0usize..100,
        y_offset in 1usize..100,
        mode in 0usize..3,
        filter in 0usize..3,
        threshold in 0.0f64..1.0
    ) {
        let model = generated_pca_model(dimensions);
        let x = x_seed % dimensions;
        let y = (x + 1 + y_offset % (dimensions - 1)) % dimensions;
        let axes = AxisPair::new(x, y, dimensions).expect("distinct axes");

        for entity in [EntityKind::Individuals, EntityKind::Variables] {
            let options = FactorMapOptions::new(entity, axes)
                .with_arrows(entity == EntityKind::Variables)
                .with_color_mode(color_mode(mode))
                .with_label_filter(label_filter(filter, threshold));
            let chart = build_factor_map(&model, &options).expect("valid pair never fails");

            prop_assert_eq!(chart.axes(), Some(axes));
            prop_assert_eq!(&chart.x_title, &model.dimension_label(x));
            prop_assert_eq!(&chart.y_title, &model.dimension_label(y));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn axis_selectors_never_offer_the_value_just_chosen_on_the_other(
        dimensions in 2usize..6,
        changes in prop::collection::vec((any::<bool>(), 0usize..6), 1..12)
    ) {
        let dashboard = Dashboard::pca(generated_pca_model(dimensions), AppOptions::default())
            .expect("dashboard");
        let mut session = dashboard.session().expect("session");

        for (change_x, seed) in changes {
            let value = seed % dimensions;
            let (changed, other) = if change_x { (AXIS_X, AXIS_Y) } else { (AXIS_Y, AXIS_X) };
            session.set_input(changed, value).expect("in-range axis");

            let chosen = value as i64;
            prop_assert_eq!(session.value(changed).expect("changed").as_int(), Some(chosen));
            prop_assert!(!offered(&session, other).contains(&chosen));
            prop_assert_ne!(
                session.value(AXIS_X).expect("x").as_int(),
                session.value(AXIS_Y).expect("y").as_int()
            );

            let axes = session.chart("map.ind.plot").expect("map").axes().expect("axes");
            prop_assert_eq!(Some(axes.x as i64), session.value(AXIS_X).expect("x").as_int());
            prop_assert_eq!(Some(axes.y as i64), session.value(AXIS_Y).expect("y").as_int());
        }
    }
}

proptest! {
    #[test]
    fn display_length_bounds_the_row_count(rows in 0usize..60, policy in 0usize..3) {
        let values: Vec<f64> = (0..rows).map(|row| row as f64).collect();
        let table = single_column(&values);
        let length = DisplayLength::ALL[policy];
        let display = format_table(&table, length, false, "Rows");

        let expected = match length {
            DisplayLength::All => rows,
            DisplayLength::Head | DisplayLength::Tail => rows.min(PREVIEW_ROWS),
        };
        prop_assert_eq!(display.len(), expected);
        prop_assert_eq!(display.total_rows, rows);
        if length == DisplayLength::Tail && rows > 0 {
            let last = format!("r{}", rows - 1);
            prop_assert_eq!(display.rows.last().map(|row| row.label.clone()), Some(last));
        }
    }

    #[test]
    fn resolved_axes_are_distinct_and_keep_the_changed_selector(
        dimensions in 2usize..12,
        x_seed in 0usize..100,
        y_seed in 0usize..100,
        x_changed in any::<bool>()
    ) {
        let x = x_seed % dimensions;
        let y = y_seed % dimensions;
        let (rx, ry) = resolve_axes(x, y, x_changed, dimensions);

        prop_assert_ne!(rx, ry);
        prop_assert!(rx < dimensions && ry < dimensions);
        if x_changed {
            prop_assert_eq!(rx, x);
        } else {
            prop_assert_eq!(ry, y);
        }
        if x != y {
            prop_assert_eq!((rx, ry), (x, y));
        }
    }

    #[test]
    fn bar_chart_is_sorted_and_clamped(
        values in prop::collection::vec(prop_oneof![4 => -1_000.0f64..1_000.0, 1 => Just(f64::NAN)], 1..40),
        top_n in 1usize..60
    ) {
        let table = single_column(&values);
        let options = BarChartOptions { top_n, ..BarChartOptions::default() };
        let chart = build_bar_chart(&table, EntityKind::Individuals, Measure::Contrib, &options)
            .expect("chart");

        let finite = values.iter().filter(|value| value.is_finite()).count();
        let bars = chart.bars();
        prop_assert_eq!(bars.len(), top_n.min(finite));
        prop_assert!(bars.windows(2).all(|pair| pair[0].value >= pair[1].value));
    }

    #[test]
    fn category_palette_yields_valid_colors(count in 0usize..64) {
        let palette = category_palette(count);
        prop_assert_eq!(palette.len(), count);
        for color in palette {
            prop_assert!(color.validate().is_ok());
        }
    }
}
