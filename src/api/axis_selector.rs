use crate::api::inputs::{Choice, InputValue, Widget};
use crate::api::reactive::Rule;
use crate::api::session::ViewContext;
use crate::core::{AxisPair, FittedModel};
use crate::error::{DashError, DashResult};

pub const AXIS_X: &str = "axis.x";
pub const AXIS_Y: &str = "axis.y";

/// Dimension choices offered to one selector, without `exclude`.
#[must_use]
pub fn dimension_choices(model: &FittedModel, dimensions: usize, exclude: Option<usize>) -> Vec<Choice> {
    (0..dimensions)
        .filter(|dimension| Some(*dimension) != exclude)
        .map(|dimension| Choice::new(dimension, model.dimension_label(dimension)))
        .collect()
}

/// The horizontal and vertical axis selectors, starting on the first two
/// dimensions.
///
/// Both accept any dimension; each offers every dimension except the one
/// held by the other selector.
pub fn axis_widgets(model: &FittedModel) -> DashResult<[Widget; 2]> {
    let dimensions = model.plottable_dimensions();
    if dimensions < 2 {
        return Err(DashError::Configuration(format!(
            "axis selectors need at least 2 dimensions, the model has {dimensions}"
        )));
    }
    let domain: Vec<InputValue> = (0..dimensions).map(InputValue::from).collect();
    Ok([
        Widget::select(
            AXIS_X,
            "Horizontal axis",
            dimension_choices(model, dimensions, Some(1)),
            0_usize,
        )
        .with_domain(domain.clone()),
        Widget::select(
            AXIS_Y,
            "Vertical axis",
            dimension_choices(model, dimensions, Some(0)),
            1_usize,
        )
        .with_domain(domain),
    ])
}

/// Resolves a selection where one selector just changed.
///
/// The selector that did not change keeps its value unless it collides, in
/// which case it moves to the lowest other dimension.
#[must_use]
pub fn resolve_axes(x: usize, y: usize, x_changed: bool, dimensions: usize) -> (usize, usize) {
    if x != y {
        return (x, y);
    }
    let first_other = |taken: usize| (0..dimensions).find(|dimension| *dimension != taken);
    if x_changed {
        (x, first_other(x).unwrap_or(y))
    } else {
        (first_other(y).unwrap_or(x), y)
    }
}

/// Keeps the two axis selectors on distinct dimensions.
#[must_use]
pub fn axis_exclusion_rule(dimensions: usize) -> Rule {
    Rule::new(
        "axis-exclusion",
        vec![AXIS_X.to_owned(), AXIS_Y.to_owned()],
        move |context| {
            let x = axis_value(context.value(AXIS_X)?, AXIS_X)?;
            let y = axis_value(context.value(AXIS_Y)?, AXIS_Y)?;
            let (x, y) = resolve_axes(x, y, context.triggered_by(AXIS_X), dimensions);

            let x_choices = dimension_choices(context.model(), dimensions, Some(y));
            let y_choices = dimension_choices(context.model(), dimensions, Some(x));
            context.set_choices(AXIS_X, x_choices, InputValue::from(x))?;
            context.set_choices(AXIS_Y, y_choices, InputValue::from(y))
        },
    )
}

fn axis_value(value: &InputValue, key: &str) -> DashResult<usize> {
    value
        .as_int()
        .and_then(|axis| usize::try_from(axis).ok())
        .ok_or_else(|| DashError::invalid_input(key, format!("expected a dimension, got {value}")))
}

/// Axis pair currently selected in the sidebar.
pub fn selected_axes(context: &ViewContext<'_>) -> DashResult<AxisPair> {
    let x = axis_value(context.input(AXIS_X)?, AXIS_X)?;
    let y = axis_value(context.input(AXIS_Y)?, AXIS_Y)?;
    AxisPair::new(x, y, context.model().plottable_dimensions())
}
