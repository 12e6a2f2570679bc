use tracing::warn;

use crate::api::axis_selector::{selected_axes, AXIS_X, AXIS_Y};
use crate::api::bar_chart::{build_bar_chart, build_scree_plot, expected_contribution, BarChartOptions, ScreeChoice};
use crate::api::capability::{Capability, ColorModeKind, FactorMapSpec};
use crate::api::chart::Chart;
use crate::api::factor_map::{build_factor_map, ColorMode, FactorMapOptions, LabelFilter, MapColors};
use crate::api::inputs::{Choice, InputValue, Widget};
use crate::api::layout::LayoutNode;
use crate::api::reactive::{Dependency, OutputNode, Rule};
use crate::api::session::ViewContext;
use crate::api::summary_charts::{category_chart, heatmap_chart, histogram_chart, HeatmapOptions};
use crate::api::table_format::{format_dataset, format_table, DisplayLength};
use crate::api::view::{ModalView, View};
use crate::core::{DimensionDescription, EntityKind, FittedModel, Measure, ResultTable};
use crate::error::{DashError, DashResult};
use crate::render::{palette, Color};

/// Selector of the factor map whose settings the sidebar shows.
pub const SIDEBAR_MAP: &str = "sidebar.map";
/// Selector of the section shown in the values tab.
pub const VALUES_SECTION: &str = "values.section";
pub const EXIT: &str = "exit";

const BAR_COLOR: &str = "steelblue";

/// Widgets, outputs and page nodes contributed by one part of the dashboard.
#[derive(Debug, Default)]
pub struct Fragment {
    pub widgets: Vec<Widget>,
    pub outputs: Vec<OutputNode>,
    pub rules: Vec<Rule>,
    pub sidebar: Vec<LayoutNode>,
    pub main: Vec<LayoutNode>,
}

impl Fragment {
    pub fn merge(&mut self, other: Fragment) {
        self.widgets.extend(other.widgets);
        self.outputs.extend(other.outputs);
        self.rules.extend(other.rules);
        self.sidebar.extend(other.sidebar);
        self.main.extend(other.main);
    }
}

fn length_widget(key: &str, selected: DisplayLength) -> Widget {
    Widget::radio(
        key,
        "Rows shown",
        DisplayLength::ALL
            .iter()
            .map(|length| Choice::new(length.code(), length.label()))
            .collect(),
        selected.code(),
    )
}

fn color_choices() -> Vec<Choice> {
    palette::names().map(Choice::plain).collect()
}

fn color_select(key: &str, label: &str, selected: &str) -> Widget {
    Widget::select(key, label, color_choices(), selected)
}

fn read_color(context: &ViewContext<'_>, key: &str) -> DashResult<Color> {
    Color::parse(context.text(key)?)
}

fn require_table(model: &FittedModel, entity: EntityKind, measure: Measure) -> DashResult<&ResultTable> {
    model.table(entity, measure).ok_or_else(|| {
        DashError::Configuration(format!("model has no {} table for {}", measure.key(), entity.label()))
    })
}

/// Parses the free-text top N of a bar chart.
pub fn parse_top_n(key: &str, text: &str) -> DashResult<usize> {
    match text.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(DashError::invalid_input(
            key,
            format!("top N must be a positive integer, got `{text}`"),
        )),
    }
}

/// Rows of a description table whose `pvalue` is at most `threshold`.
pub fn significant_rows(table: &ResultTable, threshold: f64) -> DashResult<ResultTable> {
    let column = table
        .column_position("pvalue")
        .or_else(|| table.column_position("p.value"))
        .ok_or_else(|| DashError::InvalidData("description table has no pvalue column".to_owned()))?;
    let (index, data) = table
        .index
        .iter()
        .zip(&table.data)
        .filter(|(_, cells)| cells[column] <= threshold)
        .map(|(label, cells)| (label.clone(), cells.clone()))
        .unzip();
    ResultTable::new(index, table.columns.clone(), data)
}

fn table_output(
    key: String,
    length_key: String,
    filter_key: String,
    row_header: &'static str,
    source: impl Fn(&FittedModel) -> DashResult<&ResultTable> + Send + Sync + 'static,
) -> OutputNode {
    OutputNode::new(
        key,
        vec![Dependency::input(&length_key), Dependency::input(&filter_key)],
        move |context| {
            let length = DisplayLength::from_code(context.text(&length_key)?)?;
            let filter = context.flag(&filter_key)?;
            let table = source(context.model())?;
            Ok(View::Table(format_table(table, length, filter, row_header)))
        },
    )
}

/// Table of one entity measure, plus its bar-chart and correlation-plot
/// modals for active contributions and cos2.
#[must_use]
pub fn result_panel(entity: EntityKind, measure: Measure, dimensions: usize, charted: bool) -> Fragment {
    let prefix = format!("values.{}.{}", entity.key(), measure.key());
    let length_key = format!("{prefix}.len");
    let filter_key = format!("{prefix}.filter");
    let table_key = format!("{prefix}.table");

    let mut fragment = Fragment {
        widgets: vec![
            length_widget(&length_key, DisplayLength::Head),
            Widget::switch(&filter_key, "Column filters", false),
        ],
        outputs: vec![table_output(
            table_key.clone(),
            length_key.clone(),
            filter_key.clone(),
            entity.row_header(),
            move |model| require_table(model, entity, measure),
        )],
        ..Fragment::default()
    };

    let mut children = vec![
        LayoutNode::row(vec![LayoutNode::widget(&length_key), LayoutNode::widget(&filter_key)]),
        LayoutNode::output(&table_key),
    ];
    if charted {
        let modals = graph_modals(entity, measure, dimensions, &prefix);
        children.extend(modals.main.iter().cloned());
        fragment.widgets.extend(modals.widgets);
        fragment.outputs.extend(modals.outputs);
    }
    fragment.main.push(LayoutNode::panel(measure.label(), children));
    fragment
}

fn graph_modals(entity: EntityKind, measure: Measure, dimensions: usize, prefix: &str) -> Fragment {
    let axis_key = format!("{prefix}.axis");
    let top_key = format!("{prefix}.top");
    let color_key = format!("{prefix}.color");
    let width_key = format!("{prefix}.bar_width");
    let plot_key = format!("{prefix}.plot");
    let bar_key = format!("{prefix}.bar");
    let modal_key = format!("{prefix}.modal");

    let max_axis = i64::try_from(dimensions.max(1)).unwrap_or(i64::MAX);
    let widgets = vec![
        Widget::numeric(&axis_key, "Axis", (1, max_axis), 1),
        Widget::text(&top_key, "Top", "10"),
        color_select(&color_key, "Bar color", BAR_COLOR),
        Widget::slider(&width_key, "Bar width", (0.1, 1.0, 0.1), 0.5),
        Widget::action(&plot_key, "Bar plot"),
    ];

    let bar = {
        let (axis_key, top_key, color_key, width_key) =
            (axis_key.clone(), top_key.clone(), color_key.clone(), width_key.clone());
        OutputNode::new(
            bar_key.clone(),
            vec![
                Dependency::input(&axis_key),
                Dependency::input(&top_key),
                Dependency::input(&color_key),
                Dependency::input(&width_key),
            ],
            move |context| {
                let axis = context.int(&axis_key)?;
                let dimension = usize::try_from(axis - 1)
                    .map_err(|_| DashError::invalid_input(&axis_key, format!("axis must be at least 1, got {axis}")))?;
                let table = require_table(context.model(), entity, measure)?;
                let options = BarChartOptions {
                    dimension,
                    top_n: parse_top_n(&top_key, context.text(&top_key)?)?,
                    color: read_color(context, &color_key)?,
                    bar_width: context.float(&width_key)?,
                    title: None,
                    reference_line: match measure {
                        Measure::Contrib => expected_contribution(table.len()),
                        _ => None,
                    },
                    grid: true,
                };
                build_bar_chart(table, entity, measure, &options).map(View::Chart)
            },
        )
    };

    let modal = {
        let (bar_key, plot_key) = (bar_key.clone(), plot_key.clone());
        let title = format!("{} of {}", measure.label(), entity.label().to_lowercase());
        OutputNode::new(
            modal_key.clone(),
            vec![Dependency::output(&bar_key), Dependency::input(&plot_key)],
            move |context| {
                let presses = context.int(&plot_key)?;
                let chart = context
                    .output(&bar_key)?
                    .as_chart()
                    .cloned()
                    .ok_or_else(|| DashError::InvalidData(format!("output `{bar_key}` is not a chart")))?;
                Ok(View::Modal(ModalView {
                    title: title.clone(),
                    visible: presses > 0,
                    presses,
                    chart,
                }))
            },
        )
    };

    let corr = correlation_modal(entity, measure, prefix);
    let mut fragment = Fragment {
        widgets,
        outputs: vec![bar, modal],
        main: vec![
            LayoutNode::row(vec![
                LayoutNode::widget(&plot_key),
                LayoutNode::widget(format!("{prefix}.corr.plot")),
            ]),
            LayoutNode::panel(
                "Bar plot",
                vec![
                    LayoutNode::row(vec![
                        LayoutNode::widget(&axis_key),
                        LayoutNode::widget(&top_key),
                        LayoutNode::widget(&color_key),
                        LayoutNode::widget(&width_key),
                    ]),
                    LayoutNode::output(&modal_key),
                ],
            ),
        ],
        ..Fragment::default()
    };
    fragment.merge(corr);
    fragment
}

fn correlation_modal(entity: EntityKind, measure: Measure, prefix: &str) -> Fragment {
    let title_key = format!("{prefix}.corr.title");
    let low_key = format!("{prefix}.corr.low");
    let mid_key = format!("{prefix}.corr.mid");
    let high_key = format!("{prefix}.corr.high");
    let border_key = format!("{prefix}.corr.border");
    let plot_key = format!("{prefix}.corr.plot");
    let output_key = format!("{prefix}.corrplot");

    let widgets = vec![
        Widget::text(
            &title_key,
            "Title",
            format!("{} of {}", measure.label(), entity.label().to_lowercase()),
        ),
        color_select(&low_key, "Low color", "blue"),
        color_select(&mid_key, "Middle color", "white"),
        color_select(&high_key, "High color", "red"),
        color_select(&border_key, "Border color", "gray"),
        Widget::action(&plot_key, "Correlation plot"),
    ];
    let keys = [
        title_key.clone(),
        low_key.clone(),
        mid_key.clone(),
        high_key.clone(),
        border_key.clone(),
        plot_key.clone(),
    ];
    let reads = keys.iter().map(Dependency::input).collect();

    let output = OutputNode::new(output_key.clone(), reads, move |context| {
        let [title_key, low_key, mid_key, high_key, border_key, plot_key] = &keys;
        let options = HeatmapOptions {
            title: context.text(title_key)?.to_owned(),
            low: read_color(context, low_key)?,
            mid: read_color(context, mid_key)?,
            high: read_color(context, high_key)?,
            border: read_color(context, border_key)?,
        };
        let presses = context.int(plot_key)?;
        let table = require_table(context.model(), entity, measure)?;
        Ok(View::Modal(ModalView {
            title: options.title.clone(),
            visible: presses > 0,
            presses,
            chart: heatmap_chart(table, &options)?,
        }))
    });

    Fragment {
        widgets,
        outputs: vec![output],
        main: vec![LayoutNode::panel(
            "Correlation plot",
            vec![
                LayoutNode::row(vec![
                    LayoutNode::widget(&title_key),
                    LayoutNode::widget(&low_key),
                    LayoutNode::widget(&mid_key),
                    LayoutNode::widget(&high_key),
                    LayoutNode::widget(&border_key),
                ]),
                LayoutNode::output(&output_key),
            ],
        )],
        ..Fragment::default()
    }
}

/// Scree plot and eigenvalue table.
#[must_use]
pub fn eigen_panel() -> Fragment {
    let scree = OutputNode::new(
        "eig.scree",
        vec![Dependency::input("eig.choice"), Dependency::input("eig.labels")],
        |context| {
            let choice = ScreeChoice::from_code(context.text("eig.choice")?)?;
            let labels = context.flag("eig.labels")?;
            build_scree_plot(context.model(), choice, labels).map(View::Chart)
        },
    );
    let table = table_output(
        "eig.table".to_owned(),
        "eig.len".to_owned(),
        "eig.filter".to_owned(),
        "Dimensions",
        |model| Ok(&model.eig),
    );

    Fragment {
        widgets: vec![
            Widget::radio(
                "eig.choice",
                "Choice",
                vec![
                    Choice::new(ScreeChoice::Eigenvalue.code(), "Eigenvalue"),
                    Choice::new(ScreeChoice::Proportion.code(), "Proportion"),
                ],
                ScreeChoice::default().code(),
            ),
            Widget::switch("eig.labels", "Labels", true),
            length_widget("eig.len", DisplayLength::All),
            Widget::switch("eig.filter", "Column filters", false),
        ],
        outputs: vec![scree, table],
        main: vec![LayoutNode::panel(
            "Eigenvalues",
            vec![
                LayoutNode::row(vec![LayoutNode::widget("eig.choice"), LayoutNode::widget("eig.labels")]),
                LayoutNode::output("eig.scree"),
                LayoutNode::row(vec![LayoutNode::widget("eig.len"), LayoutNode::widget("eig.filter")]),
                LayoutNode::output("eig.table"),
            ],
        )],
        ..Fragment::default()
    }
}

/// Values tab: a section selector over the eigenvalues and every entity the
/// model carries.
#[must_use]
pub fn values_panel(capability: &Capability) -> Fragment {
    let mut choices = vec![Choice::new("eig", "Eigenvalues")];
    choices.extend(
        capability
            .sections
            .iter()
            .map(|section| Choice::new(section.entity.key(), section.entity.label())),
    );

    let mut fragment = Fragment {
        widgets: vec![Widget::radio(VALUES_SECTION, "Which results?", choices, "eig")],
        main: vec![LayoutNode::widget(VALUES_SECTION)],
        ..Fragment::default()
    };

    let eigen = eigen_panel();
    fragment
        .main
        .push(LayoutNode::when(VALUES_SECTION, "eig", eigen.main.clone()));
    fragment.widgets.extend(eigen.widgets);
    fragment.outputs.extend(eigen.outputs);

    for section in &capability.sections {
        let charted = section.charted_measures();
        let mut children = Vec::new();
        for measure in &section.measures {
            let panel = result_panel(
                section.entity,
                *measure,
                capability.dimensions,
                charted.contains(measure),
            );
            children.extend(panel.main.iter().cloned());
            fragment.widgets.extend(panel.widgets);
            fragment.outputs.extend(panel.outputs);
        }
        fragment
            .main
            .push(LayoutNode::when(VALUES_SECTION, section.entity.key(), children));
    }
    fragment
}

const SIGNIFICANCE_LEVELS: [(f64, &str); 4] = [
    (0.01, "Significance level 1%"),
    (0.05, "Significance level 5%"),
    (0.1, "Significance level 10%"),
    (1.0, "None"),
];

type DescriptionTable = fn(&DimensionDescription) -> Option<&ResultTable>;

fn description_output(
    key: &'static str,
    what: &'static str,
    row_header: &'static str,
    select: DescriptionTable,
) -> OutputNode {
    OutputNode::new(
        key,
        vec![Dependency::input("dimdesc.proba"), Dependency::input("dimdesc.dim")],
        move |context| {
            let threshold = context.float("dimdesc.proba")?;
            let dimension = context.text("dimdesc.dim")?;
            let description = context.model().dimension_description(dimension).ok_or_else(|| {
                DashError::InvalidData(format!("no description for dimension `{dimension}`"))
            })?;
            match select(description) {
                Some(table) => {
                    let significant = significant_rows(table, threshold)?;
                    Ok(View::Table(format_table(&significant, DisplayLength::All, false, row_header)))
                }
                None => Ok(View::Text(format!("No {what} description for {dimension}."))),
            }
        },
    )
}

/// Automatic axis description filtered by significance.
#[must_use]
pub fn dimdesc_panel(capability: &Capability) -> Option<Fragment> {
    let first = capability.dimdesc_dimensions.first()?;
    Some(Fragment {
        widgets: vec![
            Widget::radio(
                "dimdesc.proba",
                "Significance",
                SIGNIFICANCE_LEVELS
                    .iter()
                    .map(|(level, label)| Choice::new(*level, *label))
                    .collect(),
                0.05,
            ),
            Widget::radio(
                "dimdesc.dim",
                "Dimension",
                capability
                    .dimdesc_dimensions
                    .iter()
                    .map(|dimension| Choice::plain(dimension))
                    .collect(),
                first.as_str(),
            ),
        ],
        outputs: vec![
            description_output("dimdesc.quanti", "quantitative", "Variables", |description| {
                description.quantitative.as_ref()
            }),
            description_output("dimdesc.quali", "qualitative", "Variables", |description| {
                description.qualitative.as_ref()
            }),
            description_output("dimdesc.categories", "category", "Categories", |description| {
                description.categories.as_ref()
            }),
        ],
        main: vec![
            LayoutNode::row(vec![LayoutNode::widget("dimdesc.proba"), LayoutNode::widget("dimdesc.dim")]),
            LayoutNode::panel("Quantitative", vec![LayoutNode::output("dimdesc.quanti")]),
            LayoutNode::panel("Qualitative", vec![LayoutNode::output("dimdesc.quali")]),
            LayoutNode::panel("Categories", vec![LayoutNode::output("dimdesc.categories")]),
        ],
        ..Fragment::default()
    })
}

fn dataset_error() -> DashError {
    DashError::Configuration("model carries no dataset".to_owned())
}

/// Descriptive statistics, histogram, correlation matrix and category counts.
#[must_use]
pub fn summary_panel(capability: &Capability) -> Option<Fragment> {
    let quantitative = capability.quantitative_variables.first();
    let qualitative = capability.qualitative_variables.first();
    if quantitative.is_none() && qualitative.is_none() {
        return None;
    }

    let mut choices = Vec::new();
    let mut fragment = Fragment::default();
    let bar_color = Color::rgb(0.275, 0.51, 0.706);

    if let Some(first) = quantitative {
        choices.extend([
            Choice::new("describe", "Descriptive statistics"),
            Choice::new("hist", "Histogram"),
            Choice::new("corr", "Correlation matrix"),
        ]);
        fragment.widgets.extend([
            Widget::select(
                "summary.var",
                "Variable",
                capability
                    .quantitative_variables
                    .iter()
                    .map(|name| Choice::plain(name))
                    .collect(),
                first.as_str(),
            ),
            Widget::switch("summary.density", "Density", false),
        ]);
        fragment.outputs.extend([
            OutputNode::new("summary.describe", Vec::new(), |context| {
                let data = context.model().data.as_ref().ok_or_else(dataset_error)?;
                Ok(View::Table(format_table(&data.describe()?, DisplayLength::All, false, "Variables")))
            }),
            OutputNode::new(
                "summary.hist",
                vec![Dependency::input("summary.var"), Dependency::input("summary.density")],
                move |context| {
                    let data = context.model().data.as_ref().ok_or_else(dataset_error)?;
                    let variable = context.text("summary.var")?;
                    let density = context.flag("summary.density")?;
                    histogram_chart(data, variable, density, bar_color).map(View::Chart)
                },
            ),
            OutputNode::new("summary.corr", Vec::new(), |context| {
                let data = context.model().data.as_ref().ok_or_else(dataset_error)?;
                let options = HeatmapOptions {
                    title: "Correlation matrix".to_owned(),
                    ..HeatmapOptions::default()
                };
                heatmap_chart(&data.correlation_matrix()?, &options).map(View::Chart)
            }),
        ]);
        fragment.main.extend([
            LayoutNode::when("summary.choice", "describe", vec![LayoutNode::output("summary.describe")]),
            LayoutNode::when(
                "summary.choice",
                "hist",
                vec![
                    LayoutNode::row(vec![LayoutNode::widget("summary.var"), LayoutNode::widget("summary.density")]),
                    LayoutNode::output("summary.hist"),
                ],
            ),
            LayoutNode::when("summary.choice", "corr", vec![LayoutNode::output("summary.corr")]),
        ]);
    }

    if let Some(first) = qualitative {
        choices.push(Choice::new("bar", "Categories"));
        fragment.widgets.push(Widget::select(
            "summary.quali",
            "Qualitative variable",
            capability
                .qualitative_variables
                .iter()
                .map(|name| Choice::plain(name))
                .collect(),
            first.as_str(),
        ));
        fragment.outputs.push(OutputNode::new(
            "summary.bar",
            vec![Dependency::input("summary.quali")],
            move |context| {
                let data = context.model().data.as_ref().ok_or_else(dataset_error)?;
                category_chart(data, context.text("summary.quali")?, bar_color).map(View::Chart)
            },
        ));
        fragment.main.push(LayoutNode::when(
            "summary.choice",
            "bar",
            vec![LayoutNode::row(vec![LayoutNode::widget("summary.quali")]), LayoutNode::output("summary.bar")],
        ));
    }

    let selected = choices[0].value.clone();
    fragment
        .widgets
        .insert(0, Widget::radio("summary.choice", "Summary", choices, selected));
    fragment.main.insert(0, LayoutNode::widget("summary.choice"));
    Some(fragment)
}

/// Raw dataset table.
#[must_use]
pub fn data_panel(capability: &Capability) -> Option<Fragment> {
    if !capability.has_dataset {
        return None;
    }
    Some(Fragment {
        widgets: vec![
            length_widget("data.len", DisplayLength::All),
            Widget::switch("data.filter", "Column filters", false),
        ],
        outputs: vec![OutputNode::new(
            "data.table",
            vec![Dependency::input("data.len"), Dependency::input("data.filter")],
            |context| {
                let data = context.model().data.as_ref().ok_or_else(dataset_error)?;
                let length = DisplayLength::from_code(context.text("data.len")?)?;
                let filter = context.flag("data.filter")?;
                Ok(View::Table(format_dataset(
                    data.quantitative.as_ref(),
                    data.qualitative.as_ref(),
                    length,
                    filter,
                )))
            },
        )],
        main: vec![
            LayoutNode::row(vec![LayoutNode::widget("data.len"), LayoutNode::widget("data.filter")]),
            LayoutNode::output("data.table"),
        ],
        ..Fragment::default()
    })
}

/// Widget keys of one factor map; optional keys exist only when the model
/// carries what they control.
#[derive(Debug, Clone)]
struct MapKeys {
    title: String,
    text_size: String,
    labels: String,
    lim_cos2: Option<String>,
    lim_contrib: Option<String>,
    color_mode: String,
    quanti_var: Option<String>,
    quali_var: Option<String>,
    active_color: String,
    supplementary_color: Option<String>,
    category_color: Option<String>,
    repel: String,
}

impl MapKeys {
    fn new(spec: &FactorMapSpec) -> Self {
        let prefix = &spec.key;
        let key = |suffix: &str| format!("{prefix}.{suffix}");
        let offers = |mode: ColorModeKind| spec.color_modes.contains(&mode);
        Self {
            title: key("title"),
            text_size: key("text_size"),
            labels: key("labels"),
            lim_cos2: spec.label_by_cos2.then(|| key("lim_cos2")),
            lim_contrib: spec.label_by_contrib.then(|| key("lim_contrib")),
            color_mode: key("color_mode"),
            quanti_var: offers(ColorModeKind::Quantitative).then(|| key("quanti_var")),
            quali_var: offers(ColorModeKind::Qualitative).then(|| key("quali_var")),
            active_color: key("color.active"),
            supplementary_color: spec.has_supplementary_points().then(|| key("color.sup")),
            category_color: spec.has_categories().then(|| key("color.mod")),
            repel: key("repel"),
        }
    }

    fn reads(&self) -> Vec<Dependency> {
        [AXIS_X, AXIS_Y]
            .into_iter()
            .map(Dependency::input)
            .chain(
                [
                    Some(&self.title),
                    Some(&self.text_size),
                    Some(&self.labels),
                    self.lim_cos2.as_ref(),
                    self.lim_contrib.as_ref(),
                    Some(&self.color_mode),
                    self.quanti_var.as_ref(),
                    self.quali_var.as_ref(),
                    Some(&self.active_color),
                    self.supplementary_color.as_ref(),
                    self.category_color.as_ref(),
                    Some(&self.repel),
                ]
                .into_iter()
                .flatten()
                .map(Dependency::input),
            )
            .collect()
    }

    fn label_filter(&self, context: &ViewContext<'_>) -> DashResult<LabelFilter> {
        Ok(match (context.text(&self.labels)?, &self.lim_cos2, &self.lim_contrib) {
            ("cos2", Some(key), _) => LabelFilter::Cos2(context.float(key)?),
            ("contrib", _, Some(key)) => LabelFilter::Contrib(context.float(key)?),
            _ => LabelFilter::None,
        })
    }

    fn color_mode(&self, context: &ViewContext<'_>) -> DashResult<ColorMode> {
        let code = context.text(&self.color_mode)?;
        let mode = ColorModeKind::from_code(code)
            .ok_or_else(|| DashError::invalid_input(&self.color_mode, format!("unknown color mode `{code}`")))?;
        Ok(match (mode, &self.quanti_var, &self.quali_var) {
            (ColorModeKind::Status, _, _) => ColorMode::Status,
            (ColorModeKind::Cos2, _, _) => ColorMode::Cos2,
            (ColorModeKind::Contrib, _, _) => ColorMode::Contrib,
            (ColorModeKind::Quantitative, Some(key), _) => ColorMode::Quantitative(context.text(key)?.to_owned()),
            (ColorModeKind::Qualitative, _, Some(key)) => ColorMode::Qualitative(context.text(key)?.to_owned()),
            (other, _, _) => {
                return Err(DashError::Configuration(format!(
                    "color mode `{}` needs a variable the model does not carry",
                    other.code()
                )))
            }
        })
    }

    fn colors(&self, context: &ViewContext<'_>) -> DashResult<MapColors> {
        let defaults = MapColors::default();
        Ok(MapColors {
            active: read_color(context, &self.active_color)?,
            supplementary: match &self.supplementary_color {
                Some(key) => read_color(context, key)?,
                None => defaults.supplementary,
            },
            categories: match &self.category_color {
                Some(key) => read_color(context, key)?,
                None => defaults.categories,
            },
        })
    }

    fn options(&self, spec: &FactorMapSpec, context: &ViewContext<'_>) -> DashResult<FactorMapOptions> {
        let mut options = FactorMapOptions::new(spec.active, selected_axes(context)?)
            .with_supplementary(spec.supplementary.clone())
            .with_arrows(spec.arrows)
            .with_title(context.text(&self.title)?)
            .with_label_filter(self.label_filter(context)?)
            .with_color_mode(self.color_mode(context)?);
        options.text_size = context.float(&self.text_size)?;
        options.repel = context.flag(&self.repel)?;
        options.colors = self.colors(context)?;
        Ok(options)
    }
}

/// Sidebar settings and chart of one factor map.
#[must_use]
pub fn factor_map_panel(spec: &FactorMapSpec, model: &FittedModel) -> Fragment {
    let keys = MapKeys::new(spec);

    let mut label_choices = vec![Choice::new("none", "No filter")];
    let mut widgets = vec![
        Widget::text(&keys.title, "Title", spec.title.as_str()),
        Widget::slider(&keys.text_size, "Text size", (8.0, 20.0, 2.0), 8.0),
    ];
    let mut settings = vec![LayoutNode::widget(&keys.title), LayoutNode::widget(&keys.text_size)];
    let mut label_limits = Vec::new();
    if let Some(key) = &keys.lim_cos2 {
        label_choices.push(Choice::new("cos2", "Cos2"));
        widgets.push(Widget::slider(key, "Labels for cos2 greater than", (0.0, 1.0, 0.05), 0.0));
        label_limits.push(LayoutNode::when(&keys.labels, "cos2", vec![LayoutNode::widget(key)]));
    }
    if let Some(key) = &keys.lim_contrib {
        label_choices.push(Choice::new("contrib", "Contribution"));
        widgets.push(Widget::slider(
            key,
            "Labels for contribution greater than",
            (0.0, 100.0, 5.0),
            0.0,
        ));
        label_limits.push(LayoutNode::when(&keys.labels, "contrib", vec![LayoutNode::widget(key)]));
    }
    widgets.push(Widget::select(&keys.labels, "Labelled points", label_choices, "none"));
    settings.push(LayoutNode::widget(&keys.labels));
    settings.extend(label_limits);

    widgets.push(Widget::select(
        &keys.color_mode,
        "Color points by",
        spec.color_modes
            .iter()
            .map(|mode| Choice::new(mode.code(), mode.label()))
            .collect(),
        ColorModeKind::Status.code(),
    ));
    settings.push(LayoutNode::widget(&keys.color_mode));
    if let Some(key) = &keys.quanti_var {
        let variables = model.quantitative_variables();
        let first = variables.first().cloned().unwrap_or_default();
        widgets.push(Widget::select(
            key,
            "Quantitative variable",
            variables.iter().map(|name| Choice::plain(name)).collect(),
            first,
        ));
        settings.push(LayoutNode::when(
            &keys.color_mode,
            ColorModeKind::Quantitative.code(),
            vec![LayoutNode::widget(key)],
        ));
    }
    if let Some(key) = &keys.quali_var {
        let variables = model.qualitative_variables();
        let first = variables.first().cloned().unwrap_or_default();
        widgets.push(Widget::select(
            key,
            "Qualitative variable",
            variables.iter().map(|name| Choice::plain(name)).collect(),
            first,
        ));
        settings.push(LayoutNode::when(
            &keys.color_mode,
            ColorModeKind::Qualitative.code(),
            vec![LayoutNode::widget(key)],
        ));
    }

    let mut color_nodes = vec![LayoutNode::widget(&keys.active_color)];
    widgets.push(color_select(&keys.active_color, "Active points color", "black"));
    if let Some(key) = &keys.supplementary_color {
        widgets.push(color_select(key, "Supplementary points color", "blue"));
        color_nodes.push(LayoutNode::widget(key));
    }
    if let Some(key) = &keys.category_color {
        widgets.push(color_select(key, "Categories color", "red"));
        color_nodes.push(LayoutNode::widget(key));
    }
    settings.push(LayoutNode::when(&keys.color_mode, ColorModeKind::Status.code(), color_nodes));

    widgets.push(Widget::switch(&keys.repel, "Repel labels", true));
    settings.push(LayoutNode::widget(&keys.repel));

    let plot_key = format!("{}.plot", spec.key);
    let output = {
        let spec = spec.clone();
        let keys = keys.clone();
        OutputNode::new(plot_key.clone(), keys.reads(), move |context| {
            let fallback_title = context.text(&keys.title)?.to_owned();
            let chart = keys
                .options(&spec, context)
                .and_then(|options| build_factor_map(context.model(), &options));
            match chart {
                Ok(chart) => Ok(View::Chart(chart)),
                Err(err) if err.is_configuration() => {
                    warn!(
                        output = context.output_key(),
                        error = %err,
                        "factor map falls back to an empty chart"
                    );
                    Ok(View::Chart(Chart::empty(fallback_title)))
                }
                Err(err) => Err(err),
            }
        })
    };

    Fragment {
        widgets,
        outputs: vec![output],
        rules: Vec::new(),
        sidebar: vec![LayoutNode::when(
            SIDEBAR_MAP,
            spec.key.as_str(),
            vec![LayoutNode::panel(spec.title.as_str(), settings)],
        )],
        main: vec![LayoutNode::panel(spec.title.as_str(), vec![LayoutNode::output(plot_key)])],
    }
}

/// Choices of the sidebar map selector.
#[must_use]
pub fn sidebar_map_widget(capability: &Capability) -> Option<Widget> {
    let first = capability.factor_maps.first()?;
    Some(Widget::radio(
        SIDEBAR_MAP,
        "Settings for",
        capability
            .factor_maps
            .iter()
            .map(|spec| Choice::new(spec.key.as_str(), spec.title.as_str()))
            .collect(),
        InputValue::text(first.key.as_str()),
    ))
}
