mod axis_selector;
mod bar_chart;
mod capability;
mod chart;
mod config;
mod controller;
mod factor_map;
mod inputs;
mod invalidation;
mod json_contract;
mod layout;
mod panels;
mod reactive;
mod session;
mod summary_charts;
mod table_format;
mod view;

pub use axis_selector::{
    axis_exclusion_rule, axis_widgets, dimension_choices, resolve_axes, selected_axes, AXIS_X, AXIS_Y,
};
pub use bar_chart::{
    build_bar_chart, build_scree_plot, expected_contribution, BarChartOptions, ScreeChoice, SCREE_MAX_BARS,
};
pub use capability::{Capability, ColorModeKind, FactorMapSpec, ResultSection};
pub use chart::{
    BarPlot, Chart, ChartArrow, ChartBar, ChartBody, ChartPoint, ColorGradient, Heatmap, LegendEntry,
    PointGroup, ReferenceLine, ScatterPlot,
};
pub use config::AppOptions;
pub use controller::Dashboard;
pub use factor_map::{
    build_factor_map, category_palette, ColorMode, FactorMapOptions, LabelFilter, MapColors,
};
pub use inputs::{Choice, InputValue, Widget, WidgetKind, WidgetStore};
pub use invalidation::{InvalidationReason, PendingInvalidation};
pub use json_contract::{FittedModelJsonContractV1, MODEL_JSON_SCHEMA_V1};
pub use layout::{LayoutNode, Page, Tab};
pub use panels::{
    data_panel, dimdesc_panel, eigen_panel, factor_map_panel, parse_top_n, result_panel,
    sidebar_map_widget, significant_rows, summary_panel, values_panel, Fragment, EXIT, SIDEBAR_MAP,
    VALUES_SECTION,
};
pub use reactive::{
    ComputeFn, Dependency, OutputNode, ReactiveGraph, Rule, RuleContext, RuleFn, MAX_RULE_PASSES,
};
pub use session::{
    OutputStatus, Session, SessionSnapshot, SessionState, UpdateReport, ViewContext,
};
pub use summary_charts::{category_chart, heatmap_chart, histogram_chart, HeatmapOptions};
pub use table_format::{
    format_dataset, format_table, CellValue, DisplayLength, DisplayRow, DisplayTable, PREVIEW_ROWS,
};
pub use view::{ModalView, View, ViewError, ViewSlot};
