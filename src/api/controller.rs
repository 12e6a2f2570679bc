use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::api::axis_selector::{axis_exclusion_rule, axis_widgets, AXIS_X, AXIS_Y};
use crate::api::capability::Capability;
use crate::api::config::AppOptions;
use crate::api::inputs::{Widget, WidgetStore};
use crate::api::layout::{LayoutNode, Page, Tab};
use crate::api::panels::{
    data_panel, dimdesc_panel, factor_map_panel, sidebar_map_widget, summary_panel, values_panel, Fragment,
    EXIT, SIDEBAR_MAP,
};
use crate::api::reactive::ReactiveGraph;
use crate::api::session::Session;
use crate::core::{AnalysisKind, FittedModel};
use crate::error::{DashError, DashResult};

/// Reactive dashboard for one fitted model.
///
/// Building it validates the model and wires every widget, output and rule
/// once; sessions then share the graph and clone the default widget values.
#[derive(Debug)]
pub struct Dashboard {
    model: Arc<FittedModel>,
    capability: Capability,
    graph: Arc<ReactiveGraph>,
    widgets: WidgetStore,
    page: Page,
    options: AppOptions,
    sessions_started: AtomicU64,
}

impl Dashboard {
    /// Builds the dashboard, rejecting a model of another analysis kind.
    pub fn new(model: FittedModel, expected: AnalysisKind, options: AppOptions) -> DashResult<Self> {
        if model.kind != expected {
            return Err(DashError::InvalidModel {
                expected: expected.short_name().to_owned(),
                found: format!("a {} model", model.kind.short_name()),
            });
        }
        model.validate()?;
        options.validate()?;

        let capability = Capability::of(&model);
        let title = options
            .title
            .clone()
            .unwrap_or_else(|| model.kind.title().to_owned());
        let (widgets, graph, page) = assemble(&model, &capability, title)?;
        debug!(
            kind = %model.kind,
            dimensions = capability.dimensions,
            factor_maps = capability.factor_maps.len(),
            widgets = widgets.len(),
            outputs = graph.len(),
            "dashboard built"
        );

        Ok(Self {
            model: Arc::new(model),
            capability,
            graph: Arc::new(graph),
            widgets,
            page,
            options,
            sessions_started: AtomicU64::new(0),
        })
    }

    /// Builds the dashboard from an untyped JSON value.
    pub fn from_json_value(value: Value, expected: AnalysisKind, options: AppOptions) -> DashResult<Self> {
        let model = FittedModel::from_json_value(value).map_err(|err| match err {
            DashError::InvalidModel { found, .. } => DashError::InvalidModel {
                expected: expected.short_name().to_owned(),
                found,
            },
            other => other,
        })?;
        Self::new(model, expected, options)
    }

    pub fn pca(model: FittedModel, options: AppOptions) -> DashResult<Self> {
        Self::new(model, AnalysisKind::Pca, options)
    }

    pub fn ca(model: FittedModel, options: AppOptions) -> DashResult<Self> {
        Self::new(model, AnalysisKind::Ca, options)
    }

    pub fn mca(model: FittedModel, options: AppOptions) -> DashResult<Self> {
        Self::new(model, AnalysisKind::Mca, options)
    }

    pub fn famd(model: FittedModel, options: AppOptions) -> DashResult<Self> {
        Self::new(model, AnalysisKind::Famd, options)
    }

    pub fn mfa(model: FittedModel, options: AppOptions) -> DashResult<Self> {
        Self::new(model, AnalysisKind::Mfa, options)
    }

    pub fn mfaqual(model: FittedModel, options: AppOptions) -> DashResult<Self> {
        Self::new(model, AnalysisKind::MfaQual, options)
    }

    pub fn mfamix(model: FittedModel, options: AppOptions) -> DashResult<Self> {
        Self::new(model, AnalysisKind::MfaMix, options)
    }

    pub fn mfact(model: FittedModel, options: AppOptions) -> DashResult<Self> {
        Self::new(model, AnalysisKind::MfaCt, options)
    }

    #[must_use]
    pub fn model(&self) -> &FittedModel {
        &self.model
    }

    #[must_use]
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    #[must_use]
    pub fn graph(&self) -> &ReactiveGraph {
        &self.graph
    }

    /// Widgets with their default values.
    #[must_use]
    pub fn widgets(&self) -> &WidgetStore {
        &self.widgets
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn options(&self) -> &AppOptions {
        &self.options
    }

    /// Opens a new session with default widget values.
    pub fn session(&self) -> DashResult<Session> {
        let sequence = self.sessions_started.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("{}-{:x}-{sequence}", self.model.kind.code(), Utc::now().timestamp_millis());
        self.session_with_id(id)
    }

    pub fn session_with_id(&self, id: impl Into<String>) -> DashResult<Session> {
        Session::new(
            id,
            Arc::clone(&self.model),
            Arc::clone(&self.graph),
            self.widgets.clone(),
            self.options.chart_viewport,
        )
    }
}

fn take_fragment(fragment: Fragment, widgets: &mut Vec<Widget>, all: &mut Fragment) -> Vec<LayoutNode> {
    widgets.extend(fragment.widgets);
    all.outputs.extend(fragment.outputs);
    all.rules.extend(fragment.rules);
    all.sidebar.extend(fragment.sidebar);
    fragment.main
}

fn assemble(
    model: &FittedModel,
    capability: &Capability,
    title: String,
) -> DashResult<(WidgetStore, ReactiveGraph, Page)> {
    let mut widgets = Vec::new();
    let mut all = Fragment::default();
    let mut tabs = Vec::new();

    if !capability.factor_maps.is_empty() {
        widgets.extend(axis_widgets(model)?);
        all.rules.push(axis_exclusion_rule(capability.dimensions));
        all.sidebar
            .push(LayoutNode::row(vec![LayoutNode::widget(AXIS_X), LayoutNode::widget(AXIS_Y)]));
        if let Some(selector) = sidebar_map_widget(capability) {
            widgets.push(selector);
            all.sidebar.push(LayoutNode::widget(SIDEBAR_MAP));
        }

        let mut maps = Vec::new();
        for spec in &capability.factor_maps {
            maps.extend(take_fragment(factor_map_panel(spec, model), &mut widgets, &mut all));
        }
        tabs.push(Tab::new("maps", "Graphs", maps));
    }

    let values = take_fragment(values_panel(capability), &mut widgets, &mut all);
    tabs.push(Tab::new("values", "Values", values));

    if let Some(fragment) = dimdesc_panel(capability) {
        let main = take_fragment(fragment, &mut widgets, &mut all);
        tabs.push(Tab::new("dimdesc", "Automatic description of axes", main));
    }
    if let Some(fragment) = summary_panel(capability) {
        let main = take_fragment(fragment, &mut widgets, &mut all);
        tabs.push(Tab::new("summary", "Data summary", main));
    }
    if let Some(fragment) = data_panel(capability) {
        let main = take_fragment(fragment, &mut widgets, &mut all);
        tabs.push(Tab::new("data", "Data", main));
    }

    widgets.push(Widget::action(EXIT, "Exit the application"));
    all.sidebar.push(LayoutNode::widget(EXIT));

    let mut store = WidgetStore::new();
    for widget in widgets {
        store.declare(widget)?;
    }
    let graph = ReactiveGraph::build(all.outputs, all.rules, &store)?;
    let page = Page {
        title,
        sidebar: all.sidebar,
        tabs,
    };
    page.validate(&store, &graph)?;
    Ok((store, graph, page))
}
