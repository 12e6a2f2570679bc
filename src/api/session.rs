use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::api::chart::Chart;
use crate::api::inputs::{InputValue, Widget, WidgetStore};
use crate::api::invalidation::{InvalidationReason, PendingInvalidation};
use crate::api::reactive::{Dependency, OutputNode, ReactiveGraph, MAX_RULE_PASSES};
use crate::api::table_format::DisplayTable;
use crate::api::view::{View, ViewError, ViewSlot};
use crate::core::{FittedModel, Viewport};
use crate::error::{DashError, DashResult};
use crate::render::{export_frame, ExportFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Rendering,
    Stopped,
}

/// What one input change did to the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub revision: u64,
    pub changed_inputs: Vec<String>,
    pub choices_changed: Vec<String>,
    pub recomputed: Vec<String>,
    pub failed: Vec<String>,
}

impl UpdateReport {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changed_inputs.is_empty() && self.recomputed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutputStatus {
    Ready { kind: String },
    Failed { message: String, configuration: bool },
}

/// Serializable view of a session used by the server and by tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub created_at: String,
    pub state: SessionState,
    pub revision: u64,
    pub widgets: Vec<Widget>,
    pub outputs: IndexMap<String, OutputStatus>,
}

/// Read access handed to an output while it is computed.
///
/// Every read is checked against the dependencies the output declared.
pub struct ViewContext<'a> {
    model: &'a FittedModel,
    widgets: &'a WidgetStore,
    views: &'a IndexMap<String, ViewSlot>,
    node: &'a OutputNode,
    viewport: Viewport,
}

impl<'a> ViewContext<'a> {
    #[must_use]
    pub fn model(&self) -> &'a FittedModel {
        self.model
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn output_key(&self) -> &str {
        self.node.key()
    }

    fn undeclared(&self, dependency: &str) -> DashError {
        DashError::UndeclaredDependency {
            output: self.node.key().to_owned(),
            dependency: dependency.to_owned(),
        }
    }

    pub fn input(&self, key: &str) -> DashResult<&'a InputValue> {
        if !self.node.declares(&Dependency::input(key)) {
            return Err(self.undeclared(key));
        }
        self.widgets.value(key)
    }

    pub fn text(&self, key: &str) -> DashResult<&'a str> {
        let value = self.input(key)?;
        value
            .as_text()
            .ok_or_else(|| DashError::invalid_input(key, format!("expected text, got {value}")))
    }

    pub fn int(&self, key: &str) -> DashResult<i64> {
        let value = self.input(key)?;
        value
            .as_int()
            .ok_or_else(|| DashError::invalid_input(key, format!("expected an integer, got {value}")))
    }

    pub fn float(&self, key: &str) -> DashResult<f64> {
        let value = self.input(key)?;
        value
            .as_float()
            .ok_or_else(|| DashError::invalid_input(key, format!("expected a number, got {value}")))
    }

    pub fn flag(&self, key: &str) -> DashResult<bool> {
        let value = self.input(key)?;
        value
            .as_bool()
            .ok_or_else(|| DashError::invalid_input(key, format!("expected a bool, got {value}")))
    }

    /// Cached view of an upstream output.
    pub fn output(&self, key: &str) -> DashResult<&'a View> {
        if !self.node.declares(&Dependency::output(key)) {
            return Err(self.undeclared(key));
        }
        match self.views.get(key) {
            Some(Ok(view)) => Ok(view),
            Some(Err(err)) => Err(DashError::InvalidData(format!(
                "upstream output `{key}` failed: {}",
                err.message
            ))),
            None => Err(DashError::UnknownOutput(key.to_owned())),
        }
    }
}

/// One user's dashboard state: widget values plus cached output views.
///
/// The fitted model and the graph are shared read-only between sessions.
#[derive(Debug)]
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    model: Arc<FittedModel>,
    graph: Arc<ReactiveGraph>,
    widgets: WidgetStore,
    views: IndexMap<String, ViewSlot>,
    state: SessionState,
    revision: u64,
    viewport: Viewport,
}

impl Session {
    /// Creates a session and computes every output once.
    pub fn new(
        id: impl Into<String>,
        model: Arc<FittedModel>,
        graph: Arc<ReactiveGraph>,
        widgets: WidgetStore,
        viewport: Viewport,
    ) -> DashResult<Self> {
        let mut session = Self {
            id: id.into(),
            created_at: Utc::now(),
            model,
            graph,
            widgets,
            views: IndexMap::new(),
            state: SessionState::Idle,
            revision: 0,
            viewport: viewport.validate()?,
        };
        let mut pending = PendingInvalidation::all(&session.graph);
        let (recomputed, failed) = session.recompute(&mut pending);
        debug!(
            session = %session.id,
            outputs = recomputed.len(),
            failed = failed.len(),
            "session started"
        );
        Ok(session)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state == SessionState::Stopped
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn model(&self) -> &FittedModel {
        &self.model
    }

    #[must_use]
    pub fn graph(&self) -> &ReactiveGraph {
        &self.graph
    }

    #[must_use]
    pub fn widgets(&self) -> &WidgetStore {
        &self.widgets
    }

    pub fn widget(&self, key: &str) -> DashResult<&Widget> {
        self.widgets.get(key)
    }

    pub fn value(&self, key: &str) -> DashResult<&InputValue> {
        self.widgets.value(key)
    }

    fn ensure_running(&self) -> DashResult<()> {
        if self.is_stopped() {
            Err(DashError::SessionStopped)
        } else {
            Ok(())
        }
    }

    /// Applies one input change and recomputes every output that reads it.
    ///
    /// Invalid values are rejected before anything is stored.
    pub fn set_input(&mut self, key: &str, value: impl Into<InputValue>) -> DashResult<UpdateReport> {
        self.ensure_running()?;
        if !self.widgets.set(key, value.into())? {
            return Ok(UpdateReport {
                revision: self.revision,
                ..UpdateReport::default()
            });
        }

        let outcome = self
            .graph
            .run_rules(&self.model, &mut self.widgets, IndexSet::from([key.to_owned()]))?;
        if !outcome.settled {
            warn!(
                session = %self.id,
                input = key,
                passes = MAX_RULE_PASSES,
                "input rules did not settle"
            );
        }

        let mut pending = PendingInvalidation::new();
        for changed in &outcome.changed {
            let reason = InvalidationReason::Input(changed.clone());
            pending.invalidate_input(&self.graph, changed, &reason);
        }
        for widget in &outcome.choices_changed {
            let reason = InvalidationReason::Input(widget.clone());
            pending.invalidate_input(&self.graph, widget, &reason);
        }
        self.finish_update(
            pending,
            outcome.changed.into_iter().collect(),
            outcome.choices_changed.into_iter().collect(),
        )
    }

    /// Presses an action button.
    pub fn press(&mut self, key: &str) -> DashResult<UpdateReport> {
        self.ensure_running()?;
        let count = self.widgets.press(key)?;
        trace!(session = %self.id, action = key, count, "action pressed");
        let mut pending = PendingInvalidation::new();
        pending.invalidate_input(
            &self.graph,
            key,
            &InvalidationReason::Pressed(key.to_owned()),
        );
        self.finish_update(pending, vec![key.to_owned()], Vec::new())
    }

    fn finish_update(
        &mut self,
        mut pending: PendingInvalidation,
        changed_inputs: Vec<String>,
        choices_changed: Vec<String>,
    ) -> DashResult<UpdateReport> {
        pending.propagate(&self.graph);
        self.revision += 1;
        let (recomputed, failed) = self.recompute(&mut pending);
        Ok(UpdateReport {
            revision: self.revision,
            changed_inputs,
            choices_changed,
            recomputed,
            failed,
        })
    }

    fn recompute(&mut self, pending: &mut PendingInvalidation) -> (Vec<String>, Vec<String>) {
        self.state = SessionState::Rendering;
        let graph = Arc::clone(&self.graph);
        let mut recomputed = Vec::with_capacity(pending.len());
        let mut failed = Vec::new();

        for (position, reason) in pending.drain_ordered() {
            let node = graph.node_at(position);
            let result = {
                let context = ViewContext {
                    model: &self.model,
                    widgets: &self.widgets,
                    views: &self.views,
                    node,
                    viewport: self.viewport,
                };
                node.compute(&context)
            };
            trace!(session = %self.id, output = node.key(), reason = ?reason, "recomputed output");

            let slot = match result {
                Ok(view) => Ok(view),
                Err(err) => {
                    warn!(session = %self.id, output = node.key(), error = %err, "output failed");
                    failed.push(node.key().to_owned());
                    Err(ViewError::from(&err))
                }
            };
            self.views.insert(node.key().to_owned(), slot);
            recomputed.push(node.key().to_owned());
        }

        self.state = SessionState::Idle;
        (recomputed, failed)
    }

    pub fn slot(&self, key: &str) -> DashResult<&ViewSlot> {
        self.views
            .get(key)
            .ok_or_else(|| DashError::UnknownOutput(key.to_owned()))
    }

    /// Latest view of `key`; a failed output yields its recorded error.
    pub fn output(&self, key: &str) -> DashResult<&View> {
        match self.slot(key)? {
            Ok(view) => Ok(view),
            Err(err) if err.configuration => Err(DashError::Configuration(err.message.clone())),
            Err(err) => Err(DashError::InvalidData(err.message.clone())),
        }
    }

    pub fn chart(&self, key: &str) -> DashResult<&Chart> {
        self.output(key)?
            .as_chart()
            .ok_or_else(|| DashError::InvalidData(format!("output `{key}` is not a chart")))
    }

    pub fn table(&self, key: &str) -> DashResult<&DisplayTable> {
        self.output(key)?
            .as_table()
            .ok_or_else(|| DashError::InvalidData(format!("output `{key}` is not a table")))
    }

    /// Encodes the chart held by `key` in `format`.
    pub fn export_chart(&self, key: &str, format: ExportFormat) -> DashResult<Vec<u8>> {
        self.ensure_running()?;
        let frame = self.chart(key)?.to_render_frame(self.viewport)?;
        export_frame(&frame, format)
    }

    /// Export file name such as `pca-map.ind-20261016T101500.png`.
    #[must_use]
    pub fn export_file_name(&self, key: &str, format: ExportFormat) -> String {
        format!(
            "{}-{key}-{}.{}",
            self.model.kind.code(),
            Utc::now().format("%Y%m%dT%H%M%S"),
            format.extension()
        )
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let outputs = self
            .views
            .iter()
            .map(|(key, slot)| {
                let status = match slot {
                    Ok(view) => OutputStatus::Ready {
                        kind: view.kind().to_owned(),
                    },
                    Err(err) => OutputStatus::Failed {
                        message: err.message.clone(),
                        configuration: err.configuration,
                    },
                };
                (key.clone(), status)
            })
            .collect();

        SessionSnapshot {
            id: self.id.clone(),
            created_at: self.created_at.to_rfc3339(),
            state: self.state,
            revision: self.revision,
            widgets: self.widgets.iter().cloned().collect(),
            outputs,
        }
    }

    /// Moves the session to its terminal state.
    pub fn stop(&mut self) {
        if !self.is_stopped() {
            debug!(session = %self.id, revision = self.revision, "session stopped");
        }
        self.state = SessionState::Stopped;
    }
}
