use indexmap::IndexSet;
use serde::Serialize;

use crate::api::inputs::{InputValue, WidgetStore};
use crate::api::reactive::ReactiveGraph;
use crate::error::{DashError, DashResult};

/// Node of the page tree sent to the browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum LayoutNode {
    Widget {
        key: String,
    },
    Output {
        key: String,
    },
    /// Titled group of nodes.
    Panel {
        title: String,
        children: Vec<LayoutNode>,
    },
    /// Shown only while `input` holds one of `equals`.
    Conditional {
        input: String,
        equals: Vec<InputValue>,
        children: Vec<LayoutNode>,
    },
    Row {
        children: Vec<LayoutNode>,
    },
}

impl LayoutNode {
    #[must_use]
    pub fn widget(key: impl Into<String>) -> Self {
        Self::Widget { key: key.into() }
    }

    #[must_use]
    pub fn output(key: impl Into<String>) -> Self {
        Self::Output { key: key.into() }
    }

    #[must_use]
    pub fn panel(title: impl Into<String>, children: Vec<LayoutNode>) -> Self {
        Self::Panel {
            title: title.into(),
            children,
        }
    }

    #[must_use]
    pub fn when(input: impl Into<String>, equals: impl Into<InputValue>, children: Vec<LayoutNode>) -> Self {
        Self::Conditional {
            input: input.into(),
            equals: vec![equals.into()],
            children,
        }
    }

    #[must_use]
    pub fn row(children: Vec<LayoutNode>) -> Self {
        Self::Row { children }
    }

    fn children(&self) -> &[LayoutNode] {
        match self {
            Self::Widget { .. } | Self::Output { .. } => &[],
            Self::Panel { children, .. }
            | Self::Conditional { children, .. }
            | Self::Row { children } => children,
        }
    }

    fn collect_keys<'a>(&'a self, widgets: &mut IndexSet<&'a str>, outputs: &mut IndexSet<&'a str>) {
        match self {
            Self::Widget { key } => {
                widgets.insert(key);
            }
            Self::Output { key } => {
                outputs.insert(key);
            }
            Self::Conditional { input, .. } => {
                widgets.insert(input);
            }
            Self::Panel { .. } | Self::Row { .. } => {}
        }
        for child in self.children() {
            child.collect_keys(widgets, outputs);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tab {
    pub key: String,
    pub title: String,
    pub children: Vec<LayoutNode>,
}

impl Tab {
    #[must_use]
    pub fn new(key: impl Into<String>, title: impl Into<String>, children: Vec<LayoutNode>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            children,
        }
    }
}

/// Whole dashboard page: a sidebar and a tabbed main area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub title: String,
    pub sidebar: Vec<LayoutNode>,
    pub tabs: Vec<Tab>,
}

impl Page {
    fn nodes(&self) -> impl Iterator<Item = &LayoutNode> {
        self.sidebar
            .iter()
            .chain(self.tabs.iter().flat_map(|tab| tab.children.iter()))
    }

    /// Widget keys referenced anywhere on the page, in page order.
    #[must_use]
    pub fn widget_keys(&self) -> Vec<&str> {
        let (widgets, _) = self.keys();
        widgets.into_iter().collect()
    }

    /// Output keys referenced anywhere on the page, in page order.
    #[must_use]
    pub fn output_keys(&self) -> Vec<&str> {
        let (_, outputs) = self.keys();
        outputs.into_iter().collect()
    }

    fn keys(&self) -> (IndexSet<&str>, IndexSet<&str>) {
        let mut widgets = IndexSet::new();
        let mut outputs = IndexSet::new();
        for node in self.nodes() {
            node.collect_keys(&mut widgets, &mut outputs);
        }
        (widgets, outputs)
    }

    /// Checks that every key on the page is declared.
    pub fn validate(&self, widgets: &WidgetStore, graph: &ReactiveGraph) -> DashResult<()> {
        let (widget_keys, output_keys) = self.keys();
        if let Some(missing) = widget_keys.iter().find(|key| !widgets.contains(key)) {
            return Err(DashError::UnknownInput((*missing).to_owned()));
        }
        if let Some(missing) = output_keys.iter().find(|key| graph.node(key).is_none()) {
            return Err(DashError::UnknownOutput((*missing).to_owned()));
        }
        Ok(())
    }

    #[must_use]
    pub fn tab(&self, key: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_collected_through_nested_nodes() {
        let page = Page {
            title: "PCA".to_owned(),
            sidebar: vec![LayoutNode::widget("axis.x")],
            tabs: vec![Tab::new(
                "maps",
                "Graphs",
                vec![LayoutNode::when(
                    "values.section",
                    "eig",
                    vec![LayoutNode::row(vec![LayoutNode::output("eig.scree")])],
                )],
            )],
        };
        assert_eq!(page.widget_keys(), vec!["axis.x", "values.section"]);
        assert_eq!(page.output_keys(), vec!["eig.scree"]);
    }
}
