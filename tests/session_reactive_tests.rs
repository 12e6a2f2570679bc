mod support;

use factor_dash::api::{
    Dashboard, DisplayLength, InputValue, OutputStatus, SessionState, View, EXIT, SIDEBAR_MAP,
};
use factor_dash::{AppOptions, DashError};
use support::{pca_model, pca_model_with_supplementary};

fn dashboard() -> Dashboard {
    Dashboard::pca(pca_model(), AppOptions::default().with_launch_browser(false)).expect("dashboard")
}

#[test]
fn new_session_computes_every_output_once() {
    let dashboard = dashboard();
    let session = dashboard.session().expect("session");

    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.revision(), 0);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.outputs.len(), dashboard.graph().len());
    assert!(snapshot
        .outputs
        .values()
        .all(|status| matches!(status, OutputStatus::Ready { .. })));
}

#[test]
fn color_mode_change_recomputes_only_its_map() {
    let dashboard = dashboard();
    let mut session = dashboard.session().expect("session");

    let report = session.set_input("map.ind.color_mode", "cos2").expect("color mode");

    assert_eq!(report.recomputed, vec!["map.ind.plot".to_owned()]);
    assert!(report.failed.is_empty());
    assert_eq!(report.revision, 1);
    let chart = session.chart("map.ind.plot").expect("map");
    match &chart.body {
        factor_dash::api::ChartBody::Scatter(plot) => assert!(plot.gradient.is_some()),
        other => panic!("expected a scatter plot, got {other:?}"),
    }
}

#[test]
fn setting_the_same_value_is_a_no_op() {
    let dashboard = dashboard();
    let mut session = dashboard.session().expect("session");

    let report = session.set_input("map.ind.color_mode", "status").expect("same value");
    assert!(report.is_noop());
    assert_eq!(session.revision(), 0);
}

#[test]
fn invalid_choice_is_rejected_and_nothing_changes() {
    let dashboard = dashboard();
    let mut session = dashboard.session().expect("session");

    let err = session
        .set_input("map.ind.color_mode", "rainbow")
        .expect_err("not offered");
    assert!(matches!(err, DashError::InvalidInput { .. }));
    assert_eq!(session.value("map.ind.color_mode").expect("value"), &InputValue::from("status"));

    assert!(matches!(
        session.set_input("no.such.widget", true),
        Err(DashError::UnknownInput(_))
    ));
}

#[test]
fn table_length_policy_reformats_the_table() {
    let dashboard = dashboard();
    let mut session = dashboard.session().expect("session");
    let key = "values.ind.coord.table";
    assert_eq!(session.table(key).expect("table").len(), 5);

    session
        .set_input("values.ind.coord.len", DisplayLength::Tail.code())
        .expect("tail");
    let table = session.table(key).expect("table");
    assert_eq!(table.row_labels(), vec!["ind1", "ind2", "ind3", "ind4", "ind5"]);

    let report = session.set_input("values.ind.coord.filter", true).expect("filter");
    assert_eq!(report.recomputed, vec![key.to_owned()]);
    assert!(session.table(key).expect("table").filter);
}

#[test]
fn bar_plot_modal_opens_on_press() {
    let dashboard = dashboard();
    let mut session = dashboard.session().expect("session");
    let modal_key = "values.ind.contrib.modal";

    match session.output(modal_key).expect("modal") {
        View::Modal(modal) => assert!(!modal.visible),
        other => panic!("expected a modal, got {other:?}"),
    }

    let report = session.press("values.ind.contrib.plot").expect("press");
    assert_eq!(report.recomputed, vec![modal_key.to_owned()]);
    match session.output(modal_key).expect("modal") {
        View::Modal(modal) => {
            assert!(modal.visible);
            assert_eq!(modal.presses, 1);
            assert_eq!(modal.chart.bars().len(), 5);
        }
        other => panic!("expected a modal, got {other:?}"),
    }
}

#[test]
fn top_n_change_flows_through_the_bar_into_the_modal() {
    let dashboard = dashboard();
    let mut session = dashboard.session().expect("session");

    let report = session.set_input("values.ind.contrib.top", "2").expect("top");
    assert_eq!(
        report.recomputed,
        vec!["values.ind.contrib.bar".to_owned(), "values.ind.contrib.modal".to_owned()]
    );
    assert_eq!(session.chart("values.ind.contrib.bar").expect("bar").bars().len(), 2);
    assert_eq!(session.chart("values.ind.contrib.modal").expect("modal").bars().len(), 2);
}

#[test]
fn malformed_top_n_fails_only_the_dependent_outputs() {
    let dashboard = dashboard();
    let mut session = dashboard.session().expect("session");

    let report = session.set_input("values.ind.contrib.top", "many").expect("stored");
    assert_eq!(report.failed.len(), 2);
    assert!(session.output("values.ind.contrib.bar").is_err());
    assert!(session.output("map.ind.plot").is_ok());

    session.set_input("values.ind.contrib.top", "4").expect("recover");
    assert_eq!(session.chart("values.ind.contrib.bar").expect("bar").bars().len(), 4);
}

#[test]
fn label_threshold_only_touches_labels() {
    let dashboard = dashboard();
    let mut session = dashboard.session().expect("session");

    session.set_input("map.ind.labels", "cos2").expect("labels");
    session.set_input("map.ind.lim_cos2", 0.95).expect("threshold");
    let chart = session.chart("map.ind.plot").expect("map");
    assert_eq!(chart.point_count(), 5);
    assert_eq!(chart.labelled_count(), 3);
}

#[test]
fn sidebar_selector_lists_the_maps() {
    let dashboard = Dashboard::pca(pca_model_with_supplementary(), AppOptions::default()).expect("dashboard");
    let session = dashboard.session().expect("session");
    let widget = session.widget(SIDEBAR_MAP).expect("selector");
    let keys: Vec<InputValue> = widget
        .choices()
        .expect("choices")
        .iter()
        .map(|choice| choice.value.clone())
        .collect();
    assert_eq!(keys, vec![InputValue::from("map.ind"), InputValue::from("map.var")]);
    assert_eq!(session.chart("map.ind.plot").expect("map").point_count(), 7);
}

#[test]
fn stopped_session_rejects_further_work() {
    let dashboard = dashboard();
    let mut session = dashboard.session().expect("session");
    session.press(EXIT).expect("exit press");
    session.stop();

    assert!(session.is_stopped());
    assert!(matches!(
        session.set_input("map.ind.color_mode", "cos2"),
        Err(DashError::SessionStopped)
    ));
    assert!(matches!(session.press(EXIT), Err(DashError::SessionStopped)));
}

#[test]
fn sessions_share_the_model_but_not_their_inputs() {
    let dashboard = dashboard();
    let mut first = dashboard.session().expect("first");
    let second = dashboard.session().expect("second");
    assert_ne!(first.id(), second.id());

    first.set_input("map.ind.color_mode", "contrib").expect("contrib");
    assert_eq!(second.value("map.ind.color_mode").expect("value"), &InputValue::from("status"));
}
