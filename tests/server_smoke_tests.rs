mod support;

use std::time::{Duration, Instant};

use factor_dash::api::Dashboard;
use factor_dash::{spawn, AppOptions};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use support::pca_model;

fn options() -> AppOptions {
    AppOptions::default().with_port(0).with_launch_browser(false)
}

fn session_id(html: &str) -> String {
    let start = html.find("data-session=\"").expect("session attribute") + "data-session=\"".len();
    let end = html[start..].find('"').expect("closing quote");
    html[start..start + end].to_owned()
}

#[test]
fn serves_a_session_end_to_end() {
    let dashboard = Dashboard::pca(pca_model(), options()).expect("dashboard");
    let handle = spawn(dashboard).expect("spawn");
    let base = handle.url();
    let client = Client::new();

    let page = client.get(format!("{base}/")).send().expect("index");
    assert!(page.status().is_success());
    let html = page.text().expect("html");
    assert!(html.contains("<title>Principal Component Analysis</title>"));
    let sid = session_id(&html);

    let script = client.get(format!("{base}/assets/dashboard.js")).send().expect("script");
    assert!(script.status().is_success());

    let state: Value = client
        .get(format!("{base}/api/{sid}/state"))
        .send()
        .expect("state")
        .json()
        .expect("state json");
    assert_eq!(state["revision"], 0);
    assert!(state["outputs"]["map.ind.plot"]["status"] == "ready");

    let report: Value = client
        .post(format!("{base}/api/{sid}/input"))
        .json(&json!({ "key": "map.ind.color_mode", "value": "cos2" }))
        .send()
        .expect("input")
        .json()
        .expect("report json");
    assert_eq!(report["recomputed"], json!(["map.ind.plot"]));

    let rejected = client
        .post(format!("{base}/api/{sid}/input"))
        .json(&json!({ "key": "map.ind.color_mode", "value": "rainbow" }))
        .send()
        .expect("bad input");
    assert_eq!(rejected.status().as_u16(), 400);

    let view: Value = client
        .get(format!("{base}/api/{sid}/output/values.ind.coord.table"))
        .send()
        .expect("output")
        .json()
        .expect("view json");
    assert_eq!(view["type"], "table");
    assert_eq!(view["content"]["rows"].as_array().map(Vec::len), Some(5));

    let svg = client
        .get(format!("{base}/api/{sid}/chart/map.ind.plot.svg"))
        .send()
        .expect("svg");
    assert_eq!(
        svg.headers().get("content-type").and_then(|value| value.to_str().ok()),
        Some("image/svg+xml")
    );
    let disposition = svg
        .headers()
        .get("content-disposition")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("attachment");
    assert!(disposition.contains("pca-map.ind.plot-"));
    assert!(svg.text().expect("svg body").contains("<svg"));

    let unknown = client.get(format!("{base}/api/nobody/state")).send().expect("unknown");
    assert_eq!(unknown.status().as_u16(), 404);

    let exit = client.post(format!("{base}/api/{sid}/exit")).send().expect("exit");
    assert!(exit.status().is_success());

    let deadline = Instant::now() + Duration::from_secs(5);
    while !handle.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(handle.is_finished());
    handle.stop().expect("stop");
}

#[test]
fn stop_ends_an_idle_server() {
    let dashboard = Dashboard::pca(pca_model(), options()).expect("dashboard");
    let handle = spawn(dashboard).expect("spawn");
    assert_ne!(handle.address().port(), 0);
    handle.stop().expect("stop");
}

#[test]
fn page_reloads_do_not_accumulate_sessions() {
    let dashboard = Dashboard::pca(pca_model(), options().with_max_sessions(3)).expect("dashboard");
    let handle = spawn(dashboard).expect("spawn");
    let base = handle.url();
    let client = Client::new();

    let ids: Vec<String> = (0..20)
        .map(|_| session_id(&client.get(format!("{base}/")).send().expect("index").text().expect("html")))
        .collect();
    let live = ids
        .iter()
        .filter(|sid| {
            client
                .get(format!("{base}/api/{sid}/state"))
                .send()
                .expect("state")
                .status()
                .is_success()
        })
        .count();
    assert_eq!(live, 3);

    let closed = client.post(format!("{base}/api/{}/close", ids[19])).send().expect("close");
    assert!(closed.status().is_success());
    let gone = client.get(format!("{base}/api/{}/state", ids[19])).send().expect("state");
    assert_eq!(gone.status().as_u16(), 404);
    assert!(!handle.is_finished());

    handle.stop().expect("stop");
}

#[test]
fn pdf_export_is_served_as_a_download() {
    let dashboard = Dashboard::pca(pca_model(), options()).expect("dashboard");
    let handle = spawn(dashboard).expect("spawn");
    let base = handle.url();
    let client = Client::new();
    let sid = session_id(&client.get(format!("{base}/")).send().expect("index").text().expect("html"));

    let pdf = client
        .get(format!("{base}/api/{sid}/chart/map.ind.plot.pdf"))
        .send()
        .expect("pdf");
    assert_eq!(
        pdf.headers().get("content-type").and_then(|value| value.to_str().ok()),
        Some("application/pdf")
    );
    assert!(pdf.bytes().expect("pdf body").starts_with(b"%PDF"));

    handle.stop().expect("stop");
}
