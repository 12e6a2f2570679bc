use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::api::{Dashboard, InputValue, Session};
use crate::error::{DashError, DashResult};
use crate::render::ExportFormat;
use crate::server::html;

const DASHBOARD_JS: &str = include_str!("assets/dashboard.js");
const DASHBOARD_CSS: &str = include_str!("assets/dashboard.css");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
    Other,
}

/// Response independent of the HTTP library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub attachment: Option<String>,
}

impl Reply {
    fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.into(),
            attachment: None,
        }
    }

    fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::ok("application/json", body),
            Err(e) => Self::error(500, &format!("failed to serialize response: {e}")),
        }
    }

    pub(crate) fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: json!({ "error": message }).to_string().into_bytes(),
            attachment: None,
        }
    }

    fn not_found() -> Self {
        Self::error(404, "not found")
    }

    fn from_result<T: Serialize>(result: DashResult<T>) -> Self {
        match result {
            Ok(value) => Self::json(&value),
            Err(err) => Self::error(400, &err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputChange {
    key: String,
    value: InputValue,
}

/// Open session with the time of its last request.
#[derive(Debug)]
struct OpenSession {
    session: Session,
    last_seen: DateTime<Utc>,
}

/// Dashboard plus the sessions opened on it, owned by the request loop.
///
/// Sessions are kept in least-recently-used order, oldest first.
#[derive(Debug)]
pub(crate) struct AppState {
    dashboard: Dashboard,
    sessions: IndexMap<String, OpenSession>,
    exit_requested: bool,
}

impl AppState {
    pub(crate) fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard,
            sessions: IndexMap::new(),
            exit_requested: false,
        }
    }

    /// Set once the last open session has exited.
    pub(crate) fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub(crate) fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn open_session(&mut self, now: DateTime<Utc>) -> DashResult<String> {
        self.release_idle(now);
        let session = self.dashboard.session()?;
        let id = session.id().to_owned();
        let max_sessions = self.dashboard.options().max_sessions.max(1);
        while self.sessions.len() >= max_sessions {
            match self.sessions.shift_remove_index(0) {
                Some((evicted, _)) => debug!(session = %evicted, "released least recently used session"),
                None => break,
            }
        }
        info!(session = %id, open = self.sessions.len() + 1, "session opened");
        self.sessions.insert(id.clone(), OpenSession { session, last_seen: now });
        Ok(id)
    }

    fn release_idle(&mut self, now: DateTime<Utc>) {
        let idle_secs = i64::try_from(self.dashboard.options().session_idle_secs).unwrap_or(i64::MAX);
        let limit = Duration::try_seconds(idle_secs).unwrap_or(Duration::MAX);
        self.sessions.retain(|id, open| {
            let keep = now.signed_duration_since(open.last_seen) < limit;
            if !keep {
                debug!(session = %id, "released idle session");
            }
            keep
        });
    }

    fn close_session(&mut self, id: &str) -> bool {
        match self.sessions.shift_remove(id) {
            Some(mut open) => {
                open.session.stop();
                debug!(session = id, open = self.sessions.len(), "session closed");
                true
            }
            None => false,
        }
    }

    /// Dispatches one request; `url` may carry a query string.
    pub(crate) fn handle(&mut self, method: Method, url: &str, body: &str) -> Reply {
        self.handle_at(method, url, body, Utc::now())
    }

    pub(crate) fn handle_at(&mut self, method: Method, url: &str, body: &str, now: DateTime<Utc>) -> Reply {
        let path = url.split_once('?').map_or(url, |(path, _)| path);
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        match (method, segments.as_slice()) {
            (Method::Get, [""] | ["index.html"]) => match self.open_session(now) {
                Ok(id) => match html::render_page(self.dashboard.page(), &id) {
                    Ok(page) => Reply::ok("text/html; charset=utf-8", page),
                    Err(err) => Reply::error(500, &err.to_string()),
                },
                Err(err) => Reply::error(500, &err.to_string()),
            },
            (Method::Get, ["assets", "dashboard.js"]) => Reply::ok("text/javascript; charset=utf-8", DASHBOARD_JS),
            (Method::Get, ["assets", "dashboard.css"]) => Reply::ok("text/css; charset=utf-8", DASHBOARD_CSS),
            (_, ["api", session, rest @ ..]) => {
                let Some(index) = self.sessions.get_index_of(*session) else {
                    return Reply::error(404, &format!("unknown session `{session}`"));
                };
                let last = self.sessions.len() - 1;
                self.sessions.move_index(index, last);
                if let Some(open) = self.sessions.get_index_mut(last).map(|(_, open)| open) {
                    open.last_seen = now;
                }
                let session = (*session).to_owned();
                self.handle_session(method, &session, rest, body)
            }
            _ => Reply::not_found(),
        }
    }

    fn handle_session(&mut self, method: Method, id: &str, rest: &[&str], body: &str) -> Reply {
        match (method, rest) {
            (Method::Post, ["close"]) => {
                self.close_session(id);
                return Reply::json(&json!({ "closed": true }));
            }
            (Method::Post, ["exit"]) => {
                self.close_session(id);
                self.exit_requested = self.sessions.is_empty();
                debug!(session = id, server_stopping = self.exit_requested, "exit requested");
                return Reply::json(&json!({ "stopped": true, "server_stopping": self.exit_requested }));
            }
            _ => {}
        }

        let Some(open) = self.sessions.get_mut(id) else {
            return Reply::not_found();
        };
        let session = &mut open.session;
        match (method, rest) {
            (Method::Get, ["state"]) => Reply::json(&session.snapshot()),
            (Method::Get, ["page"]) => Reply::json(self.dashboard.page()),
            (Method::Post, ["input"]) => Reply::from_result(
                serde_json::from_str::<InputChange>(body)
                    .map_err(|e| DashError::InvalidData(format!("malformed input change: {e}")))
                    .and_then(|change| session.set_input(&change.key, change.value)),
            ),
            (Method::Post, ["press", key]) => Reply::from_result(session.press(key)),
            (Method::Get, ["output", key]) => match session.slot(key) {
                Ok(Ok(view)) => Reply::json(view),
                Ok(Err(err)) => Reply::error(400, &err.message),
                Err(err) => Reply::error(404, &err.to_string()),
            },
            (Method::Get, ["chart", file]) => export(session, file),
            _ => Reply::not_found(),
        }
    }
}

fn export(session: &Session, file: &str) -> Reply {
    let Some((key, extension)) = file.rsplit_once('.') else {
        return Reply::not_found();
    };
    let format = match ExportFormat::from_extension(extension) {
        Ok(format) => format,
        Err(err) => return Reply::error(400, &err.to_string()),
    };
    match session.export_chart(key, format) {
        Ok(bytes) => Reply {
            attachment: Some(session.export_file_name(key, format)),
            ..Reply::ok(format.content_type(), bytes)
        },
        Err(DashError::UnknownOutput(key)) => Reply::error(404, &format!("unknown output `{key}`")),
        Err(err) => Reply::error(400, &err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AppOptions;
    use crate::core::{AnalysisKind, FittedModel};

    fn state(options: AppOptions) -> AppState {
        let model = FittedModel::from_json_value(json!({
            "kind": "ca",
            "n_components": 2,
            "eig": {
                "index": ["Dim.1", "Dim.2"],
                "columns": ["eigenvalue", "proportion"],
                "data": [[0.3, 75.0], [0.1, 25.0]]
            },
            "entities": {
                "rows": {
                    "coord": {
                        "index": ["r1", "r2", "r3"],
                        "columns": ["Dim.1", "Dim.2"],
                        "data": [[0.5, 0.1], [-0.3, 0.4], [0.2, -0.6]]
                    }
                }
            }
        }))
        .expect("model");
        AppState::new(Dashboard::new(model, AnalysisKind::Ca, options).expect("dashboard"))
    }

    fn open(state: &mut AppState, now: DateTime<Utc>) -> String {
        let reply = state.handle_at(Method::Get, "/", "", now);
        assert_eq!(reply.status, 200);
        let html = String::from_utf8(reply.body).expect("utf8");
        let start = html.find("data-session=\"").expect("session attribute") + "data-session=\"".len();
        let end = html[start..].find('"').expect("closing quote");
        html[start..start + end].to_owned()
    }

    fn state_status(state: &mut AppState, id: &str, now: DateTime<Utc>) -> u16 {
        state.handle_at(Method::Get, &format!("/api/{id}/state"), "", now).status
    }

    #[test]
    fn repeated_page_loads_keep_the_session_count_bounded() {
        let mut state = state(AppOptions::default().with_max_sessions(4));
        let now = Utc::now();
        let ids: Vec<String> = (0..50).map(|_| open(&mut state, now)).collect();

        assert_eq!(state.session_count(), 4);
        assert_eq!(state_status(&mut state, &ids[0], now), 404);
        for id in &ids[46..] {
            assert_eq!(state_status(&mut state, id, now), 200);
        }
    }

    #[test]
    fn recently_used_sessions_survive_eviction() {
        let mut state = state(AppOptions::default().with_max_sessions(2));
        let now = Utc::now();
        let first = open(&mut state, now);
        let second = open(&mut state, now);
        assert_eq!(state_status(&mut state, &first, now), 200);

        let third = open(&mut state, now);
        assert_eq!(state_status(&mut state, &second, now), 404);
        assert_eq!(state_status(&mut state, &first, now), 200);
        assert_eq!(state_status(&mut state, &third, now), 200);
    }

    #[test]
    fn idle_sessions_are_released_on_the_next_page_load() {
        let mut state = state(AppOptions::default().with_session_idle_secs(60));
        let start = Utc::now();
        let idle = open(&mut state, start);
        let active = open(&mut state, start);
        assert_eq!(state_status(&mut state, &active, start + Duration::seconds(50)), 200);

        open(&mut state, start + Duration::seconds(90));
        assert_eq!(state.session_count(), 2);
        assert_eq!(state_status(&mut state, &idle, start + Duration::seconds(90)), 404);
        assert_eq!(state_status(&mut state, &active, start + Duration::seconds(90)), 200);
    }

    #[test]
    fn close_releases_only_the_calling_session() {
        let mut state = state(AppOptions::default());
        let now = Utc::now();
        let leaving = open(&mut state, now);
        let staying = open(&mut state, now);

        let reply = state.handle_at(Method::Post, &format!("/api/{leaving}/close"), "", now);
        assert_eq!(reply.status, 200);
        assert_eq!(state.session_count(), 1);
        assert!(!state.exit_requested());
        assert_eq!(state_status(&mut state, &leaving, now), 404);
        assert_eq!(state_status(&mut state, &staying, now), 200);
    }

    #[test]
    fn exit_stops_the_server_only_after_the_last_session() {
        let mut state = state(AppOptions::default());
        let now = Utc::now();
        let first = open(&mut state, now);
        let second = open(&mut state, now);

        state.handle_at(Method::Post, &format!("/api/{first}/exit"), "", now);
        assert!(!state.exit_requested());
        assert_eq!(state_status(&mut state, &first, now), 404);
        assert_eq!(state_status(&mut state, &second, now), 200);

        let reply = state.handle_at(Method::Post, &format!("/api/{second}/exit"), "", now);
        let body: serde_json::Value = serde_json::from_slice(&reply.body).expect("json");
        assert_eq!(body["server_stopping"], true);
        assert!(state.exit_requested());
        assert_eq!(state.session_count(), 0);
    }
}
