//! Application shell serving one dashboard over HTTP.
//!
//! Requests are handled one at a time on a single loop, so every input change
//! is fully applied before the next request is read.

mod html;
mod routes;

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, info, warn};

use crate::api::{AppOptions, Dashboard};
use crate::error::{DashError, DashResult};
use crate::render::register_bitmap_font;

use routes::{AppState, Method, Reply};

/// Serves `dashboard` on the calling thread until a client requests exit.
pub fn run(dashboard: Dashboard) -> DashResult<()> {
    let server = bind(dashboard.options())?;
    let url = format!("http://{}", local_address(&server)?);
    info!(%url, "dashboard listening");
    if dashboard.options().launch_browser {
        open_browser(&url);
    }
    serve(&server, dashboard)
}

/// Serves `dashboard` on a background thread and returns at once.
///
/// Used when the caller already runs its own loop, such as a notebook kernel.
pub fn spawn(dashboard: Dashboard) -> DashResult<AppHandle> {
    let server = Arc::new(bind(dashboard.options())?);
    let address = local_address(&server)?;
    let url = format!("http://{address}");
    info!(%url, "dashboard listening in background");
    if dashboard.options().launch_browser {
        open_browser(&url);
    }

    let worker = Arc::clone(&server);
    let thread = thread::Builder::new()
        .name("factor-dash-server".to_owned())
        .spawn(move || serve(&worker, dashboard))?;
    Ok(AppHandle {
        address,
        server,
        thread: Some(thread),
    })
}

impl Dashboard {
    /// Blocks while serving this dashboard.
    pub fn run(self) -> DashResult<()> {
        run(self)
    }

    pub fn run_in_notebook(self) -> DashResult<AppHandle> {
        spawn(self)
    }
}

/// Handle on a dashboard served by [`spawn`].
pub struct AppHandle {
    address: SocketAddr,
    server: Arc<Server>,
    thread: Option<JoinHandle<DashResult<()>>>,
}

impl AppHandle {
    #[must_use]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Returns `true` once the loop has ended, for example after an exit request.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Unblocks the loop and waits for it to end.
    pub fn stop(mut self) -> DashResult<()> {
        self.server.unblock();
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| DashError::Server("server thread panicked".to_owned()))?,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for AppHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppHandle")
            .field("address", &self.address)
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

impl Drop for AppHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.server.unblock();
        }
    }
}

fn bind(options: &AppOptions) -> DashResult<Server> {
    if let Some(path) = &options.bitmap_font {
        if let Err(err) = register_bitmap_font(path) {
            warn!(path = %path.display(), error = %err, "bitmap exports will have no text");
        }
    }
    let address = options.address();
    Server::http(&address).map_err(|e| DashError::Server(format!("failed to bind {address}: {e}")))
}

fn local_address(server: &Server) -> DashResult<SocketAddr> {
    server
        .server_addr()
        .to_ip()
        .ok_or_else(|| DashError::Server("server is not listening on an IP address".to_owned()))
}

fn open_browser(url: &str) {
    if let Err(err) = webbrowser::open(url) {
        warn!(%url, error = %err, "could not open a browser");
    }
}

fn serve(server: &Server, dashboard: Dashboard) -> DashResult<()> {
    let mut state = AppState::new(dashboard);
    for mut request in server.incoming_requests() {
        let method = match request.method() {
            tiny_http::Method::Get => Method::Get,
            tiny_http::Method::Post => Method::Post,
            _ => Method::Other,
        };
        let url = request.url().to_owned();
        let mut body = String::new();
        let reply = match request.as_reader().read_to_string(&mut body) {
            Ok(_) => state.handle(method, &url, &body),
            Err(err) => Reply::error(400, &format!("unreadable request body: {err}")),
        };
        debug!(method = ?method, %url, status = reply.status, "request handled");
        respond(request, reply);

        if state.exit_requested() {
            break;
        }
    }
    info!(sessions = state.session_count(), "dashboard stopped");
    Ok(())
}

fn respond(request: Request, reply: Reply) {
    let mut response = Response::from_data(reply.body).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
        response.add_header(header);
    }
    if let Some(name) = reply.attachment {
        if let Ok(header) = Header::from_bytes("Content-Disposition", format!("attachment; filename=\"{name}\"")) {
            response.add_header(header);
        }
    }
    if let Err(err) = request.respond(response) {
        warn!(error = %err, "failed to send response");
    }
}
