//! Route model and navigation.
//!
//! Routes mirror the app's pages. `Router` tracks the current route and
//! history; `resolve` applies the session guard before a route is entered.

use std::fmt;
use std::sync::Mutex;

use tracing::debug;

use crate::auth::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Dashboard,
    Cek,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Root, Route::Dashboard, Route::Cek];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Dashboard => "/dashboard",
            Route::Cek => "/cek/",
        }
    }

    /// Parse a path, tolerating a missing or extra trailing slash.
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim().trim_end_matches('/');
        Route::ALL
            .into_iter()
            .find(|r| r.path().trim_end_matches('/') == trimmed)
    }

    pub fn requires_session(&self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, to: Route);
}

#[derive(Debug)]
struct RouterState {
    current: Route,
    history: Vec<Route>,
}

#[derive(Debug)]
pub struct Router {
    state: Mutex<RouterState>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(Route::Root)
    }
}

impl Router {
    pub fn new(initial: Route) -> Self {
        Self {
            state: Mutex::new(RouterState {
                current: initial,
                history: vec![initial],
            }),
        }
    }

    pub fn current(&self) -> Route {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).current
    }

    pub fn history(&self) -> Vec<Route> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .history
            .clone()
    }

    /// Route that would actually be entered when asking for `to`.
    pub fn resolve(to: Route, session: &Session) -> Route {
        if to.requires_session() && !session.is_authenticated() {
            Route::Root
        } else {
            to
        }
    }

    /// Navigate through the session guard. Returns the route entered.
    pub fn visit(&self, to: Route, session: &Session) -> Route {
        let target = Self::resolve(to, session);
        if target != to {
            debug!(requested = %to, redirected = %target, "Route guard redirect");
        }
        self.navigate(target);
        target
    }
}

impl Navigator for Router {
    fn navigate(&self, to: Route) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        debug!(from = %state.current, to = %to, "Navigating");
        state.current = to;
        state.history.push(to);
    }
}
