//! Route execution and synthetic responses.
//!
//! # Responsibilities
//! - Execute the resolved route: serve a file or call a registered action
//! - Answer not-found, bad-request and error cases through the "404",
//!   "400" and "500" table entries, with args `[status, message]`
//! - Build absolute redirect locations and route them through the entry
//!   keyed by the redirect status, with args `[url, status]`

use std::path::{Component, Path, PathBuf};

use crate::config::RouterSettings;
use crate::dispatch::registry::Registry;
use crate::dispatch::DispatchError;
use crate::observability::metrics;
use crate::routing::path::strip_query;
use crate::routing::{RouteDescriptor, RouteResolver, Value};

/// What answered the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body<T> {
    /// Return value of a registered action.
    Action(T),
    /// File under the document root.
    File(PathBuf),
    /// Plain fallback text.
    Message(String),
}

/// Response description handed to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub status: u16,
    pub location: Option<String>,
    pub body: Body<T>,
}

/// Request details needed to absolutize redirect targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub secure: bool,
    pub host: String,
    pub request_uri: String,
}

/// Drives a resolver through a registry of actions.
#[derive(Debug)]
pub struct Responder<T> {
    registry: Registry<T>,
    document_root: Option<PathBuf>,
    not_found_message: String,
}

impl<T> Responder<T> {
    pub fn new(registry: Registry<T>) -> Self {
        Self::from_settings(registry, &RouterSettings::default())
    }

    pub fn from_settings(registry: Registry<T>, settings: &RouterSettings) -> Self {
        Self {
            registry,
            document_root: settings.document_root.clone(),
            not_found_message: settings.not_found_message.clone(),
        }
    }

    pub fn with_document_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.document_root = Some(root.into());
        self
    }

    pub fn registry(&self) -> &Registry<T> {
        &self.registry
    }

    /// Execute the route for the resolver's current URL.
    pub fn execute(&self, resolver: &mut RouteResolver) -> Outcome<T> {
        let routed = match resolver.route().cloned() {
            Some(descriptor) => self.route_to(resolver, &descriptor),
            None => Err(DispatchError::NoMatch),
        };

        match routed {
            Ok(body) => outcome(200, None, body),
            Err(DispatchError::Action(message)) => self.error(resolver, &message),
            Err(e) => {
                tracing::debug!(error = %e, url = ?resolver.url(), "Answering with not found");
                self.not_found(resolver, None)
            }
        }
    }

    /// Serve a descriptor: its `file`, or its controller/action with `args`.
    pub fn route_to(&self, resolver: &RouteResolver, descriptor: &RouteDescriptor) -> Result<Body<T>, DispatchError> {
        if let Some(file) = descriptor.file() {
            let root = self.document_root.as_deref().unwrap_or(Path::new("."));
            let relative = resolver.rebase(file);
            let relative = Path::new(relative.trim_start_matches('/'));
            let path = root.join(relative);
            if !stays_inside(relative) || !path.is_file() {
                let error = DispatchError::MissingFile {
                    route: descriptor.route().to_string(),
                    path,
                };
                tracing::warn!("{}", error);
                return Err(error);
            }
            return Ok(Body::File(path));
        }

        let (controller, action) = match (descriptor.controller(), descriptor.action()) {
            (Some(controller), Some(action)) => (controller, action),
            (controller, _) => {
                let error = DispatchError::MissingTarget {
                    route: descriptor.route().to_string(),
                    missing: if controller.is_none() { "controller" } else { "action" },
                };
                tracing::warn!("{}", error);
                return Err(error);
            }
        };

        let f = self
            .registry
            .get(controller, action)
            .ok_or_else(|| DispatchError::UnknownAction {
                controller: controller.to_string(),
                action: action.to_string(),
            })?;

        f(descriptor.args()).map(Body::Action)
    }

    /// 404 Not Found.
    pub fn not_found(&self, resolver: &RouteResolver, message: Option<&str>) -> Outcome<T> {
        let message = message.unwrap_or(&self.not_found_message);
        self.respond(resolver, 404, None, vec![Value::from(404u16), Value::from(message)], message)
    }

    /// 400 Bad Request.
    pub fn bad_request(&self, resolver: &RouteResolver, message: &str) -> Outcome<T> {
        self.respond(resolver, 400, None, vec![Value::from(400u16), Value::from(message)], message)
    }

    /// 500 Internal Server Error.
    pub fn error(&self, resolver: &RouteResolver, message: &str) -> Outcome<T> {
        self.respond(resolver, 500, None, vec![Value::from(500u16), Value::from(message)], message)
    }

    /// Redirect (301, 303 or 307) to `url`, made absolute against `origin`.
    pub fn redirect(&self, resolver: &RouteResolver, url: &str, status: u16, origin: &Origin) -> Outcome<T> {
        let location = absolute_url(resolver, url, origin);
        let fallback = format!("You are being redirected to <a href=\"{0}\">{0}</a>", location);
        self.respond(
            resolver,
            status,
            Some(location.clone()),
            vec![Value::from(location), Value::from(status)],
            &fallback,
        )
    }

    fn respond(
        &self,
        resolver: &RouteResolver,
        status: u16,
        location: Option<String>,
        args: Vec<Value>,
        fallback: &str,
    ) -> Outcome<T> {
        let routed = resolver.lookup(&status.to_string()).map(|mut descriptor| {
            descriptor.set("args", Value::Sequence(args));
            self.route_to(resolver, &descriptor)
        });

        let body = match routed {
            Some(Ok(body)) => body,
            Some(Err(e)) => {
                tracing::warn!(status, error = %e, "Synthetic route failed, using plain message");
                Body::Message(fallback.to_string())
            }
            None => Body::Message(fallback.to_string()),
        };

        outcome(status, location, body)
    }
}

/// True if joining `relative` onto a directory cannot leave that directory.
fn stays_inside(relative: &Path) -> bool {
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn outcome<T>(status: u16, location: Option<String>, body: Body<T>) -> Outcome<T> {
    metrics::record_dispatch(status);
    Outcome { status, location, body }
}

/// Resolve `url` against the request: absolute URLs pass through, rooted
/// paths are rebased, relative paths join the request's directory.
fn absolute_url(resolver: &RouteResolver, url: &str, origin: &Origin) -> String {
    if url.contains("://") {
        return url.to_string();
    }

    let path = if url.starts_with('/') {
        resolver.rebase(url)
    } else {
        let request_path = strip_query(&origin.request_uri);
        let dir = request_path.rfind('/').map_or("", |i| &request_path[..i]);
        format!("{}/{}", dir, url)
    };

    let scheme = if origin.secure { "https" } else { "http" };
    format!("{}://{}{}", scheme, origin.host, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{RouteTable, Template};
    use std::sync::Arc;

    fn table() -> Arc<RouteTable> {
        Arc::new(RouteTable::new([
            ("/fail", Template::mapping([
                ("controller", Template::expr("news")),
                ("action", Template::expr("fail")),
            ])),
            ("/half", Template::mapping([("controller", Template::expr("news"))])),
            ("/**", Template::default_route()),
            ("404", Template::mapping([
                ("controller", Template::expr("error")),
                ("action", Template::expr("show")),
            ])),
        ]))
    }

    fn registry() -> Registry<String> {
        let mut registry = Registry::new();
        registry
            .register("news", "show", |args| {
                let ids: Vec<&str> = args.iter().filter_map(Value::as_str).collect();
                Ok(format!("news {}", ids.join(",")))
            })
            .register("news", "fail", |_| Err(DispatchError::Action("boom".into())))
            .register("error", "show", |args| match args {
                [Value::Integer(status), Value::String(message)] => Ok(format!("{}: {}", status, message)),
                other => Ok(format!("unexpected args {:?}", other)),
            });
        registry
    }

    fn origin() -> Origin {
        Origin {
            secure: false,
            host: "example.com".into(),
            request_uri: "/app/news/show?x=1".into(),
        }
    }

    #[test]
    fn test_execute_registered_action() {
        let responder = Responder::new(registry());
        let mut resolver = RouteResolver::new(table());
        resolver.set_url("/news/show/7/8");

        let outcome = responder.execute(&mut resolver);
        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.body, Body::Action("news 7,8".into()));
    }

    #[test]
    fn test_unknown_action_uses_not_found_route() {
        let responder = Responder::new(registry());
        let mut resolver = RouteResolver::new(table());
        resolver.set_url("/blog/index");

        let outcome = responder.execute(&mut resolver);
        assert_eq!(outcome.status, 404);
        assert_eq!(
            outcome.body,
            Body::Action("404: Sorry, this page does not exist".into())
        );
    }

    #[test]
    fn test_missing_action_is_not_found() {
        let responder = Responder::new(registry());
        let mut resolver = RouteResolver::new(table());
        resolver.set_url("/half");

        let descriptor = resolver.route().cloned().unwrap();
        assert_eq!(
            responder.route_to(&resolver, &descriptor),
            Err(DispatchError::MissingTarget {
                route: "/half".into(),
                missing: "action",
            })
        );
        assert_eq!(responder.execute(&mut resolver).status, 404);
    }

    #[test]
    fn test_action_error_is_500() {
        let responder = Responder::new(registry());
        let mut resolver = RouteResolver::new(table());
        resolver.set_url("/fail");

        let outcome = responder.execute(&mut resolver);
        assert_eq!(outcome.status, 500);
        assert_eq!(outcome.body, Body::Message("boom".into()));
    }

    #[test]
    fn test_fallback_message_without_synthetic_route() {
        let responder = Responder::new(registry());
        let resolver = RouteResolver::new(Arc::new(RouteTable::default()));

        let outcome = responder.bad_request(&resolver, "bad input");
        assert_eq!(outcome.status, 400);
        assert_eq!(outcome.body, Body::Message("bad input".into()));
    }

    #[test]
    fn test_redirect_locations() {
        let responder = Responder::new(registry());
        let mut resolver = RouteResolver::new(table());

        let outcome = responder.redirect(&resolver, "https://other.org/x", 301, &origin());
        assert_eq!(outcome.location.as_deref(), Some("https://other.org/x"));

        let outcome = responder.redirect(&resolver, "edit", 303, &origin());
        assert_eq!(outcome.location.as_deref(), Some("http://example.com/app/news/edit"));
        assert_eq!(outcome.status, 303);
        assert!(matches!(outcome.body, Body::Message(ref m) if m.contains("You are being redirected")));

        resolver.set_base("/app");
        let outcome = responder.redirect(&resolver, "/login", 307, &origin());
        assert_eq!(outcome.location.as_deref(), Some("http://example.com/app/login"));
    }

    #[test]
    fn test_file_route() {
        let dir = std::env::temp_dir().join(format!("wildroute-responder-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("static")).unwrap();
        std::fs::write(dir.join("static/about.html"), "<p>about</p>").unwrap();

        let table = Arc::new(RouteTable::new([
            ("/about", Template::mapping([("file", Template::expr("static/about.html"))])),
            ("/gone", Template::mapping([("file", Template::expr("static/gone.html"))])),
        ]));
        let responder = Responder::new(registry()).with_document_root(&dir);
        let mut resolver = RouteResolver::new(table);

        resolver.set_url("/about");
        let outcome = responder.execute(&mut resolver);
        assert_eq!(outcome.body, Body::File(dir.join("static/about.html")));

        resolver.set_url("/gone");
        assert_eq!(responder.execute(&mut resolver).status, 404);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_route_cannot_leave_document_root() {
        let dir = std::env::temp_dir().join(format!("wildroute-traversal-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("www")).unwrap();
        std::fs::write(dir.join("secret.txt"), "secret").unwrap();
        std::fs::write(dir.join("www/index.html"), "<p>home</p>").unwrap();

        let table = Arc::new(RouteTable::new([(
            "/static/*",
            Template::mapping([("file", Template::expr("$2"))]),
        )]));
        let responder = Responder::new(registry()).with_document_root(dir.join("www"));
        let mut resolver = RouteResolver::new(table);

        resolver.set_url("/static/index.html");
        assert_eq!(
            responder.execute(&mut resolver).body,
            Body::File(dir.join("www/index.html"))
        );

        // "%2F" decodes inside the segment, so this binds to "../secret.txt".
        resolver.set_url("/static/..%2Fsecret.txt");
        let descriptor = resolver.route().cloned().unwrap();
        assert_eq!(descriptor.file(), Some("../secret.txt"));
        assert!(matches!(
            responder.route_to(&resolver, &descriptor),
            Err(DispatchError::MissingFile { .. })
        ));
        assert_eq!(responder.execute(&mut resolver).status, 404);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_stays_inside() {
        assert!(stays_inside(Path::new("img/logo.png")));
        assert!(stays_inside(Path::new("./img/logo.png")));
        assert!(!stays_inside(Path::new("img/../../etc/passwd")));
        assert!(!stays_inside(Path::new("/etc/passwd")));
    }
}
