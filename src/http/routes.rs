//! The default command table.
//!
//! Binding order is precedence: on overlapping templates the route bound
//! first wins.

use std::sync::Arc;

use crate::command::{HandlerFactory, Outcome};
use crate::handlers::*;
use crate::render::{
    mime, CapabilitiesView, EmptyRenderer, ForwardRenderer, JsonErrorRenderer, JsonRenderer,
    JsonpRenderer, RedirectRenderer, RenderRule, Renderer, ResourceRenderer, CALLBACK, EXCEPTION,
    RESPONSE,
};
use crate::routing::{RouteTables, TemplateError};

/// Build the GET, POST and DELETE tables with every built-in command.
pub fn build_route_tables() -> Result<RouteTables, TemplateError> {
    let mut tables = RouteTables::new();

    let error: Arc<dyn Renderer> = Arc::new(JsonErrorRenderer::new(EXCEPTION));
    let jsonp: Arc<dyn Renderer> = Arc::new(JsonpRenderer::new(RESPONSE, EXCEPTION, CALLBACK));
    tables.add_global_handler(Outcome::Exception, RenderRule::any(Arc::clone(&error)));
    tables.add_global_handler(Outcome::Error, RenderRule::any(error));
    for outcome in Outcome::ALL {
        tables.add_global_handler(outcome, RenderRule::exact_only(mime::JSONP, Arc::clone(&jsonp)));
    }

    let empty: Arc<dyn Renderer> = Arc::new(EmptyRenderer);
    let json: Arc<dyn Renderer> = Arc::new(JsonRenderer::new(RESPONSE));
    let ok = Outcome::Success;

    let get = &mut tables.get;
    get.bind("/", HandlerFactory::of::<Status>())?
        .on(ok, Arc::new(RedirectRenderer::new("/static/resource/hub.html")?))
        .on_type(ok, json.clone(), mime::JSON);
    get.bind("/static/resource/:file", HandlerFactory::of::<StaticResource>())?
        .on(ok, Arc::new(ResourceRenderer::new(RESPONSE)))
        .on_type(ok, empty.clone(), mime::JSON);
    get.bind("/status", HandlerFactory::of::<Status>())?
        .on(ok, json.clone());
    get.bind("/sessions", HandlerFactory::of::<GetAllSessions>())?
        .on(ok, json.clone());
    get.bind("/session/:sessionId", HandlerFactory::of::<GetSessionCapabilities>())?
        .on(ok, Arc::new(ForwardRenderer::new(Arc::new(CapabilitiesView))))
        .on_type(ok, json.clone(), mime::JSON);
    get.bind("/session/:sessionId/window_handle", HandlerFactory::of::<GetCurrentWindowHandle>())?
        .on(ok, json.clone());
    get.bind("/session/:sessionId/window_handles", HandlerFactory::of::<GetAllWindowHandles>())?
        .on(ok, json.clone());
    get.bind("/session/:sessionId/url", HandlerFactory::of::<GetCurrentUrl>())?
        .on(ok, json.clone());
    get.bind("/session/:sessionId/source", HandlerFactory::of::<GetPageSource>())?
        .on(ok, json.clone());
    get.bind("/session/:sessionId/title", HandlerFactory::of::<GetTitle>())?
        .on(ok, json.clone());
    get.bind("/session/:sessionId/element/:id", HandlerFactory::of::<DescribeElement>())?
        .on(ok, json.clone());
    get.bind("/session/:sessionId/element/:id/text", HandlerFactory::of::<GetElementText>())?
        .on(ok, json.clone());
    get.bind("/session/:sessionId/element/:id/name", HandlerFactory::of::<GetTagName>())?
        .on(ok, json.clone());
    get.bind("/session/:sessionId/element/:id/value", HandlerFactory::of::<GetElementValue>())?
        .on(ok, json.clone());
    get.bind(
        "/session/:sessionId/element/:id/attribute/:name",
        HandlerFactory::of::<GetElementAttribute>(),
    )?
    .on(ok, json.clone());
    get.bind("/session/:sessionId/cookie", HandlerFactory::of::<GetAllCookies>())?
        .on(ok, json.clone());
    get.bind("/session/:sessionId/window/:windowHandle/size", HandlerFactory::of::<GetWindowSize>())?
        .on(ok, json.clone());

    let post = &mut tables.post;
    post.bind("/session", HandlerFactory::of::<NewSession>())?
        .on(ok, Arc::new(RedirectRenderer::new("/session/:sessionId")?));
    post.bind("/session/:sessionId/url", HandlerFactory::of::<ChangeUrl>())?
        .on(ok, empty.clone());
    post.bind("/session/:sessionId/forward", HandlerFactory::of::<GoForward>())?
        .on(ok, empty.clone());
    post.bind("/session/:sessionId/back", HandlerFactory::of::<GoBack>())?
        .on(ok, empty.clone());
    post.bind("/session/:sessionId/refresh", HandlerFactory::of::<RefreshPage>())?
        .on(ok, empty.clone());
    post.bind("/session/:sessionId/execute", HandlerFactory::of::<ExecuteScript>())?
        .on(ok, json.clone());
    post.bind("/session/:sessionId/element", HandlerFactory::of::<FindElement>())?
        .on(ok, json.clone());
    post.bind("/session/:sessionId/elements", HandlerFactory::of::<FindElements>())?
        .on(ok, json.clone());
    post.bind("/session/:sessionId/element/active", HandlerFactory::of::<FindActiveElement>())?
        .on(ok, json.clone());
    post.bind("/session/:sessionId/element/:id/click", HandlerFactory::of::<ClickElement>())?
        .on(ok, empty.clone());
    post.bind("/session/:sessionId/element/:id/clear", HandlerFactory::of::<ClearElement>())?
        .on(ok, empty.clone());
    post.bind("/session/:sessionId/element/:id/submit", HandlerFactory::of::<SubmitElement>())?
        .on(ok, empty.clone());
    post.bind("/session/:sessionId/element/:id/value", HandlerFactory::of::<SendKeys>())?
        .on(ok, empty.clone());
    post.bind("/session/:sessionId/cookie", HandlerFactory::of::<AddCookie>())?
        .on(ok, empty.clone());
    post.bind("/session/:sessionId/window", HandlerFactory::of::<SwitchToWindow>())?
        .on(ok, empty.clone());
    post.bind("/session/:sessionId/window/:windowHandle/size", HandlerFactory::of::<SetWindowSize>())?
        .on(ok, empty.clone());
    post.bind("/session/:sessionId/timeouts/implicit_wait", HandlerFactory::of::<ImplicitlyWait>())?
        .on(ok, empty.clone());

    let delete = &mut tables.delete;
    delete.bind("/session/:sessionId", HandlerFactory::of::<DeleteSession>())?
        .on(ok, empty.clone());
    delete.bind("/session/:sessionId/cookie", HandlerFactory::of::<DeleteCookie>())?
        .on(ok, empty.clone());
    delete.bind("/session/:sessionId/cookie/:name", HandlerFactory::of::<DeleteNamedCookie>())?
        .on(ok, empty.clone());
    delete.bind("/session/:sessionId/window", HandlerFactory::of::<CloseWindow>())?
        .on(ok, empty);

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Accept;

    #[test]
    fn test_default_tables_build() {
        let tables = build_route_tables().unwrap();
        assert_eq!(tables.get.len(), 17);
        assert_eq!(tables.post.len(), 17);
        assert_eq!(tables.delete.len(), 4);
    }

    #[test]
    fn test_overlapping_window_routes_resolve() {
        let tables = build_route_tables().unwrap();
        let (route, vars) = tables.get.resolve("/session/s1/window_handle").unwrap();
        assert_eq!(route.factory().name(), "GetCurrentWindowHandle");
        assert_eq!(vars.get("sessionId"), Some("s1"));

        let (route, vars) = tables.get.resolve("/session/s1/window/current/size").unwrap();
        assert_eq!(route.factory().name(), "GetWindowSize");
        assert_eq!(vars.get("windowHandle"), Some("current"));

        let (route, _) = tables.post.resolve("/session/s1/element/active").unwrap();
        assert_eq!(route.factory().name(), "FindActiveElement");
        assert!(tables.get.resolve("/session/s1/nothing/here").is_none());
    }

    #[test]
    fn test_every_route_renders_every_outcome() {
        let tables = build_route_tables().unwrap();
        for method in RouteTables::methods() {
            let table = tables.for_method(&method).unwrap();
            for route in table.routes() {
                for outcome in Outcome::ALL {
                    for accept in [None, Some(mime::JSON), Some(mime::JSONP), Some("text/html")] {
                        assert!(
                            table.select_renderer(route, outcome, &Accept::new(accept)).is_ok(),
                            "{} {} has no renderer for {outcome} ({accept:?})",
                            method,
                            route.template()
                        );
                    }
                }
            }
        }
    }
}
