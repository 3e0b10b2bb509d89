//! Simulated in-process browser.
//!
//! Pages are registered up front by URL; anything else loads as an empty
//! page. Each navigation starts a new "load" so element references from
//! earlier pages go stale, like in a real browser.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::command::CommandError;

use super::{Capabilities, Cookie, Driver, DriverFactory, Locator, WindowSize};

const BLANK: &str = "about:blank";
const DEFAULT_SIZE: WindowSize = WindowSize {
    width: 1024,
    height: 768,
};

/// One element of a simulated page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageElement {
    pub tag: String,
    pub text: String,
    pub attributes: BTreeMap<String, String>,
}

impl PageElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn matches(&self, locator: &Locator) -> Result<bool, CommandError> {
        let value = locator.value.as_str();
        Ok(match locator.using.as_str() {
            "id" => self.get("id") == Some(value),
            "name" => self.get("name") == Some(value),
            "class name" => self.has_class(value),
            "tag name" => self.tag.eq_ignore_ascii_case(value),
            "link text" => self.tag == "a" && self.text == value,
            "partial link text" => self.tag == "a" && self.text.contains(value),
            "css selector" => match (value.strip_prefix('#'), value.strip_prefix('.')) {
                (Some(id), _) => self.get("id") == Some(id),
                (_, Some(class)) => self.has_class(class),
                _ => self.tag.eq_ignore_ascii_case(value),
            },
            other => {
                return Err(CommandError::InvalidArgument(format!(
                    "unsupported locator strategy '{other}'"
                )))
            }
        })
    }
}

/// A simulated document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub elements: Vec<PageElement>,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
        }
    }

    pub fn with(mut self, element: PageElement) -> Self {
        self.elements.push(element);
        self
    }

    fn source(&self) -> String {
        let mut html = format!(
            "<html><head><title>{}</title></head><body>",
            self.title
        );
        for element in &self.elements {
            html.push('<');
            html.push_str(&element.tag);
            for (name, value) in &element.attributes {
                html.push_str(&format!(" {name}=\"{value}\""));
            }
            html.push('>');
            html.push_str(&element.text);
            html.push_str(&format!("</{}>", element.tag));
        }
        html.push_str("</body></html>");
        html
    }
}

#[derive(Debug)]
struct Window {
    handle: String,
    history: Vec<String>,
    position: usize,
    load: u64,
    size: WindowSize,
}

impl Window {
    fn url(&self) -> &str {
        self.history.get(self.position).map(String::as_str).unwrap_or(BLANK)
    }
}

#[derive(Debug, Clone)]
struct ElementRef {
    window: String,
    load: u64,
    index: usize,
}

/// The simulated browser.
#[derive(Debug)]
pub struct InMemoryDriver {
    pages: Arc<HashMap<String, Page>>,
    windows: Vec<Window>,
    current: Option<String>,
    cookies: Vec<Cookie>,
    refs: HashMap<String, ElementRef>,
    ids: HashMap<(u64, usize), String>,
    values: HashMap<(u64, usize), String>,
    active: Option<String>,
    implicit_wait: Duration,
    next_window: usize,
    next_load: u64,
    quits: Arc<AtomicUsize>,
}

impl InMemoryDriver {
    pub fn new(pages: Arc<HashMap<String, Page>>) -> Self {
        Self::with_counter(pages, Arc::new(AtomicUsize::new(0)))
    }

    fn with_counter(pages: Arc<HashMap<String, Page>>, quits: Arc<AtomicUsize>) -> Self {
        let mut driver = Self {
            pages,
            windows: Vec::new(),
            current: None,
            cookies: Vec::new(),
            refs: HashMap::new(),
            ids: HashMap::new(),
            values: HashMap::new(),
            active: None,
            implicit_wait: Duration::ZERO,
            next_window: 0,
            next_load: 0,
            quits,
        };
        let handle = driver.open_window(BLANK);
        driver.current = Some(handle);
        driver
    }

    pub fn implicit_wait(&self) -> Duration {
        self.implicit_wait
    }

    fn open_window(&mut self, url: &str) -> String {
        self.next_window += 1;
        self.next_load += 1;
        let handle = format!("window-{}", self.next_window);
        self.windows.push(Window {
            handle: handle.clone(),
            history: vec![url.to_string()],
            position: 0,
            load: self.next_load,
            size: DEFAULT_SIZE,
        });
        handle
    }

    fn window(&self) -> Result<&Window, CommandError> {
        let handle = self
            .current
            .as_deref()
            .ok_or_else(|| CommandError::NoSuchWindow("current window was closed".into()))?;
        self.windows
            .iter()
            .find(|w| w.handle == handle)
            .ok_or_else(|| CommandError::NoSuchWindow(handle.to_string()))
    }

    fn window_mut(&mut self) -> Result<&mut Window, CommandError> {
        let handle = self
            .current
            .clone()
            .ok_or_else(|| CommandError::NoSuchWindow("current window was closed".into()))?;
        self.windows
            .iter_mut()
            .find(|w| w.handle == handle)
            .ok_or(CommandError::NoSuchWindow(handle))
    }

    fn resolve_window(&mut self, handle: &str) -> Result<&mut Window, CommandError> {
        if handle == "current" {
            return self.window_mut();
        }
        self.windows
            .iter_mut()
            .find(|w| w.handle == handle)
            .ok_or_else(|| CommandError::NoSuchWindow(handle.to_string()))
    }

    fn page(&self) -> Result<Page, CommandError> {
        let url = self.window()?.url();
        Ok(self.pages.get(url).cloned().unwrap_or_default())
    }

    fn reload(&mut self) -> Result<(), CommandError> {
        self.next_load += 1;
        let load = self.next_load;
        self.window_mut()?.load = load;
        self.active = None;
        Ok(())
    }

    fn element_id(&mut self, load: u64, index: usize) -> Result<String, CommandError> {
        let window = self.window()?.handle.clone();
        let next = self.refs.len() + 1;
        let id = self
            .ids
            .entry((load, index))
            .or_insert_with(|| format!("element-{next}"))
            .clone();
        self.refs.insert(
            id.clone(),
            ElementRef {
                window,
                load,
                index,
            },
        );
        Ok(id)
    }

    /// Resolve an element reference against the current page.
    fn element(&self, id: &str) -> Result<(ElementRef, PageElement), CommandError> {
        let element_ref = self
            .refs
            .get(id)
            .cloned()
            .ok_or_else(|| CommandError::NoSuchElement(id.to_string()))?;
        let window = self.window()?;
        if element_ref.window != window.handle || element_ref.load != window.load {
            return Err(CommandError::StaleElement(id.to_string()));
        }
        let element = self
            .page()?
            .elements
            .get(element_ref.index)
            .cloned()
            .ok_or_else(|| CommandError::StaleElement(id.to_string()))?;
        Ok((element_ref, element))
    }

    fn matching(&self, locator: &Locator) -> Result<Vec<usize>, CommandError> {
        let page = self.page()?;
        let mut found = Vec::new();
        for (index, element) in page.elements.iter().enumerate() {
            if element.matches(locator)? {
                found.push(index);
            }
        }
        Ok(found)
    }

    fn current_host(&self) -> Result<Option<String>, CommandError> {
        let url = self.window()?.url();
        Ok(Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string)))
    }
}

#[async_trait]
impl Driver for InMemoryDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), CommandError> {
        if url.trim().is_empty() {
            return Err(CommandError::InvalidArgument("url must not be empty".into()));
        }
        let window = self.window_mut()?;
        window.history.truncate(window.position + 1);
        window.history.push(url.to_string());
        window.position = window.history.len() - 1;
        self.reload()
    }

    async fn current_url(&mut self) -> Result<String, CommandError> {
        Ok(self.window()?.url().to_string())
    }

    async fn title(&mut self) -> Result<String, CommandError> {
        Ok(self.page()?.title)
    }

    async fn page_source(&mut self) -> Result<String, CommandError> {
        Ok(self.page()?.source())
    }

    async fn back(&mut self) -> Result<(), CommandError> {
        let window = self.window_mut()?;
        if window.position == 0 {
            return Ok(());
        }
        window.position -= 1;
        self.reload()
    }

    async fn forward(&mut self) -> Result<(), CommandError> {
        let window = self.window_mut()?;
        if window.position + 1 >= window.history.len() {
            return Ok(());
        }
        window.position += 1;
        self.reload()
    }

    async fn refresh(&mut self) -> Result<(), CommandError> {
        self.reload()
    }

    async fn execute_script(&mut self, script: &str, args: &[Value]) -> Result<Value, CommandError> {
        let body = script.trim().trim_end_matches(';').trim();
        match body {
            "return document.title" => return Ok(Value::String(self.page()?.title)),
            "return document.URL" | "return window.location.href" => {
                return Ok(Value::String(self.window()?.url().to_string()))
            }
            _ => {}
        }
        if let Some(index) = body
            .strip_prefix("return arguments[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let index: usize = index
                .parse()
                .map_err(|_| CommandError::Javascript(format!("bad argument index in '{body}'")))?;
            return Ok(args.get(index).cloned().unwrap_or(Value::Null));
        }
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Err(CommandError::Javascript(format!(
            "script not supported by the in-memory driver: {body}"
        )))
    }

    async fn set_implicit_wait(&mut self, wait: Duration) -> Result<(), CommandError> {
        self.implicit_wait = wait;
        Ok(())
    }

    async fn find_element(&mut self, locator: &Locator) -> Result<String, CommandError> {
        let index = self
            .matching(locator)?
            .into_iter()
            .next()
            .ok_or_else(|| CommandError::NoSuchElement(format!("{}={}", locator.using, locator.value)))?;
        let load = self.window()?.load;
        self.element_id(load, index)
    }

    async fn find_elements(&mut self, locator: &Locator) -> Result<Vec<String>, CommandError> {
        let load = self.window()?.load;
        let mut ids = Vec::new();
        for index in self.matching(locator)? {
            ids.push(self.element_id(load, index)?);
        }
        Ok(ids)
    }

    async fn active_element(&mut self) -> Result<String, CommandError> {
        match &self.active {
            Some(id) => Ok(id.clone()),
            None => self.find_element(&Locator::new("tag name", "body")).await,
        }
    }

    async fn click(&mut self, element: &str) -> Result<(), CommandError> {
        let (_, target) = self.element(element)?;
        self.active = Some(element.to_string());
        if target.tag != "a" {
            return Ok(());
        }
        let Some(href) = target.get("href").map(str::to_string) else {
            return Ok(());
        };
        if target.get("target") == Some("_blank") {
            let handle = self.open_window(&href);
            tracing::debug!(window = %handle, url = %href, "Opened window");
            Ok(())
        } else {
            self.navigate(&href).await
        }
    }

    async fn clear(&mut self, element: &str) -> Result<(), CommandError> {
        let (element_ref, _) = self.element(element)?;
        self.values
            .insert((element_ref.load, element_ref.index), String::new());
        Ok(())
    }

    async fn submit(&mut self, element: &str) -> Result<(), CommandError> {
        let (_, target) = self.element(element)?;
        match target.get("action").map(str::to_string) {
            Some(action) => self.navigate(&action).await,
            None => self.reload(),
        }
    }

    async fn send_keys(&mut self, element: &str, keys: &str) -> Result<(), CommandError> {
        let (element_ref, target) = self.element(element)?;
        let initial = target.get("value").unwrap_or("").to_string();
        self.values
            .entry((element_ref.load, element_ref.index))
            .or_insert(initial)
            .push_str(keys);
        self.active = Some(element.to_string());
        Ok(())
    }

    async fn element_text(&mut self, element: &str) -> Result<String, CommandError> {
        Ok(self.element(element)?.1.text)
    }

    async fn tag_name(&mut self, element: &str) -> Result<String, CommandError> {
        Ok(self.element(element)?.1.tag)
    }

    async fn attribute(&mut self, element: &str, name: &str) -> Result<Option<String>, CommandError> {
        let (element_ref, target) = self.element(element)?;
        if name == "value" {
            if let Some(typed) = self.values.get(&(element_ref.load, element_ref.index)) {
                return Ok(Some(typed.clone()));
            }
        }
        Ok(target.get(name).map(str::to_string))
    }

    async fn cookies(&mut self) -> Result<Vec<Cookie>, CommandError> {
        Ok(self.cookies.clone())
    }

    async fn add_cookie(&mut self, cookie: Cookie) -> Result<(), CommandError> {
        if let Some(domain) = &cookie.domain {
            let wanted = domain.trim_start_matches('.');
            let host = self.current_host()?.unwrap_or_default();
            if !(host == wanted || host.ends_with(&format!(".{wanted}"))) {
                return Err(CommandError::InvalidCookieDomain(domain.clone()));
            }
        }
        self.cookies.retain(|c| c.name != cookie.name);
        self.cookies.push(cookie);
        Ok(())
    }

    async fn delete_cookie(&mut self, name: &str) -> Result<(), CommandError> {
        self.cookies.retain(|c| c.name != name);
        Ok(())
    }

    async fn delete_all_cookies(&mut self) -> Result<(), CommandError> {
        self.cookies.clear();
        Ok(())
    }

    async fn window_handle(&mut self) -> Result<String, CommandError> {
        Ok(self.window()?.handle.clone())
    }

    async fn window_handles(&mut self) -> Result<Vec<String>, CommandError> {
        Ok(self.windows.iter().map(|w| w.handle.clone()).collect())
    }

    async fn switch_to_window(&mut self, name: &str) -> Result<(), CommandError> {
        if !self.windows.iter().any(|w| w.handle == name) {
            return Err(CommandError::NoSuchWindow(name.to_string()));
        }
        self.current = Some(name.to_string());
        self.active = None;
        Ok(())
    }

    async fn close_window(&mut self) -> Result<(), CommandError> {
        let handle = self.window()?.handle.clone();
        self.windows.retain(|w| w.handle != handle);
        self.current = None;
        self.active = None;
        Ok(())
    }

    async fn window_size(&mut self, handle: &str) -> Result<WindowSize, CommandError> {
        Ok(self.resolve_window(handle)?.size)
    }

    async fn set_window_size(&mut self, handle: &str, size: WindowSize) -> Result<(), CommandError> {
        if size.width == 0 || size.height == 0 {
            return Err(CommandError::InvalidArgument(format!(
                "window size {}x{} is not positive",
                size.width, size.height
            )));
        }
        self.resolve_window(handle)?.size = size;
        Ok(())
    }

    async fn quit(&mut self) {
        self.windows.clear();
        self.current = None;
        self.quits.fetch_add(1, Ordering::SeqCst);
    }
}

/// Launches [`InMemoryDriver`]s sharing one set of pages.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDriverFactory {
    pages: Arc<HashMap<String, Page>>,
    launched: Arc<AtomicUsize>,
    quits: Arc<AtomicUsize>,
}

impl InMemoryDriverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page. Only valid before the factory is shared.
    pub fn with_page(mut self, url: impl Into<String>, page: Page) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.into(), page);
        self
    }

    /// Drivers launched so far.
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    /// Drivers released so far.
    pub fn quits(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverFactory for InMemoryDriverFactory {
    async fn launch(&self, capabilities: &Capabilities) -> Result<Box<dyn Driver>, CommandError> {
        self.launched.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(capabilities = ?capabilities, "Launching in-memory driver");
        Ok(Box::new(InMemoryDriver::with_counter(
            Arc::clone(&self.pages),
            Arc::clone(&self.quits),
        )))
    }
}
