//! Built-in commands.
//!
//! # Data Flow
//! ```text
//! Route's HandlerFactory
//!     → Command::from_invocation (path variables + JSON parameters)
//!     → Handler::execute (services, session, locked driver)
//!     → value for the response envelope, or a CommandError
//! ```
//!
//! # Design Decisions
//! - One small type per command; parameters are parsed before the
//!   session's driver is locked, so malformed requests never wait
//! - Commands default to driver scope; the few exceptions say so
//! - Commands only translate parameters; behavior lives in the driver

pub mod cookie;
pub mod element;
pub mod navigation;
pub mod server;
pub mod session;
pub mod window;

pub use cookie::{AddCookie, DeleteCookie, DeleteNamedCookie, GetAllCookies};
pub use element::{
    ClearElement, ClickElement, DescribeElement, FindActiveElement, FindElement, FindElements,
    GetElementAttribute, GetElementText, GetElementValue, GetTagName, SendKeys, SubmitElement,
};
pub use navigation::{
    ChangeUrl, ExecuteScript, GetCurrentUrl, GetPageSource, GetTitle, GoBack, GoForward,
    ImplicitlyWait, RefreshPage,
};
pub use server::{GetAllSessions, StaticResource, Status};
pub use session::{DeleteSession, GetSessionCapabilities, NewSession};
pub use window::{
    CloseWindow, GetAllWindowHandles, GetCurrentWindowHandle, GetWindowSize, SetWindowSize,
    SwitchToWindow,
};
