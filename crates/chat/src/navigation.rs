use crate::page::Page;
use crate::placeholder::NavToken;

/// Current-page state plus a way to change it. Implemented by whatever shell
/// hosts the assistant.
pub trait NavigationBridge {
    fn current_page(&self) -> Page;
    fn navigate(&mut self, page: Page);
}

/// In-process page state for one session.
#[derive(Debug, Clone)]
pub struct SessionNavigator {
    current: Page,
    visited: Vec<Page>,
}

impl SessionNavigator {
    #[must_use]
    pub fn new(start: Page) -> Self {
        Self {
            current: start,
            visited: vec![start],
        }
    }

    /// Pages in the order they were entered, starting page first.
    #[must_use]
    pub fn visited(&self) -> &[Page] {
        &self.visited
    }
}

impl Default for SessionNavigator {
    fn default() -> Self {
        Self::new(Page::ChatbotPage)
    }
}

impl NavigationBridge for SessionNavigator {
    fn current_page(&self) -> Page {
        self.current
    }

    fn navigate(&mut self, page: Page) {
        log::debug!("Navigating {} -> {}", self.current, page);
        self.current = page;
        self.visited.push(page);
    }
}

/// A button-like affordance derived from a triggered placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavAction {
    pub label: String,
    pub page: Page,
}

impl NavAction {
    #[must_use]
    pub fn for_token(token: NavToken) -> Self {
        Self {
            label: format!("Go to {}", token.label()),
            page: token.page(),
        }
    }

    pub fn trigger(&self, bridge: &mut dyn NavigationBridge) {
        bridge.navigate(self.page);
    }
}
