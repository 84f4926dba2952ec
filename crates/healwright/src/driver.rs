//! PageDriver - Abstract Page Automation Trait
//!
//! The resolver, retrier and navigator only ever talk to a page through
//! this trait, so a real browser binding and the in-memory [`MockPage`]
//! are interchangeable.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  PageDriver (async trait, Send + Sync)                    │
//! ├───────────────────────────────────────────────────────────┤
//! │  wait_for_visible   fill   click   goto                   │
//! │  wait_for_load_state   screenshot   current_url           │
//! ├───────────────────────────────────────────────────────────┤
//! │  MockPage: scripted visibility, goto failures, history    │
//! └───────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::result::{HealError, HealResult};
use crate::wait::LoadState;

/// Handle to a located, visible element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Selector that located the element
    pub selector: String,
    /// Element tag name, when the driver knows it
    pub tag_name: Option<String>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            tag_name: None,
        }
    }

    /// Set the tag name
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag_name = Some(tag.into());
        self
    }
}

/// Screenshot data with metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub const fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self { data, width, height }
    }
}

/// Abstract page driver
///
/// Implementations must be shareable across `.await` points within one
/// test task; all methods take `&self`.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Wait until `selector` matches a visible element
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> HealResult<ElementHandle>;

    /// Fill a located input with `value`
    async fn fill(&self, element: &ElementHandle, value: &str) -> HealResult<()>;

    /// Click a located element
    async fn click(&self, element: &ElementHandle) -> HealResult<()>;

    /// Navigate to `url`, succeeding once `ready` is reached
    async fn goto(&self, url: &str, ready: LoadState, timeout: Duration) -> HealResult<()>;

    /// Wait for the current page to reach `state`
    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> HealResult<()>;

    /// Capture the current viewport
    async fn screenshot(&self) -> HealResult<Screenshot>;

    /// URL of the current page
    async fn current_url(&self) -> HealResult<String>;
}

// =============================================================================
// MOCK PAGE
// =============================================================================

#[derive(Debug, Default)]
struct MockState {
    visible: HashSet<String>,
    hidden: HashSet<String>,
    delayed: HashMap<String, u32>,
    unreachable: bool,
    failing_states: HashSet<LoadState>,
    failing_gotos: u32,
    fail_network_idle_wait: bool,
    failing_actions: u32,
    screenshot: Option<Vec<u8>>,
    url: String,
    filled: HashMap<String, String>,
    history: Vec<String>,
}

/// In-memory page for unit tests
///
/// Selectors not registered with [`MockPage::with_visible`] time out.
/// Every driver call is appended to [`MockPage::history`].
#[derive(Debug, Default)]
pub struct MockPage {
    state: Mutex<MockState>,
}

impl MockPage {
    /// Create a blank page where nothing is visible and every goto succeeds
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `selector` resolve to a visible element
    #[must_use]
    pub fn with_visible(self, selector: impl Into<String>) -> Self {
        self.lock().visible.insert(selector.into());
        self
    }

    /// Make `selector` match an element that never becomes visible
    #[must_use]
    pub fn with_hidden(self, selector: impl Into<String>) -> Self {
        self.lock().hidden.insert(selector.into());
        self
    }

    /// Make `selector` visible only after `misses` failed waits on it
    #[must_use]
    pub fn with_delayed(self, selector: impl Into<String>, misses: u32) -> Self {
        self.lock().delayed.insert(selector.into(), misses);
        self
    }

    /// Fail every goto
    #[must_use]
    pub fn unreachable(self) -> Self {
        self.lock().unreachable = true;
        self
    }

    /// Fail every goto that waits for `state`
    #[must_use]
    pub fn fail_goto_for(self, state: LoadState) -> Self {
        self.lock().failing_states.insert(state);
        self
    }

    /// Fail the next `count` goto calls regardless of strategy
    #[must_use]
    pub fn fail_first_gotos(self, count: u32) -> Self {
        self.lock().failing_gotos = count;
        self
    }

    /// Fail explicit waits for network idle
    #[must_use]
    pub fn fail_network_idle_wait(self) -> Self {
        self.lock().fail_network_idle_wait = true;
        self
    }

    /// Fail the next `count` fill or click calls
    #[must_use]
    pub fn fail_next_actions(self, count: u32) -> Self {
        self.lock().failing_actions = count;
        self
    }

    /// Return `data` from screenshot calls
    #[must_use]
    pub fn with_screenshot(self, data: Vec<u8>) -> Self {
        self.lock().screenshot = Some(data);
        self
    }

    /// Every call made so far, formatted `method:args`
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Number of calls whose entry starts with `prefix`
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.lock().history.iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Check if a method was called
    pub fn was_called(&self, method: &str) -> bool {
        self.count_calls(method) > 0
    }

    /// Value last filled into the element located by `selector`
    pub fn filled_value(&self, selector: &str) -> Option<String> {
        self.lock().filled.get(selector).cloned()
    }

    fn take_action_failure(state: &mut MockState) -> bool {
        if state.failing_actions > 0 {
            state.failing_actions -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> HealResult<ElementHandle> {
        let mut state = self.lock();
        state.history.push(format!("wait_for_visible:{selector}"));

        if let Some(misses) = state.delayed.get_mut(selector) {
            if *misses == 0 {
                return Ok(ElementHandle::new(selector));
            }
            *misses -= 1;
        } else if state.visible.contains(selector) {
            return Ok(ElementHandle::new(selector));
        } else if state.hidden.contains(selector) {
            return Err(HealError::page(format!("element {selector} is not visible")));
        }
        Err(HealError::timeout(
            format!("waiting for {selector}"),
            timeout.as_millis() as u64,
        ))
    }

    async fn fill(&self, element: &ElementHandle, value: &str) -> HealResult<()> {
        let mut state = self.lock();
        state.history.push(format!("fill:{}", element.selector));
        if Self::take_action_failure(&mut state) {
            return Err(HealError::action("fill", &element.selector, "element detached"));
        }
        state.filled.insert(element.selector.clone(), value.to_string());
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> HealResult<()> {
        let mut state = self.lock();
        state.history.push(format!("click:{}", element.selector));
        if Self::take_action_failure(&mut state) {
            return Err(HealError::action("click", &element.selector, "element intercepted"));
        }
        Ok(())
    }

    async fn goto(&self, url: &str, ready: LoadState, timeout: Duration) -> HealResult<()> {
        let mut state = self.lock();
        state.history.push(format!("goto:{url}:{ready}"));
        let scripted = if state.failing_gotos > 0 {
            state.failing_gotos -= 1;
            true
        } else {
            false
        };
        if state.unreachable || scripted {
            return Err(HealError::page(format!("net::ERR_CONNECTION_REFUSED at {url}")));
        }
        if state.failing_states.contains(&ready) {
            return Err(HealError::timeout(
                format!("goto {url} until {ready}"),
                timeout.as_millis() as u64,
            ));
        }
        state.url = url.to_string();
        Ok(())
    }

    async fn wait_for_load_state(&self, load_state: LoadState, timeout: Duration) -> HealResult<()> {
        let mut state = self.lock();
        state.history.push(format!("wait_for_load_state:{load_state}"));
        if load_state == LoadState::NetworkIdle && state.fail_network_idle_wait {
            return Err(HealError::timeout("waiting for networkidle", timeout.as_millis() as u64));
        }
        Ok(())
    }

    async fn screenshot(&self) -> HealResult<Screenshot> {
        let mut state = self.lock();
        state.history.push("screenshot".to_string());
        state
            .screenshot
            .clone()
            .map(|data| Screenshot::new(data, 1280, 720))
            .ok_or_else(|| HealError::page("screenshot unavailable"))
    }

    async fn current_url(&self) -> HealResult<String> {
        Ok(self.lock().url.clone())
    }
}
