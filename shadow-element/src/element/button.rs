//! Button Element
//!
//! A [`ShadowElement`] that behaves like a native button for keyboard and
//! pointer users:
//!
//! - the host carries `role="button"` and is focusable (`tabindex="0"`)
//!   while enabled;
//! - Enter and Space key presses are turned into clicks;
//! - clicks on a disabled button are cancelled before any later listener
//!   sees them.
//!
//! The host listeners are installed at construction and live as long as the
//! element, independent of attach and detach.

use std::sync::Arc;

use super::environment::Environment;
use super::shadow::{ElementBehavior, ShadowElement, WeakElement};
use crate::error::Result;
use crate::events::{Event, Listener};
use crate::reflect::ElementDefinition;

const CLICK_KEYS: [&str; 2] = ["Enter", " "];

/// A button-like element. Derefs to its [`ShadowElement`].
#[derive(Debug, Clone)]
pub struct ButtonElement {
    element: ShadowElement,
}

impl ButtonElement {
    pub fn new(definition: Arc<ElementDefinition>, behavior: Arc<dyn ElementBehavior>, env: &Environment) -> Result<Self> {
        Self::wrap(ShadowElement::new(definition, behavior, env))
    }

    /// Give an unattached element button semantics.
    pub fn wrap(element: ShadowElement) -> Result<Self> {
        let weak = element.downgrade();
        let on_keypress: Listener = Arc::new(move |event: &Event| {
            let pressed = event.key().is_some_and(|key| CLICK_KEYS.contains(&key));
            match weak.upgrade() {
                Some(element) if pressed => ButtonElement { element }.click(),
                _ => Ok(()),
            }
        });

        let weak: WeakElement = element.downgrade();
        let on_click: Listener = Arc::new(move |event: &Event| {
            let disabled = weak.upgrade().is_some_and(|element| element.has_attribute("disabled"));
            if disabled {
                event.prevent_default();
                event.stop_propagation();
                event.stop_immediate_propagation();
            }
            Ok(())
        });

        element.host().add_event_listener("keypress", on_keypress);
        element.host().add_event_listener("click", on_click);

        element.set_attribute("role", "button")?;
        let button = Self { element };
        if !button.disabled() {
            button.element.set_attribute("tabindex", "0")?;
        }
        Ok(button)
    }

    pub fn element(&self) -> &ShadowElement {
        &self.element
    }

    pub fn disabled(&self) -> bool {
        self.element.has_attribute("disabled")
    }

    /// Enable or disable the button. Setting the current state does nothing.
    pub fn set_disabled(&self, disabled: bool) -> Result<()> {
        if self.disabled() == disabled {
            return Ok(());
        }

        if disabled {
            self.element.remove_attribute("tabindex")?;
            self.element.set_attribute("disabled", "")
        } else {
            self.element.set_attribute("tabindex", "0")?;
            self.element.remove_attribute("disabled")
        }
    }

    /// Dispatch a click on the host.
    pub fn click(&self) -> Result<()> {
        self.element.dispatch_event(&Event::new("click"))
    }
}

impl std::ops::Deref for ButtonElement {
    type Target = ShadowElement;

    fn deref(&self) -> &ShadowElement {
        &self.element
    }
}
