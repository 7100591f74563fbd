//! The modal host backed by the live document.

use overlay::Page;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use web_sys::{Document, Element, HtmlElement, KeyboardEvent};

const FOCUSABLE: &str = "button:not([disabled]), [href], input:not([disabled]), \
    select:not([disabled]), textarea:not([disabled]), [tabindex]:not([tabindex=\"-1\"])";

/// Element ids the host page provides for the overlay.
#[derive(Debug, Clone)]
pub struct OverlayIds {
    pub backdrop: String,
    pub panel: String,
}

impl Default for OverlayIds {
    fn default() -> Self {
        Self {
            backdrop: "globe-overlay-backdrop".to_string(),
            panel: "globe-overlay-panel".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct DomPage {
    document: Document,
    ids: OverlayIds,
    on_key: fn(&KeyboardEvent),
}

impl DomPage {
    pub fn new(document: Document, ids: OverlayIds, on_key: fn(&KeyboardEvent)) -> Self {
        Self {
            document,
            ids,
            on_key,
        }
    }

    /// Show or hide the backdrop (and the panel inside it).
    pub fn set_overlay_visible(&self, visible: bool) {
        let Some(backdrop) = self
            .document
            .get_element_by_id(&self.ids.backdrop)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let _ = backdrop
            .style()
            .set_property("display", if visible { "flex" } else { "none" });
    }
}

impl Page for DomPage {
    type Element = Element;
    type KeyListener = KeyListener;

    fn body_overflow(&self) -> String {
        self.document
            .body()
            .and_then(|body| body.style().get_property_value("overflow").ok())
            .unwrap_or_default()
    }

    fn set_body_overflow(&self, value: &str) {
        let Some(body) = self.document.body() else {
            return;
        };
        let style = body.style();
        if value.is_empty() {
            let _ = style.remove_property("overflow");
        } else {
            let _ = style.set_property("overflow", value);
        }
    }

    fn active_element(&self) -> Option<Element> {
        self.document.active_element()
    }

    fn focus(&self, element: &Element) {
        if let Some(element) = element.dyn_ref::<HtmlElement>() {
            let _ = element.focus();
        }
    }

    fn is_attached(&self, element: &Element) -> bool {
        element.is_connected()
    }

    fn focusable_elements(&self) -> Vec<Element> {
        let Some(panel) = self.document.get_element_by_id(&self.ids.panel) else {
            return Vec::new();
        };
        let Ok(nodes) = panel.query_selector_all(FOCUSABLE) else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn install_key_listener(&self) -> KeyListener {
        KeyListener::install(&self.document, self.on_key)
    }
}

/// A `keydown` listener on the document, removed on drop.
pub struct KeyListener {
    target: Document,
    closure: Closure<dyn FnMut(KeyboardEvent)>,
}

impl KeyListener {
    fn install(document: &Document, on_key: fn(&KeyboardEvent)) -> Self {
        let closure =
            Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| on_key(&event));
        if document
            .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())
            .is_err()
        {
            tracing::warn!("keydown listener not installed");
        }
        Self {
            target: document.clone(),
            closure,
        }
    }
}

impl Drop for KeyListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback("keydown", self.closure.as_ref().unchecked_ref());
    }
}
