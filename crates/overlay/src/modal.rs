//! Modal host: open/close, focus containment, Escape to close and
//! background scroll suppression.

use tracing::{debug, info};

pub const SCROLL_LOCK_OVERFLOW: &str = "hidden";

/// The page the modal lives on.
pub trait Page: Clone {
    type Element: Clone + PartialEq;
    /// Removes its key listener when dropped.
    type KeyListener;

    /// Inline `overflow` style of the document body, `""` when unset.
    fn body_overflow(&self) -> String;
    fn set_body_overflow(&self, value: &str);

    fn active_element(&self) -> Option<Self::Element>;
    fn focus(&self, element: &Self::Element);
    /// Whether `element` is still in the document.
    fn is_attached(&self, _element: &Self::Element) -> bool {
        true
    }
    /// Focusable elements inside the modal content, in tab order.
    fn focusable_elements(&self) -> Vec<Self::Element>;

    /// Start routing keydown events to the modal.
    fn install_key_listener(&self) -> Self::KeyListener;
}

/// Body scroll suppression. Restores the exact prior overflow value when
/// dropped.
pub struct ScrollLock<P: Page> {
    page: P,
    prior: String,
}

impl<P: Page> ScrollLock<P> {
    pub fn acquire(page: &P) -> Self {
        let prior = page.body_overflow();
        page.set_body_overflow(SCROLL_LOCK_OVERFLOW);
        Self {
            page: page.clone(),
            prior,
        }
    }

    pub fn prior(&self) -> &str {
        &self.prior
    }
}

impl<P: Page> Drop for ScrollLock<P> {
    fn drop(&mut self) {
        self.page.set_body_overflow(&self.prior);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Tab { shift: bool },
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key`.
    pub fn from_dom(key: &str, shift: bool) -> Self {
        match key {
            "Escape" | "Esc" => Key::Escape,
            "Tab" => Key::Tab { shift },
            _ => Key::Other,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Closed,
    /// Focus was moved by the trap; the default action must be prevented.
    FocusWrapped,
    /// Let the browser handle it.
    Ignored,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    Backdrop,
    /// Inside the modal panel. Never reaches the backdrop handler.
    Content,
}

struct OpenSession<P: Page> {
    restore_focus: Option<P::Element>,
    _scroll: ScrollLock<P>,
    _keys: P::KeyListener,
}

/// Closed ⇄ Open. Listeners and the scroll lock exist only while open and
/// are released on close or when the modal is dropped.
pub struct Modal<P: Page> {
    page: P,
    session: Option<OpenSession<P>>,
}

impl<P: Page> Modal<P> {
    pub fn new(page: P) -> Self {
        Self {
            page,
            session: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn open(&mut self) {
        if self.is_open() {
            return;
        }
        let restore_focus = self.page.active_element();
        let scroll = ScrollLock::acquire(&self.page);
        let keys = self.page.install_key_listener();
        self.session = Some(OpenSession {
            restore_focus,
            _scroll: scroll,
            _keys: keys,
        });
        if let Some(first) = self.page.focusable_elements().first() {
            self.page.focus(first);
        }
        info!("modal opened");
    }

    pub fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let restore_focus = session.restore_focus.take();
        drop(session);
        if let Some(element) = restore_focus
            && self.page.is_attached(&element)
        {
            self.page.focus(&element);
        }
        info!("modal closed");
    }

    pub fn on_key(&mut self, key: Key) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        match key {
            Key::Escape => {
                self.close();
                KeyOutcome::Closed
            }
            Key::Tab { shift } => self.trap_tab(shift),
            Key::Other => KeyOutcome::Ignored,
        }
    }

    pub fn on_click(&mut self, target: ClickTarget) -> bool {
        match target {
            ClickTarget::Backdrop if self.is_open() => {
                debug!("backdrop clicked");
                self.close();
                true
            }
            _ => false,
        }
    }

    fn trap_tab(&mut self, shift: bool) -> KeyOutcome {
        let focusable = self.page.focusable_elements();
        let (Some(first), Some(last)) = (focusable.first(), focusable.last()) else {
            return KeyOutcome::Ignored;
        };
        let active = self.page.active_element();
        let inside = active
            .as_ref()
            .is_some_and(|a| focusable.iter().any(|f| f == a));
        let wrap_to = if !inside {
            Some(if shift { last } else { first })
        } else if shift && active.as_ref() == Some(first) {
            Some(last)
        } else if !shift && active.as_ref() == Some(last) {
            Some(first)
        } else {
            None
        };
        match wrap_to {
            Some(target) => {
                self.page.focus(target);
                KeyOutcome::FocusWrapped
            }
            None => KeyOutcome::Ignored,
        }
    }
}

impl<P: Page> Drop for Modal<P> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{ClickTarget, Key, KeyOutcome, Modal, Page};

    #[derive(Debug, Default)]
    pub(crate) struct PageState {
        pub overflow: String,
        pub active: Option<u32>,
        pub focusable: Vec<u32>,
        pub listeners: usize,
        pub detached: Vec<u32>,
    }

    #[derive(Clone, Default)]
    pub(crate) struct FakePage(pub Rc<RefCell<PageState>>);

    pub(crate) struct FakeListener(Rc<RefCell<PageState>>);

    impl Drop for FakeListener {
        fn drop(&mut self) {
            self.0.borrow_mut().listeners -= 1;
        }
    }

    impl FakePage {
        pub(crate) fn with(overflow: &str, active: Option<u32>, focusable: &[u32]) -> Self {
            let page = FakePage::default();
            {
                let mut s = page.0.borrow_mut();
                s.overflow = overflow.to_string();
                s.active = active;
                s.focusable = focusable.to_vec();
            }
            page
        }

        fn active(&self) -> Option<u32> {
            self.0.borrow().active
        }
    }

    impl Page for FakePage {
        type Element = u32;
        type KeyListener = FakeListener;

        fn body_overflow(&self) -> String {
            self.0.borrow().overflow.clone()
        }

        fn set_body_overflow(&self, value: &str) {
            self.0.borrow_mut().overflow = value.to_string();
        }

        fn active_element(&self) -> Option<u32> {
            self.0.borrow().active
        }

        fn focus(&self, element: &u32) {
            self.0.borrow_mut().active = Some(*element);
        }

        fn is_attached(&self, element: &u32) -> bool {
            !self.0.borrow().detached.contains(element)
        }

        fn focusable_elements(&self) -> Vec<u32> {
            self.0.borrow().focusable.clone()
        }

        fn install_key_listener(&self) -> FakeListener {
            self.0.borrow_mut().listeners += 1;
            FakeListener(self.0.clone())
        }
    }

    #[test]
    fn open_focuses_first_and_locks_scroll() {
        let page = FakePage::with("auto", Some(99), &[1, 2, 3]);
        let mut modal = Modal::new(page.clone());
        modal.open();
        assert!(modal.is_open());
        assert_eq!(page.active(), Some(1));
        assert_eq!(page.body_overflow(), "hidden");
        assert_eq!(page.0.borrow().listeners, 1);
    }

    #[test]
    fn tab_wraps_both_ways() {
        let page = FakePage::with("", None, &[1, 2, 3]);
        let mut modal = Modal::new(page.clone());
        modal.open();

        assert_eq!(modal.on_key(Key::Tab { shift: true }), KeyOutcome::FocusWrapped);
        assert_eq!(page.active(), Some(3));

        assert_eq!(modal.on_key(Key::Tab { shift: false }), KeyOutcome::FocusWrapped);
        assert_eq!(page.active(), Some(1));

        page.focus(&2);
        assert_eq!(modal.on_key(Key::Tab { shift: false }), KeyOutcome::Ignored);
        assert_eq!(modal.on_key(Key::Other), KeyOutcome::Ignored);
    }

    #[test]
    fn escape_restores_exact_overflow_and_focus() {
        for prior in ["", "scroll", "auto clip"] {
            let page = FakePage::with(prior, Some(42), &[7, 8]);
            let mut modal = Modal::new(page.clone());
            modal.open();
            assert_eq!(modal.on_key(Key::Escape), KeyOutcome::Closed);
            assert!(!modal.is_open());
            assert_eq!(page.body_overflow(), prior);
            assert_eq!(page.active(), Some(42));
            assert_eq!(page.0.borrow().listeners, 0);
        }
    }

    #[test]
    fn backdrop_closes_but_content_click_does_not() {
        let page = FakePage::with("", None, &[1]);
        let mut modal = Modal::new(page);
        modal.open();
        assert!(!modal.on_click(ClickTarget::Content));
        assert!(modal.is_open());
        assert!(modal.on_click(ClickTarget::Backdrop));
        assert!(!modal.is_open());
    }

    #[test]
    fn repeated_cycles_do_not_leak_listeners() {
        let page = FakePage::with("visible", None, &[1, 2]);
        let mut modal = Modal::new(page.clone());
        for _ in 0..100 {
            modal.open();
            modal.open();
            assert_eq!(page.0.borrow().listeners, 1);
            modal.close();
            modal.close();
            assert_eq!(page.0.borrow().listeners, 0);
            assert_eq!(page.body_overflow(), "visible");
        }
    }

    #[test]
    fn dropping_an_open_modal_releases_everything() {
        let page = FakePage::with("auto", None, &[1]);
        {
            let mut modal = Modal::new(page.clone());
            modal.open();
            assert_eq!(page.body_overflow(), "hidden");
        }
        assert_eq!(page.body_overflow(), "auto");
        assert_eq!(page.0.borrow().listeners, 0);
    }

    #[test]
    fn detached_prior_focus_is_not_restored() {
        let page = FakePage::with("", Some(5), &[1]);
        let mut modal = Modal::new(page.clone());
        modal.open();
        page.0.borrow_mut().detached.push(5);
        modal.close();
        assert_eq!(page.active(), Some(1));
    }

    #[test]
    fn keys_are_ignored_while_closed() {
        let page = FakePage::with("", None, &[1]);
        let mut modal = Modal::new(page);
        assert_eq!(modal.on_key(Key::Escape), KeyOutcome::Ignored);
        assert_eq!(Key::from_dom("Tab", true), Key::Tab { shift: true });
    }
}
