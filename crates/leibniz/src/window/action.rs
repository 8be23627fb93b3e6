//! Actions and menus.
//!
//! An [`Action`] is a named command that can sit in a menu and carry a
//! keyboard shortcut. Triggering it emits `triggered`, whichever way it was
//! activated (menu item, mnemonic, or shortcut).

use std::sync::Arc;

use leibniz_core::Signal;
use parking_lot::RwLock;

use super::shortcut::{KeyCombination, MnemonicText, parse_mnemonic};

struct ActionState {
    text: String,
    mnemonic: MnemonicText,
    shortcut: Option<KeyCombination>,
    enabled: bool,
}

/// A menu command.
///
/// # Signals
///
/// - `triggered(())`: Emitted when the action is activated while enabled
/// - `changed(())`: Emitted when text, shortcut or enabled state change
pub struct Action {
    state: RwLock<ActionState>,
    pub triggered: Signal<()>,
    pub changed: Signal<()>,
}

impl Action {
    /// Create a new action. `text` may mark a mnemonic with `&`.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mnemonic = parse_mnemonic(&text);
        Self {
            state: RwLock::new(ActionState {
                text,
                mnemonic,
                shortcut: None,
                enabled: true,
            }),
            triggered: Signal::new(),
            changed: Signal::new(),
        }
    }

    /// Set the shortcut using builder pattern.
    pub fn with_shortcut(self, shortcut: KeyCombination) -> Self {
        self.state.write().shortcut = Some(shortcut);
        self
    }

    /// The raw text including `&` markers.
    pub fn text(&self) -> String {
        self.state.read().text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        {
            let mut state = self.state.write();
            let text = text.into();
            state.mnemonic = parse_mnemonic(&text);
            state.text = text;
        }
        self.changed.emit(());
    }

    /// The text as displayed in a menu.
    pub fn display_text(&self) -> String {
        self.state.read().mnemonic.display_text.clone()
    }

    pub fn mnemonic(&self) -> Option<char> {
        self.state.read().mnemonic.mnemonic
    }

    pub fn shortcut(&self) -> Option<KeyCombination> {
        self.state.read().shortcut.clone()
    }

    pub fn set_shortcut(&self, shortcut: Option<KeyCombination>) {
        self.state.write().shortcut = shortcut;
        self.changed.emit(());
    }

    pub fn is_enabled(&self) -> bool {
        self.state.read().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        let changed = {
            let mut state = self.state.write();
            std::mem::replace(&mut state.enabled, enabled) != enabled
        };
        if changed {
            self.changed.emit(());
        }
    }

    /// Activate the action. Returns `false` if it is disabled.
    pub fn trigger(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        tracing::debug!(target: "leibniz::window", action = %self.display_text(), "action triggered");
        self.triggered.emit(());
        true
    }
}

/// An entry of a [`Menu`].
#[derive(Clone)]
pub enum MenuItem {
    Action(Arc<Action>),
    Separator,
}

/// A drop-down menu.
pub struct Menu {
    title: MnemonicText,
    items: Vec<MenuItem>,
}

impl Menu {
    pub fn new(title: &str) -> Self {
        Self {
            title: parse_mnemonic(title),
            items: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title.display_text
    }

    pub fn mnemonic(&self) -> Option<char> {
        self.title.mnemonic
    }

    pub fn add_action(&mut self, action: Arc<Action>) {
        self.items.push(MenuItem::Action(action));
    }

    pub fn add_separator(&mut self) {
        self.items.push(MenuItem::Separator);
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// The actions of this menu, skipping separators.
    pub fn actions(&self) -> impl Iterator<Item = &Arc<Action>> {
        self.items.iter().filter_map(|item| match item {
            MenuItem::Action(action) => Some(action),
            MenuItem::Separator => None,
        })
    }

    /// The action whose mnemonic is `key`.
    pub fn find_mnemonic(&self, key: char) -> Option<&Arc<Action>> {
        let key = key.to_ascii_lowercase();
        self.actions().find(|action| action.mnemonic() == Some(key))
    }
}

/// The window's menu bar.
#[derive(Default)]
pub struct MenuBar {
    menus: Vec<Menu>,
}

impl MenuBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_menu(&mut self, menu: Menu) {
        self.menus.push(menu);
    }

    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    /// The menu whose title mnemonic is `key`.
    pub fn find_menu(&self, key: char) -> Option<&Menu> {
        let key = key.to_ascii_lowercase();
        self.menus.iter().find(|menu| menu.mnemonic() == Some(key))
    }

    /// The first action bound to `shortcut`.
    pub fn find_shortcut(&self, shortcut: &KeyCombination) -> Option<&Arc<Action>> {
        self.menus
            .iter()
            .flat_map(Menu::actions)
            .find(|action| action.shortcut().as_ref() == Some(shortcut))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_action_text() {
        let action = Action::new("S&top");
        assert_eq!(action.text(), "S&top");
        assert_eq!(action.display_text(), "Stop");
        assert_eq!(action.mnemonic(), Some('t'));

        action.set_text("&Halt");
        assert_eq!(action.display_text(), "Halt");
        assert_eq!(action.mnemonic(), Some('h'));
    }

    #[test]
    fn test_trigger_respects_enabled() {
        let action = Action::new("&Start");
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        action.triggered.connect(move |_| *count_clone.lock() += 1);

        assert!(action.trigger());
        action.set_enabled(false);
        assert!(!action.trigger());
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_changed_signal() {
        let action = Action::new("&Start");
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        action.changed.connect(move |_| *count_clone.lock() += 1);

        action.set_enabled(true);
        action.set_enabled(false);
        action.set_shortcut(Some(KeyCombination::ctrl('s')));
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn test_menu_lookup() {
        let start = Arc::new(Action::new("&Start").with_shortcut(KeyCombination::ctrl('s')));
        let quit = Arc::new(Action::new("&Quit").with_shortcut(KeyCombination::ctrl('q')));

        let mut file = Menu::new("&File");
        file.add_action(start.clone());
        file.add_separator();
        file.add_action(quit.clone());

        assert_eq!(file.title(), "File");
        assert_eq!(file.items().len(), 3);
        assert_eq!(file.actions().count(), 2);
        assert!(Arc::ptr_eq(file.find_mnemonic('Q').unwrap(), &quit));

        let mut bar = MenuBar::new();
        bar.add_menu(file);
        assert!(bar.find_menu('f').is_some());
        assert!(bar.find_menu('h').is_none());
        let found = bar.find_shortcut(&"ctrl+s".parse().unwrap()).unwrap();
        assert!(Arc::ptr_eq(found, &start));
        assert!(bar.find_shortcut(&KeyCombination::ctrl('x')).is_none());
    }
}
