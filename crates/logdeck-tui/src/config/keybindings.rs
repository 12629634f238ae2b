use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use logdeck_types::LogLevel;

use crate::app::{Action, Screen};

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    Reader,
    Storage,
    RecordDetail,
    SearchInput,
    WriterInput,
    Confirm,
}

impl KeyContext {
    /// Context for a screen when no input mode is active
    pub fn for_screen(screen: Screen) -> Self {
        match screen {
            Screen::Reader => Self::Reader,
            Screen::Storage => Self::Storage,
            Screen::Writer => Self::WriterInput,
            Screen::RecordDetail => Self::RecordDetail,
        }
    }
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::GoBack);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::F(2)), Action::Navigate(Screen::Reader));
        global.insert(KeyBinding::new(KeyCode::F(3)), Action::Navigate(Screen::Storage));
        global.insert(KeyBinding::new(KeyCode::F(4)), Action::Navigate(Screen::Writer));
        global.insert(KeyBinding::new(KeyCode::Char('x')), Action::DismissToast);
        bindings.insert(KeyContext::Global, global);

        // Reader bindings
        let mut reader = HashMap::new();
        reader.insert(KeyBinding::new(KeyCode::Char('j')), Action::ListDown);
        reader.insert(KeyBinding::new(KeyCode::Down), Action::ListDown);
        reader.insert(KeyBinding::new(KeyCode::Char('k')), Action::ListUp);
        reader.insert(KeyBinding::new(KeyCode::Up), Action::ListUp);
        reader.insert(KeyBinding::new(KeyCode::Enter), Action::ListSelect);
        reader.insert(KeyBinding::new(KeyCode::Char('r')), Action::Refresh);
        reader.insert(KeyBinding::new(KeyCode::Char('t')), Action::ToggleTail);
        reader.insert(KeyBinding::new(KeyCode::Char('p')), Action::CyclePageSize);
        reader.insert(KeyBinding::new(KeyCode::Char('d')), Action::DeleteSelected);
        reader.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        reader.insert(KeyBinding::new(KeyCode::Char('n')), Action::ClearSearch);
        reader.insert(KeyBinding::new(KeyCode::Char('i')), Action::ToggleCaseSensitive);
        reader.insert(KeyBinding::new(KeyCode::Char('s')), Action::Navigate(Screen::Storage));
        reader.insert(KeyBinding::new(KeyCode::Char('w')), Action::Navigate(Screen::Writer));
        for (key, level) in ['1', '2', '3', '4'].into_iter().zip(LogLevel::ALL) {
            reader.insert(KeyBinding::new(KeyCode::Char(key)), Action::ToggleLevel(level));
        }
        bindings.insert(KeyContext::Reader, reader);

        // Storage summary bindings
        let mut storage = HashMap::new();
        storage.insert(KeyBinding::new(KeyCode::Char('j')), Action::ListDown);
        storage.insert(KeyBinding::new(KeyCode::Down), Action::ListDown);
        storage.insert(KeyBinding::new(KeyCode::Char('k')), Action::ListUp);
        storage.insert(KeyBinding::new(KeyCode::Up), Action::ListUp);
        storage.insert(KeyBinding::new(KeyCode::Char('r')), Action::Refresh);
        storage.insert(KeyBinding::new(KeyCode::Char('l')), Action::NextDateRange);
        storage.insert(KeyBinding::new(KeyCode::Right), Action::NextDateRange);
        storage.insert(KeyBinding::new(KeyCode::Char('h')), Action::PrevDateRange);
        storage.insert(KeyBinding::new(KeyCode::Left), Action::PrevDateRange);
        storage.insert(KeyBinding::new(KeyCode::Char('c')), Action::CycleChartType);
        storage.insert(KeyBinding::new(KeyCode::Char('d')), Action::RequestDelete);
        storage.insert(KeyBinding::new(KeyCode::Char('w')), Action::Navigate(Screen::Writer));
        bindings.insert(KeyContext::Storage, storage);

        // Record detail bindings
        let mut detail = HashMap::new();
        detail.insert(KeyBinding::new(KeyCode::Enter), Action::GoBack);
        detail.insert(KeyBinding::new(KeyCode::Backspace), Action::GoBack);
        bindings.insert(KeyContext::RecordDetail, detail);

        // Search input bindings (when search bar is active)
        let mut search_input = HashMap::new();
        search_input.insert(KeyBinding::new(KeyCode::Enter), Action::ApplySearch);
        search_input.insert(KeyBinding::new(KeyCode::Esc), Action::CloseSearch);
        search_input.insert(KeyBinding::new(KeyCode::Backspace), Action::SearchBackspace);
        search_input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::SearchClear);
        search_input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::CloseSearch);
        bindings.insert(KeyContext::SearchInput, search_input);

        // Writer bindings; every other character goes into the message
        let mut writer = HashMap::new();
        writer.insert(KeyBinding::new(KeyCode::Enter), Action::WriterSubmit);
        writer.insert(KeyBinding::new(KeyCode::Tab), Action::WriterCycleLevel);
        writer.insert(KeyBinding::new(KeyCode::Backspace), Action::WriterBackspace);
        writer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::WriterClear);
        writer.insert(KeyBinding::new(KeyCode::Esc), Action::GoBack);
        writer.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        writer.insert(KeyBinding::new(KeyCode::F(2)), Action::Navigate(Screen::Reader));
        writer.insert(KeyBinding::new(KeyCode::F(3)), Action::Navigate(Screen::Storage));
        bindings.insert(KeyContext::WriterInput, writer);

        // Confirmation dialog bindings
        let mut confirm = HashMap::new();
        confirm.insert(KeyBinding::new(KeyCode::Char('y')), Action::ConfirmDelete);
        confirm.insert(KeyBinding::shift(KeyCode::Char('Y')), Action::ConfirmDelete);
        confirm.insert(KeyBinding::new(KeyCode::Enter), Action::ConfirmDelete);
        confirm.insert(KeyBinding::new(KeyCode::Char('n')), Action::CancelDelete);
        confirm.insert(KeyBinding::new(KeyCode::Esc), Action::CancelDelete);
        bindings.insert(KeyContext::Confirm, confirm);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|context_bindings| context_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Text input and dialogs do not fall back to global bindings
        if matches!(context, KeyContext::WriterInput | KeyContext::Confirm) {
            return None;
        }

        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event in search input mode
    /// Returns Some(Action) for special keys, SearchInput for regular characters
    pub fn get_search_input_action(&self, key: &KeyEvent) -> Option<Action> {
        self.input_action(KeyContext::SearchInput, key, Action::SearchInput)
    }

    /// Handle key event on the writer screen
    pub fn get_writer_action(&self, key: &KeyEvent) -> Option<Action> {
        self.input_action(KeyContext::WriterInput, key, Action::WriterInput)
    }

    fn input_action(
        &self,
        context: KeyContext,
        key: &KeyEvent,
        input: fn(char) -> Action,
    ) -> Option<Action> {
        if let Some(action) = self.get_action(context, key) {
            return Some(action);
        }

        match key.code {
            KeyCode::Char(c)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                Some(input(c))
            }
            _ => None,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
