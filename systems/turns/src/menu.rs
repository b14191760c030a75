use ghost_trail_core::{Action, Event, InputSnapshot, SoundEffect};

/// Entries of the in-game pause menu, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MenuEntry {
    /// Close the menu.
    Resume,
    /// Undo the last turn and close the menu.
    Undo,
    /// Restart the stage and close the menu.
    Restart,
    /// Toggle audio; the menu stays open.
    Audio,
    /// Leave for the level select screen.
    Quit,
}

impl MenuEntry {
    /// Display label, reflecting the current audio setting where relevant.
    #[must_use]
    pub const fn label(self, audio_enabled: bool) -> &'static str {
        match self {
            Self::Resume => "RESUME",
            Self::Undo => "UNDO",
            Self::Restart => "RESTART",
            Self::Audio if audio_enabled => "AUDIO: ON",
            Self::Audio => "AUDIO: OFF",
            Self::Quit => "QUIT",
        }
    }
}

/// Cursor state of the pause menu.
#[derive(Clone, Debug, Default)]
pub struct PauseMenu {
    cursor: usize,
}

impl PauseMenu {
    /// Entries in display order.
    pub const ENTRIES: [MenuEntry; 5] = [
        MenuEntry::Resume,
        MenuEntry::Undo,
        MenuEntry::Restart,
        MenuEntry::Audio,
        MenuEntry::Quit,
    ];

    /// Index of the highlighted entry.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Highlighted entry.
    #[must_use]
    pub fn selected(&self) -> MenuEntry {
        Self::ENTRIES[self.cursor % Self::ENTRIES.len()]
    }

    pub(crate) fn open(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor or reports the activated entry.
    pub(crate) fn update(&mut self, input: &InputSnapshot, out: &mut Vec<Event>) -> Option<MenuEntry> {
        let count = Self::ENTRIES.len();
        if input.is_pressed(Action::Pause) {
            out.push(Event::Sound(SoundEffect::Pause));
            return Some(MenuEntry::Resume);
        }
        if input.is_pressed(Action::Choose) {
            out.push(Event::Sound(SoundEffect::Choose));
            return Some(self.selected());
        }
        if input.is_pressed(Action::Up) {
            self.cursor = (self.cursor + count - 1) % count;
            out.push(Event::Sound(SoundEffect::Select));
        } else if input.is_pressed(Action::Down) {
            self.cursor = (self.cursor + 1) % count;
            out.push(Event::Sound(SoundEffect::Select));
        }
        None
    }
}
