use winit::event::ElementState;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Keys forwarded to the game. Anything not listed here is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Cancel,
    Interact,
    Quit,
}

const KEY_COUNT: usize = 8;

impl Key {
    pub fn from_physical_key(key: PhysicalKey) -> Option<Self> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(Key::Up),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(Key::Down),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(Key::Left),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(Key::Right),
            KeyCode::Enter | KeyCode::Space => Some(Key::Confirm),
            KeyCode::Backspace => Some(Key::Cancel),
            KeyCode::KeyE => Some(Key::Interact),
            KeyCode::Escape => Some(Key::Quit),
            _ => None,
        }
    }

    const fn index(self) -> usize {
        match self {
            Key::Up => 0,
            Key::Down => 1,
            Key::Left => 2,
            Key::Right => 3,
            Key::Confirm => 4,
            Key::Cancel => 5,
            Key::Interact => 6,
            Key::Quit => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyTransition {
    Pressed(Key),
    Released(Key),
}

/// Turns raw key events into press/release edges; OS key repeat on a held
/// key produces nothing.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct KeyStates {
    down: [bool; KEY_COUNT],
}

impl KeyStates {
    pub(crate) fn handle(
        &mut self,
        key: PhysicalKey,
        state: ElementState,
    ) -> Option<KeyTransition> {
        let key = Key::from_physical_key(key)?;
        let was_down = self.down[key.index()];
        match state {
            ElementState::Pressed => {
                self.down[key.index()] = true;
                (!was_down).then_some(KeyTransition::Pressed(key))
            }
            ElementState::Released => {
                self.down[key.index()] = false;
                was_down.then_some(KeyTransition::Released(key))
            }
        }
    }

    pub(crate) fn is_down(&self, key: Key) -> bool {
        self.down[key.index()]
    }
}
