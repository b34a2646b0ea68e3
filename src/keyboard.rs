//! Keyboard event source injected into tool adapters.
//!
//! The host forwards key presses and releases to a [`KeyboardHub`]. Each
//! consumer holds a [`KeySubscription`] and drains its own queue; dropping
//! the subscription deregisters it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Keyboard keys (simplified set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    Space,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Numeric value of a digit key.
    pub fn digit(&self) -> Option<u32> {
        match self {
            Key::Char(c) => c.to_digit(10),
            _ => None,
        }
    }

    fn name(&self) -> Option<&'static str> {
        let name = match self {
            Key::Char(_) => return None,
            Key::Enter => "Enter",
            Key::Escape => "Escape",
            Key::Backspace => "Backspace",
            Key::Delete => "Delete",
            Key::Tab => "Tab",
            Key::Space => "Space",
            Key::Up => "ArrowUp",
            Key::Down => "ArrowDown",
            Key::Left => "ArrowLeft",
            Key::Right => "ArrowRight",
        };
        Some(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.name()) {
            (Key::Char(c), _) => write!(f, "{}", c),
            (_, Some(name)) => f.write_str(name),
            _ => Ok(()),
        }
    }
}

impl TryFrom<String> for Key {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let key = match s.as_str() {
            "Enter" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            "Backspace" => Key::Backspace,
            "Delete" | "Del" => Key::Delete,
            "Tab" => Key::Tab,
            "Space" | " " => Key::Space,
            "ArrowUp" | "Up" => Key::Up,
            "ArrowDown" | "Down" => Key::Down,
            "ArrowLeft" | "Left" => Key::Left,
            "ArrowRight" | "Right" => Key::Right,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return Err(format!("unknown key name: {:?}", other)),
                }
            }
        };
        Ok(key)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

/// Whether a key went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Press,
    Release,
}

/// A key event as delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub kind: KeyKind,
    /// A text input had focus when the key was typed
    pub input_focused: bool,
}

impl KeyEvent {
    pub fn press(key: Key) -> Self {
        Self {
            key,
            kind: KeyKind::Press,
            input_focused: false,
        }
    }

    pub fn release(key: Key) -> Self {
        Self {
            key,
            kind: KeyKind::Release,
            input_focused: false,
        }
    }

    /// Mark the event as typed into a focused text input.
    pub fn in_input(mut self) -> Self {
        self.input_focused = true;
        self
    }
}

type Queue = Rc<RefCell<VecDeque<KeyEvent>>>;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    subscribers: Vec<(u64, Queue)>,
}

/// Fan-out point for keyboard events.
///
/// Cloning the hub yields another handle to the same subscriber set.
#[derive(Clone, Default)]
pub struct KeyboardHub {
    inner: Rc<RefCell<HubInner>>,
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber. Events dispatched afterwards are queued for it.
    pub fn subscribe(&self) -> KeySubscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let queue: Queue = Rc::default();
        inner.subscribers.push((id, Rc::clone(&queue)));
        log::debug!("Keyboard subscriber {} registered", id);
        KeySubscription {
            id,
            queue,
            hub: Rc::clone(&self.inner),
        }
    }

    /// Deliver an event to every current subscriber.
    pub fn dispatch(&self, event: KeyEvent) {
        for (_, queue) in &self.inner.borrow().subscribers {
            queue.borrow_mut().push_back(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// A registered keyboard consumer. Deregisters on drop.
pub struct KeySubscription {
    id: u64,
    queue: Queue,
    hub: Rc<RefCell<HubInner>>,
}

impl KeySubscription {
    /// Take all events received since the last drain, oldest first.
    pub fn drain(&self) -> Vec<KeyEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

impl Drop for KeySubscription {
    fn drop(&mut self) {
        self.hub
            .borrow_mut()
            .subscribers
            .retain(|(id, _)| *id != self.id);
        log::debug!("Keyboard subscriber {} deregistered", self.id);
    }
}

impl fmt::Debug for KeySubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySubscription")
            .field("id", &self.id)
            .field("queued", &self.queue.borrow().len())
            .finish()
    }
}
