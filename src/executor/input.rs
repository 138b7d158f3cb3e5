use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// One primitive device command. Commands are delivered over a
/// single-consumer queue to the worker that owns the device handle, so
/// side-effect ordering is the channel's send order.
#[derive(Debug, Clone)]
pub enum InputCommand {
    MoveTo(i32, i32),
    Click(MouseButton),
    TypeText(String),
    /// Key name or combo, e.g. "enter" or "ctrl+c".
    Press(String),
    KeyDown(String),
    KeyUp(String),
}

/// Fire-and-forget input surface. Sends are not acknowledged; commands
/// issued while the backend is unavailable are dropped with a log.
pub trait InputBackend: Send + Sync {
    fn send(&self, command: InputCommand);

    fn is_ready(&self) -> bool;

    fn move_to(&self, x: i32, y: i32) {
        self.send(InputCommand::MoveTo(x, y));
    }

    fn click(&self, button: MouseButton) {
        self.send(InputCommand::Click(button));
    }

    fn type_text(&self, text: &str) {
        self.send(InputCommand::TypeText(text.to_string()));
    }

    fn press_key(&self, key: &str) {
        self.send(InputCommand::Press(key.to_string()));
    }

    fn key_down(&self, key: &str) {
        self.send(InputCommand::KeyDown(key.to_string()));
    }

    fn key_up(&self, key: &str) {
        self.send(InputCommand::KeyUp(key.to_string()));
    }
}

/// Command queue into a dedicated worker thread owning the enigo handle
/// (enigo is not shareable across threads; the original design piped the
/// same commands to a helper process).
pub struct InputHandle {
    tx: mpsc::Sender<InputCommand>,
    ready: Arc<AtomicBool>,
}

impl InputHandle {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<InputCommand>();
        let ready = Arc::new(AtomicBool::new(false));
        let worker_ready = ready.clone();
        thread::Builder::new()
            .name("input-bridge".to_string())
            .spawn(move || worker(rx, worker_ready))
            .expect("failed to spawn input bridge thread");
        Self { tx, ready }
    }
}

impl InputBackend for InputHandle {
    fn send(&self, command: InputCommand) {
        if self.tx.send(command).is_err() {
            tracing::warn!("input bridge is gone, command dropped");
        }
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

fn worker(rx: mpsc::Receiver<InputCommand>, ready: Arc<AtomicBool>) {
    let mut enigo = match Enigo::new(&Settings::default()) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "input backend unavailable, dropping all commands");
            // Keep draining so senders never block or error.
            for _ in rx {}
            return;
        }
    };

    ready.store(true, Ordering::SeqCst);
    tracing::info!("input bridge ready");
    for command in rx {
        if let Err(e) = apply(&mut enigo, &command) {
            tracing::warn!(error = %e, ?command, "input command failed");
        }
    }
}

fn apply(enigo: &mut Enigo, command: &InputCommand) -> Result<(), enigo::InputError> {
    match command {
        InputCommand::MoveTo(x, y) => {
            enigo.move_mouse(*x, *y, Coordinate::Abs)?;
        }
        InputCommand::Click(button) => {
            enigo.button(to_enigo_button(*button), Direction::Click)?;
        }
        InputCommand::TypeText(text) => {
            enigo.text(text)?;
        }
        InputCommand::Press(combo) => press_combo(enigo, combo)?,
        InputCommand::KeyDown(name) => {
            if let Some(key) = map_key(name) {
                enigo.key(key, Direction::Press)?;
            }
        }
        InputCommand::KeyUp(name) => {
            if let Some(key) = map_key(name) {
                enigo.key(key, Direction::Release)?;
            }
        }
    }
    Ok(())
}

/// Combos hold each modifier in order, click the final key, then release
/// the modifiers in reverse.
fn press_combo(enigo: &mut Enigo, combo: &str) -> Result<(), enigo::InputError> {
    let keys = parse_combo(combo);
    let Some((last, modifiers)) = keys.split_last() else {
        return Ok(());
    };

    for key in modifiers {
        enigo.key(*key, Direction::Press)?;
    }
    enigo.key(*last, Direction::Click)?;
    for key in modifiers.iter().rev() {
        enigo.key(*key, Direction::Release)?;
    }
    Ok(())
}

fn parse_combo(combo: &str) -> Vec<Key> {
    combo
        .split('+')
        .filter_map(|part| map_key(part.trim()))
        .collect()
}

fn map_key(name: &str) -> Option<Key> {
    let key = match name.to_lowercase().as_str() {
        "enter" | "return" => Key::Return,
        "escape" | "esc" => Key::Escape,
        "tab" => Key::Tab,
        "space" => Key::Space,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "ctrl" | "control" => Key::Control,
        "alt" => Key::Alt,
        "shift" => Key::Shift,
        "win" | "windows" | "cmd" | "super" | "meta" => Key::Meta,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => {
                    tracing::warn!(key = other, "unmapped key name, skipping");
                    return None;
                }
            }
        }
    };
    Some(key)
}

fn to_enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys_map() {
        assert!(matches!(map_key("enter"), Some(Key::Return)));
        assert!(matches!(map_key("Escape"), Some(Key::Escape)));
        assert!(matches!(map_key("win"), Some(Key::Meta)));
        assert!(matches!(map_key("pagedown"), Some(Key::PageDown)));
    }

    #[test]
    fn test_single_characters_map_to_unicode() {
        assert!(matches!(map_key("a"), Some(Key::Unicode('a'))));
        assert!(matches!(map_key("1"), Some(Key::Unicode('1'))));
    }

    #[test]
    fn test_unknown_multi_char_name_is_skipped() {
        assert!(map_key("hyperdrive").is_none());
    }

    #[test]
    fn test_combo_parsing_keeps_order() {
        let keys = parse_combo("ctrl+shift+s");
        assert_eq!(keys.len(), 3);
        assert!(matches!(keys[0], Key::Control));
        assert!(matches!(keys[1], Key::Shift));
        assert!(matches!(keys[2], Key::Unicode('s')));
    }

    #[test]
    fn test_combo_with_unknown_part_drops_only_that_part() {
        let keys = parse_combo("ctrl+bogusname+c");
        assert_eq!(keys.len(), 2);
    }
}
