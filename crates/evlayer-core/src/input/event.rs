// evlayer Input Layer - Raw Event Filtering
// Turns raw evdev (type, code, value) triples into key events

use crate::event::KeyEvent;

/// EV_KEY event type code from linux/input-event-codes.h
pub const EV_KEY: u16 = 0x01;

/// Check if an event is a key event.
pub fn is_key_event(event_type: u16) -> bool {
    event_type == EV_KEY
}

/// Convert a raw input event into a key event.
///
/// Returns `None` for non-key events (SYN, MSC, REL, ...) and for key
/// values outside release/press/repeat.
pub fn key_event_from_raw(event_type: u16, code: u16, value: i32) -> Option<KeyEvent> {
    if !is_key_event(event_type) {
        return None;
    }
    KeyEvent::from_raw(code, value)
}
