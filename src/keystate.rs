#![allow(non_snake_case)]

use crate::error::ErrorDetail;

/// The number of keys on a single CHIP-8 keypad.
const NUMBER_OF_KEYS: u8 = 16;

/// An abstraction of the state of each key on the CHIP-8 keypad (pressed / not pressed).
///
/// CHIP-8X supports a second player's keypad; every other dialect only ever addresses
/// player one.
pub(crate) struct KeyState {
    /// Array holding a boolean for each key on player one's keypad.
    keys_pressed: [bool; NUMBER_OF_KEYS as usize],
    /// Array holding a boolean for each key on player two's keypad (CHIP-8X only).
    keys_pressed_player_two: [bool; NUMBER_OF_KEYS as usize],
}

impl KeyState {
    /// Constructor that returns a [KeyState] instance with no keys pressed.
    pub(crate) fn new() -> Self {
        KeyState {
            keys_pressed: [false; NUMBER_OF_KEYS as usize],
            keys_pressed_player_two: [false; NUMBER_OF_KEYS as usize],
        }
    }

    /// Returns true if the specified key is pressed on player one's keypad, false if not
    /// pressed, and returns [ErrorDetail::InvalidKey] if the specified key is invalid.
    ///
    /// # Arguments
    ///
    /// * `key` - the hex ordinal of the key (valid range 0x0 to 0xF inclusive)
    pub(crate) fn is_key_pressed(&self, key: u8) -> Result<bool, ErrorDetail> {
        match key {
            n if n < NUMBER_OF_KEYS => Ok(self.keys_pressed[n as usize]),
            _ => Err(ErrorDetail::InvalidKey { key }),
        }
    }

    /// Sets the state of the specified key on player one's keypad; returns
    /// [ErrorDetail::InvalidKey] if the specified key is invalid.
    ///
    /// # Arguments
    ///
    /// * `key` - the hex ordinal of the key (valid range 0x0 to 0xF inclusive)
    /// * `status` - boolean representing key state (true meaning pressed)
    pub(crate) fn set_key_status(&mut self, key: u8, status: bool) -> Result<(), ErrorDetail> {
        match key {
            n if n < NUMBER_OF_KEYS => Ok(self.keys_pressed[n as usize] = status),
            _ => Err(ErrorDetail::InvalidKey { key }),
        }
    }

    /// Returns true if the specified key is pressed on player two's keypad (CHIP-8X only).
    pub(crate) fn is_key_pressed_player_two(&self, key: u8) -> Result<bool, ErrorDetail> {
        match key {
            n if n < NUMBER_OF_KEYS => Ok(self.keys_pressed_player_two[n as usize]),
            _ => Err(ErrorDetail::InvalidKey { key }),
        }
    }

    /// Sets the state of the specified key on player two's keypad (CHIP-8X only).
    pub(crate) fn set_key_status_player_two(
        &mut self,
        key: u8,
        status: bool,
    ) -> Result<(), ErrorDetail> {
        match key {
            n if n < NUMBER_OF_KEYS => Ok(self.keys_pressed_player_two[n as usize] = status),
            _ => Err(ErrorDetail::InvalidKey { key }),
        }
    }

    /// Returns a byte vector holding the hex ordinals of all keys currently pressed on
    /// player one's keypad.
    pub(crate) fn get_keys_pressed(&self) -> Option<Vec<u8>> {
        let mut keys: Vec<u8> = Vec::new();
        for i in 0..NUMBER_OF_KEYS {
            if self.is_key_pressed(i).unwrap() {
                keys.push(i);
            }
        }
        if !keys.is_empty() {
            Some(keys)
        } else {
            None
        }
    }
}
