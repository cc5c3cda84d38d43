use crate::relay_cmd::relay_command;
use crate::relay_types::RelayId;
use crate::relay_types::RelayState;
use crate::transport::FrameSink;

use anyhow::Result;
use log::debug;
use std::thread;
use std::time::Duration;

pub const DEFAULT_PULSE_LENGTH: Duration = Duration::from_millis(200);

/// Authoritative state of the relay board. The bitmask is only ever written,
/// never read back from the hardware; bit (n - 1) is set iff relay n is
/// commanded on.
pub struct RelayBank {
    state: u8,
    sink: Box<dyn FrameSink>,
    pulse_length: Duration,
}

impl RelayBank {
    pub fn new(sink: Box<dyn FrameSink>, pulse_length: Duration) -> RelayBank {
        RelayBank {
            state: 0x00,
            sink,
            pulse_length,
        }
    }

    pub fn get(&self, id: u8) -> bool {
        match RelayId::from_number(id) {
            Some(relay) => self.current(relay) == RelayState::On,
            None => false,
        }
    }

    fn current(&self, relay: RelayId) -> RelayState {
        if self.state & relay.mask() > 0 {
            RelayState::On
        } else {
            RelayState::Off
        }
    }

    // Only one relay may be logically on at a time. Turning off is always
    // allowed, as is re-asserting the single relay that is already on.
    pub fn can_activate(&self, relay: RelayId, state: RelayState) -> bool {
        if state == RelayState::Off {
            return true;
        }
        if self.state == 0x00 {
            return true;
        }
        self.state == relay.mask()
    }

    /// Returns true if a relay command went out. `Err` is reserved for
    /// transport failures; a refused or out-of-range request is `Ok(false)`
    /// and leaves the state untouched.
    pub fn set(&mut self, id: u8, state: RelayState) -> Result<bool> {
        let relay = match RelayId::from_number(id) {
            Some(relay) => relay,
            None => return Ok(false),
        };
        if !self.can_activate(relay, state) {
            return Ok(false);
        }
        self.sink.send(&relay_command(relay, state))?;
        match state {
            RelayState::On => self.state |= relay.mask(),
            RelayState::Off => self.state &= !relay.mask(),
        }
        debug!("Set '{:?}' to '{:?}'", relay, state);
        Ok(true)
    }

    /// Pulses a relay into `state` and back to where it was. A trigger into
    /// the current state is a no-op. The pulse wait is a blocking sleep;
    /// nothing else runs on this thread, so no command can interleave with
    /// the pulse.
    pub fn trigger(&mut self, id: u8, state: RelayState) -> Result<bool> {
        let relay = match RelayId::from_number(id) {
            Some(relay) => relay,
            None => return Ok(false),
        };
        let current = self.current(relay);
        if current == state {
            return Ok(false);
        }
        self.set(id, state)?;
        thread::sleep(self.pulse_length);
        self.set(id, current)?;
        Ok(true)
    }

    /// Boot reset: every relay gets an explicit off command so the board and
    /// the bitmask agree from the start.
    pub fn reset_all(&mut self) -> Result<()> {
        for relay in RelayId::ALL {
            self.set(relay.number(), RelayState::Off)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockSink;

    fn bank() -> (RelayBank, std::rc::Rc<std::cell::RefCell<Vec<[u8; 4]>>>) {
        let (sink, frames) = MockSink::new();
        let bank = RelayBank::new(Box::new(sink), Duration::from_millis(1));
        (bank, frames)
    }

    #[test]
    fn get_after_set() {
        let (mut bank, _frames) = bank();
        for id in 1..=8 {
            assert!(bank.set(id, RelayState::On).unwrap());
            assert!(bank.get(id));
            assert!(bank.set(id, RelayState::Off).unwrap());
            assert!(!bank.get(id));
        }
    }

    #[test]
    fn out_of_range_ids_are_refused() {
        let (mut bank, frames) = bank();
        for id in [0u8, 9, 42, 0xFF] {
            assert!(!bank.set(id, RelayState::On).unwrap());
            assert!(!bank.get(id));
            assert!(!bank.trigger(id, RelayState::On).unwrap());
        }
        assert!(frames.borrow().is_empty());
    }

    #[test]
    fn exclusivity_blocks_second_relay() {
        let (mut bank, frames) = bank();
        assert!(bank.set(2, RelayState::On).unwrap());
        for other in 1..=8 {
            if other == 2 {
                continue;
            }
            assert!(!bank.set(other, RelayState::On).unwrap());
            assert!(!bank.get(other));
        }
        // one frame for the accepted set, none for the refused ones
        assert_eq!(frames.borrow().len(), 1);
        assert!(bank.get(2));
    }

    #[test]
    fn reassert_and_release_are_allowed() {
        let (mut bank, _frames) = bank();
        assert!(bank.set(5, RelayState::On).unwrap());
        assert!(bank.set(5, RelayState::On).unwrap());
        assert!(bank.set(5, RelayState::Off).unwrap());
        assert!(!bank.get(5));
    }

    #[test]
    fn off_is_always_permitted() {
        let (mut bank, _frames) = bank();
        for id in 1..=8 {
            assert!(bank.set(id, RelayState::Off).unwrap());
        }
        assert!(bank.set(3, RelayState::On).unwrap());
        // a different relay may still be commanded off while 3 is on
        assert!(bank.set(7, RelayState::Off).unwrap());
    }

    #[test]
    fn trigger_round_trip_restores_state() {
        let (mut bank, frames) = bank();
        assert!(!bank.get(4));
        assert!(bank.trigger(4, RelayState::On).unwrap());
        assert!(!bank.get(4));
        assert_eq!(
            *frames.borrow(),
            vec![[0xA0, 0x04, 0x01, 0xA5], [0xA0, 0x04, 0x00, 0xA4]]
        );
    }

    #[test]
    fn trigger_from_on_restores_on() {
        let (mut bank, frames) = bank();
        assert!(bank.set(4, RelayState::On).unwrap());
        frames.borrow_mut().clear();
        // the restoring set re-asserts relay 4, which exclusivity permits
        assert!(bank.trigger(4, RelayState::Off).unwrap());
        assert!(bank.get(4));
        assert_eq!(frames.borrow().len(), 2);
    }

    #[test]
    fn trigger_into_current_state_is_a_noop() {
        let (mut bank, frames) = bank();
        assert!(!bank.trigger(6, RelayState::Off).unwrap());
        assert!(frames.borrow().is_empty());
        assert!(bank.set(6, RelayState::On).unwrap());
        frames.borrow_mut().clear();
        assert!(!bank.trigger(6, RelayState::On).unwrap());
        assert!(frames.borrow().is_empty());
    }

    #[test]
    fn reset_sends_eight_off_frames() {
        let (mut bank, frames) = bank();
        bank.reset_all().unwrap();
        let frames = frames.borrow();
        assert_eq!(frames.len(), 8);
        for (i, frame) in frames.iter().enumerate() {
            let n = (i + 1) as u8;
            assert_eq!(*frame, [0xA0, n, 0x00, 0xA0 + n]);
        }
        for id in 1..=8 {
            assert!(!bank.get(id));
        }
    }
}
