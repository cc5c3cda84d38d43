use crate::relay_types::RelayId;
use crate::relay_types::RelayState;

// Command frame understood by the relay board:
// [ 0xA0 | relay number | state | trailer ]
// where the trailer is the sum of the preceding bytes, wrapped to 8 bits.
// Spelled out per state because that is how the board documents it.
pub fn relay_command(relay: RelayId, state: RelayState) -> [u8; 4] {
    let number = relay.number();
    match state {
        RelayState::On => [0xA0, number, 0x01, 0xA1u8.wrapping_add(number)],
        RelayState::Off => [0xA0, number, 0x00, 0xA0u8.wrapping_add(number)],
    }
}
