#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelayId {
    Relay1,
    Relay2,
    Relay3,
    Relay4,
    Relay5,
    Relay6,
    Relay7,
    Relay8,
}

impl RelayId {
    pub const ALL: [RelayId; 8] = [
        RelayId::Relay1,
        RelayId::Relay2,
        RelayId::Relay3,
        RelayId::Relay4,
        RelayId::Relay5,
        RelayId::Relay6,
        RelayId::Relay7,
        RelayId::Relay8,
    ];

    pub fn from_number(number: u8) -> Option<RelayId> {
        match number {
            1 => Some(RelayId::Relay1),
            2 => Some(RelayId::Relay2),
            3 => Some(RelayId::Relay3),
            4 => Some(RelayId::Relay4),
            5 => Some(RelayId::Relay5),
            6 => Some(RelayId::Relay6),
            7 => Some(RelayId::Relay7),
            8 => Some(RelayId::Relay8),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            RelayId::Relay1 => 1,
            RelayId::Relay2 => 2,
            RelayId::Relay3 => 3,
            RelayId::Relay4 => 4,
            RelayId::Relay5 => 5,
            RelayId::Relay6 => 6,
            RelayId::Relay7 => 7,
            RelayId::Relay8 => 8,
        }
    }

    pub fn mask(&self) -> u8 {
        0x01 << (self.number() - 1)
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelayState {
    On,
    Off,
}

impl RelayState {
    pub fn from_payload(payload: &[u8]) -> Option<RelayState> {
        let value = String::from_utf8_lossy(payload).to_uppercase();
        match value.as_str() {
            "ON" | "TRUE" | "1" => Some(RelayState::On),
            "OFF" | "FALSE" | "0" => Some(RelayState::Off),
            _ => None,
        }
    }

    pub fn status_literal(&self) -> &'static str {
        match self {
            RelayState::On => "1",
            RelayState::Off => "0",
        }
    }

    pub fn opposite(&self) -> RelayState {
        match self {
            RelayState::On => RelayState::Off,
            RelayState::Off => RelayState::On,
        }
    }
}
