//! Display-side mirror of the on-chain contract lifecycle.
//!
//! The lifecycle is enforced by the registry contracts; this type only
//! decodes the stored `uint8` and labels it.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractState {
    NotDeployed,
    NewDeployment,
    AttackRequested,
    UnderAttack,
    PromotionRequested,
    Production,
    Corrupted,
}

impl ContractState {
    /// Decode the on-chain enum value.
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => ContractState::NotDeployed,
            1 => ContractState::NewDeployment,
            2 => ContractState::AttackRequested,
            3 => ContractState::UnderAttack,
            4 => ContractState::PromotionRequested,
            5 => ContractState::Production,
            6 => ContractState::Corrupted,
            _ => return None,
        })
    }

    /// Decode a 32-byte storage word; the state lives in the lowest byte.
    ///
    /// Returns `None` for malformed hex or when the upper bytes are set,
    /// which means the slot holds something other than the state.
    pub fn from_storage_word(word: &str) -> Option<Self> {
        let hex = word.strip_prefix("0x").unwrap_or(word);
        if hex.is_empty() || hex.len() > 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let (upper, low) = hex.split_at(hex.len().saturating_sub(2));
        if upper.chars().any(|c| c != '0') {
            return None;
        }
        u8::from_str_radix(low, 16).ok().and_then(Self::from_u8)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContractState::NotDeployed => "Not deployed",
            ContractState::NewDeployment => "New deployment",
            ContractState::AttackRequested => "Attack requested",
            ContractState::UnderAttack => "Under attack",
            ContractState::PromotionRequested => "Promotion requested",
            ContractState::Production => "Production",
            ContractState::Corrupted => "Corrupted",
        }
    }
}

impl fmt::Display for ContractState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_state() {
        let states: Vec<_> = (0..=6).filter_map(ContractState::from_u8).collect();
        assert_eq!(states.len(), 7);
        assert_eq!(states[3], ContractState::UnderAttack);
        assert!(ContractState::from_u8(7).is_none());
    }

    #[test]
    fn decodes_storage_word() {
        let word = format!("0x{:0>64}", "04");
        assert_eq!(
            ContractState::from_storage_word(&word),
            Some(ContractState::PromotionRequested)
        );
        assert_eq!(
            ContractState::from_storage_word("0x0"),
            Some(ContractState::NotDeployed)
        );
        assert!(ContractState::from_storage_word(&format!("0x{:0>64}", "0105")).is_none());
        assert!(ContractState::from_storage_word("0xzz").is_none());
    }
}
