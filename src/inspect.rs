//! One-shot lookups for addresses and transactions.
//!
//! Inputs are validated before any request goes out, so a typo never costs a
//! round trip to the node.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::data::validate::{validate_address, validate_hash, ValidationError};
use crate::data::ContractState;
use crate::rpc::types::{parse_quantity, parse_quantity_u128};
use crate::rpc::{format_wei, RpcClient, RpcError};

#[derive(Debug, Error)]
pub enum InspectError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Summary of an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressReport {
    pub address: String,
    /// Deployed bytecode size in bytes; zero for externally owned accounts.
    pub code_size: usize,
    pub balance_wei: String,
    pub balance: String,
    pub slot: Option<SlotValue>,
    pub state: Option<StateSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotValue {
    pub slot: u64,
    pub value: String,
}

/// A storage slot read as a [`ContractState`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSlot {
    pub slot: u64,
    pub raw: String,
    /// `None` when the word does not hold a known state.
    pub state: Option<ContractState>,
}

impl AddressReport {
    pub fn is_contract(&self) -> bool {
        self.code_size > 0
    }
}

impl fmt::Display for AddressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Address:   {}", self.address)?;
        if self.is_contract() {
            writeln!(f, "Type:      contract ({} bytes of code)", self.code_size)?;
        } else {
            writeln!(f, "Type:      account (no code)")?;
        }
        write!(f, "Balance:   {}", self.balance)?;
        if let Some(ref slot) = self.slot {
            write!(f, "\nSlot {}:    {}", slot.slot, slot.value)?;
        }
        if let Some(ref state) = self.state {
            match state.state {
                Some(s) => write!(f, "\nState:     {} (slot {})", s, state.slot)?,
                None => write!(f, "\nState:     unknown value {} (slot {})", state.raw, state.slot)?,
            }
        }
        Ok(())
    }
}

/// Summary of a transaction and its receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TxReport {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub block_number: Option<u64>,
    /// `None` while pending or for receipts without a status field.
    pub succeeded: Option<bool>,
    pub gas_used: Option<u64>,
    pub contract_address: Option<String>,
}

impl TxReport {
    pub fn is_pending(&self) -> bool {
        self.block_number.is_none()
    }
}

impl fmt::Display for TxReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hash:      {}", self.hash)?;
        writeln!(f, "From:      {}", self.from)?;
        match self.to {
            Some(ref to) => writeln!(f, "To:        {}", to)?,
            None => writeln!(f, "To:        (contract creation)")?,
        }
        write!(f, "Value:     {}", self.value)?;
        let Some(block) = self.block_number else {
            return write!(f, "\nStatus:    pending");
        };
        write!(f, "\nBlock:     {}", block)?;
        let status = match self.succeeded {
            Some(true) => "success",
            Some(false) => "reverted",
            None => "unknown",
        };
        write!(f, "\nStatus:    {}", status)?;
        if let Some(gas) = self.gas_used {
            write!(f, "\nGas used:  {}", gas)?;
        }
        if let Some(ref created) = self.contract_address {
            write!(f, "\nCreated:   {}", created)?;
        }
        Ok(())
    }
}

/// Look up an account's code, balance and optionally two storage slots.
///
/// `slot` is returned raw; `state_slot` is decoded as a [`ContractState`].
pub async fn inspect_address(
    client: &RpcClient,
    address: &str,
    slot: Option<u64>,
    state_slot: Option<u64>,
) -> Result<AddressReport, InspectError> {
    validate_address(address)?;

    let (code, balance) = tokio::try_join!(client.code(address), client.balance(address))?;
    let code_size = code.strip_prefix("0x").unwrap_or(&code).len() / 2;

    let slot = match slot {
        Some(slot) => Some(SlotValue {
            slot,
            value: client.storage_at(address, slot).await?,
        }),
        None => None,
    };
    let state = match state_slot {
        Some(slot) => {
            let raw = client.storage_at(address, slot).await?;
            Some(StateSlot {
                slot,
                state: ContractState::from_storage_word(&raw),
                raw,
            })
        }
        None => None,
    };

    Ok(AddressReport {
        address: address.to_string(),
        code_size,
        balance_wei: balance.to_string(),
        balance: format_wei(balance),
        slot,
        state,
    })
}

/// Look up a transaction and, once mined, its receipt.
pub async fn inspect_transaction(client: &RpcClient, hash: &str) -> Result<TxReport, InspectError> {
    validate_hash(hash)?;

    let (tx, receipt) = tokio::try_join!(client.transaction(hash), client.receipt(hash))?;
    let value = format_wei(parse_quantity_u128(&tx.value)?);
    let block_number = tx
        .block_number
        .as_deref()
        .map(parse_quantity)
        .transpose()?;

    let (succeeded, gas_used, contract_address) = match receipt {
        Some(receipt) => (
            receipt.succeeded(),
            Some(parse_quantity(&receipt.gas_used)?),
            receipt.contract_address,
        ),
        None => (None, None, None),
    };

    Ok(TxReport {
        hash: tx.hash,
        from: tx.from,
        to: tx.to,
        value,
        block_number,
        succeeded,
        gas_used,
        contract_address,
    })
}
