// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Batch transfer planning.
//!
//! Sends the same token amount to every recipient in one batch: one ERC-20
//! transfer instruction per recipient, funded by a single trigger that pulls
//! the total from the end-user wallet.

use alloy::primitives::{Address, U256};
use tracing::debug;

use crate::execution::{
    ContractCall, ExecutionClient, ExecutionError, FeeToken, FundingTrigger, OrchestratorAccount,
    Quote, QuoteRequest,
};

/// Chain and tokens a transfer runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    pub chain_id: u64,
    pub token: Address,
    pub fee_token: Address,
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("At least one recipient is required")]
    NoRecipients,

    #[error("Recipient {index} is empty")]
    EmptyRecipient { index: usize },

    #[error("Recipient {index} is not a valid address: {value}")]
    InvalidRecipient { index: usize, value: String },

    #[error("Transfer amount must be greater than zero")]
    ZeroAmount,

    #[error("Total transfer amount overflows")]
    AmountOverflow,

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Parse the recipient list. Entries are trimmed; blank or malformed
/// entries reject the whole list.
pub fn parse_recipients<S: AsRef<str>>(recipients: &[S]) -> Result<Vec<Address>, TransferError> {
    if recipients.is_empty() {
        return Err(TransferError::NoRecipients);
    }

    recipients
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let value = raw.as_ref().trim();
            if value.is_empty() {
                return Err(TransferError::EmptyRecipient { index });
            }
            value
                .parse::<Address>()
                .map_err(|_| TransferError::InvalidRecipient {
                    index,
                    value: value.to_string(),
                })
        })
        .collect()
}

/// Build the quote request for sending `amount` to each recipient.
pub fn build_transfer_request(
    client: &dyn ExecutionClient,
    settings: &TransferSettings,
    recipients: &[Address],
    amount: U256,
) -> Result<QuoteRequest, TransferError> {
    if recipients.is_empty() {
        return Err(TransferError::NoRecipients);
    }
    if amount.is_zero() {
        return Err(TransferError::ZeroAmount);
    }

    let total = U256::from(recipients.len())
        .checked_mul(amount)
        .ok_or(TransferError::AmountOverflow)?;

    let instructions = recipients
        .iter()
        .map(|to| {
            client.build_instruction(&ContractCall::erc20_transfer(
                settings.chain_id,
                settings.token,
                *to,
                amount,
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QuoteRequest {
        instructions,
        funding_trigger: FundingTrigger {
            chain_id: settings.chain_id,
            token: settings.token,
            amount: total,
        },
        fee_token: FeeToken {
            chain_id: settings.chain_id,
            address: settings.fee_token,
        },
        simulate: true,
    })
}

/// Plan and quote a batch transfer.
pub async fn quote_transfer(
    client: &dyn ExecutionClient,
    account: &OrchestratorAccount,
    settings: &TransferSettings,
    recipients: &[Address],
    amount: U256,
) -> Result<(QuoteRequest, Quote), TransferError> {
    let request = build_transfer_request(client, settings, recipients, amount)?;
    debug!(
        owner = %account.owner(),
        recipients = recipients.len(),
        total = %request.funding_trigger.amount,
        "Requesting transfer quote"
    );
    let quote = client.get_quote(account, &request).await?;
    Ok((request, quote))
}
