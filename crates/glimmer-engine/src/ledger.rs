//! Currency ledger
//!
//! Every balance mutation appends an immutable transaction row carrying
//! the resulting balance, in the same write transaction as the balance
//! update itself. The balance check in [`spend`] and the decrement commit
//! together, so two spends that would jointly overdraw an account cannot
//! both succeed: writers are serialized by the store.

use chrono::{DateTime, Utc};
use glimmer_core::{AccountId, Currency, Error, Result, TxnKind};
use glimmer_store::{StoredTxn, WriteTxn};

/// Increment a balance and append the transaction row.
///
/// Returns the new balance. Fails only on an invalid account or a
/// non-positive amount.
pub fn award(
    txn: &WriteTxn,
    account: AccountId,
    amount: u64,
    currency: Currency,
    kind: TxnKind,
    reason: &str,
    reference: Option<String>,
    now: DateTime<Utc>,
) -> Result<u64> {
    if amount == 0 {
        return Err(Error::invalid_state("award amount must be positive"));
    }
    let mut row = txn
        .account(account)?
        .ok_or(Error::AccountNotFound(account))?;
    let new_balance = row.balance(currency) + amount;
    row.set_balance(currency, new_balance);
    txn.put_account(row)?;

    append_txn(txn, account, amount as i64, currency, kind, reason, reference, new_balance, now)?;
    Ok(new_balance)
}

/// Decrement a balance and append the transaction row.
///
/// Fails with `InsufficientFunds` when the balance cannot cover the
/// amount, leaving the balance unchanged.
pub fn spend(
    txn: &WriteTxn,
    account: AccountId,
    amount: u64,
    currency: Currency,
    kind: TxnKind,
    reason: &str,
    reference: Option<String>,
    now: DateTime<Utc>,
) -> Result<u64> {
    if amount == 0 {
        return Err(Error::invalid_state("spend amount must be positive"));
    }
    let mut row = txn
        .account(account)?
        .ok_or(Error::AccountNotFound(account))?;
    let balance = row.balance(currency);
    if balance < amount {
        return Err(Error::InsufficientFunds {
            currency,
            needed: amount,
            available: balance,
        });
    }
    let new_balance = balance - amount;
    row.set_balance(currency, new_balance);
    txn.put_account(row)?;

    append_txn(txn, account, -(amount as i64), currency, kind, reason, reference, new_balance, now)?;
    Ok(new_balance)
}

/// Move points between two accounts, all-or-nothing.
///
/// The debit and credit share the caller's write transaction; if the
/// debit fails the credit never happens.
pub fn transfer(
    txn: &WriteTxn,
    from: AccountId,
    to: AccountId,
    amount: u64,
    currency: Currency,
    reason: &str,
    reference: Option<String>,
    now: DateTime<Utc>,
) -> Result<()> {
    spend(
        txn,
        from,
        amount,
        currency,
        TxnKind::Transferred,
        reason,
        reference.clone(),
        now,
    )?;
    award(
        txn,
        to,
        amount,
        currency,
        TxnKind::Transferred,
        reason,
        reference,
        now,
    )?;
    Ok(())
}

/// Total ever earned in a currency, summed from the append-only log.
///
/// Counts positive rows only; spends do not reduce lifetime earnings.
pub fn lifetime_earned(txn: &WriteTxn, account: AccountId, currency: Currency) -> Result<u64> {
    let rows = txn.txns_for(account)?;
    Ok(rows
        .iter()
        .filter(|t| t.currency() == currency && t.amount > 0)
        .map(|t| t.amount as u64)
        .sum())
}

#[allow(clippy::too_many_arguments)]
fn append_txn(
    txn: &WriteTxn,
    account: AccountId,
    amount: i64,
    currency: Currency,
    kind: TxnKind,
    reason: &str,
    reference: Option<String>,
    balance_after: u64,
    now: DateTime<Utc>,
) -> Result<()> {
    let id = txn.next_id("txn")?;
    txn.push_txn(StoredTxn {
        id,
        account: account.raw(),
        amount,
        currency: StoredTxn::encode_currency(currency),
        kind: StoredTxn::encode_kind(kind),
        reason: reason.to_string(),
        reference,
        balance_after,
        at_ms: now.timestamp_millis(),
    })?;
    Ok(())
}
