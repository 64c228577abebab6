//! Two-party trading
//!
//! A trade is an asynchronous handshake, not a single-call swap: propose
//! checks the offer point-in-time and parks the trade PENDING, and nothing
//! is escrowed while it waits. Acceptance re-validates both sides against
//! current balances and inventory; if either side can no longer cover its
//! commitment the trade is cancelled with no partial transfer. The outcome
//! of a response is a [`TradeResolution`] rather than an error so that the
//! terminal status persists when the surrounding transaction commits.

use crate::sink::Effects;
use crate::{inventory, ledger};
use chrono::{DateTime, Duration, Utc};
use glimmer_core::{AccountId, Currency, DefId, Error, Result, TradeId, TradeStatus};
use glimmer_store::{StoredTrade, TradeSide, WriteTxn};

/// How long a proposed trade waits for a response.
const EXPIRY_DAYS: i64 = 7;

/// Terminal outcome of responding to a trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeResolution {
    /// Accepted and executed; ownership exchanged
    Completed,
    /// Declined by the recipient; no transfer
    Rejected,
    /// The response arrived after the expiry window
    Expired,
    /// Accepted, but re-validation failed; cancelled with no transfer
    Invalidated(String),
}

/// Propose a trade, leaving it PENDING until the recipient responds.
///
/// The initiator must cover the offered items and points right now; this
/// is a point-in-time check only, repeated at execution.
pub fn propose(
    txn: &WriteTxn,
    initiator: AccountId,
    recipient: AccountId,
    offer: TradeSide,
    request: TradeSide,
    message: Option<String>,
    now: DateTime<Utc>,
    effects: &mut Effects,
) -> Result<TradeId> {
    if initiator == recipient {
        return Err(Error::SelfReferenceNotAllowed);
    }
    if txn.account(recipient)?.is_none() {
        return Err(Error::AccountNotFound(recipient));
    }
    if txn.account(initiator)?.is_none() {
        return Err(Error::AccountNotFound(initiator));
    }
    require_covered(txn, initiator, &offer)?;

    let id = txn.next_id("trade")?;
    txn.put_trade(StoredTrade {
        id,
        initiator: initiator.raw(),
        recipient: recipient.raw(),
        offer,
        request,
        status: StoredTrade::encode_status(TradeStatus::Pending),
        message,
        created_at_ms: now.timestamp_millis(),
        expires_at_ms: (now + Duration::days(EXPIRY_DAYS)).timestamp_millis(),
        completed_at_ms: None,
    })?;

    effects.notify(
        recipient,
        "trade_proposed",
        "New trade offer".to_string(),
        format!("{} proposed a trade", initiator),
    );
    Ok(TradeId::new(id))
}

/// Respond to a pending trade as its recipient.
///
/// Only the named recipient may respond, and only while PENDING. A late
/// response flips the trade EXPIRED instead of executing it. Acceptance
/// runs the full exchange: both sides re-validated, then every item and
/// point moved, all inside the caller's write transaction.
pub fn respond(
    txn: &WriteTxn,
    id: TradeId,
    responder: AccountId,
    accept: bool,
    now: DateTime<Utc>,
    effects: &mut Effects,
) -> Result<TradeResolution> {
    let mut trade = txn
        .trade(id)?
        .ok_or_else(|| Error::NotFound(format!("{}", id)))?;
    if trade.recipient != responder.raw() {
        return Err(Error::invalid_state("only the recipient may respond"));
    }
    if trade.trade_status() != TradeStatus::Pending {
        return Err(Error::invalid_state(format!(
            "trade is {}, not pending",
            trade.trade_status()
        )));
    }
    if trade.is_past_expiry(now) {
        trade.set_status(TradeStatus::Expired);
        txn.put_trade(trade)?;
        return Ok(TradeResolution::Expired);
    }

    let initiator = AccountId::new(trade.initiator);
    let recipient = AccountId::new(trade.recipient);

    if !accept {
        trade.set_status(TradeStatus::Rejected);
        txn.put_trade(trade)?;
        effects.notify(
            initiator,
            "trade_rejected",
            "Trade declined".to_string(),
            format!("{} declined your trade", recipient),
        );
        return Ok(TradeResolution::Rejected);
    }

    // Re-validation: balances and inventory may have moved since propose
    if let Some(reason) = uncovered(txn, initiator, &trade.offer)? {
        return cancel(txn, trade, initiator, recipient, reason, effects);
    }
    if let Some(reason) = uncovered(txn, recipient, &trade.request)? {
        return cancel(txn, trade, recipient, initiator, reason, effects);
    }

    execute(txn, &trade, now)?;
    trade.set_status(TradeStatus::Completed);
    trade.completed_at_ms = Some(now.timestamp_millis());
    txn.put_trade(trade)?;

    for party in [initiator, recipient] {
        effects.notify(
            party,
            "trade_completed",
            "Trade completed".to_string(),
            "Items and points have been exchanged".to_string(),
        );
        effects.emit(
            party,
            "trade_completed",
            vec![("trade".to_string(), id.raw().to_string())],
        );
    }
    Ok(TradeResolution::Completed)
}

fn cancel(
    txn: &WriteTxn,
    mut trade: StoredTrade,
    at_fault: AccountId,
    other: AccountId,
    reason: String,
    effects: &mut Effects,
) -> Result<TradeResolution> {
    trade.set_status(TradeStatus::Cancelled);
    txn.put_trade(trade)?;
    for party in [at_fault, other] {
        effects.notify(
            party,
            "trade_cancelled",
            "Trade cancelled".to_string(),
            reason.clone(),
        );
    }
    Ok(TradeResolution::Invalidated(reason))
}

/// Move every item and point of both sides. Callers have already verified
/// coverage in this same transaction, so the transfers cannot fail short
/// of a store error.
fn execute(txn: &WriteTxn, trade: &StoredTrade, now: DateTime<Utc>) -> Result<()> {
    let initiator = AccountId::new(trade.initiator);
    let recipient = AccountId::new(trade.recipient);
    let reference = Some(format!("trade:{}", trade.id));

    move_side(txn, initiator, recipient, &trade.offer, &reference, now)?;
    move_side(txn, recipient, initiator, &trade.request, &reference, now)?;
    Ok(())
}

fn move_side(
    txn: &WriteTxn,
    from: AccountId,
    to: AccountId,
    side: &TradeSide,
    reference: &Option<String>,
    now: DateTime<Utc>,
) -> Result<()> {
    for (item, quantity) in &side.items {
        let item = DefId::new(item.clone());
        inventory::remove(txn, from, &item, *quantity)?;
        inventory::grant(txn, to, &item, *quantity, "trade")?;
    }
    if side.sparkle > 0 {
        ledger::transfer(txn, from, to, side.sparkle, Currency::Sparkle, "trade", reference.clone(), now)?;
    }
    if side.premium > 0 {
        ledger::transfer(txn, from, to, side.premium, Currency::Premium, "trade", reference.clone(), now)?;
    }
    Ok(())
}

/// Mark every overdue PENDING trade EXPIRED. Idempotent; returns how many
/// were flipped.
pub fn expire_pending(txn: &WriteTxn, now: DateTime<Utc>) -> Result<usize> {
    let mut expired = 0;
    for mut trade in txn.all_trades()? {
        if trade.trade_status() == TradeStatus::Pending && trade.is_past_expiry(now) {
            trade.set_status(TradeStatus::Expired);
            txn.put_trade(trade)?;
            expired += 1;
        }
    }
    Ok(expired)
}

fn require_covered(txn: &WriteTxn, account: AccountId, side: &TradeSide) -> Result<()> {
    for (item, quantity) in &side.items {
        let item = DefId::new(item.clone());
        let owned = inventory::quantity(txn, account, &item)?;
        if owned < *quantity {
            return Err(Error::InsufficientInventory {
                item,
                needed: *quantity,
                available: owned,
            });
        }
    }
    let row = txn
        .account(account)?
        .ok_or(Error::AccountNotFound(account))?;
    for (currency, committed) in [(Currency::Sparkle, side.sparkle), (Currency::Premium, side.premium)] {
        if row.balance(currency) < committed {
            return Err(Error::InsufficientFunds {
                currency,
                needed: committed,
                available: row.balance(currency),
            });
        }
    }
    Ok(())
}

/// Like [`require_covered`] but reports the shortfall instead of failing,
/// for execution-time re-validation.
fn uncovered(txn: &WriteTxn, account: AccountId, side: &TradeSide) -> Result<Option<String>> {
    match require_covered(txn, account, side) {
        Ok(()) => Ok(None),
        Err(e) if e.is_business() => Ok(Some(format!("{} can no longer cover: {}", account, e))),
        Err(e) => Err(e),
    }
}
