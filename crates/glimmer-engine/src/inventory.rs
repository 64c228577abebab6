//! Inventory mutation helpers
//!
//! Rows are keyed (account, item) with a quantity; a row is removed when
//! its quantity reaches zero. All mutations ride the caller's write
//! transaction so trades and purchases stay atomic.

use glimmer_core::{AccountId, DefId, Error, Result};
use glimmer_store::{StoredInventory, WriteTxn};

/// Add copies of an item, creating the row if needed. Returns the new quantity.
pub fn grant(
    txn: &WriteTxn,
    account: AccountId,
    item: &DefId,
    quantity: u32,
    source: &str,
) -> Result<u32> {
    let mut row = txn
        .inventory(account, item)?
        .unwrap_or_else(|| StoredInventory::new(account, item, 0, source));
    row.quantity += quantity;
    let new_quantity = row.quantity;
    txn.put_inventory(row)?;
    Ok(new_quantity)
}

/// Remove copies of an item.
///
/// Fails with `InsufficientInventory` when fewer copies are owned than
/// requested. Returns the remaining quantity.
pub fn remove(txn: &WriteTxn, account: AccountId, item: &DefId, quantity: u32) -> Result<u32> {
    let owned = txn.inventory(account, item)?;
    let Some(mut row) = owned else {
        return Err(Error::InsufficientInventory {
            item: item.clone(),
            needed: quantity,
            available: 0,
        });
    };
    if row.quantity < quantity {
        return Err(Error::InsufficientInventory {
            item: item.clone(),
            needed: quantity,
            available: row.quantity,
        });
    }
    row.quantity -= quantity;
    let remaining = row.quantity;
    if remaining == 0 {
        txn.remove_inventory(account, item)?;
    } else {
        txn.put_inventory(row)?;
    }
    Ok(remaining)
}

/// Number of copies owned.
pub fn quantity(txn: &WriteTxn, account: AccountId, item: &DefId) -> Result<u32> {
    Ok(txn.inventory(account, item)?.map(|r| r.quantity).unwrap_or(0))
}

/// Equip or unequip an owned item.
pub fn set_equipped(
    txn: &WriteTxn,
    account: AccountId,
    item: &DefId,
    equipped: bool,
) -> Result<()> {
    let mut row = txn
        .inventory(account, item)?
        .ok_or_else(|| Error::NotFound(format!("item '{}' not in inventory", item)))?;
    row.equipped = equipped;
    txn.put_inventory(row)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use glimmer_store::{Store, StoredAccount};

    fn fixture() -> (Store, AccountId) {
        let store = Store::in_memory().unwrap();
        let account = AccountId::new(1);
        let w = store.write().unwrap();
        w.put_account(StoredAccount::new(account, Utc::now())).unwrap();
        w.commit().unwrap();
        (store, account)
    }

    #[test]
    fn test_grant_and_remove() {
        let (store, account) = fixture();
        let item = DefId::new("pin_star");
        let w = store.write().unwrap();

        assert_eq!(grant(&w, account, &item, 3, "reward").unwrap(), 3);
        assert_eq!(grant(&w, account, &item, 2, "reward").unwrap(), 5);
        assert_eq!(remove(&w, account, &item, 4).unwrap(), 1);
        assert_eq!(quantity(&w, account, &item).unwrap(), 1);
    }

    #[test]
    fn test_remove_to_zero_deletes_row() {
        let (store, account) = fixture();
        let item = DefId::new("pin_star");
        let w = store.write().unwrap();

        grant(&w, account, &item, 2, "reward").unwrap();
        assert_eq!(remove(&w, account, &item, 2).unwrap(), 0);
        assert!(w.inventory(account, &item).unwrap().is_none());
    }

    #[test]
    fn test_remove_more_than_owned() {
        let (store, account) = fixture();
        let item = DefId::new("pin_star");
        let w = store.write().unwrap();

        grant(&w, account, &item, 1, "reward").unwrap();
        let err = remove(&w, account, &item, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientInventory { needed: 2, available: 1, .. }
        ));
        // Quantity unchanged
        assert_eq!(quantity(&w, account, &item).unwrap(), 1);
    }

    #[test]
    fn test_equip() {
        let (store, account) = fixture();
        let item = DefId::new("avatar_frame");
        let w = store.write().unwrap();

        grant(&w, account, &item, 1, "purchase").unwrap();
        set_equipped(&w, account, &item, true).unwrap();
        assert!(w.inventory(account, &item).unwrap().unwrap().equipped);

        let missing = DefId::new("nonexistent");
        assert!(matches!(
            set_equipped(&w, account, &missing, true).unwrap_err(),
            Error::NotFound(_)
        ));
    }
}
