//! Database store and transaction wrappers

use crate::error::{Error, Result};
use crate::models::*;
use glimmer_core::{AccountId, DefId, TradeId};
use native_db::transaction::{RTransaction, RwTransaction};
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredAccount>().unwrap();
    models.define::<StoredTxn>().unwrap();
    models.define::<StoredXpEntry>().unwrap();
    models.define::<StoredProgress>().unwrap();
    models.define::<StoredAssignment>().unwrap();
    models.define::<StoredTrade>().unwrap();
    models.define::<StoredInventory>().unwrap();
    models.define::<StoredStatEntry>().unwrap();
    models.define::<StoredSequence>().unwrap();
    models
});

/// Database store for durable gamification state.
///
/// Hands out [`ReadTxn`] / [`WriteTxn`] wrappers; a facade operation
/// composes all row mutations of one logical unit inside a single
/// [`WriteTxn`] and commits once. Writers are serialized by the database,
/// so two concurrent spends on one account cannot interleave.
pub struct Store {
    db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Begin a read-only transaction.
    pub fn read(&self) -> Result<ReadTxn<'_>> {
        let r = self.db.r_transaction()?;
        Ok(ReadTxn { r })
    }

    /// Begin a read-write transaction.
    pub fn write(&self) -> Result<WriteTxn<'_>> {
        let rw = self.db.rw_transaction()?;
        Ok(WriteTxn { rw })
    }
}

fn collect_scan<T>(iter: impl Iterator<Item = std::result::Result<T, db_type::Error>>) -> Result<Vec<T>> {
    let rows: std::result::Result<Vec<T>, _> = iter.collect();
    rows.map_err(|e| Error::Database(e.to_string()))
}

/// Read-only transaction with typed accessors.
pub struct ReadTxn<'a> {
    r: RTransaction<'a>,
}

impl ReadTxn<'_> {
    /// Load an account by ID.
    pub fn account(&self, id: AccountId) -> Result<Option<StoredAccount>> {
        Ok(self.r.get().primary(id.raw())?)
    }

    /// Load all accounts.
    pub fn all_accounts(&self) -> Result<Vec<StoredAccount>> {
        let scan = self.r.scan().primary::<StoredAccount>()?;
        collect_scan(scan.all()?)
    }

    /// Load all currency transactions for an account.
    pub fn txns_for(&self, account: AccountId) -> Result<Vec<StoredTxn>> {
        let scan = self.r.scan().primary::<StoredTxn>()?;
        let rows = collect_scan(scan.all()?)?;
        Ok(rows.into_iter().filter(|t| t.account == account.raw()).collect())
    }

    /// Load every currency transaction row.
    pub fn all_txns(&self) -> Result<Vec<StoredTxn>> {
        let scan = self.r.scan().primary::<StoredTxn>()?;
        collect_scan(scan.all()?)
    }

    /// Load every XP log row.
    pub fn all_xp_entries(&self) -> Result<Vec<StoredXpEntry>> {
        let scan = self.r.scan().primary::<StoredXpEntry>()?;
        collect_scan(scan.all()?)
    }

    /// Load every stat log row.
    pub fn all_stat_entries(&self) -> Result<Vec<StoredStatEntry>> {
        let scan = self.r.scan().primary::<StoredStatEntry>()?;
        collect_scan(scan.all()?)
    }

    /// Load achievement progress rows for an account.
    pub fn progress_for(&self, account: AccountId) -> Result<Vec<StoredProgress>> {
        let scan = self.r.scan().primary::<StoredProgress>()?;
        let rows = collect_scan(scan.all()?)?;
        Ok(rows.into_iter().filter(|p| p.account == account.raw()).collect())
    }

    /// Load quest assignments for an account.
    pub fn assignments_for(&self, account: AccountId) -> Result<Vec<StoredAssignment>> {
        let scan = self.r.scan().primary::<StoredAssignment>()?;
        let rows = collect_scan(scan.all()?)?;
        Ok(rows.into_iter().filter(|a| a.account == account.raw()).collect())
    }

    /// Load a trade by ID.
    pub fn trade(&self, id: TradeId) -> Result<Option<StoredTrade>> {
        Ok(self.r.get().primary(id.raw())?)
    }

    /// Load inventory rows for an account.
    pub fn inventory_for(&self, account: AccountId) -> Result<Vec<StoredInventory>> {
        let scan = self.r.scan().primary::<StoredInventory>()?;
        let rows = collect_scan(scan.all()?)?;
        Ok(rows.into_iter().filter(|i| i.account == account.raw()).collect())
    }
}

/// Read-write transaction with typed accessors.
///
/// Dropping without [`commit`](WriteTxn::commit) aborts every mutation,
/// which is how business errors leave no partial state behind.
pub struct WriteTxn<'a> {
    rw: RwTransaction<'a>,
}

impl WriteTxn<'_> {
    /// Commit all mutations.
    pub fn commit(self) -> Result<()> {
        self.rw.commit()?;
        Ok(())
    }

    /// Allocate the next value of a named sequence.
    pub fn next_id(&self, name: &str) -> Result<u64> {
        let seq: Option<StoredSequence> = self.rw.get().primary(name.to_string())?;
        let next = seq.map(|s| s.next).unwrap_or(1);
        self.rw.upsert(StoredSequence {
            name: name.to_string(),
            next: next + 1,
        })?;
        Ok(next)
    }

    /// Load an account by ID.
    pub fn account(&self, id: AccountId) -> Result<Option<StoredAccount>> {
        Ok(self.rw.get().primary(id.raw())?)
    }

    /// Save an account, bumping its version counter.
    pub fn put_account(&self, mut account: StoredAccount) -> Result<()> {
        account.version += 1;
        self.rw.upsert(account)?;
        Ok(())
    }

    /// Append a currency transaction row.
    pub fn push_txn(&self, txn: StoredTxn) -> Result<()> {
        self.rw.upsert(txn)?;
        Ok(())
    }

    /// Append an XP log row.
    pub fn push_xp_entry(&self, entry: StoredXpEntry) -> Result<()> {
        self.rw.upsert(entry)?;
        Ok(())
    }

    /// Append a stat log row.
    pub fn push_stat_entry(&self, entry: StoredStatEntry) -> Result<()> {
        self.rw.upsert(entry)?;
        Ok(())
    }

    /// Load all currency transactions for an account.
    pub fn txns_for(&self, account: AccountId) -> Result<Vec<StoredTxn>> {
        let scan = self.rw.scan().primary::<StoredTxn>()?;
        let rows = collect_scan(scan.all()?)?;
        Ok(rows.into_iter().filter(|t| t.account == account.raw()).collect())
    }

    /// Load an achievement progress row.
    pub fn progress(&self, account: AccountId, achievement: &DefId) -> Result<Option<StoredProgress>> {
        Ok(self
            .rw
            .get()
            .primary(StoredProgress::key_for(account, achievement))?)
    }

    /// Save an achievement progress row.
    pub fn put_progress(&self, progress: StoredProgress) -> Result<()> {
        self.rw.upsert(progress)?;
        Ok(())
    }

    /// Load achievement progress rows for an account.
    pub fn progress_for(&self, account: AccountId) -> Result<Vec<StoredProgress>> {
        let scan = self.rw.scan().primary::<StoredProgress>()?;
        let rows = collect_scan(scan.all()?)?;
        Ok(rows.into_iter().filter(|p| p.account == account.raw()).collect())
    }

    /// Load a quest assignment row by its composite key.
    pub fn assignment(
        &self,
        account: AccountId,
        quest: &DefId,
        day: &str,
    ) -> Result<Option<StoredAssignment>> {
        Ok(self
            .rw
            .get()
            .primary(StoredAssignment::key_for(account, quest, day))?)
    }

    /// Save a quest assignment row.
    pub fn put_assignment(&self, assignment: StoredAssignment) -> Result<()> {
        self.rw.upsert(assignment)?;
        Ok(())
    }

    /// Load quest assignments for an account.
    pub fn assignments_for(&self, account: AccountId) -> Result<Vec<StoredAssignment>> {
        let scan = self.rw.scan().primary::<StoredAssignment>()?;
        let rows = collect_scan(scan.all()?)?;
        Ok(rows.into_iter().filter(|a| a.account == account.raw()).collect())
    }

    /// Load a trade by ID.
    pub fn trade(&self, id: TradeId) -> Result<Option<StoredTrade>> {
        Ok(self.rw.get().primary(id.raw())?)
    }

    /// Save a trade row.
    pub fn put_trade(&self, trade: StoredTrade) -> Result<()> {
        self.rw.upsert(trade)?;
        Ok(())
    }

    /// Load every trade row.
    pub fn all_trades(&self) -> Result<Vec<StoredTrade>> {
        let scan = self.rw.scan().primary::<StoredTrade>()?;
        collect_scan(scan.all()?)
    }

    /// Load an inventory row.
    pub fn inventory(&self, account: AccountId, item: &DefId) -> Result<Option<StoredInventory>> {
        Ok(self
            .rw
            .get()
            .primary(StoredInventory::key_for(account, item))?)
    }

    /// Save an inventory row.
    pub fn put_inventory(&self, entry: StoredInventory) -> Result<()> {
        self.rw.upsert(entry)?;
        Ok(())
    }

    /// Remove an inventory row (quantity reached zero).
    pub fn remove_inventory(&self, account: AccountId, item: &DefId) -> Result<()> {
        let existing: Option<StoredInventory> = self
            .rw
            .get()
            .primary(StoredInventory::key_for(account, item))?;
        if let Some(row) = existing {
            self.rw.remove(row)?;
        }
        Ok(())
    }
}

impl From<db_type::Error> for Error {
    fn from(err: db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_account_round_trip() {
        let store = Store::in_memory().unwrap();
        let id = AccountId::new(1);

        let w = store.write().unwrap();
        w.put_account(StoredAccount::new(id, Utc::now())).unwrap();
        w.commit().unwrap();

        let r = store.read().unwrap();
        let acct = r.account(id).unwrap().unwrap();
        assert_eq!(acct.id, 1);
        assert_eq!(acct.level, 1);
        assert_eq!(acct.version, 1);
    }

    #[test]
    fn test_uncommitted_write_discarded() {
        let store = Store::in_memory().unwrap();
        let id = AccountId::new(2);

        {
            let w = store.write().unwrap();
            w.put_account(StoredAccount::new(id, Utc::now())).unwrap();
            // dropped without commit
        }

        let r = store.read().unwrap();
        assert!(r.account(id).unwrap().is_none());
    }

    #[test]
    fn test_sequence() {
        let store = Store::in_memory().unwrap();
        let w = store.write().unwrap();
        assert_eq!(w.next_id("txn").unwrap(), 1);
        assert_eq!(w.next_id("txn").unwrap(), 2);
        assert_eq!(w.next_id("trade").unwrap(), 1);
        w.commit().unwrap();

        let w = store.write().unwrap();
        assert_eq!(w.next_id("txn").unwrap(), 3);
    }

    #[test]
    fn test_assignment_round_trip() {
        let store = Store::in_memory().unwrap();
        let account = AccountId::new(1);
        let quest = DefId::new("daily_poster");
        let now = Utc::now();

        let w = store.write().unwrap();
        w.put_assignment(StoredAssignment::new(
            account,
            &quest,
            "2026-08-30",
            now,
            now + chrono::Duration::days(1),
        ))
        .unwrap();
        w.commit().unwrap();

        let w = store.write().unwrap();
        let row = w.assignment(account, &quest, "2026-08-30").unwrap().unwrap();
        assert_eq!(row.quest_status(), glimmer_core::QuestStatus::Available);
        assert!(w.assignment(account, &quest, "2026-08-31").unwrap().is_none());
    }
}
