//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use mesh_wallet_core::{
    user::normalize_email, AgentSlug, TransactionId, User, UserId, WalletTransaction,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
///
/// All read-modify-write operations serialize through `write_lock` and
/// commit a single `WriteBatch`, so balance updates, their transaction
/// records, and the session dedup marker are applied together or not at all.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Take the write lock, recovering from poisoning.
    ///
    /// A poisoned lock only means another thread panicked while holding it;
    /// the guarded state lives in `RocksDB`, which never saw the partial
    /// mutation because batches commit last.
    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Load a user or fail with `NotFound`. Callers must hold the write lock
    /// if they intend to write based on the result.
    fn load_user(&self, user_id: &UserId) -> Result<User> {
        self.get_user(user_id)?
            .ok_or_else(|| StoreError::user_not_found(user_id))
    }

    /// Stage the user record and transaction (plus its user index entry)
    /// into `batch`.
    fn stage_user_and_transaction(
        &self,
        batch: &mut WriteBatch,
        user: &User,
        tx: &WalletTransaction,
    ) -> Result<()> {
        let cf_users = self.cf(cf::USERS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_tx_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let user_value = Self::serialize(user)?;
        let tx_value = Self::serialize(tx)?;

        batch.put_cf(&cf_users, keys::user_key(&user.id), &user_value);
        batch.put_cf(&cf_tx, keys::transaction_key(&tx.id), &tx_value);
        batch.put_cf(
            &cf_tx_by_user,
            keys::user_transaction_key(&user.id, &tx.id),
            [],
        );

        Ok(())
    }

    /// Commit a batch.
    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn put_user(&self, user: &User) -> Result<()> {
        let _guard = self.lock_writes();

        let cf_users = self.cf(cf::USERS)?;
        let cf_email = self.cf(cf::USERS_BY_EMAIL)?;

        let email = user.normalized_email();
        let email_key = keys::email_key(&email);

        // The email index must keep pointing at exactly one user.
        if let Some(existing) = self
            .db
            .get_cf(&cf_email, &email_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
        {
            if existing.as_slice() != user.id.as_bytes() {
                return Err(StoreError::EmailTaken { email });
            }
        }

        let mut batch = WriteBatch::default();

        // Drop the stale index entry if this update changes the email.
        if let Some(previous) = self.get_user(&user.id)? {
            let previous_email = previous.normalized_email();
            if previous_email != email {
                batch.delete_cf(&cf_email, keys::email_key(&previous_email));
            }
        }

        let value = Self::serialize(user)?;
        batch.put_cf(&cf_users, keys::user_key(&user.id), &value);
        batch.put_cf(&cf_email, &email_key, user.id.as_bytes());

        self.write(batch)
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let cf = self.cf(cf::USERS)?;

        self.db
            .get_cf(&cf, keys::user_key(user_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let cf_email = self.cf(cf::USERS_BY_EMAIL)?;
        let email = normalize_email(email);

        let Some(id_bytes) = self
            .db
            .get_cf(&cf_email, keys::email_key(&email))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut bytes = [0u8; 16];
        if id_bytes.len() != 16 {
            return Err(StoreError::Database(format!(
                "corrupt email index entry for {email}"
            )));
        }
        bytes.copy_from_slice(&id_bytes);
        let user_id = UserId::from_bytes(bytes);

        self.get_user(&user_id)
    }

    fn delete_user(&self, user_id: &UserId) -> Result<()> {
        let _guard = self.lock_writes();

        let user = self.load_user(user_id)?;

        let cf_users = self.cf(cf::USERS)?;
        let cf_email = self.cf(cf::USERS_BY_EMAIL)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_users, keys::user_key(user_id));
        batch.delete_cf(&cf_email, keys::email_key(&user.normalized_email()));

        self.write(batch)
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<WalletTransaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;

        self.db
            .get_cf(&cf, keys::transaction_key(transaction_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<WalletTransaction>> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // ULID keys are time-ordered, so collecting forward and reversing
        // yields newest-first.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        let mut transactions = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if transactions.len() >= limit {
                break;
            }

            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    fn find_top_up_by_session(&self, session_id: &str) -> Result<Option<WalletTransaction>> {
        let cf_sessions = self.cf(cf::STRIPE_SESSIONS)?;

        let Some(tx_bytes) = self
            .db
            .get_cf(&cf_sessions, keys::session_key(session_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut bytes = [0u8; 16];
        if tx_bytes.len() != 16 {
            return Err(StoreError::Database(format!(
                "corrupt session marker for {session_id}"
            )));
        }
        bytes.copy_from_slice(&tx_bytes);
        let tx_id = TransactionId::from_bytes(bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.get_transaction(&tx_id)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn credit_top_up(
        &self,
        user_id: &UserId,
        amount_cents: i64,
        session_id: &str,
        description: &str,
    ) -> Result<WalletTransaction> {
        if amount_cents <= 0 {
            return Err(StoreError::InvalidAmount(format!(
                "top-up must be positive, got {amount_cents}"
            )));
        }

        let _guard = self.lock_writes();

        // Dedup check under the lock: no window between check and insert.
        let cf_sessions = self.cf(cf::STRIPE_SESSIONS)?;
        let session_key = keys::session_key(session_id);
        if self
            .db
            .get_cf(&cf_sessions, &session_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some()
        {
            return Err(StoreError::DuplicateSession {
                session_id: session_id.to_string(),
            });
        }

        let mut user = self.load_user(user_id)?;
        user.wallet_balance_cents += amount_cents;
        user.updated_at = chrono::Utc::now();

        let tx = WalletTransaction::top_up(
            *user_id,
            amount_cents,
            user.wallet_balance_cents,
            session_id,
            description.to_string(),
        );

        let mut batch = WriteBatch::default();
        self.stage_user_and_transaction(&mut batch, &user, &tx)?;
        batch.put_cf(&cf_sessions, &session_key, tx.id.to_bytes());
        self.write(batch)?;

        tracing::debug!(
            user_id = %user_id,
            session_id = %session_id,
            amount_cents = %amount_cents,
            balance_after = %tx.balance_after_cents,
            "Top-up credited"
        );

        Ok(tx)
    }

    fn credit_manual(
        &self,
        user_id: &UserId,
        amount_cents: i64,
        description: &str,
    ) -> Result<WalletTransaction> {
        if amount_cents <= 0 {
            return Err(StoreError::InvalidAmount(format!(
                "credit must be positive, got {amount_cents}"
            )));
        }

        let _guard = self.lock_writes();

        let mut user = self.load_user(user_id)?;
        user.wallet_balance_cents += amount_cents;
        user.updated_at = chrono::Utc::now();

        let tx = WalletTransaction::manual_top_up(
            *user_id,
            amount_cents,
            user.wallet_balance_cents,
            description.to_string(),
        );

        let mut batch = WriteBatch::default();
        self.stage_user_and_transaction(&mut batch, &user, &tx)?;
        self.write(batch)?;

        Ok(tx)
    }

    fn debit_agent_usage(
        &self,
        user_id: &UserId,
        amount_cents: i64,
        agent_slug: &AgentSlug,
        description: &str,
    ) -> Result<WalletTransaction> {
        if amount_cents <= 0 {
            return Err(StoreError::InvalidAmount(format!(
                "debit must be positive, got {amount_cents}"
            )));
        }

        let _guard = self.lock_writes();

        let mut user = self.load_user(user_id)?;

        if user.wallet_balance_cents < amount_cents {
            return Err(StoreError::InsufficientFunds {
                balance: user.wallet_balance_cents,
                required: amount_cents,
            });
        }

        user.wallet_balance_cents -= amount_cents;
        user.updated_at = chrono::Utc::now();

        let tx = WalletTransaction::agent_usage(
            *user_id,
            amount_cents,
            user.wallet_balance_cents,
            agent_slug.clone(),
            description.to_string(),
        );

        let mut batch = WriteBatch::default();
        self.stage_user_and_transaction(&mut batch, &user, &tx)?;
        self.write(batch)?;

        Ok(tx)
    }

    fn credit_refund(
        &self,
        user_id: &UserId,
        amount_cents: i64,
        agent_slug: Option<&AgentSlug>,
        reason: &str,
    ) -> Result<WalletTransaction> {
        if amount_cents <= 0 {
            return Err(StoreError::InvalidAmount(format!(
                "refund must be positive, got {amount_cents}"
            )));
        }

        let _guard = self.lock_writes();

        let mut user = self.load_user(user_id)?;
        user.wallet_balance_cents += amount_cents;
        user.updated_at = chrono::Utc::now();

        let tx = WalletTransaction::refund(
            *user_id,
            amount_cents,
            user.wallet_balance_cents,
            agent_slug.cloned(),
            reason.to_string(),
        );

        let mut batch = WriteBatch::default();
        self.stage_user_and_transaction(&mut batch, &user, &tx)?;
        self.write(batch)?;

        Ok(tx)
    }

    fn migrate_legacy_credits(&self, user_id: &UserId) -> Result<Option<WalletTransaction>> {
        let _guard = self.lock_writes();

        let mut user = self.load_user(user_id)?;

        let value_cents = user.legacy_credits_value_cents();
        if value_cents <= 0 {
            return Ok(None);
        }

        let migrated = user.credits;
        user.wallet_balance_cents += value_cents;
        user.credits = 0;
        user.updated_at = chrono::Utc::now();

        let tx = WalletTransaction::manual_top_up(
            *user_id,
            value_cents,
            user.wallet_balance_cents,
            format!("Migrated {migrated} legacy credits"),
        );

        let mut batch = WriteBatch::default();
        self.stage_user_and_transaction(&mut batch, &user, &tx)?;
        self.write(batch)?;

        tracing::info!(
            user_id = %user_id,
            migrated_credits = %migrated,
            value_cents = %value_cents,
            "Legacy credits migrated"
        );

        Ok(Some(tx))
    }
}
