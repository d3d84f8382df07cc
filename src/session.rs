//! The in-memory state of one logged-in user.
//!
//! A `Session` owns the user's profile, stats and collections. Mutations update the local state
//! immediately and then queue the matching remote write; the caller never waits for those writes.
//! A single background task applies the queue in the order it was filled, so a later snapshot of a
//! document is never overwritten by an earlier one. A failed write is logged and the local state is
//! kept as it is. `flush` waits for every queued write and must be called before the runtime shuts
//! down.
//!
//! Sessions spawn their writer task when they are created, so they must be created from within a
//! Tokio runtime.

use crate::aggregate::{self, Summary};
use crate::error::Res;
use crate::identity::Identity;
use crate::model::{
    default_categories, Budget, Category, CategoryLabel, Transaction, User, UserStats,
};
use crate::progress::{Progress, StreakChange, XpGain};
use crate::sync::{decode, decode_all, encode, Collection, Document, Record, Store};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

/// Capacity of the XP event channel. Slow receivers miss the oldest events.
const EVENT_CAPACITY: usize = 32;

pub struct Session {
    store: Arc<dyn Store>,
    identity: Arc<dyn Identity>,
    user: User,
    progress: Progress,
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    budgets: Vec<Budget>,
    writes: mpsc::UnboundedSender<Write>,
    pending: Arc<AtomicUsize>,
    events: broadcast::Sender<XpGain>,
}

/// A remote operation waiting in the write queue.
enum Write {
    Put {
        collection: Collection,
        id: String,
        doc: Document,
    },
    Delete {
        collection: Collection,
        id: String,
    },
    /// Answered once every write queued before it has been applied.
    Flush(oneshot::Sender<()>),
}

impl Session {
    /// Creates an account, an empty profile and the default categories, then applies the first login.
    pub async fn register(
        store: Arc<dyn Store>,
        identity: Arc<dyn Identity>,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Res<Self> {
        let user_id = identity.register(email, password).await?;
        info!("Registered {} as user {user_id}", email.trim());
        let mut session = Self::empty(store, identity, User::new(user_id, email.trim(), now));
        session.seed_default_categories();
        // A new user has never logged in, so this always starts a streak of 1
        session.apply_login(DateTime::<Utc>::UNIX_EPOCH, now);
        Ok(session)
    }

    /// Authenticates, loads everything the user has stored and applies the login streak.
    pub async fn login(
        store: Arc<dyn Store>,
        identity: Arc<dyn Identity>,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Res<Self> {
        let user_id = identity.login(email, password).await?;
        let user = match store.get(&user_id, Collection::Profile, &user_id).await? {
            Some(doc) => decode::<User>(&doc)?,
            // The account exists but its profile was never written
            None => User::new(&user_id, email.trim(), now),
        };
        let mut session = Self::empty(store, identity, user);
        session.reload().await?;
        if session.categories.is_empty() {
            session.seed_default_categories();
        }
        let last_login = session.user.last_login;
        session.apply_login(last_login, now);
        Ok(session)
    }

    /// Restores a session for a user who is already logged in. No streak transition happens.
    pub async fn resume(
        store: Arc<dyn Store>,
        identity: Arc<dyn Identity>,
        user_id: &str,
    ) -> Res<Self> {
        let doc = store
            .get(user_id, Collection::Profile, user_id)
            .await?
            .with_context(|| format!("No profile exists for user {user_id}"))?;
        let user = decode::<User>(&doc)?;
        let mut session = Self::empty(store, identity, user);
        session.reload().await?;
        Ok(session)
    }

    fn empty(store: Arc<dyn Store>, identity: Arc<dyn Identity>, user: User) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (writes, queue) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        tokio::spawn(apply_writes(
            store.clone(),
            user.id.clone(),
            queue,
            pending.clone(),
        ));
        Self {
            store,
            identity,
            user,
            progress: Progress::default(),
            transactions: Vec::new(),
            categories: Vec::new(),
            budgets: Vec::new(),
            writes,
            pending,
            events,
        }
    }

    /// Persists the stats and profile one last time, waits for every pending write and ends the
    /// session.
    pub async fn logout(mut self) -> Res<()> {
        self.user.mirror_stats(self.progress.stats());
        self.persist_stats();
        self.persist_profile();
        self.flush().await;
        self.identity.logout().await?;
        self.progress.reset();
        info!("Logged out user {}", self.user.id);
        Ok(())
    }

    /// Replaces the local collections and stats with what the store holds.
    pub async fn reload(&mut self) -> Res<()> {
        let user_id = self.user.id.clone();
        let stats = match self
            .store
            .get(&user_id, Collection::Stats, &user_id)
            .await?
        {
            Some(doc) => decode::<UserStats>(&doc)?,
            None => UserStats::default(),
        };
        self.progress = Progress::new(stats);
        self.transactions = self.load_all().await?;
        self.categories = self.load_all().await?;
        self.budgets = self.load_all().await?;
        self.transactions.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
        debug!(
            "Loaded {} transactions, {} categories and {} budgets for {user_id}",
            self.transactions.len(),
            self.categories.len(),
            self.budgets.len()
        );
        Ok(())
    }

    async fn load_all<R: Record>(&self) -> Res<Vec<R>> {
        let docs = self.store.get_all(&self.user.id, R::COLLECTION).await?;
        decode_all(&docs)
    }

    pub fn add_transaction(&mut self, tx: Transaction) -> XpGain {
        debug!("Adding transaction {}", tx.id);
        self.spawn_put(tx.id.clone(), &tx);
        // Newest first
        let at = self
            .transactions
            .iter()
            .position(|t| t.date < tx.date)
            .unwrap_or(self.transactions.len());
        self.transactions.insert(at, tx);
        let gain = self.progress.award_transaction();
        self.after_gain(gain)
    }

    /// Adds a budget and counts it as a completed goal.
    pub fn add_budget(&mut self, budget: Budget) -> XpGain {
        debug!("Adding budget {}", budget.id);
        self.spawn_put(budget.id.clone(), &budget);
        self.budgets.push(budget);
        let gain = self.progress.award_budget();
        self.after_gain(gain)
    }

    pub fn add_category(&mut self, category: Category) {
        debug!("Adding category {}", category.id);
        self.spawn_put(category.id.clone(), &category);
        self.categories.push(category);
    }

    /// Removes the transaction locally and from the store. Returns `false`, without contacting the
    /// store, if no such transaction is held locally.
    pub fn delete_transaction(&mut self, id: &str) -> bool {
        let Some(at) = self.transactions.iter().position(|t| t.id == id) else {
            debug!("Transaction {id} is not held locally, nothing to delete");
            return false;
        };
        self.transactions.remove(at);
        self.spawn_delete(Collection::Transactions, id);
        true
    }

    /// Removes the budget locally and from the store. Returns `false`, without contacting the store,
    /// if no such budget is held locally.
    pub fn delete_budget(&mut self, id: &str) -> bool {
        let Some(at) = self.budgets.iter().position(|b| b.id == id) else {
            debug!("Budget {id} is not held locally, nothing to delete");
            return false;
        };
        self.budgets.remove(at);
        self.spawn_delete(Collection::Budgets, id);
        true
    }

    /// Awards `amount` XP, announces it to subscribers and persists the stats.
    pub fn gain_xp(&mut self, amount: u32) -> XpGain {
        let gain = self.progress.gain_xp(amount);
        self.after_gain(gain)
    }

    /// Receives an event for every XP gain from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<XpGain> {
        self.events.subscribe()
    }

    /// Waits for every write issued so far. Failures have already been logged by the writer.
    pub async fn flush(&mut self) {
        let count = self.pending_writes();
        let (done, flushed) = oneshot::channel();
        if self.writes.send(Write::Flush(done)).is_err() || flushed.await.is_err() {
            warn!("The background writer stopped before all writes were applied");
            return;
        }
        if count > 0 {
            debug!("Flushed {count} pending writes");
        }
    }

    /// The number of writes that have been queued but not yet applied.
    pub fn pending_writes(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn stats(&self) -> &UserStats {
        self.progress.stats()
    }

    /// Newest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// The budgets with `spent` derived from the current transactions.
    pub fn budgets(&self) -> Vec<Budget> {
        aggregate::with_spent(&self.budgets, &self.transactions)
    }

    pub fn summary(&self) -> Summary {
        aggregate::summary(&self.transactions)
    }

    pub fn category_label(&self, category_id: &str) -> CategoryLabel {
        CategoryLabel::resolve(&self.categories, category_id)
    }

    fn seed_default_categories(&mut self) {
        debug!("Seeding default categories for {}", self.user.id);
        for category in default_categories() {
            self.add_category(category);
        }
    }

    fn apply_login(&mut self, last_login: DateTime<Utc>, now: DateTime<Utc>) {
        let (change, gain) = self.progress.update_streak_on_login(last_login, now);
        let streak = self.progress.stats().daily_streak;
        match change {
            StreakChange::Unchanged => debug!("Streak unchanged at {streak}"),
            StreakChange::Extended => info!("Streak extended to {streak} days"),
            StreakChange::Reset => debug!("Streak started at {streak}"),
        }
        self.user.last_login = now;
        self.user.mirror_stats(self.progress.stats());
        self.persist_profile();
        self.after_gain(gain);
    }

    fn after_gain(&mut self, gain: XpGain) -> XpGain {
        if gain.leveled_up() {
            info!("Reached level {}", gain.level);
        }
        // Having no subscribers is fine
        let _ = self.events.send(gain);
        self.persist_stats();
        gain
    }

    fn persist_stats(&mut self) {
        let stats = *self.progress.stats();
        let id = self.user.id.clone();
        self.spawn_put(id, &stats);
    }

    fn persist_profile(&mut self) {
        let user = self.user.clone();
        self.spawn_put(user.id.clone(), &user);
    }

    /// Fire-and-forget: the write is queued, not awaited, and its failure only produces a warning.
    fn spawn_put<R: Record>(&mut self, id: String, record: &R) {
        let doc = match encode(record) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Not saving {}/{id}: {e:#}", R::COLLECTION);
                return;
            }
        };
        self.enqueue(Write::Put {
            collection: R::COLLECTION,
            id,
            doc,
        });
    }

    /// Fire-and-forget, like `spawn_put`.
    fn spawn_delete(&mut self, collection: Collection, id: &str) {
        self.enqueue(Write::Delete {
            collection,
            id: id.to_string(),
        });
    }

    fn enqueue(&self, write: Write) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.writes.send(write).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!("The background writer has stopped, a write was dropped");
        }
    }
}

/// Applies queued writes one at a time, in order, until every sender is gone.
async fn apply_writes(
    store: Arc<dyn Store>,
    user_id: String,
    mut queue: mpsc::UnboundedReceiver<Write>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(write) = queue.recv().await {
        match write {
            Write::Put {
                collection,
                id,
                doc,
            } => {
                if let Err(e) = store.put(&user_id, collection, &id, doc).await {
                    warn!("Unable to save {collection}/{id}: {e:#}");
                }
            }
            Write::Delete { collection, id } => {
                if let Err(e) = store.delete(&user_id, collection, &id).await {
                    warn!("Unable to delete {collection}/{id}: {e:#}");
                }
            }
            Write::Flush(done) => {
                // The flusher may have given up waiting
                let _ = done.send(());
                continue;
            }
        }
        pending.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentity;
    use crate::model::{Amount, TransactionType};
    use crate::progress::{BUDGET_XP, LOGIN_XP, TRANSACTION_XP};
    use crate::db::Db;
    use crate::sync::MemoryStore;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    const EMAIL: &str = "ann@example.com";
    const PASSWORD: &str = "secret1";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).unwrap()
    }

    async fn registered() -> (Arc<MemoryStore>, Arc<MemoryIdentity>, Session) {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(MemoryIdentity::new());
        let mut session =
            Session::register(store.clone(), identity.clone(), EMAIL, PASSWORD, now())
                .await
                .unwrap();
        session.flush().await;
        (store, identity, session)
    }

    fn expense(amount: i64, category_id: &str) -> Transaction {
        Transaction::new(
            Amount::from(amount),
            TransactionType::Expense,
            category_id,
            "",
            now(),
        )
    }

    #[tokio::test]
    async fn test_register_seeds_and_starts_streak() {
        let (store, _, session) = registered().await;
        assert_eq!(session.categories().len(), 5);
        assert_eq!(session.stats().daily_streak, 1);
        assert_eq!(session.stats().longest_streak, 1);
        assert_eq!(session.stats().xp, LOGIN_XP);
        let user_id = session.user().id().to_string();
        assert_eq!(store.len(&user_id, Collection::Categories).await, 5);
        assert_eq!(store.len(&user_id, Collection::Profile).await, 1);
        assert_eq!(store.len(&user_id, Collection::Stats).await, 1);
    }

    #[tokio::test]
    async fn test_add_transaction_and_budget() {
        let (store, _, mut session) = registered().await;
        let category_id = session.categories()[0].id().to_string();
        let gain = session.add_transaction(expense(120, &category_id));
        assert_eq!(gain.amount, TRANSACTION_XP);
        session.add_budget(Budget::new(
            &category_id,
            "Food",
            Amount::from(100),
            Amount::from(400),
            4,
            2025,
            now(),
        ));
        session.flush().await;

        assert_eq!(session.stats().xp, LOGIN_XP + TRANSACTION_XP + BUDGET_XP);
        assert_eq!(session.stats().goals_completed, 1);
        assert_eq!(session.budgets()[0].spent(), Amount::from(120));
        let user_id = session.user().id().to_string();
        assert_eq!(store.len(&user_id, Collection::Transactions).await, 1);
        assert_eq!(store.len(&user_id, Collection::Budgets).await, 1);
        let stored = store
            .get(&user_id, Collection::Stats, &user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(decode::<UserStats>(&stored).unwrap(), *session.stats());
    }

    #[tokio::test]
    async fn test_delete_missing_is_a_no_op() {
        let (store, _, mut session) = registered().await;
        let writes = store.write_count();
        assert!(!session.delete_transaction("nope"));
        assert!(!session.delete_budget("nope"));
        assert_eq!(session.pending_writes(), 0);
        session.flush().await;
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_delete_transaction() {
        let (store, _, mut session) = registered().await;
        let tx = expense(30, "cat");
        let id = tx.id().to_string();
        session.add_transaction(tx);
        session.flush().await;
        let xp = session.stats().xp;

        assert!(session.delete_transaction(&id));
        session.flush().await;
        assert!(session.transactions().is_empty());
        // No XP penalty
        assert_eq!(session.stats().xp, xp);
        let user_id = session.user().id().to_string();
        assert_eq!(store.len(&user_id, Collection::Transactions).await, 0);
    }

    #[tokio::test]
    async fn test_failing_store_keeps_local_state() {
        let (store, _, mut session) = registered().await;
        store.set_fail_writes(true);
        session.add_transaction(expense(55, "cat"));
        session.add_category(Category::new("Pets", "🐶", "#795548"));
        session.flush().await;

        assert_eq!(session.transactions().len(), 1);
        assert_eq!(session.categories().len(), 6);
        assert_eq!(session.stats().xp, LOGIN_XP + TRANSACTION_XP);
        let user_id = session.user().id().to_string();
        assert_eq!(store.len(&user_id, Collection::Transactions).await, 0);
    }

    #[tokio::test]
    async fn test_login_reloads_and_extends_streak() {
        let (store, identity, mut session) = registered().await;
        session.add_transaction(expense(10, "cat"));
        session.logout().await.unwrap();

        let tomorrow = now() + Duration::days(1);
        let mut session = Session::login(store.clone(), identity, EMAIL, PASSWORD, tomorrow)
            .await
            .unwrap();
        session.flush().await;
        assert_eq!(session.transactions().len(), 1);
        // Not seeded twice
        assert_eq!(session.categories().len(), 5);
        assert_eq!(session.stats().daily_streak, 2);
        assert_eq!(session.stats().longest_streak, 2);
        assert_eq!(session.stats().xp, LOGIN_XP + TRANSACTION_XP + LOGIN_XP);
        assert_eq!(session.user().last_login(), tomorrow);
        assert_eq!(session.user().streak_count(), 2);
    }

    #[tokio::test]
    async fn test_login_after_gap_resets_streak() {
        let (store, identity, session) = registered().await;
        session.logout().await.unwrap();
        let later = now() + Duration::days(3);
        let session = Session::login(store, identity, EMAIL, PASSWORD, later)
            .await
            .unwrap();
        assert_eq!(session.stats().daily_streak, 1);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let (store, identity, _) = registered().await;
        let result = Session::login(store, identity, EMAIL, "wrong-password", now()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_resume_keeps_streak() {
        let (store, identity, mut session) = registered().await;
        session.add_transaction(expense(10, "cat"));
        session.flush().await;
        let user_id = session.user().id().to_string();
        let stats = *session.stats();

        let resumed = Session::resume(store, identity, &user_id).await.unwrap();
        assert_eq!(*resumed.stats(), stats);
        assert_eq!(resumed.transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_resume_unknown_user() {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(MemoryIdentity::new());
        assert!(Session::resume(store, identity, "ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_gain_xp_broadcasts() {
        let (_, _, mut session) = registered().await;
        let mut events = session.subscribe();
        session.gain_xp(200);
        let event = events.recv().await.unwrap();
        assert_eq!(event.amount, 200);
        assert_eq!(event.levels_gained, 1);
        assert_eq!(session.stats().level, 2);
        session.flush().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_writes_are_applied_in_order() {
        let dir = TempDir::new().unwrap();
        let db = Db::init(&dir.path().join("spendly.sqlite")).await.unwrap();
        let store: Arc<dyn Store> = Arc::new(db.clone());
        let mut session = Session::register(store.clone(), Arc::new(db), EMAIL, PASSWORD, now())
            .await
            .unwrap();
        for _ in 0..30 {
            session.gain_xp(7);
        }
        let tx = expense(25, "cat");
        let tx_id = tx.id().to_string();
        session.add_transaction(tx);
        assert!(session.delete_transaction(&tx_id));
        session.flush().await;
        assert_eq!(session.pending_writes(), 0);

        let user_id = session.user().id().to_string();
        let stored = store
            .get(&user_id, Collection::Stats, &user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(decode::<UserStats>(&stored).unwrap(), *session.stats());
        assert!(store
            .get(&user_id, Collection::Transactions, &tx_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_views() {
        let (_, _, mut session) = registered().await;
        let category = session.categories()[1].clone();
        let older = Transaction::new(
            Amount::from(500),
            TransactionType::Income,
            category.id(),
            "Salary",
            now() - Duration::days(2),
        );
        session.add_transaction(older);
        session.add_transaction(expense(20, category.id()));
        session.flush().await;

        assert_eq!(session.transactions()[0].amount(), Amount::from(20));
        let summary = session.summary();
        assert_eq!(summary.balance, Amount::from(480));
        assert_eq!(session.category_label(category.id()).name, category.name());
        assert!(session.category_label("deleted").is_unknown());
    }
}
