//! Cart Engine
//!
//! Owns the in-memory cart and routes every edit to whichever store backs it:
//! the local store while signed out, the remote cart store while signed in.
//!
//! Guest edits are written through to the local store before they are applied.
//! Member edits are written to the remote store and followed by a full reload,
//! so the in-memory view always reflects the server after each edit.
//!
//! Edits run one at a time through an operation queue. Every change of
//! signed-in user bumps a generation counter; a reload that finishes under an
//! older generation is discarded instead of repopulating the new session's cart.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::{debug, info};

use crate::{
    cart::{CartError, CartLine, CartSnapshot, CartSource, lines},
    local::{GUEST_CART_KEY, GuestCartStorage, LocalStore},
    products::{Product, ProductUuid},
    quantity::Quantity,
    session::{Identity, SessionTracker, UserUuid},
    store::{CartUuid, RemoteCartStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backing {
    Guest,
    Member {
        user: UserUuid,
        cart: Option<CartUuid>,
    },
}

#[derive(Debug)]
struct EngineState {
    backing: Backing,
    lines: Vec<CartLine>,
    generation: u64,
    loading: bool,
}

impl EngineState {
    fn source(&self) -> CartSource {
        match self.backing {
            Backing::Guest => CartSource::Guest,
            Backing::Member { user, .. } => CartSource::Member(user),
        }
    }

    fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::new(&self.lines, self.source(), self.loading)
    }

    fn target(&self) -> Target {
        Target {
            generation: self.generation,
            backing: self.backing,
        }
    }

    /// Start a new session generation backed by `backing` with an empty cart.
    fn reset(&mut self, backing: Backing, loading: bool) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.backing = backing;
        self.lines.clear();
        self.loading = loading;
        self.generation
    }
}

#[derive(Debug, Clone, Copy)]
struct Target {
    generation: u64,
    backing: Backing,
}

/// Cart state for the current session.
///
/// Construct one per application instance and share it by reference.
pub struct CartEngine {
    guest: GuestCartStorage,
    remote: Arc<dyn RemoteCartStore>,
    state: Mutex<EngineState>,
    queue: AsyncMutex<()>,
    snapshots: watch::Sender<CartSnapshot>,
}

impl std::fmt::Debug for CartEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartEngine")
            .field("guest", &self.guest)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl CartEngine {
    /// Engine starting from the guest cart stored under the default key.
    pub fn new(local: Arc<dyn LocalStore>, remote: Arc<dyn RemoteCartStore>) -> Self {
        Self::with_guest_storage(GuestCartStorage::new(local, GUEST_CART_KEY), remote)
    }

    /// Engine starting from the guest cart in `guest`.
    pub fn with_guest_storage(guest: GuestCartStorage, remote: Arc<dyn RemoteCartStore>) -> Self {
        let state = EngineState {
            backing: Backing::Guest,
            lines: guest.load(),
            generation: 0,
            loading: false,
        };

        let (snapshots, _) = watch::channel(state.snapshot());

        Self {
            guest,
            remote,
            state: Mutex::new(state),
            queue: AsyncMutex::new(()),
            snapshots,
        }
    }

    /// Current cart.
    pub fn snapshot(&self) -> CartSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receive a new snapshot after every change. Drop the receiver to
    /// unsubscribe.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshots.subscribe()
    }

    /// Reconcile the cart with the signed-in user.
    ///
    /// - Signing out discards the member cart, clears the stored guest cart and
    ///   starts an empty guest cart.
    /// - Signing in (or switching user) replaces the cart wholesale with the
    ///   member cart. Guest lines are not merged.
    /// - The same user as before is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored guest cart cannot be cleared or the member
    /// cart cannot be loaded. The switch of backing store happens regardless.
    #[tracing::instrument(
        name = "cart.engine.sync_session",
        skip(self, identity),
        fields(signed_in = identity.is_some()),
        err
    )]
    pub async fn sync_session(
        &self,
        identity: Option<&Identity>,
    ) -> Result<CartSnapshot, CartError> {
        let (generation, user) = {
            let mut state = self.lock_state();

            match (state.backing, identity) {
                (Backing::Guest, None) => return Ok(state.snapshot()),
                (Backing::Member { user, .. }, Some(next)) if user == next.user_uuid => {
                    return Ok(state.snapshot());
                }
                (Backing::Member { user, .. }, None) => {
                    info!(user_uuid = %user, "signed out, starting a new guest cart");

                    state.reset(Backing::Guest, false);

                    let cleared = self.guest.clear();

                    self.publish(&state);

                    cleared?;

                    return Ok(state.snapshot());
                }
                (_, Some(next)) => {
                    info!(user_uuid = %next.user_uuid, "signed in, loading member cart");

                    let generation = state.reset(
                        Backing::Member {
                            user: next.user_uuid,
                            cart: None,
                        },
                        true,
                    );

                    self.publish(&state);

                    (generation, next.user_uuid)
                }
            }
        };

        let _turn = self.queue.lock().await;

        self.reload_member(generation, user).await
    }

    /// Apply every session change reported by `tracker` until its provider goes
    /// away, starting with the session it resolved on start-up.
    pub async fn follow_session(&self, mut tracker: SessionTracker) {
        if let Err(error) = self.sync_session(tracker.current()).await {
            debug!(%error, "initial cart reconciliation failed");
        }

        while let Some(transition) = tracker.next_transition().await {
            if let Err(error) = self.sync_session(transition.current.as_ref()).await {
                debug!(%error, "cart reconciliation failed");
            }
        }
    }

    /// Add `quantity` units of `product`, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store fails or the session changed
    /// before the result could be applied.
    #[tracing::instrument(
        name = "cart.engine.add_item",
        skip(self, product),
        fields(product_uuid = %product.uuid),
        err
    )]
    pub async fn add_item(
        &self,
        product: &Product,
        quantity: i64,
    ) -> Result<CartSnapshot, CartError> {
        let _turn = self.queue.lock().await;
        let target = self.target();

        match target.backing {
            Backing::Guest => self.edit_guest(target.generation, |lines| {
                lines::add(lines, product, quantity);
                true
            }),
            Backing::Member { user, .. } => {
                let cart = self.member_cart(target.generation, user).await?;

                match self.remote.find_line(cart, product.uuid).await? {
                    Some(existing) => {
                        self.remote
                            .update_quantity(cart, product.uuid, existing.quantity.offset(quantity))
                            .await?;
                    }
                    None => {
                        let line = CartLine::for_product(product, Quantity::clamped(quantity));

                        self.remote.insert_line(cart, line).await?;
                    }
                }

                self.reload_member(target.generation, user).await
            }
        }
    }

    /// Remove the line for `product`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store fails or the session changed
    /// before the result could be applied.
    #[tracing::instrument(name = "cart.engine.remove_item", skip(self), err)]
    pub async fn remove_item(&self, product: ProductUuid) -> Result<CartSnapshot, CartError> {
        let _turn = self.queue.lock().await;
        let target = self.target();

        match target.backing {
            Backing::Guest => {
                self.edit_guest(target.generation, |lines| lines::remove(lines, product))
            }
            Backing::Member { user, .. } => {
                let cart = self.member_cart(target.generation, user).await?;

                self.remote.delete_line(cart, product).await?;

                self.reload_member(target.generation, user).await
            }
        }
    }

    /// Overwrite the quantity of the line for `product`, clamped to `1..=99`.
    /// A product that is not in the cart is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store fails or the session changed
    /// before the result could be applied.
    #[tracing::instrument(name = "cart.engine.set_quantity", skip(self), err)]
    pub async fn set_quantity(
        &self,
        product: ProductUuid,
        quantity: i64,
    ) -> Result<CartSnapshot, CartError> {
        let _turn = self.queue.lock().await;
        let target = self.target();

        self.write_quantity(target, product, Quantity::clamped(quantity))
            .await
    }

    /// One more unit of `product`.
    ///
    /// # Errors
    ///
    /// See [`Self::set_quantity`].
    pub async fn increment(&self, product: ProductUuid) -> Result<CartSnapshot, CartError> {
        self.step_quantity(product, 1).await
    }

    /// One fewer unit of `product`, never going below 1. Use
    /// [`Self::remove_item`] to delete the line.
    ///
    /// # Errors
    ///
    /// See [`Self::set_quantity`].
    pub async fn decrement(&self, product: ProductUuid) -> Result<CartSnapshot, CartError> {
        self.step_quantity(product, -1).await
    }

    /// Empty the cart. A member's cart record is kept for reuse.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store fails or the session changed
    /// before the result could be applied.
    #[tracing::instrument(name = "cart.engine.clear", skip(self), err)]
    pub async fn clear(&self) -> Result<CartSnapshot, CartError> {
        let _turn = self.queue.lock().await;
        let target = self.target();

        self.empty_cart(target).await
    }

    /// Hand the current cart to `consume` and empty it once `consume` succeeds.
    ///
    /// No other edit runs between reading the cart and emptying it, so lines
    /// added meanwhile wait and land in the emptied cart. The outcome of emptying
    /// is returned next to the value from `consume`.
    ///
    /// `consume` must not edit this cart.
    ///
    /// # Errors
    ///
    /// Returns the error from `consume`; the cart is then left untouched.
    pub async fn drain_with<T, E, F, Fut>(
        &self,
        consume: F,
    ) -> Result<(T, Result<CartSnapshot, CartError>), E>
    where
        F: FnOnce(CartSnapshot) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _turn = self.queue.lock().await;

        let (target, snapshot) = {
            let state = self.lock_state();

            (state.target(), state.snapshot())
        };

        let value = consume(snapshot).await?;

        Ok((value, self.empty_cart(target).await))
    }

    async fn empty_cart(&self, target: Target) -> Result<CartSnapshot, CartError> {
        if let Backing::Member { user, .. } = target.backing {
            let cart = self.member_cart(target.generation, user).await?;

            self.remote.clear_lines(cart).await?;
        }

        let mut state = self.current_state(target.generation)?;

        if state.backing == Backing::Guest {
            self.guest.clear()?;
        }

        state.lines.clear();

        self.publish(&state);

        Ok(state.snapshot())
    }

    /// Re-read the cart from its backing store.
    ///
    /// # Errors
    ///
    /// Returns an error when the member cart cannot be loaded or the session
    /// changed before the result could be applied.
    #[tracing::instrument(name = "cart.engine.refresh", skip(self), err)]
    pub async fn refresh(&self) -> Result<CartSnapshot, CartError> {
        let _turn = self.queue.lock().await;
        let target = self.target();

        match target.backing {
            Backing::Guest => {
                let mut state = self.current_state(target.generation)?;

                state.lines = self.guest.load();

                self.publish(&state);

                Ok(state.snapshot())
            }
            Backing::Member { user, .. } => self.reload_member(target.generation, user).await,
        }
    }

    async fn step_quantity(
        &self,
        product: ProductUuid,
        delta: i64,
    ) -> Result<CartSnapshot, CartError> {
        let _turn = self.queue.lock().await;

        let (target, current) = {
            let state = self.lock_state();

            (state.target(), lines::quantity_of(&state.lines, product))
        };

        let quantity = current.unwrap_or(Quantity::MIN).offset(delta);

        self.write_quantity(target, product, quantity).await
    }

    async fn write_quantity(
        &self,
        target: Target,
        product: ProductUuid,
        quantity: Quantity,
    ) -> Result<CartSnapshot, CartError> {
        match target.backing {
            Backing::Guest => self.edit_guest(target.generation, |lines| {
                lines::set_quantity(lines, product, quantity)
            }),
            Backing::Member { user, .. } => {
                let cart = self.member_cart(target.generation, user).await?;

                let touched = self.remote.update_quantity(cart, product, quantity).await?;

                if touched == 0 {
                    debug!(product_uuid = %product, "quantity update matched no cart line");
                }

                self.reload_member(target.generation, user).await
            }
        }
    }

    /// Apply `edit` to a copy of the guest cart, persist it, then publish it.
    /// `edit` returns whether it changed anything.
    fn edit_guest(
        &self,
        generation: u64,
        edit: impl FnOnce(&mut Vec<CartLine>) -> bool,
    ) -> Result<CartSnapshot, CartError> {
        let mut state = self.current_state(generation)?;

        if state.backing != Backing::Guest {
            return Err(CartError::SessionChanged);
        }

        let mut edited = state.lines.clone();

        if !edit(&mut edited) {
            return Ok(state.snapshot());
        }

        self.guest.save(&edited)?;

        state.lines = edited;

        self.publish(&state);

        Ok(state.snapshot())
    }

    async fn reload_member(
        &self,
        generation: u64,
        user: UserUuid,
    ) -> Result<CartSnapshot, CartError> {
        let loaded = self.fetch_member_lines(generation, user).await;

        let mut state = self.current_state(generation)?;

        state.loading = false;

        let result = loaded.map(|lines| state.lines = lines);

        self.publish(&state);

        result?;

        Ok(state.snapshot())
    }

    async fn fetch_member_lines(
        &self,
        generation: u64,
        user: UserUuid,
    ) -> Result<Vec<CartLine>, CartError> {
        let cart = self.member_cart(generation, user).await?;

        Ok(self.remote.load_lines(cart).await?)
    }

    /// The member's cart id, provisioning the cart on first use in a session.
    async fn member_cart(&self, generation: u64, user: UserUuid) -> Result<CartUuid, CartError> {
        let backing = self.current_state(generation)?.backing;

        if let Backing::Member {
            cart: Some(cart), ..
        } = backing
        {
            return Ok(cart);
        }

        let cart = self.remote.ensure_cart(user).await?;

        let mut state = self.current_state(generation)?;

        if let Backing::Member { cart: slot, .. } = &mut state.backing {
            *slot = Some(cart);
        }

        Ok(cart)
    }

    fn target(&self) -> Target {
        self.lock_state().target()
    }

    /// Lock the state, failing if the session moved on since `generation`.
    fn current_state(&self, generation: u64) -> Result<MutexGuard<'_, EngineState>, CartError> {
        let state = self.lock_state();

        if state.generation != generation {
            debug!(
                expected = generation,
                current = state.generation,
                "discarding cart result from a previous session"
            );

            return Err(CartError::SessionChanged);
        }

        Ok(state)
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &EngineState) {
        self.snapshots.send_replace(state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use jiff::Timestamp;
    use rust_decimal::Decimal;
    use testresult::TestResult;
    use tokio::sync::Notify;

    use crate::{
        memory::{MemoryCartStore, MemoryIdentityProvider, MemoryLocalStore},
        store::{MockRemoteCartStore, StoreError},
    };

    use super::*;

    fn product(name: &str, price: Decimal) -> Product {
        Product {
            uuid: ProductUuid::new(),
            name: name.to_string(),
            price,
            category: Some("prints".to_string()),
            description: None,
            image_url: Some(format!("https://img.example/{name}.jpg")),
            created_at: Timestamp::UNIX_EPOCH,
        }
    }

    struct Fixture {
        local: Arc<MemoryLocalStore>,
        remote: Arc<MemoryCartStore>,
        engine: CartEngine,
    }

    fn fixture() -> Fixture {
        let local = Arc::new(MemoryLocalStore::default());
        let remote = Arc::new(MemoryCartStore::default());
        let engine = CartEngine::new(local.clone(), remote.clone());

        Fixture {
            local,
            remote,
            engine,
        }
    }

    fn quantities(snapshot: &CartSnapshot) -> Vec<(ProductUuid, u8)> {
        snapshot
            .lines()
            .iter()
            .map(|line| (line.product_uuid, line.quantity.get()))
            .collect()
    }

    #[tokio::test]
    async fn guest_edits_are_written_through_to_the_local_store() -> TestResult {
        let Fixture { local, engine, .. } = fixture();
        let poster = product("poster", Decimal::new(1000, 2));

        let snapshot = engine.add_item(&poster, 2).await?;

        let stored = GuestCartStorage::new(local.clone(), GUEST_CART_KEY).load();

        assert_eq!(stored, snapshot.lines());

        let reloaded = CartEngine::new(local, Arc::new(MemoryCartStore::default()));

        assert_eq!(quantities(&reloaded.snapshot()), [(poster.uuid, 2)]);

        Ok(())
    }

    #[tokio::test]
    async fn set_quantity_clamps_into_range() -> TestResult {
        let Fixture { engine, .. } = fixture();
        let poster = product("poster", Decimal::new(1000, 2));

        engine.add_item(&poster, 1).await?;

        for (requested, stored) in [(0, 1), (-3, 1), (7, 7), (150, 99), (99, 99)] {
            let snapshot = engine.set_quantity(poster.uuid, requested).await?;

            assert_eq!(quantities(&snapshot), [(poster.uuid, stored)], "set {requested}");
        }

        Ok(())
    }

    #[tokio::test]
    async fn repeated_adds_merge_into_one_line() -> TestResult {
        let Fixture { engine, .. } = fixture();
        let poster = product("poster", Decimal::new(1000, 2));

        engine.add_item(&poster, 2).await?;
        engine.add_item(&poster, 3).await?;

        assert_eq!(quantities(&engine.snapshot()), [(poster.uuid, 5)]);

        let snapshot = engine.add_item(&poster, 200).await?;

        assert_eq!(quantities(&snapshot), [(poster.uuid, 99)]);

        Ok(())
    }

    #[tokio::test]
    async fn decrement_stops_at_one() -> TestResult {
        let Fixture { engine, .. } = fixture();
        let poster = product("poster", Decimal::new(1000, 2));

        engine.add_item(&poster, 2).await?;
        engine.decrement(poster.uuid).await?;
        let snapshot = engine.decrement(poster.uuid).await?;

        assert_eq!(quantities(&snapshot), [(poster.uuid, 1)]);

        let snapshot = engine.increment(poster.uuid).await?;

        assert_eq!(quantities(&snapshot), [(poster.uuid, 2)]);

        let snapshot = engine.remove_item(poster.uuid).await?;

        assert!(snapshot.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_quantity_change_is_ignored() -> TestResult {
        let Fixture { local, engine, .. } = fixture();

        let snapshot = engine.set_quantity(ProductUuid::new(), 4).await?;

        assert!(snapshot.is_empty());
        assert_eq!(local.get_item(GUEST_CART_KEY)?, None);

        Ok(())
    }

    #[tokio::test]
    async fn sign_in_replaces_the_guest_cart_with_the_member_cart() -> TestResult {
        let Fixture { remote, engine, .. } = fixture();
        let poster = product("poster", Decimal::new(1000, 2));
        let mug = product("mug", Decimal::new(550, 2));
        let user = Identity::new(UserUuid::new());

        engine.add_item(&poster, 2).await?;
        remote.seed(
            user.user_uuid,
            vec![CartLine::for_product(&mug, Quantity::clamped(3))],
        );

        let snapshot = engine.sync_session(Some(&user)).await?;

        assert_eq!(snapshot.source(), CartSource::Member(user.user_uuid));
        assert_eq!(quantities(&snapshot), [(mug.uuid, 3)]);
        assert!(!snapshot.is_loading());

        Ok(())
    }

    #[tokio::test]
    async fn sign_out_empties_the_cart_and_the_local_store() -> TestResult {
        let Fixture {
            local,
            remote,
            engine,
        } = fixture();
        let poster = product("poster", Decimal::new(1000, 2));
        let user = Identity::new(UserUuid::new());

        engine.add_item(&poster, 1).await?;
        remote.seed(
            user.user_uuid,
            vec![CartLine::for_product(&poster, Quantity::clamped(4))],
        );
        engine.sync_session(Some(&user)).await?;

        let snapshot = engine.sync_session(None).await?;

        assert!(snapshot.is_empty());
        assert_eq!(snapshot.source(), CartSource::Guest);
        assert_eq!(local.get_item(GUEST_CART_KEY)?, None);
        assert_eq!(remote.lines_for(user.user_uuid).len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn same_user_notification_keeps_the_cart() -> TestResult {
        let Fixture { remote, engine, .. } = fixture();
        let poster = product("poster", Decimal::new(1000, 2));
        let user = Identity::new(UserUuid::new());

        engine.sync_session(Some(&user)).await?;
        engine.add_item(&poster, 2).await?;

        let snapshot = engine.sync_session(Some(&user)).await?;

        assert_eq!(quantities(&snapshot), [(poster.uuid, 2)]);
        assert_eq!(remote.cart_count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn member_edits_reload_from_the_remote_store() -> TestResult {
        let Fixture { remote, engine, .. } = fixture();
        let poster = product("poster", Decimal::new(1000, 2));
        let mug = product("mug", Decimal::new(550, 2));
        let user = Identity::new(UserUuid::new());

        engine.sync_session(Some(&user)).await?;
        engine.add_item(&poster, 2).await?;
        engine.add_item(&poster, 1).await?;

        // Another device adds a line behind the engine's back.
        let mut lines = remote.lines_for(user.user_uuid);
        lines.push(CartLine::for_product(&mug, Quantity::clamped(1)));
        remote.seed(user.user_uuid, lines);

        let snapshot = engine.set_quantity(poster.uuid, 5).await?;

        assert_eq!(quantities(&snapshot), [(poster.uuid, 5), (mug.uuid, 1)]);
        assert_eq!(snapshot.count(), 6);

        let snapshot = engine.clear().await?;

        assert!(snapshot.is_empty());
        assert!(remote.lines_for(user.user_uuid).is_empty());
        assert_eq!(remote.cart_count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn failed_remote_write_leaves_the_cart_unchanged() -> TestResult {
        let poster = product("poster", Decimal::new(1000, 2));
        let mug = product("mug", Decimal::new(550, 2));
        let existing = CartLine::for_product(&poster, Quantity::clamped(2));
        let cart = CartUuid::new();

        let mut remote = MockRemoteCartStore::new();

        remote.expect_ensure_cart().returning(move |_| Ok(cart));

        let loaded = vec![existing.clone()];
        remote
            .expect_load_lines()
            .times(1)
            .returning(move |_| Ok(loaded.clone()));

        remote.expect_find_line().returning(|_, _| Ok(None));

        remote
            .expect_insert_line()
            .returning(|_, _| Err(StoreError::InvalidReference));

        let engine = CartEngine::new(Arc::new(MemoryLocalStore::default()), Arc::new(remote));
        let user = Identity::new(UserUuid::new());

        engine.sync_session(Some(&user)).await?;

        let result = engine.add_item(&mug, 1).await;

        assert!(
            matches!(result, Err(CartError::Store(StoreError::InvalidReference))),
            "expected store error, got {result:?}"
        );
        assert_eq!(engine.snapshot().lines(), [existing]);

        Ok(())
    }

    #[tokio::test]
    async fn failed_member_load_reports_and_clears_loading() -> TestResult {
        let mut remote = MockRemoteCartStore::new();

        remote
            .expect_ensure_cart()
            .returning(|_| Err(StoreError::Unauthenticated));

        let engine = CartEngine::new(Arc::new(MemoryLocalStore::default()), Arc::new(remote));
        let user = Identity::new(UserUuid::new());

        let result = engine.sync_session(Some(&user)).await;

        assert!(
            matches!(result, Err(CartError::Store(StoreError::Unauthenticated))),
            "expected store error, got {result:?}"
        );

        let snapshot = engine.snapshot();

        assert_eq!(snapshot.source(), CartSource::Member(user.user_uuid));
        assert!(!snapshot.is_loading());

        Ok(())
    }

    /// Cart store whose `load_lines` waits until released.
    #[derive(Default)]
    struct GatedCartStore {
        inner: MemoryCartStore,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl RemoteCartStore for GatedCartStore {
        async fn ensure_cart(&self, user: UserUuid) -> Result<CartUuid, StoreError> {
            self.inner.ensure_cart(user).await
        }

        async fn load_lines(&self, cart: CartUuid) -> Result<Vec<CartLine>, StoreError> {
            self.entered.notify_one();
            self.release.notified().await;

            self.inner.load_lines(cart).await
        }

        async fn find_line(
            &self,
            cart: CartUuid,
            product: ProductUuid,
        ) -> Result<Option<CartLine>, StoreError> {
            self.inner.find_line(cart, product).await
        }

        async fn insert_line(&self, cart: CartUuid, line: CartLine) -> Result<(), StoreError> {
            self.inner.insert_line(cart, line).await
        }

        async fn update_quantity(
            &self,
            cart: CartUuid,
            product: ProductUuid,
            quantity: Quantity,
        ) -> Result<u64, StoreError> {
            self.inner.update_quantity(cart, product, quantity).await
        }

        async fn delete_line(&self, cart: CartUuid, product: ProductUuid) -> Result<(), StoreError> {
            self.inner.delete_line(cart, product).await
        }

        async fn clear_lines(&self, cart: CartUuid) -> Result<(), StoreError> {
            self.inner.clear_lines(cart).await
        }
    }

    #[tokio::test]
    async fn reload_finishing_after_sign_out_is_discarded() -> TestResult {
        let poster = product("poster", Decimal::new(1000, 2));
        let user = Identity::new(UserUuid::new());

        let remote = Arc::new(GatedCartStore::default());
        remote.inner.seed(
            user.user_uuid,
            vec![CartLine::for_product(&poster, Quantity::clamped(2))],
        );

        let engine = Arc::new(CartEngine::new(
            Arc::new(MemoryLocalStore::default()),
            remote.clone(),
        ));

        let sign_in = tokio::spawn({
            let engine = engine.clone();
            let user = user.clone();

            async move { engine.sync_session(Some(&user)).await }
        });

        remote.entered.notified().await;

        assert!(engine.snapshot().is_loading());

        let signed_out = engine.sync_session(None).await?;

        assert!(signed_out.is_empty());

        remote.release.notify_one();

        let result = sign_in.await?;

        assert!(
            matches!(result, Err(CartError::SessionChanged)),
            "expected stale reload to be discarded, got {result:?}"
        );

        let snapshot = engine.snapshot();

        assert!(snapshot.is_empty());
        assert_eq!(snapshot.source(), CartSource::Guest);
        assert!(!snapshot.is_loading());

        Ok(())
    }

    #[tokio::test]
    async fn subscribers_see_every_change() -> TestResult {
        let Fixture { engine, .. } = fixture();
        let poster = product("poster", Decimal::new(1000, 2));
        let mut snapshots = engine.subscribe();

        engine.add_item(&poster, 2).await?;

        snapshots.changed().await?;

        assert_eq!(quantities(&snapshots.borrow_and_update()), [(poster.uuid, 2)]);

        engine.clear().await?;

        snapshots.changed().await?;

        assert!(snapshots.borrow_and_update().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn follow_session_applies_provider_changes() -> TestResult {
        let Fixture { remote, .. } = fixture();
        let poster = product("poster", Decimal::new(1000, 2));
        let user = Identity::new(UserUuid::new());

        remote.seed(
            user.user_uuid,
            vec![CartLine::for_product(&poster, Quantity::clamped(3))],
        );

        let provider = Arc::new(MemoryIdentityProvider::default());
        let engine = Arc::new(CartEngine::new(
            Arc::new(MemoryLocalStore::default()),
            remote,
        ));
        let mut snapshots = engine.subscribe();

        let tracker = SessionTracker::start(provider.as_ref()).await?;
        let follower = tokio::spawn({
            let engine = engine.clone();

            async move { engine.follow_session(tracker).await }
        });

        provider.set_session(Some(user.clone()));

        let loaded = snapshots
            .wait_for(|snapshot| !snapshot.is_loading() && !snapshot.is_empty())
            .await?
            .clone();

        assert_eq!(quantities(&loaded), [(poster.uuid, 3)]);

        provider.set_session(None);

        snapshots
            .wait_for(|snapshot| snapshot.source() == CartSource::Guest)
            .await?;

        drop(provider);
        follower.await?;

        assert!(engine.snapshot().is_empty());

        Ok(())
    }
}
