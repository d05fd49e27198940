//! In-memory collaborators.
//!
//! Process-local stand-ins for the local store, the relational store and the
//! identity provider. Used by tests and for running the storefront without a
//! backend.

use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::sync::watch;

use crate::{
    cart::CartLine,
    local::{LocalStore, LocalStoreError},
    orders::{
        NewOrder, NewOrderLine, Order, OrderDetails, OrderLine, OrderStatus, OrderUuid,
        OrderWriteError, OrdersStore,
    },
    products::ProductUuid,
    quantity::Quantity,
    session::{Credentials, Identity, IdentityError, IdentityProvider, UserUuid},
    store::{CartUuid, RemoteCartStore, StoreError},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`LocalStore`] backed by a map.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    items: Mutex<HashMap<String, String>>,
}

impl LocalStore for MemoryLocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        Ok(lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        lock(&self.items).insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), LocalStoreError> {
        lock(&self.items).remove(key);

        Ok(())
    }
}

#[derive(Debug, Default)]
struct Carts {
    by_user: HashMap<UserUuid, CartUuid>,
    lines: HashMap<CartUuid, Vec<CartLine>>,
}

/// [`RemoteCartStore`] backed by maps.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    carts: Mutex<Carts>,
}

impl MemoryCartStore {
    /// Lines currently stored for `user`, empty when the user has no cart.
    pub fn lines_for(&self, user: UserUuid) -> Vec<CartLine> {
        let carts = lock(&self.carts);

        carts
            .by_user
            .get(&user)
            .and_then(|cart| carts.lines.get(cart))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of cart records.
    pub fn cart_count(&self) -> usize {
        lock(&self.carts).by_user.len()
    }

    /// Replace `user`'s cart contents, creating the cart if needed.
    pub fn seed(&self, user: UserUuid, lines: Vec<CartLine>) {
        let mut carts = lock(&self.carts);
        let cart = *carts.by_user.entry(user).or_insert_with(CartUuid::new);

        carts.lines.insert(cart, lines);
    }
}

#[async_trait]
impl RemoteCartStore for MemoryCartStore {
    async fn ensure_cart(&self, user: UserUuid) -> Result<CartUuid, StoreError> {
        let mut carts = lock(&self.carts);
        let cart = *carts.by_user.entry(user).or_insert_with(CartUuid::new);

        carts.lines.entry(cart).or_default();

        Ok(cart)
    }

    async fn load_lines(&self, cart: CartUuid) -> Result<Vec<CartLine>, StoreError> {
        lock(&self.carts)
            .lines
            .get(&cart)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<Option<CartLine>, StoreError> {
        let carts = lock(&self.carts);
        let lines = carts.lines.get(&cart).ok_or(StoreError::NotFound)?;

        Ok(lines
            .iter()
            .find(|line| line.product_uuid == product)
            .cloned())
    }

    async fn insert_line(&self, cart: CartUuid, line: CartLine) -> Result<(), StoreError> {
        let mut carts = lock(&self.carts);
        let lines = carts
            .lines
            .get_mut(&cart)
            .ok_or(StoreError::InvalidReference)?;

        if lines
            .iter()
            .any(|existing| existing.product_uuid == line.product_uuid)
        {
            return Err(StoreError::AlreadyExists);
        }

        lines.push(line);

        Ok(())
    }

    async fn update_quantity(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        quantity: Quantity,
    ) -> Result<u64, StoreError> {
        let mut carts = lock(&self.carts);

        let line = carts
            .lines
            .get_mut(&cart)
            .and_then(|lines| lines.iter_mut().find(|line| line.product_uuid == product));

        Ok(line.map_or(0, |line| {
            line.quantity = quantity;
            1
        }))
    }

    async fn delete_line(&self, cart: CartUuid, product: ProductUuid) -> Result<(), StoreError> {
        if let Some(lines) = lock(&self.carts).lines.get_mut(&cart) {
            lines.retain(|line| line.product_uuid != product);
        }

        Ok(())
    }

    async fn clear_lines(&self, cart: CartUuid) -> Result<(), StoreError> {
        if let Some(lines) = lock(&self.carts).lines.get_mut(&cart) {
            lines.clear();
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
struct Orders {
    orders: Vec<Order>,
    lines: Vec<OrderLine>,
}

/// [`OrdersStore`] backed by vectors.
///
/// Orders and their lines are written in two separate steps, like a store
/// without transactions. [`Self::fail_line_inserts`] makes the second step fail.
#[derive(Debug, Default)]
pub struct MemoryOrdersStore {
    orders: Mutex<Orders>,
    fail_lines: AtomicBool,
}

impl MemoryOrdersStore {
    /// Make every following line insert fail after its order was written.
    pub fn fail_line_inserts(&self) {
        self.fail_lines.store(true, Ordering::Relaxed);
    }

    /// Every stored order, oldest first.
    pub fn orders(&self) -> Vec<Order> {
        lock(&self.orders).orders.clone()
    }

    /// Every stored order line.
    pub fn lines(&self) -> Vec<OrderLine> {
        lock(&self.orders).lines.clone()
    }
}

#[async_trait]
impl OrdersStore for MemoryOrdersStore {
    async fn create_order(
        &self,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> Result<Order, OrderWriteError> {
        let created = Order {
            uuid: OrderUuid::new(),
            user_uuid: order.user_uuid,
            total: order.total,
            status: OrderStatus::Pending,
            customer: order.customer,
            created_at: Timestamp::now(),
        };

        lock(&self.orders).orders.push(created.clone());

        if self.fail_lines.load(Ordering::Relaxed) {
            return Err(OrderWriteError::Lines {
                order: created.uuid,
                source: StoreError::InvalidData,
            });
        }

        lock(&self.orders)
            .lines
            .extend(lines.into_iter().map(|line| line.into_order_line(created.uuid)));

        Ok(created)
    }

    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = lock(&self.orders)
            .orders
            .iter()
            .filter(|order| order.user_uuid == user)
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(orders)
    }

    async fn get_order(&self, user: UserUuid, order: OrderUuid) -> Result<OrderDetails, StoreError> {
        let orders = lock(&self.orders);

        let found = orders
            .orders
            .iter()
            .find(|candidate| candidate.uuid == order && candidate.user_uuid == user)
            .cloned()
            .ok_or(StoreError::NotFound)?;

        let lines = orders
            .lines
            .iter()
            .filter(|line| line.order_uuid == order)
            .cloned()
            .collect();

        Ok(OrderDetails {
            order: found,
            lines,
        })
    }
}

/// [`IdentityProvider`] holding accounts in memory.
#[derive(Debug)]
pub struct MemoryIdentityProvider {
    session: watch::Sender<Option<Identity>>,
    accounts: Mutex<HashMap<String, (String, Identity)>>,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self {
            session: watch::channel(None).0,
            accounts: Mutex::default(),
        }
    }
}

impl MemoryIdentityProvider {
    /// Provider with `identity` already signed in.
    pub fn signed_in(identity: Identity) -> Self {
        let provider = Self::default();

        provider.set_session(Some(identity));

        provider
    }

    /// Replace the current session and notify subscribers.
    pub fn set_session(&self, identity: Option<Identity>) {
        self.session.send_replace(identity);
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn current_session(&self) -> Result<Option<Identity>, IdentityError> {
        Ok(self.session.borrow().clone())
    }

    fn session_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.session.subscribe()
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<Identity, IdentityError> {
        let identity = match lock(&self.accounts).get(&credentials.email) {
            Some((password, identity)) if *password == credentials.password => identity.clone(),
            _ => return Err(IdentityError::InvalidCredentials),
        };

        self.set_session(Some(identity.clone()));

        Ok(identity)
    }

    async fn sign_up(&self, credentials: Credentials) -> Result<Identity, IdentityError> {
        let identity = Identity {
            user_uuid: UserUuid::new(),
            email: Some(credentials.email.clone()),
        };

        {
            let mut accounts = lock(&self.accounts);

            if accounts.contains_key(&credentials.email) {
                return Err(IdentityError::Provider("user already registered".to_string()));
            }

            accounts.insert(
                credentials.email,
                (credentials.password, identity.clone()),
            );
        }

        self.set_session(Some(identity.clone()));

        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.set_session(None);

        Ok(())
    }
}
