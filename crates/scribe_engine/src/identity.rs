use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use scribe_core::Identity;
use scribe_logging::{scribe_info, scribe_warn};
use thiserror::Error;

/// User record as the external identity provider reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl From<ProviderUser> for Identity {
    fn from(user: ProviderUser) -> Self {
        Identity {
            id: user.uid,
            display_name: user.display_name,
            email: user.email,
            avatar_url: user.photo_url,
        }
    }
}

/// What is known about the current user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthSnapshot {
    /// The provider has not reported yet.
    #[default]
    Unresolved,
    SignedOut,
    SignedIn(Identity),
}

impl AuthSnapshot {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthSnapshot::SignedIn(identity) => Some(identity),
            AuthSnapshot::Unresolved | AuthSnapshot::SignedOut => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthSnapshot::Unresolved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("identity provider rejected sign-out: {0}")]
    Rejected(String),
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),
}

/// The external provider's session operations.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// Ends the provider session. A successful sign-out is reported back
    /// through [`IdentityHub::publish`] by the provider integration.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

type Callback = Arc<dyn Fn(Option<&Identity>) + Send + Sync>;

#[derive(Clone)]
struct Subscriber {
    id: u64,
    callback: Callback,
    /// Version of the last snapshot handed to `callback`.
    delivered: Arc<Mutex<u64>>,
}

impl Subscriber {
    /// Calls back unless a newer snapshot already reached this subscriber.
    fn deliver(&self, version: u64, snapshot: &AuthSnapshot) {
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        if *delivered >= version {
            return;
        }
        *delivered = version;
        (self.callback)(snapshot.identity());
    }
}

#[derive(Default)]
struct HubState {
    snapshot: AuthSnapshot,
    /// Bumped on every publish; 0 while unresolved.
    version: u64,
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

/// Fan-out point for authentication state changes.
///
/// Each subscriber sees snapshots in publish order, even when `publish` and
/// `subscribe` race on different threads. Callbacks run outside the hub lock,
/// so they may subscribe or unsubscribe; they must not publish.
#[derive(Clone, Default)]
pub struct IdentityHub {
    inner: Arc<Mutex<HubState>>,
}

impl IdentityHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> AuthSnapshot {
        self.lock().snapshot.clone()
    }

    /// Registers `callback`; it is called right away when the state is already known.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&Identity>) + Send + Sync + 'static,
    {
        let (subscriber, version, snapshot) = {
            let mut state = self.lock();
            let subscriber = Subscriber {
                id: state.next_id,
                callback: Arc::new(callback),
                delivered: Arc::new(Mutex::new(0)),
            };
            state.next_id += 1;
            state.subscribers.push(subscriber.clone());
            (subscriber, state.version, state.snapshot.clone())
        };
        if snapshot.is_resolved() {
            subscriber.deliver(version, &snapshot);
        }
        Subscription {
            id: subscriber.id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Entry point for the provider integration: a user signed in, or `None` on sign-out.
    pub fn publish(&self, user: Option<ProviderUser>) {
        let snapshot = match user {
            Some(user) => AuthSnapshot::SignedIn(user.into()),
            None => AuthSnapshot::SignedOut,
        };
        match &snapshot {
            AuthSnapshot::SignedIn(identity) => scribe_info!("Identity set: {}", identity.id),
            _ => scribe_info!("Identity cleared"),
        }
        let (version, subscribers) = {
            let mut state = self.lock();
            state.version += 1;
            state.snapshot = snapshot.clone();
            (state.version, state.subscribers.clone())
        };
        for subscriber in subscribers {
            subscriber.deliver(version, &snapshot);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Unsubscribe handle. Dropping it unsubscribes as well.
pub struct Subscription {
    id: u64,
    hub: Weak<Mutex<HubState>>,
}

impl Subscription {
    /// Stops further notifications. Safe to call repeatedly or after the hub is gone.
    pub fn unsubscribe(&mut self) {
        let Some(hub) = self.hub.upgrade() else {
            return;
        };
        let mut state = hub.lock().unwrap_or_else(PoisonError::into_inner);
        state.subscribers.retain(|subscriber| subscriber.id != self.id);
        drop(state);
        self.hub = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Identity provider adapter: authentication state notifications plus sign-out.
#[derive(Clone)]
pub struct IdentityAdapter {
    hub: IdentityHub,
    backend: Arc<dyn AuthBackend>,
}

impl IdentityAdapter {
    pub fn new(hub: IdentityHub, backend: Arc<dyn AuthBackend>) -> Self {
        Self { hub, backend }
    }

    pub fn hub(&self) -> &IdentityHub {
        &self.hub
    }

    pub fn current(&self) -> AuthSnapshot {
        self.hub.current()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&Identity>) + Send + Sync + 'static,
    {
        self.hub.subscribe(callback)
    }

    /// Asks the provider to end the session. On failure the current state is
    /// left as it was; callers learn the outcome through their subscription.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        match self.backend.sign_out().await {
            Ok(()) => {
                scribe_info!("Sign-out acknowledged by provider");
                Ok(())
            }
            Err(err) => {
                scribe_warn!("Sign-out failed: {}", err);
                Err(err)
            }
        }
    }
}
