//! Payload-free notifications raised by the player.
//!
//! Listeners are registered on an [`EventHub`] and stay registered for as long
//! as the returned [`Subscription`] lives, or until the hub is cleared by
//! `Player::stop`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerEvent {
    AutoPlayChanged,
    FastForwardChanged,
    LanguageChanged,
    PlayCompleted,
    HideTextAndUi,
    ShowTextAndUi,
}

type Listener = Arc<dyn Fn(PlayerEvent) + Send + Sync>;

struct Entry {
    id: u64,
    filter: Option<PlayerEvent>,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

#[derive(Clone, Default)]
pub struct EventHub {
    inner: Arc<Mutex<Registry>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listens to every event.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(PlayerEvent) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(f))
    }

    /// Listens to `event` only.
    pub fn on<F>(&self, event: PlayerEvent, f: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.register(Some(event), Arc::new(move |_| f()))
    }

    pub fn emit(&self, event: PlayerEvent) {
        // 先拷贝出监听器再调用，回调里可以安全地订阅或退订
        let listeners: Vec<Listener> = self
            .registry()
            .entries
            .iter()
            .filter(|e| e.filter.is_none_or(|f| f == event))
            .map(|e| e.listener.clone())
            .collect();

        log::trace!("emit {:?} to {} listener(s)", event, listeners.len());
        for listener in listeners {
            listener(event);
        }
    }

    /// Drops every listener. Outstanding [`Subscription`]s become no-ops.
    pub fn clear(&self) {
        self.registry().entries.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.registry().entries.len()
    }

    fn register(&self, filter: Option<PlayerEvent>, listener: Listener) -> Subscription {
        let mut reg = self.registry();
        let id = reg.next_id;
        reg.next_id += 1;
        reg.entries.push(Entry { id, filter, listener });

        Subscription {
            hub: Some(Arc::downgrade(&self.inner)),
            id,
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration handle; unregisters its listener when dropped.
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    hub: Option<Weak<Mutex<Registry>>>,
    id: u64,
}

impl Subscription {
    /// Keeps the listener registered until the hub is cleared.
    pub fn detach(mut self) {
        self.hub = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(hub) = self.hub.take().and_then(|w| w.upgrade()) else {
            return;
        };
        let mut reg = hub.lock().unwrap_or_else(PoisonError::into_inner);
        reg.entries.retain(|e| e.id != self.id);
    }
}
