//! Registry tracking retimer handles over their registered lifetime

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use thiserror::Error;
use tracing::{debug, warn};

use crate::id::{IdAllocator, RetimerId};
use crate::label;
use crate::parent::ParentDevice;

/// Prefix of every generated handle name
pub const NAME_PREFIX: &str = "retimer";

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("no free retimer identifiers available")]
    Exhausted,
    #[error("failed to register retimer handle {0}: name already taken")]
    RegistrationFailed(String),
}

/// A registered retimer device instance.
///
/// The identifier is a first-class field for the handle's whole lifetime;
/// the generated name encodes it only for external consumers. The parent
/// back-reference is weak; a handle never keeps its parent alive.
pub struct Retimer {
    id: RetimerId,
    name: String,
    parent: Weak<dyn ParentDevice>,
}

impl Retimer {
    /// Identifier bound to this handle
    pub fn id(&self) -> RetimerId {
        self.id
    }

    /// Generated handle name, e.g. `retimer3`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the label attribute into a caller-provided buffer.
    ///
    /// The buffer receives the configured label followed by a newline and a
    /// NUL terminator, truncated to capacity; the returned count excludes
    /// the NUL. Falls back to `"unknown"` when the parent is gone or has no
    /// usable label configured. Never fails and mutates nothing.
    pub fn read_label(&self, buf: &mut [u8]) -> usize {
        let stored = self.lookup_label();
        label::render_into(stored.as_deref(), buf)
    }

    /// Label as a plain string, without the attribute framing
    pub fn label(&self) -> String {
        label::text(self.lookup_label().as_deref())
    }

    /// Point-in-time snapshot for enumeration and reporting
    pub fn info(&self) -> RetimerInfo {
        RetimerInfo {
            id: self.id,
            name: self.name.clone(),
            label: self.label(),
        }
    }

    fn lookup_label(&self) -> Option<Vec<u8>> {
        self.parent
            .upgrade()
            .and_then(|parent| parent.property(label::LABEL_PROPERTY))
    }
}

impl std::fmt::Debug for Retimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retimer")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Serializable snapshot of a registered handle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetimerInfo {
    pub id: RetimerId,
    pub name: String,
    pub label: String,
}

/// Generate the handle name for an identifier
fn retimer_name(id: RetimerId) -> String {
    format!("{}{}", NAME_PREFIX, id)
}

/// Recover the identifier encoded in a handle name.
///
/// Returns `None` unless the name is the prefix followed by decimal digits.
/// Used only at the unregister boundary where an opaque handle must be
/// matched back to registry state.
fn parse_name(name: &str) -> Option<RetimerId> {
    let digits = name.strip_prefix(NAME_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(RetimerId)
}

struct Inner {
    allocator: IdAllocator,
    handles: HashMap<RetimerId, Arc<Retimer>>,
}

/// Registry of live retimer handles.
///
/// Owns the identifier allocator and the namespace all handles are created
/// under. Callers construct one at subsystem initialization and drop it at
/// teardown; every handle registration and destruction happens in between.
/// A single internal lock serializes allocation and namespace changes, so
/// concurrent registrations never collide on an identifier or a name.
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                allocator: IdAllocator::new(),
                handles: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new retimer attached to `parent`.
    ///
    /// Acquires the smallest free identifier, creates the named handle under
    /// the registry namespace, and makes it visible to enumeration. On any
    /// failure the identifier is released again before the error is
    /// returned, so no identifier ever leaks.
    pub fn register(
        &self,
        parent: &Arc<dyn ParentDevice>,
    ) -> Result<Arc<Retimer>, RegistryError> {
        let mut inner = self.lock();
        let id = inner.allocator.acquire()?;
        let name = retimer_name(id);
        if inner.handles.contains_key(&id) {
            inner.allocator.release(id);
            return Err(RegistryError::RegistrationFailed(name));
        }
        let handle = Arc::new(Retimer {
            id,
            name,
            parent: Arc::downgrade(parent),
        });
        inner.handles.insert(id, handle.clone());
        debug!(id = %id, name = %handle.name, parent = %parent.name(), "Registered retimer");
        Ok(handle)
    }

    /// Unregister a handle previously returned by [`Registry::register`].
    ///
    /// The identifier is recovered from the handle's name; a name that does
    /// not decode, or that does not match the registered handle, is treated
    /// as a corruption signal: a diagnostic is logged and the registry is
    /// left unchanged. Otherwise the handle is removed from the namespace
    /// first and its identifier released after, so a concurrent `register`
    /// can never reuse the identifier of a still-visible handle.
    pub fn unregister(&self, handle: &Arc<Retimer>) {
        let id = match parse_name(handle.name()) {
            Some(id) => id,
            None => {
                warn!(
                    name = %handle.name(),
                    "Handle name does not encode an identifier, leaving it registered"
                );
                return;
            }
        };
        let mut inner = self.lock();
        match inner.handles.get(&id) {
            Some(registered) if Arc::ptr_eq(registered, handle) => {}
            _ => {
                warn!(
                    id = %id,
                    name = %handle.name(),
                    "Handle is not registered under its identifier, leaving registry unchanged"
                );
                return;
            }
        }
        inner.handles.remove(&id);
        inner.allocator.release(id);
        debug!(id = %id, "Unregistered retimer");
    }

    /// Get a registered handle by identifier
    pub fn get(&self, id: RetimerId) -> Option<Arc<Retimer>> {
        self.lock().handles.get(&id).cloned()
    }

    /// All currently registered handles
    pub fn retimers(&self) -> Vec<Arc<Retimer>> {
        self.lock().handles.values().cloned().collect()
    }

    /// Serializable snapshot of the registry, ordered by identifier
    pub fn snapshot(&self) -> Vec<RetimerInfo> {
        let mut infos: Vec<_> = self.lock().handles.values().map(|h| h.info()).collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Number of currently registered handles
    pub fn len(&self) -> usize {
        self.lock().handles.len()
    }

    /// Whether no handles are currently registered
    pub fn is_empty(&self) -> bool {
        self.lock().handles.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.get_mut() {
            if !inner.handles.is_empty() {
                warn!(
                    count = inner.handles.len(),
                    "Registry dropped with retimers still registered"
                );
            }
        }
    }
}
