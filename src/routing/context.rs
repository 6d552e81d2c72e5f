//! Per-call routing context.
//!
//! # Responsibilities
//! - Hold the shard index and table index decided for the current call
//! - Keep each concurrency unit's decision invisible to every other unit
//! - Offer explicit propagation to child tasks
//!
//! # Design Decisions
//! - Two storage tiers: a tokio task-local slot while a future runs inside
//!   [`RoutingContext::scope`] or [`RoutingContext::inherit`], and a
//!   thread-local slot otherwise. A task can move between worker threads at
//!   every `.await`, so async callers must not rely on the thread tier.
//! - No locks: a slot is only ever touched by the unit that owns it
//! - Shard and table are stored independently so administrative callers can
//!   set one without the other

use std::cell::RefCell;
use std::future::Future;

use serde::Serialize;

/// The resolved placement of one call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RoutingDecision {
    /// Zero-padded shard index, e.g. `"02"`.
    pub shard_index: String,

    /// Zero-padded table index, e.g. `"001"`. `None` when table routing is disabled.
    pub table_index: Option<String>,
}

impl RoutingDecision {
    pub fn new(shard_index: impl Into<String>, table_index: Option<String>) -> Self {
        Self {
            shard_index: shard_index.into(),
            table_index,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Slot {
    shard: Option<String>,
    table: Option<String>,
}

impl Slot {
    fn is_empty(&self) -> bool {
        self.shard.is_none() && self.table.is_none()
    }
}

/// Saved slot contents, used to restore an outer call's decision after a
/// nested call unwinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnapshot(Slot);

thread_local! {
    static THREAD_SLOT: RefCell<Slot> = RefCell::new(Slot::default());
}

tokio::task_local! {
    static TASK_SLOT: RefCell<Slot>;
}

fn with_slot<R>(f: impl FnOnce(&RefCell<Slot>) -> R) -> R {
    if TASK_SLOT.try_with(|_| ()).is_ok() {
        TASK_SLOT.with(f)
    } else {
        THREAD_SLOT.with(f)
    }
}

/// Accessor for the current unit's routing slot.
///
/// All methods are associated functions: the slot is implied by the caller's
/// thread or task.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingContext;

impl RoutingContext {
    /// Replace the current decision.
    pub fn set(decision: RoutingDecision) {
        with_slot(|slot| {
            *slot.borrow_mut() = Slot {
                shard: Some(decision.shard_index),
                table: decision.table_index,
            };
        });
    }

    /// The active decision, if a shard index is set.
    pub fn get() -> Option<RoutingDecision> {
        with_slot(|slot| {
            let slot = slot.borrow();
            slot.shard.as_ref().map(|shard| RoutingDecision {
                shard_index: shard.clone(),
                table_index: slot.table.clone(),
            })
        })
    }

    /// Remove any decision. Safe to call repeatedly or when nothing was set.
    pub fn clear() {
        with_slot(|slot| *slot.borrow_mut() = Slot::default());
    }

    pub fn set_shard_index(index: impl Into<String>) {
        let index = index.into();
        with_slot(|slot| slot.borrow_mut().shard = Some(index));
    }

    pub fn set_table_index(index: impl Into<String>) {
        let index = index.into();
        with_slot(|slot| slot.borrow_mut().table = Some(index));
    }

    pub fn shard_index() -> Option<String> {
        with_slot(|slot| slot.borrow().shard.clone())
    }

    pub fn table_index() -> Option<String> {
        with_slot(|slot| slot.borrow().table.clone())
    }

    /// True if either index is set.
    pub fn is_active() -> bool {
        with_slot(|slot| !slot.borrow().is_empty())
    }

    /// Capture the slot, or `None` when it is empty.
    pub fn snapshot() -> Option<ContextSnapshot> {
        with_slot(|slot| {
            let slot = slot.borrow();
            (!slot.is_empty()).then(|| ContextSnapshot(slot.clone()))
        })
    }

    /// Put back a previously captured slot.
    pub fn restore(snapshot: ContextSnapshot) {
        with_slot(|slot| *slot.borrow_mut() = snapshot.0);
    }

    /// Run `future` with its own empty slot.
    ///
    /// The slot is dropped together with the future, including when the
    /// future is cancelled.
    pub fn scope<F: Future>(future: F) -> impl Future<Output = F::Output> {
        TASK_SLOT.scope(RefCell::new(Slot::default()), future)
    }

    /// Run `future` with a copy of the caller's current slot.
    ///
    /// This is the only way a child task sees its parent's decision; a task
    /// spawned without it starts with no decision. The copy is taken when
    /// `inherit` is called, not when the future is first polled.
    pub fn inherit<F: Future>(future: F) -> impl Future<Output = F::Output> {
        let inherited = with_slot(|slot| slot.borrow().clone());
        TASK_SLOT.scope(RefCell::new(inherited), future)
    }
}
