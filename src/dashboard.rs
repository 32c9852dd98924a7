//! Doctor dashboard — appointment administration.
//!
//! Presents the full appointment collection to an authorized doctor,
//! supports filtering, drives status transitions and deletion, and
//! keeps aggregate counts current. The store owns every record; the
//! `DashboardState` here is a read cache reconciled after each
//! successful write, never written optimistically.
//!
//! A background poll and user-triggered actions may be in flight at
//! the same time. Competing refreshes resolve by sequence number: each
//! fetch is tagged when it starts, and a response carrying a stale tag
//! is discarded, so reordered arrivals cannot regress the view.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config;
use crate::models::{Appointment, AppointmentFilter, AppointmentStats, AppointmentStatus};
use crate::store::{DocumentStore, OrderBy, StoreError};

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cannot move a {from} appointment to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("No appointment with id {id} in the current view")]
    UnknownAppointment { id: String },

    #[error("Internal lock error")]
    LockPoisoned,
}

// ─── Retrieval ────────────────────────────────────────────────────────────────

/// The full collection, newest first. Descending creation order is
/// part of the dashboard contract, not a display preference.
pub async fn fetch_appointments<S: DocumentStore>(
    store: &S,
) -> Result<Vec<Appointment>, DashboardError> {
    let docs = store
        .query(
            config::APPOINTMENTS_COLLECTION,
            &[],
            Some(&OrderBy::desc("created_at")),
        )
        .await?;

    docs.into_iter()
        .map(|doc| Appointment::from_document(doc).map_err(DashboardError::from))
        .collect()
}

/// Status counts over the whole collection — its own full scan, kept
/// separate from the ordered list fetch so either can be re-run alone.
pub async fn fetch_stats<S: DocumentStore>(store: &S) -> Result<AppointmentStats, DashboardError> {
    let docs = store
        .query(config::APPOINTMENTS_COLLECTION, &[], None)
        .await?;

    let mut stats = AppointmentStats::default();
    for doc in docs {
        let appointment = Appointment::from_document(doc)?;
        stats.record(appointment.status);
    }
    Ok(stats)
}

// ─── State container ──────────────────────────────────────────────────────────

/// Everything the dashboard shows: the cached collection, derived
/// stats and the active filters. Mutated only through `apply`, which
/// is pure — no I/O, no clock reads, deterministic per event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    appointments: Vec<Appointment>,
    stats: AppointmentStats,
    filter: AppointmentFilter,
    last_applied_seq: u64,
    last_refreshed_at: Option<DateTime<Utc>>,
}

/// State transitions applied by [`DashboardState::apply`].
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// A full refresh resolved. `seq` orders competing refreshes.
    Loaded {
        seq: u64,
        appointments: Vec<Appointment>,
        stats: AppointmentStats,
        at: DateTime<Utc>,
    },
    /// One appointment's status change was accepted by the store.
    StatusChanged {
        id: String,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    },
    /// One appointment was removed from the store.
    Deleted { id: String },
    /// A standalone stats scan resolved.
    StatsRefreshed(AppointmentStats),
    FilterChanged(AppointmentFilter),
    FiltersCleared,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn stats(&self) -> AppointmentStats {
        self.stats
    }

    pub fn filter(&self) -> &AppointmentFilter {
        &self.filter
    }

    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed_at
    }

    /// The cached collection narrowed by the active filters.
    pub fn visible(&self) -> Vec<Appointment> {
        self.filter.apply(&self.appointments)
    }

    pub fn apply(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::Loaded {
                seq,
                appointments,
                stats,
                at,
            } => {
                if seq <= self.last_applied_seq {
                    tracing::debug!(
                        seq,
                        applied = self.last_applied_seq,
                        "discarding stale refresh response"
                    );
                    return;
                }
                self.last_applied_seq = seq;
                self.appointments = appointments;
                self.stats = stats;
                self.last_refreshed_at = Some(at);
            }
            DashboardEvent::StatusChanged {
                id,
                status,
                updated_at,
            } => {
                if let Some(appointment) = self.appointments.iter_mut().find(|a| a.id == id) {
                    appointment.status = status;
                    appointment.updated_at = updated_at;
                }
            }
            DashboardEvent::Deleted { id } => {
                self.appointments.retain(|a| a.id != id);
            }
            DashboardEvent::StatsRefreshed(stats) => {
                self.stats = stats;
            }
            DashboardEvent::FilterChanged(filter) => {
                self.filter = filter;
            }
            DashboardEvent::FiltersCleared => {
                self.filter = AppointmentFilter::default();
            }
        }
    }
}

// ─── Confirmation token ───────────────────────────────────────────────────────

/// Proof that the operator confirmed an irreversible delete. The
/// calling surface constructs one only from an explicit confirmation
/// step; `Dashboard::delete` will not run without it.
#[derive(Debug, Clone, Copy)]
pub struct DeleteConfirmation;

// ─── Dashboard service ────────────────────────────────────────────────────────

/// Doctor-facing operations over the shared store.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and no
/// lock is held across a store call.
pub struct Dashboard<S> {
    store: Arc<S>,
    state: Mutex<DashboardState>,
    refresh_seq: AtomicU64,
}

impl<S: DocumentStore> Dashboard<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: Mutex::new(DashboardState::new()),
            refresh_seq: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, DashboardState>, DashboardError> {
        self.state.lock().map_err(|_| DashboardError::LockPoisoned)
    }

    fn apply(&self, event: DashboardEvent) -> Result<(), DashboardError> {
        self.lock()?.apply(event);
        Ok(())
    }

    /// Snapshot of the current view state.
    pub fn state(&self) -> Result<DashboardState, DashboardError> {
        Ok(self.lock()?.clone())
    }

    /// The cached collection narrowed by the active filters.
    pub fn visible_appointments(&self) -> Result<Vec<Appointment>, DashboardError> {
        Ok(self.lock()?.visible())
    }

    pub fn set_filter(&self, filter: AppointmentFilter) -> Result<(), DashboardError> {
        self.apply(DashboardEvent::FilterChanged(filter))
    }

    pub fn clear_filters(&self) -> Result<(), DashboardError> {
        self.apply(DashboardEvent::FiltersCleared)
    }

    /// Fetches the collection and the stats together and reconciles
    /// the cache. Works for both the manual refresh button and the
    /// background poll; whichever refresh started last wins, even if
    /// its response arrives first.
    pub async fn refresh(&self) -> Result<(), DashboardError> {
        let seq = self.refresh_seq.fetch_add(1, Ordering::Relaxed) + 1;

        let (appointments, stats) = tokio::try_join!(
            fetch_appointments(self.store.as_ref()),
            fetch_stats(self.store.as_ref()),
        )?;

        self.apply(DashboardEvent::Loaded {
            seq,
            appointments,
            stats,
            at: Utc::now(),
        })
    }

    /// Persists a status change, then reconciles the cache and stats.
    ///
    /// The transition table is consulted before anything is written,
    /// so no caller can move an appointment along an edge the workflow
    /// does not define. Local state changes only after the store
    /// accepts the write.
    pub async fn update_status(
        &self,
        id: &str,
        target: AppointmentStatus,
    ) -> Result<(), DashboardError> {
        let current = self.current_status(id)?;
        if !current.can_transition_to(target) {
            return Err(DashboardError::InvalidTransition {
                from: current,
                to: target,
            });
        }

        let now = Utc::now();
        let patch = json!({
            "status": target,
            "updated_at": now.timestamp_micros(),
        });
        self.store
            .update(config::APPOINTMENTS_COLLECTION, id, patch)
            .await?;

        self.apply(DashboardEvent::StatusChanged {
            id: id.to_string(),
            status: target,
            updated_at: now,
        })?;
        self.refresh_stats_best_effort().await;

        tracing::info!(appointment_id = %id, from = %current, to = %target, "appointment status updated");
        Ok(())
    }

    /// Removes one appointment for good. The confirmation token keeps
    /// the operator's explicit yes in the call chain.
    pub async fn delete(
        &self,
        id: &str,
        _confirmed: DeleteConfirmation,
    ) -> Result<(), DashboardError> {
        self.store
            .delete(config::APPOINTMENTS_COLLECTION, id)
            .await?;

        self.apply(DashboardEvent::Deleted { id: id.to_string() })?;
        self.refresh_stats_best_effort().await;

        tracing::info!(appointment_id = %id, "appointment deleted");
        Ok(())
    }

    fn current_status(&self, id: &str) -> Result<AppointmentStatus, DashboardError> {
        self.lock()?
            .appointments
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.status)
            .ok_or_else(|| DashboardError::UnknownAppointment { id: id.to_string() })
    }

    /// Stats re-scan after a mutation. A failure here leaves the
    /// counts stale, not the data wrong; the next refresh heals it.
    async fn refresh_stats_best_effort(&self) {
        match fetch_stats(self.store.as_ref()).await {
            Ok(stats) => {
                if self.apply(DashboardEvent::StatsRefreshed(stats)).is_err() {
                    tracing::warn!("state lock poisoned while refreshing stats");
                }
            }
            Err(error) => {
                tracing::warn!(%error, "stats refresh failed; counts stale until next refresh");
            }
        }
    }
}

// ─── Background refresh ───────────────────────────────────────────────────────

/// Keeps the poll task alive. Dropping the handle aborts the task, so
/// a torn-down dashboard cannot keep writing to its state.
pub struct AutoRefreshHandle {
    handle: JoinHandle<()>,
}

impl AutoRefreshHandle {
    pub fn stop(self) {}
}

impl Drop for AutoRefreshHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns the periodic silent refresh. The first fetch is left to the
/// caller (the initial load), the task only covers subsequent ticks.
/// A failed tick logs and waits for the next one; nothing retries
/// early.
pub fn spawn_auto_refresh<S>(dashboard: Arc<Dashboard<S>>, period: Duration) -> AutoRefreshHandle
where
    S: DocumentStore + 'static,
{
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // consume the immediate first tick

        loop {
            interval.tick().await;
            if let Err(error) = dashboard.refresh().await {
                tracing::warn!(%error, "background refresh failed; will retry next tick");
            }
        }
    });

    AutoRefreshHandle { handle }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
