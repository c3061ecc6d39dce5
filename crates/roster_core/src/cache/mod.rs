//! Memoized compliance scans keyed on a structural hash of the inputs.
//!
//! A hit is only served when the SHA-256 of the canonical JSON of snapshot + settings matches
//! the cached scan, so the output is always identical to a fresh [`detect_violations`] call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use sha2::{Digest, Sha256};

use crate::compliance::detect_violations;
use crate::domain::{Person, RosterSnapshot, Severity, Shift, Violation, ViolationType};
use crate::error::AppError;
use crate::settings::ComplianceSettings;

/// A violation with its borrows replaced by positions in the snapshot it came from.
#[derive(Debug, Clone)]
struct CachedViolation {
    id: String,
    kind: ViolationType,
    person_idx: usize,
    shift_idxs: Vec<usize>,
    details: String,
    severity: Severity,
    timestamp: i64,
}

struct CachedScan {
    data_hash: String,
    violations: Vec<CachedViolation>,
}

#[derive(Default)]
struct CacheState {
    scan: Option<CachedScan>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cached: bool,
    pub hits: u64,
    pub misses: u64,
}

/// Single-entry cache for the latest scan. Safe to share across threads.
#[derive(Default)]
pub struct ViolationCache {
    state: Mutex<CacheState>,
}

/// SHA-256 (hex) of the canonical JSON encoding of the detector inputs.
pub fn snapshot_hash(
    snapshot: &RosterSnapshot,
    settings: &ComplianceSettings,
) -> Result<String, AppError> {
    let mut hasher = Sha256::new();
    for part in [
        serde_json::to_vec(snapshot),
        serde_json::to_vec(settings),
    ] {
        let bytes = part.map_err(|e| {
            AppError::new("CACHE_HASH_FAILED", "Failed to encode scan inputs for hashing")
                .with_details(e.to_string())
        })?;
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn dehydrate(
    violations: &[Violation<'_>],
    snapshot: &RosterSnapshot,
) -> Option<Vec<CachedViolation>> {
    let people: HashMap<*const Person, usize> = snapshot
        .people
        .iter()
        .enumerate()
        .map(|(idx, p)| (p as *const Person, idx))
        .collect();
    let shifts: HashMap<*const Shift, usize> = snapshot
        .shifts
        .iter()
        .enumerate()
        .map(|(idx, s)| (s as *const Shift, idx))
        .collect();

    violations
        .iter()
        .map(|v| {
            let person_idx = *people.get(&(v.person as *const Person))?;
            let shift_idxs = v
                .shifts
                .iter()
                .map(|s| shifts.get(&(*s as *const Shift)).copied())
                .collect::<Option<Vec<_>>>()?;
            Some(CachedViolation {
                id: v.id.clone(),
                kind: v.kind,
                person_idx,
                shift_idxs,
                details: v.details.clone(),
                severity: v.severity,
                timestamp: v.timestamp,
            })
        })
        .collect()
}

fn rehydrate<'a>(scan: &CachedScan, snapshot: &'a RosterSnapshot) -> Option<Vec<Violation<'a>>> {
    scan.violations
        .iter()
        .map(|c| {
            Some(Violation {
                id: c.id.clone(),
                kind: c.kind,
                person: snapshot.people.get(c.person_idx)?,
                shifts: c
                    .shift_idxs
                    .iter()
                    .map(|idx| snapshot.shifts.get(*idx))
                    .collect::<Option<Vec<_>>>()?,
                details: c.details.clone(),
                severity: c.severity,
                timestamp: c.timestamp,
            })
        })
        .collect()
}

impl ViolationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Same result as [`detect_violations`], served from cache when the inputs are unchanged.
    pub fn detect<'a>(
        &self,
        snapshot: &'a RosterSnapshot,
        settings: &ComplianceSettings,
    ) -> Result<Vec<Violation<'a>>, AppError> {
        let hash = snapshot_hash(snapshot, settings)?;
        let mut state = self.lock();

        let cached = state
            .scan
            .as_ref()
            .filter(|scan| scan.data_hash == hash)
            .and_then(|scan| rehydrate(scan, snapshot));
        if let Some(violations) = cached {
            state.hits += 1;
            tracing::debug!(hash = %hash, "compliance cache hit");
            return Ok(violations);
        }

        state.misses += 1;
        let violations = detect_violations(snapshot, settings);
        state.scan = dehydrate(&violations, snapshot).map(|cached| CachedScan {
            data_hash: hash,
            violations: cached,
        });
        Ok(violations)
    }

    pub fn invalidate(&self) {
        self.lock().scan = None;
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            cached: state.scan.is_some(),
            hits: state.hits,
            misses: state.misses,
        }
    }
}
