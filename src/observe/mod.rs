// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Content-change observation.
//!
//! The detector turns raw surface mutations (insertions, removals, attribute and text changes at
//! any depth) into an edge-triggered dirty signal: exactly one event per clean-to-dirty
//! transition, however many mutations arrive before the session becomes clean again. The
//! observation substrate (tree observer, polling, diffing) lives in the surface glue; it only
//! has to call [`ChangeDetector::observe_mutation`].

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

/// Marker for the single clean-to-dirty edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyEdge;

#[derive(Debug)]
struct DetectorShared {
    armed: AtomicBool,
    suspend_depth: AtomicU32,
    events: mpsc::UnboundedSender<DirtyEdge>,
}

/// Edge-triggered dirty detector for the editable surface.
#[derive(Debug)]
pub struct ChangeDetector {
    shared: Arc<DetectorShared>,
    events: Option<mpsc::UnboundedReceiver<DirtyEdge>>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(DetectorShared {
                armed: AtomicBool::new(true),
                suspend_depth: AtomicU32::new(0),
                events: events_tx,
            }),
            events: Some(events_rx),
        }
    }

    /// The dirty-edge stream: lazy, infinite, non-restartable.
    ///
    /// The receiver exists once; a second call returns `None`.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<DirtyEdge>> {
        self.events.take()
    }

    /// Report one raw mutation of the surface.
    ///
    /// Suspended mutations are dropped; otherwise the first call after the last clean transition
    /// emits the edge and later calls coalesce into no-ops.
    pub fn observe_mutation(&self) {
        if self.shared.suspend_depth.load(Ordering::Acquire) > 0 {
            return;
        }
        if self.shared.armed.swap(false, Ordering::AcqRel) {
            let _ = self.shared.events.send(DirtyEdge);
        }
    }

    /// Re-arm the edge after the session became clean (load, save, remote sync).
    pub fn mark_clean(&self) {
        self.shared.armed.store(true, Ordering::Release);
    }

    /// Suspend observation for the duration of a programmatic content replacement.
    ///
    /// Mutations the session itself performs while applying a load or a remote sync are not
    /// local edits. Guards nest; dropping the last one resumes observation and treats the
    /// replaced content as the new clean baseline.
    pub fn suspend(&self) -> SuspendGuard {
        self.shared.suspend_depth.fetch_add(1, Ordering::AcqRel);
        SuspendGuard {
            shared: self.shared.clone(),
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.shared.suspend_depth.load(Ordering::Acquire) > 0
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Suspension handle returned by [`ChangeDetector::suspend`].
#[derive(Debug)]
pub struct SuspendGuard {
    shared: Arc<DetectorShared>,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        if self.shared.suspend_depth.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.armed.store(true, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ChangeDetector;

    #[test]
    fn coalesces_mutations_into_one_edge_per_clean_interval() {
        let mut detector = ChangeDetector::new();
        let mut events = detector.take_events().unwrap();

        detector.observe_mutation();
        detector.observe_mutation();
        detector.observe_mutation();

        events.try_recv().unwrap();
        events.try_recv().unwrap_err();

        detector.mark_clean();
        detector.observe_mutation();
        events.try_recv().unwrap();
        events.try_recv().unwrap_err();
    }

    #[test]
    fn the_event_stream_exists_once() {
        let mut detector = ChangeDetector::new();
        assert!(detector.take_events().is_some());
        assert!(detector.take_events().is_none());
    }

    #[test]
    fn suspended_mutations_never_fire() {
        let mut detector = ChangeDetector::new();
        let mut events = detector.take_events().unwrap();

        {
            let _guard = detector.suspend();
            detector.observe_mutation();
            detector.observe_mutation();
        }

        events.try_recv().unwrap_err();
    }

    #[test]
    fn resume_rearms_even_when_the_edge_already_fired() {
        let mut detector = ChangeDetector::new();
        let mut events = detector.take_events().unwrap();

        detector.observe_mutation();
        events.try_recv().unwrap();

        // Programmatic replacement; the result is the new clean baseline.
        drop(detector.suspend());

        detector.observe_mutation();
        events.try_recv().unwrap();
    }

    #[test]
    fn suspension_nests() {
        let mut detector = ChangeDetector::new();
        let mut events = detector.take_events().unwrap();

        let outer = detector.suspend();
        let inner = detector.suspend();
        drop(inner);
        assert!(detector.is_suspended());
        detector.observe_mutation();
        drop(outer);
        assert!(!detector.is_suspended());

        events.try_recv().unwrap_err();
        detector.observe_mutation();
        events.try_recv().unwrap();
    }
}
