//! Combat logging
//!
//! Records what spells did, for headless summaries and post-run analysis.

use bevy::prelude::*;

/// A single entry in the combat log
#[derive(Debug, Clone)]
pub struct CombatLogEntry {
    /// Timestamp in simulation time (seconds since start)
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatLogEventType {
    /// A charge or channel began
    CastStarted,
    /// A spell resolved or conjured its body
    SpellCast,
    /// A cast was attempted without enough mana
    CastFailed,
    /// A charge or channel ended without resolving
    CastInterrupted,
    /// A conjured body delivered its spell
    BodyImpact,
    /// A conjured body despawned
    BodyExpired,
    /// A status wore off
    StatusExpired,
    /// Combatant died
    Death,
    /// Simulation event (start, end, etc.)
    MatchEvent,
}

/// The combat log resource storing all events
#[derive(Resource, Clone, Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current simulation time
    pub match_time: f32,
}

impl CombatLog {
    /// Clear the log for a new run
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time = 0.0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn count(&self, event_type: CombatLogEventType) -> usize {
        self.entries.iter().filter(|e| e.event_type == event_type).count()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// One "[  1.25] message" line per entry.
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("[{:>7.2}] {}", e.timestamp, e.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
