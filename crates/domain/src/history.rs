// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Academic history and the progression rules derived from it.

use crate::catalog::Catalog;
use crate::types::{AttendanceStatus, DeliveryMode, Novedad, SubjectCategory};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use time::{Date, PrimitiveDateTime, Time};

/// Number of attended skills that, with the B-check, complete a unit.
pub const BSKILLS_TO_COMPLETE_UNIT: usize = 4;

/// The immutable projection of one student's outcome in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub student_id: i64,
    pub session_id: Option<i64>,
    pub enrollment_id: Option<i64>,
    pub session_date: Date,
    pub session_time_start: Time,
    pub session_time_end: Time,
    pub program_id: i64,
    pub plan_id: Option<i64>,
    pub phase_id: Option<i64>,
    pub level_id: Option<i64>,
    pub subject_id: i64,
    pub teacher_id: Option<i64>,
    pub campus_id: Option<i64>,
    pub delivery_mode: DeliveryMode,
    pub attendance_status: AttendanceStatus,
    pub novedad: Novedad,
    pub notes: Option<String>,
    pub grade: Option<f64>,
    pub created_at: PrimitiveDateTime,
}

/// A correction layered over an immutable history row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryAmendment {
    pub id: i64,
    pub history_id: i64,
    pub attendance_status: Option<AttendanceStatus>,
    pub novedad: Option<Novedad>,
    pub grade: Option<f64>,
    pub reason: String,
    pub created_at: PrimitiveDateTime,
}

impl HistoryRecord {
    /// Returns this row as seen through its amendments, oldest applied first.
    #[must_use]
    pub fn amended(&self, amendments: &[HistoryAmendment]) -> Self {
        let mut ours: Vec<&HistoryAmendment> =
            amendments.iter().filter(|a| a.history_id == self.id).collect();
        ours.sort_by_key(|a| (a.created_at, a.id));

        let mut record = self.clone();
        for amendment in ours {
            if let Some(status) = amendment.attendance_status {
                record.attendance_status = status;
            }
            if let Some(novedad) = amendment.novedad {
                record.novedad = novedad;
            }
            if amendment.grade.is_some() {
                record.grade = amendment.grade;
            }
        }
        record
    }

    #[must_use]
    pub fn is_attended(&self) -> bool {
        self.attendance_status == AttendanceStatus::Attended
    }
}

/// Applies amendments to every row.
#[must_use]
pub fn apply_amendments(
    history: &[HistoryRecord],
    amendments: &[HistoryAmendment],
) -> Vec<HistoryRecord> {
    history.iter().map(|h| h.amended(amendments)).collect()
}

/// A subject is completed exactly when an attended row exists for it.
#[must_use]
pub fn is_completed(history: &[HistoryRecord], subject_id: i64) -> bool {
    history
        .iter()
        .any(|h| h.subject_id == subject_id && h.is_attended())
}

/// Subjects with at least one attended row.
#[must_use]
pub fn attended_subjects(history: &[HistoryRecord]) -> BTreeSet<i64> {
    history
        .iter()
        .filter(|h| h.is_attended())
        .map(|h| h.subject_id)
        .collect()
}

#[derive(Debug, Default)]
struct UnitTally {
    bcheck_attended: bool,
    bskills_attended: BTreeSet<i64>,
}

impl UnitTally {
    fn is_complete(&self) -> bool {
        self.bcheck_attended && self.bskills_attended.len() >= BSKILLS_TO_COMPLETE_UNIT
    }
}

fn tally_units(history: &[HistoryRecord], catalog: &Catalog) -> BTreeMap<u32, UnitTally> {
    let mut units: BTreeMap<u32, UnitTally> = BTreeMap::new();
    for row in history.iter().filter(|h| h.is_attended()) {
        let Some(subject) = catalog.subject(row.subject_id) else {
            continue;
        };
        if subject.category == SubjectCategory::Placement {
            continue;
        }
        let Some(unit) = subject.unit_number else {
            continue;
        };
        let tally = units.entry(unit).or_default();
        match subject.category {
            SubjectCategory::BCheck => tally.bcheck_attended = true,
            SubjectCategory::BSkills => {
                tally.bskills_attended.insert(subject.id);
            }
            _ => {}
        }
    }
    units
}

/// Derives a student's current unit from attended history.
///
/// A unit is started when it has an attended row and complete when its
/// B-check and at least four skills were attended. If every started unit is
/// complete the student is on the next one; otherwise on the highest started
/// unit. With no history the student sits on `floor`, which is the
/// placement level's first unit (or 1).
#[must_use]
pub fn current_unit(history: &[HistoryRecord], catalog: &Catalog, floor: u32) -> u32 {
    let floor = floor.max(1);
    let units = tally_units(history, catalog);
    let Some(max_started) = units.keys().next_back().copied() else {
        return floor;
    };
    let derived = if units.values().all(UnitTally::is_complete) {
        max_started + 1
    } else {
        max_started
    };
    derived.max(floor)
}

/// Units with an attended B-check and enough skills.
#[must_use]
pub fn completed_units(history: &[HistoryRecord], catalog: &Catalog) -> BTreeSet<u32> {
    tally_units(history, catalog)
        .into_iter()
        .filter(|(_, tally)| tally.is_complete())
        .map(|(unit, _)| unit)
        .collect()
}

/// Picks the unit whose B-check a `pair` template should resolve to.
///
/// Scanning B-checks in ascending unit order (units below `floor` are
/// treated as cleared by placement): the first one with an absence and no
/// attendance is the recovery unit; otherwise the first one never attended.
#[must_use]
pub fn pending_bcheck_unit(
    history: &[HistoryRecord],
    catalog: &Catalog,
    program_id: i64,
    plan_id: Option<i64>,
    floor: u32,
) -> Option<u32> {
    let bchecks = catalog.bchecks_ascending(program_id, plan_id);
    let candidates: Vec<(u32, i64)> = bchecks
        .iter()
        .filter_map(|s| s.unit_number.map(|u| (u, s.id)))
        .filter(|(unit, _)| *unit >= floor)
        .collect();

    let outcome_for = |subject_id: i64, status: AttendanceStatus| {
        let equivalents: BTreeSet<i64> = catalog.subject(subject_id).map_or_else(BTreeSet::new, |s| {
            catalog
                .equivalents_of(s, program_id)
                .into_iter()
                .map(|e| e.id)
                .collect()
        });
        history
            .iter()
            .any(|h| equivalents.contains(&h.subject_id) && h.attendance_status == status)
    };

    let recovery = candidates.iter().find(|(_, id)| {
        outcome_for(*id, AttendanceStatus::Absent) && !outcome_for(*id, AttendanceStatus::Attended)
    });
    if let Some((unit, _)) = recovery {
        return Some(*unit);
    }
    candidates
        .iter()
        .find(|(_, id)| !outcome_for(*id, AttendanceStatus::Attended))
        .map(|(unit, _)| *unit)
}

/// Per-subject progress line shown on the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCompletion {
    pub subject_id: i64,
    pub name: String,
    pub category: SubjectCategory,
    pub unit_number: Option<u32>,
    pub completed: bool,
}

/// Summary of a student's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub current_unit: u32,
    pub attended: usize,
    pub absent: usize,
    pub pending: usize,
    pub completed_units: Vec<u32>,
    pub subjects: Vec<SubjectCompletion>,
}

/// Builds the progress summary for a student in a program and plan.
#[must_use]
pub fn progress_summary(
    history: &[HistoryRecord],
    catalog: &Catalog,
    program_id: i64,
    plan_id: Option<i64>,
    floor: u32,
) -> ProgressSummary {
    let count = |status: AttendanceStatus| {
        history
            .iter()
            .filter(|h| h.attendance_status == status)
            .count()
    };
    let attended = attended_subjects(history);
    let subjects = catalog
        .subjects_for(program_id, plan_id)
        .into_iter()
        .filter(|s| s.category != SubjectCategory::Placement)
        .map(|s| SubjectCompletion {
            subject_id: s.id,
            name: s.display_name().to_string(),
            category: s.category,
            unit_number: s.unit_number,
            completed: attended.contains(&s.id),
        })
        .collect();
    ProgressSummary {
        current_unit: current_unit(history, catalog, floor),
        attended: count(AttendanceStatus::Attended),
        absent: count(AttendanceStatus::Absent),
        pending: count(AttendanceStatus::Pending),
        completed_units: completed_units(history, catalog).into_iter().collect(),
        subjects,
    }
}
