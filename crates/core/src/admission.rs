// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Ordered admissibility rules for a booking. The first failing rule wins.

use crate::context::{SessionSnapshot, StudentSnapshot};
use crate::rejection::{BookingRejection, MissingPrerequisites};
use crate::resolve::{EffectiveSubject, resolve_effective_subject};
use aula_domain::{
    CampusType, Catalog, DeliveryMode, SessionEnrollment, Subject, SubjectCategory,
    active_enrollments, effective_end_date, intervals_overlap, is_completed, is_frozen_on,
};
use std::collections::BTreeSet;
use time::PrimitiveDateTime;

/// Outcome of a successful admissibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingDecision {
    /// The student already holds this session; the existing line is reused.
    AlreadyBooked {
        line_id: i64,
        effective_subject_id: i64,
    },
    /// The booking may be committed.
    Admit {
        effective: EffectiveSubject,
        /// An earlier enrollment in the session to re-activate.
        existing_enrollment: Option<SessionEnrollment>,
    },
}

/// Checks whether `student` may book `snapshot.session` at `now`.
///
/// Portal gates (forced password change, profile state, freezes, ended
/// enrollments) are checked first, then:
/// 1. already booked (idempotent success)
/// 2. capacity
/// 3. liveness
/// 4. delivery mode
/// 5. audience window
/// 6. no repetition
/// 7. prerequisites
/// 8. time conflicts
/// 9. unit ordering
///
/// # Errors
///
/// Returns the rejection of the first rule that fails.
pub fn evaluate_booking(
    catalog: &Catalog,
    student: &StudentSnapshot,
    snapshot: &SessionSnapshot,
    now: PrimitiveDateTime,
) -> Result<BookingDecision, BookingRejection> {
    let session = &snapshot.session;

    check_portal_gates(student, snapshot)?;

    if let Some(line) = student.line_for_session(session.id) {
        return Ok(BookingDecision::AlreadyBooked {
            line_id: line.line_id,
            effective_subject_id: line.effective_subject_id,
        });
    }
    if let Some(enrollment) = &snapshot.student_enrollment
        && enrollment.state.is_terminal()
    {
        return Err(BookingRejection::not_bookable(
            "attendance is already recorded for this session",
        ));
    }

    if !session.has_seat_for(snapshot.seats_held_by_others) {
        return Err(BookingRejection::NoCapacity);
    }

    check_liveness(snapshot, now)?;

    let effective = resolve_effective_subject(catalog, student, session)?;
    let subject = catalog
        .subject(effective.subject_id)
        .ok_or_else(|| BookingRejection::no_subject("unknown subject"))?;

    check_delivery_mode(student, snapshot, subject)?;
    check_audience(catalog, student, snapshot, subject)?;

    if is_completed(&student.history, subject.id) && !session.is_repeatable() {
        return Err(BookingRejection::AlreadyCompleted {
            subject: subject.display_name().to_string(),
        });
    }

    check_prerequisites(catalog, student, session.program_id, subject)?;
    check_time_conflicts(catalog, student, snapshot)?;
    check_unit_ordering(catalog, student, snapshot, subject)?;

    Ok(BookingDecision::Admit {
        effective,
        existing_enrollment: snapshot.student_enrollment.clone(),
    })
}

fn check_portal_gates(
    student: &StudentSnapshot,
    snapshot: &SessionSnapshot,
) -> Result<(), BookingRejection> {
    if student.must_change_password {
        return Err(BookingRejection::PasswordChangeRequired);
    }
    if let Some(profile) = &student.profile
        && !profile.can_schedule
    {
        return Err(BookingRejection::PermissionDenied {
            reason: format!("profile state '{}' does not allow scheduling", profile.name),
        });
    }
    if is_frozen_on(&student.freezes, snapshot.session.date) {
        return Err(BookingRejection::PermissionDenied {
            reason: String::from("enrollment frozen"),
        });
    }
    let active = active_enrollments(&student.enrollments);
    let expired = !active.is_empty()
        && active.iter().all(|e| {
            effective_end_date(e, &student.freezes).is_some_and(|end| end < snapshot.session.date)
        });
    if expired {
        return Err(BookingRejection::PermissionDenied {
            reason: String::from("enrollment ended before the session date"),
        });
    }
    Ok(())
}

fn check_liveness(snapshot: &SessionSnapshot, now: PrimitiveDateTime) -> Result<(), BookingRejection> {
    let session = &snapshot.session;
    if !session.is_published {
        return Err(BookingRejection::not_bookable("session is not published"));
    }
    if !session.active {
        return Err(BookingRejection::not_bookable("session is inactive"));
    }
    if !session.state.is_bookable() {
        return Err(BookingRejection::SessionNotBookable {
            reason: format!("session is {}", session.state),
        });
    }
    if session.datetime_start() <= now {
        return Err(BookingRejection::not_bookable("session already started"));
    }
    Ok(())
}

fn check_delivery_mode(
    student: &StudentSnapshot,
    snapshot: &SessionSnapshot,
    subject: &Subject,
) -> Result<(), BookingRejection> {
    let session_mode = snapshot.session.delivery_mode;
    let mismatch = |reason: &str| {
        Err(BookingRejection::DeliveryModeMismatch {
            reason: reason.to_string(),
        })
    };
    match student.student.preferred_delivery_mode {
        // B-checks and oral tests are held online for everyone.
        DeliveryMode::Presential
            if matches!(
                subject.category,
                SubjectCategory::BCheck | SubjectCategory::OralTest
            ) =>
        {
            Ok(())
        }
        DeliveryMode::Presential => {
            if session_mode == DeliveryMode::Virtual {
                return mismatch("presential students cannot book virtual sessions");
            }
            if snapshot.campus.campus_type == CampusType::Online {
                return mismatch("presential students cannot book on the online campus");
            }
            Ok(())
        }
        DeliveryMode::Virtual => {
            if session_mode == DeliveryMode::Presential {
                return mismatch("virtual students cannot book presential sessions");
            }
            Ok(())
        }
        DeliveryMode::Hybrid => Ok(()),
    }
}

fn check_audience(
    catalog: &Catalog,
    student: &StudentSnapshot,
    snapshot: &SessionSnapshot,
    subject: &Subject,
) -> Result<(), BookingRejection> {
    let session = &snapshot.session;
    let unit = student.current_unit(catalog);
    let (from, to) = match subject.category {
        SubjectCategory::OralTest => match session.audience_unit_to {
            Some(to) => (to, to.saturating_add(1)),
            None => return Ok(()),
        },
        _ => (
            session.audience_unit_from.unwrap_or(0),
            session.audience_unit_to.unwrap_or(u32::MAX),
        ),
    };
    if unit < from || unit > to {
        return Err(BookingRejection::AudienceOutOfRange { unit, from, to });
    }
    Ok(())
}

/// Subject ids interchangeable with `subject` in the program.
fn equivalent_ids(catalog: &Catalog, subject: &Subject, program_id: i64) -> BTreeSet<i64> {
    catalog
        .equivalents_of(subject, program_id)
        .into_iter()
        .map(|s| s.id)
        .collect()
}

fn check_prerequisites(
    catalog: &Catalog,
    student: &StudentSnapshot,
    program_id: i64,
    subject: &Subject,
) -> Result<(), BookingRejection> {
    let mut missing = MissingPrerequisites::default();
    for prerequisite in catalog.prerequisites_of(subject.id) {
        let equivalents = equivalent_ids(catalog, prerequisite, program_id);
        let attended = equivalents.iter().any(|id| is_completed(&student.history, *id));
        let booked = prerequisite.is_prerequisite()
            && student
                .lines
                .iter()
                .any(|l| l.is_live() && equivalents.contains(&l.effective_subject_id));
        if attended || booked {
            continue;
        }
        match prerequisite.unit_number {
            Some(unit) if prerequisite.category == SubjectCategory::BSkills => {
                missing.bskill_units.push(unit);
            }
            Some(unit) if prerequisite.is_prerequisite() => missing.bcheck_units.push(unit),
            _ => missing.other.push(prerequisite.display_name().to_string()),
        }
    }
    if missing.is_empty() {
        return Ok(());
    }
    missing.bcheck_units.sort_unstable();
    missing.bcheck_units.dedup();
    missing.bskill_units.sort_unstable();
    missing.bskill_units.dedup();
    Err(BookingRejection::MissingPrerequisites(missing))
}

fn check_time_conflicts(
    catalog: &Catalog,
    student: &StudentSnapshot,
    snapshot: &SessionSnapshot,
) -> Result<(), BookingRejection> {
    let session = &snapshot.session;
    let conflict = student.lines.iter().find(|l| {
        l.is_live()
            && l.session_id != session.id
            && intervals_overlap(
                l.start,
                l.end,
                session.datetime_start(),
                session.datetime_end(),
            )
    });
    if let Some(line) = conflict {
        let subject = catalog
            .subject(line.effective_subject_id)
            .map_or_else(|| String::from("another class"), |s| s.display_name().to_string());
        return Err(BookingRejection::TimeConflict {
            line_id: line.line_id,
            subject,
            start: line.start.to_string(),
        });
    }
    Ok(())
}

fn check_unit_ordering(
    catalog: &Catalog,
    student: &StudentSnapshot,
    snapshot: &SessionSnapshot,
    subject: &Subject,
) -> Result<(), BookingRejection> {
    if subject.category != SubjectCategory::BSkills {
        return Ok(());
    }
    let Some(unit) = subject.unit_number else {
        return Ok(());
    };
    let session = &snapshot.session;
    let plan_id = student.program_plan(catalog).and_then(|pp| pp.plan_id);
    let Some(bcheck) = catalog.bcheck_for_unit(session.program_id, plan_id, unit) else {
        return Ok(());
    };
    let equivalents = equivalent_ids(catalog, bcheck, session.program_id);
    let attended = equivalents.iter().any(|id| is_completed(&student.history, *id));
    let booked_earlier = student.lines.iter().any(|l| {
        l.is_live()
            && equivalents.contains(&l.effective_subject_id)
            && l.start < session.datetime_start()
    });
    if attended || booked_earlier {
        return Ok(());
    }
    Err(BookingRejection::UnitOrderingViolation { unit })
}
