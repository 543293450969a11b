// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::context::StudentSnapshot;
use crate::rejection::BookingRejection;
use aula_domain::{Catalog, ClassSession, MappingMode, pending_bcheck_unit};

/// The concrete subject a booking consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveSubject {
    pub subject_id: i64,
    pub unit_number: Option<u32>,
}

/// Resolves which catalog subject `student` would consume in `session`.
///
/// Template sessions map per student:
/// - `per_unit`: the skill of the current unit with the template's skill number
/// - `pair`: the B-check of the recovery unit, or the next pending one
/// - `block`: the oral test whose block brackets the current unit
///
/// Direct sessions must name a subject of the student's program, and of the
/// student's plan when the subject is plan-restricted.
///
/// # Errors
///
/// Returns `NoEffectiveSubject` when no subject can be resolved, including
/// when the student has no enrollment in the session's program.
pub fn resolve_effective_subject(
    catalog: &Catalog,
    student: &StudentSnapshot,
    session: &ClassSession,
) -> Result<EffectiveSubject, BookingRejection> {
    let program_plan = student
        .program_plan(catalog)
        .filter(|pp| pp.program_id == session.program_id)
        .ok_or_else(|| BookingRejection::no_subject("no matching enrollment"))?;
    let (program_id, plan_id) = (program_plan.program_id, program_plan.plan_id);

    if let Some(template_id) = session.template_id {
        let template = catalog
            .template(template_id)
            .ok_or_else(|| BookingRejection::no_subject("unknown session template"))?;
        let unit = student.current_unit(catalog);
        let subject = match template.mapping_mode {
            MappingMode::PerUnit => {
                let number = template.skill_number.ok_or_else(|| {
                    BookingRejection::no_subject("template has no skill number")
                })?;
                catalog.bskill_for_unit(program_id, plan_id, unit, number)
            }
            MappingMode::Pair => pending_bcheck_unit(
                &student.history,
                catalog,
                program_id,
                plan_id,
                student.unit_floor(catalog),
            )
            .and_then(|pending| catalog.bcheck_for_unit(program_id, plan_id, pending)),
            MappingMode::Block => catalog.oral_test_covering(program_id, plan_id, unit),
        };
        let subject = subject.ok_or_else(|| BookingRejection::NoEffectiveSubject {
            reason: format!(
                "template '{}' has no {} subject for unit {unit}",
                template.name,
                template.mapping_mode.as_str()
            ),
        })?;
        return Ok(EffectiveSubject {
            subject_id: subject.id,
            unit_number: subject.unit_number,
        });
    }

    if let Some(subject_id) = session.subject_id {
        let subject = catalog
            .subject(subject_id)
            .ok_or_else(|| BookingRejection::no_subject("unknown subject"))?;
        if !catalog.subject_in_program(subject, program_id, plan_id) {
            return Err(BookingRejection::no_subject(
                "subject is not part of the student's program or plan",
            ));
        }
        return Ok(EffectiveSubject {
            subject_id: subject.id,
            unit_number: subject.unit_number,
        });
    }

    Err(BookingRejection::no_subject("session has no subject or template"))
}
