// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Catalog queries.
//!
//! The catalog is read once at startup into a `CatalogSeed` and validated by
//! the domain layer.

use std::collections::BTreeMap;

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use aula_domain::{Campus, CatalogSeed, Subject};

use crate::data_models::{
    CampusRow, ClassroomRow, LevelRow, PhaseRow, PlanRow, ProgramRow, SubjectRow, TeacherRow,
    TemplateRow,
};
use crate::diesel_schema::{
    campuses, classrooms, levels, phases, plans, programs, session_templates, subject_plans,
    subject_prerequisites, subjects, teachers,
};
use crate::error::PersistenceError;

/// Loads every catalog table, with prerequisite and plan edges attached to
/// their subjects.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn load_catalog_seed(conn: &mut SqliteConnection) -> Result<CatalogSeed, PersistenceError> {
    let programs: Vec<ProgramRow> = programs::table
        .select(ProgramRow::as_select())
        .order(programs::program_id.asc())
        .load(conn)?;
    let plans: Vec<PlanRow> = plans::table
        .select(PlanRow::as_select())
        .order(plans::plan_id.asc())
        .load(conn)?;
    let phases: Vec<PhaseRow> = phases::table
        .select(PhaseRow::as_select())
        .order(phases::sequence.asc())
        .load(conn)?;
    let levels: Vec<LevelRow> = levels::table
        .select(LevelRow::as_select())
        .order(levels::sequence.asc())
        .load(conn)?;
    let subject_rows: Vec<SubjectRow> = subjects::table
        .select(SubjectRow::as_select())
        .order(subjects::subject_id.asc())
        .load(conn)?;
    let prerequisite_edges: Vec<(i64, i64)> = subject_prerequisites::table
        .select((
            subject_prerequisites::subject_id,
            subject_prerequisites::prerequisite_id,
        ))
        .load(conn)?;
    let plan_edges: Vec<(i64, i64)> = subject_plans::table
        .select((subject_plans::subject_id, subject_plans::plan_id))
        .load(conn)?;
    let campuses: Vec<CampusRow> = campuses::table
        .select(CampusRow::as_select())
        .order(campuses::campus_id.asc())
        .load(conn)?;
    let classrooms: Vec<ClassroomRow> = classrooms::table
        .select(ClassroomRow::as_select())
        .load(conn)?;
    let teachers: Vec<TeacherRow> = teachers::table.select(TeacherRow::as_select()).load(conn)?;
    let templates: Vec<TemplateRow> = session_templates::table
        .select(TemplateRow::as_select())
        .load(conn)?;

    let mut subjects: BTreeMap<i64, Subject> = BTreeMap::new();
    for row in subject_rows {
        let subject = row.into_domain()?;
        subjects.insert(subject.id, subject);
    }
    for (subject_id, prerequisite_id) in prerequisite_edges {
        if let Some(subject) = subjects.get_mut(&subject_id) {
            subject.prerequisite_ids.insert(prerequisite_id);
        }
    }
    for (subject_id, plan_id) in plan_edges {
        if let Some(subject) = subjects.get_mut(&subject_id) {
            subject.plan_ids.insert(plan_id);
        }
    }

    debug!(
        programs = programs.len(),
        subjects = subjects.len(),
        "Loaded catalog seed"
    );

    Ok(CatalogSeed {
        programs: programs.into_iter().map(ProgramRow::into_domain).collect(),
        plans: plans.into_iter().map(PlanRow::into_domain).collect(),
        phases: phases.into_iter().map(PhaseRow::into_domain).collect(),
        levels: levels
            .into_iter()
            .map(LevelRow::into_domain)
            .collect::<Result<_, _>>()?,
        subjects: subjects.into_values().collect(),
        campuses: campuses
            .into_iter()
            .map(CampusRow::into_domain)
            .collect::<Result<_, _>>()?,
        classrooms: classrooms
            .into_iter()
            .map(ClassroomRow::into_domain)
            .collect::<Result<_, _>>()?,
        teachers: teachers.into_iter().map(TeacherRow::into_domain).collect(),
        templates: templates
            .into_iter()
            .map(TemplateRow::into_domain)
            .collect::<Result<_, _>>()?,
    })
}

/// Retrieves a campus by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the campus is not found.
pub fn get_campus(
    conn: &mut SqliteConnection,
    campus_id: i64,
) -> Result<Option<Campus>, PersistenceError> {
    campuses::table
        .filter(campuses::campus_id.eq(campus_id))
        .select(CampusRow::as_select())
        .first::<CampusRow>(conn)
        .optional()?
        .map(CampusRow::into_domain)
        .transpose()
}
