// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and the conversions between stored text and domain values.
//!
//! Dates, times and datetimes are stored as ISO text so that string order
//! matches chronological order; enums are stored as their snake case names.

use diesel::prelude::*;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

use aula_domain::{
    Agenda, Campus, ClassSession, Classroom, Enrollment, FreezePeriod, HistoryAmendment,
    HistoryRecord, Level, Phase, Plan, ProfileState, Program, SessionEnrollment,
    SessionTemplate, Student, Teacher, WeeklyPlan, WeeklyPlanLine,
};

use crate::diesel_schema::{
    academic_history, agendas, campuses, class_sessions, classrooms, enrollments, freeze_periods,
    history_amendments, levels, phases, plans, profile_states, programs, session_enrollments,
    session_templates, students, subjects, teachers, weekly_plan_line_trash, weekly_plan_lines,
    weekly_plans,
};
use crate::error::PersistenceError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");
const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub fn format_date(date: Date) -> Result<String, PersistenceError> {
    date.format(DATE_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(format!("date {date}: {e}")))
}

pub fn parse_date(value: &str) -> Result<Date, PersistenceError> {
    Date::parse(value, DATE_FORMAT)
        .map_err(|e| PersistenceError::ReconstructionError(format!("date '{value}': {e}")))
}

pub fn format_time(value: Time) -> Result<String, PersistenceError> {
    value
        .format(TIME_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(format!("time {value}: {e}")))
}

pub fn parse_time(value: &str) -> Result<Time, PersistenceError> {
    Time::parse(value, TIME_FORMAT)
        .map_err(|e| PersistenceError::ReconstructionError(format!("time '{value}': {e}")))
}

/// Formats a datetime the way it is stored.
///
/// # Errors
///
/// Returns `SerializationError` if the value cannot be formatted.
pub fn format_datetime(value: PrimitiveDateTime) -> Result<String, PersistenceError> {
    value
        .format(DATETIME_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(format!("datetime {value}: {e}")))
}

/// Parses a stored datetime.
///
/// # Errors
///
/// Returns `ReconstructionError` if the text is not a stored datetime.
pub fn parse_datetime(value: &str) -> Result<PrimitiveDateTime, PersistenceError> {
    PrimitiveDateTime::parse(value, DATETIME_FORMAT)
        .map_err(|e| PersistenceError::ReconstructionError(format!("datetime '{value}': {e}")))
}

fn format_opt_date(value: Option<Date>) -> Result<Option<String>, PersistenceError> {
    value.map(format_date).transpose()
}

fn parse_opt_date(value: Option<&str>) -> Result<Option<Date>, PersistenceError> {
    value.map(parse_date).transpose()
}

/// Parses a stored enum value.
pub fn parse_text<T>(value: &str) -> Result<T, PersistenceError>
where
    T: FromStr<Err = aula_domain::DomainError>,
{
    T::from_str(value).map_err(PersistenceError::from)
}

fn parse_opt_text<T>(value: Option<&str>) -> Result<Option<T>, PersistenceError>
where
    T: FromStr<Err = aula_domain::DomainError>,
{
    value.map(parse_text).transpose()
}

pub fn to_unit(value: i32) -> Result<u32, PersistenceError> {
    value
        .to_u32()
        .ok_or_else(|| PersistenceError::ReconstructionError(format!("negative unit {value}")))
}

fn to_opt_unit(value: Option<i32>) -> Result<Option<u32>, PersistenceError> {
    value.map(to_unit).transpose()
}

pub fn from_unit(value: u32) -> Result<i32, PersistenceError> {
    value
        .to_i32()
        .ok_or_else(|| PersistenceError::SerializationError(format!("unit {value} out of range")))
}

fn from_opt_unit(value: Option<u32>) -> Result<Option<i32>, PersistenceError> {
    value.map(from_unit).transpose()
}

fn flag(value: bool) -> i32 {
    i32::from(value)
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = programs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProgramRow {
    pub program_id: i64,
    pub name: String,
    pub code: String,
    pub program_type: String,
}

impl ProgramRow {
    pub fn into_domain(self) -> Program {
        Program {
            id: self.program_id,
            name: self.name,
            code: self.code,
            program_type: self.program_type,
        }
    }

    pub fn from_domain(program: &Program) -> Self {
        Self {
            program_id: program.id,
            name: program.name.clone(),
            code: program.code.clone(),
            program_type: program.program_type.clone(),
        }
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = plans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PlanRow {
    pub plan_id: i64,
    pub name: String,
    pub code: String,
    pub program_id: i64,
}

impl PlanRow {
    pub fn into_domain(self) -> Plan {
        Plan {
            id: self.plan_id,
            name: self.name,
            code: self.code,
            program_id: self.program_id,
        }
    }

    pub fn from_domain(plan: &Plan) -> Self {
        Self {
            plan_id: plan.id,
            name: plan.name.clone(),
            code: plan.code.clone(),
            program_id: plan.program_id,
        }
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = phases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PhaseRow {
    pub phase_id: i64,
    pub name: String,
    pub sequence: i32,
    pub program_id: i64,
}

impl PhaseRow {
    pub fn into_domain(self) -> Phase {
        Phase {
            id: self.phase_id,
            name: self.name,
            sequence: self.sequence,
            program_id: self.program_id,
        }
    }

    pub fn from_domain(phase: &Phase) -> Self {
        Self {
            phase_id: phase.id,
            name: phase.name.clone(),
            sequence: phase.sequence,
            program_id: phase.program_id,
        }
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = levels)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LevelRow {
    pub level_id: i64,
    pub name: String,
    pub sequence: i32,
    pub phase_id: i64,
    pub min_unit: i32,
    pub max_unit: i32,
}

impl LevelRow {
    pub fn into_domain(self) -> Result<Level, PersistenceError> {
        Ok(Level {
            id: self.level_id,
            name: self.name,
            sequence: self.sequence,
            phase_id: self.phase_id,
            min_unit: to_unit(self.min_unit)?,
            max_unit: to_unit(self.max_unit)?,
        })
    }

    pub fn from_domain(level: &Level) -> Result<Self, PersistenceError> {
        Ok(Self {
            level_id: level.id,
            name: level.name.clone(),
            sequence: level.sequence,
            phase_id: level.phase_id,
            min_unit: from_unit(level.min_unit)?,
            max_unit: from_unit(level.max_unit)?,
        })
    }
}

/// A subject row; prerequisite and plan edges live in their own tables.
#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = subjects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SubjectRow {
    pub subject_id: i64,
    pub name: String,
    pub alias: Option<String>,
    pub code: String,
    pub level_id: i64,
    pub category: String,
    pub classification: String,
    pub unit_number: Option<i32>,
    pub bskill_number: Option<i32>,
    pub unit_block_start: Option<i32>,
    pub unit_block_end: Option<i32>,
    pub sequence: i32,
    pub evaluable: i32,
}

impl SubjectRow {
    pub fn from_domain(subject: &aula_domain::Subject) -> Result<Self, PersistenceError> {
        Ok(Self {
            subject_id: subject.id,
            name: subject.name.clone(),
            alias: subject.alias.clone(),
            code: subject.code.clone(),
            level_id: subject.level_id,
            category: subject.category.as_str().to_string(),
            classification: subject.classification.as_str().to_string(),
            unit_number: from_opt_unit(subject.unit_number)?,
            bskill_number: from_opt_unit(subject.bskill_number)?,
            unit_block_start: from_opt_unit(subject.unit_block_start)?,
            unit_block_end: from_opt_unit(subject.unit_block_end)?,
            sequence: subject.sequence,
            evaluable: flag(subject.evaluable),
        })
    }

    pub fn into_domain(self) -> Result<aula_domain::Subject, PersistenceError> {
        Ok(aula_domain::Subject {
            id: self.subject_id,
            name: self.name,
            alias: self.alias,
            code: self.code,
            level_id: self.level_id,
            category: parse_text(&self.category)?,
            classification: parse_text(&self.classification)?,
            unit_number: to_opt_unit(self.unit_number)?,
            bskill_number: to_opt_unit(self.bskill_number)?,
            unit_block_start: to_opt_unit(self.unit_block_start)?,
            unit_block_end: to_opt_unit(self.unit_block_end)?,
            sequence: self.sequence,
            evaluable: self.evaluable != 0,
            prerequisite_ids: std::collections::BTreeSet::new(),
            plan_ids: std::collections::BTreeSet::new(),
        })
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = campuses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CampusRow {
    pub campus_id: i64,
    pub name: String,
    pub code: String,
    pub city: String,
    pub campus_type: String,
}

impl CampusRow {
    pub fn into_domain(self) -> Result<Campus, PersistenceError> {
        Ok(Campus {
            id: self.campus_id,
            name: self.name,
            code: self.code,
            city: self.city,
            campus_type: parse_text(&self.campus_type)?,
        })
    }

    pub fn from_domain(campus: &Campus) -> Self {
        Self {
            campus_id: campus.id,
            name: campus.name.clone(),
            code: campus.code.clone(),
            city: campus.city.clone(),
            campus_type: campus.campus_type.as_str().to_string(),
        }
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = classrooms)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ClassroomRow {
    pub classroom_id: i64,
    pub campus_id: i64,
    pub name: String,
    pub capacity: Option<i32>,
}

impl ClassroomRow {
    pub fn into_domain(self) -> Result<Classroom, PersistenceError> {
        Ok(Classroom {
            id: self.classroom_id,
            campus_id: self.campus_id,
            name: self.name,
            capacity: to_opt_unit(self.capacity)?,
        })
    }

    pub fn from_domain(classroom: &Classroom) -> Result<Self, PersistenceError> {
        Ok(Self {
            classroom_id: classroom.id,
            campus_id: classroom.campus_id,
            name: classroom.name.clone(),
            capacity: from_opt_unit(classroom.capacity)?,
        })
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = teachers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TeacherRow {
    pub teacher_id: i64,
    pub name: String,
}

impl TeacherRow {
    pub fn into_domain(self) -> Teacher {
        Teacher {
            id: self.teacher_id,
            name: self.name,
        }
    }

    pub fn from_domain(teacher: &Teacher) -> Self {
        Self {
            teacher_id: teacher.id,
            name: teacher.name.clone(),
        }
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = session_templates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TemplateRow {
    pub template_id: i64,
    pub name: String,
    pub category: String,
    pub mapping_mode: String,
    pub skill_number: Option<i32>,
}

impl TemplateRow {
    pub fn into_domain(self) -> Result<SessionTemplate, PersistenceError> {
        Ok(SessionTemplate {
            id: self.template_id,
            name: self.name,
            category: parse_text(&self.category)?,
            mapping_mode: parse_text(&self.mapping_mode)?,
            skill_number: to_opt_unit(self.skill_number)?,
        })
    }

    pub fn from_domain(template: &SessionTemplate) -> Result<Self, PersistenceError> {
        Ok(Self {
            template_id: template.id,
            name: template.name.clone(),
            category: template.category.as_str().to_string(),
            mapping_mode: template.mapping_mode.as_str().to_string(),
            skill_number: from_opt_unit(template.skill_number)?,
        })
    }
}

// ============================================================================
// Students and ledger
// ============================================================================

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = profile_states)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProfileStateRow {
    pub profile_state_id: i64,
    pub code: String,
    pub name: String,
    pub can_schedule: i32,
    pub can_view_agenda: i32,
}

impl ProfileStateRow {
    pub fn into_domain(self) -> ProfileState {
        ProfileState {
            id: self.profile_state_id,
            code: self.code,
            name: self.name,
            can_schedule: self.can_schedule != 0,
            can_view_agenda: self.can_view_agenda != 0,
        }
    }

    pub fn from_domain(profile: &ProfileState) -> Self {
        Self {
            profile_state_id: profile.id,
            code: profile.code.clone(),
            name: profile.name.clone(),
            can_schedule: flag(profile.can_schedule),
            can_view_agenda: flag(profile.can_view_agenda),
        }
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StudentRow {
    pub student_id: i64,
    pub name: String,
    pub document: String,
    pub program_id: Option<i64>,
    pub plan_id: Option<i64>,
    pub current_phase_id: Option<i64>,
    pub current_level_id: Option<i64>,
    pub preferred_delivery_mode: String,
    pub preferred_campus_id: Option<i64>,
    pub profile_state_id: Option<i64>,
    pub current_unit: i32,
}

impl StudentRow {
    pub fn into_domain(self) -> Result<Student, PersistenceError> {
        Ok(Student {
            id: self.student_id,
            name: self.name,
            document: self.document,
            program_id: self.program_id,
            plan_id: self.plan_id,
            current_phase_id: self.current_phase_id,
            current_level_id: self.current_level_id,
            preferred_delivery_mode: parse_text(&self.preferred_delivery_mode)?,
            preferred_campus_id: self.preferred_campus_id,
            profile_state_id: self.profile_state_id,
            current_unit: to_unit(self.current_unit)?,
        })
    }

    pub fn from_domain(student: &Student) -> Result<Self, PersistenceError> {
        Ok(Self {
            student_id: student.id,
            name: student.name.clone(),
            document: student.document.clone(),
            program_id: student.program_id,
            plan_id: student.plan_id,
            current_phase_id: student.current_phase_id,
            current_level_id: student.current_level_id,
            preferred_delivery_mode: student.preferred_delivery_mode.as_str().to_string(),
            preferred_campus_id: student.preferred_campus_id,
            profile_state_id: student.profile_state_id,
            current_unit: from_unit(student.current_unit)?,
        })
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = enrollments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EnrollmentRow {
    pub enrollment_id: i64,
    pub student_id: i64,
    pub subject_id: Option<i64>,
    pub program_id: i64,
    pub plan_id: Option<i64>,
    pub phase_id: Option<i64>,
    pub level_id: Option<i64>,
    pub campus_id: Option<i64>,
    pub delivery_mode: String,
    pub state: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub final_grade: Option<f64>,
}

impl EnrollmentRow {
    pub fn into_domain(self) -> Result<Enrollment, PersistenceError> {
        Ok(Enrollment {
            id: self.enrollment_id,
            student_id: self.student_id,
            subject_id: self.subject_id,
            program_id: self.program_id,
            plan_id: self.plan_id,
            phase_id: self.phase_id,
            level_id: self.level_id,
            campus_id: self.campus_id,
            delivery_mode: parse_text(&self.delivery_mode)?,
            state: parse_text(&self.state)?,
            start_date: parse_date(&self.start_date)?,
            end_date: parse_opt_date(self.end_date.as_deref())?,
            final_grade: self.final_grade,
        })
    }

    pub fn from_domain(enrollment: &Enrollment) -> Result<Self, PersistenceError> {
        Ok(Self {
            enrollment_id: enrollment.id,
            student_id: enrollment.student_id,
            subject_id: enrollment.subject_id,
            program_id: enrollment.program_id,
            plan_id: enrollment.plan_id,
            phase_id: enrollment.phase_id,
            level_id: enrollment.level_id,
            campus_id: enrollment.campus_id,
            delivery_mode: enrollment.delivery_mode.as_str().to_string(),
            state: enrollment.state.as_str().to_string(),
            start_date: format_date(enrollment.start_date)?,
            end_date: format_opt_date(enrollment.end_date)?,
            final_grade: enrollment.final_grade,
        })
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = freeze_periods)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FreezePeriodRow {
    pub freeze_id: i64,
    pub student_id: i64,
    pub enrollment_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub state: String,
    pub reason_id: Option<i64>,
    pub is_special: i32,
}

impl FreezePeriodRow {
    pub fn into_domain(self) -> Result<FreezePeriod, PersistenceError> {
        Ok(FreezePeriod {
            id: self.freeze_id,
            student_id: self.student_id,
            enrollment_id: self.enrollment_id,
            start_date: parse_date(&self.start_date)?,
            end_date: parse_date(&self.end_date)?,
            state: parse_text(&self.state)?,
            reason_id: self.reason_id,
            is_special: self.is_special != 0,
        })
    }

    pub fn from_domain(freeze: &FreezePeriod) -> Result<Self, PersistenceError> {
        Ok(Self {
            freeze_id: freeze.id,
            student_id: freeze.student_id,
            enrollment_id: freeze.enrollment_id,
            start_date: format_date(freeze.start_date)?,
            end_date: format_date(freeze.end_date)?,
            state: freeze.state.as_str().to_string(),
            reason_id: freeze.reason_id,
            is_special: flag(freeze.is_special),
        })
    }
}

// ============================================================================
// Agenda
// ============================================================================

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = agendas)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AgendaRow {
    pub agenda_id: i64,
    pub name: String,
    pub campus_id: Option<i64>,
    pub week_start: String,
}

impl AgendaRow {
    pub fn from_domain(agenda: &Agenda) -> Result<Self, PersistenceError> {
        Ok(Self {
            agenda_id: agenda.id,
            name: agenda.name.clone(),
            campus_id: agenda.campus_id,
            week_start: format_date(agenda.week_start)?,
        })
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = class_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ClassSessionRow {
    pub session_id: i64,
    pub agenda_id: Option<i64>,
    pub program_id: i64,
    pub subject_id: Option<i64>,
    pub template_id: Option<i64>,
    pub teacher_id: i64,
    pub campus_id: i64,
    pub subcampus_id: Option<i64>,
    pub session_date: String,
    pub time_start: String,
    pub time_end: String,
    pub datetime_start: String,
    pub datetime_end: String,
    pub delivery_mode: String,
    pub max_capacity: i32,
    pub audience_unit_from: Option<i32>,
    pub audience_unit_to: Option<i32>,
    pub meeting_link: Option<String>,
    pub is_published: i32,
    pub active: i32,
    pub state: String,
    pub elective_pool_id: Option<i64>,
}

impl ClassSessionRow {
    pub fn into_domain(self) -> Result<ClassSession, PersistenceError> {
        Ok(ClassSession {
            id: self.session_id,
            agenda_id: self.agenda_id,
            program_id: self.program_id,
            subject_id: self.subject_id,
            template_id: self.template_id,
            teacher_id: self.teacher_id,
            campus_id: self.campus_id,
            subcampus_id: self.subcampus_id,
            date: parse_date(&self.session_date)?,
            time_start: parse_time(&self.time_start)?,
            time_end: parse_time(&self.time_end)?,
            delivery_mode: parse_text(&self.delivery_mode)?,
            max_capacity: to_unit(self.max_capacity)?,
            audience_unit_from: to_opt_unit(self.audience_unit_from)?,
            audience_unit_to: to_opt_unit(self.audience_unit_to)?,
            meeting_link: self.meeting_link,
            is_published: self.is_published != 0,
            active: self.active != 0,
            state: parse_text(&self.state)?,
            elective_pool_id: self.elective_pool_id,
        })
    }

    /// Stores the session with its derived start and end datetimes.
    pub fn from_domain(session: &ClassSession) -> Result<Self, PersistenceError> {
        Ok(Self {
            session_id: session.id,
            agenda_id: session.agenda_id,
            program_id: session.program_id,
            subject_id: session.subject_id,
            template_id: session.template_id,
            teacher_id: session.teacher_id,
            campus_id: session.campus_id,
            subcampus_id: session.subcampus_id,
            session_date: format_date(session.date)?,
            time_start: format_time(session.time_start)?,
            time_end: format_time(session.time_end)?,
            datetime_start: format_datetime(session.datetime_start())?,
            datetime_end: format_datetime(session.datetime_end())?,
            delivery_mode: session.delivery_mode.as_str().to_string(),
            max_capacity: from_unit(session.max_capacity)?,
            audience_unit_from: from_opt_unit(session.audience_unit_from)?,
            audience_unit_to: from_opt_unit(session.audience_unit_to)?,
            meeting_link: session.meeting_link.clone(),
            is_published: flag(session.is_published),
            active: flag(session.active),
            state: session.state.as_str().to_string(),
            elective_pool_id: session.elective_pool_id,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = session_enrollments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SessionEnrollmentRow {
    pub enrollment_id: i64,
    pub session_id: i64,
    pub student_id: i64,
    pub effective_subject_id: i64,
    pub effective_unit_number: Option<i32>,
    pub state: String,
    pub notes: Option<String>,
    pub late_cancel: i32,
}

impl SessionEnrollmentRow {
    pub fn into_domain(self) -> Result<SessionEnrollment, PersistenceError> {
        Ok(SessionEnrollment {
            id: self.enrollment_id,
            session_id: self.session_id,
            student_id: self.student_id,
            effective_subject_id: self.effective_subject_id,
            effective_unit_number: to_opt_unit(self.effective_unit_number)?,
            state: parse_text(&self.state)?,
            notes: self.notes,
            late_cancel: self.late_cancel != 0,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = weekly_plans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WeeklyPlanRow {
    pub plan_id: i64,
    pub student_id: i64,
    pub week_start: String,
    pub filter_campus_id: Option<i64>,
    pub filter_city: Option<String>,
}

impl WeeklyPlanRow {
    pub fn into_domain(self) -> Result<WeeklyPlan, PersistenceError> {
        Ok(WeeklyPlan {
            id: self.plan_id,
            student_id: self.student_id,
            week_start: parse_date(&self.week_start)?,
            filter_campus_id: self.filter_campus_id,
            filter_city: self.filter_city,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = weekly_plan_lines)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WeeklyPlanLineRow {
    pub line_id: i64,
    pub plan_id: i64,
    pub session_id: i64,
    pub effective_subject_id: i64,
    pub start_datetime: String,
    pub line_date: String,
}

impl WeeklyPlanLineRow {
    pub fn into_domain(self) -> Result<WeeklyPlanLine, PersistenceError> {
        Ok(WeeklyPlanLine {
            id: self.line_id,
            plan_id: self.plan_id,
            session_id: self.session_id,
            effective_subject_id: self.effective_subject_id,
            start_datetime: parse_datetime(&self.start_datetime)?,
            date: parse_date(&self.line_date)?,
        })
    }
}

/// A deleted line kept in the trash vault until it is purged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashedLine {
    pub trash_id: i64,
    pub line_id: i64,
    pub plan_id: i64,
    pub student_id: i64,
    pub session_id: i64,
    pub effective_subject_id: i64,
    pub deleted_at: String,
    pub reason: String,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = weekly_plan_line_trash)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TrashRow {
    pub trash_id: i64,
    pub line_id: i64,
    pub plan_id: i64,
    pub student_id: i64,
    pub session_id: i64,
    pub effective_subject_id: i64,
    pub deleted_at: String,
    pub reason: String,
}

impl TrashRow {
    pub fn into_data(self) -> TrashedLine {
        TrashedLine {
            trash_id: self.trash_id,
            line_id: self.line_id,
            plan_id: self.plan_id,
            student_id: self.student_id,
            session_id: self.session_id,
            effective_subject_id: self.effective_subject_id,
            deleted_at: self.deleted_at,
            reason: self.reason,
        }
    }
}

// ============================================================================
// History
// ============================================================================

#[derive(Queryable, Selectable)]
#[diesel(table_name = academic_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HistoryRow {
    pub history_id: i64,
    pub student_id: i64,
    pub session_id: Option<i64>,
    pub enrollment_id: Option<i64>,
    pub session_date: String,
    pub session_time_start: String,
    pub session_time_end: String,
    pub program_id: i64,
    pub plan_id: Option<i64>,
    pub phase_id: Option<i64>,
    pub level_id: Option<i64>,
    pub subject_id: i64,
    pub teacher_id: Option<i64>,
    pub campus_id: Option<i64>,
    pub delivery_mode: String,
    pub attendance_status: String,
    pub novedad: String,
    pub notes: Option<String>,
    pub grade: Option<f64>,
    pub created_at: String,
}

impl HistoryRow {
    pub fn into_domain(self) -> Result<HistoryRecord, PersistenceError> {
        Ok(HistoryRecord {
            id: self.history_id,
            student_id: self.student_id,
            session_id: self.session_id,
            enrollment_id: self.enrollment_id,
            session_date: parse_date(&self.session_date)?,
            session_time_start: parse_time(&self.session_time_start)?,
            session_time_end: parse_time(&self.session_time_end)?,
            program_id: self.program_id,
            plan_id: self.plan_id,
            phase_id: self.phase_id,
            level_id: self.level_id,
            subject_id: self.subject_id,
            teacher_id: self.teacher_id,
            campus_id: self.campus_id,
            delivery_mode: parse_text(&self.delivery_mode)?,
            attendance_status: parse_text(&self.attendance_status)?,
            novedad: parse_text(&self.novedad)?,
            notes: self.notes,
            grade: self.grade,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = history_amendments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AmendmentRow {
    pub amendment_id: i64,
    pub history_id: i64,
    pub attendance_status: Option<String>,
    pub novedad: Option<String>,
    pub grade: Option<f64>,
    pub reason: String,
    pub created_at: String,
}

impl AmendmentRow {
    pub fn into_domain(self) -> Result<HistoryAmendment, PersistenceError> {
        Ok(HistoryAmendment {
            id: self.amendment_id,
            history_id: self.history_id,
            attendance_status: parse_opt_text(self.attendance_status.as_deref())?,
            novedad: parse_opt_text(self.novedad.as_deref())?,
            grade: self.grade,
            reason: self.reason,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ============================================================================
// Portal auth
// ============================================================================

/// A portal account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalUserData {
    pub user_id: i64,
    pub login: String,
    pub display_name: String,
    pub password_hash: String,
    /// One of `student`, `coach` or `admin`.
    pub role: String,
    pub student_id: Option<i64>,
    pub must_change_password: bool,
    pub is_disabled: bool,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

/// A bearer session for a portal account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSessionData {
    pub session_id: i64,
    pub session_token: String,
    pub user_id: i64,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}

/// A booked line as shown in the student's own agenda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaLine {
    pub line: WeeklyPlanLine,
    pub session: ClassSession,
    pub enrollment: Option<SessionEnrollment>,
}

/// What a committed booking wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingCommit {
    pub line_id: i64,
    pub plan_id: i64,
    pub enrollment_id: i64,
    pub event_id: i64,
}

/// What a committed cancellation removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationCommit {
    pub removed_line_ids: Vec<i64>,
    pub event_id: i64,
}

/// What a committed attendance plan wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceCommit {
    /// Ids of newly inserted history rows; rows that already existed are skipped.
    pub history_ids: Vec<i64>,
    pub event_id: i64,
}

/// Filters for session listings. Dates are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub campus_id: Option<i64>,
    pub city: Option<String>,
    pub delivery_mode: Option<aula_domain::DeliveryMode>,
    pub subject_id: Option<i64>,
}
