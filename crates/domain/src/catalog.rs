// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Curricular catalog: programs, plans, phases, levels, subjects and the
//! places and people sessions are held with.
//!
//! The catalog is immutable at runtime. It is validated once when loaded
//! and then only read.

use crate::error::DomainError;
use crate::types::{CampusType, MappingMode, SubjectCategory, SubjectClassification};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub program_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub program_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub id: i64,
    pub name: String,
    pub sequence: i32,
    pub program_id: i64,
}

/// A level groups a contiguous range of units within a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: i64,
    pub name: String,
    pub sequence: i32,
    pub phase_id: i64,
    pub min_unit: u32,
    pub max_unit: u32,
}

impl Level {
    /// Returns whether `unit` falls inside this level's range.
    #[must_use]
    pub const fn contains_unit(&self, unit: u32) -> bool {
        unit >= self.min_unit && unit <= self.max_unit
    }
}

/// A bookable unit of curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub alias: Option<String>,
    pub code: String,
    pub level_id: i64,
    pub category: SubjectCategory,
    pub classification: SubjectClassification,
    pub unit_number: Option<u32>,
    pub bskill_number: Option<u32>,
    pub unit_block_start: Option<u32>,
    pub unit_block_end: Option<u32>,
    pub sequence: i32,
    pub evaluable: bool,
    pub prerequisite_ids: BTreeSet<i64>,
    /// Plans this subject is restricted to. Empty means every plan of the program.
    pub plan_ids: BTreeSet<i64>,
}

impl Subject {
    /// Returns whether this subject gates others.
    ///
    /// A subject is a prerequisite when it is a B-check, is classified as a
    /// prerequisite, or carries "bcheck" in its name.
    #[must_use]
    pub fn is_prerequisite(&self) -> bool {
        self.category == SubjectCategory::BCheck
            || self.classification == SubjectClassification::Prerequisite
            || self.name.to_lowercase().contains("bcheck")
    }

    /// Returns whether the subject is available under `plan_id`.
    #[must_use]
    pub fn offered_in_plan(&self, plan_id: Option<i64>) -> bool {
        if self.plan_ids.is_empty() {
            return true;
        }
        plan_id.is_some_and(|plan| self.plan_ids.contains(&plan))
    }

    /// Returns whether the oral-test block of this subject brackets `unit`.
    #[must_use]
    pub fn block_covers(&self, unit: u32) -> bool {
        match (self.unit_block_start, self.unit_block_end) {
            (Some(start), Some(end)) => unit >= start && unit <= end,
            _ => false,
        }
    }

    /// Returns the label shown to students, preferring the alias.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidSubject {
            subject_id: self.id,
            reason: reason.to_string(),
        };
        match self.category {
            SubjectCategory::BCheck if self.unit_number.is_none() => {
                Err(invalid("bcheck subjects require a unit number"))
            }
            SubjectCategory::BSkills
                if self.unit_number.is_none() || self.bskill_number.is_none() =>
            {
                Err(invalid("bskills subjects require a unit and skill number"))
            }
            SubjectCategory::OralTest => match (self.unit_block_start, self.unit_block_end) {
                (Some(start), Some(end)) if start <= end => Ok(()),
                (Some(_), Some(_)) => Err(invalid("oral test block starts after it ends")),
                _ => Err(invalid("oral test subjects require a unit block")),
            },
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campus {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub city: String,
    pub campus_type: CampusType,
}

/// A room (subcampus) within a campus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    pub id: i64,
    pub campus_id: i64,
    pub name: String,
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
}

/// A session blueprint that resolves to a different subject per student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTemplate {
    pub id: i64,
    pub name: String,
    pub category: SubjectCategory,
    pub mapping_mode: MappingMode,
    /// The skill number selected by `per_unit` templates.
    pub skill_number: Option<u32>,
}

/// Raw catalog rows as loaded from storage, before validation.
#[derive(Debug, Clone, Default)]
pub struct CatalogSeed {
    pub programs: Vec<Program>,
    pub plans: Vec<Plan>,
    pub phases: Vec<Phase>,
    pub levels: Vec<Level>,
    pub subjects: Vec<Subject>,
    pub campuses: Vec<Campus>,
    pub classrooms: Vec<Classroom>,
    pub teachers: Vec<Teacher>,
    pub templates: Vec<SessionTemplate>,
}

/// The validated, read-only catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    programs: BTreeMap<i64, Program>,
    plans: BTreeMap<i64, Plan>,
    phases: BTreeMap<i64, Phase>,
    levels: BTreeMap<i64, Level>,
    subjects: BTreeMap<i64, Subject>,
    campuses: BTreeMap<i64, Campus>,
    classrooms: BTreeMap<i64, Classroom>,
    teachers: BTreeMap<i64, Teacher>,
    templates: BTreeMap<i64, SessionTemplate>,
}

fn index<T>(rows: Vec<T>, id: impl Fn(&T) -> i64) -> BTreeMap<i64, T> {
    rows.into_iter().map(|row| (id(&row), row)).collect()
}

impl Catalog {
    /// Builds and validates a catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A plan, phase, level, subject or classroom references a missing parent
    /// - A level has an empty unit range
    /// - A subject violates its category invariants
    /// - The prerequisite graph contains a cycle
    pub fn from_seed(seed: CatalogSeed) -> Result<Self, DomainError> {
        let catalog = Self {
            programs: index(seed.programs, |p| p.id),
            plans: index(seed.plans, |p| p.id),
            phases: index(seed.phases, |p| p.id),
            levels: index(seed.levels, |l| l.id),
            subjects: index(seed.subjects, |s| s.id),
            campuses: index(seed.campuses, |c| c.id),
            classrooms: index(seed.classrooms, |c| c.id),
            teachers: index(seed.teachers, |t| t.id),
            templates: index(seed.templates, |t| t.id),
        };
        catalog.validate_references()?;
        for subject in catalog.subjects.values() {
            subject.validate()?;
        }
        catalog.validate_acyclic()?;
        Ok(catalog)
    }

    fn validate_references(&self) -> Result<(), DomainError> {
        let dangling = |entity: &'static str, entity_id: i64, missing_id: i64| {
            DomainError::DanglingReference {
                entity,
                entity_id,
                missing_id,
            }
        };
        for plan in self.plans.values() {
            if !self.programs.contains_key(&plan.program_id) {
                return Err(dangling("Plan", plan.id, plan.program_id));
            }
        }
        for phase in self.phases.values() {
            if !self.programs.contains_key(&phase.program_id) {
                return Err(dangling("Phase", phase.id, phase.program_id));
            }
        }
        for level in self.levels.values() {
            if !self.phases.contains_key(&level.phase_id) {
                return Err(dangling("Level", level.id, level.phase_id));
            }
            if level.min_unit > level.max_unit {
                return Err(DomainError::InvalidLevelRange {
                    level_id: level.id,
                    min_unit: level.min_unit,
                    max_unit: level.max_unit,
                });
            }
        }
        for subject in self.subjects.values() {
            if !self.levels.contains_key(&subject.level_id) {
                return Err(dangling("Subject", subject.id, subject.level_id));
            }
            if let Some(missing) = subject
                .prerequisite_ids
                .iter()
                .find(|id| !self.subjects.contains_key(id))
            {
                return Err(dangling("Subject", subject.id, *missing));
            }
            if let Some(missing) = subject
                .plan_ids
                .iter()
                .find(|id| !self.plans.contains_key(id))
            {
                return Err(dangling("Subject", subject.id, *missing));
            }
        }
        for classroom in self.classrooms.values() {
            if !self.campuses.contains_key(&classroom.campus_id) {
                return Err(dangling("Classroom", classroom.id, classroom.campus_id));
            }
        }
        Ok(())
    }

    /// Depth-first walk with white/grey/black marking; a grey hit is a cycle.
    fn validate_acyclic(&self) -> Result<(), DomainError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            InProgress,
            Done,
        }

        fn visit(
            catalog: &Catalog,
            id: i64,
            marks: &mut BTreeMap<i64, Mark>,
            path: &mut Vec<i64>,
        ) -> Result<(), Vec<i64>> {
            match marks.get(&id) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::InProgress) => {
                    let start = path.iter().position(|p| *p == id).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(id);
                    return Err(cycle);
                }
                None => {}
            }
            marks.insert(id, Mark::InProgress);
            path.push(id);
            if let Some(subject) = catalog.subjects.get(&id) {
                for prerequisite in &subject.prerequisite_ids {
                    visit(catalog, *prerequisite, marks, path)?;
                }
            }
            path.pop();
            marks.insert(id, Mark::Done);
            Ok(())
        }

        let mut marks: BTreeMap<i64, Mark> = BTreeMap::new();
        for id in self.subjects.keys() {
            let mut path = Vec::new();
            if let Err(cycle) = visit(self, *id, &mut marks, &mut path) {
                let program_id = self.program_of_subject(*id).unwrap_or_default();
                return Err(DomainError::CyclicPrerequisites { program_id, cycle });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn program(&self, id: i64) -> Option<&Program> {
        self.programs.get(&id)
    }

    #[must_use]
    pub fn plan(&self, id: i64) -> Option<&Plan> {
        self.plans.get(&id)
    }

    #[must_use]
    pub fn phase(&self, id: i64) -> Option<&Phase> {
        self.phases.get(&id)
    }

    #[must_use]
    pub fn level(&self, id: i64) -> Option<&Level> {
        self.levels.get(&id)
    }

    #[must_use]
    pub fn subject(&self, id: i64) -> Option<&Subject> {
        self.subjects.get(&id)
    }

    #[must_use]
    pub fn campus(&self, id: i64) -> Option<&Campus> {
        self.campuses.get(&id)
    }

    #[must_use]
    pub fn classroom(&self, id: i64) -> Option<&Classroom> {
        self.classrooms.get(&id)
    }

    #[must_use]
    pub fn teacher(&self, id: i64) -> Option<&Teacher> {
        self.teachers.get(&id)
    }

    #[must_use]
    pub fn template(&self, id: i64) -> Option<&SessionTemplate> {
        self.templates.get(&id)
    }

    /// Returns every campus, ordered by id.
    pub fn campuses(&self) -> impl Iterator<Item = &Campus> {
        self.campuses.values()
    }

    /// Returns the number of subjects in the catalog.
    #[must_use]
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    /// Returns the default plan of a program: its lowest-id plan.
    #[must_use]
    pub fn default_plan_of(&self, program_id: i64) -> Option<&Plan> {
        self.plans.values().find(|p| p.program_id == program_id)
    }

    /// Resolves the program a level belongs to through its phase.
    #[must_use]
    pub fn program_of_level(&self, level_id: i64) -> Option<i64> {
        let level = self.levels.get(&level_id)?;
        let phase = self.phases.get(&level.phase_id)?;
        Some(phase.program_id)
    }

    /// Resolves the program a subject belongs to through level and phase.
    #[must_use]
    pub fn program_of_subject(&self, subject_id: i64) -> Option<i64> {
        let subject = self.subjects.get(&subject_id)?;
        self.program_of_level(subject.level_id)
    }

    /// Returns whether `subject` belongs to `program` and is offered in `plan`.
    #[must_use]
    pub fn subject_in_program(&self, subject: &Subject, program_id: i64, plan_id: Option<i64>) -> bool {
        self.program_of_level(subject.level_id) == Some(program_id)
            && subject.offered_in_plan(plan_id)
    }

    /// Lists the subjects of a program (and plan), in curricular order.
    ///
    /// Ordered by level sequence, unit number, subject sequence and code.
    #[must_use]
    pub fn subjects_for(&self, program_id: i64, plan_id: Option<i64>) -> Vec<&Subject> {
        let mut subjects: Vec<&Subject> = self
            .subjects
            .values()
            .filter(|s| self.subject_in_program(s, program_id, plan_id))
            .collect();
        subjects.sort_by(|a, b| {
            let level_seq = |s: &Subject| self.levels.get(&s.level_id).map_or(0, |l| l.sequence);
            (level_seq(a), a.unit_number, a.sequence, &a.code).cmp(&(
                level_seq(b),
                b.unit_number,
                b.sequence,
                &b.code,
            ))
        });
        subjects
    }

    /// Direct prerequisites of a subject.
    #[must_use]
    pub fn prerequisites_of(&self, subject_id: i64) -> Vec<&Subject> {
        self.subjects.get(&subject_id).map_or_else(Vec::new, |s| {
            s.prerequisite_ids
                .iter()
                .filter_map(|id| self.subjects.get(id))
                .collect()
        })
    }

    /// Every subject reachable through prerequisite edges, excluding the start.
    ///
    /// Terminates because the graph is validated acyclic at load.
    #[must_use]
    pub fn prerequisite_closure(&self, subject_id: i64) -> BTreeSet<i64> {
        let mut closure = BTreeSet::new();
        let mut stack: Vec<i64> = self
            .subjects
            .get(&subject_id)
            .map(|s| s.prerequisite_ids.iter().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            if closure.insert(id)
                && let Some(subject) = self.subjects.get(&id)
            {
                stack.extend(subject.prerequisite_ids.iter().copied());
            }
        }
        closure
    }

    /// The B-check anchoring `unit` in the program and plan.
    #[must_use]
    pub fn bcheck_for_unit(&self, program_id: i64, plan_id: Option<i64>, unit: u32) -> Option<&Subject> {
        self.subjects_for(program_id, plan_id).into_iter().find(|s| {
            s.category == SubjectCategory::BCheck && s.unit_number == Some(unit)
        })
    }

    /// The skill numbered `number` within `unit`.
    #[must_use]
    pub fn bskill_for_unit(
        &self,
        program_id: i64,
        plan_id: Option<i64>,
        unit: u32,
        number: u32,
    ) -> Option<&Subject> {
        self.subjects_for(program_id, plan_id).into_iter().find(|s| {
            s.category == SubjectCategory::BSkills
                && s.unit_number == Some(unit)
                && s.bskill_number == Some(number)
        })
    }

    /// All skills of `unit`, in curricular order.
    #[must_use]
    pub fn bskills_of_unit(&self, program_id: i64, plan_id: Option<i64>, unit: u32) -> Vec<&Subject> {
        self.subjects_for(program_id, plan_id)
            .into_iter()
            .filter(|s| s.category == SubjectCategory::BSkills && s.unit_number == Some(unit))
            .collect()
    }

    /// All B-checks of the program and plan, ascending by unit.
    #[must_use]
    pub fn bchecks_ascending(&self, program_id: i64, plan_id: Option<i64>) -> Vec<&Subject> {
        let mut bchecks: Vec<&Subject> = self
            .subjects_for(program_id, plan_id)
            .into_iter()
            .filter(|s| s.category == SubjectCategory::BCheck)
            .collect();
        bchecks.sort_by_key(|s| (s.unit_number, s.id));
        bchecks
    }

    /// The oral test whose block brackets `unit`.
    #[must_use]
    pub fn oral_test_covering(&self, program_id: i64, plan_id: Option<i64>, unit: u32) -> Option<&Subject> {
        self.subjects_for(program_id, plan_id)
            .into_iter()
            .find(|s| s.category == SubjectCategory::OralTest && s.block_covers(unit))
    }

    /// The unit a subject counts towards, if any.
    #[must_use]
    pub fn unit_of(&self, subject_id: i64) -> Option<u32> {
        self.subjects.get(&subject_id).and_then(|s| s.unit_number)
    }

    /// The level of a program whose unit range contains `unit`.
    #[must_use]
    pub fn level_for_unit(&self, program_id: i64, unit: u32) -> Option<&Level> {
        self.levels
            .values()
            .filter(|l| self.program_of_level(l.id) == Some(program_id))
            .find(|l| l.contains_unit(unit))
    }

    /// Subjects of the program interchangeable with `subject` across plans.
    ///
    /// Two subjects are equivalent when they share category, unit and skill
    /// number. The subject itself is included.
    #[must_use]
    pub fn equivalents_of<'a>(&'a self, subject: &'a Subject, program_id: i64) -> Vec<&'a Subject> {
        if subject.unit_number.is_none() {
            return vec![subject];
        }
        self.subjects
            .values()
            .filter(|s| {
                s.id == subject.id
                    || (s.category == subject.category
                        && s.unit_number == subject.unit_number
                        && s.bskill_number == subject.bskill_number
                        && self.program_of_level(s.level_id) == Some(program_id))
            })
            .collect()
    }
}
