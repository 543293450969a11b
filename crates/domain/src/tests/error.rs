// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::DomainError;

#[test]
fn test_domain_error_display() {
    let err: DomainError = DomainError::CyclicPrerequisites {
        program_id: 1,
        cycle: vec![101, 211, 101],
    };
    assert_eq!(
        format!("{err}"),
        "Prerequisite graph of program 1 is cyclic: 101 -> 211 -> 101"
    );

    let err: DomainError = DomainError::DanglingReference {
        entity: "Subject",
        entity_id: 5,
        missing_id: 9,
    };
    assert_eq!(format!("{err}"), "Subject 5 references missing id 9");

    let err: DomainError = DomainError::InvalidLevelRange {
        level_id: 3,
        min_unit: 5,
        max_unit: 4,
    };
    assert_eq!(
        format!("{err}"),
        "Level 3 has an empty unit range 5..=4"
    );

    let err: DomainError = DomainError::InvalidSessionTransition {
        from: String::from("done"),
        to: String::from("active"),
    };
    assert_eq!(format!("{err}"), "Session cannot move from 'done' to 'active'");

    let err: DomainError = DomainError::InvalidFreezePeriod { freeze_id: 8 };
    assert_eq!(format!("{err}"), "Freeze period 8 ends before it starts");
}
