use crate::domain::{RoleRequirement, Segment, Shift, ShiftRequirements};

/// Resolve one requirement field: the shift's override block wins, then the segment default,
/// then nothing.
///
/// An override that is present shadows the default even when it is "empty" (`minRest: 0`,
/// `roleComposition: []`), which is how a single shift opts out of a segment rule.
pub fn resolve_requirement<'a, T: ?Sized>(
    shift: &'a Shift,
    segment: Option<&'a Segment>,
    from_override: impl FnOnce(&'a ShiftRequirements) -> Option<&'a T>,
    from_segment: impl FnOnce(&'a Segment) -> Option<&'a T>,
) -> Option<&'a T> {
    shift
        .requirements
        .as_ref()
        .and_then(from_override)
        .or_else(|| segment.and_then(from_segment))
}

/// Minimum rest after `shift`, in hours; 0 means no requirement.
pub fn min_rest_hours(shift: &Shift, segment: Option<&Segment>) -> f64 {
    resolve_requirement(
        shift,
        segment,
        |r| r.min_rest.as_ref(),
        |s| s.min_rest_hours_after.as_ref(),
    )
    .copied()
    .unwrap_or(0.0)
}

/// Roles of which an assignee must hold at least one; empty means no requirement.
pub fn required_roles<'a>(shift: &'a Shift, segment: Option<&'a Segment>) -> &'a [RoleRequirement] {
    resolve_requirement(
        shift,
        segment,
        |r| r.role_composition.as_deref(),
        |s| s.role_composition.as_deref(),
    )
    .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(requirements: Option<ShiftRequirements>) -> Shift {
        Shift {
            id: "s1".to_string(),
            task_id: "t1".to_string(),
            segment_id: "seg1".to_string(),
            start_time: "2024-01-10T09:00:00Z".to_string(),
            end_time: "2024-01-10T17:00:00Z".to_string(),
            assigned_person_ids: vec![],
            is_cancelled: false,
            requirements,
        }
    }

    fn segment() -> Segment {
        Segment {
            id: "seg1".to_string(),
            name: None,
            min_rest_hours_after: Some(12.0),
            role_composition: Some(vec![RoleRequirement {
                role_id: "driver".to_string(),
                count: None,
            }]),
        }
    }

    #[test]
    fn segment_default_applies_without_override() {
        let s = shift(None);
        let seg = segment();
        assert_eq!(min_rest_hours(&s, Some(&seg)), 12.0);
        assert_eq!(required_roles(&s, Some(&seg))[0].role_id, "driver");
    }

    #[test]
    fn override_shadows_segment_even_when_empty() {
        let s = shift(Some(ShiftRequirements {
            min_rest: Some(0.0),
            role_composition: Some(vec![]),
        }));
        let seg = segment();
        assert_eq!(min_rest_hours(&s, Some(&seg)), 0.0);
        assert!(required_roles(&s, Some(&seg)).is_empty());
    }

    #[test]
    fn partial_override_falls_through_per_field() {
        let s = shift(Some(ShiftRequirements {
            min_rest: Some(8.0),
            role_composition: None,
        }));
        let seg = segment();
        assert_eq!(min_rest_hours(&s, Some(&seg)), 8.0);
        assert_eq!(required_roles(&s, Some(&seg)).len(), 1);
    }

    #[test]
    fn unresolved_segment_means_no_requirement() {
        let s = shift(None);
        assert_eq!(min_rest_hours(&s, None), 0.0);
        assert!(required_roles(&s, None).is_empty());
    }
}
