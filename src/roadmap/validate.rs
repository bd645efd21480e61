//! Shape validation for AI-produced curricula.
//!
//! Generation collaborators return duck-typed JSON. Nothing crosses into
//! the curriculum model until it has passed [`validate_value`], and every
//! mission comes out uncompleted regardless of what the collaborator sent.

use serde_json::Value;

use crate::error::RoadmapError;

use super::model::Roadmap;

/// Parse and validate a raw collaborator payload into a [`Roadmap`].
///
/// Applies the structural checks of [`validate_structure`] and then the
/// [`force_uncompleted`] safety rewrite. The rewrite is not a validation
/// failure: a collaborator claiming pre-completed missions is corrected,
/// not rejected.
pub fn validate_value(value: Value) -> Result<Roadmap, RoadmapError> {
    let mut roadmap: Roadmap =
        serde_json::from_value(value).map_err(|e| RoadmapError::Shape(e.to_string()))?;
    validate_structure(&roadmap)?;
    force_uncompleted(&mut roadmap);
    Ok(roadmap)
}

/// Check the structural invariants of a curriculum.
///
/// Also used on the load path: a stored roadmap that fails these checks is
/// never installed as the active session.
pub fn validate_structure(roadmap: &Roadmap) -> Result<(), RoadmapError> {
    if roadmap.project_title.trim().is_empty() {
        return Err(RoadmapError::MissingProjectTitle);
    }
    if roadmap.curriculum.is_empty() {
        return Err(RoadmapError::EmptyCurriculum);
    }
    for (index, week) in roadmap.curriculum.iter().enumerate() {
        let expected = index as u32 + 1;
        if week.week == 0 {
            return Err(RoadmapError::InvalidWeekNumber { found: week.week });
        }
        if week.week != expected {
            return Err(RoadmapError::NonContiguousWeeks {
                expected,
                found: week.week,
            });
        }
        if week.missions.is_empty() {
            return Err(RoadmapError::EmptyWeek { week: week.week });
        }
        for mission in &week.missions {
            if mission.id.trim().is_empty() {
                return Err(RoadmapError::MissionMissingId { week: week.week });
            }
            if mission.title.trim().is_empty() {
                return Err(RoadmapError::MissionMissingTitle {
                    week: week.week,
                    id: mission.id.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Reset every mission to uncompleted. Generation must never hand back a
/// pre-completed roadmap.
pub fn force_uncompleted(roadmap: &mut Roadmap) {
    for week in &mut roadmap.curriculum {
        for mission in &mut week.missions {
            mission.is_completed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "project_title": "Learn Watercolor Painting",
            "curriculum": [
                {
                    "week": 1,
                    "theme": "Materials and first washes",
                    "missions": [
                        {"id": "w1_m1", "title": "Buy a starter palette", "is_completed": false},
                        {"id": "w1_m2", "title": "Paint a flat wash", "is_completed": true}
                    ]
                },
                {
                    "week": 2,
                    "theme": "Wet-on-wet",
                    "missions": [
                        {"id": "w2_m1", "title": "Paint a sky study", "is_completed": true}
                    ]
                }
            ]
        })
    }

    #[test]
    fn accepts_valid_payload_and_forces_uncompleted() {
        let roadmap = validate_value(valid_payload()).unwrap();
        assert_eq!(roadmap.project_title, "Learn Watercolor Painting");
        assert_eq!(roadmap.curriculum.len(), 2);
        for week in &roadmap.curriculum {
            for mission in &week.missions {
                assert!(!mission.is_completed, "{} must start uncompleted", mission.id);
            }
        }
    }

    #[test]
    fn rejects_non_roadmap_json() {
        let err = validate_value(json!({"plan": "sure, here you go"})).unwrap_err();
        assert!(matches!(err, RoadmapError::Shape(_)));
    }

    #[test]
    fn rejects_missing_title() {
        let mut payload = valid_payload();
        payload["project_title"] = json!("   ");
        assert_eq!(
            validate_value(payload).unwrap_err(),
            RoadmapError::MissingProjectTitle
        );
    }

    #[test]
    fn rejects_empty_curriculum() {
        let mut payload = valid_payload();
        payload["curriculum"] = json!([]);
        assert_eq!(
            validate_value(payload).unwrap_err(),
            RoadmapError::EmptyCurriculum
        );
    }

    #[test]
    fn rejects_week_zero() {
        let mut payload = valid_payload();
        payload["curriculum"][0]["week"] = json!(0);
        assert_eq!(
            validate_value(payload).unwrap_err(),
            RoadmapError::InvalidWeekNumber { found: 0 }
        );
    }

    #[test]
    fn rejects_non_contiguous_weeks() {
        let mut payload = valid_payload();
        payload["curriculum"][1]["week"] = json!(3);
        assert_eq!(
            validate_value(payload).unwrap_err(),
            RoadmapError::NonContiguousWeeks {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_week_without_missions() {
        let mut payload = valid_payload();
        payload["curriculum"][1]["missions"] = json!([]);
        assert_eq!(
            validate_value(payload).unwrap_err(),
            RoadmapError::EmptyWeek { week: 2 }
        );
    }

    #[test]
    fn rejects_mission_without_id() {
        let mut payload = valid_payload();
        payload["curriculum"][0]["missions"][0]["id"] = json!("");
        assert_eq!(
            validate_value(payload).unwrap_err(),
            RoadmapError::MissionMissingId { week: 1 }
        );
    }

    #[test]
    fn rejects_mission_without_title() {
        let mut payload = valid_payload();
        payload["curriculum"][0]["missions"][1]["title"] = json!("");
        assert_eq!(
            validate_value(payload).unwrap_err(),
            RoadmapError::MissionMissingTitle {
                week: 1,
                id: "w1_m2".to_string()
            }
        );
    }

    #[test]
    fn accepts_payload_with_store_assigned_id() {
        let mut payload = valid_payload();
        payload["id"] = json!(42);
        let roadmap = validate_value(payload).unwrap();
        assert_eq!(roadmap.id, Some(42));
    }

    #[test]
    fn missing_is_completed_defaults_to_false() {
        let mut payload = valid_payload();
        payload["curriculum"][0]["missions"][0]
            .as_object_mut()
            .unwrap()
            .remove("is_completed");
        let roadmap = validate_value(payload).unwrap();
        assert!(!roadmap.curriculum[0].missions[0].is_completed);
    }
}
