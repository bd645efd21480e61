//! Roadmap data model — missions, weeks, and the "current position" derivations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RoadmapError;

/// An atomic actionable task within a week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    /// Unique within its roadmap, stable for the mission's lifetime
    /// (convention: `w<week>_m<n>`).
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

/// One week of the curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumWeek {
    /// 1-based week number; contiguous and strictly increasing across the
    /// curriculum (enforced by validation).
    pub week: u32,
    pub theme: String,
    pub missions: Vec<Mission>,
}

impl CurriculumWeek {
    /// The mission the user is working on: the first uncompleted mission in
    /// insertion order, or the first mission when the week is fully done.
    /// `None` only for a week with no missions, which validation rejects.
    pub fn current_mission(&self) -> Option<&Mission> {
        self.missions
            .iter()
            .find(|m| !m.is_completed)
            .or_else(|| self.missions.first())
    }
}

/// A generated multi-week curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roadmap {
    /// Assigned by the remote store on first save; immutable afterwards and
    /// the join key for completion commits and chat association.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub project_title: String,
    pub curriculum: Vec<CurriculumWeek>,
}

impl Roadmap {
    /// The week the user is working on: the first week containing an
    /// uncompleted mission, or the last week when everything is done.
    ///
    /// Recomputed on every call, since completion state changes between turns.
    pub fn current_week(&self) -> Result<&CurriculumWeek, RoadmapError> {
        self.curriculum
            .iter()
            .find(|w| w.missions.iter().any(|m| !m.is_completed))
            .or_else(|| self.curriculum.last())
            .ok_or(RoadmapError::EmptyCurriculum)
    }

    /// `(completed, total)` mission counts across the whole curriculum.
    pub fn mission_counts(&self) -> (u32, u32) {
        let mut completed = 0;
        let mut total = 0;
        for week in &self.curriculum {
            for mission in &week.missions {
                total += 1;
                if mission.is_completed {
                    completed += 1;
                }
            }
        }
        (completed, total)
    }

    /// Completed-mission fraction in `[0, 1]`; `0.0` for an empty roadmap.
    pub fn progress(&self) -> f64 {
        let (completed, total) = self.mission_counts();
        if total == 0 {
            0.0
        } else {
            f64::from(completed) / f64::from(total)
        }
    }

    /// The natural-language position hint handed to the coach with every
    /// turn. Derived solely from [`Self::current_week`] and
    /// [`CurriculumWeek::current_mission`].
    pub fn context_hint(&self) -> Result<String, RoadmapError> {
        let week = self.current_week()?;
        let mission = week
            .current_mission()
            .ok_or(RoadmapError::EmptyWeek { week: week.week })?;
        Ok(format!(
            "The user is on week {}, working on mission \"{}\".",
            week.week, mission.title
        ))
    }
}

/// Read-only projection used for the roadmap list outside an active session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapSummary {
    pub id: i64,
    pub project_title: String,
    pub goal: String,
    pub level: String,
    pub created_at: DateTime<Utc>,
    pub total_missions: u32,
    pub completed_missions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mission(id: &str, completed: bool) -> Mission {
        Mission {
            id: id.to_string(),
            title: format!("Mission {id}"),
            is_completed: completed,
        }
    }

    fn roadmap(weeks: Vec<Vec<bool>>) -> Roadmap {
        Roadmap {
            id: Some(1),
            project_title: "Learn Rust".to_string(),
            curriculum: weeks
                .into_iter()
                .enumerate()
                .map(|(i, missions)| CurriculumWeek {
                    week: i as u32 + 1,
                    theme: format!("Week {} theme", i + 1),
                    missions: missions
                        .into_iter()
                        .enumerate()
                        .map(|(j, done)| mission(&format!("w{}_m{}", i + 1, j + 1), done))
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn current_week_is_first_with_open_mission() {
        let r = roadmap(vec![vec![true, true], vec![true, false], vec![false]]);
        assert_eq!(r.current_week().unwrap().week, 2);
    }

    #[test]
    fn current_week_falls_back_to_last_when_all_done() {
        let r = roadmap(vec![vec![true], vec![true, true]]);
        assert_eq!(r.current_week().unwrap().week, 2);
    }

    #[test]
    fn current_week_rejects_empty_curriculum() {
        let r = roadmap(vec![]);
        assert_eq!(r.current_week().unwrap_err(), RoadmapError::EmptyCurriculum);
    }

    #[test]
    fn current_mission_is_first_open_in_insertion_order() {
        let r = roadmap(vec![vec![true, false, false]]);
        let week = r.current_week().unwrap();
        assert_eq!(week.current_mission().unwrap().id, "w1_m2");
    }

    #[test]
    fn current_mission_falls_back_to_first_when_week_done() {
        let r = roadmap(vec![vec![true, true]]);
        let week = r.current_week().unwrap();
        assert_eq!(week.current_mission().unwrap().id, "w1_m1");
    }

    #[test]
    fn derivations_are_idempotent_reads() {
        let r = roadmap(vec![vec![true, false], vec![false]]);
        let first = (r.current_week().unwrap().week, r.progress());
        let second = (r.current_week().unwrap().week, r.progress());
        assert_eq!(first, second);
    }

    #[test]
    fn progress_counts_across_weeks() {
        let r = roadmap(vec![vec![true, false], vec![true, false]]);
        assert_eq!(r.mission_counts(), (2, 4));
        assert!((r.progress() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_is_zero_for_empty_roadmap() {
        let r = roadmap(vec![]);
        assert_eq!(r.progress(), 0.0);
    }

    #[test]
    fn context_hint_names_week_and_mission() {
        let r = roadmap(vec![vec![true], vec![false]]);
        let hint = r.context_hint().unwrap();
        assert!(hint.contains("week 2"));
        assert!(hint.contains("\"Mission w2_m1\""));
    }

    #[test]
    fn mission_serde_defaults_completion_to_false() {
        let m: Mission = serde_json::from_str(r#"{"id": "w1_m1", "title": "Read the book"}"#)
            .unwrap();
        assert!(!m.is_completed);
    }

    #[test]
    fn roadmap_serde_roundtrip() {
        let r = roadmap(vec![vec![false, true]]);
        let json = serde_json::to_string(&r).unwrap();
        let parsed: Roadmap = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, r);
    }

    #[test]
    fn roadmap_without_id_omits_the_field() {
        let mut r = roadmap(vec![vec![false]]);
        r.id = None;
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("\"id\":null"));
    }
}
