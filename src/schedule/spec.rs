/// Schedule spec derivation
///
/// A definition implies at most one recurring schedule, taken from its
/// first interval-trigger step. A cron expression in the step params wins
/// over a plain minute interval.

use crate::workflow::types::{Step, INTERVAL_TRIGGER};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recurring-execution contract derived from an interval trigger
///
/// Exactly one of the two forms; serializes as `{"cron": "..."}` or
/// `{"intervalSeconds": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScheduleSpec {
    Cron(String),
    IntervalSeconds(u64),
}

/// Derive the schedule spec implied by a definition's steps
///
/// Only the first interval-trigger step in declaration order is honored;
/// additional ones are ignored, a documented limitation rather than an
/// error. An interval trigger with neither a `cron` nor an `interval`
/// parameter yields no schedule.
pub fn extract_schedule_spec(steps: &[Step]) -> Option<ScheduleSpec> {
    let trigger = steps.iter().find(|s| s.step_type == INTERVAL_TRIGGER)?;
    if let Some(cron) = trigger.params.get("cron").and_then(Value::as_str) {
        return Some(ScheduleSpec::Cron(cron.to_string()));
    }
    if let Some(minutes) = trigger.params.get("interval").and_then(Value::as_u64) {
        return Some(ScheduleSpec::IntervalSeconds(minutes * 60));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trigger(id: &str, params: Value) -> Step {
        Step {
            id: id.into(),
            step_type: INTERVAL_TRIGGER.into(),
            name: id.into(),
            params,
        }
    }

    fn activity(id: &str) -> Step {
        Step {
            id: id.into(),
            step_type: "work".into(),
            name: id.into(),
            params: json!({}),
        }
    }

    #[test]
    fn cron_param_wins() {
        let steps = vec![trigger("t", json!({ "cron": "0 0 * * *", "interval": 5 }))];
        assert_eq!(
            extract_schedule_spec(&steps),
            Some(ScheduleSpec::Cron("0 0 * * *".into()))
        );
    }

    #[test]
    fn interval_minutes_convert_to_seconds() {
        let steps = vec![trigger("t", json!({ "interval": 15 }))];
        assert_eq!(
            extract_schedule_spec(&steps),
            Some(ScheduleSpec::IntervalSeconds(900))
        );
    }

    #[test]
    fn no_interval_trigger_means_no_schedule() {
        assert_eq!(extract_schedule_spec(&[activity("a")]), None);
        assert_eq!(extract_schedule_spec(&[]), None);
    }

    #[test]
    fn trigger_without_schedule_params_means_no_schedule() {
        let steps = vec![trigger("t", json!({}))];
        assert_eq!(extract_schedule_spec(&steps), None);
    }

    // Documented limitation: with several interval triggers only the first
    // in declaration order is honored.
    #[test]
    fn first_interval_trigger_wins() {
        let steps = vec![
            activity("a"),
            trigger("t1", json!({ "interval": 1 })),
            trigger("t2", json!({ "cron": "* * * * *" })),
        ];
        assert_eq!(
            extract_schedule_spec(&steps),
            Some(ScheduleSpec::IntervalSeconds(60))
        );
    }

    #[test]
    fn spec_serializes_as_tagged_union() {
        let cron = serde_json::to_value(ScheduleSpec::Cron("0 * * * *".into())).unwrap();
        assert_eq!(cron, json!({ "cron": "0 * * * *" }));
        let interval = serde_json::to_value(ScheduleSpec::IntervalSeconds(120)).unwrap();
        assert_eq!(interval, json!({ "intervalSeconds": 120 }));
    }
}
