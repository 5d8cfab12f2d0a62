//! The only type the gate lets through.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::errors::DecodeError;
use crate::stream::datetime::without_leap_second;
use crate::typed::task::{FieldSpec, FieldValue, FieldValues, StreamClass};

/// A scheduled task request decoded from a token.
///
/// Constructed per decode call and never persisted. The action is an opaque
/// label: nothing in this crate executes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTask {
    pub task_name: String,
    pub task_action: String,
    pub requested_execution_time: NaiveDateTime,
}

impl DecodedTask {
    /// A leap second in `requested_execution_time` is folded into the
    /// preceding second, since tokens cannot carry one.
    pub fn new(
        task_name: impl Into<String>,
        task_action: impl Into<String>,
        requested_execution_time: NaiveDateTime,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            task_action: task_action.into(),
            requested_execution_time: without_leap_second(requested_execution_time),
        }
    }
}

impl StreamClass for DecodedTask {
    const CLASS_NAME: &'static str = "org.dummy.insecure.framework.VulnerableTaskHolder";
    const SERIAL_VERSION: i64 = 2;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::local_date_time("requestedExecutionTime"),
        FieldSpec::text("taskAction"),
        FieldSpec::text("taskName"),
    ];

    fn materialize(mut fields: FieldValues) -> Result<Self, DecodeError> {
        Ok(Self {
            requested_execution_time: fields.take_local_date_time("requestedExecutionTime")?,
            task_action: fields.take_text("taskAction")?,
            task_name: fields.take_text("taskName")?,
        })
    }

    fn field_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::LocalDateTime(self.requested_execution_time),
            FieldValue::Text(self.task_action.clone()),
            FieldValue::Text(self.task_name.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn fields_are_in_stream_order() {
        let names: Vec<_> = DecodedTask::FIELDS.iter().map(|f| f.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn field_values_follow_schema() {
        let when = NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 5)
            .unwrap();
        let task = DecodedTask::new("wait", "sleep 5", when);
        let values = task.field_values();
        assert_eq!(values.len(), DecodedTask::FIELDS.len());
        assert_eq!(values[0], FieldValue::LocalDateTime(when));
        assert_eq!(values[2], FieldValue::Text("wait".into()));
    }

    #[test]
    fn json_uses_camel_case() {
        let when = NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 5)
            .unwrap();
        let json = serde_json::to_value(DecodedTask::new("wait", "sleep 5", when)).unwrap();
        assert_eq!(json["taskName"], "wait");
        assert_eq!(json["taskAction"], "sleep 5");
        assert_eq!(json["requestedExecutionTime"], "2030-01-01T00:00:05");
    }
}
