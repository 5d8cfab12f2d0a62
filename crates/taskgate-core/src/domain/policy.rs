//! Business rules applied after a token has passed the type gate.
//!
//! Rules are pure functions of the decoded task and the current time. They
//! run only once decoding and type confirmation have succeeded.

use chrono::{NaiveDateTime, TimeDelta};

use super::task::DecodedTask;
use super::verdict::{PolicyVerdict, ReasonCode};

/// A domain check on an already type-confirmed task.
pub trait BusinessRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the rejection verdict when the task violates the rule.
    fn check(&self, task: &DecodedTask, now: NaiveDateTime) -> Result<(), PolicyVerdict>;
}

/// Rejects tasks whose requested time lies further in the past than
/// `tolerance`.
#[derive(Debug, Clone)]
pub struct ExpiryRule {
    tolerance: TimeDelta,
}

impl ExpiryRule {
    pub fn new(tolerance: TimeDelta) -> Self {
        Self { tolerance }
    }
}

impl BusinessRule for ExpiryRule {
    fn name(&self) -> &'static str {
        "expiry"
    }

    fn check(&self, task: &DecodedTask, now: NaiveDateTime) -> Result<(), PolicyVerdict> {
        // an unrepresentable cutoff means nothing can be older than it
        let Some(cutoff) = now.checked_sub_signed(self.tolerance) else {
            return Ok(());
        };
        if task.requested_execution_time < cutoff {
            return Err(PolicyVerdict::rejected(
                ReasonCode::Expired,
                format!(
                    "requested execution time {} is before {}",
                    task.requested_execution_time, cutoff
                ),
            ));
        }
        Ok(())
    }
}

/// Rejects tasks scheduled more than `max_lead` into the future.
#[derive(Debug, Clone)]
pub struct MaxLeadRule {
    max_lead: TimeDelta,
}

impl MaxLeadRule {
    pub fn new(max_lead: TimeDelta) -> Self {
        Self { max_lead }
    }
}

impl BusinessRule for MaxLeadRule {
    fn name(&self) -> &'static str {
        "max_lead"
    }

    fn check(&self, task: &DecodedTask, now: NaiveDateTime) -> Result<(), PolicyVerdict> {
        let Some(horizon) = now.checked_add_signed(self.max_lead) else {
            return Ok(());
        };
        if task.requested_execution_time > horizon {
            return Err(PolicyVerdict::rejected(
                ReasonCode::Expired,
                format!(
                    "requested execution time {} is after {}",
                    task.requested_execution_time, horizon
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn task_at(offset_secs: i64) -> DecodedTask {
        DecodedTask::new("wait", "sleep 5", now() + TimeDelta::seconds(offset_secs))
    }

    #[rstest]
    #[case::future(5, 0, true)]
    #[case::exactly_now(0, 0, true)]
    #[case::seconds_ago(-3, 0, false)]
    #[case::within_tolerance(-3, 10, true)]
    #[case::at_tolerance_edge(-10, 10, true)]
    #[case::beyond_tolerance(-11, 10, false)]
    fn expiry(#[case] offset: i64, #[case] tolerance: i64, #[case] ok: bool) {
        let rule = ExpiryRule::new(TimeDelta::seconds(tolerance));
        let result = rule.check(&task_at(offset), now());
        assert_eq!(result.is_ok(), ok);
        if let Err(v) = result {
            assert_eq!(v.reason_code, ReasonCode::Expired);
        }
    }

    #[rstest]
    #[case::near(60, true)]
    #[case::at_horizon(600, true)]
    #[case::far(601, false)]
    fn max_lead(#[case] offset: i64, #[case] ok: bool) {
        let rule = MaxLeadRule::new(TimeDelta::seconds(600));
        assert_eq!(rule.check(&task_at(offset), now()).is_ok(), ok);
    }

    #[test]
    fn huge_tolerance_does_not_overflow() {
        let rule = ExpiryRule::new(TimeDelta::MAX);
        assert!(rule.check(&task_at(-1_000_000), now()).is_ok());
    }
}
