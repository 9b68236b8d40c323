//! Mapping of backend replies onto submission outcomes.
//!
//! The backend reports business denials as English messages rather than codes. The
//! exact strings below are matched for compatibility until the server emits a
//! structured reason.

use crate::error::BackendError;
use crate::traits::backend::SubmitReply;
use crate::types::{BusinessRule, Failure};

pub const MSG_SUBMITTED: &str = "Attendance submitted successfully";
pub const MSG_ADMIN_DISABLED: &str = "Attendance disabled by Admin";
pub const MSG_OUTSIDE_TIME: &str = "Attendance only allowed at respective time";

/// Result of one submission, ready to feed the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Recorded {
        message: String,
        attendance: Option<serde_json::Value>,
    },
    Failed(Failure),
}

pub fn classify(result: Result<SubmitReply, BackendError>) -> SubmissionOutcome {
    match result {
        Ok(reply) => classify_reply(reply),
        Err(err) => SubmissionOutcome::Failed(classify_error(err)),
    }
}

fn classify_reply(reply: SubmitReply) -> SubmissionOutcome {
    if let Some(rule) = rule_from_message(&reply.message, reply.assigned_time.as_deref()) {
        return SubmissionOutcome::Failed(Failure::BusinessRule {
            rule,
            message: reply.message,
        });
    }

    // Anything else on a 2xx is a recorded attendance, as the server sometimes
    // words its success message differently.
    let message = if reply.message.trim().is_empty() {
        MSG_SUBMITTED.to_string()
    } else {
        reply.message
    };
    SubmissionOutcome::Recorded {
        message,
        attendance: reply.attendance,
    }
}

fn classify_error(err: BackendError) -> Failure {
    match err {
        BackendError::Rejected { status, message } => {
            let rule = rule_from_message(&message, None).unwrap_or(match status {
                401 => BusinessRule::Unauthorized,
                403 => BusinessRule::Forbidden,
                _ => BusinessRule::Rejected { status },
            });
            Failure::BusinessRule { rule, message }
        }
        other => Failure::Transient {
            message: other.to_string(),
        },
    }
}

fn rule_from_message(message: &str, assigned_time: Option<&str>) -> Option<BusinessRule> {
    match message.trim() {
        MSG_ADMIN_DISABLED => Some(BusinessRule::AdminDisabled),
        MSG_OUTSIDE_TIME => Some(BusinessRule::OutsideAssignedTime {
            assigned_time: assigned_time.map(str::to_string),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(message: &str) -> SubmitReply {
        SubmitReply {
            message: message.to_string(),
            ..SubmitReply::default()
        }
    }

    #[test]
    fn test_success_message_is_recorded() {
        let out = classify(Ok(reply(MSG_SUBMITTED)));
        assert_eq!(
            out,
            SubmissionOutcome::Recorded {
                message: MSG_SUBMITTED.to_string(),
                attendance: None
            }
        );
    }

    #[test]
    fn test_unknown_2xx_message_is_recorded_verbatim() {
        let out = classify(Ok(reply("Attendance saved")));
        assert!(matches!(out, SubmissionOutcome::Recorded { ref message, .. } if message == "Attendance saved"));
    }

    #[test]
    fn test_admin_disabled_is_business_rule() {
        let out = classify(Ok(reply(MSG_ADMIN_DISABLED)));
        assert_eq!(
            out,
            SubmissionOutcome::Failed(Failure::BusinessRule {
                rule: BusinessRule::AdminDisabled,
                message: MSG_ADMIN_DISABLED.to_string(),
            })
        );
    }

    #[test]
    fn test_outside_time_carries_assigned_time() {
        let out = classify(Ok(SubmitReply {
            message: MSG_OUTSIDE_TIME.to_string(),
            attendance: None,
            assigned_time: Some("16:00-18:00".to_string()),
        }));
        match out {
            SubmissionOutcome::Failed(Failure::BusinessRule { rule, .. }) => assert_eq!(
                rule,
                BusinessRule::OutsideAssignedTime {
                    assigned_time: Some("16:00-18:00".to_string())
                }
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_status_codes_map_to_rules() {
        let f = classify_error(BackendError::Rejected {
            status: 401,
            message: "jwt expired".into(),
        });
        assert!(matches!(f, Failure::BusinessRule { rule: BusinessRule::Unauthorized, .. }));

        let f = classify_error(BackendError::Rejected {
            status: 400,
            message: MSG_ADMIN_DISABLED.into(),
        });
        assert!(matches!(f, Failure::BusinessRule { rule: BusinessRule::AdminDisabled, .. }));

        let f = classify_error(BackendError::Rejected {
            status: 422,
            message: "bad coordinates".into(),
        });
        assert!(matches!(
            f,
            Failure::BusinessRule { rule: BusinessRule::Rejected { status: 422 }, .. }
        ));
    }

    #[test]
    fn test_network_and_server_errors_are_transient() {
        for err in [
            BackendError::Timeout,
            BackendError::Transport("connection refused".into()),
            BackendError::Server {
                status: 502,
                message: "Bad Gateway".into(),
            },
        ] {
            assert!(classify_error(err).is_retryable());
        }
    }
}
