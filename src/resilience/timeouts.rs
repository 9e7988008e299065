//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap decision-service calls with a deadline
//! - Map an elapsed deadline to a distinct error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - The wrapped future is dropped on timeout

use std::future::Future;
use std::time::Duration;

use crate::decision::{DecisionError, DecisionResult};

/// Run `fut`, failing with `DecisionError::Timeout` if it outlives `deadline`.
pub async fn with_deadline<T, F>(op: &'static str, deadline: Duration, fut: F) -> DecisionResult<T>
where
    F: Future<Output = DecisionResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(DecisionError::Timeout {
            op,
            millis: deadline.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_result_through() {
        let ok = with_deadline("op", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: DecisionResult<()> =
            with_deadline("op", Duration::from_secs(1), async { Err(DecisionError::NotInitialized) }).await;
        assert!(matches!(err, Err(DecisionError::NotInitialized)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapses() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        };
        let result = with_deadline("check_gate", Duration::from_millis(250), slow).await;
        match result {
            Err(DecisionError::Timeout { op, millis }) => {
                assert_eq!(op, "check_gate");
                assert_eq!(millis, 250);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
