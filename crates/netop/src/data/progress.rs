/// Bytes received so far for the current attempt.
///
/// Passed to [`OperationDelegate::on_progress`](crate::OperationDelegate::on_progress)
/// after every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Wire bytes received in the current attempt (before decompression).
    pub bytes_received: u64,

    /// From the response `Content-Length`, when declared.
    pub expected_bytes: Option<u64>,

    /// 1-based attempt number; greater than 1 after a timeout retry.
    pub attempt: u32,
}

impl Progress {
    /// Percentage of the declared length received, if a length was declared.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.expected_bytes.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.bytes_received as f64 / total as f64) * 100.0
            }
        })
    }

    #[must_use]
    pub fn is_retrying(&self) -> bool { self.attempt > 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        let progress = Progress {
            bytes_received: 50,
            expected_bytes: Some(200),
            attempt:        1,
        };
        assert_eq!(progress.percentage(), Some(25.0));
        assert!(!progress.is_retrying());
    }

    #[test]
    fn test_percentage_unknown_or_empty() {
        let unknown = Progress {
            bytes_received: 10,
            expected_bytes: None,
            attempt:        2,
        };
        assert_eq!(unknown.percentage(), None);
        assert!(unknown.is_retrying());

        let empty = Progress {
            expected_bytes: Some(0),
            ..unknown
        };
        assert_eq!(empty.percentage(), Some(100.0));
    }
}
