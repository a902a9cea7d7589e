//! Typed responses returned by [`Session`](crate::Session) operations.

/// One command's echoed input and captured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The text that was sent to the device.
    pub input: String,
    /// The captured output.
    pub result: String,
    /// Whether the device reported the command as failed.
    pub failed: bool,
}

/// Responses for one submitted command batch, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiResponse {
    pub responses: Vec<Response>,
}

/// Result of a structured config-management operation (get or load).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgResponse {
    /// Operation label, e.g. `get-config-running`.
    pub operation: String,
    pub result: String,
}

/// Diff of a pending candidate configuration against a datastore, in the
/// three renderings devices typically offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResponse {
    /// Operation label, e.g. `diff-running`.
    pub operation: String,
    pub device_diff: String,
    pub side_by_side_diff: String,
    pub unified_diff: String,
}

impl DiffResponse {
    /// Render the three diff forms as one composite text block, the shape
    /// written to disk by the file sink.
    pub fn composite(&self) -> String {
        format!(
            "=== device diff ===\n{}\n\n=== side-by-side diff ===\n{}\n\n=== unified diff ===\n{}\n",
            self.device_diff, self.side_by_side_diff, self.unified_diff
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_contains_all_three_renderings() {
        let diff = DiffResponse {
            operation: "diff-running".into(),
            device_diff: "dev".into(),
            side_by_side_diff: "sbs".into(),
            unified_diff: "uni".into(),
        };
        let text = diff.composite();
        assert!(text.contains("=== device diff ===\ndev"));
        assert!(text.contains("=== side-by-side diff ===\nsbs"));
        assert!(text.contains("=== unified diff ===\nuni"));
    }
}
