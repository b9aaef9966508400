//! # Endpoint Statistics
//!
//! Pipeline-thread counters for one endpoint. These are plain fields, not
//! atomics: every writer runs on the pipeline thread. The cross-thread
//! signal for the scheduler is the state tracker, not these stats.

use serde::Serialize;

/// Per-endpoint counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EndpointStats {
    /// Packets successfully handed to the transport writer.
    pub packets_shipped: u64,
    /// Wire bytes handed to the transport writer.
    pub bytes_shipped: u64,
    /// Outbound packets rejected by an encoding stage.
    pub compose_errors: u64,
    /// Outbound packets declined by the transport writer.
    pub transport_errors: u64,
    /// Inbound packets drained out of the queue.
    pub packets_pulled: u64,
    /// Inbound packets the parser rejected.
    pub parse_errors: u64,
    /// Decoded packets the session declined.
    pub route_errors: u64,
}

impl EndpointStats {
    pub fn new() -> Self {
        EndpointStats::default()
    }

    /// Share of outbound submissions that failed before or at the transport.
    pub fn outbound_error_ratio(&self) -> f64 {
        let attempts = self.packets_shipped + self.compose_errors + self.transport_errors;
        if attempts == 0 {
            0.0
        } else {
            (self.compose_errors + self.transport_errors) as f64 / attempts as f64
        }
    }

    /// Share of pulled inbound packets that were dropped.
    pub fn inbound_drop_ratio(&self) -> f64 {
        if self.packets_pulled == 0 {
            0.0
        } else {
            (self.parse_errors + self.route_errors) as f64 / self.packets_pulled as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_handle_zero_traffic() {
        let stats = EndpointStats::new();
        assert_eq!(stats.outbound_error_ratio(), 0.0);
        assert_eq!(stats.inbound_drop_ratio(), 0.0);
    }

    #[test]
    fn outbound_error_ratio_counts_both_failure_kinds() {
        let stats = EndpointStats {
            packets_shipped: 6,
            compose_errors: 1,
            transport_errors: 1,
            ..EndpointStats::default()
        };
        assert!((stats.outbound_error_ratio() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_serialize_for_export() {
        let stats = EndpointStats {
            packets_shipped: 3,
            bytes_shipped: 57,
            ..EndpointStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["packets_shipped"], 3);
        assert_eq!(json["bytes_shipped"], 57);
    }
}
