// Metrics recorder for the realtime link, over the `metrics` facade
use metrics::{counter, gauge};
use std::time::Duration;

/// Records link health and throughput metrics. All methods are cheap and
/// safe to call from the connection task's hot path; they are no-ops until
/// the hosting process installs a metrics recorder.
#[derive(Debug, Clone, Default)]
pub struct LinkMetrics;

impl LinkMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_connection_status(&self, connected: bool) {
        gauge!("groundlink_connection_up").set(if connected { 1.0 } else { 0.0 });
    }

    pub fn record_reconnect_scheduled(&self, delay: Duration) {
        counter!("groundlink_reconnects_total").increment(1);
        gauge!("groundlink_reconnect_delay_seconds").set(delay.as_secs_f64());
    }

    pub fn record_frame_routed(&self, frame_type: &'static str) {
        counter!("groundlink_frames_routed_total", "frame_type" => frame_type).increment(1);
    }

    pub fn record_frame_dropped(&self, reason: &'static str) {
        counter!("groundlink_frames_dropped_total", "reason" => reason).increment(1);
    }

    pub fn record_control_sent(&self, verb: &'static str) {
        counter!("groundlink_control_sent_total", "verb" => verb).increment(1);
    }

    pub fn record_queue_depth(&self, depth: usize) {
        gauge!("groundlink_request_queue_depth").set(depth as f64);
    }
}
