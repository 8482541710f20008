//! Frame statistics for debug builds.

use std::fmt;

use instant::Duration;

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudStats {
    pub fps: f32,
    pub frame_ms: f32,
}

impl fmt::Display for HudStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} FPS ({:.2} ms)", self.fps, self.frame_ms)
    }
}

#[derive(Debug, Default)]
pub struct DebugHud {
    visible: bool,
    frames: u32,
    elapsed: Duration,
    last: Option<HudStats>,
}

impl DebugHud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn last(&self) -> Option<HudStats> {
        self.last
    }

    /// Count a frame. Returns fresh stats once per second while visible.
    pub fn frame(&mut self, dt: Duration) -> Option<HudStats> {
        if !self.visible {
            return None;
        }
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < REPORT_INTERVAL {
            return None;
        }
        let secs = self.elapsed.as_secs_f32();
        let stats = HudStats {
            fps: self.frames as f32 / secs,
            frame_ms: secs * 1000.0 / self.frames as f32,
        };
        self.frames = 0;
        self.elapsed = Duration::ZERO;
        self.last = Some(stats);
        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_hud_reports_nothing() {
        let mut hud = DebugHud::new();
        assert_eq!(hud.frame(Duration::from_secs(2)), None);
    }

    #[test]
    fn reports_once_per_interval() {
        let mut hud = DebugHud::new();
        hud.show();
        let frame = Duration::from_millis(250);

        assert_eq!(hud.frame(frame), None);
        assert_eq!(hud.frame(frame), None);
        assert_eq!(hud.frame(frame), None);
        let stats = hud.frame(frame).expect("stats after one second");

        assert!((stats.fps - 4.0).abs() < 1e-3);
        assert!((stats.frame_ms - 250.0).abs() < 1e-2);
        assert_eq!(hud.last(), Some(stats));
        assert_eq!(hud.frame(frame), None);
    }
}
