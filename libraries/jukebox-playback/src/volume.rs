//! Volume control
//!
//! Volume is kept as an integer percentage. Output sessions take a linear gain
//! where 100% is unity; values above 100% amplify. 0% means muted.

/// Volume controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume {
    /// Volume level in percent (0 = muted, may exceed 100)
    percent: u32,
}

impl Volume {
    /// Create new volume controller
    pub fn new(percent: u32) -> Self {
        Self { percent }
    }

    /// Set volume level in percent
    pub fn set_percent(&mut self, percent: u32) {
        self.percent = percent;
    }

    /// Get current volume level in percent
    pub fn percent(&self) -> u32 {
        self.percent
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.percent == 0
    }

    /// Linear gain handed to the output session
    pub fn gain(&self) -> f32 {
        self.percent as f32 / 100.0
    }

    /// Status label: `"<n>% volume"` or `"muted"`
    pub fn label(&self) -> String {
        if self.is_muted() {
            "muted".to_string()
        } else {
            format!("{}% volume", self.percent)
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(100)
    }
}
