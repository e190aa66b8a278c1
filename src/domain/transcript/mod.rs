//! Running transcript accumulator

/// Transcript built from a live recognition stream.
///
/// Finalized segments are append-only and joined with single spaces,
/// so a snapshot taken mid-stream is always a prefix of the final
/// text. The interim segment is display-only and replaced wholesale
/// by each interim event.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    finals: Vec<String>,
    interim: Option<String>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the interim segment
    pub fn set_interim(&mut self, text: impl Into<String>) {
        self.interim = Some(text.into());
    }

    /// Append a finalized segment and clear the interim.
    /// Blank segments are dropped.
    pub fn push_final(&mut self, segment: &str) {
        let trimmed = segment.trim();
        if !trimmed.is_empty() {
            self.finals.push(trimmed.to_string());
        }
        self.interim = None;
    }

    /// Finalized text only, single-space separated
    pub fn final_text(&self) -> String {
        self.finals.join(" ")
    }

    /// Finalized text plus the current interim segment, for live
    /// display
    pub fn snapshot(&self) -> String {
        match self.interim.as_deref() {
            Some(interim) if !interim.trim().is_empty() => {
                if self.finals.is_empty() {
                    interim.trim().to_string()
                } else {
                    format!("{} {}", self.final_text(), interim.trim())
                }
            }
            _ => self.final_text(),
        }
    }

    /// Number of finalized segments
    pub fn segment_count(&self) -> usize {
        self.finals.len()
    }

    /// Whether nothing has been finalized
    pub fn is_empty(&self) -> bool {
        self.finals.is_empty()
    }
}
