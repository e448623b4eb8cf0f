use serde::Serialize;

/// How the sample counter reacts to interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AccumulationPolicy {
    /// A frame with a pose change restarts the series at 1.
    #[default]
    ResetOnInteraction,
    /// The counter advances every frame regardless of interaction. Samples
    /// from earlier viewpoints keep blending in and fade out as `1 / n`.
    FreeRunning,
}

/// Progressive-accumulation counter shared with the compute kernel.
///
/// The counter is a blend weight, not a diagnostic: the kernel mixes the new
/// sample into the image with weight `1 / sample_count`, so the value uploaded
/// for a frame must be exactly the number of samples that frame completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameState {
    policy: AccumulationPolicy,
    sample_count: u32,
    next_sample: u32,
    interaction_active: bool,
}

impl FrameState {
    pub fn new(policy: AccumulationPolicy) -> Self {
        Self {
            policy,
            sample_count: 1,
            next_sample: 1,
            interaction_active: false,
        }
    }

    pub fn policy(&self) -> AccumulationPolicy {
        self.policy
    }

    /// Counter value of the most recent frame (1 before the first frame).
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn interaction_active(&self) -> bool {
        self.interaction_active
    }

    /// Weight of the newest sample in the running average.
    pub fn blend_weight(&self) -> f32 {
        1.0 / self.sample_count as f32
    }

    /// Advance to the next frame and return its counter value.
    pub fn advance(&mut self, interacting: bool) -> u32 {
        let count = match self.policy {
            AccumulationPolicy::ResetOnInteraction if interacting => 1,
            _ => self.next_sample,
        };
        if interacting && !self.interaction_active {
            tracing::debug!(previous = self.sample_count, "interaction started");
        }
        self.sample_count = count;
        self.next_sample = count.saturating_add(1);
        self.interaction_active = interacting;
        count
    }
}

impl Default for FrameState {
    fn default() -> Self {
        Self::new(AccumulationPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one() {
        let mut state = FrameState::default();
        assert_eq!(state.sample_count(), 1);
        assert_eq!(state.advance(false), 1);
        assert_eq!(state.blend_weight(), 1.0);
    }

    #[test]
    fn idle_frames_after_interaction_count_up() {
        let mut state = FrameState::default();
        for _ in 0..10 {
            state.advance(false);
        }
        let mut seq = vec![state.advance(true)];
        for _ in 0..7 {
            seq.push(state.advance(false));
        }
        assert_eq!(seq, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn interaction_resets_regardless_of_prior_value() {
        let mut state = FrameState::default();
        for _ in 0..500 {
            state.advance(false);
        }
        assert_eq!(state.sample_count(), 500);
        assert_eq!(state.advance(true), 1);
        assert!(state.interaction_active());
        // held button keeps the series pinned at 1
        assert_eq!(state.advance(true), 1);
        assert_eq!(state.advance(false), 2);
        assert!(!state.interaction_active());
    }

    #[test]
    fn free_running_ignores_interaction() {
        let mut state = FrameState::new(AccumulationPolicy::FreeRunning);
        let seq: Vec<u32> = [false, true, false, true, true]
            .into_iter()
            .map(|i| state.advance(i))
            .collect();
        assert_eq!(seq, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn counter_saturates() {
        let mut state = FrameState::default();
        state.next_sample = u32::MAX;
        assert_eq!(state.advance(false), u32::MAX);
        assert_eq!(state.advance(false), u32::MAX);
    }
}
