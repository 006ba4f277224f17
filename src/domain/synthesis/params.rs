use serde::{Deserialize, Serialize};

/// Engine overrides applied to every synthesis call. `None` keeps the
/// voice's own defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisParams {
    pub length_scale: Option<f32>,
    pub noise_scale: Option<f32>,
    pub noise_w: Option<f32>,
    pub speaker_id: Option<i64>,
}
