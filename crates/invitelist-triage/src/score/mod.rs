pub mod engagement;

pub use engagement::{
    EngagementWeights, edit_weight, experience_multiplier, final_score, magnitude_factor,
    recency_factor,
};
