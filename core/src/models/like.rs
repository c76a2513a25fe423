use serde::{Deserialize, Serialize};

use super::Interaction;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
    pub id: i64,
    #[serde(flatten)]
    pub interaction: Interaction,
    pub review_id: i64,
}
