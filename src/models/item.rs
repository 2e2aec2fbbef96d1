use serde::{Deserialize, Serialize};

/// Placeholder price attached to every detected item. The pipeline has no
/// catalog lookup; downstream consumers treat this as opaque metadata.
pub const PLACEHOLDER_PRICE: f64 = 10.0;

/// A class inferred removed from the scene during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub class_name: String,
    pub price: f64,
}

impl Item {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            price: PLACEHOLDER_PRICE,
        }
    }
}
