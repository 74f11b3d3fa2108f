use serde::{Deserialize, Serialize};

/// A weighted edge between two nodes. Its key `(from, to)` lives in the owning genome's
/// connection map, and always satisfies `depth(from) < depth(to)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub weight: f64,
    pub active: bool,
}

impl Connection {
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            active: true,
        }
    }

    #[inline]
    pub fn toggle(&mut self) {
        self.active = !self.active;
    }
}
