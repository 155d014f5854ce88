use crate::knox::{bn::BigNumber, cl::LARGE_MASTER_SECRET};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The holder's long lived secret binding all of its credentials
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MasterSecret {
    value: BigNumber,
}

impl MasterSecret {
    /// Generate a new master secret
    pub fn new() -> Self {
        Self {
            value: BigNumber::random(LARGE_MASTER_SECRET),
        }
    }

    pub(crate) fn value(&self) -> &BigNumber {
        &self.value
    }
}

impl Default for MasterSecret {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MasterSecret").field(&"<hidden>").finish()
    }
}
