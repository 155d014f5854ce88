use super::RevocationTailsAccessor;
use crate::CredxResult;
use blsful::inner_types::*;
use serde::{Deserialize, Serialize};

/// A membership witness for one registry index.
///
/// For index i the witness is the sum of tail[L + 1 - j + i] over every
/// other member j, which pairs with g_i against the accumulator to give z.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Witness {
    pub(crate) omega: G2Projective,
}

impl Witness {
    /// Build a witness from scratch for the members `issued`
    pub fn new<'a>(
        rev_idx: u32,
        max_cred_num: u32,
        issued: impl IntoIterator<Item = &'a u32>,
        tails: &impl RevocationTailsAccessor,
    ) -> CredxResult<Self> {
        let mut omega = G2Projective::IDENTITY;
        for j in issued {
            if *j == rev_idx {
                continue;
            }
            omega += tails.access_tail(Self::tail_id(max_cred_num, rev_idx, *j)?)?.0;
        }
        Ok(Self { omega })
    }

    /// Apply membership changes since the witness was last computed
    pub fn update<'a>(
        &mut self,
        rev_idx: u32,
        max_cred_num: u32,
        issued: impl IntoIterator<Item = &'a u32>,
        revoked: impl IntoIterator<Item = &'a u32>,
        tails: &impl RevocationTailsAccessor,
    ) -> CredxResult<()> {
        for j in issued {
            if *j != rev_idx {
                self.omega += tails.access_tail(Self::tail_id(max_cred_num, rev_idx, *j)?)?.0;
            }
        }
        for j in revoked {
            if *j != rev_idx {
                self.omega -= tails.access_tail(Self::tail_id(max_cred_num, rev_idx, *j)?)?.0;
            }
        }
        Ok(())
    }

    fn tail_id(max_cred_num: u32, rev_idx: u32, member: u32) -> CredxResult<u32> {
        if member == 0 || member > max_cred_num {
            return Err(err_msg!(
                InvalidUserRevocId,
                "Index {} is outside the registry",
                member
            ));
        }
        Ok(max_cred_num + 1 - member + rev_idx)
    }
}
