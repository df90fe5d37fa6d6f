use serde::{Deserialize, Serialize};

use crate::model::coach::StaffRole;

/// Claims of the bearer tokens minted by the hosted auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Profile id of the signed-in staff member.
    pub sub: String,
    pub role: StaffRole,
    pub exp: usize,
}
