use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Which side of the marketplace an identity acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[repr(i16)]
pub enum UserRole {
    #[default]
    #[display("client")]
    Client = 0,
    #[display("owner")]
    Owner = 1,
    #[display("delivery")]
    Delivery = 2,
}

impl UserRole {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            Client => "client",
            Owner => "owner",
            Delivery => "delivery",
        }
    }
}

impl TryFrom<i16> for UserRole {
    type Error = AuthError;

    fn try_from(id: i16) -> Result<Self, Self::Error> {
        use UserRole::*;
        match id {
            0 => Ok(Client),
            1 => Ok(Owner),
            2 => Ok(Delivery),
            _ => {
                tracing::error!(role_id = id, "Invalid UserRole id");
                Err(AuthError::Unexpected(format!("Invalid UserRole id: {id}")))
            }
        }
    }
}
