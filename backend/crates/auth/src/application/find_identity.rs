//! Find Identity Use Case

use std::sync::Arc;

use crate::domain::entity::identity::Identity;
use crate::domain::repository::IdentityRepository;
use crate::domain::value_object::identity_id::IdentityId;
use crate::error::{AuthError, AuthResult};

pub struct FindIdentityUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
}

impl<R> FindIdentityUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, id: IdentityId) -> AuthResult<Identity> {
        self.repo.find_by_id(id).await?.ok_or(AuthError::NotFound)
    }
}
