//! Business logic services

pub mod catalog;
pub mod users;

use crate::{config::UsersConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, users_config: UsersConfig) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), users_config),
            catalog: catalog::CatalogService::new(repository),
        }
    }
}
