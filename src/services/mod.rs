//! Business logic services

pub mod books;
pub mod redis;
pub mod security;
pub mod sessions;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub users: users::UsersService,
    pub sessions: sessions::SessionsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        redis_service: redis::RedisService,
    ) -> Self {
        let sessions = sessions::SessionsService::new(repository.clone(), redis_service);
        Self {
            books: books::BooksService::new(repository.clone()),
            users: users::UsersService::new(repository, auth_config, sessions.clone()),
            sessions,
        }
    }
}
