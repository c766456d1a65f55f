mod refresh_token;
mod user;

pub use refresh_token::InMemoryRefreshTokenRepository;
pub use user::InMemoryUserRepository;
