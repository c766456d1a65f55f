use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::auth::models::RefreshTokenRecord;
use crate::domain::auth::models::RefreshTokenState;
use crate::domain::auth::ports::RefreshTokenRepository;
use crate::domain::errors::RepositoryError;
use crate::domain::user::models::UserId;

/// Refresh token store held in process memory, keyed by token digest.
#[derive(Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn revoke_where(
    tokens: &mut HashMap<String, RefreshTokenRecord>,
    predicate: impl Fn(&RefreshTokenRecord) -> bool,
) -> usize {
    let mut revoked = 0;
    for record in tokens.values_mut() {
        if record.state == RefreshTokenState::Active && predicate(record) {
            record.state = RefreshTokenState::Revoked;
            revoked += 1;
        }
    }
    revoked
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.write().await;
        tokens.insert(record.token_hash.clone(), record);
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, RepositoryError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(token_hash).cloned())
    }

    async fn rotate(&self, token_hash: &str, replacement: RefreshTokenRecord) -> Result<bool, RepositoryError> {
        let mut tokens = self.tokens.write().await;

        match tokens.get_mut(token_hash) {
            Some(current) if current.state == RefreshTokenState::Active => {
                current.state = RefreshTokenState::Rotated;
                current.replaced_by = Some(replacement.id);
            }
            _ => return Ok(false),
        }

        tokens.insert(replacement.token_hash.clone(), replacement);
        Ok(true)
    }

    async fn revoke(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        let mut tokens = self.tokens.write().await;

        match tokens.get_mut(token_hash) {
            Some(record) if record.state == RefreshTokenState::Active => {
                record.state = RefreshTokenState::Revoked;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_family(&self, token_hash: &str) -> Result<usize, RepositoryError> {
        let mut tokens = self.tokens.write().await;

        let Some(family_id) = tokens.get(token_hash).map(|r| r.family_id) else {
            return Ok(0);
        };

        Ok(revoke_where(&mut tokens, |r| r.family_id == family_id))
    }

    async fn revoke_for_user(&self, user_id: &UserId) -> Result<usize, RepositoryError> {
        let mut tokens = self.tokens.write().await;
        Ok(revoke_where(&mut tokens, |r| r.user_id == *user_id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::Utc;

    use super::*;
    use crate::domain::auth::models::RefreshToken;
    use crate::domain::auth::models::TokenFamilyId;

    fn issue(user_id: UserId, family_id: TokenFamilyId, raw: &str) -> RefreshTokenRecord {
        let now = Utc::now();
        let token = RefreshToken {
            token: raw.to_string(),
            expires_at: now + Duration::days(7),
        };
        RefreshTokenRecord::issue(user_id, family_id, &token, now)
    }

    #[tokio::test]
    async fn test_rotate_only_once() {
        let repository = InMemoryRefreshTokenRepository::new();
        let user_id = UserId::new();
        let family_id = TokenFamilyId::new();
        let first = issue(user_id, family_id, "first");
        let hash = first.token_hash.clone();
        repository.insert(first).await.unwrap();

        let second = issue(user_id, family_id, "second");
        let second_id = second.id;
        assert!(repository.rotate(&hash, second).await.unwrap());
        assert!(!repository.rotate(&hash, issue(user_id, family_id, "third")).await.unwrap());

        let rotated = repository.find_by_hash(&hash).await.unwrap().unwrap();
        assert_eq!(rotated.state, RefreshTokenState::Rotated);
        assert_eq!(rotated.replaced_by, Some(second_id));
        assert!(repository
            .find_by_hash(&auth::opaque::digest("third"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_revoke_family_leaves_other_families() {
        let repository = InMemoryRefreshTokenRepository::new();
        let user_id = UserId::new();
        let family_id = TokenFamilyId::new();
        let first = issue(user_id, family_id, "first");
        let hash = first.token_hash.clone();
        repository.insert(first).await.unwrap();
        repository.rotate(&hash, issue(user_id, family_id, "second")).await.unwrap();
        repository.insert(issue(user_id, TokenFamilyId::new(), "other")).await.unwrap();

        let revoked = repository.revoke_family(&hash).await.unwrap();

        assert_eq!(revoked, 1);
        let second = repository.find_by_hash(&auth::opaque::digest("second")).await.unwrap().unwrap();
        assert_eq!(second.state, RefreshTokenState::Revoked);
        let other = repository.find_by_hash(&auth::opaque::digest("other")).await.unwrap().unwrap();
        assert_eq!(other.state, RefreshTokenState::Active);
    }

    #[tokio::test]
    async fn test_revoke_for_user() {
        let repository = InMemoryRefreshTokenRepository::new();
        let ann = UserId::new();
        let bob = UserId::new();
        repository.insert(issue(ann, TokenFamilyId::new(), "a1")).await.unwrap();
        repository.insert(issue(ann, TokenFamilyId::new(), "a2")).await.unwrap();
        repository.insert(issue(bob, TokenFamilyId::new(), "b1")).await.unwrap();

        assert_eq!(repository.revoke_for_user(&ann).await.unwrap(), 2);
        assert!(!repository.revoke(&auth::opaque::digest("a1")).await.unwrap());
        assert!(repository.revoke(&auth::opaque::digest("b1")).await.unwrap());
    }
}
