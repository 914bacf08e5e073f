//! Registration, login and password management over the credential store

use chrono::Duration;
use common::{
    authz::{Action, Forbidden, Role},
    error::DatabaseError,
    session::{SessionContext, SessionRepository},
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    error::{AuthError, AuthResult},
    hasher::Hasher,
    models::{NewUser, User, UserSummary},
    repositories::UserRepository,
    validation::{
        CommonPasswords, PasswordStrength, strength_score, valid_password, valid_username,
    },
};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    sessions: SessionRepository,
    hasher: Hasher,
    common_passwords: Arc<CommonPasswords>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: UserRepository,
        sessions: SessionRepository,
        hasher: Hasher,
        common_passwords: CommonPasswords,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            common_passwords: Arc::new(common_passwords),
            session_ttl,
        }
    }

    /// Run password hashing work on the blocking pool
    async fn with_hasher<T, F>(&self, work: F) -> AuthResult<T>
    where
        F: FnOnce(&Hasher) -> T + Send + 'static,
        T: Send + 'static,
    {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || work(&hasher))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    async fn hash(&self, password: &str) -> AuthResult<String> {
        let password = password.to_string();
        self.with_hasher(move |hasher| hasher.hash(&password)).await?
    }

    async fn verify(&self, password: &str, digest: String) -> AuthResult<bool> {
        let password = password.to_string();
        self.with_hasher(move |hasher| hasher.verify(&password, &digest))
            .await
    }

    /// Create an account
    ///
    /// Checks run in order: taken username, username rules, password rules.
    pub async fn register(&self, username: &str, password: &str, role: Role) -> AuthResult<User> {
        info!("Registration attempt for user: {}", username);

        if self.users.exists(username).await? {
            return Err(AuthError::DuplicateUser);
        }
        if !valid_username(username) {
            return Err(AuthError::InvalidUsername);
        }
        if !valid_password(password) {
            return Err(AuthError::InvalidPassword);
        }

        let new_user = NewUser {
            username: username.to_string(),
            password_hash: self.hash(password).await?,
            role,
        };

        match self.users.create(&new_user).await {
            Ok(user) => {
                info!("User {} registered with role {}", user.username, user.role);
                Ok(user)
            }
            // Lost a race with a concurrent registration
            Err(DatabaseError::UniqueViolation(_)) => Err(AuthError::DuplicateUser),
            Err(e) => Err(e.into()),
        }
    }

    /// Create an account without an admin session
    ///
    /// Only the first admin may sign up as one; later admins are promoted
    /// through [`AuthService::update_role`].
    pub async fn self_register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> AuthResult<User> {
        if role == Role::Admin && self.users.count_with_role(Role::Admin).await? > 0 {
            warn!("Refused self-registration of {} as admin", username);
            return Err(AuthError::Forbidden(Forbidden {
                role: Role::User,
                action: Action::ManageRoles,
            }));
        }

        self.register(username, password, role).await
    }

    /// Check credentials and return the stored role
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<Role> {
        info!("Login attempt for user: {}", username);

        let Some(user) = self.users.find_by_username(username).await? else {
            let password = password.to_string();
            self.with_hasher(move |hasher| hasher.verify_dummy(&password))
                .await?;
            return Err(AuthError::UnknownUser);
        };

        if !self.verify(password, user.password_hash).await? {
            warn!("Wrong password for user: {}", username);
            return Err(AuthError::BadPassword);
        }

        Ok(user.role)
    }

    /// Check credentials and open a session
    pub async fn open_session(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<SessionContext> {
        let role = self.login(username, password).await?;
        let session = self.sessions.create(username, role, self.session_ttl).await?;
        Ok(session)
    }

    /// Close a session
    pub async fn logout(&self, session: &SessionContext) -> AuthResult<()> {
        info!("Logout for user: {}", session.username);
        self.sessions.delete(session.token).await?;
        Ok(())
    }

    /// Replace a user's password, returning the number of rows updated
    pub async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> AuthResult<u64> {
        info!("Password change requested for user: {}", username);

        if new_password != confirmation {
            return Err(AuthError::PasswordMismatch);
        }
        if new_password == old_password {
            return Err(AuthError::SameAsOldPassword);
        }

        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UnknownUser)?;
        if !self.verify(old_password, user.password_hash).await? {
            return Err(AuthError::BadPassword);
        }
        if !valid_password(new_password) {
            return Err(AuthError::InvalidPassword);
        }

        let digest = self.hash(new_password).await?;
        let updated = self.users.update_password_hash(username, &digest).await?;
        if updated != 1 {
            warn!("Password update for {} touched {} rows", username, updated);
            return Err(AuthError::StorageFailure(DatabaseError::Query(
                sqlx::Error::RowNotFound,
            )));
        }

        info!("Password changed for user: {}", username);
        Ok(updated)
    }

    /// Change the password of the session's user and close their other sessions
    pub async fn change_own_password(
        &self,
        session: &SessionContext,
        old_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> AuthResult<u64> {
        let updated = self
            .change_password(&session.username, old_password, new_password, confirmation)
            .await?;

        // The new password is stored by now; leftover sessions only get logged
        match self
            .sessions
            .delete_for_user(&session.username, Some(session.token))
            .await
        {
            Ok(0) => {}
            Ok(revoked) => info!("Closed {} other sessions of {}", revoked, session.username),
            Err(e) => warn!(
                "Password changed but other sessions of {} stay open: {}",
                session.username, e
            ),
        }

        Ok(updated)
    }

    /// Stored role of a user
    pub async fn get_role(&self, username: &str) -> AuthResult<Role> {
        self.users
            .get_role(username)
            .await?
            .ok_or(AuthError::UnknownUser)
    }

    /// Every user and role; admin only
    pub async fn list_users(&self, session: &SessionContext) -> AuthResult<Vec<UserSummary>> {
        session.require(Action::ViewAllUsers)?;
        Ok(self.users.get_all().await?)
    }

    /// Change another user's role; admin only
    pub async fn update_role(
        &self,
        session: &SessionContext,
        username: &str,
        role: Role,
    ) -> AuthResult<()> {
        session.require(Action::ManageRoles)?;

        if self.users.update_role(username, role).await? == 0 {
            return Err(AuthError::UnknownUser);
        }

        info!("{} set role of {} to {}", session.username, username, role);
        Ok(())
    }

    /// Rate a candidate password
    pub fn check_strength(&self, password: &str) -> PasswordStrength {
        strength_score(password, &self.common_passwords)
    }
}
