//! Decides who may change which fields of which user.
//!
//! The whole edit policy lives in [`edit_grant`]: one exhaustive match over
//! (role, relationship to target). Adding a role without deciding its row is a
//! compile error.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::{
    error::{AppError, Result},
    models::{
        role::{Role, is_reserved_user},
        session::Session,
        user::{UserField, UserUpdate},
    },
    repositories::{directory::Directory, session::SessionValidator},
};

/// Fields a user may change on their own record.
pub const PROFILE_FIELDS: &[UserField] = &[UserField::FullName, UserField::Email];

/// Fields a superuser may change on any non-reserved record.
pub const ADMIN_FIELDS: &[UserField] = &[
    UserField::FullName,
    UserField::Email,
    UserField::IsActive,
    UserField::UserRole,
    UserField::EmailVerified,
];

/// How the actor relates to the user being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    SelfTarget,
    OtherUser,
}

impl Relation {
    pub fn between(actor_id: i64, target_user_id: i64) -> Self {
        if actor_id == target_user_id {
            Relation::SelfTarget
        } else {
            Relation::OtherUser
        }
    }
}

/// One cell of the edit policy matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditGrant {
    Denied,
    Profile,
    Admin,
}

impl EditGrant {
    pub fn fields(&self) -> &'static [UserField] {
        match self {
            EditGrant::Denied => &[],
            EditGrant::Profile => PROFILE_FIELDS,
            EditGrant::Admin => ADMIN_FIELDS,
        }
    }
}

/// The edit policy matrix.
pub fn edit_grant(role: Role, relation: Relation) -> EditGrant {
    match (role, relation) {
        (Role::Superuser, Relation::SelfTarget) => EditGrant::Admin,
        (Role::Superuser, Relation::OtherUser) => EditGrant::Admin,
        (Role::Staff, Relation::SelfTarget) => EditGrant::Profile,
        (Role::Staff, Relation::OtherUser) => EditGrant::Denied,
        (Role::Authenticated, Relation::SelfTarget) => EditGrant::Profile,
        (Role::Authenticated, Relation::OtherUser) => EditGrant::Denied,
        (Role::Anonymous, Relation::SelfTarget) => EditGrant::Denied,
        (Role::Anonymous, Relation::OtherUser) => EditGrant::Denied,
        (Role::Locked, Relation::SelfTarget) => EditGrant::Denied,
        (Role::Locked, Relation::OtherUser) => EditGrant::Denied,
    }
}

/// Who is asking. Every field is checked against the live session.
#[derive(Debug, Clone)]
pub struct Actor<'a> {
    pub user_id: i64,
    pub role: Role,
    pub session_token: &'a str,
}

/// The outcome of a permitted edit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPermission {
    pub editable_fields: BTreeSet<UserField>,
    pub reason: &'static str,
}

/// Rejects the reserved system accounts.
pub fn ensure_mutable_target(target_user_id: i64) -> Result<()> {
    if is_reserved_user(target_user_id) {
        tracing::warn!("❌ Attempt to modify reserved account {}", target_user_id);
        return Err(AppError::ForbiddenTarget);
    }
    Ok(())
}

/// Resolves the actor's session and requires it to be live and bound to
/// exactly the claimed user id and role.
///
/// The session only proves who is calling. Role and active state are taken
/// from the user row, so a lock or demotion takes effect on the next check
/// even if the actor's sessions were never cleaned up.
pub async fn verify_actor_session(
    directory: &dyn Directory,
    sessions: &dyn SessionValidator,
    actor: &Actor<'_>,
) -> Result<Session> {
    let session = sessions
        .find_session(actor.session_token)
        .await?
        .ok_or_else(|| {
            tracing::warn!("❌ No live session for actor {}", actor.user_id);
            AppError::SessionInvalid
        })?;

    if !session.is_live_at(Utc::now()) || !session.binds(actor.user_id, actor.role) {
        tracing::warn!(
            "❌ Session does not bind actor {} with role {}",
            actor.user_id,
            actor.role
        );
        return Err(AppError::SessionInvalid);
    }

    let row_ok = directory
        .find_users(Some(actor.user_id))
        .await?
        .first()
        .is_some_and(|u| u.is_active && u.user_role == actor.role);

    if !row_ok {
        tracing::warn!(
            "❌ Actor {} is no longer an active {}, session is stale",
            actor.user_id,
            actor.role
        );
        return Err(AppError::SessionInvalid);
    }

    Ok(session)
}

/// Decides whether `actor` may apply `requested` to `target_user_id`.
///
/// # Arguments
///
/// * `directory` - The user store, consulted for the actor's current role.
/// * `sessions` - The session collaborator.
/// * `actor` - The claimed actor, role and session token.
/// * `target_user_id` - The user to be edited.
/// * `requested` - The requested changes.
///
/// # Returns
///
/// The editable field set for this actor and target.
pub async fn authorize_edit(
    directory: &dyn Directory,
    sessions: &dyn SessionValidator,
    actor: &Actor<'_>,
    target_user_id: i64,
    requested: &UserUpdate,
) -> Result<EditPermission> {
    ensure_mutable_target(target_user_id)?;
    verify_actor_session(directory, sessions, actor).await?;

    let relation = Relation::between(actor.user_id, target_user_id);
    let grant = edit_grant(actor.role, relation);

    let reason = match grant {
        EditGrant::Denied => {
            tracing::warn!(
                "❌ Role {} may not edit user {} (actor {})",
                actor.role,
                target_user_id,
                actor.user_id
            );
            return Err(AppError::Unauthorized);
        }
        EditGrant::Profile => "self-edit of profile fields",
        EditGrant::Admin => "superuser edit",
    };

    let editable_fields: BTreeSet<UserField> = grant.fields().iter().copied().collect();

    if let Some(field) = requested.fields().difference(&editable_fields).next() {
        tracing::warn!("❌ Field {} not editable by role {}", field, actor.role);
        return Err(AppError::FieldNotEditable(field.to_string()));
    }

    if let Some(role) = requested.user_role {
        if !role.is_assignable() {
            tracing::warn!("❌ Unknown role change request: {}", role);
            return Err(AppError::InvalidRoleValue(role.to_string()));
        }
    }

    tracing::debug!(
        "✅ Edit of user {} by actor {} permitted: {}",
        target_user_id,
        actor.user_id,
        reason
    );

    Ok(EditPermission {
        editable_fields,
        reason,
    })
}

/// Requires a session-verified superuser.
///
/// A non-superuser role and a session that does not bind the claimed actor
/// both fail with `Unauthorized`.
pub async fn require_superuser(
    directory: &dyn Directory,
    sessions: &dyn SessionValidator,
    actor: &Actor<'_>,
) -> Result<()> {
    if actor.role != Role::Superuser {
        tracing::warn!("❌ Superuser required, actor {} is {}", actor.user_id, actor.role);
        return Err(AppError::Unauthorized);
    }

    verify_actor_session(directory, sessions, actor)
        .await
        .map_err(|e| match e {
            AppError::SessionInvalid => AppError::Unauthorized,
            other => other,
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_is_total_and_never_leaks_admin_fields() {
        for role in Role::ALL {
            for relation in [Relation::SelfTarget, Relation::OtherUser] {
                let fields = edit_grant(role, relation).fields();
                if role != Role::Superuser {
                    assert!(!fields.contains(&UserField::IsActive));
                    assert!(!fields.contains(&UserField::UserRole));
                    assert!(!fields.contains(&UserField::EmailVerified));
                }
            }
        }
    }

    #[test]
    fn only_superuser_edits_others() {
        for role in Role::ALL {
            let grant = edit_grant(role, Relation::OtherUser);
            if role == Role::Superuser {
                assert_eq!(grant, EditGrant::Admin);
            } else {
                assert_eq!(grant, EditGrant::Denied);
            }
        }
    }

    #[test]
    fn self_edit_rows() {
        assert_eq!(edit_grant(Role::Staff, Relation::SelfTarget), EditGrant::Profile);
        assert_eq!(edit_grant(Role::Authenticated, Relation::SelfTarget), EditGrant::Profile);
        assert_eq!(edit_grant(Role::Locked, Relation::SelfTarget), EditGrant::Denied);
        assert_eq!(edit_grant(Role::Anonymous, Relation::SelfTarget), EditGrant::Denied);
        assert_eq!(EditGrant::Profile.fields(), PROFILE_FIELDS);
    }

    #[test]
    fn reserved_targets_are_rejected() {
        assert!(matches!(ensure_mutable_target(2), Err(AppError::ForbiddenTarget)));
        assert!(matches!(ensure_mutable_target(3), Err(AppError::ForbiddenTarget)));
        assert!(ensure_mutable_target(4).is_ok());
    }
}
