//! Role-based access to owned items, and per-role request limits.
//!
//! A decision is the conjunction of three things: the role's permissions for
//! the item's scope and visibility, the item kind's own valid actions, and the
//! ownership/sharing relation between actor and item. Every table is an
//! exhaustive match, so an unlisted combination cannot grant anything.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::role::{ANONYMOUS_USER_ID, Role},
    repositories::directory::Directory,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Object,
    Dataset,
    Collection,
    Users,
    Sessions,
    Apikeys,
    Preferences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Unlisted,
    Shared,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    View,
    Create,
    Edit,
    Delete,
    MakePublic,
    MakeUnlisted,
    MakePrivate,
    MakeShared,
    ChangeOwner,
}

/// Whether the actor owns the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Owned,
    Others,
}

use Action::*;

const EVERY_ACTION: &[Action] = &[
    List, View, Create, Edit, Delete, MakePublic, MakeUnlisted, MakePrivate, MakeShared, ChangeOwner,
];
const NOTHING: &[Action] = &[];

fn owned_actions(role: Role) -> &'static [Action] {
    match role {
        Role::Superuser | Role::Staff => EVERY_ACTION,
        Role::Authenticated => &[
            List, View, Create, Delete, Edit, MakePublic, MakeUnlisted, MakePrivate, MakeShared,
        ],
        Role::Anonymous => &[List, View, Create, MakePrivate, MakePublic, MakeUnlisted],
        Role::Locked => NOTHING,
    }
}

fn others_actions(role: Role, visibility: Visibility) -> &'static [Action] {
    match (role, visibility) {
        (Role::Superuser, Visibility::Public) => &[
            List, View, Create, Delete, Edit, MakePrivate, MakeUnlisted, MakeShared, ChangeOwner,
        ],
        (Role::Superuser, Visibility::Unlisted) => &[
            List, View, Create, Delete, Edit, MakePublic, MakePrivate, MakeShared, ChangeOwner,
        ],
        (Role::Superuser, Visibility::Shared) => &[
            List, View, Create, Delete, Edit, MakePublic, MakeUnlisted, MakePrivate, ChangeOwner,
        ],
        (Role::Superuser, Visibility::Private) => &[
            List, View, Create, Delete, Edit, MakePublic, MakeUnlisted, MakeShared, ChangeOwner,
        ],
        (Role::Staff, Visibility::Public | Visibility::Unlisted) => &[List, View, Edit, Delete],
        (Role::Staff, Visibility::Shared) => &[List, View, Edit],
        (Role::Staff, Visibility::Private) => &[List],
        (Role::Authenticated, Visibility::Public) => &[List, View],
        (Role::Authenticated, Visibility::Unlisted) => &[View],
        (Role::Authenticated, Visibility::Shared) => &[List, View, Edit],
        (Role::Authenticated, Visibility::Private) => NOTHING,
        (Role::Anonymous, Visibility::Public) => &[List, View],
        (Role::Anonymous, Visibility::Unlisted) => &[View],
        (Role::Anonymous, Visibility::Shared | Visibility::Private) => NOTHING,
        (Role::Locked, _) => NOTHING,
    }
}

fn can_own(role: Role, item: ItemKind) -> bool {
    use ItemKind::*;
    match role {
        Role::Superuser | Role::Staff => {
            matches!(item, Dataset | Object | Collection | Apikeys | Preferences)
        }
        Role::Authenticated => matches!(item, Dataset | Apikeys | Preferences),
        Role::Anonymous => matches!(item, Dataset),
        Role::Locked => false,
    }
}

/// What an item kind admits at all, whatever the role.
struct ItemPolicy {
    valid_actions: &'static [Action],
    valid_visibilities: &'static [Visibility],
    invalid_roles: &'static [Role],
}

fn item_policy(item: ItemKind) -> ItemPolicy {
    const ALL_VISIBILITIES: &[Visibility] = &[
        Visibility::Public,
        Visibility::Unlisted,
        Visibility::Shared,
        Visibility::Private,
    ];
    const PRIVATE_ONLY: &[Visibility] = &[Visibility::Private];

    match item {
        ItemKind::Object | ItemKind::Dataset | ItemKind::Collection => ItemPolicy {
            valid_actions: EVERY_ACTION,
            valid_visibilities: ALL_VISIBILITIES,
            invalid_roles: &[Role::Locked],
        },
        ItemKind::Users => ItemPolicy {
            valid_actions: &[List, View, Edit, Create, Delete],
            valid_visibilities: PRIVATE_ONLY,
            invalid_roles: &[Role::Authenticated, Role::Anonymous, Role::Locked],
        },
        ItemKind::Sessions => ItemPolicy {
            valid_actions: &[List, View, Delete],
            valid_visibilities: PRIVATE_ONLY,
            invalid_roles: &[Role::Authenticated, Role::Anonymous, Role::Locked],
        },
        ItemKind::Apikeys => ItemPolicy {
            valid_actions: &[List, View, Create, Delete],
            valid_visibilities: PRIVATE_ONLY,
            invalid_roles: &[Role::Anonymous, Role::Locked],
        },
        ItemKind::Preferences => ItemPolicy {
            valid_actions: &[List, View, Edit],
            valid_visibilities: PRIVATE_ONLY,
            invalid_roles: &[Role::Anonymous, Role::Locked],
        },
    }
}

/// The actions `role` may take on an item of this kind, visibility and scope.
///
/// Empty means access must be denied.
pub fn item_permissions(
    role: Role,
    item: ItemKind,
    visibility: Visibility,
    scope: Scope,
) -> BTreeSet<Action> {
    let policy = item_policy(item);

    if policy.invalid_roles.contains(&role) || !policy.valid_visibilities.contains(&visibility) {
        return BTreeSet::new();
    }

    let role_actions = match scope {
        Scope::Owned => owned_actions(role),
        Scope::Others => others_actions(role, visibility),
    };

    role_actions
        .iter()
        .filter(|a| policy.valid_actions.contains(a))
        .copied()
        .collect()
}

/// The request payload for an access check.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessRequest {
    pub user_id: i64,
    pub user_role: Role,
    pub action: Action,
    pub target_name: ItemKind,
    pub target_owner: i64,
    pub target_visibility: Visibility,
    #[serde(default)]
    pub target_sharedwith: Vec<i64>,
}

/// The policy decision alone, without consulting the user store.
pub fn policy_allows(request: &AccessRequest) -> bool {
    let is_owner = request.user_id == request.target_owner;

    let shared_or_owned_ok = match request.user_role {
        Role::Superuser | Role::Staff => true,
        _ => match request.target_visibility {
            Visibility::Private => is_owner,
            // sharing with the anonymous user shares with everyone
            Visibility::Shared => {
                is_owner
                    || request.target_sharedwith.contains(&request.user_id)
                    || request.target_sharedwith.contains(&ANONYMOUS_USER_ID)
            }
            Visibility::Unlisted | Visibility::Public => true,
        },
    };

    let perms = if is_owner && can_own(request.user_role, request.target_name) {
        item_permissions(
            request.user_role,
            request.target_name,
            request.target_visibility,
            Scope::Owned,
        )
    } else if !is_owner {
        item_permissions(
            request.user_role,
            request.target_name,
            request.target_visibility,
            Scope::Others,
        )
    } else {
        BTreeSet::new()
    };

    perms.contains(&request.action) && shared_or_owned_ok
}

/// Whether `user_id` exists, is active, and (if given) holds `role`.
async fn is_active_user(directory: &dyn Directory, user_id: i64, role: Option<Role>) -> Result<bool> {
    let users = directory.find_users(Some(user_id)).await?;
    Ok(users
        .first()
        .is_some_and(|u| u.is_active && role.is_none_or(|r| u.user_role == r)))
}

/// Full access check: the policy decision, plus every user id involved must
/// be a real active user and the actor must hold the claimed role.
pub async fn check_access(directory: &dyn Directory, request: &AccessRequest) -> Result<bool> {
    let granted = policy_allows(request);

    if !is_active_user(directory, request.user_id, Some(request.user_role)).await? {
        tracing::warn!(
            "❌ Access check for unknown or inactive user {} as {}",
            request.user_id,
            request.user_role
        );
        return Ok(false);
    }

    let mut others: BTreeSet<i64> = request.target_sharedwith.iter().copied().collect();
    others.insert(request.target_owner);
    others.remove(&request.user_id);

    for user_id in others {
        if !is_active_user(directory, user_id, None).await? {
            tracing::debug!("Access check references unknown or inactive user {}", user_id);
            return Ok(false);
        }
    }

    tracing::debug!(
        "Access request check for user {} on {:?}: granted = {}",
        request.user_id,
        request.target_name,
        granted
    );

    Ok(granted)
}

/// Per-role request limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleLimits {
    pub max_req_items: u64,
    pub max_reqs_60sec: u64,
}

pub fn role_limits(role: Role) -> RoleLimits {
    match role {
        Role::Superuser => RoleLimits {
            max_req_items: 5_000_000,
            max_reqs_60sec: 60_000,
        },
        Role::Staff => RoleLimits {
            max_req_items: 1_000_000,
            max_reqs_60sec: 60_000,
        },
        Role::Authenticated => RoleLimits {
            max_req_items: 500_000,
            max_reqs_60sec: 6_000,
        },
        Role::Anonymous => RoleLimits {
            max_req_items: 100_000,
            max_reqs_60sec: 600,
        },
        Role::Locked => RoleLimits {
            max_req_items: 0,
            max_reqs_60sec: 0,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitName {
    MaxReqItems,
    #[serde(rename = "max_reqs_60sec")]
    MaxReqs60sec,
}

/// Whether `value` is within the role's named limit.
pub fn within_limit(role: Role, limit: LimitName, value: u64) -> bool {
    let limits = role_limits(role);
    match limit {
        LimitName::MaxReqItems => value <= limits.max_req_items,
        LimitName::MaxReqs60sec => value <= limits.max_reqs_60sec,
    }
}

/// The request payload for a limit check.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitRequest {
    pub user_id: i64,
    pub user_role: Role,
    pub limit_name: LimitName,
    pub value_to_check: u64,
}

/// Checks a value against the role's limit for a real, active user.
pub async fn check_limit(directory: &dyn Directory, request: &LimitRequest) -> Result<bool> {
    if !is_active_user(directory, request.user_id, Some(request.user_role)).await? {
        tracing::warn!(
            "❌ Limit check for unknown or inactive user {} as {}",
            request.user_id,
            request.user_role
        );
        return Ok(false);
    }

    Ok(within_limit(
        request.user_role,
        request.limit_name,
        request.value_to_check,
    ))
}
