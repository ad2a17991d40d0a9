mod common;

use common::*;
use warden::{
    models::role::Role,
    services::access::{
        AccessRequest, Action, ItemKind, LimitName, LimitRequest, Visibility, check_access,
        check_limit,
    },
};

fn access(user_id: i64, user_role: Role, action: Action, owner: i64, visibility: Visibility) -> AccessRequest {
    AccessRequest {
        user_id,
        user_role,
        action,
        target_name: ItemKind::Dataset,
        target_owner: owner,
        target_visibility: visibility,
        target_sharedwith: vec![],
    }
}

#[tokio::test]
async fn owner_edits_own_private_dataset() {
    let ctx = TestContext::new().await;
    let request = access(
        AUTHENTICATED_ID,
        Role::Authenticated,
        Action::Edit,
        AUTHENTICATED_ID,
        Visibility::Private,
    );
    assert!(check_access(&ctx.directory, &request).await.unwrap());
}

#[tokio::test]
async fn superuser_changes_owner_of_others_dataset() {
    let ctx = TestContext::new().await;
    let request = access(
        SUPERUSER_ID,
        Role::Superuser,
        Action::ChangeOwner,
        OTHER_ID,
        Visibility::Private,
    );
    assert!(check_access(&ctx.directory, &request).await.unwrap());
}

#[tokio::test]
async fn claimed_role_must_match_stored_role() {
    let ctx = TestContext::new().await;
    let request = access(
        AUTHENTICATED_ID,
        Role::Superuser,
        Action::ChangeOwner,
        OTHER_ID,
        Visibility::Private,
    );
    assert!(!check_access(&ctx.directory, &request).await.unwrap());
}

#[tokio::test]
async fn inactive_or_unknown_users_deny_access() {
    let ctx = TestContext::new().await;

    let inactive_actor = access(
        INACTIVE_ID,
        Role::Authenticated,
        Action::View,
        OTHER_ID,
        Visibility::Public,
    );
    assert!(!check_access(&ctx.directory, &inactive_actor).await.unwrap());

    let inactive_owner = access(
        AUTHENTICATED_ID,
        Role::Authenticated,
        Action::View,
        INACTIVE_ID,
        Visibility::Public,
    );
    assert!(!check_access(&ctx.directory, &inactive_owner).await.unwrap());

    let mut unknown_share = access(
        AUTHENTICATED_ID,
        Role::Authenticated,
        Action::View,
        OTHER_ID,
        Visibility::Shared,
    );
    unknown_share.target_sharedwith = vec![AUTHENTICATED_ID, 999];
    assert!(!check_access(&ctx.directory, &unknown_share).await.unwrap());

    unknown_share.target_sharedwith = vec![AUTHENTICATED_ID];
    assert!(check_access(&ctx.directory, &unknown_share).await.unwrap());
}

#[tokio::test]
async fn public_datasets_are_viewable_but_not_editable() {
    let ctx = TestContext::new().await;

    let view = access(
        AUTHENTICATED_ID,
        Role::Authenticated,
        Action::View,
        OTHER_ID,
        Visibility::Public,
    );
    assert!(check_access(&ctx.directory, &view).await.unwrap());

    let edit = access(
        AUTHENTICATED_ID,
        Role::Authenticated,
        Action::Edit,
        OTHER_ID,
        Visibility::Public,
    );
    assert!(!check_access(&ctx.directory, &edit).await.unwrap());
}

#[tokio::test]
async fn limits_require_an_active_user_with_the_role() {
    let ctx = TestContext::new().await;

    let within = LimitRequest {
        user_id: AUTHENTICATED_ID,
        user_role: Role::Authenticated,
        limit_name: LimitName::MaxReqs60sec,
        value_to_check: 100,
    };
    assert!(check_limit(&ctx.directory, &within).await.unwrap());

    let over = LimitRequest {
        value_to_check: 6_001,
        ..within.clone()
    };
    assert!(!check_limit(&ctx.directory, &over).await.unwrap());

    let wrong_role = LimitRequest {
        user_role: Role::Superuser,
        ..within.clone()
    };
    assert!(!check_limit(&ctx.directory, &wrong_role).await.unwrap());

    let inactive = LimitRequest {
        user_id: INACTIVE_ID,
        ..within
    };
    assert!(!check_limit(&ctx.directory, &inactive).await.unwrap());
}
