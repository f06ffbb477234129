//! Workflow tests for the community crate
//! Run against the in-memory store and a recording blob store.

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use platform::blob::{
        BlobCleaner, BlobError, BlobQueue, BlobStore, BucketCredentials, CredentialCell,
    };
    use platform::password::{ClearTextPassword, HashCost};

    use crate::application::{
        FollowUseCase, ModerationUseCase, NotificationUseCase, PostUseCase, ProfileUseCase,
        SignUpInput, SignUpUseCase,
    };
    use crate::domain::entity::{Identity, NewIdentity};
    use crate::domain::repository::IdentityRepository;
    use crate::domain::value_object::{Email, Role, UserName};
    use crate::{CommunityConfig, MemoryCommunityStore, community_router_generic};

    pub const POST_SECRET: &str = "post-bucket-secret";
    pub const AVATAR_SECRET: &str = "avatar-bucket-secret";
    pub const PASSWORD: &str = "secret1";

    /// Records every delete together with the credential active at that moment
    pub struct RecordingBlobStore {
        cell: CredentialCell,
        fail: bool,
        calls: Mutex<Vec<(Option<String>, String)>>,
    }

    impl RecordingBlobStore {
        pub fn calls(&self) -> Vec<(Option<String>, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl BlobStore for RecordingBlobStore {
        async fn delete_by_key(&self, key: &str) -> Result<(), BlobError> {
            self.calls
                .lock()
                .unwrap()
                .push((self.cell.current(), key.to_string()));
            if self.fail {
                Err(BlobError::Rejected(500))
            } else {
                Ok(())
            }
        }
    }

    pub struct Harness {
        pub store: MemoryCommunityStore,
        pub repo: Arc<MemoryCommunityStore>,
        pub config: Arc<CommunityConfig>,
        pub blobs: Arc<RecordingBlobStore>,
        pub cell: CredentialCell,
        pub cleaner: BlobCleaner<RecordingBlobStore>,
    }

    pub fn config() -> CommunityConfig {
        CommunityConfig {
            password_cost: HashCost::Fast,
            ..CommunityConfig::development()
        }
    }

    impl Harness {
        pub fn new() -> Self {
            Self::build(false)
        }

        pub fn with_failing_blobs() -> Self {
            Self::build(true)
        }

        fn build(fail: bool) -> Self {
            let store = MemoryCommunityStore::new();
            let cell = CredentialCell::new(None);
            let queue = BlobQueue::start(
                cell.clone(),
                BucketCredentials::new(
                    Some(POST_SECRET.to_string()),
                    Some(AVATAR_SECRET.to_string()),
                ),
            );
            let blobs = Arc::new(RecordingBlobStore {
                cell: cell.clone(),
                fail,
                calls: Mutex::new(Vec::new()),
            });

            Self {
                repo: Arc::new(store.clone()),
                store,
                config: Arc::new(config()),
                cleaner: BlobCleaner::new(blobs.clone(), queue),
                blobs,
                cell,
            }
        }

        pub async fn register(&self, name: &str) -> Identity {
            SignUpUseCase::new(self.repo.clone(), self.config.clone())
                .execute(SignUpInput {
                    user_name: name.to_string(),
                    email: format!("{name}@example.com"),
                    password: PASSWORD.to_string(),
                })
                .await
                .unwrap()
                .identity
        }

        /// Admins have no sign-up path; they are seeded directly
        pub async fn admin(&self, name: &str) -> Identity {
            let hash = ClearTextPassword::new(PASSWORD.to_string())
                .unwrap()
                .hash(None, HashCost::Fast)
                .unwrap();
            self.store
                .create(&NewIdentity {
                    user_name: UserName::new(name).unwrap(),
                    email: Email::new(format!("{name}@example.com")).unwrap(),
                    password_hash: hash,
                    role: Role::Admin,
                })
                .await
                .unwrap()
        }

        pub async fn reload(&self, identity: &Identity) -> Identity {
            self.store.find_by_id(identity.id).await.unwrap().unwrap()
        }

        pub fn posts(&self) -> PostUseCase<MemoryCommunityStore, RecordingBlobStore> {
            PostUseCase::new(self.repo.clone(), self.config.clone(), self.cleaner.clone())
        }

        pub fn profiles(&self) -> ProfileUseCase<MemoryCommunityStore, RecordingBlobStore> {
            ProfileUseCase::new(self.repo.clone(), self.config.clone(), self.cleaner.clone())
        }

        pub fn moderation(&self) -> ModerationUseCase<MemoryCommunityStore, RecordingBlobStore> {
            ModerationUseCase::new(self.repo.clone(), self.config.clone(), self.cleaner.clone())
        }

        pub fn follows(&self) -> FollowUseCase<MemoryCommunityStore> {
            FollowUseCase::new(self.repo.clone())
        }

        pub fn notifications(&self) -> NotificationUseCase<MemoryCommunityStore> {
            NotificationUseCase::new(self.repo.clone(), self.config.clone())
        }

        pub fn router(&self) -> Router {
            community_router_generic(
                self.store.clone(),
                (*self.config).clone(),
                self.cleaner.clone(),
            )
        }
    }
}

#[cfg(test)]
mod follow_tests {
    use super::support::Harness;
    use crate::domain::repository::FollowRepository;
    use crate::error::CommunityError;

    #[tokio::test]
    async fn test_follow_twice_creates_one_edge() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let bob = h.register("bob").await;

        h.follows().follow(&bob, "alice").await.unwrap();
        h.follows().follow(&bob, "ALICE").await.unwrap();

        let counts = h.follows().follow_counts(alice.id).await.unwrap();
        assert_eq!(counts.followers, 1);
        assert_eq!(counts.following, 0);

        let followers = h.follows().list_followers("alice").await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].id, bob.id);
    }

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let h = Harness::new();
        let alice = h.register("alice").await;

        let err = h.follows().follow(&alice, "alice").await.unwrap_err();
        assert!(matches!(err, CommunityError::InvalidOperation(_)));
        assert!(!h.store.is_following(alice.id, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unfollow_is_idempotent() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let bob = h.register("bob").await;

        h.follows().follow(&bob, "alice").await.unwrap();
        h.follows().unfollow(&bob, "alice").await.unwrap();
        h.follows().unfollow(&bob, "alice").await.unwrap();

        assert!(!h.follows().is_following(Some(&bob), alice.id).await.unwrap());
        assert!(!h.follows().is_following(None, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_follow_lists_newest_edge_first() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let bob = h.register("bob").await;
        let carol = h.register("carol").await;
        let dave = h.register("dave").await;

        h.follows().follow(&bob, "alice").await.unwrap();
        h.follows().follow(&carol, "alice").await.unwrap();
        h.follows().follow(&dave, "alice").await.unwrap();

        let followers: Vec<_> = h
            .follows()
            .list_followers("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(followers, vec![dave.id, carol.id, bob.id]);

        h.follows().follow(&alice, "dave").await.unwrap();
        h.follows().follow(&alice, "bob").await.unwrap();
        h.follows().follow(&alice, "carol").await.unwrap();

        let following: Vec<_> = h
            .follows()
            .list_following("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(following, vec![carol.id, bob.id, dave.id]);
    }

    #[tokio::test]
    async fn test_blank_username_is_validation_error() {
        let h = Harness::new();
        let bob = h.register("bob").await;

        let err = h.follows().follow(&bob, "").await.unwrap_err();
        assert!(matches!(err, CommunityError::Validation(_)));
        assert_eq!(err.to_string(), "username required");

        let err = h.follows().unfollow(&bob, "   ").await.unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let h = Harness::new();
        let bob = h.register("bob").await;

        let err = h.follows().follow(&bob, "nobody").await.unwrap_err();
        assert_eq!(err.code(), "user_not_found");
    }
}

#[cfg(test)]
mod moderation_tests {
    use super::support::Harness;
    use crate::domain::repository::NotificationRepository;
    use crate::domain::value_object::{ModerationKind, NotificationKind};
    use crate::error::{CommunityError, ConflictReason};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_ban_admin_forbidden() {
        let h = Harness::new();
        let root = h.admin("root").await;
        let mira = h.admin("mira").await;

        let err = h
            .moderation()
            .ban(&root, mira.id, Some("spam".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "target_is_admin");
        assert!(!h.reload(&mira).await.is_banned());
        assert!(h.moderation().list_actions(&root, mira.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ban_self_forbidden() {
        let h = Harness::new();
        let root = h.admin("root").await;

        let err = h.moderation().ban(&root, root.id, None).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "You cannot ban yourself");
    }

    #[tokio::test]
    async fn test_non_admin_cannot_moderate() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let bob = h.register("bob").await;

        let err = h.moderation().warn(&alice, bob.id, None).await.unwrap_err();
        assert_eq!(err.code(), "not_admin");
        assert_eq!(h.store.count_unread(bob.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unban_requires_ban() {
        let h = Harness::new();
        let root = h.admin("root").await;
        let alice = h.register("alice").await;

        let err = h.moderation().unban(&root, alice.id).await.unwrap_err();
        assert!(matches!(
            err,
            CommunityError::Conflict(ConflictReason::NotBanned)
        ));
    }

    #[tokio::test]
    async fn test_ban_then_unban_clears_ban_fields() {
        let h = Harness::new();
        let root = h.admin("root").await;
        let alice = h.register("alice").await;

        h.moderation()
            .ban(&root, alice.id, Some("  spam  ".to_string()))
            .await
            .unwrap();
        let banned = h.reload(&alice).await;
        let ban = banned.ban.as_ref().unwrap();
        assert_eq!(ban.reason.as_ref().unwrap().as_str(), "spam");

        h.moderation().unban(&root, alice.id).await.unwrap();
        let active = h.reload(&alice).await;
        assert!(active.ban.is_none());

        let actions = h.moderation().list_actions(&root, alice.id, None).await.unwrap();
        let kinds: Vec<_> = actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ModerationKind::Unban, ModerationKind::Ban]);
        assert_eq!(actions[0].admin_name.original(), "root");

        let notices = h.store.list_notifications(alice.id, 10).await.unwrap();
        assert_eq!(notices[0].kind, NotificationKind::Unban);
        assert_eq!(notices[1].text, "You were banned: spam");
    }

    #[tokio::test]
    async fn test_warn_with_blank_reason() {
        let h = Harness::new();
        let root = h.admin("root").await;
        let alice = h.register("alice").await;

        let action = h
            .moderation()
            .warn(&root, alice.id, Some("   ".to_string()))
            .await
            .unwrap();
        assert!(action.reason.is_none());

        let notices = h.store.list_notifications(alice.id, 10).await.unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].text, "Warning from admin");
        assert_eq!(notices[0].href.as_deref(), Some("/u/root"));
        assert!(!h.reload(&alice).await.is_banned());
    }

    #[tokio::test]
    async fn test_list_identities_admin_only() {
        let h = Harness::new();
        let root = h.admin("root").await;
        let alice = h.register("alice").await;

        let overview = h.moderation().list_identities(&root).await.unwrap();
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].identity.id, alice.id);

        let err = h.moderation().list_identities(&alice).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}

#[cfg(test)]
mod post_tests {
    use super::support::{Harness, POST_SECRET};
    use crate::application::{CreatePostInput, EditPostInput};
    use crate::domain::entity::Identity;
    use crate::domain::repository::{NotificationRepository, PostRepository};
    use crate::domain::value_object::{ImageRef, NotificationKind, Patch};
    use crate::error::CommunityError;
    use axum::http::StatusCode;
    use kernel::id::PostId;

    fn input(title: &str, image_key: Option<&str>) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            description: "Some text".to_string(),
            image: image_key.and_then(|key| ImageRef::new(format!("https://cdn.test/{key}"), key)),
            category_id: None,
        }
    }

    async fn publish(h: &Harness, author: &Identity, title: &str, image: Option<&str>) -> PostId {
        h.posts().create(author, input(title, image)).await.unwrap().post.id
    }

    #[tokio::test]
    async fn test_publish_notifies_current_followers_only() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let bob = h.register("bob").await;
        let carol = h.register("carol").await;
        let dave = h.register("dave").await;

        h.follows().follow(&bob, "alice").await.unwrap();
        h.follows().follow(&carol, "alice").await.unwrap();

        let published = h.posts().create(&alice, input("Hello", None)).await.unwrap();
        assert_eq!(published.notified, 2);

        h.follows().follow(&dave, "alice").await.unwrap();

        for follower in [&bob, &carol] {
            let notices = h.store.list_notifications(follower.id, 10).await.unwrap();
            assert_eq!(notices.len(), 1);
            assert_eq!(notices[0].kind, NotificationKind::NewPost);
            assert_eq!(
                notices[0].href,
                Some(format!("/posts/{}", published.post.id))
            );
        }
        assert!(h.store.list_notifications(dave.id, 10).await.unwrap().is_empty());
        assert!(h.store.list_notifications(alice.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_fields_and_known_category() {
        let h = Harness::new();
        let alice = h.register("alice").await;

        let err = h.posts().create(&alice, input("  ", None)).await.unwrap_err();
        assert!(matches!(err, CommunityError::Validation(_)));

        let mut with_category = input("Hello", None);
        with_category.category_id = Some(kernel::id::CategoryId::from_i64(999));
        let err = h.posts().create(&alice, with_category).await.unwrap_err();
        assert_eq!(err.code(), "category_not_found");
    }

    #[tokio::test]
    async fn test_category_filter() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let tech = h.store.add_category("tech").await;
        h.store.add_category("art").await;

        let mut tagged = input("Rust", None);
        tagged.category_id = Some(tech.id);
        h.posts().create(&alice, tagged).await.unwrap();
        h.posts().create(&alice, input("Untagged", None)).await.unwrap();

        let tech_posts = h.posts().list_recent(Some("tech")).await.unwrap();
        assert_eq!(tech_posts.len(), 1);
        assert_eq!(tech_posts[0].title, "Rust");

        assert_eq!(h.posts().list_recent(None).await.unwrap().len(), 2);
        assert!(h.posts().list_recent(Some("art")).await.unwrap().is_empty());

        let names: Vec<_> = h
            .posts()
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["art", "tech"]);
    }

    #[tokio::test]
    async fn test_delete_post_attempts_one_blob_delete() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let id = publish(&h, &alice, "Hello", Some("img-1")).await;

        h.posts().delete(&alice, id).await.unwrap();

        assert_eq!(
            h.blobs.calls(),
            vec![(Some(POST_SECRET.to_string()), "img-1".to_string())]
        );
        assert_eq!(h.cell.current(), None);
        assert!(h.store.find_post(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blob_failure_does_not_fail_delete() {
        let h = Harness::with_failing_blobs();
        let alice = h.register("alice").await;
        let id = publish(&h, &alice, "Hello", Some("img-1")).await;

        h.posts().delete(&alice, id).await.unwrap();

        assert_eq!(h.blobs.calls().len(), 1);
        assert!(h.store.find_post(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_without_image_skips_blob_store() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let id = publish(&h, &alice, "Hello", None).await;

        h.posts().delete(&alice, id).await.unwrap();
        assert!(h.blobs.calls().is_empty());
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_deletes() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let bob = h.register("bob").await;
        let root = h.admin("root").await;
        let id = publish(&h, &alice, "Hello", None).await;

        let err = h.posts().delete(&bob, id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(h.store.find_post(id).await.unwrap().is_some());

        h.posts().delete(&root, id).await.unwrap();
        let err = h.posts().get(id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edit_rules() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let bob = h.register("bob").await;
        let id = publish(&h, &alice, "Hello", Some("img-1")).await;

        let err = h
            .posts()
            .edit(&alice, id, EditPostInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Nothing to update");

        let retitle = || EditPostInput {
            title: Some("Changed".to_string()),
            ..EditPostInput::default()
        };
        let err = h.posts().edit(&bob, id, retitle()).await.unwrap_err();
        assert_eq!(err.code(), "not_owner");

        let err = h
            .posts()
            .edit(&alice, PostId::from_i64(999), retitle())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let edited = h
            .posts()
            .edit(
                &alice,
                id,
                EditPostInput {
                    image: Patch::Set(ImageRef::new("https://cdn.test/img-2", "img-2").unwrap()),
                    ..retitle()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.title, "Changed");
        assert_eq!(edited.image_key(), Some("img-2"));
        assert_eq!(h.blobs.calls().len(), 1);
        assert_eq!(h.blobs.calls()[0].1, "img-1");
    }

    #[tokio::test]
    async fn test_admin_post_deletion_notifies_author() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let root = h.admin("root").await;
        let id = publish(&h, &alice, "Hello", Some("img-1")).await;
        let own = publish(&h, &root, "Rules", None).await;

        let err = h.moderation().delete_post(&root, own, None).await.unwrap_err();
        assert_eq!(err.code(), "own_post");

        h.moderation()
            .delete_post(&root, id, Some("off topic".to_string()))
            .await
            .unwrap();

        let notices = h.store.list_notifications(alice.id, 10).await.unwrap();
        assert_eq!(notices[0].text, "Your post \"Hello\" was deleted: off topic");
        assert_eq!(h.blobs.calls().len(), 1);
        assert!(h.store.find_post(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_following_feed() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let bob = h.register("bob").await;
        let carol = h.register("carol").await;

        publish(&h, &alice, "From alice", None).await;
        publish(&h, &carol, "From carol", None).await;
        h.follows().follow(&bob, "alice").await.unwrap();

        let feed = h.posts().following_feed(Some(&bob)).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "From alice");
        assert!(h.posts().following_feed(None).await.unwrap().is_empty());

        let by_alice = h.posts().list_by_author("alice").await.unwrap();
        assert_eq!(by_alice.len(), 1);
    }
}

#[cfg(test)]
mod notification_tests {
    use super::support::Harness;
    use crate::domain::entity::NewNotification;
    use crate::domain::value_object::UserName;

    #[tokio::test]
    async fn test_mark_all_read_is_per_recipient() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let bob = h.register("bob").await;
        let root = UserName::new("root").unwrap();

        for recipient in [alice.id, alice.id, bob.id] {
            h.notifications()
                .notify(&NewNotification::warning(recipient, &root, None))
                .await
                .unwrap();
        }

        assert_eq!(h.notifications().mark_all_read(alice.id).await.unwrap(), 2);
        assert_eq!(h.notifications().count_unread(alice.id).await.unwrap(), 0);
        assert_eq!(h.notifications().count_unread(bob.id).await.unwrap(), 1);

        let list = h.notifications().list_recent(bob.id, None).await.unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.unread, 1);

        let alice_list = h.notifications().list_recent(alice.id, Some(1)).await.unwrap();
        assert_eq!(alice_list.items.len(), 1);
        assert!(alice_list.items[0].read_at.is_some());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let root = UserName::new("root").unwrap();

        h.notifications()
            .notify(&NewNotification::warning(alice.id, &root, None))
            .await
            .unwrap();

        assert_eq!(h.notifications().clear_all(alice.id).await.unwrap(), 1);
        let list = h.notifications().list_recent(alice.id, None).await.unwrap();
        assert!(list.items.is_empty());
        assert_eq!(list.unread, 0);
    }
}

#[cfg(test)]
mod session_tests {
    use super::support::{Harness, PASSWORD};
    use crate::application::{
        CurrentIdentityUseCase, Resolution, SignInInput, SignInOutput, SignInUseCase,
    };
    use crate::error::CommunityError;
    use chrono::{Duration, Utc};

    fn sign_in(identifier: &str, password: &str) -> SignInInput {
        SignInInput {
            identifier: identifier.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolution_renews_token() {
        let h = Harness::new();
        let alice = h.register("alice").await;

        let earlier = h
            .config
            .token_signer()
            .issue_at(alice.id.as_i64(), Utc::now() - Duration::days(1));

        let use_case = CurrentIdentityUseCase::new(h.repo.clone(), h.config.clone());
        match use_case.execute(Some(&earlier.token)).await.unwrap() {
            Resolution::Authenticated { identity, token } => {
                assert_eq!(identity.id, alice.id);
                assert!(token.claims.exp > earlier.claims.exp);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_and_expired_tokens_rejected() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let use_case = CurrentIdentityUseCase::new(h.repo.clone(), h.config.clone());

        let expired = h
            .config
            .token_signer()
            .issue_at(alice.id.as_i64(), Utc::now() - Duration::days(8));

        assert!(matches!(
            use_case.execute(Some(&expired.token)).await.unwrap(),
            Resolution::Rejected
        ));
        assert!(matches!(
            use_case.execute(Some("garbage")).await.unwrap(),
            Resolution::Rejected
        ));
        assert!(matches!(
            use_case.execute(None).await.unwrap(),
            Resolution::Anonymous
        ));
    }

    #[tokio::test]
    async fn test_sign_in_by_name_or_email() {
        let h = Harness::new();
        h.register("Alice").await;
        let use_case = SignInUseCase::new(h.repo.clone(), h.config.clone());

        for identifier in ["alice", "ALICE", "alice@example.com"] {
            let output = use_case.execute(sign_in(identifier, PASSWORD)).await.unwrap();
            assert!(matches!(output, SignInOutput::Authenticated { .. }));
        }

        let err = use_case
            .execute(sign_in("alice", "wrong-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommunityError::InvalidCredentials));

        let err = use_case.execute(sign_in("", PASSWORD)).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing fields");
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let h = Harness::new();
        h.register("alice").await;

        let err = crate::application::SignUpUseCase::new(h.repo.clone(), h.config.clone())
            .execute(crate::application::SignUpInput {
                user_name: "ALICE".to_string(),
                email: "other@example.com".to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "user_name_taken");
    }

    /// alice registers and posts, bob follows, root bans and unbans alice
    #[tokio::test]
    async fn test_alice_bob_root_scenario() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let bob = h.register("bob").await;
        let root = h.admin("root").await;
        let sign_ins = SignInUseCase::new(h.repo.clone(), h.config.clone());
        let resolver = CurrentIdentityUseCase::new(h.repo.clone(), h.config.clone());

        let SignInOutput::Authenticated { token, .. } =
            sign_ins.execute(sign_in("alice", PASSWORD)).await.unwrap()
        else {
            panic!("alice should sign in");
        };
        let current = resolver.execute(Some(&token.token)).await.unwrap();
        assert_eq!(current.identity().unwrap().user_name.original(), "alice");

        h.posts()
            .create(
                &alice,
                crate::application::CreatePostInput {
                    title: "Before".to_string(),
                    description: "text".to_string(),
                    image: None,
                    category_id: None,
                },
            )
            .await
            .unwrap();
        h.follows().follow(&bob, "alice").await.unwrap();
        h.posts()
            .create(
                &alice,
                crate::application::CreatePostInput {
                    title: "Hello".to_string(),
                    description: "text".to_string(),
                    image: None,
                    category_id: None,
                },
            )
            .await
            .unwrap();

        let bob_notices = h.notifications().list_recent(bob.id, None).await.unwrap();
        assert_eq!(bob_notices.items.len(), 1);
        assert!(bob_notices.items[0].text.ends_with("Hello"));

        h.moderation()
            .ban(&root, alice.id, Some("spam".to_string()))
            .await
            .unwrap();

        match sign_ins.execute(sign_in("alice", PASSWORD)).await.unwrap() {
            SignInOutput::Banned { reason } => {
                assert_eq!(reason.unwrap().as_str(), "spam");
            }
            SignInOutput::Authenticated { .. } => panic!("banned identity got a session"),
        }
        // The earlier session no longer resolves either.
        assert!(matches!(
            resolver.execute(Some(&token.token)).await.unwrap(),
            Resolution::Banned(_)
        ));

        h.moderation().unban(&root, alice.id).await.unwrap();
        assert!(matches!(
            sign_ins.execute(sign_in("alice", PASSWORD)).await.unwrap(),
            SignInOutput::Authenticated { .. }
        ));
    }
}

#[cfg(test)]
mod profile_tests {
    use super::support::{AVATAR_SECRET, Harness, PASSWORD};
    use crate::application::{ProfileUpdateInput, SignInInput, SignInOutput, SignInUseCase};
    use crate::domain::value_object::{ImageRef, Patch};
    use crate::error::{CommunityError, ConflictReason};

    #[tokio::test]
    async fn test_update_profile_replaces_avatar() {
        let h = Harness::new();
        let alice = h.register("alice").await;

        let set_avatar = |key: &str| ProfileUpdateInput {
            avatar: Patch::Set(ImageRef::new(format!("https://cdn.test/{key}"), key).unwrap()),
            ..ProfileUpdateInput::default()
        };

        let alice = h.profiles().update(&alice, set_avatar("av-1")).await.unwrap();
        assert!(h.blobs.calls().is_empty());

        let alice = h.profiles().update(&alice, set_avatar("av-2")).await.unwrap();
        assert_eq!(alice.avatar.as_ref().unwrap().key, "av-2");
        assert_eq!(
            h.blobs.calls(),
            vec![(Some(AVATAR_SECRET.to_string()), "av-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_update_profile_conflicts_and_empty() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        h.register("bob").await;

        let err = h
            .profiles()
            .update(&alice, ProfileUpdateInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Nothing to update");

        let err = h
            .profiles()
            .update(
                &alice,
                ProfileUpdateInput {
                    email: Some("BOB@example.com".to_string()),
                    ..ProfileUpdateInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommunityError::Conflict(ConflictReason::EmailTaken)
        ));

        let renamed = h
            .profiles()
            .update(
                &alice,
                ProfileUpdateInput {
                    user_name: Some("Alice_2".to_string()),
                    ..ProfileUpdateInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.user_name.original(), "Alice_2");
        assert_eq!(renamed.user_name.canonical(), "alice_2");
    }

    #[tokio::test]
    async fn test_change_password() {
        let h = Harness::new();
        let alice = h.register("alice").await;

        let err = h
            .profiles()
            .change_password(&alice, "not-it".to_string(), "newsecret".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Current password is incorrect");

        h.profiles()
            .change_password(&alice, PASSWORD.to_string(), "newsecret".to_string())
            .await
            .unwrap();

        let output = SignInUseCase::new(h.repo.clone(), h.config.clone())
            .execute(SignInInput {
                identifier: "alice".to_string(),
                password: "newsecret".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(output, SignInOutput::Authenticated { .. }));
    }

    #[tokio::test]
    async fn test_profile_view() {
        let h = Harness::new();
        let alice = h.register("alice").await;
        let bob = h.register("bob").await;
        h.follows().follow(&bob, "alice").await.unwrap();

        let view = h.profiles().view("alice", Some(&bob)).await.unwrap();
        assert_eq!(view.summary.id, alice.id);
        assert_eq!(view.counts.followers, 1);
        assert!(view.viewer_follows);

        let anonymous = h.profiles().view("alice", None).await.unwrap();
        assert!(!anonymous.viewer_follows);
    }
}

#[cfg(test)]
mod router_tests {
    use super::support::{Harness, PASSWORD};
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    /// `name=value` pair of the first Set-Cookie for `name`
    fn cookie_pair(response: &Response, name: &str) -> Option<String> {
        set_cookies(response)
            .into_iter()
            .find(|c| c.starts_with(&format!("{name}=")))
            .and_then(|c| c.split(';').next().map(str::to_string))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register(app: &Router, name: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                json!({"username": name, "email": format!("{name}@example.com"), "password": PASSWORD}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        cookie_pair(&response, "token").unwrap()
    }

    #[tokio::test]
    async fn test_register_then_me_renews_cookie() {
        let h = Harness::new();
        let app = h.router();
        let token = register(&app, "alice").await;

        let response = app.clone().oneshot(get("/api/auth/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(cookie_pair(&response, "token").is_some());

        let body = body_json(response).await;
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["role"], "USER");
    }

    #[tokio::test]
    async fn test_malformed_body_is_problem_json() {
        let h = Harness::new();
        h.admin("root").await;
        let app = h.router();

        // Anonymous callers are refused before the body is read.
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/admin/users/ban",
                json!({"reason": "spam"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "unauthenticated");

        let login = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                json!({"identifier": "root", "password": PASSWORD}),
                None,
            ))
            .await
            .unwrap();
        let root = cookie_pair(&login, "token").unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/admin/users/ban",
                json!({"reason": "spam"}),
                Some(&root),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body["code"], "validation");
        assert!(body["detail"].as_str().unwrap().contains("userId"));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "validation");
    }

    #[tokio::test]
    async fn test_anonymous_me_and_protected_route() {
        let h = Harness::new();
        let app = h.router();

        let response = app.clone().oneshot(get("/api/auth/me", None)).await.unwrap();
        assert!(set_cookies(&response).is_empty());
        assert_eq!(body_json(response).await["authenticated"], false);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/posts",
                json!({"title": "Hi", "description": "text"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_bad_token_cookie_is_cleared() {
        let h = Harness::new();
        let app = h.router();

        let response = app
            .clone()
            .oneshot(get("/api/auth/me", Some("token=forged.value")))
            .await
            .unwrap();
        let cleared = cookie_pair(&response, "token").unwrap();
        assert_eq!(cleared, "token=");
    }

    #[tokio::test]
    async fn test_banned_login_sets_ban_signal() {
        let h = Harness::new();
        let root = h.admin("root").await;
        let alice = h.register("alice").await;
        let app = h.router();

        h.moderation()
            .ban(&root, alice.id, Some("spam".to_string()))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                json!({"identifier": "alice", "password": PASSWORD}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(cookie_pair(&response, "banned").as_deref(), Some("banned=1"));
        assert_eq!(cookie_pair(&response, "token").as_deref(), Some("token="));

        let body = body_json(response).await;
        assert_eq!(body["banned"], true);
        assert_eq!(body["reason"], "spam");
    }

    #[tokio::test]
    async fn test_ban_gate_redirects_pages_only() {
        let h = Harness::new();
        let app = h.router();

        let response = app.clone().oneshot(get("/", Some("banned=1"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/banned");

        let response = app
            .clone()
            .oneshot(get("/api/posts", Some("banned=1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(get("/banned", Some("banned=1"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(get("/", Some("banned=0"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_lifecycle_over_http() {
        let h = Harness::new();
        let app = h.router();
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/follow", json!({"username": "alice"}), Some(&bob)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/posts",
                json!({
                    "title": "Hello",
                    "description": "World",
                    "image": {"url": "https://cdn.test/k1", "key": "k1"}
                }),
                Some(&alice),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["notified"], 1);
        let id = body["post"]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/posts/{id}"),
                json!({"title": "Hijack"}),
                Some(&bob),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(get("/api/notifications", Some(&bob)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["unread"], 1);
        assert_eq!(body["items"][0]["type"], "NEW_POST");

        let response = app
            .clone()
            .oneshot(get("/api/posts/not-a-number", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/posts/{id}"))
                    .header(header::COOKIE, &alice)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(h.blobs.calls().len(), 1);
    }
}
