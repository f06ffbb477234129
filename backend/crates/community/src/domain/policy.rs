//! Authorization Policy
//!
//! 権限判定はすべてここに集約する。I/O を持たない純粋関数なので、
//! どのワークフローからも同じ判定結果になる。
//!
//! - 投稿の編集・削除: 投稿者本人または ADMIN
//! - モデレーション（warn / ban / unban）: ADMIN のみ、自分自身と他の ADMIN は対象外
//! - 管理画面からの投稿削除: ADMIN のみ、自分の投稿は対象外
//! - フォロー: 自分自身は不可

use std::fmt;

use crate::domain::entity::{Identity, Post};
use crate::domain::value_object::ModerationKind;

/// Reason a policy check refused an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotAdmin,
    SelfAction(ModerationKind),
    TargetIsAdmin(ModerationKind),
    /// Unban of an identity that is not banned
    NotBanned,
    /// Admin surface used on one's own post
    OwnPost,
    NotOwner,
}

impl Denial {
    pub const fn code(&self) -> &'static str {
        match self {
            Denial::NotAdmin => "not_admin",
            Denial::SelfAction(_) => "self_action",
            Denial::TargetIsAdmin(_) => "target_is_admin",
            Denial::NotBanned => "not_banned",
            Denial::OwnPost => "own_post",
            Denial::NotOwner => "not_owner",
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::NotAdmin => f.write_str("Admin access required"),
            Denial::SelfAction(kind) => write!(f, "You cannot {} yourself", kind.verb()),
            Denial::TargetIsAdmin(kind) => write!(f, "You cannot {} another admin", kind.verb()),
            Denial::NotBanned => f.write_str("User is not banned"),
            Denial::OwnPost => f.write_str("Use the regular delete for your own post"),
            Denial::NotOwner => f.write_str("You can only change your own posts"),
        }
    }
}

pub fn can_edit_post(actor: &Identity, post: &Post) -> bool {
    actor.id == post.author_id() || actor.is_admin()
}

pub fn can_delete_post(actor: &Identity, post: &Post) -> bool {
    can_edit_post(actor, post)
}

/// Check a warn/ban/unban of `target` by `actor`
pub fn can_moderate(actor: &Identity, target: &Identity, kind: ModerationKind) -> Result<(), Denial> {
    if !actor.is_admin() {
        return Err(Denial::NotAdmin);
    }
    if actor.id == target.id {
        return Err(Denial::SelfAction(kind));
    }
    if target.is_admin() {
        return Err(Denial::TargetIsAdmin(kind));
    }
    if kind == ModerationKind::Unban && !target.is_banned() {
        return Err(Denial::NotBanned);
    }
    Ok(())
}

/// Check a deletion through the admin surface
pub fn can_moderate_post(actor: &Identity, post: &Post) -> Result<(), Denial> {
    if !actor.is_admin() {
        return Err(Denial::NotAdmin);
    }
    if actor.id == post.author_id() {
        return Err(Denial::OwnPost);
    }
    Ok(())
}

pub fn can_follow(actor: &Identity, target: &Identity) -> bool {
    actor.id != target.id
}
