//! Dashboard access decisions.
//!
//! Handlers load the dashboard and work out who is asking. The functions
//! here then decide what may be revealed and whether the view counter
//! moves. Content is revealed (and counted) only by
//! [`AccessDecision::OwnerView`], [`AccessDecision::PublicView`] and
//! [`PasswordCheck::Correct`].

/// Facts about a dashboard and its requester that drive the access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessContext {
    pub is_owner: bool,
    pub shared: bool,
    pub has_password: bool,
}

/// Outcome of opening a dashboard without a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The owner always sees the dashboard, password or not.
    OwnerView,
    /// Not shared: nothing is revealed to anyone but the owner.
    NotShared,
    /// Shared without a password: content is public.
    PublicView,
    /// Shared behind a password: the client must submit it separately.
    PasswordRequired,
}

impl AccessDecision {
    /// Whether this outcome returns dashboard content and counts a view.
    pub fn reveals_content(self) -> bool {
        matches!(self, AccessDecision::OwnerView | AccessDecision::PublicView)
    }
}

/// Decide what a requester may see when opening a dashboard.
pub fn decide_access(ctx: AccessContext) -> AccessDecision {
    if ctx.is_owner {
        AccessDecision::OwnerView
    } else if !ctx.shared {
        AccessDecision::NotShared
    } else if !ctx.has_password {
        AccessDecision::PublicView
    } else {
        AccessDecision::PasswordRequired
    }
}

/// Outcome of submitting a password for a shared dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    NotShared,
    Correct,
    Incorrect,
}

impl PasswordCheck {
    pub fn reveals_content(self) -> bool {
        matches!(self, PasswordCheck::Correct)
    }
}

/// Decide the result of a password submission.
///
/// `matched` must be `false` when the dashboard has no password at all.
pub fn decide_password_check(shared: bool, matched: bool) -> PasswordCheck {
    match (shared, matched) {
        (false, _) => PasswordCheck::NotShared,
        (true, true) => PasswordCheck::Correct,
        (true, false) => PasswordCheck::Incorrect,
    }
}
