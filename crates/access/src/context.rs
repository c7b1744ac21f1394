//! Operation contexts: a storage session plus (depending on the type) an
//! acting-user identity.
//!
//! Exactly one context is built per logical operation and dropped with it;
//! the session it carries must not be shared across concurrent operations.
//! Which of the three types a call site uses states, in its signature,
//! whether an acting identity is guaranteed, absent, or optional — the
//! repository cross-checks that statement against the entity's audit
//! declaration at construction time.

use entix_core::UserId;

/// Common view over the three context types.
///
/// `CARRIES_USER` is `true` for any context type that can ever supply an
/// identity on a write path; it is what repository construction checks
/// against an entity's audit columns.
pub trait AccessContext: Send + Sync {
    type Session;

    const CARRIES_USER: bool;

    fn session(&self) -> &Self::Session;

    /// The acting identity, if one is present for this operation.
    fn acting_user(&self) -> Option<UserId>;
}

/// Context for operations performed by an authenticated user.
#[derive(Debug)]
pub struct UserContext<S> {
    session: S,
    user: UserId,
}

impl<S> UserContext<S> {
    pub fn new(session: S, user: UserId) -> Self {
        Self { session, user }
    }

    pub fn user(&self) -> UserId {
        self.user
    }
}

impl<S: Send + Sync> AccessContext for UserContext<S> {
    type Session = S;

    const CARRIES_USER: bool = true;

    fn session(&self) -> &S {
        &self.session
    }

    fn acting_user(&self) -> Option<UserId> {
        Some(self.user)
    }
}

/// Context for operations where no identity is available or relevant.
#[derive(Debug)]
pub struct NoUserContext<S> {
    session: S,
}

impl<S> NoUserContext<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }
}

impl<S: Send + Sync> AccessContext for NoUserContext<S> {
    type Session = S;

    const CARRIES_USER: bool = false;

    fn session(&self) -> &S {
        &self.session
    }

    fn acting_user(&self) -> Option<UserId> {
        None
    }
}

/// Context for operations that may or may not carry an identity
/// (e.g. endpoints serving both anonymous and signed-in callers).
#[derive(Debug)]
pub struct MaybeUserContext<S> {
    session: S,
    user: Option<UserId>,
}

impl<S> MaybeUserContext<S> {
    pub fn new(session: S, user: Option<UserId>) -> Self {
        Self { session, user }
    }
}

impl<S: Send + Sync> AccessContext for MaybeUserContext<S> {
    type Session = S;

    const CARRIES_USER: bool = true;

    fn session(&self) -> &S {
        &self.session
    }

    fn acting_user(&self) -> Option<UserId> {
        self.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_context_always_supplies_identity() {
        let user = UserId::new();
        let ctx = UserContext::new((), user);
        assert_eq!(ctx.acting_user(), Some(user));
        assert!(UserContext::<()>::CARRIES_USER);
    }

    #[test]
    fn no_user_context_never_supplies_identity() {
        let ctx = NoUserContext::new(());
        assert_eq!(ctx.acting_user(), None);
        assert!(!NoUserContext::<()>::CARRIES_USER);
    }

    #[test]
    fn maybe_user_context_passes_through_presence() {
        let user = UserId::new();
        assert_eq!(MaybeUserContext::new((), Some(user)).acting_user(), Some(user));
        assert_eq!(MaybeUserContext::<()>::new((), None).acting_user(), None);
        assert!(MaybeUserContext::<()>::CARRIES_USER);
    }
}
