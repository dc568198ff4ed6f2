//! Color and role arbitration.
//!
//! Both devices discover each other over an unordered gossip channel, so
//! symmetry has to break without a central server: the first device to
//! stamp an invite timestamp plays white, the device that accepts the
//! earlier invitation plays black. Equal timestamps resolve to mutual
//! ignore; since stamps are sticky for the life of a session, that stall
//! persists until one side restarts and draws a new timestamp.

/// What to do with an incoming invitation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InviteDecision {
    /// Take the invitation; this device plays black.
    Accept,
    /// Drop it; our own invitation is expected to win (or it was our own
    /// name echoed back by symmetric discovery).
    Ignore,
}

/// Pure arbitration state for one session.
#[derive(Clone, Debug)]
pub(crate) struct Arbiter {
    local_name: String,
    invite_timestamp: Option<f64>,
    is_black: bool,
}

impl Arbiter {
    pub(crate) fn new(local_name: impl Into<String>) -> Self {
        Arbiter {
            local_name: local_name.into(),
            invite_timestamp: None,
            is_black: false,
        }
    }

    /// The color this device has resolved to so far. White-default until an
    /// invitation is accepted.
    pub(crate) fn is_black(&self) -> bool {
        self.is_black
    }

    /// Record the invite timestamp on first peer discovery. Later
    /// discoveries reuse the original stamp so our priority never changes
    /// mid-negotiation.
    pub(crate) fn stamp_invite(&mut self, now: f64) -> f64 {
        *self.invite_timestamp.get_or_insert(now)
    }

    /// Decide on an invitation from `sender` carrying `timestamp`. Accepting
    /// adopts black; the earlier inviter becomes white on their side.
    pub(crate) fn on_invitation(&mut self, sender: &str, timestamp: f64) -> InviteDecision {
        if sender == self.local_name {
            // loop-back artifact of symmetric discovery
            return InviteDecision::Ignore;
        }

        match self.invite_timestamp {
            Some(own) if timestamp >= own => InviteDecision::Ignore,
            _ => {
                self.is_black = true;
                InviteDecision::Accept
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_inviter_accepts_earlier_invitation_and_turns_black() {
        let mut arbiter = Arbiter::new("bravo");
        arbiter.stamp_invite(200.0);

        assert_eq!(arbiter.on_invitation("alpha", 100.0), InviteDecision::Accept);
        assert!(arbiter.is_black());
    }

    #[test]
    fn earlier_inviter_ignores_later_invitation() {
        let mut arbiter = Arbiter::new("alpha");
        arbiter.stamp_invite(100.0);

        assert_eq!(arbiter.on_invitation("bravo", 200.0), InviteDecision::Ignore);
        assert!(!arbiter.is_black());
    }

    #[test]
    fn device_without_own_stamp_accepts() {
        let mut arbiter = Arbiter::new("bravo");
        assert_eq!(arbiter.on_invitation("alpha", 100.0), InviteDecision::Accept);
        assert!(arbiter.is_black());
    }

    #[test]
    fn equal_timestamps_resolve_to_ignore_on_both_sides() {
        let mut left = Arbiter::new("alpha");
        let mut right = Arbiter::new("bravo");
        left.stamp_invite(150.0);
        right.stamp_invite(150.0);

        assert_eq!(left.on_invitation("bravo", 150.0), InviteDecision::Ignore);
        assert_eq!(right.on_invitation("alpha", 150.0), InviteDecision::Ignore);
    }

    #[test]
    fn self_invitation_is_ignored() {
        let mut arbiter = Arbiter::new("alpha");
        assert_eq!(arbiter.on_invitation("alpha", 1.0), InviteDecision::Ignore);
        assert!(!arbiter.is_black());
    }

    #[test]
    fn stamp_is_sticky_across_discoveries() {
        let mut arbiter = Arbiter::new("alpha");
        assert_eq!(arbiter.stamp_invite(100.0), 100.0);
        assert_eq!(arbiter.stamp_invite(300.0), 100.0);
    }
}
