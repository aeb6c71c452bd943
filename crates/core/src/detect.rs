use crate::domain::{Candidate, PersistedState};
use crate::time::LocalTime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
    /// Notify about the baseline post on the very first observation.
    pub send_bootstrap: bool,
    /// At most one notification per local calendar date of the post.
    pub once_per_day: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Bootstrap { notify: bool },
    NotifyNew,
    SuppressDaily,
    NoChange,
    NoCandidate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub state: PersistedState,
    pub changed: bool,
}

impl Decision {
    pub fn should_notify(&self) -> bool {
        matches!(
            self.action,
            Action::NotifyNew | Action::Bootstrap { notify: true }
        )
    }

    fn unchanged(action: Action, state: &PersistedState) -> Self {
        Self {
            action,
            state: state.clone(),
            changed: false,
        }
    }
}

/// Decides whether `candidate` is a post worth announcing.
///
/// A post counts as new only if its short code differs from the last one seen *and* its
/// timestamp is strictly later. Either signal alone is ignored: a re-ordered grid changes the
/// code without a new publish, and an edited post can change its timestamp.
pub fn decide(
    candidate: &Candidate,
    state: &PersistedState,
    policy: Policy,
    clock: &LocalTime,
) -> Decision {
    let Some(shortcode) = candidate.shortcode.as_deref() else {
        return Decision::unchanged(Action::NoCandidate, state);
    };

    if !state.bootstrapped {
        let mut next = state.clone();
        next.last_shortcode = Some(shortcode.to_string());
        next.last_dt_iso = candidate.taken_at;
        next.bootstrapped = true;

        let mut notify = false;
        if policy.send_bootstrap {
            let local_date = clock.date_of(candidate.taken_at);
            if !already_notified(policy, state, &local_date) {
                notify = true;
                next.last_notified_date = Some(local_date);
            }
        }

        return Decision {
            action: Action::Bootstrap { notify },
            state: next,
            changed: true,
        };
    }

    let is_new_shortcode = state.last_shortcode.as_deref() != Some(shortcode);
    let is_newer_by_time = match (candidate.taken_at, state.last_dt_iso) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(seen), Some(last)) => seen > last,
    };

    if !(is_new_shortcode && is_newer_by_time) {
        return Decision::unchanged(Action::NoChange, state);
    }

    let local_date = clock.date_of(candidate.taken_at);
    let mut next = state.clone();
    next.last_shortcode = Some(shortcode.to_string());
    next.last_dt_iso = candidate.taken_at;

    let action = if already_notified(policy, state, &local_date) {
        Action::SuppressDaily
    } else {
        next.last_notified_date = Some(local_date);
        Action::NotifyNew
    };

    Decision {
        action,
        state: next,
        changed: true,
    }
}

fn already_notified(policy: Policy, state: &PersistedState, local_date: &str) -> bool {
    policy.once_per_day && state.last_notified_date.as_deref() == Some(local_date)
}
