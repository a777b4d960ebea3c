//! Session model for the host shell: which round we are on, whether
//! the current cookie has been broken, and what the fortune says. The
//! animation core never reads this; it only feeds it through callbacks.

use serde::{Deserialize, Serialize};
use std::rc::Rc;
use yew::Reducible;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub round: u32,
    pub broken: bool,
    pub revealed: bool,
    /// Which gesture broke the current cookie, e.g. "double_tap".
    pub last_gesture: Option<String>,
    pub last_force: f64,
    /// Payload handed to the core for the current round.
    pub fortune: String,
}

impl SessionState {
    pub fn new(fortune: String) -> Self {
        Self {
            round: 1,
            broken: false,
            revealed: false,
            last_gesture: None,
            last_force: 0.0,
            fortune,
        }
    }
}

#[derive(Clone, Debug)]
pub enum SessionAction {
    CookieBroken { gesture: String, force: f64 },
    FortuneRevealed,
    NewCookie { fortune: String },
}

impl Reducible for SessionState {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut new = (*self).clone();
        match action {
            SessionAction::CookieBroken { gesture, force } => {
                if !new.broken {
                    new.broken = true;
                    new.last_gesture = Some(gesture);
                    new.last_force = force;
                }
            }
            SessionAction::FortuneRevealed => {
                if new.broken {
                    new.revealed = true;
                }
            }
            SessionAction::NewCookie { fortune } => {
                new.round = new.round.saturating_add(1);
                new.broken = false;
                new.revealed = false;
                new.last_gesture = None;
                new.last_force = 0.0;
                new.fortune = fortune;
            }
        }
        Rc::new(new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch(state: SessionState, action: SessionAction) -> SessionState {
        (*Rc::new(state).reduce(action)).clone()
    }

    #[test]
    fn break_then_reveal_then_new_round() {
        let s = SessionState::new("a".into());
        let s = dispatch(
            s,
            SessionAction::CookieBroken {
                gesture: "squeeze".into(),
                force: 1.0,
            },
        );
        assert!(s.broken && !s.revealed);
        assert_eq!(s.last_gesture.as_deref(), Some("squeeze"));

        let s = dispatch(s, SessionAction::FortuneRevealed);
        assert!(s.revealed);

        let s = dispatch(s, SessionAction::NewCookie { fortune: "b".into() });
        assert_eq!(s.round, 2);
        assert!(!s.broken && !s.revealed);
        assert_eq!(s.fortune, "b");
        assert!(s.last_gesture.is_none());
    }

    #[test]
    fn reveal_without_break_is_ignored() {
        let s = SessionState::new("a".into());
        let s = dispatch(s, SessionAction::FortuneRevealed);
        assert!(!s.revealed);
    }

    #[test]
    fn duplicate_break_keeps_first_gesture() {
        let s = SessionState::new("a".into());
        let s = dispatch(
            s,
            SessionAction::CookieBroken {
                gesture: "click_smash".into(),
                force: 0.6,
            },
        );
        let s = dispatch(
            s,
            SessionAction::CookieBroken {
                gesture: "squeeze".into(),
                force: 1.0,
            },
        );
        assert_eq!(s.last_gesture.as_deref(), Some("click_smash"));
    }
}
