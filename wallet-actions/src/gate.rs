//! Screen routing based on the local session marker.
//!
//! This is navigation, not access control: the session is an unsigned local
//! file and anyone can write one.

use lib_core::Session;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Signup,
    Home,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Signup => write!(f, "signup"),
            Screen::Home => write!(f, "home"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Redirect(Screen),
}

/// Signup with a session goes home; anything else without a session goes to signup.
pub fn route(screen: Screen, session: Option<&Session>) -> GateDecision {
    match (screen, session) {
        (Screen::Signup, Some(_)) => GateDecision::Redirect(Screen::Home),
        (Screen::Signup, None) => GateDecision::Proceed,
        (_, None) => GateDecision::Redirect(Screen::Signup),
        (_, Some(_)) => GateDecision::Proceed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_is_open_until_signed_up() {
        let session = Session::new("alice").unwrap();
        assert_eq!(route(Screen::Signup, None), GateDecision::Proceed);
        assert_eq!(
            route(Screen::Signup, Some(&session)),
            GateDecision::Redirect(Screen::Home)
        );
    }

    #[test]
    fn home_needs_a_session() {
        let session = Session::new("alice").unwrap();
        assert_eq!(route(Screen::Home, Some(&session)), GateDecision::Proceed);
        assert_eq!(route(Screen::Home, None), GateDecision::Redirect(Screen::Signup));
    }

    #[test]
    fn screens_display_as_names() {
        assert_eq!(Screen::Signup.to_string(), "signup");
        assert_eq!(Screen::Home.to_string(), "home");
    }
}
