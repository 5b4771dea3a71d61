//! Navigation shell
//!
//! The current page is an explicit value owned by the front-end and changed
//! only through [`Navigation::dispatch`]. Every page except `Login` requires
//! a signed-in session.

use floorboard_core::Floor;
use tracing::debug;

/// Pages of the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Login,
    /// Floor directory
    Home,
    /// A floor's feed
    Floor(Floor),
    /// Composer for a floor
    Compose(Floor),
    Account,
}

impl Page {
    pub fn requires_session(&self) -> bool {
        !matches!(self, Page::Login)
    }
}

/// Navigation inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    SignedIn,
    SignedOut,
    OpenHome,
    OpenFloor(Floor),
    Compose(Floor),
    /// A message was posted; return to that floor's feed
    Posted(Floor),
    CancelCompose,
    OpenAccount,
}

/// Navigation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    page: Page,
    signed_in: bool,
    selected_floor: Floor,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            page: Page::Login,
            signed_in: false,
            selected_floor: Floor::new(1),
        }
    }
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start on the home page with an existing session
    pub fn signed_in() -> Self {
        Self::default().reduce(NavAction::SignedIn)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    /// Last floor opened
    pub fn selected_floor(&self) -> Floor {
        self.selected_floor
    }

    /// Pure transition
    pub fn reduce(self, action: NavAction) -> Self {
        let mut next = self;
        match action {
            NavAction::SignedIn => {
                next.signed_in = true;
                next.page = Page::Home;
            }
            NavAction::SignedOut => {
                next.signed_in = false;
                next.page = Page::Login;
            }
            NavAction::OpenHome => next.page = Page::Home,
            NavAction::OpenFloor(floor) => {
                next.selected_floor = floor;
                next.page = Page::Floor(floor);
            }
            NavAction::Compose(floor) => {
                next.selected_floor = floor;
                next.page = Page::Compose(floor);
            }
            NavAction::Posted(floor) => {
                next.selected_floor = floor;
                next.page = Page::Floor(floor);
            }
            NavAction::CancelCompose => next.page = Page::Floor(next.selected_floor),
            NavAction::OpenAccount => next.page = Page::Account,
        }

        if next.page.requires_session() && !next.signed_in {
            next.page = Page::Login;
        }
        next
    }

    /// Apply `action` and return the resulting page
    pub fn dispatch(&mut self, action: NavAction) -> &Page {
        let next = self.reduce(action);
        if next.page != self.page {
            debug!(from = ?self.page, to = ?next.page, ?action, "navigate");
        }
        *self = next;
        &self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_out_always_lands_on_login() {
        let mut nav = Navigation::new();
        for action in [
            NavAction::OpenHome,
            NavAction::OpenFloor(Floor::new(5)),
            NavAction::Compose(Floor::new(5)),
            NavAction::OpenAccount,
        ] {
            assert_eq!(nav.dispatch(action), &Page::Login);
        }
    }

    #[test]
    fn test_compose_round_trip() {
        let mut nav = Navigation::signed_in();
        assert_eq!(nav.page(), &Page::Home);
        assert_eq!(nav.selected_floor(), Floor::new(1));

        nav.dispatch(NavAction::OpenFloor(Floor::new(12)));
        assert_eq!(nav.dispatch(NavAction::Compose(Floor::new(12))), &Page::Compose(Floor::new(12)));
        assert_eq!(nav.dispatch(NavAction::CancelCompose), &Page::Floor(Floor::new(12)));

        nav.dispatch(NavAction::Compose(Floor::GENERAL));
        assert_eq!(nav.dispatch(NavAction::Posted(Floor::GENERAL)), &Page::Floor(Floor::GENERAL));
    }

    #[test]
    fn test_sign_out_from_anywhere() {
        let mut nav = Navigation::signed_in();
        nav.dispatch(NavAction::OpenAccount);
        assert_eq!(nav.dispatch(NavAction::SignedOut), &Page::Login);
        assert!(!nav.is_signed_in());
    }

    #[test]
    fn test_reduce_is_pure() {
        let nav = Navigation::signed_in();
        let next = nav.reduce(NavAction::OpenFloor(Floor::new(3)));
        assert_eq!(nav.page(), &Page::Home);
        assert_eq!(next.page(), &Page::Floor(Floor::new(3)));
    }
}
