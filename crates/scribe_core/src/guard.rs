use crate::Identity;

/// Views the app can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Landing,
    Login,
    Generate,
    NotFound,
}

impl Destination {
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        match path.trim_end_matches('/') {
            "" => Destination::Landing,
            "/login" => Destination::Login,
            "/generate" => Destination::Generate,
            _ => Destination::NotFound,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Destination::Landing => "/",
            Destination::Login => "/login",
            Destination::Generate => "/generate",
            Destination::NotFound => "/404",
        }
    }
}

/// Decides where a navigation to `requested` actually lands.
///
/// The generator requires an identity; the login view is only for signed-out users.
pub fn resolve_destination(identity: Option<&Identity>, requested: Destination) -> Destination {
    match (identity, requested) {
        (None, Destination::Generate) => Destination::Login,
        (Some(_), Destination::Login) => Destination::Generate,
        (_, other) => other,
    }
}
