//! UI route table and the navigation guard in front of it.

pub const LOGIN: &str = "/login";
pub const DASHBOARD: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(&'static str),
}

/// Decide a navigation from the target's `requires_auth` and whether a session exists.
pub fn guard(requires_auth: bool, authenticated: bool) -> Navigation {
    match (requires_auth, authenticated) {
        (true, false) => Navigation::Redirect(LOGIN),
        (false, true) => Navigation::Redirect(DASHBOARD),
        _ => Navigation::Proceed,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Page {
        name: &'static str,
        requires_auth: bool,
    },
    Redirect(&'static str),
}

struct Page {
    pattern: &'static str,
    name: &'static str,
}

const AUTH_PAGES: &[Page] = &[
    Page { pattern: "login", name: "Login" },
    Page { pattern: "register", name: "Register" },
    Page { pattern: "forgot-password", name: "ForgotPassword" },
];

/// Children of the admin layout.
const ADMIN_PAGES: &[Page] = &[
    Page { pattern: "dashboard", name: "Dashboard" },
    Page { pattern: "properties", name: "Properties" },
    Page { pattern: "properties/add", name: "AddProperty" },
    Page { pattern: "properties/:id", name: "PropertyDetails" },
    Page { pattern: "properties/:id/edit", name: "EditProperty" },
    Page { pattern: "clients", name: "Clients" },
    Page { pattern: "clients/add", name: "AddClient" },
    Page { pattern: "clients/:id", name: "ClientDetails" },
    Page { pattern: "clients/:id/edit", name: "EditClient" },
    Page { pattern: "profile", name: "Profile" },
    Page { pattern: "settings", name: "Settings" },
];

fn matches(pattern: &str, path: &str) -> bool {
    let mut pattern = pattern.split('/');
    let mut path = path.split('/');
    loop {
        match (pattern.next(), path.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p.starts_with(':') && !s.is_empty() => {}
            (Some(p), Some(s)) if p == s => {}
            _ => return false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouteTable {
    /// `requiresAuth` of the admin layout, inherited by all its children.
    admin_requires_auth: bool,
}

impl RouteTable {
    pub fn new(admin_requires_auth: bool) -> Self {
        Self {
            admin_requires_auth,
        }
    }

    pub fn resolve(&self, path: &str) -> Resolved {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Resolved::Redirect(DASHBOARD);
        }

        if let Some(page) = AUTH_PAGES.iter().find(|p| matches(p.pattern, path)) {
            return Resolved::Page {
                name: page.name,
                requires_auth: false,
            };
        }

        match ADMIN_PAGES.iter().find(|p| matches(p.pattern, path)) {
            Some(page) => Resolved::Page {
                name: page.name,
                requires_auth: self.admin_requires_auth,
            },
            None => Resolved::Redirect(DASHBOARD),
        }
    }

    /// Where a request for `path` ends up. A guard redirect back to the page
    /// being requested is treated as proceeding.
    pub fn navigate(&self, path: &str, authenticated: bool) -> Navigation {
        match self.resolve(path) {
            Resolved::Redirect(target) => Navigation::Redirect(target),
            Resolved::Page { requires_auth, .. } => match guard(requires_auth, authenticated) {
                Navigation::Redirect(target) if target.trim_matches('/') == path.trim_matches('/') => {
                    Navigation::Proceed
                }
                other => other,
            },
        }
    }
}
