//! Page bindings of the client application.
//!
//! Each route table entry that is not a redirect binds a path to one of these
//! pages. The dev server answers such paths with the application shell for the
//! page; the client bundle takes over from there.

pub mod render;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use render::{render_not_found, render_page};

/// Pages shipped by the client application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Register,
    Login,
    Comments,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Register, Page::Login, Page::Comments];

    /// Name of the client component mounted for this page.
    pub fn component(self) -> &'static str {
        match self {
            Page::Register => "RegisterPage",
            Page::Login => "LoginPage",
            Page::Comments => "CommentsPage",
        }
    }

    /// Human readable heading.
    pub fn title(self) -> &'static str {
        match self {
            Page::Register => "Register",
            Page::Login => "Log in",
            Page::Comments => "Comments",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Page::Register => "register",
            Page::Login => "login",
            Page::Comments => "comments",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
