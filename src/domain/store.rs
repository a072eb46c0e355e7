use std::hash::{Hash, Hasher};

use serde::Serialize;

/// A storefront discovered on a marketplace search page. The link is the
/// identity, the display name is informational only.
#[derive(Debug, Clone, Serialize, Eq)]
pub struct Store {
    pub link: String,
    pub name: String,
}

impl Store {
    pub fn new(link: &str, name: &str) -> Self {
        Store {
            link: link.to_string(),
            name: name.to_string(),
        }
    }
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link
    }
}

impl Hash for Store {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.link.hash(state);
    }
}
