//! Upstream selection.

/// Serves the `/css` and `/css2` stylesheet API.
pub const CSS_HOST: &str = "fonts.googleapis.com";

/// Serves font binaries and everything else.
pub const ASSET_HOST: &str = "fonts.gstatic.com";

const CSS_PREFIXES: [&str; 2] = ["/css", "/css2"];

/// Which upstream host a request goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upstream {
    Css,
    Assets,
}

impl Upstream {
    pub const ALL: [Upstream; 2] = [Upstream::Css, Upstream::Assets];

    /// Picks the upstream for a request path. Total: every path maps somewhere.
    pub fn for_path(path: &str) -> Self {
        if CSS_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
            Self::Css
        } else {
            Self::Assets
        }
    }

    pub fn host(self) -> &'static str {
        match self {
            Self::Css => CSS_HOST,
            Self::Assets => ASSET_HOST,
        }
    }

    /// `https://<host><path_and_query>`.
    pub fn url(self, path_and_query: &str) -> String {
        format!("https://{}{}", self.host(), path_and_query)
    }
}
