//! CSS URL rewriting.
//!
//! Stylesheets from the CSS host point at font files with absolute
//! `https://fonts.gstatic.com/...` URLs. Left alone, browsers would fetch the
//! fonts straight from the origin. Each rule here swaps an upstream prefix
//! for the proxy's base URL and leaves the rest of the URL untouched.
//!
//! Rules run in order: `url('…')`, `url("…")` and `url(…)` forms first, bare
//! URLs last. A bare rule matches text a `url(` rule would also match, so the
//! specific forms go first; once rewritten, the upstream host is gone and the
//! bare rule cannot touch the same occurrence twice.

use std::str::Utf8Error;

use crate::upstream::Upstream;

#[derive(Debug)]
struct Rule {
    from: String,
    to: String,
}

#[derive(Debug)]
pub struct CssRewriter {
    rules: Vec<Rule>,
}

impl CssRewriter {
    /// Rules for every upstream host, rewriting onto `base` (no trailing `/`).
    pub fn new(base: &str) -> Self {
        let mut rules = Vec::new();

        for upstream in Upstream::ALL {
            let origin = format!("https://{}/", upstream.host());
            for quote in ["'", "\"", ""] {
                rules.push(Rule {
                    from: format!("url({quote}{origin}"),
                    to: format!("url({quote}{base}/"),
                });
            }
        }

        for upstream in Upstream::ALL {
            rules.push(Rule {
                from: format!("https://{}/", upstream.host()),
                to: format!("{base}/"),
            });
        }

        Self { rules }
    }

    pub fn rewrite(&self, css: &str) -> String {
        self.rules
            .iter()
            .fold(css.to_owned(), |text, rule| {
                if text.contains(&rule.from) {
                    text.replace(&rule.from, &rule.to)
                } else {
                    text
                }
            })
    }

    /// Decodes `body` as UTF-8 and rewrites it.
    pub fn rewrite_bytes(&self, body: &[u8]) -> Result<String, Utf8Error> {
        std::str::from_utf8(body).map(|css| self.rewrite(css))
    }
}
