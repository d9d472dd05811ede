//! Article loading.
//!
//! Articles are TOML documents with the site's content fields: title,
//! author, optional publication date, a kind discriminator, and markdown
//! content. Only writeups carry narration; infographics are chart pages
//! with no prose worth reading aloud.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub kind: ArticleKind,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ArticleKind {
    #[default]
    Writeup,
    Infographic,
}

impl ArticleKind {
    pub fn supports_narration(&self) -> bool {
        matches!(self, ArticleKind::Writeup)
    }
}

pub fn load_article(path: &Path) -> Result<Article> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Reading article {}", path.display()))?;
    let article: Article = toml::from_str(&contents)
        .with_context(|| format!("Parsing article {}", path.display()))?;
    Ok(article)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_writeup() {
        let article: Article = toml::from_str(
            r#"
            title = "The Quiet Launch"
            author = "M. Vance"
            content = "It began **quietly**."
            "#,
        )
        .unwrap();
        assert_eq!(article.title, "The Quiet Launch");
        assert_eq!(article.kind, ArticleKind::Writeup);
        assert!(article.kind.supports_narration());
        assert!(article.date.is_none());
    }

    #[test]
    fn infographics_do_not_narrate() {
        let article: Article = toml::from_str(
            r#"
            title = "Numbers"
            author = "M. Vance"
            kind = "infographic"
            "#,
        )
        .unwrap();
        assert_eq!(article.kind, ArticleKind::Infographic);
        assert!(!article.kind.supports_narration());
        assert!(article.content.is_empty());
    }
}
