use std::sync::Arc;

use moka::future::Cache;
use serde::Serialize;
use tracing::debug;

use super::domain::{Page, PageKind, MAX_FEATURED};
use super::repository::PageStore;
use crate::cache::{fragment_cache, loader_error};
use crate::config::{CacheConfig, SiteConfig};
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub title: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeaturedCard {
    pub title: String,
    pub href: String,
    pub intro: String,
    pub image: Option<String>,
}

/// Shared data every full page renders: navigation and site settings.
#[derive(Debug, Clone, Default)]
pub struct SiteChrome {
    pub navigation: Vec<NavLink>,
}

/// Page lookups for the public site with cached navigation and featured pages.
pub struct SiteService {
    pages: Arc<dyn PageStore>,
    site: SiteConfig,
    navigation: Cache<&'static str, Vec<NavLink>>,
    featured: Cache<&'static str, Vec<FeaturedCard>>,
}

const NAVIGATION_KEY: &str = "site_pages";
const FEATURED_KEY: &str = "home_page_featured_post_list";

impl SiteService {
    pub fn new(pages: Arc<dyn PageStore>, site: SiteConfig, cache: &CacheConfig) -> Self {
        Self {
            pages,
            site,
            navigation: fragment_cache(cache.navigation_ttl),
            featured: fragment_cache(cache.featured_ttl),
        }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn pages(&self) -> &Arc<dyn PageStore> {
        &self.pages
    }

    /// The live home page directly under the root.
    pub async fn home(&self) -> Result<Option<Page>, StoreError> {
        let root = self.pages.root().await?;
        Ok(self
            .pages
            .children(root.id)
            .await?
            .into_iter()
            .find(|page| page.kind == PageKind::Home && page.live))
    }

    pub async fn chrome(&self) -> Result<SiteChrome, StoreError> {
        Ok(SiteChrome {
            navigation: self.navigation().await?,
        })
    }

    /// Live, in-menu children of the home page.
    pub async fn navigation(&self) -> Result<Vec<NavLink>, StoreError> {
        self.navigation
            .try_get_with(NAVIGATION_KEY, async {
                let Some(home) = self.home().await? else {
                    return Ok(Vec::new());
                };
                let links: Vec<NavLink> = self
                    .pages
                    .children(home.id)
                    .await?
                    .into_iter()
                    .filter(|page| page.live && page.show_in_menu)
                    .map(|page| NavLink {
                        href: page.href(),
                        title: page.title,
                    })
                    .collect();
                debug!(links = links.len(), "navigation rebuilt");
                Ok::<_, StoreError>(links)
            })
            .await
            .map_err(loader_error)
    }

    /// Featured pages of the home page in editor order, live ones only.
    pub async fn featured(&self, home: &Page) -> Result<Vec<FeaturedCard>, StoreError> {
        self.featured
            .try_get_with(FEATURED_KEY, async {
                let mut cards = Vec::new();
                for id in home.featured.iter().take(MAX_FEATURED) {
                    if let Some(page) = self.pages.fetch_page(*id).await? {
                        if page.live {
                            cards.push(FeaturedCard {
                                href: page.href(),
                                title: page.title,
                                intro: page.intro,
                                image: page.hero_image,
                            });
                        }
                    }
                }
                Ok::<_, StoreError>(cards)
            })
            .await
            .map_err(loader_error)
    }

    /// A live direct child of the home page.
    pub async fn home_child(&self, slug: &str) -> Result<Option<Page>, StoreError> {
        let Some(home) = self.home().await? else {
            return Ok(None);
        };
        Ok(self
            .pages
            .children(home.id)
            .await?
            .into_iter()
            .find(|page| page.live && page.slug == slug))
    }

    /// A live newsletter issue under any newsletter index.
    pub async fn newsletter(&self, slug: &str) -> Result<Option<Page>, StoreError> {
        Ok(self
            .pages
            .pages_of_kind(PageKind::Newsletter)
            .await?
            .into_iter()
            .find(|page| page.live && page.slug == slug))
    }

    pub async fn newsletter_issues(&self, index: &Page) -> Result<Vec<Page>, StoreError> {
        Ok(self
            .pages
            .children(index.id)
            .await?
            .into_iter()
            .filter(|page| page.live && page.kind == PageKind::Newsletter)
            .collect())
    }
}
