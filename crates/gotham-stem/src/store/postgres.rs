use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use tracing::info;

use super::{Slice, StoreError};
use crate::config::DatabaseConfig;
use crate::directory::domain::{
    NewProgram, NewResource, Program, ProgramId, ProgramProfile, Resource, ResourceId,
};
use crate::directory::query::{FacetQuery, StatusScope};
use crate::directory::repository::DirectoryStore;
use crate::directory::taxonomy::{NewTerm, TaxonomyKind, TaxonomyTerm, TermId};
use crate::newsletter::domain::{Recipient, RecipientId, RecipientStore};
use crate::pages::domain::{ContentBlock, NewPage, Page, PageId, PageKind};
use crate::pages::repository::PageStore;

const PROGRAM_COLUMNS: &str = "p.id, p.parent_id, p.title, p.slug, p.live, \
     p.first_published_at, p.last_published_at, p.profile";
const RESOURCE_COLUMNS: &str = "p.id, p.name, p.author, p.link, p.image, p.age_group, p.live";
const PAGE_COLUMNS: &str =
    "id, parent_id, kind, title, slug, live, show_in_menu, hero_image, intro, body, featured";
const RECIPIENT_COLUMNS: &str = "id, email, active, created, modified";

/// Store backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn term_links(
        &self,
        table: Link,
        owners: &[i64],
    ) -> Result<BTreeMap<i64, BTreeSet<TermId>>, StoreError> {
        let sql = format!(
            "SELECT {owner}, term_id FROM {table} WHERE {owner} = ANY($1)",
            owner = table.owner_column(),
            table = table.table(),
        );
        let rows: Vec<(i64, i64)> = sqlx::query_as(&sql)
            .bind(owners.to_vec())
            .fetch_all(&self.pool)
            .await?;

        let mut links: BTreeMap<i64, BTreeSet<TermId>> = BTreeMap::new();
        for (owner, term) in rows {
            links.entry(owner).or_default().insert(TermId(term));
        }
        Ok(links)
    }

    async fn programs_with_terms(&self, rows: Vec<ProgramRow>) -> Result<Vec<Program>, StoreError> {
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut links = self.term_links(Link::Program, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let terms = links.remove(&row.id).unwrap_or_default();
                row.into_program(terms)
            })
            .collect())
    }

    async fn resources_with_terms(
        &self,
        rows: Vec<ResourceRow>,
    ) -> Result<Vec<Resource>, StoreError> {
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut links = self.term_links(Link::Resource, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let terms = links.remove(&row.id).unwrap_or_default();
                row.into_resource(terms)
            })
            .collect())
    }
}

#[derive(Debug, Clone, Copy)]
enum Link {
    Program,
    Resource,
}

impl Link {
    const fn table(self) -> &'static str {
        match self {
            Self::Program => "program_terms",
            Self::Resource => "resource_terms",
        }
    }

    const fn owner_column(self) -> &'static str {
        match self {
            Self::Program => "program_id",
            Self::Resource => "resource_id",
        }
    }

    const fn records(self) -> &'static str {
        match self {
            Self::Program => "programs",
            Self::Resource => "resources",
        }
    }

    const fn text_column(self) -> &'static str {
        match self {
            Self::Program => "p.title",
            Self::Resource => "p.name",
        }
    }
}

fn escape_like(token: &str) -> String {
    let mut pattern = String::with_capacity(token.len() + 2);
    pattern.push('%');
    for ch in token.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Appends the WHERE clause for a facet query over `programs p` or `resources p`.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, link: Link, query: &FacetQuery) {
    builder.push(" WHERE TRUE");
    match query.status {
        StatusScope::LiveOnly => {
            builder.push(" AND p.live");
        }
        StatusScope::DraftOnly => {
            builder.push(" AND NOT p.live");
        }
        StatusScope::All => {}
    }

    if let (Link::Program, Some(parent)) = (link, query.parent) {
        builder.push(" AND p.parent_id = ");
        builder.push_bind(parent.0);
    }

    for token in &query.text_tokens {
        builder.push(format!(" AND {} ILIKE ", link.text_column()));
        builder.push_bind(escape_like(token));
    }

    for clause in &query.clauses {
        builder.push(format!(
            " AND EXISTS (SELECT 1 FROM {table} l JOIN taxonomy_terms t ON t.id = l.term_id \
             WHERE l.{owner} = p.id AND t.kind = ",
            table = link.table(),
            owner = link.owner_column(),
        ));
        builder.push_bind(clause.kind.key());
        builder.push(" AND t.slug = ANY(");
        builder.push_bind(clause.slugs.clone());
        builder.push("))");
    }
}

fn push_slice(builder: &mut QueryBuilder<'_, Postgres>, slice: Slice) {
    builder.push(" ORDER BY p.id");
    if let Some(limit) = slice.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit as i64);
    }
    if slice.offset > 0 {
        builder.push(" OFFSET ");
        builder.push_bind(slice.offset as i64);
    }
}

async fn replace_links(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    link: Link,
    owner: i64,
    terms: &BTreeSet<TermId>,
) -> Result<(), StoreError> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE {} = $1",
        link.table(),
        link.owner_column()
    ))
    .bind(owner)
    .execute(&mut **tx)
    .await?;

    let ids: Vec<i64> = terms.iter().map(|term| term.0).collect();
    sqlx::query(&format!(
        "INSERT INTO {} ({}, term_id) SELECT $1, UNNEST($2::BIGINT[])",
        link.table(),
        link.owner_column()
    ))
    .bind(owner)
    .bind(ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct TermRow {
    id: i64,
    kind: String,
    name: String,
    slug: String,
}

impl TryFrom<TermRow> for TaxonomyTerm {
    type Error = StoreError;

    fn try_from(row: TermRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse::<TaxonomyKind>()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(TaxonomyTerm {
            id: TermId(row.id),
            kind,
            name: row.name,
            slug: row.slug,
        })
    }
}

fn into_terms(rows: Vec<TermRow>) -> Result<Vec<TaxonomyTerm>, StoreError> {
    rows.into_iter().map(TaxonomyTerm::try_from).collect()
}

#[derive(Debug, sqlx::FromRow)]
struct ProgramRow {
    id: i64,
    parent_id: i64,
    title: String,
    slug: String,
    live: bool,
    first_published_at: Option<DateTime<Utc>>,
    last_published_at: Option<DateTime<Utc>>,
    profile: Json<ProgramProfile>,
}

impl ProgramRow {
    fn into_program(self, terms: BTreeSet<TermId>) -> Program {
        Program {
            id: ProgramId(self.id),
            parent_id: PageId(self.parent_id),
            title: self.title,
            slug: self.slug,
            live: self.live,
            first_published_at: self.first_published_at,
            last_published_at: self.last_published_at,
            profile: self.profile.0,
            terms,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ResourceRow {
    id: i64,
    name: String,
    author: String,
    link: Option<String>,
    image: Option<String>,
    age_group: String,
    live: bool,
}

impl ResourceRow {
    fn into_resource(self, terms: BTreeSet<TermId>) -> Resource {
        Resource {
            id: ResourceId(self.id),
            name: self.name,
            author: self.author,
            link: self.link,
            image: self.image,
            age_group: self.age_group,
            live: self.live,
            terms,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PageRow {
    id: i64,
    parent_id: Option<i64>,
    kind: String,
    title: String,
    slug: String,
    live: bool,
    show_in_menu: bool,
    hero_image: Option<String>,
    intro: String,
    body: Json<Vec<ContentBlock>>,
    featured: Vec<i64>,
}

impl TryFrom<PageRow> for Page {
    type Error = StoreError;

    fn try_from(row: PageRow) -> Result<Self, Self::Error> {
        let kind = PageKind::from_key(&row.kind)
            .ok_or_else(|| StoreError::Unavailable(format!("unknown page kind '{}'", row.kind)))?;
        Ok(Page {
            id: PageId(row.id),
            parent_id: row.parent_id.map(PageId),
            kind,
            title: row.title,
            slug: row.slug,
            live: row.live,
            show_in_menu: row.show_in_menu,
            hero_image: row.hero_image,
            intro: row.intro,
            body: row.body.0,
            featured: row.featured.into_iter().map(PageId).collect(),
        })
    }
}

fn into_pages(rows: Vec<PageRow>) -> Result<Vec<Page>, StoreError> {
    rows.into_iter().map(Page::try_from).collect()
}

#[derive(Debug, sqlx::FromRow)]
struct RecipientRow {
    id: i64,
    email: String,
    active: bool,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

impl From<RecipientRow> for Recipient {
    fn from(row: RecipientRow) -> Self {
        Recipient {
            id: RecipientId(row.id),
            email: row.email,
            active: row.active,
            created: row.created,
            modified: row.modified,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UpsertedRecipient {
    #[sqlx(flatten)]
    recipient: RecipientRow,
    inserted: bool,
}

#[async_trait]
impl DirectoryStore for PostgresStore {
    async fn insert_term(&self, term: NewTerm) -> Result<TaxonomyTerm, StoreError> {
        let row: TermRow = sqlx::query_as(
            "INSERT INTO taxonomy_terms (kind, name, slug) VALUES ($1, $2, $3) \
             RETURNING id, kind, name, slug",
        )
        .bind(term.kind.key())
        .bind(&term.name)
        .bind(&term.slug)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update_term(&self, term: TaxonomyTerm) -> Result<TaxonomyTerm, StoreError> {
        let row: Option<TermRow> = sqlx::query_as(
            "UPDATE taxonomy_terms SET name = $2, slug = $3 WHERE id = $1 \
             RETURNING id, kind, name, slug",
        )
        .bind(term.id.0)
        .bind(&term.name)
        .bind(&term.slug)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(StoreError::NotFound)?.try_into()
    }

    async fn delete_term(&self, id: TermId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM taxonomy_terms WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn fetch_term(&self, id: TermId) -> Result<Option<TaxonomyTerm>, StoreError> {
        let row: Option<TermRow> =
            sqlx::query_as("SELECT id, kind, name, slug FROM taxonomy_terms WHERE id = $1")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TaxonomyTerm::try_from).transpose()
    }

    async fn terms(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyTerm>, StoreError> {
        let rows: Vec<TermRow> = sqlx::query_as(
            "SELECT id, kind, name, slug FROM taxonomy_terms WHERE kind = $1 ORDER BY name",
        )
        .bind(kind.key())
        .fetch_all(&self.pool)
        .await?;
        into_terms(rows)
    }

    async fn terms_by_ids(&self, ids: &[TermId]) -> Result<Vec<TaxonomyTerm>, StoreError> {
        let raw: Vec<i64> = ids.iter().map(|id| id.0).collect();
        let rows: Vec<TermRow> = sqlx::query_as(
            "SELECT id, kind, name, slug FROM taxonomy_terms WHERE id = ANY($1) ORDER BY name",
        )
        .bind(raw)
        .fetch_all(&self.pool)
        .await?;
        into_terms(rows)
    }

    async fn insert_program(&self, program: NewProgram) -> Result<Program, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row: ProgramRow = sqlx::query_as(&format!(
            "INSERT INTO programs AS p (parent_id, title, slug, live, first_published_at, \
             last_published_at, profile) VALUES ($1, $2, $3, $4, $5, $5, $6) \
             RETURNING {PROGRAM_COLUMNS}"
        ))
        .bind(program.parent_id.0)
        .bind(&program.title)
        .bind(&program.slug)
        .bind(program.live)
        .bind(program.published_at)
        .bind(Json(&program.profile))
        .fetch_one(&mut *tx)
        .await?;

        replace_links(&mut tx, Link::Program, row.id, &program.terms).await?;
        tx.commit().await?;
        Ok(row.into_program(program.terms))
    }

    async fn update_program(&self, program: Program) -> Result<Program, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE programs SET parent_id = $2, title = $3, slug = $4, live = $5, \
             first_published_at = $6, last_published_at = $7, profile = $8 WHERE id = $1",
        )
        .bind(program.id.0)
        .bind(program.parent_id.0)
        .bind(&program.title)
        .bind(&program.slug)
        .bind(program.live)
        .bind(program.first_published_at)
        .bind(program.last_published_at)
        .bind(Json(&program.profile))
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        replace_links(&mut tx, Link::Program, program.id.0, &program.terms).await?;
        tx.commit().await?;
        Ok(program)
    }

    async fn delete_program(&self, id: ProgramId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn fetch_program(&self, id: ProgramId) -> Result<Option<Program>, StoreError> {
        let rows: Vec<ProgramRow> = sqlx::query_as(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM programs p WHERE p.id = $1"
        ))
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(self.programs_with_terms(rows).await?.into_iter().next())
    }

    async fn program_by_slug(&self, slug: &str) -> Result<Option<Program>, StoreError> {
        let rows: Vec<ProgramRow> = sqlx::query_as(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM programs p WHERE p.slug = $1"
        ))
        .bind(slug)
        .fetch_all(&self.pool)
        .await?;
        Ok(self.programs_with_terms(rows).await?.into_iter().next())
    }

    async fn count_programs(&self, query: &FacetQuery) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM programs p");
        push_filters(&mut builder, Link::Program, query);
        let count: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn search_programs(
        &self,
        query: &FacetQuery,
        slice: Slice,
    ) -> Result<Vec<Program>, StoreError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {PROGRAM_COLUMNS} FROM {} p",
            Link::Program.records()
        ));
        push_filters(&mut builder, Link::Program, query);
        push_slice(&mut builder, slice);
        let rows: Vec<ProgramRow> = builder.build_query_as::<ProgramRow>().fetch_all(&self.pool).await?;
        self.programs_with_terms(rows).await
    }

    async fn insert_resource(&self, resource: NewResource) -> Result<Resource, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row: ResourceRow = sqlx::query_as(&format!(
            "INSERT INTO resources AS p (name, author, link, image, age_group, live) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(&resource.name)
        .bind(&resource.author)
        .bind(&resource.link)
        .bind(&resource.image)
        .bind(&resource.age_group)
        .bind(resource.live)
        .fetch_one(&mut *tx)
        .await?;

        replace_links(&mut tx, Link::Resource, row.id, &resource.terms).await?;
        tx.commit().await?;
        Ok(row.into_resource(resource.terms))
    }

    async fn update_resource(&self, resource: Resource) -> Result<Resource, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE resources SET name = $2, author = $3, link = $4, image = $5, \
             age_group = $6, live = $7 WHERE id = $1",
        )
        .bind(resource.id.0)
        .bind(&resource.name)
        .bind(&resource.author)
        .bind(&resource.link)
        .bind(&resource.image)
        .bind(&resource.age_group)
        .bind(resource.live)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        replace_links(&mut tx, Link::Resource, resource.id.0, &resource.terms).await?;
        tx.commit().await?;
        Ok(resource)
    }

    async fn delete_resource(&self, id: ResourceId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn fetch_resource(&self, id: ResourceId) -> Result<Option<Resource>, StoreError> {
        let rows: Vec<ResourceRow> = sqlx::query_as(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources p WHERE p.id = $1"
        ))
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(self.resources_with_terms(rows).await?.into_iter().next())
    }

    async fn count_resources(&self, query: &FacetQuery) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM resources p");
        push_filters(&mut builder, Link::Resource, query);
        let count: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn search_resources(
        &self,
        query: &FacetQuery,
        slice: Slice,
    ) -> Result<Vec<Resource>, StoreError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {RESOURCE_COLUMNS} FROM {} p",
            Link::Resource.records()
        ));
        push_filters(&mut builder, Link::Resource, query);
        push_slice(&mut builder, slice);
        let rows: Vec<ResourceRow> = builder.build_query_as::<ResourceRow>().fetch_all(&self.pool).await?;
        self.resources_with_terms(rows).await
    }
}

#[async_trait]
impl PageStore for PostgresStore {
    async fn root(&self) -> Result<Page, StoreError> {
        let row: Option<PageRow> = sqlx::query_as(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE parent_id IS NULL ORDER BY id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(StoreError::NotFound)?.try_into()
    }

    async fn insert_page(&self, page: NewPage) -> Result<Page, StoreError> {
        let featured: Vec<i64> = page.featured.iter().map(|id| id.0).collect();
        let row: PageRow = sqlx::query_as(&format!(
            "INSERT INTO pages (parent_id, kind, title, slug, live, show_in_menu, hero_image, \
             intro, body, featured) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {PAGE_COLUMNS}"
        ))
        .bind(page.parent_id.0)
        .bind(page.kind.key())
        .bind(&page.title)
        .bind(&page.slug)
        .bind(page.live)
        .bind(page.show_in_menu)
        .bind(&page.hero_image)
        .bind(&page.intro)
        .bind(Json(&page.body))
        .bind(featured)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update_page(&self, page: Page) -> Result<Page, StoreError> {
        let featured: Vec<i64> = page.featured.iter().map(|id| id.0).collect();
        let row: Option<PageRow> = sqlx::query_as(&format!(
            "UPDATE pages SET title = $2, slug = $3, live = $4, show_in_menu = $5, \
             hero_image = $6, intro = $7, body = $8, featured = $9 WHERE id = $1 \
             RETURNING {PAGE_COLUMNS}"
        ))
        .bind(page.id.0)
        .bind(&page.title)
        .bind(&page.slug)
        .bind(page.live)
        .bind(page.show_in_menu)
        .bind(&page.hero_image)
        .bind(&page.intro)
        .bind(Json(&page.body))
        .bind(featured)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(StoreError::NotFound)?.try_into()
    }

    async fn fetch_page(&self, id: PageId) -> Result<Option<Page>, StoreError> {
        let row: Option<PageRow> =
            sqlx::query_as(&format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Page::try_from).transpose()
    }

    async fn children(&self, parent: PageId) -> Result<Vec<Page>, StoreError> {
        let rows: Vec<PageRow> = sqlx::query_as(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE parent_id = $1 ORDER BY id"
        ))
        .bind(parent.0)
        .fetch_all(&self.pool)
        .await?;
        into_pages(rows)
    }

    async fn pages_of_kind(&self, kind: PageKind) -> Result<Vec<Page>, StoreError> {
        let rows: Vec<PageRow> = sqlx::query_as(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE kind = $1 ORDER BY id"
        ))
        .bind(kind.key())
        .fetch_all(&self.pool)
        .await?;
        into_pages(rows)
    }
}

#[async_trait]
impl RecipientStore for PostgresStore {
    async fn upsert_active(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(Recipient, bool), StoreError> {
        let row: UpsertedRecipient = sqlx::query_as(&format!(
            "INSERT INTO newsletter_recipients (email, active, created, modified) \
             VALUES ($1, TRUE, $2, $2) \
             ON CONFLICT (email) DO UPDATE SET active = TRUE, modified = EXCLUDED.modified \
             RETURNING {RECIPIENT_COLUMNS}, (xmax = 0) AS inserted"
        ))
        .bind(email)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok((row.recipient.into(), row.inserted))
    }

    async fn find_recipient(&self, email: &str) -> Result<Option<Recipient>, StoreError> {
        let row: Option<RecipientRow> = sqlx::query_as(&format!(
            "SELECT {RECIPIENT_COLUMNS} FROM newsletter_recipients WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Recipient::from))
    }

    async fn deactivate(&self, email: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE newsletter_recipients SET active = FALSE, modified = $2 \
             WHERE email = $1 AND active",
        )
        .bind(email)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recipients(&self) -> Result<Vec<Recipient>, StoreError> {
        let rows: Vec<RecipientRow> = sqlx::query_as(&format!(
            "SELECT {RECIPIENT_COLUMNS} FROM newsletter_recipients ORDER BY modified DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Recipient::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::facets::{FilterSelection, PROGRAM_FACETS};

    #[test]
    fn like_patterns_escape_wildcards() {
        assert_eq!(escape_like("robot"), "%robot%");
        assert_eq!(escape_like("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn facet_clauses_become_exists_subqueries() {
        let selection = FilterSelection::parse(
            Some("q=code+camp&age_groups=high-school&program_types=camp,class"),
            &PROGRAM_FACETS,
        );
        let query = FacetQuery::from_selection(&selection).under(PageId(7));

        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM programs p");
        push_filters(&mut builder, Link::Program, &query);
        push_slice(&mut builder, Slice::window(10, 10));
        let sql = builder.sql();

        assert!(sql.contains(" AND p.live AND p.parent_id = $1"));
        assert!(sql.contains("p.title ILIKE $2 AND p.title ILIKE $3"));
        assert_eq!(sql.matches("EXISTS (SELECT 1 FROM program_terms").count(), 2);
        assert!(sql.ends_with("ORDER BY p.id LIMIT $8 OFFSET $9"));
    }

    #[test]
    fn resource_queries_ignore_parent_scope() {
        let query = FacetQuery::live()
            .with_status(StatusScope::All)
            .under(PageId(7));
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM resources p");
        push_filters(&mut builder, Link::Resource, &query);
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM resources p WHERE TRUE");
    }
}
