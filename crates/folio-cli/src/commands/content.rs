use crate::context::AppContext;
use anyhow::Result;
use clap::{Args, ValueEnum};
use folio_core::content::{ContentFilter, SortOrder};

#[derive(Clone, Copy, ValueEnum)]
pub enum Sort {
    Newest,
    Oldest,
    Title,
}

impl From<Sort> for SortOrder {
    fn from(sort: Sort) -> Self {
        match sort {
            Sort::Newest => SortOrder::Newest,
            Sort::Oldest => SortOrder::Oldest,
            Sort::Title => SortOrder::Title,
        }
    }
}

#[derive(Args)]
pub struct ListArgs {
    /// Include drafts
    #[arg(long)]
    all: bool,
    /// Case-insensitive text search
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    tag: Option<String>,
    #[arg(long, value_enum, default_value_t = Sort::Newest)]
    sort: Sort,
}

impl ListArgs {
    fn filter(&self) -> ContentFilter {
        ContentFilter {
            search: self.search.clone(),
            category_id: self.category.clone(),
            tag_id: self.tag.clone(),
            status: None,
            sort: self.sort.into(),
        }
    }
}

pub async fn list_posts(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let filter = args.filter();
    let posts = if args.all {
        ctx.posts.list_all(&filter).await?
    } else {
        ctx.posts.list_published(&filter).await?
    };
    println!("📰 {} post(s)", posts.len());
    for post in posts {
        println!("  [{}] {} ({})", post.status, post.title, post.slug);
    }
    Ok(())
}

pub async fn list_resources(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let filter = args.filter();
    let resources = if args.all {
        ctx.resources.list_all(&filter).await?
    } else {
        ctx.resources.list_published(&filter).await?
    };
    println!("📦 {} resource(s)", resources.len());
    for resource in resources {
        println!(
            "  [{}] {} - {} ({} bytes, {} downloads)",
            resource.status,
            resource.title,
            resource.file_name,
            resource.file_size,
            resource.download_count
        );
    }
    Ok(())
}

pub async fn list_taxonomy(ctx: &AppContext) -> Result<()> {
    let categories = ctx.taxonomy.categories().await?;
    println!("📁 Categories");
    for category in categories {
        println!("  {} ({})", category.name, category.slug);
    }
    let tags = ctx.taxonomy.tags().await?;
    println!("🏷️  Tags");
    for tag in tags {
        println!("  {} ({})", tag.name, tag.slug);
    }
    Ok(())
}
