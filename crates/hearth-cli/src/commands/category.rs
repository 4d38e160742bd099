use anyhow::Result;
use hearth_core::models::NewCategoryData;
use hearth_core::repository::Repository;

use crate::cli::{CategoryCommand, CategorySubcommand};
use crate::util::resolve_category;
use crate::views::table::display_categories;

pub async fn category_command(repo: &impl Repository, command: CategoryCommand) -> Result<()> {
    match command.command {
        CategorySubcommand::Add(add) => {
            let category = repo
                .add_category(NewCategoryData {
                    name: add.name,
                    icon: add.icon,
                    color: add.color,
                    sort_order: None,
                })
                .await?;
            println!("Added category: {} '{}'", category.icon, category.name);
        }
        CategorySubcommand::List => {
            let categories = repo.find_categories().await?;
            display_categories(&categories);
        }
        CategorySubcommand::Delete(arg) => {
            let category = resolve_category(repo, &arg.name).await?;
            repo.delete_category(category.id).await?;
            println!("Removed category: '{}'", category.name);
        }
    }
    Ok(())
}
